use crate::reports;
use clap::Args;
use schedforge::config::Config;
use schedforge::error::SfResult;
use schedforge::model::ProblemContext;
use schedforge::optimizer::{OptimizationOptions, Optimizer, ProgressCallback};
use schedforge::population::FitnessStats;
use schedforge::rules::{HardConstraints, SoftConstraints};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Args, Debug, Clone)]
pub struct SolveArgs {
    #[command(flatten)]
    pub config: Config,

    #[arg(short = 'T', long)]
    pub time: Option<u64>,

    #[arg(short = 'S', long)]
    pub seed: Option<u64>,

    /// Write the best schedule here as JSON (class -> "DAY H:MM").
    #[arg(short, long)]
    pub output: Option<String>,
}

struct CliLogger;
impl ProgressCallback for CliLogger {
    fn on_progress(&self, generation: usize, stats: &FitnessStats) -> bool {
        info!(
            "Gen {:5} | Min: {} | Max: {} | Mean: {:.1}",
            generation, stats.min, stats.max, stats.mean
        );
        true
    }
}

pub fn run(args: SolveArgs, config: Config, ctx: Arc<ProblemContext>) -> SfResult<()> {
    let mut options = OptimizationOptions::from(&config);
    if let Some(t) = args.time {
        options.max_time = Some(Duration::from_secs(t));
    }

    let constraints = Arc::new(HardConstraints::new(ctx.clone()));
    let fitness = Arc::new(SoftConstraints::new(ctx.clone(), config.weights.clone()));
    let optimizer = Optimizer::new(ctx.clone(), constraints, fitness.clone(), options);

    info!(
        "Solving '{}': {} classes, {} slots",
        ctx.name(),
        ctx.num_classes(),
        ctx.slots().len()
    );
    let result = optimizer.run(args.seed, CliLogger)?;
    reports::print_run_summary(&result);

    let Some(best) = &result.best else {
        warn!("No feasible schedule found ({})", result.stop_reason);
        return Ok(());
    };

    info!("=== FINAL RESULT ===");
    info!("Fitness: {}", result.best_fitness);
    reports::print_schedule(ctx.name(), &ctx, best);
    if let Some(breakdown) = fitness.breakdown(best) {
        reports::print_fitness(&breakdown, fitness.weights());
    }

    if let Some(path) = args.output {
        let json = serde_json::to_string_pretty(&ctx.describe(best))?;
        fs::write(&path, json)?;
        info!("Schedule written to {}", path);
    }
    Ok(())
}
