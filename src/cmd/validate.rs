use crate::reports;
use clap::Args;
use schedforge::config::Config;
use schedforge::error::SfResult;
use schedforge::model::ProblemContext;
use schedforge::rules::{HardConstraints, SoftConstraints};
use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub config: Config,

    /// JSON map of class -> "DAY H:MM", as written by `solve --output`.
    #[arg(short, long)]
    pub assignment: String,
}

pub fn run(args: ValidateArgs, config: Config, ctx: Arc<ProblemContext>) -> SfResult<()> {
    let content = fs::read_to_string(&args.assignment)?;
    let entries: BTreeMap<String, String> = serde_json::from_str(&content)?;
    let assignment = ctx.parse_assignment(&entries)?;

    let hard = HardConstraints::new(ctx.clone());
    let soft = SoftConstraints::new(ctx.clone(), config.weights);
    let violations = hard.violations(&assignment);

    reports::print_schedule(&args.assignment, &ctx, &assignment);
    reports::print_violations(&ctx, &violations);
    if let Some(breakdown) = soft.breakdown(&assignment) {
        reports::print_fitness(&breakdown, soft.weights());
    }

    if violations.is_empty() {
        info!("Schedule is feasible");
    } else {
        warn!("Schedule breaks {} hard constraint(s)", violations.len());
    }
    Ok(())
}
