use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use schedforge::config::Config;
use schedforge::model::{ProblemContext, ProblemSpec};
use std::process;
use std::sync::Arc;
use tracing::{error, info, Level};

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Problem file: `.json`, or the sectioned text format for any other extension.
    #[arg(global = true, short, long, default_value = "data/problem.json")]
    problem: String,

    /// JSON file with search parameters and penalty weights.
    #[arg(global = true, long = "config")]
    config_file: Option<String>,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Solve(cmd::solve::SolveArgs),
    Validate(cmd::validate::ValidateArgs),
}

fn main() {
    // 1. Parse Raw Matches (to distinguish user input from defaults)
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    // 2. Load Problem
    info!("Loading problem: {}", cli.problem);
    let spec = ProblemSpec::load_from_file(&cli.problem).unwrap_or_else(|e| {
        error!("{}", e);
        process::exit(1);
    });
    let ctx = match ProblemContext::from_spec(&spec) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Invalid problem definition: {}", e);
            process::exit(1);
        }
    };

    // 3. Resolve Config: JSON file as the base, explicit CLI flags on top
    let (mut config, sub_matches) = match &cli.command {
        Commands::Solve(args) => (args.config.clone(), matches.subcommand_matches("solve")),
        Commands::Validate(args) => (
            args.config.clone(),
            matches.subcommand_matches("validate"),
        ),
    };

    if let Some(path) = &cli.config_file {
        info!("Loading config from: {}", path);
        let mut file_config = Config::load_from_file(path).unwrap_or_else(|e| {
            error!("{}", e);
            process::exit(1);
        });
        if let Some(sub) = sub_matches {
            file_config.merge_from_cli(&config, sub);
        }
        config = file_config;
    }

    // 4. Execute
    let outcome = match cli.command {
        Commands::Solve(args) => cmd::solve::run(args, config, ctx),
        Commands::Validate(args) => cmd::validate::run(args, config, ctx),
    };

    if let Err(e) = outcome {
        error!("{}", e);
        process::exit(1);
    }
}
