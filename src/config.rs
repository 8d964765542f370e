use crate::error::SfResult;
use clap::{parser::ValueSource, ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    #[command(flatten)]
    pub search: SearchParams,
    #[command(flatten)]
    pub weights: PenaltyWeights,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    // === POPULATION ===
    #[arg(long, default_value_t = 10)]
    pub initial_pop: usize,
    #[arg(long, default_value_t = 10)]
    pub max_pop: usize,
    #[arg(long, default_value_t = 1)]
    pub num_remove: usize,
    #[arg(long, default_value_t = 10)]
    pub max_generations: usize,

    // === STABILITY ===
    #[arg(long, default_value_t = 1)]
    pub stable_threshold: u64,
    #[arg(long, default_value_t = 500)]
    pub max_stable_generations: usize,

    // === OR-TREE ===
    #[arg(long, default_value_t = 28_000)]
    pub frontier_cap: usize,
    #[arg(long, default_value_t = 64)]
    pub max_restarts: usize,
    #[arg(long, default_value_t = 16)]
    pub selection_retries: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            initial_pop: 10,
            max_pop: 10,
            num_remove: 1,
            max_generations: 10,
            stable_threshold: 1,
            max_stable_generations: 500,
            frontier_cap: 28_000,
            max_restarts: 64,
            selection_retries: 16,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyWeights {
    // === CATEGORY WEIGHTS ===
    #[arg(long, default_value_t = 1)]
    pub w_min_filled: u64,
    #[arg(long, default_value_t = 1)]
    pub w_pref: u64,
    #[arg(long, default_value_t = 1)]
    pub w_pair: u64,
    #[arg(long, default_value_t = 1)]
    pub w_sec_diff: u64,

    // === PENALTIES ===
    #[arg(long, default_value_t = 1)]
    pub pen_course_min: u64,
    #[arg(long, default_value_t = 1)]
    pub pen_lab_min: u64,
    #[arg(long, default_value_t = 1)]
    pub pen_not_paired: u64,
    #[arg(long, default_value_t = 1)]
    pub pen_section: u64,
}

impl Default for PenaltyWeights {
    fn default() -> Self {
        Self {
            w_min_filled: 1,
            w_pref: 1,
            w_pair: 1,
            w_sec_diff: 1,
            pen_course_min: 1,
            pen_lab_min: 1,
            pen_not_paired: 1,
            pen_section: 1,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> SfResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Overlays values the user typed on the command line onto `self`.
    /// Defaults filled in by clap never override file values.
    pub fn merge_from_cli(&mut self, cli: &Config, matches: &ArgMatches) {
        self.search.merge_from_cli(&cli.search, matches);
        self.weights.merge_from_cli(&cli.weights, matches);
    }
}

macro_rules! update_if_present {
    ($target:ident, $source:ident, $matches:ident, $($field:ident),+ $(,)?) => {
        $(
            if $matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                $target.$field = $source.$field;
            }
        )+
    };
}

impl SearchParams {
    pub fn merge_from_cli(&mut self, cli: &SearchParams, matches: &ArgMatches) {
        update_if_present!(
            self,
            cli,
            matches,
            initial_pop,
            max_pop,
            num_remove,
            max_generations,
            stable_threshold,
            max_stable_generations,
            frontier_cap,
            max_restarts,
            selection_retries,
        );
    }
}

impl PenaltyWeights {
    pub fn merge_from_cli(&mut self, cli: &PenaltyWeights, matches: &ArgMatches) {
        update_if_present!(
            self,
            cli,
            matches,
            w_min_filled,
            w_pref,
            w_pair,
            w_sec_diff,
            pen_course_min,
            pen_lab_min,
            pen_not_paired,
            pen_section,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, FromArgMatches, Parser};

    #[derive(Parser, Debug)]
    struct Harness {
        #[command(flatten)]
        config: Config,
    }

    #[test]
    fn test_cli_defaults_match_serde_defaults() {
        let matches = Harness::command().get_matches_from(["harness"]);
        let parsed = Harness::from_arg_matches(&matches).unwrap();
        let defaults = Config::default();

        assert_eq!(parsed.config.search.frontier_cap, defaults.search.frontier_cap);
        assert_eq!(parsed.config.search.max_stable_generations, 500);
        assert_eq!(parsed.config.weights.pen_section, defaults.weights.pen_section);
    }

    #[test]
    fn test_merge_only_takes_explicit_flags() {
        let matches =
            Harness::command().get_matches_from(["harness", "--max-pop", "25", "--w-pref", "7"]);
        let cli = Harness::from_arg_matches(&matches).unwrap().config;

        let mut file = Config::default();
        file.search.initial_pop = 40;
        file.weights.pen_section = 9;
        file.merge_from_cli(&cli, &matches);

        assert_eq!(file.search.max_pop, 25);
        assert_eq!(file.weights.w_pref, 7);
        // Untouched on the command line, so the file values survive.
        assert_eq!(file.search.initial_pop, 40);
        assert_eq!(file.weights.pen_section, 9);
    }
}
