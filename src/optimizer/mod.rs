pub mod runner;

pub use runner::{
    OptimizationOptions, OptimizationResult, Optimizer, ProgressCallback, SilentProgress,
    StopReason,
};
