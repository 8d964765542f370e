pub mod generation;
pub mod selector;

pub use generation::{CycleAction, FitnessStats, Generation, GenerationParams};
pub use selector::RouletteSelector;
