use crate::model::Assignment;
use crate::rules::FitnessOracle;

/// Fitness-proportionate (roulette wheel) sampling over a population.
///
/// The wheel is built from raw fitness values, so an individual's share of
/// the draws equals its share of the total fitness.
#[derive(Debug, Clone)]
pub struct RouletteSelector {
    cumulative: Vec<f64>,
}

impl RouletteSelector {
    pub fn new<F: FitnessOracle>(population: &[Assignment], oracle: &F) -> Self {
        let values: Vec<u64> = population.iter().map(|a| oracle.fitness(a)).collect();
        Self::from_fitness(&values)
    }

    pub fn from_fitness(values: &[u64]) -> Self {
        let total: f64 = values.iter().map(|&v| v as f64).sum();
        let divisor = if total == 0.0 { 1.0 } else { total };

        let mut running = 0.0;
        let cumulative = values
            .iter()
            .map(|&v| {
                running += v as f64 / divisor;
                running
            })
            .collect();

        Self { cumulative }
    }

    pub fn len(&self) -> usize {
        self.cumulative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }

    /// First index whose cumulative share reaches a uniform draw, skipping
    /// `exclude`. `None` if no index qualifies for this draw.
    pub fn select(&self, rng: &mut fastrand::Rng, exclude: Option<usize>) -> Option<usize> {
        let r = rng.f64();
        self.cumulative
            .iter()
            .enumerate()
            .find(|&(i, &c)| Some(i) != exclude && c >= r)
            .map(|(i, _)| i)
    }

    /// Retries [`select`](Self::select) up to `attempts` times.
    pub fn select_with_retries(
        &self,
        rng: &mut fastrand::Rng,
        exclude: Option<usize>,
        attempts: usize,
    ) -> Option<usize> {
        (0..attempts).find_map(|_| self.select(rng, exclude))
    }
}
