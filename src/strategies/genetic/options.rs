use crate::{flags::OptLevel, strategies::Error};
use argh::FromArgs;

#[derive(FromArgs, PartialEq, Debug, Clone)]
/// genetic search options
#[argh(subcommand, name = "genetic")]
pub struct GeneticSearchOptions {
    #[argh(option, short = 'g', default = "5")]
    /// number of generations (default: 5)
    pub generations: usize,

    #[argh(option, short = 'p', default = "6")]
    /// population size, constant across generations (default: 6)
    pub population: usize,

    #[argh(option, default = "0.1")]
    /// probability that a child is mutated (default: 0.1)
    pub mutation_rate: f64,

    #[argh(option, default = "5")]
    /// number of pure optimization levels in the initial population (default: 5)
    pub pure_levels: usize,

    #[argh(switch)]
    /// return the best configuration of the whole run instead of the final generation's
    pub keep_best_overall: bool,

    #[argh(option, default = "16")]
    /// number of ranked candidates to report (default: 16)
    pub candidates: usize,

    #[argh(option)]
    /// generation history output file
    pub history: Option<String>,
}

impl Default for GeneticSearchOptions {
    fn default() -> Self {
        GeneticSearchOptions {
            generations: 5,
            population: 6,
            mutation_rate: 0.1,
            pure_levels: OptLevel::ALL.len(),
            keep_best_overall: false,
            candidates: 16,
            history: None,
        }
    }
}

impl GeneticSearchOptions {
    pub fn validate(&self) -> Result<(), Error> {
        if self.population <= 1 {
            return Err(Error::InvalidOptions(
                "population size must be greater than 1".to_string(),
            ));
        }
        if self.generations == 0 {
            return Err(Error::InvalidOptions(
                "number of generations must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(Error::InvalidOptions(format!(
                "mutation rate must be within [0, 1], got {}",
                self.mutation_rate
            )));
        }
        Ok(())
    }
}
