pub mod exhaustive;
pub mod genetic;
pub mod ranking;

use crate::{
    fitness::{Evaluation, Fitness},
    flags::Configuration,
    runner::Harness,
};
use argh::FromArgs;
use rand::Rng;
use rayon::{ThreadPool, ThreadPoolBuilder, prelude::*};
use serde::Serialize;
use std::{
    fmt,
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid search options: {0}")]
    InvalidOptions(String),
    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(FromArgs, PartialEq, Debug, Clone)]
#[argh(subcommand)]
pub enum Strategy {
    Genetic(genetic::options::GeneticSearchOptions),
    Exhaustive(exhaustive::ExhaustiveSearchOptions),
}

impl Strategy {
    pub fn validate(&self) -> Result<(), Error> {
        match self {
            Strategy::Genetic(options) => options.validate(),
            Strategy::Exhaustive(_) => Ok(()),
        }
    }

    pub fn search<H: Harness, R: Rng + ?Sized>(
        &self,
        context: &Context<'_, H>,
        rng: &mut R,
    ) -> Result<Outcome, Error> {
        match self {
            Strategy::Genetic(options) => genetic::search(context, options, rng),
            Strategy::Exhaustive(options) => Ok(exhaustive::search(context, options)),
        }
    }

    pub fn history(&self) -> Option<&str> {
        match self {
            Strategy::Genetic(options) => options.history.as_deref(),
            Strategy::Exhaustive(_) => None,
        }
    }
}

/// Worker pool for evaluating a generation concurrently. `None` means the
/// calling thread evaluates candidates one after another.
pub fn thread_pool(parallelism: usize) -> Result<Option<ThreadPool>, Error> {
    if parallelism == 0 {
        return Err(Error::InvalidOptions(
            "number of parallel evaluations must be greater than 0".to_string(),
        ));
    }
    if parallelism == 1 {
        return Ok(None);
    }
    let pool = ThreadPoolBuilder::new()
        .num_threads(parallelism)
        .thread_name(|x| format!("evaluator-{}", x))
        .build()?;
    Ok(Some(pool))
}

/// Everything a strategy needs to evaluate candidates for one source file.
pub struct Context<'a, H: Harness> {
    harness: &'a H,
    source: &'a Path,
    pool: Option<&'a ThreadPool>,
    cancel: Option<&'a AtomicBool>,
}

impl<'a, H: Harness> Context<'a, H> {
    pub fn new(harness: &'a H, source: &'a Path) -> Self {
        Context {
            harness,
            source,
            pool: None,
            cancel: None,
        }
    }

    pub fn with_pool(mut self, pool: Option<&'a ThreadPool>) -> Self {
        self.pool = pool;
        self
    }

    pub fn with_cancellation(mut self, cancel: &'a AtomicBool) -> Self {
        self.cancel = Some(cancel);
        self
    }

    #[inline]
    pub fn source(&self) -> &Path {
        self.source
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel.is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Measures every configuration once. Returns only after all of them are
    /// done, in population order.
    pub fn evaluate(&self, population: &[Configuration]) -> Vec<Fitness> {
        let measure = |configuration: &Configuration| {
            self.harness.measure(self.source, configuration)
        };
        match self.pool {
            Some(pool) => pool.install(|| population.par_iter().map(measure).collect()),
            None => population.iter().map(measure).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationSummary {
    pub generation: usize,
    pub population: Vec<Evaluation>,
    pub champion: Evaluation,
    pub best_overall: Evaluation,
    pub worst: Fitness,
}

impl GenerationSummary {
    pub fn new(
        generation: usize,
        population: &[Configuration],
        fitnesses: &[Fitness],
        champion: Evaluation,
        best_overall: Evaluation,
    ) -> Self {
        let worst = fitnesses.iter().max().copied().unwrap_or(Fitness::Unusable);
        GenerationSummary {
            generation,
            population: population
                .iter()
                .zip(fitnesses)
                .map(|(configuration, fitness)| Evaluation(*configuration, *fitness))
                .collect(),
            champion,
            best_overall,
            worst,
        }
    }

    pub fn configurations(&self) -> impl Iterator<Item = Configuration> + '_ {
        self.population.iter().map(|evaluation| evaluation.0)
    }
}

impl fmt::Display for GenerationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Best overall: {} ({})", self.best_overall.0, self.best_overall.1)?;
        writeln!(f, "Best: {} ({})", self.champion.0, self.champion.1)?;
        write!(f, "Worst: {}", self.worst)
    }
}

/// Result of one search over one source file.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub best: Configuration,
    pub fitness: Fitness,
    pub best_overall: Evaluation,
    pub history: Vec<GenerationSummary>,
    pub ranking: Vec<Evaluation>,
    /// Set when the search stopped at a generation boundary on request.
    pub canceled: bool,
}
