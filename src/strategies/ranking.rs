use crate::{
    fitness::{Evaluation, Fitness},
    flags::Configuration,
};
use fxhash::FxHashMap;

/// Best measurement per configuration over a whole run, reported as the
/// `capacity` fastest.
pub struct Ranking {
    best: FxHashMap<Configuration, Fitness>,
    capacity: usize,
}

impl Ranking {
    pub fn new(capacity: usize) -> Self {
        Ranking {
            best: FxHashMap::default(),
            capacity,
        }
    }

    pub fn push(&mut self, evaluation: Evaluation) {
        let Evaluation(configuration, fitness) = evaluation;
        self.best
            .entry(configuration)
            .and_modify(|best| {
                if fitness < *best {
                    *best = fitness;
                }
            })
            .or_insert(fitness);
    }

    pub fn to_vec(self) -> Vec<Evaluation> {
        let mut results = self
            .best
            .into_iter()
            .map(|(configuration, fitness)| Evaluation(configuration, fitness))
            .collect::<Vec<_>>();
        results.sort_by(|a, b| {
            a.1.cmp(&b.1)
                .then_with(|| a.0.to_string().cmp(&b.0.to_string()))
        });
        results.truncate(self.capacity);
        results
    }
}
