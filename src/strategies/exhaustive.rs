use crate::{
    fitness::Evaluation,
    flags::{Configuration, OptLevel},
    runner::Harness,
    strategies::{Context, GenerationSummary, Outcome, ranking::Ranking},
};
use argh::FromArgs;
use tracing::info;

#[derive(FromArgs, PartialEq, Debug, Clone)]
/// exhaustive search options
#[argh(subcommand, name = "exhaustive")]
pub struct ExhaustiveSearchOptions {
    #[argh(switch)]
    /// measure pure optimization levels only
    pub levels_only: bool,

    #[argh(option, default = "16")]
    /// number of ranked candidates to report (default: 16)
    pub candidates: usize,
}

impl Default for ExhaustiveSearchOptions {
    fn default() -> Self {
        ExhaustiveSearchOptions {
            levels_only: false,
            candidates: 16,
        }
    }
}

impl ExhaustiveSearchOptions {
    pub fn space(&self) -> Vec<Configuration> {
        if self.levels_only {
            OptLevel::ALL.iter().copied().map(Configuration::pure).collect()
        } else {
            Configuration::all().collect()
        }
    }
}

/// Measures the whole space once, in canonical order. The earliest of equally
/// fast candidates wins.
pub fn search<H: Harness>(context: &Context<'_, H>, options: &ExhaustiveSearchOptions) -> Outcome {
    let space = options.space();
    let fitnesses = context.evaluate(&space);

    let mut ranking = Ranking::new(options.candidates);
    let mut champion = Evaluation(space[0], fitnesses[0]);
    for (index, (configuration, fitness)) in space.iter().zip(&fitnesses).enumerate() {
        info!("{}/{}: {} {}", index + 1, space.len(), configuration, fitness);
        ranking.push(Evaluation(*configuration, *fitness));
        if *fitness < champion.1 {
            champion = Evaluation(*configuration, *fitness);
        }
    }

    let summary = GenerationSummary::new(1, &space, &fitnesses, champion, champion);
    info!("=== Exhaustive Search Summary ===\n{}", summary);

    Outcome {
        best: champion.0,
        fitness: champion.1,
        best_overall: champion,
        history: vec![summary],
        ranking: ranking.to_vec(),
        canceled: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fitness::Fitness,
        flags::Toggle,
        strategies::tests::{TableHarness, by_code, never_compiles},
    };
    use std::{path::Path, time::Duration};

    fn o2_unrolled_wins(configuration: &Configuration) -> Fitness {
        if *configuration == Configuration::paired(OptLevel::O2, Toggle::UnrollLoops) {
            Fitness::Measured(Duration::from_millis(1))
        } else {
            Fitness::Measured(Duration::from_millis(50))
        }
    }

    #[test]
    fn measures_every_configuration_once() {
        let harness = TableHarness::new(by_code);
        let context = Context::new(&harness, Path::new("prog.c"));
        let outcome = search(&context, &ExhaustiveSearchOptions::default());

        let calls = harness.calls.lock().unwrap();
        assert_eq!(*calls, Configuration::all().collect::<Vec<_>>());
        let best = calls.iter().map(by_code).min().unwrap();
        assert_eq!(outcome.fitness, best);
        assert_eq!(outcome.history.len(), 1);
    }

    #[test]
    fn finds_the_fastest() {
        let harness = TableHarness::new(o2_unrolled_wins);
        let context = Context::new(&harness, Path::new("prog.c"));
        let outcome = search(&context, &ExhaustiveSearchOptions::default());
        assert_eq!(outcome.best.to_string(), "2u");
        assert_eq!(outcome.ranking[0].0.to_string(), "2u");
    }

    #[test]
    fn levels_only_and_ties_keep_first() {
        let harness = TableHarness::new(o2_unrolled_wins);
        let context = Context::new(&harness, Path::new("prog.c"));
        let options = ExhaustiveSearchOptions {
            levels_only: true,
            ..Default::default()
        };
        let outcome = search(&context, &options);
        assert_eq!(harness.calls.lock().unwrap().len(), OptLevel::ALL.len());
        assert_eq!(outcome.best, Configuration::pure(OptLevel::O0));
    }

    #[test]
    fn uncompilable_source_reports_unusable() {
        let harness = TableHarness::new(never_compiles);
        let context = Context::new(&harness, Path::new("broken.c"));
        let outcome = search(&context, &ExhaustiveSearchOptions::default());
        assert_eq!(outcome.fitness, Fitness::Unusable);
        assert_eq!(outcome.best, Configuration::pure(OptLevel::O0));
    }
}
