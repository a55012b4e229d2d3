pub mod options;

use crate::{
    fitness::{Evaluation, Fitness},
    flags::{Configuration, OptLevel, Shape, Toggle, Toggles},
    runner::Harness,
    strategies::{Context, Error, GenerationSummary, Outcome, ranking::Ranking},
};
use options::GeneticSearchOptions;
use rand::Rng;
use tracing::info;

/// Pure levels first, sampled without replacement while the level set allows
/// it, then level/toggle pairs drawn with replacement.
pub fn initialize<R: Rng + ?Sized>(
    options: &GeneticSearchOptions,
    rng: &mut R,
) -> Vec<Configuration> {
    let pure = options.pure_levels.min(options.population);
    let mut population = Vec::with_capacity(options.population);

    if pure <= OptLevel::ALL.len() {
        for index in rand::seq::index::sample(rng, OptLevel::ALL.len(), pure) {
            population.push(Configuration::pure(OptLevel::ALL[index]));
        }
    } else {
        for _ in 0..pure {
            population.push(Configuration::pure(OptLevel::random(rng)));
        }
    }

    while population.len() < options.population {
        population.push(Configuration::paired(
            OptLevel::random(rng),
            Toggle::random(rng),
        ));
    }
    population
}

/// Two pairs recombine into the first parent's level and the second parent's
/// toggle. Any other combination of shapes yields one parent unchanged.
pub fn crossover<R: Rng + ?Sized>(
    a: &Configuration,
    b: &Configuration,
    rng: &mut R,
) -> Configuration {
    match (a.shape(), b.shape()) {
        (Shape::Paired, Shape::Paired) => Configuration::new(a.level(), b.toggles()),
        _ => {
            if rng.random_bool(0.5) {
                *a
            } else {
                *b
            }
        }
    }
}

/// Redraws every component while keeping the shape.
pub fn mutate<R: Rng + ?Sized>(configuration: &Configuration, rng: &mut R) -> Configuration {
    match configuration.shape() {
        Shape::Level => Configuration::pure(OptLevel::random(rng)),
        Shape::Paired => Configuration::paired(OptLevel::random(rng), Toggle::random(rng)),
        Shape::Combined => Configuration::new(
            OptLevel::random(rng),
            Toggles::random(configuration.toggles().len(), rng),
        ),
    }
}

/// Ranks the population fastest first (unusable last, ties in population
/// order) and returns the breeding pool with the generation's champion.
///
/// # Panics
///
/// Panics if `population` is empty or if `fitnesses` does not hold exactly
/// one entry per member of `population`.
pub fn select(
    population: &[Configuration],
    fitnesses: &[Fitness],
) -> (Vec<Configuration>, Evaluation) {
    assert_eq!(population.len(), fitnesses.len());
    assert!(!population.is_empty());

    let mut ranked = (0..population.len()).collect::<Vec<_>>();
    ranked.sort_by_key(|&index| fitnesses[index]);

    let size = (population.len() / 2).max(2).min(population.len());
    let pool = ranked[..size]
        .iter()
        .map(|&index| population[index])
        .collect();
    let champion = Evaluation(population[ranked[0]], fitnesses[ranked[0]]);
    (pool, champion)
}

pub fn reproduce<R: Rng + ?Sized>(
    pool: &[Configuration],
    size: usize,
    mutation_rate: f64,
    rng: &mut R,
) -> Vec<Configuration> {
    let mut children = Vec::with_capacity(size);
    for _ in 0..size {
        let a = pool[rng.random_range(0..pool.len())];
        let b = pool[rng.random_range(0..pool.len())];
        let child = crossover(&a, &b, rng);
        if rng.random_bool(mutation_rate) {
            children.push(mutate(&child, rng));
        } else {
            children.push(child);
        }
    }
    children
}

pub fn search<H: Harness, R: Rng + ?Sized>(
    context: &Context<'_, H>,
    options: &GeneticSearchOptions,
    rng: &mut R,
) -> Result<Outcome, Error> {
    options.validate()?;

    let mut population = initialize(options, rng);
    let mut ranking = Ranking::new(options.candidates);
    let mut history = Vec::with_capacity(options.generations);
    let mut best_overall: Option<Evaluation> = None;
    let mut canceled = false;

    let mut generation = 0;
    let champion = loop {
        let fitnesses = context.evaluate(&population);
        for (index, (configuration, fitness)) in population.iter().zip(&fitnesses).enumerate() {
            info!(
                "{}/{} {}/{}: {} {}",
                generation + 1,
                options.generations,
                index + 1,
                population.len(),
                configuration,
                fitness
            );
            ranking.push(Evaluation(*configuration, *fitness));
        }

        let (pool, champion) = select(&population, &fitnesses);
        let overall = match best_overall {
            Some(best) if best.1 <= champion.1 => best,
            _ => champion,
        };
        best_overall = Some(overall);

        let summary =
            GenerationSummary::new(generation + 1, &population, &fitnesses, champion, overall);
        info!("=== Generation #{} Summary ===\n{}", generation + 1, summary);
        history.push(summary);

        generation += 1;
        if generation == options.generations {
            break champion;
        }
        if context.is_canceled() {
            info!("search canceled after generation {}", generation);
            canceled = true;
            break champion;
        }

        population = reproduce(&pool, options.population, options.mutation_rate, rng);
    };

    let overall = best_overall.unwrap_or(champion);
    let Evaluation(best, fitness) = if options.keep_best_overall {
        overall
    } else {
        champion
    };

    Ok(Outcome {
        best,
        fitness,
        best_overall: overall,
        history,
        ranking: ranking.to_vec(),
        canceled,
    })
}
