mod signal;

use anyhow::{Context as _, anyhow};
use argh::FromArgs;
use flagtuner::{
    dataset::Builder,
    features::Extractor,
    flags::{Configuration, bits},
    metadata::Metadata,
    runner::Runner,
    strategies::{self, Context, Strategy},
};
use rand::{SeedableRng, rngs::StdRng};
use serde::Serialize;
use signal::Cancellation;
use std::{fs, io, path::Path};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// Searches compiler optimization flags for C programs
struct Arguments {
    #[argh(option, short = 'm')]
    /// metadata file (default: clang with built-in settings)
    metadata: Option<String>,

    #[argh(option, short = 's')]
    /// random seed (default: drawn from the operating system)
    seed: Option<u64>,

    #[argh(option, short = 'j', default = "1")]
    /// number of candidates evaluated in parallel (default: 1)
    parallelism: usize,

    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Features(FeaturesCommand),
    Flags(FlagsCommand),
    Search(SearchCommand),
    Dataset(DatasetCommand),
}

#[derive(FromArgs)]
/// print the static features of a C file as JSON
#[argh(subcommand, name = "features")]
struct FeaturesCommand {
    #[argh(positional)]
    source: String,
}

#[derive(FromArgs)]
/// print the compiler invocation of a configuration code
#[argh(subcommand, name = "flags")]
struct FlagsCommand {
    #[argh(positional)]
    code: String,

    #[argh(switch)]
    /// read the code as a bit string over the flag list
    bits: bool,

    #[argh(option, default = "\"program.c\".to_string()")]
    /// source path shown in the command line (default: program.c)
    source: String,

    #[argh(option, short = 'o', default = "\"program\".to_string()")]
    /// output path shown in the command line (default: program)
    output: String,
}

#[derive(FromArgs)]
/// search the best configuration for one C file
#[argh(subcommand, name = "search")]
struct SearchCommand {
    #[argh(positional)]
    source: String,

    #[argh(option, short = 'o', default = "\"results.json\".to_string()")]
    /// ranked candidates output file (default: results.json)
    output: String,

    #[argh(subcommand)]
    /// search strategy
    strategy: Strategy,
}

#[derive(FromArgs)]
/// label every C file of a directory with its best configuration
#[argh(subcommand, name = "dataset")]
struct DatasetCommand {
    #[argh(positional)]
    directory: String,

    #[argh(option, short = 'o', default = "\"code_dataset.csv\".to_string()")]
    /// dataset file (default: code_dataset.csv)
    output: String,

    #[argh(option, default = "\"processed_files.txt\".to_string()")]
    /// record of processed files (default: processed_files.txt)
    processed: String,

    #[argh(subcommand)]
    /// search strategy
    strategy: Strategy,
}

struct Output<'a>(&'a str, String);

impl<'a> Output<'a> {
    fn new<T: Serialize>(path: &'a str, object: T) -> serde_json::Result<Self> {
        let value = serde_json::to_string_pretty(&object)?;
        Ok(Output(path, value))
    }

    fn save(self) -> io::Result<()> {
        fs::write(self.0, self.1)
    }
}

fn rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn features(metadata: &Metadata, command: &FeaturesCommand) -> anyhow::Result<()> {
    let features = Extractor::new(metadata)
        .extract(Path::new(&command.source))
        .with_context(|| format!("Failed to extract features of {}", command.source))?;
    println!("{}", serde_json::to_string_pretty(&features)?);
    Ok(())
}

fn flags(metadata: &Metadata, command: &FlagsCommand) -> anyhow::Result<()> {
    let configuration = if command.bits {
        bits::parse(&command.code)?
    } else {
        command.code.parse::<Configuration>()?
    };
    println!("{} {}", configuration, bits::format(&configuration));
    println!(
        "{}",
        configuration.command_line(
            &metadata.compiler,
            Path::new(&command.source),
            Path::new(&command.output),
            &metadata.compiler_arguments,
        )
    );
    Ok(())
}

fn search(arguments: &Arguments, metadata: Metadata, command: &SearchCommand) -> anyhow::Result<()> {
    let source = Path::new(&command.source);
    if !source.is_file() {
        return Err(anyhow!("Source file {} does not exist", command.source));
    }
    command.strategy.validate()?;

    let pool = strategies::thread_pool(arguments.parallelism)?;
    let mut rng = rng(arguments.seed);
    let runner = Runner::new(metadata)?;

    let cancellation = Cancellation::install()?;
    let context = Context::new(&runner, source)
        .with_pool(pool.as_ref())
        .with_cancellation(cancellation.flag());
    let outcome = command.strategy.search(&context, &mut rng)?;
    drop(cancellation);

    if outcome.canceled {
        warn!(
            "search canceled after {} generation(s)",
            outcome.history.len()
        );
    }
    info!("best: {} ({})", outcome.best, outcome.fitness);
    println!(
        "{}",
        outcome.best.command_line(
            &runner.metadata().compiler,
            source,
            Path::new("a.out"),
            &runner.metadata().compiler_arguments,
        )
    );

    Output::new(&command.output, &outcome.ranking)?
        .save()
        .with_context(|| format!("Failed to write {}", command.output))?;
    if let Some(path) = command.strategy.history() {
        Output::new(path, &outcome.history)?
            .save()
            .with_context(|| format!("Failed to write {}", path))?;
    }
    Ok(())
}

fn dataset(arguments: &Arguments, metadata: Metadata, command: &DatasetCommand) -> anyhow::Result<()> {
    let pool = strategies::thread_pool(arguments.parallelism)?;
    let mut rng = rng(arguments.seed);
    let extractor = Extractor::new(&metadata);
    let runner = Runner::new(metadata)?;

    let cancellation = Cancellation::install()?;
    let mut builder = Builder::new(
        extractor,
        &runner,
        &command.strategy,
        Path::new(&command.output),
        Path::new(&command.processed),
    )?
    .with_pool(pool.as_ref())
    .with_cancellation(cancellation.flag());

    let report = builder
        .process_corpus(Path::new(&command.directory), &mut rng)
        .with_context(|| format!("Failed to process {}", command.directory))?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let arguments: Arguments = argh::from_env();
    let metadata = match &arguments.metadata {
        Some(path) => Metadata::load(Path::new(path))
            .with_context(|| format!("Failed to load metadata from {}", path))?,
        None => Metadata::default(),
    };

    match &arguments.command {
        Command::Features(command) => features(&metadata, command),
        Command::Flags(command) => flags(&metadata, command),
        Command::Search(command) => search(&arguments, metadata, command),
        Command::Dataset(command) => dataset(&arguments, metadata, command),
    }
}
