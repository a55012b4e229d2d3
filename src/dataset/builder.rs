use crate::{
    dataset::{DatasetRow, DatasetWriter, Error, ProcessedRecord},
    features::Extractor,
    fitness::Fitness,
    runner::Harness,
    strategies::{Context, Strategy},
};
use rand::Rng;
use rayon::ThreadPool;
use serde::Serialize;
use std::{
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
};
use tracing::{info, warn};

/// Tally of one corpus run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Files that got a dataset row during this run.
    pub processed: usize,
    /// Files already in the processed record.
    pub skipped: usize,
    /// Files left unmarked because a step failed.
    pub failed: usize,
    pub canceled: bool,
}

enum Step {
    Written,
    Canceled,
}

pub struct Builder<'a, H: Harness> {
    extractor: Extractor,
    harness: &'a H,
    strategy: &'a Strategy,
    writer: DatasetWriter,
    record: ProcessedRecord,
    pool: Option<&'a ThreadPool>,
    cancel: Option<&'a AtomicBool>,
}

impl<'a, H: Harness> Builder<'a, H> {
    pub fn new(
        extractor: Extractor,
        harness: &'a H,
        strategy: &'a Strategy,
        dataset: &Path,
        processed: &Path,
    ) -> Result<Self, Error> {
        strategy.validate()?;
        // The record lock covers the header check and every append below.
        let record = ProcessedRecord::load(processed)?;
        let writer = DatasetWriter::open(dataset)?;
        Ok(Builder {
            extractor,
            harness,
            strategy,
            writer,
            record,
            pool: None,
            cancel: None,
        })
    }

    pub fn with_pool(mut self, pool: Option<&'a ThreadPool>) -> Self {
        self.pool = pool;
        self
    }

    pub fn with_cancellation(mut self, cancel: &'a AtomicBool) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_canceled(&self) -> bool {
        self.cancel.is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Every `.c` file directly inside `directory`, sorted by name.
    pub fn sources(directory: &Path) -> Result<Vec<PathBuf>, Error> {
        let mut sources = fs::read_dir(directory)
            .map_err(Error::io(directory))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension() == Some(OsStr::new("c")) && path.is_file())
            .collect::<Vec<_>>();
        sources.sort();
        Ok(sources)
    }

    /// Runs extraction and search for every source not yet in the processed
    /// record. A failing file is logged and left for a later run.
    pub fn process_corpus<R: Rng + ?Sized>(
        &mut self,
        directory: &Path,
        rng: &mut R,
    ) -> Result<Report, Error> {
        let sources = Self::sources(directory)?;
        let mut report = Report::default();

        for (index, source) in sources.iter().enumerate() {
            if self.is_canceled() {
                info!("corpus run canceled before {}", source.display());
                report.canceled = true;
                break;
            }

            let name = match source.file_name() {
                Some(name) => name.to_string_lossy().into_owned(),
                None => continue,
            };
            if self.record.contains(&name) {
                report.skipped += 1;
                continue;
            }

            info!("[{}/{}] {}", index + 1, sources.len(), name);
            match self.process(source, &name, rng) {
                Ok(Step::Written) => report.processed += 1,
                Ok(Step::Canceled) => {
                    report.canceled = true;
                    break;
                }
                Err(err) => {
                    warn!("skipping {}: {}", name, err);
                    report.failed += 1;
                }
            }
        }

        info!(
            "processed {}, skipped {}, failed {}",
            report.processed, report.skipped, report.failed
        );
        Ok(report)
    }

    fn process<R: Rng + ?Sized>(
        &mut self,
        source: &Path,
        name: &str,
        rng: &mut R,
    ) -> Result<Step, Error> {
        let features = self.extractor.extract(source)?;

        let mut context = Context::new(self.harness, source).with_pool(self.pool);
        if let Some(cancel) = self.cancel {
            context = context.with_cancellation(cancel);
        }
        let outcome = self.strategy.search(&context, rng)?;
        if outcome.canceled {
            return Ok(Step::Canceled);
        }
        if outcome.fitness == Fitness::Unusable {
            warn!("{}: no candidate compiled and ran, labelling with {}", name, outcome.best);
        }

        let row = DatasetRow {
            file_name: name.to_string(),
            features,
            label: outcome.best,
        };
        self.writer.append(&row)?;
        if let Err(err) = self.record.mark(name) {
            warn!(
                "{}: row appended to {} but not recorded, a later run will append it again",
                name,
                self.writer.path().display()
            );
            return Err(err);
        }
        info!("{}: {} ({})", name, outcome.best, outcome.fitness);
        Ok(Step::Written)
    }
}
