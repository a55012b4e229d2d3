//! Turns a directory of C programs into labelled feature rows.

pub mod builder;
pub mod record;
pub mod writer;

pub use builder::{Builder, Report};
pub use record::ProcessedRecord;
pub use writer::DatasetWriter;

use crate::{
    features::{self, FeatureKey, FeatureVector},
    flags::Configuration,
    strategies,
};
use std::{io, path::PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("{} is held by another corpus run", .0.display())]
    Locked(PathBuf),
    #[error("{} has header {found:?}, expected {expected:?}", path.display())]
    HeaderMismatch {
        path: PathBuf,
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("feature extraction failed: {0}")]
    Extraction(#[from] features::Error),
    #[error(transparent)]
    Search(#[from] strategies::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Error {
        let path = path.into();
        move |source| Error::Io { path, source }
    }
}

/// One processed source file: its features and the configuration the search
/// settled on.
#[derive(Debug, Clone)]
pub struct DatasetRow {
    pub file_name: String,
    pub features: FeatureVector,
    pub label: Configuration,
}

impl DatasetRow {
    /// Feature keys in schema order, then the label.
    pub fn header() -> Vec<&'static str> {
        FeatureKey::ALL
            .iter()
            .map(|key| key.name())
            .chain(["label"])
            .collect()
    }

    pub fn record(&self) -> Vec<String> {
        self.features
            .values()
            .iter()
            .map(u64::to_string)
            .chain([self.label.to_string()])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::{OptLevel, Toggle};

    #[test]
    fn record_matches_header() {
        let row = DatasetRow {
            file_name: "prog.c".to_string(),
            features: FeatureVector::from_texts("entry:\n  %x = add i32 1, 2\n", "for (;;) {}\n"),
            label: Configuration::paired(OptLevel::Os, Toggle::OmitFramePointer),
        };
        let header = DatasetRow::header();
        let record = row.record();
        assert_eq!(header.len(), FeatureKey::COUNT + 1);
        assert_eq!(record.len(), header.len());
        assert_eq!(header[6], "br i1");
        assert_eq!(record, ["1", "0", "0", "0", "0", "0", "0", "1", "1", "2", "sf"]);
    }
}
