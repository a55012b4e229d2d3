use crate::dataset::{DatasetRow, Error, record::append};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Append-only CSV dataset. The header is written when the file is created
/// and checked when it already has content.
pub struct DatasetWriter {
    path: PathBuf,
}

impl DatasetWriter {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let expected = DatasetRow::header();
        let has_content = match fs::metadata(path) {
            Ok(metadata) => metadata.len() > 0,
            Err(_) => false,
        };

        if has_content {
            let mut reader = csv::Reader::from_path(path)?;
            let found = reader.headers()?;
            if !found.iter().eq(expected.iter().copied()) {
                return Err(Error::HeaderMismatch {
                    path: path.to_path_buf(),
                    expected: expected.iter().map(|name| name.to_string()).collect(),
                    found: found.iter().map(String::from).collect(),
                });
            }
        } else {
            append(path, &encode(&expected)?).map_err(Error::io(path))?;
        }

        Ok(DatasetWriter {
            path: path.to_path_buf(),
        })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, row: &DatasetRow) -> Result<(), Error> {
        append(&self.path, &encode(&row.record())?).map_err(Error::io(&self.path))
    }
}

/// Formats one CSV line in memory.
fn encode<I, T>(record: I) -> Result<Vec<u8>, Error>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(record)?;
    writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        features::FeatureVector,
        flags::{Configuration, OptLevel},
    };

    fn row(name: &str) -> DatasetRow {
        DatasetRow {
            file_name: name.to_string(),
            features: FeatureVector::from_texts("", ""),
            label: Configuration::pure(OptLevel::O3),
        }
    }

    #[test]
    fn header_is_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("code_dataset.csv");

        DatasetWriter::open(&path).unwrap().append(&row("a.c")).unwrap();
        DatasetWriter::open(&path).unwrap().append(&row("b.c")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines = content.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "add,mul,load,store,call,define,br i1,loops,basic_blocks,total_instructions,label"
        );
        assert_eq!(lines[1], "0,0,0,0,0,0,0,0,0,0,3");
        assert_eq!(lines[1], lines[2]);
    }

    #[test]
    fn foreign_header_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("code_dataset.csv");
        fs::write(&path, "filename,label\nprog.c,3\n").unwrap();

        assert!(matches!(
            DatasetWriter::open(&path),
            Err(Error::HeaderMismatch { .. })
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), "filename,label\nprog.c,3\n");
    }

    #[test]
    fn empty_file_gets_a_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("code_dataset.csv");
        fs::write(&path, "").unwrap();

        DatasetWriter::open(&path).unwrap();
        assert!(fs::read_to_string(&path).unwrap().starts_with("add,mul,"));
    }
}
