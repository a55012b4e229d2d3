use crate::dataset::Error;
use fxhash::FxHashSet;
use std::{
    ffi::OsString,
    fs::{self, File, OpenOptions, TryLockError},
    io::{self, Write},
    path::{Path, PathBuf},
};

/// Newline separated names of files that already have a dataset row.
///
/// A loaded record holds an exclusive lock on `<path>.lock` until dropped, so
/// two corpus runs never share one record.
pub struct ProcessedRecord {
    path: PathBuf,
    names: FxHashSet<String>,
    _lock: File,
}

impl ProcessedRecord {
    /// Locks and reads the whole record. A missing file is an empty record.
    /// Fails with [`Error::Locked`] while another record on the same path is
    /// alive, in this process or another.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let lock = lock(path)?;
        let names = match fs::read_to_string(path) {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => FxHashSet::default(),
            Err(err) => return Err(Error::io(path)(err)),
        };
        Ok(ProcessedRecord {
            path: path.to_path_buf(),
            names,
            _lock: lock,
        })
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Persists `name` before returning.
    pub fn mark(&mut self, name: &str) -> Result<(), Error> {
        append(&self.path, format!("{}\n", name).as_bytes()).map_err(Error::io(&self.path))?;
        self.names.insert(name.to_string());
        Ok(())
    }
}

fn lock(path: &Path) -> Result<File, Error> {
    let mut name = OsString::from(path.as_os_str());
    name.push(".lock");
    let lock_path = PathBuf::from(name);

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(Error::io(&lock_path))?;
    match file.try_lock() {
        Ok(()) => Ok(file),
        Err(TryLockError::WouldBlock) => Err(Error::Locked(path.to_path_buf())),
        Err(TryLockError::Error(err)) => Err(Error::io(&lock_path)(err)),
    }
}

/// One `write_all` on an append-mode handle, so concurrent writers never
/// interleave within a line.
pub(crate) fn append(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(bytes)?;
    file.flush()
}
