use crate::{
    compile,
    fitness::Fitness,
    flags::Configuration,
    metadata::Metadata,
};
use std::{ffi::OsStr, io, path::Path, time::Duration};
use tempfile::TempDir;
use tracing::debug;

/// Anything that can put a number on how well a configuration performs for a
/// source file.
pub trait Harness: Sync {
    fn measure(&self, source: &Path, configuration: &Configuration) -> Fitness;
}

/// Compiles candidates into a private scratch directory and times the
/// resulting binaries.
pub struct Runner {
    metadata: Metadata,
    scratch: TempDir,
}

impl Runner {
    pub fn new(metadata: Metadata) -> io::Result<Self> {
        let scratch = tempfile::Builder::new().prefix("flagtuner").tempdir()?;
        Ok(Runner { metadata, scratch })
    }

    #[inline]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn run(&self, source: &Path, configuration: &Configuration) -> Result<Duration, compile::Error> {
        // Dropping the workspace removes the binary, whatever happened to it.
        let workspace = tempfile::Builder::new()
            .prefix("candidate-")
            .tempdir_in(self.scratch.path())?;
        let binary = workspace.path().join("a.out");

        compile::compile(
            &self.metadata.compiler,
            configuration
                .compiler_arguments()
                .into_iter()
                .map(OsStr::new)
                .chain([source.as_os_str(), OsStr::new("-o"), binary.as_os_str()])
                .chain(self.metadata.compiler_arguments.iter().map(OsStr::new)),
            self.metadata.compile_timeout(),
        )?;

        let repetition = self.metadata.repetition.max(1);
        let mut timings = Vec::with_capacity(repetition);
        for _ in 0..repetition {
            timings.push(compile::execute(&binary, self.metadata.run_timeout())?);
        }

        Ok(self
            .metadata
            .criterion
            .extract_representative(timings)
            .unwrap_or_default())
    }
}

impl Harness for Runner {
    fn measure(&self, source: &Path, configuration: &Configuration) -> Fitness {
        match self.run(source, configuration) {
            Ok(duration) => Fitness::Measured(duration),
            Err(compile::Error::Compilation {
                status,
                stderr: Some(stderr),
            }) => {
                debug!(%configuration, %status, "compilation failed:\n{}", stderr);
                Fitness::Unusable
            }
            Err(err) => {
                debug!(%configuration, "candidate unusable: {}", err);
                Fitness::Unusable
            }
        }
    }
}
