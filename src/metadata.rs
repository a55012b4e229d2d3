use crate::criterion::Criterion;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

/// Toolchain and measurement settings, read from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub compiler: String,
    /// Appended after the output path of every candidate compilation.
    pub compiler_arguments: Vec<String>,
    pub ir_compiler: String,
    /// Placed before the source path when dumping the intermediate form.
    pub ir_arguments: Vec<String>,
    pub compile_timeout_ms: Option<u64>,
    pub run_timeout_ms: Option<u64>,
    pub repetition: usize,
    pub criterion: Criterion,
}

impl Default for Metadata {
    fn default() -> Self {
        Metadata {
            compiler: "clang".to_string(),
            compiler_arguments: vec!["-lm".to_string()],
            ir_compiler: "clang".to_string(),
            ir_arguments: vec![
                "-O0".to_string(),
                "-S".to_string(),
                "-emit-llvm".to_string(),
            ],
            compile_timeout_ms: None,
            run_timeout_ms: None,
            repetition: 1,
            criterion: Criterion::default(),
        }
    }
}

impl Metadata {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let metadata = serde_json::from_str::<Metadata>(&content)?;
        if metadata.repetition == 0 {
            anyhow::bail!("repetition must be greater than 0");
        }
        Ok(metadata)
    }

    #[inline]
    pub fn compile_timeout(&self) -> Option<Duration> {
        self.compile_timeout_ms.map(Duration::from_millis)
    }

    #[inline]
    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_ms.map(Duration::from_millis)
    }
}
