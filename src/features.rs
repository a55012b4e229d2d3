//! Static feature counts over the unoptimized LLVM IR of a C file.
//!
//! Counting is line based: a line contributes one to every key whose token it
//! contains, so a line may count towards several keys. Loops are counted on
//! the C source instead of the IR.

use crate::{compile, metadata::Metadata};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Serialize, Serializer, ser::SerializeMap};
use std::{
    ffi::OsStr,
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

lazy_static! {
    static ref BASIC_BLOCK: Regex = Regex::new(r"^[A-Za-z0-9_.]+:").unwrap();
    static ref LOOP: Regex = Regex::new(r"\b(for|while|do)\b").unwrap();
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("source file {0} does not exist")]
    Missing(PathBuf),
    #[error("failed to dump intermediate representation: {0}")]
    Compile(#[from] compile::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Column order is fixed: the dataset and the predictor both rely on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKey {
    Add,
    Mul,
    Load,
    Store,
    Call,
    Define,
    ConditionalBranch,
    Loops,
    BasicBlocks,
    TotalInstructions,
}

impl FeatureKey {
    pub const COUNT: usize = 10;

    pub const ALL: [FeatureKey; FeatureKey::COUNT] = [
        FeatureKey::Add,
        FeatureKey::Mul,
        FeatureKey::Load,
        FeatureKey::Store,
        FeatureKey::Call,
        FeatureKey::Define,
        FeatureKey::ConditionalBranch,
        FeatureKey::Loops,
        FeatureKey::BasicBlocks,
        FeatureKey::TotalInstructions,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FeatureKey::Add => "add",
            FeatureKey::Mul => "mul",
            FeatureKey::Load => "load",
            FeatureKey::Store => "store",
            FeatureKey::Call => "call",
            FeatureKey::Define => "define",
            FeatureKey::ConditionalBranch => "br i1",
            FeatureKey::Loops => "loops",
            FeatureKey::BasicBlocks => "basic_blocks",
            FeatureKey::TotalInstructions => "total_instructions",
        }
    }

    /// The literal IR token for keys counted by containment.
    fn token(self) -> Option<&'static str> {
        match self {
            FeatureKey::Loops | FeatureKey::BasicBlocks | FeatureKey::TotalInstructions => None,
            key => Some(key.name()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureVector([u64; FeatureKey::COUNT]);

impl FeatureVector {
    pub fn from_texts(ir: &str, source: &str) -> Self {
        let mut counts = [0u64; FeatureKey::COUNT];
        for line in ir.lines() {
            for (index, key) in FeatureKey::ALL.iter().enumerate() {
                let matched = match key.token() {
                    Some(token) => line.contains(token),
                    None => *key == FeatureKey::BasicBlocks && BASIC_BLOCK.is_match(line),
                };
                if matched {
                    counts[index] += 1;
                }
            }
            counts[FeatureKey::TotalInstructions as usize] += 1;
        }
        counts[FeatureKey::Loops as usize] =
            source.lines().filter(|line| LOOP.is_match(line)).count() as u64;
        FeatureVector(counts)
    }

    #[inline]
    pub fn get(&self, key: FeatureKey) -> u64 {
        self.0[key as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (FeatureKey, u64)> + '_ {
        FeatureKey::ALL.iter().map(|key| (*key, self.get(*key)))
    }

    #[inline]
    pub fn values(&self) -> &[u64] {
        &self.0
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FeatureKey::COUNT))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key.name(), &value)?;
        }
        map.end()
    }
}

pub struct Extractor {
    compiler: String,
    arguments: Vec<String>,
    timeout: Option<Duration>,
}

impl Extractor {
    pub fn new(metadata: &Metadata) -> Self {
        Extractor {
            compiler: metadata.ir_compiler.clone(),
            arguments: metadata.ir_arguments.clone(),
            timeout: metadata.compile_timeout(),
        }
    }

    pub fn extract(&self, source: &Path) -> Result<FeatureVector, Error> {
        if !source.is_file() {
            return Err(Error::Missing(source.to_path_buf()));
        }
        let text = String::from_utf8_lossy(&fs::read(source)?).into_owned();

        let workspace = tempfile::Builder::new().prefix("flagtuner-ir").tempdir()?;
        let ir_path = workspace.path().join("module.ll");
        compile::compile(
            &self.compiler,
            self.arguments
                .iter()
                .map(OsStr::new)
                .chain([source.as_os_str(), OsStr::new("-o"), ir_path.as_os_str()]),
            self.timeout,
        )?;
        let ir = String::from_utf8_lossy(&fs::read(&ir_path)?).into_owned();

        Ok(FeatureVector::from_texts(&ir, &text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IR: &str = "\
; ModuleID = 'prog.c'
define dso_local i32 @main() #0 {
entry:
  %a = alloca i32, align 4
  store i32 1, ptr %a, align 4
  %0 = load i32, ptr %a, align 4
  %add = add nsw i32 %0, 2
  %sum = add nsw i32 %add, 3
  %prod = mul nsw i32 %sum, 4
  ret i32 %prod
}";

    #[test]
    fn counts_straight_line_program() {
        let features = FeatureVector::from_texts(IR, "int main(void) { return 0; }\n");
        assert_eq!(features.get(FeatureKey::Loops), 0);
        assert_eq!(features.get(FeatureKey::ConditionalBranch), 0);
        assert_eq!(
            features.get(FeatureKey::Add) + features.get(FeatureKey::Mul),
            3
        );
        assert_eq!(
            features.get(FeatureKey::Load) + features.get(FeatureKey::Store),
            2
        );
        assert_eq!(features.get(FeatureKey::Define), 1);
        assert_eq!(features.get(FeatureKey::BasicBlocks), 1);
        assert_eq!(
            features.get(FeatureKey::TotalInstructions),
            IR.lines().count() as u64
        );
    }

    #[test]
    fn one_line_can_match_several_keys() {
        let features = FeatureVector::from_texts("  call void @store_and_load()\n", "");
        assert_eq!(features.get(FeatureKey::Call), 1);
        assert_eq!(features.get(FeatureKey::Store), 1);
        assert_eq!(features.get(FeatureKey::Load), 1);
    }

    #[test]
    fn loops_are_whole_words_in_source() {
        let source = "\
for (i = 0; i < n; i++) {}
while (x) x--;
do { y++; } while (y < 3);
int format = done; /* forward */
";
        let features = FeatureVector::from_texts("", source);
        assert_eq!(features.get(FeatureKey::Loops), 3);
    }

    #[test]
    fn basic_blocks_are_label_lines() {
        let ir = "entry:\nfor.body:\n  br i1 %c, label %a, label %b\n  %x = add i32 1, 2 ; x:\n";
        let features = FeatureVector::from_texts(ir, "");
        assert_eq!(features.get(FeatureKey::BasicBlocks), 2);
        assert_eq!(features.get(FeatureKey::ConditionalBranch), 1);
    }

    #[test]
    fn serializes_in_schema_order() {
        let json = serde_json::to_string(&FeatureVector::from_texts("", "")).unwrap();
        assert!(json.starts_with("{\"add\":0,\"mul\":0,\"load\":0"));
        assert!(json.ends_with("\"basic_blocks\":0,\"total_instructions\":0}"));
    }

    #[test]
    fn missing_source_fails() {
        let extractor = Extractor::new(&Metadata::default());
        let result = extractor.extract(Path::new("/nonexistent/prog.c"));
        assert!(matches!(result, Err(Error::Missing(_))));
    }

    #[cfg(unix)]
    #[test]
    fn failed_dump_is_an_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("prog.c");
        fs::write(&source, "int main(void) { return 0; }\n").unwrap();
        let extractor = Extractor {
            compiler: "false".to_string(),
            arguments: Vec::new(),
            timeout: None,
        };
        assert!(matches!(extractor.extract(&source), Err(Error::Compile(_))));
    }

    /// Runs `extract` through a shell compiler that logs its `-o` path, then
    /// `tail` decides how the dump ends. Returns the result and the logged path.
    #[cfg(unix)]
    fn extract_with_dump(tail: &str) -> (Result<FeatureVector, Error>, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("prog.c");
        fs::write(&source, "int main(void) { return 0; }\n").unwrap();
        let log = dir.path().join("outputs.txt");
        let script = dir.path().join("dump.sh");
        fs::write(
            &script,
            format!(
                "while [ $# -gt 0 ]; do\n\
                 if [ \"$1\" = -o ]; then out=\"$2\"; fi\n\
                 shift\n\
                 done\n\
                 printf '%s\\n' \"$out\" >> '{}'\n\
                 {}\n",
                log.display(),
                tail
            ),
        )
        .unwrap();

        let extractor = Extractor {
            compiler: "sh".to_string(),
            arguments: vec![script.to_string_lossy().into_owned()],
            timeout: None,
        };
        let result = extractor.extract(&source);
        let logged = fs::read_to_string(&log).unwrap();
        assert_eq!(logged.lines().count(), 1);
        (result, std::path::PathBuf::from(logged.trim_end()))
    }

    #[cfg(unix)]
    #[test]
    fn ir_dump_is_removed_after_extraction() {
        let (result, dump) =
            extract_with_dump("printf 'entry:\\n  %%x = add i32 1, 2\\n' > \"$out\"");
        let features = result.unwrap();
        assert_eq!(features.get(FeatureKey::Add), 1);
        assert_eq!(dump.file_name().unwrap(), "module.ll");
        assert!(!dump.exists());
        assert!(!dump.parent().unwrap().exists());
    }

    #[cfg(unix)]
    #[test]
    fn ir_dump_is_removed_when_the_compiler_fails() {
        let (result, dump) = extract_with_dump("printf 'partial' > \"$out\"; exit 1");
        assert!(matches!(result, Err(Error::Compile(_))));
        assert!(!dump.exists());
        assert!(!dump.parent().unwrap().exists());
    }
}
