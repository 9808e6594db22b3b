//! Summary of one generation run.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::Warning;

/// A file written by the run, with the SHA-256 of its contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub sha256: String,
}

impl GeneratedFile {
    pub fn new(path: PathBuf, contents: &[u8]) -> Self {
        GeneratedFile {
            path,
            sha256: digest(contents),
        }
    }
}

fn digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().iter().map(|b| format!("{b:02x}")).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub files: Vec<GeneratedFile>,
    /// Distinct native entry points declared in `Messaging`.
    pub entry_points: usize,
    pub trampolines: usize,
    pub warnings: Vec<Warning>,
    #[serde(serialize_with = "as_millis")]
    pub elapsed: Duration,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u128(d.as_millis())
}

impl GenerationReport {
    /// Generated paths, one per line, in generation order.
    pub fn file_list(&self) -> String {
        self.files
            .iter()
            .map(|f| format!("{}\n", f.path.display()))
            .collect()
    }
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files, {} entry points, {} trampolines, {} warnings in {:.2?}",
            self.files.len(),
            self.entry_points,
            self.trampolines,
            self.warnings.len(),
            self.elapsed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> GenerationReport {
        GenerationReport {
            files: vec![
                GeneratedFile::new(PathBuf::from("out/Demo/Widget.g.cs"), b"abc"),
                GeneratedFile::new(PathBuf::from("out/ObjCRuntime/Messaging.g.cs"), b""),
            ],
            entry_points: 3,
            trampolines: 1,
            warnings: vec![Warning {
                code: 1103,
                message: "'Widget' does not live under a namespace".to_string(),
            }],
            elapsed: Duration::from_millis(42),
        }
    }

    #[test]
    fn digests_are_lowercase_hex() {
        let r = report();
        assert_eq!(
            r.files[0].sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn serializes_to_json() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["entry_points"], 3);
        assert_eq!(json["elapsed"], 42);
        assert_eq!(json["files"][1]["path"], "out/ObjCRuntime/Messaging.g.cs");
        assert_eq!(json["warnings"][0]["code"], 1103);
    }

    #[test]
    fn file_list_and_summary() {
        let r = report();
        assert_eq!(r.file_list(), "out/Demo/Widget.g.cs\nout/ObjCRuntime/Messaging.g.cs\n");
        assert!(r.to_string().starts_with("2 files, 3 entry points, 1 trampolines, 1 warnings in "));
    }
}
