//! Output layer: cell layout of the Summary sheet, workbook writers and
//! plot rendering. Writers build complete files in memory; [`persist`]
//! moves them into place.

pub mod layout;
pub mod plot;
pub mod workbook;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{ReportError, Result};

/// A fully rendered output file waiting to be written.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            bytes,
        }
    }
}

/// Create `dir` (and parents) if it does not exist yet.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| ReportError::io(dir, e))
}

/// Write every artifact to a temporary file in its target directory, then
/// rename them all over their destinations.
///
/// Nothing is renamed until every temporary file is fully written and
/// synced; a failure before that drops the temporaries and leaves every
/// destination untouched.
pub fn persist(artifacts: &[Artifact]) -> Result<()> {
    let staged = artifacts
        .iter()
        .map(|artifact| stage(&artifact.path, &artifact.bytes))
        .collect::<Result<Vec<_>>>()?;

    for (tmp, artifact) in staged.into_iter().zip(artifacts) {
        tmp.persist(&artifact.path)
            .map_err(|e| ReportError::io(&artifact.path, e.error))?;
        log::info!("Wrote {}", artifact.path.display());
    }
    Ok(())
}

fn stage(path: &Path, bytes: &[u8]) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ReportError::io(dir, e))?;
    tmp.write_all(bytes).map_err(|e| ReportError::io(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| ReportError::io(tmp.path(), e))?;
    Ok(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persist_replaces_existing_file_and_leaves_no_scratch() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("Results.xlsx");
        fs::write(&target, b"old").unwrap();

        persist(&[Artifact::new(&target, b"new contents".to_vec())]).unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"new contents");
        let entries = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn missing_directory_is_an_io_error_naming_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("absent").join("plot.png");
        let err = persist(&[Artifact::new(&target, vec![1, 2, 3])]).unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn failed_artifact_leaves_earlier_destinations_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("Results.xlsx");
        fs::write(&first, b"previous run").unwrap();
        let unreachable = dir.path().join("absent").join("Caffeine.png");

        let err = persist(&[
            Artifact::new(&first, b"this run".to_vec()),
            Artifact::new(&unreachable, vec![1, 2, 3]),
        ])
        .unwrap_err();

        assert!(matches!(err, ReportError::Io { ref path, .. } if path.ends_with("absent")));
        assert_eq!(fs::read(&first).unwrap(), b"previous run");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
