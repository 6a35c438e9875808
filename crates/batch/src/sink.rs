//! Download trigger: hand an artifact to the host environment.

use crate::error::{BatchError, Result};
use crate::package::Artifact;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Receives the final artifact and saves it somewhere.
pub trait DownloadSink {
    /// Save `artifact`, returning where it ended up
    fn save(&mut self, artifact: &Artifact) -> Result<PathBuf>;
}

/// Writes artifacts into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    overwrite: bool,
}

impl DirectorySink {
    /// Sink writing into `dir`, refusing to replace existing files
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            overwrite: false,
        }
    }

    /// Allow replacing existing files
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Target directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    fn save(&mut self, artifact: &Artifact) -> Result<PathBuf> {
        // Artifact names come from user file names; keep only the final component.
        let file_name = Path::new(&artifact.name)
            .file_name()
            .ok_or_else(|| BatchError::Packaging(format!("Invalid artifact name: {}", artifact.name)))?;
        let path = self.dir.join(file_name);

        std::fs::create_dir_all(&self.dir)?;
        let mut file = if self.overwrite {
            OpenOptions::new().write(true).create(true).truncate(true).open(&path)?
        } else {
            OpenOptions::new().write(true).create_new(true).open(&path)?
        };
        file.write_all(&artifact.data)?;

        info!(path = %path.display(), bytes = artifact.data.len(), "Saved artifact");
        Ok(path)
    }
}

/// Keeps artifacts in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    /// Saved artifacts in order
    pub saved: Vec<Artifact>,
}

impl DownloadSink for MemorySink {
    fn save(&mut self, artifact: &Artifact) -> Result<PathBuf> {
        self.saved.push(artifact.clone());
        Ok(PathBuf::from(&artifact.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::ArtifactKind;
    use tempfile::TempDir;

    fn artifact(name: &str, data: &[u8]) -> Artifact {
        Artifact {
            name: name.to_string(),
            media_type: "image/jpeg".to_string(),
            data: data.to_vec(),
            kind: ArtifactKind::Single,
            entries: 1,
        }
    }

    #[test]
    fn test_directory_sink_writes_file() {
        let dir = TempDir::new().unwrap();
        let mut sink = DirectorySink::new(dir.path().join("out"));

        let path = sink.save(&artifact("a_converted.jpg", b"jpeg")).unwrap();

        assert_eq!(path, dir.path().join("out").join("a_converted.jpg"));
        assert_eq!(std::fs::read(&path).unwrap(), b"jpeg");
    }

    #[test]
    fn test_directory_sink_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let mut sink = DirectorySink::new(dir.path());
        sink.save(&artifact("a.jpg", b"one")).unwrap();

        let err = sink.save(&artifact("a.jpg", b"two")).unwrap_err();
        assert!(matches!(err, BatchError::IoError(_)));
        assert_eq!(std::fs::read(dir.path().join("a.jpg")).unwrap(), b"one");
    }

    #[test]
    fn test_directory_sink_overwrite() {
        let dir = TempDir::new().unwrap();
        let mut sink = DirectorySink::new(dir.path()).overwrite(true);
        sink.save(&artifact("a.jpg", b"one")).unwrap();
        sink.save(&artifact("a.jpg", b"two")).unwrap();
        assert_eq!(std::fs::read(dir.path().join("a.jpg")).unwrap(), b"two");
    }

    #[test]
    fn test_directory_sink_strips_directories() {
        let dir = TempDir::new().unwrap();
        let mut sink = DirectorySink::new(dir.path());
        let path = sink.save(&artifact("../escape.jpg", b"x")).unwrap();
        assert_eq!(path, dir.path().join("escape.jpg"));
    }
}
