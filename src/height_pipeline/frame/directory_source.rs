use std::path::{Path, PathBuf};

use tracing::debug;

use crate::height_pipeline::common::error::{ProcessorError, Result};
use crate::height_pipeline::frame::source::FrameSource;

/// Yields the contents of every file in a directory, ordered by file name.
pub struct DirectoryFrameSource {
    files: Vec<PathBuf>,
    next: usize,
}

impl DirectoryFrameSource {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| {
            ProcessorError::SourceError(format!("{}: {}", dir.display(), e))
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        debug!("Found {} frame files in {}", files.len(), dir.display());
        Ok(Self { files, next: 0 })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FrameSource for DirectoryFrameSource {
    fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        let Some(path) = self.files.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;

        let bytes = std::fs::read(path).map_err(|e| {
            ProcessorError::SourceError(format!("{}: {}", path.display(), e))
        })?;
        Ok(Some(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_files_in_name_order_then_end_of_stream() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.bin"), b"second").unwrap();
        std::fs::write(dir.path().join("a.bin"), b"first").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let mut source = DirectoryFrameSource::open(dir.path()).unwrap();
        assert_eq!(source.len(), 2);

        assert_eq!(source.next_frame().unwrap().as_deref(), Some(&b"first"[..]));
        assert_eq!(source.next_frame().unwrap().as_deref(), Some(&b"second"[..]));
        assert!(source.next_frame().unwrap().is_none());
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn missing_directory_is_a_source_error() {
        let result = DirectoryFrameSource::open("/nonexistent/frames/dir");
        assert!(matches!(result, Err(ProcessorError::SourceError(_))));
    }
}
