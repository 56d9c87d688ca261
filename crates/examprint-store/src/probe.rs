//! Question image lookup in a directory.

use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use examprint_core::traits::{FileProbe, FileStatus};

/// Looks question images up by file name in one directory.
pub struct DirectoryProbe {
    dir: PathBuf,
}

impl DirectoryProbe {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl FileProbe for DirectoryProbe {
    fn probe(&self, file_name: &str) -> FileStatus {
        let path = self.dir.join(file_name);
        let meta = match std::fs::metadata(&path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return FileStatus::Missing,
            Err(_) => return FileStatus::Unreadable,
        };
        if !meta.is_file() {
            return FileStatus::Unreadable;
        }
        if meta.len() == 0 {
            return FileStatus::Empty;
        }
        match File::open(&path) {
            Ok(_) => FileStatus::Readable,
            Err(_) => FileStatus::Unreadable,
        }
    }

    fn locate(&self, file_name: &str) -> String {
        self.dir.join(file_name).display().to_string()
    }
}
