//! Lưu lịch sử dưới dạng một tệp JSON.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use vetreport_core::{HistoryBackend, ReportError};

#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HistoryBackend for FileBackend {
    fn load(&self) -> Result<Option<String>, ReportError> {
        match fs::read_to_string(&self.path) {
            Ok(payload) => Ok(Some(payload)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(ReportError::Storage(format!(
                "{}: {err}",
                self.path.display()
            ))),
        }
    }

    fn save(&mut self, payload: &str) -> Result<(), ReportError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|err| ReportError::Storage(format!("{}: {err}", parent.display())))?;
        }
        fs::write(&self.path, payload)
            .map_err(|err| ReportError::Storage(format!("{}: {err}", self.path.display())))
    }
}
