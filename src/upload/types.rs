use std::path::PathBuf;
use std::sync::Arc;

/// Reference to the bytes behind a selected or dropped file.
///
/// The file picker always yields a path; OS drops may carry a path, raw
/// bytes, or (on some platforms) only a name. The simulated transport needs
/// none of the content, but a real one would read whichever side is present.
#[derive(Debug, Clone)]
pub struct FileHandle {
    pub name: String,
    pub path: Option<PathBuf>,
    pub bytes: Option<Arc<[u8]>>,
}

impl FileHandle {
    pub fn from_path(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            path: Some(path),
            bytes: None,
        }
    }

    pub fn from_dropped(file: &egui::DroppedFile) -> Self {
        let name = if file.name.is_empty() {
            file.path
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "unnamed".to_string())
        } else {
            file.name.clone()
        };
        Self {
            name,
            path: file.path.clone(),
            bytes: file.bytes.clone(),
        }
    }

    /// Human-readable description of where the bytes live.
    pub fn origin(&self) -> String {
        match (&self.path, &self.bytes) {
            (Some(path), _) => path.display().to_string(),
            (None, Some(bytes)) => {
                format!("{} in memory", crate::utils::format_size(bytes.len() as u64))
            }
            (None, None) => "name only".to_string(),
        }
    }
}

/// Messages sent from upload tasks back to the UI thread.
///
/// Events carry batch and file indices so the receiver resolves them against
/// the batch list as it is *now*, never against a snapshot captured when the
/// upload was started.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    Progress {
        batch: usize,
        file: usize,
        loaded: u64,
        total: u64,
    },
    Settled {
        batch: usize,
        file: usize,
        outcome: Result<(), super::UploadError>,
    },
}
