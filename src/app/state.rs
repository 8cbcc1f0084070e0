use crate::upload::{FileHandle, UploadEvent};

/// Where one file sits in its upload lifecycle.
///
/// A file stays `InProgress` until exactly one terminal variant is reached,
/// and never leaves a terminal variant afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadStatus {
    InProgress,
    Success,
    Failed(String),
}

/// Per-file upload state within a batch.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub name: String,
    pub handle: FileHandle,
    /// Percentage in `[0, 100]`; only meaningful while `InProgress`.
    pub progress: f32,
    pub status: UploadStatus,
}

impl FileRecord {
    fn new(handle: FileHandle) -> Self {
        Self {
            name: handle.name.clone(),
            handle,
            progress: 0.0,
            status: UploadStatus::InProgress,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.status != UploadStatus::InProgress
    }
}

/// A user-named group of files uploaded together under one label.
///
/// The file set is fixed when the batch is created; naming it starts the
/// uploads and nothing is ever added afterwards.
#[derive(Debug, Clone)]
pub struct FileBatch {
    pub name: String,
    pub files: Vec<FileRecord>,
}

impl FileBatch {
    fn from_handles(handles: Vec<FileHandle>) -> Self {
        Self {
            name: String::new(),
            files: handles.into_iter().map(FileRecord::new).collect(),
        }
    }

    pub fn is_named(&self) -> bool {
        !self.name.is_empty()
    }
}

/// Which input surface the main panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiMode {
    #[default]
    SelectFiles,
    NameBatch,
}

/// Session state behind the widget.
///
/// Owned and mutated only by the UI thread. Upload tasks report through
/// [`UploadEvent`]s, and [`UploaderState::apply`] resolves their indices
/// against the batch list as it is now, so concurrent uploads and later
/// batches never act on stale records.
#[derive(Default)]
pub struct UploaderState {
    pub batches: Vec<FileBatch>,
    pub mode: UiMode,
    pub name_input: String,
}

impl UploaderState {
    /// Opens a new unnamed batch for the selection and switches the panel
    /// to the naming form. Empty selections are ignored.
    ///
    /// Always appends a fresh batch: earlier batches keep their file sets
    /// no matter what state they are in.
    pub fn add_files(&mut self, handles: Vec<FileHandle>) -> Option<usize> {
        if handles.is_empty() {
            return None;
        }
        self.batches.push(FileBatch::from_handles(handles));
        self.mode = UiMode::NameBatch;
        Some(self.batches.len() - 1)
    }

    /// Names the most recently added batch with the current input text and
    /// returns its index. Empty input is rejected; the submit button is
    /// disabled then, this is the backstop.
    pub fn submit_name(&mut self) -> Option<usize> {
        if self.name_input.is_empty() {
            return None;
        }
        let index = self.batches.len().checked_sub(1)?;
        let batch = &mut self.batches[index];
        if batch.is_named() {
            return None;
        }
        batch.name = std::mem::take(&mut self.name_input);
        self.mode = UiMode::SelectFiles;
        Some(index)
    }

    /// Applies one upload event to the current batch list.
    ///
    /// Events for unknown indices or already-settled records are dropped:
    /// terminal states never revert and late progress is meaningless.
    pub fn apply(&mut self, event: UploadEvent) {
        match event {
            UploadEvent::Progress {
                batch,
                file,
                loaded,
                total,
            } => {
                if let Some(record) = self.record_mut(batch, file) {
                    if !record.is_settled() && total > 0 {
                        record.progress = loaded as f32 / total as f32 * 100.0;
                    }
                }
            }
            UploadEvent::Settled {
                batch,
                file,
                outcome,
            } => {
                if let Some(record) = self.record_mut(batch, file) {
                    if !record.is_settled() {
                        record.status = match outcome {
                            Ok(()) => UploadStatus::Success,
                            Err(err) => UploadStatus::Failed(err.to_string()),
                        };
                    }
                }
            }
        }
    }

    /// True while any named batch still has unsettled files.
    pub fn uploads_in_flight(&self) -> bool {
        self.batches
            .iter()
            .filter(|batch| batch.is_named())
            .any(|batch| batch.files.iter().any(|file| !file.is_settled()))
    }

    fn record_mut(&mut self, batch: usize, file: usize) -> Option<&mut FileRecord> {
        self.batches.get_mut(batch)?.files.get_mut(file)
    }
}
