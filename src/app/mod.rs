mod state;
mod ui;

use eframe::{egui, App};
use std::sync::mpsc::{channel, Receiver, Sender};
use tracing::{info, warn};

use crate::upload::{FileHandle, MockTransport, UploadEvent};
use state::UploaderState;

/// Drag-and-drop batch uploader.
///
/// The UI thread owns all mutable state; upload tasks only ever hold cloned
/// [`Sender`]s and report back through [`UploadEvent`]s, which are drained
/// once per frame and applied against the live batch list.
pub struct DropUploader {
    state: UploaderState,
    transport: MockTransport,
    event_sender: Sender<UploadEvent>,
    event_receiver: Receiver<UploadEvent>,
}

impl DropUploader {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        info!("initializing batch file uploader");
        Self::with_transport(transport_from_env())
    }

    fn with_transport(transport: MockTransport) -> Self {
        let (event_sender, event_receiver) = channel();
        Self {
            state: UploaderState::default(),
            transport,
            event_sender,
            event_receiver,
        }
    }

    /// Entry point for both input paths: a picker selection or a drop.
    pub fn add_files(&mut self, handles: Vec<FileHandle>) {
        let count = handles.len();
        if let Some(index) = self.state.add_files(handles) {
            info!(batch = index, files = count, "opened batch, awaiting name");
        }
    }

    /// Names the pending batch and starts uploading every file in it.
    pub fn submit_batch_name(&mut self) {
        if let Some(index) = self.state.submit_name() {
            info!(
                batch = index,
                name = %self.state.batches[index].name,
                "batch named, starting uploads"
            );
            self.start_batch_upload(index);
        }
    }

    /// Spawns a thread with its own runtime for the batch; every file gets
    /// its own task so transfers run concurrently, in file order.
    fn start_batch_upload(&mut self, batch_index: usize) {
        let handles: Vec<FileHandle> = self.state.batches[batch_index]
            .files
            .iter()
            .map(|file| file.handle.clone())
            .collect();
        let transport = self.transport.clone();
        let sender = self.event_sender.clone();

        std::thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async move {
                let mut tasks = Vec::with_capacity(handles.len());

                for (file_index, handle) in handles.into_iter().enumerate() {
                    let transport = transport.clone();
                    let sender = sender.clone();

                    tasks.push(tokio::spawn(async move {
                        let progress_sender = sender.clone();
                        let outcome = transport
                            .upload(&handle, move |loaded, total| {
                                progress_sender
                                    .send(UploadEvent::Progress {
                                        batch: batch_index,
                                        file: file_index,
                                        loaded,
                                        total,
                                    })
                                    .unwrap_or_default();
                            })
                            .await;

                        sender
                            .send(UploadEvent::Settled {
                                batch: batch_index,
                                file: file_index,
                                outcome,
                            })
                            .unwrap_or_default();
                    }));
                }

                for task in tasks {
                    let _ = task.await;
                }
            });
        });
    }

    /// Drains pending upload events and applies them to the batch list.
    pub fn update_state(&mut self, ctx: &egui::Context) {
        let mut had_updates = false;
        while let Ok(event) = self.event_receiver.try_recv() {
            self.state.apply(event);
            had_updates = true;
        }

        if had_updates || self.state.uploads_in_flight() {
            ctx.request_repaint();
        }
    }
}

impl App for DropUploader {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_state(ctx);
        self.render(ctx);
    }
}

fn transport_from_env() -> MockTransport {
    let transport = MockTransport::new();
    match std::env::var("DROP_UPLOADER_FAIL_AFTER") {
        Ok(value) => match value.parse::<u64>() {
            Ok(bytes) => {
                info!(bytes, "transport failure injection enabled");
                transport.fail_after(bytes)
            }
            Err(_) => {
                warn!(%value, "ignoring unparsable DROP_UPLOADER_FAIL_AFTER");
                transport
            }
        },
        Err(_) => transport,
    }
}

#[cfg(test)]
mod tests {
    use super::state::UploadStatus;
    use super::*;
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    fn handles(names: &[&str]) -> Vec<FileHandle> {
        names
            .iter()
            .map(|name| FileHandle::from_path(PathBuf::from(name)))
            .collect()
    }

    /// Drains the event channel into the state until every file of every
    /// named batch has settled, or the deadline passes.
    fn drain_until_settled(app: &mut DropUploader) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while app.state.uploads_in_flight() && Instant::now() < deadline {
            if let Ok(event) = app.event_receiver.recv_timeout(Duration::from_millis(100)) {
                app.state.apply(event);
            }
        }
        assert!(!app.state.uploads_in_flight(), "uploads never settled");
    }

    #[test]
    fn submitted_batch_uploads_every_file() {
        let mut app =
            DropUploader::with_transport(MockTransport::with_total_size(120_000).instant());

        app.add_files(handles(&["a.csv", "b.csv"]));
        app.state.name_input = "Evidence A".to_string();
        app.submit_batch_name();

        drain_until_settled(&mut app);

        let batch = &app.state.batches[0];
        assert_eq!(batch.name, "Evidence A");
        for file in &batch.files {
            assert_eq!(file.status, UploadStatus::Success);
            assert_eq!(file.progress, 100.0);
        }
    }

    #[test]
    fn two_batches_upload_independently() {
        let mut app =
            DropUploader::with_transport(MockTransport::with_total_size(60_000).instant());

        app.add_files(handles(&["a.csv"]));
        app.state.name_input = "first".to_string();
        app.submit_batch_name();

        app.add_files(handles(&["b.csv", "c.csv"]));
        app.state.name_input = "second".to_string();
        app.submit_batch_name();

        drain_until_settled(&mut app);

        assert_eq!(app.state.batches.len(), 2);
        for batch in &app.state.batches {
            for file in &batch.files {
                assert_eq!(file.status, UploadStatus::Success);
            }
        }
    }

    #[test]
    fn injected_failure_marks_the_record_failed() {
        let mut app = DropUploader::with_transport(
            MockTransport::with_total_size(200_000)
                .instant()
                .fail_after(60_000),
        );

        app.add_files(handles(&["doomed.csv"]));
        app.state.name_input = "bad luck".to_string();
        app.submit_batch_name();

        drain_until_settled(&mut app);

        match &app.state.batches[0].files[0].status {
            UploadStatus::Failed(message) => {
                assert!(message.contains("aborted"), "unexpected message: {message}")
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
