use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio::time::sleep;
use tracing::debug;

use crate::utils::format_size;

use super::types::FileHandle;

/// Nominal duration of one transfer cycle on the simulated link.
const CHUNK_LATENCY: Duration = Duration::from_millis(1_000);

/// Bytes moved per full transfer cycle.
const UPLOAD_RATE: u64 = 50_000;

/// Simulated file sizes are drawn uniformly from this range.
const MIN_SIMULATED_SIZE: u64 = 10_000;
const MAX_SIMULATED_SIZE: u64 = 1_000_000;

/// Terminal transport failure.
///
/// The simulation only produces this when failure injection is enabled; a
/// real transport would map network errors into it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("transfer aborted after {loaded} of {total} bytes")]
    Aborted { loaded: u64, total: u64 },
}

/// Chunked upload simulation standing in for a real network client.
///
/// Each file is assigned a simulated size and transferred in
/// [`UPLOAD_RATE`]-sized chunks, sleeping one latency cycle per full chunk
/// before reporting progress. The blob's actual content is never read.
#[derive(Debug, Clone)]
pub struct MockTransport {
    chunk_size: u64,
    chunk_latency: Duration,
    fixed_size: Option<u64>,
    fail_after: Option<u64>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            chunk_size: UPLOAD_RATE,
            chunk_latency: CHUNK_LATENCY,
            fixed_size: None,
            fail_after: None,
        }
    }

    /// Aborts any transfer once at least `bytes` have been reported, so the
    /// failure row can be exercised without a real network.
    pub fn fail_after(mut self, bytes: u64) -> Self {
        self.fail_after = Some(bytes);
        self
    }

    /// Pins the simulated size instead of drawing one at random.
    #[cfg(test)]
    pub(crate) fn with_total_size(total: u64) -> Self {
        Self {
            fixed_size: Some(total),
            ..Self::new()
        }
    }

    #[cfg(test)]
    pub(crate) fn instant(mut self) -> Self {
        self.chunk_latency = Duration::ZERO;
        self
    }

    fn simulated_total(&self) -> u64 {
        match self.fixed_size {
            Some(size) => size,
            None => rand::thread_rng().gen_range(MIN_SIMULATED_SIZE..MAX_SIMULATED_SIZE),
        }
    }

    /// Transfers `blob`, invoking `on_progress(loaded, total)` after every
    /// chunk. Resolves once `loaded == total`; the final progress call
    /// reports the full size.
    pub async fn upload<F>(&self, blob: &FileHandle, on_progress: F) -> Result<(), UploadError>
    where
        F: Fn(u64, u64),
    {
        let total = self.simulated_total();
        debug!(file = %blob.name, size = %format_size(total), "starting simulated upload");

        let mut loaded = 0u64;
        while loaded < total {
            let chunk = (total - loaded).min(self.chunk_size);
            // One cycle per full chunk; the final partial chunk rounds to
            // the nearest whole cycle, so a tail under half a chunk sleeps
            // zero. Preserved pacing quirk, not corrected.
            let cycles = (chunk as f64 / self.chunk_size as f64).round() as u32;
            loaded += chunk;

            sleep(self.chunk_latency * cycles).await;
            on_progress(loaded, total);

            if let Some(threshold) = self.fail_after {
                if loaded >= threshold && loaded < total {
                    return Err(UploadError::Aborted { loaded, total });
                }
            }
        }

        Ok(())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use tokio::time::Instant;

    fn blob(name: &str) -> FileHandle {
        FileHandle::from_path(PathBuf::from(name))
    }

    #[tokio::test(start_paused = true)]
    async fn reports_progress_at_every_chunk_boundary() {
        let transport = MockTransport::with_total_size(120_000);
        let events = RefCell::new(Vec::new());

        transport
            .upload(&blob("report.csv"), |loaded, total| {
                events.borrow_mut().push((loaded, total));
            })
            .await
            .unwrap();

        assert_eq!(
            events.into_inner(),
            vec![(50_000, 120_000), (100_000, 120_000), (120_000, 120_000)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn progress_is_monotonic_and_ends_at_total() {
        let transport = MockTransport::new();
        let events = RefCell::new(Vec::new());

        transport
            .upload(&blob("random.csv"), |loaded, total| {
                events.borrow_mut().push((loaded, total));
            })
            .await
            .unwrap();

        let events = events.into_inner();
        let (_, total) = events[0];
        assert!((MIN_SIMULATED_SIZE..MAX_SIMULATED_SIZE).contains(&total));
        assert!(events.windows(2).all(|w| w[0].0 < w[1].0));
        assert_eq!(events.last().copied(), Some((total, total)));
    }

    #[tokio::test(start_paused = true)]
    async fn short_final_chunk_adds_no_delay() {
        // 120_000 = two full chunks plus a 20_000 tail, which rounds down.
        let transport = MockTransport::with_total_size(120_000);
        let start = Instant::now();

        transport.upload(&blob("a.csv"), |_, _| {}).await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_millis(2_000));
    }

    #[tokio::test(start_paused = true)]
    async fn long_final_chunk_costs_a_full_cycle() {
        // 80_000 = one full chunk plus a 30_000 tail, which rounds up.
        let transport = MockTransport::with_total_size(80_000);
        let start = Instant::now();

        transport.upload(&blob("b.csv"), |_, _| {}).await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_millis(2_000));
    }

    #[tokio::test(start_paused = true)]
    async fn fail_after_aborts_mid_transfer() {
        let transport = MockTransport::with_total_size(200_000).fail_after(60_000);
        let events = RefCell::new(Vec::new());

        let err = transport
            .upload(&blob("doomed.csv"), |loaded, total| {
                events.borrow_mut().push((loaded, total));
            })
            .await
            .unwrap_err();

        assert_eq!(
            err,
            UploadError::Aborted {
                loaded: 100_000,
                total: 200_000
            }
        );
        // The threshold is crossed on the second chunk; nothing after it.
        assert_eq!(events.into_inner().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fail_after_beyond_total_never_triggers() {
        let transport = MockTransport::with_total_size(80_000).fail_after(10_000_000);

        assert!(transport.upload(&blob("fine.csv"), |_, _| {}).await.is_ok());
    }
}
