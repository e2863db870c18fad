use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use photo_grid_application::{ApplicationError, ImageReadPipeline, ReadOutcome, ReadRequest};
use tracing::debug;

use crate::codec::encode_image_file;

#[derive(Debug, Clone)]
struct ScheduledRead {
    sequence: u64,
    request: ReadRequest,
}

/// Reads image files on a worker thread. Reads that are overtaken by a
/// newer submission are dropped, either before they start or before their
/// result is posted.
pub struct BackgroundImageReader {
    next_sequence: AtomicU64,
    latest_sequence: Arc<AtomicU64>,
    submit_tx: mpsc::Sender<ScheduledRead>,
    result_rx: Mutex<mpsc::Receiver<ReadOutcome>>,
}

impl BackgroundImageReader {
    pub fn new() -> Self {
        let (submit_tx, submit_rx) = mpsc::channel::<ScheduledRead>();
        let (result_tx, result_rx) = mpsc::channel::<ReadOutcome>();
        let latest_sequence = Arc::new(AtomicU64::new(0));

        spawn_worker(submit_rx, result_tx, Arc::clone(&latest_sequence));

        Self {
            next_sequence: AtomicU64::new(0),
            latest_sequence,
            submit_tx,
            result_rx: Mutex::new(result_rx),
        }
    }

    fn claim_sequence(&self) -> u64 {
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.latest_sequence.store(sequence, Ordering::SeqCst);
        sequence
    }
}

impl Default for BackgroundImageReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageReadPipeline for BackgroundImageReader {
    fn submit_read(&self, request: ReadRequest) -> Result<u64, ApplicationError> {
        let sequence = self.claim_sequence();
        self.submit_tx
            .send(ScheduledRead { sequence, request })
            .map_err(|error| ApplicationError::Io(format!("failed to enqueue image read: {error}")))?;
        Ok(sequence)
    }

    fn try_receive(&self) -> Result<Option<ReadOutcome>, ApplicationError> {
        let receiver = self
            .result_rx
            .lock()
            .map_err(|_| ApplicationError::Io("image read lock poisoned".to_string()))?;

        let first = match receiver.try_recv() {
            Ok(outcome) => outcome,
            Err(mpsc::TryRecvError::Empty) => return Ok(None),
            Err(mpsc::TryRecvError::Disconnected) => {
                return Err(ApplicationError::Io(
                    "image read channel disconnected".to_string(),
                ))
            }
        };

        let mut newest = first;
        while let Ok(next) = receiver.try_recv() {
            debug!(dropped = newest.sequence, "superseded image read");
            newest = next;
        }

        Ok(Some(newest))
    }

    fn read_blocking(&self, request: ReadRequest) -> ReadOutcome {
        let sequence = self.claim_sequence();
        ReadOutcome {
            sequence,
            result: encode_image_file(&request.path),
        }
    }
}

fn spawn_worker(
    submit_rx: mpsc::Receiver<ScheduledRead>,
    result_tx: mpsc::Sender<ReadOutcome>,
    latest_sequence: Arc<AtomicU64>,
) {
    thread::spawn(move || {
        while let Ok(mut job) = submit_rx.recv() {
            while let Ok(next) = submit_rx.try_recv() {
                job = next;
            }

            if job.sequence < latest_sequence.load(Ordering::SeqCst) {
                continue;
            }

            let result = encode_image_file(&job.request.path);

            if job.sequence < latest_sequence.load(Ordering::SeqCst) {
                debug!(sequence = job.sequence, "discarding superseded image read");
                continue;
            }

            let outcome = ReadOutcome {
                sequence: job.sequence,
                result,
            };
            if result_tx.send(outcome).is_err() {
                return;
            }
        }
    });
}
