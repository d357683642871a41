//! Debounced background saving.
//!
//! Edits call [`Saver::request`] with a full snapshot; the saver waits for a
//! quiet period, then hands the newest snapshot to a worker thread. At most
//! one save is in flight. Requests that arrive during a save mark it
//! `pending`, and the newest snapshot is written as soon as that save lands.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::io::store::{Store, StoreError};
use crate::model::app_data::AppData;

/// Outcome of the most recent save
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    /// Nothing saved yet in this session
    Clean,
    Saved(u64),
    Failed(String),
    Conflict { expected: u64, found: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    InFlight,
}

pub struct Saver {
    debounce: Duration,
    phase: Phase,
    pending: bool,
    deadline: Option<Instant>,
    latest: Option<AppData>,
    version: u64,
    status: SaveStatus,
    jobs: Option<Sender<AppData>>,
    done: Receiver<Result<u64, StoreError>>,
    worker: Option<JoinHandle<()>>,
}

impl Saver {
    /// Start a saver writing document `key` to `store`. `version` is the
    /// `_version` of the document as last loaded.
    pub fn new(
        store: Arc<dyn Store>,
        key: impl Into<String>,
        debounce: Duration,
        version: u64,
    ) -> Result<Self, StoreError> {
        let key = key.into();
        let (job_tx, job_rx) = mpsc::channel::<AppData>();
        let (done_tx, done_rx) = mpsc::channel();

        let worker = thread::Builder::new()
            .name("treeboard-saver".into())
            .spawn(move || {
                for snapshot in job_rx {
                    let result = store.save(&key, &snapshot);
                    if done_tx.send(result).is_err() {
                        break;
                    }
                }
            })?;

        Ok(Saver {
            debounce,
            phase: Phase::Idle,
            pending: false,
            deadline: None,
            latest: None,
            version,
            status: SaveStatus::Clean,
            jobs: Some(job_tx),
            done: done_rx,
            worker: Some(worker),
        })
    }

    /// Record `snapshot` as the newest state and re-arm the debounce timer.
    pub fn request(&mut self, snapshot: AppData, now: Instant) {
        self.latest = Some(snapshot);
        self.deadline = Some(now + self.debounce);
    }

    /// Advance the state machine: collect finished saves and start a new
    /// one if the debounce window has elapsed.
    pub fn poll(&mut self, now: Instant) {
        loop {
            match self.done.try_recv() {
                Ok(result) => {
                    self.complete(result);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.worker_lost();
                    break;
                }
            }
        }

        if let Some(deadline) = self.deadline
            && now >= deadline
        {
            self.deadline = None;
            match self.phase {
                Phase::Idle => self.launch(),
                Phase::InFlight => self.pending = true,
            }
        }
    }

    /// Block until every requested snapshot is saved or a save fails.
    pub fn flush(&mut self) -> SaveStatus {
        self.deadline = None;
        loop {
            match self.phase {
                Phase::InFlight => {
                    let ok = match self.done.recv() {
                        Ok(result) => self.complete(result),
                        Err(_) => {
                            self.worker_lost();
                            false
                        }
                    };
                    if !ok {
                        return self.status.clone();
                    }
                }
                Phase::Idle => {
                    if self.latest.is_none() {
                        return self.status.clone();
                    }
                    self.launch();
                }
            }
        }
    }

    pub fn status(&self) -> &SaveStatus {
        &self.status
    }

    /// Version of the stored document after the last successful save
    pub fn version(&self) -> u64 {
        self.version
    }

    /// True while a snapshot is waiting or being written
    pub fn is_dirty(&self) -> bool {
        self.latest.is_some() || self.phase == Phase::InFlight
    }

    fn launch(&mut self) {
        let Some(mut snapshot) = self.latest.take() else {
            return;
        };
        snapshot.version = self.version;
        let Some(jobs) = &self.jobs else {
            self.status = SaveStatus::Failed("save worker stopped".into());
            return;
        };
        debug!(base_version = self.version, "save started");
        if jobs.send(snapshot).is_err() {
            self.worker_lost();
            return;
        }
        self.phase = Phase::InFlight;
        self.pending = false;
    }

    /// Returns false when the save failed.
    fn complete(&mut self, result: Result<u64, StoreError>) -> bool {
        self.phase = Phase::Idle;
        match result {
            Ok(version) => {
                info!(version, "save finished");
                self.version = version;
                self.status = SaveStatus::Saved(version);
                if self.pending {
                    self.launch();
                }
                true
            }
            Err(StoreError::Conflict { expected, found }) => {
                warn!(expected, found, "save rejected: document changed on disk");
                self.pending = false;
                self.status = SaveStatus::Conflict { expected, found };
                false
            }
            Err(e) => {
                warn!(error = %e, "save failed");
                self.pending = false;
                self.status = SaveStatus::Failed(e.to_string());
                false
            }
        }
    }

    fn worker_lost(&mut self) {
        self.phase = Phase::Idle;
        self.pending = false;
        self.jobs = None;
        self.status = SaveStatus::Failed("save worker stopped".into());
    }
}

impl Drop for Saver {
    fn drop(&mut self) {
        // closing the job channel ends the worker loop
        self.jobs = None;
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
