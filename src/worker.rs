// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Runs slow work (oracle calls, imports) off the calling thread.
//!
//! The closure owns everything it needs; its result comes back over a
//! channel. There is no cancellation.

use std::io;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("could not start background task '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("background task '{0}' stopped without a result")]
    Lost(String),
}

pub struct BackgroundTask<T> {
    name: String,
    rx: Receiver<T>,
    handle: Option<JoinHandle<()>>,
    delivered: bool,
}

impl<T: Send + 'static> BackgroundTask<T> {
    pub fn spawn<F>(name: &str, work: F) -> Result<Self, TaskError>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let task_name = name.to_string();
        let handle = thread::Builder::new()
            .name(format!("finsage-{}", name))
            .spawn(move || {
                let out = work();
                if tx.send(out).is_err() {
                    debug!(task = %task_name, "result dropped, caller went away");
                }
            })
            .map_err(|source| TaskError::Spawn {
                name: name.to_string(),
                source,
            })?;
        debug!(task = name, "spawned background task");
        Ok(Self {
            name: name.to_string(),
            rx,
            handle: Some(handle),
            delivered: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Blocks until the work finishes.
    pub fn wait(mut self) -> Result<T, TaskError> {
        let out = self.rx.recv().map_err(|_| self.lost());
        self.join();
        out
    }

    /// The result if the work has finished, without blocking. Yields the
    /// value once; later calls return `None`.
    pub fn try_result(&mut self) -> Option<Result<T, TaskError>> {
        if self.delivered {
            return None;
        }
        match self.rx.try_recv() {
            Ok(v) => {
                self.delivered = true;
                self.join();
                Some(Ok(v))
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.delivered = true;
                self.join();
                Some(Err(self.lost()))
            }
        }
    }

    fn lost(&self) -> TaskError {
        warn!(task = %self.name, "background task ended without a result");
        TaskError::Lost(self.name.clone())
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
