//! # Worker de Cálculo
//! src/jobs/worker.rs
//!
//! Toma pedidos de la cola, corre el motor de series y escribe snapshots en
//! el store mientras avanza. Cada worker procesa un job a la vez y es el
//! único escritor del registro de ese job.

use crate::engine::SeriesEngine;
use crate::error::StoreError;
use crate::jobs::queue::{JobQueue, JobRequest};
use crate::jobs::record::JobRecord;
use crate::jobs::store::JobStore;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Decide cuándo escribir un snapshot de progreso
///
/// Se escribe en el primer callback, en el final (1.0), y en el resto sólo
/// si pasó al menos `interval` desde la última escritura.
#[derive(Debug)]
pub struct ProgressThrottle {
    interval: Duration,
    last_write: Option<Instant>,
}

impl ProgressThrottle {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last_write: None }
    }

    /// Retorna true si hay que escribir este callback
    pub fn should_write(&mut self, fraction: f64) -> bool {
        let now = Instant::now();
        let due = match self.last_write {
            None => true,
            Some(_) if fraction >= 1.0 => true,
            Some(last) => now.duration_since(last) >= self.interval,
        };
        if due {
            self.last_write = Some(now);
        }
        due
    }
}

/// Worker del pool
pub struct Worker {
    name: String,
    queue: JobQueue,
    store: Arc<dyn JobStore>,
    engine: SeriesEngine,
    max_digits: u32,
    progress_interval: Duration,
}

impl Worker {
    pub fn new(
        name: impl Into<String>,
        queue: JobQueue,
        store: Arc<dyn JobStore>,
        engine: SeriesEngine,
        max_digits: u32,
        progress_interval: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            queue,
            store,
            engine,
            max_digits,
            progress_interval,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Loop principal: procesa hasta que la cola se cierre y se vacíe
    pub fn run(&self) {
        tracing::info!(worker = %self.name, "Worker started");

        while let Some(request) = self.queue.dequeue() {
            self.process(request);
        }

        tracing::info!(worker = %self.name, "Worker stopped");
    }

    /// Procesa un pedido hasta dejar el registro en estado terminal
    pub fn process(&self, request: JobRequest) {
        let JobRequest { job_id, digits } = request;

        let mut record = match self.store.get(&job_id) {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::warn!(worker = %self.name, job_id = %job_id, "Record missing, recreating");
                JobRecord::new(job_id.clone(), digits)
            }
            // Sin leer el registro no se sabe si ya es terminal
            Err(e) => {
                tracing::error!(worker = %self.name, job_id = %job_id, error = %e, "Cannot read record, skipping job");
                return;
            }
        };

        // Reentrega de un job ya resuelto
        if record.is_terminal() {
            tracing::info!(worker = %self.name, job_id = %job_id, state = %record.state, "Skipping terminal job");
            return;
        }

        if digits == 0 || digits > self.max_digits {
            let message = if digits == 0 {
                "n must be >= 1".to_string()
            } else {
                format!("n is too large: {} exceeds maximum of {}", digits, self.max_digits)
            };
            self.fail(&mut record, message);
            return;
        }

        if let Err(e) = record.start() {
            tracing::error!(worker = %self.name, job_id = %job_id, error = %e, "Cannot start job");
            return;
        }
        self.save(&record, "start");

        tracing::info!(worker = %self.name, job_id = %job_id, digits, "Computing");
        let started = Instant::now();

        let outcome = {
            let mut throttle = ProgressThrottle::new(self.progress_interval);
            let record = &mut record;
            panic::catch_unwind(AssertUnwindSafe(|| {
                self.engine.compute(digits, |fraction| {
                    if !throttle.should_write(fraction) {
                        return;
                    }
                    if record.update_progress(fraction).is_ok() {
                        tracing::trace!(job_id = %record.job_id, progress = fraction, "Progress");
                        self.save_progress(record);
                    }
                })
            }))
        };

        match outcome {
            Ok(Ok(pi)) => {
                match record.finish(pi) {
                    Ok(()) => self.save(&record, "finish"),
                    Err(e) => tracing::error!(worker = %self.name, job_id = %job_id, error = %e, "Cannot finish job"),
                }
                tracing::info!(
                    worker = %self.name,
                    job_id = %job_id,
                    digits,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Job finished"
                );
            }
            Ok(Err(e)) => self.fail(&mut record, e.to_string()),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                self.fail(&mut record, format!("computation panicked: {}", message));
            }
        }
    }

    fn fail(&self, record: &mut JobRecord, message: String) {
        tracing::warn!(worker = %self.name, job_id = %record.job_id, error = %message, "Job failed");
        match record.fail(message) {
            Ok(()) => self.save(record, "fail"),
            Err(e) => tracing::error!(worker = %self.name, job_id = %record.job_id, error = %e, "Cannot fail job"),
        }
    }

    /// Los errores del store se loguean, no se reintentan
    fn save(&self, record: &JobRecord, stage: &'static str) {
        if let Err(e) = self.store.put(record) {
            self.log_store_error(record, stage, &e);
        }
    }

    fn save_progress(&self, record: &JobRecord) {
        if let Err(e) = self.store.put_progress(record) {
            self.log_store_error(record, "progress", &e);
        }
    }

    fn log_store_error(&self, record: &JobRecord, stage: &'static str, error: &StoreError) {
        tracing::error!(
            worker = %self.name,
            job_id = %record.job_id,
            stage,
            error = %error,
            "Store write failed"
        );
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
