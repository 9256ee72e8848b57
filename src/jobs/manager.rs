//! # Gestor Central de Jobs
//! src/jobs/manager.rs
//!
//! Coordina el sistema de jobs: validación de pedidos, encolado, pool de
//! workers y limpieza periódica de resultados viejos.

use crate::config::Config;
use crate::engine::{SeriesEngine, DEFAULT_GUARD_TERMS};
use crate::error::JobError;
use crate::jobs::queue::{JobQueue, JobRequest, QueueStats};
use crate::jobs::record::{JobRecord, JobView};
use crate::jobs::store::JobStore;
use crate::jobs::worker::Worker;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use uuid::Uuid;

/// Configuración del Job Manager
#[derive(Debug, Clone)]
pub struct JobManagerConfig {
    /// Número de workers de cálculo
    pub workers: usize,

    /// Capacidad máxima de la cola
    pub queue_capacity: usize,

    /// Máximo de dígitos aceptados por pedido
    pub max_digits: u32,

    /// Dígitos extra de precisión de trabajo
    pub guard_digits: u32,

    /// Intervalo mínimo entre escrituras de progreso
    pub progress_interval: Duration,

    /// Tiempo que se conservan los jobs terminados
    pub retention: Duration,

    /// Cada cuánto corre la limpieza
    pub janitor_interval: Duration,
}

impl Default for JobManagerConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 1000,
            max_digits: 10_000,
            guard_digits: crate::engine::DEFAULT_GUARD_DIGITS,
            progress_interval: Duration::from_millis(100),
            retention: Duration::from_secs(3600),
            janitor_interval: Duration::from_secs(60),
        }
    }
}

impl JobManagerConfig {
    /// Crea una configuración desde el Config principal
    pub fn from_config(config: &Config) -> Self {
        let retention = Duration::from_secs(config.jobs_retention_secs);
        Self {
            workers: config.workers,
            queue_capacity: config.queue_capacity,
            max_digits: config.max_digits,
            guard_digits: config.guard_digits,
            progress_interval: Duration::from_millis(config.progress_interval_ms),
            retention,
            janitor_interval: retention.clamp(Duration::from_secs(1), Duration::from_secs(60)),
        }
    }
}

/// Señal de parada para el janitor
#[derive(Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl StopSignal {
    fn stop(&self) {
        *self.stopped.lock() = true;
        self.wake.notify_all();
    }

    /// Espera hasta `timeout` o hasta la parada. Retorna true si hay que parar.
    fn wait(&self, timeout: Duration) -> bool {
        let mut stopped = self.stopped.lock();
        if !*stopped {
            self.wake.wait_for(&mut stopped, timeout);
        }
        *stopped
    }
}

/// Gestor central de jobs
pub struct JobManager {
    config: JobManagerConfig,

    queue: JobQueue,

    store: Arc<dyn JobStore>,

    workers: Mutex<Vec<JoinHandle<()>>>,

    janitor: Mutex<Option<JoinHandle<()>>>,

    stop: Arc<StopSignal>,
}

impl JobManager {
    /// Crea el manager e inicia los workers y el janitor
    pub fn new(config: JobManagerConfig, store: Arc<dyn JobStore>) -> Self {
        let manager = Self {
            queue: JobQueue::new(config.queue_capacity),
            store,
            workers: Mutex::new(Vec::new()),
            janitor: Mutex::new(None),
            stop: Arc::new(StopSignal::default()),
            config,
        };

        manager.spawn_workers();
        manager.spawn_janitor();

        manager
    }

    fn spawn_workers(&self) {
        let engine = SeriesEngine::new(self.config.guard_digits, DEFAULT_GUARD_TERMS);
        let mut handles = self.workers.lock();

        for i in 0..self.config.workers {
            let worker = Worker::new(
                format!("pi-{}", i),
                self.queue.clone(),
                Arc::clone(&self.store),
                engine,
                self.config.max_digits,
                self.config.progress_interval,
            );

            let spawned = thread::Builder::new()
                .name(worker.name().to_string())
                .spawn(move || worker.run());

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => tracing::error!(worker = i, error = %e, "Failed to spawn worker"),
            }
        }
    }

    fn spawn_janitor(&self) {
        let store = Arc::clone(&self.store);
        let stop = Arc::clone(&self.stop);
        let retention = self.config.retention;
        let interval = self.config.janitor_interval;

        let spawned = thread::Builder::new()
            .name("janitor".to_string())
            .spawn(move || {
                while !stop.wait(interval) {
                    match store.evict_expired(retention) {
                        Ok(0) => {}
                        Ok(n) => tracing::info!(evicted = n, "Expired jobs removed"),
                        Err(e) => tracing::warn!(error = %e, "Job eviction failed"),
                    }
                }
            });

        match spawned {
            Ok(handle) => *self.janitor.lock() = Some(handle),
            Err(e) => tracing::error!(error = %e, "Failed to spawn janitor"),
        }
    }

    /// Encola un cálculo de π con `n` dígitos y retorna el ID del job
    ///
    /// Rechaza `n` fuera de `1..=max_digits` sin crear registro.
    pub fn submit(&self, n: i64) -> Result<String, JobError> {
        if n < 1 {
            return Err(JobError::InvalidDigits("n must be >= 1".to_string()));
        }
        let digits = u32::try_from(n)
            .ok()
            .filter(|d| *d <= self.config.max_digits)
            .ok_or(JobError::ExceedsMaximum {
                requested: n,
                max: self.config.max_digits,
            })?;

        let job_id = Uuid::new_v4().to_string();
        self.store.put(&JobRecord::new(job_id.clone(), digits))?;

        if let Err(e) = self.queue.enqueue(JobRequest::new(job_id.clone(), digits)) {
            if let Err(store_err) = self.store.remove(&job_id) {
                tracing::warn!(job_id = %job_id, error = %store_err, "Cannot remove rejected job");
            }
            return Err(e);
        }

        tracing::info!(job_id = %job_id, digits, "Job submitted");
        Ok(job_id)
    }

    /// Obtiene el estado de un job
    pub fn query(&self, task_id: &str) -> Result<JobView, JobError> {
        let job_id = Uuid::parse_str(task_id.trim())
            .map_err(|_| JobError::MalformedJobId(task_id.to_string()))?
            .to_string();

        self.store
            .get(&job_id)?
            .map(|record| record.view())
            .ok_or(JobError::NotFound(job_id))
    }

    /// Obtiene estadísticas de la cola
    pub fn queue_stats(&self) -> QueueStats {
        self.queue.stats()
    }

    pub fn max_digits(&self) -> u32 {
        self.config.max_digits
    }

    pub fn config(&self) -> &JobManagerConfig {
        &self.config
    }

    /// Cierra la cola, espera a que los workers terminen lo pendiente y
    /// detiene el janitor. Se puede llamar más de una vez.
    pub fn shutdown(&self) {
        self.queue.close();
        self.stop.stop();

        let workers: Vec<_> = self.workers.lock().drain(..).collect();
        for handle in workers {
            if handle.join().is_err() {
                tracing::error!("Worker thread panicked");
            }
        }

        if let Some(handle) = self.janitor.lock().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for JobManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}
