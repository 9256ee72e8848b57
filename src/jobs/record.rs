//! # Registro de un Job
//! src/jobs/record.rs
//!
//! Define el estado persistido de un cálculo y su máquina de estados:
//!
//! ```text
//! PENDING -> PROGRESS -> FINISHED
//!    |           |
//!    +-----------+-----> FAILED
//! ```
//!
//! Las transiciones sólo avanzan. FINISHED y FAILED son terminales.

use crate::error::JobError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Estado de un job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobState {
    /// Encolado, ningún worker lo tomó todavía
    Pending,

    /// Un worker lo está calculando
    Progress,

    /// Terminado con resultado
    Finished,

    /// Terminado con error
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "PENDING",
            JobState::Progress => "PROGRESS",
            JobState::Finished => "FINISHED",
            JobState::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Finished | JobState::Failed)
    }

    /// Verifica si la transición `self -> next` está permitida
    pub fn can_transition_to(&self, next: JobState) -> bool {
        match (self, next) {
            (JobState::Pending, JobState::Progress) => true,
            (JobState::Pending, JobState::Finished) => true,
            (JobState::Pending, JobState::Failed) => true,
            (JobState::Progress, JobState::Progress) => true,
            (JobState::Progress, JobState::Finished) => true,
            (JobState::Progress, JobState::Failed) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot completo de un job tal como se guarda en el store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// ID único (UUID v4)
    pub job_id: String,

    /// Dígitos decimales pedidos
    pub requested_digits: u32,

    /// Estado actual
    pub state: JobState,

    /// Fracción completada (0.0 - 1.0)
    pub progress: f64,

    /// π como string decimal (sólo en FINISHED)
    pub result: Option<String>,

    /// Mensaje de error (sólo en FAILED)
    pub error: Option<String>,

    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// Crea un registro nuevo en estado PENDING
    pub fn new(job_id: String, requested_digits: u32) -> Self {
        Self {
            job_id,
            requested_digits,
            state: JobState::Pending,
            progress: 0.0,
            result: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    fn transition(&mut self, next: JobState) -> Result<(), JobError> {
        if !self.state.can_transition_to(next) {
            return Err(JobError::InvalidTransition { from: self.state, to: next });
        }
        self.state = next;
        Ok(())
    }

    /// Marca el job como tomado por un worker
    pub fn start(&mut self) -> Result<(), JobError> {
        self.transition(JobState::Progress)?;
        if self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Actualiza el progreso. Nunca retrocede y se limita a [0, 1].
    pub fn update_progress(&mut self, fraction: f64) -> Result<(), JobError> {
        self.transition(JobState::Progress)?;
        let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
        if fraction > self.progress {
            self.progress = fraction;
        }
        Ok(())
    }

    /// Marca el job como completado con resultado
    pub fn finish(&mut self, result: String) -> Result<(), JobError> {
        self.transition(JobState::Finished)?;
        self.progress = 1.0;
        self.result = Some(result);
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Marca el job como fallido
    pub fn fail(&mut self, error: String) -> Result<(), JobError> {
        self.transition(JobState::Failed)?;
        self.error = Some(error);
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Vista pública para /check_progress
    pub fn view(&self) -> JobView {
        JobView {
            state: self.state,
            progress: self.progress,
            result: self.result.clone(),
            error: self.error.clone(),
        }
    }
}

/// Lo que ve el cliente al consultar un job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobView {
    pub state: JobState,
    pub progress: f64,
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
