//! # Sistema de Jobs
//!
//! Convierte un pedido de cálculo en una unidad de trabajo rastreable:
//!
//! ```text
//! submit → JobStore (PENDING) → JobQueue → Worker → SeriesEngine
//!                                             │
//!                     query ← JobStore ← snapshots de progreso
//! ```
//!
//! ## Endpoints
//!
//! - `/calculate_pi?n=N` - Encolar cálculo
//! - `/check_progress?task_id=ID` - Consultar estado

pub mod handlers;
pub mod manager;
pub mod queue;
pub mod record;
pub mod store;
pub mod worker;

pub use manager::{JobManager, JobManagerConfig};
pub use queue::{JobQueue, JobRequest, QueueStats};
pub use record::{JobRecord, JobState, JobView};
pub use store::{FileJobStore, JobStore, MemoryJobStore};
pub use worker::Worker;
