//! # pi_server
//! src/lib.rs
//!
//! Servicio asíncrono de cálculo de π: el cliente pide `n` dígitos, un pool
//! de workers calcula la serie de Chudnovsky en segundo plano y el cliente
//! consulta el progreso hasta obtener el resultado.
//!
//! ## Arquitectura
//!
//! - `engine`: punto fijo de precisión arbitraria y serie de Chudnovsky
//! - `jobs`: registro de jobs, store, cola, workers y manager
//! - `http`: parsing y construcción de mensajes HTTP/1.0
//! - `router`: enrutamiento de requests a handlers
//! - `server`: servidor TCP, un thread por conexión
//! - `config`: argumentos CLI y variables de entorno
//! - `error`: tipos de error
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use pi_server::config::Config;
//! use pi_server::jobs::{JobManager, JobManagerConfig, MemoryJobStore};
//! use pi_server::server::Server;
//! use std::sync::Arc;
//!
//! let config = Config::default();
//! let manager = Arc::new(JobManager::new(
//!     JobManagerConfig::from_config(&config),
//!     Arc::new(MemoryJobStore::new()),
//! ));
//! let server = Server::bind(&config, manager)?;
//! server.run()?;
//! # Ok::<(), std::io::Error>(())
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod jobs;
pub mod router;
pub mod server;
