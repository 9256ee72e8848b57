//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración por argumentos CLI con fallback a variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./pi_server --port 8080 --workers 8 --max-digits 20000 --store memory
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 WORKERS=8 MAX_DIGITS=20000 JOBS_STORE=file ./pi_server
//! ```

use clap::{Parser, ValueEnum};

/// Dónde se guardan los registros de jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// Sólo en memoria; se pierden al reiniciar
    Memory,

    /// Archivo JSON en `--jobs-storage`
    File,
}

/// Configuración del servicio
#[derive(Debug, Clone, Parser)]
#[command(name = "pi_server")]
#[command(about = "Servicio HTTP/1.0 asíncrono para calcular dígitos de π")]
#[command(version)]
pub struct Config {
    /// Puerto en el que escucha el servidor (0 = efímero)
    #[arg(short, long, default_value = "8080", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    // === Workers y cola ===

    /// Número de workers de cálculo
    #[arg(short, long, default_value = "4", env = "WORKERS")]
    pub workers: usize,

    /// Capacidad máxima de la cola de pedidos
    #[arg(long = "queue-capacity", default_value = "1000", env = "QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    // === Cálculo ===

    /// Máximo de dígitos aceptados por pedido
    #[arg(long = "max-digits", default_value = "10000", env = "MAX_DIGITS")]
    pub max_digits: u32,

    /// Dígitos extra de precisión de trabajo
    #[arg(long = "guard-digits", default_value = "20", env = "GUARD_DIGITS")]
    pub guard_digits: u32,

    /// Intervalo mínimo entre escrituras de progreso en milisegundos (0 = todas)
    #[arg(long = "progress-interval-ms", default_value = "100", env = "PROGRESS_INTERVAL_MS")]
    pub progress_interval_ms: u64,

    // === Storage ===

    /// Tipo de store de jobs
    #[arg(long = "store", value_enum, default_value = "file", env = "JOBS_STORE")]
    pub store: StoreKind,

    /// Ruta del archivo de persistencia de jobs
    #[arg(long = "jobs-storage", default_value = "./data/jobs.json", env = "JOBS_STORAGE")]
    pub jobs_storage_path: String,

    /// Segundos que se conservan los jobs terminados
    #[arg(long = "jobs-retention", default_value = "3600", env = "JOBS_RETENTION")]
    pub jobs_retention_secs: u64,
}

impl Config {
    /// Parsea argumentos CLI y variables de entorno
    pub fn new() -> Self {
        Config::parse()
    }

    /// Dirección completa para bind (host:port)
    ///
    /// ```
    /// use pi_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("Workers must be >= 1".to_string());
        }
        if self.queue_capacity == 0 {
            return Err("Queue capacity must be >= 1".to_string());
        }
        if self.max_digits == 0 {
            return Err("Max digits must be >= 1".to_string());
        }
        if self.guard_digits == 0 {
            return Err("Guard digits must be >= 1".to_string());
        }
        if self.max_digits.checked_add(self.guard_digits).is_none() {
            return Err("Max digits plus guard digits overflows".to_string());
        }
        if self.store == StoreKind::File && self.jobs_storage_path.trim().is_empty() {
            return Err("Jobs storage path must not be empty".to_string());
        }
        Ok(())
    }

    /// Loguea un resumen de la configuración
    pub fn log_summary(&self) {
        tracing::info!(
            address = %self.address(),
            workers = self.workers,
            queue_capacity = self.queue_capacity,
            max_digits = self.max_digits,
            guard_digits = self.guard_digits,
            progress_interval_ms = self.progress_interval_ms,
            store = ?self.store,
            jobs_storage = %self.jobs_storage_path,
            jobs_retention_secs = self.jobs_retention_secs,
            "Configuration"
        );
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            workers: 4,
            queue_capacity: 1000,
            max_digits: 10_000,
            guard_digits: 20,
            progress_interval_ms: 100,
            store: StoreKind::File,
            jobs_storage_path: "./data/jobs.json".to_string(),
            jobs_retention_secs: 3600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.workers, 4);
        assert_eq!(config.max_digits, 10_000);
        assert_eq!(config.store, StoreKind::File);
    }

    #[test]
    fn test_address_custom() {
        let config = Config {
            host: "0.0.0.0".to_string(),
            port: 3000,
            ..Config::default()
        };
        assert_eq!(config.address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_cli_defaults_match_default_impl() {
        let parsed = Config::try_parse_from(["pi_server"]).unwrap();
        let default = Config::default();
        assert_eq!(parsed.port, default.port);
        assert_eq!(parsed.workers, default.workers);
        assert_eq!(parsed.queue_capacity, default.queue_capacity);
        assert_eq!(parsed.max_digits, default.max_digits);
        assert_eq!(parsed.guard_digits, default.guard_digits);
        assert_eq!(parsed.progress_interval_ms, default.progress_interval_ms);
        assert_eq!(parsed.jobs_retention_secs, default.jobs_retention_secs);
    }

    #[test]
    fn test_cli_arguments() {
        let config = Config::try_parse_from([
            "pi_server",
            "--port",
            "0",
            "--workers",
            "8",
            "--max-digits",
            "500",
            "--store",
            "memory",
        ])
        .unwrap();

        assert_eq!(config.port, 0);
        assert_eq!(config.workers, 8);
        assert_eq!(config.max_digits, 500);
        assert_eq!(config.store, StoreKind::Memory);
    }

    #[test]
    fn test_cli_rejects_unknown_store() {
        assert!(Config::try_parse_from(["pi_server", "--store", "redis"]).is_err());
    }

    // ==================== Validation ====================

    #[test]
    fn test_validate_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_values() {
        let cases: [(fn(&mut Config), &str); 4] = [
            (|c| c.workers = 0, "Workers"),
            (|c| c.queue_capacity = 0, "Queue capacity"),
            (|c| c.max_digits = 0, "Max digits"),
            (|c| c.guard_digits = 0, "Guard digits"),
        ];

        for (mutate, expected) in cases {
            let mut config = Config::default();
            mutate(&mut config);
            let err = config.validate().unwrap_err();
            assert!(err.contains(expected), "{}", err);
        }
    }

    #[test]
    fn test_validate_overflow() {
        let config = Config {
            max_digits: u32::MAX,
            ..Config::default()
        };
        assert!(config.validate().unwrap_err().contains("overflows"));
    }

    #[test]
    fn test_validate_empty_storage_path() {
        let mut config = Config {
            jobs_storage_path: "  ".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        config.store = StoreKind::Memory;
        assert!(config.validate().is_ok());
    }
}
