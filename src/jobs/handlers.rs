//! # Handlers HTTP para Jobs
//! src/jobs/handlers.rs
//!
//! Endpoints del servicio:
//! - `/` - Información del servicio
//! - `/calculate_pi?n=N` - Encolar un cálculo
//! - `/check_progress?task_id=ID` - Consultar estado

use crate::error::JobError;
use crate::http::{Request, Response, StatusCode};
use crate::jobs::manager::JobManager;
use serde_json::json;
use std::num::IntErrorKind;

/// Segundos sugeridos al cliente cuando la cola está llena
const RETRY_AFTER_SECS: &str = "5";

/// Traduce un `JobError` a la respuesta HTTP correspondiente
pub fn error_response(error: &JobError) -> Response {
    match error {
        JobError::NotFound(_) => Response::error(StatusCode::NotFound, &error.to_string()),
        e if e.is_client_error() => Response::error(StatusCode::BadRequest, &e.to_string()),
        JobError::QueueFull(_) | JobError::QueueClosed => {
            Response::error(StatusCode::ServiceUnavailable, &error.to_string())
                .with_header("Retry-After", RETRY_AFTER_SECS)
        }
        JobError::Storage(_) | JobError::InvalidTransition { .. } => {
            tracing::error!(error = %error, "Job system failure");
            Response::error(StatusCode::InternalServerError, &error.to_string())
        }
        _ => Response::error(StatusCode::InternalServerError, &error.to_string()),
    }
}

/// Handler para `/`
///
/// ```json
/// {"service": "pi_server", "version": "0.1.0", "max_digits": 10000, ...}
/// ```
pub fn root_handler(_req: &Request, manager: &JobManager) -> Response {
    let body = json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "calculate_pi": "/calculate_pi?n=100",
            "check_progress": "/check_progress?task_id=<task_id>",
        },
        "max_digits": manager.max_digits(),
        "queue": manager.queue_stats(),
    });
    Response::json(StatusCode::Ok, &body)
}

/// Handler para `/calculate_pi?n=N`
///
/// Valida `n`, encola el cálculo y retorna el ID.
///
/// ```json
/// {"task_id": "0d6a3c4e-8f1b-4a55-9b8e-3f1d2c7a9e10"}
/// ```
pub fn calculate_pi_handler(req: &Request, manager: &JobManager) -> Response {
    let raw = match req.query_param("n") {
        Some(raw) if !raw.trim().is_empty() => raw.trim(),
        _ => return Response::error(StatusCode::BadRequest, "Missing required parameter: n"),
    };

    let n: i64 = match raw.parse() {
        Ok(n) => n,
        Err(e) => {
            let message = match e.kind() {
                IntErrorKind::PosOverflow => format!(
                    "n is too large: {} exceeds maximum of {}",
                    raw,
                    manager.max_digits()
                ),
                IntErrorKind::NegOverflow => "n must be >= 1".to_string(),
                _ => format!("n must be an integer, got '{}'", raw),
            };
            return Response::error(StatusCode::BadRequest, &message);
        }
    };

    match manager.submit(n) {
        Ok(task_id) => Response::json(StatusCode::Ok, &json!({ "task_id": task_id })),
        Err(e) => {
            tracing::debug!(n, error = %e, "Submission rejected");
            error_response(&e)
        }
    }
}

/// Handler para `/check_progress?task_id=ID`
///
/// ```json
/// {"state": "PROGRESS", "progress": 0.42, "result": null}
/// ```
pub fn check_progress_handler(req: &Request, manager: &JobManager) -> Response {
    let task_id = match req.query_param("task_id") {
        Some(id) if !id.trim().is_empty() => id,
        _ => return Response::error(StatusCode::BadRequest, "Missing required parameter: task_id"),
    };

    match manager.query(task_id) {
        Ok(view) => Response::json(StatusCode::Ok, &view),
        Err(e) => error_response(&e),
    }
}
