//! # Códigos de Estado HTTP
//! src/http/status.rs
//!
//! Códigos que devuelve el servicio:
//!
//! - **2xx**: 200 al encolar o consultar un job
//! - **4xx**: parámetros inválidos, job o ruta inexistente, método no soportado
//! - **5xx**: fallas del store o cola llena

/// Códigos de estado HTTP que usa el servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok = 200,

    /// 400 Bad Request - `n` o `task_id` faltante o inválido
    BadRequest = 400,

    /// 404 Not Found - Ruta o job inexistente
    NotFound = 404,

    /// 405 Method Not Allowed - Sólo se aceptan GET y HEAD
    MethodNotAllowed = 405,

    /// 500 Internal Server Error - Falla del store
    InternalServerError = 500,

    /// 503 Service Unavailable - Cola llena o cerrada
    ServiceUnavailable = 503,
}

impl StatusCode {
    /// Valor numérico del código
    ///
    /// ```
    /// use pi_server::http::StatusCode;
    /// assert_eq!(StatusCode::ServiceUnavailable.as_u16(), 503);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Reason phrase del RFC 1945
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::ServiceUnavailable => "Service Unavailable",
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.as_u16())
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.as_u16())
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.as_u16())
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato de la status line: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
