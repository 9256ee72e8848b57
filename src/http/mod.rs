//! # Módulo HTTP
//!
//! Implementación mínima de HTTP/1.0 (RFC 1945) para el front end del
//! servicio: parsing de la request line, headers y query string, y
//! construcción de respuestas JSON.
//!
//! HTTP/1.0 no tiene conexiones persistentes: cada conexión atiende un
//! único request y se cierra.

pub mod request;
pub mod response;
pub mod status;

pub use request::{Method, ParseError, Request};
pub use response::Response;
pub use status::StatusCode;
