//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 49\r\n
//! X-Request-Id: 1b4e28ba-2fa1-11d2-883f-0016d3cca427\r\n
//! \r\n
//! {"task_id":"0d6a3c4e-8f1b-4a55-9b8e-3f1d2c7a9e10"}
//! ```

use super::StatusCode;
use serde::Serialize;

/// Respuesta HTTP/1.0 completa
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,

    /// Headers en orden de inserción; un nombre repetido reemplaza al anterior
    headers: Vec<(String, String)>,

    body: Vec<u8>,
}

impl Response {
    /// Respuesta sin headers ni body
    pub fn new(status: StatusCode) -> Self {
        Self { status, headers: Vec::new(), body: Vec::new() }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    pub fn add_header(&mut self, name: &str, value: &str) {
        match self.headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Establece el body y su `Content-Length`
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        let len = self.body.len().to_string();
        self.add_header("Content-Length", &len);
        self
    }

    /// Respuesta JSON serializando `value`
    ///
    /// ```
    /// use pi_server::http::{Response, StatusCode};
    ///
    /// let response = Response::json(StatusCode::Ok, &serde_json::json!({"task_id": "abc"}));
    /// assert_eq!(response.body(), br#"{"task_id":"abc"}"#);
    /// ```
    pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::new(status)
                .with_header("Content-Type", "application/json")
                .with_body(body),
            Err(e) => Self::error(
                StatusCode::InternalServerError,
                &format!("Failed to serialize response: {}", e),
            ),
        }
    }

    /// Respuesta de error: `{"error": "mensaje"}`
    pub fn error(status: StatusCode, message: &str) -> Self {
        let body = serde_json::json!({ "error": message }).to_string();
        Self::new(status)
            .with_header("Content-Type", "application/json")
            .with_body(body)
    }

    /// Descarta el body manteniendo `Content-Length` (respuestas a HEAD)
    pub fn without_body(mut self) -> Self {
        self.body.clear();
        self
    }

    /// Serializa la respuesta para escribirla en el socket
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = format!("HTTP/1.0 {}\r\n", self.status).into_bytes();
        for (name, value) in &self.headers {
            out.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&self.body);
        out
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_response() {
        let response = Response::json(StatusCode::Ok, &serde_json::json!({"state": "PENDING"}));
        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.header("Content-Length"), Some("19"));
        assert_eq!(response.body(), br#"{"state":"PENDING"}"#);
    }

    #[test]
    fn test_error_escapes_message() {
        let response = Response::error(StatusCode::BadRequest, r#"bad "n" value"#);
        let json: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(json["error"], r#"bad "n" value"#);
    }

    #[test]
    fn test_header_replaced_not_duplicated() {
        let mut response = Response::new(StatusCode::Ok).with_header("Server", "a");
        response.add_header("server", "b");
        assert_eq!(response.header("Server"), Some("b"));

        let text = String::from_utf8(response.to_bytes()).unwrap();
        assert_eq!(text.matches("erver:").count(), 1);
    }

    #[test]
    fn test_to_bytes() {
        let response = Response::new(StatusCode::Ok)
            .with_header("Content-Type", "text/plain")
            .with_body("Test");

        let text = String::from_utf8(response.to_bytes()).unwrap();
        assert_eq!(
            text,
            "HTTP/1.0 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 4\r\n\r\nTest"
        );
    }

    #[test]
    fn test_without_body_keeps_length() {
        let response = Response::new(StatusCode::Ok).with_body("12345").without_body();
        assert!(response.body().is_empty());
        assert_eq!(response.header("Content-Length"), Some("5"));
        assert!(String::from_utf8(response.to_bytes()).unwrap().ends_with("\r\n\r\n"));
    }
}
