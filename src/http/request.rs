//! # Parsing de Requests HTTP/1.0
//! src/http/request.rs
//!
//! Parser mínimo para los requests que recibe el servicio:
//!
//! ```text
//! GET /calculate_pi?n=100 HTTP/1.0\r\n
//! Host: localhost:8080\r\n
//! \r\n
//! ```
//!
//! Sólo se leen la request line y los headers; el servicio no usa body.

use std::collections::HashMap;
use thiserror::Error;

/// Métodos HTTP aceptados
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    GET,

    /// Como GET pero la respuesta va sin body
    HEAD,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
        }
    }
}

impl std::str::FromStr for Method {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::GET),
            "HEAD" => Ok(Method::HEAD),
            _ => Err(ParseError::UnsupportedMethod(s.to_string())),
        }
    }
}

/// Errores de parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Empty request")]
    EmptyRequest,

    #[error("Invalid request line format")]
    InvalidRequestLine,

    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("Invalid HTTP version: {0}")]
    InvalidHttpVersion(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

/// Request HTTP parseado
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    query_params: HashMap<String, String>,

    /// Nombres de header en minúscula
    headers: HashMap<String, String>,
}

impl Request {
    /// Parsea un request desde los bytes leídos del socket
    ///
    /// ```
    /// use pi_server::http::Request;
    ///
    /// let request = Request::parse(b"GET /calculate_pi?n=10 HTTP/1.0\r\n\r\n").unwrap();
    /// assert_eq!(request.path(), "/calculate_pi");
    /// assert_eq!(request.query_param("n"), Some("10"));
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        let text = std::str::from_utf8(buffer).map_err(|_| ParseError::InvalidRequestLine)?;
        if text.trim().is_empty() {
            return Err(ParseError::EmptyRequest);
        }

        let mut lines = text.split("\r\n");
        let request_line = lines.next().ok_or(ParseError::EmptyRequest)?;

        let parts: Vec<&str> = request_line.split_whitespace().collect();
        let [method, target, version] = parts[..] else {
            return Err(ParseError::InvalidRequestLine);
        };

        let method: Method = method.parse()?;
        if version != "HTTP/1.0" && version != "HTTP/1.1" {
            return Err(ParseError::InvalidHttpVersion(version.to_string()));
        }

        let (path, query_params) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), parse_query_string(query)),
            None => (target.to_string(), HashMap::new()),
        };

        let mut headers = HashMap::new();
        for line in lines.take_while(|l| !l.trim().is_empty()) {
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| ParseError::InvalidHeader(line.to_string()))?;
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }

        Ok(Request { method, path, query_params, headers })
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query_params
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    /// Busca un header sin distinguir mayúsculas
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// "n=10&task_id=abc" -> {"n": "10", "task_id": "abc"}
fn parse_query_string(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|param| !param.is_empty())
        .map(|param| match param.split_once('=') {
            Some((key, value)) => (url_decode(key), url_decode(value)),
            None => (url_decode(param), String::new()),
        })
        .collect()
}

/// Decodifica `%XX` y `+`. Secuencias inválidas se dejan tal cual.
fn url_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
                match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    Some(byte) => {
                        out.push(byte);
                        i += 2;
                    }
                    None => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}
