//! # Sistema de Routing
//! src/router/mod.rs
//!
//! ```text
//! Request → Router → Handler → Response
//! ```
//!
//! Los handlers son closures para que puedan capturar estado compartido
//! (por ejemplo un `Arc<JobManager>`). Un path sin handler devuelve 404.

use crate::http::{Method, Request, Response, StatusCode};

/// Handler de una ruta
pub type Handler = Box<dyn Fn(&Request) -> Response + Send + Sync>;

/// Router que mapea paths exactos a handlers
#[derive(Default)]
pub struct Router {
    routes: Vec<(String, Handler)>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra una ruta
    ///
    /// ```
    /// use pi_server::http::{Request, Response, StatusCode};
    /// use pi_server::router::Router;
    ///
    /// let mut router = Router::new();
    /// router.register("/ping", |_req: &Request| {
    ///     Response::json(StatusCode::Ok, &serde_json::json!({"pong": true}))
    /// });
    ///
    /// let request = Request::parse(b"GET /ping HTTP/1.0\r\n\r\n").unwrap();
    /// assert_eq!(router.route(&request).status(), StatusCode::Ok);
    /// ```
    pub fn register<F>(&mut self, path: &str, handler: F)
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.routes.push((path.to_string(), Box::new(handler)));
    }

    /// Ejecuta el handler del path. A un HEAD se le responde sin body.
    pub fn route(&self, request: &Request) -> Response {
        let path = request.path();

        let response = match self.routes.iter().find(|(route, _)| route == path) {
            Some((_, handler)) => handler(request),
            None => Response::error(StatusCode::NotFound, &format!("Route not found: {}", path)),
        };

        match request.method() {
            Method::HEAD => response.without_body(),
            Method::GET => response,
        }
    }
}
