//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Servidor HTTP/1.0 con un thread por conexión. Cada conexión lee un
//! request, lo despacha por el router y cierra.

use crate::config::Config;
use crate::http::{ParseError, Request, Response, StatusCode};
use crate::jobs::{handlers, JobManager};
use crate::router::Router;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Tamaño máximo aceptado para request line + headers
const MAX_REQUEST_BYTES: usize = 8192;

/// Timeout de lectura por conexión
const READ_TIMEOUT: Duration = Duration::from_secs(10);

const SERVER_NAME: &str = concat!("pi_server/", env!("CARGO_PKG_VERSION"));

/// Largo máximo de un `X-Request-Id` que se acepta del cliente
const MAX_REQUEST_ID_LEN: usize = 64;

/// Reusa el `X-Request-Id` del cliente si es corto e imprimible
fn client_request_id(request: &Request) -> Option<String> {
    request
        .header("x-request-id")
        .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN)
        .filter(|id| id.bytes().all(|b| b.is_ascii_graphic()))
        .map(str::to_string)
}

/// Registra los endpoints del servicio
pub fn build_router(manager: Arc<JobManager>) -> Router {
    let mut router = Router::new();

    let m = Arc::clone(&manager);
    router.register("/", move |req: &Request| handlers::root_handler(req, &m));

    let m = Arc::clone(&manager);
    router.register("/calculate_pi", move |req: &Request| handlers::calculate_pi_handler(req, &m));

    let m = manager;
    router.register("/check_progress", move |req: &Request| {
        handlers::check_progress_handler(req, &m)
    });

    router
}

/// Servidor HTTP/1.0 concurrente
pub struct Server {
    listener: TcpListener,
    router: Arc<Router>,
}

impl Server {
    /// Hace bind en la dirección configurada. Con puerto 0 el sistema elige uno.
    pub fn bind(config: &Config, manager: Arc<JobManager>) -> io::Result<Self> {
        let listener = TcpListener::bind(config.address())?;
        Ok(Self {
            listener,
            router: Arc::new(build_router(manager)),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Acepta conexiones indefinidamente
    pub fn run(&self) -> io::Result<()> {
        tracing::info!(address = %self.local_addr()?, "Server listening");

        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    let router = Arc::clone(&self.router);
                    let spawned = thread::Builder::new()
                        .name("http-conn".to_string())
                        .spawn(move || {
                            if let Err(e) = handle_connection(stream, &router) {
                                tracing::debug!(error = %e, "Connection error");
                            }
                        });
                    if let Err(e) = spawned {
                        tracing::error!(error = %e, "Failed to spawn connection thread");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Failed to accept connection"),
            }
        }

        Ok(())
    }
}

/// Lee hasta el fin de los headers, el cierre del peer o el límite de tamaño
fn read_request(stream: &mut TcpStream) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    loop {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
        if buffer.windows(4).any(|w| w == b"\r\n\r\n") || buffer.len() >= MAX_REQUEST_BYTES {
            break;
        }
    }

    buffer.truncate(MAX_REQUEST_BYTES);
    Ok(buffer)
}

/// Atiende una conexión: un request, una respuesta
pub fn handle_connection(mut stream: TcpStream, router: &Router) -> io::Result<()> {
    let start = Instant::now();

    stream.set_read_timeout(Some(READ_TIMEOUT))?;
    let buffer = read_request(&mut stream)?;
    if buffer.is_empty() {
        return Ok(());
    }

    let (mut response, target, client_id) = match Request::parse(&buffer) {
        Ok(request) => {
            let target = format!("{} {}", request.method().as_str(), request.path());
            (router.route(&request), target, client_request_id(&request))
        }
        Err(e @ ParseError::UnsupportedMethod(_)) => (
            Response::error(StatusCode::MethodNotAllowed, &e.to_string())
                .with_header("Allow", "GET, HEAD"),
            "-".to_string(),
            None,
        ),
        Err(e) => (
            Response::error(StatusCode::BadRequest, &format!("Invalid request: {}", e)),
            "-".to_string(),
            None,
        ),
    };
    let request_id = client_id.unwrap_or_else(|| Uuid::new_v4().to_string());

    response.add_header("X-Request-Id", &request_id);
    response.add_header("Server", SERVER_NAME);
    response.add_header("Connection", "close");

    stream.write_all(&response.to_bytes())?;
    stream.flush()?;

    tracing::info!(
        request_id = %request_id,
        target = %target,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Request handled"
    );

    Ok(())
}
