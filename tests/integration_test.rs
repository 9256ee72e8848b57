//! Tests de integración del servidor HTTP
//! tests/integration_test.rs
//!
//! Cada test levanta su propio servidor en un puerto efímero con un store en
//! memoria y le habla por TCP como lo haría un cliente real.

use pi_server::config::{Config, StoreKind};
use pi_server::jobs::{JobManager, JobManagerConfig, MemoryJobStore};
use pi_server::server::Server;
use serde_json::Value;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const MAX_DIGITS: u32 = 300;

/// Tiempo máximo para que un job llegue a estado terminal
const JOB_DEADLINE: Duration = Duration::from_secs(60);

/// Levanta un servidor y retorna su dirección
fn start_server() -> SocketAddr {
    let config = Config {
        port: 0,
        workers: 2,
        queue_capacity: 32,
        max_digits: MAX_DIGITS,
        progress_interval_ms: 0,
        store: StoreKind::Memory,
        ..Config::default()
    };
    let manager = Arc::new(JobManager::new(
        JobManagerConfig::from_config(&config),
        Arc::new(MemoryJobStore::new()),
    ));

    let server = Server::bind(&config, manager).expect("bind");
    let addr = server.local_addr().unwrap();
    thread::spawn(move || server.run());
    addr
}

/// Envía un GET y retorna (status, body)
fn get(addr: SocketAddr, target: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).expect("connect");
    stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
    stream
        .write_all(format!("GET {} HTTP/1.0\r\n\r\n", target).as_bytes())
        .unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();

    let status = response
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_string())
        .unwrap_or_default();
    (status, body)
}

fn get_json(addr: SocketAddr, target: &str) -> (u16, Value) {
    let (status, body) = get(addr, target);
    let json = serde_json::from_str(&body).unwrap_or(Value::Null);
    (status, json)
}

fn submit(addr: SocketAddr, n: &str) -> String {
    let (status, json) = get_json(addr, &format!("/calculate_pi?n={}", n));
    assert_eq!(status, 200, "submit n = {}: {}", n, json);
    json["task_id"].as_str().unwrap().to_string()
}

/// Consulta hasta que el job sea terminal
fn wait_finished(addr: SocketAddr, task_id: &str) -> Value {
    let deadline = Instant::now() + JOB_DEADLINE;
    loop {
        let (status, json) = get_json(addr, &format!("/check_progress?task_id={}", task_id));
        assert_eq!(status, 200);

        let progress = json["progress"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&progress));

        if json["state"] == "FINISHED" || json["state"] == "FAILED" {
            return json;
        }
        assert!(Instant::now() < deadline, "job {} did not finish", task_id);
        thread::sleep(Duration::from_millis(20));
    }
}

// ==================== Resultados ====================

#[test]
fn test_five_digits() {
    let addr = start_server();
    let task_id = submit(addr, "5");

    assert_eq!(
        wait_finished(addr, &task_id),
        serde_json::json!({"state": "FINISHED", "progress": 1.0, "result": "3.14159"})
    );
}

#[test]
fn test_one_digit() {
    let addr = start_server();
    let task_id = submit(addr, "1");
    assert_eq!(wait_finished(addr, &task_id)["result"], "3.1");
}

#[test]
fn test_rounding_not_truncation() {
    let addr = start_server();
    let task_id = submit(addr, "4");
    assert_eq!(wait_finished(addr, &task_id)["result"], "3.1416");
}

#[test]
fn test_new_job_starts_not_finished_or_pending() {
    let addr = start_server();
    let task_id = submit(addr, "300");

    let (status, json) = get_json(addr, &format!("/check_progress?task_id={}", task_id));
    assert_eq!(status, 200);
    assert!(["PENDING", "PROGRESS", "FINISHED"].contains(&json["state"].as_str().unwrap()));
    if json["state"] != "FINISHED" {
        assert_eq!(json["result"], Value::Null);
    }
}

#[test]
fn test_progress_is_monotonic_while_polling() {
    let addr = start_server();
    let task_id = submit(addr, &MAX_DIGITS.to_string());

    let deadline = Instant::now() + JOB_DEADLINE;
    let mut last = 0.0;
    loop {
        let (_, json) = get_json(addr, &format!("/check_progress?task_id={}", task_id));
        let progress = json["progress"].as_f64().unwrap();
        assert!(progress >= last, "{} < {}", progress, last);
        last = progress;

        assert_ne!(json["state"], "FAILED", "job {} failed: {}", task_id, json);
        if json["state"] == "FINISHED" {
            break;
        }
        assert!(Instant::now() < deadline, "job {} did not finish", task_id);
        thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(last, 1.0);
}

// ==================== Validación ====================

#[test]
fn test_boundaries() {
    let addr = start_server();

    for bad in ["0", "-1", "301", "abc", "", "1e3"] {
        let (status, json) = get_json(addr, &format!("/calculate_pi?n={}", bad));
        assert_eq!(status, 400, "n = {:?}", bad);
        assert!(json["error"].is_string());
    }

    let (status, _) = get_json(addr, "/calculate_pi");
    assert_eq!(status, 400);

    let task_id = submit(addr, &MAX_DIGITS.to_string());
    let json = wait_finished(addr, &task_id);
    assert_eq!(json["state"], "FINISHED");
    assert_eq!(json["result"].as_str().unwrap().len(), MAX_DIGITS as usize + 2);
}

#[test]
fn test_query_errors() {
    let addr = start_server();

    let (status, _) = get_json(addr, "/check_progress");
    assert_eq!(status, 400);

    let (status, _) = get_json(addr, "/check_progress?task_id=not-a-uuid");
    assert_eq!(status, 400);

    let unknown = uuid::Uuid::new_v4();
    let (status, json) = get_json(addr, &format!("/check_progress?task_id={}", unknown));
    assert_eq!(status, 404);
    assert!(json["error"].as_str().unwrap().contains("not found"));
}

#[test]
fn test_unknown_route() {
    let addr = start_server();
    let (status, _) = get(addr, "/does_not_exist");
    assert_eq!(status, 404);
}

// ==================== Consistencia ====================

#[test]
fn test_repeated_queries_identical() {
    let addr = start_server();
    let task_id = submit(addr, "50");
    let first = wait_finished(addr, &task_id);

    for _ in 0..3 {
        let (_, again) = get_json(addr, &format!("/check_progress?task_id={}", task_id));
        assert_eq!(again, first);
    }
}

#[test]
fn test_concurrent_jobs_do_not_mix() {
    let addr = start_server();

    let clients: Vec<_> = [3u32, 7, 20, 100, 250]
        .into_iter()
        .map(|n| {
            thread::spawn(move || {
                let task_id = submit(addr, &n.to_string());
                (n, wait_finished(addr, &task_id))
            })
        })
        .collect();

    for client in clients {
        let (n, json) = client.join().unwrap();
        let expected = pi_server::engine::compute(n, |_| {}).unwrap();
        assert_eq!(json["result"], expected.as_str(), "n = {}", n);
    }
}

#[test]
fn test_root_reports_service_info() {
    let addr = start_server();
    let (status, json) = get_json(addr, "/");
    assert_eq!(status, 200);
    assert_eq!(json["max_digits"], MAX_DIGITS);
    assert_eq!(json["queue"]["capacity"], 32);
}
