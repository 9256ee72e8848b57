//! # Cola de Jobs
//! src/jobs/queue.rs
//!
//! Cola FIFO acotada y thread-safe que entrega pedidos de cálculo a los
//! workers. Cada pedido se entrega a un solo worker.

use crate::error::JobError;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;

/// Pedido de cálculo que viaja por la cola
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub job_id: String,
    pub digits: u32,
}

impl JobRequest {
    pub fn new(job_id: impl Into<String>, digits: u32) -> Self {
        Self { job_id: job_id.into(), digits }
    }
}

struct QueueState {
    items: VecDeque<JobRequest>,
    closed: bool,
}

/// Cola compartida entre el manager y los workers
pub struct JobQueue {
    state: Arc<Mutex<QueueState>>,

    /// Notifica a los workers cuando hay pedidos nuevos o se cierra la cola
    available: Arc<Condvar>,

    max_capacity: usize,
}

impl JobQueue {
    /// Crea una nueva cola con capacidad máxima
    pub fn new(max_capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                items: VecDeque::new(),
                closed: false,
            })),
            available: Arc::new(Condvar::new()),
            max_capacity,
        }
    }

    /// Encola un pedido
    ///
    /// Falla si la cola está llena o cerrada
    pub fn enqueue(&self, request: JobRequest) -> Result<(), JobError> {
        let mut state = self.state.lock();

        if state.closed {
            return Err(JobError::QueueClosed);
        }
        if state.items.len() >= self.max_capacity {
            return Err(JobError::QueueFull(self.max_capacity));
        }

        state.items.push_back(request);
        self.available.notify_one();

        Ok(())
    }

    /// Desencola el pedido más antiguo
    ///
    /// Bloquea hasta que haya un pedido. Retorna `None` cuando la cola está
    /// cerrada y vacía.
    pub fn dequeue(&self) -> Option<JobRequest> {
        let mut state = self.state.lock();

        loop {
            if let Some(request) = state.items.pop_front() {
                return Some(request);
            }
            if state.closed {
                return None;
            }
            self.available.wait(&mut state);
        }
    }

    /// Intenta desencolar sin bloquear
    pub fn try_dequeue(&self) -> Option<JobRequest> {
        self.state.lock().items.pop_front()
    }

    /// Cierra la cola: no acepta más pedidos y despierta a todos los workers.
    /// Los pedidos ya encolados se siguen entregando.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.available.notify_all();
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Obtiene estadísticas de la cola
    pub fn stats(&self) -> QueueStats {
        let state = self.state.lock();
        QueueStats {
            queued: state.items.len(),
            capacity: self.max_capacity,
            closed: state.closed,
        }
    }
}

/// Estadísticas de la cola
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct QueueStats {
    pub queued: usize,
    pub capacity: usize,
    pub closed: bool,
}

impl Clone for JobQueue {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            available: Arc::clone(&self.available),
            max_capacity: self.max_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_queue_is_fifo() {
        let queue = JobQueue::new(10);
        queue.enqueue(JobRequest::new("a", 1)).unwrap();
        queue.enqueue(JobRequest::new("b", 2)).unwrap();
        queue.enqueue(JobRequest::new("c", 3)).unwrap();

        assert_eq!(queue.try_dequeue().unwrap().job_id, "a");
        assert_eq!(queue.try_dequeue().unwrap().job_id, "b");
        assert_eq!(queue.try_dequeue().unwrap().job_id, "c");
        assert!(queue.try_dequeue().is_none());
    }

    #[test]
    fn test_queue_capacity() {
        let queue = JobQueue::new(2);

        assert!(queue.enqueue(JobRequest::new("1", 10)).is_ok());
        assert!(queue.enqueue(JobRequest::new("2", 10)).is_ok());
        assert_eq!(queue.len(), 2);
        assert!(matches!(
            queue.enqueue(JobRequest::new("3", 10)),
            Err(JobError::QueueFull(2))
        ));
    }

    #[test]
    fn test_closed_queue_rejects_and_drains() {
        let queue = JobQueue::new(10);
        queue.enqueue(JobRequest::new("x", 5)).unwrap();
        queue.close();

        assert!(matches!(
            queue.enqueue(JobRequest::new("y", 5)),
            Err(JobError::QueueClosed)
        ));
        assert!(queue.stats().closed);
        assert_eq!(queue.dequeue().unwrap().job_id, "x");
        assert!(queue.dequeue().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_dequeue_blocks_until_enqueue() {
        let queue = JobQueue::new(10);
        let consumer = {
            let queue = queue.clone();
            thread::spawn(move || queue.dequeue())
        };

        thread::sleep(Duration::from_millis(50));
        queue.enqueue(JobRequest::new("late", 7)).unwrap();

        let got = consumer.join().unwrap();
        assert_eq!(got, Some(JobRequest::new("late", 7)));
    }

    #[test]
    fn test_close_wakes_blocked_workers() {
        let queue = JobQueue::new(10);
        let workers: Vec<_> = (0..3)
            .map(|_| {
                let queue = queue.clone();
                thread::spawn(move || queue.dequeue())
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        queue.close();

        for worker in workers {
            assert!(worker.join().unwrap().is_none());
        }
    }

    #[test]
    fn test_stats() {
        let queue = JobQueue::new(5);
        queue.enqueue(JobRequest::new("s", 1)).unwrap();

        let stats = queue.stats();
        assert_eq!(stats, QueueStats { queued: 1, capacity: 5, closed: false });
    }
}
