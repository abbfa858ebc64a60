//! Background chunk generation with a priority queue
//!
//! Generation runs on a pool of worker threads so the tick loop never waits
//! on noise evaluation. Workers pull the nearest pending task from a shared
//! heap and hand finished chunks back over a crossbeam channel that only the
//! main thread drains, once per tick.

use std::any::Any;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};
use parking_lot::{Condvar, Mutex};

use crate::core::chunk::{Chunk, ChunkCoord};
use crate::error::{ConfigError, GenerationError, WorldError};
use crate::world::generator::ChunkSource;

/// Request for chunk generation with priority
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenerationTask {
    pub coord: ChunkCoord,
    pub priority: u32, // Lower = higher priority (distance from the observer chunk)
}

/// Sink the chunk cache hands generation work to.
pub trait GenerationQueue {
    fn submit(&mut self, task: GenerationTask);

    /// Re-rank tasks that have not started yet around a new observer chunk.
    fn reprioritize(&mut self, _center: ChunkCoord) {}
}

/// Result of background chunk generation
#[derive(Debug)]
pub enum Completion {
    Generated { coord: ChunkCoord, chunk: Chunk },
    Failed(GenerationError),
}

impl Completion {
    pub fn coord(&self) -> ChunkCoord {
        match self {
            Completion::Generated { coord, .. } => *coord,
            Completion::Failed(err) => err.coord(),
        }
    }
}

struct QueuedTask {
    task: GenerationTask,
    seq: u64,
}

impl PartialEq for QueuedTask {
    fn eq(&self, other: &Self) -> bool {
        self.task.priority == other.task.priority && self.seq == other.seq
    }
}

impl Eq for QueuedTask {}

impl PartialOrd for QueuedTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedTask {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap, FIFO among equal priorities
        other
            .task
            .priority
            .cmp(&self.task.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct QueueState {
    heap: BinaryHeap<QueuedTask>,
    next_seq: u64,
    closed: bool,
}

/// Priority heap shared between the main thread and the workers.
struct JobQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl JobQueue {
    fn new() -> Self {
        JobQueue {
            state: Mutex::new(QueueState {
                heap: BinaryHeap::new(),
                next_seq: 0,
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    fn push(&self, task: GenerationTask) {
        let mut state = self.state.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.heap.push(QueuedTask { task, seq });
        drop(state);
        self.available.notify_one();
    }

    /// Block until a task is available. `None` once the queue is closed.
    fn pop(&self) -> Option<GenerationTask> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(queued) = state.heap.pop() {
                return Some(queued.task);
            }
            self.available.wait(&mut state);
        }
    }

    fn reprioritize(&self, center: ChunkCoord) {
        let mut state = self.state.lock();
        let queued: Vec<QueuedTask> = state.heap.drain().collect();
        for mut q in queued {
            q.task.priority = q.task.coord.chebyshev(center);
            state.heap.push(q);
        }
    }

    fn len(&self) -> usize {
        self.state.lock().heap.len()
    }

    fn close(&self) {
        self.state.lock().closed = true;
        self.available.notify_all();
    }
}

/// Manages background chunk generation with worker threads
pub struct GenerationScheduler {
    jobs: Arc<JobQueue>,
    result_rx: Receiver<Completion>,
    workers: Vec<JoinHandle<()>>,
    in_flight: usize,
}

impl GenerationScheduler {
    /// Spawn `num_workers` threads, each sharing the same chunk source.
    pub fn new(source: Arc<dyn ChunkSource>, num_workers: usize) -> Result<Self, WorldError> {
        if num_workers == 0 {
            return Err(ConfigError::ZeroWorkers.into());
        }

        let jobs = Arc::new(JobQueue::new());
        let (result_tx, result_rx) = unbounded::<Completion>();

        let mut scheduler = GenerationScheduler {
            jobs,
            result_rx,
            workers: Vec::with_capacity(num_workers),
            in_flight: 0,
        };

        for worker_id in 0..num_workers {
            let source = Arc::clone(&source);
            let jobs = Arc::clone(&scheduler.jobs);
            let tx = result_tx.clone();

            // On error the partially built scheduler is dropped, which closes
            // the queue and joins the workers spawned so far.
            let handle = thread::Builder::new()
                .name(format!("chunk-gen-{}", worker_id))
                .spawn(move || run_worker(source, jobs, tx))?;
            scheduler.workers.push(handle);
        }

        Ok(scheduler)
    }

    /// Poll for finished chunks (non-blocking).
    /// Returns at most `max_results` completions, all of them if zero.
    pub fn drain_completions(&mut self, max_results: usize) -> Vec<Completion> {
        let limit = if max_results == 0 {
            usize::MAX
        } else {
            max_results
        };
        let mut results = Vec::new();

        while results.len() < limit {
            match self.result_rx.try_recv() {
                Ok(completion) => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    results.push(completion);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::error!("All chunk generation workers have exited");
                    break;
                }
            }
        }

        results
    }

    /// Tasks submitted but not yet drained.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Tasks still waiting for a worker.
    pub fn queued_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

impl GenerationQueue for GenerationScheduler {
    fn submit(&mut self, task: GenerationTask) {
        self.in_flight += 1;
        self.jobs.push(task);
    }

    fn reprioritize(&mut self, center: ChunkCoord) {
        self.jobs.reprioritize(center);
    }
}

impl Drop for GenerationScheduler {
    fn drop(&mut self) {
        self.jobs.close();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("Chunk generation worker exited abnormally");
            }
        }
    }
}

fn run_worker(source: Arc<dyn ChunkSource>, jobs: Arc<JobQueue>, tx: Sender<Completion>) {
    while let Some(task) = jobs.pop() {
        let coord = task.coord;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| source.generate(coord)));

        let completion = match outcome {
            Ok(Ok(chunk)) => Completion::Generated { coord, chunk },
            Ok(Err(err)) => Completion::Failed(err),
            Err(payload) => Completion::Failed(GenerationError::Panicked {
                coord,
                message: panic_message(payload.as_ref()),
            }),
        };

        if tx.send(completion).is_err() {
            // Main thread has gone away
            break;
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
