//! Worker pool (C2): a fixed set of threads pulling nullary units of work
//! from an unbounded FIFO queue. Runs requests to completion; no priority,
//! no cancellation, no ordering guarantee across descriptors.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Sender};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// The pool has been shut down; `submit` rejects further work.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("worker pool has been stopped")]
pub struct PoolStopped;

pub struct WorkerPool {
    sender: Sender<Job>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `size` worker threads, each pulling jobs off a shared queue
    /// until the pool is dropped or [`WorkerPool::shutdown`] is called.
    /// Fails (without leaving stray threads behind — `sender` drops,
    /// joining whatever already spawned) if the OS refuses to spawn one of
    /// the threads, which `main` surfaces through `StartupError::WorkerSpawn`.
    pub fn new(size: usize) -> std::io::Result<Self> {
        let (sender, receiver) = unbounded::<Job>();
        let mut handles = Vec::with_capacity(size);

        for id in 0..size {
            let receiver = receiver.clone();
            let spawned = thread::Builder::new()
                .name(format!("rhttpd-worker-{id}"))
                .spawn(move || {
                    for job in receiver {
                        job();
                    }
                });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    drop(sender);
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(e);
                }
            }
        }

        Ok(WorkerPool { sender, handles })
    }

    /// Enqueues a unit of work. Fails once the pool's sending side has been
    /// dropped (i.e. after [`WorkerPool::shutdown`]).
    pub fn submit(&self, job: impl FnOnce() + Send + 'static) -> Result<(), PoolStopped> {
        self.sender.send(Box::new(job)).map_err(|_| PoolStopped)
    }

    /// Drains the queue, signals all workers to stop once it's empty, and
    /// joins them.
    pub fn shutdown(self) {
        drop(self.sender);
        for handle in self.handles {
            let _ = handle.join();
        }
    }
}
