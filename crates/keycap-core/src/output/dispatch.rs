// Keycap Synthesis Dispatcher
// Runs synthesis jobs off the hook thread

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crossbeam_channel::{unbounded, Sender};

/// One unit of deferred work
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// How synthesis jobs get a thread
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SynthesisMode {
    /// A fresh detached thread for every match
    #[default]
    ThreadPerMatch,
    /// A fixed set of workers fed from an unbounded queue
    Pool { workers: usize },
}

impl SynthesisMode {
    /// `0` means thread-per-match
    pub fn from_workers(workers: usize) -> Self {
        if workers == 0 {
            SynthesisMode::ThreadPerMatch
        } else {
            SynthesisMode::Pool { workers }
        }
    }
}

enum Strategy {
    Spawn { spawned: AtomicU64 },
    Queue { sender: Sender<Job>, workers: usize },
}

/// Hands jobs to threads without ever blocking the caller
pub struct Dispatcher {
    strategy: Strategy,
}

fn run_job(job: Job) {
    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
        log::warn!("synthesis job panicked");
    }
}

impl Dispatcher {
    pub fn new(mode: SynthesisMode) -> Self {
        let workers = match mode {
            SynthesisMode::Pool { workers } if workers > 0 => workers,
            _ => return Self::spawning(),
        };

        let (sender, receiver) = unbounded::<Job>();
        let mut started = 0;
        for i in 0..workers {
            let receiver = receiver.clone();
            let spawned = thread::Builder::new()
                .name(format!("keycap-synth-{}", i))
                .spawn(move || {
                    for job in receiver.iter() {
                        run_job(job);
                    }
                });
            match spawned {
                Ok(_) => started += 1,
                Err(e) => log::warn!("Failed to start synthesis worker {}: {}", i, e),
            }
        }

        if started == 0 {
            log::warn!("No synthesis workers started, falling back to thread-per-match");
            return Self::spawning();
        }
        log::debug!("started {} synthesis workers", started);

        Self {
            strategy: Strategy::Queue {
                sender,
                workers: started,
            },
        }
    }

    fn spawning() -> Self {
        Self {
            strategy: Strategy::Spawn {
                spawned: AtomicU64::new(0),
            },
        }
    }

    /// The mode actually in effect
    pub fn mode(&self) -> SynthesisMode {
        match &self.strategy {
            Strategy::Spawn { .. } => SynthesisMode::ThreadPerMatch,
            Strategy::Queue { workers, .. } => SynthesisMode::Pool { workers: *workers },
        }
    }

    /// Queue `job`; failures are logged and the job is dropped
    pub fn submit(&self, job: Job) {
        match &self.strategy {
            Strategy::Spawn { spawned } => {
                let n = spawned.fetch_add(1, Ordering::Relaxed);
                if let Err(e) = thread::Builder::new()
                    .name(format!("keycap-synth-{}", n))
                    .spawn(move || run_job(job))
                {
                    log::warn!("Failed to spawn synthesis thread: {}", e);
                }
            }
            Strategy::Queue { sender, .. } => {
                if sender.send(job).is_err() {
                    log::warn!("Synthesis queue closed, dropping job");
                }
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(SynthesisMode::default())
    }
}
