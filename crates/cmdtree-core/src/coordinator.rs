//! Execution coordinators: where and when a matched command's handler runs.
//!
//! [`InlineCoordinator`] runs the handler on the calling thread.
//! [`OffloadingCoordinator`] hands it to a fixed pool of worker threads fed
//! through a bounded [`std::sync::mpsc::sync_channel`]. Either way the
//! caller gets a [`CommandHandle`] that resolves to the context the handler
//! ran with, or to the error that stopped it.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use cmdtree_types::error::{CommandError, Result};

use crate::command::Command;
use crate::context::CommandContext;

/// Outcome carried by a [`CommandHandle`].
pub type Completion<S> = Result<CommandContext<S>>;

/// Decides how a parsed command is executed.
pub trait ExecutionCoordinator<S>: Send + Sync {
    /// Run or enqueue `command`. Never blocks on the handler itself unless
    /// the coordinator runs handlers inline.
    fn schedule(&self, command: Arc<Command<S>>, context: CommandContext<S>) -> CommandHandle<S>;

    fn name(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

enum Slot<S> {
    Pending,
    Done(Completion<S>),
    Taken,
}

struct Shared<S> {
    slot: Mutex<Slot<S>>,
    done: Condvar,
    cancelled: AtomicBool,
}

impl<S> Shared<S> {
    fn lock(&self) -> MutexGuard<'_, Slot<S>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Pending result of a scheduled command.
///
/// The result can be taken exactly once, through [`wait`](Self::wait),
/// [`wait_timeout`](Self::wait_timeout) or [`try_result`](Self::try_result).
pub struct CommandHandle<S> {
    shared: Arc<Shared<S>>,
}

impl<S> CommandHandle<S> {
    /// A handle that is already resolved.
    pub fn ready(result: Completion<S>) -> Self {
        let (handle, completer) = Self::pending();
        completer.complete(result);
        handle
    }

    pub(crate) fn pending() -> (Self, Completer<S>) {
        let shared = Arc::new(Shared {
            slot: Mutex::new(Slot::Pending),
            done: Condvar::new(),
            cancelled: AtomicBool::new(false),
        });
        let completer = Completer {
            shared: Some(Arc::clone(&shared)),
        };
        (Self { shared }, completer)
    }

    /// Block until the command finishes.
    pub fn wait(self) -> Completion<S> {
        let mut slot = self.shared.lock();
        loop {
            match std::mem::replace(&mut *slot, Slot::Taken) {
                Slot::Pending => {
                    *slot = Slot::Pending;
                    slot = self
                        .shared
                        .done
                        .wait(slot)
                        .unwrap_or_else(PoisonError::into_inner);
                },
                Slot::Done(result) => return result,
                Slot::Taken => return Err(already_taken()),
            }
        }
    }

    /// Block for at most `timeout`. `None` if the command is still running.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Completion<S>> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.shared.lock();
        loop {
            match std::mem::replace(&mut *slot, Slot::Taken) {
                Slot::Pending => {
                    *slot = Slot::Pending;
                    let left = deadline.checked_duration_since(Instant::now())?;
                    slot = self
                        .shared
                        .done
                        .wait_timeout(slot, left)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                },
                Slot::Done(result) => return Some(result),
                Slot::Taken => return Some(Err(already_taken())),
            }
        }
    }

    /// Take the result if the command has finished.
    pub fn try_result(&self) -> Option<Completion<S>> {
        let mut slot = self.shared.lock();
        match std::mem::replace(&mut *slot, Slot::Taken) {
            Slot::Pending => {
                *slot = Slot::Pending;
                None
            },
            Slot::Done(result) => Some(result),
            Slot::Taken => Some(Err(already_taken())),
        }
    }

    pub fn is_finished(&self) -> bool {
        !matches!(*self.shared.lock(), Slot::Pending)
    }

    /// Ask for the command not to run. A handler that already started is
    /// not interrupted. Returns `false` if the command had already finished.
    pub fn cancel(&self) -> bool {
        self.shared.cancelled.store(true, Ordering::SeqCst);
        !self.is_finished()
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::SeqCst)
    }
}

impl<S> fmt::Debug for CommandHandle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandHandle")
            .field("finished", &self.is_finished())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

fn already_taken() -> CommandError {
    CommandError::Rejected("command result was already taken".into())
}

/// Producer side of a [`CommandHandle`].
///
/// Dropping it without completing resolves the handle with
/// [`CommandError::Rejected`], so waiters never hang on a lost job.
pub(crate) struct Completer<S> {
    shared: Option<Arc<Shared<S>>>,
}

impl<S> Completer<S> {
    fn is_cancelled(&self) -> bool {
        self.shared
            .as_ref()
            .is_some_and(|s| s.cancelled.load(Ordering::SeqCst))
    }

    pub(crate) fn complete(mut self, result: Completion<S>) {
        if let Some(shared) = self.shared.take() {
            Self::resolve(&shared, result);
        }
    }

    fn resolve(shared: &Shared<S>, result: Completion<S>) {
        let mut slot = shared.lock();
        if matches!(*slot, Slot::Pending) {
            *slot = Slot::Done(result);
        }
        shared.done.notify_all();
    }
}

impl<S> Drop for Completer<S> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            Self::resolve(
                &shared,
                Err(CommandError::Rejected("command was dropped before it ran".into())),
            );
        }
    }
}

/// Run a handler, turning a panic into an execution error.
fn run<S>(command: &Command<S>, context: CommandContext<S>) -> Completion<S> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| command.execute(&context)));
    match outcome {
        Ok(Ok(())) => Ok(context),
        Ok(Err(e)) => {
            log::warn!("{e}");
            Err(e)
        },
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            log::warn!("Handler for '{}' panicked: {message}", command.syntax());
            Err(CommandError::Execution {
                command: command.syntax(),
                source: format!("handler panicked: {message}").into(),
            })
        },
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

// ---------------------------------------------------------------------------
// Inline
// ---------------------------------------------------------------------------

/// Runs handlers synchronously on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineCoordinator;

impl<S> ExecutionCoordinator<S> for InlineCoordinator {
    fn schedule(&self, command: Arc<Command<S>>, context: CommandContext<S>) -> CommandHandle<S> {
        CommandHandle::ready(run(&command, context))
    }

    fn name(&self) -> &'static str {
        "inline"
    }
}

// ---------------------------------------------------------------------------
// Offloading
// ---------------------------------------------------------------------------

struct Job<S> {
    command: Arc<Command<S>>,
    context: CommandContext<S>,
    completer: Completer<S>,
}

/// Runs handlers on a fixed pool of worker threads.
///
/// Jobs queue in a bounded channel. When the queue is full the job is
/// rejected rather than blocking the caller. Dropping the coordinator stops
/// accepting work, lets the workers drain what is queued, and joins them.
pub struct OffloadingCoordinator<S> {
    sender: Mutex<Option<SyncSender<Job<S>>>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl<S: Send + 'static> OffloadingCoordinator<S> {
    pub fn new(workers: usize, queue_capacity: usize) -> Result<Self> {
        if workers == 0 || queue_capacity == 0 {
            return Err(CommandError::Config(
                "offloading coordinator needs at least one worker and one queue slot".into(),
            ));
        }
        let (tx, rx) = mpsc::sync_channel::<Job<S>>(queue_capacity);
        let rx = Arc::new(Mutex::new(rx));

        let mut handles = Vec::with_capacity(workers);
        for i in 0..workers {
            let rx = Arc::clone(&rx);
            let handle = thread::Builder::new()
                .name(format!("cmdtree-worker-{i}"))
                .spawn(move || worker_loop(&rx))?;
            handles.push(handle);
        }
        log::info!("Started {workers} command worker(s), queue capacity {queue_capacity}");

        Ok(Self {
            sender: Mutex::new(Some(tx)),
            workers: handles,
        })
    }
}

impl<S> OffloadingCoordinator<S> {
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stop accepting new jobs. Already queued jobs still run.
    pub fn shutdown(&self) {
        let mut sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        if sender.take().is_some() {
            log::debug!("Command worker pool shutting down");
        }
    }
}

fn worker_loop<S>(rx: &Mutex<Receiver<Job<S>>>) {
    loop {
        let next = rx.lock().unwrap_or_else(PoisonError::into_inner).recv();
        let Ok(job) = next else {
            break;
        };
        if job.completer.is_cancelled() {
            log::debug!("Skipping cancelled command '{}'", job.command.syntax());
            job.completer.complete(Err(CommandError::Cancelled));
            continue;
        }
        let result = run(&job.command, job.context);
        job.completer.complete(result);
    }
    log::debug!(
        "Worker {} exiting",
        thread::current().name().unwrap_or("<unnamed>")
    );
}

impl<S: Send + Sync> ExecutionCoordinator<S> for OffloadingCoordinator<S> {
    fn schedule(&self, command: Arc<Command<S>>, context: CommandContext<S>) -> CommandHandle<S> {
        let (handle, completer) = CommandHandle::pending();
        let syntax = command.syntax();
        let job = Job {
            command,
            context,
            completer,
        };

        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = sender.as_ref() else {
            reject(job, "coordinator is shut down");
            return handle;
        };
        match tx.try_send(job) {
            Ok(()) => {},
            Err(TrySendError::Full(job)) => {
                log::warn!("Command queue full, rejecting '{syntax}'");
                reject(job, "command queue is full");
            },
            Err(TrySendError::Disconnected(job)) => reject(job, "command workers have exited"),
        }
        handle
    }

    fn name(&self) -> &'static str {
        "offloading"
    }
}

fn reject<S>(job: Job<S>, reason: &str) {
    job.completer
        .complete(Err(CommandError::Rejected(reason.to_string())));
}

impl<S> Drop for OffloadingCoordinator<S> {
    fn drop(&mut self) {
        self.shutdown();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                log::warn!("Command worker panicked during shutdown");
            }
        }
    }
}

impl<S> fmt::Debug for OffloadingCoordinator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OffloadingCoordinator")
            .field("workers", &self.workers.len())
            .finish_non_exhaustive()
    }
}
