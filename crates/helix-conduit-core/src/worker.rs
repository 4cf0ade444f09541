//! Worker pattern for dedicated single-threaded task processing.
//!
//! A [`Worker`] manages a dedicated thread with its own FIFO task queue.
//! Slots may be bound to a worker so that signal deliveries addressed to
//! them are marshalled onto that thread instead of running on the emitter's
//! thread. A typical application keeps a small set of long-lived workers: a
//! default worker for UI-affine services plus ad hoc workers for I/O-heavy
//! services such as file writers or network push/pull.
//!
//! Tasks posted to the *same* worker execute in post order. Tasks posted to
//! *different* workers have no relative ordering guarantee.
//!
//! # Example
//!
//! ```
//! use helix_conduit_core::Worker;
//!
//! let worker = Worker::new();
//!
//! worker.post(|| {
//!     // runs on the worker thread
//! });
//!
//! // Post and block until the task has completed on the worker thread.
//! worker.post_blocking(|| {
//!     // runs on the worker thread while the caller waits
//! });
//!
//! // Graceful shutdown: remaining tasks are drained first.
//! worker.stop();
//! worker.join();
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use parking_lot::{Condvar, Mutex};

/// Default capacity for the worker's task queue.
const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Configuration for creating a Worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Name for the worker thread.
    pub name: String,
    /// Stack size for the worker thread in bytes. `None` uses the default.
    pub stack_size: Option<usize>,
    /// Capacity of the task queue.
    pub queue_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: "conduit-worker".to_string(),
            stack_size: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl WorkerConfig {
    /// Create a new configuration with the given thread name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Builder for creating Workers with custom configuration.
#[derive(Debug, Default)]
pub struct WorkerBuilder {
    config: WorkerConfig,
}

impl WorkerBuilder {
    /// Create a new WorkerBuilder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the thread name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the stack size for the worker thread.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    /// Set the task queue capacity.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Build and start the worker.
    pub fn build(self) -> Worker {
        Worker::with_config(self.config)
    }
}

/// A handle for signaling completion of a blocking post.
///
/// The posting side holds the matching [`CompletionWaiter`]; the worker
/// signals through this handle once the task has finished executing.
pub struct CompletionHandle {
    inner: Arc<CompletionState>,
}

impl CompletionHandle {
    /// Signal that the task is complete.
    fn signal_done(self) {
        let mut done = self.inner.done.lock();
        *done = true;
        self.inner.condvar.notify_all();
    }
}

/// A waiter for blocking on task completion.
pub struct CompletionWaiter {
    inner: Arc<CompletionState>,
}

impl CompletionWaiter {
    /// Wait for the task to complete.
    ///
    /// This blocks the current thread until the task finishes executing.
    ///
    /// # Warning
    ///
    /// Calling this from the worker's own thread deadlocks: the worker
    /// cannot reach the task while it is blocked here.
    pub fn wait(self) {
        let mut done = self.inner.done.lock();
        while !*done {
            self.inner.condvar.wait(&mut done);
        }
    }

    /// Wait for the task to complete with a timeout.
    ///
    /// Returns `true` if the task completed, `false` if the timeout elapsed.
    pub fn wait_timeout(self, timeout: Duration) -> bool {
        let mut done = self.inner.done.lock();
        if *done {
            return true;
        }
        let result = self.inner.condvar.wait_for(&mut done, timeout);
        *done || !result.timed_out()
    }
}

struct CompletionState {
    done: Mutex<bool>,
    condvar: Condvar,
}

/// Create a completion handle/waiter pair for blocking posts.
pub(crate) fn completion_pair() -> (CompletionHandle, CompletionWaiter) {
    let state = Arc::new(CompletionState {
        done: Mutex::new(false),
        condvar: Condvar::new(),
    });

    (
        CompletionHandle {
            inner: state.clone(),
        },
        CompletionWaiter { inner: state },
    )
}

/// Internal state shared between the Worker handle and worker thread.
struct WorkerState {
    /// Whether the worker accepts new tasks.
    running: AtomicBool,
    /// Whether shutdown has been requested.
    stopping: AtomicBool,
    /// Count of pending tasks in the queue.
    pending_tasks: AtomicUsize,
    /// Condvar for waiting on shutdown.
    shutdown_condvar: Condvar,
    /// Mutex for the condvar.
    shutdown_mutex: Mutex<()>,
}

impl WorkerState {
    fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            stopping: AtomicBool::new(false),
            pending_tasks: AtomicUsize::new(0),
            shutdown_condvar: Condvar::new(),
            shutdown_mutex: Mutex::new(()),
        }
    }

    fn signal_shutdown(&self) {
        let _guard = self.shutdown_mutex.lock();
        self.shutdown_condvar.notify_all();
    }
}

/// A task sent to the worker.
enum WorkerTask {
    /// Execute a task.
    Run(Box<dyn FnOnce() + Send>),
    /// Execute a task and signal the completion handle afterwards.
    RunWithCompletion {
        task: Box<dyn FnOnce() + Send>,
        completion: CompletionHandle,
    },
    /// Shutdown signal.
    Shutdown,
}

/// A dedicated worker thread with its own FIFO task queue.
///
/// # Thread Safety
///
/// `Worker` is `Send + Sync` and can be safely shared between threads.
/// Multiple threads can post tasks concurrently; tasks are executed one at
/// a time in the order they were accepted into the queue.
pub struct Worker {
    /// Channel sender for submitting tasks.
    task_sender: Sender<WorkerTask>,
    /// Thread handle for joining.
    handle: Mutex<Option<JoinHandle<()>>>,
    /// Shared state with the worker thread.
    state: Arc<WorkerState>,
}

impl Worker {
    /// Create a new worker with default configuration.
    ///
    /// The worker thread starts immediately and begins processing tasks.
    pub fn new() -> Self {
        Self::with_config(WorkerConfig::default())
    }

    /// Create a new worker with custom configuration.
    pub fn with_config(config: WorkerConfig) -> Self {
        let (sender, receiver) = bounded(config.queue_capacity);
        let state = Arc::new(WorkerState::new());

        let thread_state = state.clone();

        let mut builder = thread::Builder::new().name(config.name);
        if let Some(stack_size) = config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let handle = builder
            .spawn(move || {
                worker_loop(receiver, thread_state.clone());
                thread_state.running.store(false, Ordering::Release);
                thread_state.signal_shutdown();
            })
            .expect("Failed to spawn worker thread");

        Self {
            task_sender: sender,
            handle: Mutex::new(Some(handle)),
            state,
        }
    }

    /// Check if the worker is still running.
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::Acquire)
    }

    /// Get the number of pending tasks in the queue.
    pub fn pending_tasks(&self) -> usize {
        self.state.pending_tasks.load(Ordering::Acquire)
    }

    /// Post a task for execution on the worker thread.
    ///
    /// Returns `true` if the task was queued successfully, `false` if the
    /// worker has been stopped or the queue is full.
    pub fn post<F>(&self, task: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if !self.is_running() {
            return false;
        }

        self.state.pending_tasks.fetch_add(1, Ordering::AcqRel);

        match self.task_sender.try_send(WorkerTask::Run(Box::new(task))) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.state.pending_tasks.fetch_sub(1, Ordering::AcqRel);
                false
            }
        }
    }

    /// Post a task and receive a waiter that blocks until it completes.
    ///
    /// Returns `None` if the task could not be queued.
    pub fn post_with_waiter<F>(&self, task: F) -> Option<CompletionWaiter>
    where
        F: FnOnce() + Send + 'static,
    {
        if !self.is_running() {
            return None;
        }

        let (completion, waiter) = completion_pair();

        self.state.pending_tasks.fetch_add(1, Ordering::AcqRel);

        let worker_task = WorkerTask::RunWithCompletion {
            task: Box::new(task),
            completion,
        };

        match self.task_sender.try_send(worker_task) {
            Ok(()) => Some(waiter),
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.state.pending_tasks.fetch_sub(1, Ordering::AcqRel);
                None
            }
        }
    }

    /// Post a task and block until it has completed on the worker thread.
    ///
    /// This is the pattern used to marshal a call from a background thread
    /// onto a UI-affine worker and wait for the outcome.
    ///
    /// Returns `false` if the worker has been stopped and the task was not
    /// executed.
    pub fn post_blocking<F>(&self, task: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        match self.post_with_waiter(task) {
            Some(waiter) => {
                waiter.wait();
                true
            }
            None => false,
        }
    }

    /// Request the worker to stop after processing remaining tasks.
    ///
    /// This is a non-blocking call. The worker will finish processing all
    /// pending tasks before shutting down. Use `join()` to wait for
    /// completion. After calling `stop()`, no new tasks are accepted.
    pub fn stop(&self) {
        // Mark as not running immediately so new posts are rejected
        self.state.running.store(false, Ordering::Release);
        self.state.stopping.store(true, Ordering::Release);
        // Send shutdown signal (ignore errors if already disconnected)
        let _ = self.task_sender.try_send(WorkerTask::Shutdown);
    }

    /// Wait for the worker thread to finish.
    ///
    /// This blocks until the worker thread has processed all pending tasks
    /// and exited. Call `stop()` first to initiate shutdown.
    ///
    /// Returns `true` if the worker was joined successfully, `false` if
    /// already joined or the thread panicked.
    pub fn join(&self) -> bool {
        let mut handle = self.handle.lock();
        if let Some(h) = handle.take() {
            h.join().is_ok()
        } else {
            false
        }
    }

    /// Stop the worker and wait for it to finish.
    pub fn stop_and_join(&self) -> bool {
        self.stop();
        self.join()
    }

    /// Wait for the worker to finish with a timeout.
    ///
    /// Returns `true` if the worker finished within the timeout, `false`
    /// if the timeout elapsed.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if !self.is_running() {
            return true;
        }

        let guard = self.state.shutdown_mutex.lock();
        let result = self
            .state
            .shutdown_condvar
            .wait_for(&mut { guard }, timeout);
        !result.timed_out() || !self.is_running()
    }
}

impl Default for Worker {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
        // Don't block in drop - just request shutdown
    }
}

static_assertions::assert_impl_all!(Worker: Send, Sync);

/// The main worker loop that processes tasks.
fn worker_loop(receiver: Receiver<WorkerTask>, state: Arc<WorkerState>) {
    loop {
        // Use a timeout so we can check the stop flag periodically
        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(task @ (WorkerTask::Run(_) | WorkerTask::RunWithCompletion { .. })) => {
                execute_task(task, &state);
            }
            Ok(WorkerTask::Shutdown) => {
                // Process remaining tasks before exiting
                while let Ok(task) = receiver.try_recv() {
                    match task {
                        WorkerTask::Shutdown => continue,
                        other => execute_task(other, &state),
                    }
                }
                break;
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                if state.stopping.load(Ordering::Acquire)
                    && state.pending_tasks.load(Ordering::Acquire) == 0
                {
                    break;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                break;
            }
        }
    }
}

fn execute_task(task: WorkerTask, state: &WorkerState) {
    match task {
        WorkerTask::Run(task) => {
            task();
            state.pending_tasks.fetch_sub(1, Ordering::AcqRel);
        }
        WorkerTask::RunWithCompletion { task, completion } => {
            task();
            state.pending_tasks.fetch_sub(1, Ordering::AcqRel);
            completion.signal_done();
        }
        WorkerTask::Shutdown => {}
    }
}
