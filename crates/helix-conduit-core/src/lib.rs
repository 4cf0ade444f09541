//! Core communication primitives for Helix Conduit.
//!
//! This crate provides the building blocks that the service runtime is wired
//! out of:
//!
//! - **Signal/Slot System**: Type-safe, thread-safe communication endpoints
//! - **Connections**: Disconnectable, blockable handles to individual edges
//! - **Connection Bundles**: Batch connection ownership for service lifecycles
//! - **Endpoint Tables**: String-keyed publication of signals and slots
//! - **Workers**: Dedicated threads with FIFO task queues for deferred delivery
//!
//! # Signal/Slot Example
//!
//! ```
//! use helix_conduit_core::{Signal, Slot};
//!
//! // Create a signal that passes an i64 argument
//! let modified = Signal::<i64>::new();
//!
//! // Create a slot (bound callable) and connect it
//! let printer = Slot::new(|value: &i64| {
//!     println!("Value changed to: {}", value);
//! });
//! let connection = modified.connect(&printer).unwrap();
//!
//! // Emit the signal
//! modified.emit(42);
//!
//! // Disconnect when done
//! connection.disconnect();
//! ```
//!
//! # Delivery Modes
//!
//! Whether an emission runs inline, is posted to each receiver's worker, or
//! blocks until all posted deliveries complete is a decision made at each
//! call site, not a property of the signal:
//!
//! - [`Signal::emit`] - invoke every slot synchronously on the calling thread
//! - [`Signal::emit_async`] - post onto each slot's worker, return immediately
//! - [`Signal::emit_blocking`] - post onto each slot's worker, wait for all
//!
//! # Worker Example
//!
//! ```
//! use std::sync::Arc;
//! use helix_conduit_core::{Signal, Slot, Worker};
//!
//! let io_worker = Arc::new(Worker::new());
//!
//! let saved = Signal::<String>::new();
//! let writer = Slot::with_worker(
//!     |path: &String| { /* write the file */ let _ = path; },
//!     io_worker.clone(),
//! );
//! let _connection = saved.connect(&writer).unwrap();
//!
//! // Runs on the worker thread, FIFO with everything else posted there.
//! saved.emit_async("/tmp/series.trf".to_string());
//!
//! io_worker.stop_and_join();
//! ```

mod bundle;
mod connection;
mod error;
pub mod logging;
mod signal;
mod slot;
mod table;
pub mod worker;

pub use bundle::ConnectionBundle;
pub use connection::{Blocker, Connection};
pub use error::WiringError;
pub use signal::{AnySignal, ConnectionId, Signal, SignalId};
pub use slot::{AnySlot, Slot, SlotId};
pub use table::{SignalTable, SlotTable};
pub use worker::{CompletionWaiter, Worker, WorkerBuilder, WorkerConfig};
