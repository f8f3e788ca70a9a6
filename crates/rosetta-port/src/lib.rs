//! Execution side of the RouterOS translation layer.
//!
//! [`RouterPort`] is the contract a per-protocol transport implements.
//! [`TranslatingPort`] wraps one so callers work with logical field names:
//! it resolves the device version once, translates, dispatches through the
//! [`bridge`], and decodes the reply. [`BatchExecutor`] runs ordered command
//! lists with cancellation and stop-on-error semantics.

pub mod batch;
pub mod bridge;
pub mod error;
pub mod port;
pub mod scripted;
pub mod translating;

pub use batch::{BatchCommand, BatchExecutor, BatchResult};
pub use error::{AdapterError, PortError};
pub use port::{NativeRecord, RouterCommand, RouterInfo, RouterPort, RouterResult, StateQuery, StateResult};
pub use scripted::{Expectation, ScriptedPort, ScriptedReply};
pub use translating::TranslatingPort;
