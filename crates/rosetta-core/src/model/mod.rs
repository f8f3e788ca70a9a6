// ── Canonical model ──
//
// The protocol-neutral intermediate representation shared by the
// translator, the protocol formatters, and the port layer.

pub mod command;
pub mod command_error;
pub mod response;
pub mod value;
pub mod version;

pub use command::{Action, CanonicalCommand, CommandBuilder, CommandMetadata, Filter, FilterOp};
pub use command_error::{CommandError, ErrorCategory};
pub use response::{CanonicalResponse, Protocol, ResponseData, ResponseMetadata};
pub use value::{Record, Value};
pub use version::DeviceVersion;
