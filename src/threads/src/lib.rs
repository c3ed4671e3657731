pub mod collector;
pub mod ipc;

pub use collector::{CollectorConfig, CollectorState, CollectorThread};
pub use ipc::{IPCMessage, Report, IPC};
