//! Persisted build state.
//!
//! A generation run records what it produced (handler artifacts, exported
//! values, files to upload) so the packaging and deployment steps that run
//! afterwards can pick it up without re-running synthesis.

mod storage;
mod types;

pub use storage::StateStore;
pub use types::{CloudProvider, ExportInformation, FileUploadDescription, HandlerInformation, NimbusState, StateError};
