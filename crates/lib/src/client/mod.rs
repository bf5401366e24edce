//! Runtime clients used from inside deployed handlers.
//!
//! Each client pairs a backend trait, the seam to the cloud service, with the
//! environment variables synthesis wrote into the function definition.
//! [`local`] provides in-process backends.

pub mod condition;
pub mod env;
pub mod error;
pub mod function;
pub mod keyvalue;
pub mod local;
pub mod notification;
pub mod queue;

pub use condition::{Comparison, Condition, Operand};
pub use env::{EnvironmentVariableClient, LazyEnvValue, ProcessEnvironment, StaticEnvironment};
pub use error::ClientError;
pub use function::{BasicFunctionClient, FunctionBackend, InvocationType};
pub use keyvalue::{
  Item, KeyValueBackend, KeyValueClient, ReadItemRequest, Sign, TransactionClient, WriteItemRequest, WriteOperation,
};
pub use notification::{NotificationBackend, NotificationClient, Protocol};
pub use queue::{QueueBackend, QueueClient};
