//! Collaborator contracts consumed by the sandbox filesystem client.
//!
//! Nothing in this crate performs I/O. The remote API, the command
//! executor and the host filesystem are all reached through the traits
//! defined here so they can be swapped for fakes in tests.

pub mod api;
pub mod exec;
pub mod local;

pub use api::{OperationResponse, SandboxApi};
pub use exec::{CommandExecutor, CommandResult};
pub use local::LocalFs;
