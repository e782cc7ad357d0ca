//! Service Module
//!
//! Business logic behind the API: the dispatcher accepts and cancels jobs,
//! the status service answers read-only queries.

pub mod dispatcher;
pub mod status;

pub use dispatcher::{DispatchError, Dispatcher};
pub use status::{StatusError, StatusService};
