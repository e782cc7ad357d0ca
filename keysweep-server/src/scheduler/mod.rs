//! Scheduler layer
//!
//! Everything that runs off the request path: the search worker, the pool
//! that decides when a worker may start, and the optional retention sweep.

pub mod executor;
pub mod retention;
pub mod worker;

pub use executor::{JobExecutor, PooledExecutor};
pub use worker::{SearchWorker, WorkerSettings};
