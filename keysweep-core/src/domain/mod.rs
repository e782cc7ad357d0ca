//! Core domain types
//!
//! This module contains the core domain structures used across Keysweep crates.
//! These types are shared between the server (which owns and mutates job state)
//! and the client/CLI (which only read it back).

pub mod job;
