//! Keysweep Core
//!
//! Core types and abstractions for the Keysweep brute-force search service.
//!
//! This crate contains:
//! - Domain types: Core business entities (Job, JobStatus, Outcome)
//! - DTOs: Data transfer objects for the HTTP surface
//! - Generator: Deterministic candidate enumeration over an alphabet

pub mod domain;
pub mod dto;
pub mod generator;
