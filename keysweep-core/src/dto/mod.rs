//! Data Transfer Objects for the HTTP surface
//!
//! Request and response bodies exchanged between the server and its
//! clients. Kept separate from the domain types so the wire shape can stay
//! small while the job record grows.

pub mod job;
