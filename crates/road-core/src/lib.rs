//! # road-core
//!
//! Core types, ID prefixes, and error types for Roadtrack.
//!
//! This crate provides the foundational types shared across all Roadtrack crates:
//! - Entity structs for all persisted records (projects, GPS points, incidents, etc.)
//! - Create payloads with field validation
//! - Status enums with state machine transitions
//! - ID prefix constants
//! - Cross-cutting error types
//! - The realtime event envelope shared by the server and the stream client

pub mod entities;
pub mod enums;
pub mod errors;
pub mod events;
pub mod identity;
pub mod ids;
pub mod serde_helpers;
