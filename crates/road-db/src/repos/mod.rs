//! Repository modules implementing CRUD operations for all Roadtrack entities.
//!
//! Each module adds methods to `RoadService` via `impl RoadService` blocks.
//! Mutation methods take the acting user's id as `actor`; `None` marks a
//! system action such as the bootstrap admin created from the CLI.

pub mod activity;
pub mod construction;
pub mod contractor;
pub mod funding;
pub mod gps;
pub mod incident;
pub mod milestone;
pub mod navigation;
pub mod project;
pub mod province;
pub mod report;
pub mod settings;
pub mod stats;
pub mod user;
