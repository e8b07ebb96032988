//! Partial-update types for entity mutations.
//!
//! Each struct has `Option` fields. Only `Some` fields generate SET clauses in
//! the dynamic UPDATE SQL. Nullable columns use `Option<Option<T>>`: an absent
//! field is left unchanged and an explicit `null` clears the column. The
//! serialized form (changed fields only) becomes the activity `detail`.

pub mod construction;
pub mod contractor;
pub mod funding;
pub mod gps;
pub mod incident;
pub mod milestone;
pub mod navigation;
pub mod project;
pub mod province;
pub mod user;
