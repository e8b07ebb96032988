//! Roles, construction enums, status state machines, entity types, and actions.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.
//! Status enums with state machines provide `allowed_next_states()` to enforce
//! valid transitions at the application layer. `FromStr` is case-insensitive
//! and trims whitespace, since values arrive from CSV files and CLI flags.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

/// Implements `Display` and `FromStr` from `as_str()` and an `ALL` table.
macro_rules! text_enum {
    ($ty:ident, $label:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim().to_ascii_lowercase();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == needle)
                    .ok_or_else(|| {
                        let allowed: Vec<&str> = Self::ALL.iter().map(|v| v.as_str()).collect();
                        CoreError::Validation(format!(
                            "invalid {} '{}' (expected one of: {})",
                            $label,
                            s.trim(),
                            allowed.join(", ")
                        ))
                    })
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// User role, ordered from most to least privileged.
///
/// ```text
/// admin > manager > engineer > viewer
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Engineer,
    Viewer,
}

impl Role {
    pub const ALL: &'static [Self] = &[Self::Admin, Self::Manager, Self::Engineer, Self::Viewer];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Engineer => "engineer",
            Self::Viewer => "viewer",
        }
    }

    /// Numeric privilege level; higher means more privileged.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Admin => 3,
            Self::Manager => 2,
            Self::Engineer => 1,
            Self::Viewer => 0,
        }
    }

    /// Whether this role is at least as privileged as `other`.
    #[must_use]
    pub const fn at_least(self, other: Self) -> bool {
        self.rank() >= other.rank()
    }
}

text_enum!(Role, "role");

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Construction stage recorded against a GPS point or activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Drainage,
    Basket,
    Sealing,
}

impl Phase {
    pub const ALL: &'static [Self] = &[Self::Drainage, Self::Basket, Self::Sealing];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Drainage => "drainage",
            Self::Basket => "basket",
            Self::Sealing => "sealing",
        }
    }
}

text_enum!(Phase, "phase");

// ---------------------------------------------------------------------------
// RoadSide
// ---------------------------------------------------------------------------

/// Side of the road alignment a GPS point was recorded on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoadSide {
    Left,
    Right,
    Center,
}

impl RoadSide {
    pub const ALL: &'static [Self] = &[Self::Left, Self::Right, Self::Center];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Center => "center",
        }
    }
}

text_enum!(RoadSide, "side");

// ---------------------------------------------------------------------------
// ProjectStatus
// ---------------------------------------------------------------------------

/// Status of a project through its delivery lifecycle.
///
/// ```text
/// planning → active → completed
///          ↘        ↘ on_hold → active
/// any non-terminal → cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Planning,
    Active,
    OnHold,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    pub const ALL: &'static [Self] = &[
        Self::Planning,
        Self::Active,
        Self::OnHold,
        Self::Completed,
        Self::Cancelled,
    ];

    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Planning => &[Self::Active, Self::OnHold, Self::Cancelled],
            Self::Active => &[Self::OnHold, Self::Completed, Self::Cancelled],
            Self::OnHold => &[Self::Active, Self::Cancelled],
            Self::Completed | Self::Cancelled => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Active => "active",
            Self::OnHold => "on_hold",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

text_enum!(ProjectStatus, "project status");

// ---------------------------------------------------------------------------
// ConstructionStatus
// ---------------------------------------------------------------------------

/// Status of a construction activity. Free-form: any status may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConstructionStatus {
    NotStarted,
    InProgress,
    Completed,
    Delayed,
}

impl ConstructionStatus {
    pub const ALL: &'static [Self] = &[
        Self::NotStarted,
        Self::InProgress,
        Self::Completed,
        Self::Delayed,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Delayed => "delayed",
        }
    }
}

text_enum!(ConstructionStatus, "construction status");

// ---------------------------------------------------------------------------
// MilestoneStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    Pending,
    InProgress,
    Completed,
    Missed,
}

impl MilestoneStatus {
    pub const ALL: &'static [Self] = &[
        Self::Pending,
        Self::InProgress,
        Self::Completed,
        Self::Missed,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Missed => "missed",
        }
    }
}

text_enum!(MilestoneStatus, "milestone status");

// ---------------------------------------------------------------------------
// IncidentSeverity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IncidentSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl IncidentSeverity {
    pub const ALL: &'static [Self] = &[Self::Low, Self::Medium, Self::High, Self::Critical];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

text_enum!(IncidentSeverity, "severity");

// ---------------------------------------------------------------------------
// IncidentStatus
// ---------------------------------------------------------------------------

/// Status of an HSE incident.
///
/// ```text
/// open → investigating → resolved → closed
///                      ↘ open (reopened)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Open,
    Investigating,
    Resolved,
    Closed,
}

impl IncidentStatus {
    pub const ALL: &'static [Self] = &[
        Self::Open,
        Self::Investigating,
        Self::Resolved,
        Self::Closed,
    ];

    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Open => &[Self::Investigating],
            Self::Investigating => &[Self::Resolved, Self::Open],
            Self::Resolved => &[Self::Closed, Self::Investigating],
            Self::Closed => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Investigating => "investigating",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }
}

text_enum!(IncidentStatus, "incident status");

// ---------------------------------------------------------------------------
// EntityType
// ---------------------------------------------------------------------------

/// Kinds of records tracked in the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    User,
    Province,
    Project,
    Section,
    Contractor,
    GpsPoint,
    Photo,
    ConstructionActivity,
    Milestone,
    Funding,
    Incident,
    Report,
    Setting,
    Navigation,
    Upload,
}

impl EntityType {
    pub const ALL: &'static [Self] = &[
        Self::User,
        Self::Province,
        Self::Project,
        Self::Section,
        Self::Contractor,
        Self::GpsPoint,
        Self::Photo,
        Self::ConstructionActivity,
        Self::Milestone,
        Self::Funding,
        Self::Incident,
        Self::Report,
        Self::Setting,
        Self::Navigation,
        Self::Upload,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Province => "province",
            Self::Project => "project",
            Self::Section => "section",
            Self::Contractor => "contractor",
            Self::GpsPoint => "gps_point",
            Self::Photo => "photo",
            Self::ConstructionActivity => "construction_activity",
            Self::Milestone => "milestone",
            Self::Funding => "funding",
            Self::Incident => "incident",
            Self::Report => "report",
            Self::Setting => "setting",
            Self::Navigation => "navigation",
            Self::Upload => "upload",
        }
    }
}

text_enum!(EntityType, "entity type");

// ---------------------------------------------------------------------------
// ActivityAction
// ---------------------------------------------------------------------------

/// What happened to an entity, as recorded in the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Created,
    Updated,
    Deleted,
    StatusChanged,
    Imported,
}

impl ActivityAction {
    pub const ALL: &'static [Self] = &[
        Self::Created,
        Self::Updated,
        Self::Deleted,
        Self::StatusChanged,
        Self::Imported,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::StatusChanged => "status_changed",
            Self::Imported => "imported",
        }
    }
}

text_enum!(ActivityAction, "activity action");
