//! Entity structs for all Roadtrack records, plus the create payloads accepted
//! by the service layer.
//!
//! Each entity maps to a table in the libSQL database (see
//! `road-db/migrations/001_initial.sql`). All structs derive `Serialize`,
//! `Deserialize`, and `JsonSchema`. Create payloads expose `validate()`, which
//! the service layer calls before touching the database.

mod activity;
pub mod checks;
mod construction;
mod contractor;
mod funding;
mod gps;
mod incident;
mod milestone;
mod navigation;
mod project;
mod province;
mod report;
mod settings;
mod user;

pub use activity::Activity;
pub use checks::validate_coordinates;
pub use construction::{ConstructionActivity, NewConstructionActivity};
pub use contractor::{AssignContractor, Contractor, NewContractor, ProjectContractor};
pub use funding::{DEFAULT_CURRENCY, NewFunding, ProjectFunding, validate_disbursement};
pub use gps::{GpsPhoto, GpsPoint, NewGpsPhoto, NewGpsPoint};
pub use incident::{HseIncident, NewIncident};
pub use milestone::{NewMilestone, ProjectMilestone};
pub use navigation::{NavigationItem, NewNavigationItem};
pub use project::{NewProject, NewSection, Project, ProjectStats, RoadSection};
pub use province::{NewProvince, Province};
pub use report::{NewProgressReport, ProgressReport};
pub use settings::SystemSetting;
pub use user::{MIN_PASSWORD_LEN, NewUser, User, validate_email};
