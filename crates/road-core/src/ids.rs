//! ID prefix constants.
//!
//! IDs are generated in SQL as `<prefix>-<8 hex chars>`, e.g. `prj-a3f8b2c1`.

pub const PREFIX_USER: &str = "usr";
pub const PREFIX_PROVINCE: &str = "prv";
pub const PREFIX_PROJECT: &str = "prj";
pub const PREFIX_SECTION: &str = "sec";
pub const PREFIX_CONTRACTOR: &str = "ctr";
pub const PREFIX_GPS_POINT: &str = "gps";
pub const PREFIX_PHOTO: &str = "pho";
pub const PREFIX_CONSTRUCTION: &str = "cac";
pub const PREFIX_MILESTONE: &str = "mst";
pub const PREFIX_FUNDING: &str = "fnd";
pub const PREFIX_INCIDENT: &str = "hse";
pub const PREFIX_REPORT: &str = "rpt";
pub const PREFIX_NAVIGATION: &str = "nav";
pub const PREFIX_ACTIVITY: &str = "act";
pub const PREFIX_UPLOAD: &str = "upl";

pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_USER,
    PREFIX_PROVINCE,
    PREFIX_PROJECT,
    PREFIX_SECTION,
    PREFIX_CONTRACTOR,
    PREFIX_GPS_POINT,
    PREFIX_PHOTO,
    PREFIX_CONSTRUCTION,
    PREFIX_MILESTONE,
    PREFIX_FUNDING,
    PREFIX_INCIDENT,
    PREFIX_REPORT,
    PREFIX_NAVIGATION,
    PREFIX_ACTIVITY,
    PREFIX_UPLOAD,
];
