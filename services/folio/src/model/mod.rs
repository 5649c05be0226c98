//! Portfolio data model.
//!
//! # Purpose
//! Typed views over the upstream ArtStation payloads and the visit-log
//! records. Upstream payloads keep every field they carry: only the fields the
//! service reads or rewrites are typed, the rest round-trip through `extra`.
mod project;
mod visit;

pub use project::{Asset, Cover, ProjectDetail, ProjectSummary, UserProjects};
pub use visit::VisitRecord;
