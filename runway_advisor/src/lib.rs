//! Runway configuration advisories from surface wind.
//!
//! [`wind::project`] splits a wind into headwind and crosswind for a runway,
//! [`policy::RunwayPolicy`] turns the components for an airport's runways
//! into a [`recommendation::Recommendation`].

pub mod error;
pub mod policy;
pub mod recommendation;
pub mod runway;
pub mod wind;

pub use error::{AdvisorError, AdvisorResult};
pub use policy::{PolicyConfig, RunwayPolicy, Thresholds, recommend};
pub use recommendation::{Advisory, Recommendation};
pub use runway::{RunwayAssessment, RunwayDefinition, sfo_runways};
pub use wind::{WindComponents, WindObservation, project};
