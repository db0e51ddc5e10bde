use thiserror::Error;

pub type AdvisorResult<T> = Result<T, AdvisorError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdvisorError {
    #[error("Failed to parse wind group, expected DDDSSKT: {0:?}")]
    WindFormat(String),
    #[error("Runway {runway} for role {role} is not part of the runway configuration")]
    MissingRunway { role: String, runway: String },
    #[error("Rule refers to unknown runway role: {0}")]
    UnknownRole(String),
    #[error("Runway configuration has no runways")]
    NoRunways,
    #[error("Runway {0} is listed more than once")]
    DuplicateRunway(String),
}
