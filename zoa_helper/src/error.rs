use std::io;

use config::ConfigError;
use runway_advisor::AdvisorError;
use rustyline::error::ReadlineError;
use thiserror::Error;

pub(crate) type ApplicationResult<T> = Result<T, ApplicationError>;

#[derive(Debug, Error)]
pub(crate) enum ApplicationError {
    #[error("Error regarding config: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Failed to write config: {0}")]
    ConfigWriteError(#[from] toml::ser::Error),
    #[error("System input/output error: {0}")]
    IoError(#[from] io::Error),
    #[error("Failed to read {file}: {source}")]
    DataFileError { file: String, source: io::Error },
    #[error("Failed to parse CSV data: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Failed to parse file in a known encoding: {0}")]
    EncodingError(String),
    #[error("Error with reqwest: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("Failed to decode JSON: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Invalid regular expression: {0}")]
    RegexError(#[from] regex::Error),
    #[error("Time error: {0}")]
    TimeError(#[from] jiff::Error),
    #[error("Runway advisory error: {0}")]
    AdvisorError(#[from] AdvisorError),
    #[error("Input error: {0}")]
    ReadlineError(#[from] ReadlineError),
    #[error("{kind} not found: {code}")]
    NotFound { kind: &'static str, code: String },
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("No response from {0}")]
    NoResponse(String),
    #[error("No METAR found for {0}")]
    NoMetar(String),
    #[error("No D-ATIS found for {0}")]
    NoAtis(String),
    #[error("Wind at {0} is variable, no runway advisory possible")]
    VariableWind(String),
    #[error("No runway policy configured for {0}")]
    NoRunwayPolicy(String),
    #[error("Section {0:?} not found in page")]
    MissingHtmlSection(String),
}
