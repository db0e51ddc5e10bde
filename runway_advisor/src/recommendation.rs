use std::fmt;

use serde::Serialize;

use crate::{runway::RunwayAssessment, wind::WindObservation};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recommendation {
    NormalOps,
    WestOps,
    EastOps,
    UseRunway { runway: String, headwind_knots: f64 },
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NormalOps => f.write_str("Norm Ops"),
            Self::WestOps => f.write_str("West Ops"),
            Self::EastOps => f.write_str("East Ops"),
            Self::UseRunway {
                runway,
                headwind_knots,
            } => write!(
                f,
                "Use Runway {runway} with headwind {} kts",
                headwind_knots.round() as i64
            ),
        }
    }
}

/// Everything one evaluation produced, for callers that also print the table.
#[derive(Debug, Clone, PartialEq)]
pub struct Advisory {
    pub wind: WindObservation,
    pub assessment: RunwayAssessment,
    pub recommendation: Recommendation,
}
