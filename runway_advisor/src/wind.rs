use std::str::FromStr;

use nom::{
    Finish, IResult, Parser,
    bytes::complete::{tag, take_while_m_n},
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AdvisorError, AdvisorResult},
    policy::Thresholds,
};

/// Wind as reported: the direction it blows from and its speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindObservation {
    pub direction_degrees: f64,
    pub speed_knots: f64,
}

impl WindObservation {
    pub fn new(direction_degrees: f64, speed_knots: f64) -> Self {
        Self {
            direction_degrees,
            speed_knots,
        }
    }

    /// Picks the first `DDDSSKT` group out of a full METAR.
    pub fn from_metar(raw: &str) -> AdvisorResult<Self> {
        raw.split_whitespace()
            .find_map(|group| nom_wind_group(group).ok().map(|(_, wind)| wind))
            .ok_or_else(|| AdvisorError::WindFormat(raw.to_string()))
    }
}

impl FromStr for WindObservation {
    type Err = AdvisorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        nom_wind_group(s)
            .finish()
            .map(|(_, wind)| wind)
            .map_err(|_| AdvisorError::WindFormat(s.to_string()))
    }
}

fn digits<'a>(count: usize) -> impl Parser<&'a str, Output = u32, Error = nom::error::Error<&'a str>> {
    take_while_m_n(count, count, |c: char| c.is_ascii_digit()).map_res(str::parse::<u32>)
}

/// `DDDSSKT` at the start of the input. Anything after `KT` is left unparsed.
pub(crate) fn nom_wind_group(input: &str) -> IResult<&str, WindObservation> {
    (digits(3), digits(2), tag("KT"))
        .map(|(direction, speed, _)| WindObservation::new(f64::from(direction), f64::from(speed)))
        .parse(input)
}

/// Wind split along and across a runway.
///
/// A positive headwind blows against an aircraft using the runway, a negative
/// one is a tailwind. The sign of the crosswind tells which side it comes from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindComponents {
    pub headwind_knots: f64,
    pub crosswind_knots: f64,
}

impl WindComponents {
    pub fn is_usable(&self, thresholds: &Thresholds) -> bool {
        self.headwind_within(thresholds)
            && self.crosswind_knots.abs() < thresholds.crosswind_ceiling_knots
    }

    pub fn headwind_within(&self, thresholds: &Thresholds) -> bool {
        self.headwind_knots > thresholds.headwind_floor_knots
    }

    pub fn headwind_whole_knots(&self) -> i64 {
        self.headwind_knots.round() as i64
    }

    pub fn crosswind_whole_knots(&self) -> i64 {
        self.crosswind_knots.round() as i64
    }
}

/// Rotates the wind vector into the runway's along/across axes.
pub fn project(
    runway_heading_degrees: f64,
    wind_direction_degrees: f64,
    wind_speed_knots: f64,
) -> WindComponents {
    let alpha = (wind_direction_degrees - runway_heading_degrees).to_radians();
    WindComponents {
        headwind_knots: wind_speed_knots * alpha.cos(),
        crosswind_knots: wind_speed_knots * alpha.sin(),
    }
}
