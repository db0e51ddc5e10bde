use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::wind::{WindComponents, WindObservation, project};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunwayDefinition {
    #[serde(rename = "id")]
    pub identifier: String,
    #[serde(rename = "heading")]
    pub heading_degrees: f64,
}

impl RunwayDefinition {
    pub fn new(identifier: impl Into<String>, heading_degrees: f64) -> Self {
        Self {
            identifier: identifier.into(),
            heading_degrees,
        }
    }
}

/// San Francisco International, in the order the advisory table lists them.
pub fn sfo_runways() -> Vec<RunwayDefinition> {
    vec![
        RunwayDefinition::new("28", 284.5),
        RunwayDefinition::new("10", 104.5),
        RunwayDefinition::new("01", 14.5),
        RunwayDefinition::new("19", 194.5),
    ]
}

/// Wind components per runway, in runway configuration order.
#[derive(Debug, Clone, PartialEq)]
pub struct RunwayAssessment {
    components: IndexMap<String, WindComponents>,
}

impl RunwayAssessment {
    pub fn compute(runways: &[RunwayDefinition], wind: &WindObservation) -> Self {
        let components = runways
            .iter()
            .map(|runway| {
                let c = project(
                    runway.heading_degrees,
                    wind.direction_degrees,
                    wind.speed_knots,
                );
                trace!(
                    runway = %runway.identifier,
                    headwind = c.headwind_knots,
                    crosswind = c.crosswind_knots
                );
                (runway.identifier.clone(), c)
            })
            .collect();
        Self { components }
    }

    pub fn get(&self, identifier: &str) -> Option<&WindComponents> {
        self.components.get(identifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &WindComponents)> {
        self.components.iter().map(|(id, c)| (id.as_str(), c))
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Runway with the strictly greatest headwind. On a tie the runway listed
    /// first keeps the spot.
    pub fn strongest_headwind(&self) -> Option<(&str, &WindComponents)> {
        self.iter().fold(None, |best, (id, c)| match best {
            Some((_, best_c)) if c.headwind_knots <= best_c.headwind_knots => best,
            _ => Some((id, c)),
        })
    }

    /// `(runway, headwind, crosswind)` rounded to whole knots.
    pub fn table_rows(&self) -> Vec<(String, i64, i64)> {
        self.iter()
            .map(|(id, c)| {
                (
                    id.to_string(),
                    c.headwind_whole_knots(),
                    c.crosswind_whole_knots(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_assessment_keeps_runway_order() {
        let assessment =
            RunwayAssessment::compute(&sfo_runways(), &WindObservation::new(280.0, 15.0));
        let order: Vec<_> = assessment.iter().map(|(id, _)| id).collect();
        assert_eq!(order, ["28", "10", "01", "19"]);
    }

    #[test]
    fn test_northerly_favours_runway_01() {
        let assessment =
            RunwayAssessment::compute(&sfo_runways(), &WindObservation::new(10.0, 25.0));
        assert_abs_diff_eq!(assessment.get("01").unwrap().headwind_knots, 24.92, epsilon = 0.01);
        assert_abs_diff_eq!(assessment.get("19").unwrap().headwind_knots, -24.92, epsilon = 0.01);
        let (id, c) = assessment.strongest_headwind().unwrap();
        assert_eq!(id, "01");
        assert_eq!(c.headwind_whole_knots(), 25);
    }

    #[test]
    fn test_strongest_headwind_tie_goes_to_first_listed() {
        let runways = vec![
            RunwayDefinition::new("09L", 90.0),
            RunwayDefinition::new("09R", 90.0),
            RunwayDefinition::new("27", 270.0),
        ];
        let wind = WindObservation::new(90.0, 20.0);
        let assessment = RunwayAssessment::compute(&runways, &wind);
        assert_eq!(assessment.strongest_headwind().unwrap().0, "09L");

        let reversed: Vec<_> = runways.into_iter().rev().collect();
        let assessment = RunwayAssessment::compute(&reversed, &wind);
        assert_eq!(assessment.strongest_headwind().unwrap().0, "09R");
    }

    #[test]
    fn test_strongest_headwind_is_none_without_runways() {
        let assessment = RunwayAssessment::compute(&[], &WindObservation::new(90.0, 20.0));
        assert!(assessment.is_empty());
        assert_eq!(assessment.strongest_headwind(), None);
    }

    #[test]
    fn test_table_rows_are_whole_knots() {
        let assessment =
            RunwayAssessment::compute(&sfo_runways(), &WindObservation::new(300.0, 15.0));
        assert_eq!(
            assessment.table_rows(),
            vec![
                ("28".to_string(), 14, 4),
                ("10".to_string(), -14, -4),
                ("01".to_string(), 4, -14),
                ("19".to_string(), -4, 14),
            ]
        );
    }
}
