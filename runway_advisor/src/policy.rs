//! Declarative runway configuration policies.
//!
//! A policy names a few runways by role (`preferred_1`, `alternate_2`, ...)
//! and lists rules over those roles. Rules are tried in order and the first
//! one whose conditions all hold decides the configuration. When none holds
//! the runway with the most headwind is recommended on its own.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::{
    error::{AdvisorError, AdvisorResult},
    recommendation::{Advisory, Recommendation},
    runway::{RunwayAssessment, RunwayDefinition, sfo_runways},
    wind::{WindComponents, WindObservation},
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Below this speed the wind is ignored and normal ops apply.
    pub low_wind_knots: f64,
    pub headwind_floor_knots: f64,
    pub crosswind_ceiling_knots: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low_wind_knots: 10.0,
            headwind_floor_knots: -10.0,
            crosswind_ceiling_knots: 20.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    /// Headwind above the floor and crosswind below the ceiling.
    #[default]
    Usable,
    /// Headwind above the floor, crosswind ignored.
    Headwind,
}

impl Check {
    fn holds(self, components: &WindComponents, thresholds: &Thresholds) -> bool {
        match self {
            Check::Usable => components.is_usable(thresholds),
            Check::Headwind => components.headwind_within(thresholds),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub role: String,
    #[serde(default)]
    pub check: Check,
}

impl Condition {
    pub fn usable(role: &str) -> Self {
        Self {
            role: role.to_string(),
            check: Check::Usable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    NormOps,
    WestOps,
    EastOps,
}

impl From<Outcome> for Recommendation {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::NormOps => Recommendation::NormalOps,
            Outcome::WestOps => Recommendation::WestOps,
            Outcome::EastOps => Recommendation::EastOps,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub outcome: Outcome,
    pub when: Vec<Condition>,
}

/// Policy as written in configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub runways: Vec<RunwayDefinition>,
    pub roles: IndexMap<String, String>,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl PolicyConfig {
    pub fn sfo() -> Self {
        Self::sfo_with(sfo_runways(), Thresholds::default())
    }

    /// The SFO table: 01/28 together is the normal configuration, 28 alone
    /// is West Ops and 19/10 is East Ops.
    pub fn sfo_with(runways: Vec<RunwayDefinition>, thresholds: Thresholds) -> Self {
        let roles = [
            ("preferred_1", "01"),
            ("preferred_2", "28"),
            ("alternate_1", "19"),
            ("alternate_2", "10"),
        ]
        .into_iter()
        .map(|(role, runway)| (role.to_string(), runway.to_string()))
        .collect();
        let rules = vec![
            Rule {
                outcome: Outcome::NormOps,
                when: vec![
                    Condition::usable("preferred_1"),
                    Condition::usable("preferred_2"),
                ],
            },
            Rule {
                outcome: Outcome::WestOps,
                when: vec![Condition::usable("preferred_2")],
            },
            Rule {
                outcome: Outcome::EastOps,
                when: vec![
                    Condition::usable("alternate_1"),
                    Condition::usable("alternate_2"),
                ],
            },
        ];
        Self {
            runways,
            roles,
            thresholds,
            rules,
        }
    }
}

#[derive(Debug, Clone)]
struct ResolvedCondition {
    runway: String,
    check: Check,
}

#[derive(Debug, Clone)]
struct ResolvedRule {
    outcome: Outcome,
    when: Vec<ResolvedCondition>,
}

impl ResolvedRule {
    fn matches(&self, assessment: &RunwayAssessment, thresholds: &Thresholds) -> bool {
        self.when.iter().all(|condition| {
            assessment
                .get(&condition.runway)
                .is_some_and(|c| condition.check.holds(c, thresholds))
        })
    }
}

/// A validated policy. Runway identifiers are unique and every role points
/// at one of them, so evaluating it cannot fail.
#[derive(Debug, Clone)]
pub struct RunwayPolicy {
    runways: Vec<RunwayDefinition>,
    thresholds: Thresholds,
    rules: Vec<ResolvedRule>,
}

impl TryFrom<PolicyConfig> for RunwayPolicy {
    type Error = AdvisorError;

    fn try_from(config: PolicyConfig) -> Result<Self, Self::Error> {
        if config.runways.is_empty() {
            return Err(AdvisorError::NoRunways);
        }

        let mut identifiers = HashSet::new();
        if let Some(duplicate) = config
            .runways
            .iter()
            .find(|r| !identifiers.insert(r.identifier.as_str()))
        {
            return Err(AdvisorError::DuplicateRunway(duplicate.identifier.clone()));
        }

        let role_runway = config
            .roles
            .iter()
            .map(|(role, runway)| {
                if identifiers.contains(runway.as_str()) {
                    Ok((role.as_str(), runway.as_str()))
                } else {
                    Err(AdvisorError::MissingRunway {
                        role: role.clone(),
                        runway: runway.clone(),
                    })
                }
            })
            .collect::<AdvisorResult<IndexMap<_, _>>>()?;

        let rules = config
            .rules
            .iter()
            .map(|rule| {
                let when = rule
                    .when
                    .iter()
                    .map(|condition| {
                        role_runway
                            .get(condition.role.as_str())
                            .map(|runway| ResolvedCondition {
                                runway: runway.to_string(),
                                check: condition.check,
                            })
                            .ok_or_else(|| AdvisorError::UnknownRole(condition.role.clone()))
                    })
                    .collect::<AdvisorResult<Vec<_>>>()?;
                Ok(ResolvedRule {
                    outcome: rule.outcome,
                    when,
                })
            })
            .collect::<AdvisorResult<Vec<_>>>()?;

        Ok(Self {
            runways: config.runways,
            thresholds: config.thresholds,
            rules,
        })
    }
}

impl RunwayPolicy {
    pub fn sfo() -> AdvisorResult<Self> {
        Self::try_from(PolicyConfig::sfo())
    }

    pub fn runways(&self) -> &[RunwayDefinition] {
        &self.runways
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn assess(&self, wind: &WindObservation) -> RunwayAssessment {
        RunwayAssessment::compute(&self.runways, wind)
    }

    pub fn recommend(&self, wind: &WindObservation) -> Recommendation {
        self.advise(wind).recommendation
    }

    pub fn advise(&self, wind: &WindObservation) -> Advisory {
        let assessment = self.assess(wind);
        let recommendation = self.evaluate(wind, &assessment);
        Advisory {
            wind: *wind,
            assessment,
            recommendation,
        }
    }

    fn evaluate(&self, wind: &WindObservation, assessment: &RunwayAssessment) -> Recommendation {
        if wind.speed_knots < self.thresholds.low_wind_knots {
            debug!(speed = wind.speed_knots, "Wind below threshold, normal ops");
            return Recommendation::NormalOps;
        }

        if let Some((index, rule)) = self
            .rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matches(assessment, &self.thresholds))
        {
            let recommendation = Recommendation::from(rule.outcome);
            debug!(rule = index, outcome = %recommendation, "Rule matched");
            return recommendation;
        }

        let Some((runway, components)) = assessment.strongest_headwind() else {
            error!("Runway policy without runways, falling back to normal ops");
            return Recommendation::NormalOps;
        };
        debug!(runway, headwind = components.headwind_knots, "No rule matched, using strongest headwind");
        Recommendation::UseRunway {
            runway: runway.to_string(),
            headwind_knots: components.headwind_knots,
        }
    }
}

/// Evaluates the SFO table against an arbitrary runway list. Fails when one
/// of the runways the table refers to is missing.
pub fn recommend(
    observation: &WindObservation,
    runways: &[RunwayDefinition],
    thresholds: &Thresholds,
) -> AdvisorResult<Recommendation> {
    let policy = RunwayPolicy::try_from(PolicyConfig::sfo_with(runways.to_vec(), *thresholds))?;
    Ok(policy.recommend(observation))
}
