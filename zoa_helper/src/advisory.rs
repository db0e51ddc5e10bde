use runway_advisor::{Advisory, RunwayPolicy, WindObservation};
use tracing::debug;

use crate::{
    config::ZoaConfig,
    error::{ApplicationError, ApplicationResult},
    http::HttpClient,
    output::runway_table,
    weather::{StationMetar, fetch_metar},
};

const BUILTIN_POLICY_AIRPORT: &str = "KSFO";

/// Where the wind for an advisory comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WindInput {
    /// A bare `DDDSSKT` group.
    Group(String),
    /// A full METAR, the first wind group is used.
    Metar(String),
    /// The latest METAR for the airport.
    Live,
}

impl WindInput {
    pub fn from_args(wind: Option<String>, metar: Option<String>) -> Self {
        match (wind, metar) {
            (Some(group), _) => Self::Group(group),
            (None, Some(metar)) => Self::Metar(metar),
            (None, None) => Self::Live,
        }
    }

    pub async fn resolve(
        &self,
        client: &HttpClient,
        icao: &str,
    ) -> ApplicationResult<WindObservation> {
        match self {
            Self::Group(group) => Ok(group.trim().parse()?),
            Self::Metar(metar) => Ok(WindObservation::from_metar(metar)?),
            Self::Live => fetch_metar(client, icao).await?.wind(),
        }
    }
}

/// The configured policy for `icao`. SFO always has one, even when the
/// configuration file lost it.
pub(crate) fn policy_for(config: &ZoaConfig, icao: &str) -> ApplicationResult<RunwayPolicy> {
    if let Some(policy) = config.runway_policy(icao)? {
        return Ok(policy);
    }
    if icao.eq_ignore_ascii_case(BUILTIN_POLICY_AIRPORT) {
        debug!("Using built in SFO runway policy");
        return Ok(RunwayPolicy::sfo()?);
    }
    Err(ApplicationError::NoRunwayPolicy(icao.to_string()))
}

pub(crate) fn has_policy(config: &ZoaConfig, icao: &str) -> bool {
    config.has_runway_policy(icao) || icao.eq_ignore_ascii_case(BUILTIN_POLICY_AIRPORT)
}

/// Advisory from an already fetched METAR.
pub(crate) fn advise_from_metar(
    config: &ZoaConfig,
    metar: &StationMetar,
) -> ApplicationResult<Advisory> {
    let policy = policy_for(config, &metar.icao_id)?;
    Ok(policy.advise(&metar.wind()?))
}

/// Component table followed by the recommendation.
pub(crate) fn advisory_text(advisory: &Advisory) -> String {
    format!(
        "Wind {:03.0}° at {:.0} kts\n\n{}\n{}",
        advisory.wind.direction_degrees,
        advisory.wind.speed_knots,
        runway_table(&advisory.assessment),
        advisory.recommendation
    )
}

#[cfg(test)]
mod tests {
    use runway_advisor::Recommendation;

    use super::*;

    fn client() -> HttpClient {
        HttpClient::new(std::time::Duration::from_millis(100), 1).unwrap()
    }

    #[test]
    fn test_wind_input_from_args() {
        assert_eq!(
            WindInput::from_args(Some("28025KT".into()), Some("ignored".into())),
            WindInput::Group("28025KT".into())
        );
        assert_eq!(
            WindInput::from_args(None, Some("KSFO 161756Z 28025KT".into())),
            WindInput::Metar("KSFO 161756Z 28025KT".into())
        );
        assert_eq!(WindInput::from_args(None, None), WindInput::Live);
    }

    #[tokio::test]
    async fn test_resolve_offline_inputs() {
        let client = client();
        let wind = WindInput::Group("01025KT".into())
            .resolve(&client, "KSFO")
            .await
            .unwrap();
        assert_eq!(wind, WindObservation::new(10.0, 25.0));

        let wind = WindInput::Metar("KSFO 161756Z 15025KT 10SM".into())
            .resolve(&client, "KSFO")
            .await
            .unwrap();
        assert_eq!(wind, WindObservation::new(150.0, 25.0));
    }

    #[tokio::test]
    async fn test_resolve_rejects_bad_group() {
        let result = WindInput::Group("2805KT".into())
            .resolve(&client(), "KSFO")
            .await;
        assert!(matches!(result, Err(ApplicationError::AdvisorError(_))));
    }

    #[test]
    fn test_policy_lookup() {
        let config = ZoaConfig::new_for_test();
        assert!(policy_for(&config, "ksfo").is_ok());
        assert!(has_policy(&config, "KSFO"));
        assert!(!has_policy(&config, "KOAK"));
        assert!(matches!(
            policy_for(&config, "KOAK"),
            Err(ApplicationError::NoRunwayPolicy(icao)) if icao == "KOAK"
        ));
    }

    #[test]
    fn test_advisory_text() {
        let policy = RunwayPolicy::sfo().unwrap();
        let advisory = policy.advise(&WindObservation::new(10.0, 25.0));
        assert_eq!(
            advisory.recommendation,
            Recommendation::UseRunway {
                runway: "01".into(),
                headwind_knots: advisory.assessment.get("01").unwrap().headwind_knots,
            }
        );
        let text = advisory_text(&advisory);
        assert!(text.starts_with("Wind 010° at 25 kts\n\nRunway  Headwind  Crosswind\n"));
        assert!(text.ends_with("Use Runway 01 with headwind 25 kts"));
    }

    #[test]
    fn test_advise_from_metar() {
        let config = ZoaConfig::new_for_test();
        let metar: Vec<StationMetar> =
            serde_json::from_str(include_str!("../testdata/metar_ksfo.json")).unwrap();
        let advisory = advise_from_metar(&config, &metar[0]).unwrap();
        assert_eq!(advisory.recommendation, Recommendation::NormalOps);
    }
}
