use jiff::{SignedDuration, Timestamp};
use runway_advisor::WindObservation;
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::{ApplicationError, ApplicationResult},
    http::HttpClient,
};

const METAR_URL: &str = "https://aviationweather.gov/api/data/metar";
const DATIS_URL: &str = "https://datis.clowd.io/api";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub(crate) enum ReportedDirection {
    Degrees(f64),
    Variable(String),
}

/// One station entry from the aviationweather.gov METAR data API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StationMetar {
    pub icao_id: String,
    pub raw_ob: String,
    #[serde(default)]
    pub obs_time: Option<i64>,
    #[serde(default)]
    pub wdir: Option<ReportedDirection>,
    #[serde(default)]
    pub wspd: Option<f64>,
}

impl StationMetar {
    /// The reported wind, falling back to the wind group of the raw report
    /// when the decoded fields are missing.
    pub fn wind(&self) -> ApplicationResult<WindObservation> {
        match (&self.wdir, self.wspd) {
            (Some(ReportedDirection::Degrees(direction)), Some(speed)) => {
                Ok(WindObservation::new(*direction, speed))
            }
            (Some(ReportedDirection::Variable(_)), _) => {
                Err(ApplicationError::VariableWind(self.icao_id.clone()))
            }
            _ => Ok(WindObservation::from_metar(&self.raw_ob)?),
        }
    }

    pub fn observed_at(&self) -> ApplicationResult<Option<Timestamp>> {
        self.obs_time
            .map(Timestamp::from_second)
            .transpose()
            .map_err(Into::into)
    }

    pub fn age(&self, now: Timestamp) -> ApplicationResult<Option<SignedDuration>> {
        Ok(self
            .observed_at()?
            .map(|observed| now.duration_since(observed)))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct DatisEntry {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    datis: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DatisResponse {
    Entries(Vec<DatisEntry>),
    Error { error: String },
}

/// Arrival and departure broadcasts are joined with a blank line.
fn parse_datis(icao: &str, text: &str) -> ApplicationResult<String> {
    match serde_json::from_str::<DatisResponse>(text)? {
        DatisResponse::Entries(entries) if !entries.is_empty() => {
            debug!(
                icao,
                kinds = ?entries.iter().map(|e| e.kind.as_deref()).collect::<Vec<_>>(),
                "D-ATIS received"
            );
            Ok(entries
                .into_iter()
                .map(|entry| entry.datis)
                .collect::<Vec<_>>()
                .join("\n\n"))
        }
        DatisResponse::Entries(_) => Err(ApplicationError::NoAtis(icao.to_string())),
        DatisResponse::Error { error } => {
            debug!(icao, %error, "D-ATIS service error");
            Err(ApplicationError::NoAtis(icao.to_string()))
        }
    }
}

fn parse_metar(icao: &str, text: &str) -> ApplicationResult<StationMetar> {
    serde_json::from_str::<Vec<StationMetar>>(text)?
        .into_iter()
        .next()
        .ok_or_else(|| ApplicationError::NoMetar(icao.to_string()))
}

#[tracing::instrument(skip(client))]
pub(crate) async fn fetch_metar(client: &HttpClient, icao: &str) -> ApplicationResult<StationMetar> {
    let text = client
        .get_text(METAR_URL, &[("ids", icao), ("format", "json")])
        .await?;
    parse_metar(icao, &text)
}

#[tracing::instrument(skip(client))]
pub(crate) async fn fetch_atis(client: &HttpClient, icao: &str) -> ApplicationResult<String> {
    let url = format!("{DATIS_URL}/{icao}");
    let text = client.get_text(&url, &[] as &[(&str, &str)]).await?;
    parse_datis(icao, &text)
}

/// METAR and D-ATIS for one airport, fetched concurrently.
#[derive(Debug)]
pub(crate) struct WeatherReport {
    pub icao: String,
    pub atis: ApplicationResult<String>,
    pub metar: ApplicationResult<StationMetar>,
}

pub(crate) async fn fetch_weather(client: &HttpClient, icao: &str) -> WeatherReport {
    let (atis, metar) = futures::join!(fetch_atis(client, icao), fetch_metar(client, icao));
    WeatherReport {
        icao: icao.to_string(),
        atis,
        metar,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ksfo_metar() -> StationMetar {
        parse_metar("KSFO", include_str!("../testdata/metar_ksfo.json")).unwrap()
    }

    #[test]
    fn test_parse_metar() {
        let metar = ksfo_metar();
        assert_eq!(metar.icao_id, "KSFO");
        assert!(metar.raw_ob.starts_with("KSFO 161756Z 28015KT"));
        assert_eq!(metar.wind().unwrap(), WindObservation::new(280.0, 15.0));
    }

    #[test]
    fn test_variable_wind_is_an_error() {
        let metar = parse_metar("KOAK", include_str!("../testdata/metar_koak_vrb.json")).unwrap();
        assert_eq!(metar.wdir, Some(ReportedDirection::Variable("VRB".into())));
        assert!(matches!(
            metar.wind(),
            Err(ApplicationError::VariableWind(icao)) if icao == "KOAK"
        ));
    }

    #[test]
    fn test_wind_falls_back_to_raw_report() {
        let metar = StationMetar {
            icao_id: "KSFO".into(),
            raw_ob: "KSFO 161756Z 30012KT 10SM FEW010 17/12 A3002".into(),
            obs_time: None,
            wdir: None,
            wspd: None,
        };
        assert_eq!(metar.wind().unwrap(), WindObservation::new(300.0, 12.0));
        assert_eq!(metar.age(Timestamp::UNIX_EPOCH).unwrap(), None);
    }

    #[test]
    fn test_no_station_is_no_metar() {
        assert!(matches!(
            parse_metar("KXYZ", "[]"),
            Err(ApplicationError::NoMetar(icao)) if icao == "KXYZ"
        ));
    }

    #[test]
    fn test_observation_age() {
        let metar = ksfo_metar();
        let observed = metar.observed_at().unwrap().unwrap();
        let now = observed + SignedDuration::from_mins(25);
        assert_eq!(
            metar.age(now).unwrap(),
            Some(SignedDuration::from_mins(25))
        );
    }

    #[test]
    fn test_parse_datis_joins_entries() {
        let atis = parse_datis("KSFO", include_str!("../testdata/datis_ksfo.json")).unwrap();
        assert!(atis.starts_with("SFO ARR INFO B"));
        assert!(atis.contains("\n\nSFO DEP INFO C"));
    }

    #[test]
    fn test_parse_datis_error() {
        let result = parse_datis("KXYZ", r#"{"error":"Airport not found"}"#);
        assert!(matches!(result, Err(ApplicationError::NoAtis(icao)) if icao == "KXYZ"));
        assert!(matches!(
            parse_datis("KXYZ", "[]"),
            Err(ApplicationError::NoAtis(_))
        ));
    }
}
