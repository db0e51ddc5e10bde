use reqwest::Url;
use tracing::{info, warn};

use crate::{
    error::{ApplicationError, ApplicationResult},
    http::HttpClient,
    scrape::{self, ChartLink, FiledRoute},
};

const FLIGHTAWARE_ROUTE_URL: &str = "https://flightaware.com/analysis/route.rvt";
const SKYVECTOR_URL: &str = "https://skyvector.com/";
const AIRNAV_AIRPORT_URL: &str = "https://www.airnav.com/airport/";
const NFDC_AIRPORT_URL: &str = "https://nfdc.faa.gov/nfdcApps/services/ajv5/airportDisplay.jsp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcedureKind {
    Sid,
    Star,
}

impl ProcedureKind {
    fn heading(self) -> &'static str {
        match self {
            ProcedureKind::Sid => scrape::DEPARTURE_CHARTS_HEADING,
            ProcedureKind::Star => scrape::ARRIVAL_CHARTS_HEADING,
        }
    }
}

fn url_with_params<'a>(
    base: &str,
    params: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> ApplicationResult<Url> {
    Url::parse_with_params(base, params).map_err(|e| ApplicationError::InvalidUrl(e.to_string()))
}

pub(crate) fn flightaware_url(departure: &str, arrival: &str) -> ApplicationResult<Url> {
    url_with_params(
        FLIGHTAWARE_ROUTE_URL,
        [("origin", departure), ("destination", arrival)],
    )
}

/// `departure route arrival` as a SkyVector flight plan.
pub(crate) fn skyvector_url(departure: &str, route: &str, arrival: &str) -> ApplicationResult<Url> {
    let flight_plan = [departure, route.trim(), arrival]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    url_with_params(SKYVECTOR_URL, [("fpl", flight_plan.as_str())])
}

pub(crate) fn airnav_url(airport: &str) -> ApplicationResult<Url> {
    Url::parse(AIRNAV_AIRPORT_URL)
        .and_then(|base| base.join(airport))
        .map_err(|e| ApplicationError::InvalidUrl(e.to_string()))
}

pub(crate) fn nfdc_url(airport: &str) -> ApplicationResult<Url> {
    url_with_params(NFDC_AIRPORT_URL, [("airportId", airport)])
}

#[tracing::instrument(skip(client))]
pub(crate) async fn fetch_flightaware_routes(
    client: &HttpClient,
    departure: &str,
    arrival: &str,
) -> ApplicationResult<Vec<FiledRoute>> {
    let url = flightaware_url(departure, arrival)?;
    let html = client.get_text(url.as_str(), &[] as &[(&str, &str)]).await?;
    scrape::flightaware_routes(&html)
}

#[tracing::instrument(skip(client))]
pub(crate) async fn fetch_charts(
    client: &HttpClient,
    airport: &str,
    kind: ProcedureKind,
) -> ApplicationResult<Vec<ChartLink>> {
    let url = nfdc_url(airport)?;
    let html = client.get_text(url.as_str(), &[] as &[(&str, &str)]).await?;
    scrape::chart_links(&html, kind.heading())
}

/// Opens `url` in the default browser without waiting for it.
pub(crate) fn open_in_browser(url: &Url) {
    match open::that_detached(url.as_str()) {
        Ok(()) => info!(%url, "Opened in browser"),
        Err(e) => {
            warn!(%url, "Failed to open browser: {e}");
            println!("Open {url} in your browser");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flightaware_url() {
        assert_eq!(
            flightaware_url("KSFO", "KLAX").unwrap().as_str(),
            "https://flightaware.com/analysis/route.rvt?origin=KSFO&destination=KLAX"
        );
    }

    #[test]
    fn test_skyvector_url() {
        assert_eq!(
            skyvector_url("KSFO", " SSTIK3 SSTIK AVE ", "KLAX")
                .unwrap()
                .as_str(),
            "https://skyvector.com/?fpl=KSFO+SSTIK3+SSTIK+AVE+KLAX"
        );
        assert_eq!(
            skyvector_url("KSFO", "", "KLAX").unwrap().as_str(),
            "https://skyvector.com/?fpl=KSFO+KLAX"
        );
    }

    #[test]
    fn test_airnav_url() {
        assert_eq!(
            airnav_url("KOAK").unwrap().as_str(),
            "https://www.airnav.com/airport/KOAK"
        );
    }

    #[test]
    fn test_nfdc_url() {
        assert_eq!(
            nfdc_url("KSFO").unwrap().as_str(),
            "https://nfdc.faa.gov/nfdcApps/services/ajv5/airportDisplay.jsp?airportId=KSFO"
        );
    }

    #[test]
    fn test_procedure_headings() {
        assert_eq!(ProcedureKind::Sid.heading(), "Departure Procedure (DP) Charts");
        assert_eq!(
            ProcedureKind::Star.heading(),
            "Standard Terminal Arrival (STAR) Charts"
        );
    }
}
