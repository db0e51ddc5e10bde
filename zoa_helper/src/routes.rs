use std::{io::Read, path::Path, sync::LazyLock};

use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    data::{open_data_file, read_csv, read_with_encodings},
    error::ApplicationResult,
};

const LOA_ROUTES_FILE: &str = "routes.csv";
const PREFERRED_ROUTES_FILE: &str = "prefroutes_db.csv";
const ALIAS_FILE: &str = "ZOA_Alias.txt";

#[derive(Debug, Deserialize)]
struct LoaRouteRow {
    #[serde(rename = "Departure_Regex")]
    departure_regex: String,
    #[serde(rename = "Arrival_Regex")]
    arrival_regex: String,
    #[serde(rename = "Route")]
    route: String,
    #[serde(rename = "RNAV Required")]
    rnav_required: String,
    #[serde(rename = "Notes", default)]
    notes: String,
}

/// A letter of agreement route. The patterns only have to match the start of
/// an airport code, so `K(SFO|OAK)` matches `KSFO`.
#[derive(Debug, Clone)]
pub(crate) struct LoaRoute {
    departure: Regex,
    arrival: Regex,
    pub route: String,
    pub rnav_required: String,
    pub notes: String,
}

impl LoaRoute {
    pub fn matches(&self, departure: &str, arrival: &str) -> bool {
        self.departure.is_match(departure) && self.arrival.is_match(arrival)
    }
}

impl TryFrom<LoaRouteRow> for LoaRoute {
    type Error = regex::Error;

    fn try_from(row: LoaRouteRow) -> Result<Self, Self::Error> {
        Ok(Self {
            departure: anchored(&row.departure_regex)?,
            arrival: anchored(&row.arrival_regex)?,
            route: row.route,
            rnav_required: row.rnav_required,
            notes: row.notes,
        })
    }
}

fn anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{pattern})"))
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PreferredRoute {
    #[serde(rename = "Orig")]
    pub origin: String,
    #[serde(rename = "Dest")]
    pub destination: String,
    #[serde(rename = "Route String")]
    pub route: String,
    #[serde(rename = "Type", default)]
    pub route_type: String,
    #[serde(rename = "Altitude", default)]
    pub altitude: String,
    #[serde(rename = "Aircraft", default)]
    pub aircraft: String,
}

#[derive(Debug, Default)]
pub(crate) struct RouteData {
    pub loa: Vec<LoaRoute>,
    /// Keyed by FAA location identifier (`SFO`, not `KSFO`).
    pub preferred: IndexMap<String, Vec<PreferredRoute>>,
    pub aliases: IndexMap<String, String>,
}

impl RouteData {
    pub fn load(data_dir: &Path) -> ApplicationResult<Self> {
        let data = Self {
            loa: load_loa_routes(&mut open_data_file(data_dir, LOA_ROUTES_FILE)?)?,
            preferred: load_preferred_routes(&mut open_data_file(
                data_dir,
                PREFERRED_ROUTES_FILE,
            )?)?,
            aliases: load_aliases(&mut open_data_file(data_dir, ALIAS_FILE)?)?,
        };
        debug!(
            loa = data.loa.len(),
            preferred_origins = data.preferred.len(),
            aliases = data.aliases.len(),
            "Route data loaded"
        );
        Ok(data)
    }

    pub fn loa_routes<'a>(
        &'a self,
        departure: &str,
        arrival: &str,
    ) -> impl Iterator<Item = &'a LoaRoute> {
        let departure = departure.trim().to_uppercase();
        let arrival = arrival.trim().to_uppercase();
        self.loa
            .iter()
            .filter(move |route| route.matches(&departure, &arrival))
    }

    pub fn preferred_routes<'a>(
        &'a self,
        departure: &str,
        arrival: &str,
    ) -> impl Iterator<Item = &'a PreferredRoute> {
        let arrival = faa_identifier(arrival);
        self.preferred
            .get(&faa_identifier(departure))
            .into_iter()
            .flatten()
            .filter(move |route| route.destination.eq_ignore_ascii_case(&arrival))
    }

    /// Aliases whose command contains `search`, ignoring case. An empty
    /// search lists every alias.
    pub fn search_aliases<'a>(
        &'a self,
        search: &str,
    ) -> impl Iterator<Item = (&'a String, &'a String)> {
        let search = search.trim().to_uppercase();
        self.aliases
            .iter()
            .filter(move |(command, _)| command.to_uppercase().contains(&search))
    }
}

/// `KSFO` -> `SFO`. Codes that are not four characters are kept as they are.
pub(crate) fn faa_identifier(code: &str) -> String {
    let code = code.trim().to_uppercase();
    if code.chars().count() == 4 {
        code.chars().skip(1).collect()
    } else {
        code
    }
}

pub(crate) fn load_loa_routes<R: Read>(reader: &mut R) -> ApplicationResult<Vec<LoaRoute>> {
    Ok(read_csv::<LoaRouteRow, _>(reader)?
        .into_iter()
        .filter_map(|row| {
            let departure = row.departure_regex.clone();
            let arrival = row.arrival_regex.clone();
            LoaRoute::try_from(row)
                .inspect_err(|e| warn!(%departure, %arrival, "Skipping LOA route: {e}"))
                .ok()
        })
        .collect())
}

pub(crate) fn load_preferred_routes<R: Read>(
    reader: &mut R,
) -> ApplicationResult<IndexMap<String, Vec<PreferredRoute>>> {
    let mut routes: IndexMap<String, Vec<PreferredRoute>> = IndexMap::new();
    for route in read_csv::<PreferredRoute, _>(reader)? {
        routes
            .entry(route.origin.to_uppercase())
            .or_default()
            .push(route);
    }
    Ok(routes)
}

pub(crate) fn load_aliases<R: Read>(reader: &mut R) -> ApplicationResult<IndexMap<String, String>> {
    static ALIAS: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^(?P<cmd>\.[a-zA-Z0-9]*) \.am rte (?P<txt>.+)").unwrap()
    });

    let text = read_with_encodings(reader)?;
    Ok(text
        .lines()
        .filter_map(|line| ALIAS.captures(line))
        .map(|c| (c["cmd"].to_string(), c["txt"].trim().to_string()))
        .collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Cursor;

    use tracing_test::traced_test;

    use super::*;

    pub(crate) fn test_route_data() -> RouteData {
        RouteData {
            loa: load_loa_routes(&mut Cursor::new(include_str!("../testdata/routes.csv"))).unwrap(),
            preferred: load_preferred_routes(&mut Cursor::new(include_str!(
                "../testdata/prefroutes_db.csv"
            )))
            .unwrap(),
            aliases: load_aliases(&mut Cursor::new(include_str!("../testdata/ZOA_Alias.txt")))
                .unwrap(),
        }
    }

    #[test]
    fn test_faa_identifier() {
        assert_eq!(faa_identifier("KSFO"), "SFO");
        assert_eq!(faa_identifier("ksfo"), "SFO");
        assert_eq!(faa_identifier("SFO"), "SFO");
        assert_eq!(faa_identifier("O27"), "O27");
    }

    #[test]
    fn test_loa_routes_match_from_start() {
        let data = test_route_data();
        let routes: Vec<_> = data.loa_routes("ksfo", "KLAX").map(|r| &r.route).collect();
        assert_eq!(routes, ["SSTIK LAANE3", "OFFSH9 SNS"]);

        let routes: Vec<_> = data.loa_routes("KOAK", "KSAN").map(|r| &r.route).collect();
        assert_eq!(routes, ["OAK SNS BSR MZB"]);

        assert_eq!(data.loa_routes("XKSFO", "KLAX").count(), 0);
    }

    #[test]
    #[traced_test]
    fn test_invalid_loa_pattern_is_skipped() {
        let csv = "Departure_Regex,Arrival_Regex,Route,RNAV Required,Notes\n\
                   K(SFO,KLAX,BROKEN,N,\n\
                   KSFO,KLAX,SSTIK LAANE3,Y,\n";
        let routes = load_loa_routes(&mut Cursor::new(csv)).unwrap();
        assert_eq!(routes.len(), 1);
        assert!(logs_contain("Skipping LOA route"));
    }

    #[test]
    fn test_preferred_routes() {
        let data = test_route_data();
        let routes: Vec<_> = data.preferred_routes("KSFO", "klax").collect();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].route, "SFO SSTIK3 SSTIK AVE LAX");
        assert_eq!(routes[0].route_type, "TEC");
        assert_eq!(data.preferred_routes("SFO", "LAX").count(), 2);
        assert_eq!(data.preferred_routes("KSFO", "KSEA").count(), 0);
        assert_eq!(data.preferred_routes("KXYZ", "KLAX").count(), 0);
    }

    #[test]
    fn test_alias_search() {
        let data = test_route_data();
        assert_eq!(data.aliases.len(), 3);
        let found: Vec<_> = data.search_aliases("sfo").map(|(cmd, _)| cmd.as_str()).collect();
        assert_eq!(found, [".sfolax", ".sfosea"]);
        let (_, text) = data.search_aliases(".oaksan").next().unwrap();
        assert_eq!(text, "OAK SNS BSR MZB");
        assert_eq!(data.search_aliases("").count(), 3);
    }
}
