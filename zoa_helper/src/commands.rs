//! Text produced by the subcommands and by the interactive menu.

use jiff::Timestamp;
use tracing::warn;

use crate::{
    advisory::{advise_from_metar, advisory_text, has_policy},
    config::ZoaConfig,
    data::ReferenceData,
    error::{ApplicationError, ApplicationResult},
    output::Table,
    routes::RouteData,
    scrape::{ChartLink, FiledRoute},
    weather::WeatherReport,
};

pub(crate) const NO_ATIS: &str = "ERROR: NO D-ATIS FOUND";
pub(crate) const NO_METAR: &str = "ERROR: COULD NOT RETRIEVE METAR";

/// D-ATIS, METAR and, when the airport has a runway policy, the advisory.
pub(crate) fn weather_text(config: &ZoaConfig, report: &WeatherReport, now: Timestamp) -> String {
    let mut sections = Vec::new();

    sections.push(match &report.atis {
        Ok(atis) => atis.clone(),
        Err(e) => {
            warn!(icao = %report.icao, "{e}");
            NO_ATIS.to_string()
        }
    });

    match &report.metar {
        Ok(metar) => {
            let age = metar
                .age(now)
                .ok()
                .flatten()
                .map(|age| format!(" ({} min old)", age.as_mins()))
                .unwrap_or_default();
            sections.push(format!("{}{age}", metar.raw_ob));

            if has_policy(config, &report.icao) {
                sections.push(match advise_from_metar(config, metar) {
                    Ok(advisory) => advisory_text(&advisory),
                    Err(e) => format!("ERROR: {e}"),
                });
            }
        }
        Err(e) => {
            warn!(icao = %report.icao, "{e}");
            sections.push(NO_METAR.to_string());
        }
    }

    sections.join("\n\n")
}

pub(crate) fn filed_route_table(routes: &[FiledRoute]) -> Table {
    let mut table = Table::new(["Frequency", "Altitude", "Full Route"]);
    for route in routes {
        table.push_row([&route.frequency, &route.altitude, &route.full_route]);
    }
    table
}

pub(crate) fn alias_table(routes: &RouteData, search: &str) -> Table {
    let mut table = Table::new(["Command", "Text"]);
    for (command, text) in routes.search_aliases(search) {
        table.push_row([command, text]);
    }
    table
}

pub(crate) fn preferred_route_table(routes: &RouteData, departure: &str, arrival: &str) -> Table {
    let mut table = Table::new(["Route String", "Type", "Altitude", "Aircraft"]);
    for route in routes.preferred_routes(departure, arrival) {
        table.push_row([
            &route.route,
            &route.route_type,
            &route.altitude,
            &route.aircraft,
        ]);
    }
    table
}

pub(crate) fn loa_table(routes: &RouteData, departure: &str, arrival: &str) -> Table {
    let mut table = Table::new(["Route", "RNAV Required", "Notes"]);
    for route in routes.loa_routes(departure, arrival) {
        table.push_row([&route.route, &route.rnav_required, &route.notes]);
    }
    table
}

pub(crate) fn chart_table(charts: &[ChartLink]) -> Table {
    let mut table = Table::new(["Chart", "Link"]);
    for chart in charts {
        table.push_row([&chart.name, &chart.url]);
    }
    table
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LookupKind {
    Airport,
    Airline,
    Aircraft,
}

/// Answer lines for a code lookup.
pub(crate) fn lookup(
    data: &ReferenceData,
    kind: LookupKind,
    code: &str,
) -> ApplicationResult<Vec<String>> {
    Ok(match kind {
        LookupKind::Airport => vec![data.airport_name(code)?.to_string()],
        LookupKind::Airline => vec![data.airline_callsign(code)?.to_string()],
        LookupKind::Aircraft => {
            let aircraft = data.aircraft_description(code)?;
            vec![aircraft.model.clone(), aircraft.wake_category.clone()]
        }
    })
}

/// Table text, or a short note when nothing matched.
pub(crate) fn table_or_none(table: &Table, what: &str) -> String {
    if table.is_empty() {
        format!("No {what} found")
    } else {
        table.to_string()
    }
}

pub(crate) fn ensure_known_airports<'a>(
    data: &ReferenceData,
    codes: impl IntoIterator<Item = &'a str>,
) -> ApplicationResult<()> {
    for code in codes {
        if !data.is_known_airport(code) {
            return Err(ApplicationError::NotFound {
                kind: "Airport",
                code: code.to_string(),
            });
        }
    }
    Ok(())
}
