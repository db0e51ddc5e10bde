//! Pulls the few bits of HTML the tool needs out of FlightAware and FAA NFDC
//! pages. Both pages are machine generated and stable enough for regexes.

use std::sync::LazyLock;

use itertools::Itertools;
use regex::Regex;
use serde::Serialize;

use crate::error::{ApplicationError, ApplicationResult};

pub(crate) const DEPARTURE_CHARTS_HEADING: &str = "Departure Procedure (DP) Charts";
pub(crate) const ARRIVAL_CHARTS_HEADING: &str = "Standard Terminal Arrival (STAR) Charts";

const ROUTE_TABLE_CLASS: &str = "prettyTable fullWidth";

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static ROW: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<tr[^>]*>(.*?)</tr>").unwrap());
static CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<td[^>]*>(.*?)</td>").unwrap());
static SECONDARY_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<th[^>]*class="secondaryHeader"[^>]*>(.*?)</th>"#).unwrap()
});
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)<a[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#).unwrap());
static NEXT_HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<h[1-3][\s>]").unwrap());

/// A row of the FlightAware IFR route analyzer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub(crate) struct FiledRoute {
    pub frequency: String,
    pub altitude: String,
    pub full_route: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ChartLink {
    pub name: String,
    pub url: String,
}

/// Visible text of an HTML fragment.
pub(crate) fn text_content(html: &str) -> String {
    let text = TAG.replace_all(html, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    text.split_whitespace().join(" ")
}

pub(crate) fn flightaware_routes(html: &str) -> ApplicationResult<Vec<FiledRoute>> {
    let table = element_with_class(html, "table", ROUTE_TABLE_CLASS)
        .ok_or_else(|| ApplicationError::MissingHtmlSection(ROUTE_TABLE_CLASS.to_string()))?;

    let headers: Vec<String> = SECONDARY_HEADER
        .captures_iter(table)
        .map(|c| text_content(&c[1]))
        .collect();

    Ok(ROW
        .captures_iter(table)
        .filter_map(|row| {
            let cells: Vec<String> = CELL
                .captures_iter(&row[1])
                .map(|c| text_content(&c[1]))
                .collect();
            if cells.is_empty() {
                return None;
            }
            let mut route = FiledRoute::default();
            for (header, cell) in headers.iter().zip(cells) {
                match header.as_str() {
                    "Frequency" => route.frequency = cell,
                    "Altitude" => route.altitude = cell,
                    "Full Route" => route.full_route = cell,
                    _ => (),
                }
            }
            Some(route)
        })
        .collect())
}

/// Chart links listed below `heading` on an NFDC airport page, sorted by name.
pub(crate) fn chart_links(html: &str, heading: &str) -> ApplicationResult<Vec<ChartLink>> {
    let pattern = format!(r"(?is)<h3[^>]*>\s*{}\s*</h3>", regex::escape(heading));
    let heading_match = Regex::new(&pattern)?
        .find(html)
        .ok_or_else(|| ApplicationError::MissingHtmlSection(heading.to_string()))?;

    let rest = &html[heading_match.end()..];
    let section = NEXT_HEADING
        .find(rest)
        .map_or(rest, |next| &rest[..next.start()]);

    Ok(LINK
        .captures_iter(section)
        .map(|c| ChartLink {
            name: text_content(&c[2]),
            url: c[1].replace("&amp;", "&"),
        })
        .filter(|link| !link.name.is_empty())
        .sorted_by(|a, b| a.name.cmp(&b.name))
        .dedup_by(|a, b| a.name == b.name)
        .collect())
}

fn element_with_class<'a>(html: &'a str, tag: &str, class: &str) -> Option<&'a str> {
    let pattern = format!(
        r#"(?is)<{tag}[^>]*class="{}"[^>]*>(.*?)</{tag}>"#,
        regex::escape(class)
    );
    Regex::new(&pattern)
        .ok()?
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_content() {
        assert_eq!(
            text_content("<span class=\"x\">SSTIK3&nbsp; <b>SSTIK</b>\n AVE</span>"),
            "SSTIK3 SSTIK AVE"
        );
        assert_eq!(text_content("A &amp; B"), "A & B");
    }

    #[test]
    fn test_flightaware_routes() {
        let routes = flightaware_routes(include_str!("../testdata/flightaware_ksfo_klax.html"))
            .unwrap();
        assert_eq!(
            routes,
            [
                FiledRoute {
                    frequency: "312".into(),
                    altitude: "FL320".into(),
                    full_route: "SSTIK3 SSTIK AVE SADDE8".into(),
                },
                FiledRoute {
                    frequency: "41".into(),
                    altitude: "FL340 - FL360".into(),
                    full_route: "OFFSH9 SNS SADDE8".into(),
                },
            ]
        );
    }

    #[test]
    fn test_flightaware_without_table() {
        assert!(matches!(
            flightaware_routes("<html><body>No routes</body></html>"),
            Err(ApplicationError::MissingHtmlSection(_))
        ));
    }

    #[test]
    fn test_sids_are_sorted() {
        let html = include_str!("../testdata/nfdc_ksfo.html");
        let sids = chart_links(html, DEPARTURE_CHARTS_HEADING).unwrap();
        let names: Vec<_> = sids.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["NIITE FOUR", "SSTIK FIVE", "TRUKN TWO"]);
        assert_eq!(
            sids[1].url,
            "https://aeronav.faa.gov/d-tpp/2510/00375sstik.pdf"
        );
    }

    #[test]
    fn test_stars_stop_at_next_section() {
        let html = include_str!("../testdata/nfdc_ksfo.html");
        let stars = chart_links(html, ARRIVAL_CHARTS_HEADING).unwrap();
        let names: Vec<_> = stars.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["BDEGA FOUR", "DYAMD FIVE"]);
    }

    #[test]
    fn test_missing_chart_section() {
        assert!(matches!(
            chart_links("<h3>Airport Diagram</h3>", ARRIVAL_CHARTS_HEADING),
            Err(ApplicationError::MissingHtmlSection(heading)) if heading == ARRIVAL_CHARTS_HEADING
        ));
    }
}
