use colored::Colorize;
use jiff::Timestamp;
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::runtime::Handle;
use tracing::debug;

use crate::{
    advisory::{WindInput, advisory_text, has_policy, policy_for},
    commands::{
        LookupKind, alias_table, chart_table, filed_route_table, loa_table, lookup,
        preferred_route_table, table_or_none, weather_text,
    },
    config::ZoaConfig,
    data::{ReferenceData, icao_code},
    error::{ApplicationError, ApplicationResult},
    http::HttpClient,
    links::{
        ProcedureKind, airnav_url, fetch_charts, fetch_flightaware_routes, flightaware_url,
        open_in_browser, skyvector_url,
    },
    weather::fetch_weather,
};

const CLEAR_SCREEN: &str = "\x1B[2J\x1B[1;1H";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    FlightAware,
    SkyVector,
    AliasRoutes,
    PreferredRoutes,
    LoaRoutes,
    Charts,
    CodeLookup,
    RunwayAdvisory,
    ClearScreen,
    Exit,
}

impl MenuAction {
    const ALL: [MenuAction; 10] = [
        MenuAction::FlightAware,
        MenuAction::SkyVector,
        MenuAction::AliasRoutes,
        MenuAction::PreferredRoutes,
        MenuAction::LoaRoutes,
        MenuAction::Charts,
        MenuAction::CodeLookup,
        MenuAction::RunwayAdvisory,
        MenuAction::ClearScreen,
        MenuAction::Exit,
    ];

    fn label(self) -> &'static str {
        match self {
            MenuAction::FlightAware => "FlightAware IFR Analyzer",
            MenuAction::SkyVector => "SkyVector Analyzer",
            MenuAction::AliasRoutes => "ZOA Alias Routes",
            MenuAction::PreferredRoutes => "FAA Preferred Routes",
            MenuAction::LoaRoutes => "LOA Route Check",
            MenuAction::Charts => "Chart Reference",
            MenuAction::CodeLookup => "Code Lookup",
            MenuAction::RunwayAdvisory => "Runway Advisory",
            MenuAction::ClearScreen => "Clear Screen",
            MenuAction::Exit => "Exit",
        }
    }
}

/// `y`/`n` style answer, `default` for an empty one.
fn parse_confirm(answer: &str, default: bool) -> Option<bool> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// One based menu number, `default` (zero based) for an empty answer.
fn parse_choice(answer: &str, choices: usize, default: usize) -> Option<usize> {
    let answer = answer.trim();
    if answer.is_empty() {
        return Some(default);
    }
    answer
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=choices).contains(n))
        .map(|n| n - 1)
}

/// Line editor prompts. Every prompt returns `None` when the user presses
/// Ctrl-C or Ctrl-D.
struct Prompter {
    editor: DefaultEditor,
}

impl Prompter {
    fn new() -> ApplicationResult<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }

    fn text(&mut self, message: &str, default: &str) -> ApplicationResult<Option<String>> {
        let prompt = format!("{} {message} ", "?".green());
        match self.editor.readline_with_initial(&prompt, (default, "")) {
            Ok(line) => {
                let line = line.trim().to_string();
                if !line.is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn validated(
        &mut self,
        message: &str,
        default: &str,
        is_valid: impl Fn(&str) -> bool,
        invalid_message: &str,
    ) -> ApplicationResult<Option<String>> {
        loop {
            let Some(answer) = self.text(message, default)? else {
                return Ok(None);
            };
            if is_valid(&answer) {
                return Ok(Some(answer));
            }
            println!("{}", invalid_message.red());
        }
    }

    fn confirm(&mut self, message: &str, default: bool) -> ApplicationResult<Option<bool>> {
        let hint = if default { "(Y/n)" } else { "(y/N)" };
        loop {
            let Some(answer) = self.text(&format!("{message} {hint}"), "")? else {
                return Ok(None);
            };
            if let Some(answer) = parse_confirm(&answer, default) {
                return Ok(Some(answer));
            }
        }
    }

    fn choose(
        &mut self,
        message: &str,
        choices: &[&str],
        default: usize,
    ) -> ApplicationResult<Option<usize>> {
        for (number, choice) in choices.iter().enumerate() {
            println!("  {}) {choice}", number + 1);
        }
        loop {
            let Some(answer) = self.text(&format!("{message} [{}]", default + 1), "")? else {
                return Ok(None);
            };
            if let Some(index) = parse_choice(&answer, choices.len(), default) {
                return Ok(Some(index));
            }
            println!("{}", format!("Pick a number from 1 to {}", choices.len()).red());
        }
    }
}

struct Session<'a> {
    config: &'a ZoaConfig,
    runtime: &'a Handle,
    client: HttpClient,
    data: ReferenceData,
    prompter: Prompter,
    default_departure: String,
    default_arrival: String,
}

/// Runs the menu until the user exits. Must not be called from inside the
/// tokio runtime, requests are driven with [`Handle::block_on`].
pub(crate) fn run(config: &ZoaConfig, runtime: &Handle) -> ApplicationResult<()> {
    let data = ReferenceData::load(config.data_dir())?;
    let mut session = Session {
        config,
        runtime,
        client: HttpClient::from_config(config)?,
        data,
        prompter: Prompter::new()?,
        default_departure: config.default_departure().to_string(),
        default_arrival: config.default_arrival().unwrap_or_default().to_string(),
    };
    session.run()
}

impl Session<'_> {
    fn run(&mut self) -> ApplicationResult<()> {
        let Some(departure) = self.prompter.text("Default Departure:", &self.default_departure)?
        else {
            return Ok(());
        };
        self.default_departure = icao_code(&departure);
        let Some(arrival) = self.prompter.text("Default Arrival:", &self.default_arrival)? else {
            return Ok(());
        };
        self.default_arrival = if arrival.is_empty() {
            arrival
        } else {
            icao_code(&arrival)
        };
        println!();
        self.show_weather(&self.default_departure);

        let labels = MenuAction::ALL.map(MenuAction::label);
        loop {
            let Some(index) = self.prompter.choose("Select an action:", &labels, 0)? else {
                return Ok(());
            };
            let action = MenuAction::ALL[index];
            debug!(?action, "Menu action");
            if action == MenuAction::Exit {
                return Ok(());
            }
            if let Err(e) = self.perform(action) {
                // Input errors end the session, everything else is reported.
                if matches!(e, ApplicationError::ReadlineError(_)) {
                    return Err(e);
                }
                println!("{} {e}", "Error:".red());
            }
            println!();
        }
    }

    fn perform(&mut self, action: MenuAction) -> ApplicationResult<()> {
        match action {
            MenuAction::FlightAware => self.flightaware(),
            MenuAction::SkyVector => self.skyvector(),
            MenuAction::AliasRoutes => self.alias_routes(),
            MenuAction::PreferredRoutes => self.preferred_routes(),
            MenuAction::LoaRoutes => self.loa_routes(),
            MenuAction::Charts => self.charts(),
            MenuAction::CodeLookup => self.code_lookup(),
            MenuAction::RunwayAdvisory => self.runway_advisory(),
            MenuAction::ClearScreen => {
                print!("{CLEAR_SCREEN}");
                Ok(())
            }
            MenuAction::Exit => Ok(()),
        }
    }

    fn show_weather(&self, icao: &str) {
        let report = self.runtime.block_on(fetch_weather(&self.client, icao));
        println!("{}\n", weather_text(self.config, &report, Timestamp::now()));
    }

    fn airport(&mut self, message: &str, default: &str) -> ApplicationResult<Option<String>> {
        let data = &self.data;
        Ok(self
            .prompter
            .validated(
                message,
                default,
                |answer| data.is_known_airport(&icao_code(answer)),
                "Airport not found",
            )?
            .map(|answer| icao_code(&answer)))
    }

    /// Departure and arrival, defaulting to the session defaults.
    fn city_pair(&mut self) -> ApplicationResult<Option<(String, String)>> {
        let (default_departure, default_arrival) =
            (self.default_departure.clone(), self.default_arrival.clone());
        let Some(departure) = self.airport("Departure:", &default_departure)? else {
            return Ok(None);
        };
        let Some(arrival) = self.airport("Arrival:", &default_arrival)? else {
            return Ok(None);
        };
        Ok(Some((departure, arrival)))
    }

    fn flightaware(&mut self) -> ApplicationResult<()> {
        let Some((departure, arrival)) = self.city_pair()? else {
            return Ok(());
        };
        let routes = self.runtime.block_on(fetch_flightaware_routes(
            &self.client,
            &departure,
            &arrival,
        ))?;
        println!("{}", table_or_none(&filed_route_table(&routes), "filed routes"));
        if self.prompter.confirm("Open in Browser?", false)? == Some(true) {
            open_in_browser(&flightaware_url(&departure, &arrival)?);
        }
        Ok(())
    }

    fn skyvector(&mut self) -> ApplicationResult<()> {
        let Some((departure, arrival)) = self.city_pair()? else {
            return Ok(());
        };
        let Some(route) = self.prompter.text("Flight Plan:", "")? else {
            return Ok(());
        };
        open_in_browser(&skyvector_url(&departure, &route, &arrival)?);
        Ok(())
    }

    fn alias_routes(&mut self) -> ApplicationResult<()> {
        let Some(search) = self.prompter.text("Search String:", "")? else {
            return Ok(());
        };
        println!(
            "{}",
            table_or_none(&alias_table(&self.data.routes, &search), "aliases")
        );
        Ok(())
    }

    fn preferred_routes(&mut self) -> ApplicationResult<()> {
        let Some((departure, arrival)) = self.city_pair()? else {
            return Ok(());
        };
        let table = preferred_route_table(&self.data.routes, &departure, &arrival);
        println!("{}", table_or_none(&table, "FAA preferred routes"));
        Ok(())
    }

    fn loa_routes(&mut self) -> ApplicationResult<()> {
        let Some((departure, arrival)) = self.city_pair()? else {
            return Ok(());
        };
        let table = loa_table(&self.data.routes, &departure, &arrival);
        println!("{}", table_or_none(&table, "LOA routes"));
        Ok(())
    }

    fn charts(&mut self) -> ApplicationResult<()> {
        let choices = ["Open AirNav Airport Page", "SIDs", "STARs", "Skip"];
        let Some(choice) = self.prompter.choose("Select AirNav action:", &choices, 0)? else {
            return Ok(());
        };
        let (kind, default) = match choice {
            0 => {
                if let Some(airport) = self.airport("4-Letter ICAO:", "")? {
                    open_in_browser(&airnav_url(&airport)?);
                }
                return Ok(());
            }
            1 => (ProcedureKind::Sid, self.default_departure.clone()),
            2 => (ProcedureKind::Star, self.default_arrival.clone()),
            _ => return Ok(()),
        };

        let Some(airport) = self.airport("4-Letter ICAO:", &default)? else {
            return Ok(());
        };
        let charts = self
            .runtime
            .block_on(fetch_charts(&self.client, &airport, kind))?;
        if charts.is_empty() {
            println!("No charts found for {airport}");
            return Ok(());
        }
        println!("{}", chart_table(&charts));

        let names: Vec<&str> = std::iter::once("Skip")
            .chain(charts.iter().map(|chart| chart.name.as_str()))
            .collect();
        if let Some(index) = self.prompter.choose("Select chart to open:", &names, 0)?
            && index > 0
        {
            let url = reqwest::Url::parse(&charts[index - 1].url)
                .map_err(|e| ApplicationError::InvalidUrl(e.to_string()))?;
            open_in_browser(&url);
        }
        Ok(())
    }

    fn code_lookup(&mut self) -> ApplicationResult<()> {
        let choices = [
            "Airport Name Lookup",
            "Airline Callsign Lookup",
            "Aircraft Code Lookup",
            "Skip",
        ];
        let Some(choice) = self.prompter.choose("Select a code:", &choices, 0)? else {
            return Ok(());
        };
        let (kind, message, invalid_message) = match choice {
            0 => (LookupKind::Airport, "4-Letter ICAO:", "Airport not found"),
            1 => (LookupKind::Airline, "3-Letter ICAO Prefix:", "Airline not found"),
            2 => (LookupKind::Aircraft, "4-Letter ICAO Code:", "Aircraft not found"),
            _ => return Ok(()),
        };

        let data = &self.data;
        let Some(code) = self.prompter.validated(
            message,
            "",
            |answer| lookup(data, kind, answer).is_ok(),
            invalid_message,
        )?
        else {
            return Ok(());
        };
        for line in lookup(&self.data, kind, &code)? {
            println!("{}", line.green());
        }
        Ok(())
    }

    fn runway_advisory(&mut self) -> ApplicationResult<()> {
        let default = if has_policy(self.config, &self.default_departure) {
            self.default_departure.clone()
        } else {
            "KSFO".to_string()
        };
        let config = self.config;
        let Some(airport) = self.prompter.validated(
            "Airport:",
            &default,
            |answer| has_policy(config, &icao_code(answer)),
            "No runway policy for that airport",
        )?
        else {
            return Ok(());
        };
        let airport = icao_code(&airport);
        let Some(wind) = self
            .prompter
            .text("Wind (DDDSSKT or METAR, empty for live):", "")?
        else {
            return Ok(());
        };
        let input = wind_input(&wind);

        let policy = policy_for(self.config, &airport)?;
        let observation = self
            .runtime
            .block_on(input.resolve(&self.client, &airport))?;
        println!("{}", advisory_text(&policy.advise(&observation)));
        Ok(())
    }
}

/// Empty input means the live METAR, a single token is a wind group.
fn wind_input(answer: &str) -> WindInput {
    let answer = answer.trim();
    if answer.is_empty() {
        WindInput::Live
    } else if answer.split_whitespace().count() == 1 {
        WindInput::Group(answer.to_uppercase())
    } else {
        WindInput::Metar(answer.to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_confirm() {
        assert_eq!(parse_confirm("", false), Some(false));
        assert_eq!(parse_confirm("", true), Some(true));
        assert_eq!(parse_confirm(" Y ", false), Some(true));
        assert_eq!(parse_confirm("no", true), Some(false));
        assert_eq!(parse_confirm("maybe", true), None);
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("", 4, 0), Some(0));
        assert_eq!(parse_choice("3", 4, 0), Some(2));
        assert_eq!(parse_choice("4", 4, 0), Some(3));
        assert_eq!(parse_choice("0", 4, 0), None);
        assert_eq!(parse_choice("5", 4, 0), None);
        assert_eq!(parse_choice("two", 4, 0), None);
    }

    #[test]
    fn test_menu_matches_labels() {
        let labels = MenuAction::ALL.map(MenuAction::label);
        assert_eq!(labels[0], "FlightAware IFR Analyzer");
        assert_eq!(labels[7], "Runway Advisory");
        assert_eq!(MenuAction::ALL.last(), Some(&MenuAction::Exit));
    }

    #[test]
    fn test_wind_input() {
        assert_eq!(wind_input("  "), WindInput::Live);
        assert_eq!(wind_input("28025kt"), WindInput::Group("28025KT".into()));
        assert_eq!(
            wind_input("KSFO 161756Z 28025KT 10SM"),
            WindInput::Metar("KSFO 161756Z 28025KT 10SM".into())
        );
    }
}
