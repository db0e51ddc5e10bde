pub(crate) mod advisory;
pub(crate) mod commands;
pub(crate) mod config;
pub(crate) mod data;
pub(crate) mod error;
pub(crate) mod http;
pub(crate) mod interactive;
pub(crate) mod links;
pub(crate) mod output;
pub(crate) mod routes;
pub(crate) mod scrape;
pub(crate) mod weather;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use jiff::Timestamp;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::{
    advisory::{WindInput, advisory_text, policy_for},
    commands::{
        LookupKind, alias_table, chart_table, ensure_known_airports, filed_route_table, loa_table,
        lookup, preferred_route_table, table_or_none, weather_text,
    },
    config::ZoaConfig,
    data::{ReferenceData, icao_code},
    error::{ApplicationError, ApplicationResult},
    http::HttpClient,
    links::{
        ProcedureKind, airnav_url, fetch_charts, fetch_flightaware_routes, flightaware_url,
        nfdc_url, open_in_browser, skyvector_url,
    },
    weather::fetch_weather,
};

#[derive(clap::Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[clap(long, short)]
    /// Resets the config file to the built in defaults
    clean_config: bool,

    #[clap(long, global = true)]
    /// Folder with the airport, airline, aircraft and route data files
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    /// Starts the interactive menu when left out
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// D-ATIS, METAR and runway advisory for an airport
    Wx { airport: Option<String> },
    /// Runway configuration advisory
    Runway {
        #[arg(default_value = "KSFO")]
        airport: String,
        /// Wind group such as 28025KT
        #[arg(long, conflicts_with = "metar")]
        wind: Option<String>,
        /// Raw METAR to take the wind from
        #[arg(long)]
        metar: Option<String>,
    },
    /// Most frequently filed routes from FlightAware
    Flightaware {
        departure: String,
        arrival: String,
        /// Also open the page in the browser
        #[arg(long)]
        open: bool,
    },
    /// Opens a flight plan on SkyVector
    Skyvector {
        departure: String,
        arrival: String,
        route: Vec<String>,
    },
    /// Searches the ZOA route aliases
    Alias {
        #[arg(default_value = "")]
        search: String,
    },
    /// FAA preferred routes
    Faa { departure: String, arrival: String },
    /// Letter of agreement routes
    Loa { departure: String, arrival: String },
    /// Chart references
    #[command(subcommand)]
    Charts(ChartCommand),
    /// Airport, airline and aircraft code lookup
    #[command(subcommand)]
    Lookup(LookupCommand),
    /// Prints the effective configuration
    Config,
}

#[derive(Subcommand, Debug)]
enum ChartCommand {
    /// Opens the AirNav airport page
    Airnav { airport: String },
    /// Departure procedures
    Sids {
        airport: String,
        /// Opens the named chart
        #[arg(long)]
        open: Option<String>,
    },
    /// Arrival procedures
    Stars {
        airport: String,
        /// Opens the named chart
        #[arg(long)]
        open: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum LookupCommand {
    Airport { code: String },
    Airline { code: String },
    Aircraft { code: String },
}

async fn run_command(config: &ZoaConfig, command: Command) -> ApplicationResult<()> {
    let client = HttpClient::from_config(config)?;
    let load_data = || ReferenceData::load(config.data_dir());

    match command {
        Command::Wx { airport } => {
            let icao = icao_code(airport.as_deref().unwrap_or(config.default_departure()));
            let report = fetch_weather(&client, &icao).await;
            println!("{}", weather_text(config, &report, Timestamp::now()));
        }
        Command::Runway {
            airport,
            wind,
            metar,
        } => {
            let icao = icao_code(&airport);
            let policy = policy_for(config, &icao)?;
            let observation = WindInput::from_args(wind, metar)
                .resolve(&client, &icao)
                .await?;
            println!("{}", advisory_text(&policy.advise(&observation)));
        }
        Command::Flightaware {
            departure,
            arrival,
            open,
        } => {
            let (departure, arrival) = (icao_code(&departure), icao_code(&arrival));
            let routes = fetch_flightaware_routes(&client, &departure, &arrival).await?;
            println!("{}", table_or_none(&filed_route_table(&routes), "filed routes"));
            if open {
                open_in_browser(&flightaware_url(&departure, &arrival)?);
            }
        }
        Command::Skyvector {
            departure,
            arrival,
            route,
        } => {
            let url = skyvector_url(&icao_code(&departure), &route.join(" "), &icao_code(&arrival))?;
            println!("{url}");
            open_in_browser(&url);
        }
        Command::Alias { search } => {
            let data = load_data()?;
            println!("{}", table_or_none(&alias_table(&data.routes, &search), "aliases"));
        }
        Command::Faa { departure, arrival } => {
            let data = load_data()?;
            let (departure, arrival) = (icao_code(&departure), icao_code(&arrival));
            ensure_known_airports(&data, [departure.as_str(), arrival.as_str()])?;
            let table = preferred_route_table(&data.routes, &departure, &arrival);
            println!("{}", table_or_none(&table, "FAA preferred routes"));
        }
        Command::Loa { departure, arrival } => {
            let data = load_data()?;
            let (departure, arrival) = (icao_code(&departure), icao_code(&arrival));
            ensure_known_airports(&data, [departure.as_str(), arrival.as_str()])?;
            let table = loa_table(&data.routes, &departure, &arrival);
            println!("{}", table_or_none(&table, "LOA routes"));
        }
        Command::Charts(ChartCommand::Airnav { airport }) => {
            let url = airnav_url(&icao_code(&airport))?;
            println!("{url}");
            open_in_browser(&url);
        }
        Command::Charts(ChartCommand::Sids { airport, open }) => {
            show_charts(&client, &icao_code(&airport), ProcedureKind::Sid, open).await?;
        }
        Command::Charts(ChartCommand::Stars { airport, open }) => {
            show_charts(&client, &icao_code(&airport), ProcedureKind::Star, open).await?;
        }
        Command::Lookup(command) => {
            let data = load_data()?;
            let (kind, code) = match command {
                LookupCommand::Airport { code } => (LookupKind::Airport, icao_code(&code)),
                LookupCommand::Airline { code } => (LookupKind::Airline, code),
                LookupCommand::Aircraft { code } => (LookupKind::Aircraft, code),
            };
            for line in lookup(&data, kind, &code)? {
                println!("{}", line.green());
            }
        }
        Command::Config => {
            if let Some(path) = config.config_file_path() {
                println!("# {}", path.display());
            }
            print!("{}", config.to_toml()?);
        }
    }
    Ok(())
}

async fn show_charts(
    client: &HttpClient,
    airport: &str,
    kind: ProcedureKind,
    open: Option<String>,
) -> ApplicationResult<()> {
    let charts = fetch_charts(client, airport, kind).await?;
    println!("{}", table_or_none(&chart_table(&charts), "charts"));
    let Some(name) = open else {
        return Ok(());
    };
    match charts
        .iter()
        .find(|chart| chart.name.eq_ignore_ascii_case(name.trim()))
    {
        Some(chart) => {
            let url = reqwest::Url::parse(&chart.url)
                .map_err(|e| ApplicationError::InvalidUrl(e.to_string()))?;
            open_in_browser(&url);
        }
        None => println!("No chart named {name}, see {}", nfdc_url(airport)?),
    }
    Ok(())
}

fn main() -> ApplicationResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    debug!(?cli, "Starting");
    let config = ZoaConfig::load(cli.clean_config, cli.data_dir)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match cli.command {
        Some(command) => runtime.block_on(run_command(&config, command)),
        None => interactive::run(&config, runtime.handle()),
    }
}
