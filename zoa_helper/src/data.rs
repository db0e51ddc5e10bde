use std::{fs::File, io::Read, path::Path};

use encoding::{
    DecoderTrap, Encoding,
    all::{ISO_8859_1, UTF_8},
};
use indexmap::IndexMap;
use serde::{Deserialize, de::DeserializeOwned};
use tracing::info;
use tracing_unwrap::ResultExt;

use crate::{
    error::{ApplicationError, ApplicationResult},
    routes::RouteData,
};

const AIRPORTS_FILE: &str = "airports.csv";
const AIRLINES_FILE: &str = "airlines.csv";
const AIRCRAFT_FILE: &str = "aircraft.csv";

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AirportRecord {
    #[serde(rename = "ident")]
    pub icao: String,
    pub name: String,
    #[serde(default)]
    pub municipality: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AirlineRecord {
    #[serde(rename = "ICAO")]
    pub icao: String,
    #[serde(rename = "Call sign")]
    pub callsign: String,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AircraftRecord {
    #[serde(rename = "ICAO Code")]
    pub icao: String,
    #[serde(rename = "Manufacturer and Aircraft Type / Model")]
    pub model: String,
    #[serde(rename = "WTC")]
    pub wake_category: String,
}

/// Everything the lookups need, loaded once from the data folder.
#[derive(Debug, Default)]
pub(crate) struct ReferenceData {
    pub airports: IndexMap<String, AirportRecord>,
    pub airlines: IndexMap<String, AirlineRecord>,
    pub aircraft: IndexMap<String, AircraftRecord>,
    pub routes: RouteData,
}

impl ReferenceData {
    pub fn load(data_dir: &Path) -> ApplicationResult<Self> {
        let data = Self {
            airports: load_airports(&mut open_data_file(data_dir, AIRPORTS_FILE)?)?,
            airlines: load_airlines(&mut open_data_file(data_dir, AIRLINES_FILE)?)?,
            aircraft: load_aircraft(&mut open_data_file(data_dir, AIRCRAFT_FILE)?)?,
            routes: RouteData::load(data_dir)?,
        };
        info!(
            airports = data.airports.len(),
            airlines = data.airlines.len(),
            aircraft = data.aircraft.len(),
            "Reference data loaded"
        );
        Ok(data)
    }

    pub fn airport(&self, code: &str) -> Option<&AirportRecord> {
        self.airports.get(&code.trim().to_uppercase())
    }

    pub fn is_known_airport(&self, code: &str) -> bool {
        self.airport(code).is_some()
    }

    pub fn airline(&self, code: &str) -> Option<&AirlineRecord> {
        self.airlines.get(&code.trim().to_uppercase())
    }

    pub fn aircraft_type(&self, code: &str) -> Option<&AircraftRecord> {
        self.aircraft.get(&code.trim().to_uppercase())
    }

    pub fn airport_name(&self, code: &str) -> ApplicationResult<&str> {
        self.airport(code)
            .map(|airport| airport.name.as_str())
            .ok_or_else(|| not_found("Airport", code))
    }

    pub fn airline_callsign(&self, code: &str) -> ApplicationResult<&str> {
        self.airline(code)
            .map(|airline| airline.callsign.as_str())
            .ok_or_else(|| not_found("Airline", code))
    }

    pub fn aircraft_description(&self, code: &str) -> ApplicationResult<&AircraftRecord> {
        self.aircraft_type(code)
            .ok_or_else(|| not_found("Aircraft", code))
    }
}

fn not_found(kind: &'static str, code: &str) -> ApplicationError {
    ApplicationError::NotFound {
        kind,
        code: code.trim().to_uppercase(),
    }
}

/// Three letter US identifiers are turned into ICAO codes (`oak` -> `KOAK`).
pub(crate) fn icao_code(input: &str) -> String {
    let code = input.trim().to_uppercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        format!("K{code}")
    } else {
        code
    }
}

fn is_missing_code(code: &str) -> bool {
    let code = code.trim();
    code.is_empty() || code.eq_ignore_ascii_case("n/a") || code.eq_ignore_ascii_case("n\\a")
}

pub(crate) fn open_data_file(data_dir: &Path, name: &str) -> ApplicationResult<File> {
    let path = data_dir.join(name);
    File::open(&path).map_err(|source| ApplicationError::DataFileError {
        file: path.to_string_lossy().to_string(),
        source,
    })
}

pub(crate) fn read_with_encodings<R: Read>(reader: &mut R) -> ApplicationResult<String> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;

    match UTF_8.decode(&buffer, DecoderTrap::Strict) {
        Ok(text) => Ok(text),
        Err(e) => ISO_8859_1
            .decode(&buffer, DecoderTrap::Strict)
            .map_err(|_| ApplicationError::EncodingError(e.to_string())),
    }
}

/// Rows that fail to deserialize are logged and skipped.
pub(crate) fn read_csv<T: DeserializeOwned, R: Read>(reader: &mut R) -> ApplicationResult<Vec<T>> {
    let text = read_with_encodings(reader)?;
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    csv_reader.headers()?;
    Ok(csv_reader
        .deserialize()
        .filter_map(Result::ok_or_log)
        .collect())
}

pub(crate) fn load_airports<R: Read>(
    reader: &mut R,
) -> ApplicationResult<IndexMap<String, AirportRecord>> {
    Ok(read_csv::<AirportRecord, _>(reader)?
        .into_iter()
        .filter(|airport| !is_missing_code(&airport.icao))
        .map(|airport| (airport.icao.to_uppercase(), airport))
        .collect())
}

pub(crate) fn load_airlines<R: Read>(
    reader: &mut R,
) -> ApplicationResult<IndexMap<String, AirlineRecord>> {
    Ok(read_csv::<AirlineRecord, _>(reader)?
        .into_iter()
        .filter(|airline| !is_missing_code(&airline.icao))
        .map(|airline| (airline.icao.to_uppercase(), airline))
        .collect())
}

pub(crate) fn load_aircraft<R: Read>(
    reader: &mut R,
) -> ApplicationResult<IndexMap<String, AircraftRecord>> {
    Ok(read_csv::<AircraftRecord, _>(reader)?
        .into_iter()
        .filter(|aircraft| !is_missing_code(&aircraft.icao))
        .map(|aircraft| (aircraft.icao.to_uppercase(), aircraft))
        .collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Cursor;

    use super::*;

    pub(crate) fn test_reference_data() -> ReferenceData {
        ReferenceData {
            airports: load_airports(&mut Cursor::new(include_str!("../testdata/airports.csv")))
                .unwrap(),
            airlines: load_airlines(&mut Cursor::new(include_str!("../testdata/airlines.csv")))
                .unwrap(),
            aircraft: load_aircraft(&mut Cursor::new(include_str!("../testdata/aircraft.csv")))
                .unwrap(),
            routes: crate::routes::tests::test_route_data(),
        }
    }

    #[test]
    fn test_icao_code() {
        assert_eq!(icao_code("oak"), "KOAK");
        assert_eq!(icao_code(" ksfo "), "KSFO");
        assert_eq!(icao_code("PHNL"), "PHNL");
        assert_eq!(icao_code("O27"), "O27");
    }

    #[test]
    fn test_airport_lookup() {
        let data = test_reference_data();
        assert_eq!(data.airports.len(), 5);
        assert_eq!(
            data.airport_name("ksfo").unwrap(),
            "San Francisco International Airport"
        );
        assert!(data.is_known_airport("KOAK"));
        assert!(!data.is_known_airport("KXYZ"));
        assert!(matches!(
            data.airport_name("kxyz"),
            Err(ApplicationError::NotFound { kind: "Airport", code }) if code == "KXYZ"
        ));
    }

    #[test]
    fn test_airline_lookup_skips_missing_codes() {
        let data = test_reference_data();
        assert_eq!(data.airline_callsign("ual").unwrap(), "UNITED");
        assert_eq!(data.airline_callsign("SWA").unwrap(), "SOUTHWEST");
        assert!(!data.airlines.keys().any(|code| is_missing_code(code)));
        assert_eq!(data.airlines.len(), 3);
    }

    #[test]
    fn test_aircraft_lookup() {
        let data = test_reference_data();
        let b738 = data.aircraft_description("b738").unwrap();
        assert_eq!(b738.model, "Boeing 737-800");
        assert_eq!(b738.wake_category, "M");
        assert_eq!(data.aircraft.len(), 3);
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let csv = "ident,name\nKSFO,San Francisco\nKOAK\n";
        let airports = load_airports(&mut Cursor::new(csv)).unwrap();
        assert_eq!(airports.len(), 1);
        assert!(airports.contains_key("KSFO"));
    }

    #[test]
    fn test_unknown_columns_yield_no_records() {
        let csv = "code,title\nKSFO,San Francisco\n";
        let airports = load_airports(&mut Cursor::new(csv));
        assert!(airports.is_ok_and(|airports| airports.is_empty()));
    }

    #[test]
    fn test_latin1_file_is_decoded() {
        let bytes = b"ident,name\nLFPG,A\xe9roport Charles de Gaulle\n".to_vec();
        let airports = load_airports(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(airports["LFPG"].name, "Aéroport Charles de Gaulle");
    }

    #[test]
    fn test_missing_data_file_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ReferenceData::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains(AIRPORTS_FILE), "{err}");
    }
}
