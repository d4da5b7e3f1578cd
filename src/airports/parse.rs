//! Permissive parser for the OpenFlights airport dataset.
//!
//! Row layout (14 columns, order significant): id, name, city, country, IATA,
//! ICAO, latitude, longitude, altitude, UTC offset, DST code, tz database
//! name, record type, source. Missing values are written as `\N`.
//!
//! Quoting irregularities never abort the parse and a numeric field that fails
//! to parse becomes zero; the row is kept either way.

use std::str::FromStr;

use csv::{ByteRecord, ReaderBuilder};

use super::Airport;
use crate::config::AIRPORT_FIELD_COUNT;
use crate::error_handling::AtlasError;

/// Parses the whole dataset into airports in file order.
pub(crate) fn parse_airports(data: &[u8]) -> Result<Vec<Airport>, AtlasError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .escape(Some(b'\\'))
        .from_reader(data);

    let mut airports = Vec::new();
    let mut short_rows = 0usize;
    for record in reader.byte_records() {
        let record = record.map_err(|e| AtlasError::directory("airport data", e))?;
        if record.len() < AIRPORT_FIELD_COUNT {
            short_rows += 1;
        }
        airports.push(airport_from_record(&record));
    }

    if short_rows > 0 {
        log::debug!(
            "{} airport rows had fewer than {} fields; missing fields left empty",
            short_rows,
            AIRPORT_FIELD_COUNT
        );
    }
    Ok(airports)
}

fn text(record: &ByteRecord, index: usize) -> String {
    record
        .get(index)
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .unwrap_or_default()
}

fn number<T: FromStr + Default>(record: &ByteRecord, index: usize) -> T {
    text(record, index).trim().parse().unwrap_or_default()
}

fn airport_from_record(record: &ByteRecord) -> Airport {
    Airport {
        id: number(record, 0),
        name: text(record, 1),
        city: text(record, 2),
        country: text(record, 3),
        iata: text(record, 4),
        icao: text(record, 5),
        latitude: number(record, 6),
        longitude: number(record, 7),
        altitude: number(record, 8),
        utc_offset: number(record, 9),
        dst: text(record, 10),
        tz_database: text(record, 11),
        record_type: text(record, 12),
        source: text(record, 13),
    }
}
