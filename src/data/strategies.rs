//! Per-dataset response parsers.
//!
//! Every Elexon endpoint wraps its rows in `{"data": [...]}` but the row
//! layouts differ. Each parser here turns one response body into records and
//! is selected through the dataset's `EndpointDescriptor`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Europe::London;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::domain::{RecordValues, SettlementRecord};

/// Signature shared by all parsers. Errors are human-readable messages.
pub type ParseFn = fn(&str) -> Result<Vec<SettlementRecord>, String>;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemperatureRow {
    measurement_date: String,
    temperature: f64,
    temperature_reference_average: f64,
    #[serde(default)]
    temperature_reference_high: Option<f64>,
    #[serde(default)]
    temperature_reference_low: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerationRow {
    start_time: String,
    #[serde(default)]
    settlement_date: Option<String>,
    #[serde(default)]
    settlement_period: Option<u32>,
    #[serde(default)]
    data: Vec<FuelQuantity>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FuelQuantity {
    psr_type: String,
    quantity: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DemandRow {
    start_time: String,
    #[serde(default)]
    settlement_date: Option<String>,
    #[serde(default)]
    settlement_period: Option<u32>,
    #[serde(default)]
    initial_demand_outturn: Option<f64>,
    #[serde(default)]
    initial_transmission_system_demand_outturn: Option<f64>,
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<Vec<T>, String> {
    let envelope: Envelope<T> = serde_json::from_str(body).map_err(|e| e.to_string())?;
    Ok(envelope.data)
}

/// Daily temperature readings. One record per `measurementDate`.
pub fn parse_temperature(body: &str) -> Result<Vec<SettlementRecord>, String> {
    let rows: Vec<TemperatureRow> = decode(body)?;
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let date = parse_date(&row.measurement_date)?;
        out.push(SettlementRecord {
            timestamp: date.and_time(chrono::NaiveTime::MIN).and_utc(),
            settlement_date: Some(date),
            settlement_period: None,
            values: RecordValues::Temperature {
                temperature: row.temperature,
                reference_average: row.temperature_reference_average,
                reference_high: row.temperature_reference_high,
                reference_low: row.temperature_reference_low,
            },
        });
    }
    Ok(out)
}

/// Actual generation per fuel type. Each period expands into one record per
/// `psrType`, keeping the API's nesting order.
pub fn parse_generation(body: &str) -> Result<Vec<SettlementRecord>, String> {
    let rows: Vec<GenerationRow> = decode(body)?;
    let mut out = Vec::new();
    for row in rows {
        let timestamp = parse_timestamp(&row.start_time)?;
        let settlement_date = match row.settlement_date.as_deref() {
            Some(raw) => parse_date(raw)?,
            None => settlement_day(timestamp),
        };
        for fuel in row.data {
            out.push(SettlementRecord {
                timestamp,
                settlement_date: Some(settlement_date),
                settlement_period: row.settlement_period,
                values: RecordValues::Generation {
                    psr_type: fuel.psr_type,
                    quantity: fuel.quantity,
                },
            });
        }
    }
    Ok(out)
}

/// Demand outturn per settlement period.
pub fn parse_demand(body: &str) -> Result<Vec<SettlementRecord>, String> {
    let rows: Vec<DemandRow> = decode(body)?;
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let timestamp = parse_timestamp(&row.start_time)?;
        let settlement_date = match row.settlement_date.as_deref() {
            Some(raw) => parse_date(raw)?,
            None => settlement_day(timestamp),
        };
        out.push(SettlementRecord {
            timestamp,
            settlement_date: Some(settlement_date),
            settlement_period: row.settlement_period,
            values: RecordValues::Demand {
                initial_demand_outturn: row.initial_demand_outturn,
                initial_transmission_system_demand_outturn: row
                    .initial_transmission_system_demand_outturn,
            },
        });
    }
    Ok(out)
}

/// Parse an API timestamp. Offsets are honoured; naive values are UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }
    Err(format!("invalid timestamp '{raw}'"))
}

/// GB settlement days run midnight to midnight London time, so during BST
/// period 1 starts at 23:00 UTC on the previous calendar day.
pub fn settlement_day(timestamp: DateTime<Utc>) -> NaiveDate {
    timestamp.with_timezone(&London).date_naive()
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    let s = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    parse_timestamp(s)
        .map(|ts| ts.date_naive())
        .map_err(|_| format!("invalid date '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn temperature_row_becomes_midnight_record() {
        let body = r#"{"data":[{"measurementDate":"2023-01-01","publishTime":"2023-01-02T08:00:00Z",
            "temperature":20,"temperatureReferenceAverage":18,"temperatureReferenceHigh":21.5}]}"#;
        let records = parse_temperature(body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].timestamp, Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(
            records[0].values,
            RecordValues::Temperature {
                temperature: 20.0,
                reference_average: 18.0,
                reference_high: Some(21.5),
                reference_low: None,
            }
        );
    }

    #[test]
    fn generation_flattens_fuel_types_in_order() {
        let body = r#"{"data":[
            {"startTime":"2023-01-01T00:00:00Z","settlementPeriod":1,
             "data":[{"psrType":"CCGT","quantity":100},{"psrType":"Wind","quantity":250.5}]},
            {"startTime":"2023-01-01T00:30:00","settlementPeriod":2,
             "data":[{"psrType":"CCGT","quantity":110}]}]}"#;
        let records = parse_generation(body).unwrap();
        assert_eq!(records.len(), 3);
        let fuels: Vec<_> = records
            .iter()
            .map(|r| match &r.values {
                RecordValues::Generation { psr_type, .. } => psr_type.as_str(),
                _ => panic!("expected generation"),
            })
            .collect();
        assert_eq!(fuels, ["CCGT", "Wind", "CCGT"]);
        assert_eq!(records[2].settlement_period, Some(2));
        assert_eq!(records[2].timestamp, Utc.with_ymd_and_hms(2023, 1, 1, 0, 30, 0).unwrap());
        assert_eq!(records[0].settlement_date, NaiveDate::from_ymd_opt(2023, 1, 1));
    }

    #[test]
    fn bst_period_one_belongs_to_the_next_settlement_day() {
        let body = r#"{"data":[
            {"startTime":"2023-05-31T23:00:00Z","settlementPeriod":1,
             "data":[{"psrType":"CCGT","quantity":100}]},
            {"startTime":"2023-05-31T22:30:00Z","settlementDate":"2023-05-31","settlementPeriod":48,
             "data":[{"psrType":"CCGT","quantity":90}]}]}"#;
        let records = parse_generation(body).unwrap();
        assert_eq!(records[0].settlement_date, NaiveDate::from_ymd_opt(2023, 6, 1));
        assert_eq!(records[0].effective_date(), NaiveDate::from_ymd_opt(2023, 6, 1).unwrap());
        assert_eq!(records[1].settlement_date, NaiveDate::from_ymd_opt(2023, 5, 31));
    }

    #[test]
    fn winter_settlement_day_matches_utc_date() {
        let midnight = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(settlement_day(midnight), NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        let bst_midnight = Utc.with_ymd_and_hms(2023, 7, 1, 23, 0, 0).unwrap();
        assert_eq!(settlement_day(bst_midnight), NaiveDate::from_ymd_opt(2023, 7, 2).unwrap());
    }

    #[test]
    fn demand_keeps_missing_outturn_as_null() {
        let body = r#"{"data":[{"startTime":"2023-01-01T00:00:00Z","settlementDate":"2023-01-01",
            "settlementPeriod":1}]}"#;
        let records = parse_demand(body).unwrap();
        assert_eq!(
            records[0].values,
            RecordValues::Demand {
                initial_demand_outturn: None,
                initial_transmission_system_demand_outturn: None,
            }
        );
        assert_eq!(records[0].settlement_date, NaiveDate::from_ymd_opt(2023, 1, 1));
    }

    #[test]
    fn offset_timestamps_are_converted_to_utc() {
        let ts = parse_timestamp("2023-06-01T01:00:00+01:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn shape_errors_are_reported() {
        assert!(parse_demand("not json").is_err());
        assert!(parse_demand(r#"{"rows":[]}"#).is_err());
        assert!(parse_generation(r#"{"data":[{"startTime":"yesterday","data":[]}]}"#).is_err());
        let err = parse_temperature(r#"{"data":[{"measurementDate":"2023-01-01"}]}"#).unwrap_err();
        assert!(err.contains("temperature"), "{err}");
    }

    #[test]
    fn empty_data_is_not_an_error() {
        assert!(parse_temperature(r#"{"data":[]}"#).unwrap().is_empty());
        assert!(parse_generation(r#"{"data":[]}"#).unwrap().is_empty());
        assert!(parse_demand(r#"{"data":[]}"#).unwrap().is_empty());
    }
}
