//! SQLite persistence: one table per dataset plus the consolidated `elexon` view.
//!
//! Tables have no primary key. Ingesting the same range twice appends the
//! rows again; nothing here de-duplicates.

use chrono::SecondsFormat;
use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{Connection, params};

use crate::domain::{Dataset, DbTarget, RecordValues, SettlementRecord};
use crate::error::{AppError, EXIT_DATASET, EXIT_RESOURCE};

const TEMPERATURE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS temperature (
    timestamp TEXT NOT NULL,
    settlement_date TEXT,
    settlement_period INTEGER,
    temperature REAL NOT NULL,
    temperature_reference_average REAL NOT NULL,
    temperature_reference_high REAL,
    temperature_reference_low REAL
);
"#;

const GENERATION_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS generation (
    timestamp TEXT NOT NULL,
    settlement_date TEXT,
    settlement_period INTEGER,
    psr_type TEXT NOT NULL,
    quantity REAL NOT NULL
);
"#;

const DEMAND_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS demand (
    timestamp TEXT NOT NULL,
    settlement_date TEXT,
    settlement_period INTEGER,
    initial_demand_outturn REAL,
    initial_transmission_system_demand_outturn REAL
);
"#;

// Generation rows enriched with the settlement day's temperature and the
// period's demand. Periods lacking either are left out.
const CONSOLIDATED_VIEW_SQL: &str = r#"
DROP VIEW IF EXISTS elexon;
CREATE VIEW elexon AS
SELECT
    g.timestamp AS timestamp,
    g.settlement_period AS settlement_period,
    g.psr_type AS psr_type,
    g.quantity AS quantity,
    t.temperature AS temperature,
    t.temperature_reference_average AS temperature_reference_average,
    d.initial_demand_outturn AS initial_demand_outturn
FROM generation g
JOIN temperature t ON t.settlement_date = g.settlement_date
JOIN demand d ON d.timestamp = g.timestamp
WHERE t.temperature IS NOT NULL AND d.initial_demand_outturn IS NOT NULL
ORDER BY g.timestamp, g.psr_type;
"#;

pub const CONSOLIDATED_VIEW: &str = "elexon";

/// One row read back for logging, as display strings in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRow {
    pub columns: Vec<String>,
    pub values: Vec<String>,
}

pub struct Store {
    conn: Connection,
    target: DbTarget,
}

impl Store {
    pub fn open(target: &DbTarget) -> Result<Self, AppError> {
        let conn = match target {
            DbTarget::Memory => Connection::open_in_memory(),
            DbTarget::File(path) => Connection::open(path),
        }
        .map_err(|e| {
            AppError::new(EXIT_RESOURCE, format!("Failed to open database {target}: {e}"))
        })?;

        info!("Opened SQLite database {target}");
        Ok(Self {
            conn,
            target: target.clone(),
        })
    }

    pub fn target(&self) -> &DbTarget {
        &self.target
    }

    pub fn ensure_table(&self, dataset: Dataset) -> Result<(), AppError> {
        let ddl = match dataset {
            Dataset::Temperature => TEMPERATURE_SQL,
            Dataset::Generation => GENERATION_SQL,
            Dataset::Demand => DEMAND_SQL,
        };
        self.conn.execute_batch(ddl).map_err(|e| {
            AppError::new(EXIT_DATASET, format!("Failed to create table {dataset}: {e}"))
        })
    }

    pub fn table_exists(&self, name: &str) -> Result<bool, AppError> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master \
                 WHERE type IN ('table', 'view') AND name = ?1",
                params![name],
                |row| row.get(0),
            )
            .map_err(|e| AppError::new(EXIT_DATASET, format!("Failed to inspect schema: {e}")))?;
        Ok(count > 0)
    }

    /// Create the dataset's table if needed and append `records` in one transaction.
    ///
    /// Every record must belong to `dataset`; a mismatch aborts the insert.
    pub fn insert(
        &mut self,
        dataset: Dataset,
        records: &[SettlementRecord],
    ) -> Result<usize, AppError> {
        self.ensure_table(dataset)?;

        let write_err = |e: rusqlite::Error| {
            AppError::new(EXIT_DATASET, format!("Failed to write {dataset} rows: {e}"))
        };

        let tx = self.conn.transaction().map_err(write_err)?;
        {
            let mut stmt = tx.prepare(insert_sql(dataset)).map_err(write_err)?;
            for record in records {
                if record.dataset() != dataset {
                    return Err(AppError::new(
                        EXIT_DATASET,
                        format!(
                            "Refusing to store a {} record in table {dataset}",
                            record.dataset()
                        ),
                    ));
                }
                let timestamp = record.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true);
                let settlement_date = record.settlement_date.map(|d| d.to_string());
                let period = record.settlement_period;

                let result = match &record.values {
                    RecordValues::Temperature {
                        temperature,
                        reference_average,
                        reference_high,
                        reference_low,
                    } => stmt.execute(params![
                        timestamp,
                        settlement_date,
                        period,
                        temperature,
                        reference_average,
                        reference_high,
                        reference_low
                    ]),
                    RecordValues::Generation { psr_type, quantity } => stmt.execute(params![
                        timestamp,
                        settlement_date,
                        period,
                        psr_type,
                        quantity
                    ]),
                    RecordValues::Demand {
                        initial_demand_outturn,
                        initial_transmission_system_demand_outturn,
                    } => stmt.execute(params![
                        timestamp,
                        settlement_date,
                        period,
                        initial_demand_outturn,
                        initial_transmission_system_demand_outturn
                    ]),
                };
                result.map_err(write_err)?;
            }
        }
        tx.commit().map_err(write_err)?;

        debug!("{dataset}: inserted {} row(s)", records.len());
        Ok(records.len())
    }

    pub fn row_count(&self, table: &str) -> Result<usize, AppError> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0)).map_err(|e| {
            AppError::new(EXIT_DATASET, format!("Failed to count rows in {table}: {e}"))
        })?;
        Ok(count as usize)
    }

    /// (Re)create the `elexon` view. Returns `false` when a source table is missing.
    pub fn create_consolidated_view(&self) -> Result<bool, AppError> {
        for dataset in Dataset::ALL {
            if !self.table_exists(dataset.id())? {
                return Ok(false);
            }
        }
        self.conn.execute_batch(CONSOLIDATED_VIEW_SQL).map_err(|e| {
            AppError::new(
                EXIT_DATASET,
                format!("Failed to create view {CONSOLIDATED_VIEW}: {e}"),
            )
        })?;
        Ok(true)
    }

    /// First `limit` rows of a table or view in storage order.
    pub fn sample(&self, table: &str, limit: usize) -> Result<Vec<SampleRow>, AppError> {
        let read_err = |e: rusqlite::Error| {
            AppError::new(EXIT_DATASET, format!("Failed to read {table}: {e}"))
        };

        let sql = format!("SELECT * FROM {} LIMIT ?1", quote_ident(table));
        let mut stmt = self.conn.prepare(&sql).map_err(read_err)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();

        let rows = stmt
            .query_map(params![limit as i64], |row| {
                let mut values = Vec::with_capacity(columns.len());
                for idx in 0..columns.len() {
                    values.push(display_value(row.get::<_, Value>(idx)?));
                }
                Ok(values)
            })
            .map_err(read_err)?;

        let mut out = Vec::new();
        for values in rows {
            out.push(SampleRow {
                columns: columns.clone(),
                values: values.map_err(read_err)?,
            });
        }
        Ok(out)
    }
}

fn insert_sql(dataset: Dataset) -> &'static str {
    match dataset {
        Dataset::Temperature => {
            "INSERT INTO temperature (timestamp, settlement_date, settlement_period, temperature, \
             temperature_reference_average, temperature_reference_high, temperature_reference_low) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
        }
        Dataset::Generation => {
            "INSERT INTO generation (timestamp, settlement_date, settlement_period, psr_type, \
             quantity) VALUES (?1, ?2, ?3, ?4, ?5)"
        }
        Dataset::Demand => {
            "INSERT INTO demand (timestamp, settlement_date, settlement_period, \
             initial_demand_outturn, initial_transmission_system_demand_outturn) \
             VALUES (?1, ?2, ?3, ?4, ?5)"
        }
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn display_value(value: Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(v) => v.to_string(),
        Value::Real(v) => v.to_string(),
        Value::Text(v) => v,
        Value::Blob(v) => format!("<{} bytes>", v.len()),
    }
}
