//! Persisted price log
//!
//! Append-only CSV file with one row per ingested reading. The last column
//! holds the forecast for that row and stays blank until one is computed.
//! Every rewrite goes through a temp file renamed over the log, and all file
//! access is serialized by one lock so readers never see a half-written file.

mod csv_file;

use crate::error::Result;
use crate::models::{LogEntry, Reading};
use csv::StringRecord;
use parking_lot::RwLock;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Column names of the log file
pub const LOG_HEADER: [&str; 6] = [
    "Timestamp",
    "CurrentPrice",
    "Change",
    "ChangePercent",
    "UpdateTimeLabel",
    "PredictedPrice",
];

const PREDICTED_COLUMN: usize = 5;

#[derive(Debug)]
struct LogState {
    /// Header row has been written
    initialized: bool,
    /// Data rows currently in the file (header excluded)
    rows: usize,
}

/// Handle to the on-disk price log
#[derive(Debug)]
pub struct PriceLog {
    path: PathBuf,
    state: RwLock<LogState>,
}

impl PriceLog {
    /// Open (or prepare to create) the log at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let records = csv_file::read_records(&path)?;
        let initialized = !records.is_empty();
        let rows = data_rows(&records).len();

        info!("Price log at {:?} ({} rows)", path, rows);

        Ok(Self {
            path,
            state: RwLock::new(LogState { initialized, rows }),
        })
    }

    /// Number of data rows in the file
    pub fn len(&self) -> usize {
        self.state.read().rows
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a reading with a blank forecast column, writing the header first
    /// if the log is new. Returns the data-row index of the new row.
    pub fn append(&self, reading: &Reading) -> Result<usize> {
        let mut state = self.state.write();

        let mut records = Vec::with_capacity(2);
        if !state.initialized {
            records.push(StringRecord::from(LOG_HEADER.to_vec()));
        }
        records.push(reading_record(reading));

        csv_file::append_records(&self.path, &records)?;

        state.initialized = true;
        let row = state.rows;
        state.rows += 1;
        Ok(row)
    }

    /// Header plus all data rows in file order
    pub fn read_all(&self) -> Result<Vec<StringRecord>> {
        let _state = self.state.read();
        csv_file::read_records(&self.path)
    }

    /// Write `value` into the forecast column of data row `row`.
    ///
    /// When `row` is past the end of the file the first row with a blank
    /// forecast is filled instead, and failing that a new row holding only
    /// the forecast is appended (removed again by [`PriceLog::compact`]).
    pub fn set_predicted_at(&self, row: usize, value: f64) -> Result<()> {
        self.set_predictions(&[(row, value)])
    }

    /// Batch form of [`PriceLog::set_predicted_at`] with a single rewrite
    pub fn set_predictions(&self, updates: &[(usize, f64)]) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }

        let mut state = self.state.write();
        let mut records = csv_file::read_records(&self.path)?;
        if records.is_empty() {
            records.push(StringRecord::from(LOG_HEADER.to_vec()));
        }
        let header_offset = header_offset(&records);

        for &(row, value) in updates {
            let index = row + header_offset;
            if index < records.len() {
                records[index] = with_prediction(&records[index], value);
                continue;
            }

            match first_unpredicted(&records, header_offset) {
                Some(blank) => {
                    debug!("Row {} not in log, filling first blank forecast at {}", row, blank);
                    records[blank] = with_prediction(&records[blank], value);
                }
                None => {
                    warn!("Row {} not in log, appending forecast-only row", row);
                    let mut fields = vec![String::new(); LOG_HEADER.len()];
                    fields[PREDICTED_COLUMN] = value.to_string();
                    records.push(StringRecord::from(fields));
                }
            }
        }

        csv_file::write_records_atomic(&self.path, &records)?;
        state.initialized = true;
        state.rows = records.len() - header_offset;
        Ok(())
    }

    /// Drop rows whose first field is blank.
    ///
    /// Returns the data-row indices that were removed, in ascending order.
    /// Rows after each removed one move up, so callers holding row indices
    /// must shift them (see [`crate::history::shifted_row`]).
    pub fn compact(&self) -> Result<Vec<usize>> {
        let mut state = self.state.write();
        let records = csv_file::read_records(&self.path)?;
        let offset = header_offset(&records);

        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            let blank = record.get(0).map(|f| f.trim().is_empty()).unwrap_or(true);
            if blank && index >= offset {
                removed.push(index - offset);
            } else {
                kept.push(record);
            }
        }

        if !removed.is_empty() {
            csv_file::write_records_atomic(&self.path, &kept)?;
            info!("Compacted price log: removed {} rows", removed.len());
        }

        state.rows = data_rows(&kept).len();
        debug!("Rows after compaction: {}", state.rows);
        Ok(removed)
    }

    /// Last `count` data rows as entries, oldest first.
    ///
    /// A log that does not exist yet reads as empty rather than failing.
    pub fn last_entries(&self, count: usize) -> Result<Vec<LogEntry>> {
        let records = self.read_all()?;
        let rows = data_rows(&records);
        let start = rows.len().saturating_sub(count);

        Ok(rows[start..]
            .iter()
            .filter_map(|record| {
                let entry = entry_from_record(record);
                if entry.is_none() {
                    warn!("Skipping malformed log row: {:?}", record);
                }
                entry
            })
            .collect())
    }
}

/// 1 when the first record is the header row, else 0
fn header_offset(records: &[StringRecord]) -> usize {
    match records.first().and_then(|r| r.get(0)) {
        Some(first) if first.trim() == LOG_HEADER[0] => 1,
        _ => 0,
    }
}

fn data_rows(records: &[StringRecord]) -> &[StringRecord] {
    &records[header_offset(records)..]
}

fn first_unpredicted(records: &[StringRecord], header_offset: usize) -> Option<usize> {
    records
        .iter()
        .enumerate()
        .skip(header_offset)
        .find(|(_, r)| {
            r.get(PREDICTED_COLUMN)
                .map(|f| f.trim().is_empty())
                .unwrap_or(true)
        })
        .map(|(i, _)| i)
}

fn reading_record(reading: &Reading) -> StringRecord {
    StringRecord::from(vec![
        reading.timestamp_label(),
        reading.price.to_string(),
        reading.change.to_string(),
        reading.percent_change.to_string(),
        reading.update_time.clone(),
        reading
            .predicted_price
            .map(|p| p.to_string())
            .unwrap_or_default(),
    ])
}

/// Copy of `record` padded to full width with the forecast column replaced
fn with_prediction(record: &StringRecord, value: f64) -> StringRecord {
    let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
    if fields.len() < LOG_HEADER.len() {
        fields.resize(LOG_HEADER.len(), String::new());
    }
    fields[PREDICTED_COLUMN] = value.to_string();
    StringRecord::from(fields)
}

fn entry_from_record(record: &StringRecord) -> Option<LogEntry> {
    // Rows from the five-column layout have no forecast field at all
    if record.len() < PREDICTED_COLUMN {
        return None;
    }

    let field = |i: usize| record.get(i).unwrap_or("").to_string();
    let predicted = record
        .get(PREDICTED_COLUMN)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string);

    Some(LogEntry {
        timestamp: field(0),
        price: field(1),
        change: field(2),
        percent_change: field(3),
        update_time: field(4),
        predicted_price: predicted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn reading(price: f64, second: u32) -> Reading {
        Reading {
            timestamp: NaiveDate::from_ymd_opt(2024, 10, 1)
                .unwrap()
                .and_hms_opt(9, 0, second)
                .unwrap(),
            price,
            change: 0.25,
            percent_change: 0.32,
            update_time: "09:00:00".to_string(),
            predicted_price: None,
            row: None,
        }
    }

    #[test]
    fn test_append_writes_header_once() {
        let dir = tempdir().unwrap();
        let log = PriceLog::open(dir.path().join("prices.csv")).unwrap();

        assert_eq!(log.append(&reading(78.1, 0)).unwrap(), 0);
        assert_eq!(log.append(&reading(78.2, 10)).unwrap(), 1);

        let records = log.read_all().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], StringRecord::from(LOG_HEADER.to_vec()));
        assert_eq!(records[2].get(1), Some("78.2"));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_round_trip_fields_match_reading() {
        let dir = tempdir().unwrap();
        let log = PriceLog::open(dir.path().join("prices.csv")).unwrap();
        let r = reading(1078.45, 5);
        log.append(&r).unwrap();

        let records = log.read_all().unwrap();
        let row = &records[1];
        assert_eq!(row.get(0), Some("2024-10-01 09:00:05"));
        assert_eq!(row.get(1), Some("1078.45"));
        assert_eq!(row.get(2), Some("0.25"));
        assert_eq!(row.get(3), Some("0.32"));
        assert_eq!(row.get(4), Some("09:00:00"));
        assert_eq!(row.get(5), Some(""));
    }

    #[test]
    fn test_reopen_keeps_row_count_and_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        {
            let log = PriceLog::open(&path).unwrap();
            log.append(&reading(70.0, 0)).unwrap();
        }

        let log = PriceLog::open(&path).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log.append(&reading(71.0, 1)).unwrap(), 1);

        let records = log.read_all().unwrap();
        let headers = records
            .iter()
            .filter(|r| r.get(0) == Some(LOG_HEADER[0]))
            .count();
        assert_eq!(headers, 1);
    }

    #[test]
    fn test_set_predicted_at_backfills_row() {
        let dir = tempdir().unwrap();
        let log = PriceLog::open(dir.path().join("prices.csv")).unwrap();
        log.append(&reading(100.0, 0)).unwrap();
        log.append(&reading(101.0, 1)).unwrap();

        log.set_predicted_at(1, 102.0).unwrap();

        let entries = log.last_entries(10).unwrap();
        assert_eq!(entries[0].predicted_price, None);
        assert_eq!(entries[1].predicted_price.as_deref(), Some("102"));
    }

    #[test]
    fn test_set_predicted_past_end_fills_first_blank() {
        let dir = tempdir().unwrap();
        let log = PriceLog::open(dir.path().join("prices.csv")).unwrap();
        log.append(&reading(100.0, 0)).unwrap();
        log.append(&reading(101.0, 1)).unwrap();
        log.set_predicted_at(0, 100.5).unwrap();

        log.set_predicted_at(42, 102.0).unwrap();

        let entries = log.last_entries(10).unwrap();
        assert_eq!(entries[1].predicted_price.as_deref(), Some("102"));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_set_predicted_past_end_appends_blank_row_then_compacts() {
        let dir = tempdir().unwrap();
        let log = PriceLog::open(dir.path().join("prices.csv")).unwrap();
        log.append(&reading(100.0, 0)).unwrap();
        log.set_predicted_at(0, 100.0).unwrap();

        log.set_predicted_at(5, 99.0).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.read_all().unwrap()[2].get(0), Some(""));

        assert_eq!(log.compact().unwrap(), vec![1]);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_compact_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        std::fs::write(
            &path,
            "Timestamp,CurrentPrice,Change,ChangePercent,UpdateTimeLabel,PredictedPrice\n\
             2024-10-01 09:00:00,78.1,0.1,0.12,09:00,\n\
             ,,,,,78.4\n\
             2024-10-01 09:00:10,78.3,0.3,0.38,09:00,78.5\n",
        )
        .unwrap();

        let log = PriceLog::open(&path).unwrap();
        assert_eq!(log.compact().unwrap(), vec![1]);
        assert_eq!(log.len(), 2);
        assert!(log.compact().unwrap().is_empty());
        assert_eq!(log.len(), 2);
        assert_eq!(log.read_all().unwrap().len(), 3);
    }

    #[test]
    fn test_last_entries_handles_short_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        std::fs::write(
            &path,
            "Timestamp,CurrentPrice,Change,ChangePercent,UpdateTimeLabel\n\
             2024-10-01 09:00:00,78.1,0.1,0.12,09:00\n\
             broken,row\n\
             2024-10-01 09:00:10,78.3,0.3,0.38,09:00\n",
        )
        .unwrap();

        let log = PriceLog::open(&path).unwrap();
        let entries = log.last_entries(10).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.predicted_price.is_none()));
        assert_eq!(entries[1].price, "78.3");
    }

    #[test]
    fn test_last_entries_on_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let log = PriceLog::open(dir.path().join("missing.csv")).unwrap();
        assert!(log.last_entries(10).unwrap().is_empty());
        assert!(log.is_empty());
    }

    #[test]
    fn test_last_entries_takes_tail() {
        let dir = tempdir().unwrap();
        let log = PriceLog::open(dir.path().join("prices.csv")).unwrap();
        for i in 0..15 {
            log.append(&reading(70.0 + i as f64, i)).unwrap();
        }

        let entries = log.last_entries(10).unwrap();
        assert_eq!(entries.len(), 10);
        assert_eq!(entries[0].price, "75");
        assert_eq!(entries[9].price, "84");
    }
}
