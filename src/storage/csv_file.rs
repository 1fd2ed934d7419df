//! Raw CSV file access for the price log

use crate::error::Result;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Read every record, header included. A missing file reads as empty.
pub fn read_records(path: &Path) -> Result<Vec<StringRecord>> {
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut records = Vec::new();
    for record in reader.records() {
        records.push(record?);
    }
    Ok(records)
}

/// Append records to the end of the file, creating it if needed
pub fn append_records(path: &Path, records: &[StringRecord]) -> Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let mut writer = WriterBuilder::new().flexible(true).from_writer(file);
    for record in records {
        writer.write_record(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Replace the file contents through a temp file renamed over the original
pub fn write_records_atomic(path: &Path, records: &[StringRecord]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = WriterBuilder::new().flexible(true).from_writer(&mut tmp);
        for record in records {
            writer.write_record(record)?;
        }
        writer.flush()?;
    }
    tmp.as_file_mut().flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}
