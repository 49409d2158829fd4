use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

use encoding_rs::GBK;
use tracing::{debug, info};

use crate::domain::{CourseRecord, DomainError};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Which encoding a course table turned out to be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    Gbk,
}

/// Reads a course-review table into records, one per data row.
pub struct CsvRecordReader;

impl CsvRecordReader {
    pub fn read_path(path: &Path) -> Result<Vec<CourseRecord>, DomainError> {
        if !path.is_file() {
            return Err(DomainError::input_not_found(path.display().to_string()));
        }

        let bytes = std::fs::read(path)?;
        let (text, encoding) = decode(&bytes)?;
        info!("Reading {} as {:?}", path.display(), encoding);

        Self::read_str(&text)
    }

    pub fn read_str(text: &str) -> Result<Vec<CourseRecord>, DomainError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| DomainError::invalid_input(format!("cannot read header row: {}", e)))?
            .clone();

        let mut records = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let row_values = result.map_err(|e| {
                DomainError::invalid_input(format!("malformed row {}: {}", row + 1, e))
            })?;

            let fields: HashMap<String, String> = headers
                .iter()
                .zip(row_values.iter())
                .filter(|(name, _)| !name.is_empty())
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect();

            records.push(CourseRecord::from_fields(fields));
        }

        debug!("Parsed {} course records", records.len());
        Ok(records)
    }
}

/// UTF-8 is tried first since its validation rejects GBK text reliably.
pub fn decode(bytes: &[u8]) -> Result<(Cow<'_, str>, SourceEncoding), DomainError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok((Cow::Borrowed(text), SourceEncoding::Utf8));
    }

    match GBK.decode_without_bom_handling_and_without_replacement(bytes) {
        Some(text) => Ok((text, SourceEncoding::Gbk)),
        None => Err(DomainError::encoding(
            "input is neither valid UTF-8 nor valid GBK",
        )),
    }
}
