//! Input validation for run submissions
//!
//! Everything here runs before a run folder exists, so a rejected request
//! leaves nothing behind on the shared filesystem.
//!
//! # Examples
//!
//! ```rust,ignore
//! use gateway_server::features::shared::validation::{validate_email, validate_period};
//!
//! let period = validate_period(2023, 10)?;
//! validate_email("ops@example.com")?;
//! ```

use gateway_common::PeriodMetadata;
use std::ops::RangeInclusive;
use thiserror::Error;

use crate::staging::{Upload, TABULAR_EXTENSION};

/// Accepted `week_year` values.
pub const WEEK_YEAR_RANGE: RangeInclusive<i64> = 2000..=2100;

/// Accepted `week_num` values.
pub const WEEK_NUM_RANGE: RangeInclusive<i64> = 1..=53;

/// Bytes of each upload inspected by the CSV check.
pub const CSV_SAMPLE_BYTES: usize = 1024;

/// Delimiters the CSV check recognizes, in preference order.
pub const CSV_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Errors that can occur while validating a submission
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing form field '{0}'")]
    MissingField(&'static str),

    #[error("Form field '{field}' must be an integer (got '{value}')")]
    NotAnInteger { field: &'static str, value: String },

    #[error("week_year must be between 2000 and 2100 (got {0})")]
    WeekYear(i64),

    #[error("week_num must be between 1 and 53 (got {0})")]
    WeekNum(i64),

    #[error("notify_email '{0}' is not a valid email address")]
    Email(String),

    #[error("At least one CSV file is required.")]
    NoFiles,

    #[error("File '{0}' must have a .csv extension.")]
    NotCsv(String),

    #[error("File '{name}' is not readable as CSV: {reason}")]
    UnreadableCsv { name: String, reason: String },
}

/// Parse an integer form field
pub fn parse_integer(field: &'static str, value: &str) -> Result<i64, ValidationError> {
    value
        .trim()
        .parse()
        .map_err(|_| ValidationError::NotAnInteger {
            field,
            value: value.to_string(),
        })
}

/// Validate the reporting period
pub fn validate_period(week_year: i64, week_num: i64) -> Result<PeriodMetadata, ValidationError> {
    if !WEEK_YEAR_RANGE.contains(&week_year) {
        return Err(ValidationError::WeekYear(week_year));
    }

    if !WEEK_NUM_RANGE.contains(&week_num) {
        return Err(ValidationError::WeekNum(week_num));
    }

    Ok(PeriodMetadata {
        week_year: week_year as i32,
        week_num: week_num as u32,
    })
}

/// Validate a notification address
///
/// # Rules
/// - No whitespace
/// - Exactly one `@` with a non-empty local part
/// - Domain contains a dot and neither starts nor ends with one
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::Email(email.to_string());

    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid());
    }

    Ok(())
}

/// Validate every upload of a submission
///
/// Checks run in upload order and stop at the first rejected file.
pub fn validate_csv_uploads(uploads: &[Upload]) -> Result<(), ValidationError> {
    if uploads.is_empty() {
        return Err(ValidationError::NoFiles);
    }

    for upload in uploads {
        let name = upload.filename.clone().unwrap_or_default();

        if !has_csv_name(&name) {
            return Err(ValidationError::NotCsv(name));
        }

        sniff_delimiter(&upload.content)
            .map_err(|reason| ValidationError::UnreadableCsv { name, reason })?;
    }

    Ok(())
}

fn has_csv_name(name: &str) -> bool {
    name.to_ascii_lowercase()
        .ends_with(&format!(".{}", TABULAR_EXTENSION))
}

/// Find the delimiter of a CSV sample
///
/// Only the first [`CSV_SAMPLE_BYTES`] are read; a sample cut mid-line is
/// trimmed back to its last complete line. Blank samples pass with `None`.
pub fn sniff_delimiter(content: &[u8]) -> Result<Option<u8>, String> {
    let sample = csv_sample(content);
    if sample.trim().is_empty() {
        return Ok(None);
    }

    let mut uniform = None;
    let mut last_error = None;

    for delimiter in CSV_DELIMITERS {
        if !sample.as_bytes().contains(&delimiter) {
            continue;
        }
        match field_count(&sample, delimiter) {
            Ok(fields) if fields > 1 => return Ok(Some(delimiter)),
            // Delimiter only seen inside quoted fields.
            Ok(_) => uniform = uniform.or(Some(delimiter)),
            Err(e) => last_error = Some(e),
        }
    }

    if uniform.is_some() {
        return Ok(uniform);
    }

    match last_error {
        Some(e) => Err(e),
        // No delimiter anywhere: a single column file.
        None => field_count(&sample, CSV_DELIMITERS[0]).map(|_| Some(CSV_DELIMITERS[0])),
    }
}

fn csv_sample(content: &[u8]) -> String {
    let truncated = content.len() > CSV_SAMPLE_BYTES;
    let head = &content[..content.len().min(CSV_SAMPLE_BYTES)];
    let text = String::from_utf8_lossy(head);

    if !truncated {
        return text.into_owned();
    }

    match text.rfind('\n') {
        Some(end) => text[..=end].to_string(),
        None => text.into_owned(),
    }
}

/// Field count shared by every record, or why the sample is not uniform.
fn field_count(sample: &str, delimiter: u8) -> Result<usize, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(sample.as_bytes());

    let mut fields = None;
    for record in reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        match fields {
            None => fields = Some(record.len()),
            Some(expected) if expected != record.len() => {
                return Err(format!(
                    "expected {} fields but found {} on a later row",
                    expected,
                    record.len()
                ));
            },
            Some(_) => {},
        }
    }

    fields.ok_or_else(|| "no rows found".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_period_bounds() {
        assert_eq!(
            validate_period(2000, 1).unwrap(),
            PeriodMetadata {
                week_year: 2000,
                week_num: 1
            }
        );
        assert!(validate_period(2100, 53).is_ok());
        assert_eq!(validate_period(1999, 10), Err(ValidationError::WeekYear(1999)));
        assert_eq!(validate_period(2023, 0), Err(ValidationError::WeekNum(0)));
        assert_eq!(validate_period(2023, 54), Err(ValidationError::WeekNum(54)));
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer("week_num", " 12 ").unwrap(), 12);
        assert!(matches!(
            parse_integer("week_num", "twelve"),
            Err(ValidationError::NotAnInteger {
                field: "week_num",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("demo@example.com").is_ok());
        assert!(validate_email("first.last+tag@mail.example.org").is_ok());

        for bad in [
            "",
            "no-at-sign",
            "@example.com",
            "a@b@example.com",
            "user@localhost",
            "user@.example.com",
            "user@example.com.",
            "us er@example.com",
        ] {
            assert!(validate_email(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_uploads_require_at_least_one_file() {
        assert_eq!(validate_csv_uploads(&[]), Err(ValidationError::NoFiles));
    }

    #[test]
    fn test_uploads_require_csv_extension() {
        let err = validate_csv_uploads(&[Upload::new("report.txt", "a,b\n")]).unwrap_err();
        assert_eq!(err.to_string(), "File 'report.txt' must have a .csv extension.");

        assert!(validate_csv_uploads(&[Upload::new("REPORT.CSV", "a,b\n1,2\n")]).is_ok());

        let unnamed = Upload {
            filename: None,
            content: b"a,b\n".to_vec(),
        };
        assert_eq!(
            validate_csv_uploads(&[unnamed]),
            Err(ValidationError::NotCsv(String::new()))
        );
    }

    #[test]
    fn test_sniff_recognizes_delimiters() {
        assert_eq!(sniff_delimiter(b"a,b,c\n1,2,3\n").unwrap(), Some(b','));
        assert_eq!(sniff_delimiter(b"a;b\n1;2\n").unwrap(), Some(b';'));
        assert_eq!(sniff_delimiter(b"a\tb\n1\t2\n").unwrap(), Some(b'\t'));
        assert_eq!(sniff_delimiter(b"a|b\n1|2\n").unwrap(), Some(b'|'));
        assert_eq!(sniff_delimiter(b"amount\n10\n").unwrap(), Some(b','));
        assert_eq!(sniff_delimiter(b"  \n").unwrap(), None);
    }

    #[test]
    fn test_sniff_rejects_ragged_rows() {
        let err = validate_csv_uploads(&[Upload::new("bad.csv", "a,b,c\n1,2\n")]).unwrap_err();
        assert!(matches!(err, ValidationError::UnreadableCsv { .. }));
        assert!(err.to_string().starts_with("File 'bad.csv' is not readable as CSV"));
    }

    #[test]
    fn test_sniff_only_reads_complete_lines_of_sample() {
        // A valid header, then rows that push the sample past its limit
        // mid-line; the partial last line must not count as ragged.
        let mut content = b"id,name,amount\n".to_vec();
        while content.len() < CSV_SAMPLE_BYTES + 100 {
            content.extend_from_slice(b"1,widget,12.50\n");
        }
        assert_eq!(sniff_delimiter(&content).unwrap(), Some(b','));
    }
}
