//! CSV import parsing and column mapping.
//!
//! The HTTP layer hands raw upload bytes to these helpers; the background
//! job then turns every data row into a [`Record`] keyed by target field
//! names. Nothing here persists anything.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::notification::NotificationLevel;
use crate::types::Record;

/// Largest accepted upload, in bytes.
pub const MAX_IMPORT_FILE_SIZE: usize = 137_072;

/// `fieldlist` target meaning "drop this column".
pub const IGNORE_MARKER: &str = "_IGNORE_";

pub const DEFAULT_DELIMITER: char = ',';

pub const MSG_INVALID_FILE: &str = "Arquivo inválido...";
pub const MSG_FILE_TOO_LARGE: &str = "Arquivo maior do que o permitido...";
pub const MSG_INVALID_CONFIG: &str = "Configuração de importação inválida...";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

// ---------------------------------------------------------------------------
// Upload checks
// ---------------------------------------------------------------------------

/// Validate an uploaded file: present, within `max_bytes`, first line not blank.
///
/// The size check runs before anything is parsed.
pub fn check_upload(bytes: Option<&[u8]>, max_bytes: usize) -> Result<&[u8], CoreError> {
    let bytes = bytes.ok_or_else(|| CoreError::UploadRejected(MSG_INVALID_FILE.into()))?;
    if bytes.len() > max_bytes {
        return Err(CoreError::UploadRejected(MSG_FILE_TOO_LARGE.into()));
    }
    if first_line(bytes).iter().all(u8::is_ascii_whitespace) {
        return Err(CoreError::UploadRejected(MSG_INVALID_FILE.into()));
    }
    Ok(bytes)
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

fn first_line(bytes: &[u8]) -> &[u8] {
    let bytes = strip_bom(bytes);
    let end = bytes.iter().position(|&b| b == b'\n').unwrap_or(bytes.len());
    let line = &bytes[..end];
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Convert a user-supplied delimiter into the single byte `csv` expects.
pub fn delimiter_byte(delimiter: char) -> Result<u8, CoreError> {
    if delimiter.is_ascii() && delimiter != '\n' && delimiter != '\r' && delimiter != '"' {
        Ok(delimiter as u8)
    } else {
        Err(CoreError::Validation(format!(
            "Unsupported CSV delimiter {delimiter:?}"
        )))
    }
}

/// Parse a delimiter form field; blank means the default comma.
pub fn parse_delimiter(raw: Option<&str>) -> Result<char, CoreError> {
    let raw = raw.unwrap_or_default();
    let raw = if raw == "\t" { raw } else { raw.trim() };
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (None, _) => Ok(DEFAULT_DELIMITER),
        (Some(c), None) => delimiter_byte(c).map(|_| c),
        _ => match raw {
            "\\t" | "tab" => Ok('\t'),
            other => Err(CoreError::Validation(format!(
                "Unsupported CSV delimiter {other:?}"
            ))),
        },
    }
}

fn reader(bytes: &[u8], delimiter: char) -> Result<csv::Reader<&[u8]>, CoreError> {
    Ok(csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter_byte(delimiter)?)
        .from_reader(strip_bom(bytes)))
}

fn record_strings(record: &csv::ByteRecord) -> Vec<String> {
    record
        .iter()
        .map(|field| String::from_utf8_lossy(field).into_owned())
        .collect()
}

/// Parse only the first line as the header row.
pub fn probe_header(bytes: &[u8], delimiter: char) -> Result<Vec<String>, CoreError> {
    let line = first_line(bytes);
    let mut rdr = reader(line, delimiter)?;
    let mut record = csv::ByteRecord::new();
    match rdr.read_byte_record(&mut record) {
        Ok(true) => Ok(record_strings(&record)
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect()),
        Ok(false) | Err(_) => Err(CoreError::UploadRejected(MSG_INVALID_FILE.into())),
    }
}

/// Every row after the header, as raw column strings. Blank lines are skipped.
pub fn parse_data_rows(bytes: &[u8], delimiter: char) -> Result<Vec<Vec<String>>, CoreError> {
    let mut rdr = reader(bytes, delimiter)?;
    let mut rows = Vec::new();
    for (index, record) in rdr.byte_records().enumerate() {
        let record = record.map_err(|_| CoreError::UploadRejected(MSG_INVALID_FILE.into()))?;
        if index == 0 {
            continue;
        }
        rows.push(record_strings(&record));
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// ImportConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
struct HeaderData {
    #[serde(default)]
    csv_header: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawFieldList {
    Map(BTreeMap<String, String>),
    List(Vec<String>),
}

#[derive(Debug, Clone, Deserialize)]
struct RawImportConfig {
    #[serde(default)]
    delimiter: Option<String>,
    #[serde(default)]
    csv_header: Vec<String>,
    #[serde(default)]
    data: Option<HeaderData>,
    #[serde(default)]
    fieldlist: Option<RawFieldList>,
}

/// User-supplied mapping from CSV columns to resource fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportConfig {
    pub delimiter: char,
    /// Source column names, by position.
    pub csv_header: Vec<String>,
    /// CSV column (header name or 0-based index) → target field or [`IGNORE_MARKER`].
    pub fieldlist: BTreeMap<String, String>,
}

impl ImportConfig {
    /// Decode the JSON `config` form field.
    ///
    /// `csv_header` is read from the top level or from a nested `data`
    /// object; `fieldlist` may be an object or a positional array.
    pub fn from_json(raw: &str) -> Result<Self, CoreError> {
        let parsed: RawImportConfig = serde_json::from_str(raw)
            .map_err(|_| CoreError::Validation(MSG_INVALID_CONFIG.into()))?;

        let delimiter = parse_delimiter(parsed.delimiter.as_deref())?;
        let csv_header = if parsed.csv_header.is_empty() {
            parsed.data.unwrap_or_default().csv_header
        } else {
            parsed.csv_header
        };
        let fieldlist = match parsed.fieldlist {
            None => BTreeMap::new(),
            Some(RawFieldList::Map(map)) => map,
            Some(RawFieldList::List(list)) => list
                .into_iter()
                .enumerate()
                .map(|(i, target)| (i.to_string(), target))
                .collect(),
        };

        Ok(Self {
            delimiter,
            csv_header,
            fieldlist,
        })
    }

    /// Resolve the column mapping.
    ///
    /// Without an explicit header the resource's field order is used; an
    /// empty `fieldlist` maps every header column onto the field of the same
    /// name. Targets outside `allowed` are dropped.
    pub fn plan(&self, default_headers: &[String], allowed: &[String]) -> ImportPlan {
        let headers: &[String] = if self.csv_header.is_empty() {
            default_headers
        } else {
            &self.csv_header
        };

        let columns: Vec<(String, Option<usize>)> = if self.fieldlist.is_empty() {
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.clone(), Some(i)))
                .collect()
        } else {
            self.fieldlist
                .iter()
                .filter(|(_, target)| target.as_str() != IGNORE_MARKER && !target.is_empty())
                .map(|(key, target)| {
                    let position = headers
                        .iter()
                        .position(|h| h == key)
                        .or_else(|| key.trim().parse::<usize>().ok());
                    (target.clone(), position)
                })
                .collect()
        };

        let columns = columns
            .into_iter()
            .filter(|(target, _)| {
                let keep = allowed.iter().any(|a| a == target);
                if !keep {
                    tracing::debug!(column = %target, "Dropping non-importable import column");
                }
                keep
            })
            .collect();

        ImportPlan { columns }
    }
}

/// Resolved `target field → column position` mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportPlan {
    columns: Vec<(String, Option<usize>)>,
}

impl ImportPlan {
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(t, _)| t.as_str())
    }

    /// Map one CSV row; columns missing from a short row become null.
    pub fn map_row(&self, columns: &[String]) -> Record {
        self.columns
            .iter()
            .map(|(target, position)| {
                let value = position
                    .and_then(|i| columns.get(i))
                    .map(|v| Value::String(v.clone()))
                    .unwrap_or(Value::Null);
                (target.clone(), value)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Counts of one finished import batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub created: usize,
    pub failed: usize,
}

impl ImportOutcome {
    /// Notification messages summarizing the batch, one per non-zero count.
    pub fn summary(&self, singular: &str, plural: &str) -> Vec<(NotificationLevel, String)> {
        let mut messages = Vec::new();
        match self.created {
            0 => {}
            1 => messages.push((
                NotificationLevel::Success,
                format!("1 {singular} importado com sucesso !!"),
            )),
            n => messages.push((
                NotificationLevel::Success,
                format!("{n} {plural} importados com sucesso !!"),
            )),
        }
        match self.failed {
            0 => {}
            1 => messages.push((
                NotificationLevel::Danger,
                format!("1 {singular} não pôde ser importado !!"),
            )),
            n => messages.push((
                NotificationLevel::Danger,
                format!("{n} {plural} não puderam ser importados !!"),
            )),
        }
        messages
    }
}

/// Notice for a batch that could not be processed at all.
pub fn aborted_message(plural: &str) -> String {
    format!("Não foi possível importar os {plural} do arquivo !!")
}
