//! CSV row ingestion
//!
//! Reads `User`, `Role`, `Permission` columns (case-sensitive, any order,
//! extra columns ignored) and applies a [`Strictness`] to rows with a
//! missing or empty field. Field values are taken verbatim unless
//! [`IngestOptions::trim_whitespace`] is set.

use crate::error::{EntitlementError, Result};
use crate::types::AccessRow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::str::FromStr;
use tracing::{debug, warn};

/// Column holding the user label
pub const USER_COLUMN: &str = "User";
/// Column holding the role label
pub const ROLE_COLUMN: &str = "Role";
/// Column holding the permission label
pub const PERMISSION_COLUMN: &str = "Permission";

/// How to treat rows with a missing or empty field
///
/// Parsed case-insensitively from both config files and the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Strictness {
    /// Keep the row, using an empty-string label for the missing field
    #[default]
    Permissive,
    /// Drop the row and log a warning
    Skip,
    /// Fail the whole read
    Strict,
}

impl FromStr for Strictness {
    type Err = EntitlementError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "permissive" => Ok(Strictness::Permissive),
            "skip" => Ok(Strictness::Skip),
            "strict" => Ok(Strictness::Strict),
            other => Err(EntitlementError::InvalidInput(format!(
                "Unknown strictness '{}' (expected permissive, skip or strict)",
                other
            ))),
        }
    }
}

impl TryFrom<String> for Strictness {
    type Error = EntitlementError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for Strictness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strictness::Permissive => "permissive",
            Strictness::Skip => "skip",
            Strictness::Strict => "strict",
        };
        f.write_str(name)
    }
}

/// Column positions resolved from the header
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    user: usize,
    role: usize,
    permission: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| EntitlementError::MissingColumn(name.to_string()))
        };

        Ok(Self {
            user: find(USER_COLUMN)?,
            role: find(ROLE_COLUMN)?,
            permission: find(PERMISSION_COLUMN)?,
        })
    }
}

/// Row ingestion settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestOptions {
    pub strictness: Strictness,

    /// Strip surrounding whitespace from headers and fields. Off by default:
    /// `" Delete_Account"` and `"Delete_Account"` are different labels.
    pub trim_whitespace: bool,
}

impl IngestOptions {
    pub fn new(strictness: Strictness) -> Self {
        Self {
            strictness,
            trim_whitespace: false,
        }
    }

    pub fn with_trim_whitespace(mut self, trim: bool) -> Self {
        self.trim_whitespace = trim;
        self
    }
}

/// Read all rows from CSV input, field values verbatim
///
/// Input with no header at all, or only a header, yields zero rows.
pub fn read_rows<R: Read>(reader: R, strictness: Strictness) -> Result<Vec<AccessRow>> {
    read_rows_with(reader, IngestOptions::new(strictness))
}

/// Read all rows from CSV input with explicit options
pub fn read_rows_with<R: Read>(reader: R, options: IngestOptions) -> Result<Vec<AccessRow>> {
    let strictness = options.strictness;
    let trim = if options.trim_whitespace {
        csv::Trim::All
    } else {
        csv::Trim::None
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(trim)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    if headers.is_empty() {
        debug!("Input has no header; treating as empty");
        return Ok(Vec::new());
    }
    let columns = ColumnIndex::from_headers(&headers)?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for (idx, result) in csv_reader.records().enumerate() {
        let record = result?;
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(idx as u64 + 2);

        match parse_record(&record, columns, line, strictness)? {
            Some(row) => rows.push(row),
            None => skipped += 1,
        }
    }

    debug!(
        rows = rows.len(),
        skipped,
        %strictness,
        trim = options.trim_whitespace,
        "Read access rows"
    );
    Ok(rows)
}

fn parse_record(
    record: &csv::StringRecord,
    columns: ColumnIndex,
    line: u64,
    strictness: Strictness,
) -> Result<Option<AccessRow>> {
    let fields = [
        (USER_COLUMN, record.get(columns.user)),
        (ROLE_COLUMN, record.get(columns.role)),
        (PERMISSION_COLUMN, record.get(columns.permission)),
    ];

    if let Some((field, _)) = fields
        .iter()
        .find(|(_, value)| value.map_or(true, str::is_empty))
    {
        match strictness {
            Strictness::Permissive => {}
            Strictness::Skip => {
                warn!(line, field = *field, "Skipping row with missing field");
                return Ok(None);
            }
            Strictness::Strict => {
                return Err(EntitlementError::MalformedRow {
                    line,
                    field: field.to_string(),
                });
            }
        }
    }

    let [user, role, permission] = fields.map(|(_, value)| value.unwrap_or("").to_string());
    Ok(Some(AccessRow {
        user,
        role,
        permission,
    }))
}
