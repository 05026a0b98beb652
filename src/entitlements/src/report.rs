//! Alert report serialization
//!
//! CSV with header `User,Toxic_Permissions` and one row per alert. The
//! header is always written, so an empty alert list yields a header-only
//! report.

use crate::detector::Alert;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Report column headers
pub const REPORT_HEADERS: [&str; 2] = ["User", "Toxic_Permissions"];

/// One report line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(rename = "User")]
    pub user: String,

    /// Combination members, sorted and joined with `", "`
    #[serde(rename = "Toxic_Permissions")]
    pub toxic_permissions: String,
}

/// Tabular alert report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertReport {
    rows: Vec<ReportRow>,
}

impl AlertReport {
    /// Build a report with one row per alert
    pub fn from_alerts(alerts: &[Alert]) -> Self {
        let rows = alerts
            .iter()
            .map(|alert| ReportRow {
                user: alert.user.clone(),
                toxic_permissions: alert.combo.joined(),
            })
            .collect();

        Self { rows }
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write the report as UTF-8 CSV
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        csv_writer.write_record(REPORT_HEADERS)?;
        for row in &self.rows {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;

        Ok(())
    }

    /// Render the report into a byte buffer
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::ToxicCombo;

    fn alert(user: &str, members: &[&str]) -> Alert {
        Alert {
            user: user.to_string(),
            combo: ToxicCombo::new(members.iter().copied()).unwrap(),
        }
    }

    #[test]
    fn test_empty_report_has_header_only() {
        let bytes = AlertReport::from_alerts(&[]).to_csv_bytes().unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "User,Toxic_Permissions\n");
    }

    #[test]
    fn test_one_row_per_alert() {
        let alerts = vec![
            alert("carol", &["Modify_Invoice", "Delete_Account"]),
            alert("carol", &["Access_Billing", "Delete_Account"]),
        ];

        let report = AlertReport::from_alerts(&alerts);
        assert_eq!(report.len(), 2);

        let text = String::from_utf8(report.to_csv_bytes().unwrap()).unwrap();
        assert_eq!(
            text,
            "User,Toxic_Permissions\n\
             carol,\"Delete_Account, Modify_Invoice\"\n\
             carol,\"Access_Billing, Delete_Account\"\n"
        );
    }

    #[test]
    fn test_report_reads_back() {
        let alerts = vec![alert("zoë", &["B", "A"])];
        let bytes = AlertReport::from_alerts(&alerts).to_csv_bytes().unwrap();

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let rows: Vec<ReportRow> = reader.deserialize().collect::<std::result::Result<_, _>>().unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user, "zoë");
        assert_eq!(rows[0].toxic_permissions, "A, B");
    }
}
