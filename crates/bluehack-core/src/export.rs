//! Device collection export in JSON or CSV form.

use std::fmt;

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::Result;
use crate::types::Device;

/// Fixed CSV header row.
pub const CSV_HEADER: &str = "Name,Address,RSSI,Services,Last Seen,Status";

/// Placeholder written in the RSSI column when no signal strength is known.
pub const MISSING_RSSI: &str = "N/A";

/// Base name of the downloaded file.
pub const EXPORT_FILE_STEM: &str = "bluetooth_devices";

/// Serialization format of a device export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Array of device records.
    #[default]
    Json,
    /// Flat table with a header row.
    Csv,
}

impl ExportFormat {
    /// Resolve a `format` query value. Anything other than `csv` is JSON.
    #[must_use]
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Json,
        }
    }

    /// File extension, also used as the label in log messages.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }

    /// MIME type of the rendered body.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_ascii_uppercase())
    }
}

/// A rendered snapshot of the device collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceExport {
    /// Format of `body`.
    pub format: ExportFormat,
    /// Number of devices in the snapshot.
    pub device_count: usize,
    /// Rendered document.
    pub body: String,
}

impl DeviceExport {
    /// Render `devices` (already in display order) in the given format.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render(devices: &[Device], format: ExportFormat) -> Result<Self> {
        let body = match format {
            ExportFormat::Json => serde_json::to_string(devices)?,
            ExportFormat::Csv => render_csv(devices),
        };
        Ok(Self {
            format,
            device_count: devices.len(),
            body,
        })
    }

    /// Download file name, e.g. `bluetooth_devices.csv`.
    #[must_use]
    pub fn filename(&self) -> String {
        format!("{EXPORT_FILE_STEM}.{}", self.format.extension())
    }

    /// Value for the `Content-Disposition` header.
    #[must_use]
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename={}", self.filename())
    }

    /// MIME type of the body.
    #[must_use]
    pub const fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

/// Render devices as CSV: header plus one `\n`-separated row per device.
#[must_use]
pub fn render_csv(devices: &[Device]) -> String {
    let mut lines = Vec::with_capacity(devices.len() + 1);
    lines.push(CSV_HEADER.to_string());
    lines.extend(devices.iter().map(csv_row));
    lines.join("\n")
}

fn csv_row(device: &Device) -> String {
    let rssi = device
        .rssi
        .map_or_else(|| MISSING_RSSI.to_string(), |rssi| rssi.to_string());
    format!(
        "{},{},{},{},{},{}",
        quote(&device.name),
        quote(&device.address),
        rssi,
        quote(&device.services.join(";")),
        quote(&device.last_seen.to_rfc3339_opts(SecondsFormat::Millis, true)),
        quote(device.status.as_str()),
    )
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeviceStatus, NewDevice};
    use chrono::{TimeZone, Utc};

    fn device(id: u64, name: &str, rssi: Option<i32>, services: &[&str]) -> Device {
        let new = NewDevice::new(
            name,
            format!("AA:BB:{id:02}"),
            Utc.with_ymd_and_hms(2025, 1, 15, 3, 30, 0).unwrap(),
            DeviceStatus::Discovered,
        )
        .with_rssi(rssi)
        .with_services(services.iter().copied());
        Device::create(id, new)
    }

    #[test]
    fn test_format_from_query() {
        assert_eq!(ExportFormat::from_query(Some("csv")), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_query(Some("CSV")), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_query(Some("json")), ExportFormat::Json);
        assert_eq!(ExportFormat::from_query(Some("xml")), ExportFormat::Json);
        assert_eq!(ExportFormat::from_query(None), ExportFormat::Json);
    }

    #[test]
    fn test_csv_has_header_and_one_row_per_device() {
        let devices = vec![device(1, "A", Some(-40), &[]), device(2, "B", None, &[])];
        let csv = render_csv(&devices);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
    }

    #[test]
    fn test_csv_row_layout() {
        let csv = render_csv(&[device(1, "Tag1", None, &["180f", "180a"])]);
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(
            row,
            r#""Tag1","AA:BB:01",N/A,"180f;180a","2025-01-15T03:30:00.000Z","discovered""#
        );
    }

    #[test]
    fn test_csv_zero_rssi_is_not_missing() {
        let csv = render_csv(&[device(1, "Tag1", Some(0), &[])]);
        assert!(csv.lines().nth(1).unwrap().contains(",0,"));
    }

    #[test]
    fn test_csv_escapes_embedded_quotes() {
        let csv = render_csv(&[device(1, "say \"hi\", ok", Some(-50), &[])]);
        assert!(csv.contains(r#""say ""hi"", ok""#));
    }

    #[test]
    fn test_empty_csv_is_header_only() {
        assert_eq!(render_csv(&[]), CSV_HEADER);
    }

    #[test]
    fn test_export_metadata() {
        let export = DeviceExport::render(&[], ExportFormat::Csv).unwrap();
        assert_eq!(export.filename(), "bluetooth_devices.csv");
        assert_eq!(
            export.content_disposition(),
            "attachment; filename=bluetooth_devices.csv"
        );
        assert_eq!(export.content_type(), "text/csv");
        assert_eq!(ExportFormat::Json.to_string(), "JSON");
    }

    #[test]
    fn test_json_export_parses_back() {
        let devices = vec![device(1, "A", Some(-40), &["180f"]), device(2, "B", None, &[])];
        let export = DeviceExport::render(&devices, ExportFormat::Json).unwrap();
        let parsed: Vec<Device> = serde_json::from_str(&export.body).unwrap();
        assert_eq!(parsed, devices);
        assert_eq!(export.device_count, 2);
    }
}
