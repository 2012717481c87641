//! CSV report of occupied slots for spreadsheet tools.
//!
//! The output starts with a UTF-8 byte-order mark so spreadsheet applications
//! detect the encoding and render accented names correctly.

use crate::models::slot::SlotRecord;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const HEADER: [&str; 6] = ["Number", "Name", "Phone", "Status", "Collector", "Validated"];

/// Renders rows in the given order as CSV bytes
pub fn render_csv(rows: &[SlotRecord]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(UTF8_BOM.to_vec());

    writer.write_record(HEADER)?;

    for row in rows {
        writer.write_record([
            row.id.as_str(),
            row.name.as_str(),
            row.phone.as_str(),
            row.status.as_str(),
            row.collector.as_str(),
            if row.validated { "Yes" } else { "No" },
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}
