//! JSON reporter for analysis results

use anyhow::Result;
use serde::Serialize;

/// JSON format reporter
pub struct JsonReporter;

impl JsonReporter {
    /// Format any serializable report as JSON
    ///
    /// # Arguments
    ///
    /// * `report` - The report to format
    /// * `pretty` - Whether to pretty-print the JSON
    pub fn format<R: Serialize + ?Sized>(report: &R, pretty: bool) -> Result<String> {
        let output = if pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };
        Ok(output)
    }
}
