/*
Copyright 2024 San Francisco Compute Company

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Record set serializers

use super::{DomainError, RecordSet};

/// Output format of the record set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Compact JSON array of 4-element arrays
    #[default]
    Json,
    /// One quoted tuple per line
    Human,
}

/// Compact JSON rendering
pub fn render_json(records: &RecordSet) -> Result<String, DomainError> {
    serde_json::to_string(records).map_err(|e| DomainError::SerializationFailed(e.to_string()))
}

/// Human readable rendering: a bracketed list with one tuple per line
///
/// ```text
/// [('system', 'product', 'serial', 'CZJ4420D7L'),
///  ('system', 'product', 'name', 'ProLiant DL360 Gen10')]
/// ```
pub fn render_human(records: &RecordSet) -> String {
    let lines: Vec<String> = records.iter().map(ToString::to_string).collect();
    format!("[{}]", lines.join(",\n "))
}

pub fn render(records: &RecordSet, format: OutputFormat) -> Result<String, DomainError> {
    match format {
        OutputFormat::Json => render_json(records),
        OutputFormat::Human => Ok(render_human(records)),
    }
}
