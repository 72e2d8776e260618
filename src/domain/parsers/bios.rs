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

//! HP BIOS settings (`conrep`) parsing

use crate::domain::{Record, Value};
use roxmltree::Document;

/// Whether the system vendor ships the HP BIOS tooling
pub fn is_hp_vendor(vendor: &str) -> bool {
    vendor.contains("HP")
}

/// Parse a `conrep -s` dump
///
/// Every `Section` element gives `hp/bios/<name>`; sections without text
/// hold `None`. Document order is kept.
pub fn parse_conrep(xml: &str) -> Result<Vec<Record>, String> {
    let doc = Document::parse(xml).map_err(|e| format!("Invalid conrep dump: {e}"))?;

    let records = doc
        .descendants()
        .filter(|node| node.is_element() && node.tag_name().name() == "Section")
        .filter_map(|section| {
            let name = section.attribute("name")?;
            let value = match section.text() {
                Some(text) => Value::from(text),
                None => Value::Null,
            };
            Some(Record::new("hp", "bios", name, value))
        })
        .collect();

    Ok(records)
}
