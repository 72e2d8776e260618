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

//! Common parsing utilities and helper functions

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    pub static ref KEY_SEPARATOR_RE: Regex = Regex::new(r"\s*:\s*").unwrap();
}

/// Parse a key-value pair from system output
///
/// # Arguments
/// * `line` - Line to parse (e.g., "CPU Model: Intel Core i7")
/// * `separator` - Separator character (usually ':')
///
/// # Returns
/// * `Ok((String, String))` - Key-value pair
/// * `Err(String)` - Parse error
pub fn parse_key_value(line: &str, separator: char) -> Result<(String, String), String> {
    if let Some(pos) = line.find(separator) {
        let key = line[..pos].trim().to_string();
        let value = line[pos + 1..].trim().to_string();
        Ok((key, value))
    } else {
        Err(format!("No separator '{separator}' found in line: {line}"))
    }
}

/// Collect every `key: value` line of an output, in order
pub fn parse_key_value_lines(output: &str) -> Vec<(String, String)> {
    output
        .lines()
        .filter_map(|line| parse_key_value(line, ':').ok())
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

/// Look up a key in an ordered key/value list
pub fn lookup<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Non-empty, trimmed lines of a command output
pub fn output_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Turn a multi-word label into a single CamelCase key
///
/// Every word gets an upper-case first letter and lower-case remaining
/// letters, then spaces are removed: `"PD Type"` becomes `"PdType"`,
/// `"Enclosure Device ID"` becomes `"EnclosureDeviceId"`. Any non-letter
/// starts a new word, so `"Drive's position"` gives `"Drive'SPosition"`.
pub fn camel_key(label: &str) -> String {
    let mut key = String::with_capacity(label.len());
    let mut previous_is_letter = false;

    for c in label.trim().chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                key.extend(c.to_lowercase());
            } else {
                key.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            if c != ' ' {
                key.push(c);
            }
            previous_is_letter = false;
        }
    }

    key
}

/// Strip the unit of a size expressed in GB or TB, returning gigabytes
///
/// `"278.875 GB"` gives `"278.875"`, `"1.818 TB"` gives `"1818"`. Other units
/// are returned unchanged, without spaces.
pub fn size_in_gb(size: &str) -> String {
    let compact = size.replace(' ', "");
    if let Some(gb) = compact.strip_suffix("GB") {
        gb.to_string()
    } else if let Some(tb) = compact.strip_suffix("TB") {
        match tb.parse::<f64>() {
            Ok(value) => ((value * 1000.0) as u64).to_string(),
            Err(_) => compact,
        }
    } else {
        compact
    }
}

/// Parse a decimal integer, or a hexadecimal one when the text contains an `x`
pub fn parse_int_auto(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.contains('x') {
        let digits = value.trim_start_matches("0x").trim_start_matches("0X");
        i64::from_str_radix(digits, 16).ok()
    } else {
        value.parse::<i64>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        let (key, value) = parse_key_value("CPU Model: Intel Core i7", ':').unwrap();
        assert_eq!(key, "CPU Model");
        assert_eq!(value, "Intel Core i7");

        // Only the first separator splits
        let (key, value) = parse_key_value("MAC Address : 00:25:90:aa:bb:cc", ':').unwrap();
        assert_eq!(key, "MAC Address");
        assert_eq!(value, "00:25:90:aa:bb:cc");

        assert!(parse_key_value("no separator here", ':').is_err());
    }

    #[test]
    fn test_parse_key_value_lines_keeps_order() {
        let pairs = parse_key_value_lines("B: 2\nnoise\nA: 1\n: empty\n");
        assert_eq!(
            pairs,
            vec![
                ("B".to_string(), "2".to_string()),
                ("A".to_string(), "1".to_string())
            ]
        );
        assert_eq!(lookup(&pairs, "A"), Some("1"));
        assert_eq!(lookup(&pairs, "C"), None);
    }

    #[test]
    fn test_output_lines() {
        assert_eq!(
            output_lines("Ubuntu\n\n  5.15.0-91-generic \n"),
            vec!["Ubuntu", "5.15.0-91-generic"]
        );
    }

    #[test]
    fn test_output_lines_keep_inner_whitespace() {
        assert_eq!(
            output_lines("BOOT_IMAGE=/vmlinuz  console=ttyS0\tquiet\n"),
            vec!["BOOT_IMAGE=/vmlinuz  console=ttyS0\tquiet"]
        );
    }

    #[test]
    fn test_camel_key() {
        assert_eq!(camel_key("Device Id"), "DeviceId");
        assert_eq!(camel_key("Number of Slots"), "NumberOfSlots");
        assert_eq!(camel_key("PD Type"), "PdType");
        assert_eq!(camel_key("Enclosure Device ID"), "EnclosureDeviceId");
        assert_eq!(camel_key("SAS Address(0)"), "SasAddress(0)");
        assert_eq!(camel_key("Drive's position"), "Drive'SPosition");
    }

    #[test]
    fn test_size_in_gb() {
        assert_eq!(size_in_gb("278.875 GB"), "278.875");
        assert_eq!(size_in_gb("1.818 TB"), "1818");
        assert_eq!(size_in_gb("512 MB"), "512MB");
    }

    #[test]
    fn test_parse_int_auto() {
        assert_eq!(parse_int_auto("85"), Some(85));
        assert_eq!(parse_int_auto("0xd0c"), Some(0xd0c));
        assert_eq!(parse_int_auto("r0p1"), None);
    }
}
