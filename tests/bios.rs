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

mod common;

use assert_fs::TempDir;
use common::{fixture, Harness, ScriptedExecutor};
use hardware_detect::domain::services::bios;
use hardware_detect::{render_json, RecordSet};
use predicates::prelude::*;

fn records_for_vendor(vendor: &str) -> RecordSet {
    let mut records = RecordSet::new();
    records.push("system", "product", "vendor", vendor);
    records
}

#[tokio::test]
async fn test_conrep_dump_matches_golden_output() {
    let root = TempDir::new().unwrap();
    let commands = ScriptedExecutor::new().dumps_to_file("conrep", &fixture("conrep.dat"));
    let harness = Harness::new(commands, root.path());

    let mut records = records_for_vendor("HPE");
    bios::detect_hp_bios(&harness.context(), &mut records).await;
    records.remove_first("system", "product", "vendor");

    let actual: serde_json::Value = serde_json::from_str(&render_json(&records).unwrap()).unwrap();
    let expected: serde_json::Value =
        serde_json::from_str(&fixture("conrep.expected.json")).unwrap();
    assert_eq!(actual, expected);

    let calls = harness.commands.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("conrep -s -f "));
}

#[tokio::test]
async fn test_conrep_skipped_on_other_vendors() {
    let root = TempDir::new().unwrap();
    let commands = ScriptedExecutor::new().dumps_to_file("conrep", &fixture("conrep.dat"));
    let harness = Harness::new(commands, root.path());

    let mut records = records_for_vendor("Dell Inc.");
    bios::detect_hp_bios(&harness.context(), &mut records).await;

    assert_eq!(records.len(), 1);
    let calls = harness.commands.calls();
    assert_eq!(calls.len(), 1);
    assert!(predicate::str::starts_with("conrep -s -f ").eval(&calls[0]));
}

#[tokio::test]
async fn test_conrep_not_installed() {
    let root = TempDir::new().unwrap();
    let harness = Harness::new(ScriptedExecutor::new(), root.path());

    let mut records = records_for_vendor("HP");
    bios::detect_hp_bios(&harness.context(), &mut records).await;

    assert_eq!(records.len(), 1);
    let calls = harness.commands.calls();
    assert_eq!(calls.len(), 1);
    assert!(predicate::str::starts_with("conrep -s -f ").eval(&calls[0]));
}
