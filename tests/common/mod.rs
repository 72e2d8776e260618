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

#![allow(dead_code)]

use async_trait::async_trait;
use hardware_detect::domain::{CommandError, SystemError};
use hardware_detect::{
    CommandExecutor, CommandOutput, HostResources, InterfaceQuery, LocalSystemFiles,
    SystemCommand,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
}

/// Command executor answering from a script keyed by the full command line
///
/// Commands missing from the script behave like tools that are not installed.
#[derive(Default)]
pub struct ScriptedExecutor {
    responses: HashMap<String, CommandOutput>,
    /// Content written to the path following `-f`, keyed by program
    dumps: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, command_line: &str, stdout: &str) -> Self {
        self.responses
            .insert(command_line.to_string(), CommandOutput::ok(stdout));
        self
    }

    pub fn on_failure(mut self, command_line: &str, exit_code: i32, stderr: &str) -> Self {
        self.responses.insert(
            command_line.to_string(),
            CommandOutput::failed(exit_code, stderr),
        );
        self
    }

    /// Make `program ... -f <path>` write `content` to `<path>` and succeed
    pub fn dumps_to_file(mut self, program: &str, content: &str) -> Self {
        self.dumps.insert(program.to_string(), content.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandExecutor for ScriptedExecutor {
    async fn execute(&self, command: &SystemCommand) -> Result<CommandOutput, CommandError> {
        let line = command.to_string();
        self.calls.lock().unwrap().push(line.clone());

        if let Some(content) = self.dumps.get(&command.program) {
            let path = command
                .args
                .iter()
                .position(|arg| arg == "-f")
                .and_then(|i| command.args.get(i + 1))
                .ok_or_else(|| CommandError::InvalidArguments(line.clone()))?;
            std::fs::write(path, content).map_err(|e| SystemError::io(path, e))?;
            return Ok(CommandOutput::ok(""));
        }

        self.responses
            .get(&line)
            .cloned()
            .ok_or_else(|| SystemError::CommandNotFound(command.program.clone()).into())
    }

    async fn is_command_available(&self, command_name: &str) -> Result<bool, CommandError> {
        Ok(self.dumps.contains_key(command_name)
            || self
                .responses
                .keys()
                .any(|line| line.split(' ').next() == Some(command_name)))
    }
}

/// Netmasks keyed by interface name
#[derive(Default)]
pub struct StaticInterfaces {
    netmasks: HashMap<String, String>,
}

impl StaticInterfaces {
    pub fn with(mut self, interface: &str, netmask: &str) -> Self {
        self.netmasks
            .insert(interface.to_string(), netmask.to_string());
        self
    }
}

#[async_trait]
impl InterfaceQuery for StaticInterfaces {
    async fn netmask(&self, interface: &str) -> Result<String, SystemError> {
        self.netmasks
            .get(interface)
            .cloned()
            .ok_or_else(|| SystemError::IoError(format!("{interface} has no IPv4 address")))
    }
}

pub struct FixedResources(pub u64);

impl HostResources for FixedResources {
    fn available_memory(&self) -> u64 {
        self.0
    }
}

pub struct Harness {
    pub commands: Arc<ScriptedExecutor>,
    pub files: Arc<LocalSystemFiles>,
    pub interfaces: Arc<StaticInterfaces>,
    pub resources: Arc<FixedResources>,
}

impl Harness {
    pub fn new(commands: ScriptedExecutor, root: &Path) -> Self {
        Self {
            commands: Arc::new(commands),
            files: Arc::new(LocalSystemFiles::new(root)),
            interfaces: Arc::new(StaticInterfaces::default()),
            resources: Arc::new(FixedResources(64 * 1024 * 1024 * 1024)),
        }
    }

    pub fn interfaces(mut self, interfaces: StaticInterfaces) -> Self {
        self.interfaces = Arc::new(interfaces);
        self
    }

    pub fn available_memory(mut self, bytes: u64) -> Self {
        self.resources = Arc::new(FixedResources(bytes));
        self
    }

    pub fn context(&self) -> hardware_detect::domain::ProbeContext {
        hardware_detect::domain::ProbeContext::new(
            self.commands.clone(),
            self.files.clone(),
            self.interfaces.clone(),
            self.resources.clone(),
        )
    }

    pub fn service(&self) -> hardware_detect::domain::HardwareDetectionServiceImpl {
        hardware_detect::domain::HardwareDetectionServiceImpl::new(
            self.commands.clone(),
            self.files.clone(),
            self.interfaces.clone(),
            self.resources.clone(),
        )
    }
}
