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

//! Port handles shared by every detector

use crate::domain::{CommandError, SystemError};
use crate::ports::{
    CommandExecutor, CommandOutput, HostResources, InterfaceQuery, SystemCommand, SystemFiles,
};
use log::{debug, warn};
use std::sync::Arc;

/// Access to the machine for the detectors
///
/// Failures are logged here and surface as `None`: a missing tool or file
/// means the feature is absent.
#[derive(Clone)]
pub struct ProbeContext {
    commands: Arc<dyn CommandExecutor>,
    files: Arc<dyn SystemFiles>,
    interfaces: Arc<dyn InterfaceQuery>,
    resources: Arc<dyn HostResources>,
}

impl ProbeContext {
    pub fn new(
        commands: Arc<dyn CommandExecutor>,
        files: Arc<dyn SystemFiles>,
        interfaces: Arc<dyn InterfaceQuery>,
        resources: Arc<dyn HostResources>,
    ) -> Self {
        Self {
            commands,
            files,
            interfaces,
            resources,
        }
    }

    pub fn files(&self) -> &dyn SystemFiles {
        self.files.as_ref()
    }

    pub fn interfaces(&self) -> &dyn InterfaceQuery {
        self.interfaces.as_ref()
    }

    pub fn resources(&self) -> &dyn HostResources {
        self.resources.as_ref()
    }

    /// Run a command whatever its exit status
    ///
    /// # Returns
    /// * `None` when the command could not be spawned or timed out
    pub async fn output(&self, command: &SystemCommand) -> Option<CommandOutput> {
        match self.commands.execute(command).await {
            Ok(output) => Some(output),
            Err(CommandError::System(SystemError::CommandNotFound(program))) => {
                debug!("{program} is not installed");
                None
            }
            Err(e) => {
                warn!("{command}: {e}");
                None
            }
        }
    }

    /// Standard output of a command that exited successfully
    pub async fn run(&self, command: &SystemCommand) -> Option<String> {
        let output = self.output(command).await?;
        if output.success {
            Some(output.stdout)
        } else {
            debug!(
                "{command} exited with {:?}: {}",
                output.exit_code,
                output.stderr.trim()
            );
            None
        }
    }

    /// Standard output of the first of `candidates` that runs `args` successfully
    ///
    /// Vendor tools ship under several names; candidates that are not
    /// installed or fail are skipped in order.
    pub async fn run_first(
        &self,
        candidates: &[&'static str],
        args: &[&str],
    ) -> Option<(&'static str, String)> {
        for candidate in candidates {
            if let Some(output) = self.run(&SystemCommand::new(candidate).args(args)).await {
                return Some((candidate, output));
            }
        }
        None
    }

    /// Whole content of a file
    pub async fn read(&self, path: &str) -> Option<String> {
        match self.files.read_to_string(path).await {
            Ok(content) => Some(content),
            Err(e) => {
                debug!("{e}");
                None
            }
        }
    }

    /// First line of a file, trimmed
    pub async fn read_line(&self, path: &str) -> Option<String> {
        match self.files.read_first_line(path).await {
            Ok(line) => Some(line.trim().to_string()),
            Err(e) => {
                debug!("{e}");
                None
            }
        }
    }

    /// Directory entries, empty when the directory cannot be read
    pub async fn list(&self, path: &str) -> Vec<String> {
        match self.files.list_dir(path).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!("{e}");
                Vec::new()
            }
        }
    }
}
