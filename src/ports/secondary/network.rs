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

use crate::domain::SystemError;
use async_trait::async_trait;

/// Secondary port - Kernel network interface queries
#[async_trait]
pub trait InterfaceQuery: Send + Sync {
    /// Dotted-quad IPv4 netmask configured on an interface
    ///
    /// # Arguments
    /// * `interface` - Interface name, e.g. `eth0`
    ///
    /// # Returns
    /// * `Ok(String)` - Netmask such as `255.255.255.0`
    /// * `Err(SystemError)` - The interface has no IPv4 address or does not exist
    async fn netmask(&self, interface: &str) -> Result<String, SystemError>;
}
