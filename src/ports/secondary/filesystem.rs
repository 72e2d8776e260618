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

/// Secondary port - Read-only access to the kernel pseudo filesystems
///
/// Paths are absolute (`/sys/block`, `/proc/cmdline`, `/dev/ipmi0`);
/// implementations may resolve them below another root.
#[async_trait]
pub trait SystemFiles: Send + Sync {
    /// Read a whole file
    async fn read_to_string(&self, path: &str) -> Result<String, SystemError>;

    /// Entry names of a directory, sorted
    async fn list_dir(&self, path: &str) -> Result<Vec<String>, SystemError>;

    /// Whether the path exists (links are followed)
    async fn exists(&self, path: &str) -> bool;

    /// Whether the path is a regular file
    async fn is_file(&self, path: &str) -> bool;

    /// Target of a symbolic link, as stored in the link
    async fn read_link(&self, path: &str) -> Result<String, SystemError>;

    /// First line of a file without its line terminator
    async fn read_first_line(&self, path: &str) -> Result<String, SystemError> {
        let content = self.read_to_string(path).await?;
        Ok(content.lines().next().unwrap_or_default().to_string())
    }
}
