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

//! Local filesystem adapter

use crate::domain::SystemError;
use crate::ports::SystemFiles;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Reads `/sys`, `/proc` and `/dev` below a configurable root
///
/// The root is `/` on a live system; tests point it at a temporary tree.
pub struct LocalSystemFiles {
    root: PathBuf,
}

impl LocalSystemFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl Default for LocalSystemFiles {
    fn default() -> Self {
        Self::new("/")
    }
}

#[async_trait]
impl SystemFiles for LocalSystemFiles {
    async fn read_to_string(&self, path: &str) -> Result<String, SystemError> {
        let bytes = fs::read(self.resolve(path))
            .await
            .map_err(|e| SystemError::io(path, e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<String>, SystemError> {
        let mut entries = fs::read_dir(self.resolve(path))
            .await
            .map_err(|e| SystemError::io(path, e))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SystemError::io(path, e))?
        {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    async fn exists(&self, path: &str) -> bool {
        fs::try_exists(self.resolve(path)).await.unwrap_or(false)
    }

    async fn is_file(&self, path: &str) -> bool {
        fs::metadata(self.resolve(path))
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    async fn read_link(&self, path: &str) -> Result<String, SystemError> {
        let target = fs::read_link(self.resolve(path))
            .await
            .map_err(|e| SystemError::io(path, e))?;
        Ok(path_text(&target))
    }
}

fn path_text(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
