// SPDX-License-Identifier: MIT OR Apache-2.0

//! The on-disk instance index: one JSON descriptor per instance.

use crate::domain::instance::descriptor_file_stem;
use crate::domain::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Maximum descriptor size to read (prevents DoS)
const MAX_DESCRIPTOR_SIZE: u64 = 64 * 1024;

/// Descriptor file extension.
const DESCRIPTOR_EXTENSION: &str = "config";

/// Maps an instance name to its settings file.
///
/// Serialized as `{"Name": "...", "ConfigurationFilePath": "..."}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceDescriptor {
    /// The instance name, with its original casing
    pub name: String,
    /// The instance's settings file
    pub configuration_file_path: PathBuf,
}

impl InstanceDescriptor {
    /// Creates a descriptor.
    pub fn new(name: impl Into<String>, configuration_file_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            configuration_file_path: configuration_file_path.into(),
        }
    }
}

/// A directory of instance descriptors.
///
/// Each descriptor lives at `<directory>/<stem>.config`, where the stem is the
/// instance name lowercased with spaces turned into hyphens.
///
/// # Examples
///
/// ```rust
/// use instancecfg::adapters::strategies::FileInstanceIndex;
///
/// # fn main() -> instancecfg::domain::Result<()> {
/// let dir = tempfile::tempdir()?;
/// let index = FileInstanceIndex::new(dir.path());
/// index.register("My Instance", "/etc/acme/my-instance.config")?;
///
/// assert!(dir.path().join("my-instance.config").is_file());
/// assert_eq!(index.list()?[0].name, "My Instance");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct FileInstanceIndex {
    directory: PathBuf,
}

impl FileInstanceIndex {
    /// Creates an index over `directory`. The directory is created on first write.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Returns the index directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Returns the descriptor path for `instance_name`.
    pub fn descriptor_path(&self, instance_name: &str) -> PathBuf {
        self.directory.join(format!(
            "{}.{}",
            descriptor_file_stem(instance_name),
            DESCRIPTOR_EXTENSION
        ))
    }

    /// Returns `true` if a descriptor exists for `instance_name`.
    pub fn contains(&self, instance_name: &str) -> bool {
        self.descriptor_path(instance_name).is_file()
    }

    /// Returns `true` if the directory holds any file.
    pub fn any(&self) -> Result<bool> {
        Ok(!self.descriptor_files()?.is_empty())
    }

    /// Loads every descriptor in the directory, in file name order.
    ///
    /// A file that is not a valid descriptor is an error naming its path.
    pub fn list(&self) -> Result<Vec<InstanceDescriptor>> {
        self.descriptor_files()?
            .iter()
            .map(|path| read_descriptor(path))
            .collect()
    }

    /// Loads the descriptor for `instance_name`, if one exists.
    pub fn get(&self, instance_name: &str) -> Result<Option<InstanceDescriptor>> {
        let path = self.descriptor_path(instance_name);
        if !path.is_file() {
            return Ok(None);
        }
        read_descriptor(&path).map(Some)
    }

    /// Writes the descriptor for `instance_name`, keeping the stored name of an
    /// existing descriptor and replacing its settings file path.
    pub fn register(&self, instance_name: &str, configuration_file: impl Into<PathBuf>) -> Result<()> {
        fs::create_dir_all(&self.directory)?;
        let path = self.descriptor_path(instance_name);
        let mut descriptor = self
            .get(instance_name)?
            .unwrap_or_else(|| InstanceDescriptor::new(instance_name, PathBuf::new()));
        descriptor.configuration_file_path = configuration_file.into();

        let data = serde_json::to_string_pretty(&descriptor)
            .map_err(|e| ConfigError::parse("Failed to serialize instance descriptor", e))?;
        let mut tmp = NamedTempFile::new_in(&self.directory)?;
        tmp.write_all(data.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;

        tracing::info!("Saving instance: {}", descriptor.name);
        Ok(())
    }

    /// Deletes the descriptor for `instance_name`. Returns `false` if there was none.
    pub fn remove(&self, instance_name: &str) -> Result<bool> {
        let path = self.descriptor_path(instance_name);
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!("Deleted instance descriptor {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn descriptor_files(&self) -> Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

fn read_descriptor(path: &Path) -> Result<InstanceDescriptor> {
    let metadata = fs::metadata(path)?;
    if metadata.len() > MAX_DESCRIPTOR_SIZE {
        return Err(ConfigError::ParseError {
            message: format!("Could not load instance at path {}: file too large", path.display()),
            source: None,
        });
    }
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data)
        .map_err(|e| ConfigError::parse(format!("Could not load instance at path {}", path.display()), e))
}
