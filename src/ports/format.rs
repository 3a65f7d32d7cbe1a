// SPDX-License-Identifier: MIT OR Apache-2.0

//! Settings document format trait definition.
//!
//! A [`SettingsFormat`] turns the text of a settings document into a flat map
//! and back. Flat documents round-trip. Hierarchical documents split each key
//! on `.` and nest the segments; they are written for export and never read.

use crate::domain::{ConfigError, Result};
use crate::ports::store::SettingsMap;

/// A serialization format for settings documents.
///
/// # Examples
///
/// ```rust
/// use instancecfg::domain::Result;
/// use instancecfg::ports::{SettingsFormat, SettingsMap};
///
/// struct Lines;
///
/// impl SettingsFormat for Lines {
///     fn name(&self) -> &str {
///         "lines"
///     }
///
///     fn parse_flat(&self, content: &str) -> Result<SettingsMap> {
///         Ok(content
///             .lines()
///             .filter_map(|l| l.split_once(' '))
///             .map(|(k, v)| (k.into(), v.to_string()))
///             .collect())
///     }
///
///     fn render_flat(&self, settings: &SettingsMap) -> Result<String> {
///         Ok(settings.iter().map(|(k, v)| format!("{} {}\n", k, v)).collect())
///     }
///
///     fn supported_extensions(&self) -> &[&str] {
///         &["lines"]
///     }
/// }
/// ```
pub trait SettingsFormat: Send + Sync {
    /// Returns the format name used in logs and errors.
    fn name(&self) -> &str;

    /// Parses a flat settings document.
    fn parse_flat(&self, content: &str) -> Result<SettingsMap>;

    /// Renders a flat settings document, keys in sorted order.
    fn render_flat(&self, settings: &SettingsMap) -> Result<String>;

    /// Renders a nested document by splitting keys on `.`.
    ///
    /// Formats without a nested representation return `UnsupportedOperation`.
    fn render_hierarchical(&self, settings: &SettingsMap) -> Result<String> {
        let _ = settings;
        Err(ConfigError::unsupported(
            self.name(),
            "hierarchical output",
        ))
    }

    /// Returns the file extensions this format handles, without the dot.
    fn supported_extensions(&self) -> &[&str];

    /// Returns `true` if this format handles the given extension.
    fn supports_extension(&self, ext: &str) -> bool {
        self.supported_extensions()
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
    }
}
