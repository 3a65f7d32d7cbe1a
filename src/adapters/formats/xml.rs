// SPDX-License-Identifier: MIT OR Apache-2.0

//! XML settings documents.
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <instance-settings>
//!   <set key="Server.Port">10933</set>
//! </instance-settings>
//! ```
//!
//! Any root element name is accepted on read.

use crate::domain::{ConfigError, Result, SettingKey};
use crate::ports::{SettingsFormat, SettingsMap};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// The document written for a newly created instance.
pub const EMPTY_SETTINGS_DOCUMENT: &str =
    "<?xml version='1.0' encoding='UTF-8' ?><instance-settings></instance-settings>";

const ROOT: &str = "instance-settings";
const SET: &[u8] = b"set";

/// Flat `<set key="...">value</set>` documents, always written sorted by key.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlSettingsFormat;

fn key_attribute(element: &BytesStart<'_>) -> Result<String> {
    for attribute in element.attributes() {
        let attribute =
            attribute.map_err(|e| ConfigError::parse("invalid attribute on <set>", e))?;
        if attribute.key.as_ref() == b"key" {
            let value = attribute
                .unescape_value()
                .map_err(|e| ConfigError::parse("invalid key attribute on <set>", e))?;
            return Ok(value.into_owned());
        }
    }
    Err(ConfigError::ParseError {
        message: "<set> element without a key attribute".to_string(),
        source: None,
    })
}

impl SettingsFormat for XmlSettingsFormat {
    fn name(&self) -> &str {
        "xml"
    }

    fn parse_flat(&self, content: &str) -> Result<SettingsMap> {
        let mut reader = Reader::from_str(content);
        let mut settings = SettingsMap::new();
        let mut current: Option<String> = None;
        let mut text = String::new();

        loop {
            let event = reader
                .read_event()
                .map_err(|e| ConfigError::parse("invalid XML settings document", e))?;
            match event {
                Event::Start(e) if e.name().as_ref() == SET => {
                    current = Some(key_attribute(&e)?);
                    text.clear();
                }
                Event::Empty(e) if e.name().as_ref() == SET => {
                    settings.insert(SettingKey::from(key_attribute(&e)?), String::new());
                }
                Event::Text(t) if current.is_some() => {
                    let unescaped = t
                        .unescape()
                        .map_err(|e| ConfigError::parse("invalid text in <set>", e))?;
                    text.push_str(&unescaped);
                }
                Event::CData(c) if current.is_some() => {
                    let raw = std::str::from_utf8(&c)
                        .map_err(|e| ConfigError::parse("invalid CDATA in <set>", e))?;
                    text.push_str(raw);
                }
                Event::End(e) if e.name().as_ref() == SET => {
                    if let Some(key) = current.take() {
                        settings.insert(SettingKey::from(key), std::mem::take(&mut text));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(settings)
    }

    fn render_flat(&self, settings: &SettingsMap) -> Result<String> {
        use quick_xml::escape::escape;

        let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        out.push_str(&format!("<{}>\n", ROOT));
        for (key, value) in settings {
            out.push_str(&format!(
                "  <set key=\"{}\">{}</set>\n",
                escape(key.as_str()),
                escape(value.as_str())
            ));
        }
        out.push_str(&format!("</{}>\n", ROOT));
        Ok(out)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["config", "xml"]
    }
}
