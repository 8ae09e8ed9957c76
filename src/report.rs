//! The data sent in the user agent and how it is written.
//!
//! The format is a contract with whoever parses the header on the other side:
//! `{name}/{version} {json}` where the JSON is compact and has its keys sorted at every level.
use std::collections::BTreeMap;
use std::io;

use serde::{Serialize, Serializer};
use serde_json::Value;
use serde_json::ser::Formatter;

use crate::ci::CiStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Installer {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Implementation {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Libc {
    pub lib: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Distro {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// The distribution codename, eg `groovy`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub libc: Option<Libc>,
}

impl Distro {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.version.is_none() && self.id.is_none() && self.libc.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct System {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
}

/// Everything we found about the environment for one user agent.
/// Absent values are left out of the JSON, except `ci` which is always there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub installer: Installer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub python: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementation: Option<Implementation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distro: Option<Distro>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<System>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openssl_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setuptools_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rustc_version: Option<String>,
    pub ci: CiStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
}

impl Report {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            installer: Installer {
                name: name.into(),
                version: version.into(),
            },
            python: None,
            implementation: None,
            distro: None,
            system: None,
            cpu: None,
            openssl_version: None,
            setuptools_version: None,
            rustc_version: None,
            ci: CiStatus::Inconclusive,
            user_data: None,
        }
    }

    /// Compact, ASCII only JSON with keys sorted at every level
    pub fn to_json(&self) -> String {
        // Serializing our structs directly would follow field declaration order, so go through a
        // Value and sort ourselves rather than rely on how serde_json backs its maps.
        let encoded = serde_json::to_value(self).and_then(|value| {
            let mut out = Vec::new();
            let mut serializer = serde_json::Serializer::with_formatter(&mut out, AsciiFormatter);
            Sorted(&value).serialize(&mut serializer)?;
            Ok(out)
        });

        match encoded {
            Ok(out) => String::from_utf8_lossy(&out).into_owned(),
            // Only plain strings, options and bools in there so this can't happen
            Err(e) => {
                log::debug!("Could not serialize report: {e}");
                String::new()
            }
        }
    }

    /// `{name}/{version} {json}`
    pub fn format(&self) -> String {
        format!(
            "{}/{} {}",
            self.installer.name,
            self.installer.version,
            self.to_json()
        )
    }
}

/// Compact output where everything outside of printable ASCII is written as `\uXXXX`
/// (UTF-16 surrogate pairs above the BMP), like Python's `json.dumps` does by default.
/// The result ends up in an HTTP header so it has to be ASCII anyway.
struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            if (' '..='~').contains(&c) {
                continue;
            }
            writer.write_all(fragment[start..i].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                writer.write_all(format!("\\u{unit:04x}").as_bytes())?;
            }
            start = i + c.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

struct Sorted<'a>(&'a Value);

impl Serialize for Sorted<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Object(map) => {
                let sorted: BTreeMap<&str, Sorted> =
                    map.iter().map(|(k, v)| (k.as_str(), Sorted(v))).collect();
                sorted.serialize(serializer)
            }
            Value::Array(items) => serializer.collect_seq(items.iter().map(Sorted)),
            other => other.serialize(serializer),
        }
    }
}
