//! Assembly identity parsing
//!
//! Bind events carry the requested assembly as its display name, e.g.
//! `System.Text.Json, Version=8.0.0.0, Culture=neutral, PublicKeyToken=cc7b13ffcd2ddd51`.
//! Queries match on the simple name only.

use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A parsed assembly display name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssemblyName {
    /// Simple name
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub culture: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_token: Option<String>,

    /// Any other `Key=Value` attributes, in order of appearance
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<(String, String)>,
}

impl AssemblyName {
    /// An identity with only a simple name
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            culture: None,
            public_key_token: None,
            attributes: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Simple-name comparison as used by queries
    pub fn matches(&self, name: &str) -> bool {
        self.name == name
    }
}

/// Split a display name into `key[=value]` components.
///
/// `\` escapes the next character and double quotes group text that may
/// contain `,` or `=`; neither marker is kept. Only the first unescaped `=`
/// of a component separates key from value.
fn split_components(s: &str) -> Option<Vec<(String, Option<String>)>> {
    let mut components = Vec::new();
    let mut key = String::new();
    let mut value: Option<String> = None;
    let mut quoted = false;
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        let literal = match c {
            '\\' => chars.next()?,
            '"' => {
                quoted = !quoted;
                continue;
            }
            ',' if !quoted => {
                components.push(component(&key, value.take()));
                key.clear();
                continue;
            }
            '=' if !quoted && value.is_none() => {
                value = Some(String::new());
                continue;
            }
            other => other,
        };
        match value.as_mut() {
            Some(value) => value.push(literal),
            None => key.push(literal),
        }
    }

    if quoted {
        return None;
    }
    components.push(component(&key, value));
    Some(components)
}

fn component(key: &str, value: Option<String>) -> (String, Option<String>) {
    (key.trim().to_string(), value.map(|v| v.trim().to_string()))
}

/// Escape the characters that are structural in a display name
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | ',' | '=' | '"') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl FromStr for AssemblyName {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DecodeError::InvalidAssemblyName(s.to_string());
        let mut components = split_components(s).ok_or_else(invalid)?.into_iter();

        let name = match components.next() {
            Some((name, None)) if !name.is_empty() => name,
            _ => return Err(invalid()),
        };

        let mut parsed = AssemblyName::simple(name);
        for (key, value) in components {
            let value = value.ok_or_else(invalid)?;
            if key.is_empty() {
                return Err(invalid());
            }

            match key.to_ascii_lowercase().as_str() {
                "version" => parsed.version = Some(value),
                "culture" => parsed.culture = Some(value),
                "publickeytoken" => parsed.public_key_token = Some(value),
                _ => parsed.attributes.push((key, value)),
            }
        }

        Ok(parsed)
    }
}

impl fmt::Display for AssemblyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&escape(&self.name))?;
        if let Some(version) = &self.version {
            write!(f, ", Version={}", escape(version))?;
        }
        if let Some(culture) = &self.culture {
            write!(f, ", Culture={}", escape(culture))?;
        }
        if let Some(token) = &self.public_key_token {
            write!(f, ", PublicKeyToken={}", escape(token))?;
        }
        for (key, value) in &self.attributes {
            write!(f, ", {}={}", escape(key), escape(value))?;
        }
        Ok(())
    }
}
