//! Identity extraction from mod metadata entries.
//!
//! Three formats are understood:
//! - `META-INF/mods.toml` / `META-INF/neoforge.mods.toml`: read with a lenient line scan for
//!   `modId="..."` and `displayName="..."` rather than a full TOML parse
//! - `fabric.mod.json`: root `id` / `name`
//! - `quilt.mod.json`: `quilt_loader.id` and `quilt_loader.metadata.name`
//!
//! Every reader returns `Result<ModIdentity, MetadataError>`; callers decide what to do with
//! failures. The signal extractor discards them.

use crate::models::{LoaderKind, ModIdentity};
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// Known metadata entry locations inside an archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataFormat {
    ForgeToml,
    NeoForgeToml,
    FabricJson,
    QuiltJson,
}

impl MetadataFormat {
    /// Match an archive entry path against the known metadata locations (exact match).
    pub fn from_entry_path(path: &str) -> Option<Self> {
        match path {
            "META-INF/mods.toml" => Some(Self::ForgeToml),
            "META-INF/neoforge.mods.toml" => Some(Self::NeoForgeToml),
            "fabric.mod.json" => Some(Self::FabricJson),
            "quilt.mod.json" => Some(Self::QuiltJson),
            _ => None,
        }
    }

    pub fn loader(&self) -> LoaderKind {
        match self {
            Self::ForgeToml | Self::NeoForgeToml => LoaderKind::Forge,
            Self::FabricJson => LoaderKind::Fabric,
            Self::QuiltJson => LoaderKind::Quilt,
        }
    }
}

/// Errors that can occur while reading identity metadata
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("No identity fields found in {0:?} metadata")]
    MissingIdentity(MetadataFormat),

    #[error("Descriptor root is not a JSON object")]
    NotAnObject,
}

/// Reads identity fields from metadata text.
///
/// Patterns are compiled once at construction, like the rest of the scanner.
pub struct MetadataReader {
    /// `modId = "..."` on its own line, any case
    toml_mod_id: Regex,
    /// `displayName = "..."` on its own line, any case
    toml_display_name: Regex,
    /// Fallback for descriptors that are not strict JSON; only identity-scoped keys count
    json_id: Regex,
    json_name: Regex,
}

impl MetadataReader {
    pub fn new() -> Self {
        Self {
            toml_mod_id: Regex::new(r#"(?im)^\s*modid\s*=\s*"([^"]*)""#)
                .expect("Invalid modId regex"),
            toml_display_name: Regex::new(r#"(?im)^\s*displayname\s*=\s*"([^"]*)""#)
                .expect("Invalid displayName regex"),
            json_id: Regex::new(r#""id"\s*:\s*"([^"]*)""#).expect("Invalid id regex"),
            json_name: Regex::new(r#""name"\s*:\s*"([^"]*)""#).expect("Invalid name regex"),
        }
    }

    /// Read identity from text in the given format.
    pub fn read(&self, format: MetadataFormat, text: &str) -> Result<ModIdentity, MetadataError> {
        match format {
            MetadataFormat::ForgeToml | MetadataFormat::NeoForgeToml => {
                self.read_mods_toml(text, format)
            }
            MetadataFormat::FabricJson | MetadataFormat::QuiltJson => {
                self.read_descriptor(text, format)
            }
        }
    }

    /// Scan a `mods.toml` manifest for the first `modId` and `displayName` values.
    pub fn read_mods_toml(
        &self,
        text: &str,
        format: MetadataFormat,
    ) -> Result<ModIdentity, MetadataError> {
        let identity = ModIdentity {
            mod_id: first_capture(&self.toml_mod_id, text),
            display_name: first_capture(&self.toml_display_name, text),
        };

        if identity.is_empty() {
            return Err(MetadataError::MissingIdentity(format));
        }
        Ok(identity)
    }

    /// Read a JSON mod descriptor.
    ///
    /// Strict JSON is tried first; descriptors with comments or trailing garbage fall back to
    /// a pattern search for `"id"` and `"name"`. The fallback ignores keys outside the root
    /// object, `quilt_loader`, and their `metadata` objects, so dependency entries never
    /// supply the identity.
    pub fn read_descriptor(
        &self,
        text: &str,
        format: MetadataFormat,
    ) -> Result<ModIdentity, MetadataError> {
        let identity = match serde_json::from_str::<Value>(text) {
            Ok(value) => identity_from_json(&value)?,
            Err(e) => {
                tracing::trace!("Descriptor is not strict JSON ({}), using pattern search", e);
                ModIdentity {
                    mod_id: scoped_capture(&self.json_id, text),
                    display_name: scoped_capture(&self.json_name, text),
                }
            }
        };

        if identity.is_empty() {
            return Err(MetadataError::MissingIdentity(format));
        }
        Ok(identity)
    }
}

impl Default for MetadataReader {
    fn default() -> Self {
        Self::new()
    }
}

fn identity_from_json(value: &Value) -> Result<ModIdentity, MetadataError> {
    let root = value.as_object().ok_or(MetadataError::NotAnObject)?;
    let quilt = root.get("quilt_loader");

    let mod_id =
        string_field(value, &["id"]).or_else(|| quilt.and_then(|q| string_field(q, &["id"])));

    let display_name = string_field(value, &["name"])
        .or_else(|| string_field(value, &["metadata", "name"]))
        .or_else(|| quilt.and_then(|q| string_field(q, &["metadata", "name"])));

    Ok(ModIdentity {
        mod_id,
        display_name,
    })
}

/// Follow `path` through nested objects and return a non-empty string leaf.
fn string_field(value: &Value, path: &[&str]) -> Option<String> {
    let mut current = value;
    for key in path {
        current = current.get(*key)?;
    }
    current
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// First capture whose match sits in an identity-bearing object of a JSON-like descriptor.
fn scoped_capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures_iter(text)
        .filter(|c| {
            c.get(0)
                .is_some_and(|m| in_identity_scope(&enclosing_keys(text, m.start())))
        })
        .find_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn in_identity_scope(path: &[String]) -> bool {
    let path: Vec<&str> = path.iter().map(String::as_str).collect();
    matches!(
        path.as_slice(),
        [""] | ["", "quilt_loader"] | ["", "metadata"] | ["", "quilt_loader", "metadata"]
    )
}

/// Keys of the containers open at `offset`, outermost first.
///
/// The root object has the empty key and arrays are `[]`. Strings and `//` or `/* */` comments
/// are skipped, which is enough for descriptors that are almost JSON.
fn enclosing_keys(text: &str, offset: usize) -> Vec<String> {
    let bytes = text.as_bytes();
    let end = offset.min(bytes.len());
    let mut stack: Vec<String> = Vec::new();
    let mut last_string: Option<String> = None;
    let mut pending_key: Option<String> = None;
    let mut i = 0;

    while i < end {
        match bytes[i] {
            b'"' => {
                let start = i + 1;
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
                last_string = text.get(start..i.min(bytes.len())).map(str::to_string);
            }
            b':' => pending_key = last_string.take(),
            b',' => {
                last_string = None;
                pending_key = None;
            }
            b'{' => stack.push(pending_key.take().unwrap_or_default()),
            b'[' => {
                pending_key = None;
                stack.push("[]".to_string());
            }
            b'}' | b']' => {
                stack.pop();
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < end && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i < end && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    i += 1;
                }
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }

    stack
}

fn first_capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}
