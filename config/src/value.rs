use serde_yaml::Value as Yaml;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Children of a mapping node, keyed by path segment.
pub type ConfigMap = BTreeMap<MapKey, Node>;

/// A mapping key as a path segment.
///
/// Keys that were not YAML strings (`404`, `true`) keep their original value
/// so a rewrite emits them unquoted. Equality and order use the segment text
/// only.
#[derive(Debug, Clone)]
pub struct MapKey {
    text: String,
    raw: Option<Yaml>,
}

impl MapKey {
    pub fn from_yaml(key: Yaml) -> Self {
        match key {
            Yaml::String(text) => Self { text, raw: None },
            other => Self {
                text: non_string_key_text(&other),
                raw: Some(other),
            },
        }
    }

    pub fn to_yaml(&self) -> Yaml {
        self.raw
            .clone()
            .unwrap_or_else(|| Yaml::String(self.text.clone()))
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl From<&str> for MapKey {
    fn from(text: &str) -> Self {
        Self {
            text: text.to_string(),
            raw: None,
        }
    }
}

impl PartialEq for MapKey {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for MapKey {}

impl PartialOrd for MapKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MapKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.text.cmp(&other.text)
    }
}

impl Borrow<str> for MapKey {
    fn borrow(&self) -> &str {
        &self.text
    }
}

/// A node in a configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Leaf(ConfigValue),
    Map(ConfigMap),
}

/// A terminal configuration value.
///
/// `Opaque` keeps YAML the setup engine does not interpret (sequences of
/// mappings, tagged values, out-of-range integers) so a rewrite reproduces it.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<String>),
    Opaque(Yaml),
}

impl Node {
    pub fn from_yaml(value: Yaml) -> Self {
        match value {
            Yaml::Mapping(mapping) => Self::Map(map_from_yaml(mapping)),
            other => Self::Leaf(ConfigValue::from_yaml(other)),
        }
    }

    pub fn to_yaml(&self) -> Yaml {
        match self {
            Self::Leaf(value) => value.to_yaml(),
            Self::Map(map) => map_to_yaml(map),
        }
    }
}

pub(crate) fn map_from_yaml(mapping: serde_yaml::Mapping) -> ConfigMap {
    mapping
        .into_iter()
        .map(|(key, value)| (MapKey::from_yaml(key), Node::from_yaml(value)))
        .collect()
}

pub(crate) fn map_to_yaml(map: &ConfigMap) -> Yaml {
    let mapping = map
        .iter()
        .map(|(key, node)| (key.to_yaml(), node.to_yaml()))
        .collect();
    Yaml::Mapping(mapping)
}

fn non_string_key_text(key: &Yaml) -> String {
    match key {
        Yaml::Number(n) => n.to_string(),
        Yaml::Bool(b) => b.to_string(),
        Yaml::Null => "~".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

impl ConfigValue {
    pub fn from_yaml(value: Yaml) -> Self {
        match value {
            Yaml::Null => Self::Null,
            Yaml::Bool(b) => Self::Bool(b),
            Yaml::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Integer(i)
                } else if n.is_f64() {
                    n.as_f64().map_or(Self::Opaque(Yaml::Number(n)), Self::Float)
                } else {
                    Self::Opaque(Yaml::Number(n))
                }
            }
            Yaml::String(s) => Self::String(s),
            Yaml::Sequence(items) => {
                if items.iter().all(Yaml::is_string) {
                    Self::List(
                        items
                            .into_iter()
                            .filter_map(|item| item.as_str().map(str::to_string))
                            .collect(),
                    )
                } else {
                    Self::Opaque(Yaml::Sequence(items))
                }
            }
            other => Self::Opaque(other),
        }
    }

    pub fn to_yaml(&self) -> Yaml {
        match self {
            Self::Null => Yaml::Null,
            Self::Bool(b) => Yaml::Bool(*b),
            Self::Integer(i) => Yaml::Number((*i).into()),
            Self::Float(f) => Yaml::Number((*f).into()),
            Self::String(s) => Yaml::String(s.clone()),
            Self::List(items) => Yaml::Sequence(items.iter().cloned().map(Yaml::String).collect()),
            Self::Opaque(raw) => raw.clone(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Booleans, or the strings `true`/`false` in any case.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Integers, or strings holding a decimal integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// String lists, or a single comma separated string.
    pub fn as_list(&self) -> Option<Vec<String>> {
        match self {
            Self::List(items) => Some(items.clone()),
            Self::String(s) => Some(
                s.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
            Self::List(items) => f.write_str(&items.join(",")),
            Self::Opaque(raw) => {
                let rendered = serde_yaml::to_string(raw).map_err(|_| fmt::Error)?;
                f.write_str(rendered.trim_end())
            }
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u16> for ConfigValue {
    fn from(value: u16) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for ConfigValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Vec<String>> for ConfigValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<Vec<&str>> for ConfigValue {
    fn from(value: Vec<&str>) -> Self {
        Self::List(value.into_iter().map(str::to_string).collect())
    }
}
