use crate::value::{map_from_yaml, map_to_yaml, ConfigMap, ConfigValue, MapKey, Node};
use crate::ConfigError;
use serde::Deserialize;
use serde_yaml::Value as Yaml;
use std::path::{Path, PathBuf};

/// One YAML configuration file held in memory and addressed by
/// `/`-separated paths such as `server/ssl/enabled`.
///
/// Paths address the first YAML document of the file. Further documents
/// (`---` separated profile sections) are kept as read and written back
/// after it.
#[derive(Debug, Clone)]
pub struct PathDocument {
    source: PathBuf,
    root: ConfigMap,
    trailing: Vec<Yaml>,
    dirty: bool,
}

/// Every document in `content`, stopping at the first parse error.
fn parse_documents(content: &str) -> Result<Vec<Yaml>, serde_yaml::Error> {
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(content) {
        documents.push(Yaml::deserialize(document)?);
    }
    Ok(documents)
}

impl PathDocument {
    /// Loads `source`, falling back to an empty document when the file is
    /// missing, unreadable or not a YAML mapping.
    pub fn load(source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        if !source.exists() {
            tracing::info!(
                path = %source.display(),
                "Config file does not exist, it will be created on save"
            );
            return Self::empty(source);
        }

        match std::fs::read_to_string(&source) {
            Ok(content) => Self::from_yaml_str(source, &content),
            Err(e) => {
                let err = ConfigError::ReadSource {
                    path: source.clone(),
                    source: e,
                };
                tracing::warn!(error = %err, "Starting from an empty config document");
                Self::empty(source)
            }
        }
    }

    /// Builds a document bound to `source` from YAML text, with the same
    /// recovery rules as [`PathDocument::load`].
    pub fn from_yaml_str(source: impl Into<PathBuf>, content: &str) -> Self {
        let source = source.into();
        let mut documents = match parse_documents(content) {
            Ok(documents) => documents.into_iter(),
            Err(e) => {
                let err = ConfigError::ParseSource {
                    path: source.clone(),
                    source: e,
                };
                tracing::warn!(
                    error = %err,
                    "Invalid config file, a new empty document will replace it"
                );
                return Self::empty(source);
            }
        };

        let root = match documents.next() {
            Some(Yaml::Mapping(mapping)) => map_from_yaml(mapping),
            None | Some(Yaml::Null) => ConfigMap::new(),
            Some(_) => {
                tracing::warn!(
                    path = %source.display(),
                    "Config file is not a YAML mapping, a new empty document will replace it"
                );
                return Self::empty(source);
            }
        };
        let trailing: Vec<Yaml> = documents.filter(|doc| !doc.is_null()).collect();
        if !trailing.is_empty() {
            tracing::debug!(
                path = %source.display(),
                count = trailing.len(),
                "Keeping additional YAML documents unchanged"
            );
        }

        Self {
            source,
            root,
            trailing,
            dirty: false,
        }
    }

    pub fn empty(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            root: ConfigMap::new(),
            trailing: Vec::new(),
            dirty: false,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Documents after the first one, which paths never address.
    pub fn trailing_documents(&self) -> &[Yaml] {
        &self.trailing
    }

    /// Returns the first leaf met while walking `path`.
    ///
    /// Remaining segments after a leaf are ignored. A missing segment, or a
    /// path that ends on a mapping, yields `None`.
    pub fn get_at(&self, path: &str) -> Option<&ConfigValue> {
        let mut current = &self.root;
        for key in path.split('/') {
            match current.get(key)? {
                Node::Map(child) => current = child,
                Node::Leaf(value) => return Some(value),
            }
        }
        None
    }

    /// Same walk as [`PathDocument::get_at`].
    pub fn exists_at(&self, path: &str) -> bool {
        self.get_at(path).is_some()
    }

    /// Stores `value` at `path`, creating intermediate mappings.
    ///
    /// The document only becomes dirty when the stored value differs from
    /// the current one. Paths that would replace a mapping with a leaf, or
    /// descend through an existing leaf, are rejected without modification.
    pub fn set_at(&mut self, path: &str, value: impl Into<ConfigValue>) -> Result<(), ConfigError> {
        let value = value.into();
        let segments: Vec<&str> = path.split('/').collect();
        let Some((last, parents)) = segments.split_last().filter(|_| !path.is_empty()) else {
            return Err(ConfigError::EmptyPath);
        };

        self.check_conflict(path, &segments)?;
        let changed = self.get_at(path) != Some(&value);

        let mut current = &mut self.root;
        for (depth, key) in parents.iter().enumerate() {
            current = match current
                .entry(MapKey::from(*key))
                .or_insert_with(|| Node::Map(ConfigMap::new()))
            {
                Node::Map(child) => child,
                Node::Leaf(_) => {
                    return Err(ConfigError::PathConflict {
                        path: path.to_string(),
                        at: segments[..=depth].join("/"),
                    })
                }
            };
        }
        current.insert(MapKey::from(*last), Node::Leaf(value));

        if changed {
            self.dirty = true;
        }
        Ok(())
    }

    fn check_conflict(&self, path: &str, segments: &[&str]) -> Result<(), ConfigError> {
        let conflict = |depth: usize| ConfigError::PathConflict {
            path: path.to_string(),
            at: segments[..=depth].join("/"),
        };

        let mut current = &self.root;
        for (depth, key) in segments.iter().enumerate() {
            let is_last = depth + 1 == segments.len();
            match current.get(*key) {
                None => return Ok(()),
                Some(Node::Map(_)) if is_last => return Err(conflict(depth)),
                Some(Node::Map(child)) => current = child,
                Some(Node::Leaf(_)) if is_last => return Ok(()),
                Some(Node::Leaf(_)) => return Err(conflict(depth)),
            }
        }
        Ok(())
    }

    /// The whole file: the edited first document, then every trailing
    /// document after a `---` separator.
    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        let mut rendered = serde_yaml::to_string(&map_to_yaml(&self.root))?;
        for document in &self.trailing {
            rendered.push_str("---\n");
            rendered.push_str(&serde_yaml::to_string(document)?);
        }
        Ok(rendered)
    }

    /// Writes the whole document back to its file when dirty.
    ///
    /// Returns whether a write happened.
    pub fn persist(&mut self) -> Result<bool, ConfigError> {
        if !self.dirty {
            tracing::debug!(path = %self.source.display(), "Config file unchanged, skipping write");
            return Ok(false);
        }

        if let Some(parent) = self.source.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteSource {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
                tracing::info!(path = %parent.display(), "Created config directory");
            }
        }

        let created = !self.source.exists();
        let content = self.to_yaml_string()?;
        std::fs::write(&self.source, content).map_err(|e| ConfigError::WriteSource {
            path: self.source.clone(),
            source: e,
        })?;
        if created {
            tracing::info!(path = %self.source.display(), "Created config file");
        }

        self.dirty = false;
        tracing::info!(path = %self.source.display(), "Persisted config file");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(yaml: &str) -> PathDocument {
        PathDocument::from_yaml_str("application.yml", yaml)
    }

    #[test]
    fn get_at_walks_nested_mappings() {
        let d = doc("server:\n  ssl:\n    enabled: true\n  port: 8443\n");
        assert_eq!(d.get_at("server/ssl/enabled"), Some(&ConfigValue::Bool(true)));
        assert_eq!(d.get_at("server/port"), Some(&ConfigValue::Integer(8443)));
        assert_eq!(d.get_at("server/address"), None);
    }

    #[test]
    fn get_at_stops_at_first_leaf() {
        let d = doc("server:\n  port: 8443\n");
        assert_eq!(
            d.get_at("server/port/extra/segments"),
            Some(&ConfigValue::Integer(8443))
        );
        assert!(d.exists_at("server/port/extra"));
    }

    #[test]
    fn path_ending_on_mapping_is_not_found() {
        let d = doc("server:\n  ssl:\n    enabled: true\n");
        assert_eq!(d.get_at("server/ssl"), None);
        assert!(!d.exists_at("server"));
    }

    #[test]
    fn dotted_keys_are_single_segments() {
        let d = doc("io.sapl:\n  server:\n    allowApiKeyAuth: true\n");
        assert!(d.exists_at("io.sapl/server/allowApiKeyAuth"));
        assert!(!d.exists_at("io/sapl/server/allowApiKeyAuth"));
    }

    #[test]
    fn set_at_creates_intermediate_mappings() {
        let mut d = PathDocument::empty("application.yml");
        d.set_at("spring/rsocket/server/port", 7000_i64).unwrap();
        assert!(d.is_dirty());
        assert_eq!(
            d.get_at("spring/rsocket/server/port"),
            Some(&ConfigValue::Integer(7000))
        );
    }

    #[test]
    fn setting_the_same_value_keeps_document_clean() {
        let mut d = doc("server:\n  address: localhost\n");
        d.set_at("server/address", "localhost").unwrap();
        assert!(!d.is_dirty());
        d.set_at("server/address", "127.0.0.1").unwrap();
        assert!(d.is_dirty());
    }

    #[test]
    fn type_change_marks_dirty() {
        let mut d = doc("server:\n  port: 8443\n");
        d.set_at("server/port", "8443").unwrap();
        assert!(d.is_dirty());
    }

    #[test]
    fn replacing_a_mapping_is_rejected() {
        let mut d = doc("server:\n  ssl:\n    enabled: true\n");
        let err = d.set_at("server/ssl", "off").unwrap_err();
        assert!(matches!(err, ConfigError::PathConflict { ref at, .. } if at == "server/ssl"));
        assert!(!d.is_dirty());
        assert!(d.exists_at("server/ssl/enabled"));
    }

    #[test]
    fn descending_through_a_leaf_is_rejected() {
        let mut d = doc("server:\n  port: 8443\n");
        let err = d.set_at("server/port/value", 1_i64).unwrap_err();
        assert!(matches!(err, ConfigError::PathConflict { ref at, .. } if at == "server/port"));
        assert_eq!(d.get_at("server/port"), Some(&ConfigValue::Integer(8443)));
    }

    #[test]
    fn empty_path_is_rejected() {
        let mut d = PathDocument::empty("application.yml");
        assert!(matches!(d.set_at("", "x"), Err(ConfigError::EmptyPath)));
    }

    #[test]
    fn malformed_yaml_recovers_as_empty() {
        let d = doc("server: [unclosed\n  port: : :\n");
        assert!(!d.exists_at("server"));
        assert!(!d.is_dirty());
    }

    #[test]
    fn scalar_root_recovers_as_empty() {
        let d = doc("just a string\n");
        assert!(!d.exists_at("just a string"));
    }

    #[test]
    fn profile_documents_are_kept_behind_the_first() {
        let mut d = doc("server:\n  address: 0.0.0.0\n---\nspring:\n  config:\n    activate:\n      on-profile: prod\nserver:\n  port: 443\n");
        assert_eq!(d.get_at("server/address"), Some(&ConfigValue::from("0.0.0.0")));
        assert_eq!(d.get_at("server/port"), None);
        assert_eq!(d.trailing_documents().len(), 1);

        d.set_at("server/port", 8443_i64).unwrap();
        let rendered = d.to_yaml_string().unwrap();
        let reparsed = doc(&rendered);
        assert_eq!(reparsed.get_at("server/port"), Some(&ConfigValue::Integer(8443)));
        assert_eq!(reparsed.get_at("server/address"), Some(&ConfigValue::from("0.0.0.0")));
        assert_eq!(reparsed.trailing_documents(), d.trailing_documents());
    }

    #[test]
    fn empty_trailing_document_is_dropped() {
        let d = doc("server:\n  port: 1\n---\n");
        assert!(d.trailing_documents().is_empty());
    }

    #[test]
    fn non_string_keys_keep_their_type() {
        let mut d = doc("errors:\n  404: missing\nflags:\n  true: yes\n");
        assert_eq!(d.get_at("errors/404"), Some(&ConfigValue::from("missing")));
        d.set_at("errors/404", "gone").unwrap();
        let rendered = d.to_yaml_string().unwrap();
        assert!(rendered.contains("404: gone"), "{rendered}");
        assert!(rendered.contains("true: yes"), "{rendered}");
        assert!(!rendered.contains("'404'"), "{rendered}");
    }

    #[test]
    fn unrelated_content_survives_serialization() {
        let d = doc("mounts:\n  - path: /\n    provider: memfs\nserver:\n  port: 1\n");
        let rendered = d.to_yaml_string().unwrap();
        let reparsed = doc(&rendered);
        assert!(matches!(reparsed.get_at("mounts"), Some(ConfigValue::Opaque(_))));
        assert_eq!(reparsed.get_at("server/port"), Some(&ConfigValue::Integer(1)));
    }
}
