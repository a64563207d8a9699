use crate::document::PathDocument;
use crate::value::ConfigValue;
use crate::ConfigError;
use std::path::PathBuf;

/// Ordered configuration documents. The first document is the primary
/// write target for paths no document defines yet.
#[derive(Debug, Clone)]
pub struct ConfigDocumentSet {
    documents: Vec<PathDocument>,
}

impl ConfigDocumentSet {
    pub fn from_sources<I, P>(sources: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::from_documents(sources.into_iter().map(PathDocument::load).collect())
    }

    pub fn from_documents(documents: Vec<PathDocument>) -> Result<Self, ConfigError> {
        if documents.is_empty() {
            return Err(ConfigError::NoSources);
        }
        tracing::debug!(count = documents.len(), "Loaded config documents");
        Ok(Self { documents })
    }

    pub fn documents(&self) -> &[PathDocument] {
        &self.documents
    }

    pub fn primary(&self) -> &PathDocument {
        &self.documents[0]
    }

    /// Value from the first document defining `path`.
    pub fn get_at(&self, path: &str) -> Option<&ConfigValue> {
        self.documents
            .iter()
            .find(|doc| doc.exists_at(path))
            .and_then(|doc| doc.get_at(path))
    }

    /// Like [`ConfigDocumentSet::get_at`], with `default` standing in for
    /// absent and null values.
    pub fn get_or(&self, path: &str, default: impl Into<ConfigValue>) -> ConfigValue {
        match self.get_at(path) {
            Some(value) if !value.is_null() => value.clone(),
            _ => default.into(),
        }
    }

    /// Updates `path` in the document that already defines it, or in the
    /// primary document when none does.
    pub fn set_at(&mut self, path: &str, value: impl Into<ConfigValue>) -> Result<(), ConfigError> {
        let index = self
            .documents
            .iter()
            .position(|doc| doc.exists_at(path))
            .unwrap_or(0);
        self.documents[index].set_at(path, value)
    }

    /// Persists every dirty document.
    ///
    /// A failing document does not stop the others; all failures are
    /// reported together. Returns how many files were written.
    pub fn persist_all(&mut self) -> Result<usize, ConfigError> {
        let mut written = 0;
        let mut failures = Vec::new();

        for doc in &mut self.documents {
            match doc.persist() {
                Ok(true) => written += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(path = %doc.source().display(), error = %e, "Failed to persist config file");
                    failures.push(e);
                }
            }
        }

        if failures.is_empty() {
            Ok(written)
        } else {
            Err(ConfigError::PersistFailed(failures))
        }
    }
}
