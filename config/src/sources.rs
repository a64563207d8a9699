use std::path::PathBuf;

/// Environment variable holding comma separated config locations.
pub const CONFIG_ENV: &str = "PDP_SETUP_CONFIG";

/// Source used when no location is configured, relative to the base directory.
pub const DEFAULT_SOURCE: &str = "config/application.yml";

const DEFAULT_FILE_NAME: &str = "application.yml";

/// Builds the ordered list of file-backed configuration sources.
///
/// Explicit locations come first, then those from [`CONFIG_ENV`]. Spring
/// style prefixes are understood: `classpath:` entries are skipped since
/// they cannot be written, `optional:` and `file:` are stripped. A location
/// ending in `/` names a directory holding `application.yml`.
#[derive(Debug, Clone)]
pub struct SourceDiscovery {
    base_dir: PathBuf,
    explicit: Vec<String>,
    read_env: bool,
}

impl Default for SourceDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceDiscovery {
    pub fn new() -> Self {
        Self {
            base_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            explicit: Vec::new(),
            read_env: true,
        }
    }

    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.explicit.push(location.into());
        self
    }

    pub fn without_env(mut self) -> Self {
        self.read_env = false;
        self
    }

    pub fn discover(&self) -> Vec<PathBuf> {
        let mut raw: Vec<String> = self.explicit.clone();
        if self.read_env {
            if let Ok(value) = std::env::var(CONFIG_ENV) {
                raw.extend(value.split(',').map(str::to_string));
            }
        }

        let mut sources: Vec<PathBuf> = Vec::new();
        for location in &raw {
            if let Some(path) = self.resolve(location) {
                if !sources.contains(&path) {
                    sources.push(path);
                }
            }
        }

        if sources.is_empty() {
            let fallback = self.base_dir.join(DEFAULT_SOURCE);
            tracing::debug!(path = %fallback.display(), "No config locations given, using default");
            sources.push(fallback);
        }
        sources
    }

    fn resolve(&self, location: &str) -> Option<PathBuf> {
        let location = location.trim();
        let location = location.strip_prefix("optional:").unwrap_or(location);
        if location.is_empty() {
            return None;
        }
        if location.starts_with("classpath:") {
            tracing::debug!(location, "Skipping classpath config location");
            return None;
        }
        let location = location.strip_prefix("file:").unwrap_or(location);

        let expanded = shellexpand::tilde(location);
        let mut path = PathBuf::from(expanded.as_ref());
        if location.ends_with('/') {
            path.push(DEFAULT_FILE_NAME);
        }
        if path.is_relative() {
            path = self.base_dir.join(path);
        }
        Some(path)
    }
}
