use super::ConfigSection;
use crate::{ConfigDocumentSet, ConfigError};

pub const BASIC_AUTH_PATH: &str = "io.sapl/server/allowBasicAuth";
pub const API_KEY_AUTH_PATH: &str = "io.sapl/server/allowApiKeyAuth";
pub const API_KEY_HEADER_NAME_PATH: &str = "io.sapl/server/apiKeyHeaderName";
pub const API_KEY_CACHING_ENABLED_PATH: &str = "io.sapl/server/apiKeyCaching/enabled";
pub const API_KEY_CACHING_EXPIRE_PATH: &str = "io.sapl/server/apiKeyCaching/expire";
pub const API_KEY_CACHING_MAX_SIZE_PATH: &str = "io.sapl/server/apiKeyCaching/maxSize";

const DEFAULT_CACHING_EXPIRE_SECS: i64 = 300;
const DEFAULT_CACHING_MAX_SIZE: i64 = 10_000;

/// How clients authenticate against the PDP API.
#[derive(Debug, Clone)]
pub struct ApiAuthenticationConfig {
    basic_auth_enabled: bool,
    api_key_auth_enabled: bool,
    api_key_header_name: String,
    api_key_caching_enabled: bool,
    api_key_caching_expire_secs: i64,
    api_key_caching_max_size: i64,
    saved: bool,
}

impl Default for ApiAuthenticationConfig {
    fn default() -> Self {
        Self {
            basic_auth_enabled: false,
            api_key_auth_enabled: false,
            api_key_header_name: String::new(),
            api_key_caching_enabled: false,
            api_key_caching_expire_secs: DEFAULT_CACHING_EXPIRE_SECS,
            api_key_caching_max_size: DEFAULT_CACHING_MAX_SIZE,
            saved: false,
        }
    }
}

impl ApiAuthenticationConfig {
    pub fn load(docs: &ConfigDocumentSet) -> Self {
        let defaults = Self::default();
        let flag = |path: &str| docs.get_or(path, false).as_bool().unwrap_or(false);
        let number = |path: &str, default: i64| docs.get_or(path, default).as_i64().unwrap_or(default);

        Self {
            basic_auth_enabled: flag(BASIC_AUTH_PATH),
            api_key_auth_enabled: flag(API_KEY_AUTH_PATH),
            api_key_header_name: docs.get_or(API_KEY_HEADER_NAME_PATH, "").to_string(),
            api_key_caching_enabled: flag(API_KEY_CACHING_ENABLED_PATH),
            api_key_caching_expire_secs: number(
                API_KEY_CACHING_EXPIRE_PATH,
                defaults.api_key_caching_expire_secs,
            ),
            api_key_caching_max_size: number(
                API_KEY_CACHING_MAX_SIZE_PATH,
                defaults.api_key_caching_max_size,
            ),
            saved: false,
        }
    }

    pub fn basic_auth_enabled(&self) -> bool {
        self.basic_auth_enabled
    }

    pub fn set_basic_auth_enabled(&mut self, enabled: bool) {
        self.basic_auth_enabled = enabled;
    }

    pub fn api_key_auth_enabled(&self) -> bool {
        self.api_key_auth_enabled
    }

    pub fn set_api_key_auth_enabled(&mut self, enabled: bool) {
        self.api_key_auth_enabled = enabled;
    }

    pub fn api_key_header_name(&self) -> &str {
        &self.api_key_header_name
    }

    pub fn set_api_key_header_name(&mut self, name: impl Into<String>) {
        self.api_key_header_name = name.into();
    }

    pub fn api_key_caching_enabled(&self) -> bool {
        self.api_key_caching_enabled
    }

    pub fn set_api_key_caching_enabled(&mut self, enabled: bool) {
        self.api_key_caching_enabled = enabled;
    }

    pub fn api_key_caching_expire_secs(&self) -> i64 {
        self.api_key_caching_expire_secs
    }

    pub fn set_api_key_caching_expire_secs(&mut self, secs: i64) {
        self.api_key_caching_expire_secs = secs;
    }

    pub fn api_key_caching_max_size(&self) -> i64 {
        self.api_key_caching_max_size
    }

    pub fn set_api_key_caching_max_size(&mut self, size: i64) {
        self.api_key_caching_max_size = size;
    }
}

impl ConfigSection for ApiAuthenticationConfig {
    fn name(&self) -> &'static str {
        "API authentication"
    }

    fn is_valid_config(&self) -> bool {
        if !self.api_key_auth_enabled {
            return true;
        }
        !self.api_key_header_name.is_empty()
            && (!self.api_key_caching_enabled
                || (self.api_key_caching_expire_secs > 0 && self.api_key_caching_max_size > 0))
    }

    fn write_to(&self, docs: &mut ConfigDocumentSet) -> Result<(), ConfigError> {
        docs.set_at(BASIC_AUTH_PATH, self.basic_auth_enabled)?;
        docs.set_at(API_KEY_AUTH_PATH, self.api_key_auth_enabled)?;
        docs.set_at(API_KEY_HEADER_NAME_PATH, self.api_key_header_name.as_str())?;
        docs.set_at(API_KEY_CACHING_ENABLED_PATH, self.api_key_caching_enabled)?;
        docs.set_at(API_KEY_CACHING_EXPIRE_PATH, self.api_key_caching_expire_secs)?;
        docs.set_at(API_KEY_CACHING_MAX_SIZE_PATH, self.api_key_caching_max_size)
    }

    fn is_saved(&self) -> bool {
        self.saved
    }

    fn set_saved(&mut self, saved: bool) {
        self.saved = saved;
    }
}
