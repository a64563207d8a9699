use super::ConfigSection;
use crate::{ConfigDocumentSet, ConfigError};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const DRIVER_CLASS_NAME_PATH: &str = "spring/datasource/driverClassName";
pub const URL_PATH: &str = "spring/datasource/url";
pub const USERNAME_PATH: &str = "spring/datasource/username";
pub const PASSWORD_PATH: &str = "spring/datasource/password";

const DRIVER_CLASS_NAME_H2: &str = "org.h2.Driver";
const DRIVER_CLASS_NAME_MARIADB: &str = "org.mariadb.jdbc.Driver";

/// Database engines the server can be bootstrapped with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DbmsKind {
    /// Embedded, file based.
    H2,
    /// Client/server.
    MariaDb,
}

impl DbmsKind {
    pub fn driver_class_name(self) -> &'static str {
        match self {
            Self::H2 => DRIVER_CLASS_NAME_H2,
            Self::MariaDb => DRIVER_CLASS_NAME_MARIADB,
        }
    }

    pub fn from_driver_class_name(name: &str) -> Option<Self> {
        match name.trim() {
            DRIVER_CLASS_NAME_H2 => Some(Self::H2),
            DRIVER_CLASS_NAME_MARIADB => Some(Self::MariaDb),
            _ => None,
        }
    }

    pub fn default_url(self) -> &'static str {
        match self {
            Self::H2 => "jdbc:h2:file:~/sapl/db",
            Self::MariaDb => "jdbc:mariadb://127.17.0.2:3306/saplserver",
        }
    }
}

impl fmt::Display for DbmsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::H2 => f.write_str("H2"),
            Self::MariaDb => f.write_str("MariaDB"),
        }
    }
}

impl FromStr for DbmsKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "h2" => Ok(Self::H2),
            "mariadb" => Ok(Self::MariaDb),
            other => Err(format!("unknown database kind '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DbmsConfig {
    dbms: DbmsKind,
    url: String,
    username: String,
    password: String,
    /// The URL was filled in from the engine default, not read or entered.
    url_is_default: bool,
    saved: bool,
}

impl DbmsConfig {
    pub fn load(docs: &ConfigDocumentSet) -> Self {
        let driver = docs
            .get_or(DRIVER_CLASS_NAME_PATH, DRIVER_CLASS_NAME_H2)
            .to_string();
        let dbms = DbmsKind::from_driver_class_name(&driver).unwrap_or_else(|| {
            tracing::warn!(driver = %driver, "Unknown JDBC driver, falling back to H2");
            DbmsKind::H2
        });

        let mut config = Self {
            dbms,
            url: docs.get_or(URL_PATH, "").to_string(),
            username: docs.get_or(USERNAME_PATH, "").to_string(),
            password: docs.get_or(PASSWORD_PATH, "").to_string(),
            url_is_default: false,
            saved: false,
        };
        if config.url.is_empty() {
            config.url = dbms.default_url().to_string();
            config.url_is_default = true;
        }
        config
    }

    pub fn dbms(&self) -> DbmsKind {
        self.dbms
    }

    /// Switches the engine. The URL takes the new engine's default only
    /// when it is empty or was itself filled in from a default. A URL read
    /// from the configuration or entered by the operator is kept.
    pub fn set_dbms(&mut self, dbms: DbmsKind) {
        if self.url.is_empty() || self.url_is_default {
            self.url = dbms.default_url().to_string();
            self.url_is_default = true;
        }
        self.dbms = dbms;
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
        self.url_is_default = false;
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = username.into();
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }
}

impl ConfigSection for DbmsConfig {
    fn name(&self) -> &'static str {
        "database"
    }

    fn is_valid_config(&self) -> bool {
        !self.url.trim().is_empty()
    }

    fn write_to(&self, docs: &mut ConfigDocumentSet) -> Result<(), ConfigError> {
        docs.set_at(DRIVER_CLASS_NAME_PATH, self.dbms.driver_class_name())?;
        docs.set_at(URL_PATH, self.url.as_str())?;
        docs.set_at(USERNAME_PATH, self.username.as_str())?;
        docs.set_at(PASSWORD_PATH, self.password.as_str())
    }

    fn is_saved(&self) -> bool {
        self.saved
    }

    fn set_saved(&mut self, saved: bool) {
        self.saved = saved;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PathDocument;

    fn docs(yaml: &str) -> ConfigDocumentSet {
        ConfigDocumentSet::from_documents(vec![PathDocument::from_yaml_str("application.yml", yaml)])
            .unwrap()
    }

    #[test]
    fn empty_document_gets_h2_defaults() {
        let config = DbmsConfig::load(&docs(""));
        assert_eq!(config.dbms(), DbmsKind::H2);
        assert_eq!(config.url(), "jdbc:h2:file:~/sapl/db");
        assert!(config.is_valid_config());
    }

    #[test]
    fn configured_url_is_kept() {
        let config = DbmsConfig::load(&docs(
            "spring:\n  datasource:\n    driverClassName: org.mariadb.jdbc.Driver\n    url: jdbc:mariadb://db:3306/pdp\n    username: pdp\n",
        ));
        assert_eq!(config.dbms(), DbmsKind::MariaDb);
        assert_eq!(config.url(), "jdbc:mariadb://db:3306/pdp");
        assert_eq!(config.username(), "pdp");
    }

    #[test]
    fn switching_kind_replaces_only_default_url() {
        let mut config = DbmsConfig::load(&docs(""));
        config.set_dbms(DbmsKind::MariaDb);
        assert_eq!(config.url(), DbmsKind::MariaDb.default_url());

        config.set_url("jdbc:mariadb://prod:3306/pdp");
        config.set_dbms(DbmsKind::H2);
        assert_eq!(config.url(), "jdbc:mariadb://prod:3306/pdp");
    }

    #[test]
    fn empty_url_is_defaulted_on_switch() {
        let mut config = DbmsConfig::load(&docs(""));
        config.set_url("");
        assert!(!config.is_valid_config());
        config.set_dbms(DbmsKind::MariaDb);
        assert_eq!(config.url(), DbmsKind::MariaDb.default_url());
    }

    #[test]
    fn configured_url_equal_to_a_default_is_kept() {
        let mut config = DbmsConfig::load(&docs(
            "spring:\n  datasource:\n    driverClassName: org.h2.Driver\n    url: jdbc:h2:file:~/sapl/db\n",
        ));
        config.set_dbms(DbmsKind::MariaDb);
        assert_eq!(config.dbms(), DbmsKind::MariaDb);
        assert_eq!(config.url(), "jdbc:h2:file:~/sapl/db");
    }

    #[test]
    fn unknown_driver_falls_back_to_h2() {
        let config = DbmsConfig::load(&docs(
            "spring:\n  datasource:\n    driverClassName: org.postgresql.Driver\n",
        ));
        assert_eq!(config.dbms(), DbmsKind::H2);
    }
}
