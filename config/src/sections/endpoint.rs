use super::ConfigSection;
use crate::keystore::{self, KeystoreError, KEY_STORE_TYPE_PKCS12};
use crate::tls::{self, CipherSuite, TlsProtocol};
use crate::value::ConfigValue;
use crate::{ConfigDocumentSet, ConfigError};
use serde::Serialize;
use std::collections::BTreeSet;
use std::net::{Ipv4Addr, Ipv6Addr};

pub const DEFAULT_KEY_STORE: &str = "file:config/keystore.p12";

/// The network endpoints the PDP server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EndpointKind {
    Http,
    Rsocket,
}

impl EndpointKind {
    pub fn path_prefix(self) -> &'static str {
        match self {
            Self::Http => "server",
            Self::Rsocket => "spring/rsocket/server",
        }
    }

    pub fn default_port(self) -> u32 {
        match self {
            Self::Http => 8443,
            Self::Rsocket => 7000,
        }
    }

    /// Fixed transport written next to the port, if the endpoint has one.
    pub fn transport(self) -> Option<&'static str> {
        match self {
            Self::Http => None,
            Self::Rsocket => Some("tcp"),
        }
    }

    /// Environment variable that may override the persisted port.
    pub fn port_placeholder(self) -> &'static str {
        match self {
            Self::Http => "PORT",
            Self::Rsocket => "RSOCKET_PORT",
        }
    }

    fn section_name(self) -> &'static str {
        match self {
            Self::Http => "HTTP endpoint",
            Self::Rsocket => "RSocket endpoint",
        }
    }
}

/// `localhost`, an IPv4 literal, or an IPv6 literal in brackets.
pub fn is_valid_address(address: &str) -> bool {
    if address == "localhost" || address.parse::<Ipv4Addr>().is_ok() {
        return true;
    }
    address
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .is_some_and(|inner| inner.parse::<Ipv6Addr>().is_ok())
}

pub fn is_valid_port(port: u32) -> bool {
    (1..65535).contains(&port)
}

/// Reads a port from an integer, a numeric string, or a `${NAME:1234}`
/// placeholder. Zero and unparsable values yield `None`.
fn parse_port(value: &ConfigValue) -> Option<u32> {
    let port = match value {
        ConfigValue::Integer(i) => u32::try_from(*i).ok(),
        ConfigValue::String(s) => {
            let s = s.trim();
            s.parse().ok().or_else(|| {
                s.strip_prefix("${")
                    .and_then(|rest| rest.strip_suffix('}'))
                    .and_then(|inner| inner.split_once(':'))
                    .and_then(|(_, default)| default.trim().parse().ok())
            })
        }
        _ => None,
    }?;
    (port > 0).then_some(port)
}

fn replace_keystore_field(field: &mut String, value: String, valid_keystore_config: &mut bool) {
    if *field != value {
        *field = value;
        *valid_keystore_config = false;
    }
}

/// Address, port and TLS settings of one endpoint.
///
/// `valid_keystore_config` records the outcome of the last
/// [`EndpointConfig::test_keystore`] call and is cleared by every change to
/// the keystore type, path, passwords or alias.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    kind: EndpointKind,
    address: String,
    port: u32,
    enabled_protocols: BTreeSet<TlsProtocol>,
    key_store_type: String,
    key_store: String,
    key_store_password: String,
    key_password: String,
    key_alias: String,
    ciphers: BTreeSet<CipherSuite>,
    valid_keystore_config: bool,
    saved: bool,
}

impl EndpointConfig {
    pub fn new(kind: EndpointKind) -> Self {
        Self {
            kind,
            address: "localhost".to_string(),
            port: kind.default_port(),
            enabled_protocols: BTreeSet::new(),
            key_store_type: KEY_STORE_TYPE_PKCS12.to_string(),
            key_store: DEFAULT_KEY_STORE.to_string(),
            key_store_password: String::new(),
            key_password: String::new(),
            key_alias: String::new(),
            ciphers: CipherSuite::defaults(),
            valid_keystore_config: false,
            saved: false,
        }
    }

    pub fn load(kind: EndpointKind, docs: &ConfigDocumentSet) -> Self {
        let mut config = Self::new(kind);
        let path = |suffix: &str| config.path(suffix);
        let (address_path, port_path, ssl_enabled_path) =
            (path("address"), path("port"), path("ssl/enabled"));

        config.address = docs.get_or(&address_path, "localhost").to_string();
        if let Some(port) = docs.get_at(&port_path).and_then(parse_port) {
            config.port = port;
        }

        let tls_enabled = docs
            .get_or(&ssl_enabled_path, false)
            .as_bool()
            .unwrap_or(false);
        if tls_enabled {
            config.load_tls(docs);
        }
        config
    }

    fn load_tls(&mut self, docs: &ConfigDocumentSet) {
        let string = |suffix: &str, default: &str| docs.get_or(&self.path(suffix), default).to_string();

        let protocols: BTreeSet<TlsProtocol> = docs
            .get_at(&self.path("ssl/enabled-protocols"))
            .and_then(ConfigValue::as_list)
            .unwrap_or_default()
            .iter()
            .flat_map(|entry| tls::parse_protocols(entry))
            .collect();
        let key_store_type = string("ssl/key-store-type", "");
        let key_store = string("ssl/key-store", DEFAULT_KEY_STORE);
        let key_password = string("ssl/key-password", "");
        let key_store_password = string("ssl/key-store-password", "");
        let key_alias = string("ssl/key-alias", "");
        let ciphers = docs
            .get_at(&self.path("ssl/ciphers"))
            .and_then(ConfigValue::as_list)
            .map(tls::parse_cipher_suites);

        if protocols.is_empty() {
            self.set_tls_enabled(true);
        } else {
            self.enabled_protocols = protocols;
        }
        self.set_key_store_type(key_store_type);
        self.set_key_store(key_store);
        self.set_key_password(key_password);
        self.set_key_store_password(key_store_password);
        self.set_key_alias(key_alias);
        if let Some(ciphers) = ciphers {
            self.ciphers = ciphers;
        }
    }

    fn path(&self, suffix: &str) -> String {
        format!("{}/{}", self.kind.path_prefix(), suffix)
    }

    pub fn kind(&self) -> EndpointKind {
        self.kind
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn set_address(&mut self, address: impl Into<String>) {
        self.address = address.into();
    }

    pub fn port(&self) -> u32 {
        self.port
    }

    pub fn set_port(&mut self, port: u32) {
        self.port = port;
    }

    pub fn tls_enabled(&self) -> bool {
        !self.enabled_protocols.is_empty()
    }

    /// Disabling clears the protocol set; enabling with nothing selected
    /// selects TLS 1.3.
    pub fn set_tls_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.enabled_protocols.clear();
        } else if self.enabled_protocols.is_empty() {
            self.enabled_protocols.insert(TlsProtocol::Tls13);
        }
    }

    pub fn enabled_protocols(&self) -> &BTreeSet<TlsProtocol> {
        &self.enabled_protocols
    }

    pub fn set_enabled_protocols(&mut self, protocols: impl IntoIterator<Item = TlsProtocol>) {
        self.enabled_protocols = protocols.into_iter().collect();
    }

    pub fn primary_protocol(&self) -> Option<TlsProtocol> {
        tls::primary_protocol(&self.enabled_protocols)
    }

    pub fn key_store_type(&self) -> &str {
        &self.key_store_type
    }

    /// An empty type means PKCS12.
    pub fn set_key_store_type(&mut self, key_store_type: impl Into<String>) {
        let mut key_store_type = key_store_type.into();
        if key_store_type.is_empty() {
            key_store_type = KEY_STORE_TYPE_PKCS12.to_string();
        }
        replace_keystore_field(
            &mut self.key_store_type,
            key_store_type,
            &mut self.valid_keystore_config,
        );
    }

    pub fn key_store(&self) -> &str {
        &self.key_store
    }

    pub fn set_key_store(&mut self, key_store: impl Into<String>) {
        replace_keystore_field(
            &mut self.key_store,
            key_store.into(),
            &mut self.valid_keystore_config,
        );
    }

    pub fn key_store_password(&self) -> &str {
        &self.key_store_password
    }

    pub fn set_key_store_password(&mut self, password: impl Into<String>) {
        replace_keystore_field(
            &mut self.key_store_password,
            password.into(),
            &mut self.valid_keystore_config,
        );
    }

    pub fn key_password(&self) -> &str {
        &self.key_password
    }

    pub fn set_key_password(&mut self, password: impl Into<String>) {
        replace_keystore_field(
            &mut self.key_password,
            password.into(),
            &mut self.valid_keystore_config,
        );
    }

    pub fn key_alias(&self) -> &str {
        &self.key_alias
    }

    pub fn set_key_alias(&mut self, alias: impl Into<String>) {
        replace_keystore_field(
            &mut self.key_alias,
            alias.into(),
            &mut self.valid_keystore_config,
        );
    }

    pub fn ciphers(&self) -> &BTreeSet<CipherSuite> {
        &self.ciphers
    }

    pub fn set_ciphers(&mut self, ciphers: impl IntoIterator<Item = CipherSuite>) {
        self.ciphers = ciphers.into_iter().collect();
    }

    pub fn valid_keystore_config(&self) -> bool {
        self.valid_keystore_config
    }

    /// Opens the configured keystore and looks up the configured alias.
    ///
    /// Only full success marks the keystore configuration valid.
    pub fn test_keystore(&mut self) -> Result<(), KeystoreError> {
        self.valid_keystore_config = false;
        match keystore::verify_alias(
            &self.key_store,
            &self.key_store_type,
            &self.key_store_password,
            &self.key_alias,
        ) {
            Ok(()) => {
                self.valid_keystore_config = true;
                tracing::info!(endpoint = self.kind.section_name(), "Keystore configuration verified");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    endpoint = self.kind.section_name(),
                    category = e.category(),
                    error = %e,
                    "Keystore check failed"
                );
                Err(e)
            }
        }
    }

    pub fn is_valid_uri(&self) -> bool {
        is_valid_address(&self.address)
    }

    pub fn is_valid_port(&self) -> bool {
        is_valid_port(self.port)
    }

    pub fn is_valid_protocol_config(&self) -> bool {
        !self.tls_enabled() || (self.valid_keystore_config && !self.ciphers.is_empty())
    }

    /// False for TLS on a conventional plain-text port, or plain text on a
    /// conventional TLS port. Advisory only.
    pub fn port_matches_protocol(&self) -> bool {
        if self.tls_enabled() {
            self.port != 80 && self.port != 8080
        } else {
            self.port != 443 && self.port != 8443
        }
    }
}

impl ConfigSection for EndpointConfig {
    fn name(&self) -> &'static str {
        self.kind.section_name()
    }

    fn is_valid_config(&self) -> bool {
        self.is_valid_uri() && self.is_valid_port() && self.is_valid_protocol_config()
    }

    fn write_to(&self, docs: &mut ConfigDocumentSet) -> Result<(), ConfigError> {
        let port = format!("${{{}:{}}}", self.kind.port_placeholder(), self.port);
        docs.set_at(&self.path("port"), port)?;
        docs.set_at(&self.path("address"), self.address.as_str())?;
        if let Some(transport) = self.kind.transport() {
            docs.set_at(&self.path("transport"), transport)?;
        }

        let tls_enabled = self.tls_enabled();
        docs.set_at(&self.path("ssl/enabled"), tls_enabled)?;
        if !tls_enabled {
            return Ok(());
        }

        docs.set_at(&self.path("ssl/key-store-type"), self.key_store_type.as_str())?;
        docs.set_at(&self.path("ssl/key-store"), self.key_store.as_str())?;
        docs.set_at(
            &self.path("ssl/key-store-password"),
            self.key_store_password.as_str(),
        )?;
        docs.set_at(&self.path("ssl/key-password"), self.key_password.as_str())?;
        docs.set_at(&self.path("ssl/key-alias"), self.key_alias.as_str())?;

        let ciphers: Vec<String> = self.ciphers.iter().map(ToString::to_string).collect();
        docs.set_at(&self.path("ssl/ciphers"), ciphers)?;
        let protocols: Vec<String> = self
            .enabled_protocols
            .iter()
            .rev()
            .map(ToString::to_string)
            .collect();
        docs.set_at(&self.path("ssl/enabled-protocols"), protocols)?;
        if let Some(primary) = self.primary_protocol() {
            docs.set_at(&self.path("ssl/protocol"), primary.as_str())?;
        }
        Ok(())
    }

    fn is_saved(&self) -> bool {
        self.saved
    }

    fn set_saved(&mut self, saved: bool) {
        self.saved = saved;
    }
}
