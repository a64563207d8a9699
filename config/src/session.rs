use crate::sections::{
    AdminUserConfig, ApiAuthenticationConfig, ConfigSection, DbmsConfig, EndpointConfig,
    EndpointKind,
};
use crate::sources::SourceDiscovery;
use crate::{ConfigDocumentSet, ConfigError};
use serde::Serialize;
use std::path::PathBuf;

pub const HTTP_ADDRESS_PATH: &str = "server/address";
pub const HTTP_PORT_PATH: &str = "server/port";
pub const RSOCKET_PORT_PATH: &str = "spring/rsocket/server/port";

/// Saved flags of every section plus the persisted endpoint paths a server
/// restart depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SetupProgress {
    pub dbms_saved: bool,
    pub admin_user_saved: bool,
    pub http_endpoint_saved: bool,
    pub rsocket_endpoint_saved: bool,
    pub api_authentication_saved: bool,
    pub http_address_configured: bool,
    pub http_port_configured: bool,
    pub rsocket_port_configured: bool,
}

impl SetupProgress {
    pub fn ready_for_restart(&self) -> bool {
        self.dbms_saved
            && self.admin_user_saved
            && self.http_address_configured
            && self.http_port_configured
            && self.rsocket_port_configured
    }
}

/// One operator's setup session: the document set and a model per section,
/// each read once when the session opens.
#[derive(Debug)]
pub struct SetupSession {
    documents: ConfigDocumentSet,
    dbms: DbmsConfig,
    admin_user: AdminUserConfig,
    http_endpoint: EndpointConfig,
    rsocket_endpoint: EndpointConfig,
    api_authentication: ApiAuthenticationConfig,
}

impl SetupSession {
    pub fn open<I, P>(sources: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Ok(Self::from_documents(ConfigDocumentSet::from_sources(sources)?))
    }

    pub fn discover(discovery: &SourceDiscovery) -> Result<Self, ConfigError> {
        Self::open(discovery.discover())
    }

    pub fn from_documents(documents: ConfigDocumentSet) -> Self {
        Self {
            dbms: DbmsConfig::load(&documents),
            admin_user: AdminUserConfig::load(&documents),
            http_endpoint: EndpointConfig::load(EndpointKind::Http, &documents),
            rsocket_endpoint: EndpointConfig::load(EndpointKind::Rsocket, &documents),
            api_authentication: ApiAuthenticationConfig::load(&documents),
            documents,
        }
    }

    pub fn documents(&self) -> &ConfigDocumentSet {
        &self.documents
    }

    pub fn documents_mut(&mut self) -> &mut ConfigDocumentSet {
        &mut self.documents
    }

    pub fn dbms(&self) -> &DbmsConfig {
        &self.dbms
    }

    pub fn dbms_mut(&mut self) -> &mut DbmsConfig {
        &mut self.dbms
    }

    pub fn admin_user(&self) -> &AdminUserConfig {
        &self.admin_user
    }

    pub fn admin_user_mut(&mut self) -> &mut AdminUserConfig {
        &mut self.admin_user
    }

    pub fn endpoint(&self, kind: EndpointKind) -> &EndpointConfig {
        match kind {
            EndpointKind::Http => &self.http_endpoint,
            EndpointKind::Rsocket => &self.rsocket_endpoint,
        }
    }

    pub fn endpoint_mut(&mut self, kind: EndpointKind) -> &mut EndpointConfig {
        match kind {
            EndpointKind::Http => &mut self.http_endpoint,
            EndpointKind::Rsocket => &mut self.rsocket_endpoint,
        }
    }

    pub fn http_endpoint(&self) -> &EndpointConfig {
        &self.http_endpoint
    }

    pub fn http_endpoint_mut(&mut self) -> &mut EndpointConfig {
        &mut self.http_endpoint
    }

    pub fn rsocket_endpoint(&self) -> &EndpointConfig {
        &self.rsocket_endpoint
    }

    pub fn rsocket_endpoint_mut(&mut self) -> &mut EndpointConfig {
        &mut self.rsocket_endpoint
    }

    pub fn api_authentication(&self) -> &ApiAuthenticationConfig {
        &self.api_authentication
    }

    pub fn api_authentication_mut(&mut self) -> &mut ApiAuthenticationConfig {
        &mut self.api_authentication
    }

    pub fn persist_dbms_config(&mut self) -> Result<(), ConfigError> {
        persist_section(&mut self.documents, &mut self.dbms)
    }

    pub fn persist_admin_user_config(&mut self) -> Result<(), ConfigError> {
        persist_section(&mut self.documents, &mut self.admin_user)
    }

    pub fn persist_http_endpoint_config(&mut self) -> Result<(), ConfigError> {
        persist_section(&mut self.documents, &mut self.http_endpoint)
    }

    pub fn persist_rsocket_endpoint_config(&mut self) -> Result<(), ConfigError> {
        persist_section(&mut self.documents, &mut self.rsocket_endpoint)
    }

    pub fn persist_api_authentication_config(&mut self) -> Result<(), ConfigError> {
        persist_section(&mut self.documents, &mut self.api_authentication)
    }

    pub fn progress(&self) -> SetupProgress {
        SetupProgress {
            dbms_saved: self.dbms.is_saved(),
            admin_user_saved: self.admin_user.is_saved(),
            http_endpoint_saved: self.http_endpoint.is_saved(),
            rsocket_endpoint_saved: self.rsocket_endpoint.is_saved(),
            api_authentication_saved: self.api_authentication.is_saved(),
            http_address_configured: self.documents.get_at(HTTP_ADDRESS_PATH).is_some(),
            http_port_configured: self.documents.get_at(HTTP_PORT_PATH).is_some(),
            rsocket_port_configured: self.documents.get_at(RSOCKET_PORT_PATH).is_some(),
        }
    }

    /// Whether the server has enough configuration to be restarted with it.
    pub fn ready_for_restart(&self) -> bool {
        self.progress().ready_for_restart()
    }
}

fn persist_section<S: ConfigSection>(
    documents: &mut ConfigDocumentSet,
    section: &mut S,
) -> Result<(), ConfigError> {
    if !section.is_valid_config() {
        tracing::warn!(section = section.name(), "Refusing to save invalid configuration");
        return Err(ConfigError::InvalidSection(section.name()));
    }
    section.write_to(documents)?;
    let written = documents.persist_all()?;
    section.set_saved(true);
    tracing::info!(section = section.name(), files = written, "Saved configuration");
    Ok(())
}
