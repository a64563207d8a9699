//! Typed views over the configuration paths the setup wizard edits.
//!
//! Each section reads its paths once from a [`ConfigDocumentSet`] and keeps
//! typed copies. Writing happens only through [`ConfigSection::write_to`].

mod admin_user;
mod api_auth;
mod dbms;
mod endpoint;

pub use admin_user::{
    hash_password, password_strength, verify_password, AdminUserConfig, PasswordStrength,
};
pub use api_auth::ApiAuthenticationConfig;
pub use dbms::{DbmsConfig, DbmsKind};
pub use endpoint::{is_valid_address, is_valid_port, EndpointConfig, EndpointKind};

use crate::{ConfigDocumentSet, ConfigError};

pub trait ConfigSection {
    /// Name used in logs and errors.
    fn name(&self) -> &'static str;

    fn is_valid_config(&self) -> bool;

    /// Writes every path this section owns into `docs`.
    fn write_to(&self, docs: &mut ConfigDocumentSet) -> Result<(), ConfigError>;

    fn is_saved(&self) -> bool;

    fn set_saved(&mut self, saved: bool);
}
