//! PDP Setup Configuration Store
//!
//! Path-addressed editing of the YAML files a PDP server boots from.
//!
//! # Sources
//!
//! A [`ConfigDocumentSet`] holds one [`PathDocument`] per source file, in
//! order. Reads take the value from the first document defining a path.
//! Writes update that document, or the first (primary) document when no
//! source defines the path yet. [`SourceDiscovery`] builds the source list:
//!
//! 1. Locations passed explicitly
//! 2. `PDP_SETUP_CONFIG=a.yml,b.yml` (comma separated)
//! 3. `config/application.yml` when nothing else is given
//!
//! # Paths
//!
//! Paths are `/`-separated map keys, so `server/ssl/enabled` addresses
//!
//! ```yaml
//! server:
//!   ssl:
//!     enabled: true
//! ```
//!
//! # Sections
//!
//! [`SetupSession`] reads the database, admin user, HTTP and RSocket
//! endpoint, and API authentication sections once and saves each of them
//! only while it is valid.

#![allow(missing_docs)]

mod document;
mod document_set;
mod error;
pub mod keystore;
pub mod sections;
mod session;
mod sources;
pub mod tls;
mod value;

pub use document::PathDocument;
pub use document_set::ConfigDocumentSet;
pub use error::ConfigError;
pub use keystore::{KeystoreError, KeystoreType};
pub use session::{SetupProgress, SetupSession};
pub use sources::{SourceDiscovery, CONFIG_ENV, DEFAULT_SOURCE};
pub use value::{ConfigMap, ConfigValue, MapKey, Node};

/// Opens a session over the default source locations.
pub fn open_session() -> Result<SetupSession, ConfigError> {
    SetupSession::discover(&SourceDiscovery::new())
}
