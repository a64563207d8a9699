use p12_keystore::error::Error as Pkcs12Error;
use p12_keystore::{KeyStore, KeyStoreEntry};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

pub const KEY_STORE_TYPE_PKCS12: &str = "PKCS12";
pub const KEY_STORE_TYPE_JKS: &str = "JKS";
pub const KEY_STORE_TYPE_JCEKS: &str = "JCEKS";

#[derive(Debug, Error)]
pub enum KeystoreError {
    #[error("bad certificate: {0}")]
    Certificate(String),

    #[error("unsupported keystore type '{0}'")]
    StoreType(String),

    #[error("missing algorithm: {0}")]
    Algorithm(String),

    #[error("keystore file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read keystore {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("keystore could not be opened, check the password: {0}")]
    Unreadable(String),

    #[error("not a valid PKCS12 keystore: {0}")]
    InvalidStore(String),

    #[error("alias '{0}' not found in keystore")]
    AliasNotFound(String),
}

impl KeystoreError {
    /// Short label shown next to the message in the wizard.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Certificate(_) => "certificate",
            Self::StoreType(_) | Self::InvalidStore(_) => "store-type",
            Self::Algorithm(_) => "algorithm",
            Self::NotFound(_) => "file-not-found",
            Self::Io { .. } | Self::Unreadable(_) => "io",
            Self::AliasNotFound(_) => "alias",
        }
    }

    /// Keystore failures never end the setup; the operator corrects the
    /// type, path, password or alias and checks again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeystoreType {
    Pkcs12,
    Jks,
    Jceks,
}

impl KeystoreType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pkcs12 => KEY_STORE_TYPE_PKCS12,
            Self::Jks => KEY_STORE_TYPE_JKS,
            Self::Jceks => KEY_STORE_TYPE_JCEKS,
        }
    }
}

impl fmt::Display for KeystoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeystoreType {
    type Err = KeystoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PKCS12" | "P12" => Ok(Self::Pkcs12),
            "JKS" => Ok(Self::Jks),
            "JCEKS" => Ok(Self::Jceks),
            _ => Err(KeystoreError::StoreType(s.to_string())),
        }
    }
}

/// Filesystem path for a configured keystore location, without the
/// `file:` scheme and with `~` expanded.
pub fn keystore_path(location: &str) -> PathBuf {
    let location = location.trim();
    let location = location.strip_prefix("file:").unwrap_or(location);
    PathBuf::from(shellexpand::tilde(location).as_ref())
}

/// Opens the keystore at `location` and checks that `alias` names a
/// certificate or private key chain in it. Aliases compare case-insensitively.
pub fn verify_alias(
    location: &str,
    store_type: &str,
    store_password: &str,
    alias: &str,
) -> Result<(), KeystoreError> {
    let kind: KeystoreType = store_type.parse()?;
    if kind != KeystoreType::Pkcs12 {
        return Err(KeystoreError::Algorithm(format!(
            "no provider available for {kind} keystores"
        )));
    }

    let path = keystore_path(location);
    let data = std::fs::read(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            KeystoreError::NotFound(path.clone())
        } else {
            KeystoreError::Io {
                path: path.clone(),
                source: e,
            }
        }
    })?;

    let store = KeyStore::from_pkcs12(&data, store_password).map_err(classify_pkcs12_error)?;

    let entry = store
        .entries()
        .find(|(name, _)| name.eq_ignore_ascii_case(alias))
        .map(|(_, entry)| entry)
        .ok_or_else(|| KeystoreError::AliasNotFound(alias.to_string()))?;
    check_entry(alias, entry)?;

    tracing::debug!(path = %path.display(), alias, "Keystore alias verified");
    Ok(())
}

/// A key entry is usable only with the certificate chain that goes with it.
fn check_entry(alias: &str, entry: &KeyStoreEntry) -> Result<(), KeystoreError> {
    match entry {
        KeyStoreEntry::PrivateKeyChain(chain) if chain.chain().is_empty() => Err(
            KeystoreError::Certificate(format!("alias '{alias}' has a private key without certificates")),
        ),
        KeyStoreEntry::PrivateKeyChain(_) | KeyStoreEntry::Certificate(_) => Ok(()),
    }
}

fn classify_pkcs12_error(error: Pkcs12Error) -> KeystoreError {
    let message = error.to_string();
    match error {
        Pkcs12Error::UnsupportedCertificateType | Pkcs12Error::X509Error(_) => {
            KeystoreError::Certificate(message)
        }
        Pkcs12Error::UnsupportedEncryptionScheme
        | Pkcs12Error::UnsupportedMacAlgorithm
        | Pkcs12Error::UnsupportedContentType => KeystoreError::Algorithm(message),
        Pkcs12Error::MacError(_) | Pkcs12Error::UnpadError | Pkcs12Error::Pkcs5Error(_) => {
            KeystoreError::Unreadable(message)
        }
        _ => KeystoreError::InvalidStore(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names_parse_case_insensitively() {
        assert_eq!("pkcs12".parse::<KeystoreType>().unwrap(), KeystoreType::Pkcs12);
        assert_eq!("JKS".parse::<KeystoreType>().unwrap(), KeystoreType::Jks);
        assert_eq!(" jceks ".parse::<KeystoreType>().unwrap(), KeystoreType::Jceks);
        let err = "PEM".parse::<KeystoreType>().unwrap_err();
        assert_eq!(err.category(), "store-type");
    }

    #[test]
    fn file_scheme_is_stripped() {
        assert_eq!(
            keystore_path("file:config/keystore.p12"),
            PathBuf::from("config/keystore.p12")
        );
        assert_eq!(keystore_path("/etc/tls.p12"), PathBuf::from("/etc/tls.p12"));
    }

    #[test]
    fn jks_has_no_provider() {
        let err = verify_alias("file:/nonexistent.jks", "JKS", "pw", "a").unwrap_err();
        assert!(matches!(err, KeystoreError::Algorithm(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn missing_file_is_reported() {
        let err = verify_alias("file:/nonexistent/keystore.p12", "PKCS12", "pw", "a").unwrap_err();
        assert!(matches!(err, KeystoreError::NotFound(_)));
        assert_eq!(err.category(), "file-not-found");
    }

    #[test]
    fn pkcs12_errors_keep_their_category() {
        assert_eq!(
            classify_pkcs12_error(Pkcs12Error::UnsupportedCertificateType).category(),
            "certificate"
        );
        assert_eq!(
            classify_pkcs12_error(Pkcs12Error::UnsupportedEncryptionScheme).category(),
            "algorithm"
        );
        assert_eq!(
            classify_pkcs12_error(Pkcs12Error::UnsupportedMacAlgorithm).category(),
            "algorithm"
        );
        assert!(matches!(
            classify_pkcs12_error(Pkcs12Error::UnpadError),
            KeystoreError::Unreadable(_)
        ));
        assert!(matches!(
            classify_pkcs12_error(Pkcs12Error::InvalidVersion),
            KeystoreError::InvalidStore(_)
        ));
        assert!(matches!(
            classify_pkcs12_error(Pkcs12Error::InvalidData),
            KeystoreError::InvalidStore(_)
        ));
    }

    #[test]
    fn key_without_certificates_is_rejected() {
        let entry = KeyStoreEntry::PrivateKeyChain(p12_keystore::PrivateKeyChain::new(
            [1u8],
            [1u8],
            Vec::new(),
        ));
        let err = check_entry("mykey", &entry).unwrap_err();
        assert!(matches!(err, KeystoreError::Certificate(_)));
        assert_eq!(err.category(), "certificate");
    }

    #[test]
    fn every_failure_is_retryable() {
        let errors = [
            KeystoreError::StoreType("PEM".into()),
            KeystoreError::Algorithm("JKS".into()),
            KeystoreError::AliasNotFound("a".into()),
            KeystoreError::InvalidStore("x".into()),
        ];
        assert!(errors.iter().all(KeystoreError::is_retryable));
    }
}
