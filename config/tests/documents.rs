//! Integration tests for file-backed configuration documents.

use pdp_setup_config::{ConfigDocumentSet, ConfigError, ConfigValue, PathDocument};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_persist_and_reload_port() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config/application.yml");

    let mut docs = ConfigDocumentSet::from_sources([&path]).unwrap();
    docs.set_at("server/port", 8443).unwrap();
    assert_eq!(docs.persist_all().unwrap(), 1);
    assert!(path.exists());

    let reloaded = ConfigDocumentSet::from_sources([&path]).unwrap();
    assert_eq!(reloaded.get_at("server/port"), Some(&ConfigValue::Integer(8443)));
}

#[test]
fn test_persist_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("application.yml");

    let mut doc = PathDocument::load(&path);
    assert!(!doc.persist().unwrap(), "clean document must not be written");
    assert!(!path.exists());

    doc.set_at("server/address", "localhost").unwrap();
    assert!(doc.persist().unwrap());
    let first = fs::read_to_string(&path).unwrap();

    assert!(!doc.persist().unwrap());
    doc.set_at("server/address", "localhost").unwrap();
    assert!(!doc.is_dirty());
    assert!(!doc.persist().unwrap());
    assert_eq!(fs::read_to_string(&path).unwrap(), first);
}

#[test]
fn test_updates_stay_in_defining_document() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.yml");
    let b = dir.path().join("b.yml");
    fs::write(&a, "server:\n  address: localhost\n").unwrap();
    fs::write(&b, "server:\n  port: 8080\n").unwrap();

    let mut docs = ConfigDocumentSet::from_sources([&a, &b]).unwrap();
    assert_eq!(docs.get_at("server/port"), Some(&ConfigValue::Integer(8080)));

    docs.set_at("server/port", 9000).unwrap();
    docs.set_at("spring/datasource/url", "jdbc:h2:mem:test").unwrap();
    assert_eq!(docs.persist_all().unwrap(), 2);

    let a_doc = PathDocument::load(&a);
    let b_doc = PathDocument::load(&b);
    assert_eq!(b_doc.get_at("server/port"), Some(&ConfigValue::Integer(9000)));
    assert!(!a_doc.exists_at("server/port"));
    assert_eq!(
        a_doc.get_at("spring/datasource/url"),
        Some(&ConfigValue::from("jdbc:h2:mem:test"))
    );
    assert!(!b_doc.exists_at("spring/datasource/url"));
}

#[test]
fn test_unrelated_content_survives_rewrite() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("application.yml");
    fs::write(
        &path,
        r#"
logging:
  level:
    root: INFO
routes:
  - id: pdp
    uri: http://localhost
tags: [a, b]
"#,
    )
    .unwrap();

    let mut doc = PathDocument::load(&path);
    doc.set_at("server/port", 8443).unwrap();
    doc.persist().unwrap();

    let reloaded = PathDocument::load(&path);
    assert_eq!(reloaded.get_at("logging/level/root"), Some(&ConfigValue::from("INFO")));
    assert_eq!(reloaded.get_at("tags"), Some(&ConfigValue::from(vec!["a", "b"])));
    assert!(matches!(reloaded.get_at("routes"), Some(ConfigValue::Opaque(_))));
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("uri: http://localhost"));
}

#[test]
fn test_malformed_file_loads_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("application.yml");
    fs::write(&path, "server: [unclosed\n").unwrap();

    let doc = PathDocument::load(&path);
    assert!(!doc.exists_at("server"));
    assert!(!doc.is_dirty());
}

#[test]
fn test_failed_write_is_reported_for_each_document() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, "").unwrap();
    let good = dir.path().join("good.yml");

    let mut docs = ConfigDocumentSet::from_documents(vec![
        PathDocument::empty(blocker.join("application.yml")),
        PathDocument::from_yaml_str(&good, "server:\n  port: 1\n"),
    ])
    .unwrap();
    docs.set_at("server/address", "localhost").unwrap();
    docs.set_at("server/port", 2).unwrap();

    let err = docs.persist_all().unwrap_err();
    match err {
        ConfigError::PersistFailed(failures) => {
            assert_eq!(failures.len(), 1);
            assert!(matches!(failures[0], ConfigError::WriteSource { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(good.exists(), "the healthy document is still written");
}

#[test]
fn test_profile_documents_survive_rewrite() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("application.yml");
    fs::write(
        &path,
        r#"server:
  address: 0.0.0.0
logging:
  level:
    root: INFO
---
spring:
  config:
    activate:
      on-profile: prod
server:
  port: 443
"#,
    )
    .unwrap();

    let mut doc = PathDocument::load(&path);
    assert_eq!(doc.get_at("server/address"), Some(&ConfigValue::from("0.0.0.0")));
    doc.set_at("server/port", 8443).unwrap();
    assert!(doc.persist().unwrap());

    let reloaded = PathDocument::load(&path);
    assert_eq!(reloaded.get_at("server/address"), Some(&ConfigValue::from("0.0.0.0")));
    assert_eq!(reloaded.get_at("server/port"), Some(&ConfigValue::Integer(8443)));
    assert_eq!(reloaded.get_at("logging/level/root"), Some(&ConfigValue::from("INFO")));
    assert_eq!(reloaded.trailing_documents().len(), 1);

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("---\n"));
    assert!(text.contains("on-profile: prod"));
    assert!(text.contains("port: 443"));
}

#[test]
fn test_non_string_keys_survive_rewrite() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("application.yml");
    fs::write(&path, "errors:\n  404: missing\nflags:\n  true: yes\n").unwrap();

    let mut doc = PathDocument::load(&path);
    doc.set_at("server/port", 8443).unwrap();
    doc.persist().unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("404: missing"), "{text}");
    assert!(text.contains("true: yes"), "{text}");
    assert!(!text.contains("'404'") && !text.contains("'true'"), "{text}");
}
