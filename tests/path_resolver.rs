#![cfg(feature = "install")]

mod common;

use serial_test::serial;
use xcloud_listener::install::{known_browsers, manifest_path, Scope};

#[test]
#[serial]
#[cfg(any(target_os = "linux", target_os = "macos"))]
fn manifest_path_resolves_for_known_browsers_user_scope() {
    let (td, _env) = common::sandbox_env();
    let home = td.path().join("home");

    let host = "com.example.testhost";

    for key in known_browsers().unwrap() {
        let p = manifest_path(host, key, Scope::User).unwrap();
        assert!(p.starts_with(&home), "user path should live under HOME: {p:?}");
        assert_eq!(
            p.file_name().and_then(|n| n.to_str()),
            Some("com.example.testhost.json")
        );
    }
}

#[test]
#[serial]
#[cfg(any(target_os = "linux", target_os = "macos"))]
fn user_scope_needs_home() {
    let _env = common::EnvGuard::set(&[("HOME", String::new())]);
    let err = manifest_path("com.example.testhost", "chrome", Scope::User).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}
