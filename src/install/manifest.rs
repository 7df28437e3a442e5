use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::install::paths::{browser_info, manifest_path, Family, Scope};

/// A native messaging host manifest, as browsers read it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub name: String,
    pub description: String,
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_extensions: Option<Vec<String>>,
}

impl Manifest {
    /// Manifest for one browser family; only that family's allow-list is kept.
    pub fn for_family(
        family: Family,
        name: &str,
        description: &str,
        exe_path: &Path,
        allowed_origins: &[String],
        allowed_extensions: &[String],
    ) -> Self {
        let (allowed_origins, allowed_extensions) = match family {
            Family::Chromium => (Some(allowed_origins.to_vec()), None),
            Family::Firefox => (None, Some(allowed_extensions.to_vec())),
        };
        Self {
            name: name.to_string(),
            description: description.to_string(),
            path: exe_path.to_path_buf(),
            kind: "stdio".to_string(),
            allowed_origins,
            allowed_extensions,
        }
    }
}

fn invalid_input(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg)
}

/// Host names are dot-separated groups of lowercase letters, digits and `_`.
fn validate_host_name(name: &str) -> io::Result<()> {
    let valid = !name.is_empty()
        && name.split('.').all(|part| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        });
    if valid {
        Ok(())
    } else {
        Err(invalid_input(format!("invalid host name: {name:?}")))
    }
}

fn write_file(path: &Path, contents: &str) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(contents.as_bytes())?;
    file.write_all(b"\n")
}

/// Write `<name>.json` for every browser in `browsers`.
///
/// On Linux/macOS `exe_path` must be absolute. Returns the written paths.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use xcloud_listener::install::{install, Scope};
///
/// install(
///     "com.xcloud.listener",
///     "Xcloud extension listener",
///     Path::new("/usr/local/bin/xcloud-listener"),
///     &["chrome-extension://aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa/".to_string()],
///     &["xcloud@example.com".to_string()],
///     &["chrome", "firefox"],
///     Scope::User,
/// )
/// .expect("install manifests");
/// ```
pub fn install(
    name: &str,
    description: &str,
    exe_path: &Path,
    allowed_origins: &[String],
    allowed_extensions: &[String],
    browsers: &[&str],
    scope: Scope,
) -> io::Result<Vec<PathBuf>> {
    validate_host_name(name)?;
    if cfg!(any(target_os = "linux", target_os = "macos")) && !exe_path.is_absolute() {
        return Err(invalid_input(format!(
            "host path must be absolute: {}",
            exe_path.display()
        )));
    }

    let mut written = Vec::with_capacity(browsers.len());
    for &browser in browsers {
        let info = browser_info(browser)?;
        let path = manifest_path(name, browser, scope)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let manifest = Manifest::for_family(
            info.family,
            name,
            description,
            exe_path,
            allowed_origins,
            allowed_extensions,
        );
        let json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        write_file(&path, &json)?;
        info!(browser, path = %path.display(), "manifest installed");
        written.push(path);
    }
    Ok(written)
}

/// True if a manifest for `name` exists for any of `browsers`
/// (every known browser when `None`).
///
/// # Examples
///
/// ```no_run
/// use xcloud_listener::install::{verify_installed, Scope};
///
/// let ok = verify_installed("com.xcloud.listener", None, Scope::User).unwrap();
/// assert!(ok);
/// ```
pub fn verify_installed(name: &str, browsers: Option<&[&str]>, scope: Scope) -> io::Result<bool> {
    let all;
    let browsers = match browsers {
        Some(list) => list,
        None => {
            all = crate::install::paths::known_browsers()?;
            all.as_slice()
        }
    };

    for &browser in browsers {
        let path = match manifest_path(name, browser, scope) {
            Ok(path) => path,
            Err(e) if e.kind() == io::ErrorKind::Unsupported => continue,
            Err(e) => return Err(e),
        };
        if path.exists() {
            debug!(browser, path = %path.display(), "manifest found");
            return Ok(true);
        }
    }
    Ok(false)
}

/// Delete the manifest for `name` from each browser. Missing files are ignored.
pub fn remove(name: &str, browsers: &[&str], scope: Scope) -> io::Result<()> {
    for &browser in browsers {
        let path = manifest_path(name, browser, scope)?;
        match fs::remove_file(&path) {
            Ok(()) => info!(browser, path = %path.display(), "manifest removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
