use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use serde::Deserialize;

static BROWSERS_TOML: &str = include_str!("browsers.toml");

static BROWSERS: Lazy<Result<BTreeMap<String, BrowserInfo>, toml::de::Error>> =
    Lazy::new(|| toml::from_str::<BrowsersFile>(BROWSERS_TOML).map(|file| file.browsers));

/// Which allow-list a browser's manifest uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    /// `allowed_origins` with `chrome-extension://<id>/` entries.
    Chromium,
    /// `allowed_extensions` with add-on IDs.
    Firefox,
}

/// Install locations for one browser, from the embedded `browsers.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserInfo {
    pub family: Family,
    pub linux_user: Option<String>,
    pub linux_system: Option<String>,
    pub macos_user: Option<String>,
    pub macos_system: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BrowsersFile {
    browsers: BTreeMap<String, BrowserInfo>,
}

/// Per-user or machine-wide install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Scope {
    #[default]
    User,
    System,
}

fn browsers() -> io::Result<&'static BTreeMap<String, BrowserInfo>> {
    (*BROWSERS).as_ref().map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("embedded browsers.toml is invalid: {e}"),
        )
    })
}

/// Keys of every browser the installer knows about, sorted.
pub fn known_browsers() -> io::Result<Vec<&'static str>> {
    Ok(browsers()?.keys().map(String::as_str).collect())
}

/// Look up a browser by key (`chrome`, `firefox`, ...).
pub fn browser_info(browser: &str) -> io::Result<&'static BrowserInfo> {
    browsers()?.get(browser).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unknown browser: {browser}"),
        )
    })
}

fn home_dir() -> io::Result<PathBuf> {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "HOME not set"))
}

fn os_dir(info: &BrowserInfo, scope: Scope) -> Option<&str> {
    #[cfg(target_os = "linux")]
    {
        match scope {
            Scope::User => info.linux_user.as_deref(),
            Scope::System => info.linux_system.as_deref(),
        }
    }
    #[cfg(target_os = "macos")]
    {
        match scope {
            Scope::User => info.macos_user.as_deref(),
            Scope::System => info.macos_system.as_deref(),
        }
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        let _ = (info, scope);
        None
    }
}

/// Directory holding the manifests of `browser` for `scope` on this OS.
pub fn manifest_dir(browser: &str, scope: Scope) -> io::Result<PathBuf> {
    let info = browser_info(browser)?;
    let dir = os_dir(info, scope).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::Unsupported,
            format!("no {scope:?} manifest location for {browser} on this platform"),
        )
    })?;
    match scope {
        Scope::User => Ok(home_dir()?.join(dir)),
        Scope::System => Ok(PathBuf::from(dir)),
    }
}

/// Full path of the manifest file for host `name`.
pub fn manifest_path(name: &str, browser: &str, scope: Scope) -> io::Result<PathBuf> {
    Ok(manifest_dir(browser, scope)?.join(format!("{name}.json")))
}
