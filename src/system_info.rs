//! What we report about the machine itself: OS family, kernel release, CPU and distribution.
//! We read most of it ourselves (uname, os-release, SystemVersion.plist) since the values need
//! to look like what Python's `platform` and `distro` modules return, and only fall back on
//! `os_info` when those files are not there.
//! `os_info` types are not exposed, the data we care about is encoded in our own types.
use std::sync::LazyLock;

use regex::Regex;

use crate::consts::{MACOS_SYSTEM_VERSION_PLIST, OS_RELEASE_PATHS};
use crate::probe::Probe;

static PLIST_PRODUCT_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<key>ProductVersion</key>\s*<string>([^<]*)</string>").unwrap()
});
static CODENAME_IN_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]+)\)|,\s*([^,]+)$").unwrap());

/// Only Linux and macOS get a `distro` entry, everything else is lumped together
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum OsType {
    Linux,
    MacOs,
    Windows,
    Other,
}

impl OsType {
    pub fn current() -> Self {
        if cfg!(target_os = "linux") {
            OsType::Linux
        } else if cfg!(target_os = "macos") {
            OsType::MacOs
        } else if cfg!(windows) {
            OsType::Windows
        } else {
            OsType::Other
        }
    }
}

/// Equivalent of `platform.system()`, `platform.release()` and `platform.machine()`.
/// Any of them can be missing if the OS reports an empty string.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Platform {
    pub os_type: OsType,
    pub system: Option<String>,
    pub release: Option<String>,
    pub machine: Option<String>,
}

impl Platform {
    pub fn new(
        os_type: OsType,
        system: Option<String>,
        release: Option<String>,
        machine: Option<String>,
    ) -> Self {
        Self {
            os_type,
            system: system.filter(|s| !s.trim().is_empty()),
            release: release.filter(|s| !s.trim().is_empty()),
            machine: machine.filter(|s| !s.trim().is_empty()),
        }
    }

    #[cfg(unix)]
    pub fn from_uname() -> Self {
        match nix::sys::utsname::uname() {
            Ok(uts) => Self::new(
                OsType::current(),
                Some(uts.sysname().to_string_lossy().into_owned()),
                Some(uts.release().to_string_lossy().into_owned()),
                Some(uts.machine().to_string_lossy().into_owned()),
            ),
            Err(e) => {
                log::debug!("uname failed: {e}, falling back to os_info");
                Self::from_os_info()
            }
        }
    }

    #[cfg(not(unix))]
    pub fn from_uname() -> Self {
        Self::from_os_info()
    }

    fn from_os_info() -> Self {
        let info = os_info::get();
        let system = match OsType::current() {
            OsType::Linux => "Linux".to_string(),
            OsType::MacOs => "Darwin".to_string(),
            OsType::Windows => "Windows".to_string(),
            OsType::Other => std::env::consts::OS.to_string(),
        };
        let release = match info.version() {
            os_info::Version::Unknown => None,
            v => Some(v.to_string()),
        };

        Self::new(
            OsType::current(),
            Some(system),
            release,
            info.architecture().map(|s| s.to_string()),
        )
    }
}

/// Equivalent of `distro.name()`, `distro.version()` and `distro.codename()`
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct LinuxDistribution {
    pub name: Option<String>,
    pub version: Option<String>,
    pub codename: Option<String>,
}

impl LinuxDistribution {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.version.is_none() && self.codename.is_none()
    }

    /// Reads the first os-release file found, then `os_info` if it gave us nothing
    pub fn detect() -> Self {
        for path in OS_RELEASE_PATHS {
            match fs_err::read_to_string(path) {
                Ok(content) => {
                    let distro = parse_os_release(&content);
                    if !distro.is_empty() {
                        return distro;
                    }
                }
                Err(e) => log::debug!("{e}"),
            }
        }

        Self::from_os_info()
    }

    fn from_os_info() -> Self {
        let info = os_info::get();
        let version = match info.version() {
            os_info::Version::Unknown => None,
            v => Some(v.to_string()),
        };
        Self {
            name: Some(info.os_type().to_string()),
            version,
            codename: info.codename().map(|s| s.to_string()),
        }
        .cleaned()
    }

    fn cleaned(self) -> Self {
        let keep = |s: Option<String>| s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Self {
            name: keep(self.name),
            version: keep(self.version),
            codename: keep(self.codename),
        }
    }
}

/// Parses the `KEY=value` lines of an os-release file.
/// The codename comes from `VERSION_CODENAME`, then `UBUNTU_CODENAME`, then whatever is in
/// parentheses in `VERSION` (eg `VERSION="20.04.2 LTS (Focal Fossa)"`).
pub fn parse_os_release(content: &str) -> LinuxDistribution {
    let mut name = None;
    let mut version_id = None;
    let mut version = None;
    let mut codename = None;
    let mut ubuntu_codename = None;

    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = unquote(value.trim());
        match key.trim() {
            "NAME" => name = Some(value),
            "VERSION_ID" => version_id = Some(value),
            "VERSION" => version = Some(value),
            "VERSION_CODENAME" => codename = Some(value),
            "UBUNTU_CODENAME" => ubuntu_codename = Some(value),
            _ => (),
        }
    }

    let codename = codename
        .filter(|c| !c.is_empty())
        .or(ubuntu_codename)
        .filter(|c| !c.is_empty())
        .or_else(|| version.as_deref().and_then(codename_from_version));

    LinuxDistribution {
        name,
        version: version_id,
        codename,
    }
    .cleaned()
}

fn codename_from_version(version: &str) -> Option<String> {
    let caps = CODENAME_IN_VERSION_RE.captures(version)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().trim().to_string())
}

fn unquote(value: &str) -> String {
    let stripped = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);
    stripped.replace("\\\"", "\"").replace("\\$", "$").replace("\\\\", "\\")
}

/// Equivalent of `platform.mac_ver()[0]`
pub fn macos_product_version() -> Probe<String> {
    match fs_err::read_to_string(MACOS_SYSTEM_VERSION_PLIST) {
        Ok(content) => parse_product_version(&content).or_else(macos_version_from_os_info),
        Err(e) => {
            log::debug!("{e}");
            macos_version_from_os_info()
        }
    }
}

fn macos_version_from_os_info() -> Probe<String> {
    match os_info::get().version() {
        os_info::Version::Unknown => Probe::Absent,
        v => Probe::Present(v.to_string()),
    }
}

fn parse_product_version(plist: &str) -> Probe<String> {
    PLIST_PRODUCT_VERSION_RE
        .captures(plist)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .into()
}
