use std::path::{Path, PathBuf};

use crate::ci::detect_ci;
use crate::consts::{MACOS_DISTRO_NAME, SETUPTOOLS};
use crate::glibc::libc_ver;
use crate::host::{Host, SystemHost};
use crate::interpreter::probe_interpreter;
use crate::probe::Probe;
use crate::report::{Distro, Implementation, Libc, Report, System};
use crate::rustc::rustc_version;
use crate::site_packages::installed_version;
use crate::system_info::OsType;

/// Returns the user agent for installer `name` at `version`, describing the machine and the
/// first Python interpreter found on the PATH.
///
/// ```no_run
/// let ua = pypi_user_agent::user_agent("pip", "21.1.1", None);
/// assert!(ua.starts_with("pip/21.1.1 {"));
/// ```
pub fn user_agent(name: &str, version: &str, user_data: Option<&str>) -> String {
    let mut builder = UserAgent::new(name, version);
    if let Some(data) = user_data {
        builder = builder.user_data(data);
    }
    builder.build()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgent {
    name: String,
    version: String,
    user_data: Option<String>,
    interpreter: Option<PathBuf>,
}

impl UserAgent {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            user_data: None,
            interpreter: None,
        }
    }

    /// Free text added as-is under `user_data`
    pub fn user_data(mut self, data: impl Into<String>) -> Self {
        self.user_data = Some(data.into());
        self
    }

    /// Describe this interpreter instead of looking for one on the PATH
    pub fn interpreter(mut self, python: impl AsRef<Path>) -> Self {
        self.interpreter = Some(python.as_ref().to_path_buf());
        self
    }

    pub fn build(&self) -> String {
        self.build_with(&SystemHost)
    }

    pub fn report(&self) -> Report {
        self.report_with(&SystemHost)
    }

    pub fn build_with(&self, host: &impl Host) -> String {
        self.report_with(host).format()
    }

    /// Runs every probe against `host`, in a fixed order
    pub fn report_with(&self, host: &impl Host) -> Report {
        let mut report = Report::new(&self.name, &self.version);

        if let Probe::Present(info) = probe_interpreter(host, self.interpreter.as_deref()) {
            report.python = Some(info.python_version.clone());
            report.implementation = Some(Implementation {
                name: info.implementation_name.clone(),
                version: info.implementation_version(),
            });
            if info.has_tls() {
                report.openssl_version = info.openssl_version().map(|s| s.to_string());
            }
            report.setuptools_version = installed_version(&info.sys_path, SETUPTOOLS);
        }

        let platform = host.platform();
        match platform.os_type {
            OsType::Linux => report.distro = linux_distro(host),
            OsType::MacOs => {
                if let Probe::Present(version) = host.macos_version().non_empty() {
                    report.distro = Some(Distro {
                        name: Some(MACOS_DISTRO_NAME.to_string()),
                        version: Some(version),
                        ..Distro::default()
                    });
                }
            }
            OsType::Windows | OsType::Other => (),
        }

        if platform.system.is_some() || platform.release.is_some() {
            report.system = Some(System {
                name: platform.system,
                release: platform.release,
            });
        }
        report.cpu = platform.machine;

        report.rustc_version = rustc_version(host).into_option();
        report.ci = detect_ci(host);
        report.user_data = self.user_data.clone();

        log::debug!("User agent report: {report:?}");
        report
    }
}

fn linux_distro(host: &impl Host) -> Option<Distro> {
    let linux = host.linux_distribution();
    let (lib, version) = libc_ver(host);

    let non_empty = |s: String| Some(s).filter(|s| !s.is_empty());
    let libc = match (non_empty(lib), non_empty(version)) {
        (Some(lib), Some(version)) => Some(Libc { lib, version }),
        _ => None,
    };

    let distro = Distro {
        name: linux.name,
        version: linux.version,
        id: linux.codename,
        libc,
    };
    if distro.is_empty() { None } else { Some(distro) }
}
