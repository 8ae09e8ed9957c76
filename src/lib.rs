//! Builds the user agent a Python package installer sends along its requests to a package
//! index, so the index can collect aggregate statistics about the environments installing
//! from it (the "linehaul" format popularized by pip):
//!
//! ```text
//! pip/21.1.1 {"ci":null,"cpu":"x86_64","distro":{"id":"groovy","libc":{"lib":"glibc","version":"2.32"},"name":"Ubuntu","version":"20.10"},...}
//! ```
//!
//! Nothing in here returns an error: anything we can't figure out is simply not reported.
mod ci;
mod command;
mod consts;
mod glibc;
mod host;
mod interpreter;
mod probe;
mod report;
mod rustc;
mod site_packages;
mod system_info;
mod useragent;

pub use ci::{CiStatus, detect_ci};
pub use command::{CommandError, CommandErrorKind};
pub use glibc::{glibc_version_string, libc_ver};
pub use host::{Host, SystemHost};
pub use interpreter::{InterpreterInfo, PyPyVersionInfo, find_interpreter, probe_interpreter};
pub use probe::{Probe, first_present};
pub use report::{Distro, Implementation, Installer, Libc, Report, System};
pub use rustc::rustc_version;
pub use site_packages::{installed_version, normalize_name};
pub use system_info::{LinuxDistribution, OsType, Platform, parse_os_release};
pub use useragent::{UserAgent, user_agent};
