use std::time::Duration;

// These are environment variables present when running under various CI systems.
// For each variable, some CI systems that use the variable are indicated.
// The list only needs to give a lower bound for CI traffic so it is fine if it's not comprehensive.
// See https://github.com/pypa/pip/issues/5499
pub(crate) const CI_ENVIRONMENT_VARIABLES: [&str; 4] = [
    // Azure Pipelines
    "BUILD_BUILDID",
    // Jenkins
    "BUILD_ID",
    // AppVeyor, CircleCI, Codeship, Gitlab CI, Shippable, Travis CI
    "CI",
    // Explicit environment variable.
    "PIP_IS_CI",
];

/// Tried in order on the PATH when the caller did not pick an interpreter
#[cfg(not(windows))]
pub(crate) const INTERPRETER_NAMES: [&str; 2] = ["python3", "python"];
#[cfg(windows)]
pub(crate) const INTERPRETER_NAMES: [&str; 2] = ["python", "python3"];

/// The whole user agent should be built well under a second, the interpreter gets the same
/// allowance as rustc
pub(crate) const INTERPRETER_TIMEOUT: Duration = Duration::from_millis(500);

pub(crate) const RUSTC_NAME: &str = "rustc";
pub(crate) const RUSTC_TIMEOUT: Duration = Duration::from_millis(500);

/// The only installed distribution we report a version for
pub(crate) const SETUPTOOLS: &str = "setuptools";

pub(crate) const MACOS_DISTRO_NAME: &str = "macOS";
pub(crate) const GLIBC_NAME: &str = "glibc";

pub(crate) const OS_RELEASE_PATHS: [&str; 2] = ["/etc/os-release", "/usr/lib/os-release"];
pub(crate) const MACOS_SYSTEM_VERSION_PLIST: &str =
    "/System/Library/CoreServices/SystemVersion.plist";
