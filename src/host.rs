//! Everything the probes read from the outside world goes through `Host`.
//! `SystemHost` talks to the real machine, tests use a fake one so the output does not depend on
//! whoever runs them.
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::command::{CommandError, run_with_timeout};
use crate::glibc;
use crate::probe::Probe;
use crate::system_info::{LinuxDistribution, Platform, macos_product_version};

pub trait Host {
    fn env_var_os(&self, name: &str) -> Option<OsString>;

    /// Looks for `name` on the PATH
    fn find_executable(&self, name: &str) -> Option<PathBuf>;

    /// Runs `program` and returns its stdout followed by its stderr, as long as it exits
    /// successfully within `timeout`.
    fn run(&self, program: &Path, args: &[&str], timeout: Duration)
    -> Result<Vec<u8>, CommandError>;

    fn platform(&self) -> Platform;

    /// Only called on Linux
    fn linux_distribution(&self) -> LinuxDistribution;

    /// Only called on macOS
    fn macos_version(&self) -> Probe<String>;

    /// Raw value of `confstr(_CS_GNU_LIBC_VERSION)`, eg `glibc 2.17`
    fn confstr_libc_version(&self) -> Probe<String>;

    /// What `gnu_get_libc_version()` returns when looked up in our own process, eg `2.17`
    fn libc_symbol_version(&self) -> Probe<String>;
}

/// The machine we are running on
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHost;

impl Host for SystemHost {
    fn env_var_os(&self, name: &str) -> Option<OsString> {
        std::env::var_os(name)
    }

    fn find_executable(&self, name: &str) -> Option<PathBuf> {
        match which::which(name) {
            Ok(p) => Some(p),
            Err(e) => {
                log::debug!("Could not find `{name}`: {e}");
                None
            }
        }
    }

    fn run(
        &self,
        program: &Path,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Vec<u8>, CommandError> {
        run_with_timeout(program, args, timeout)
    }

    fn platform(&self) -> Platform {
        Platform::from_uname()
    }

    fn linux_distribution(&self) -> LinuxDistribution {
        LinuxDistribution::detect()
    }

    fn macos_version(&self) -> Probe<String> {
        macos_product_version()
    }

    fn confstr_libc_version(&self) -> Probe<String> {
        glibc::sys::confstr_gnu_libc_version().into()
    }

    fn libc_symbol_version(&self) -> Probe<String> {
        glibc::sys::gnu_get_libc_version().into()
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;
    use crate::command::CommandErrorKind;
    use crate::system_info::OsType;

    pub(crate) enum FakeOutput {
        Ok(Vec<u8>),
        Timeout,
        Crash,
    }

    /// A host where everything is decided by the test
    pub(crate) struct FakeHost {
        pub env: HashMap<String, String>,
        pub executables: HashMap<String, PathBuf>,
        pub outputs: HashMap<PathBuf, FakeOutput>,
        pub platform: Platform,
        pub distribution: LinuxDistribution,
        pub macos_version: Probe<String>,
        pub confstr: Probe<String>,
        pub libc_symbol: Probe<String>,
        /// Every program run with the timeout it was given
        pub ran: RefCell<Vec<(PathBuf, Duration)>>,
    }

    impl FakeHost {
        /// An Ubuntu box with nothing installed and glibc 2.32
        pub fn linux() -> Self {
            Self {
                env: HashMap::new(),
                executables: HashMap::new(),
                outputs: HashMap::new(),
                platform: Platform::new(
                    OsType::Linux,
                    Some("Linux".to_string()),
                    Some("5.8.0-53-generic".to_string()),
                    Some("x86_64".to_string()),
                ),
                distribution: LinuxDistribution {
                    name: Some("Ubuntu".to_string()),
                    version: Some("20.10".to_string()),
                    codename: Some("groovy".to_string()),
                },
                macos_version: Probe::Absent,
                confstr: Probe::Present("glibc 2.32".to_string()),
                libc_symbol: Probe::Absent,
                ran: RefCell::new(Vec::new()),
            }
        }

        pub fn macos() -> Self {
            Self {
                platform: Platform::new(
                    OsType::MacOs,
                    Some("Darwin".to_string()),
                    Some("23.2.0".to_string()),
                    Some("arm64".to_string()),
                ),
                distribution: LinuxDistribution::default(),
                macos_version: Probe::Present("14.2.1".to_string()),
                confstr: Probe::Absent,
                ..Self::linux()
            }
        }

        pub fn with_env(mut self, name: &str, value: &str) -> Self {
            self.env.insert(name.to_string(), value.to_string());
            self
        }

        /// Puts `name` on the fake PATH and decides what running it does
        pub fn with_executable(mut self, name: &str, output: FakeOutput) -> Self {
            let path = PathBuf::from("/usr/bin").join(name);
            self.executables.insert(name.to_string(), path.clone());
            self.outputs.insert(path, output);
            self
        }

        pub fn ran(&self, program: &str) -> bool {
            self.timeout_of(program).is_some()
        }

        pub fn timeout_of(&self, program: &str) -> Option<Duration> {
            self.ran
                .borrow()
                .iter()
                .find(|(p, _)| p.file_name().is_some_and(|n| n == program))
                .map(|(_, timeout)| *timeout)
        }
    }

    impl Host for FakeHost {
        fn env_var_os(&self, name: &str) -> Option<OsString> {
            self.env.get(name).map(OsString::from)
        }

        fn find_executable(&self, name: &str) -> Option<PathBuf> {
            self.executables.get(name).cloned()
        }

        fn run(
            &self,
            program: &Path,
            _args: &[&str],
            timeout: Duration,
        ) -> Result<Vec<u8>, CommandError> {
            self.ran.borrow_mut().push((program.to_path_buf(), timeout));
            match self.outputs.get(program) {
                Some(FakeOutput::Ok(out)) => Ok(out.clone()),
                Some(FakeOutput::Timeout) => {
                    Err(CommandError::new(program, CommandErrorKind::Timeout(timeout)))
                }
                Some(FakeOutput::Crash) => Err(CommandError::new(
                    program,
                    CommandErrorKind::UnexpectedOutput("Segmentation fault".to_string()),
                )),
                None => Err(CommandError::new(program, CommandErrorKind::NotFound)),
            }
        }

        fn platform(&self) -> Platform {
            self.platform.clone()
        }

        fn linux_distribution(&self) -> LinuxDistribution {
            self.distribution.clone()
        }

        fn macos_version(&self) -> Probe<String> {
            self.macos_version.clone()
        }

        fn confstr_libc_version(&self) -> Probe<String> {
            self.confstr.clone()
        }

        fn libc_symbol_version(&self) -> Probe<String> {
            self.libc_symbol.clone()
        }
    }
}
