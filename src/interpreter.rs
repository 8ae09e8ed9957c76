//! The Python interpreter we are installing for is a separate program, so everything we report
//! about it comes from running it once with a small script that prints JSON.
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::command::{CommandError, CommandErrorKind};
use crate::consts::{INTERPRETER_NAMES, INTERPRETER_TIMEOUT};
use crate::host::Host;
use crate::probe::Probe;

// `_ssl` is what `ssl` wraps: if it can't be imported the interpreter has no TLS at all.
// `sys.path` is where `importlib.metadata` would look for installed distributions.
const QUERY_SCRIPT: &str = r#"
import json, platform, sys
try:
    import _ssl
    openssl_version = _ssl.OPENSSL_VERSION
except ImportError:
    openssl_version = None
pypy = getattr(sys, "pypy_version_info", None)

def encodable(path):
    # undecodable bytes come back as lone surrogates, json would pass them on as is
    try:
        path.encode("utf-8")
    except UnicodeEncodeError:
        return False
    return True

print(json.dumps({
    "python_version": platform.python_version(),
    "implementation_name": platform.python_implementation(),
    "pypy_version_info": list(pypy) if pypy is not None else None,
    "openssl_version": openssl_version,
    "sys_path": [p for p in sys.path if p and encodable(p)],
}))
"#;

/// `sys.pypy_version_info`: major, minor, micro, releaselevel, serial
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PyPyVersionInfo(pub u32, pub u32, pub u32, pub String, pub u32);

impl PyPyVersionInfo {
    /// Final releases only keep the numbers (`7.3.5`), anything else keeps everything
    /// (`7.3.0.beta.1`)
    pub fn to_version_string(&self) -> String {
        let Self(major, minor, micro, releaselevel, serial) = self;
        if releaselevel == "final" {
            format!("{major}.{minor}.{micro}")
        } else {
            format!("{major}.{minor}.{micro}.{releaselevel}.{serial}")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InterpreterInfo {
    pub python_version: String,
    pub implementation_name: String,
    #[serde(default)]
    pub pypy_version_info: Option<PyPyVersionInfo>,
    #[serde(default)]
    openssl_version: Option<String>,
    #[serde(default)]
    pub sys_path: Vec<PathBuf>,
}

impl InterpreterInfo {
    pub fn implementation_version(&self) -> Option<String> {
        match self.implementation_name.as_str() {
            "CPython" => Some(self.python_version.clone()),
            "PyPy" => self
                .pypy_version_info
                .as_ref()
                .map(PyPyVersionInfo::to_version_string),
            // Complete guess for those two
            "Jython" | "IronPython" => Some(self.python_version.clone()),
            _ => None,
        }
    }

    /// Whether the interpreter could load its TLS binding
    pub fn has_tls(&self) -> bool {
        self.openssl_version.is_some()
    }

    /// Version of the TLS library the interpreter is linked against, eg
    /// `OpenSSL 1.1.1f  31 Mar 2020`
    pub fn openssl_version(&self) -> Option<&str> {
        self.openssl_version.as_deref()
    }
}

/// Uses `explicit` if given, otherwise the first known interpreter name on the PATH
pub fn find_interpreter(host: &impl Host, explicit: Option<&Path>) -> Probe<PathBuf> {
    if let Some(p) = explicit {
        return Probe::Present(p.to_path_buf());
    }

    INTERPRETER_NAMES
        .iter()
        .find_map(|name| host.find_executable(name))
        .into()
}

pub fn query_interpreter(host: &impl Host, python: &Path) -> Result<InterpreterInfo, CommandError> {
    let output = host.run(python, &["-c", QUERY_SCRIPT], INTERPRETER_TIMEOUT)?;
    parse_query_output(&output).map_err(|kind| CommandError::new(python, kind))
}

fn parse_query_output(output: &[u8]) -> Result<InterpreterInfo, CommandErrorKind> {
    // Startup hooks (sitecustomize and friends) can print things, the JSON is the last line
    let text = String::from_utf8_lossy(output);
    let line = text
        .lines()
        .rev()
        .find(|l| l.trim_start().starts_with('{'))
        .ok_or_else(|| CommandErrorKind::UnexpectedOutput(text.to_string()))?;
    serde_json::from_str(line).map_err(CommandErrorKind::Json)
}

/// Finds and queries the interpreter, anything going wrong means we know nothing about it
pub fn probe_interpreter(host: &impl Host, explicit: Option<&Path>) -> Probe<InterpreterInfo> {
    find_interpreter(host, explicit).and_then(|python| match query_interpreter(host, &python) {
        Ok(info) => Probe::Present(info),
        Err(e) => {
            log::debug!("{e}");
            Probe::Absent
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::fake::{FakeHost, FakeOutput};

    fn info(name: &str, pypy: Option<PyPyVersionInfo>) -> InterpreterInfo {
        InterpreterInfo {
            python_version: "3.8.6".to_string(),
            implementation_name: name.to_string(),
            pypy_version_info: pypy,
            openssl_version: None,
            sys_path: Vec::new(),
        }
    }

    #[test]
    fn cpython_uses_python_version() {
        assert_eq!(
            info("CPython", None).implementation_version().as_deref(),
            Some("3.8.6")
        );
    }

    #[test]
    fn pypy_final_release_is_truncated() {
        let pypy = PyPyVersionInfo(7, 3, 5, "final".to_string(), 0);
        assert_eq!(
            info("PyPy", Some(pypy)).implementation_version().as_deref(),
            Some("7.3.5")
        );
    }

    #[test]
    fn pypy_pre_release_keeps_everything() {
        let pypy = PyPyVersionInfo(7, 3, 0, "beta".to_string(), 1);
        assert_eq!(
            info("PyPy", Some(pypy)).implementation_version().as_deref(),
            Some("7.3.0.beta.1")
        );
    }

    #[test]
    fn legacy_implementations_are_guessed() {
        assert_eq!(
            info("Jython", None).implementation_version().as_deref(),
            Some("3.8.6")
        );
        assert_eq!(
            info("IronPython", None).implementation_version().as_deref(),
            Some("3.8.6")
        );
        assert_eq!(info("GraalVM", None).implementation_version(), None);
    }

    #[test]
    fn can_parse_query_output() {
        let output = br#"some noise from sitecustomize
{"python_version": "3.8.6", "implementation_name": "PyPy", "pypy_version_info": [7, 3, 5, "final", 0], "openssl_version": "OpenSSL 1.1.1f  31 Mar 2020", "sys_path": ["/usr/lib/python38.zip", "/usr/lib/python3/dist-packages"]}
"#;
        let info = parse_query_output(output).unwrap();
        assert_eq!(info.implementation_name, "PyPy");
        assert_eq!(
            info.pypy_version_info,
            Some(PyPyVersionInfo(7, 3, 5, "final".to_string(), 0))
        );
        assert!(info.has_tls());
        assert_eq!(info.openssl_version(), Some("OpenSSL 1.1.1f  31 Mar 2020"));
        assert_eq!(info.sys_path.len(), 2);
    }

    #[test]
    fn no_ssl_module_means_no_tls() {
        let output = br#"{"python_version": "3.9.1", "implementation_name": "CPython", "pypy_version_info": null, "openssl_version": null, "sys_path": []}"#;
        let info = parse_query_output(output).unwrap();
        assert!(!info.has_tls());
        assert_eq!(info.openssl_version(), None);
    }

    #[test]
    fn garbage_output_is_an_error() {
        assert!(matches!(
            parse_query_output(b"Python 2.7.18"),
            Err(CommandErrorKind::UnexpectedOutput(_))
        ));
        assert!(matches!(
            parse_query_output(b"{not json"),
            Err(CommandErrorKind::Json(_))
        ));
    }

    #[test]
    fn prefers_python3_on_path() {
        let host = FakeHost::linux()
            .with_executable("python", FakeOutput::Crash)
            .with_executable("python3", FakeOutput::Crash);
        let expected = if cfg!(windows) { "python" } else { "python3" };
        assert_eq!(
            find_interpreter(&host, None),
            Probe::Present(PathBuf::from("/usr/bin").join(expected))
        );
        assert_eq!(
            find_interpreter(&host, Some(Path::new("/opt/py/bin/python"))),
            Probe::Present(PathBuf::from("/opt/py/bin/python"))
        );
    }

    #[test]
    fn broken_interpreter_is_absent() {
        let host = FakeHost::linux().with_executable("python3", FakeOutput::Timeout);
        assert_eq!(probe_interpreter(&host, None), Probe::Absent);
        assert_eq!(probe_interpreter(&FakeHost::linux(), None), Probe::Absent);
    }

    #[test]
    fn undecodable_sys_path_entries_are_dropped() {
        // Needs a real interpreter, nothing to check without one
        let Ok(python) = which::which("python3") else {
            return;
        };
        let script = format!("import sys\nsys.path.append('/tmp/bad\\udcff')\n{QUERY_SCRIPT}");
        let output = crate::command::run_with_timeout(
            &python,
            &["-c", &script],
            std::time::Duration::from_secs(10),
        )
        .unwrap();

        let info = parse_query_output(&output).unwrap();
        assert!(!info.sys_path.is_empty());
        assert!(info.sys_path.iter().all(|p| !p.to_string_lossy().contains("bad")));
    }
}
