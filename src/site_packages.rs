//! Looking up the installed version of a distribution the way `importlib.metadata.version` does:
//! go through the interpreter's `sys.path` in order and find the first `.dist-info` or
//! `.egg-info` entry for that name.
//!
//! Broken metadata is not our problem, we skip it and keep looking.
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

static NORMALIZE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-_.]+").unwrap());

const DIST_INFO: &str = ".dist-info";
const EGG_INFO: &str = ".egg-info";

/// PEP 503 normalization: `Setup_Tools` and `setup.tools` are both `setup-tools`
pub fn normalize_name(name: &str) -> String {
    NORMALIZE_RE.replace_all(name, "-").to_lowercase()
}

/// Returns the version of the first distribution called `name` in the search path
pub fn installed_version<P: AsRef<Path>>(search_path: &[P], name: &str) -> Option<String> {
    let wanted = normalize_name(name);

    for dir in search_path {
        let dir = dir.as_ref();
        // zip files and missing entries are common in sys.path
        if !dir.is_dir() {
            continue;
        }

        let entries = match fs_err::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::debug!("{e}");
                continue;
            }
        };

        // read_dir order is not stable and we want the same answer every time
        let mut entries: Vec<_> = entries.filter_map(Result::ok).map(|e| e.path()).collect();
        entries.sort();

        for path in entries {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some((dist_name, version)) = split_metadata_name(file_name) else {
                continue;
            };
            if normalize_name(dist_name) != wanted {
                continue;
            }

            if let Some(v) = version_from_metadata(&path).or(version) {
                return Some(v);
            }
            log::debug!("No version found in {}", path.display());
        }
    }

    None
}

/// `setuptools-58.0.4.dist-info` -> (`setuptools`, Some(`58.0.4`))
/// `setuptools-58.0.4-py3.9.egg-info` -> (`setuptools`, Some(`58.0.4`))
/// `setuptools.egg-info` -> (`setuptools`, None)
fn split_metadata_name(file_name: &str) -> Option<(&str, Option<String>)> {
    let stem = file_name
        .strip_suffix(DIST_INFO)
        .or_else(|| file_name.strip_suffix(EGG_INFO))?;

    let mut parts = stem.split('-');
    let name = parts.next().filter(|n| !n.is_empty())?;
    let version = parts
        .next()
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string());
    Some((name, version))
}

/// The `Version:` header of `METADATA`/`PKG-INFO`. An `.egg-info` can also be a single file
/// that is the `PKG-INFO` itself.
fn version_from_metadata(path: &Path) -> Option<String> {
    let metadata_file = if path.is_dir() {
        if path.extension().is_some_and(|e| e == "dist-info") {
            path.join("METADATA")
        } else {
            path.join("PKG-INFO")
        }
    } else {
        path.to_path_buf()
    };

    let content = match fs_err::read_to_string(&metadata_file) {
        Ok(c) => c,
        Err(e) => {
            log::debug!("{e}");
            return None;
        }
    };

    // Headers stop at the first empty line (LF or CRLF), the rest is the description
    content
        .lines()
        .map(str::trim_end)
        .take_while(|line| !line.is_empty())
        .find_map(|line| line.strip_prefix("Version:"))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
