use crate::consts::{RUSTC_NAME, RUSTC_TIMEOUT};
use crate::host::Host;
use crate::probe::Probe;

/// Version of the `rustc` on the PATH, if there is one and it answers quickly.
/// Any failure means no version, this never errors.
pub fn rustc_version(host: &impl Host) -> Probe<String> {
    let Some(rustc) = host.find_executable(RUSTC_NAME) else {
        return Probe::Absent;
    };

    match host.run(&rustc, &["--version"], RUSTC_TIMEOUT) {
        Ok(output) => {
            let version = parse_rustc_version(&output);
            if !version.is_present() {
                log::debug!(
                    "Unexpected `rustc --version` output: {:?}",
                    String::from_utf8_lossy(&output)
                );
            }
            version
        }
        Err(e) => {
            log::debug!("{e}");
            Probe::Absent
        }
    }
}

// The output looks like `rustc 1.52.1 (9bc8c42bb 2021-05-09)` and we only want `1.52.1`
fn parse_rustc_version(output: &[u8]) -> Probe<String> {
    if !output.starts_with(b"rustc ") {
        return Probe::Absent;
    }

    output
        .split(|b| *b == b' ')
        .nth(1)
        .and_then(|v| std::str::from_utf8(v).ok())
        .map(|v| v.trim().to_string())
        .into()
}
