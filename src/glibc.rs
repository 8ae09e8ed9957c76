//! Finding the glibc version the process is actually linked against.
//!
//! The libc version guessed by Python's `platform.libc_ver` is regularly nonsensical: it has been
//! seen reporting `('glibc', '2.9')` on a machine where `ldd --version` says 2.22.
//! So we never guess from binaries on disk, we ask the C library itself:
//!
//! 1. `confstr(_CS_GNU_LIBC_VERSION)` which returns something like `glibc 2.17`
//! 2. `dlopen(NULL)` to get a handle on the main program and call `gnu_get_libc_version` if the
//!    linker can resolve it. If it can't, we are not linked against glibc (eg musl).
use crate::consts::GLIBC_NAME;
use crate::host::Host;
use crate::probe::{Probe, first_present};

/// Returns `("glibc", version)`, or two empty strings when we could not find any glibc.
pub fn libc_ver(host: &impl Host) -> (String, String) {
    match glibc_version_string(host) {
        Probe::Present(version) => (GLIBC_NAME.to_string(), version),
        Probe::Absent => (String::new(), String::new()),
    }
}

pub fn glibc_version_string(host: &impl Host) -> Probe<String> {
    let from_confstr = || version_from_confstr(host);
    let from_symbol = || version_from_symbol(host);
    let strategies: [&dyn Fn() -> Probe<String>; 2] = [&from_confstr, &from_symbol];
    first_present(&strategies)
}

fn version_from_confstr(host: &impl Host) -> Probe<String> {
    let version = host
        .confstr_libc_version()
        .and_then(|value| parse_confstr_value(&value));
    if !version.is_present() {
        log::debug!("confstr(_CS_GNU_LIBC_VERSION) unusable, trying gnu_get_libc_version");
    }
    version
}

fn version_from_symbol(host: &impl Host) -> Probe<String> {
    let version = host.libc_symbol_version().non_empty();
    if !version.is_present() {
        log::debug!("gnu_get_libc_version not found, assuming we are not using glibc");
    }
    version
}

/// The value needs to be exactly `<lib> <version>`, anything else is ignored
fn parse_confstr_value(value: &str) -> Probe<String> {
    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(version), None) => Probe::Present(version.to_string()),
        _ => Probe::Absent,
    }
}

#[cfg(target_os = "linux")]
pub(crate) mod sys {
    use std::ffi::{CStr, c_char};

    #[cfg(target_env = "gnu")]
    use libc::_CS_GNU_LIBC_VERSION as CS_GNU_LIBC_VERSION;
    // Same value as <bits/confname.h>, the libc crate only exports it for gnu targets.
    // musl answers EINVAL for it, which is what we want.
    #[cfg(not(target_env = "gnu"))]
    const CS_GNU_LIBC_VERSION: std::ffi::c_int = 2;

    pub(crate) fn confstr_gnu_libc_version() -> Option<String> {
        // SAFETY: a null buffer of length 0 only asks for the size needed, nul included
        let len = unsafe { libc::confstr(CS_GNU_LIBC_VERSION, std::ptr::null_mut(), 0) };
        if len == 0 {
            return None;
        }

        let mut buf = vec![0u8; len];
        // SAFETY: `buf` is `len` bytes long
        let written = unsafe { libc::confstr(CS_GNU_LIBC_VERSION, buf.as_mut_ptr().cast(), len) };
        if written == 0 || written > len {
            return None;
        }

        CStr::from_bytes_until_nul(&buf)
            .ok()
            .map(|s| s.to_string_lossy().into_owned())
    }

    pub(crate) fn gnu_get_libc_version() -> Option<String> {
        // "If filename is NULL, then the returned handle is for the main program"
        // so the linker figures out which libc we are using for us.
        // SAFETY: dlopen accepts a null filename
        let handle = unsafe { libc::dlopen(std::ptr::null(), libc::RTLD_LAZY) };
        if handle.is_null() {
            return None;
        }

        // SAFETY: `handle` is a valid handle from dlopen and the name is nul terminated
        let symbol = unsafe { libc::dlsym(handle, c"gnu_get_libc_version".as_ptr()) };
        let version = if symbol.is_null() {
            None
        } else {
            // SAFETY: the symbol is `const char *gnu_get_libc_version(void)` in glibc
            let func: unsafe extern "C" fn() -> *const c_char =
                unsafe { std::mem::transmute(symbol) };
            // SAFETY: glibc returns a pointer to a static nul terminated string
            let ptr = unsafe { func() };
            if ptr.is_null() {
                None
            } else {
                Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
            }
        };

        // SAFETY: handle came from dlopen above and is not used after this
        unsafe { libc::dlclose(handle) };
        version
    }
}

#[cfg(not(target_os = "linux"))]
pub(crate) mod sys {
    pub(crate) fn confstr_gnu_libc_version() -> Option<String> {
        None
    }

    pub(crate) fn gnu_get_libc_version() -> Option<String> {
        None
    }
}
