use serde::{Serialize, Serializer};

use crate::consts::CI_ENVIRONMENT_VARIABLES;
use crate::host::Host;

/// Whether it looks like we're running under CI.
///
/// There is deliberately no "not CI" value: not finding any of the variables doesn't prove
/// anything. It serializes as `true` or `null`, never `false`, and the field is always present
/// so it's obvious the check ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CiStatus {
    Detected,
    #[default]
    Inconclusive,
}

impl Serialize for CiStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CiStatus::Detected => serializer.serialize_bool(true),
            CiStatus::Inconclusive => serializer.serialize_none(),
        }
    }
}

// We don't check for a tty since some CI systems fake one (eg Travis CI), which means it
// doesn't tell us anything either way.
pub fn detect_ci(host: &impl Host) -> CiStatus {
    if CI_ENVIRONMENT_VARIABLES
        .iter()
        .any(|name| host.env_var_os(name).is_some())
    {
        CiStatus::Detected
    } else {
        CiStatus::Inconclusive
    }
}
