//! Every probe in this crate either finds a value or finds nothing.
//! Failing to read something from the host is not an error for us, it only means a shorter
//! user agent, so probes return a `Probe` instead of a `Result`.

/// Outcome of a single read-only query against the host.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Probe<T> {
    Present(T),
    #[default]
    Absent,
}

impl<T> Probe<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Probe::Present(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Probe<U> {
        match self {
            Probe::Present(v) => Probe::Present(f(v)),
            Probe::Absent => Probe::Absent,
        }
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> Probe<U>) -> Probe<U> {
        match self {
            Probe::Present(v) => f(v),
            Probe::Absent => Probe::Absent,
        }
    }

    /// Only runs `f` if this probe found nothing.
    pub fn or_else(self, f: impl FnOnce() -> Probe<T>) -> Probe<T> {
        match self {
            Probe::Present(v) => Probe::Present(v),
            Probe::Absent => f(),
        }
    }

    pub fn into_option(self) -> Option<T> {
        self.into()
    }
}

impl Probe<String> {
    /// Treats an empty (or whitespace only) string the same as nothing found.
    pub fn non_empty(self) -> Probe<String> {
        self.and_then(|s| {
            if s.trim().is_empty() {
                Probe::Absent
            } else {
                Probe::Present(s)
            }
        })
    }
}

impl<T> From<Option<T>> for Probe<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Probe::Present(v),
            None => Probe::Absent,
        }
    }
}

impl<T> From<Probe<T>> for Option<T> {
    fn from(value: Probe<T>) -> Self {
        match value {
            Probe::Present(v) => Some(v),
            Probe::Absent => None,
        }
    }
}

/// Runs each strategy in order and returns the first one that found something.
/// Strategies after the first hit are never called.
pub fn first_present<T>(strategies: &[&dyn Fn() -> Probe<T>]) -> Probe<T> {
    for strategy in strategies {
        if let Probe::Present(v) = strategy() {
            return Probe::Present(v);
        }
    }
    Probe::Absent
}
