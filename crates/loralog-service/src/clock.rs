use chrono::{Local, SecondsFormat};

/// Source of arrival timestamps.
pub trait Clock {
    /// Current time as ISO-8601 text.
    fn now(&self) -> String;
}

/// Local wall-clock time with offset and microsecond precision,
/// e.g. `2024-05-01T12:00:00.123456+02:00`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> String {
        Local::now().to_rfc3339_opts(SecondsFormat::Micros, false)
    }
}

impl<F: Fn() -> String> Clock for F {
    fn now(&self) -> String {
        self()
    }
}
