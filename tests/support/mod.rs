#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores the previous values on unwind and serializes access to the
/// process environment, since tests run in parallel threads.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

/// Every variable the configuration loader reads, cleared.
pub const CLEAN_ENV: &[(&str, Option<&str>)] = &[
    ("FORECAST_CONFIG", None),
    ("HOST", None),
    ("PORT", None),
    ("FORECAST_TIMEOUT_SECS", None),
];

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// `count` consecutive daily ISO dates starting at `start`.
pub fn daily_dates(start: &str, count: usize) -> Vec<String> {
    let start = chrono::NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
    start
        .iter_days()
        .take(count)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect()
}

/// A trending series with a weekly bump.
pub fn trending_values(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| 50.0 + 0.5 * i as f64 + if i % 7 < 2 { 8.0 } else { 0.0 })
        .collect()
}
