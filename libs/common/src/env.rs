//! Small helpers for reading typed configuration out of environment
//! variables, shared by every `Config::from_env` in this workspace.

use std::env;
use std::str::FromStr;

/// A required environment variable was missing, or present but unparsable.
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    #[error("missing required environment variable: {name}")]
    Missing { name: &'static str },
    #[error("environment variable {name} could not be parsed: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Read a required environment variable.
pub fn required(name: &'static str) -> Result<String, EnvError> {
    env::var(name).map_err(|_| EnvError::Missing { name })
}

/// Read a required environment variable and parse it.
pub fn required_parsed<T: FromStr>(name: &'static str) -> Result<T, EnvError>
where
    T::Err: std::fmt::Display,
{
    required(name)?
        .parse()
        .map_err(|e: T::Err| EnvError::Invalid {
            name,
            reason: e.to_string(),
        })
}

/// Read an optional environment variable, parsing it if present and
/// falling back to `default` if absent.
pub fn optional_parsed<T: FromStr>(name: &'static str, default: T) -> Result<T, EnvError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| EnvError::Invalid {
            name,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Split a comma-separated environment variable into a trimmed, non-empty
/// list of strings. Missing variable yields an empty list.
#[must_use]
pub fn comma_separated(name: &str) -> Vec<String> {
    env::var(name)
        .ok()
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Read a boolean environment variable (`"true"`/`"1"` => true), defaulting
/// to `false` when absent or unrecognized.
#[must_use]
pub fn flag(name: &str) -> bool {
    matches!(
        env::var(name).as_deref(),
        Ok("true") | Ok("1") | Ok("yes") | Ok("on")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn comma_separated_trims_and_drops_empty() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("RC_TEST_LIST", "a, b ,, c");
        assert_eq!(comma_separated("RC_TEST_LIST"), vec!["a", "b", "c"]);
        env::remove_var("RC_TEST_LIST");
    }

    #[test]
    fn comma_separated_missing_is_empty() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::remove_var("RC_TEST_LIST_MISSING");
        assert!(comma_separated("RC_TEST_LIST_MISSING").is_empty());
    }

    #[test]
    fn flag_recognizes_truthy_values() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("RC_TEST_FLAG", "true");
        assert!(flag("RC_TEST_FLAG"));
        env::set_var("RC_TEST_FLAG", "0");
        assert!(!flag("RC_TEST_FLAG"));
        env::remove_var("RC_TEST_FLAG");
    }

    #[test]
    fn required_parsed_reports_name_on_failure() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("RC_TEST_NUM", "not-a-number");
        let err = required_parsed::<i64>("RC_TEST_NUM").unwrap_err();
        assert!(matches!(err, EnvError::Invalid { name: "RC_TEST_NUM", .. }));
        env::remove_var("RC_TEST_NUM");
    }
}
