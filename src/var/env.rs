//! Process environment writes.
//!
//! `std::env::set_var` panics on names and values the platform cannot hold;
//! these wrappers check first and report an error instead.

use crate::error::VarError;

fn check_name(name: &str) -> Result<(), VarError> {
    let reason = if name.is_empty() {
        "empty name"
    } else if name.contains('=') {
        "name contains '='"
    } else if name.contains('\0') {
        "name contains NUL"
    } else {
        return Ok(());
    };
    Err(VarError::Env {
        name: name.to_string(),
        reason,
    })
}

/// Whether `name=value` can be written without touching the environment.
pub(crate) fn check_env(name: &str, value: &str) -> Result<(), VarError> {
    check_name(name)?;
    if value.contains('\0') {
        return Err(VarError::Env {
            name: name.to_string(),
            reason: "value contains NUL",
        });
    }
    Ok(())
}

pub(crate) fn set_env(name: &str, value: &str) -> Result<(), VarError> {
    check_env(name, value)?;
    std::env::set_var(name, value);
    Ok(())
}

pub(crate) fn unset_env(name: &str) -> Result<(), VarError> {
    check_name(name)?;
    std::env::remove_var(name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unrepresentable() {
        assert!(check_env("LIVE_CONFIG_ENV_NUL", "a\0b").is_err());
        assert!(check_env("LIVE_CONFIG_ENV_NUL", "ab").is_ok());
        assert!(set_env("", "x").is_err());
        assert!(set_env("A=B", "x").is_err());
        assert!(set_env("LIVE_CONFIG_ENV_NUL", "a\0b").is_err());
        assert!(unset_env("A\0B").is_err());
    }

    #[test]
    fn test_set_and_unset() {
        let _env = crate::test_env_lock();
        set_env("LIVE_CONFIG_ENV_WRAPPER", "1").unwrap();
        assert_eq!(std::env::var("LIVE_CONFIG_ENV_WRAPPER").unwrap(), "1");
        unset_env("LIVE_CONFIG_ENV_WRAPPER").unwrap();
        assert!(std::env::var("LIVE_CONFIG_ENV_WRAPPER").is_err());
    }
}
