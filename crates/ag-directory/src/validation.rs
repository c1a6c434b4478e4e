//! Input checks applied before any directory call.

use crate::error::{DirectoryError, DirectoryResult};

/// Minimum username length accepted at login.
pub const MIN_USERNAME_LEN: usize = 3;

/// Minimum password length accepted at login.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Maximum group name length.
pub const MAX_GROUP_NAME_LEN: usize = 64;

/// Checks login input.
///
/// # Errors
///
/// Returns `InputValidation` if either value is missing or too short.
pub fn validate_login_input(username: &str, password: &str) -> DirectoryResult<()> {
    if username.is_empty() || password.is_empty() {
        return Err(DirectoryError::input("username and password are required"));
    }
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(DirectoryError::input(format!(
            "username must be at least {MIN_USERNAME_LEN} characters"
        )));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DirectoryError::input(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Checks a group name.
///
/// Names are 1 to 64 characters of ASCII letters, digits, whitespace, `-`, `_` and `.`.
///
/// # Errors
///
/// Returns `InputValidation` if the name is empty, too long or has other characters.
pub fn validate_group_name(group_name: &str) -> DirectoryResult<()> {
    let len = group_name.chars().count();
    if len == 0 || len > MAX_GROUP_NAME_LEN {
        return Err(DirectoryError::input(format!(
            "group name must be 1 to {MAX_GROUP_NAME_LEN} characters"
        )));
    }

    let allowed = |c: char| c.is_ascii_alphanumeric() || c.is_whitespace() || matches!(c, '-' | '_' | '.');
    if !group_name.chars().all(allowed) {
        return Err(DirectoryError::input("group name contains invalid characters"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_input_lengths() {
        assert!(validate_login_input("alice", "correctpw").is_ok());
        assert!(validate_login_input("al", "correctpw").is_err());
        assert!(validate_login_input("alice", "short").is_err());
        assert!(validate_login_input("", "").is_err());
    }

    #[test]
    fn group_names() {
        assert!(validate_group_name("devs").is_ok());
        assert!(validate_group_name("Team A.ops_1-x").is_ok());
        assert!(validate_group_name("").is_err());
        assert!(validate_group_name(&"g".repeat(65)).is_err());
        assert!(validate_group_name(&"g".repeat(64)).is_ok());
        assert!(matches!(
            validate_group_name("devs)(cn=*"),
            Err(DirectoryError::InputValidation(_))
        ));
    }
}
