//! Client-side validation for player and game names, applied before the
//! create-player / create-game calls. The server enforces the same rules.

pub const MAX_NAME_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("name must not be empty")]
    Empty,
    #[error("name exceeds {MAX_NAME_LEN} characters")]
    TooLong,
    #[error("name may only contain letters, digits and spaces")]
    InvalidCharacters,
}

pub fn validate_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(NameError::TooLong);
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ') {
        return Err(NameError::InvalidCharacters);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_names() {
        assert_eq!(validate_name("Ana"), Ok(()));
        assert_eq!(validate_name("jugador 2"), Ok(()));
        assert_eq!(validate_name("abcdefghij0123456789"), Ok(()));
    }

    #[test]
    fn rejects_empty_and_too_long() {
        assert_eq!(validate_name(""), Err(NameError::Empty));
        assert_eq!(
            validate_name("abcdefghij0123456789x"),
            Err(NameError::TooLong)
        );
    }

    #[test]
    fn rejects_special_characters() {
        assert_eq!(validate_name("ana!"), Err(NameError::InvalidCharacters));
        assert_eq!(validate_name("añejo"), Err(NameError::InvalidCharacters));
    }
}
