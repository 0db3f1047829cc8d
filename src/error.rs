use thiserror::Error;

use crate::parse::ParseError;
use crate::{RegistryError, SettingsError};

/// Unified error type covering registration, settings, parsing, and I/O.
///
/// Returned by convenience methods like
/// [`RuleSet::from_settings_file()`](crate::RuleSet::from_settings_file) and
/// [`Engine::load_settings_file()`](crate::Engine::load_settings_file).
#[derive(Debug, Error)]
pub enum RategateError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Serialize(#[from] crate::serial::SerializeError),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Deserialize(#[from] crate::serial::DeserializeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_error_is_transparent() {
        let err: RategateError = SettingsError::NotAnObject.into();
        assert_eq!(err.to_string(), "settings root must be a JSON object");
    }

    #[test]
    fn io_error_converts() {
        let err: RategateError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(err, RategateError::Io(_)));
    }
}
