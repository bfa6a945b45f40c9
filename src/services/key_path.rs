use crate::errors::BrokerError;
use crate::utils::user_paths::absolutize;
use std::io::ErrorKind;

/// Resolves a private-key reference to the canonical path handed to `ssh`.
///
/// Only the file's existence is checked; the key is never opened. The file
/// can disappear between this check and the spawn of the client.
#[derive(Debug, Clone, Default)]
pub struct KeyPathValidator;

impl KeyPathValidator {
    pub fn new() -> Self {
        Self
    }

    /// Surrounding whitespace is kept: it is part of the file name.
    pub fn validate(&self, raw: &str) -> Result<String, BrokerError> {
        if raw.trim().is_empty() {
            return Err(BrokerError::invalid_input(
                "privateKeyPath must be a non-empty string",
            ));
        }
        if raw.contains('\0') {
            return Err(BrokerError::invalid_input(
                "privateKeyPath must not contain null bytes",
            ));
        }

        let absolute = absolutize(raw).map_err(|err| {
            BrokerError::invalid_input(format!("Cannot resolve {}: {}", raw, err))
        })?;
        let not_found = || BrokerError::NotFound {
            path: absolute.display().to_string(),
        };

        let canonical = match std::fs::canonicalize(&absolute) {
            Ok(path) => path,
            Err(err) if err.kind() == ErrorKind::NotFound || !absolute.exists() => {
                return Err(not_found())
            }
            Err(err) => {
                return Err(BrokerError::invalid_input(format!(
                    "Private key path {} is not accessible: {}",
                    absolute.display(),
                    err
                )))
            }
        };
        if !canonical.is_file() {
            return Err(not_found());
        }

        canonical.to_str().map(str::to_string).ok_or_else(|| {
            BrokerError::invalid_input(format!(
                "Private key path {} is not valid UTF-8",
                canonical.display()
            ))
        })
    }
}
