use std::error::Error;
use std::fmt;

use keyring::Entry;

/// Describes failures when attempting to read the system keyring.
///
/// Recoverable errors mean the backend was temporarily unavailable (a
/// locked keychain, no secret service running). Permanent errors surface
/// the underlying cause directly.
#[derive(Debug)]
pub enum KeyringAccessError {
    Recoverable(keyring::Error),
    Permanent(keyring::Error),
}

impl KeyringAccessError {
    fn inner(&self) -> &keyring::Error {
        match self {
            KeyringAccessError::Recoverable(err) | KeyringAccessError::Permanent(err) => err,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, KeyringAccessError::Recoverable(_))
    }
}

impl From<keyring::Error> for KeyringAccessError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_) => {
                KeyringAccessError::Recoverable(err)
            }
            other => KeyringAccessError::Permanent(other),
        }
    }
}

impl fmt::Display for KeyringAccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner())
    }
}

impl Error for KeyringAccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.inner())
    }
}

/// Look up a stored secret. A missing entry is `Ok(None)`.
pub fn read_secret(service: &str, user: &str) -> Result<Option<String>, KeyringAccessError> {
    let entry = Entry::new(service, user)?;
    match entry.get_password() {
        Ok(secret) => Ok(Some(secret)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Store a secret, replacing any previous value.
pub fn write_secret(service: &str, user: &str, secret: &str) -> Result<(), KeyringAccessError> {
    let entry = Entry::new(service, user)?;
    entry.set_password(secret)?;
    Ok(())
}
