use crate::constants::{
    DEFAULT_PARENT_PIN, KEY_APP_PASSWORD, KEY_PIN, MIN_PASSWORD_LENGTH, PIN_LENGTH,
};
use crate::storage::{KeyValueStore, StorageError};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("parent PIN must be exactly 4 digits")]
    InvalidPin,
    #[error("incorrect parent PIN")]
    IncorrectPin,
    #[error("password must be at least 4 characters")]
    PasswordTooShort,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("an access password is already set")]
    AlreadySetUp,
    #[error("no access password has been set up yet")]
    NotSetUp,
    #[error("incorrect access code")]
    IncorrectPassword,
    #[error("persistence failure: {0}")]
    Persistence(#[from] StorageError),
}

pub fn is_valid_pin(pin: &str) -> bool {
    pin.len() == PIN_LENGTH && pin.chars().all(|c| c.is_ascii_digit())
}

/// Parent PIN gate & the app access password
#[derive(Debug)]
pub struct Access<'s, S: KeyValueStore + ?Sized> {
    store: &'s mut S,
}

impl<'s, S: KeyValueStore + ?Sized> Access<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Self { store }
    }

    pub fn parent_pin(&self) -> Result<String, AccessError> {
        Ok(self
            .store
            .get(KEY_PIN)?
            .unwrap_or_else(|| DEFAULT_PARENT_PIN.to_string()))
    }

    pub fn set_parent_pin(&mut self, pin: &str) -> Result<(), AccessError> {
        if !is_valid_pin(pin) {
            return Err(AccessError::InvalidPin);
        }
        self.store.set(KEY_PIN, pin.to_string())?;
        info!("parent PIN updated");
        Ok(())
    }

    pub fn verify_parent_pin(&self, input: &str) -> Result<(), AccessError> {
        if input != self.parent_pin()? {
            warn!("parent PIN rejected");
            return Err(AccessError::IncorrectPin);
        }
        Ok(())
    }

    /// True until an access password has been chosen
    pub fn needs_setup(&self) -> Result<bool, AccessError> {
        Ok(self.store.get(KEY_APP_PASSWORD)?.is_none())
    }

    /// First-run password choice
    pub fn setup_password(&mut self, password: &str, confirm: &str) -> Result<(), AccessError> {
        if !self.needs_setup()? {
            return Err(AccessError::AlreadySetUp);
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AccessError::PasswordTooShort);
        }
        if password != confirm {
            return Err(AccessError::PasswordMismatch);
        }
        self.store.set(KEY_APP_PASSWORD, password.to_string())?;
        info!("access password set up");
        Ok(())
    }

    pub fn unlock(&self, password: &str) -> Result<(), AccessError> {
        match self.store.get(KEY_APP_PASSWORD)? {
            None => Err(AccessError::NotSetUp),
            Some(saved) if saved == password => Ok(()),
            Some(_) => {
                warn!("access password rejected");
                Err(AccessError::IncorrectPassword)
            }
        }
    }
}
