use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WindowConfigError {
    #[error("juzhali window length must be at least 1")]
    ZeroLength,

    #[error("juzhali window length {0} is not one of 10, 15, 20, 25, 30")]
    NotStandard(u16),
}

/// Evaluation settings supplied by the caller on every window or health call.
///
/// The Juzhali window length is chosen by the teacher, never derived from
/// performance. Serialized as the bare length; deserializing goes through
/// [`WindowConfig::custom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct WindowConfig {
    juzhali_length: u16,
}

impl WindowConfig {
    pub const DEFAULT_LENGTH: u16 = 10;

    /// Window lengths offered to teachers.
    pub const STANDARD_LENGTHS: [u16; 5] = [10, 15, 20, 25, 30];

    /// A window length from the standard presets.
    ///
    /// # Errors
    ///
    /// Returns `WindowConfigError::NotStandard` for any other length.
    pub fn standard(juzhali_length: u16) -> Result<Self, WindowConfigError> {
        if !Self::STANDARD_LENGTHS.contains(&juzhali_length) {
            return Err(WindowConfigError::NotStandard(juzhali_length));
        }
        Ok(Self { juzhali_length })
    }

    /// Any positive window length.
    ///
    /// # Errors
    ///
    /// Returns `WindowConfigError::ZeroLength` for 0.
    pub fn custom(juzhali_length: u16) -> Result<Self, WindowConfigError> {
        if juzhali_length == 0 {
            return Err(WindowConfigError::ZeroLength);
        }
        Ok(Self { juzhali_length })
    }

    #[must_use]
    pub fn juzhali_length(&self) -> u16 {
        self.juzhali_length
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            juzhali_length: Self::DEFAULT_LENGTH,
        }
    }
}

impl TryFrom<u16> for WindowConfig {
    type Error = WindowConfigError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::custom(value)
    }
}

impl From<WindowConfig> for u16 {
    fn from(config: WindowConfig) -> Self {
        config.juzhali_length
    }
}
