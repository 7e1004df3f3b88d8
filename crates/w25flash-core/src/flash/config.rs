//! Driver configuration

/// Default number of status polls before a ready-wait gives up
pub const DEFAULT_READY_POLLS: u32 = 5000;
/// Default delay between status polls in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 1;
/// Default delay after release from power down in milliseconds
pub const DEFAULT_WAKE_DELAY_MS: u32 = 1;

/// How Write Enable is confirmed before a program/erase opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "kebab-case"))]
pub enum WriteEnableMode {
    /// Send WREN once and trust it
    #[default]
    FireAndForget,
    /// Send WREN, then poll until WEL reads back set
    Verify,
}

/// Whether erase addresses must sit on an erase-unit boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "kebab-case"))]
pub enum EraseAlignment {
    /// Send the address as given; the chip erases the unit containing it
    #[default]
    Unchecked,
    /// Reject misaligned addresses before any bus traffic
    Strict,
}

/// Configuration for a [`DeviceHandle`](super::DeviceHandle)
///
/// # Example
///
/// ```
/// use w25flash_core::flash::{DriverConfig, WriteEnableMode};
///
/// let config = DriverConfig::default()
///     .with_ready_polls(100)
///     .with_write_enable(WriteEnableMode::Verify);
/// assert_eq!(config.ready_polls, 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(default, deny_unknown_fields))]
pub struct DriverConfig {
    /// Maximum status reads in one ready-wait (at least 1)
    pub ready_polls: u32,
    /// Delay between status reads in milliseconds
    pub poll_interval_ms: u32,
    /// Delay after release from power down in milliseconds
    pub wake_delay_ms: u32,
    /// Write Enable confirmation policy
    pub write_enable: WriteEnableMode,
    /// Erase address alignment policy
    pub erase_alignment: EraseAlignment,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            ready_polls: DEFAULT_READY_POLLS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            wake_delay_ms: DEFAULT_WAKE_DELAY_MS,
            write_enable: WriteEnableMode::default(),
            erase_alignment: EraseAlignment::default(),
        }
    }
}

impl DriverConfig {
    /// Both optional checks enabled
    pub fn strict() -> Self {
        Self::default()
            .with_write_enable(WriteEnableMode::Verify)
            .with_erase_alignment(EraseAlignment::Strict)
    }

    /// Set the ready-wait poll budget (clamped to at least 1)
    pub fn with_ready_polls(mut self, polls: u32) -> Self {
        self.ready_polls = polls.max(1);
        self
    }

    /// Set the delay between status polls
    pub fn with_poll_interval_ms(mut self, ms: u32) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set the wake-up delay
    pub fn with_wake_delay_ms(mut self, ms: u32) -> Self {
        self.wake_delay_ms = ms;
        self
    }

    /// Set the Write Enable policy
    pub fn with_write_enable(mut self, mode: WriteEnableMode) -> Self {
        self.write_enable = mode;
        self
    }

    /// Set the erase alignment policy
    pub fn with_erase_alignment(mut self, alignment: EraseAlignment) -> Self {
        self.erase_alignment = alignment;
        self
    }

    /// Poll budget actually used by the ready-wait loop
    pub(crate) fn effective_polls(&self) -> u32 {
        self.ready_polls.max(1)
    }
}

/// Error loading a [`DriverConfig`] from TOML
#[cfg(feature = "std")]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML syntax or schema error
    #[error("failed to parse driver config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value parsed but is unusable
    #[error("invalid driver config: {0}")]
    Invalid(&'static str),
}

#[cfg(feature = "std")]
impl DriverConfig {
    /// Parse a configuration from TOML
    ///
    /// Missing keys take their default values.
    ///
    /// ```toml
    /// ready_polls = 5000
    /// poll_interval_ms = 1
    /// wake_delay_ms = 1
    /// write_enable = "verify"
    /// erase_alignment = "strict"
    /// ```
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        if config.ready_polls == 0 {
            return Err(ConfigError::Invalid("ready_polls must be at least 1"));
        }
        Ok(config)
    }

    /// Serialize the configuration to TOML
    pub fn to_toml_string(&self) -> Result<std::string::String, toml::ser::Error> {
        toml::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DriverConfig::default();
        assert_eq!(config.ready_polls, 5000);
        assert_eq!(config.poll_interval_ms, 1);
        assert_eq!(config.wake_delay_ms, 1);
        assert_eq!(config.write_enable, WriteEnableMode::FireAndForget);
        assert_eq!(config.erase_alignment, EraseAlignment::Unchecked);
    }

    #[test]
    fn test_ready_polls_clamped() {
        let config = DriverConfig::default().with_ready_polls(0);
        assert_eq!(config.ready_polls, 1);
    }

    #[test]
    fn test_strict() {
        let config = DriverConfig::strict();
        assert_eq!(config.write_enable, WriteEnableMode::Verify);
        assert_eq!(config.erase_alignment, EraseAlignment::Strict);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_from_toml() {
        let config = DriverConfig::from_toml_str(
            r#"
            ready_polls = 200
            write_enable = "verify"
            erase_alignment = "strict"
            "#,
        )
        .unwrap();
        assert_eq!(config.ready_polls, 200);
        assert_eq!(config.poll_interval_ms, 1);
        assert_eq!(config.write_enable, WriteEnableMode::Verify);
        assert_eq!(config.erase_alignment, EraseAlignment::Strict);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_from_toml_rejects_zero_polls() {
        let err = DriverConfig::from_toml_str("ready_polls = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_from_toml_rejects_unknown_keys() {
        let err = DriverConfig::from_toml_str("timeout = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_toml_round_trip() {
        let config = DriverConfig::strict().with_wake_delay_ms(3);
        let text = config.to_toml_string().unwrap();
        assert_eq!(DriverConfig::from_toml_str(&text).unwrap(), config);
    }
}
