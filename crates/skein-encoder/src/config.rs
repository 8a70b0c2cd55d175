use serde::{Deserialize, Serialize};

use skein_sink::{IntEncoding, DEFAULT_BUFFER_CAPACITY};

use crate::error::{EncodeError, EncodeResult};

/// Default nesting limit for inline object data.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Configuration for an encoding session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Integer layout used by writers built from this config.
    pub int_encoding: IntEncoding,
    /// Write buffer size in bytes for writers built from this config.
    pub buffer_capacity: usize,
    /// After the root record, write every identified object whose data
    /// was not inlined.
    pub drain_pending: bool,
    /// Maximum number of nested object bodies on the stack at once.
    ///
    /// Each level costs a few KiB of native stack in a debug build. The
    /// default fits a 2 MiB thread with room to spare; raise it only on a
    /// thread with a larger stack.
    pub max_depth: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            int_encoding: IntEncoding::Fixed,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            drain_pending: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl EncoderConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> EncodeResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| EncodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as a TOML document.
    pub fn to_toml_string(&self) -> EncodeResult<String> {
        toml::to_string(self).map_err(|e| EncodeError::Config(e.to_string()))
    }

    /// Reject settings no session can run with.
    pub fn validate(&self) -> EncodeResult<()> {
        if self.max_depth == 0 {
            return Err(EncodeError::Config("max_depth must be at least 1".into()));
        }
        if self.buffer_capacity == 0 {
            return Err(EncodeError::Config("buffer_capacity must be at least 1".into()));
        }
        Ok(())
    }
}
