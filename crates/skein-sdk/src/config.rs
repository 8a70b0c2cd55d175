use std::fs;
use std::path::Path;

use tracing::debug;

use skein_encoder::EncoderConfig;

use crate::error::{SdkError, SdkResult};

/// Read an [`EncoderConfig`] from a TOML file. Missing keys take their
/// defaults.
pub fn load_config(path: impl AsRef<Path>) -> SdkResult<EncoderConfig> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let config = EncoderConfig::from_toml_str(&text).map_err(|e| SdkError::Config {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    debug!(path = %path.display(), ?config, "loaded encoder config");
    Ok(config)
}

/// Write `config` as TOML, replacing any existing file.
pub fn save_config(path: impl AsRef<Path>, config: &EncoderConfig) -> SdkResult<()> {
    let path = path.as_ref();
    let text = config.to_toml_string().map_err(|e| SdkError::Config {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use skein_sink::IntEncoding;

    #[test]
    fn load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skein.toml");
        fs::write(&path, "int_encoding = \"varint\"\ndrain_pending = false\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.int_encoding, IntEncoding::Varint);
        assert!(!config.drain_pending);
        assert_eq!(config.max_depth, EncoderConfig::default().max_depth);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skein.toml");
        let config = EncoderConfig {
            max_depth: 12,
            ..EncoderConfig::default()
        };
        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn invalid_values_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "max_depth = 0\n").unwrap();
        match load_config(&path) {
            Err(SdkError::Config { path: p, .. }) => assert!(p.ends_with("bad.toml")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_io() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_config(dir.path().join("absent.toml")),
            Err(SdkError::Io(_))
        ));
    }
}
