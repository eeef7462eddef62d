//! Browser configuration, read from `webx.toml`.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, WebxError};

/// Largest accepted `max_body_mb`.
pub const MAX_BODY_MB_LIMIT: usize = 1024;

/// Operator-supplied configuration, snapshotted at the start of every
/// navigation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Base address of the naming lookup service.
    pub naming_service: String,
    /// Alternate ("bussinga") theme toggle.
    pub alternate_theme: bool,
    /// Proxy toggle, forwarded to script engines.
    pub proxy: bool,
    /// Whether an interactive console is attached to this session.
    pub console: bool,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    /// Response body ceiling in MB.
    pub max_body_mb: usize,
    pub max_redirects: u8,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            naming_service: "https://api.buss.lol".to_string(),
            alternate_theme: false,
            proxy: false,
            console: true,
            connect_timeout_secs: 10,
            read_timeout_secs: 15,
            max_body_mb: 8,
            max_redirects: 5,
        }
    }
}

impl BrowserConfig {
    /// Parse a configuration document. Missing keys take their defaults.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let cfg: BrowserConfig = toml::from_str(toml_str)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            },
            Err(e) => Err(e.into()),
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.naming_service.contains("://") {
            return Err(WebxError::Config(format!(
                "naming_service must be an absolute address, got {:?}",
                self.naming_service
            )));
        }
        if !(1..=MAX_BODY_MB_LIMIT).contains(&self.max_body_mb) {
            return Err(WebxError::Config(format!(
                "max_body_mb must be between 1 and {MAX_BODY_MB_LIMIT}, got {}",
                self.max_body_mb
            )));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Body ceiling in bytes. Saturates for configs built in code that
    /// never went through validation.
    pub fn max_body_bytes(&self) -> usize {
        self.max_body_mb.saturating_mul(1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_values_are_sensible() {
        let cfg = BrowserConfig::default();
        assert_eq!(cfg.naming_service, "https://api.buss.lol");
        assert!(!cfg.alternate_theme);
        assert!(!cfg.proxy);
        assert!(cfg.console);
        assert_eq!(cfg.connect_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.read_timeout(), Duration::from_secs(15));
        assert_eq!(cfg.max_redirects, 5);
    }

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = BrowserConfig::from_toml("").unwrap();
        assert_eq!(cfg, BrowserConfig::default());
    }

    #[test]
    fn partial_document_overrides_only_given_keys() {
        let cfg = BrowserConfig::from_toml(
            r#"
alternate_theme = true
naming_service = "http://127.0.0.1:8000"
"#,
        )
        .unwrap();
        assert!(cfg.alternate_theme);
        assert_eq!(cfg.naming_service, "http://127.0.0.1:8000");
        assert!(!cfg.proxy);
        assert_eq!(cfg.max_body_mb, 8);
    }

    #[test]
    fn relative_naming_service_rejected() {
        let err = BrowserConfig::from_toml(r#"naming_service = "api.buss.lol""#).unwrap_err();
        assert!(matches!(err, WebxError::Config(_)));
    }

    #[test]
    fn zero_body_ceiling_rejected() {
        let err = BrowserConfig::from_toml("max_body_mb = 0").unwrap_err();
        assert!(err.to_string().contains("max_body_mb"));
    }

    #[test]
    fn malformed_document_is_toml_error() {
        let err = BrowserConfig::from_toml("alternate_theme = [[[").unwrap_err();
        assert!(matches!(err, WebxError::TomlParse(_)));
    }

    #[test]
    fn max_body_bytes_calculation() {
        let cfg = BrowserConfig::default();
        assert_eq!(cfg.max_body_bytes(), 8 * 1024 * 1024);
    }

    #[test]
    fn oversized_body_ceiling_rejected() {
        let doc = format!("max_body_mb = {}", MAX_BODY_MB_LIMIT + 1);
        let err = BrowserConfig::from_toml(&doc).unwrap_err();
        assert!(matches!(err, WebxError::Config(_)));
    }

    #[test]
    fn unvalidated_ceiling_saturates() {
        let cfg = BrowserConfig {
            max_body_mb: usize::MAX,
            ..BrowserConfig::default()
        };
        assert_eq!(cfg.max_body_bytes(), usize::MAX);
    }

    proptest! {
        #[test]
        fn accepted_ceilings_convert_exactly(mb in 1usize..=MAX_BODY_MB_LIMIT) {
            let cfg = BrowserConfig::from_toml(&format!("max_body_mb = {mb}")).unwrap();
            prop_assert_eq!(cfg.max_body_bytes(), mb * 1024 * 1024);
        }

        #[test]
        fn timeouts_follow_seconds(connect in 0u64..86_400, read in 0u64..86_400) {
            let cfg = BrowserConfig::from_toml(&format!(
                "connect_timeout_secs = {connect}\nread_timeout_secs = {read}"
            ))
            .unwrap();
            prop_assert_eq!(cfg.connect_timeout(), Duration::from_secs(connect));
            prop_assert_eq!(cfg.read_timeout(), Duration::from_secs(read));
        }
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = BrowserConfig::load(&dir.path().join("webx.toml")).unwrap();
        assert_eq!(cfg, BrowserConfig::default());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("webx.toml");
        std::fs::write(&path, "proxy = true\nconsole = false\n").unwrap();
        let cfg = BrowserConfig::load(&path).unwrap();
        assert!(cfg.proxy);
        assert!(!cfg.console);
    }
}
