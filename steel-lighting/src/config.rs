//! Engine configuration, stored as JSON5 next to the server config.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{access::Side, error::LightingError};

const DEFAULT_CONFIG: &str = r"{
    // Log when a thread other than the owner touches the engine.
    enable_illegal_thread_access_warnings: true,
    // Let do_random_relight_checks walk chunks every tick.
    do_random_light_updates: false,
    // Raise the schedule queue maxima, costs a few megabytes per world.
    large_buffers: false,
    random_checks_server: 32,
    random_checks_client: 64,
    random_checks_client_updating: 256,
}
";

const SMALL_MAX_SERVER: usize = 1 << 15;
const SMALL_MAX_CLIENT: usize = 1 << 16;
const LARGE_MAX_SERVER: usize = 1 << 19;
const LARGE_MAX_CLIENT: usize = 1 << 20;

/// Tunables of a [`LightEngine`](crate::LightEngine).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Log cross-thread engine access.
    pub enable_illegal_thread_access_warnings: bool,
    /// Allow `do_random_relight_checks` to do any work.
    pub do_random_light_updates: bool,
    /// Use the large schedule queue maxima.
    pub large_buffers: bool,
    /// Overrides the server side schedule queue maximum.
    pub max_scheduled_updates_server: Option<usize>,
    /// Overrides the client side schedule queue maximum.
    pub max_scheduled_updates_client: Option<usize>,
    /// Random relight iterations per call on a server.
    pub random_checks_server: u32,
    /// Random relight iterations per call on a client.
    pub random_checks_client: u32,
    /// Random relight iterations per call on a client that is mid-update.
    pub random_checks_client_updating: u32,
}

impl LightingConfig {
    /// Reads the config at `path`, writing the default file first when it is missing.
    pub fn load_or_create(path: &Path) -> Result<Self, LightingError> {
        let io_err = |source| LightingError::ConfigIo {
            path: path.to_path_buf(),
            source,
        };

        if !path.exists() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
            fs::write(path, DEFAULT_CONFIG).map_err(io_err)?;
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(path).map_err(io_err)?;
        let config: Self =
            serde_json5::from_str(&config_str).map_err(|err| LightingError::ConfigParse {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<(), LightingError> {
        let too_small = |max: Option<usize>| max.is_some_and(|max| max < 64);
        if too_small(self.max_scheduled_updates_server) || too_small(self.max_scheduled_updates_client)
        {
            return Err(LightingError::InvalidConfig(
                "Scheduled update maximum must be at least 64",
            ));
        }
        if self.random_checks_server > 4096
            || self.random_checks_client > 4096
            || self.random_checks_client_updating > 4096
        {
            return Err(LightingError::InvalidConfig(
                "Random check iterations must be at most 4096",
            ));
        }
        Ok(())
    }

    /// Queue length at which a schedule call drains before enqueueing.
    #[must_use]
    pub fn max_scheduled_updates(&self, side: Side) -> usize {
        match side {
            Side::Server => self.max_scheduled_updates_server.unwrap_or(if self.large_buffers {
                LARGE_MAX_SERVER
            } else {
                SMALL_MAX_SERVER
            }),
            Side::Client { .. } => self.max_scheduled_updates_client.unwrap_or(if self.large_buffers {
                LARGE_MAX_CLIENT
            } else {
                SMALL_MAX_CLIENT
            }),
        }
    }

    /// Random relight iterations per call for the given side.
    #[must_use]
    pub fn random_checks(&self, side: Side) -> u32 {
        match side {
            Side::Server => self.random_checks_server,
            Side::Client { updating: false } => self.random_checks_client,
            Side::Client { updating: true } => self.random_checks_client_updating,
        }
    }
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            enable_illegal_thread_access_warnings: true,
            do_random_light_updates: false,
            large_buffers: false,
            max_scheduled_updates_server: None,
            max_scheduled_updates_client: None,
            random_checks_server: 32,
            random_checks_client: 64,
            random_checks_client_updating: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{env, process};

    use super::*;

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_default_file_matches_default() {
        let parsed: LightingConfig = serde_json5::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(parsed, LightingConfig::default());
    }

    #[test]
    fn test_queue_maxima() {
        let mut config = LightingConfig::default();
        assert_eq!(config.max_scheduled_updates(Side::Server), 1 << 15);
        assert_eq!(
            config.max_scheduled_updates(Side::Client { updating: false }),
            1 << 16
        );
        config.large_buffers = true;
        assert_eq!(config.max_scheduled_updates(Side::Server), 1 << 19);
        config.max_scheduled_updates_server = Some(128);
        assert_eq!(config.max_scheduled_updates(Side::Server), 128);
    }

    #[test]
    fn test_validate_rejects_tiny_queue() {
        let config = LightingConfig {
            max_scheduled_updates_client: Some(8),
            ..LightingConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_create_writes_default() -> anyhow::Result<()> {
        let dir = env::temp_dir().join(format!("steel-lighting-config-{}", process::id()));
        let path = dir.join("lighting.json5");
        let _ = fs::remove_file(&path);

        let created = LightingConfig::load_or_create(&path)?;
        assert_eq!(created, LightingConfig::default());
        assert!(path.exists());

        fs::write(&path, "{ do_random_light_updates: true, random_checks_server: 8 }")?;
        let loaded = LightingConfig::load_or_create(&path)?;
        assert!(loaded.do_random_light_updates);
        assert_eq!(loaded.random_checks_server, 8);
        assert!(loaded.enable_illegal_thread_access_warnings);

        fs::write(&path, "{ random_checks_client: 9000 }")?;
        assert!(matches!(
            LightingConfig::load_or_create(&path),
            Err(LightingError::InvalidConfig(_))
        ));

        fs::remove_dir_all(&dir)?;
        Ok(())
    }
}
