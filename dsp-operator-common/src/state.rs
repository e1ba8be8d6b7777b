// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use std::sync::Arc;

use crate::config::AppConfig;
use crate::defaults::DefaultsRegistry;

#[derive(Clone, Default, Debug)]
pub struct State {
    pub config: AppConfig,
    pub defaults: Arc<DefaultsRegistry>,
}

impl State {
    /// Build the shared state, freezing the defaults registry derived from `config`
    pub fn new(config: AppConfig) -> Result<Self, serde_json::Error> {
        let defaults = Arc::new(DefaultsRegistry::from_config(&config)?);
        Ok(State { config, defaults })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImageConfig;
    use crate::defaults::MARIADB_IMAGE_PATH;

    #[test]
    fn new_freezes_configured_defaults() {
        let config = AppConfig {
            images: ImageConfig {
                mariadb: Some("quay.io/dsp/mariadb:10".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let state = State::new(config).unwrap();

        assert_eq!(state.defaults.get(MARIADB_IMAGE_PATH), Some("quay.io/dsp/mariadb:10"));
    }
}
