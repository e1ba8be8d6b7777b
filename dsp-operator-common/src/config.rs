// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use std::path::Path;
use serde::{Serialize, Deserialize};
use figment::{Figment, Error, providers::{Format, Json, Yaml, Env, Serialized}};

use crate::constant::ENV_PREFIX;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[allow(unused)]
#[derive(Default)]
pub struct AppConfig {
    #[serde(default)]
    pub controller: ControllerConfig,
    /// Legacy (v1) pipeline images and images that are not gated on the
    /// pipeline version.
    #[serde(default)]
    pub images: ImageConfig,
    /// Pipelines v2 images, one set per engine driver.
    #[serde(default)]
    pub images_v2: ImagesV2Config,
}


#[derive(Debug, Deserialize, Serialize, Clone)]
#[allow(unused)]
pub struct ControllerConfig {
    #[serde(default)]
    pub requeue_interval_secs: u64,
    #[serde(default)]
    pub error_requeue_secs: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            requeue_interval_secs: 30,
            error_requeue_secs: 30,
        }
    }
}

/// Image references keyed by component. Every field is optional, an unset
/// image resolves to the default image sentinel at lookup time.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[allow(unused)]
pub struct ImageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_results_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_workflow: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mlmd_envoy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mlmd_grpc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mlmd_writer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mariadb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_proxy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crd_viewer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization_server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_controller: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[allow(unused)]
pub struct ImagesV2Config {
    #[serde(default)]
    pub argo: ImageConfig,
    #[serde(default)]
    pub tekton: ImageConfig,
}

pub struct AppConfigBuilder {
    figment: Figment,
}

impl AppConfigBuilder {
    pub fn with_file(&mut self, path: &str) -> &mut Self {
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();

        self.figment = match extension {
            "json" => self.figment.clone().merge(Json::file(path)),
            "yaml" | "yml" => self.figment.clone().merge(Yaml::file(path)),
            _ => self.figment.clone(),
        };
        self
    }

    pub fn with_env(&mut self) -> &mut Self {
        self.figment = self.figment.clone().merge(Env::prefixed(&format!("{}__", ENV_PREFIX)).split("__"));
        self
    }

    pub fn with_override_option(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.figment = self.figment.clone().merge(Serialized::default(key, value));
        }
        self
    }

    pub fn build(&self) -> Result<AppConfig, Error> {
        self.figment.extract()
    }
}

impl Default for AppConfigBuilder {
    fn default() -> Self {
        AppConfigBuilder {
            figment: Figment::from(Serialized::defaults(AppConfig::default()))
        }
    }
}
