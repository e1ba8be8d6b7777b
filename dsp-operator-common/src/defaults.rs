// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

//! Read-only registry of default values addressed by dotted configuration paths.
//!
//! The registry is flattened once from the extracted [`AppConfig`], so a path
//! like `images_v2.argo.api_server` maps to the same value whether it came from
//! the compiled defaults, the config file or a `DSPO__IMAGES_V2__ARGO__API_SERVER`
//! environment variable.

use std::collections::BTreeMap;
use serde_json::Value;

use crate::config::AppConfig;
use crate::constant::DEFAULT_IMAGE_VALUE;

// Legacy pipeline images
pub const API_SERVER_IMAGE_PATH: &str = "images.api_server";
pub const ARTIFACT_IMAGE_PATH: &str = "images.artifact";
pub const CACHE_IMAGE_PATH: &str = "images.cache";
pub const MOVE_RESULTS_IMAGE_PATH: &str = "images.move_results_image";
pub const PERSISTENCE_AGENT_IMAGE_PATH: &str = "images.persistent_agent";
pub const SCHEDULED_WORKFLOW_IMAGE_PATH: &str = "images.scheduled_workflow";
pub const MLMD_ENVOY_IMAGE_PATH: &str = "images.mlmd_envoy";
pub const MLMD_GRPC_IMAGE_PATH: &str = "images.mlmd_grpc";
pub const MLMD_WRITER_IMAGE_PATH: &str = "images.mlmd_writer";

// Pipelines v2 on Argo
pub const API_SERVER_IMAGE_PATH_V2_ARGO: &str = "images_v2.argo.api_server";
pub const ARTIFACT_IMAGE_PATH_V2_ARGO: &str = "images_v2.argo.artifact";
pub const CACHE_IMAGE_PATH_V2_ARGO: &str = "images_v2.argo.cache";
pub const MOVE_RESULTS_IMAGE_PATH_V2_ARGO: &str = "images_v2.argo.move_results_image";
pub const PERSISTENCE_AGENT_IMAGE_PATH_V2_ARGO: &str = "images_v2.argo.persistent_agent";
pub const SCHEDULED_WORKFLOW_IMAGE_PATH_V2_ARGO: &str = "images_v2.argo.scheduled_workflow";
pub const MLMD_ENVOY_IMAGE_PATH_V2_ARGO: &str = "images_v2.argo.mlmd_envoy";
pub const MLMD_GRPC_IMAGE_PATH_V2_ARGO: &str = "images_v2.argo.mlmd_grpc";
pub const MLMD_WRITER_IMAGE_PATH_V2_ARGO: &str = "images_v2.argo.mlmd_writer";

// Pipelines v2 on Tekton
pub const API_SERVER_IMAGE_PATH_V2_TEKTON: &str = "images_v2.tekton.api_server";
pub const ARTIFACT_IMAGE_PATH_V2_TEKTON: &str = "images_v2.tekton.artifact";
pub const CACHE_IMAGE_PATH_V2_TEKTON: &str = "images_v2.tekton.cache";
pub const MOVE_RESULTS_IMAGE_PATH_V2_TEKTON: &str = "images_v2.tekton.move_results_image";
pub const PERSISTENCE_AGENT_IMAGE_PATH_V2_TEKTON: &str = "images_v2.tekton.persistent_agent";
pub const SCHEDULED_WORKFLOW_IMAGE_PATH_V2_TEKTON: &str = "images_v2.tekton.scheduled_workflow";
pub const MLMD_ENVOY_IMAGE_PATH_V2_TEKTON: &str = "images_v2.tekton.mlmd_envoy";
pub const MLMD_GRPC_IMAGE_PATH_V2_TEKTON: &str = "images_v2.tekton.mlmd_grpc";
pub const MLMD_WRITER_IMAGE_PATH_V2_TEKTON: &str = "images_v2.tekton.mlmd_writer";

// Not gated on the pipeline version
pub const MARIADB_IMAGE_PATH: &str = "images.mariadb";
pub const OAUTH_PROXY_IMAGE_PATH: &str = "images.oauth_proxy";
pub const CRD_VIEWER_IMAGE_PATH: &str = "images.crd_viewer";
pub const VISUALIZATION_SERVER_IMAGE_PATH: &str = "images.visualization_server";
pub const WORKFLOW_CONTROLLER_IMAGE_PATH: &str = "images.workflow_controller";

/// Paths an operator deployment is expected to configure
pub const REQUIRED_PATHS: &[&str] = &[
    API_SERVER_IMAGE_PATH,
    ARTIFACT_IMAGE_PATH,
    PERSISTENCE_AGENT_IMAGE_PATH,
    SCHEDULED_WORKFLOW_IMAGE_PATH,
    CACHE_IMAGE_PATH,
    MOVE_RESULTS_IMAGE_PATH,
    MARIADB_IMAGE_PATH,
    OAUTH_PROXY_IMAGE_PATH,
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultsRegistry {
    values: BTreeMap<String, String>,
}

impl DefaultsRegistry {
    /// Flatten every non-empty string leaf of the configuration into a dotted path
    pub fn from_config(config: &AppConfig) -> Result<Self, serde_json::Error> {
        let mut values = BTreeMap::new();
        flatten_into(&mut values, String::new(), serde_json::to_value(config)?);

        Ok(DefaultsRegistry { values })
    }

    /// Configured value at `path`, if any
    pub fn get(&self, path: &str) -> Option<&str> {
        self.values.get(path).map(String::as_str)
    }

    /// Configured value at `path`, or the default image sentinel
    pub fn lookup(&self, path: &str) -> &str {
        self.get(path).unwrap_or(DEFAULT_IMAGE_VALUE)
    }

    pub fn missing_required(&self) -> Vec<&'static str> {
        REQUIRED_PATHS
            .iter()
            .copied()
            .filter(|path| !self.values.contains_key(*path))
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for DefaultsRegistry
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        DefaultsRegistry {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .filter(|(_, v)| !v.is_empty())
                .collect(),
        }
    }
}

fn flatten_into(values: &mut BTreeMap<String, String>, prefix: String, value: Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = match prefix.is_empty() {
                    true => key,
                    false => format!("{}.{}", prefix, key),
                };
                flatten_into(values, path, child);
            }
        }
        Value::String(s) if !s.is_empty() => {
            values.insert(prefix, s);
        }
        _ => (),
    }
}
