// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

//! The fully resolved configuration of a DSPA.
//!
//! Every field is concrete. Credential material is held as [`Credential`]
//! and never serialized, so the record can be hashed into the DSPA status.

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use serde::Serialize;

use crate::controller::images::ImageFamily;
use crate::controller::materializer::{Credential, CredentialOrigin, CredentialReference};
use crate::crd::hub::{common::ResourceRequirements, dspa::ArtifactScriptConfigMap};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DspaParams {
    pub name: String,
    pub namespace: String,
    pub dsp_version: String,
    pub engine_driver: String,
    #[serde(skip)]
    pub image_family: ImageFamily,
    pub api_server_service_name: String,
    pub oauth_proxy_image: String,
    pub api_server: ApiServerParams,
    pub persistence_agent: PersistenceAgentParams,
    pub scheduled_workflow: ScheduledWorkflowParams,
    pub ml_pipeline_ui: Option<UiParams>,
    pub mlmd: Option<MlmdParams>,
    pub crd_viewer: ImageOnlyParams,
    pub visualization_server: ImageOnlyParams,
    pub workflow_controller: ImageOnlyParams,
    pub database: DatabaseParams,
    pub object_storage: ObjectStorageParams,
}

impl DspaParams {
    /// Secrets this pass created, as opposed to read or adopted
    pub fn created_secrets(&self) -> Vec<&str> {
        [
            (&self.database.connection.credentials, self.database.connection.password_origin),
            (&self.object_storage.connection.credentials, self.object_storage.connection.keys_origin),
        ]
        .into_iter()
        .filter(|(_, origin)| *origin == CredentialOrigin::Created)
        .map(|(reference, _)| reference.name.as_str())
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiServerParams {
    pub deploy: bool,
    pub image: String,
    pub artifact_image: String,
    pub cache_image: String,
    pub move_results_image: String,
    pub artifact_script_config_map: ArtifactScriptConfigMap,
    pub apply_tekton_custom_resource: bool,
    pub archive_logs: bool,
    pub inject_default_script: bool,
    pub strip_eof: bool,
    pub terminate_status: String,
    pub track_artifacts: bool,
    pub db_config_con_max_lifetime_sec: i32,
    pub collect_metrics: bool,
    pub enable_route: bool,
    pub enable_sample_pipeline: bool,
    pub auto_update_pipeline_default_version: bool,
    pub resources: ResourceRequirements,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistenceAgentParams {
    pub deploy: bool,
    pub image: String,
    pub num_workers: i32,
    pub resources: ResourceRequirements,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledWorkflowParams {
    pub deploy: bool,
    pub image: String,
    pub cron_schedule_timezone: String,
    pub resources: ResourceRequirements,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiParams {
    pub deploy: bool,
    pub image: String,
    pub config_map_name: String,
    pub resources: ResourceRequirements,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MlmdParams {
    pub deploy: bool,
    pub envoy: MlmdComponentParams,
    pub grpc: MlmdGrpcParams,
    pub writer: MlmdComponentParams,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MlmdComponentParams {
    pub image: String,
    pub resources: ResourceRequirements,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MlmdGrpcParams {
    pub image: String,
    pub port: String,
    pub resources: ResourceRequirements,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageOnlyParams {
    pub deploy: bool,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseParams {
    /// `None` when an external database is used
    pub managed: Option<MariaDbParams>,
    pub connection: DbConnection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MariaDbParams {
    pub deploy: bool,
    pub image: String,
    pub username: String,
    pub db_name: String,
    pub pvc_size: Quantity,
    pub resources: ResourceRequirements,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbConnection {
    pub host: String,
    pub port: String,
    pub username: String,
    pub db_name: String,
    /// The secret the password is read from
    pub credentials: CredentialReference,
    /// `ds-pipeline-db-<dspa>`, recorded even when a custom secret is in use
    pub operator_secret: CredentialReference,
    #[serde(skip)]
    pub password: Credential,
    pub password_origin: CredentialOrigin,
    pub external: bool,
    pub disable_health_check: bool,
}

impl DbConnection {
    /// Base64 encoded password
    pub fn password(&self) -> String {
        self.password.primary()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectStorageParams {
    /// `None` when external storage is used
    pub managed: Option<MinioParams>,
    pub connection: ObjectStorageConnection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MinioParams {
    pub deploy: bool,
    pub image: String,
    pub bucket: String,
    pub pvc_size: Quantity,
    pub resources: ResourceRequirements,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectStorageConnection {
    pub host: String,
    pub port: String,
    pub scheme: String,
    pub bucket: String,
    pub secure: bool,
    pub endpoint: String,
    pub credentials: CredentialReference,
    /// `ds-pipeline-s3-<dspa>`, recorded even when a custom secret is in use
    pub operator_secret: CredentialReference,
    #[serde(skip)]
    pub keys: Credential,
    pub keys_origin: CredentialOrigin,
    pub external: bool,
    pub disable_health_check: bool,
}

impl ObjectStorageConnection {
    /// Base64 encoded access key id
    pub fn access_key(&self) -> String {
        self.keys.primary()
    }

    /// Base64 encoded secret access key
    pub fn secret_key(&self) -> String {
        self.keys.secondary()
    }
}

/// `scheme://host`, with `:port` appended when a port is set
pub fn endpoint(scheme: &str, host: &str, port: &str) -> String {
    match port.is_empty() {
        true => format!("{}://{}", scheme, host),
        false => format!("{}://{}:{}", scheme, host, port),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_omits_empty_port() {
        assert_eq!(endpoint("https", "s3.amazonaws.com", ""), "https://s3.amazonaws.com");
        assert_eq!(endpoint("http", "minio-sample.team-a.svc.cluster.local", "9000"), "http://minio-sample.team-a.svc.cluster.local:9000");
    }
}
