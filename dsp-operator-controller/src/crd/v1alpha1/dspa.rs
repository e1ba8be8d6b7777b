// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use kube::CustomResource;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::crd::v1alpha1::common::{ResourceRequirements, S3CredentialSecret, SecretKeyValue};

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(
    kind = "DataSciencePipelinesApplication",
    group = "datasciencepipelinesapplications.opendatahub.io",
    version = "v1alpha1",
    status = "DspaStatus",
    shortname = "dspa",
    doc = "DataSciencePipelinesApplication describes a Data Science Pipelines deployment and its backing services.",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Phase", "type":"string", "description":"Current phase of the resource", "jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Version", "type":"string", "description":"Pipelines version", "jsonPath":".spec.dspVersion"}"#,
    printcolumn = r#"{"name":"Last Updated", "type":"date", "description":"Last time the resource was updated", "jsonPath":".status.lastUpdated"}"#,
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct DspaSpec {
    /// DS Pipelines API Server configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_server: Option<ApiServer>,
    /// DS Pipelines PersistenceAgent configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistence_agent: Option<PersistenceAgent>,
    /// DS Pipelines Scheduled Workflow configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_workflow: Option<ScheduledWorkflow>,
    /// Database used for pipelines metadata tracking. Specify either the default
    /// MariaDB deployment, or an external SQL database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<Database>,
    /// Deploy the KFP UI. Unsupported, primarily used for exploration and development.
    #[serde(default, rename = "mlpipelineUI", skip_serializing_if = "Option::is_none")]
    pub ml_pipeline_ui: Option<MlPipelineUi>,
    /// Object store used for artifact passing and storage. Specify either external
    /// storage (e.g. AWS S3), or the Minio deployment.
    pub object_storage: ObjectStorage,
    /// ML Metadata configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mlmd: Option<Mlmd>,
    #[serde(default, rename = "crdviewer", skip_serializing_if = "Option::is_none")]
    pub crd_viewer: Option<ImageOnlyComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization_server: Option<ImageOnlyComponent>,
    /// Argo Workflow Controller configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_controller: Option<ImageOnlyComponent>,
    /// Pipelines version, `v1` or `v2`.
    #[serde(default = "default_dsp_version")]
    pub dsp_version: String,
    /// Workflow engine used by pipelines v2, `argo` or `tekton`.
    #[serde(default = "default_engine_driver")]
    pub engine_driver: String,
}

fn default_dsp_version() -> String {
    "v1".to_string()
}

fn default_engine_driver() -> String {
    "argo".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiServer {
    /// Enable operator management of the API server. Default: true
    #[serde(default = "default_true")]
    pub deploy: bool,
    /// Custom image for the API server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_tekton_custom_resource: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_logs: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_image: Option<String>,
    /// Image used in the 'move-all-results-to-tekton-home' step of taskruns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_results_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_script_config_map: Option<ArtifactScriptConfigMap>,
    /// Inject the archive step script. Default: true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inject_default_script: Option<bool>,
    #[serde(default, rename = "stripEOF", skip_serializing_if = "Option::is_none")]
    pub strip_eof: Option<bool>,
    /// One of "Cancelled", "StoppedRunFinally", "CancelledRunFinally". Default: Cancelled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminate_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_artifacts: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_config_con_max_lifetime_sec: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collect_metrics: Option<bool>,
    /// Create a Route for this API server. Default: true
    #[serde(default, rename = "enableOauth", skip_serializing_if = "Option::is_none")]
    pub enable_route: Option<bool>,
    /// Include sample pipelines. Default: true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_sample_pipeline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_update_pipeline_default_version: Option<bool>,
    /// Custom Pod resource requirements for this component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
pub struct ArtifactScriptConfigMap {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub key: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PersistenceAgent {
    #[serde(default = "default_true")]
    pub deploy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Number of workers for the sync job. Default: 2
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_workers: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledWorkflow {
    #[serde(default = "default_true")]
    pub deploy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Cron timezone used for scheduled runs. Default: UTC
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron_schedule_timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MlPipelineUi {
    #[serde(default = "default_true")]
    pub deploy: bool,
    #[serde(default, rename = "configMap", skip_serializing_if = "Option::is_none")]
    pub config_map_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
    /// Image for the KFP UI pod. Required.
    #[serde(default)]
    pub image: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    #[serde(default, rename = "mariaDB", skip_serializing_if = "Option::is_none")]
    pub mariadb: Option<MariaDb>,
    #[serde(default, rename = "externalDB", skip_serializing_if = "Option::is_none")]
    pub external_db: Option<ExternalDb>,
    #[serde(default)]
    pub disable_health_check: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MariaDb {
    #[serde(default = "default_true")]
    pub deploy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// The MariaDB user to create. Default: mlpipeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_secret: Option<SecretKeyValue>,
    /// The database to create. Default: mlpipeline
    #[serde(default, rename = "pipelineDBName", skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,
    /// Size of the PVC created for MariaDB. Default: 10Gi
    #[serde(default, rename = "pvcSize", skip_serializing_if = "Option::is_none")]
    pub pvc_size: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExternalDb {
    pub host: String,
    pub port: String,
    pub username: String,
    #[serde(rename = "pipelineDBName")]
    pub db_name: String,
    pub password_secret: SecretKeyValue,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ObjectStorage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minio: Option<Minio>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_storage: Option<ExternalStorage>,
    #[serde(default)]
    pub disable_health_check: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Minio {
    #[serde(default = "default_true")]
    pub deploy: bool,
    /// Bucket used to store artifacts. Default: mlpipeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    /// Credentials for the S3 user. The user needs permission to create the bucket
    /// if it does not exist.
    #[serde(default, rename = "s3CredentialsSecret", skip_serializing_if = "Option::is_none")]
    pub s3_credential_secret: Option<S3CredentialSecret>,
    #[serde(default, rename = "pvcSize", skip_serializing_if = "Option::is_none")]
    pub pvc_size: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
    /// Image for the Minio pod. Required.
    #[serde(default)]
    pub image: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExternalStorage {
    pub host: String,
    pub bucket: String,
    pub scheme: String,
    #[serde(rename = "s3CredentialsSecret")]
    pub s3_credential_secret: S3CredentialSecret,
    /// Use TLS. Inferred from the scheme when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    #[serde(default)]
    pub port: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
pub struct Mlmd {
    #[serde(default = "default_true")]
    pub deploy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub envoy: Option<MlmdComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grpc: Option<MlmdGrpc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writer: Option<MlmdComponent>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
pub struct MlmdComponent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
    #[serde(default)]
    pub image: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
pub struct MlmdGrpc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub port: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
pub struct ImageOnlyComponent {
    #[serde(default = "default_true")]
    pub deploy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct DspaStatus {
    #[serde(default)]
    pub phase: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<DspaCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters_hash: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DspaCondition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
    pub reason: String,
    #[serde(default)]
    pub message: String,
    pub last_transition_time: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minimal_spec_takes_toggle_defaults() {
        let spec: DspaSpec = serde_json::from_value(json!({
            "objectStorage": {"minio": {"image": "quay.io/minio/minio:latest"}}
        }))
        .unwrap();

        assert_eq!(spec.dsp_version, "v1");
        assert_eq!(spec.engine_driver, "argo");
        assert!(spec.api_server.is_none());
        assert!(spec.database.is_none());
        let minio = spec.object_storage.minio.unwrap();
        assert!(minio.deploy);
        assert_eq!(minio.bucket, None);
    }

    #[test]
    fn wire_names_match_the_crd_schema() {
        let spec: DspaSpec = serde_json::from_value(json!({
            "apiServer": {"stripEOF": false, "enableOauth": false},
            "mlpipelineUI": {"image": "ui:1", "configMap": "ui-config"},
            "crdviewer": {"deploy": false},
            "database": {
                "mariaDB": {"pipelineDBName": "pipes", "pvcSize": "20Gi"},
                "externalDB": {
                    "host": "db.example.com",
                    "port": "5432",
                    "username": "svc",
                    "pipelineDBName": "pipelines",
                    "passwordSecret": {"name": "my-db-secret", "key": "pw"}
                }
            },
            "objectStorage": {
                "externalStorage": {
                    "host": "s3.amazonaws.com",
                    "bucket": "artifacts",
                    "scheme": "https",
                    "s3CredentialsSecret": {"secretName": "s3", "accessKey": "ak", "secretKey": "sk"}
                }
            }
        }))
        .unwrap();

        let api_server = spec.api_server.unwrap();
        assert!(api_server.deploy);
        assert_eq!(api_server.strip_eof, Some(false));
        assert_eq!(api_server.enable_route, Some(false));
        assert_eq!(spec.ml_pipeline_ui.unwrap().config_map_name.as_deref(), Some("ui-config"));
        assert!(!spec.crd_viewer.unwrap().deploy);

        let database = spec.database.unwrap();
        assert_eq!(database.mariadb.unwrap().db_name.as_deref(), Some("pipes"));
        assert_eq!(database.external_db.unwrap().password_secret.key, "pw");

        let external = spec.object_storage.external_storage.unwrap();
        assert_eq!(external.secure, None);
        assert_eq!(external.port, "");
        assert_eq!(external.s3_credential_secret.secret_name, "s3");
    }
}
