// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use chrono::{DateTime, Utc};
use k8s_openapi::{
    apimachinery::pkg::api::resource::Quantity,
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::crd::{hub::traits::Hub, hub::common::{ResourceRequirements, S3CredentialSecret, SecretKeyValue}, v1alpha1};

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct DataSciencePipelinesApplication {
    pub metadata: ObjectMeta,
    pub spec: DspaSpec,
    pub status: Option<DspaStatus>,
}

impl Hub for DataSciencePipelinesApplication {}

impl From<v1alpha1::dspa::DataSciencePipelinesApplication> for DataSciencePipelinesApplication {
    fn from(dspa: v1alpha1::dspa::DataSciencePipelinesApplication) -> Self {
        DataSciencePipelinesApplication {
            metadata: dspa.metadata,
            spec: dspa.spec.into(),
            status: dspa.status.map(|status| status.into()),
        }
    }
}

/// The desired state of a pipelines deployment. An absent component block
/// leaves every decision about that component to the operator.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct DspaSpec {
    pub api_server: Option<ApiServer>,
    pub persistence_agent: Option<PersistenceAgent>,
    pub scheduled_workflow: Option<ScheduledWorkflow>,
    pub database: Database,
    pub ml_pipeline_ui: Option<MlPipelineUi>,
    pub object_storage: ObjectStorage,
    pub mlmd: Option<Mlmd>,
    pub crd_viewer: Option<ImageOnlyComponent>,
    pub visualization_server: Option<ImageOnlyComponent>,
    pub workflow_controller: Option<ImageOnlyComponent>,
    pub dsp_version: String,
    pub engine_driver: String,
}

impl From<v1alpha1::dspa::DspaSpec> for DspaSpec {
    fn from(spec: v1alpha1::dspa::DspaSpec) -> Self {
        DspaSpec {
            api_server: spec.api_server.map(|api_server| api_server.into()),
            persistence_agent: spec.persistence_agent.map(|agent| agent.into()),
            scheduled_workflow: spec.scheduled_workflow.map(|swf| swf.into()),
            database: spec.database.unwrap_or_default().into(),
            ml_pipeline_ui: spec.ml_pipeline_ui.map(|ui| ui.into()),
            object_storage: spec.object_storage.into(),
            mlmd: spec.mlmd.map(|mlmd| mlmd.into()),
            crd_viewer: spec.crd_viewer.map(|c| c.into()),
            visualization_server: spec.visualization_server.map(|c| c.into()),
            workflow_controller: spec.workflow_controller.map(|c| c.into()),
            dsp_version: spec.dsp_version,
            engine_driver: spec.engine_driver,
        }
    }
}


#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DspaStatus {
    pub phase: String,
    pub conditions: Vec<DspaCondition>,
    pub parameters_hash: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl From<v1alpha1::dspa::DspaStatus> for DspaStatus {
    fn from(status: v1alpha1::dspa::DspaStatus) -> Self {
        DspaStatus {
            phase: status.phase,
            conditions: status.conditions.into_iter().map(|c| c.into()).collect(),
            parameters_hash: status.parameters_hash,
            last_updated: status.last_updated,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DspaCondition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
    pub reason: String,
    pub message: String,
    pub last_transition_time: Option<DateTime<Utc>>,
}

impl From<v1alpha1::dspa::DspaCondition> for DspaCondition {
    fn from(condition: v1alpha1::dspa::DspaCondition) -> Self {
        DspaCondition {
            type_: condition.type_,
            status: condition.status,
            reason: condition.reason,
            message: condition.message,
            last_transition_time: condition.last_transition_time,
        }
    }
}


#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct ApiServer {
    pub deploy: bool,
    pub image: Option<String>,
    pub apply_tekton_custom_resource: Option<bool>,
    pub archive_logs: Option<bool>,
    pub artifact_image: Option<String>,
    pub cache_image: Option<String>,
    pub move_results_image: Option<String>,
    pub artifact_script_config_map: Option<ArtifactScriptConfigMap>,
    pub inject_default_script: Option<bool>,
    pub strip_eof: Option<bool>,
    pub terminate_status: Option<String>,
    pub track_artifacts: Option<bool>,
    pub db_config_con_max_lifetime_sec: Option<i32>,
    pub collect_metrics: Option<bool>,
    pub enable_route: Option<bool>,
    pub enable_sample_pipeline: Option<bool>,
    pub auto_update_pipeline_default_version: Option<bool>,
    pub resources: Option<ResourceRequirements>,
}

impl From<v1alpha1::dspa::ApiServer> for ApiServer {
    fn from(spec: v1alpha1::dspa::ApiServer) -> Self {
        ApiServer {
            deploy: spec.deploy,
            image: spec.image,
            apply_tekton_custom_resource: spec.apply_tekton_custom_resource,
            archive_logs: spec.archive_logs,
            artifact_image: spec.artifact_image,
            cache_image: spec.cache_image,
            move_results_image: spec.move_results_image,
            artifact_script_config_map: spec.artifact_script_config_map.map(|cm| cm.into()),
            inject_default_script: spec.inject_default_script,
            strip_eof: spec.strip_eof,
            terminate_status: spec.terminate_status,
            track_artifacts: spec.track_artifacts,
            db_config_con_max_lifetime_sec: spec.db_config_con_max_lifetime_sec,
            collect_metrics: spec.collect_metrics,
            enable_route: spec.enable_route,
            enable_sample_pipeline: spec.enable_sample_pipeline,
            auto_update_pipeline_default_version: spec.auto_update_pipeline_default_version,
            resources: spec.resources.map(|r| r.into()),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ArtifactScriptConfigMap {
    pub name: String,
    pub key: String,
}

impl From<v1alpha1::dspa::ArtifactScriptConfigMap> for ArtifactScriptConfigMap {
    fn from(cm: v1alpha1::dspa::ArtifactScriptConfigMap) -> Self {
        ArtifactScriptConfigMap {
            name: cm.name,
            key: cm.key,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct PersistenceAgent {
    pub deploy: bool,
    pub image: Option<String>,
    pub num_workers: Option<i32>,
    pub resources: Option<ResourceRequirements>,
}

impl From<v1alpha1::dspa::PersistenceAgent> for PersistenceAgent {
    fn from(spec: v1alpha1::dspa::PersistenceAgent) -> Self {
        PersistenceAgent {
            deploy: spec.deploy,
            image: spec.image,
            num_workers: spec.num_workers,
            resources: spec.resources.map(|r| r.into()),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct ScheduledWorkflow {
    pub deploy: bool,
    pub image: Option<String>,
    pub cron_schedule_timezone: Option<String>,
    pub resources: Option<ResourceRequirements>,
}

impl From<v1alpha1::dspa::ScheduledWorkflow> for ScheduledWorkflow {
    fn from(spec: v1alpha1::dspa::ScheduledWorkflow) -> Self {
        ScheduledWorkflow {
            deploy: spec.deploy,
            image: spec.image,
            cron_schedule_timezone: spec.cron_schedule_timezone,
            resources: spec.resources.map(|r| r.into()),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct MlPipelineUi {
    pub deploy: bool,
    pub config_map_name: Option<String>,
    pub resources: Option<ResourceRequirements>,
    pub image: String,
}

impl From<v1alpha1::dspa::MlPipelineUi> for MlPipelineUi {
    fn from(spec: v1alpha1::dspa::MlPipelineUi) -> Self {
        MlPipelineUi {
            deploy: spec.deploy,
            config_map_name: spec.config_map_name,
            resources: spec.resources.map(|r| r.into()),
            image: spec.image,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Database {
    pub source: DatabaseSource,
    pub disable_health_check: bool,
}

/// Where the pipelines database comes from. An external database always wins
/// over a managed one when a user supplies both.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum DatabaseSource {
    External(ExternalDb),
    /// `None` when the user left the database entirely to the operator
    Managed(Option<MariaDb>),
}

impl From<v1alpha1::dspa::Database> for Database {
    fn from(spec: v1alpha1::dspa::Database) -> Self {
        let source = match (spec.external_db, spec.mariadb) {
            (Some(external), _) => DatabaseSource::External(external.into()),
            (None, mariadb) => DatabaseSource::Managed(mariadb.map(|m| m.into())),
        };

        Database {
            source,
            disable_health_check: spec.disable_health_check,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct MariaDb {
    pub deploy: bool,
    pub image: Option<String>,
    pub username: Option<String>,
    pub password_secret: Option<SecretKeyValue>,
    pub db_name: Option<String>,
    pub pvc_size: Option<Quantity>,
    pub resources: Option<ResourceRequirements>,
}

impl From<v1alpha1::dspa::MariaDb> for MariaDb {
    fn from(spec: v1alpha1::dspa::MariaDb) -> Self {
        MariaDb {
            deploy: spec.deploy,
            image: spec.image,
            username: spec.username,
            password_secret: spec.password_secret.map(|s| s.into()),
            db_name: spec.db_name,
            pvc_size: spec.pvc_size,
            resources: spec.resources.map(|r| r.into()),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ExternalDb {
    pub host: String,
    pub port: String,
    pub username: String,
    pub db_name: String,
    pub password_secret: SecretKeyValue,
}

impl From<v1alpha1::dspa::ExternalDb> for ExternalDb {
    fn from(spec: v1alpha1::dspa::ExternalDb) -> Self {
        ExternalDb {
            host: spec.host,
            port: spec.port,
            username: spec.username,
            db_name: spec.db_name,
            password_secret: spec.password_secret.into(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ObjectStorage {
    /// `None` when neither external nor managed storage was given
    pub source: Option<ObjectStorageSource>,
    pub disable_health_check: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum ObjectStorageSource {
    External(ExternalStorage),
    Managed(Minio),
}

impl From<v1alpha1::dspa::ObjectStorage> for ObjectStorage {
    fn from(spec: v1alpha1::dspa::ObjectStorage) -> Self {
        let source = match (spec.external_storage, spec.minio) {
            (Some(external), _) => Some(ObjectStorageSource::External(external.into())),
            (None, Some(minio)) => Some(ObjectStorageSource::Managed(minio.into())),
            (None, None) => None,
        };

        ObjectStorage {
            source,
            disable_health_check: spec.disable_health_check,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Minio {
    pub deploy: bool,
    pub bucket: Option<String>,
    pub s3_credential_secret: Option<S3CredentialSecret>,
    pub pvc_size: Option<Quantity>,
    pub resources: Option<ResourceRequirements>,
    pub image: String,
}

impl From<v1alpha1::dspa::Minio> for Minio {
    fn from(spec: v1alpha1::dspa::Minio) -> Self {
        Minio {
            deploy: spec.deploy,
            bucket: spec.bucket,
            s3_credential_secret: spec.s3_credential_secret.map(|s| s.into()),
            pvc_size: spec.pvc_size,
            resources: spec.resources.map(|r| r.into()),
            image: spec.image,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ExternalStorage {
    pub host: String,
    pub bucket: String,
    pub scheme: String,
    pub s3_credential_secret: S3CredentialSecret,
    pub secure: Option<bool>,
    pub port: String,
}

impl From<v1alpha1::dspa::ExternalStorage> for ExternalStorage {
    fn from(spec: v1alpha1::dspa::ExternalStorage) -> Self {
        ExternalStorage {
            host: spec.host,
            bucket: spec.bucket,
            scheme: spec.scheme,
            s3_credential_secret: spec.s3_credential_secret.into(),
            secure: spec.secure,
            port: spec.port,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct Mlmd {
    pub deploy: bool,
    pub envoy: Option<MlmdComponent>,
    pub grpc: Option<MlmdGrpc>,
    pub writer: Option<MlmdComponent>,
}

impl From<v1alpha1::dspa::Mlmd> for Mlmd {
    fn from(spec: v1alpha1::dspa::Mlmd) -> Self {
        Mlmd {
            deploy: spec.deploy,
            envoy: spec.envoy.map(|c| c.into()),
            grpc: spec.grpc.map(|c| c.into()),
            writer: spec.writer.map(|c| c.into()),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct MlmdComponent {
    pub resources: Option<ResourceRequirements>,
    pub image: String,
}

impl From<v1alpha1::dspa::MlmdComponent> for MlmdComponent {
    fn from(spec: v1alpha1::dspa::MlmdComponent) -> Self {
        MlmdComponent {
            resources: spec.resources.map(|r| r.into()),
            image: spec.image,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct MlmdGrpc {
    pub resources: Option<ResourceRequirements>,
    pub image: String,
    pub port: String,
}

impl From<v1alpha1::dspa::MlmdGrpc> for MlmdGrpc {
    fn from(spec: v1alpha1::dspa::MlmdGrpc) -> Self {
        MlmdGrpc {
            resources: spec.resources.map(|r| r.into()),
            image: spec.image,
            port: spec.port,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct ImageOnlyComponent {
    pub deploy: bool,
    pub image: Option<String>,
}

impl From<v1alpha1::dspa::ImageOnlyComponent> for ImageOnlyComponent {
    fn from(spec: v1alpha1::dspa::ImageOnlyComponent) -> Self {
        ImageOnlyComponent {
            deploy: spec.deploy,
            image: spec.image,
        }
    }
}

/// Written to `status.phase`
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum DspaPhase {
    Resolved,
    Failed,
}

impl Display for DspaPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DspaPhase::Resolved => write!(f, "Resolved"),
            DspaPhase::Failed => write!(f, "Failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::v1alpha1::common as v1common;

    fn external_db() -> v1alpha1::dspa::ExternalDb {
        v1alpha1::dspa::ExternalDb {
            host: "db.example.com".to_string(),
            port: "5432".to_string(),
            username: "svc".to_string(),
            db_name: "pipelines".to_string(),
            password_secret: v1common::SecretKeyValue { name: "my-db-secret".to_string(), key: "pw".to_string() },
        }
    }

    fn mariadb() -> v1alpha1::dspa::MariaDb {
        v1alpha1::dspa::MariaDb {
            deploy: true,
            image: Some("mariadb:10".to_string()),
            username: None,
            password_secret: None,
            db_name: None,
            pvc_size: None,
            resources: None,
        }
    }

    #[test]
    fn external_database_wins_over_managed() {
        let database: Database = v1alpha1::dspa::Database {
            mariadb: Some(mariadb()),
            external_db: Some(external_db()),
            disable_health_check: true,
        }
        .into();

        match database.source {
            DatabaseSource::External(external) => assert_eq!(external.host, "db.example.com"),
            other => panic!("expected external database, got {:?}", other),
        }
        assert!(database.disable_health_check);
    }

    #[test]
    fn absent_database_is_managed_by_operator() {
        let database: Database = v1alpha1::dspa::Database::default().into();

        assert_eq!(database.source, DatabaseSource::Managed(None));
    }

    #[test]
    fn empty_object_storage_has_no_source() {
        let storage: ObjectStorage = v1alpha1::dspa::ObjectStorage::default().into();

        assert_eq!(storage.source, None);
    }

    #[test]
    fn external_storage_wins_over_minio() {
        let storage: ObjectStorage = v1alpha1::dspa::ObjectStorage {
            minio: Some(v1alpha1::dspa::Minio {
                deploy: true,
                bucket: None,
                s3_credential_secret: None,
                pvc_size: None,
                resources: None,
                image: "minio:latest".to_string(),
            }),
            external_storage: Some(v1alpha1::dspa::ExternalStorage {
                host: "s3.amazonaws.com".to_string(),
                bucket: "artifacts".to_string(),
                scheme: "https".to_string(),
                s3_credential_secret: v1common::S3CredentialSecret {
                    secret_name: "s3".to_string(),
                    access_key: "ak".to_string(),
                    secret_key: "sk".to_string(),
                },
                secure: None,
                port: String::new(),
            }),
            disable_health_check: false,
        }
        .into();

        assert!(matches!(storage.source, Some(ObjectStorageSource::External(_))));
    }

    #[test]
    fn phase_display() {
        assert_eq!(DspaPhase::Resolved.to_string(), "Resolved");
        assert_eq!(DspaPhase::Failed.to_string(), "Failed");
        assert_eq!(serde_json::to_value(DspaPhase::Failed).unwrap(), serde_json::json!("Failed"));
    }
}
