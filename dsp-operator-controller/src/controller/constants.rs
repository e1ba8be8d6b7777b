// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

//! Fixed names, ports and sizing used when the user leaves a value unset.

use crate::crd::hub::common::ResourceRequirements;

pub static FIELD_MANAGER: &str = "operator.datasciencepipelines.opendatahub.io";
pub static MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";

pub static DSP_SERVICE_PREFIX: &str = "ds-pipeline";

// Database
pub static DB_SECRET_NAME_PREFIX: &str = "ds-pipeline-db-";
pub static DB_SECRET_KEY: &str = "password";
pub static MARIADB_NAME: &str = "mlpipeline";
pub static MARIADB_USER: &str = "mlpipeline";
pub static MARIADB_HOST_PREFIX: &str = "mariadb";
pub static MARIADB_PORT: &str = "3306";
pub static MARIADB_PVC_SIZE: &str = "10Gi";

// Object storage
pub static MINIO_HOST_PREFIX: &str = "minio";
pub static MINIO_PORT: &str = "9000";
pub static MINIO_SCHEME: &str = "http";
pub static MINIO_DEFAULT_BUCKET: &str = "mlpipeline";
pub static MINIO_PVC_SIZE: &str = "10Gi";
pub static S3_SECRET_NAME_PREFIX: &str = "ds-pipeline-s3-";
pub static S3_ACCESS_KEY: &str = "accesskey";
pub static S3_SECRET_KEY: &str = "secretkey";

// Generated credential lengths
pub static GENERATED_PASSWORD_LENGTH: usize = 12;
pub static GENERATED_ACCESS_KEY_LENGTH: usize = 16;
pub static GENERATED_SECRET_KEY_LENGTH: usize = 24;

pub static MLMD_GRPC_PORT: &str = "8080";

pub static UI_CONFIG_MAP_PREFIX: &str = "ds-pipeline-ui-configmap-";
pub static ARTIFACT_SCRIPT_CONFIG_MAP_PREFIX: &str = "ds-pipeline-artifact-script-";
pub static ARTIFACT_SCRIPT_CONFIG_MAP_KEY: &str = "artifact_script";

// API server toggles
pub static APPLY_TEKTON_CUSTOM_RESOURCE: bool = true;
pub static ARCHIVE_LOGS: bool = false;
pub static INJECT_DEFAULT_SCRIPT: bool = true;
pub static STRIP_EOF: bool = true;
pub static TRACK_ARTIFACTS: bool = true;
pub static COLLECT_METRICS: bool = true;
pub static ENABLE_ROUTE: bool = true;
pub static ENABLE_SAMPLE_PIPELINE: bool = true;
pub static AUTO_UPDATE_PIPELINE_DEFAULT_VERSION: bool = true;
pub static TERMINATE_STATUS: &str = "Cancelled";
pub static DB_CONFIG_CON_MAX_LIFETIME_SEC: i32 = 120;

pub static PERSISTENCE_AGENT_NUM_WORKERS: i32 = 2;
pub static CRON_SCHEDULE_TIMEZONE: &str = "UTC";

pub fn api_server_resources() -> ResourceRequirements {
    ResourceRequirements::new("250m", "500Mi", "500m", "1Gi")
}

pub fn persistence_agent_resources() -> ResourceRequirements {
    ResourceRequirements::new("120m", "500Mi", "250m", "1Gi")
}

pub fn scheduled_workflow_resources() -> ResourceRequirements {
    ResourceRequirements::new("120m", "100Mi", "250m", "250Mi")
}

pub fn mariadb_resources() -> ResourceRequirements {
    ResourceRequirements::new("300m", "800Mi", "1", "1Gi")
}

pub fn minio_resources() -> ResourceRequirements {
    ResourceRequirements::new("200m", "100Mi", "250m", "1Gi")
}

/// Shared by the UI and every MLMD sub-component
pub fn small_component_resources() -> ResourceRequirements {
    ResourceRequirements::new("100m", "256Mi", "100m", "256Mi")
}

/// In-cluster DNS name of a service created for the DSPA `name`
pub fn service_host(prefix: &str, name: &str, namespace: &str) -> String {
    format!("{}-{}.{}.svc.cluster.local", prefix, name, namespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_host_is_cluster_local() {
        assert_eq!(service_host(MARIADB_HOST_PREFIX, "sample", "team-a"), "mariadb-sample.team-a.svc.cluster.local");
        assert_eq!(service_host(MINIO_HOST_PREFIX, "sample", "team-a"), "minio-sample.team-a.svc.cluster.local");
    }
}
