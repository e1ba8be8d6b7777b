// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

//! Turns a DSPA into its fully resolved [`DspaParams`].
//!
//! Resolution runs in two phases. The first is pure and reports every
//! configuration error that can be found without looking at secrets. Only
//! then are the database and object storage credentials materialized, in
//! that order.

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

use dsp_operator_common::defaults::{
    DefaultsRegistry, CRD_VIEWER_IMAGE_PATH, MARIADB_IMAGE_PATH, OAUTH_PROXY_IMAGE_PATH,
    VISUALIZATION_SERVER_IMAGE_PATH, WORKFLOW_CONTROLLER_IMAGE_PATH,
};
use dsp_operator_common::telemetry::debug;

use crate::controller::constants::*;
use crate::controller::images::{Component, ImageFamily};
use crate::controller::materializer::{CredentialReference, SecretMaterializer};
use crate::controller::params::*;
use crate::controller::secrets::SecretStore;
use crate::crd::hub::common::SecretKeyValue;
use crate::crd::hub::dspa::{
    ApiServer, ArtifactScriptConfigMap, DataSciencePipelinesApplication, DatabaseSource,
    ImageOnlyComponent, MariaDb, MlPipelineUi, Mlmd, ObjectStorageSource, PersistenceAgent,
    ScheduledWorkflow,
};
use crate::error::{ConfigurationError, ResolutionResult};

/// Everything known after the pure phase
struct Plan {
    name: String,
    namespace: String,
    family: ImageFamily,
    api_server: ApiServerParams,
    persistence_agent: PersistenceAgentParams,
    scheduled_workflow: ScheduledWorkflowParams,
    ml_pipeline_ui: Option<UiParams>,
    mlmd: Option<MlmdParams>,
    crd_viewer: ImageOnlyParams,
    visualization_server: ImageOnlyParams,
    workflow_controller: ImageOnlyParams,
    database: DatabasePlan,
    object_storage: ObjectStoragePlan,
}

struct DatabasePlan {
    managed: Option<MariaDbParams>,
    host: String,
    port: String,
    username: String,
    db_name: String,
    credentials: CredentialReference,
    operator_secret: CredentialReference,
    external: bool,
    disable_health_check: bool,
}

struct ObjectStoragePlan {
    managed: Option<MinioParams>,
    host: String,
    port: String,
    scheme: String,
    bucket: String,
    secure: bool,
    credentials: CredentialReference,
    operator_secret: CredentialReference,
    external: bool,
    disable_health_check: bool,
}

pub struct ParameterResolver<'a> {
    defaults: &'a DefaultsRegistry,
}

impl<'a> ParameterResolver<'a> {
    pub fn new(defaults: &'a DefaultsRegistry) -> Self {
        ParameterResolver { defaults }
    }

    /// Resolve `dspa` against the defaults registry, creating operator-owned
    /// credential secrets in `store` when they do not exist yet
    pub async fn resolve(&self, dspa: &DataSciencePipelinesApplication, store: &dyn SecretStore) -> ResolutionResult<DspaParams> {
        let plan = self.plan(dspa)?;
        let materializer = SecretMaterializer::new(store);

        let (password, password_origin) = materializer.ensure(&plan.database.credentials).await?;
        let (keys, keys_origin) = materializer.ensure(&plan.object_storage.credentials).await?;

        let database = plan.database;
        let storage = plan.object_storage;

        Ok(DspaParams {
            api_server_service_name: format!("{}-{}", DSP_SERVICE_PREFIX, plan.name),
            oauth_proxy_image: self.defaults.lookup(OAUTH_PROXY_IMAGE_PATH).to_string(),
            name: plan.name,
            namespace: plan.namespace,
            dsp_version: dspa.spec.dsp_version.clone(),
            engine_driver: dspa.spec.engine_driver.clone(),
            image_family: plan.family,
            api_server: plan.api_server,
            persistence_agent: plan.persistence_agent,
            scheduled_workflow: plan.scheduled_workflow,
            ml_pipeline_ui: plan.ml_pipeline_ui,
            mlmd: plan.mlmd,
            crd_viewer: plan.crd_viewer,
            visualization_server: plan.visualization_server,
            workflow_controller: plan.workflow_controller,
            database: DatabaseParams {
                managed: database.managed,
                connection: DbConnection {
                    host: database.host,
                    port: database.port,
                    username: database.username,
                    db_name: database.db_name,
                    credentials: database.credentials,
                    operator_secret: database.operator_secret,
                    password,
                    password_origin,
                    external: database.external,
                    disable_health_check: database.disable_health_check,
                },
            },
            object_storage: ObjectStorageParams {
                managed: storage.managed,
                connection: ObjectStorageConnection {
                    endpoint: endpoint(&storage.scheme, &storage.host, &storage.port),
                    host: storage.host,
                    port: storage.port,
                    scheme: storage.scheme,
                    bucket: storage.bucket,
                    secure: storage.secure,
                    credentials: storage.credentials,
                    operator_secret: storage.operator_secret,
                    keys,
                    keys_origin,
                    external: storage.external,
                    disable_health_check: storage.disable_health_check,
                },
            },
        })
    }

    fn plan(&self, dspa: &DataSciencePipelinesApplication) -> Result<Plan, ConfigurationError> {
        let name = non_empty(dspa.metadata.name.as_deref())
            .ok_or(ConfigurationError::MissingMetadata("metadata.name"))?;
        let namespace = non_empty(dspa.metadata.namespace.as_deref())
            .ok_or(ConfigurationError::MissingMetadata("metadata.namespace"))?;
        let spec = &dspa.spec;
        let family = ImageFamily::resolve(&spec.dsp_version, &spec.engine_driver)?;

        Ok(Plan {
            api_server: self.api_server(spec.api_server.as_ref(), family, &name),
            persistence_agent: self.persistence_agent(spec.persistence_agent.as_ref(), family, &name),
            scheduled_workflow: self.scheduled_workflow(spec.scheduled_workflow.as_ref(), family, &name),
            ml_pipeline_ui: spec.ml_pipeline_ui.as_ref().map(|ui| self.ui(ui, &name)).transpose()?,
            mlmd: spec.mlmd.as_ref().map(|mlmd| self.mlmd(mlmd, family)),
            crd_viewer: self.image_only(spec.crd_viewer.as_ref(), CRD_VIEWER_IMAGE_PATH, "crdviewer", &name),
            visualization_server: self.image_only(spec.visualization_server.as_ref(), VISUALIZATION_SERVER_IMAGE_PATH, "visualizationServer", &name),
            workflow_controller: self.image_only(spec.workflow_controller.as_ref(), WORKFLOW_CONTROLLER_IMAGE_PATH, "workflowController", &name),
            database: self.database(dspa, &name, &namespace),
            object_storage: self.object_storage(dspa, &name, &namespace)?,
            family,
            name,
            namespace,
        })
    }

    /// The user's image if set, otherwise the registry value at `path`
    fn image(&self, image: Option<&str>, path: &str) -> String {
        non_empty(image).unwrap_or_else(|| self.defaults.lookup(path).to_string())
    }

    fn api_server(&self, spec: Option<&ApiServer>, family: ImageFamily, name: &str) -> ApiServerParams {
        let spec = synthesize(spec, "apiServer", name);

        let artifact_script_config_map = match spec.artifact_script_config_map {
            Some(cm) if !cm.name.is_empty() => ArtifactScriptConfigMap {
                name: cm.name,
                key: or_default(Some(cm.key.as_str()), ARTIFACT_SCRIPT_CONFIG_MAP_KEY),
            },
            _ => ArtifactScriptConfigMap {
                name: format!("{}{}", ARTIFACT_SCRIPT_CONFIG_MAP_PREFIX, name),
                key: ARTIFACT_SCRIPT_CONFIG_MAP_KEY.to_string(),
            },
        };

        ApiServerParams {
            deploy: spec.deploy,
            image: self.image(spec.image.as_deref(), family.path(Component::ApiServer)),
            artifact_image: self.image(spec.artifact_image.as_deref(), family.path(Component::Artifact)),
            cache_image: self.image(spec.cache_image.as_deref(), family.path(Component::Cache)),
            move_results_image: self.image(spec.move_results_image.as_deref(), family.path(Component::MoveResults)),
            artifact_script_config_map,
            apply_tekton_custom_resource: spec.apply_tekton_custom_resource.unwrap_or(APPLY_TEKTON_CUSTOM_RESOURCE),
            archive_logs: spec.archive_logs.unwrap_or(ARCHIVE_LOGS),
            inject_default_script: spec.inject_default_script.unwrap_or(INJECT_DEFAULT_SCRIPT),
            strip_eof: spec.strip_eof.unwrap_or(STRIP_EOF),
            terminate_status: or_default(spec.terminate_status.as_deref(), TERMINATE_STATUS),
            track_artifacts: spec.track_artifacts.unwrap_or(TRACK_ARTIFACTS),
            db_config_con_max_lifetime_sec: spec.db_config_con_max_lifetime_sec
                .filter(|secs| *secs > 0)
                .unwrap_or(DB_CONFIG_CON_MAX_LIFETIME_SEC),
            collect_metrics: spec.collect_metrics.unwrap_or(COLLECT_METRICS),
            enable_route: spec.enable_route.unwrap_or(ENABLE_ROUTE),
            enable_sample_pipeline: spec.enable_sample_pipeline.unwrap_or(ENABLE_SAMPLE_PIPELINE),
            auto_update_pipeline_default_version: spec.auto_update_pipeline_default_version
                .unwrap_or(AUTO_UPDATE_PIPELINE_DEFAULT_VERSION),
            resources: spec.resources.unwrap_or_else(api_server_resources),
        }
    }

    fn persistence_agent(&self, spec: Option<&PersistenceAgent>, family: ImageFamily, name: &str) -> PersistenceAgentParams {
        let spec = synthesize(spec, "persistenceAgent", name);

        PersistenceAgentParams {
            deploy: spec.deploy,
            image: self.image(spec.image.as_deref(), family.path(Component::PersistenceAgent)),
            num_workers: spec.num_workers
                .filter(|workers| *workers > 0)
                .unwrap_or(PERSISTENCE_AGENT_NUM_WORKERS),
            resources: spec.resources.unwrap_or_else(persistence_agent_resources),
        }
    }

    fn scheduled_workflow(&self, spec: Option<&ScheduledWorkflow>, family: ImageFamily, name: &str) -> ScheduledWorkflowParams {
        let spec = synthesize(spec, "scheduledWorkflow", name);

        ScheduledWorkflowParams {
            deploy: spec.deploy,
            image: self.image(spec.image.as_deref(), family.path(Component::ScheduledWorkflow)),
            cron_schedule_timezone: or_default(spec.cron_schedule_timezone.as_deref(), CRON_SCHEDULE_TIMEZONE),
            resources: spec.resources.unwrap_or_else(scheduled_workflow_resources),
        }
    }

    fn ui(&self, spec: &MlPipelineUi, name: &str) -> Result<UiParams, ConfigurationError> {
        if spec.image.is_empty() {
            return Err(ConfigurationError::MissingUiImage);
        }

        Ok(UiParams {
            deploy: spec.deploy,
            image: spec.image.clone(),
            config_map_name: non_empty(spec.config_map_name.as_deref())
                .unwrap_or_else(|| format!("{}{}", UI_CONFIG_MAP_PREFIX, name)),
            resources: spec.resources.clone().unwrap_or_else(small_component_resources),
        })
    }

    fn mlmd(&self, spec: &Mlmd, family: ImageFamily) -> MlmdParams {
        let envoy = spec.envoy.clone().unwrap_or_default();
        let grpc = spec.grpc.clone().unwrap_or_default();
        let writer = spec.writer.clone().unwrap_or_default();

        MlmdParams {
            deploy: spec.deploy,
            envoy: MlmdComponentParams {
                image: self.image(Some(envoy.image.as_str()), family.path(Component::MlmdEnvoy)),
                resources: envoy.resources.unwrap_or_else(small_component_resources),
            },
            grpc: MlmdGrpcParams {
                image: self.image(Some(grpc.image.as_str()), family.path(Component::MlmdGrpc)),
                port: or_default(Some(grpc.port.as_str()), MLMD_GRPC_PORT),
                resources: grpc.resources.unwrap_or_else(small_component_resources),
            },
            writer: MlmdComponentParams {
                image: self.image(Some(writer.image.as_str()), family.path(Component::MlmdWriter)),
                resources: writer.resources.unwrap_or_else(small_component_resources),
            },
        }
    }

    fn image_only(&self, spec: Option<&ImageOnlyComponent>, path: &str, block: &'static str, name: &str) -> ImageOnlyParams {
        let spec = synthesize(spec, block, name);

        ImageOnlyParams {
            deploy: spec.deploy,
            image: self.image(spec.image.as_deref(), path),
        }
    }

    fn database(&self, dspa: &DataSciencePipelinesApplication, name: &str, namespace: &str) -> DatabasePlan {
        let database = &dspa.spec.database;
        let operator_secret = CredentialReference::database(namespace, name, None);

        match &database.source {
            DatabaseSource::External(external) => DatabasePlan {
                managed: None,
                host: external.host.clone(),
                port: external.port.clone(),
                username: external.username.clone(),
                db_name: external.db_name.clone(),
                credentials: CredentialReference::database(namespace, name, Some(&external.password_secret)),
                operator_secret,
                external: true,
                disable_health_check: database.disable_health_check,
            },
            DatabaseSource::Managed(mariadb) => {
                let mariadb = mariadb.clone().unwrap_or_else(|| {
                    debug!(event = "DefaultedBlock", dspa = name, block = "database");
                    MariaDb { deploy: true, ..Default::default() }
                });
                let custom = mariadb.password_secret
                    .as_ref()
                    .filter(|secret| !secret.name.is_empty())
                    .map(|secret| SecretKeyValue {
                        name: secret.name.clone(),
                        key: or_default(Some(secret.key.as_str()), DB_SECRET_KEY),
                    });
                let managed = MariaDbParams {
                    deploy: mariadb.deploy,
                    image: self.image(mariadb.image.as_deref(), MARIADB_IMAGE_PATH),
                    username: or_default(mariadb.username.as_deref(), MARIADB_USER),
                    db_name: or_default(mariadb.db_name.as_deref(), MARIADB_NAME),
                    pvc_size: quantity_or(mariadb.pvc_size, MARIADB_PVC_SIZE),
                    resources: mariadb.resources.unwrap_or_else(mariadb_resources),
                };

                DatabasePlan {
                    host: service_host(MARIADB_HOST_PREFIX, name, namespace),
                    port: MARIADB_PORT.to_string(),
                    username: managed.username.clone(),
                    db_name: managed.db_name.clone(),
                    credentials: CredentialReference::database(namespace, name, custom.as_ref()),
                    operator_secret,
                    managed: Some(managed),
                    external: false,
                    disable_health_check: database.disable_health_check,
                }
            }
        }
    }

    fn object_storage(&self, dspa: &DataSciencePipelinesApplication, name: &str, namespace: &str) -> Result<ObjectStoragePlan, ConfigurationError> {
        let storage = &dspa.spec.object_storage;
        let operator_secret = CredentialReference::object_storage(namespace, name, None);

        match &storage.source {
            None => Err(ConfigurationError::MissingObjectStorage),
            Some(ObjectStorageSource::External(external)) => Ok(ObjectStoragePlan {
                managed: None,
                host: external.host.clone(),
                port: external.port.clone(),
                scheme: external.scheme.clone(),
                bucket: external.bucket.clone(),
                secure: external.secure.unwrap_or(external.scheme == "https"),
                credentials: CredentialReference::object_storage(namespace, name, Some(&external.s3_credential_secret)),
                operator_secret,
                external: true,
                disable_health_check: storage.disable_health_check,
            }),
            Some(ObjectStorageSource::Managed(minio)) => {
                if minio.image.is_empty() {
                    return Err(ConfigurationError::MissingMinioImage);
                }

                let custom = minio.s3_credential_secret
                    .as_ref()
                    .filter(|secret| !secret.secret_name.is_empty());
                let managed = MinioParams {
                    deploy: minio.deploy,
                    image: minio.image.clone(),
                    bucket: or_default(minio.bucket.as_deref(), MINIO_DEFAULT_BUCKET),
                    pvc_size: quantity_or(minio.pvc_size.clone(), MINIO_PVC_SIZE),
                    resources: minio.resources.clone().unwrap_or_else(minio_resources),
                };

                Ok(ObjectStoragePlan {
                    host: service_host(MINIO_HOST_PREFIX, name, namespace),
                    port: MINIO_PORT.to_string(),
                    scheme: MINIO_SCHEME.to_string(),
                    bucket: managed.bucket.clone(),
                    secure: false,
                    credentials: CredentialReference::object_storage(namespace, name, custom),
                    operator_secret,
                    managed: Some(managed),
                    external: false,
                    disable_health_check: storage.disable_health_check,
                })
            }
        }
    }
}

/// Present block, or a `deploy: false` block for the operator to fill in
fn synthesize<T: Clone + Default>(spec: Option<&T>, block: &'static str, name: &str) -> T {
    match spec {
        Some(spec) => spec.clone(),
        None => {
            debug!(event = "DefaultedBlock", dspa = name, block = block);
            T::default()
        }
    }
}

/// Empty strings count as unset
fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

fn or_default(value: Option<&str>, default: &str) -> String {
    non_empty(value).unwrap_or_else(|| default.to_string())
}

fn quantity_or(value: Option<Quantity>, default: &str) -> Quantity {
    value
        .filter(|quantity| !quantity.0.is_empty())
        .unwrap_or_else(|| Quantity(default.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use serde_json::json;

    use dsp_operator_common::constant::DEFAULT_IMAGE_VALUE;
    use dsp_operator_common::defaults::*;

    use crate::controller::secrets::{CreateOutcome, MockSecretStore, SecretData};
    use crate::crd::hub::common::ResourceRequirements;
    use crate::crd::v1alpha1;
    use crate::error::ResolutionError;

    fn registry() -> DefaultsRegistry {
        [
            (API_SERVER_IMAGE_PATH, "api-server:v1"),
            (API_SERVER_IMAGE_PATH_V2_ARGO, "api-server:v2-argo"),
            (API_SERVER_IMAGE_PATH_V2_TEKTON, "api-server:v2-tekton"),
            (MLMD_GRPC_IMAGE_PATH_V2_TEKTON, "mlmd-grpc:v2-tekton"),
            (PERSISTENCE_AGENT_IMAGE_PATH, "persistence-agent:v1"),
            (MARIADB_IMAGE_PATH, "mariadb:10"),
            (OAUTH_PROXY_IMAGE_PATH, "oauth-proxy:4"),
        ]
        .into_iter()
        .collect()
    }

    fn dspa(spec: serde_json::Value) -> DataSciencePipelinesApplication {
        let spec: v1alpha1::dspa::DspaSpec = serde_json::from_value(spec).unwrap();
        let mut dspa = v1alpha1::dspa::DataSciencePipelinesApplication::new("sample", spec);
        dspa.metadata.namespace = Some("team-a".to_string());
        dspa.into()
    }

    fn minio_spec() -> serde_json::Value {
        json!({"objectStorage": {"minio": {"image": "minio:latest"}}})
    }

    /// A store where every secret already exists with usable fields
    fn populated_store() -> MockSecretStore {
        let mut store = MockSecretStore::new();
        store.expect_get().returning(|_, _| {
            Ok(Some(SecretData::from([
                ("password".to_string(), b"db-password".to_vec()),
                ("accesskey".to_string(), b"access".to_vec()),
                ("secretkey".to_string(), b"secret".to_vec()),
            ])))
        });
        store.expect_create().never();
        store
    }

    /// A store that must not be touched at all
    fn untouched_store() -> MockSecretStore {
        let mut store = MockSecretStore::new();
        store.expect_get().never();
        store.expect_create().never();
        store
    }

    async fn resolve(dspa: &DataSciencePipelinesApplication, store: &MockSecretStore) -> ResolutionResult<DspaParams> {
        let defaults = registry();
        ParameterResolver::new(&defaults).resolve(dspa, store).await
    }

    fn configuration_error(result: ResolutionResult<DspaParams>) -> ConfigurationError {
        match result {
            Err(ResolutionError::Configuration(e)) => e,
            other => panic!("expected a configuration error, got {:?}", other.map(|p| p.name)),
        }
    }

    #[tokio::test]
    async fn minio_without_image_fails_before_store_access() {
        let dspa = dspa(json!({"objectStorage": {"minio": {"deploy": true}}}));

        let err = configuration_error(resolve(&dspa, &untouched_store()).await);

        assert_eq!(err, ConfigurationError::MissingMinioImage);
    }

    #[tokio::test]
    async fn missing_object_storage_is_fatal() {
        let dspa = dspa(json!({"objectStorage": {}}));

        let err = configuration_error(resolve(&dspa, &untouched_store()).await);

        assert_eq!(err, ConfigurationError::MissingObjectStorage);
    }

    #[tokio::test]
    async fn unknown_v2_driver_is_fatal() {
        let mut spec = minio_spec();
        spec["dspVersion"] = json!("v2");
        spec["engineDriver"] = json!("airflow");

        let err = configuration_error(resolve(&dspa(spec), &untouched_store()).await);

        assert_eq!(err, ConfigurationError::UnsupportedEngineDriver("airflow".to_string()));
    }

    #[tokio::test]
    async fn ui_without_image_is_fatal() {
        let mut spec = minio_spec();
        spec["mlpipelineUI"] = json!({"deploy": true});

        let err = configuration_error(resolve(&dspa(spec), &untouched_store()).await);

        assert_eq!(err, ConfigurationError::MissingUiImage);
    }

    #[tokio::test]
    async fn missing_namespace_is_fatal() {
        let mut dspa = dspa(minio_spec());
        dspa.metadata = ObjectMeta { name: Some("sample".to_string()), ..Default::default() };

        let err = configuration_error(resolve(&dspa, &untouched_store()).await);

        assert_eq!(err, ConfigurationError::MissingMetadata("metadata.namespace"));
    }

    #[tokio::test]
    async fn absent_blocks_are_synthesized_without_deploying() {
        let params = resolve(&dspa(minio_spec()), &populated_store()).await.unwrap();

        assert!(!params.api_server.deploy);
        assert_eq!(params.api_server.image, "api-server:v1");
        assert_eq!(params.api_server.resources, api_server_resources());
        assert_eq!(params.api_server.artifact_script_config_map.name, "ds-pipeline-artifact-script-sample");
        assert!(!params.persistence_agent.deploy);
        assert_eq!(params.persistence_agent.image, "persistence-agent:v1");
        assert_eq!(params.persistence_agent.num_workers, 2);
        assert!(!params.scheduled_workflow.deploy);
        assert_eq!(params.scheduled_workflow.cron_schedule_timezone, "UTC");
        assert_eq!(params.scheduled_workflow.image, DEFAULT_IMAGE_VALUE);
        assert!(!params.crd_viewer.deploy);
        assert_eq!(params.crd_viewer.image, DEFAULT_IMAGE_VALUE);
        assert!(params.ml_pipeline_ui.is_none());
        assert!(params.mlmd.is_none());
        assert_eq!(params.api_server_service_name, "ds-pipeline-sample");
        assert_eq!(params.oauth_proxy_image, "oauth-proxy:4");
    }

    #[tokio::test]
    async fn v2_images_follow_the_engine_driver() {
        let mut spec = minio_spec();
        spec["dspVersion"] = json!("v2");
        spec["engineDriver"] = json!("tekton");
        spec["apiServer"] = json!({});
        spec["mlmd"] = json!({"deploy": true});

        let params = resolve(&dspa(spec), &populated_store()).await.unwrap();

        assert_eq!(params.image_family, ImageFamily::V2Tekton);
        assert_eq!(params.api_server.image, "api-server:v2-tekton");
        let mlmd = params.mlmd.unwrap();
        assert_eq!(mlmd.grpc.image, "mlmd-grpc:v2-tekton");
        assert_eq!(mlmd.grpc.port, "8080");
        assert_eq!(mlmd.envoy.image, DEFAULT_IMAGE_VALUE);
        assert_eq!(mlmd.writer.resources, small_component_resources());
    }

    #[tokio::test]
    async fn user_values_win_and_empty_strings_are_unset() {
        let mut spec = minio_spec();
        spec["apiServer"] = json!({
            "image": "",
            "cacheImage": "my-cache:1",
            "archiveLogs": true,
            "terminateStatus": "",
            "resources": {"limits": {"cpu": "2"}}
        });
        spec["scheduledWorkflow"] = json!({"cronScheduleTimezone": "Europe/Paris"});

        let params = resolve(&dspa(spec), &populated_store()).await.unwrap();

        assert!(params.api_server.deploy);
        assert_eq!(params.api_server.image, "api-server:v1");
        assert_eq!(params.api_server.cache_image, "my-cache:1");
        assert!(params.api_server.archive_logs);
        assert_eq!(params.api_server.terminate_status, "Cancelled");
        assert_eq!(params.scheduled_workflow.cron_schedule_timezone, "Europe/Paris");
        // A user resources object replaces the default pair entirely
        assert_eq!(
            params.api_server.resources,
            ResourceRequirements {
                limits: Some(crate::crd::hub::common::Resources { cpu: Some(Quantity("2".to_string())), memory: None }),
                requests: None,
            }
        );
    }

    #[tokio::test]
    async fn managed_database_is_fully_defaulted() {
        let params = resolve(&dspa(minio_spec()), &populated_store()).await.unwrap();
        let database = params.database;
        let mariadb = database.managed.unwrap();

        assert!(mariadb.deploy);
        assert_eq!(mariadb.image, "mariadb:10");
        assert_eq!(mariadb.pvc_size, Quantity("10Gi".to_string()));
        assert_eq!(mariadb.resources, mariadb_resources());
        assert_eq!(database.connection.host, "mariadb-sample.team-a.svc.cluster.local");
        assert_eq!(database.connection.port, "3306");
        assert_eq!(database.connection.username, "mlpipeline");
        assert_eq!(database.connection.db_name, "mlpipeline");
        assert_eq!(database.connection.credentials.name, "ds-pipeline-db-sample");
        assert!(!database.connection.external);
    }

    #[tokio::test]
    async fn managed_minio_endpoint_is_insecure_http() {
        let params = resolve(&dspa(minio_spec()), &populated_store()).await.unwrap();
        let storage = params.object_storage;

        assert_eq!(storage.connection.endpoint, "http://minio-sample.team-a.svc.cluster.local:9000");
        assert!(!storage.connection.secure);
        assert_eq!(storage.connection.bucket, "mlpipeline");
        assert_eq!(storage.managed.unwrap().pvc_size, Quantity("10Gi".to_string()));
    }

    #[tokio::test]
    async fn external_storage_infers_secure_from_scheme() {
        let external = |scheme: &str, secure: Option<bool>| {
            let mut storage = json!({
                "host": "s3.amazonaws.com",
                "bucket": "artifacts",
                "scheme": scheme,
                "s3CredentialsSecret": {"secretName": "aws", "accessKey": "accesskey", "secretKey": "secretkey"}
            });
            if let Some(secure) = secure {
                storage["secure"] = json!(secure);
            }
            dspa(json!({"objectStorage": {"externalStorage": storage}}))
        };

        let https = resolve(&external("https", None), &populated_store()).await.unwrap();
        assert!(https.object_storage.connection.secure);
        assert_eq!(https.object_storage.connection.endpoint, "https://s3.amazonaws.com");
        assert!(https.object_storage.managed.is_none());

        let http = resolve(&external("http", None), &populated_store()).await.unwrap();
        assert!(!http.object_storage.connection.secure);

        let forced = resolve(&external("http", Some(true)), &populated_store()).await.unwrap();
        assert!(forced.object_storage.connection.secure);
    }

    #[tokio::test]
    async fn operator_secrets_are_recorded_alongside_custom_ones() {
        let external = dspa(json!({
            "database": {"externalDB": {
                "host": "db.example.com",
                "port": "5432",
                "username": "svc",
                "pipelineDBName": "pipelines",
                "passwordSecret": {"name": "my-db-secret", "key": "password"}
            }},
            "objectStorage": {"externalStorage": {
                "host": "s3.amazonaws.com",
                "bucket": "artifacts",
                "scheme": "https",
                "s3CredentialsSecret": {"secretName": "aws", "accessKey": "accesskey", "secretKey": "secretkey"}
            }}
        }));
        let managed_custom = dspa(json!({
            "database": {"mariaDB": {"deploy": true, "passwordSecret": {"name": "my-db-secret", "key": "password"}}},
            "objectStorage": {"minio": {
                "image": "minio:latest",
                "s3CredentialsSecret": {"secretName": "aws", "accessKey": "accesskey", "secretKey": "secretkey"}
            }}
        }));

        for dspa in [external, managed_custom] {
            let params = resolve(&dspa, &populated_store()).await.unwrap();
            let database = &params.database.connection;
            let storage = &params.object_storage.connection;

            assert_eq!(database.credentials.name, "my-db-secret");
            assert_eq!(database.operator_secret, CredentialReference::database("team-a", "sample", None));
            assert_eq!(database.operator_secret.name, "ds-pipeline-db-sample");
            assert_eq!(database.operator_secret.primary_key, "password");

            assert_eq!(storage.credentials.name, "aws");
            assert_eq!(storage.operator_secret.name, "ds-pipeline-s3-sample");
            assert_eq!(storage.operator_secret.primary_key, "accesskey");
            assert_eq!(storage.operator_secret.secondary_key.as_deref(), Some("secretkey"));

            let record = serde_json::to_string(&params).unwrap();
            assert!(record.contains("ds-pipeline-db-sample"));
            assert!(record.contains("ds-pipeline-s3-sample"));
        }
    }

    #[tokio::test]
    async fn database_credential_is_materialized_before_object_storage() {
        let mut seq = mockall::Sequence::new();
        let mut store = MockSecretStore::new();
        store.expect_get().times(1).in_sequence(&mut seq).returning(|_, name| {
            assert_eq!(name, "ds-pipeline-db-sample");
            Ok(None)
        });
        store.expect_create().times(1).in_sequence(&mut seq).returning(|_, _, _| Ok(CreateOutcome::Created));
        store.expect_get().times(1).in_sequence(&mut seq).returning(|_, name| {
            assert_eq!(name, "ds-pipeline-s3-sample");
            Ok(None)
        });
        store.expect_create().times(1).in_sequence(&mut seq).returning(|_, _, _| Ok(CreateOutcome::Created));

        let params = resolve(&dspa(minio_spec()), &store).await.unwrap();

        assert_eq!(params.created_secrets(), vec!["ds-pipeline-db-sample", "ds-pipeline-s3-sample"]);
    }
}
