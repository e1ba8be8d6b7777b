// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use kube::{
    api::{Api, Patch, PatchParams, ResourceExt},
    runtime::{
        controller::{Action, Controller},
        watcher,
    },
};
use k8s_openapi::api::core::v1::Secret;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::time::Duration;
use serde_json::json;

use dsp_operator_common::config::ControllerConfig;
use dsp_operator_common::telemetry::{info, warn};
use dsp_operator_common::utils::compute_object_hash;

use crate::controller::{constants::FIELD_MANAGER, context::Context, resolver::ParameterResolver, secrets::KubeSecretStore};
use crate::crd::{NamespacedCustomResource, hub::dspa::{DataSciencePipelinesApplication, DspaCondition, DspaPhase, DspaStatus}};
use crate::error::{ControllerError, ResolutionError, Result};


pub static PARAMETERS_RESOLVED_CONDITION: &str = "ParametersResolved";

/// What a resolution pass means for the DSPA status
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Resolved { parameters_hash: String },
    Invalid { message: String },
}

impl Outcome {
    fn phase(&self) -> DspaPhase {
        match self {
            Outcome::Resolved { .. } => DspaPhase::Resolved,
            Outcome::Invalid { .. } => DspaPhase::Failed,
        }
    }

    fn condition_status(&self) -> &'static str {
        match self {
            Outcome::Resolved { .. } => "True",
            Outcome::Invalid { .. } => "False",
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            Outcome::Resolved { .. } => "Resolved",
            Outcome::Invalid { .. } => "InvalidConfiguration",
        }
    }

    fn message(&self) -> String {
        match self {
            Outcome::Resolved { .. } => "All parameters resolved and credentials are in place".to_string(),
            Outcome::Invalid { message } => message.clone(),
        }
    }

    fn parameters_hash(&self) -> Option<String> {
        match self {
            Outcome::Resolved { parameters_hash } => Some(parameters_hash.clone()),
            Outcome::Invalid { .. } => None,
        }
    }

    /// When to look at the DSPA again. An invalid DSPA may be fixed by
    /// creating or editing a user-owned secret, which does not trigger a
    /// reconcile on its own.
    pub fn next_action(&self, config: &ControllerConfig) -> Action {
        match self {
            Outcome::Resolved { .. } => Action::requeue(Duration::from_secs(config.requeue_interval_secs)),
            Outcome::Invalid { .. } => Action::requeue(Duration::from_secs(config.error_requeue_secs)),
        }
    }
}

/// The status to write for `outcome`, or `None` when the current status
/// already reflects it. Writing an unchanged status would only trigger
/// another reconcile.
pub fn next_status(current: Option<&DspaStatus>, outcome: &Outcome, now: DateTime<Utc>) -> Option<DspaStatus> {
    let previous = current.and_then(|status| {
        status.conditions
            .iter()
            .find(|condition| condition.type_ == PARAMETERS_RESOLVED_CONDITION)
    });

    let unchanged = current.is_some_and(|status| {
        status.phase == outcome.phase().to_string()
            && status.parameters_hash == outcome.parameters_hash()
    }) && previous.is_some_and(|condition| {
        condition.status == outcome.condition_status()
            && condition.reason == outcome.reason()
            && condition.message == outcome.message()
    });

    if unchanged {
        return None;
    }

    // The transition time only moves when the condition flips
    let last_transition_time = previous
        .filter(|condition| condition.status == outcome.condition_status())
        .and_then(|condition| condition.last_transition_time)
        .unwrap_or(now);

    Some(DspaStatus {
        phase: outcome.phase().to_string(),
        conditions: vec![DspaCondition {
            type_: PARAMETERS_RESOLVED_CONDITION.to_string(),
            status: outcome.condition_status().to_string(),
            reason: outcome.reason().to_string(),
            message: outcome.message(),
            last_transition_time: Some(last_transition_time),
        }],
        parameters_hash: outcome.parameters_hash(),
        last_updated: Some(now),
    })
}

pub struct DspaController;

impl DspaController {
    /// Create a new controller for the DataSciencePipelinesApplication resource
    ///
    /// Secrets the operator creates are owned by their DSPA, so deleting one
    /// triggers a reconcile that recreates it.
    ///
    /// # Arguments
    /// * `ctx` - The controller context
    ///
    /// # Returns
    /// The controller for the DataSciencePipelinesApplication resource
    pub async fn create_controller<T>(ctx: Arc<Context>) -> Controller<T>
    where
        T: NamespacedCustomResource
    {
        let client = ctx.client.clone();
        let dspa = Api::<T>::all(client.clone());
        let secret = Api::<Secret>::all(client.clone());

        Controller::new(dspa, watcher::Config::default())
            .owns(secret, watcher::Config::default())
    }

    /// Reconcile the DataSciencePipelinesApplication resource
    ///
    /// Resolves the DSPA parameters and records the outcome in its status.
    /// Configuration errors are retried after the error interval, store
    /// errors are handed to the error policy.
    ///
    /// # Arguments
    /// * `dspa` - The DSPA resource to reconcile
    /// * `ctx` - The controller context
    ///
    /// # Returns
    /// An action to take after reconciling the DSPA resource
    pub async fn reconcile<T>(dspa: Arc<T>, ctx: Arc<Context>) -> Result<Action>
    where
        T: NamespacedCustomResource,
        DataSciencePipelinesApplication: From<T>,
    {
        let namespace = match dspa.namespace() {
            Some(namespace) => namespace,
            None => return Err(
                ControllerError::MissingObjectKeyError(
                    "Expected DataSciencePipelinesApplication to be namespaced via metadata.namespace"
                )
            )
        };
        let owner_ref = dspa.controller_owner_ref(&()).ok_or_else(|| {
            ControllerError::MissingObjectKeyError(
                "Expected DataSciencePipelinesApplication to have an owner reference"
            )
        })?;

        let hub = DataSciencePipelinesApplication::from(dspa.as_ref().clone());
        let store = KubeSecretStore::new(ctx.client.clone()).with_owner(owner_ref);
        let resolver = ParameterResolver::new(&ctx.state.defaults);

        match resolver.resolve(&hub, &store).await {
            Ok(params) => {
                let parameters_hash = compute_object_hash(&params)
                    .map_err(|e| ControllerError::SerializationError(e.to_string()))?;

                for secret in params.created_secrets() {
                    info!(
                        event = "SecretCreated",
                        dspa = dspa.name_any().as_str(),
                        namespace = namespace.as_str(),
                        secret = secret,
                    );
                }
                info!(
                    event = "ResolvedParameters",
                    dspa = dspa.name_any().as_str(),
                    namespace = namespace.as_str(),
                    hash = parameters_hash.as_str(),
                );

                let outcome = Outcome::Resolved { parameters_hash };
                update_status(dspa.as_ref(), &hub, &ctx, &namespace, &outcome).await?;

                Ok(outcome.next_action(&ctx.state.config.controller))
            },
            Err(ResolutionError::Configuration(e)) => {
                warn!(
                    event = "ResolutionFailed",
                    dspa = dspa.name_any().as_str(),
                    namespace = namespace.as_str(),
                    error = %e,
                );

                let outcome = Outcome::Invalid { message: e.to_string() };
                update_status(dspa.as_ref(), &hub, &ctx, &namespace, &outcome).await?;

                Ok(outcome.next_action(&ctx.state.config.controller))
            },
            Err(e) => Err(e.into()),
        }
    }
}

/// Update the status of the DSPA resource
///
/// # Arguments
/// * `dspa` - The DSPA resource to update
/// * `hub` - The hub view of the same resource, carrying the current status
/// * `ctx` - The controller context
/// * `namespace` - The namespace of the DSPA resource
/// * `outcome` - The outcome of the resolution pass
///
/// # Returns
/// A result indicating success or failure
async fn update_status<T>(dspa: &T, hub: &DataSciencePipelinesApplication, ctx: &Context, namespace: &str, outcome: &Outcome) -> Result<()>
where
    T: NamespacedCustomResource,
{
    let Some(status) = next_status(hub.status.as_ref(), outcome, Utc::now()) else {
        return Ok(());
    };

    let api = Api::<T>::namespaced(ctx.client.clone(), namespace);

    info!(
        event = "UpdatingDspaStatus",
        dspa = dspa.name_any().as_str(),
        phase = status.phase.as_str(),
    );
    api.patch_status(
        &dspa.name_any(),
        &PatchParams::apply(FIELD_MANAGER),
        &Patch::Merge(json!({
            "status": status
        })),
    ).await?;

    Ok(())
}
