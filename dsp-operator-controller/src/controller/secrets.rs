// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use async_trait::async_trait;
use k8s_openapi::{
    api::core::v1::Secret,
    apimachinery::pkg::apis::meta::v1::OwnerReference,
    ByteString,
};
use kube::{
    api::{Api, ObjectMeta, PostParams},
    Client,
};
use std::collections::BTreeMap;

#[cfg(test)]
use mockall::automock;

use dsp_operator_common::constant::APP_NAME;

use crate::controller::constants::MANAGED_BY_LABEL;

/// Raw (not base64 encoded) secret fields keyed by field name
pub type SecretData = BTreeMap<String, Vec<u8>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// Another writer created the secret first, nothing was written
    AlreadyExists,
}

/// Key/value secret storage the credential materializer reads from and
/// creates in. Implementations never update or delete existing secrets.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the secret `name`, `None` when it does not exist
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<SecretData>, kube::Error>;

    /// Create the secret `name`. An existing secret is left untouched and
    /// reported as [`CreateOutcome::AlreadyExists`].
    async fn create(&self, namespace: &str, name: &str, data: &SecretData) -> Result<CreateOutcome, kube::Error>;
}

/// Secret store backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeSecretStore {
    client: Client,
    owner_ref: Option<OwnerReference>,
}

impl KubeSecretStore {
    pub fn new(client: Client) -> Self {
        KubeSecretStore { client, owner_ref: None }
    }

    /// Set `owner_ref` as the owner of every secret created through this store
    pub fn with_owner(mut self, owner_ref: OwnerReference) -> Self {
        self.owner_ref = Some(owner_ref);
        self
    }

    fn build_secret(&self, namespace: &str, name: &str, data: &SecretData) -> Secret {
        Secret {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                labels: Some(BTreeMap::from([
                    (MANAGED_BY_LABEL.to_string(), APP_NAME.to_string()),
                ])),
                owner_references: self.owner_ref.clone().map(|owner_ref| vec![owner_ref]),
                ..Default::default()
            },
            data: Some(
                data.iter()
                    .map(|(key, value)| (key.clone(), ByteString(value.clone())))
                    .collect()
            ),
            type_: Some("Opaque".to_string()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<SecretData>, kube::Error> {
        let api = Api::<Secret>::namespaced(self.client.clone(), namespace);

        Ok(api.get_opt(name).await?.map(|secret| {
            secret.data
                .unwrap_or_default()
                .into_iter()
                .map(|(key, value)| (key, value.0))
                .collect()
        }))
    }

    async fn create(&self, namespace: &str, name: &str, data: &SecretData) -> Result<CreateOutcome, kube::Error> {
        let api = Api::<Secret>::namespaced(self.client.clone(), namespace);

        match api.create(&PostParams::default(), &self.build_secret(namespace, name, data)).await {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(kube::Error::Api(ae)) if ae.code == 409 => Ok(CreateOutcome::AlreadyExists),
            Err(e) => Err(e),
        }
    }
}
