// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

//! Read / create-if-absent / re-read-on-conflict handling of credential secrets.
//!
//! A credential either lives in a secret the user named in the DSPA, which
//! must already exist, or in a secret named after the DSPA which the operator
//! creates exactly once with generated material. Nothing here ever updates an
//! existing secret.

use base64::{engine::general_purpose::STANDARD, Engine};
use rand::{distr::Alphanumeric, Rng};
use serde::Serialize;
use std::fmt::{Debug, Formatter, Result as FmtResult};

use dsp_operator_common::telemetry::{debug, info};

use crate::controller::constants::{
    DB_SECRET_KEY, DB_SECRET_NAME_PREFIX, GENERATED_ACCESS_KEY_LENGTH, GENERATED_PASSWORD_LENGTH,
    GENERATED_SECRET_KEY_LENGTH, S3_ACCESS_KEY, S3_SECRET_KEY, S3_SECRET_NAME_PREFIX,
};
use crate::controller::secrets::{CreateOutcome, SecretData, SecretStore};
use crate::crd::hub::common::{S3CredentialSecret, SecretKeyValue};
use crate::error::{ConfigurationError, ResolutionResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Ownership {
    /// Named in the DSPA, must exist before resolution
    UserOwned,
    /// Named after the DSPA, generated on first resolution
    OperatorOwned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CredentialKind {
    DatabasePassword,
    ObjectStorageKeys,
}

impl CredentialKind {
    fn generate(&self) -> Credential {
        match self {
            CredentialKind::DatabasePassword => Credential {
                primary: random_alphanumeric(GENERATED_PASSWORD_LENGTH),
                secondary: None,
            },
            CredentialKind::ObjectStorageKeys => Credential {
                primary: random_alphanumeric(GENERATED_ACCESS_KEY_LENGTH),
                secondary: Some(random_alphanumeric(GENERATED_SECRET_KEY_LENGTH)),
            },
        }
    }
}

/// Where a credential lives and which fields of the secret hold it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialReference {
    pub namespace: String,
    pub name: String,
    pub primary_key: String,
    pub secondary_key: Option<String>,
    pub ownership: Ownership,
    pub kind: CredentialKind,
}

impl CredentialReference {
    /// Database password reference. `custom` is the secret named in the DSPA,
    /// if any. Otherwise the operator-owned `ds-pipeline-db-<dspa>` is used.
    pub fn database(namespace: &str, dspa_name: &str, custom: Option<&SecretKeyValue>) -> Self {
        let (name, key, ownership) = match custom {
            Some(secret) => (secret.name.clone(), secret.key.clone(), Ownership::UserOwned),
            None => (
                format!("{}{}", DB_SECRET_NAME_PREFIX, dspa_name),
                DB_SECRET_KEY.to_string(),
                Ownership::OperatorOwned,
            ),
        };

        CredentialReference {
            namespace: namespace.to_string(),
            name,
            primary_key: key,
            secondary_key: None,
            ownership,
            kind: CredentialKind::DatabasePassword,
        }
    }

    /// Object storage access/secret key pair reference
    pub fn object_storage(namespace: &str, dspa_name: &str, custom: Option<&S3CredentialSecret>) -> Self {
        let (name, access_key, secret_key, ownership) = match custom {
            Some(secret) => (
                secret.secret_name.clone(),
                secret.access_key.clone(),
                secret.secret_key.clone(),
                Ownership::UserOwned,
            ),
            None => (
                format!("{}{}", S3_SECRET_NAME_PREFIX, dspa_name),
                S3_ACCESS_KEY.to_string(),
                S3_SECRET_KEY.to_string(),
                Ownership::OperatorOwned,
            ),
        };

        CredentialReference {
            namespace: namespace.to_string(),
            name,
            primary_key: access_key,
            secondary_key: Some(secret_key),
            ownership,
            kind: CredentialKind::ObjectStorageKeys,
        }
    }

    fn to_secret_data(&self, credential: &Credential) -> SecretData {
        let mut data = SecretData::new();
        data.insert(self.primary_key.clone(), credential.primary.clone());

        if let (Some(key), Some(value)) = (&self.secondary_key, &credential.secondary) {
            data.insert(key.clone(), value.clone());
        }

        data
    }

    /// Pull the configured fields out of a stored secret. A missing or empty
    /// field makes the whole credential unusable.
    fn extract(&self, data: &SecretData) -> Result<Credential, ConfigurationError> {
        let field = |key: &str| -> Result<Vec<u8>, ConfigurationError> {
            match data.get(key) {
                Some(value) if !value.is_empty() => Ok(value.clone()),
                _ => Err(ConfigurationError::EmptySecretField {
                    name: self.name.clone(),
                    key: key.to_string(),
                }),
            }
        };

        Ok(Credential {
            primary: field(&self.primary_key)?,
            secondary: self.secondary_key.as_deref().map(field).transpose()?,
        })
    }
}

/// Raw credential material
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    primary: Vec<u8>,
    secondary: Option<Vec<u8>>,
}

impl Credential {
    pub fn new(primary: impl Into<Vec<u8>>, secondary: Option<Vec<u8>>) -> Self {
        Credential { primary: primary.into(), secondary }
    }

    /// Primary value, base64 encoded
    pub fn primary(&self) -> String {
        STANDARD.encode(&self.primary)
    }

    /// Secondary value, base64 encoded. Empty for single-field credentials.
    pub fn secondary(&self) -> String {
        self.secondary
            .as_ref()
            .map(|value| STANDARD.encode(value))
            .unwrap_or_default()
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Credential")
            .field("primary", &"<redacted>")
            .field("secondary", &self.secondary.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Outcome of the read phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Materialized {
    Existing(Credential),
    /// Fresh material that still has to be persisted
    Generated(Credential),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CredentialOrigin {
    /// Read from a secret that already existed
    Existing,
    /// Generated and stored during this pass
    Created,
    /// Generated during this pass, but another writer stored its own first
    Adopted,
}

pub struct SecretMaterializer<'a> {
    store: &'a dyn SecretStore,
}

impl<'a> SecretMaterializer<'a> {
    pub fn new(store: &'a dyn SecretStore) -> Self {
        SecretMaterializer { store }
    }

    /// Read the referenced secret, generating material when an operator-owned
    /// secret does not exist yet. Never writes.
    pub async fn materialize(&self, reference: &CredentialReference) -> ResolutionResult<Materialized> {
        match self.store.get(&reference.namespace, &reference.name).await? {
            Some(data) => Ok(Materialized::Existing(reference.extract(&data)?)),
            None => match reference.ownership {
                Ownership::UserOwned => Err(ConfigurationError::SecretNotFound {
                    name: reference.name.clone(),
                }
                .into()),
                Ownership::OperatorOwned => {
                    debug!(
                        event = "GeneratedCredential",
                        secret = reference.name.as_str(),
                        namespace = reference.namespace.as_str(),
                    );
                    Ok(Materialized::Generated(reference.kind.generate()))
                }
            },
        }
    }

    /// Store generated material. When another writer got there first the
    /// stored material is read back and returned instead.
    pub async fn persist(&self, reference: &CredentialReference, generated: Credential) -> ResolutionResult<(Credential, CredentialOrigin)> {
        let data = reference.to_secret_data(&generated);

        match self.store.create(&reference.namespace, &reference.name, &data).await? {
            CreateOutcome::Created => {
                info!(
                    event = "CreatedSecret",
                    secret = reference.name.as_str(),
                    namespace = reference.namespace.as_str(),
                );
                Ok((generated, CredentialOrigin::Created))
            }
            CreateOutcome::AlreadyExists => {
                info!(
                    event = "AdoptedSecret",
                    secret = reference.name.as_str(),
                    namespace = reference.namespace.as_str(),
                );
                let stored = self.store
                    .get(&reference.namespace, &reference.name)
                    .await?
                    .ok_or_else(|| ConfigurationError::SecretNotFound { name: reference.name.clone() })?;

                Ok((reference.extract(&stored)?, CredentialOrigin::Adopted))
            }
        }
    }

    /// Both phases in order, at most one create
    pub async fn ensure(&self, reference: &CredentialReference) -> ResolutionResult<(Credential, CredentialOrigin)> {
        match self.materialize(reference).await? {
            Materialized::Existing(credential) => Ok((credential, CredentialOrigin::Existing)),
            Materialized::Generated(credential) => self.persist(reference, credential).await,
        }
    }
}

fn random_alphanumeric(length: usize) -> Vec<u8> {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::secrets::MockSecretStore;
    use crate::error::ResolutionError;

    fn decode(value: &str) -> Vec<u8> {
        STANDARD.decode(value).unwrap()
    }

    fn server_error() -> kube::Error {
        kube::Error::Api(kube::error::ErrorResponse {
            status: "Failure".to_string(),
            message: "etcdserver: request timed out".to_string(),
            reason: "InternalError".to_string(),
            code: 500,
        })
    }

    #[test]
    fn database_reference_prefers_the_custom_secret() {
        let custom = SecretKeyValue { name: "my-db-secret".to_string(), key: "pw".to_string() };
        let reference = CredentialReference::database("team-a", "sample", Some(&custom));

        assert_eq!(reference.name, "my-db-secret");
        assert_eq!(reference.primary_key, "pw");
        assert_eq!(reference.ownership, Ownership::UserOwned);

        let fallback = CredentialReference::database("team-a", "sample", None);
        assert_eq!(fallback.name, "ds-pipeline-db-sample");
        assert_eq!(fallback.primary_key, "password");
        assert_eq!(fallback.ownership, Ownership::OperatorOwned);
    }

    #[test]
    fn object_storage_reference_falls_back_to_operator_secret() {
        let reference = CredentialReference::object_storage("team-a", "sample", None);

        assert_eq!(reference.name, "ds-pipeline-s3-sample");
        assert_eq!(reference.primary_key, "accesskey");
        assert_eq!(reference.secondary_key.as_deref(), Some("secretkey"));
    }

    #[test]
    fn generated_material_has_fixed_lengths() {
        let password = CredentialKind::DatabasePassword.generate();
        assert_eq!(decode(&password.primary()).len(), 12);
        assert_eq!(password.secondary(), "");

        let keys = CredentialKind::ObjectStorageKeys.generate();
        assert_eq!(decode(&keys.primary()).len(), 16);
        assert_eq!(decode(&keys.secondary()).len(), 24);
        assert!(decode(&keys.secondary()).iter().all(|b| b.is_ascii_alphanumeric()));
    }

    #[test]
    fn debug_output_redacts_material() {
        let credential = Credential::new("hunter2", None);

        assert!(!format!("{:?}", credential).contains("hunter2"));
    }

    #[tokio::test]
    async fn existing_secret_is_read_without_writing() {
        let mut store = MockSecretStore::new();
        store.expect_get().times(1).returning(|namespace, name| {
            assert_eq!(namespace, "team-a");
            assert_eq!(name, "ds-pipeline-db-sample");
            Ok(Some(SecretData::from([("password".to_string(), b"s3cret".to_vec())])))
        });
        store.expect_create().never();

        let reference = CredentialReference::database("team-a", "sample", None);
        let (credential, origin) = SecretMaterializer::new(&store).ensure(&reference).await.unwrap();

        assert_eq!(origin, CredentialOrigin::Existing);
        assert_eq!(credential.primary(), STANDARD.encode("s3cret"));
    }

    #[tokio::test]
    async fn missing_user_secret_is_fatal_and_never_created() {
        let mut store = MockSecretStore::new();
        store.expect_get().times(1).returning(|_, _| Ok(None));
        store.expect_create().never();

        let custom = SecretKeyValue { name: "my-db-secret".to_string(), key: "pw".to_string() };
        let reference = CredentialReference::database("team-a", "sample", Some(&custom));
        let err = SecretMaterializer::new(&store).ensure(&reference).await.unwrap_err();

        assert!(matches!(
            err,
            ResolutionError::Configuration(ConfigurationError::SecretNotFound { ref name }) if name == "my-db-secret"
        ));
    }

    #[tokio::test]
    async fn empty_field_is_fatal() {
        let mut store = MockSecretStore::new();
        store.expect_get().returning(|_, _| {
            Ok(Some(SecretData::from([
                ("accesskey".to_string(), b"AKIA".to_vec()),
                ("secretkey".to_string(), Vec::new()),
            ])))
        });
        store.expect_create().never();

        let reference = CredentialReference::object_storage("team-a", "sample", None);
        let err = SecretMaterializer::new(&store).materialize(&reference).await.unwrap_err();

        assert!(matches!(
            err,
            ResolutionError::Configuration(ConfigurationError::EmptySecretField { ref key, .. }) if key == "secretkey"
        ));
    }

    #[tokio::test]
    async fn missing_operator_secret_is_generated_then_created() {
        let mut store = MockSecretStore::new();
        store.expect_get().times(1).returning(|_, _| Ok(None));
        store.expect_create().times(1).returning(|namespace, name, data| {
            assert_eq!(namespace, "team-a");
            assert_eq!(name, "ds-pipeline-s3-sample");
            assert_eq!(data.get("accesskey").map(Vec::len), Some(16));
            assert_eq!(data.get("secretkey").map(Vec::len), Some(24));
            Ok(CreateOutcome::Created)
        });

        let reference = CredentialReference::object_storage("team-a", "sample", None);
        let (credential, origin) = SecretMaterializer::new(&store).ensure(&reference).await.unwrap();

        assert_eq!(origin, CredentialOrigin::Created);
        assert_eq!(decode(&credential.primary()).len(), 16);
    }

    #[tokio::test]
    async fn lost_create_race_adopts_stored_material() {
        let mut store = MockSecretStore::new();
        store.expect_create().times(1).returning(|_, _, _| Ok(CreateOutcome::AlreadyExists));
        store.expect_get().times(1).returning(|_, _| {
            Ok(Some(SecretData::from([("password".to_string(), b"winner".to_vec())])))
        });

        let reference = CredentialReference::database("team-a", "sample", None);
        let generated = Credential::new("loser", None);
        let (credential, origin) = SecretMaterializer::new(&store).persist(&reference, generated).await.unwrap();

        assert_eq!(origin, CredentialOrigin::Adopted);
        assert_eq!(credential.primary(), STANDARD.encode("winner"));
    }

    #[tokio::test]
    async fn store_failures_are_retryable() {
        let mut store = MockSecretStore::new();
        store.expect_get().returning(|_, _| Err(server_error()));

        let reference = CredentialReference::database("team-a", "sample", None);
        let err = SecretMaterializer::new(&store).ensure(&reference).await.unwrap_err();

        assert!(err.is_retryable());
    }
}
