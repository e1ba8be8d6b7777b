// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use std::result;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("kubernetes api error: {0}")]
    KubeError(#[from] kube::Error),
    #[error("missing object key: {0}")]
    MissingObjectKeyError(&'static str),
    #[error(transparent)]
    ResolutionError(#[from] ResolutionError),
    #[error("serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = result::Result<T, ControllerError>;

/// Errors that can only be fixed by changing the DSPA or the secrets it references.
/// Retrying resolution without user action yields the same error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("missing object metadata: {0}")]
    MissingMetadata(&'static str),
    #[error("illegal engine driver ({0}) specified for pipelines v2, cannot continue")]
    UnsupportedEngineDriver(String),
    #[error("either [spec.objectStorage.minio] or [spec.objectStorage.externalStorage] need to be specified in DSPA spec")]
    MissingObjectStorage,
    #[error("minio specified, but no image provided in the DSPA spec")]
    MissingMinioImage,
    #[error("mlPipelineUI specified, but no image provided in the DSPA spec")]
    MissingUiImage,
    #[error("secret [{name}] was specified in the DSPA spec but does not exist")]
    SecretNotFound { name: String },
    #[error("credential from secret [{name}] for key [{key}] was not successfully retrieved, ensure that the secret with this key exists")]
    EmptySecretField { name: String, key: String },
}

#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("secret store error: {0}")]
    Store(#[from] kube::Error),
}

impl ResolutionError {
    /// Store failures are transient, configuration errors need user action
    pub fn is_retryable(&self) -> bool {
        matches!(self, ResolutionError::Store(_))
    }
}

pub type ResolutionResult<T> = result::Result<T, ResolutionError>;
