// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use serde::{Deserialize, Serialize};

use crate::crd::v1alpha1;


#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SecretKeyValue {
    pub name: String,
    pub key: String,
}

impl From<v1alpha1::common::SecretKeyValue> for SecretKeyValue {
    fn from(secret: v1alpha1::common::SecretKeyValue) -> Self {
        SecretKeyValue {
            name: secret.name,
            key: secret.key,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct S3CredentialSecret {
    pub secret_name: String,
    pub access_key: String,
    pub secret_key: String,
}

impl From<v1alpha1::common::S3CredentialSecret> for S3CredentialSecret {
    fn from(secret: v1alpha1::common::S3CredentialSecret) -> Self {
        S3CredentialSecret {
            secret_name: secret.secret_name,
            access_key: secret.access_key,
            secret_key: secret.secret_key,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct ResourceRequirements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<Resources>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests: Option<Resources>,
}

impl ResourceRequirements {
    /// Requirements with both a request and a limit pair
    pub fn new(request_cpu: &str, request_memory: &str, limit_cpu: &str, limit_memory: &str) -> Self {
        ResourceRequirements {
            requests: Some(Resources::new(request_cpu, request_memory)),
            limits: Some(Resources::new(limit_cpu, limit_memory)),
        }
    }
}

impl From<v1alpha1::common::ResourceRequirements> for ResourceRequirements {
    fn from(resources: v1alpha1::common::ResourceRequirements) -> Self {
        ResourceRequirements {
            limits: resources.limits.map(|limits| limits.into()),
            requests: resources.requests.map(|requests| requests.into()),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct Resources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<Quantity>,
}

impl Resources {
    pub fn new(cpu: &str, memory: &str) -> Self {
        Resources {
            cpu: Some(Quantity(cpu.to_string())),
            memory: Some(Quantity(memory.to_string())),
        }
    }
}

impl From<v1alpha1::common::Resources> for Resources {
    fn from(resources: v1alpha1::common::Resources) -> Self {
        Resources {
            cpu: resources.cpu,
            memory: resources.memory,
        }
    }
}
