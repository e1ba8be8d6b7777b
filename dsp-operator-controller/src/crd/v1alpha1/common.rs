// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use serde::{Deserialize, Serialize};
use schemars::JsonSchema;


#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
pub struct SecretKeyValue {
    /// The name of the Secret to reference
    pub name: String,
    /// The key in the Secret holding the value
    pub key: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct S3CredentialSecret {
    /// The name of the Secret holding the S3 credentials
    pub secret_name: String,
    /// The key in the Secret holding the access key id. Not to be confused with the value.
    pub access_key: String,
    /// The key in the Secret holding the secret access key. Not to be confused with the value.
    pub secret_key: String,
}

/// Compute resource requirements of a component. Storage is configured
/// separately per component and is not part of this type.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema, Default)]
pub struct ResourceRequirements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<Resources>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests: Option<Resources>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema, Default)]
pub struct Resources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<Quantity>,
}
