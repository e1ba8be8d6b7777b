// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use kube::CustomResourceExt;
use kube::core::crd::merge_crds;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;

use crate::crd::v1alpha1::dspa::DataSciencePipelinesApplication as V1Alpha1Dspa;
use crate::error::{ControllerError, Result};


/// Every CRD served by the operator, with all versions merged
pub fn crds() -> Result<Vec<CustomResourceDefinition>> {
    let dspa = merge_crds(vec![V1Alpha1Dspa::crd()], "v1alpha1")
        .map_err(|e| ControllerError::SerializationError(e.to_string()))?;

    Ok(vec![dspa])
}

/// Render the CRDs for the operator as a multi-document YAML stream
pub fn generate_crds() -> Result<String> {
    let mut out = String::new();

    for crd in crds()? {
        out.push_str("---\n");
        out.push_str(
            &serde_norway::to_string(&crd)
                .map_err(|e| ControllerError::SerializationError(e.to_string()))?
        );
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dspa_crd_is_namespaced_with_short_name() {
        let crds = crds().unwrap();
        let dspa = &crds[0];

        assert_eq!(dspa.spec.group, "datasciencepipelinesapplications.opendatahub.io");
        assert_eq!(dspa.spec.scope, "Namespaced");
        assert_eq!(dspa.spec.names.kind, "DataSciencePipelinesApplication");
        assert_eq!(dspa.spec.names.short_names, Some(vec!["dspa".to_string()]));
        assert_eq!(dspa.spec.versions.len(), 1);
    }

    #[test]
    fn generated_yaml_starts_with_document_marker() {
        let yaml = generate_crds().unwrap();

        assert!(yaml.starts_with("---\n"));
        assert!(yaml.contains("kind: CustomResourceDefinition"));
    }
}
