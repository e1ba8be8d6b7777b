// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

//! Selection of the defaults registry path holding a component's image.
//!
//! Legacy pipelines use one image set regardless of the engine driver, while
//! pipelines v2 ship a separate set per driver.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use dsp_operator_common::defaults::*;

use crate::error::ConfigurationError;

/// Components whose default image depends on the pipeline version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    ApiServer,
    Artifact,
    Cache,
    MoveResults,
    PersistenceAgent,
    ScheduledWorkflow,
    MlmdEnvoy,
    MlmdGrpc,
    MlmdWriter,
}

impl Component {
    pub const ALL: [Component; 9] = [
        Component::ApiServer,
        Component::Artifact,
        Component::Cache,
        Component::MoveResults,
        Component::PersistenceAgent,
        Component::ScheduledWorkflow,
        Component::MlmdEnvoy,
        Component::MlmdGrpc,
        Component::MlmdWriter,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineVersion {
    Legacy,
    V2,
}

impl From<&str> for PipelineVersion {
    fn from(version: &str) -> Self {
        match version {
            "v2" => PipelineVersion::V2,
            _ => PipelineVersion::Legacy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineDriver {
    Argo,
    Tekton,
}

impl FromStr for EngineDriver {
    type Err = ConfigurationError;

    fn from_str(driver: &str) -> Result<Self, Self::Err> {
        match driver {
            "argo" => Ok(EngineDriver::Argo),
            "tekton" => Ok(EngineDriver::Tekton),
            other => Err(ConfigurationError::UnsupportedEngineDriver(other.to_string())),
        }
    }
}

impl Display for EngineDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            EngineDriver::Argo => write!(f, "argo"),
            EngineDriver::Tekton => write!(f, "tekton"),
        }
    }
}

/// The image set a DSPA draws its pipeline images from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFamily {
    Legacy,
    V2Argo,
    V2Tekton,
}

impl ImageFamily {
    /// Decide the image family from the DSPA toggles. The engine driver is
    /// only parsed for pipelines v2.
    pub fn resolve(dsp_version: &str, engine_driver: &str) -> Result<Self, ConfigurationError> {
        match PipelineVersion::from(dsp_version) {
            PipelineVersion::Legacy => Ok(ImageFamily::Legacy),
            PipelineVersion::V2 => match engine_driver.parse::<EngineDriver>()? {
                EngineDriver::Argo => Ok(ImageFamily::V2Argo),
                EngineDriver::Tekton => Ok(ImageFamily::V2Tekton),
            },
        }
    }

    pub fn path(&self, component: Component) -> &'static str {
        use Component::*;
        use ImageFamily::*;

        match (component, self) {
            (ApiServer, Legacy) => API_SERVER_IMAGE_PATH,
            (ApiServer, V2Argo) => API_SERVER_IMAGE_PATH_V2_ARGO,
            (ApiServer, V2Tekton) => API_SERVER_IMAGE_PATH_V2_TEKTON,
            (Artifact, Legacy) => ARTIFACT_IMAGE_PATH,
            (Artifact, V2Argo) => ARTIFACT_IMAGE_PATH_V2_ARGO,
            (Artifact, V2Tekton) => ARTIFACT_IMAGE_PATH_V2_TEKTON,
            (Cache, Legacy) => CACHE_IMAGE_PATH,
            (Cache, V2Argo) => CACHE_IMAGE_PATH_V2_ARGO,
            (Cache, V2Tekton) => CACHE_IMAGE_PATH_V2_TEKTON,
            (MoveResults, Legacy) => MOVE_RESULTS_IMAGE_PATH,
            (MoveResults, V2Argo) => MOVE_RESULTS_IMAGE_PATH_V2_ARGO,
            (MoveResults, V2Tekton) => MOVE_RESULTS_IMAGE_PATH_V2_TEKTON,
            (PersistenceAgent, Legacy) => PERSISTENCE_AGENT_IMAGE_PATH,
            (PersistenceAgent, V2Argo) => PERSISTENCE_AGENT_IMAGE_PATH_V2_ARGO,
            (PersistenceAgent, V2Tekton) => PERSISTENCE_AGENT_IMAGE_PATH_V2_TEKTON,
            (ScheduledWorkflow, Legacy) => SCHEDULED_WORKFLOW_IMAGE_PATH,
            (ScheduledWorkflow, V2Argo) => SCHEDULED_WORKFLOW_IMAGE_PATH_V2_ARGO,
            (ScheduledWorkflow, V2Tekton) => SCHEDULED_WORKFLOW_IMAGE_PATH_V2_TEKTON,
            (MlmdEnvoy, Legacy) => MLMD_ENVOY_IMAGE_PATH,
            (MlmdEnvoy, V2Argo) => MLMD_ENVOY_IMAGE_PATH_V2_ARGO,
            (MlmdEnvoy, V2Tekton) => MLMD_ENVOY_IMAGE_PATH_V2_TEKTON,
            (MlmdGrpc, Legacy) => MLMD_GRPC_IMAGE_PATH,
            (MlmdGrpc, V2Argo) => MLMD_GRPC_IMAGE_PATH_V2_ARGO,
            (MlmdGrpc, V2Tekton) => MLMD_GRPC_IMAGE_PATH_V2_TEKTON,
            (MlmdWriter, Legacy) => MLMD_WRITER_IMAGE_PATH,
            (MlmdWriter, V2Argo) => MLMD_WRITER_IMAGE_PATH_V2_ARGO,
            (MlmdWriter, V2Tekton) => MLMD_WRITER_IMAGE_PATH_V2_TEKTON,
        }
    }
}

/// Registry path for `component` under the given pipeline version and engine driver
pub fn select(component: Component, dsp_version: &str, engine_driver: &str) -> Result<&'static str, ConfigurationError> {
    Ok(ImageFamily::resolve(dsp_version, engine_driver)?.path(component))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    #[rstest]
    #[case(Component::ApiServer, "argo", API_SERVER_IMAGE_PATH_V2_ARGO)]
    #[case(Component::ApiServer, "tekton", API_SERVER_IMAGE_PATH_V2_TEKTON)]
    #[case(Component::MlmdGrpc, "argo", MLMD_GRPC_IMAGE_PATH_V2_ARGO)]
    #[case(Component::MlmdGrpc, "tekton", MLMD_GRPC_IMAGE_PATH_V2_TEKTON)]
    #[case(Component::MoveResults, "tekton", MOVE_RESULTS_IMAGE_PATH_V2_TEKTON)]
    #[case(Component::PersistenceAgent, "argo", PERSISTENCE_AGENT_IMAGE_PATH_V2_ARGO)]
    fn v2_paths_follow_the_engine_driver(#[case] component: Component, #[case] driver: &str, #[case] expected: &str) {
        assert_eq!(select(component, "v2", driver).unwrap(), expected);
    }

    #[rstest]
    #[case("v1", "argo")]
    #[case("v1", "tekton")]
    #[case("v1", "spark")]
    #[case("", "")]
    #[case("V2", "argo")]
    fn legacy_ignores_the_engine_driver(#[case] version: &str, #[case] driver: &str) {
        for component in Component::ALL {
            assert_eq!(
                select(component, version, driver).unwrap(),
                ImageFamily::Legacy.path(component)
            );
        }
    }

    #[rstest]
    #[case("spark")]
    #[case("Argo")]
    #[case("")]
    fn v2_rejects_unknown_drivers(#[case] driver: &str) {
        assert_eq!(
            select(Component::ApiServer, "v2", driver),
            Err(ConfigurationError::UnsupportedEngineDriver(driver.to_string()))
        );
    }

    #[rstest]
    #[case(ImageFamily::Legacy)]
    #[case(ImageFamily::V2Argo)]
    #[case(ImageFamily::V2Tekton)]
    fn each_family_has_nine_distinct_paths(#[case] family: ImageFamily) {
        let paths: HashSet<&str> = Component::ALL.iter().map(|c| family.path(*c)).collect();

        assert_eq!(paths.len(), 9);
    }

    #[test]
    fn v2_drivers_never_share_a_path() {
        for component in Component::ALL {
            assert_ne!(ImageFamily::V2Argo.path(component), ImageFamily::V2Tekton.path(component));
        }
    }
}
