// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

pub const APP_NAME: &str = "data-science-pipelines-operator";
pub const ENV_PREFIX: &str = "DSPO";

/// Image reference returned for any registry path without a configured value.
/// Deployments using it fail at image pull time, not at resolution time.
pub const DEFAULT_IMAGE_VALUE: &str = "MustSetInConfig";
