// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[
    clap(
        name = "data-science-pipelines-operator",
        version,
        author,
        about = "Operator for managing Data Science Pipelines applications"
    )
]
pub struct CliArgs {
    #[clap(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[
        clap(
            name = "crds",
            about = "Generate Custom Resource Definitions (CRDs) for the operator"
        )
    ]
    Crds,
    #[
        clap(
            name = "controller",
            about = "Run the controller"
        )
    ]
    Controller {
        /// JSON or YAML configuration file, layered under DSPO__ environment variables
        #[clap(long, short, env = "DSPO_CONFIG")]
        config: Option<String>,
    },
}
