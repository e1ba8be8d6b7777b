// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

mod cli;

use std::sync::Arc;
use futures::StreamExt;
use std::process;
use clap::Parser;
use clap::CommandFactory;
use rustls::crypto::aws_lc_rs;

use dsp_operator_common::config::AppConfigBuilder;
use dsp_operator_common::state::State;
use dsp_operator_common::telemetry::{error, info, warn, setup_logging};
use dsp_operator_controller::controller::{context::Context, utils::{error_policy, create_k8s_client}, dspa::DspaController};
use dsp_operator_controller::crd::{v1alpha1::dspa::DataSciencePipelinesApplication as V1Alpha1Dspa, utils as crd_utils};

use crate::cli::{CliArgs, Commands};

#[tokio::main]
async fn main() {
    // Install the default aws_lc_rs crypto provider
    let _ = aws_lc_rs::default_provider().install_default();

    let args = CliArgs::parse();

    setup_logging();

    match &args.cmd {
        Some(Commands::Crds) => match crd_utils::generate_crds() {
            Ok(yaml) => print!("{}", yaml),
            Err(e) => {
                error!(event = "Error", error = %e);
                process::exit(1);
            }
        },
        Some(Commands::Controller { config }) => {
            info!(
                event = "Starting",
                version = env!("CARGO_PKG_VERSION"),
            );

            // Load configuration
            let mut builder = AppConfigBuilder::default();
            if let Some(path) = config {
                builder.with_file(path);
            }
            let config = builder
                .with_env()
                .build()
                .unwrap_or_else(|e| {
                    error!(
                        event = "Error",
                        error = %e,
                    );
                    process::exit(1);
                });

            // Freeze the defaults registry, missing images only fail at deploy time
            let state = Arc::new(State::new(config).unwrap_or_else(|e| {
                error!(
                    event = "Error",
                    error = %e,
                );
                process::exit(1);
            }));
            for path in state.defaults.missing_required() {
                warn!(event = "MissingDefault", path = path);
            }

            let client = create_k8s_client().await.unwrap_or_else(|e| {
                error!(
                    event = "Error",
                    error = %e,
                );
                process::exit(1);
            });
            let controller_ctx = Arc::new(Context::new(client, state.clone()));

            // Create CRD controllers
            let v1alpha1_dspa_controller = DspaController::create_controller::<V1Alpha1Dspa>(controller_ctx.clone()).await;

            // Run CRD controllers
            info!(event = "ControllerStarted", kind = "DataSciencePipelinesApplication", version = "v1alpha1");
            let v1alpha1_dspa_handle = tokio::spawn(async move {
                v1alpha1_dspa_controller.run(DspaController::reconcile::<V1Alpha1Dspa>, error_policy::<V1Alpha1Dspa>, controller_ctx.clone())
                    .for_each(|r| async move {
                        match r {
                            Ok(_) => info!(event = "Reconciled", kind = "DataSciencePipelinesApplication", version = "v1alpha1"),
                            Err(e) => error!(event = "ReconcileError", error = %e),
                        }
                    })
                    .await
            });

            // Wait for all controllers to finish
            match tokio::try_join!(v1alpha1_dspa_handle) {
                Ok(_) => info!(event = "Stopped"),
                Err(e) => error!(event = "Error", error = %e),
            }
        },
        None => {
            let mut cmd = CliArgs::command();
            let _ = cmd.print_help();
            process::exit(1);
        },
    }
}
