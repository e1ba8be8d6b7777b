// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use kube::Client;
use std::sync::Arc;

use dsp_operator_common::state::State;

// Shared by every reconcile: the kube client plus the frozen configuration
// and defaults registry
#[derive(Clone)]
pub struct Context {
    pub client: Client,
    pub state: Arc<State>,
}

impl Context {
    pub fn new(client: Client, state: Arc<State>) -> Self {
        Self { client, state }
    }
}
