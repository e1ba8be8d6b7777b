// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

pub mod constants;
pub mod context;
pub mod dspa;
pub mod images;
pub mod materializer;
pub mod params;
pub mod resolver;
pub mod secrets;
pub mod utils;
