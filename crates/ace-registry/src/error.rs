// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("analysis module type {amt} depends on unregistered module {dependency}")]
    AnalysisModuleTypeDependency { amt: String, dependency: String },

    #[error("registering {amt} would introduce a dependency cycle: {}", cycle.join(" -> "))]
    CircularDependency { amt: String, cycle: Vec<String> },
}
