// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Module registry: the one source of truth for which analysis module types
//! exist, validated as a DAG over their `dependencies`.
//!
//! Cycle detection is a single DFS over a tentative adjacency map (every
//! already-registered AMT's dependencies, plus the candidate's), rejecting
//! the instant a back-edge lands on an ancestor still on the current DFS
//! stack. Self-dependency falls out of this for free: a candidate naming
//! itself produces an edge straight back to the DFS root, a one-node cycle,
//! with no special case ahead of the DFS.

use crate::error::RegistryError;
use ace_core::AnalysisModuleType;
use ace_queue::WorkQueueRegistry;
use ace_storage::ResultCache;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

#[derive(Default)]
pub struct Registry {
    amts: RwLock<HashMap<String, AnalysisModuleType>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `amt`. A version change from any existing registration under
    /// the same name drains that module's work queue and purges its cache
    /// entries before the new record is installed; an extended-version-only
    /// change is installed in place and left for the worker manager to
    /// attempt a live upgrade against.
    pub fn register(
        &self,
        amt: AnalysisModuleType,
        queues: &WorkQueueRegistry,
        cache: &ResultCache,
    ) -> Result<AnalysisModuleType, RegistryError> {
        self.check_dependencies_exist(&amt)?;
        self.check_acyclic(&amt)?;

        let mut amts = self.amts.write();
        match amts.get(&amt.name) {
            Some(existing) if existing.version != amt.version => {
                tracing::info!(amt = %amt.name, old_version = %existing.version, new_version = %amt.version, "module version changed, draining queue and purging cache");
                queues.invalidate_work_queue(&amt.name);
                cache.delete_by_amt(&amt.name);
            }
            None => {
                queues.add_work_queue(amt.name.clone());
            }
            Some(_) => {}
        }
        amts.insert(amt.name.clone(), amt.clone());
        Ok(amt)
    }

    pub fn get(&self, name: &str) -> Option<AnalysisModuleType> {
        self.amts.read().get(name).cloned()
    }

    pub fn delete(&self, name: &str, queues: &WorkQueueRegistry) -> Option<AnalysisModuleType> {
        let removed = self.amts.write().remove(name);
        if removed.is_some() {
            queues.remove_work_queue(name);
        }
        removed
    }

    pub fn list(&self) -> Vec<AnalysisModuleType> {
        self.amts.read().values().cloned().collect()
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn reset(&self) {
        self.amts.write().clear();
    }

    fn check_dependencies_exist(&self, candidate: &AnalysisModuleType) -> Result<(), RegistryError> {
        let amts = self.amts.read();
        for dep in &candidate.dependencies {
            if dep == &candidate.name {
                continue; // caught as a cycle by check_acyclic
            }
            if !amts.contains_key(dep) {
                return Err(RegistryError::AnalysisModuleTypeDependency {
                    amt: candidate.name.clone(),
                    dependency: dep.clone(),
                });
            }
        }
        Ok(())
    }

    fn check_acyclic(&self, candidate: &AnalysisModuleType) -> Result<(), RegistryError> {
        let amts = self.amts.read();
        let mut adjacency: HashMap<String, Vec<String>> =
            amts.iter().map(|(name, amt)| (name.clone(), amt.dependencies.clone())).collect();
        adjacency.insert(candidate.name.clone(), candidate.dependencies.clone());
        drop(amts);

        let mut visited = HashSet::new();
        let mut stack = Vec::new();
        dfs(&candidate.name, &adjacency, &mut visited, &mut stack)
    }
}

fn dfs(
    node: &str,
    adjacency: &HashMap<String, Vec<String>>,
    visited: &mut HashSet<String>,
    stack: &mut Vec<String>,
) -> Result<(), RegistryError> {
    if let Some(pos) = stack.iter().position(|n| n == node) {
        let mut cycle = stack[pos..].to_vec();
        cycle.push(node.to_string());
        return Err(RegistryError::CircularDependency { amt: stack[0].clone(), cycle });
    }
    if visited.contains(node) {
        return Ok(());
    }
    stack.push(node.to_string());
    if let Some(deps) = adjacency.get(node) {
        for dep in deps {
            dfs(dep, adjacency, visited, stack)?;
        }
    }
    stack.pop();
    visited.insert(node.to_string());
    Ok(())
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
