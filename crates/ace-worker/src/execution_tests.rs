// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::module::AnalysisModule;
use ace_core::{AnalysisModuleType, RootId};

struct SlowModule {
    amt: AnalysisModuleType,
    delay: Duration,
}

#[async_trait]
impl AnalysisModule for SlowModule {
    fn analysis_module_type(&self) -> AnalysisModuleType {
        self.amt.clone()
    }

    async fn execute_analysis(&self, _root: &RootAnalysis, observable: ObservableIdx) -> Result<Analysis, ModuleError> {
        tokio::time::sleep(self.delay).await;
        Ok(Analysis::new(&self.amt.name, observable))
    }
}

struct FailingModule {
    amt: AnalysisModuleType,
}

#[async_trait]
impl AnalysisModule for FailingModule {
    fn analysis_module_type(&self) -> AnalysisModuleType {
        self.amt.clone()
    }

    async fn execute_analysis(&self, _root: &RootAnalysis, _observable: ObservableIdx) -> Result<Analysis, ModuleError> {
        Err(ModuleError::new("boom"))
    }
}

fn amt(name: &str) -> AnalysisModuleType {
    AnalysisModuleType {
        name: name.to_string(),
        description: String::new(),
        observable_types: vec!["test".to_string()],
        required_directives: Vec::new(),
        dependencies: Vec::new(),
        cache_ttl: None,
        version: "1".to_string(),
        extended_version: Default::default(),
        timeout: Duration::from_secs(5),
        manual: false,
        types_produced: Vec::new(),
        is_multi_process: false,
        limit: 1,
    }
}

#[tokio::test]
async fn in_task_strategy_completes_within_timeout() {
    let module = SlowModule { amt: amt("lookup"), delay: Duration::from_millis(1) };
    let mut root = RootAnalysis::new(RootId::new("r1"));
    let idx = root.add_observable("test", "1.2.3.4");

    let outcome = InTaskStrategy.execute(&module, &root, idx, Duration::from_millis(50)).await;
    assert!(matches!(outcome, ExecutionOutcome::Completed(_)));
}

#[tokio::test]
async fn in_task_strategy_times_out_a_slow_module() {
    let module = SlowModule { amt: amt("lookup"), delay: Duration::from_millis(50) };
    let mut root = RootAnalysis::new(RootId::new("r1"));
    let idx = root.add_observable("test", "1.2.3.4");

    let outcome = InTaskStrategy.execute(&module, &root, idx, Duration::from_millis(5)).await;
    assert!(matches!(outcome, ExecutionOutcome::TimedOut));
}

#[tokio::test]
async fn in_task_strategy_surfaces_a_module_error_without_panicking() {
    let module = FailingModule { amt: amt("lookup") };
    let mut root = RootAnalysis::new(RootId::new("r1"));
    let idx = root.add_observable("test", "1.2.3.4");

    let outcome = InTaskStrategy.execute(&module, &root, idx, Duration::from_millis(50)).await;
    match outcome {
        ExecutionOutcome::Failed(err) => assert_eq!(err.message, "boom"),
        other => panic!("expected Failed, got {other:?}"),
    }
}
