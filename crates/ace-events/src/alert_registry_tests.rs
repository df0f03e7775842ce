// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ace_core::RootId;
use std::time::Duration;

#[tokio::test]
async fn get_alerts_returns_none_for_an_unregistered_system() {
    let registry = AlertRegistry::new();
    let alerts = registry.get_alerts("soc", Duration::from_millis(20)).await;
    assert!(alerts.is_empty());
}

#[tokio::test]
async fn handle_feeds_every_registered_system_independently() {
    let registry = AlertRegistry::new();
    registry.register_alert_system("soc");
    registry.register_alert_system("audit");

    registry.handle(&Event::Alert { root: RootId::new("r1") });

    assert_eq!(registry.get_alert_count("soc"), 1);
    assert_eq!(registry.get_alert_count("audit"), 1);

    let soc_alerts = registry.get_alerts("soc", Duration::from_millis(20)).await;
    assert_eq!(soc_alerts, vec![RootId::new("r1")]);
    assert_eq!(registry.get_alert_count("audit"), 1);
}

#[tokio::test]
async fn handle_ignores_non_alert_events() {
    let registry = AlertRegistry::new();
    registry.register_alert_system("soc");

    registry.handle(&Event::RootNew { root: RootId::new("r1") });

    assert_eq!(registry.get_alert_count("soc"), 0);
}

#[tokio::test]
async fn get_alerts_drains_every_pending_alert_in_one_call() {
    let registry = AlertRegistry::new();
    registry.register_alert_system("soc");
    registry.handle(&Event::Alert { root: RootId::new("r1") });
    registry.handle(&Event::Alert { root: RootId::new("r2") });

    let alerts = registry.get_alerts("soc", Duration::from_millis(20)).await;

    assert_eq!(alerts, vec![RootId::new("r1"), RootId::new("r2")]);
    assert_eq!(registry.get_alert_count("soc"), 0);
}

#[tokio::test]
async fn registering_an_existing_name_does_not_reset_its_queue() {
    let registry = AlertRegistry::new();
    registry.register_alert_system("soc");
    registry.handle(&Event::Alert { root: RootId::new("r1") });

    registry.register_alert_system("soc");

    assert_eq!(registry.get_alert_count("soc"), 1);
}
