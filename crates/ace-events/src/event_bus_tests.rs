// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ace_core::RootId;
use parking_lot::Mutex as StdMutex;
use std::sync::Arc;

#[yare::parameterized(
    root_new = { Event::RootNew { root: RootId::new("r1") }, "root/new" },
    alert = { Event::Alert { root: RootId::new("r1") }, "alert" },
)]
fn fire_invokes_only_handlers_registered_for_the_matching_topic(event: Event, topic: &'static str) {
    let bus = EventBus::new();
    let seen: Arc<StdMutex<Vec<&'static str>>> = Arc::new(StdMutex::new(Vec::new()));

    let seen_match = seen.clone();
    bus.register(topic, Box::new(move |_| seen_match.lock().push("matched")));
    let seen_other = seen.clone();
    bus.register("unrelated/topic", Box::new(move |_| seen_other.lock().push("other")));

    bus.fire(event);

    assert_eq!(*seen.lock(), vec!["matched"]);
}

#[test]
fn fire_runs_handlers_in_registration_order() {
    let bus = EventBus::new();
    let order: Arc<StdMutex<Vec<u8>>> = Arc::new(StdMutex::new(Vec::new()));

    let o1 = order.clone();
    bus.register("alert", Box::new(move |_| o1.lock().push(1)));
    let o2 = order.clone();
    bus.register("alert", Box::new(move |_| o2.lock().push(2)));

    bus.fire(Event::Alert { root: RootId::new("r1") });

    assert_eq!(*order.lock(), vec![1, 2]);
}

#[test]
fn a_panicking_handler_does_not_prevent_later_handlers_from_running() {
    let bus = EventBus::new();
    let ran = Arc::new(StdMutex::new(false));

    bus.register("alert", Box::new(|_| panic!("boom")));
    let ran_clone = ran.clone();
    bus.register("alert", Box::new(move |_| *ran_clone.lock() = true));

    bus.fire(Event::Alert { root: RootId::new("r1") });

    assert!(*ran.lock());
}

#[test]
fn log_records_every_fired_event_regardless_of_subscribers() {
    let bus = EventBus::new();
    bus.fire(Event::RootNew { root: RootId::new("r1") });
    bus.fire(Event::RootDeleted { root: RootId::new("r1") });

    assert_eq!(bus.log(), vec![
        Event::RootNew { root: RootId::new("r1") },
        Event::RootDeleted { root: RootId::new("r1") },
    ]);
}

#[test]
fn publish_via_event_sink_trait_reaches_registered_handlers() {
    let bus = EventBus::new();
    let seen = Arc::new(StdMutex::new(false));
    let seen_clone = seen.clone();
    bus.register("root/modified", Box::new(move |_| *seen_clone.lock() = true));

    let sink: &dyn EventSink = &bus;
    sink.publish(Event::RootModified { root: RootId::new("r1") });

    assert!(*seen.lock());
}
