// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn topics_match_original_event_names() {
    assert_eq!(Event::RootNew { root: RootId::new("r") }.topic(), "root/new");
    assert_eq!(Event::Alert { root: RootId::new("r") }.topic(), "alert");
    assert_eq!(
        Event::RequestExpired { request: RequestId::new("q") }.topic(),
        "ar/expired"
    );
}

#[test]
fn round_trips_through_json() {
    let event = Event::DetailsNew { details: DetailsId::new("d1") };
    let json = serde_json::to_string(&event).expect("serialize");
    let back: Event = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(event, back);
}

#[test]
fn null_sink_accepts_any_event_without_panicking() {
    let sink = NullEventSink;
    sink.publish(Event::Alert { root: RootId::new("r") });
}
