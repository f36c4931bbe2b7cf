//! Tests for the downloader: catalog listing, per-item fetching and run orchestration.

use super::test_helpers::{Reply, ScriptedSource, create_test_downloader};
use super::*;
use crate::types::{AssetKind, Event, ItemId};


/// Drain every event currently buffered on a receiver
fn drain_events(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
