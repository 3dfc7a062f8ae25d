//! Behavioural tests for the collector façade over an in-memory store.
//!
//! Each test keeps its own clone of the store handle for assertions; the
//! collector's public surface deliberately exposes no way back to the store.

use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};

use tally_core::{
  capacity::Capacity,
  event::{EventBundle, EventKind, SubjectState},
  normalize::ALL_DISABLED_SENTINEL,
  store::EventStore,
};
use tally_store_sqlite::SqliteStore;

use crate::{AlwaysReady, Collector, Readiness, ServiceState, dump_line};

/// Toggleable readiness probe, standing in for the host boot signal.
#[derive(Clone, Default)]
struct BootFlag(Arc<AtomicBool>);

impl BootFlag {
  fn set(&self, booted: bool) {
    self.0.store(booted, Ordering::SeqCst);
  }
}

impl Readiness for BootFlag {
  fn booted(&self) -> bool {
    self.0.load(Ordering::SeqCst)
  }
}

async fn in_memory(capacity: Capacity) -> SqliteStore {
  SqliteStore::open_in_memory(capacity)
    .await
    .expect("in-memory store")
}

async fn collector() -> (SqliteStore, Collector<SqliteStore, AlwaysReady>) {
  let store = in_memory(Capacity::Unbounded).await;
  (store.clone(), Collector::new(store, AlwaysReady))
}

fn accessibility_bundle(services: &[&str]) -> EventBundle {
  EventBundle {
    enabled_service_list: Some(
      services.iter().map(|s| (*s).to_owned()).collect(),
    ),
  }
}

// ─── collect ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn collect_stores_one_row_per_call() {
  let (store, c) = collector().await;

  c.collect(EventKind::DeviceAdmin, "com.example.admin").await;
  c.collect(EventKind::UsageStats, "com.example.usage").await;

  let rows = store.scan_all().await.unwrap();
  assert_eq!(rows.len(), 2);
  assert_eq!(rows[0].kind, EventKind::DeviceAdmin);
  assert_eq!(rows[0].subject, "com.example.admin");
  assert_eq!(rows[0].state, SubjectState::Enabled);
  assert_eq!(rows[1].kind, EventKind::UsageStats);
}

#[tokio::test]
async fn collect_while_not_ready_stores_nothing() {
  let flag = BootFlag::default();
  let store = in_memory(Capacity::Unbounded).await;
  let c = Collector::new(store.clone(), flag.clone());

  assert_eq!(c.state(), ServiceState::NotReady);
  c.collect(EventKind::Accessibility, "svc.A").await;
  assert_eq!(store.row_count().await.unwrap(), 0);

  // Readiness is polled per call; flipping the flag makes the next call
  // land without rebuilding the collector.
  flag.set(true);
  assert_eq!(c.state(), ServiceState::Ready);
  c.collect(EventKind::Accessibility, "svc.A").await;
  assert_eq!(store.row_count().await.unwrap(), 1);
}

#[tokio::test]
async fn collect_at_capacity_leaves_count_unchanged() {
  let store = in_memory(Capacity::Bounded(2)).await;
  let c = Collector::new(store.clone(), AlwaysReady);

  for pkg in ["a", "b", "c", "d"] {
    c.collect(EventKind::DeviceAdmin, pkg).await;
  }
  assert_eq!(store.row_count().await.unwrap(), 2);
}

// ─── notify_event ────────────────────────────────────────────────────────────

#[tokio::test]
async fn accessibility_list_stores_rows_in_order() {
  let (store, c) = collector().await;

  c.notify_event(
    EventKind::Accessibility.code(),
    accessibility_bundle(&["svc.A", "svc.B"]),
  )
  .await;

  let rows = store.scan_all().await.unwrap();
  assert_eq!(rows.len(), 2);
  assert_eq!(rows[0].subject, "svc.A");
  assert_eq!(rows[1].subject, "svc.B");
  assert!(rows.iter().all(|r| r.state == SubjectState::Enabled));
  assert!(rows.iter().all(|r| r.kind == EventKind::Accessibility));
}

#[tokio::test]
async fn empty_accessibility_list_stores_sentinel_row() {
  let (store, c) = collector().await;

  c.notify_event(EventKind::Accessibility.code(), accessibility_bundle(&[]))
    .await;

  let rows = store.scan_all().await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].subject, ALL_DISABLED_SENTINEL);
  assert_eq!(rows[0].state, SubjectState::Disabled);
}

#[tokio::test]
async fn missing_service_list_is_dropped_quietly() {
  let (store, c) = collector().await;
  c.notify_event(EventKind::Accessibility.code(), EventBundle::default())
    .await;
  assert_eq!(store.row_count().await.unwrap(), 0);
}

#[tokio::test]
async fn unknown_event_code_is_dropped_quietly() {
  let (store, c) = collector().await;
  c.notify_event(99, accessibility_bundle(&["svc.A"])).await;
  assert_eq!(store.row_count().await.unwrap(), 0);
}

#[tokio::test]
async fn reserved_kinds_store_nothing() {
  let (store, c) = collector().await;
  c.notify_event(EventKind::DeviceAdmin.code(), EventBundle::default())
    .await;
  c.notify_event(EventKind::UsageStats.code(), EventBundle::default())
    .await;
  assert_eq!(store.row_count().await.unwrap(), 0);
}

#[tokio::test]
async fn notify_while_not_ready_stores_nothing() {
  let store = in_memory(Capacity::Unbounded).await;
  let c = Collector::new(store.clone(), BootFlag::default());

  c.notify_event(
    EventKind::Accessibility.code(),
    accessibility_bundle(&["svc.A"]),
  )
  .await;
  assert_eq!(store.row_count().await.unwrap(), 0);
}

// ─── Failed state ────────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_collector_absorbs_every_call() {
  let c: Collector<SqliteStore, _> = Collector::failed(AlwaysReady);

  assert_eq!(c.state(), ServiceState::Failed);
  c.enable();
  c.disable();
  c.collect(EventKind::Accessibility, "svc.A").await;
  c.notify_event(
    EventKind::Accessibility.code(),
    accessibility_bundle(&["svc.A"]),
  )
  .await;
  c.dump().await;
}

// ─── Dump ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn dump_line_is_space_joined_in_wire_order() {
  let (store, c) = collector().await;
  c.collect(EventKind::Accessibility, "svc.A").await;

  let rows = store.scan_all().await.unwrap();
  let line = dump_line(&rows[0]);

  let fields: Vec<_> = line.splitn(4, ' ').collect();
  assert_eq!(fields[0], "1");
  assert_eq!(fields[1], "svc.A");
  assert_eq!(fields[2], "enabled");
  assert_eq!(fields[3], rows[0].created_at.to_rfc3339());
}
