//! Signal delivery to a running orchestrator. Kept in its own binary since
//! raised signals reach the whole test process.

#![cfg(unix)]

use std::sync::Arc;
use std::time::Duration;

use service_lifecycle::lifecycle::signals::spawn_signal_listener;
use service_lifecycle::lifecycle::{
    ResourceRegistry, ShutdownCause, ShutdownOrchestrator, ShutdownResult,
};

mod common;
use common::ScriptedResource;

fn raise(signal: libc::c_int) {
    // SAFETY: raise only delivers a signal; tokio's handler is already installed.
    let rc = unsafe { libc::raise(signal) };
    assert_eq!(rc, 0);
}

#[tokio::test]
async fn repeated_hangups_release_each_resource_once() {
    let resources = [
        Arc::new(ScriptedResource::new("db").release_delay(Duration::from_millis(100))),
        Arc::new(ScriptedResource::new("cache")),
    ];
    let mut registry = ResourceRegistry::new();
    for r in &resources {
        registry.register(r.clone()).unwrap();
    }
    let orchestrator = ShutdownOrchestrator::new(Arc::new(registry));
    let mut states = orchestrator.subscribe();

    spawn_signal_listener(orchestrator.clone(), Duration::from_secs(2)).unwrap();

    raise(libc::SIGHUP);
    tokio::time::timeout(Duration::from_secs(2), states.wait_for(|s| !s.is_idle()))
        .await
        .expect("first signal never reached the orchestrator")
        .unwrap();
    raise(libc::SIGHUP);

    let report = tokio::time::timeout(Duration::from_secs(3), orchestrator.completed())
        .await
        .expect("shutdown never completed");

    assert_eq!(report.cause, ShutdownCause::Signal("SIGHUP"));
    assert_eq!(report.result, ShutdownResult::Clean);
    for resource in &resources {
        assert_eq!(resource.release_count(), 1);
    }
}
