mod common;
use crate::common::init_tracing;

use std::fs;
use std::time::Duration;

use filepulse::registry::WatchEntry;
use filepulse::watch::{ChangeCallback, WatcherEngine, WatcherId};
use filepulse_test_utils::with_timeout;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

type TestResult = Result<(), Box<dyn std::error::Error>>;

const FAST_POLL_MS: u64 = 25;

/// Give the poller time to record its baseline scan before the test mutates
/// the file.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(75)).await;
}

fn channel_callback() -> (ChangeCallback, UnboundedReceiver<WatcherId>) {
    let (tx, rx) = unbounded_channel();
    let callback: ChangeCallback = Box::new(move |id| {
        let _ = tx.send(id);
    });
    (callback, rx)
}

#[tokio::test]
async fn modify_triggers_change_event() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("a.css");
    fs::write(&file, "body {}")?;

    let mut engine = WatcherEngine::new(dir.path());
    let (callback, mut rx) = channel_callback();
    let id = engine.start(&WatchEntry::new("a.css"), FAST_POLL_MS, callback)?;

    settle().await;
    fs::write(&file, "body { color: red }")?;

    let got = with_timeout(rx.recv()).await;
    assert_eq!(got, Some(id));
    Ok(())
}

#[tokio::test]
async fn rewrites_within_the_same_second_are_changes() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("a.css");
    fs::write(&file, "body {}")?;

    let mut engine = WatcherEngine::new(dir.path());
    let (callback, mut rx) = channel_callback();
    let id = engine.start(&WatchEntry::new("a.css"), FAST_POLL_MS, callback)?;
    settle().await;

    // These writes land well under a second apart, so only their contents
    // distinguish them from the previous scan.
    for body in ["body { color: red }", "body { color: green }", "body { color: blue }"] {
        fs::write(&file, body)?;
        let got = with_timeout(rx.recv()).await;
        assert_eq!(got, Some(id), "missed rewrite to {body}");
    }
    Ok(())
}

#[tokio::test]
async fn delete_alone_is_not_a_change() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("a.css");
    fs::write(&file, "body {}")?;

    let mut engine = WatcherEngine::new(dir.path());
    let (callback, mut rx) = channel_callback();
    engine.start(&WatchEntry::new("a.css"), FAST_POLL_MS, callback)?;

    settle().await;
    fs::remove_file(&file)?;

    let got = tokio::time::timeout(Duration::from_millis(300), rx.recv()).await;
    assert!(got.is_err(), "delete alone must not report a change");
    Ok(())
}

#[tokio::test]
async fn delete_then_recreate_is_a_change() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("a.css");
    fs::write(&file, "body {}")?;

    let mut engine = WatcherEngine::new(dir.path());
    let (callback, mut rx) = channel_callback();
    let id = engine.start(&WatchEntry::new("a.css"), FAST_POLL_MS, callback)?;

    settle().await;
    fs::remove_file(&file)?;
    settle().await;
    fs::write(&file, "body { margin: 0 }")?;

    let got = with_timeout(rx.recv()).await;
    assert_eq!(got, Some(id));
    assert!(engine.is_live("a.css"), "watcher must survive the gap");
    Ok(())
}

#[tokio::test]
async fn stopped_watcher_reports_nothing() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("a.css");
    fs::write(&file, "body {}")?;

    let mut engine = WatcherEngine::new(dir.path());
    let (callback, mut rx) = channel_callback();
    engine.start(&WatchEntry::new("a.css"), FAST_POLL_MS, callback)?;

    settle().await;
    assert!(engine.stop("a.css"));
    fs::write(&file, "body { color: blue }")?;

    // Stop drops the poller and with it the callback holding our sender, so
    // the recv may end early with `None`. Only a delivered event is a failure.
    let got = tokio::time::timeout(Duration::from_millis(300), rx.recv()).await;
    assert!(!matches!(got, Ok(Some(_))), "stopped watcher must not poll");
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn symlinked_entry_tracks_the_link_target() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let target = dir.path().join("real.css");
    fs::write(&target, "body {}")?;
    std::os::unix::fs::symlink(&target, dir.path().join("link.css"))?;

    let mut engine = WatcherEngine::new(dir.path());
    let (callback, mut rx) = channel_callback();
    let id = engine.start(&WatchEntry::new("link.css"), FAST_POLL_MS, callback)?;
    assert_eq!(
        engine.watcher("link.css").unwrap().resolved_path(),
        target.as_path()
    );

    settle().await;
    fs::write(&target, "body { padding: 0 }")?;

    let got = with_timeout(rx.recv()).await;
    assert_eq!(got, Some(id));
    Ok(())
}
