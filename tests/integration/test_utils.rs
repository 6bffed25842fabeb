//! Shared builders for integration tests

use pushwise::resource::{PushGroup, Resource};
use pushwise::stable_set::{Capture, CaptureTiming, ResourceTiming};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Serializes tests that read or write `PUSHWISE_*` environment variables.
pub static ENV_MUTEX: Mutex<()> = Mutex::new(());

pub fn resource(url: &str, order: i64) -> Resource {
    Resource::new(url, order).unwrap()
}

/// A capture listing `urls` in discovery order.
pub fn capture(urls: &[&str]) -> Capture {
    Capture::new(
        urls.iter()
            .enumerate()
            .map(|(i, url)| resource(url, i as i64))
            .collect(),
    )
}

/// A capture whose timing data records `initiator` for each `(url, initiator)`.
pub fn capture_with_initiators(urls: &[&str], initiators: &[(&str, &str)]) -> Capture {
    let mut timings = CaptureTiming::new();
    for (url, initiator) in initiators {
        timings.insert(
            *url,
            ResourceTiming {
                initiator: Some(initiator.to_string()),
                ..ResourceTiming::default()
            },
        );
    }
    capture(urls).with_timings(timings)
}

/// Two hosts: a.com (anchor + 2 pushes) and cdn.net (anchor + 1 push).
pub fn sample_groups() -> Vec<PushGroup> {
    vec![
        PushGroup::new(
            0,
            "a.com",
            vec![
                resource("http://a.com/", 0),
                resource("http://a.com/app.js", 2),
                resource("http://a.com/app.css", 3),
            ],
        )
        .unwrap(),
        PushGroup::new(
            1,
            "cdn.net",
            vec![
                resource("http://cdn.net/lib.js", 1),
                resource("http://cdn.net/font.woff", 4),
            ],
        )
        .unwrap(),
    ]
}

pub fn write_json<T: Serialize + ?Sized>(dir: &Path, name: &str, value: &T) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}
