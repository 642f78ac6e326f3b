#![allow(dead_code)]
//! Shared setup for integration tests.

use chrono::{NaiveDate, NaiveDateTime};
use std::path::Path;
use taskbell::config::Config;
use taskbell::core::Subscription;
use taskbell::notification::SubscriberRegistry;
use std::sync::Arc;

/// A configuration rooted in `data_dir` with the scheduler and sync off.
pub fn test_config(data_dir: &Path) -> Config {
    let mut config = Config::default();
    config.storage.data_dir = data_dir.to_path_buf();
    config.scheduler.enabled = false;
    config.sync.enabled = false;
    config
}

pub fn registry_with(endpoints: &[&str]) -> Arc<SubscriberRegistry> {
    let registry = Arc::new(SubscriberRegistry::new());
    for endpoint in endpoints {
        registry.add(Subscription::new(*endpoint));
    }
    registry
}

/// A fixed local time on 2026-10-18.
pub fn local_time(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 18)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}
