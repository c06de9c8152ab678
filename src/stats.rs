//! Concurrent request statistics.
//!
//! Counters are plain atomics updated from every request task. Ordering between
//! counters is kept with `SeqCst`: writers bump total, then bot, then targeted,
//! while [`Statistics::snapshot`] reads them in reverse. A snapshot therefore never
//! shows more targeted hits than bot hits, or more bot hits than requests.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Something worth counting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsEvent {
    /// Any request
    Request,
    /// A request classified as the given archetype
    BotHit(String),
    /// A bot hit on a targeted archetype
    TargetedHit,
    /// A synthetic artifact served to the given archetype
    Download(String),
}

/// In-memory counters shared by all request tasks.
#[derive(Debug)]
pub struct Statistics {
    total_requests: AtomicU64,
    bot_requests: AtomicU64,
    targeted_bot_requests: AtomicU64,
    downloads_served: AtomicU64,
    archetype_hits: DashMap<String, AtomicU64>,
    archetype_downloads: DashMap<String, AtomicU64>,
    started_at: DateTime<Utc>,
}

/// Point-in-time copy of [`Statistics`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub total_requests: u64,
    pub bot_requests: u64,
    pub targeted_bot_requests: u64,
    pub downloads_served: u64,
    pub archetype_hits: BTreeMap<String, u64>,
    pub archetype_downloads: BTreeMap<String, u64>,
    pub started_at: DateTime<Utc>,
}

impl Statistics {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            bot_requests: AtomicU64::new(0),
            targeted_bot_requests: AtomicU64::new(0),
            downloads_served: AtomicU64::new(0),
            archetype_hits: DashMap::new(),
            archetype_downloads: DashMap::new(),
            started_at: Utc::now(),
        }
    }

    /// Record an event.
    pub fn record(&self, event: StatsEvent) {
        match event {
            StatsEvent::Request => {
                self.total_requests.fetch_add(1, Ordering::SeqCst);
            }
            StatsEvent::BotHit(archetype) => {
                self.bot_requests.fetch_add(1, Ordering::SeqCst);
                bump(&self.archetype_hits, archetype);
            }
            StatsEvent::TargetedHit => {
                self.targeted_bot_requests.fetch_add(1, Ordering::SeqCst);
            }
            StatsEvent::Download(archetype) => {
                self.downloads_served.fetch_add(1, Ordering::SeqCst);
                bump(&self.archetype_downloads, archetype);
            }
        }
    }

    /// Requests seen so far.
    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let targeted_bot_requests = self.targeted_bot_requests.load(Ordering::SeqCst);
        let bot_requests = self.bot_requests.load(Ordering::SeqCst);
        let total_requests = self.total_requests.load(Ordering::SeqCst);
        let downloads_served = self.downloads_served.load(Ordering::SeqCst);

        StatsSnapshot {
            total_requests,
            bot_requests,
            targeted_bot_requests,
            downloads_served,
            archetype_hits: collect(&self.archetype_hits),
            archetype_downloads: collect(&self.archetype_downloads),
            started_at: self.started_at,
        }
    }
}

impl Default for Statistics {
    fn default() -> Self {
        Self::new()
    }
}

fn bump(map: &DashMap<String, AtomicU64>, key: String) {
    map.entry(key)
        .or_insert_with(|| AtomicU64::new(0))
        .fetch_add(1, Ordering::SeqCst);
}

fn collect(map: &DashMap<String, AtomicU64>) -> BTreeMap<String, u64> {
    map.iter()
        .map(|entry| (entry.key().clone(), entry.value().load(Ordering::SeqCst)))
        .collect()
}
