use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0)
    }
}

/// Hand-driven clock; clones share the same instant.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Issues history item ids: the capture millisecond, with a `-<n>` suffix when several ids
/// fall in the same (or an earlier) millisecond. Ids already on disk are fed back through
/// [`IdMint::observe`] so they are never handed out twice.
#[derive(Debug, Default, Clone)]
pub struct IdMint {
    last: Option<(u64, u64)>,
}

impl IdMint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, id: &str) {
        let parsed: Option<(u64, u64)> = match id.split_once('-') {
            Some((ms, seq)) => ms.parse().ok().zip(seq.parse().ok()),
            None => id.parse().ok().map(|ms| (ms, 0)),
        };
        if let Some(seen) = parsed {
            if self.last.map_or(true, |last| seen > last) {
                self.last = Some(seen);
            }
        }
    }

    pub fn mint(&mut self, now_ms: u64) -> String {
        match self.last {
            Some((last_ms, seq)) if now_ms <= last_ms => {
                let seq = seq + 1;
                self.last = Some((last_ms, seq));
                format!("{last_ms}-{seq}")
            }
            _ => {
                self.last = Some((now_ms, 0));
                now_ms.to_string()
            }
        }
    }
}
