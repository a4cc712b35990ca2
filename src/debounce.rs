use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Collapses bursts of input into one action after `delay` of quiet.
///
/// Each `schedule` call supersedes every earlier ticket; only the newest ticket
/// reports itself settled once the delay elapses.
#[derive(Clone, Debug)]
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

#[derive(Debug)]
pub struct DebounceTicket {
    delay: Duration,
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn schedule(&self) -> DebounceTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        DebounceTicket {
            delay: self.delay,
            generation,
            latest: Arc::clone(&self.generation),
        }
    }

    /// Invalidates every outstanding ticket.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

impl DebounceTicket {
    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.generation
    }

    /// Waits out the delay; `true` if no newer ticket was issued meanwhile.
    pub async fn settled(self) -> bool {
        tokio::time::sleep(self.delay).await;
        self.is_current()
    }
}

/// Monotonic request counter guarding against out-of-order responses.
#[derive(Clone, Debug, Default)]
pub struct RequestSequence {
    latest: Arc<AtomicU64>,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_latest(&self, seq: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == seq
    }
}
