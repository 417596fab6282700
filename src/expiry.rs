//! Time-ordered expiry queue with a background sweeper.
//!
//! Keys are scheduled against an absolute wall-clock second. A sweeper task
//! wakes about once per second and emits every due key on a bounded channel;
//! the store attaches a consumer that deletes the emitted keys. Superseded
//! deadlines stay behind in the heap as tombstones and are skipped when they
//! surface.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tracing::debug;

/// How often the sweeper wakes up to evict due keys.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Buffered capacity of the eviction channel. The sweeper never blocks on
/// it; a full buffer defers eviction to the next sweep.
const EVICTION_BUFFER: usize = 64;

/// Seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

#[derive(Default)]
struct State {
    /// Authoritative key-to-deadline mapping. A heap entry whose second
    /// disagrees with this map is a superseded tombstone.
    deadlines: HashMap<String, u64>,
    /// Min-heap ordered by (deadline, key).
    queue: BinaryHeap<Reverse<(u64, String)>>,
}

/// Schedules keys for eviction at an absolute expiry second.
#[derive(Clone)]
pub struct ExpiryQueue {
    state: Arc<Mutex<State>>,
}

impl ExpiryQueue {
    /// Creates the queue and spawns its sweeper. Evicted keys arrive on the
    /// returned channel; dropping the receiver terminates the sweeper on its
    /// next eviction attempt.
    pub fn new() -> (ExpiryQueue, Receiver<String>) {
        let (evictions, receiver) = mpsc::channel(EVICTION_BUFFER);
        let state = Arc::new(Mutex::new(State::default()));
        tokio::spawn(sweep(Arc::clone(&state), evictions));
        (ExpiryQueue { state }, receiver)
    }

    /// Schedules `key` to be evicted once the wall clock reaches
    /// `expires_at` (Unix seconds). Re-scheduling supersedes any earlier
    /// deadline for the key.
    pub fn schedule(&self, key: &str, expires_at: u64) {
        let mut state = self.state.lock().unwrap();
        state.deadlines.insert(key.to_string(), expires_at);
        state.queue.push(Reverse((expires_at, key.to_string())));
    }

    /// Drops any pending deadline for `key`. The stale heap entry stays
    /// behind as a tombstone and is skipped by the sweeper.
    pub fn cancel(&self, key: &str) {
        self.state.lock().unwrap().deadlines.remove(key);
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        self.state.lock().unwrap().deadlines.len()
    }
}

async fn sweep(state: Arc<Mutex<State>>, evictions: Sender<String>) {
    let mut curr_sec = unix_now();
    loop {
        let sweep_start = unix_now();
        if drain_due(&state, &evictions, curr_sec).is_err() {
            debug!("eviction channel closed, stopping sweeper");
            return;
        }
        tokio::time::sleep(SWEEP_INTERVAL).await;
        // Advance by real elapsed time so a slow sweep catches up instead of
        // drifting behind the wall clock.
        curr_sec += unix_now().saturating_sub(sweep_start);
    }
}

/// Emits every key due at `curr_sec`, oldest deadline first. `Err` means the
/// receiving end is gone.
fn drain_due(
    state: &Mutex<State>,
    evictions: &Sender<String>,
    curr_sec: u64,
) -> Result<(), TrySendError<String>> {
    let mut state = state.lock().unwrap();
    loop {
        match state.queue.peek() {
            Some(Reverse((due, _))) if *due <= curr_sec => {}
            _ => return Ok(()),
        }
        let Some(Reverse((due, key))) = state.queue.pop() else {
            return Ok(());
        };
        match state.deadlines.get(&key) {
            Some(&current) if current == due => {}
            // Superseded or cancelled tombstone.
            _ => continue,
        }
        match evictions.try_send(key.clone()) {
            Ok(()) => {
                state.deadlines.remove(&key);
            }
            Err(err @ TrySendError::Closed(_)) => return Err(err),
            Err(TrySendError::Full(_)) => {
                // The consumer is backed up. Put the key back and retry on
                // the next sweep rather than blocking here.
                state.queue.push(Reverse((due, key)));
                return Ok(());
            }
        }
    }
}
