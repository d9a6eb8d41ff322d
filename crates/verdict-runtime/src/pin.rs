//! Observation pinning.
//!
//! A record under judgment is pinned for the duration of that single
//! invocation: two concurrent classifications of the same record id
//! serialize, so neither observes the other mid-flight. The pin protects
//! state integrity, not throughput - distinct records never contend.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;

/// Registry of per-record-id pins.
#[derive(Default)]
pub struct RecordPins {
    pins: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl RecordPins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the pin for a record id, creating it on first use. The
    /// returned guard releases the pin when dropped.
    pub async fn pin(&self, record_id: &str) -> OwnedMutexGuard<()> {
        let pin = {
            let mut pins = self.pins.lock();
            Arc::clone(
                pins.entry(record_id.to_string())
                    .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
            )
        };
        pin.lock_owned().await
    }

    /// Number of record ids seen so far.
    pub fn tracked(&self) -> usize {
        self.pins.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_id_serializes() {
        let pins = Arc::new(RecordPins::new());
        let in_flight = Arc::new(AtomicU32::new(0));
        let max_in_flight = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let pins = Arc::clone(&pins);
            let in_flight = Arc::clone(&in_flight);
            let max_in_flight = Arc::clone(&max_in_flight);
            handles.push(tokio::spawn(async move {
                let _guard = pins.pin("OBS_SAME").await;
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_in_flight.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_ids_do_not_contend() {
        let pins = RecordPins::new();
        let _a = pins.pin("OBS_A").await;

        // A second record acquires immediately even while the first pin
        // is held.
        let _b = pins.pin("OBS_B").await;
        assert_eq!(pins.tracked(), 2);
    }

    #[tokio::test]
    async fn test_pin_released_on_drop() {
        let pins = RecordPins::new();
        {
            let _guard = pins.pin("OBS_X").await;
        }
        // Reacquiring after drop must not deadlock.
        let _again = pins.pin("OBS_X").await;
    }
}
