use rand::Rng;
use std::sync::{Mutex, PoisonError};

use chrono::Utc;

/// Alphabet in ASCII order so generated keys sort like their timestamps
const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Default)]
struct State {
    last_time: i64,
    last_rand: [usize; 12],
}

/// Generates 20-character keys that sort chronologically.
///
/// The first 8 characters encode the millisecond timestamp, the remaining 12
/// are random. Keys generated within the same millisecond reuse the random
/// part incremented by one, so ordering holds within a process.
#[derive(Debug, Default)]
pub struct PushIdGenerator {
    state: Mutex<State>,
}

impl PushIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> String {
        self.generate(Utc::now().timestamp_millis())
    }

    /// Key for `now_ms`; a clock that steps backwards is held at the last time
    pub fn generate(&self, now_ms: i64) -> String {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let now = now_ms.max(state.last_time);

        if now == state.last_time && state.last_time != 0 {
            for digit in state.last_rand.iter_mut().rev() {
                if *digit == 63 {
                    *digit = 0;
                } else {
                    *digit += 1;
                    break;
                }
            }
        } else {
            let mut rng = rand::thread_rng();
            for digit in state.last_rand.iter_mut() {
                *digit = rng.gen_range(0..64);
            }
        }
        state.last_time = now;

        let mut id = String::with_capacity(20);
        let mut time = now;
        let mut time_chars = [0u8; 8];
        for slot in time_chars.iter_mut().rev() {
            *slot = PUSH_CHARS[(time % 64) as usize];
            time /= 64;
        }
        id.extend(time_chars.iter().map(|&c| c as char));
        id.extend(state.last_rand.iter().map(|&digit| PUSH_CHARS[digit] as char));
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_twenty_characters() {
        let id = PushIdGenerator::new().next_id();
        assert_eq!(id.len(), 20);
        assert!(id.bytes().all(|c| PUSH_CHARS.contains(&c)));
    }

    #[test]
    fn same_millisecond_ids_increase() {
        let generator = PushIdGenerator::new();
        let first = generator.generate(1_700_000_000_000);
        let second = generator.generate(1_700_000_000_000);
        assert_ne!(first, second);
        assert!(first < second);
        assert_eq!(first[..8], second[..8]);
    }

    #[test]
    fn later_timestamps_sort_after() {
        let generator = PushIdGenerator::new();
        let earlier = generator.generate(1_700_000_000_000);
        let later = generator.generate(1_700_000_000_001);
        assert!(earlier < later);
    }

    #[test]
    fn clock_stepping_back_keeps_order() {
        let generator = PushIdGenerator::new();
        let first = generator.generate(1_700_000_000_500);
        let second = generator.generate(1_700_000_000_100);
        assert!(first < second);
    }
}
