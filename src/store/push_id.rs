use std::sync::Mutex;

use chrono::Utc;
use rand::Rng;

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

/// Generates 20-character keys that sort lexicographically by creation time.
///
/// The first 8 characters encode the millisecond timestamp, the remaining 12
/// are random. Keys generated within the same millisecond reuse the previous
/// random suffix incremented by one, so they stay unique and ordered.
#[derive(Debug, Default)]
pub struct PushIdGenerator {
    state: Mutex<PushState>,
}

#[derive(Debug, Default)]
struct PushState {
    last_millis: i64,
    last_random: [u8; 12],
}

impl PushIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> String {
        self.next_id_at(Utc::now().timestamp_millis())
    }

    pub(crate) fn next_id_at(&self, now_millis: i64) -> String {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        // Never go backwards, even if the wall clock does.
        let millis = now_millis.max(state.last_millis);
        if millis == state.last_millis && state.last_millis != 0 {
            increment(&mut state.last_random);
        } else {
            let mut rng = rand::thread_rng();
            for slot in state.last_random.iter_mut() {
                *slot = rng.gen_range(0..64);
            }
        }
        state.last_millis = millis;

        let mut id = String::with_capacity(20);
        let mut ts = millis;
        let mut ts_chars = [0u8; 8];
        for slot in ts_chars.iter_mut().rev() {
            *slot = PUSH_CHARS[(ts % 64) as usize];
            ts /= 64;
        }
        id.extend(ts_chars.iter().map(|&c| c as char));
        id.extend(
            state
                .last_random
                .iter()
                .map(|&idx| PUSH_CHARS[idx as usize] as char),
        );
        id
    }
}

fn increment(digits: &mut [u8; 12]) {
    for digit in digits.iter_mut().rev() {
        if *digit < 63 {
            *digit += 1;
            return;
        }
        *digit = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_twenty_chars_and_ordered_within_a_millisecond() {
        let generator = PushIdGenerator::new();
        let ids: Vec<String> = (0..500).map(|_| generator.next_id_at(1_700_000_000_000)).collect();

        assert!(ids.iter().all(|id| id.len() == 20));
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn later_timestamps_sort_after_earlier_ones() {
        let generator = PushIdGenerator::new();
        let early = generator.next_id_at(1_700_000_000_000);
        let late = generator.next_id_at(1_700_000_000_001);
        assert!(early < late);
    }

    #[test]
    fn clock_going_backwards_keeps_ordering() {
        let generator = PushIdGenerator::new();
        let first = generator.next_id_at(1_700_000_000_500);
        let second = generator.next_id_at(1_700_000_000_100);
        assert!(first < second);
    }
}
