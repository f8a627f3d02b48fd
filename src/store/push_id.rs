//! Time-ordered unique keys for new documents.
//!
//! Same layout as realtime-database push ids: 8 characters of millisecond
//! timestamp followed by 12 random characters, all drawn from a 64-symbol
//! alphabet in ASCII order. Keys generated later sort later. Within one
//! millisecond the random tail is incremented instead of re-rolled, so
//! ordering holds even for bursts.

use rand::Rng;

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

/// Length of a generated key.
pub const PUSH_ID_LEN: usize = 20;

#[derive(Debug, Default)]
pub struct PushIdGenerator {
    last_time: i64,
    last_random: [u8; 12],
}

impl PushIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a key for `now_millis`.
    ///
    /// A clock that steps backwards is treated as still sitting at the last
    /// timestamp, so keys never go out of order.
    pub fn generate(&mut self, now_millis: i64) -> String {
        let now = now_millis.max(self.last_time);
        if now == self.last_time && self.last_time != 0 {
            self.increment();
        } else {
            let mut rng = rand::rng();
            for slot in self.last_random.iter_mut() {
                *slot = rng.random_range(0..64);
            }
        }
        self.last_time = now;

        let mut id = Vec::with_capacity(PUSH_ID_LEN);
        let mut t = now.max(0) as u64;
        let mut time_chars = [0u8; 8];
        for slot in time_chars.iter_mut().rev() {
            *slot = PUSH_CHARS[(t % 64) as usize];
            t /= 64;
        }
        id.extend_from_slice(&time_chars);
        id.extend(self.last_random.iter().map(|&i| PUSH_CHARS[i as usize]));
        String::from_utf8_lossy(&id).into_owned()
    }

    fn increment(&mut self) {
        for slot in self.last_random.iter_mut().rev() {
            if *slot == 63 {
                *slot = 0;
            } else {
                *slot += 1;
                return;
            }
        }
    }
}
