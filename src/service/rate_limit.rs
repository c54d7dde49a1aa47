use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Per-user cooldown between requests
#[derive(Debug)]
pub struct RateLimiter {
    cooldown: Duration,
    last_seen: HashMap<i64, Instant>,
}

impl RateLimiter {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_seen: HashMap::new(),
        }
    }

    /// Admit the request, or return how long the user still has to wait.
    ///
    /// Rejected requests do not restart the cooldown.
    pub fn check(&mut self, user_id: i64, now: Instant) -> Result<(), Duration> {
        if let Some(last) = self.last_seen.get(&user_id) {
            let elapsed = now.saturating_duration_since(*last);
            if elapsed < self.cooldown {
                return Err(self.cooldown - elapsed);
            }
        }

        self.last_seen.insert(user_id, now);
        Ok(())
    }

    /// Forget users whose cooldown has run out
    pub fn purge(&mut self, now: Instant) {
        let cooldown = self.cooldown;
        self.last_seen
            .retain(|_, last| now.saturating_duration_since(*last) < cooldown);
    }

    pub fn tracked_users(&self) -> usize {
        self.last_seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown() {
        let start = Instant::now();
        let mut limiter = RateLimiter::new(Duration::from_secs(30));

        assert!(limiter.check(1, start).is_ok());
        assert_eq!(
            limiter.check(1, start + Duration::from_secs(10)),
            Err(Duration::from_secs(20))
        );
        // Other users are independent
        assert!(limiter.check(2, start + Duration::from_secs(10)).is_ok());
        // Rejection did not restart the window
        assert!(limiter.check(1, start + Duration::from_secs(30)).is_ok());
    }

    #[test]
    fn test_zero_cooldown_always_admits() {
        let now = Instant::now();
        let mut limiter = RateLimiter::new(Duration::ZERO);
        assert!(limiter.check(1, now).is_ok());
        assert!(limiter.check(1, now).is_ok());
    }

    #[test]
    fn test_purge() {
        let start = Instant::now();
        let mut limiter = RateLimiter::new(Duration::from_secs(30));
        limiter.check(1, start).unwrap();
        limiter.check(2, start + Duration::from_secs(20)).unwrap();

        limiter.purge(start + Duration::from_secs(35));
        assert_eq!(limiter.tracked_users(), 1);
    }
}
