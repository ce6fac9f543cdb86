use std::time::{Duration, Instant};

/// Why a power switch has to wait, with the seconds left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    Starting(u64),
    ShuttingDown(u64),
}

impl Wait {
    pub fn message(&self) -> String {
        match self {
            Wait::Starting(secs) => format!("AC is starting, please wait {}s", secs),
            Wait::ShuttingDown(secs) => format!("AC is shutting down, please wait {}s", secs),
        }
    }
}

/// Keeps the compressor from being switched again right after it started
/// or stopped. A stop blocks three times as long as a start.
#[derive(Debug, Clone)]
pub struct PowerCooldown {
    cooldown: Duration,
    last_start: Option<Instant>,
    last_stop: Option<Instant>,
}

fn remaining_secs(window: Duration, since: Option<Instant>, now: Instant) -> Option<u64> {
    let elapsed = now.saturating_duration_since(since?);
    (elapsed < window).then(|| {
        let left = window - elapsed;
        left.as_secs() + u64::from(left.subsec_nanos() > 0)
    })
}

impl PowerCooldown {
    pub fn new(cooldown: Duration) -> PowerCooldown {
        PowerCooldown {
            cooldown,
            last_start: None,
            last_stop: None,
        }
    }

    pub fn check(&self, now: Instant) -> Result<(), Wait> {
        if let Some(secs) = remaining_secs(self.cooldown * 3, self.last_stop, now) {
            return Err(Wait::ShuttingDown(secs));
        }
        if let Some(secs) = remaining_secs(self.cooldown, self.last_start, now) {
            return Err(Wait::Starting(secs));
        }
        Ok(())
    }

    pub fn record_start(&mut self, now: Instant) {
        self.last_start = Some(now);
    }

    pub fn record_stop(&mut self, now: Instant) {
        self.last_stop = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_until_first_switch() {
        let cooldown = PowerCooldown::new(Duration::from_secs(20));
        assert_eq!(cooldown.check(Instant::now()), Ok(()));
    }

    #[test]
    fn start_blocks_for_one_cooldown() {
        let t0 = Instant::now();
        let mut cooldown = PowerCooldown::new(Duration::from_secs(20));
        cooldown.record_start(t0);
        assert_eq!(cooldown.check(t0), Err(Wait::Starting(20)));
        assert_eq!(
            cooldown.check(t0 + Duration::from_millis(5500)),
            Err(Wait::Starting(15))
        );
        assert_eq!(cooldown.check(t0 + Duration::from_secs(20)), Ok(()));
    }

    #[test]
    fn stop_blocks_for_three_cooldowns() {
        let t0 = Instant::now();
        let mut cooldown = PowerCooldown::new(Duration::from_secs(20));
        cooldown.record_start(t0);
        cooldown.record_stop(t0 + Duration::from_secs(1));
        assert_eq!(
            cooldown.check(t0 + Duration::from_secs(11)),
            Err(Wait::ShuttingDown(50))
        );
        assert_eq!(
            cooldown.check(t0 + Duration::from_secs(59)),
            Err(Wait::ShuttingDown(2))
        );
        assert_eq!(cooldown.check(t0 + Duration::from_secs(61)), Ok(()));
    }

    #[test]
    fn messages() {
        assert_eq!(Wait::Starting(3).message(), "AC is starting, please wait 3s");
        assert_eq!(
            Wait::ShuttingDown(40).message(),
            "AC is shutting down, please wait 40s"
        );
    }
}
