use std::time;

/// Time in seconds.
pub type TimerDuration = f32;

/// Timer can be used to find the time difference between the moment of timer creation and the
/// moment of calling [`elapsed`](struct.Timer.html#method.elapsed).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timer {
    pub(crate) start: time::Instant,
}

impl Default for Timer {
    fn default() -> Self {
        Timer::new()
    }
}

impl Timer {
    /// Create new timer based on current system time.
    pub fn new() -> Self {
        Self { start: time::Instant::now() }
    }

    /// Reset time of creation to current time.
    pub fn reset(&mut self) {
        self.start = time::Instant::now();
    }

    /// Get period of time since timer creation in seconds.
    pub fn elapsed(&self) -> TimerDuration {
        let dt = self.start.elapsed();
        dt.as_secs() as f32 + 1e-9 * dt.subsec_nanos() as f32
    }

    /// Get period of time since the last lap (or creation) and start a new one.
    pub fn lap(&mut self) -> TimerDuration {
        let now = time::Instant::now();
        let dt = now.duration_since(self.start);
        self.start = now;
        dt.as_secs() as f32 + 1e-9 * dt.subsec_nanos() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn lap_restarts_the_timer() {
        let mut timer = Timer::new();
        thread::sleep(Duration::from_millis(20));
        let first = timer.lap();
        assert!(first >= 0.019);
        assert!(timer.elapsed() < first);
    }
}
