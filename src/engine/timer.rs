/// Outcome of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    /// No countdown is running.
    Inactive,
    /// Seconds left after this tick.
    Running(u64),
    /// The countdown reached zero; playback should stop.
    Expired,
}

/// Whole-second playback countdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTimer {
    duration_secs: u64,
    remaining: Option<u64>,
}

impl SessionTimer {
    pub fn new(duration_secs: u64) -> Self {
        SessionTimer {
            duration_secs,
            remaining: None,
        }
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    /// Change the length used by the next `start`.
    pub fn set_duration(&mut self, secs: u64) {
        self.duration_secs = secs;
    }

    pub fn start(&mut self) {
        self.remaining = Some(self.duration_secs);
    }

    pub fn clear(&mut self) {
        self.remaining = None;
    }

    pub fn remaining(&self) -> Option<u64> {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.remaining.is_some()
    }

    /// Count one second down.
    pub fn tick(&mut self) -> TimerTick {
        match self.remaining {
            None => TimerTick::Inactive,
            Some(left) if left <= 1 => {
                self.remaining = None;
                TimerTick::Expired
            }
            Some(left) => {
                self.remaining = Some(left - 1);
                TimerTick::Running(left - 1)
            }
        }
    }
}

impl Default for SessionTimer {
    fn default() -> Self {
        SessionTimer::new(300)
    }
}
