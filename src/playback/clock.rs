use crate::core::{PlaybackError, PlaybackResult};
use crate::playback::PlaybackState;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Nominal time for a full traversal at 1x speed
pub const BASE_DURATION_MS: u64 = 15_000;

/// Maps wall-clock time to a playback fraction
///
/// `fraction = min(1, elapsed / (base_duration / speed))`. The speed is fixed
/// for the lifetime of a run; changing it means starting again.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    state: PlaybackState,
    base_duration: Duration,
    speed: f64,
    duration: Duration,
    start_instant: Option<Instant>,
    fraction: f64,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new(Duration::from_millis(BASE_DURATION_MS))
    }
}

impl PlaybackClock {
    pub fn new(base_duration: Duration) -> Self {
        Self {
            state: PlaybackState::Idle,
            base_duration,
            speed: 1.0,
            duration: base_duration,
            start_instant: None,
            fraction: 0.0,
        }
    }

    /// Begin a run at `speed`, measured from `now`
    ///
    /// Only an idle clock starts. Rejects non-positive or non-finite speeds
    /// without touching the clock.
    pub fn start(&mut self, speed: f64, now: Instant) -> PlaybackResult<()> {
        if self.state != PlaybackState::Idle {
            if self.state.is_terminal() {
                debug!("Refusing to start a {:?} clock before reset", self.state);
            }
            return Err(PlaybackError::NotIdle(self.state));
        }
        let duration = duration_for(self.base_duration, speed)?;

        self.speed = speed;
        self.duration = duration;
        self.start_instant = Some(now);
        self.fraction = 0.0;
        self.state = PlaybackState::Running;
        Ok(())
    }

    /// Advance to `now` and return the current fraction
    ///
    /// Only a running clock moves. The fraction never decreases, even if `now`
    /// is earlier than a previous tick.
    pub fn tick(&mut self, now: Instant) -> f64 {
        if self.state != PlaybackState::Running {
            return self.fraction;
        }
        let Some(start) = self.start_instant else {
            return self.fraction;
        };

        let fraction = if self.duration.is_zero() {
            1.0
        } else {
            let elapsed = now.saturating_duration_since(start);
            (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
        };
        self.fraction = self.fraction.max(fraction);

        if self.fraction >= 1.0 {
            self.fraction = 1.0;
            self.state = PlaybackState::Completed;
        }
        self.fraction
    }

    /// Stop a running clock. Terminal until `reset`.
    pub fn cancel(&mut self) {
        if self.state == PlaybackState::Running {
            self.state = PlaybackState::Cancelled;
        }
    }

    pub fn reset(&mut self) {
        self.state = PlaybackState::Idle;
        self.start_instant = None;
        self.fraction = 0.0;
    }

    pub fn is_complete(&self) -> bool {
        self.state == PlaybackState::Completed
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Wall-clock length of a full run at the current speed
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn base_duration(&self) -> Duration {
        self.base_duration
    }
}

/// `base / speed`, refusing speeds that would stall, reverse or overflow
pub fn duration_for(base: Duration, speed: f64) -> PlaybackResult<Duration> {
    if !speed.is_finite() || speed <= 0.0 {
        return Err(PlaybackError::InvalidSpeed(speed));
    }
    Duration::try_from_secs_f64(base.as_secs_f64() / speed)
        .map_err(|_| PlaybackError::InvalidSpeed(speed))
}
