use crate::core::{PlaybackResult, RoutePoint};
use crate::geo::{LonLat, Projection};
use crate::playback::clock::{duration_for, PlaybackClock, BASE_DURATION_MS};
use crate::playback::interpolate::position_at;
use crate::playback::path::{Curve, PathBuilder};
use crate::playback::{PlaybackEvent, PlaybackState, ProgressEvent};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, trace};

/// Permission to run one tick of a specific session
///
/// Handed out by `start` and by each tick that wants another. A token from a
/// superseded session is refused, so a tick queued before `stop` or a new
/// `start` can never produce events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickToken {
    generation: u64,
}

impl TickToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

struct Session {
    generation: u64,
    clock: PlaybackClock,
    curve: Curve,
    last_emitted: Option<f64>,
}

/// Owns the active session and fans its progress out to subscribers
///
/// The controller never schedules anything itself: the host calls `tick` once
/// per frame with the token returned by the previous call.
pub struct PlaybackController<P = LonLat> {
    builder: PathBuilder<P>,
    base_duration: Duration,
    generation: u64,
    session: Option<Session>,
    subscribers: Vec<mpsc::UnboundedSender<PlaybackEvent>>,
    last_progress: Option<ProgressEvent>,
}

impl Default for PlaybackController<LonLat> {
    fn default() -> Self {
        Self::new(LonLat, Duration::from_millis(BASE_DURATION_MS))
    }
}

impl<P: Projection> PlaybackController<P> {
    pub fn new(projection: P, base_duration: Duration) -> Self {
        Self {
            builder: PathBuilder::new(projection),
            base_duration,
            generation: 0,
            session: None,
            subscribers: Vec::new(),
            last_progress: None,
        }
    }

    /// Receive every progress and completion event from now on
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<PlaybackEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Replace any current session with a new one over `route`
    ///
    /// Speed and route are validated before anything changes, so on error the
    /// previous session (if any) keeps running untouched.
    pub fn start(&mut self, route: &[RoutePoint], speed: f64, now: Instant) -> PlaybackResult<TickToken> {
        duration_for(self.base_duration, speed)?;
        let curve = self.builder.build(route)?;

        self.stop();
        self.generation += 1;

        // Nothing to travel: finish on the first tick
        let base_duration = if curve.is_degenerate() {
            Duration::ZERO
        } else {
            self.base_duration
        };
        let mut clock = PlaybackClock::new(base_duration);
        clock.start(speed, now)?;

        info!(
            "Starting playback session {}: {} points, length {:.4}, speed {}x, duration {:?}",
            self.generation,
            curve.len(),
            curve.total_length(),
            speed,
            clock.duration()
        );

        self.session = Some(Session {
            generation: self.generation,
            clock,
            curve,
            last_emitted: None,
        });
        self.last_progress = None;

        Ok(TickToken {
            generation: self.generation,
        })
    }

    /// Advance the session `token` belongs to and emit its progress
    ///
    /// Returns the token for the next tick, or None once the session has
    /// completed or the token is stale.
    pub fn tick(&mut self, token: TickToken, now: Instant) -> Option<TickToken> {
        let session = match self.session.as_mut() {
            Some(s) if s.generation == token.generation && s.clock.state() == PlaybackState::Running => s,
            _ => {
                trace!("Dropping tick for stale session {}", token.generation);
                return None;
            }
        };

        let fraction = session.clock.tick(now);

        if session.last_emitted.map_or(true, |last| fraction > last) {
            let event = ProgressEvent {
                fraction,
                position: position_at(&session.curve, fraction),
            };
            session.last_emitted = Some(fraction);
            self.last_progress = Some(event);
            emit(&mut self.subscribers, PlaybackEvent::Progress(event));
        }

        if session.clock.is_complete() {
            info!("Playback session {} complete", session.generation);
            emit(&mut self.subscribers, PlaybackEvent::Complete);
            return None;
        }

        Some(token)
    }

    /// Cancel the running session without a completion event
    pub fn stop(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if session.clock.state() == PlaybackState::Running {
                debug!(
                    "Stopping playback session {} at {:.3}",
                    session.generation,
                    session.clock.fraction()
                );
            }
            session.clock.cancel();
        }
    }

    /// Stop and forget the session and its last progress
    pub fn reset(&mut self) {
        self.stop();
        self.session = None;
        self.last_progress = None;
    }

    pub fn state(&self) -> PlaybackState {
        self.session
            .as_ref()
            .map(|s| s.clock.state())
            .unwrap_or(PlaybackState::Idle)
    }

    pub fn is_running(&self) -> bool {
        self.state() == PlaybackState::Running
    }

    /// Most recent progress of the current session
    pub fn last_progress(&self) -> Option<ProgressEvent> {
        self.last_progress
    }

    /// Curve of the current session, for drawing the route line
    pub fn curve(&self) -> Option<&Curve> {
        self.session.as_ref().map(|s| &s.curve)
    }

    /// Speed of the current session
    pub fn speed(&self) -> Option<f64> {
        self.session.as_ref().map(|s| s.clock.speed())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Send to every live subscriber, dropping the ones that hung up
fn emit(subscribers: &mut Vec<mpsc::UnboundedSender<PlaybackEvent>>, event: PlaybackEvent) {
    subscribers.retain(|tx| tx.send(event).is_ok());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Coordinate, PlaybackError};

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn mumbai_route() -> Vec<RoutePoint> {
        vec![
            RoutePoint::new(19.0760, 72.8777),
            RoutePoint::new(18.5204, 73.8567),
            RoutePoint::new(17.3850, 78.4867),
        ]
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<PlaybackEvent>) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Tick every `frame` until the controller stops handing out tokens
    fn run_to_end(
        controller: &mut PlaybackController,
        mut token: TickToken,
        t0: Instant,
        frame: Duration,
    ) -> Duration {
        let mut elapsed = Duration::ZERO;
        loop {
            match controller.tick(token, t0 + elapsed) {
                Some(next) => token = next,
                None => return elapsed,
            }
            elapsed += frame;
        }
    }

    #[test]
    fn test_mumbai_to_hyderabad_at_5x() {
        let route = mumbai_route();
        let mut controller: PlaybackController = PlaybackController::default();
        let mut rx = controller.subscribe();
        let t0 = Instant::now();

        let token = controller.start(&route, 5.0, t0).unwrap();
        let token = controller.tick(token, t0).unwrap();
        let token = controller.tick(token, t0 + ms(1500)).unwrap();

        let half = controller.last_progress().unwrap();
        assert!((half.fraction - 0.5).abs() < 1e-9);
        assert!((half.percent() - 50.0).abs() < 1e-6);

        // Half the arc length falls on the second leg (the first is ~1.13 of ~5.9)
        let curve = controller.curve().unwrap();
        let target = 0.5 * curve.total_length();
        let leg1 = curve.cumulative_lengths()[1];
        assert!(target > leg1);
        let expected = Coordinate::new(73.8567, 18.5204)
            .lerp(Coordinate::new(78.4867, 17.3850), (target - leg1) / (curve.total_length() - leg1));
        assert!(half.position.dist_to(expected) < 1e-9);

        assert!(controller.tick(token, t0 + ms(2999)).is_some());
        assert!(controller.tick(token, t0 + ms(3000)).is_none());
        assert_eq!(controller.state(), PlaybackState::Completed);

        let events = drain(&mut rx);
        assert_eq!(events.last(), Some(&PlaybackEvent::Complete));
        match events[events.len() - 2] {
            PlaybackEvent::Progress(p) => {
                assert_eq!(p.fraction, 1.0);
                assert_eq!(p.position, Coordinate::new(78.4867, 17.3850));
            }
            other => panic!("expected final progress, got {:?}", other),
        }
    }

    #[test]
    fn test_fractions_strictly_increase() {
        let mut controller: PlaybackController = PlaybackController::default();
        let mut rx = controller.subscribe();
        let t0 = Instant::now();

        let mut token = controller.start(&mumbai_route(), 10.0, t0).unwrap();
        // Repeated timestamps produce no duplicate events
        for offset in [0, 0, 100, 100, 250, 1000, 1499, 1500, 1600] {
            match controller.tick(token, t0 + ms(offset)) {
                Some(next) => token = next,
                None => break,
            }
        }

        let events = drain(&mut rx);
        let fractions: Vec<f64> = events
            .iter()
            .filter_map(|e| match e {
                PlaybackEvent::Progress(p) => Some(p.fraction),
                PlaybackEvent::Complete => None,
            })
            .collect();
        assert!(fractions.windows(2).all(|w| w[0] < w[1]), "{:?}", fractions);
        assert_eq!(fractions.first(), Some(&0.0));
        assert_eq!(fractions.last(), Some(&1.0));
        assert_eq!(events.last(), Some(&PlaybackEvent::Complete));
        assert_eq!(
            events.iter().filter(|e| **e == PlaybackEvent::Complete).count(),
            1
        );
    }

    #[test]
    fn test_single_point_completes_on_first_tick() {
        let mut controller: PlaybackController = PlaybackController::default();
        let mut rx = controller.subscribe();
        let t0 = Instant::now();

        let token = controller
            .start(&[RoutePoint::new(23.0225, 72.5714)], 5.0, t0)
            .unwrap();
        assert!(controller.tick(token, t0).is_none());

        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![
                PlaybackEvent::Progress(ProgressEvent {
                    fraction: 1.0,
                    position: Coordinate::new(72.5714, 23.0225),
                }),
                PlaybackEvent::Complete,
            ]
        );
    }

    #[test]
    fn test_empty_route_leaves_running_session_alone() {
        let mut controller: PlaybackController = PlaybackController::default();
        let t0 = Instant::now();
        let token = controller.start(&mumbai_route(), 5.0, t0).unwrap();
        let token = controller.tick(token, t0 + ms(100)).unwrap();
        let generation = controller.generation();

        assert!(matches!(
            controller.start(&[], 5.0, t0 + ms(200)),
            Err(PlaybackError::EmptyRoute)
        ));
        assert_eq!(controller.generation(), generation);
        assert!(controller.is_running());
        // The old token still drives the old session
        assert!(controller.tick(token, t0 + ms(300)).is_some());
    }

    #[test]
    fn test_unprojectable_route_leaves_running_session_alone() {
        let mut controller: PlaybackController = PlaybackController::default();
        let mut rx = controller.subscribe();
        let t0 = Instant::now();
        let token = controller.start(&mumbai_route(), 5.0, t0).unwrap();
        let token = controller.tick(token, t0 + ms(100)).unwrap();
        let generation = controller.generation();
        let curve = controller.curve().cloned();
        drain(&mut rx);

        let bad_route = vec![RoutePoint::new(19.0760, 72.8777), RoutePoint::new(18.5204, 500.0)];
        assert!(matches!(
            controller.start(&bad_route, 5.0, t0 + ms(200)),
            Err(PlaybackError::Projection(_))
        ));
        assert_eq!(controller.generation(), generation);
        assert!(controller.is_running());
        assert_eq!(controller.curve().cloned(), curve);
        assert!(drain(&mut rx).is_empty());

        assert!(controller.tick(token, t0 + ms(300)).is_some());
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[test]
    fn test_invalid_speed_does_not_mutate() {
        let mut controller: PlaybackController = PlaybackController::default();
        let t0 = Instant::now();
        assert!(matches!(
            controller.start(&mumbai_route(), 0.0, t0),
            Err(PlaybackError::InvalidSpeed(_))
        ));
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert!(controller.curve().is_none());

        let token = controller.start(&mumbai_route(), 2.0, t0).unwrap();
        assert!(matches!(
            controller.start(&mumbai_route(), -3.0, t0),
            Err(PlaybackError::InvalidSpeed(_))
        ));
        assert_eq!(controller.speed(), Some(2.0));
        assert!(controller.tick(token, t0).is_some());
    }

    #[test]
    fn test_restart_silences_previous_session() {
        let mut controller: PlaybackController = PlaybackController::default();
        let mut rx = controller.subscribe();
        let t0 = Instant::now();

        let first = controller.start(&mumbai_route(), 5.0, t0).unwrap();
        let pending = controller.tick(first, t0 + ms(16)).unwrap();
        drain(&mut rx);

        let other_route = vec![
            RoutePoint::new(23.0225, 72.5714),
            RoutePoint::new(22.3039, 70.8022),
        ];
        let second = controller.start(&other_route, 5.0, t0 + ms(20)).unwrap();
        assert_ne!(first, second);

        // The tick queued for the first session fires after the restart
        assert!(controller.tick(pending, t0 + ms(32)).is_none());
        assert!(drain(&mut rx).is_empty());

        controller.tick(second, t0 + ms(20)).unwrap();
        match drain(&mut rx).as_slice() {
            [PlaybackEvent::Progress(p)] => {
                assert_eq!(p.position, Coordinate::new(72.5714, 23.0225))
            }
            other => panic!("unexpected events {:?}", other),
        }
    }

    #[test]
    fn test_stop_reset_then_start_begins_at_zero() {
        let mut controller: PlaybackController = PlaybackController::default();
        let mut rx = controller.subscribe();
        let t0 = Instant::now();

        let token = controller.start(&mumbai_route(), 5.0, t0).unwrap();
        let pending = controller.tick(token, t0 + ms(1200)).unwrap();
        assert!((controller.last_progress().unwrap().fraction - 0.4).abs() < 1e-9);

        controller.stop();
        assert_eq!(controller.state(), PlaybackState::Cancelled);
        assert!(controller.tick(pending, t0 + ms(1300)).is_none());
        assert!(controller.last_progress().is_some());

        controller.reset();
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert!(controller.last_progress().is_none());

        let events = drain(&mut rx);
        assert!(!events.contains(&PlaybackEvent::Complete));

        let t1 = t0 + ms(5000);
        let token = controller.start(&mumbai_route(), 5.0, t1).unwrap();
        controller.tick(token, t1).unwrap();
        assert_eq!(controller.last_progress().unwrap().fraction, 0.0);
    }

    #[test]
    fn test_doubling_speed_halves_completion_time() {
        let t0 = Instant::now();
        let frame = ms(16);

        let mut slow: PlaybackController = PlaybackController::default();
        let token = slow.start(&mumbai_route(), 2.0, t0).unwrap();
        let slow_elapsed = run_to_end(&mut slow, token, t0, frame);

        let mut fast: PlaybackController = PlaybackController::default();
        let token = fast.start(&mumbai_route(), 4.0, t0).unwrap();
        let fast_elapsed = run_to_end(&mut fast, token, t0, frame);

        let expected = slow_elapsed.as_secs_f64() / 2.0;
        assert!((fast_elapsed.as_secs_f64() - expected).abs() <= frame.as_secs_f64());
        assert!((slow_elapsed.as_secs_f64() - 7.5).abs() <= frame.as_secs_f64());
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let mut controller: PlaybackController = PlaybackController::default();
        let rx = controller.subscribe();
        let mut kept = controller.subscribe();
        drop(rx);
        assert_eq!(controller.subscriber_count(), 2);

        let t0 = Instant::now();
        let token = controller.start(&mumbai_route(), 5.0, t0).unwrap();
        controller.tick(token, t0);
        assert_eq!(controller.subscriber_count(), 1);
        assert_eq!(drain(&mut kept).len(), 1);
    }
}
