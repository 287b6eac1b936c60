use std::time::Instant;

use oscillator::{AnimationState, FadeConfig, Phase};

/// Abstraction over where frame timestamps originate from.
///
/// The render loop samples milliseconds since an arbitrary epoch, monotonic
/// for the session. Tests substitute a manual source to drive the state
/// machine deterministically.
pub trait TimeSource: Send {
    /// Resets the source to its initial state.
    fn reset(&mut self);
    /// Produces the timestamp for the next tick, in milliseconds.
    fn sample_ms(&mut self) -> f64;
}

/// Time source backed by the system monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn reset(&mut self) {
        self.origin = Instant::now();
    }

    fn sample_ms(&mut self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Convenient alias for owning time sources behind trait objects.
pub type BoxedTimeSource = Box<dyn TimeSource + Send>;

/// Bridges the per-frame redraw callback to the animation state machine.
///
/// One tick performs exactly one state-machine step; a long pause between
/// redraws shows up as a single large delta rather than catch-up stepping.
pub struct FrameDriver {
    state: AnimationState,
    time_source: BoxedTimeSource,
}

impl FrameDriver {
    pub fn new(time_source: BoxedTimeSource) -> Self {
        Self {
            state: AnimationState::new(),
            time_source,
        }
    }

    /// Advances the oscillation using the durations currently in the store
    /// and returns the progress to push into the scalar uniform.
    pub fn tick(&mut self, config: &FadeConfig) -> f64 {
        let now_ms = self.time_source.sample_ms();
        let progress = self.state.advance(now_ms, config.durations());
        tracing::trace!(now_ms, progress, phase = ?self.state.phase(), "frame tick");
        progress
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn progress(&self) -> f64 {
        self.state.progress()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oscillator::PhaseDurations;

    /// Replays a scripted list of timestamps.
    struct ManualTimeSource {
        samples: Vec<f64>,
        cursor: usize,
    }

    impl ManualTimeSource {
        fn new(samples: Vec<f64>) -> Self {
            Self { samples, cursor: 0 }
        }
    }

    impl TimeSource for ManualTimeSource {
        fn reset(&mut self) {
            self.cursor = 0;
        }

        fn sample_ms(&mut self) -> f64 {
            let sample = self.samples[self.cursor];
            self.cursor += 1;
            sample
        }
    }

    fn config() -> FadeConfig {
        FadeConfig::new(
            PhaseDurations {
                fade_in_ms: 3000.0,
                fade_out_ms: 5000.0,
            },
            [1.0; 3],
            [0.0; 3],
        )
    }

    #[test]
    fn first_tick_does_not_advance() {
        let source = ManualTimeSource::new(vec![100.0, 1600.0]);
        let mut driver = FrameDriver::new(Box::new(source));
        let config = config();

        assert_eq!(driver.tick(&config), 0.0);
        assert_eq!(driver.tick(&config), 0.5);
    }

    #[test]
    fn long_pause_produces_one_large_delta() {
        let source = ManualTimeSource::new(vec![0.0, 1000.0, 10_000.0]);
        let mut driver = FrameDriver::new(Box::new(source));
        let config = config();

        driver.tick(&config);
        driver.tick(&config);
        // 9s gap covered by a single step; one flip, overshoot uncorrected.
        assert_eq!(driver.tick(&config), 3.0 + 1.0 / 3.0);
        assert_eq!(driver.phase(), Phase::Out);
    }

    #[test]
    fn duration_changes_take_effect_next_tick() {
        let source = ManualTimeSource::new(vec![0.0, 1500.0, 3000.0]);
        let mut driver = FrameDriver::new(Box::new(source));
        let mut config = config();

        driver.tick(&config);
        assert_eq!(driver.tick(&config), 0.5);
        config.increment_duration(Phase::In);
        config.increment_duration(Phase::In);
        config.increment_duration(Phase::In);
        config.increment_duration(Phase::In);
        config.increment_duration(Phase::In);
        config.increment_duration(Phase::In);
        // Duration is now 6000ms, so the same 1500ms delta moves half as far.
        assert_eq!(driver.tick(&config), 0.75);
    }
}
