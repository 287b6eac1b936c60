//! Pure timing logic for the two-color fade oscillation.
//!
//! [`AnimationState`] converts wall-clock frame timestamps into a bounded
//! ping-pong progress value, switching between the fade-in and fade-out
//! durations held by [`FadeConfig`]. Nothing in this crate touches the GPU or
//! the windowing system, which keeps every rule unit-testable.

/// Step applied by the duration increment/decrement operations.
pub const DURATION_STEP_MS: f64 = 500.0;

/// Smallest duration the UI may decrement down to.
///
/// Enforced at the call boundary via [`FadeConfig::can_decrement`], not inside
/// the store itself; the state machine still freezes on non-positive durations
/// as a fallback.
pub const MIN_DURATION_MS: f64 = 500.0;

/// RGB color triple with components in `0..=1`.
pub type Rgb = [f32; 3];

/// The two phases of the oscillation, each with its own duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Progress rises towards `1` using the fade-in duration.
    In,
    /// Progress falls towards `-1` using the fade-out duration.
    Out,
}

impl Phase {
    fn direction(self) -> f64 {
        match self {
            Phase::In => 1.0,
            Phase::Out => -1.0,
        }
    }
}

/// The pair of phase durations read by the state machine each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseDurations {
    pub fade_in_ms: f64,
    pub fade_out_ms: f64,
}

impl PhaseDurations {
    pub fn for_phase(&self, phase: Phase) -> f64 {
        match phase {
            Phase::In => self.fade_in_ms,
            Phase::Out => self.fade_out_ms,
        }
    }
}

/// Oscillation progress driven by per-frame timestamps.
///
/// Progress stays within `[-1, 1]` at tick boundaries but may overshoot by the
/// remainder of the final sub-frame step before the phase flips; consumers only
/// need a monotonically varying signal, so no clamping is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    progress: f64,
    phase: Phase,
    previous_ms: Option<f64>,
}

impl AnimationState {
    /// Creates the machine in the fade-in phase with progress at zero.
    pub fn new() -> Self {
        Self {
            progress: 0.0,
            phase: Phase::In,
            previous_ms: None,
        }
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Advances the oscillation to `now_ms` and returns the new progress.
    ///
    /// The very first call only seeds the clock; computing a delta against an
    /// absent timestamp would produce an arbitrary initial jump. A non-positive
    /// duration freezes progress for the tick instead of dividing by zero; the
    /// timestamp is still recorded so a later recovery sees a normal one-frame
    /// delta. The phase flips at most once per tick regardless of overshoot.
    pub fn advance(&mut self, now_ms: f64, durations: PhaseDurations) -> f64 {
        let Some(previous) = self.previous_ms.replace(now_ms) else {
            return self.progress;
        };

        let duration = durations.for_phase(self.phase);
        if duration <= 0.0 {
            return self.progress;
        }

        let delta = now_ms - previous;
        self.progress += delta * self.phase.direction() / duration;

        match self.phase {
            Phase::In if self.progress >= 1.0 => self.phase = Phase::Out,
            Phase::Out if self.progress <= -1.0 => self.phase = Phase::In,
            _ => {}
        }

        self.progress
    }
}

impl Default for AnimationState {
    fn default() -> Self {
        Self::new()
    }
}

/// Owned store for the four tunables: two durations and two colors.
///
/// Mutated only by UI actions on the render thread; reads always reflect the
/// latest write. Color changes are tracked with a dirty flag so the renderer
/// can push uniforms edge-triggered rather than polling every frame.
#[derive(Debug, Clone)]
pub struct FadeConfig {
    durations: PhaseDurations,
    color1: Rgb,
    color2: Rgb,
    colors_dirty: bool,
}

impl FadeConfig {
    /// Creates a store with the colors marked dirty so the first consumer
    /// snapshot pushes them.
    pub fn new(durations: PhaseDurations, color1: Rgb, color2: Rgb) -> Self {
        Self {
            durations,
            color1,
            color2,
            colors_dirty: true,
        }
    }

    pub fn durations(&self) -> PhaseDurations {
        self.durations
    }

    pub fn duration_ms(&self, phase: Phase) -> f64 {
        self.durations.for_phase(phase)
    }

    /// Adds one step to the named phase's duration. No ceiling is enforced.
    pub fn increment_duration(&mut self, phase: Phase) {
        self.set_duration(phase, self.duration_ms(phase) + DURATION_STEP_MS);
    }

    /// Subtracts one step from the named phase's duration, unconditionally.
    ///
    /// Callers are expected to gate this with [`Self::can_decrement`]; the
    /// store places no floor of its own.
    pub fn decrement_duration(&mut self, phase: Phase) {
        self.set_duration(phase, self.duration_ms(phase) - DURATION_STEP_MS);
    }

    /// Whether a decrement would keep the duration above the floor.
    pub fn can_decrement(&self, phase: Phase) -> bool {
        self.duration_ms(phase) > MIN_DURATION_MS
    }

    fn set_duration(&mut self, phase: Phase, value_ms: f64) {
        match phase {
            Phase::In => self.durations.fade_in_ms = value_ms,
            Phase::Out => self.durations.fade_out_ms = value_ms,
        }
        tracing::debug!(?phase, value_ms, "fade duration updated");
    }

    pub fn colors(&self) -> (Rgb, Rgb) {
        (self.color1, self.color2)
    }

    pub fn set_color1(&mut self, color: Rgb) {
        if self.color1 != color {
            self.color1 = color;
            self.colors_dirty = true;
        }
    }

    pub fn set_color2(&mut self, color: Rgb) {
        if self.color2 != color {
            self.color2 = color;
            self.colors_dirty = true;
        }
    }

    /// Returns the color pair once per change, clearing the dirty flag.
    pub fn take_color_change(&mut self) -> Option<(Rgb, Rgb)> {
        if self.colors_dirty {
            self.colors_dirty = false;
            Some((self.color1, self.color2))
        } else {
            None
        }
    }
}

/// Formats a millisecond duration as seconds with one decimal for display.
pub fn display_seconds(value_ms: f64) -> String {
    format!("{:.1}", value_ms / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DURATIONS: PhaseDurations = PhaseDurations {
        fade_in_ms: 3000.0,
        fade_out_ms: 5000.0,
    };

    #[test]
    fn first_tick_only_seeds_the_clock() {
        let mut state = AnimationState::new();
        let progress = state.advance(1234.5, DURATIONS);
        assert_eq!(progress, 0.0);
        assert_eq!(state.phase(), Phase::In);

        // The seeded timestamp is used by the following tick.
        let progress = state.advance(1234.5 + 1500.0, DURATIONS);
        assert_eq!(progress, 0.5);
    }

    #[test]
    fn advancement_follows_delta_over_duration() {
        let mut state = AnimationState::new();
        state.advance(0.0, DURATIONS);
        assert_eq!(state.advance(750.0, DURATIONS), 0.25);
        assert_eq!(state.advance(1500.0, DURATIONS), 0.5);
    }

    #[test]
    fn end_to_end_flip_into_fade_out() {
        let mut state = AnimationState::new();
        state.advance(0.0, DURATIONS);
        assert_eq!(state.advance(1500.0, DURATIONS), 0.5);
        assert_eq!(state.advance(3000.0, DURATIONS), 1.0);
        assert_eq!(state.phase(), Phase::Out);

        // Subsequent ticks use the fade-out duration: 2500ms over 5000ms.
        assert_eq!(state.advance(5500.0, DURATIONS), 0.5);
        assert_eq!(state.phase(), Phase::Out);
    }

    #[test]
    fn flip_happens_once_regardless_of_overshoot() {
        let mut state = AnimationState::new();
        state.advance(0.0, DURATIONS);
        // A 9s delta overshoots the 3s fade-in threefold; one flip, no clamp.
        let progress = state.advance(9000.0, DURATIONS);
        assert_eq!(progress, 3.0);
        assert_eq!(state.phase(), Phase::Out);
    }

    #[test]
    fn lower_boundary_flips_back_to_fade_in() {
        let mut state = AnimationState::new();
        state.advance(0.0, DURATIONS);
        state.advance(3000.0, DURATIONS);
        assert_eq!(state.phase(), Phase::Out);
        let progress = state.advance(13_500.0, DURATIONS);
        assert_eq!(progress, -1.1);
        assert_eq!(state.phase(), Phase::In);
    }

    #[test]
    fn non_positive_duration_freezes_progress() {
        let frozen = PhaseDurations {
            fade_in_ms: 0.0,
            fade_out_ms: -500.0,
        };
        let mut state = AnimationState::new();
        state.advance(0.0, frozen);
        assert_eq!(state.advance(1000.0, frozen), 0.0);
        assert_eq!(state.phase(), Phase::In);

        // Recovery after a freeze uses the last recorded timestamp, so the
        // first live tick sees a single frame delta rather than the whole gap.
        let mut config = FadeConfig::new(frozen, [1.0; 3], [0.0; 3]);
        config.set_duration(Phase::In, 2000.0);
        assert_eq!(state.advance(1500.0, config.durations()), 0.25);
    }

    #[test]
    fn increment_is_unbounded() {
        let mut config = FadeConfig::new(DURATIONS, [1.0; 3], [0.0; 3]);
        for expected in [3500.0, 4000.0, 4500.0] {
            config.increment_duration(Phase::In);
            assert_eq!(config.duration_ms(Phase::In), expected);
        }
        assert_eq!(config.duration_ms(Phase::Out), 5000.0);
    }

    #[test]
    fn decrement_gate_rejects_at_the_floor() {
        let mut config = FadeConfig::new(
            PhaseDurations {
                fade_in_ms: 1000.0,
                fade_out_ms: 500.0,
            },
            [1.0; 3],
            [0.0; 3],
        );

        assert!(config.can_decrement(Phase::In));
        config.decrement_duration(Phase::In);
        assert_eq!(config.duration_ms(Phase::In), 500.0);
        assert!(!config.can_decrement(Phase::In));

        // The gate lives at the call boundary; the store itself keeps going.
        assert!(!config.can_decrement(Phase::Out));
        config.decrement_duration(Phase::Out);
        assert_eq!(config.duration_ms(Phase::Out), 0.0);
    }

    #[test]
    fn color_change_is_edge_triggered() {
        let mut config = FadeConfig::new(DURATIONS, [1.0; 3], [0.0; 3]);
        // Construction marks the pair dirty so the first frame pushes it.
        assert_eq!(config.take_color_change(), Some(([1.0; 3], [0.0; 3])));
        assert_eq!(config.take_color_change(), None);

        config.set_color1([0.2, 0.4, 0.6]);
        assert_eq!(
            config.take_color_change(),
            Some(([0.2, 0.4, 0.6], [0.0; 3]))
        );

        // Re-setting the same value is not a change.
        config.set_color1([0.2, 0.4, 0.6]);
        assert_eq!(config.take_color_change(), None);
    }

    #[test]
    fn display_uses_seconds_with_one_decimal() {
        assert_eq!(display_seconds(3000.0), "3.0");
        assert_eq!(display_seconds(3500.0), "3.5");
        assert_eq!(display_seconds(500.0), "0.5");
    }
}
