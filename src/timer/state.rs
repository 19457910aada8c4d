use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerPhase {
    Idle,
    Running,
    Warning,
    Finished,
}

impl Default for TimerPhase {
    fn default() -> Self {
        TimerPhase::Idle
    }
}

/// Phase change taken by a tick, if any. At most one per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickTransition {
    None,
    EnteredWarning,
    Finished,
}

/// Converts a user-entered duration to whole seconds.
///
/// Fractional minutes are accepted; the duration is quantized to whole
/// seconds. Returns `None` for non-finite, non-positive, or sub-second
/// input.
pub fn minutes_to_seconds(minutes: f64) -> Option<i64> {
    if !minutes.is_finite() || minutes <= 0.0 {
        return None;
    }
    let total = (minutes * 60.0).round() as i64;
    (total > 0).then_some(total)
}

/// The countdown session. Never persisted; a restart always begins `Idle`.
///
/// Remaining time is recomputed from `end_at` against the caller-supplied
/// wall clock on every tick, so the displayed value self-corrects after a
/// delayed or missed tick instead of drifting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub phase: TimerPhase,
    pub end_at: Option<DateTime<Utc>>,
    pub remaining_seconds: i64,
    pub warning_fired: bool,
    /// Warning threshold in seconds, captured from settings at session
    /// start; later settings edits do not affect a running session.
    #[serde(skip)]
    pub warning_threshold_seconds: i64,
    /// Bumped on every start and reset. Delayed callbacks compare it before
    /// touching state so a stale callback cannot mutate a newer session.
    #[serde(skip)]
    pub generation: u64,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            phase: TimerPhase::Idle,
            end_at: None,
            remaining_seconds: 0,
            warning_fired: false,
            warning_threshold_seconds: 0,
            generation: 0,
        }
    }
}

impl TimerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_session(
        &mut self,
        total_seconds: i64,
        warning_threshold_seconds: i64,
        now: DateTime<Utc>,
    ) {
        let generation = self.generation.wrapping_add(1);
        *self = Self {
            phase: TimerPhase::Running,
            end_at: Some(now + Duration::seconds(total_seconds)),
            remaining_seconds: total_seconds,
            warning_fired: false,
            warning_threshold_seconds,
            generation,
        };
    }

    /// Recomputes remaining time and takes at most one phase transition.
    ///
    /// The finish check runs first; a session at zero goes to `Finished`
    /// even if the warning never fired. The warning fires on the first tick
    /// where `0 < remaining <= threshold`, and only once per session.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickTransition {
        if !self.is_counting() {
            return TickTransition::None;
        }

        self.remaining_seconds = self.remaining_at(now);

        if self.remaining_seconds <= 0 {
            self.phase = TimerPhase::Finished;
            return TickTransition::Finished;
        }

        if self.phase == TimerPhase::Running
            && !self.warning_fired
            && self.remaining_seconds <= self.warning_threshold_seconds
        {
            self.phase = TimerPhase::Warning;
            self.warning_fired = true;
            return TickTransition::EnteredWarning;
        }

        TickTransition::None
    }

    /// Auto-dismiss of the warning overlay: back to `Running` without
    /// re-arming the warning. Returns whether anything changed.
    pub fn dismiss_warning(&mut self) -> bool {
        if self.phase == TimerPhase::Warning {
            self.phase = TimerPhase::Running;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        let generation = self.generation.wrapping_add(1);
        *self = Self {
            generation,
            ..Self::default()
        };
    }

    pub fn is_counting(&self) -> bool {
        matches!(self.phase, TimerPhase::Running | TimerPhase::Warning)
    }

    /// Display-only refresh between ticks; takes no transition.
    pub fn refresh_remaining(&mut self, now: DateTime<Utc>) {
        if self.is_counting() {
            self.remaining_seconds = self.remaining_at(now);
        }
    }

    fn remaining_at(&self, now: DateTime<Utc>) -> i64 {
        match self.end_at {
            Some(end_at) => (end_at - now).num_milliseconds().div_euclid(1000).max(0),
            None => 0,
        }
    }

    /// Whole-minutes part of the display split. Never negative.
    pub fn minutes(&self) -> i64 {
        self.remaining_seconds / 60
    }

    /// Seconds remainder of the display split. Never negative.
    pub fn seconds(&self) -> i64 {
        self.remaining_seconds % 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap()
    }

    fn running_state(total_seconds: i64, threshold_seconds: i64) -> TimerState {
        let mut state = TimerState::new();
        state.begin_session(total_seconds, threshold_seconds, start_instant());
        state
    }

    #[test]
    fn minutes_to_seconds_accepts_fractional_minutes() {
        assert_eq!(minutes_to_seconds(50.0), Some(3000));
        assert_eq!(minutes_to_seconds(1.5), Some(90));
        assert_eq!(minutes_to_seconds(0.5), Some(30));
    }

    #[test]
    fn minutes_to_seconds_rejects_invalid_input() {
        assert_eq!(minutes_to_seconds(0.0), None);
        assert_eq!(minutes_to_seconds(-3.0), None);
        assert_eq!(minutes_to_seconds(f64::NAN), None);
        assert_eq!(minutes_to_seconds(f64::INFINITY), None);
        assert_eq!(minutes_to_seconds(0.001), None);
    }

    #[test]
    fn start_sets_running_with_full_remaining() {
        let state = running_state(3000, 300);
        assert_eq!(state.phase, TimerPhase::Running);
        assert_eq!(state.remaining_seconds, 3000);
        assert_eq!(
            state.end_at,
            Some(start_instant() + Duration::seconds(3000))
        );
        assert!(!state.warning_fired);
    }

    #[test]
    fn remaining_is_monotonic_and_never_negative() {
        let mut state = running_state(600, 60);
        let mut previous = state.remaining_seconds;
        for offset in [1, 5, 5, 30, 300, 599, 600, 900] {
            state.tick(start_instant() + Duration::seconds(offset));
            assert!(state.remaining_seconds <= previous);
            assert!(state.remaining_seconds >= 0);
            previous = state.remaining_seconds;
        }
    }

    #[test]
    fn remaining_self_corrects_after_missed_ticks() {
        let mut state = running_state(600, 60);
        // One tick, then a long scheduling gap: remaining reflects wall
        // clock, not tick count.
        state.tick(start_instant() + Duration::seconds(1));
        assert_eq!(state.remaining_seconds, 599);
        state.tick(start_instant() + Duration::seconds(500));
        assert_eq!(state.remaining_seconds, 100);
    }

    #[test]
    fn warning_fires_on_first_tick_at_or_below_threshold() {
        let mut state = running_state(600, 300);

        assert_eq!(
            state.tick(start_instant() + Duration::seconds(299)),
            TickTransition::None
        );
        assert_eq!(state.phase, TimerPhase::Running);

        assert_eq!(
            state.tick(start_instant() + Duration::seconds(300)),
            TickTransition::EnteredWarning
        );
        assert_eq!(state.phase, TimerPhase::Warning);
        assert_eq!(state.remaining_seconds, 300);
    }

    #[test]
    fn warning_fires_at_most_once_per_session() {
        let mut state = running_state(600, 300);
        assert_eq!(
            state.tick(start_instant() + Duration::seconds(301)),
            TickTransition::EnteredWarning
        );
        assert_eq!(
            state.tick(start_instant() + Duration::seconds(302)),
            TickTransition::None
        );

        assert!(state.dismiss_warning());
        assert_eq!(state.phase, TimerPhase::Running);

        // Still inside the warning window, but the warning does not re-arm.
        assert_eq!(
            state.tick(start_instant() + Duration::seconds(310)),
            TickTransition::None
        );
        assert_eq!(state.phase, TimerPhase::Running);
    }

    #[test]
    fn short_session_warns_on_the_first_tick() {
        // A 60 s session with the default 300 s threshold is already inside
        // the warning window when the first tick fires.
        let mut state = running_state(60, 300);
        assert_eq!(
            state.tick(start_instant() + Duration::seconds(1)),
            TickTransition::EnteredWarning
        );
        assert_eq!(state.remaining_seconds, 59);

        assert_eq!(
            state.tick(start_instant() + Duration::seconds(60)),
            TickTransition::Finished
        );
        assert_eq!(state.phase, TimerPhase::Finished);
        assert_eq!(state.remaining_seconds, 0);
    }

    #[test]
    fn finishes_even_if_warning_never_fired() {
        let mut state = running_state(60, 30);
        // Jump straight past the end: the finish check wins and the
        // warning window is skipped entirely.
        assert_eq!(
            state.tick(start_instant() + Duration::seconds(60)),
            TickTransition::Finished
        );
        assert_eq!(state.phase, TimerPhase::Finished);
        assert!(!state.warning_fired);
    }

    #[test]
    fn finished_state_ignores_further_ticks() {
        let mut state = running_state(60, 30);
        state.tick(start_instant() + Duration::seconds(60));
        assert_eq!(
            state.tick(start_instant() + Duration::seconds(61)),
            TickTransition::None
        );
        assert_eq!(state.phase, TimerPhase::Finished);
    }

    #[test]
    fn tick_in_idle_is_a_noop() {
        let mut state = TimerState::new();
        assert_eq!(state.tick(start_instant()), TickTransition::None);
        assert_eq!(state.phase, TimerPhase::Idle);
        assert_eq!(state.remaining_seconds, 0);
    }

    #[test]
    fn reset_returns_to_idle_and_bumps_generation() {
        let mut state = running_state(600, 300);
        let generation = state.generation;
        state.tick(start_instant() + Duration::seconds(301));

        state.reset();
        assert_eq!(state.phase, TimerPhase::Idle);
        assert_eq!(state.remaining_seconds, 0);
        assert_eq!(state.end_at, None);
        assert!(!state.warning_fired);
        assert_eq!(state.generation, generation + 1);
    }

    #[test]
    fn dismiss_warning_only_applies_in_warning_phase() {
        let mut state = running_state(600, 60);
        assert!(!state.dismiss_warning());
        assert_eq!(state.phase, TimerPhase::Running);

        state.reset();
        assert!(!state.dismiss_warning());
        assert_eq!(state.phase, TimerPhase::Idle);
    }

    #[test]
    fn display_split_is_non_negative_minutes_and_seconds() {
        let mut state = running_state(3000, 300);
        state.tick(start_instant() + Duration::seconds(2875));
        assert_eq!(state.remaining_seconds, 125);
        assert_eq!(state.minutes(), 2);
        assert_eq!(state.seconds(), 5);

        state.tick(start_instant() + Duration::seconds(3000));
        assert_eq!(state.minutes(), 0);
        assert_eq!(state.seconds(), 0);
    }

    #[test]
    fn sub_second_remainders_floor_toward_zero() {
        let mut state = running_state(60, 30);
        state.tick(start_instant() + Duration::milliseconds(500));
        assert_eq!(state.remaining_seconds, 59);
        state.tick(start_instant() + Duration::milliseconds(59_900));
        assert_eq!(state.remaining_seconds, 0);
        assert_eq!(state.phase, TimerPhase::Finished);
    }
}
