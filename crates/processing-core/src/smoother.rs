//! Tick label debouncing.
//!
//! A trailing-window majority filter keeps single noisy readings from
//! flipping the state. One very confident reading may enter SHAKY on its
//! own; there is no matching shortcut back to GOOD.

use std::collections::VecDeque;

use steadycut_common::config::SmoothingConfig;
use steadycut_plan_model::segment::{SegmentType, SmoothedTick};
use steadycut_plan_model::tick::Tick;

/// Majority-filter smoother.
pub struct Smoother {
    config: SmoothingConfig,
}

impl Smoother {
    /// Create a smoother with the given parameters.
    pub fn new(config: SmoothingConfig) -> Self {
        Self { config }
    }

    /// Create a smoother with the default 2-of-3 filter and 0.95 override.
    pub fn with_defaults() -> Self {
        Self::new(SmoothingConfig::default())
    }

    /// Debounce a full tick history. Output is index-aligned with `ticks`.
    ///
    /// State starts as GOOD before the first tick. Near the start of the
    /// stream the majority is taken over however many labels exist.
    pub fn smooth(&self, ticks: &[Tick]) -> Vec<SmoothedTick> {
        let window_len = self.config.window.max(1);
        let majority = self.config.majority;

        let mut window: VecDeque<bool> = VecDeque::with_capacity(window_len + 1);
        let mut state = SegmentType::Good;
        let mut result = Vec::with_capacity(ticks.len());

        for tick in ticks {
            window.push_back(tick.raw.shaky);
            if window.len() > window_len {
                window.pop_front();
            }

            let shaky_count = window.iter().filter(|&&shaky| shaky).count();
            let majority_shaky = shaky_count >= majority;
            let majority_good = shaky_count < majority;

            state = match state {
                SegmentType::Good
                    if majority_shaky || tick.raw.confidence >= self.config.override_confidence =>
                {
                    SegmentType::Shaky
                }
                SegmentType::Shaky if majority_good => SegmentType::Good,
                unchanged => unchanged,
            };

            result.push(SmoothedTick {
                tick: tick.tick,
                ts: tick.ts,
                final_state: state,
            });
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use steadycut_plan_model::tick::RawTickInput;

    fn ticks(labels: &[(bool, f64)]) -> Vec<Tick> {
        labels
            .iter()
            .enumerate()
            .map(|(i, &(shaky, confidence))| {
                Tick::ingest(
                    i as u64 + 1,
                    &RawTickInput::classified((i + 1) as f64, shaky, confidence),
                )
            })
            .collect()
    }

    fn states(smoothed: &[SmoothedTick]) -> Vec<SegmentType> {
        smoothed.iter().map(|s| s.final_state).collect()
    }

    use SegmentType::{Good as G, Shaky as S};

    #[test]
    fn test_empty_input() {
        assert!(Smoother::with_defaults().smooth(&[]).is_empty());
    }

    #[test]
    fn test_isolated_shaky_tick_does_not_flicker() {
        let input = ticks(&[
            (false, 0.1),
            (false, 0.1),
            (true, 0.7),
            (false, 0.1),
            (false, 0.1),
        ]);
        let smoothed = Smoother::with_defaults().smooth(&input);
        assert_eq!(states(&smoothed), vec![G, G, G, G, G]);
    }

    #[test]
    fn test_high_confidence_tick_enters_shaky_immediately() {
        let input = ticks(&[(false, 0.1), (false, 0.1), (true, 0.96), (false, 0.1)]);
        let smoothed = Smoother::with_defaults().smooth(&input);
        assert_eq!(smoothed[2].final_state, S);
        // Only one shaky label in the window, so the majority rule snaps back.
        assert_eq!(smoothed[3].final_state, G);
    }

    #[test]
    fn test_override_threshold_is_inclusive() {
        let input = ticks(&[(true, 0.95)]);
        let smoothed = Smoother::with_defaults().smooth(&input);
        assert_eq!(smoothed[0].final_state, S);

        let input = ticks(&[(true, 0.949)]);
        let smoothed = Smoother::with_defaults().smooth(&input);
        assert_eq!(smoothed[0].final_state, G);
    }

    #[test]
    fn test_partial_window_at_stream_start() {
        // Two of two labels shaky is already a majority.
        let input = ticks(&[(true, 0.6), (true, 0.6)]);
        let smoothed = Smoother::with_defaults().smooth(&input);
        assert_eq!(states(&smoothed), vec![G, S]);
    }

    #[test]
    fn test_traced_three_tick_burst() {
        // shaky at ticks 3,4,5
        let input = ticks(&[
            (false, 0.2),
            (false, 0.2),
            (true, 0.6),
            (true, 0.6),
            (true, 0.6),
            (false, 0.2),
            (false, 0.2),
            (false, 0.2),
        ]);
        let smoothed = Smoother::with_defaults().smooth(&input);
        assert_eq!(states(&smoothed), vec![G, G, G, S, S, S, G, G]);
    }

    #[test]
    fn test_output_mirrors_tick_numbers_and_timestamps() {
        let input = ticks(&[(false, 0.0), (true, 0.99)]);
        let smoothed = Smoother::with_defaults().smooth(&input);
        assert_eq!(smoothed[1].tick, 2);
        assert_eq!(smoothed[1].ts, 2.0);
    }

    #[test]
    fn test_wider_window_config() {
        let smoother = Smoother::new(SmoothingConfig {
            window: 5,
            majority: 3,
            override_confidence: 1.1,
        });
        let input = ticks(&[
            (true, 0.5),
            (true, 0.5),
            (false, 0.5),
            (true, 0.5),
            (false, 0.5),
        ]);
        assert_eq!(states(&smoother.smooth(&input)), vec![G, G, G, S, S]);
    }
}
