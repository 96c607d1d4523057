// Waveform generation - pattern configs and the pure generator function
use rand::Rng;
use serde::{Deserialize, Serialize};

const DEFAULT_AMPLITUDE: f64 = 10.0;
const DEFAULT_PERIOD_MS: f64 = 5000.0;
const DEFAULT_STEP_SIZE: f64 = 1.0;
const DEFAULT_WALK_MIN: f64 = 0.0;
const DEFAULT_WALK_MAX: f64 = 100.0;

/// Waveform strategy for one simulated channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pattern {
    Fixed,
    Sine,
    Ramp,
    RandomWalk,
}

/// How one channel's simulated value evolves over time. Optional fields fall
/// back to documented defaults, never to an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternConfig {
    pub pattern: Pattern,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amplitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl PatternConfig {
    pub fn fixed(value: f64) -> Self {
        Self {
            fixed_value: Some(value),
            ..Self::bare(Pattern::Fixed)
        }
    }

    pub fn sine(base: f64, amplitude: f64, period_ms: f64) -> Self {
        Self {
            base: Some(base),
            amplitude: Some(amplitude),
            period_ms: Some(period_ms),
            ..Self::bare(Pattern::Sine)
        }
    }

    pub fn ramp(base: f64, amplitude: f64, period_ms: f64) -> Self {
        Self {
            base: Some(base),
            amplitude: Some(amplitude),
            period_ms: Some(period_ms),
            ..Self::bare(Pattern::Ramp)
        }
    }

    pub fn random_walk(base: f64, step_size: f64, min: f64, max: f64) -> Self {
        Self {
            base: Some(base),
            step_size: Some(step_size),
            min: Some(min),
            max: Some(max),
            ..Self::bare(Pattern::RandomWalk)
        }
    }

    fn bare(pattern: Pattern) -> Self {
        Self {
            pattern,
            base: None,
            amplitude: None,
            period_ms: None,
            fixed_value: None,
            step_size: None,
            min: None,
            max: None,
        }
    }
}

/// Cross-call memory for the RandomWalk pattern. Reset whenever the owning
/// channel's config changes or a new profile is selected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkState {
    pub last_walk_value: f64,
}

impl WalkState {
    /// Initial state for a config: the configured base, or 0.
    pub fn reset(cfg: &PatternConfig) -> Self {
        Self {
            last_walk_value: cfg.base.unwrap_or(0.0),
        }
    }
}

/// Compute the simulated value for one channel at `elapsed_ms` since connect.
///
/// Pure except for RandomWalk, which reads and updates `walk` and draws one
/// perturbation from `rng`. Callers inject a seeded rng for determinism.
pub fn generate(
    cfg: &PatternConfig,
    elapsed_ms: f64,
    walk: &mut WalkState,
    rng: &mut impl Rng,
) -> f64 {
    match cfg.pattern {
        Pattern::Fixed => cfg.fixed_value.or(cfg.base).unwrap_or(0.0),
        Pattern::Sine => {
            let base = cfg.base.unwrap_or(0.0);
            let amplitude = cfg.amplitude.unwrap_or(DEFAULT_AMPLITUDE);
            let period = cfg.period_ms.unwrap_or(DEFAULT_PERIOD_MS);
            base + amplitude * (2.0 * std::f64::consts::PI * elapsed_ms / period).sin()
        }
        Pattern::Ramp => {
            let base = cfg.base.unwrap_or(0.0);
            let amplitude = cfg.amplitude.unwrap_or(DEFAULT_AMPLITUDE);
            let period = cfg.period_ms.unwrap_or(DEFAULT_PERIOD_MS);
            let phase = elapsed_ms.rem_euclid(period) / period;
            // Triangle wave: 0 -> 1 -> 0 over one period
            let tri = if phase < 0.5 {
                phase * 2.0
            } else {
                2.0 - phase * 2.0
            };
            base + amplitude * tri
        }
        Pattern::RandomWalk => {
            let step = cfg.step_size.unwrap_or(DEFAULT_STEP_SIZE);
            let min = cfg.min.unwrap_or(DEFAULT_WALK_MIN);
            let max = cfg.max.unwrap_or(DEFAULT_WALK_MAX);
            let perturbed = walk.last_walk_value + rng.gen_range(-step..=step);
            let clamped = perturbed.clamp(min, max);
            walk.last_walk_value = clamped;
            clamped
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_fixed_ignores_elapsed() {
        let cfg = PatternConfig::fixed(101.0);
        let mut walk = WalkState::reset(&cfg);
        for t in [0.0, 250.0, 1e6] {
            assert_eq!(generate(&cfg, t, &mut walk, &mut rng()), 101.0);
        }
    }

    #[test]
    fn test_fixed_falls_back_to_base() {
        let mut cfg = PatternConfig::bare(Pattern::Fixed);
        cfg.base = Some(25.0);
        let mut walk = WalkState::reset(&cfg);
        assert_eq!(generate(&cfg, 123.0, &mut walk, &mut rng()), 25.0);

        let bare = PatternConfig::bare(Pattern::Fixed);
        let mut walk = WalkState::reset(&bare);
        assert_eq!(generate(&bare, 0.0, &mut walk, &mut rng()), 0.0);
    }

    #[test]
    fn test_sine_is_periodic() {
        let cfg = PatternConfig::sine(750.0, 50.0, 5000.0);
        let mut walk = WalkState::reset(&cfg);
        for t in [0.0, 333.0, 1200.0, 4999.0] {
            let a = generate(&cfg, t, &mut walk, &mut rng());
            let b = generate(&cfg, t + 5000.0, &mut walk, &mut rng());
            assert!((a - b).abs() < 1e-9, "t={t}: {a} vs {b}");
        }
    }

    #[test]
    fn test_sine_defaults() {
        let mut cfg = PatternConfig::bare(Pattern::Sine);
        cfg.base = Some(100.0);
        let mut walk = WalkState::reset(&cfg);
        // Quarter of the default 5000ms period with default amplitude 10
        let v = generate(&cfg, 1250.0, &mut walk, &mut rng());
        assert!((v - 110.0).abs() < 1e-9);
    }

    #[test]
    fn test_ramp_starts_at_base_and_stays_bounded() {
        let cfg = PatternConfig::ramp(20.0, 10.0, 4000.0);
        let mut walk = WalkState::reset(&cfg);
        assert_eq!(generate(&cfg, 0.0, &mut walk, &mut rng()), 20.0);
        for i in 0..200 {
            let v = generate(&cfg, i as f64 * 137.0, &mut walk, &mut rng());
            assert!((20.0..=30.0).contains(&v), "out of envelope: {v}");
        }
        // Peak at half period
        assert!((generate(&cfg, 2000.0, &mut walk, &mut rng()) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_random_walk_steps_bounded() {
        let cfg = PatternConfig::random_walk(50.0, 2.5, 40.0, 60.0);
        let mut walk = WalkState::reset(&cfg);
        let mut rng = rng();
        let mut prev = walk.last_walk_value;
        for _ in 0..500 {
            let v = generate(&cfg, 0.0, &mut walk, &mut rng);
            assert!((v - prev).abs() <= 2.5 + 1e-12);
            assert!((40.0..=60.0).contains(&v));
            assert_eq!(walk.last_walk_value, v);
            prev = v;
        }
    }

    #[test]
    fn test_random_walk_deterministic_with_seed() {
        let cfg = PatternConfig::random_walk(50.0, 2.5, 40.0, 60.0);
        let run = || {
            let mut walk = WalkState::reset(&cfg);
            let mut rng = rng();
            (0..20)
                .map(|_| generate(&cfg, 0.0, &mut walk, &mut rng))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_walk_reset_uses_base() {
        let cfg = PatternConfig::random_walk(85.0, 0.5, 80.0, 95.0);
        assert_eq!(WalkState::reset(&cfg).last_walk_value, 85.0);
        let bare = PatternConfig::bare(Pattern::RandomWalk);
        assert_eq!(WalkState::reset(&bare).last_walk_value, 0.0);
    }

    #[test]
    fn test_pattern_serde_names() {
        assert_eq!(
            serde_json::to_string(&Pattern::RandomWalk).unwrap(),
            "\"random-walk\""
        );
        let cfg: PatternConfig =
            serde_json::from_str(r#"{"pattern":"sine","base":750.0,"amplitude":50.0}"#).unwrap();
        assert_eq!(cfg.pattern, Pattern::Sine);
        assert_eq!(cfg.base, Some(750.0));
        assert_eq!(cfg.period_ms, None);
    }
}
