// Profile table - named bundles of per-channel pattern configs
use std::collections::BTreeMap;
use std::sync::LazyLock;

use super::pattern::PatternConfig;

/// A driving scenario: one pattern config per simulated channel.
#[derive(Debug, Clone)]
pub struct Profile {
    pub name: &'static str,
    pub channels: BTreeMap<String, PatternConfig>,
}

impl Profile {
    fn new(name: &'static str, channels: Vec<(&str, PatternConfig)>) -> Self {
        Self {
            name,
            channels: channels
                .into_iter()
                .map(|(id, cfg)| (id.to_string(), cfg))
                .collect(),
        }
    }
}

static PROFILES: LazyLock<Vec<Profile>> = LazyLock::new(|| {
    vec![
        Profile::new(
            "idle",
            vec![
                ("010C", PatternConfig::sine(750.0, 50.0, 5000.0)),
                ("010D", PatternConfig::fixed(0.0)),
                ("0105", PatternConfig::random_walk(85.0, 0.5, 80.0, 95.0)),
                ("0111", PatternConfig::sine(5.0, 3.0, 3000.0)),
                ("010F", PatternConfig::fixed(25.0)),
                ("0104", PatternConfig::sine(20.0, 10.0, 4000.0)),
                ("0133", PatternConfig::fixed(101.0)),
                ("010B", PatternConfig::sine(35.0, 5.0, 4000.0)),
                ("012F", PatternConfig::random_walk(60.0, 0.1, 50.0, 70.0)),
                ("0142", PatternConfig::sine(14.2, 0.1, 6000.0)),
            ],
        ),
        Profile::new(
            "city",
            vec![
                ("010C", PatternConfig::random_walk(2000.0, 200.0, 700.0, 4500.0)),
                ("010D", PatternConfig::random_walk(40.0, 5.0, 0.0, 80.0)),
                ("0105", PatternConfig::random_walk(90.0, 0.3, 85.0, 100.0)),
                ("0111", PatternConfig::random_walk(25.0, 5.0, 0.0, 80.0)),
                ("010F", PatternConfig::random_walk(30.0, 1.0, 20.0, 45.0)),
                ("0104", PatternConfig::random_walk(40.0, 8.0, 10.0, 85.0)),
                ("0133", PatternConfig::fixed(101.0)),
                ("010B", PatternConfig::random_walk(50.0, 10.0, 20.0, 120.0)),
                ("012F", PatternConfig::random_walk(55.0, 0.2, 40.0, 70.0)),
                ("0142", PatternConfig::sine(14.0, 0.3, 5000.0)),
            ],
        ),
        Profile::new(
            "highway",
            vec![
                ("010C", PatternConfig::sine(3000.0, 300.0, 8000.0)),
                ("010D", PatternConfig::sine(100.0, 10.0, 10000.0)),
                ("0105", PatternConfig::random_walk(95.0, 0.2, 90.0, 105.0)),
                ("0111", PatternConfig::sine(35.0, 8.0, 6000.0)),
                ("010F", PatternConfig::random_walk(35.0, 0.5, 25.0, 45.0)),
                ("0104", PatternConfig::sine(45.0, 15.0, 7000.0)),
                ("0133", PatternConfig::fixed(101.0)),
                ("010B", PatternConfig::sine(80.0, 20.0, 6000.0)),
                ("012F", PatternConfig::random_walk(50.0, 0.3, 30.0, 65.0)),
                ("0142", PatternConfig::sine(14.4, 0.2, 8000.0)),
            ],
        ),
    ]
});

/// Look up a built-in profile by name.
pub fn profile(name: &str) -> Option<&'static Profile> {
    PROFILES.iter().find(|p| p.name == name)
}

/// Built-in profile names, in definition order.
pub fn profile_names() -> Vec<&'static str> {
    PROFILES.iter().map(|p| p.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::channel;
    use crate::domain::pattern::Pattern;

    #[test]
    fn test_builtin_names() {
        assert_eq!(profile_names(), vec!["idle", "city", "highway"]);
        assert!(profile("rally").is_none());
    }

    #[test]
    fn test_idle_rpm_is_low_sine() {
        let idle = profile("idle").unwrap();
        let rpm = &idle.channels["010C"];
        assert_eq!(rpm.pattern, Pattern::Sine);
        assert_eq!(rpm.base, Some(750.0));
        assert_eq!(rpm.amplitude, Some(50.0));
    }

    #[test]
    fn test_profiles_cover_known_channels() {
        for p in ["idle", "city", "highway"] {
            let p = profile(p).unwrap();
            assert_eq!(p.channels.len(), 10);
            for id in p.channels.keys() {
                assert!(channel::channel(id).is_some(), "unknown channel {id}");
            }
        }
    }
}
