//! Pure calculation functions for target dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::Dimensions;
use crate::presets::{PresetTable, SizeClasses};

/// A built-in `?size=` rule: tokens starting with `prefix` select this size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeRule {
    pub prefix: &'static str,
    pub class: SizeClasses,
    pub width: u32,
    pub height: u32,
}

impl SizeRule {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }
}

/// Built-in size vocabulary, in priority order.
///
/// Matching is by prefix, so `medium`, `med` and `media` all select 640x360,
/// and `hit` selects `hi`.
pub const SIZE_RULES: &[SizeRule] = &[
    SizeRule {
        prefix: "low",
        class: SizeClasses::SMALL,
        width: 320,
        height: 180,
    },
    SizeRule {
        prefix: "med",
        class: SizeClasses::MEDIUM,
        width: 640,
        height: 360,
    },
    SizeRule {
        prefix: "hi",
        class: SizeClasses::LARGE,
        width: 960,
        height: 540,
    },
    SizeRule {
        prefix: "hd",
        class: SizeClasses::LARGE,
        width: 1280,
        height: 720,
    },
];

/// First built-in rule whose prefix starts `token`. Case-sensitive.
///
/// # Examples
/// ```
/// # use stream_screenshot::imaging::match_size_token;
/// assert_eq!(match_size_token("medium").map(|r| r.width), Some(640));
/// assert_eq!(match_size_token("HD"), None);
/// ```
pub fn match_size_token(token: &str) -> Option<&'static SizeRule> {
    SIZE_RULES.iter().find(|rule| token.starts_with(rule.prefix))
}

/// Resolve the size a request should be rendered at.
///
/// 1. A built-in token whose class is enabled in `presets` wins.
/// 2. Otherwise a preset with exactly this name is used.
/// 3. Otherwise nothing is requested.
///
/// Each axis is then clamped independently: a missing, zero or larger-than-native
/// value becomes the native value. The result never exceeds `native` and is
/// never upscaled.
pub fn resolve_target(
    token: Option<&str>,
    native: Dimensions,
    presets: &PresetTable,
) -> Dimensions {
    let requested = token.and_then(|token| requested_size(token, presets));

    Dimensions {
        width: clamp_axis(requested.map(|d| d.width), native.width),
        height: clamp_axis(requested.map(|d| d.height), native.height),
    }
}

fn requested_size(token: &str, presets: &PresetTable) -> Option<Dimensions> {
    match_size_token(token)
        .filter(|rule| presets.is_enabled(rule.class))
        .map(SizeRule::dimensions)
        .or_else(|| {
            presets
                .find(token)
                .map(|preset| Dimensions::new(preset.width, preset.height))
        })
}

fn clamp_axis(candidate: Option<u32>, native: u32) -> u32 {
    match candidate {
        Some(value) if (1..=native).contains(&value) => value,
        _ => native,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Location;

    const FULL_HD: Dimensions = Dimensions {
        width: 1920,
        height: 1080,
    };

    fn table(enabled: SizeClasses, sizes: &[(&str, u32, u32)]) -> PresetTable {
        let lines = sizes.iter().enumerate().map(|(i, (name, w, h))| {
            (
                Location::new("test.conf", i + 1),
                vec![name.to_string(), w.to_string(), h.to_string()],
            )
        });
        PresetTable::build(lines, enabled).unwrap()
    }

    fn resolve(token: Option<&str>, native: Dimensions) -> Dimensions {
        resolve_target(token, native, &PresetTable::default())
    }

    // =========================================================================
    // Token matching
    // =========================================================================

    #[test]
    fn token_low() {
        let size = match_size_token("low").unwrap();
        assert_eq!(size.dimensions(), Dimensions::new(320, 180));
    }

    #[test]
    fn token_medium_and_prefix_collision() {
        // Prefix matching means anything starting with "med" is medium.
        for token in ["medium", "med", "media"] {
            assert_eq!(
                match_size_token(token).unwrap().dimensions(),
                Dimensions::new(640, 360),
                "{token}"
            );
        }
    }

    #[test]
    fn token_hi_and_hd() {
        let hi = match_size_token("hi").unwrap();
        assert_eq!(hi.dimensions(), Dimensions::new(960, 540));
        let hd = match_size_token("hd").unwrap();
        assert_eq!(hd.dimensions(), Dimensions::new(1280, 720));
        assert_eq!(match_size_token("high").unwrap().prefix, "hi");
    }

    #[test]
    fn token_unknown_or_short() {
        for token in ["bogus", "", "lo", "me", "h", "HD", "Low"] {
            assert!(match_size_token(token).is_none(), "{token:?}");
        }
    }

    // =========================================================================
    // Resolution and clamping
    // =========================================================================

    #[test]
    fn resolve_hi_on_full_hd() {
        assert_eq!(resolve(Some("hi"), FULL_HD), Dimensions::new(960, 540));
    }

    #[test]
    fn resolve_absent_or_unknown_is_native() {
        assert_eq!(resolve(None, FULL_HD), FULL_HD);
        assert_eq!(resolve(Some("bogus"), FULL_HD), FULL_HD);
    }

    #[test]
    fn resolve_clamps_each_axis_independently() {
        // hd = 1280x720 on a 1000x800 source: width clamps, height stays
        assert_eq!(
            resolve(Some("hd"), Dimensions::new(1000, 800)),
            Dimensions::new(1000, 720)
        );
        // low = 320x180 on a 640x100 source: height clamps, width stays
        assert_eq!(
            resolve(Some("low"), Dimensions::new(640, 100)),
            Dimensions::new(320, 100)
        );
    }

    #[test]
    fn resolve_never_upscales() {
        let tiny = Dimensions::new(160, 90);
        assert_eq!(resolve(Some("hd"), tiny), tiny);
    }

    #[test]
    fn resolve_output_always_within_native() {
        let tokens = [None, Some("low"), Some("medium"), Some("hi"), Some("hd"), Some("x")];
        for width in [1, 2, 319, 320, 321, 959, 1280, 4096] {
            for height in [1, 2, 179, 180, 181, 540, 720, 2160] {
                let native = Dimensions::new(width, height);
                for token in tokens {
                    let target = resolve(token, native);
                    assert!((1..=width).contains(&target.width), "{token:?} on {native}");
                    assert!((1..=height).contains(&target.height), "{token:?} on {native}");
                }
            }
        }
    }

    // =========================================================================
    // Enabled mask and named presets
    // =========================================================================

    #[test]
    fn disabled_class_falls_back_to_native() {
        let presets = table(SizeClasses::SMALL, &[]);
        assert_eq!(
            resolve_target(Some("low"), FULL_HD, &presets),
            Dimensions::new(320, 180)
        );
        assert_eq!(resolve_target(Some("medium"), FULL_HD, &presets), FULL_HD);
        assert_eq!(resolve_target(Some("hd"), FULL_HD, &presets), FULL_HD);
    }

    #[test]
    fn large_class_covers_hi_and_hd() {
        let presets = table(SizeClasses::LARGE, &[]);
        assert_eq!(
            resolve_target(Some("hi"), FULL_HD, &presets),
            Dimensions::new(960, 540)
        );
        assert_eq!(
            resolve_target(Some("hd"), FULL_HD, &presets),
            Dimensions::new(1280, 720)
        );
    }

    #[test]
    fn named_preset_selected_by_exact_name() {
        let presets = table(SizeClasses::ALL, &[("thumb", 160, 90)]);
        assert_eq!(
            resolve_target(Some("thumb"), FULL_HD, &presets),
            Dimensions::new(160, 90)
        );
        assert_eq!(resolve_target(Some("thumbnail"), FULL_HD, &presets), FULL_HD);
    }

    #[test]
    fn builtin_token_beats_preset_with_same_name() {
        let presets = table(SizeClasses::ALL, &[("hd", 100, 100)]);
        assert_eq!(
            resolve_target(Some("hd"), FULL_HD, &presets),
            Dimensions::new(1280, 720)
        );
    }

    #[test]
    fn preset_used_when_builtin_class_disabled() {
        let presets = table(SizeClasses::SMALL, &[("hd", 100, 100)]);
        assert_eq!(
            resolve_target(Some("hd"), FULL_HD, &presets),
            Dimensions::new(100, 100)
        );
    }

    #[test]
    fn preset_larger_than_native_is_clamped() {
        let presets = table(SizeClasses::ALL, &[("poster", 3840, 500)]);
        assert_eq!(
            resolve_target(Some("poster"), FULL_HD, &presets),
            Dimensions::new(1920, 500)
        );
    }
}
