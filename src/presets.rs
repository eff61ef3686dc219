//! Size presets and the enabled-size mask.
//!
//! A [`PresetTable`] is built once from the `screenshot` and
//! `screenshot_sizes` directives (see [`directives`](crate::directives)) and
//! is read-only afterwards. Requests share it through an `Arc` without locking.
//!
//! ```text
//! screenshot small medium;      →  enabled = SMALL | MEDIUM
//! screenshot_sizes {
//!     thumb 160 90;             →  presets[0] = thumb 160x90
//!     wide  1280 720;           →  presets[1] = wide 1280x720
//! }
//! ```

use crate::config::{ConfigError, Location};
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Built-in size classes a request may select with `?size=`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SizeClasses: u8 {
        const SMALL = 0x01;
        const MEDIUM = 0x02;
        const LARGE = 0x04;
        const ALL = 0xff;
    }
}

impl SizeClasses {
    /// Union of mask tokens from a `screenshot` directive.
    ///
    /// Accepts `all`, `small`, `medium` and `large`; anything else is an error.
    pub fn from_tokens<S: AsRef<str>>(
        tokens: &[S],
        location: &Location,
    ) -> Result<Self, ConfigError> {
        if tokens.is_empty() {
            return Err(ConfigError::directive(
                location,
                "invalid number of arguments in \"screenshot\" directive",
            ));
        }

        let mut mask = SizeClasses::empty();
        for token in tokens {
            mask |= match token.as_ref() {
                "all" => SizeClasses::ALL,
                "small" => SizeClasses::SMALL,
                "medium" => SizeClasses::MEDIUM,
                "large" => SizeClasses::LARGE,
                other => {
                    return Err(ConfigError::directive(
                        location,
                        format!("invalid value \"{other}\" in \"screenshot\" directive"),
                    ));
                }
            };
        }
        Ok(mask)
    }

    /// Mask tokens describing this set, for display.
    pub fn names(self) -> Vec<&'static str> {
        if self.contains(SizeClasses::ALL) {
            return vec!["all"];
        }
        [
            (SizeClasses::SMALL, "small"),
            (SizeClasses::MEDIUM, "medium"),
            (SizeClasses::LARGE, "large"),
        ]
        .into_iter()
        .filter(|(class, _)| self.contains(*class))
        .map(|(_, name)| name)
        .collect()
    }
}

/// An operator-declared `name width height` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizePreset {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for SizePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}x{}", self.name, self.width, self.height)
    }
}

/// Named presets plus the enabled-class mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetTable {
    presets: Vec<SizePreset>,
    enabled: SizeClasses,
}

impl Default for PresetTable {
    /// No presets; every built-in class enabled.
    fn default() -> Self {
        Self {
            presets: Vec::new(),
            enabled: SizeClasses::ALL,
        }
    }
}

impl PresetTable {
    /// Build a table from `screenshot_sizes` lines.
    ///
    /// Each entry carries the location of its line and its raw tokens, which
    /// must be exactly `name width height`. Declaration order is preserved.
    pub fn build<I>(lines: I, enabled: SizeClasses) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (Location, Vec<String>)>,
    {
        let mut presets = Vec::new();
        for (location, args) in lines {
            presets.push(parse_preset(&location, args)?);
        }
        Ok(Self { presets, enabled })
    }

    /// First preset declared with `name`.
    pub fn find(&self, name: &str) -> Option<&SizePreset> {
        self.presets.iter().find(|p| p.name == name)
    }

    pub fn presets(&self) -> &[SizePreset] {
        &self.presets
    }

    pub fn enabled(&self) -> SizeClasses {
        self.enabled
    }

    pub fn is_enabled(&self, class: SizeClasses) -> bool {
        self.enabled.contains(class)
    }
}

fn parse_preset(location: &Location, args: Vec<String>) -> Result<SizePreset, ConfigError> {
    let [name, width, height]: [String; 3] = args.try_into().map_err(|_| {
        ConfigError::directive(
            location,
            "invalid number of arguments in \"screenshot_sizes\" directive",
        )
    })?;

    Ok(SizePreset {
        width: parse_dimension(location, &name, "width", &width)?,
        height: parse_dimension(location, &name, "height", &height)?,
        name,
    })
}

/// Parse a plain decimal dimension. Signs, blanks and zero are rejected.
fn parse_dimension(
    location: &Location,
    name: &str,
    axis: &str,
    text: &str,
) -> Result<u32, ConfigError> {
    let invalid = || {
        let message = format!(
            "invalid {axis} \"{text}\" for size \"{name}\" in \"screenshot_sizes\" directive"
        );
        ConfigError::directive(location, message)
    };

    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    match text.parse::<u32>() {
        Ok(0) | Err(_) => Err(invalid()),
        Ok(value) => Ok(value),
    }
}
