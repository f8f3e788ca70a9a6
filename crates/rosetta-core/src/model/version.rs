// ── Device OS version ──
//
// Parsed from the identity string a device reports ("7.13.2 (stable)").
// Ordering only looks at (major, minor); patch and channel are informational.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct DeviceVersion {
    pub major: u32,
    pub minor: u32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub patch: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(n: &u32) -> bool {
    *n == 0
}

impl DeviceVersion {
    pub fn new(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            ..Self::default()
        }
    }

    pub fn with_patch(mut self, patch: u32) -> Self {
        self.patch = patch;
        self
    }

    pub fn is_at_least(&self, major: u32, minor: u32) -> bool {
        (self.major, self.minor) >= (major, minor)
    }

    pub fn is_ros7(&self) -> bool {
        self.major >= 7
    }

    pub fn is_ros6(&self) -> bool {
        self.major == 6
    }

    /// Release ordering on (major, minor).
    pub fn cmp_release(&self, other: &Self) -> Ordering {
        (self.major, self.minor).cmp(&(other.major, other.minor))
    }
}

impl fmt::Display for DeviceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.patch > 0 {
            write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
        } else {
            write!(f, "{}.{}", self.major, self.minor)
        }
    }
}

/// Leading decimal digits of a component ("13rc1" -> 13).
fn leading_number(part: &str) -> Option<u32> {
    let end = part
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(part.len());
    part.get(..end).and_then(|digits| digits.parse().ok())
}

impl FromStr for DeviceVersion {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| CoreError::InvalidVersion {
            input: raw.to_owned(),
            reason: reason.to_owned(),
        };

        let trimmed = raw.trim();
        let (numbers, channel) = match trimmed.split_once(" (") {
            Some((numbers, rest)) => (numbers, Some(rest.trim_end_matches(')').to_owned())),
            None => (trimmed, None),
        };

        let mut parts = numbers.split('.');
        let major = parts
            .next()
            .and_then(leading_number)
            .ok_or_else(|| invalid("missing major component"))?;
        let minor = parts
            .next()
            .ok_or_else(|| invalid("expected at least <major>.<minor>"))
            .and_then(|p| leading_number(p).ok_or_else(|| invalid("minor component is not numeric")))?;
        let patch = parts.next().and_then(leading_number).unwrap_or(0);

        Ok(Self {
            major,
            minor,
            patch,
            channel: channel.filter(|c| !c.is_empty()),
        })
    }
}

/// Accepts either the structured form (`{major = 7, minor = 4}`) or the
/// version string (`"7.4"`), so mapping files can use whichever reads better.
impl<'de> Deserialize<'de> for DeviceVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Parts {
                major: u32,
                minor: u32,
                #[serde(default)]
                patch: u32,
                #[serde(default)]
                channel: Option<String>,
            },
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(s) => s.parse().map_err(serde::de::Error::custom),
            Repr::Parts {
                major,
                minor,
                patch,
                channel,
            } => Ok(Self {
                major,
                minor,
                patch,
                channel,
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_identity_string() {
        let v: DeviceVersion = "7.13.2 (stable)".parse().unwrap();
        assert_eq!((v.major, v.minor, v.patch), (7, 13, 2));
        assert_eq!(v.channel.as_deref(), Some("stable"));
    }

    #[test]
    fn parses_without_patch_or_channel() {
        let v: DeviceVersion = "6.49".parse().unwrap();
        assert_eq!(v, DeviceVersion::new(6, 49));
        assert!(v.is_ros6());
    }

    #[test]
    fn rejects_single_component() {
        assert!("7".parse::<DeviceVersion>().is_err());
        assert!("stable".parse::<DeviceVersion>().is_err());
        assert!("7.x".parse::<DeviceVersion>().is_err());
    }

    #[test]
    fn tolerates_prerelease_suffix() {
        let v: DeviceVersion = "7.14rc1 (testing)".parse().unwrap();
        assert_eq!((v.major, v.minor), (7, 14));
    }

    #[test]
    fn display_omits_zero_patch() {
        assert_eq!(DeviceVersion::new(7, 1).to_string(), "7.1");
        assert_eq!(DeviceVersion::new(7, 13).with_patch(2).to_string(), "7.13.2");
    }

    #[test]
    fn at_least_compares_major_then_minor() {
        let v = DeviceVersion::new(7, 1);
        assert!(v.is_at_least(7, 1));
        assert!(v.is_at_least(6, 99));
        assert!(!v.is_at_least(7, 2));
        assert!(!DeviceVersion::new(7, 0).is_at_least(7, 1));
        assert!(DeviceVersion::new(8, 0).is_at_least(7, 4));
    }

    #[test]
    fn patch_does_not_affect_release_order() {
        let a = DeviceVersion::new(7, 13).with_patch(1);
        let b = DeviceVersion::new(7, 13).with_patch(9);
        assert_eq!(a.cmp_release(&b), Ordering::Equal);
    }

    #[test]
    fn deserializes_from_text_or_parts() {
        let v: DeviceVersion = serde_json::from_str(r#""7.4""#).unwrap();
        assert_eq!(v, DeviceVersion::new(7, 4));
        let v: DeviceVersion = serde_json::from_str(r#"{"major":7,"minor":1}"#).unwrap();
        assert_eq!(v, DeviceVersion::new(7, 1));
    }
}
