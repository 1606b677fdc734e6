//! Automatic message accounting flags.

use std::fmt;
use std::str::FromStr;

use crate::UnknownName;

/// AMA flags attached to a call for billing classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AmaFlags {
    /// No flag set. The host renders this as `"Unknown"`.
    None,
    /// Omit the record from billing.
    Omit,
    /// Billable call.
    Billing,
    /// Record for documentation only.
    #[default]
    Documentation,
}

impl AmaFlags {
    /// Canonical string name used in published documents.
    pub const fn as_str(&self) -> &'static str {
        match self {
            AmaFlags::None => "Unknown",
            AmaFlags::Omit => "OMIT",
            AmaFlags::Billing => "BILLING",
            AmaFlags::Documentation => "DOCUMENTATION",
        }
    }

    /// The host's numeric code for this flag.
    pub const fn code(&self) -> u32 {
        match self {
            AmaFlags::None => 0,
            AmaFlags::Omit => 1,
            AmaFlags::Billing => 2,
            AmaFlags::Documentation => 3,
        }
    }

    /// Map a host numeric code back to a flag.
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(AmaFlags::None),
            1 => Some(AmaFlags::Omit),
            2 => Some(AmaFlags::Billing),
            3 => Some(AmaFlags::Documentation),
            _ => None,
        }
    }
}

impl fmt::Display for AmaFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AmaFlags {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OMIT" => Ok(AmaFlags::Omit),
            "BILLING" => Ok(AmaFlags::Billing),
            "DOCUMENTATION" => Ok(AmaFlags::Documentation),
            "UNKNOWN" | "NONE" | "" => Ok(AmaFlags::None),
            _ => Err(UnknownName::new("amaflags", s)),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for AmaFlags {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for AmaFlags {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_documentation() {
        assert_eq!(AmaFlags::default(), AmaFlags::Documentation);
    }

    #[test]
    fn unset_flag_renders_unknown() {
        assert_eq!(AmaFlags::None.to_string(), "Unknown");
        assert_eq!("unknown".parse::<AmaFlags>(), Ok(AmaFlags::None));
    }

    #[test]
    fn codes_round_trip() {
        for flag in [
            AmaFlags::None,
            AmaFlags::Omit,
            AmaFlags::Billing,
            AmaFlags::Documentation,
        ] {
            assert_eq!(AmaFlags::from_code(flag.code()), Some(flag));
        }
        assert_eq!(AmaFlags::from_code(7), None);
    }
}
