//! Call disposition.

use std::fmt;
use std::str::FromStr;

use crate::UnknownName;

/// Final outcome of a call, as recorded by the host.
///
/// The numeric codes match the host's CDR engine. `Null` is what the
/// host records before any outcome is known; it renders the same as
/// `NoAnswer` for backwards compatibility with existing consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Disposition {
    /// The call was not answered.
    #[default]
    NoAnswer,
    /// No outcome was recorded.
    Null,
    /// The call failed.
    Failed,
    /// The far end was busy.
    Busy,
    /// The call was answered.
    Answered,
    /// The network was congested.
    Congestion,
}

impl Disposition {
    /// Canonical string name used in published documents.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Disposition::NoAnswer | Disposition::Null => "NO ANSWER",
            Disposition::Failed => "FAILED",
            Disposition::Busy => "BUSY",
            Disposition::Answered => "ANSWERED",
            Disposition::Congestion => "CONGESTION",
        }
    }

    /// The host's numeric code for this disposition.
    pub const fn code(&self) -> u32 {
        match self {
            Disposition::NoAnswer => 0,
            Disposition::Null => 1,
            Disposition::Failed => 1 << 1,
            Disposition::Busy => 1 << 2,
            Disposition::Answered => 1 << 3,
            Disposition::Congestion => 1 << 4,
        }
    }

    /// Map a host numeric code back to a disposition.
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Disposition::NoAnswer),
            1 => Some(Disposition::Null),
            2 => Some(Disposition::Failed),
            4 => Some(Disposition::Busy),
            8 => Some(Disposition::Answered),
            16 => Some(Disposition::Congestion),
            _ => None,
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Disposition {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NO ANSWER" | "NOANSWER" => Ok(Disposition::NoAnswer),
            "FAILED" => Ok(Disposition::Failed),
            "BUSY" => Ok(Disposition::Busy),
            "ANSWERED" => Ok(Disposition::Answered),
            "CONGESTION" => Ok(Disposition::Congestion),
            _ => Err(UnknownName::new("disposition", s)),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Disposition {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Disposition {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_renders_as_no_answer() {
        assert_eq!(Disposition::Null.as_str(), "NO ANSWER");
        assert_eq!(Disposition::NoAnswer.as_str(), "NO ANSWER");
    }

    #[test]
    fn codes_round_trip() {
        for d in [
            Disposition::NoAnswer,
            Disposition::Null,
            Disposition::Failed,
            Disposition::Busy,
            Disposition::Answered,
            Disposition::Congestion,
        ] {
            assert_eq!(Disposition::from_code(d.code()), Some(d));
        }
        assert_eq!(Disposition::from_code(3), None);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("answered".parse::<Disposition>(), Ok(Disposition::Answered));
        assert_eq!("No Answer".parse::<Disposition>(), Ok(Disposition::NoAnswer));
        assert!("HUNG UP".parse::<Disposition>().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_canonical_name() {
        let json = serde_json::to_string(&Disposition::Busy).unwrap();
        assert_eq!(json, "\"BUSY\"");

        let parsed: Disposition = serde_json::from_str("\"CONGESTION\"").unwrap();
        assert_eq!(parsed, Disposition::Congestion);
    }
}
