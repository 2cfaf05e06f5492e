//! Timestamp-based unique identifiers.
//!
//! A TUID names one recorded experiment and has the form
//! `YYYYmmDD-HHMMSS-mmm-xxxxxx`: a second-resolution local timestamp, a
//! millisecond field, and six hex characters of randomness to disambiguate
//! experiments started within the same millisecond. Lexicographic order of
//! TUIDs equals chronological order, which is what makes "the latest TUID"
//! a plain maximum over directory names.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{StationError, StationResult};

const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Identifier of one recorded experiment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tuid(String);

impl Tuid {
    /// Generate a TUID for the current local time.
    pub fn now() -> Self {
        Self::from_datetime(Local::now())
    }

    /// Build a TUID from an explicit timestamp (tests use this to construct
    /// ordered histories).
    pub fn from_datetime(when: DateTime<Local>) -> Self {
        let suffix: u32 = rand::random::<u32>() & 0x00ff_ffff;
        Tuid(format!(
            "{}-{:03}-{:06x}",
            when.format(TIMESTAMP_FORMAT),
            when.timestamp_subsec_millis(),
            suffix
        ))
    }

    /// Parse and validate a TUID string.
    pub fn parse(s: &str) -> StationResult<Self> {
        // YYYYmmDD-HHMMSS-mmm-xxxxxx
        if s.len() != 26 || !s.is_ascii() {
            return Err(StationError::MalformedTuid(s.to_string()));
        }
        let (stamp, rest) = s.split_at(15);
        NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT)
            .map_err(|_| StationError::MalformedTuid(s.to_string()))?;

        let mut parts = rest.strip_prefix('-').unwrap_or("").splitn(2, '-');
        let millis_ok = parts
            .next()
            .map(|m| m.len() == 3 && m.bytes().all(|b| b.is_ascii_digit()))
            .unwrap_or(false);
        let suffix_ok = parts
            .next()
            .map(|x| x.len() == 6 && x.bytes().all(|b| b.is_ascii_hexdigit()))
            .unwrap_or(false);
        if !millis_ok || !suffix_ok {
            return Err(StationError::MalformedTuid(s.to_string()));
        }
        Ok(Tuid(s.to_string()))
    }

    /// The timestamp encoded in this TUID.
    pub fn timestamp(&self) -> StationResult<DateTime<Local>> {
        let naive = NaiveDateTime::parse_from_str(&self.0[..15], TIMESTAMP_FORMAT)
            .map_err(|_| StationError::MalformedTuid(self.0.clone()))?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| StationError::MalformedTuid(self.0.clone()))
    }

    /// The `YYYYmmDD` date prefix, which names the daily container directory.
    pub fn date_prefix(&self) -> &str {
        &self.0[..8]
    }

    /// The full identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Tuid {
    type Err = StationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tuid::parse(s)
    }
}

impl TryFrom<String> for Tuid {
    type Error = StationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Tuid::parse(&value)
    }
}

impl From<Tuid> for String {
    fn from(value: Tuid) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tuid_round_trips() {
        let tuid = Tuid::now();
        let parsed = Tuid::parse(tuid.as_str()).unwrap();
        assert_eq!(tuid, parsed);
        assert_eq!(tuid.date_prefix().len(), 8);
    }

    #[test]
    fn known_good_tuid_parses() {
        let tuid = Tuid::parse("20230117-143522-481-9c5a1f").unwrap();
        assert_eq!(tuid.date_prefix(), "20230117");
        assert_eq!(tuid.to_string(), "20230117-143522-481-9c5a1f");
    }

    #[test]
    fn malformed_tuids_rejected() {
        for bad in [
            "",
            "20230117",
            "20230117-143522-481",          // missing suffix
            "20230117-143522-48x-9c5a1f",   // non-digit millis
            "20230117-143522-481-9c5a1g",   // non-hex suffix
            "20231341-143522-481-9c5a1f",   // month 13
            "20230117_143522-481-9c5a1f",   // wrong separator
        ] {
            assert!(Tuid::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn ordering_is_chronological() {
        let early = Tuid::parse("20230117-090000-000-000000").unwrap();
        let late = Tuid::parse("20230117-230000-000-000000").unwrap();
        let next_day = Tuid::parse("20230118-010000-000-000000").unwrap();
        assert!(early < late);
        assert!(late < next_day);
    }

    #[test]
    fn serde_round_trip_and_reject() {
        let tuid = Tuid::parse("20230117-143522-481-9c5a1f").unwrap();
        let json = serde_json::to_string(&tuid).unwrap();
        assert_eq!(json, "\"20230117-143522-481-9c5a1f\"");
        let back: Tuid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tuid);
        assert!(serde_json::from_str::<Tuid>("\"nonsense\"").is_err());
    }
}
