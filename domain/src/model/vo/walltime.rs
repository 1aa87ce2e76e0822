use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer};

/// A wall-clock limit. Accepts the scheduler spellings `D-HH:MM:SS`,
/// `HH:MM:SS`, `MM:SS` and plain minutes; displays as `HH:MM:SS`, or
/// `D-HH:MM:SS` once a full day is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WallTime {
    secs: u64,
}

impl WallTime {
    pub fn from_secs(secs: u64) -> Self {
        Self { secs }
    }

    pub fn as_secs(self) -> u64 {
        self.secs
    }

    /// `HH:MM:SS` with unbounded hours, the form PBS expects for `walltime`.
    pub fn hms(self) -> String {
        let hours = self.secs / 3600;
        let minutes = self.secs % 3600 / 60;
        let seconds = self.secs % 60;
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid wall time {0:?}, expected [D-]HH:MM:SS, MM:SS or minutes")]
pub struct ParseWallTimeError(String);

impl FromStr for WallTime {
    type Err = ParseWallTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseWallTimeError(s.to_owned());

        let (days, rest) = match s.split_once('-') {
            Some((d, rest)) => (d.parse::<u64>().map_err(|_| err())?, rest),
            None => (0, s),
        };
        let fields: Vec<&str> = rest.split(':').collect();
        let parsed: Vec<u64> =
            fields.iter().map(|f| f.parse()).collect::<Result<_, _>>().map_err(|_| err())?;

        if parsed.len() > 1 && parsed[1..].iter().any(|&x| x >= 60) {
            return Err(err());
        }
        let secs = match parsed.as_slice() {
            // A bare number means minutes, as sbatch reads it.
            [m] if days == 0 => hms_secs(0, *m, 0),
            [h, m] if days > 0 => hms_secs(*h, *m, 0),
            [m, s] => hms_secs(0, *m, *s),
            [h, m, s] => hms_secs(*h, *m, *s),
            _ => None,
        };
        // Values large enough to overflow are no more a wall time than
        // non-numeric input.
        days.checked_mul(86_400)
            .and_then(|d| d.checked_add(secs?))
            .map(|secs| Self { secs })
            .ok_or_else(err)
    }
}

fn hms_secs(hours: u64, minutes: u64, seconds: u64) -> Option<u64> {
    hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)
}

impl fmt::Display for WallTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days = self.secs / 86_400;
        let hours = self.secs % 86_400 / 3600;
        let minutes = self.secs % 3600 / 60;
        let seconds = self.secs % 60;
        if days > 0 {
            write!(f, "{days}-{hours:02}:{minutes:02}:{seconds:02}")
        } else {
            write!(f, "{hours:02}:{minutes:02}:{seconds:02}")
        }
    }
}

impl<'de> Deserialize<'de> for WallTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_forms() {
        assert_eq!("12:00:00".parse::<WallTime>().unwrap().as_secs(), 43_200);
        assert_eq!("05:30".parse::<WallTime>().unwrap().as_secs(), 330);
        assert_eq!("90".parse::<WallTime>().unwrap().as_secs(), 5_400);
        assert_eq!(
            "2-00:00:00".parse::<WallTime>().unwrap().as_secs(),
            172_800
        );
        assert_eq!("1-12:30".parse::<WallTime>().unwrap().as_secs(), 131_400);
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<WallTime>().is_err());
        assert!("12:00:00:00".parse::<WallTime>().is_err());
        assert!("aa:bb".parse::<WallTime>().is_err());
        assert!("00:99".parse::<WallTime>().is_err());
    }

    #[test]
    fn rejects_values_that_overflow() {
        // Each of these is syntactically numeric but exceeds u64 seconds.
        for s in [
            "400000000000000000",
            "18446744073709551615:00:00",
            "300000000000000-00:30",
        ] {
            assert_eq!(
                s.parse::<WallTime>(),
                Err(ParseWallTimeError(s.to_owned()))
            );
        }
    }

    #[test]
    fn display_round_trip() {
        for s in ["12:00:00", "00:05:30", "2-01:02:03"] {
            assert_eq!(s.parse::<WallTime>().unwrap().to_string(), s);
        }
    }

    #[test]
    fn hms_has_unbounded_hours() {
        assert_eq!("2-12:00:00".parse::<WallTime>().unwrap().hms(), "60:00:00");
    }
}
