//! Video runtime and its ISO-8601 duration encoding.

use std::fmt;

use chrono::TimeDelta;
use once_cell::sync::Lazy;
use regex::Regex;

const SECONDS_PER_DAY: i64 = 86_400;
const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_MINUTE: i64 = 60;

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^([-+]?)P(?:([-+]?[0-9]+)D)?(T(?:([-+]?[0-9]+)H)?(?:([-+]?[0-9]+)M)?(?:([-+]?[0-9]+)(?:[.,]([0-9]{0,9}))?S)?)?$",
    )
    .expect("failed to compile ISO-8601 duration regex")
});

/// Strictly positive running time of a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Runtime(TimeDelta);

impl Runtime {
    /// Wrap a duration, rejecting zero and negative values.
    pub fn new(duration: TimeDelta) -> Option<Self> {
        (duration > TimeDelta::zero()).then_some(Self(duration))
    }

    /// Runtime of a whole number of minutes.
    pub fn from_minutes(minutes: i64) -> Option<Self> {
        TimeDelta::try_minutes(minutes).and_then(Self::new)
    }

    /// Whole minutes, truncating any remainder.
    pub fn minutes(&self) -> i64 {
        self.0.num_minutes()
    }

    /// Underlying duration.
    pub fn duration(&self) -> TimeDelta {
        self.0
    }
}

/// Canonical form: `PT` followed by the non-zero hour, minute and second parts.
impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.0.num_seconds();
        let nanos = self.0.subsec_nanos();
        let hours = total / SECONDS_PER_HOUR;
        let minutes = (total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
        let seconds = total % SECONDS_PER_MINUTE;

        f.write_str("PT")?;
        if hours != 0 {
            write!(f, "{hours}H")?;
        }
        if minutes != 0 {
            write!(f, "{minutes}M")?;
        }
        if seconds == 0 && nanos == 0 && (hours != 0 || minutes != 0) {
            return Ok(());
        }
        write!(f, "{seconds}")?;
        if nanos > 0 {
            let fraction = format!("{nanos:09}");
            write!(f, ".{}", fraction.trim_end_matches('0'))?;
        }
        f.write_str("S")
    }
}

/// Parse an ISO-8601 duration of the form `PnDTnHnMn.nS`.
///
/// Returns `None` for text that does not match the grammar or overflows.
pub fn parse_duration(text: &str) -> Option<TimeDelta> {
    let caps = DURATION_RE.captures(text)?;
    let has_time = caps.get(3).is_some();
    let days = caps.get(2);
    let hours = caps.get(4);
    let minutes = caps.get(5);
    let seconds = caps.get(6);

    if has_time && hours.is_none() && minutes.is_none() && seconds.is_none() {
        return None;
    }
    if days.is_none() && !has_time {
        return None;
    }

    let total_seconds = component(days, SECONDS_PER_DAY)?
        .checked_add(component(hours, SECONDS_PER_HOUR)?)?
        .checked_add(component(minutes, SECONDS_PER_MINUTE)?)?
        .checked_add(component(seconds, 1)?)?;

    let mut nanos = match caps.get(7) {
        Some(fraction) if !fraction.as_str().is_empty() => {
            format!("{:0<9}", fraction.as_str()).parse::<i64>().ok()?
        }
        _ => 0,
    };
    if seconds.is_some_and(|m| m.as_str().starts_with('-')) {
        nanos = -nanos;
    }

    let delta =
        TimeDelta::try_seconds(total_seconds)?.checked_add(&TimeDelta::nanoseconds(nanos))?;
    if caps.get(1).is_some_and(|m| m.as_str() == "-") {
        TimeDelta::zero().checked_sub(&delta)
    } else {
        Some(delta)
    }
}

fn component(value: Option<regex::Match<'_>>, scale: i64) -> Option<i64> {
    match value {
        Some(m) => m.as_str().parse::<i64>().ok()?.checked_mul(scale),
        None => Some(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form_splits_hours() {
        let runtime = Runtime::from_minutes(90).expect("positive");
        assert_eq!(runtime.to_string(), "PT1H30M");
        assert_eq!(Runtime::from_minutes(45).expect("positive").to_string(), "PT45M");
        assert_eq!(Runtime::from_minutes(120).expect("positive").to_string(), "PT2H");
    }

    #[test]
    fn seconds_and_fractions_are_written() {
        let runtime = Runtime::new(TimeDelta::milliseconds(61_500)).expect("positive");
        assert_eq!(runtime.to_string(), "PT1M1.5S");
        let runtime = Runtime::new(TimeDelta::seconds(30)).expect("positive");
        assert_eq!(runtime.to_string(), "PT30S");
    }

    #[test]
    fn parses_equivalent_spellings() {
        let expected = TimeDelta::minutes(90);
        assert_eq!(parse_duration("PT90M"), Some(expected));
        assert_eq!(parse_duration("PT1H30M"), Some(expected));
        assert_eq!(parse_duration("pt5400s"), Some(expected));
        assert_eq!(parse_duration("PT0S"), Some(TimeDelta::zero()));
        assert_eq!(parse_duration("P1D"), Some(TimeDelta::days(1)));
        assert_eq!(parse_duration("PT1,25S"), Some(TimeDelta::milliseconds(1_250)));
        assert_eq!(parse_duration("-PT5M"), Some(TimeDelta::minutes(-5)));
    }

    #[test]
    fn rejects_malformed_text() {
        for text in ["", "P", "PT", "90", "PT90", "T90M", "PT1.5M", "P1H"] {
            assert_eq!(parse_duration(text), None, "{text} should not parse");
        }
        assert_eq!(parse_duration("PT99999999999999999999S"), None);
    }

    #[test]
    fn non_positive_values_are_not_runtimes() {
        assert!(Runtime::from_minutes(0).is_none());
        assert!(Runtime::from_minutes(-5).is_none());
        assert!(Runtime::new(TimeDelta::zero()).is_none());
        assert_eq!(Runtime::from_minutes(1).map(|r| r.minutes()), Some(1));
    }
}
