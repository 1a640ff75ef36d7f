//! Trailing command argument parsing: optional duration, then free-text reason.

use crate::db::DEFAULT_REASON;
use chrono::Duration;
use regex::Regex;
use std::sync::LazyLock;

static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^([0-9]+)([smhdw])$").expect("duration pattern is valid"));

/// Parse a duration token: `30s`, `10m`, `2h`, `1d`, `1w` (any case), or a
/// bare integer meaning minutes.
///
/// Returns `None` for anything else, including values that overflow.
pub fn parse_duration(token: &str) -> Option<Duration> {
    let (value, unit) = match DURATION_RE.captures(token) {
        Some(caps) => {
            let value: i64 = caps[1].parse().ok()?;
            let unit = caps[2].to_ascii_lowercase();
            (value, unit)
        }
        None => {
            if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            (token.parse().ok()?, "m".to_string())
        }
    };

    match unit.as_str() {
        "s" => Duration::try_seconds(value),
        "m" => Duration::try_minutes(value),
        "h" => Duration::try_hours(value),
        "d" => Duration::try_days(value),
        "w" => Duration::try_weeks(value),
        _ => None,
    }
}

/// Parsed trailing arguments of a moderation command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModArgs {
    /// `None` means permanent. A zero-length duration is also permanent.
    pub duration: Option<Duration>,
    /// The token the duration was parsed from, as typed.
    pub duration_token: Option<String>,
    pub reason: String,
}

/// Split tokens into an optional leading duration and a reason.
pub fn parse_mod_args(tokens: &[String]) -> ModArgs {
    let (duration, duration_token, rest) = match tokens.split_first() {
        Some((first, rest)) => match parse_duration(first) {
            Some(duration) => {
                let duration = (duration > Duration::zero()).then_some(duration);
                (duration, Some(first.clone()), rest)
            }
            None => (None, None, tokens),
        },
        None => (None, None, tokens),
    };

    ModArgs {
        duration,
        duration_token,
        reason: parse_reason(rest),
    }
}

/// Join tokens into a reason, or the default text when there are none.
pub fn parse_reason(tokens: &[String]) -> String {
    let reason = tokens
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if reason.is_empty() {
        DEFAULT_REASON.to_string()
    } else {
        reason
    }
}

/// Join tokens into free text, or `None` when there are none.
pub fn parse_text(tokens: &[String]) -> Option<String> {
    let text = tokens.join(" ");
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Render a duration as `1d, 2h, 3m, 4s`, omitting zero components.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds();
    if total <= 0 {
        return "0s".to_string();
    }

    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    [(days, "d"), (hours, "h"), (minutes, "m"), (seconds, "s")]
        .into_iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| format!("{}{}", n, unit))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn duration_units() {
        assert_eq!(parse_duration("30m"), Some(Duration::minutes(30)));
        assert_eq!(parse_duration("2h"), Some(Duration::hours(2)));
        assert_eq!(parse_duration("45s"), Some(Duration::seconds(45)));
        assert_eq!(parse_duration("3d"), Some(Duration::days(3)));
        assert_eq!(parse_duration("1W"), Some(Duration::weeks(1)));
    }

    #[test]
    fn bare_integer_is_minutes() {
        assert_eq!(parse_duration("10"), Some(Duration::minutes(10)));
    }

    #[test]
    fn non_durations_are_rejected() {
        for token in ["abc", "", "10x", "m", "1h30m", "-5m", "99999999999999999999w"] {
            assert_eq!(parse_duration(token), None, "token {:?}", token);
        }
    }

    #[test]
    fn leading_duration_is_consumed() {
        let args = parse_mod_args(&toks("2h flooding the room"));
        assert_eq!(args.duration, Some(Duration::hours(2)));
        assert_eq!(args.duration_token.as_deref(), Some("2h"));
        assert_eq!(args.reason, "flooding the room");
    }

    #[test]
    fn non_duration_is_folded_into_reason() {
        let args = parse_mod_args(&toks("abc spam"));
        assert_eq!(args.duration, None);
        assert_eq!(args.reason, "abc spam");
    }

    #[test]
    fn empty_remainder_uses_default_reason() {
        assert_eq!(parse_mod_args(&[]).reason, DEFAULT_REASON);
        assert_eq!(parse_mod_args(&toks("30m")).reason, DEFAULT_REASON);
    }

    #[test]
    fn zero_duration_is_permanent() {
        let args = parse_mod_args(&toks("0m rude"));
        assert_eq!(args.duration, None);
        assert_eq!(args.duration_token.as_deref(), Some("0m"));
        assert_eq!(args.reason, "rude");
    }

    #[test]
    fn format_omits_zero_parts() {
        let d = Duration::days(1) + Duration::hours(2) + Duration::minutes(3);
        assert_eq!(format_duration(d), "1d, 2h, 3m");
        assert_eq!(format_duration(Duration::seconds(59)), "59s");
        assert_eq!(format_duration(Duration::zero()), "0s");
    }
}
