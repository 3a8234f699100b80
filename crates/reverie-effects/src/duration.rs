//! Human duration strings such as `"1d 2h"` or `"45m"`.
//!
//! Used by collaborators that open a timed window on an effect record
//! (a ritual that lasts "2h", an item that lasts "1d"). Units are `d`, `h`,
//! `m`, and `s`, case-insensitive, optionally separated from the number by
//! whitespace. Every `<number><unit>` pair found is summed; anything else in
//! the string is ignored.

use chrono::Duration;

/// Parse a duration string. Returns `None` when nothing parses to a
/// positive total, or on overflow.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let mut total = Duration::zero();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        let Some(first) = c.to_digit(10) else {
            continue;
        };
        let mut amount = i64::from(first);
        while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
            amount = amount.checked_mul(10)?.checked_add(i64::from(digit))?;
            chars.next();
        }
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        let part = match chars.peek().map(char::to_ascii_lowercase) {
            Some('d') => Duration::try_days(amount)?,
            Some('h') => Duration::try_hours(amount)?,
            Some('m') => Duration::try_minutes(amount)?,
            Some('s') => Duration::try_seconds(amount)?,
            _ => continue,
        };
        chars.next();
        total = total.checked_add(&part)?;
    }

    (total > Duration::zero()).then_some(total)
}
