//! Small shared primitives for the NextPeek workspace.
//!
//! Every timer-like behavior in NextPeek (show/hide delays, push debounce,
//! optimistic grace windows, seek overrides) is built from the same three
//! pieces: [`DelayGate`], [`Cooldown`] and [`Debouncer`]. They carry no
//! threads and no callbacks; callers feed them the current [`Instant`] on
//! their own cadence and act on the returned booleans.

mod timing;

pub use timing::{Cooldown, Debouncer, DelayGate};

/// Format a millisecond duration as `m:ss`, the way the host player
/// displays track times.
///
/// # Examples
///
/// ```
/// use npkutils::format_time;
///
/// assert_eq!(format_time(0), "0:00");
/// assert_eq!(format_time(91_000), "1:31");
/// ```
pub fn format_time(ms: u64) -> String {
    let total_secs = ms / 1000;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

/// Numeric-aware string comparison.
///
/// Orders `artist_name:2` before `artist_name:10`, matching the host's
/// locale-numeric sort of metadata keys.
pub fn compare_numeric_aware(a: &str, b: &str) -> std::cmp::Ordering {
    let mut ai = a.chars().peekable();
    let mut bi = b.chars().peekable();

    loop {
        match (ai.peek().copied(), bi.peek().copied()) {
            (None, None) => return std::cmp::Ordering::Equal,
            (None, Some(_)) => return std::cmp::Ordering::Less,
            (Some(_), None) => return std::cmp::Ordering::Greater,
            (Some(ca), Some(cb)) => {
                if ca.is_ascii_digit() && cb.is_ascii_digit() {
                    let na = take_number(&mut ai);
                    let nb = take_number(&mut bi);
                    match na.cmp(&nb) {
                        std::cmp::Ordering::Equal => continue,
                        other => return other,
                    }
                }
                match ca.cmp(&cb) {
                    std::cmp::Ordering::Equal => {
                        ai.next();
                        bi.next();
                    }
                    other => return other,
                }
            }
        }
    }
}

fn take_number(iter: &mut std::iter::Peekable<std::str::Chars<'_>>) -> u64 {
    let mut value: u64 = 0;
    while let Some(c) = iter.peek().copied() {
        if let Some(d) = c.to_digit(10) {
            value = value.saturating_mul(10).saturating_add(d as u64);
            iter.next();
        } else {
            break;
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(999), "0:00");
        assert_eq!(format_time(1_000), "0:01");
        assert_eq!(format_time(59_999), "0:59");
        assert_eq!(format_time(60_000), "1:00");
        assert_eq!(format_time(3_723_000), "62:03");
    }

    #[test]
    fn test_compare_numeric_aware() {
        assert_eq!(compare_numeric_aware("a", "a"), Ordering::Equal);
        assert_eq!(
            compare_numeric_aware("artist_name:2", "artist_name:10"),
            Ordering::Less
        );
        assert_eq!(
            compare_numeric_aware("artist_name:10", "artist_name:2"),
            Ordering::Greater
        );
        assert_eq!(compare_numeric_aware("artist_name", "artist_name:1"), Ordering::Less);
    }
}
