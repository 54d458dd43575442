//! `WhiteClock` / `BlackClock` tag values in `H:MM:SS.mmm` form.

use regex::Regex;
use std::sync::LazyLock;

static CLOCK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}).(\d\d).(\d\d).(\d\d\d)").expect("clock tag pattern is valid")
});

const MS_PER_SECOND: u64 = 1_000;
const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;

/// Formats remaining clock time as `H:MM:SS.mmm`.
pub fn encode_clock(ms: u64) -> String {
    let hours = ms / MS_PER_HOUR;
    let minutes = (ms % MS_PER_HOUR) / MS_PER_MINUTE;
    let seconds = (ms % MS_PER_MINUTE) / MS_PER_SECOND;
    let millis = ms % MS_PER_SECOND;
    format!("{hours}:{minutes:02}:{seconds:02}.{millis:03}")
}

/// Parses a clock tag value back into milliseconds.
///
/// Returns `None` when the text does not start with the fixed
/// `\d{1,2}.\d\d.\d\d.\d\d\d` shape; whether that is fatal is up to the caller.
pub fn decode_clock(tag: &str) -> Option<u64> {
    let caps = CLOCK_TAG.captures(tag)?;
    let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u64>().ok());

    let hours = field(1)?;
    let minutes = field(2)?;
    let seconds = field(3)?;
    let millis = field(4)?;
    Some(hours * MS_PER_HOUR + minutes * MS_PER_MINUTE + seconds * MS_PER_SECOND + millis)
}
