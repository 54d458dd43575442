use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

use crate::error::ErrorAccumulator;

static TAG_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[([a-zA-Z]+)\s+"(.+?)"\]"#).expect("tag pair pattern is valid")
});

static FULL_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4}).(\d{2}).(\d{2})").expect("date pattern is valid"));

/// Tag pairs of one game in header order.
///
/// Keys are case-sensitive. When a header repeats a key, the first
/// occurrence is the one that counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags {
    pairs: Vec<(String, String)>,
}

impl Tags {
    /// Extracts every `[Key "Value"]` pair from a raw header block.
    pub fn parse(header: &str) -> Self {
        let mut tags = Self::default();
        for caps in TAG_PAIR.captures_iter(header) {
            let (Some(key), Some(value)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            if tags.get(key.as_str()).is_none() {
                tags.pairs.push((key.as_str().to_string(), value.as_str().to_string()));
            }
        }
        tags
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Looks up a tag, treating an empty value as missing.
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// Sets `key`, replacing an existing value in place.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value,
            None => self.pairs.push((key.to_string(), value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Splits a `Date` tag into `(year, month, day)`.
///
/// Each `.`-separated field that is not a plain number (`????`, `??`) is
/// taken from `today` instead.
pub fn date_fields(value: Option<&str>, today: NaiveDate) -> (i32, u32, u32) {
    let mut year = today.year();
    let mut month = today.month();
    let mut day = today.day();

    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return (year, month, day);
    };

    let mut parts = value.split('.');
    if let Some(y) = parts.next().and_then(numeric::<i32>) {
        year = y;
    }
    if let Some(m) = parts.next().and_then(numeric::<u32>) {
        month = m;
    }
    if let Some(d) = parts.next().and_then(numeric::<u32>) {
        day = d;
    }
    (year, month, day)
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn numeric<T: std::str::FromStr>(s: &str) -> Option<T> {
    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

/// Reads a complete `YYYY.MM.DD` date out of a `Date` tag.
///
/// Partial dates (`2024.??.??`) yield `None` quietly; a complete but
/// impossible date is recorded on `diagnostics`.
pub fn parse_full_date(value: &str, diagnostics: &mut ErrorAccumulator) -> Option<NaiveDate> {
    let caps = FULL_DATE.captures(value)?;
    let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    let (year, month, day) = (field(1)?, field(2)?, field(3)?);
    let date = i32::try_from(year)
        .ok()
        .and_then(|year| NaiveDate::from_ymd_opt(year, month, day));
    if date.is_none() {
        diagnostics.push(format!(
            "Conversion error: Date='{value}' (chrono: input is out of range)"
        ));
    }
    date
}

/// Formats the `Date` tag written for a game.
///
/// Numeric `Year`/`Month`/`Day` tags take precedence; otherwise the stored
/// `Date` is used, and `????.??.??` when there is none.
pub fn format_date_tag(tags: &Tags) -> String {
    let ymd = (
        tags.get("Year").and_then(numeric::<i32>),
        tags.get("Month").and_then(numeric::<u32>),
        tags.get("Day").and_then(numeric::<u32>),
    );
    if let (Some(year), Some(month), Some(day)) = ymd {
        return format!("{year:04}.{month:02}.{day:02}");
    }
    tags.non_empty("Date").unwrap_or("????.??.??").to_string()
}
