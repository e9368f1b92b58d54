//! Value formatting applied before substitution.
//!
//! Values for keys that name a date (e.g. `#sana`, `#start_date`) are
//! reparsed and rendered in a long localized form. Anything that does not
//! parse is substituted verbatim.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Default words that mark a key as a date (Uzbek, English, Russian).
pub const DEFAULT_DATE_KEYWORDS: [&str; 3] = ["sana", "date", "дата"];

/// Candidate input patterns, tried in order; the first that parses wins.
pub const DATE_INPUT_PATTERNS: [&str; 15] = [
    "dd-MM-yyyy",
    "dd/MM/yyyy",
    "dd.MM.yyyy",
    "yyyy-MM-dd",
    "yyyy/MM/dd",
    "yyyy.MM.dd",
    "dd-MM-yy",
    "dd/MM/yy",
    "dd.MM.yy",
    "d-M-yyyy",
    "d/M/yyyy",
    "d.M.yyyy",
    "d-M-yy",
    "d/M/yy",
    "d.M.yy",
];

/// Output language of the long date form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateLocale {
    #[default]
    Uz,
    Ru,
    En,
}

impl DateLocale {
    fn month_names(&self) -> &'static [&'static str; 12] {
        match self {
            Self::Uz => &[
                "yanvar", "fevral", "mart", "aprel", "may", "iyun", "iyul", "avgust", "sentabr",
                "oktabr", "noyabr", "dekabr",
            ],
            Self::Ru => &[
                "января", "февраля", "марта", "апреля", "мая", "июня", "июля", "августа",
                "сентября", "октября", "ноября", "декабря",
            ],
            Self::En => &[
                "January", "February", "March", "April", "May", "June", "July", "August",
                "September", "October", "November", "December",
            ],
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            Self::Uz => "yil",
            Self::Ru => "г.",
            Self::En => "",
        }
    }

    /// Renders `date` as day, month name, four-digit year and suffix.
    ///
    /// English has no year suffix word, so its form ends at the year:
    /// `9 December 2023`.
    pub fn long_form(&self, date: NaiveDate) -> String {
        let month = self.month_names()[date.month0() as usize];
        let base = format!("{} {} {:04}", date.day(), month, date.year());
        match self.suffix() {
            "" => base,
            suffix => format!("{} {}", base, suffix),
        }
    }
}

/// Field order of a candidate pattern.
#[derive(Debug, Clone, Copy)]
enum FieldOrder {
    DayMonthYear,
    YearMonthDay,
}

/// A compiled candidate input pattern.
#[derive(Debug)]
struct DatePattern {
    source: &'static str,
    regex: Regex,
    order: FieldOrder,
    two_digit_year: bool,
}

impl DatePattern {
    /// Compiles pattern notation (`dd`, `d`, `MM`, `M`, `yyyy`, `yy`, separators).
    fn compile(source: &'static str) -> Self {
        let order = if source.starts_with('y') {
            FieldOrder::YearMonthDay
        } else {
            FieldOrder::DayMonthYear
        };
        let two_digit_year = !source.contains("yyyy");

        let mut expr = String::from("^");
        let mut chars = source.chars().peekable();
        while let Some(c) = chars.next() {
            let mut width = 1;
            while chars.peek() == Some(&c) {
                chars.next();
                width += 1;
            }
            match (c, width) {
                ('d', 1) | ('M', 1) => expr.push_str(r"(\d{1,2})"),
                ('d', 2) | ('M', 2) | ('y', 2) => expr.push_str(r"(\d{2})"),
                ('y', 4) => expr.push_str(r"(\d{4})"),
                (sep, _) => {
                    for _ in 0..width {
                        expr.push_str(&regex::escape(&sep.to_string()));
                    }
                }
            }
        }
        expr.push('$');

        Self {
            source,
            regex: Regex::new(&expr).expect("Valid date pattern regex"),
            order,
            two_digit_year,
        }
    }

    fn parse(&self, value: &str) -> Option<NaiveDate> {
        let caps = self.regex.captures(value)?;
        let field = |i: usize| caps.get(i)?.as_str().parse::<u32>().ok();
        let (day, month, year) = match self.order {
            FieldOrder::DayMonthYear => (field(1)?, field(2)?, field(3)?),
            FieldOrder::YearMonthDay => (field(3)?, field(2)?, field(1)?),
        };
        let year = if self.two_digit_year { 2000 + year } else { year };
        NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)
    }
}

fn candidate_patterns() -> &'static [DatePattern] {
    static PATTERNS: Lazy<Vec<DatePattern>> = Lazy::new(|| {
        DATE_INPUT_PATTERNS
            .iter()
            .map(|source| DatePattern::compile(*source))
            .collect()
    });
    &PATTERNS
}

/// Parses `value` with the first candidate pattern that accepts it.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    candidate_patterns().iter().find_map(|pattern| {
        let parsed = pattern.parse(value);
        if parsed.is_some() {
            tracing::trace!(pattern = pattern.source, value, "date pattern matched");
        }
        parsed
    })
}

/// Decides whether and how a raw value is reformatted for its key.
#[derive(Debug, Clone)]
pub struct ValueFormatter {
    locale: DateLocale,
    date_keywords: Vec<String>,
}

impl Default for ValueFormatter {
    fn default() -> Self {
        Self::new(DateLocale::default())
    }
}

impl ValueFormatter {
    pub fn new(locale: DateLocale) -> Self {
        Self {
            locale,
            date_keywords: DEFAULT_DATE_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replaces the date-indicating words; they are matched lower-cased.
    pub fn with_date_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.date_keywords = keywords
            .into_iter()
            .map(|k| k.into().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        self
    }

    pub fn locale(&self) -> DateLocale {
        self.locale
    }

    /// Returns true when the key names a date.
    pub fn is_date_key(&self, key: &str) -> bool {
        let name = key.strip_prefix('#').unwrap_or(key).to_lowercase();
        self.date_keywords.iter().any(|word| name.contains(word.as_str()))
    }

    /// Value to substitute for `key`.
    pub fn format<'a>(&self, key: &str, raw: &'a str) -> Cow<'a, str> {
        if !self.is_date_key(key) {
            return Cow::Borrowed(raw);
        }
        match parse_date(raw) {
            Some(date) => Cow::Owned(self.locale.long_form(date)),
            None => Cow::Borrowed(raw),
        }
    }
}
