use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::BuildLensError;

/// User facing texts that differ between locales.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Text {
    DefaultDescription,
    DefinitionKeyword,
    DefinitionDescription,
    BranchKeyword,
    BranchDescription,
    SourceKeyword,
    SourceDescription,
    StatusKeyword,
    StatusDescription,
    AfterKeyword,
    AfterDescription,
    AfterYesterday,
    BeforeKeyword,
    BeforeDescription,
    BeforeToday,
}

/// Culture used for keywords, short dates and string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    De,
}

impl Locale {
    pub fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::De => "de",
        }
    }

    pub fn text(self, text: Text) -> &'static str {
        match self {
            Locale::En => english(text),
            Locale::De => german(text),
        }
    }

    /// Formats a date the way the locale writes short dates (`6/18/2020`, `18.06.2020`).
    pub fn format_short_date(self, date: NaiveDate) -> String {
        match self {
            Locale::En => format!("{}/{}/{}", date.month(), date.day(), date.year()),
            Locale::De => format!("{:02}.{:02}.{}", date.day(), date.month(), date.year()),
        }
    }

    /// Parses a short date written in this locale.
    ///
    /// Accepts the full short format, the day and month only (the year is taken from
    /// `reference_year`), two digit years, and ISO `yyyy-mm-dd` as a fallback.
    /// Anything else yields `None`.
    pub fn parse_date(self, text: &str, reference_year: i32) -> Option<NaiveDate> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return Some(date);
        }

        let (separator, text) = match self {
            Locale::En => ('/', text),
            Locale::De => ('.', text.strip_suffix('.').unwrap_or(text)),
        };

        let parts: Vec<&str> = text.split(separator).collect();
        if parts
            .iter()
            .any(|p| p.is_empty() || p.len() > 4 || !p.chars().all(|c| c.is_ascii_digit()))
        {
            return None;
        }

        let numbers: Vec<u32> = parts.iter().filter_map(|p| p.parse().ok()).collect();
        let (first, second, year) = match numbers.as_slice() {
            [first, second] => (*first, *second, reference_year),
            [first, second, year] => (*first, *second, expand_year(*year, parts[2].len())?),
            _ => return None,
        };

        let (month, day) = match self {
            Locale::En => (first, second),
            Locale::De => (second, first),
        };

        NaiveDate::from_ymd_opt(year, month, day)
    }

    /// Case-insensitive comparison of two strings.
    pub fn compare_ignore_case(self, a: &str, b: &str) -> Ordering {
        fold(a).cmp(&fold(b)).then_with(|| a.cmp(b))
    }

    pub fn starts_with_ignore_case(self, text: &str, prefix: &str) -> bool {
        fold(text).starts_with(&fold(prefix))
    }

    pub fn eq_ignore_case(self, a: &str, b: &str) -> bool {
        fold(a) == fold(b)
    }
}

fn fold(text: &str) -> String {
    text.to_lowercase()
}

fn expand_year(year: u32, digits: usize) -> Option<i32> {
    let year = i32::try_from(year).ok()?;
    match digits {
        1 | 2 => Some(2000 + year),
        4 => Some(year),
        _ => None,
    }
}

fn english(text: Text) -> &'static str {
    match text {
        Text::DefaultDescription => "Searches all criteria at once",
        Text::DefinitionKeyword => "definition",
        Text::DefinitionDescription => "Builds of a build definition",
        Text::BranchKeyword => "branch",
        Text::BranchDescription => "Builds on a branch",
        Text::SourceKeyword => "source",
        Text::SourceDescription => "Builds from a connection",
        Text::StatusKeyword => "status",
        Text::StatusDescription => "Builds with a status",
        Text::AfterKeyword => "after",
        Text::AfterDescription => "Builds queued after a date",
        Text::AfterYesterday => "yesterday",
        Text::BeforeKeyword => "before",
        Text::BeforeDescription => "Builds queued before a date",
        Text::BeforeToday => "today",
    }
}

fn german(text: Text) -> &'static str {
    match text {
        Text::DefaultDescription => "Durchsucht alle Kriterien gleichzeitig",
        Text::DefinitionKeyword => "definition",
        Text::DefinitionDescription => "Builds einer Build-Definition",
        Text::BranchKeyword => "branch",
        Text::BranchDescription => "Builds auf einem Branch",
        Text::SourceKeyword => "quelle",
        Text::SourceDescription => "Builds einer Verbindung",
        Text::StatusKeyword => "status",
        Text::StatusDescription => "Builds mit einem Status",
        Text::AfterKeyword => "nach",
        Text::AfterDescription => "Builds nach einem Datum",
        Text::AfterYesterday => "gestern",
        Text::BeforeKeyword => "vor",
        Text::BeforeDescription => "Builds vor einem Datum",
        Text::BeforeToday => "heute",
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = BuildLensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let language = s
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        match language.as_str() {
            "en" => Ok(Locale::En),
            "de" => Ok(Locale::De),
            _ => Err(BuildLensError::UnknownLocale(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn formats_short_dates_per_locale() {
        assert_eq!(Locale::En.format_short_date(date(2020, 6, 18)), "6/18/2020");
        assert_eq!(Locale::De.format_short_date(date(2020, 6, 8)), "08.06.2020");
    }

    #[test]
    fn parses_full_english_dates() {
        assert_eq!(Locale::En.parse_date("6/16/2020", 1999), Some(date(2020, 6, 16)));
        assert_eq!(Locale::En.parse_date(" 6/16/20 ", 1999), Some(date(2020, 6, 16)));
    }

    #[test]
    fn partial_dates_use_reference_year() {
        assert_eq!(Locale::En.parse_date("1/5", 2020), Some(date(2020, 1, 5)));
        assert_eq!(Locale::De.parse_date("16.6.", 2020), Some(date(2020, 6, 16)));
    }

    #[test]
    fn rejects_incomplete_or_invalid_dates() {
        assert_eq!(Locale::En.parse_date("1/", 2020), None);
        assert_eq!(Locale::En.parse_date("6", 2020), None);
        assert_eq!(Locale::En.parse_date("13/1/2020", 2020), None);
        assert_eq!(Locale::En.parse_date("yesterday", 2020), None);
        assert_eq!(Locale::En.parse_date("", 2020), None);
    }

    #[test]
    fn iso_dates_parse_in_every_locale() {
        assert_eq!(Locale::De.parse_date("2020-06-16", 1999), Some(date(2020, 6, 16)));
        assert_eq!(Locale::En.parse_date("2020-06-16", 1999), Some(date(2020, 6, 16)));
    }

    #[test]
    fn locale_codes_parse_with_region() {
        assert_eq!("en-US".parse::<Locale>().unwrap(), Locale::En);
        assert_eq!("de_DE".parse::<Locale>().unwrap(), Locale::De);
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn comparison_ignores_case() {
        assert!(Locale::En.eq_ignore_case("Main", "mAIN"));
        assert!(Locale::En.starts_with_ignore_case("Definition", "DEF"));
        assert_eq!(Locale::En.compare_ignore_case("alpha", "Beta"), Ordering::Less);
    }
}
