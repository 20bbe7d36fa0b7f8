//! Date phrase normalization
//!
//! Turns relative phrases ("yesterday", "last week", "past 3 days") into
//! inclusive ISO date ranges. The store only does exact string matches, so
//! range expansion happens here before SQL is written.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use regex::Regex;
use std::sync::OnceLock;

const ISO: &str = "%Y-%m-%d";

/// Inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn single(day: NaiveDate) -> Self {
        Self::new(day, day)
    }

    pub fn is_single_day(&self) -> bool {
        self.start == self.end
    }

    pub fn start_iso(&self) -> String {
        self.start.format(ISO).to_string()
    }

    pub fn end_iso(&self) -> String {
        self.end.format(ISO).to_string()
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_single_day() {
            write!(f, "{}", self.start_iso())
        } else {
            write!(f, "{} to {}", self.start_iso(), self.end_iso())
        }
    }
}

pub fn parse_iso(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), ISO).ok()
}

/// Resolve a single date phrase relative to `today`
pub fn resolve_phrase(phrase: &str, today: NaiveDate) -> Option<DateRange> {
    let phrase = phrase
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    if let Some(day) = parse_iso(&phrase) {
        return Some(DateRange::single(day));
    }

    match phrase.as_str() {
        "today" | "tonight" | "this morning" | "this afternoon" | "this evening" => {
            return Some(DateRange::single(today))
        }
        "yesterday" | "last night" => return days_before(today, 1).map(DateRange::single),
        "this week" => return Some(DateRange::new(week_start(today)?, today)),
        "last week" => {
            let start = days_before(week_start(today)?, 7)?;
            return Some(DateRange::new(start, start.checked_add_days(Days::new(6))?));
        }
        "this month" => return Some(DateRange::new(month_start(today), today)),
        "last month" => {
            let end = days_before(month_start(today), 1)?;
            return Some(DateRange::new(month_start(end), end));
        }
        _ => {}
    }

    let words: Vec<&str> = phrase.split(' ').collect();
    match words.as_slice() {
        // "last 7 days", "past three days"
        ["last" | "past", n, "days" | "day"] => {
            let n = count(n)?;
            if n == 0 {
                return None;
            }
            Some(DateRange::new(days_before(today, n - 1)?, today))
        }
        // "3 days ago"
        [n, "days" | "day", "ago"] => days_before(today, count(n)?).map(DateRange::single),
        // "monday", "on monday": most recent, today included
        [day] | ["on", day] => {
            let weekday = weekday(day)?;
            previous_weekday(today, weekday, true).map(DateRange::single)
        }
        // "last monday": most recent, today excluded
        ["last", day] => {
            let weekday = weekday(day)?;
            previous_weekday(today, weekday, false).map(DateRange::single)
        }
        _ => None,
    }
}

fn phrase_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?ix)\b(
                \d{4}-\d{2}-\d{2}
              | today | tonight | yesterday | last\ night
              | this\ (?:week|month|morning|afternoon|evening)
              | last\ (?:week|month)
              | (?:last|past)\ \w+\ days?
              | \w+\ days?\ ago
              | (?:last\ |on\ )?(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday)
            )\b",
        )
        .expect("valid regex")
    })
}

/// Every resolvable date phrase in `text`, in order of appearance
pub fn date_hints(text: &str, today: NaiveDate) -> Vec<(String, DateRange)> {
    let mut hints: Vec<(String, DateRange)> = vec![];
    for m in phrase_pattern().find_iter(text) {
        let phrase = m.as_str().to_lowercase();
        if hints.iter().any(|(p, _)| *p == phrase) {
            continue;
        }
        if let Some(range) = resolve_phrase(&phrase, today) {
            hints.push((phrase, range));
        }
    }
    hints
}

/// `None` when the result falls outside chrono's calendar
fn days_before(day: NaiveDate, n: u64) -> Option<NaiveDate> {
    day.checked_sub_days(Days::new(n))
}

fn week_start(day: NaiveDate) -> Option<NaiveDate> {
    days_before(day, u64::from(day.weekday().num_days_from_monday()))
}

fn month_start(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

fn previous_weekday(today: NaiveDate, target: Weekday, include_today: bool) -> Option<NaiveDate> {
    let today_idx = today.weekday().num_days_from_monday();
    let target_idx = target.num_days_from_monday();
    let mut back = (today_idx + 7 - target_idx) % 7;
    if back == 0 && !include_today {
        back = 7;
    }
    days_before(today, u64::from(back))
}

fn weekday(word: &str) -> Option<Weekday> {
    match word {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

fn count(word: &str) -> Option<u64> {
    if let Ok(n) = word.parse::<u64>() {
        return Some(n);
    }
    let n = match word {
        "a" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "fourteen" => 14,
        "thirty" => 30,
        _ => return None,
    };
    Some(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Thursday
    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 12).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, d).unwrap()
    }

    #[test]
    fn test_simple_phrases() {
        assert_eq!(resolve_phrase("today", today()), Some(DateRange::single(day(12))));
        assert_eq!(resolve_phrase("Yesterday", today()), Some(DateRange::single(day(11))));
        assert_eq!(
            resolve_phrase("2024-12-01", today()),
            Some(DateRange::single(day(1)))
        );
        assert_eq!(resolve_phrase("someday", today()), None);
    }

    #[test]
    fn test_weeks() {
        assert_eq!(
            resolve_phrase("this week", today()),
            Some(DateRange::new(day(9), day(12)))
        );
        assert_eq!(
            resolve_phrase("last  week", today()),
            Some(DateRange::new(day(2), day(8)))
        );
    }

    #[test]
    fn test_months() {
        assert_eq!(
            resolve_phrase("this month", today()),
            Some(DateRange::new(day(1), day(12)))
        );
        assert_eq!(
            resolve_phrase("last month", today()),
            Some(DateRange::new(
                NaiveDate::from_ymd_opt(2024, 11, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 11, 30).unwrap()
            ))
        );

        // January rolls back into the previous year
        let jan = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert_eq!(
            resolve_phrase("last month", jan),
            Some(DateRange::new(day(1), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()))
        );
    }

    #[test]
    fn test_day_counts() {
        assert_eq!(
            resolve_phrase("last 7 days", today()),
            Some(DateRange::new(day(6), day(12)))
        );
        assert_eq!(
            resolve_phrase("past three days", today()),
            Some(DateRange::new(day(10), day(12)))
        );
        assert_eq!(resolve_phrase("last 0 days", today()), None);
        assert_eq!(
            resolve_phrase("2 days ago", today()),
            Some(DateRange::single(day(10)))
        );
    }

    #[test]
    fn test_day_count_bounds() {
        assert_eq!(
            resolve_phrase("a day ago", today()),
            Some(DateRange::single(day(11)))
        );
        assert_eq!(resolve_phrase("last 100000000 days", today()), None);
        assert_eq!(resolve_phrase("100000000 days ago", today()), None);
        let max = format!("past {} days", i64::MAX);
        assert_eq!(resolve_phrase(&max, today()), None);
        let max = format!("{} days ago", u64::MAX);
        assert_eq!(resolve_phrase(&max, today()), None);
        assert_eq!(resolve_phrase("-3 days ago", today()), None);
    }

    #[test]
    fn test_calendar_edges() {
        assert_eq!(resolve_phrase("yesterday", NaiveDate::MIN), None);
        assert_eq!(resolve_phrase("last week", NaiveDate::MIN), None);
        assert_eq!(
            resolve_phrase("today", NaiveDate::MIN),
            Some(DateRange::single(NaiveDate::MIN))
        );
    }

    #[test]
    fn test_date_hints_skip_unresolvable_counts() {
        assert!(date_hints("What did I eat 100000000 days ago?", today()).is_empty());
        let hints = date_hints("Protein over the last 100000000 days vs yesterday", today());
        assert_eq!(hints, vec![("yesterday".to_string(), DateRange::single(day(11)))]);
    }

    #[test]
    fn test_weekdays() {
        assert_eq!(resolve_phrase("monday", today()), Some(DateRange::single(day(9))));
        assert_eq!(resolve_phrase("on Thursday", today()), Some(DateRange::single(day(12))));
        assert_eq!(
            resolve_phrase("last thursday", today()),
            Some(DateRange::single(day(5)))
        );
        assert_eq!(resolve_phrase("friday", today()), Some(DateRange::single(day(6))));
    }

    #[test]
    fn test_date_hints_scans_text() {
        let hints = date_hints(
            "How much protein did I eat last week compared to yesterday? And last week again.",
            today(),
        );
        assert_eq!(
            hints,
            vec![
                ("last week".to_string(), DateRange::new(day(2), day(8))),
                ("yesterday".to_string(), DateRange::single(day(11))),
            ]
        );

        let hints = date_hints("Average iron over the past 14 days", today());
        assert_eq!(hints.len(), 1);
        assert_eq!(hints[0].0, "past 14 days");
        assert_eq!(
            hints[0].1,
            DateRange::new(NaiveDate::from_ymd_opt(2024, 11, 29).unwrap(), day(12))
        );

        let hints = date_hints("What did I have on Monday?", today());
        assert_eq!(hints, vec![("on monday".to_string(), DateRange::single(day(9)))]);
        assert!(date_hints("What is a good source of zinc?", today()).is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(DateRange::single(day(1)).to_string(), "2024-12-01");
        assert_eq!(DateRange::new(day(1), day(7)).to_string(), "2024-12-01 to 2024-12-07");
    }
}
