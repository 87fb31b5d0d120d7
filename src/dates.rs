//! Date extraction against OCR text: six regex patterns, deduplicated by
//! (year, month, day), gated to [1800, current year].
//!
//! Patterns and evaluation order are taken verbatim from `extractDates` in
//! `original_source/dates.go`.

use std::collections::HashSet;
use std::sync::OnceLock;

use chrono::{Datelike, TimeZone, Utc};
use regex::Regex;

const MONTH_NAMES: &str = "January|Jan|February|Feb|March|Mar|April|Apr|May|June|Jun|July|Jul|August|Aug|September|Sep|October|Oct|November|Nov|December|Dec";

fn month_from_str(s: &str) -> Option<u32> {
    match s.to_lowercase().as_str() {
        "jan" | "january" | "01" | "1" => Some(1),
        "feb" | "february" | "02" | "2" => Some(2),
        "mar" | "march" | "03" | "3" => Some(3),
        "apr" | "april" | "04" | "4" => Some(4),
        "may" | "05" => Some(5),
        "jun" | "june" | "06" | "6" => Some(6),
        "jul" | "july" | "07" | "7" => Some(7),
        "aug" | "august" | "08" | "8" => Some(8),
        "sep" | "september" | "09" | "9" => Some(9),
        "oct" | "october" | "10" => Some(10),
        "nov" | "november" | "11" => Some(11),
        "dec" | "december" | "12" => Some(12),
        _ => None,
    }
}

struct DatePatterns {
    day_month_year: Regex,
    m_d_y: Regex,
    month_year_comma: Regex,
    month_year: Regex,
    month_day_year: Regex,
    bare_year: Regex,
}

static PATTERNS: OnceLock<DatePatterns> = OnceLock::new();

fn patterns() -> &'static DatePatterns {
    PATTERNS.get_or_init(|| DatePatterns {
        day_month_year: Regex::new(&format!(
            r"(?i)(\d{{1,2}})(st|nd|rd|th)?\s(?:of\s)?({MONTH_NAMES}),?\s(\d{{2,4}})"
        ))
        .unwrap(),
        m_d_y: Regex::new(r"(?i)(\d{1,2})/(\d{1,2})/(\d{2,4})").unwrap(),
        month_year_comma: Regex::new(&format!(r"(?i)({MONTH_NAMES}),?\s(\d{{2,4}})")).unwrap(),
        month_year: Regex::new(&format!(r"(?i)({MONTH_NAMES})\s(\d{{4}})")).unwrap(),
        month_day_year: Regex::new(&format!(
            r"(?i)({MONTH_NAMES})\s(\d{{1,2}})(st|nd|rd|th)?,?\s(\d{{2,4}})"
        ))
        .unwrap(),
        bare_year: Regex::new(r"(\d{4})").unwrap(),
    })
}

fn ymd_utc(year: i32, month: u32, day: u32) -> Option<chrono::DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).single()
}

/// Extract and deduplicate dates mentioned in `text`, per spec §4.5/§8.
pub fn extract_dates(text: &str) -> Vec<chrono::DateTime<Utc>> {
    let p = patterns();
    let mut dates: Vec<chrono::DateTime<Utc>> = Vec::new();

    for caps in p.day_month_year.captures_iter(text) {
        let day: u32 = match caps.get(1).and_then(|m| m.as_str().parse().ok()) {
            Some(d) => d,
            None => continue,
        };
        let month = match month_from_str(&caps[3]) {
            Some(m) => m,
            None => continue,
        };
        let year: i32 = match caps.get(4).and_then(|m| m.as_str().parse().ok()) {
            Some(y) => y,
            None => continue,
        };
        if let Some(dt) = ymd_utc(year, month, day) {
            dates.push(dt);
        }
    }

    for caps in p.m_d_y.captures_iter(text) {
        let month: u32 = match caps.get(1).and_then(|m| m.as_str().parse().ok()) {
            Some(m) => m,
            None => continue,
        };
        let day: u32 = match caps.get(2).and_then(|m| m.as_str().parse().ok()) {
            Some(d) => d,
            None => continue,
        };
        let year: i32 = match caps.get(3).and_then(|m| m.as_str().parse().ok()) {
            Some(y) => y,
            None => continue,
        };
        if let Some(dt) = ymd_utc(year, month, day) {
            dates.push(dt);
        }
    }

    for caps in p.month_year_comma.captures_iter(text) {
        let month = match month_from_str(&caps[1]) {
            Some(m) => m,
            None => continue,
        };
        let year: i32 = match caps.get(2).and_then(|m| m.as_str().parse().ok()) {
            Some(y) => y,
            None => continue,
        };
        if let Some(dt) = ymd_utc(year, month, 1) {
            dates.push(dt);
        }
    }

    for caps in p.month_year.captures_iter(text) {
        let month = match month_from_str(&caps[1]) {
            Some(m) => m,
            None => continue,
        };
        let year: i32 = match caps.get(2).and_then(|m| m.as_str().parse().ok()) {
            Some(y) => y,
            None => continue,
        };
        if let Some(dt) = ymd_utc(year, month, 1) {
            dates.push(dt);
        }
    }

    for caps in p.month_day_year.captures_iter(text) {
        let month = match month_from_str(&caps[1]) {
            Some(m) => m,
            None => continue,
        };
        let day: u32 = match caps.get(2).and_then(|m| m.as_str().parse().ok()) {
            Some(d) => d,
            None => continue,
        };
        let year: i32 = match caps.get(4).and_then(|m| m.as_str().parse().ok()) {
            Some(y) => y,
            None => continue,
        };
        if let Some(dt) = ymd_utc(year, month, day) {
            dates.push(dt);
        }
    }

    for caps in p.bare_year.captures_iter(text) {
        let year: i32 = match caps.get(1).and_then(|m| m.as_str().parse().ok()) {
            Some(y) => y,
            None => continue,
        };
        let already_covered = dates.iter().any(|d| d.year() == year);
        if !already_covered {
            if let Some(dt) = ymd_utc(year, 6, 14) {
                dates.push(dt);
            }
        }
    }

    unique_times(dates)
}

fn unique_times(times: Vec<chrono::DateTime<Utc>>) -> Vec<chrono::DateTime<Utc>> {
    let current_year = Utc::now().year();
    let mut seen: HashSet<(i32, u32, u32)> = HashSet::new();
    let mut unique = Vec::new();
    for t in times {
        if t.year() < 1800 || t.year() > current_year {
            continue;
        }
        let key = (t.year(), t.month(), t.day());
        if seen.insert(key) {
            unique.push(t);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).single().unwrap()
    }

    #[test]
    fn dedup_has_no_duplicate_ymd() {
        let text = "March 2024. March 2024. 14th March, 2024.";
        let dates = extract_dates(text);
        let mut keys: Vec<(i32, u32, u32)> = dates.iter().map(|d| (d.year(), d.month(), d.day())).collect();
        let before = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(before, keys.len());
    }

    #[test]
    fn years_outside_range_are_dropped() {
        let dates = extract_dates("In 1776 the nation was founded. Also 1492.");
        assert!(dates.is_empty());
    }

    #[test]
    fn scenario_two_from_spec() {
        let text = "His birthdate is on 14th Feb 2020, and her birthdate is on March 1st, 2019. \
                     Their anniversary is on 07/23/2020 and 6 Jan 2022. 6 MAR 1975.";
        let dates = extract_dates(text);
        assert!(dates.contains(&ymd(2020, 2, 14)));
        assert!(dates.contains(&ymd(2019, 3, 1)));
        assert!(dates.contains(&ymd(2020, 7, 23)));
    }

    #[test]
    fn bare_year_only_added_if_not_already_covered() {
        let dates = extract_dates("March 2024 was eventful. 2024 was a good year.");
        let count_2024 = dates.iter().filter(|d| d.year() == 2024).count();
        assert_eq!(count_2024, 1);
        assert_eq!(dates.iter().find(|d| d.year() == 2024).unwrap().month(), 3);
    }

    #[test]
    fn bare_year_uses_june_fourteenth_when_uncovered() {
        let dates = extract_dates("Filed in 1999.");
        assert_eq!(dates, vec![ymd(1999, 6, 14)]);
    }
}
