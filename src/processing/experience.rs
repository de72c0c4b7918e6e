//! Years-of-experience extraction

use crate::config::ExperienceConfig;
use crate::error::{Result, ResumeMatcherError};
use chrono::Datelike;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// How a stated range such as "3-5 years" collapses to one number
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangePolicy {
    #[default]
    UpperBound,
    Midpoint,
}

impl RangePolicy {
    fn resolve(self, low: u32, high: u32) -> u32 {
        match self {
            RangePolicy::UpperBound => high,
            RangePolicy::Midpoint => (low + high) / 2,
        }
    }
}

/// Which phrasing produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phrase {
    Years,
    YearRange,
    SinceToPresent,
    Since,
    YearSpan,
}

pub struct ExperienceExtractor {
    range_policy: RangePolicy,
    max_plausible_years: u32,
    current_year: i32,
    years: Regex,
    year_range: Regex,
    to_present: Regex,
    since: Regex,
    year_span: Regex,
}

impl ExperienceExtractor {
    pub fn new(config: &ExperienceConfig) -> Result<Self> {
        Self::with_current_year(config, chrono::Local::now().year())
    }

    /// Pin the reference year, making `... - present` phrases reproducible
    pub fn with_current_year(config: &ExperienceConfig, current_year: i32) -> Result<Self> {
        Ok(Self {
            range_policy: config.range_policy,
            max_plausible_years: config.max_plausible_years,
            current_year,
            years: compile(r"(?i)\b(\d+)\s*\+?\s*(?:years?|yrs?)\b(?:\s+of\s+experience)?")?,
            year_range: compile(r"(?i)\b(\d+)\s*(?:-|–|to)\s*(\d+)\s*\+?\s*(?:years?|yrs?)\b")?,
            to_present: compile(
                r"(?i)\b((?:19|20)\d{2})\s*(?:-|–|to)\s*(?:present|current|now|today)\b",
            )?,
            since: compile(r"(?i)\bsince\s+((?:19|20)\d{2})\b")?,
            year_span: compile(r"(?i)\b((?:19|20)\d{2})\s*(?:-|–|to)\s*((?:19|20)\d{2})\b")?,
        })
    }

    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    /// Largest plausible number of years stated anywhere in `text`, 0 when none
    pub fn extract(&self, text: &str) -> u32 {
        self.candidates(text).into_iter().max().unwrap_or(0)
    }

    fn candidates(&self, text: &str) -> Vec<u32> {
        let mut candidates = Vec::new();
        let mut range_spans: Vec<Range<usize>> = Vec::new();

        for caps in self.year_range.captures_iter(text) {
            if let Some(whole) = caps.get(0) {
                range_spans.push(whole.range());
            }
            let value = match (parse(&caps, 1), parse(&caps, 2)) {
                (Some(low), Some(high)) if low <= high => Some(self.range_policy.resolve(low, high)),
                _ => None,
            };
            self.accept(&mut candidates, Phrase::YearRange, value, &caps[0]);
        }

        for caps in self.years.captures_iter(text) {
            let start = caps.get(1).map_or(0, |m| m.start());
            // The upper end of "3-5 years" is not a standalone claim
            if range_spans.iter().any(|span| span.contains(&start)) {
                continue;
            }
            self.accept(&mut candidates, Phrase::Years, parse(&caps, 1), &caps[0]);
        }

        for caps in self.to_present.captures_iter(text) {
            let value = parse(&caps, 1).and_then(|start| self.years_since(start));
            self.accept(&mut candidates, Phrase::SinceToPresent, value, &caps[0]);
        }

        for caps in self.since.captures_iter(text) {
            let value = parse(&caps, 1).and_then(|start| self.years_since(start));
            self.accept(&mut candidates, Phrase::Since, value, &caps[0]);
        }

        for caps in self.year_span.captures_iter(text) {
            let value = match (parse(&caps, 1), parse(&caps, 2)) {
                (Some(start), Some(end)) if start <= end && end as i64 <= self.current_year as i64 => {
                    Some(end - start)
                }
                _ => None,
            };
            self.accept(&mut candidates, Phrase::YearSpan, value, &caps[0]);
        }

        candidates
    }

    fn years_since(&self, start: u32) -> Option<u32> {
        let elapsed = self.current_year as i64 - start as i64;
        u32::try_from(elapsed).ok()
    }

    fn accept(&self, candidates: &mut Vec<u32>, phrase: Phrase, value: Option<u32>, matched: &str) {
        match value {
            Some(years) if years <= self.max_plausible_years => candidates.push(years),
            Some(years) => debug!("Discarding implausible {:?} match {:?} ({} years)", phrase, matched, years),
            None => debug!("Discarding unparsable {:?} match {:?}", phrase, matched),
        }
    }
}

fn parse(caps: &regex::Captures<'_>, group: usize) -> Option<u32> {
    caps.get(group).and_then(|m| m.as_str().parse().ok())
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| ResumeMatcherError::TextProcessing(format!("Invalid experience pattern: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn extractor() -> ExperienceExtractor {
        ExperienceExtractor::with_current_year(&Config::default().experience, 2024).unwrap()
    }

    #[test]
    fn test_years_with_plus() {
        assert_eq!(extractor().extract("Data engineer with 5+ years of experience in Python"), 5);
        assert_eq!(extractor().extract("7 yrs building backends"), 7);
    }

    #[test]
    fn test_maximum_candidate_wins() {
        let text = "2 years of Java. 6 years of Python. Since 2020 on Rust.";
        assert_eq!(extractor().extract(text), 6);
    }

    #[test]
    fn test_range_policies() {
        let text = "Requires 3-5 years in distributed systems";
        assert_eq!(extractor().extract(text), 5);

        let mut config = Config::default().experience;
        config.range_policy = RangePolicy::Midpoint;
        let midpoint = ExperienceExtractor::with_current_year(&config, 2024).unwrap();
        assert_eq!(midpoint.extract(text), 4);
        assert_eq!(midpoint.extract("2 to 7 years"), 4);
    }

    #[test]
    fn test_open_ended_dates() {
        assert_eq!(extractor().extract("Acme Corp, 2016 - Present"), 8);
        assert_eq!(extractor().extract("Engineer since 2019"), 5);
        assert_eq!(extractor().extract("Globex 2015–current"), 9);
    }

    #[test]
    fn test_year_span() {
        assert_eq!(extractor().extract("Initech 2012 - 2018"), 6);
    }

    #[test]
    fn test_malformed_candidates_are_discarded() {
        // Overflowing, future, reversed and implausible values
        let text = "99999999999 years. Since 2031. 2020 - 2010. 120 years. 4 years.";
        assert_eq!(extractor().extract(text), 4);
    }

    #[test]
    fn test_no_match_is_zero() {
        assert_eq!(extractor().extract(""), 0);
        assert_eq!(extractor().extract("Recent graduate eager to learn"), 0);
    }
}
