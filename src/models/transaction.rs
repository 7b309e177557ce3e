//! Transaction and cashflow models

use super::budget::{month_display, month_key};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Locally recorded spending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub name: String,
    pub category: String,
    pub amount: f64,
    pub datetime: DateTime<Utc>,
    pub note: Option<String>,
    #[serde(default)]
    pub is_synced: bool,
}

impl Transaction {
    pub fn to_entry(&self) -> CashflowEntry {
        CashflowEntry {
            id: self.id.clone(),
            title: self.name.clone(),
            amount: self.amount,
            category: self.category.clone(),
            entry_type: CashflowType::Expense,
            date: self.datetime,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub name: String,
    pub category: String,
    pub amount: f64,
    pub datetime: DateTime<Utc>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CashflowType {
    Income,
    Expense,
}

/// One line of the cashflow history, income or expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashflowEntry {
    pub id: String,
    pub title: String,
    pub amount: f64,
    pub category: String,
    #[serde(rename = "type")]
    pub entry_type: CashflowType,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashflowDateSection {
    /// "Today", "Yesterday" or the weekday name
    pub day: String,
    /// e.g. "7 Oct 2026"
    pub date: String,
    pub items: Vec<CashflowEntry>,
}

/// Inclusive date window of a cashflow query. Open ends are unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashflowFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub label: String,
}

pub const THIS_MONTH: &str = "This month";
pub const THIS_YEAR: &str = "This year";

impl CashflowFilter {
    pub fn all_time() -> Self {
        Self {
            start: None,
            end: None,
            label: "All time".to_string(),
        }
    }

    /// Whole calendar month of a `YYYY-MM` key
    pub fn month(key: &str) -> Option<Self> {
        let first = NaiveDate::parse_from_str(&format!("{}-01", key.trim()), "%Y-%m-%d").ok()?;
        Some(Self {
            start: Some(first),
            end: Some(last_day_of_month(first)),
            label: month_display(key.trim()),
        })
    }

    pub fn year(year: i32) -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(year, 1, 1),
            end: NaiveDate::from_ymd_opt(year, 12, 31),
            label: year.to_string(),
        }
    }

    /// Resolve a month picker selection: "This month", "This year" or a
    /// `YYYY-MM` key. Anything else is unfiltered.
    pub fn from_selection(selected: &str, today: NaiveDate) -> Self {
        match selected {
            THIS_MONTH => Self::month(&month_key(today)).unwrap_or_else(Self::all_time),
            THIS_YEAR => Self::year(today.year()),
            other => Self::month(other).unwrap_or_else(Self::all_time),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }
}

pub(crate) fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// Newest first, one section per calendar day
pub fn group_by_date(entries: &[CashflowEntry], today: NaiveDate) -> Vec<CashflowDateSection> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));

    let yesterday = today - Duration::days(1);
    let mut sections: Vec<(NaiveDate, Vec<CashflowEntry>)> = Vec::new();
    for entry in sorted {
        let day = entry.date.date_naive();
        match sections.last_mut() {
            Some((current, items)) if *current == day => items.push(entry),
            _ => sections.push((day, vec![entry])),
        }
    }

    sections
        .into_iter()
        .map(|(day, items)| CashflowDateSection {
            day: if day == today {
                "Today".to_string()
            } else if day == yesterday {
                "Yesterday".to_string()
            } else {
                day.format("%A").to_string()
            },
            date: day.format("%-d %b %Y").to_string(),
            items,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(title: &str, y: i32, m: u32, d: u32, h: u32) -> CashflowEntry {
        CashflowEntry {
            id: title.to_string(),
            title: title.to_string(),
            amount: 10.0,
            category: "Food".to_string(),
            entry_type: CashflowType::Expense,
            date: Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_sections_label_recent_days() {
        let today = date(2026, 10, 15);
        let entries = vec![
            entry("coffee", 2026, 10, 15, 8),
            entry("older", 2026, 10, 12, 9),
            entry("lunch", 2026, 10, 15, 12),
            entry("taxi", 2026, 10, 14, 18),
        ];

        let sections = group_by_date(&entries, today);
        let days: Vec<&str> = sections.iter().map(|s| s.day.as_str()).collect();
        assert_eq!(days, vec!["Today", "Yesterday", "Monday"]);
        assert_eq!(sections[0].items[0].title, "lunch");
        assert_eq!(sections[0].items.len(), 2);
        assert_eq!(sections[2].date, "12 Oct 2026");
    }

    #[test]
    fn test_selection_resolution() {
        let today = date(2026, 2, 10);

        let month = CashflowFilter::from_selection(THIS_MONTH, today);
        assert_eq!(month.start, Some(date(2026, 2, 1)));
        assert_eq!(month.end, Some(date(2026, 2, 28)));
        assert_eq!(month.label, "February 2026");

        let year = CashflowFilter::from_selection(THIS_YEAR, today);
        assert!(year.contains(date(2026, 12, 31)));
        assert!(!year.contains(date(2025, 12, 31)));

        let december = CashflowFilter::from_selection("2025-12", today);
        assert_eq!(december.end, Some(date(2025, 12, 31)));

        assert_eq!(CashflowFilter::from_selection("whenever", today), CashflowFilter::all_time());
    }
}
