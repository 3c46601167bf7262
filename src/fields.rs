use std::sync::LazyLock;

use chrono::{Local, NaiveDate};
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{error, warn};

static NON_DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\D").unwrap());

/// QIF dates show up with any of these delimiters, e.g. "6/21' 1",
/// "3.26.03" or "1-1-2005".
static DATE_DELIMITER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[/'.-]").unwrap());

/// Parses a QIF monetary amount. This never fails: amounts with
/// locale-variant punctuation are reassembled from their digit groups, and
/// anything that still resists parsing yields zero. An empty field is zero.
pub fn parse_money(money: &str) -> Decimal {
    let money = money.trim();
    if money.is_empty() {
        return Decimal::ZERO;
    }
    if let Ok(value) = money.parse::<Decimal>() {
        return value;
    }

    // Separator punctuation got in the way. Reassemble from the digit
    // groups, treating the last group as the fractional part and everything
    // before it as thousands-separated integer chunks.
    let groups: Vec<&str> = NON_DIGIT.split(money).collect();
    if groups.len() > 2 {
        let mut buf = String::new();
        if money.starts_with('-') {
            buf.push('-');
        }
        for group in &groups[..groups.len() - 1] {
            buf.push_str(group);
        }
        buf.push('.');
        buf.push_str(groups[groups.len() - 1]);
        if let Ok(value) = buf.parse::<Decimal>() {
            return value;
        }
        warn!(money = %money, "second parse attempt failed, falling back to rounding");
    }

    // Last resort: lenient numeric parsing with grouping characters removed.
    let stripped: String = money
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    match stripped
        .parse::<f64>()
        .ok()
        .and_then(Decimal::from_f64_retain)
    {
        Some(value) => {
            if value.scale() > 6 {
                warn!(value = %value, "large scale detected, truncating to 2 places");
                return value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            }
            value
        }
        None => {
            error!(money = %money, "poorly formatted number");
            Decimal::ZERO
        }
    }
}

/// Strips category tags from a category name: "Auto:Gas/Vacation" becomes
/// "Auto:Gas".
pub fn strip_category_tags(category: &str) -> &str {
    category.split('/').next().unwrap_or(category)
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DateFormat {
    #[default]
    Us,
    Eu,
}

/// Infers the date format for a whole set of raw QIF date strings. A single
/// date whose first component is greater than 12 while the second is not
/// proves a day-first (EU) format; everything else is assumed US. The
/// decision is global per account, never per transaction.
pub fn determine_date_format<'a, I>(raw_dates: I) -> DateFormat
where
    I: IntoIterator<Item = &'a str>,
{
    for raw in raw_dates {
        let chunks: Vec<&str> = DATE_DELIMITER.split(raw).collect();
        // transactions without a usable date do not get a vote
        let (Some(first), Some(second)) = (chunk_number(&chunks, 0), chunk_number(&chunks, 1))
        else {
            continue;
        };
        if first > 12 && second <= 12 {
            return DateFormat::Eu;
        }
    }
    DateFormat::Us
}

/// Parses a raw QIF date ("6/21' 1", "06/21/2001", "3.26.03", "21/2/07")
/// positionally per the given format. Two-digit years below 29 land in the
/// 2000s, the rest in the 1900s. Any failure yields today's date: a lossy
/// recovery that keeps the import progressing, preserved deliberately
/// because changing it would change import results for historical files.
pub fn parse_date(raw: &str, format: DateFormat) -> NaiveDate {
    let chunks: Vec<&str> = DATE_DELIMITER.split(raw).collect();
    let (first, second, year) = match (
        chunk_number(&chunks, 0),
        chunk_number(&chunks, 1),
        chunk_number(&chunks, 2),
    ) {
        (Some(first), Some(second), Some(year)) => (first, second, year),
        _ => {
            warn!(raw = %raw, "unparseable date, substituting today");
            return Local::now().date_naive();
        }
    };
    let (month, day) = match format {
        DateFormat::Us => (first, second),
        DateFormat::Eu => (second, first),
    };
    match NaiveDate::from_ymd_opt(expand_year(year), month as u32, day as u32) {
        Some(date) => date,
        None => {
            warn!(raw = %raw, "invalid calendar date, substituting today");
            Local::now().date_naive()
        }
    }
}

fn expand_year(year: i32) -> i32 {
    if year >= 100 {
        return year;
    }
    if year < 29 {
        year + 2000
    } else {
        year + 1900
    }
}

fn chunk_number(chunks: &[&str], index: usize) -> Option<i32> {
    chunks.get(index).and_then(|c| c.trim().parse().ok())
}
