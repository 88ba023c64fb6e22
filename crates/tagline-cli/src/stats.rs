// Summary statistics over the final report

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use tagline_types::FinalRecord;

/// Upper bounds of the length histogram bins; the last bin is open-ended
const LENGTH_BINS: [usize; 5] = [100, 500, 1000, 2000, 5000];

#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
    pub total_conversations: usize,
    /// Mean characters of prompt plus response
    pub avg_length: f64,
    pub top_tag: Option<String>,
    /// Days between the first and last parsable timestamp
    pub time_span_days: Option<i64>,
}

/// Parses archive timestamps (`2024年5月17日 14:03:22 JST`)
///
/// The zone suffix is ignored; every timestamp in one export shares it.
pub struct TimestampParser {
    pattern: Regex,
}

impl TimestampParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(
                r"(\d{4})年(\d{1,2})月(\d{1,2})日\s+(\d{1,2}):(\d{2}):(\d{2})",
            )?,
        })
    }

    pub fn parse(&self, raw: &str) -> Option<NaiveDateTime> {
        let caps = self.pattern.captures(raw)?;
        let num = |i: usize| caps[i].parse::<u32>().ok();
        let year = caps[1].parse::<i32>().ok()?;
        NaiveDate::from_ymd_opt(year, num(2)?, num(3)?)?.and_hms_opt(num(4)?, num(5)?, num(6)?)
    }
}

fn record_length(record: &FinalRecord) -> usize {
    record.user_prompt_cleaned.chars().count() + record.ai_response_cleaned.chars().count()
}

pub fn overview(records: &[FinalRecord], timestamps: &TimestampParser) -> Overview {
    let total = records.len();
    let avg_length = if total == 0 {
        0.0
    } else {
        records.iter().map(record_length).sum::<usize>() as f64 / total as f64
    };

    let mut parsed = records.iter().filter_map(|r| timestamps.parse(&r.timestamp));
    let time_span_days = parsed.next().map(|first| {
        let (min, max) = parsed.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t)));
        (max - min).num_days()
    });

    Overview {
        total_conversations: total,
        avg_length,
        top_tag: tag_counts(records, 1).into_iter().next().map(|(tag, _)| tag),
        time_span_days,
    }
}

/// Most frequent tags, highest count first, ties broken by tag name
pub fn tag_counts(records: &[FinalRecord], limit: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for tag in records.iter().flat_map(|r| r.tags.iter()) {
        *counts.entry(tag.as_str()).or_default() += 1;
    }

    let mut sorted: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(tag, n)| (tag.to_string(), n))
        .collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted.truncate(limit);
    sorted
}

/// Conversations per `YYYY-MM`, ascending; unparsable timestamps are skipped
pub fn monthly_counts(records: &[FinalRecord], timestamps: &TimestampParser) -> BTreeMap<String, usize> {
    let mut months = BTreeMap::new();
    for at in records.iter().filter_map(|r| timestamps.parse(&r.timestamp)) {
        *months.entry(at.format("%Y-%m").to_string()).or_default() += 1;
    }
    months
}

pub fn length_histogram(records: &[FinalRecord]) -> Vec<(String, usize)> {
    let mut labels = Vec::with_capacity(LENGTH_BINS.len() + 1);
    let mut lower = 0;
    for upper in LENGTH_BINS {
        labels.push(format!("{}-{}", lower, upper));
        lower = upper;
    }
    labels.push(format!("{}+", lower));

    let mut counts = vec![0usize; labels.len()];
    for len in records.iter().map(record_length) {
        let bin = LENGTH_BINS
            .iter()
            .position(|&upper| len < upper)
            .unwrap_or(LENGTH_BINS.len());
        counts[bin] += 1;
    }

    labels.into_iter().zip(counts).collect()
}

/// Human-readable summary printed by `tagline stats`
pub fn render(records: &[FinalRecord], top: usize) -> Result<String, regex::Error> {
    let timestamps = TimestampParser::new()?;
    let summary = overview(records, &timestamps);
    let mut out = String::new();

    out.push_str(&format!("Conversations: {}\n", summary.total_conversations));
    out.push_str(&format!("Average length: {:.0} chars\n", summary.avg_length));
    out.push_str(&format!(
        "Top tag: {}\n",
        summary.top_tag.as_deref().unwrap_or("-")
    ));
    match summary.time_span_days {
        Some(days) => out.push_str(&format!("Time span: {} days\n", days)),
        None => out.push_str("Time span: -\n"),
    }

    out.push_str(&format!("\nTop {} tags:\n", top));
    for (tag, n) in tag_counts(records, top) {
        out.push_str(&format!("  {:<24} {}\n", tag, n));
    }

    out.push_str("\nPer month:\n");
    for (month, n) in monthly_counts(records, &timestamps) {
        out.push_str(&format!("  {}  {}\n", month, n));
    }

    out.push_str("\nLength (chars):\n");
    for (bin, n) in length_histogram(records) {
        out.push_str(&format!("  {:<10} {}\n", bin, n));
    }

    Ok(out)
}
