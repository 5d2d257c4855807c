// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Aggregates computed locally from the cached candidate list.

use std::collections::BTreeMap;

use time::Month;

use crate::cells::{normalize_value, parse_record_date};
use crate::{CandidateRecord, CellKind, FieldCatalog};

pub const UNKNOWN_GROUP: &str = "Unknown";
pub const APPLICATION_STATUS: &str = "Application Status";
pub const REFERENCE_FEEDBACK: &str = "Reference Feedback";

const MAX_BINS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCount {
    pub label: String,
    pub count: usize,
}

/// Columns worth grouping by: identifiers, free text and amounts are left out.
pub fn group_by_columns(columns: &[String], catalog: &FieldCatalog) -> Vec<String> {
    columns
        .iter()
        .filter(|column| catalog.get(column).is_none_or(|field| field.groupable))
        .cloned()
        .collect()
}

/// Record count per distinct value, in order of first appearance.
pub fn group_counts(records: &[CandidateRecord], column: &str) -> Vec<GroupCount> {
    let mut groups: Vec<GroupCount> = Vec::new();
    for record in records {
        let mut label = record.get(column).map(normalize_value).unwrap_or_default();
        if label.is_empty() {
            label = UNKNOWN_GROUP.to_owned();
        }
        match groups.iter_mut().find(|group| group.label == label) {
            Some(group) => group.count += 1,
            None => groups.push(GroupCount { label, count: 1 }),
        }
    }
    groups
}

fn numeric_columns(catalog: &FieldCatalog) -> impl Iterator<Item = &'static str> + '_ {
    catalog
        .fields()
        .iter()
        .filter(|field| field.cell_kind == CellKind::Currency)
        .map(|field| field.name)
}

fn numeric_value(record: &CandidateRecord, column: &str) -> Option<f64> {
    let value = record.get(column)?;
    let number = match value {
        serde_json::Value::Number(number) => number.as_f64(),
        other => normalize_value(other).parse::<f64>().ok(),
    };
    number.filter(|number| number.is_finite())
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistributionBin {
    pub label: String,
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub column: String,
    pub bins: Vec<DistributionBin>,
}

/// Equal-width histogram of the first amount column among `columns`.
pub fn numeric_distribution(
    records: &[CandidateRecord],
    columns: &[String],
    catalog: &FieldCatalog,
) -> Option<Distribution> {
    let column = numeric_columns(catalog)
        .find(|name| columns.iter().any(|column| column.as_str() == *name))?;
    let values: Vec<f64> = records
        .iter()
        .filter_map(|record| numeric_value(record, column))
        .collect();
    if values.is_empty() {
        return None;
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let bin_count = values.len().min(MAX_BINS);
    let width = (max - min) / bin_count as f64;

    let mut bins: Vec<DistributionBin> = (0..bin_count)
        .map(|index| {
            let start = min + index as f64 * width;
            let end = min + (index + 1) as f64 * width;
            DistributionBin {
                label: format!("{start:.1}-{end:.1}"),
                start,
                end,
                count: 0,
            }
        })
        .collect();

    for value in values {
        let index = if width > 0.0 {
            (((value - min) / width).floor() as usize).min(bin_count - 1)
        } else {
            0
        };
        bins[index].count += 1;
    }

    Some(Distribution {
        column: column.to_owned(),
        bins,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryStats {
    pub column: String,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

/// Mean/min/max per amount column over values that read as plain
/// non-negative decimals. Columns without such values are omitted.
pub fn summary_stats(records: &[CandidateRecord], catalog: &FieldCatalog) -> Vec<SummaryStats> {
    numeric_columns(catalog)
        .filter_map(|column| {
            let values: Vec<f64> = records
                .iter()
                .filter_map(|record| plain_decimal(record, column))
                .collect();
            if values.is_empty() {
                return None;
            }
            let count = values.len();
            Some(SummaryStats {
                column: column.to_owned(),
                mean: values.iter().sum::<f64>() / count as f64,
                min: values.iter().copied().fold(f64::INFINITY, f64::min),
                max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                count,
            })
        })
        .collect()
}

fn plain_decimal(record: &CandidateRecord, column: &str) -> Option<f64> {
    let text = normalize_value(record.get(column)?);
    let mut dots = 0;
    let plain = !text.is_empty()
        && text.chars().all(|ch| {
            if ch == '.' {
                dots += 1;
                dots == 1
            } else {
                ch.is_ascii_digit()
            }
        })
        && text != ".";
    if !plain {
        return None;
    }
    text.parse::<f64>().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FunnelCounts {
    pub applicants: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub in_notice: usize,
    pub joined: usize,
    pub feedback_given: usize,
}

impl FunnelCounts {
    fn record(&mut self, record: &CandidateRecord) {
        self.applicants += 1;
        match text_of(record, APPLICATION_STATUS).as_str() {
            "Accepted" => self.accepted += 1,
            "Rejected" => self.rejected += 1,
            "In Notice" => self.in_notice += 1,
            "Joined" => self.joined += 1,
            _ => {}
        }
        if !text_of(record, REFERENCE_FEEDBACK).is_empty() {
            self.feedback_given += 1;
        }
    }

    fn add(&mut self, other: &Self) {
        self.applicants += other.applicants;
        self.accepted += other.accepted;
        self.rejected += other.rejected;
        self.in_notice += other.in_notice;
        self.joined += other.joined;
        self.feedback_given += other.feedback_given;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthRow {
    pub label: String,
    pub counts: FunnelCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MonthlyFunnel {
    pub rows: Vec<MonthRow>,
    pub totals: FunnelCounts,
}

/// Per-month funnel keyed on the primary date field, oldest month first.
/// Records whose date does not parse are left out.
pub fn monthly_funnel(records: &[CandidateRecord], catalog: &FieldCatalog) -> MonthlyFunnel {
    let mut months: BTreeMap<(i32, u8), MonthRow> = BTreeMap::new();
    for record in records {
        let Some(date) = parse_record_date(&text_of(record, catalog.primary())) else {
            continue;
        };
        months
            .entry((date.year(), u8::from(date.month())))
            .or_insert_with(|| MonthRow {
                label: format!("{} {}", month_abbreviation(date.month()), date.year()),
                counts: FunnelCounts::default(),
            })
            .counts
            .record(record);
    }

    let mut funnel = MonthlyFunnel::default();
    for row in months.into_values() {
        funnel.totals.add(&row.counts);
        funnel.rows.push(row);
    }
    funnel
}

fn month_abbreviation(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyMetric {
    pub label: &'static str,
    pub value: usize,
    pub percent: f64,
}

pub fn key_metrics(totals: &FunnelCounts) -> Vec<KeyMetric> {
    let percent = |value: usize| {
        if totals.applicants == 0 {
            0.0
        } else {
            value as f64 / totals.applicants as f64 * 100.0
        }
    };
    [
        ("Total Applicants", totals.applicants),
        ("Total Accepted", totals.accepted),
        ("Total Rejected", totals.rejected),
        ("Currently In Notice", totals.in_notice),
        ("Total Joined", totals.joined),
    ]
    .into_iter()
    .map(|(label, value)| KeyMetric {
        label,
        value,
        percent: percent(value),
    })
    .collect()
}

/// Total applicants followed by the terminal application states.
pub fn application_status_counts(records: &[CandidateRecord]) -> Vec<(&'static str, usize)> {
    let mut counts = vec![
        ("Total Applicants", records.len()),
        ("Accepted", 0),
        ("Rejected", 0),
        ("In Notice", 0),
        ("Joined", 0),
    ];
    for record in records {
        let status = text_of(record, APPLICATION_STATUS);
        if let Some(entry) = counts[1..].iter_mut().find(|(label, _)| *label == status) {
            entry.1 += 1;
        }
    }
    counts
}

/// Candidates bucketed by how many comma-separated references replied.
pub fn reference_feedback_buckets(records: &[CandidateRecord]) -> Vec<(&'static str, usize)> {
    let mut buckets = vec![("All 3 Given", 0), ("2 Given", 0), ("1 Given", 0), ("0 Given", 0)];
    for record in records {
        let given = text_of(record, REFERENCE_FEEDBACK)
            .split(',')
            .filter(|entry| !entry.trim().is_empty())
            .count();
        let slot = match given {
            0 => 3,
            1 => 2,
            2 => 1,
            _ => 0,
        };
        buckets[slot].1 += 1;
    }
    buckets
}

fn text_of(record: &CandidateRecord, column: &str) -> String {
    record.get(column).map(normalize_value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{
        GroupCount, application_status_counts, group_by_columns, group_counts, key_metrics,
        monthly_funnel, numeric_distribution, reference_feedback_buckets, summary_stats,
    };
    use crate::{CandidateRecord, FieldCatalog};
    use serde_json::json;

    fn records(values: serde_json::Value) -> Vec<CandidateRecord> {
        serde_json::from_value(values).expect("valid records")
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_owned()).collect()
    }

    #[test]
    fn group_by_skips_identifiers_amounts_and_free_text() {
        let catalog = FieldCatalog::canonical();
        let projected = columns(&[
            "Date",
            "Name",
            "Email ID",
            "Current CTC per Annum",
            "Interview Status",
            "Resume",
            "Round 1 Remarks",
            "Remarks",
            "Reference Feedback",
        ]);
        assert_eq!(
            group_by_columns(&projected, &catalog),
            vec!["Name", "Interview Status", "Reference Feedback"]
        );
    }

    #[test]
    fn group_counts_bucket_blanks_as_unknown() {
        let batch = records(json!([
            {"Current Location": "Pune"},
            {"Current Location": ""},
            {"Current Location": "Chennai"},
            {},
            {"Current Location": " Pune "},
        ]));
        assert_eq!(
            group_counts(&batch, "Current Location"),
            vec![
                GroupCount {
                    label: "Pune".to_owned(),
                    count: 2
                },
                GroupCount {
                    label: "Unknown".to_owned(),
                    count: 2
                },
                GroupCount {
                    label: "Chennai".to_owned(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn distribution_uses_first_amount_column_and_equal_bins() {
        let catalog = FieldCatalog::canonical();
        let batch = records(json!([
            {"Expected CTC per Annum": "100"},
            {"Expected CTC per Annum": 200},
            {"Expected CTC per Annum": "n/a"},
            {"Expected CTC per Annum": "300"},
            {"Expected CTC per Annum": 500},
        ]));
        let projected = columns(&["Name", "Offered CTC", "Expected CTC per Annum"]);

        let distribution =
            numeric_distribution(&batch, &projected, &catalog).expect("distribution");
        assert_eq!(distribution.column, "Expected CTC per Annum");
        assert_eq!(
            distribution
                .bins
                .iter()
                .map(|bin| (bin.label.as_str(), bin.count))
                .collect::<Vec<_>>(),
            vec![
                ("100.0-200.0", 1),
                ("200.0-300.0", 1),
                ("300.0-400.0", 1),
                ("400.0-500.0", 1),
            ]
        );
    }

    #[test]
    fn distribution_with_identical_values_fills_first_bin() {
        let catalog = FieldCatalog::canonical();
        let batch = records(json!([
            {"Offered CTC": 700000},
            {"Offered CTC": 700000},
        ]));
        let distribution =
            numeric_distribution(&batch, &columns(&["Offered CTC"]), &catalog).expect("bins");
        assert_eq!(distribution.bins.len(), 2);
        assert_eq!(distribution.bins[0].count, 2);
        assert_eq!(distribution.bins[1].count, 0);
    }

    #[test]
    fn distribution_needs_a_column_and_values() {
        let catalog = FieldCatalog::canonical();
        let batch = records(json!([{"Offered CTC": "tbd"}]));
        assert!(numeric_distribution(&batch, &columns(&["Name"]), &catalog).is_none());
        assert!(numeric_distribution(&batch, &columns(&["Offered CTC"]), &catalog).is_none());
    }

    #[test]
    fn summary_stats_only_reads_plain_decimals() {
        let catalog = FieldCatalog::canonical();
        let batch = records(json!([
            {"Current CTC per Annum": "1000000", "Offered CTC": "-5"},
            {"Current CTC per Annum": "1500000.50"},
            {"Current CTC per Annum": "12,00,000"},
            {"Current CTC per Annum": 500000},
        ]));

        let stats = summary_stats(&batch, &catalog);
        assert_eq!(stats.len(), 1);
        let current = &stats[0];
        assert_eq!(current.column, "Current CTC per Annum");
        assert_eq!(current.count, 3);
        assert_eq!(current.min, 500000.0);
        assert_eq!(current.max, 1500000.5);
        assert!((current.mean - 1000000.1666).abs() < 0.01);
    }

    #[test]
    fn monthly_funnel_sorts_months_and_totals() {
        let catalog = FieldCatalog::canonical();
        let batch = records(json!([
            {"Date": "2024-02-03 10:00:00", "Application Status": "Joined", "Reference Feedback": "A"},
            {"Date": "2023-12-30 10:00:00", "Application Status": "Rejected"},
            {"Date": "2024-02-14 10:00:00", "Application Status": "Accepted"},
            {"Date": "not a date", "Application Status": "Joined"},
            {"Date": "2024-01-09", "Application Status": "In Notice"},
        ]));

        let funnel = monthly_funnel(&batch, &catalog);
        assert_eq!(
            funnel
                .rows
                .iter()
                .map(|row| (row.label.as_str(), row.counts.applicants))
                .collect::<Vec<_>>(),
            vec![("Dec 2023", 1), ("Jan 2024", 1), ("Feb 2024", 2)]
        );
        assert_eq!(funnel.totals.applicants, 4);
        assert_eq!(funnel.totals.joined, 1);
        assert_eq!(funnel.totals.feedback_given, 1);
        assert_eq!(funnel.rows[2].counts.accepted, 1);

        let metrics = key_metrics(&funnel.totals);
        assert_eq!(metrics[0].percent, 100.0);
        assert_eq!(metrics[2].label, "Total Rejected");
        assert_eq!(metrics[2].percent, 25.0);
        assert!(key_metrics(&Default::default()).iter().all(|metric| metric.percent == 0.0));
    }

    #[test]
    fn status_counts_track_terminal_states() {
        let batch = records(json!([
            {"Application Status": "Joined"},
            {"Application Status": "On Hold"},
            {"Application Status": "Joined"},
            {},
        ]));
        assert_eq!(
            application_status_counts(&batch),
            vec![
                ("Total Applicants", 4),
                ("Accepted", 0),
                ("Rejected", 0),
                ("In Notice", 0),
                ("Joined", 2),
            ]
        );
    }

    #[test]
    fn feedback_buckets_count_non_empty_entries() {
        let batch = records(json!([
            {"Reference Feedback": "A, B, C"},
            {"Reference Feedback": "A, ,B"},
            {"Reference Feedback": "A"},
            {"Reference Feedback": ""},
            {},
        ]));
        assert_eq!(
            reference_feedback_buckets(&batch),
            vec![("All 3 Given", 1), ("2 Given", 1), ("1 Given", 1), ("0 Given", 2)]
        );
    }
}
