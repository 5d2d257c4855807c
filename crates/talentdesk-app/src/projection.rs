// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cmp::Ordering;

use crate::cells::normalize_value;
use crate::{CandidateRecord, FieldCatalog, RoleContext, SortDirection};

/// Ordered, duplicate-free column list for the given role.
///
/// The first record's keys are taken as representative of the whole batch.
pub fn project_columns(
    records: &[CandidateRecord],
    role: RoleContext,
    catalog: &FieldCatalog,
) -> Vec<String> {
    let Some(first) = records.first() else {
        return Vec::new();
    };

    if !role.is_admin {
        return catalog
            .non_admin_fields()
            .filter(|field| first.fields.contains_key(field.name))
            .map(|field| field.name.to_owned())
            .collect();
    }

    let mut columns: Vec<String> = Vec::with_capacity(first.fields.len());

    let primary = catalog.primary();
    if first.fields.contains_key(primary) {
        push_unique(&mut columns, primary);
    }
    for field in catalog.fields() {
        if first.fields.contains_key(field.name) {
            push_unique(&mut columns, field.name);
        }
    }
    for key in first.keys() {
        push_unique(&mut columns, key);
    }
    columns
}

fn push_unique(columns: &mut Vec<String>, name: &str) {
    if !columns.iter().any(|existing| existing == name) {
        columns.push(name.to_owned());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

/// Row indices ordered by `sort`. Empty values sink to the bottom in either
/// direction; ties keep fetch order.
pub fn sorted_row_order(records: &[CandidateRecord], sort: Option<&SortSpec>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..records.len()).collect();
    let Some(sort) = sort else {
        return order;
    };

    let keys: Vec<String> = records
        .iter()
        .map(|record| {
            record
                .get(&sort.column)
                .map(normalize_value)
                .unwrap_or_default()
        })
        .collect();

    order.sort_by(|left, right| {
        let left_key = &keys[*left];
        let right_key = &keys[*right];
        match (left_key.is_empty(), right_key.is_empty()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => {}
        }
        let order = compare_values(left_key, right_key);
        match sort.direction {
            SortDirection::Asc => order,
            SortDirection::Desc => order.reverse(),
        }
    });
    order
}

fn compare_values(left: &str, right: &str) -> Ordering {
    match (parse_number(left), parse_number(right)) {
        (Some(left), Some(right)) => left.total_cmp(&right),
        _ => left.to_lowercase().cmp(&right.to_lowercase()),
    }
}

fn parse_number(value: &str) -> Option<f64> {
    value
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}
