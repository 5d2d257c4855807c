// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::cells::{CellDisplay, RenderContext, render_detail_value};
use crate::CandidateRecord;

const GENERAL_REMARKS: &str = "Remarks";

/// Stage remark cards shown above the field list, in interview order.
pub const STAGE_REMARKS: [(&str, &str); 3] = [
    ("Initial Screening", "Initial Screening"),
    ("Round 1 Remarks", "Round 1"),
    ("Round 2 Remarks", "Round 2"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemarkCard {
    pub field: &'static str,
    pub title: &'static str,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailItem {
    pub label: String,
    pub value: CellDisplay,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    pub remarks: Vec<RemarkCard>,
    pub items: Vec<DetailItem>,
}

pub fn detail_view(record: &CandidateRecord, ctx: &RenderContext<'_>) -> DetailView {
    let remarks = STAGE_REMARKS
        .iter()
        .map(|&(field, title)| RemarkCard {
            field,
            title,
            text: render_detail_value(field, record, ctx).text().to_owned(),
        })
        .collect();

    let mut items = Vec::new();
    for field in ctx.catalog.fields() {
        if !ctx.role.is_admin && !field.visible_to_non_admin {
            continue;
        }
        if field.name == GENERAL_REMARKS || is_stage_remark(field.name) {
            continue;
        }
        push_item(&mut items, field.name, record, ctx);
    }

    if ctx.role.is_admin {
        for key in record.keys() {
            if ctx.catalog.contains(key) {
                continue;
            }
            push_item(&mut items, key, record, ctx);
        }
    }

    DetailView { remarks, items }
}

fn is_stage_remark(field: &str) -> bool {
    STAGE_REMARKS.iter().any(|(stage, _)| *stage == field)
}

fn push_item(items: &mut Vec<DetailItem>, field: &str, record: &CandidateRecord, ctx: &RenderContext<'_>) {
    let value = render_detail_value(field, record, ctx);
    if value.text().is_empty() {
        return;
    }
    items.push(DetailItem {
        label: field.to_owned(),
        value,
    });
}
