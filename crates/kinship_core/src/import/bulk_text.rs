//! Semicolon-delimited bulk text format.
//!
//! One record per line:
//! `NAME:<name>; PARENTS:<a,b>; SPOUSES:<a>; SIBLINGS:<a>; CHILDREN:<a>`
//!
//! # Invariants
//! - Keys are case-insensitive and may appear in any order.
//! - Lines without a non-blank `NAME` produce no record.
//! - Imports merge by set union; they never drop existing relations.

use crate::graph::{rebuild, MemberStore, StoreChange};
use crate::model::member::{normalize_member_name, FamilyMember, Relation};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

static FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(name|parents?|spouses?|siblings?|child(?:ren)?)\s*:(.*)$")
        .expect("valid bulk field regex")
});

/// Parses every line of `text`, skipping lines without a name.
pub fn parse_bulk_text(text: &str) -> Vec<FamilyMember> {
    text.lines().filter_map(parse_bulk_line).collect()
}

/// Parses one line into a fresh member record.
pub fn parse_bulk_line(line: &str) -> Option<FamilyMember> {
    let mut name = None;
    let mut member = FamilyMember::new(String::new());

    for field in line.split(';') {
        let Some(captures) = FIELD_RE.captures(field) else {
            continue;
        };
        let key = captures[1].to_ascii_lowercase();
        let value = &captures[2];
        match key.chars().next() {
            Some('n') => name = normalize_member_name(value),
            Some('p') => extend_unique(&mut member.parents, value),
            Some('s') if key.starts_with("sp") => extend_unique(&mut member.spouses, value),
            Some('s') => extend_unique(&mut member.siblings, value),
            Some('c') => extend_unique(&mut member.children, value),
            _ => {}
        }
    }

    member.name = name?;
    Some(member)
}

/// Renders the store as bulk text, one alphabetical line per member.
pub fn export_bulk_text(store: &MemberStore) -> String {
    store
        .members()
        .iter()
        .map(format_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Merges bulk text into `store` and re-runs the consistency pipeline.
pub fn merge_bulk_text(store: &mut MemberStore, text: &str, infer: bool) -> StoreChange {
    let records = parse_bulk_text(text);
    let mut change = StoreChange::default();
    for record in &records {
        match store.merge_by_name(record) {
            Ok(merged) => change.absorb(merged),
            Err(err) => warn!(
                "event=bulk_import module=import status=skipped reason={}",
                err
            ),
        }
    }
    change.absorb(rebuild(store, infer));

    info!(
        "event=bulk_import module=import status=ok records={} inserted={} updated={} members={}",
        records.len(),
        change.inserted.len(),
        change.updated.len(),
        store.len()
    );
    change
}

fn extend_unique(target: &mut Vec<String>, raw: &str) {
    for entry in raw.split(',') {
        if let Some(name) = normalize_member_name(entry) {
            if !target.contains(&name) {
                target.push(name);
            }
        }
    }
}

fn format_line(member: &FamilyMember) -> String {
    let list = |relation: Relation| member.relation(relation).join(",");
    format!(
        "NAME:{}; PARENTS:{}; SPOUSES:{}; SIBLINGS:{}; CHILDREN:{}",
        member.name,
        list(Relation::Parent),
        list(Relation::Spouse),
        list(Relation::Sibling),
        list(Relation::Child)
    )
}
