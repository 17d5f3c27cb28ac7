use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::model::{
    EntityRecord, ReconSummary, ReconciledEntity, Report, Requirement, RequirementRecord, Source,
};
use crate::schema::{parse_requirements, parse_snapshot, SourceTable};

/// A freshly built report plus the counts describing the join.
#[derive(Debug, Clone)]
pub struct ReconOutput {
    pub report: Report,
    pub summary: ReconSummary,
}

/// Inner-join the three datasets on id and derive the per-entity fields.
pub fn reconcile(
    before: &[EntityRecord],
    after: &[EntityRecord],
    requirements: &[RequirementRecord],
) -> Result<Report, ReconError> {
    run(before, after, requirements).map(|out| out.report)
}

/// Validate the three loaded tables against the column mapping, then reconcile.
pub fn run_tables(
    before: &SourceTable,
    after: &SourceTable,
    requirements: &SourceTable,
    config: &ReconConfig,
) -> Result<ReconOutput, ReconError> {
    let before = parse_snapshot(before, &config.columns)?;
    let after = parse_snapshot(after, &config.columns)?;
    let requirements = parse_requirements(requirements, &config.columns)?;
    run(&before, &after, &requirements)
}

/// Same as [`reconcile`], keeping the summary.
pub fn run(
    before: &[EntityRecord],
    after: &[EntityRecord],
    requirements: &[RequirementRecord],
) -> Result<ReconOutput, ReconError> {
    for (dataset, len) in [
        (Source::Before, before.len()),
        (Source::After, after.len()),
        (Source::Requirements, requirements.len()),
    ] {
        if len == 0 {
            return Err(ReconError::EmptyDataset { dataset });
        }
    }

    let mut duplicates = 0;

    let after_by_id = index_first(Source::After, after.iter().map(|r| (r.id.as_str(), r)), &mut duplicates);
    let req_by_id: HashMap<&str, Requirement> = index_first(
        Source::Requirements,
        requirements.iter().map(|r| (r.id.as_str(), r.requirement)),
        &mut duplicates,
    );

    let mut seen = HashSet::with_capacity(before.len());
    let mut entities = Vec::with_capacity(before.len());
    let mut excluded = 0;

    for record in before {
        if !seen.insert(record.id.as_str()) {
            log::warn!("before dataset: dropping duplicate id '{}'", record.id);
            duplicates += 1;
            continue;
        }

        let (Some(later), Some(requirement)) =
            (after_by_id.get(record.id.as_str()), req_by_id.get(record.id.as_str()))
        else {
            excluded += 1;
            continue;
        };

        let name = if later.name.is_empty() {
            record.name.clone()
        } else {
            later.name.clone()
        };

        entities.push(ReconciledEntity::new(
            record.id.clone(),
            name,
            record.metrics,
            later.metrics,
            *requirement,
        ));
    }

    let summary = ReconSummary {
        before_rows: before.len(),
        after_rows: after.len(),
        requirement_rows: requirements.len(),
        reconciled: entities.len(),
        excluded,
        duplicates,
    };

    log::info!(
        "reconciled {} entities ({} excluded, {} duplicate rows dropped)",
        summary.reconciled,
        summary.excluded,
        summary.duplicates,
    );

    Ok(ReconOutput {
        report: Report::from_entities(entities)?,
        summary,
    })
}

/// Index by id, keeping the first occurrence of each id.
fn index_first<'a, T>(
    dataset: Source,
    items: impl Iterator<Item = (&'a str, T)>,
    duplicates: &mut usize,
) -> HashMap<&'a str, T> {
    let mut map = HashMap::new();
    for (id, item) in items {
        match map.entry(id) {
            Entry::Vacant(slot) => {
                slot.insert(item);
            }
            Entry::Occupied(_) => {
                log::warn!("{dataset} dataset: dropping duplicate id '{id}'");
                *duplicates += 1;
            }
        }
    }
    map
}
