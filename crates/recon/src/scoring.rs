use std::cmp::Reverse;

use ordered_float::OrderedFloat;

use crate::config::ScoringWeights;
use crate::model::{progress_pct, Report, ScoredEntity};

/// Score every entity and return them best-first.
///
/// Ties in score are ordered by id ascending and share the "min" rank: the
/// rank of an entity is one more than the number of entities with a strictly
/// higher score.
pub fn score_and_rank(report: &Report, weights: &ScoringWeights) -> Vec<ScoredEntity> {
    let mut scored: Vec<ScoredEntity> = report
        .entities()
        .iter()
        .map(|entity| ScoredEntity {
            dkp_score: weights.dkp(entity),
            rank: 0,
            kill_progress_pct: progress_pct(
                entity.total_kills_change(),
                entity.requirement.required_kills,
            ),
            death_progress_pct: progress_pct(entity.deads_change, entity.requirement.required_deaths),
            entity: entity.clone(),
        })
        .collect();

    scored.sort_by(|a, b| {
        Reverse(OrderedFloat(a.dkp_score))
            .cmp(&Reverse(OrderedFloat(b.dkp_score)))
            .then_with(|| a.entity.id.cmp(&b.entity.id))
    });

    let mut previous: Option<(f64, usize)> = None;
    for (position, entry) in scored.iter_mut().enumerate() {
        let rank = match previous {
            Some((score, rank)) if score == entry.dkp_score => rank,
            _ => position + 1,
        };
        entry.rank = rank;
        previous = Some((entry.dkp_score, rank));
    }

    scored
}
