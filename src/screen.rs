use std::cmp::Ordering;

use crate::models::{FilterCriteria, Opportunity, SortDirection, SortField, SortSpec};
use crate::risk;

pub fn filter_opportunities(
    opportunities: &[Opportunity],
    criteria: &FilterCriteria,
) -> Vec<Opportunity> {
    opportunities
        .iter()
        .filter(|opportunity| matches_criteria(opportunity, criteria))
        .cloned()
        .collect()
}

/// All present criteria are ANDed; absent criteria impose no constraint.
pub fn matches_criteria(opportunity: &Opportunity, criteria: &FilterCriteria) -> bool {
    if let Some(query) = &criteria.query {
        if !matches_query(opportunity, query) {
            return false;
        }
    }

    if let Some(category) = &criteria.category {
        if opportunity.category != *category {
            return false;
        }
    }

    if let Some(status) = &criteria.status {
        if opportunity.status != *status {
            return false;
        }
    }

    if let Some(range) = &criteria.funding_range {
        if !range.contains(opportunity.funding_needed) {
            return false;
        }
    }

    if let Some(timeline) = &criteria.timeline {
        if !opportunity
            .timeline
            .to_lowercase()
            .contains(&timeline.to_lowercase())
        {
            return false;
        }
    }

    if let Some(level) = &criteria.risk_level {
        // recomputed on every evaluation, never cached
        if risk::classify_risk(opportunity) != *level {
            return false;
        }
    }

    true
}

fn matches_query(opportunity: &Opportunity, query: &str) -> bool {
    let query = query.to_lowercase();
    [
        &opportunity.title,
        &opportunity.description,
        &opportunity.category,
    ]
    .into_iter()
    .any(|field| field.to_lowercase().contains(&query))
}

pub fn sort_opportunities(opportunities: &mut [Opportunity], spec: &SortSpec) {
    opportunities.sort_by(|a, b| {
        let ordering = field_ordering(spec.field, a, b);
        match spec.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

fn field_ordering(field: SortField, a: &Opportunity, b: &Opportunity) -> Ordering {
    match field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::FundingNeeded => a.funding_needed.cmp(&b.funding_needed),
        SortField::Views => a.views.unwrap_or(0).cmp(&b.views.unwrap_or(0)),
        SortField::InterestCount => a.interest_count.cmp(&b.interest_count),
    }
}

pub fn screen_opportunities(
    opportunities: &[Opportunity],
    criteria: &FilterCriteria,
    spec: &SortSpec,
) -> Vec<Opportunity> {
    let mut matched = filter_opportunities(opportunities, criteria);
    sort_opportunities(&mut matched, spec);
    matched
}
