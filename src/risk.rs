use crate::models::{Opportunity, RiskLevel};

/// Fixed heuristic from the investor screen. Saved risk-level presets and
/// historical rankings depend on these exact contributions and cutoffs.
pub fn classify_risk(opportunity: &Opportunity) -> RiskLevel {
    let mut score = funding_component(opportunity.funding_needed);
    if opportunity.business_plan_url.is_some() {
        score -= 1;
    }
    score += timeline_component(&opportunity.timeline);

    match score {
        s if s <= 2 => RiskLevel::Low,
        s if s <= 4 => RiskLevel::Medium,
        _ => RiskLevel::High,
    }
}

fn funding_component(funding_needed: i64) -> i32 {
    if funding_needed > 10_000_000 {
        3
    } else if funding_needed > 1_000_000 {
        2
    } else {
        1
    }
}

fn timeline_component(timeline: &str) -> i32 {
    let timeline = timeline.to_lowercase();
    if timeline.contains("6 months") || timeline.contains("1 year") {
        1
    } else if timeline.contains("2 years") || timeline.contains("18 months") {
        2
    } else {
        // empty or unrecognized timelines carry the highest contribution
        3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_opportunity(
        funding_needed: i64,
        business_plan: bool,
        timeline: &str,
    ) -> Opportunity {
        Opportunity {
            id: Uuid::new_v4(),
            title: "Solar Micro-Grid Kits".to_string(),
            description: "Village-scale solar power units".to_string(),
            category: "technology".to_string(),
            funding_needed,
            timeline: timeline.to_string(),
            business_plan_url: business_plan.then(|| "https://files.example/plan.pdf".to_string()),
            status: "published".to_string(),
            created_at: Utc::now(),
            views: Some(12),
            interest_count: 2,
        }
    }

    #[test]
    fn funding_component_follows_expected_tiers() {
        assert_eq!(funding_component(50_000), 1);
        assert_eq!(funding_component(1_000_000), 1);
        assert_eq!(funding_component(1_000_001), 2);
        assert_eq!(funding_component(10_000_000), 2);
        assert_eq!(funding_component(10_000_001), 3);
    }

    #[test]
    fn timeline_component_matches_substrings() {
        assert_eq!(timeline_component("6 months"), 1);
        assert_eq!(timeline_component("about 1 year"), 1);
        assert_eq!(timeline_component("18 months"), 2);
        assert_eq!(timeline_component("1-2 years"), 2);
        assert_eq!(timeline_component("3 years"), 3);
        assert_eq!(timeline_component(""), 3);
    }

    #[test]
    fn large_unplanned_long_timeline_is_high_risk() {
        let opportunity = sample_opportunity(15_000_000, false, "3 years");
        assert_eq!(classify_risk(&opportunity), RiskLevel::High);
    }

    #[test]
    fn small_planned_short_timeline_is_low_risk() {
        let opportunity = sample_opportunity(50_000, true, "6 months");
        assert_eq!(classify_risk(&opportunity), RiskLevel::Low);
    }

    #[test]
    fn business_plan_drops_score_by_one() {
        let without_plan = sample_opportunity(500_000, false, "18 months");
        let with_plan = sample_opportunity(500_000, true, "18 months");
        assert_eq!(classify_risk(&without_plan), RiskLevel::Medium);
        assert_eq!(classify_risk(&with_plan), RiskLevel::Low);
    }

    #[test]
    fn classification_is_deterministic() {
        let opportunity = sample_opportunity(2_000_000, false, "6-12 months");
        assert_eq!(classify_risk(&opportunity), classify_risk(&opportunity));
    }

    #[test]
    fn every_input_lands_in_a_bucket() {
        for funding in [0, 500_000, 2_000_000, 20_000_000] {
            for plan in [false, true] {
                for timeline in ["6 months", "18 months", "unknown", ""] {
                    let level = classify_risk(&sample_opportunity(funding, plan, timeline));
                    assert!(RiskLevel::ALL.contains(&level));
                }
            }
        }
    }
}
