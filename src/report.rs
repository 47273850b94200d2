use std::fmt::Write;
use std::path::Path;

use anyhow::Context;

use crate::models::{
    FundingBucket, FundingMixEntry, Opportunity, RiskLevel, RiskMixEntry, SortDirection,
    SortField, SortSpec,
};
use crate::risk;
use crate::screen;

pub fn summarize_risk_mix(opportunities: &[Opportunity]) -> Vec<RiskMixEntry> {
    RiskLevel::ALL
        .into_iter()
        .map(|level| RiskMixEntry {
            level,
            count: opportunities
                .iter()
                .filter(|o| risk::classify_risk(o) == level)
                .count(),
        })
        .collect()
}

pub fn summarize_funding_mix(opportunities: &[Opportunity]) -> Vec<FundingMixEntry> {
    FundingBucket::ALL
        .into_iter()
        .map(|bucket| FundingMixEntry {
            bucket,
            count: opportunities
                .iter()
                .filter(|o| bucket.contains(o.funding_needed))
                .count(),
        })
        .collect()
}

/// Rupee amounts with Indian digit grouping: the last three digits, then
/// groups of two.
pub fn format_inr(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::new();

    if digits.len() <= 3 {
        grouped.push_str(&digits);
    } else {
        let (head, tail) = digits.split_at(digits.len() - 3);
        let mut head_groups = Vec::new();
        let mut rest = head;
        while rest.len() > 2 {
            let (front, back) = rest.split_at(rest.len() - 2);
            head_groups.push(back);
            rest = front;
        }
        head_groups.push(rest);
        head_groups.reverse();
        grouped.push_str(&head_groups.join(","));
        grouped.push(',');
        grouped.push_str(tail);
    }

    if amount < 0 {
        format!("-₹{grouped}")
    } else {
        format!("₹{grouped}")
    }
}

pub fn build_report(scope: &str, opportunities: &[Opportunity]) -> String {
    let risk_mix = summarize_risk_mix(opportunities);
    let funding_mix = summarize_funding_mix(opportunities);

    let mut output = String::new();

    let _ = writeln!(output, "# FundFound Opportunity Report");
    let _ = writeln!(
        output,
        "Covering {} ({} opportunities)",
        scope,
        opportunities.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Risk Mix");

    if opportunities.is_empty() {
        let _ = writeln!(output, "No opportunities matched this screen.");
    } else {
        for entry in risk_mix.iter() {
            let _ = writeln!(output, "- {}: {} opportunities", entry.level, entry.count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Funding Mix");

    if opportunities.is_empty() {
        let _ = writeln!(output, "No opportunities matched this screen.");
    } else {
        for entry in funding_mix.iter() {
            let _ = writeln!(output, "- {}: {} opportunities", entry.bucket, entry.count);
        }
    }

    let mut by_interest = opportunities.to_vec();
    screen::sort_opportunities(
        &mut by_interest,
        &SortSpec {
            field: SortField::InterestCount,
            direction: SortDirection::Descending,
        },
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Most Wanted by Investors");

    if by_interest.is_empty() {
        let _ = writeln!(output, "No opportunities matched this screen.");
    } else {
        for opportunity in by_interest.iter().take(10) {
            let _ = writeln!(
                output,
                "- {} ({}) seeking {} over {} | risk {} | {} interested",
                opportunity.title,
                opportunity.category,
                format_inr(opportunity.funding_needed),
                opportunity.timeline,
                risk::classify_risk(opportunity),
                opportunity.interest_count
            );
        }
    }

    let mut recent = opportunities.to_vec();
    screen::sort_opportunities(
        &mut recent,
        &SortSpec {
            field: SortField::CreatedAt,
            direction: SortDirection::Descending,
        },
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Postings");

    if recent.is_empty() {
        let _ = writeln!(output, "No opportunities matched this screen.");
    } else {
        for opportunity in recent.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} [{}] posted {}: {}",
                opportunity.title,
                opportunity.status,
                opportunity.created_at.format("%Y-%m-%d"),
                opportunity.description
            );
        }
    }

    output
}

pub fn export_csv(out: &Path, opportunities: &[Opportunity]) -> anyhow::Result<usize> {
    #[derive(serde::Serialize)]
    struct ExportRow<'a> {
        id: String,
        title: &'a str,
        category: &'a str,
        funding_needed: i64,
        funding_bucket: &'a str,
        timeline: &'a str,
        status: &'a str,
        risk_level: &'a str,
        views: i64,
        interest_count: i64,
        created_at: String,
    }

    let mut writer = csv::Writer::from_path(out)
        .with_context(|| format!("failed to open {}", out.display()))?;

    for opportunity in opportunities {
        writer.serialize(ExportRow {
            id: opportunity.id.to_string(),
            title: &opportunity.title,
            category: &opportunity.category,
            funding_needed: opportunity.funding_needed,
            funding_bucket: FundingBucket::bucket_for(opportunity.funding_needed).name(),
            timeline: &opportunity.timeline,
            status: &opportunity.status,
            risk_level: risk::classify_risk(opportunity).as_str(),
            views: opportunity.views.unwrap_or(0),
            interest_count: opportunity.interest_count,
            created_at: opportunity.created_at.to_rfc3339(),
        })?;
    }

    writer.flush()?;
    Ok(opportunities.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_opportunity(title: &str, funding_needed: i64, timeline: &str) -> Opportunity {
        Opportunity {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: "Regional rollout with an anchor customer".to_string(),
            category: "services".to_string(),
            funding_needed,
            timeline: timeline.to_string(),
            business_plan_url: None,
            status: "published".to_string(),
            created_at: Utc::now(),
            views: Some(5),
            interest_count: 3,
        }
    }

    #[test]
    fn inr_formatting_groups_indian_style() {
        assert_eq!(format_inr(0), "₹0");
        assert_eq!(format_inr(999), "₹999");
        assert_eq!(format_inr(1_000), "₹1,000");
        assert_eq!(format_inr(100_000), "₹1,00,000");
        assert_eq!(format_inr(1_500_000), "₹15,00,000");
        assert_eq!(format_inr(60_000_000), "₹6,00,00,000");
    }

    #[test]
    fn risk_mix_covers_all_levels_and_sums_to_input() {
        let opportunities = vec![
            sample_opportunity("A", 50_000, "6 months"),
            sample_opportunity("B", 2_000_000, "1-2 years"),
            sample_opportunity("C", 20_000_000, "5 years"),
        ];
        let mix = summarize_risk_mix(&opportunities);
        assert_eq!(mix.len(), 3);
        let total: usize = mix.iter().map(|entry| entry.count).sum();
        assert_eq!(total, opportunities.len());
    }

    #[test]
    fn funding_mix_counts_each_record_once() {
        let opportunities = vec![
            sample_opportunity("A", 50_000, "6 months"),
            sample_opportunity("B", 50_000_000, "3+ years"),
        ];
        let mix = summarize_funding_mix(&opportunities);
        let total: usize = mix.iter().map(|entry| entry.count).sum();
        assert_eq!(total, opportunities.len());
    }

    #[test]
    fn report_lists_sections_and_scope() {
        let opportunities = vec![sample_opportunity("Bike Courier Fleet", 700_000, "6-12 months")];
        let report = build_report("status published", &opportunities);

        assert!(report.contains("# FundFound Opportunity Report"));
        assert!(report.contains("status published"));
        assert!(report.contains("## Risk Mix"));
        assert!(report.contains("## Funding Mix"));
        assert!(report.contains("Bike Courier Fleet"));
        assert!(report.contains("₹7,00,000"));
    }

    #[test]
    fn empty_report_says_so() {
        let report = build_report("all opportunities", &[]);
        assert!(report.contains("No opportunities matched this screen."));
    }
}
