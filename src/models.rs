use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Opportunity {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub funding_needed: i64,
    pub timeline: String,
    pub business_plan_url: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub views: Option<i64>,
    pub interest_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "low")]
    Low,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "high")]
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(format!(
                "unknown risk level '{other}' (expected low, medium, or high)"
            )),
        }
    }
}

/// Named funding ranges, half-open on the upper bound; the top range is
/// unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FundingBucket {
    #[serde(rename = "0-100000")]
    UpToOneLakh,
    #[serde(rename = "100000-1000000")]
    UpToTenLakh,
    #[serde(rename = "1000000-10000000")]
    UpToOneCrore,
    #[serde(rename = "10000000+")]
    OverOneCrore,
}

impl FundingBucket {
    pub const ALL: [FundingBucket; 4] = [
        FundingBucket::UpToOneLakh,
        FundingBucket::UpToTenLakh,
        FundingBucket::UpToOneCrore,
        FundingBucket::OverOneCrore,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FundingBucket::UpToOneLakh => "0-100000",
            FundingBucket::UpToTenLakh => "100000-1000000",
            FundingBucket::UpToOneCrore => "1000000-10000000",
            FundingBucket::OverOneCrore => "10000000+",
        }
    }

    pub fn bounds(&self) -> (i64, Option<i64>) {
        match self {
            FundingBucket::UpToOneLakh => (0, Some(100_000)),
            FundingBucket::UpToTenLakh => (100_000, Some(1_000_000)),
            FundingBucket::UpToOneCrore => (1_000_000, Some(10_000_000)),
            FundingBucket::OverOneCrore => (10_000_000, None),
        }
    }

    pub fn contains(&self, amount: i64) -> bool {
        let (min, max) = self.bounds();
        amount >= min && max.map_or(true, |upper| amount < upper)
    }

    pub fn bucket_for(amount: i64) -> FundingBucket {
        FundingBucket::ALL
            .into_iter()
            .find(|bucket| bucket.contains(amount))
            .unwrap_or(FundingBucket::UpToOneLakh)
    }
}

impl fmt::Display for FundingBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FundingBucket {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        FundingBucket::ALL
            .into_iter()
            .find(|bucket| bucket.name() == value)
            .ok_or_else(|| {
                format!(
                    "unknown funding range '{value}' (expected 0-100000, 100000-1000000, \
                     1000000-10000000, or 10000000+)"
                )
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub query: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub funding_range: Option<FundingBucket>,
    pub timeline: Option<String>,
    pub risk_level: Option<RiskLevel>,
}

impl FilterCriteria {
    /// Layer explicit criteria over a saved base; fields set in `explicit`
    /// win.
    pub fn overlay(base: FilterCriteria, explicit: FilterCriteria) -> FilterCriteria {
        FilterCriteria {
            query: explicit.query.or(base.query),
            category: explicit.category.or(base.category),
            status: explicit.status.or(base.status),
            funding_range: explicit.funding_range.or(base.funding_range),
            timeline: explicit.timeline.or(base.timeline),
            risk_level: explicit.risk_level.or(base.risk_level),
        }
    }

    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(query) = &self.query {
            parts.push(format!("query '{query}'"));
        }
        if let Some(category) = &self.category {
            parts.push(format!("category {category}"));
        }
        if let Some(status) = &self.status {
            parts.push(format!("status {status}"));
        }
        if let Some(range) = &self.funding_range {
            parts.push(format!("funding {range}"));
        }
        if let Some(timeline) = &self.timeline {
            parts.push(format!("timeline '{timeline}'"));
        }
        if let Some(risk) = &self.risk_level {
            parts.push(format!("risk {risk}"));
        }
        if parts.is_empty() {
            "all opportunities".to_string()
        } else {
            parts.join(", ")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    FundingNeeded,
    Views,
    InterestCount,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "created-at" => Ok(SortField::CreatedAt),
            "funding-needed" => Ok(SortField::FundingNeeded),
            "views" => Ok(SortField::Views),
            "interest" => Ok(SortField::InterestCount),
            other => Err(format!(
                "unknown sort field '{other}' (expected created-at, funding-needed, views, \
                 or interest)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        SortSpec {
            field: SortField::CreatedAt,
            direction: SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RiskMixEntry {
    pub level: RiskLevel,
    pub count: usize,
}

#[derive(Debug, Clone)]
pub struct FundingMixEntry {
    pub bucket: FundingBucket,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportSummary {
    pub inserted: usize,
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_bounds_are_half_open() {
        assert!(FundingBucket::UpToOneLakh.contains(0));
        assert!(FundingBucket::UpToOneLakh.contains(99_999));
        assert!(!FundingBucket::UpToOneLakh.contains(100_000));
        assert!(FundingBucket::UpToTenLakh.contains(100_000));
        assert!(FundingBucket::OverOneCrore.contains(10_000_000));
        assert!(FundingBucket::OverOneCrore.contains(60_000_000));
    }

    #[test]
    fn every_amount_lands_in_exactly_one_bucket() {
        for amount in [
            0,
            50_000,
            100_000,
            999_999,
            1_000_000,
            9_999_999,
            10_000_000,
            60_000_000,
        ] {
            let matching = FundingBucket::ALL
                .into_iter()
                .filter(|bucket| bucket.contains(amount))
                .count();
            assert_eq!(matching, 1, "amount {amount} matched {matching} buckets");
        }
    }

    #[test]
    fn bucket_names_round_trip() {
        for bucket in FundingBucket::ALL {
            assert_eq!(bucket.name().parse::<FundingBucket>(), Ok(bucket));
        }
        assert!("5-500".parse::<FundingBucket>().is_err());
    }

    #[test]
    fn risk_level_parses_known_names_only() {
        assert_eq!("low".parse::<RiskLevel>(), Ok(RiskLevel::Low));
        assert_eq!("high".parse::<RiskLevel>(), Ok(RiskLevel::High));
        assert!("severe".parse::<RiskLevel>().is_err());
    }

    #[test]
    fn overlay_prefers_explicit_fields() {
        let base = FilterCriteria {
            category: Some("technology".to_string()),
            risk_level: Some(RiskLevel::Low),
            ..FilterCriteria::default()
        };
        let explicit = FilterCriteria {
            category: Some("healthcare".to_string()),
            ..FilterCriteria::default()
        };

        let merged = FilterCriteria::overlay(base, explicit);
        assert_eq!(merged.category.as_deref(), Some("healthcare"));
        assert_eq!(merged.risk_level, Some(RiskLevel::Low));
    }
}
