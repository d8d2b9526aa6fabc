use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::grouping::domain::grouping_error::GroupingError;
use crate::shared::constants::{DEFAULT_THRESHOLD_TIERS, UNIT_EMBEDDING_THRESHOLD_TIERS};

/// Ordered distance cutoffs. A candidate is accepted by a tier when its
/// distance to a group representative is strictly below the cutoff.
///
/// Always non-empty, finite and positive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct ThresholdTiers(Vec<f64>);

impl ThresholdTiers {
    pub fn new(tiers: Vec<f64>) -> Result<Self, GroupingError> {
        if tiers.is_empty() {
            return Err(GroupingError::InvalidConfig(
                "at least one threshold tier is required".to_string(),
            ));
        }
        if let Some(bad) = tiers.iter().find(|t| !t.is_finite() || **t <= 0.0) {
            return Err(GroupingError::InvalidConfig(format!(
                "threshold tiers must be finite and positive, got {bad}"
            )));
        }
        if !tiers.windows(2).all(|w| w[0] <= w[1]) {
            log::warn!("Threshold tiers {tiers:?} are not ascending; they are tried in the given order");
        }
        Ok(Self(tiers))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Tiers for unit-length embeddings (ArcFace).
    pub fn unit_embedding() -> Self {
        Self(UNIT_EMBEDDING_THRESHOLD_TIERS.to_vec())
    }

    /// The largest cutoff in the list.
    pub fn loosest(&self) -> f64 {
        self.0.iter().copied().fold(f64::MIN, f64::max)
    }
}

impl Default for ThresholdTiers {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLD_TIERS.to_vec())
    }
}

impl TryFrom<Vec<f64>> for ThresholdTiers {
    type Error = GroupingError;

    fn try_from(tiers: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(tiers)
    }
}

impl From<ThresholdTiers> for Vec<f64> {
    fn from(tiers: ThresholdTiers) -> Self {
        tiers.0
    }
}

impl FromStr for ThresholdTiers {
    type Err = GroupingError;

    /// Parses a comma-separated list such as `0.3,0.4,0.6`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tiers = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<f64>().map_err(|_| {
                    GroupingError::InvalidConfig(format!("'{part}' is not a threshold"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(tiers)
    }
}

/// How the tier list is walked against existing groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TierStrategy {
    /// Per group, try every tier before moving on to the next group.
    FirstMatchPerGroup,
    /// Per tier, scan every group before moving on to the next tier.
    #[default]
    FullPassPerTier,
}

/// Which group wins when several accept a candidate at the same step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// Earliest-created group wins. Greedy, order-sensitive.
    #[default]
    FirstEncountered,
    /// Closest representative wins; equal distances fall back to creation order.
    Nearest,
}

impl fmt::Display for TierStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TierStrategy::FirstMatchPerGroup => write!(f, "first-match-per-group"),
            TierStrategy::FullPassPerTier => write!(f, "full-pass-per-tier"),
        }
    }
}

impl FromStr for TierStrategy {
    type Err = GroupingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first-match-per-group" => Ok(TierStrategy::FirstMatchPerGroup),
            "full-pass-per-tier" => Ok(TierStrategy::FullPassPerTier),
            other => Err(GroupingError::InvalidConfig(format!(
                "tier strategy must be 'first-match-per-group' or 'full-pass-per-tier', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TieBreak::FirstEncountered => write!(f, "first-encountered"),
            TieBreak::Nearest => write!(f, "nearest"),
        }
    }
}

impl FromStr for TieBreak {
    type Err = GroupingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first-encountered" => Ok(TieBreak::FirstEncountered),
            "nearest" => Ok(TieBreak::Nearest),
            other => Err(GroupingError::InvalidConfig(format!(
                "tie-break must be 'first-encountered' or 'nearest', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    pub threshold_tiers: ThresholdTiers,
    pub tier_strategy: TierStrategy,
    pub tie_break: TieBreak,
}
