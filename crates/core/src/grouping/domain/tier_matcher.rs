use crate::grouping::domain::grouping_config::{ThresholdTiers, TieBreak, TierStrategy};

/// A group that accepted a candidate, and the tier that accepted it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TierMatch {
    pub group: usize,
    pub tier: usize,
    pub distance: f64,
}

/// Domain interface for choosing which group accepts a candidate.
///
/// `distances[g]` is the candidate's distance to group `g`'s representative,
/// with groups in creation order. Returns `None` when no group accepts it.
pub trait TierMatcher: Send + Sync {
    fn select(
        &self,
        distances: &[f64],
        tiers: &ThresholdTiers,
        tie_break: TieBreak,
    ) -> Option<TierMatch>;
}

impl TierStrategy {
    pub fn matcher(self) -> Box<dyn TierMatcher> {
        match self {
            TierStrategy::FirstMatchPerGroup => Box::new(FirstMatchPerGroup),
            TierStrategy::FullPassPerTier => Box::new(FullPassPerTier),
        }
    }
}

/// Each group is offered every tier in list order before the next group is
/// considered.
pub struct FirstMatchPerGroup;

impl TierMatcher for FirstMatchPerGroup {
    fn select(
        &self,
        distances: &[f64],
        tiers: &ThresholdTiers,
        tie_break: TieBreak,
    ) -> Option<TierMatch> {
        let accepted = distances.iter().enumerate().filter_map(|(group, &distance)| {
            first_accepting_tier(distance, tiers).map(|tier| TierMatch {
                group,
                tier,
                distance,
            })
        });
        pick(accepted, tie_break)
    }
}

/// Every group is checked against one tier before the next tier is tried.
pub struct FullPassPerTier;

impl TierMatcher for FullPassPerTier {
    fn select(
        &self,
        distances: &[f64],
        tiers: &ThresholdTiers,
        tie_break: TieBreak,
    ) -> Option<TierMatch> {
        tiers
            .as_slice()
            .iter()
            .enumerate()
            .find_map(|(tier, &threshold)| {
                let accepted = distances
                    .iter()
                    .enumerate()
                    .filter(|(_, distance)| **distance < threshold)
                    .map(|(group, &distance)| TierMatch {
                        group,
                        tier,
                        distance,
                    });
                pick(accepted, tie_break)
            })
    }
}

fn first_accepting_tier(distance: f64, tiers: &ThresholdTiers) -> Option<usize> {
    tiers.as_slice().iter().position(|&t| distance < t)
}

/// Candidates arrive in group creation order.
fn pick(mut accepted: impl Iterator<Item = TierMatch>, tie_break: TieBreak) -> Option<TierMatch> {
    match tie_break {
        TieBreak::FirstEncountered => accepted.next(),
        TieBreak::Nearest => accepted.fold(None, |best: Option<TierMatch>, m| match best {
            Some(b) if b.distance <= m.distance => Some(b),
            _ => Some(m),
        }),
    }
}
