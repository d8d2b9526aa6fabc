use crate::grouping::domain::embedding_distance::{check_finite, euclidean_distance};
use crate::grouping::domain::group::GroupSet;
use crate::grouping::domain::grouping_config::GroupingConfig;
use crate::grouping::domain::grouping_error::GroupingError;
use crate::grouping::domain::tier_matcher::TierMatcher;
use crate::shared::descriptor::Descriptor;

/// Single-pass greedy clustering of face descriptors.
///
/// Descriptors are visited in input order. Each one is compared against the
/// representative (first member) of every existing group, and the configured
/// [`TierMatcher`] decides which group, if any, takes it. Unmatched
/// descriptors start a new group. Groups are never merged, reordered or
/// re-anchored, so the result depends on input order.
pub struct OnlineGrouper {
    config: GroupingConfig,
    matcher: Box<dyn TierMatcher>,
}

impl OnlineGrouper {
    pub fn new(config: GroupingConfig) -> Self {
        let matcher = config.tier_strategy.matcher();
        Self { config, matcher }
    }

    pub fn config(&self) -> &GroupingConfig {
        &self.config
    }

    /// Partitions `descriptors` into identity groups.
    ///
    /// All descriptors are validated before any grouping happens: a
    /// non-finite value or an embedding length different from the first
    /// descriptor's aborts the run with no partial result.
    pub fn group(&self, descriptors: &[Descriptor]) -> Result<GroupSet, GroupingError> {
        validate(descriptors)?;

        let tiers = &self.config.threshold_tiers;
        let mut groups = GroupSet::new();
        let mut distances: Vec<f64> = Vec::new();

        for (i, candidate) in descriptors.iter().enumerate() {
            distances.clear();
            for group in &groups {
                let representative = &descriptors[group.representative()];
                let distance =
                    euclidean_distance(&candidate.embedding, &representative.embedding)?;
                log::trace!(
                    "{} vs {}: {distance:.4}",
                    candidate.image.display(),
                    representative.image.display()
                );
                distances.push(distance);
            }

            match self.matcher.select(&distances, tiers, self.config.tie_break) {
                Some(m) => {
                    log::debug!(
                        "Descriptor {i} ({}) joins group {} at tier {} (distance {:.4})",
                        candidate.image.display(),
                        m.group,
                        tiers.as_slice()[m.tier],
                        m.distance
                    );
                    groups.assign(m.group, i)?;
                }
                None => {
                    let id = groups.create(i);
                    log::debug!(
                        "Descriptor {i} ({}) starts group {id}",
                        candidate.image.display()
                    );
                }
            }
        }

        log::info!(
            "Grouped {} descriptors into {} groups ({}, {})",
            descriptors.len(),
            groups.len(),
            self.config.tier_strategy,
            self.config.tie_break
        );
        Ok(groups)
    }
}

impl Default for OnlineGrouper {
    fn default() -> Self {
        Self::new(GroupingConfig::default())
    }
}

fn validate(descriptors: &[Descriptor]) -> Result<(), GroupingError> {
    let Some(first) = descriptors.first() else {
        return Ok(());
    };
    let dimension = first.dimension();
    for (index, d) in descriptors.iter().enumerate() {
        if d.dimension() != dimension {
            return Err(GroupingError::DimensionMismatch {
                left: dimension,
                right: d.dimension(),
            });
        }
        check_finite(&d.embedding, index)?;
    }
    Ok(())
}
