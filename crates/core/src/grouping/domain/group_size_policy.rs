use crate::grouping::domain::group::{Group, GroupSet};
use crate::grouping::domain::grouping_error::GroupingError;

/// Groups with at least `min_size` members, in creation order.
///
/// Smaller groups are dropped outright; they are not merged into neighbours.
pub fn select_materializable(
    groups: &GroupSet,
    min_size: usize,
) -> Result<Vec<&Group>, GroupingError> {
    if min_size == 0 {
        return Err(GroupingError::InvalidConfig(
            "minimum group size must be at least 1".to_string(),
        ));
    }
    Ok(groups.iter().filter(|g| g.len() >= min_size).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn set_with_sizes(sizes: &[usize]) -> GroupSet {
        let mut set = GroupSet::new();
        let mut next = 0;
        for &size in sizes {
            let id = set.create(next);
            next += 1;
            for _ in 1..size {
                set.assign(id, next).unwrap();
                next += 1;
            }
        }
        set
    }

    #[test]
    fn test_min_size_five_keeps_five_and_seven() {
        let set = set_with_sizes(&[1, 3, 5, 7]);
        let selected = select_materializable(&set, 5).unwrap();

        let sizes: Vec<usize> = selected.iter().map(|g| g.len()).collect();
        let ids: Vec<usize> = selected.iter().map(|g| g.id()).collect();
        assert_eq!(sizes, vec![5, 7]);
        assert_eq!(ids, vec![2, 3]);
    }

    #[rstest]
    #[case::keep_all(1, 4)]
    #[case::drop_singletons(2, 3)]
    #[case::threshold_is_inclusive(3, 3)]
    #[case::above_largest(8, 0)]
    fn test_selected_count(#[case] min_size: usize, #[case] expected: usize) {
        let set = set_with_sizes(&[1, 3, 5, 7]);
        assert_eq!(select_materializable(&set, min_size).unwrap().len(), expected);
    }

    #[test]
    fn test_zero_min_size_rejected() {
        let set = set_with_sizes(&[1]);
        assert!(matches!(
            select_materializable(&set, 0),
            Err(GroupingError::InvalidConfig(_))
        ));
    }
}
