use serde::Serialize;

use crate::grouping::domain::grouping_error::GroupingError;

/// Descriptor indices believed to belong to one person.
///
/// The first member is the representative; it never changes after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Group {
    id: usize,
    members: Vec<usize>,
}

impl Group {
    pub fn new(id: usize, representative: usize) -> Self {
        Self {
            id,
            members: vec![representative],
        }
    }

    /// Creation-order position in the owning [`GroupSet`].
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn representative(&self) -> usize {
        self.members[0]
    }

    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn push(&mut self, index: usize) {
        self.members.push(index);
    }
}

/// Groups in creation order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GroupSet {
    groups: Vec<Group>,
}

impl GroupSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new singleton group and returns its id.
    pub fn create(&mut self, representative: usize) -> usize {
        let id = self.groups.len();
        self.groups.push(Group::new(id, representative));
        id
    }

    /// Appends `index` to an existing group. The representative is unchanged.
    pub fn assign(&mut self, group_id: usize, index: usize) -> Result<(), GroupingError> {
        let group = self
            .groups
            .get_mut(group_id)
            .ok_or(GroupingError::UnknownGroup(group_id))?;
        group.push(index);
        Ok(())
    }

    pub fn get(&self, group_id: usize) -> Option<&Group> {
        self.groups.get(group_id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Group> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn total_members(&self) -> usize {
        self.groups.iter().map(Group::len).sum()
    }

    /// Member lists only, in group order.
    pub fn to_index_lists(&self) -> Vec<Vec<usize>> {
        self.groups.iter().map(|g| g.members.clone()).collect()
    }
}

impl<'a> IntoIterator for &'a GroupSet {
    type Item = &'a Group;
    type IntoIter = std::slice::Iter<'a, Group>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_assigns_sequential_ids() {
        let mut set = GroupSet::new();
        assert_eq!(set.create(0), 0);
        assert_eq!(set.create(3), 1);
        assert_eq!(set.get(1).unwrap().representative(), 3);
    }

    #[test]
    fn test_assign_keeps_first_member_as_representative() {
        let mut set = GroupSet::new();
        let id = set.create(2);
        set.assign(id, 5).unwrap();
        set.assign(id, 9).unwrap();

        let group = set.get(id).unwrap();
        assert_eq!(group.representative(), 2);
        assert_eq!(group.members(), &[2, 5, 9]);
        assert_eq!(group.len(), 3);
    }

    #[test]
    fn test_assign_to_unknown_group_is_rejected() {
        let mut set = GroupSet::new();
        set.create(0);

        assert_eq!(set.assign(1, 4), Err(GroupingError::UnknownGroup(1)));
        assert_eq!(set.to_index_lists(), vec![vec![0]]);
    }

    #[test]
    fn test_total_members_and_index_lists() {
        let mut set = GroupSet::new();
        let a = set.create(0);
        set.create(1);
        set.assign(a, 2).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.total_members(), 3);
        assert_eq!(set.to_index_lists(), vec![vec![0, 2], vec![1]]);
    }

    #[test]
    fn test_empty_set() {
        let set = GroupSet::new();
        assert!(set.is_empty());
        assert_eq!(set.total_members(), 0);
        assert!(set.get(0).is_none());
    }
}
