use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use crate::shared::constants::DEFAULT_IDENTITY_SEPARATOR;
use crate::shared::descriptor::Descriptor;

/// Derives a naive identity hint from an image reference.
///
/// The hint is only used for diagnostics. Grouping never reads it.
pub trait IdentityKey: Send + Sync {
    fn key(&self, image: &Path) -> String;
}

impl<F> IdentityKey for F
where
    F: Fn(&Path) -> String + Send + Sync,
{
    fn key(&self, image: &Path) -> String {
        self(image)
    }
}

/// Token before the first separator in the file stem: `alice_003.jpg` → `alice`.
///
/// A stem without the separator is its own key.
pub struct FilenamePrefixKey {
    separator: char,
}

impl FilenamePrefixKey {
    pub fn new(separator: char) -> Self {
        Self { separator }
    }
}

impl Default for FilenamePrefixKey {
    fn default() -> Self {
        Self::new(DEFAULT_IDENTITY_SEPARATOR)
    }
}

impl IdentityKey for FilenamePrefixKey {
    fn key(&self, image: &Path) -> String {
        let stem = image
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default();
        if let Some((prefix, _)) = stem.split_once(self.separator) {
            return prefix.to_string();
        }
        stem.into_owned()
    }
}

/// Descriptor indices bucketed by identity key, in first-seen key order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IdentityBuckets {
    buckets: Vec<(String, Vec<usize>)>,
}

impl IdentityBuckets {
    pub fn get(&self, key: &str) -> Option<&[usize]> {
        self.buckets
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, members)| members.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[usize])> {
        self.buckets
            .iter()
            .map(|(k, members)| (k.as_str(), members.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

pub fn bucketize(descriptors: &[Descriptor], key_fn: &dyn IdentityKey) -> IdentityBuckets {
    let mut position: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<(String, Vec<usize>)> = Vec::new();

    for (index, descriptor) in descriptors.iter().enumerate() {
        let key = key_fn.key(&descriptor.image);
        match position.get(&key) {
            Some(&slot) => buckets[slot].1.push(index),
            None => {
                position.insert(key.clone(), buckets.len());
                buckets.push((key, vec![index]));
            }
        }
    }

    IdentityBuckets { buckets }
}

/// Keys with strictly more than `min_count` members, in first-seen order.
pub fn filter_by_min_count(buckets: &IdentityBuckets, min_count: usize) -> Vec<String> {
    buckets
        .iter()
        .filter(|(_, members)| members.len() > min_count)
        .map(|(key, _)| key.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn descriptors(names: &[&str]) -> Vec<Descriptor> {
        names
            .iter()
            .map(|n| Descriptor::new(format!("photos/{n}"), vec![0.0]))
            .collect()
    }

    #[rstest]
    #[case::prefix("alice_003.jpg", "alice")]
    #[case::first_separator_only("bob_smith_1.png", "bob")]
    #[case::no_separator("carol.jpg", "carol")]
    #[case::leading_separator("_x.jpg", "")]
    #[case::directories_ignored("a_b/dave_2.jpg", "dave")]
    fn test_filename_prefix_key(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(FilenamePrefixKey::default().key(Path::new(path)), expected);
    }

    #[test]
    fn test_custom_separator() {
        let key = FilenamePrefixKey::new('-');
        assert_eq!(key.key(Path::new("erin-07_b.jpg")), "erin");
    }

    #[test]
    fn test_bucketize_keeps_first_seen_and_input_order() {
        let d = descriptors(&["bob_1.jpg", "alice_1.jpg", "bob_2.jpg", "alice_2.jpg", "bob_3.jpg"]);
        let buckets = bucketize(&d, &FilenamePrefixKey::default());

        let keys: Vec<&str> = buckets.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["bob", "alice"]);
        assert_eq!(buckets.get("bob"), Some(&[0, 2, 4][..]));
        assert_eq!(buckets.get("alice"), Some(&[1, 3][..]));
        assert_eq!(buckets.get("carol"), None);
    }

    #[test]
    fn test_filter_is_strictly_greater() {
        let d = descriptors(&["a_1.jpg", "b_1.jpg", "b_2.jpg", "c_1.jpg", "c_2.jpg", "c_3.jpg"]);
        let buckets = bucketize(&d, &FilenamePrefixKey::default());

        assert_eq!(filter_by_min_count(&buckets, 0), vec!["a", "b", "c"]);
        assert_eq!(filter_by_min_count(&buckets, 1), vec!["b", "c"]);
        assert_eq!(filter_by_min_count(&buckets, 2), vec!["c"]);
        assert!(filter_by_min_count(&buckets, 3).is_empty());
    }

    #[test]
    fn test_closure_key_fn() {
        let d = descriptors(&["x.jpg", "y.png", "z.jpg"]);
        let by_extension = |p: &Path| {
            p.extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default()
        };
        let buckets = bucketize(&d, &by_extension);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets.get("jpg"), Some(&[0, 2][..]));
    }

    #[test]
    fn test_empty_input() {
        let buckets = bucketize(&[], &FilenamePrefixKey::default());
        assert!(buckets.is_empty());
        assert!(filter_by_min_count(&buckets, 0).is_empty());
    }
}
