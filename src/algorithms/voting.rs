//! Dominant-class election for clustering algorithms.

use std::collections::BTreeMap;

use tracing::warn;

use crate::core::entity::{Entity, EntityCorpus};
use crate::core::results::Refactoring;

/// Most frequent containing class among `members` and its count.
///
/// Ties go to the lexicographically smallest class name.
pub(crate) fn dominant_class<'a, I>(members: I) -> Option<(&'a str, usize)>
where
    I: IntoIterator<Item = &'a Entity>,
{
    let mut votes: BTreeMap<&str, usize> = BTreeMap::new();
    for member in members {
        *votes.entry(member.class_name()).or_insert(0) += 1;
    }
    votes
        .into_iter()
        .fold(None, |best: Option<(&str, usize)>, (class, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((class, count)),
        })
}

/// Suggest moving every movable member whose class differs from the
/// cluster's dominant class.
///
/// Accuracy is the share of the cluster belonging to the dominant class.
pub(crate) fn cluster_suggestions(corpus: &EntityCorpus, members: &[&Entity]) -> Vec<Refactoring> {
    if members.len() < 2 {
        return Vec::new();
    }
    let Some((dominant, count)) = dominant_class(members.iter().copied()) else {
        return Vec::new();
    };
    if corpus.class(dominant).is_none() {
        warn!(class = dominant, "dominant class is not part of the corpus, skipping cluster");
        return Vec::new();
    }

    let density = count as f64 / members.len() as f64;
    members
        .iter()
        .filter(|m| m.is_movable() && m.class_name() != dominant)
        .filter(|m| corpus.include_fields() || !m.is_field())
        .map(|m| Refactoring::new(m.name(), dominant, density, m.is_field()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominant_class_majority() {
        let members = vec![
            Entity::method("A.x", "A"),
            Entity::method("B.y", "B"),
            Entity::method("A.z", "A"),
        ];
        assert_eq!(dominant_class(&members), Some(("A", 2)));
    }

    #[test]
    fn test_dominant_class_tie_is_deterministic() {
        let members = vec![Entity::method("B.y", "B"), Entity::method("A.x", "A")];
        assert_eq!(dominant_class(&members), Some(("A", 1)));
        assert_eq!(dominant_class(Vec::<&Entity>::new()), None);
    }

    #[test]
    fn test_cluster_suggestions() {
        let corpus = EntityCorpus::new(
            vec![Entity::class("A"), Entity::class("B")],
            vec![
                Entity::method("A.x", "A"),
                Entity::method("A.z", "A"),
                Entity::method("B.y", "B"),
                Entity::method("B.pinned", "B").with_movable(false),
            ],
            vec![],
            false,
        )
        .unwrap();
        let members: Vec<&Entity> = ["A", "A.x", "A.z", "B.y", "B.pinned"]
            .iter()
            .filter_map(|n| corpus.get(n))
            .collect();

        let suggestions = cluster_suggestions(&corpus, &members);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].unit(), "B.y");
        assert_eq!(suggestions[0].target(), "A");
        assert!((suggestions[0].accuracy() - 0.6).abs() < 1e-12);
    }
}
