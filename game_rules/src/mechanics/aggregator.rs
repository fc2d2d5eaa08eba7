//! Profile aggregator - merges extracted facts into a profile under per-field policies.

use serde::{Deserialize, Serialize};

use super::{ExtractedFacts, FactValue};
use crate::entities::{FieldKind, Profile, ProfileField};

/// What a merge changed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MergeReport {
    /// Fields whose value changed.
    pub updated: Vec<ProfileField>,
    /// Fields that were offered but kept their current value.
    pub unchanged: Vec<ProfileField>,
}

impl MergeReport {
    pub fn has_updates(&self) -> bool {
        !self.updated.is_empty()
    }
}

/// Applies [`ExtractedFacts`] to a [`Profile`].
///
/// - Sequence fields gain only values they do not already hold (exact match),
///   in the order offered.
/// - Single-value fields are filled when empty. Location and occupation are
///   refined when the new value is longer and contains the current one; name
///   and age are replaced whenever they differ.
/// - Background is appended to with a single space and never deduplicated, so
///   re-merging the same text grows it.
pub struct ProfileAggregator;

impl ProfileAggregator {
    pub fn merge(profile: &mut Profile, facts: &ExtractedFacts) -> MergeReport {
        let mut report = MergeReport::default();

        for (field, value) in facts.iter() {
            let changed = match field.kind() {
                FieldKind::Sequence => Self::merge_sequence(profile, field, value),
                FieldKind::Single => Self::merge_single(profile, field, value),
                FieldKind::Text => Self::merge_text(profile, field, value),
            };

            if changed {
                report.updated.push(field);
            } else {
                report.unchanged.push(field);
            }
        }

        report
    }

    fn merge_sequence(profile: &mut Profile, field: ProfileField, value: &FactValue) -> bool {
        let Some(current) = profile.sequence_mut(field) else {
            return false;
        };

        let before = current.len();
        for item in value.items() {
            if !current.contains(&item) {
                current.push(item);
            }
        }
        current.len() != before
    }

    fn merge_single(profile: &mut Profile, field: ProfileField, value: &FactValue) -> bool {
        if field == ProfileField::Age {
            return match value.as_age() {
                Some(age) if profile.age != Some(age) => {
                    profile.age = Some(age);
                    true
                }
                _ => false,
            };
        }

        let (Some(new_value), Some(current)) = (value.as_text(), profile.text_mut(field)) else {
            return false;
        };

        let replace = if current.is_empty() {
            true
        } else {
            match field {
                ProfileField::Name => *current != new_value,
                ProfileField::Location | ProfileField::Occupation => is_refinement(current, &new_value),
                _ => false,
            }
        };

        if replace {
            *current = new_value;
        }
        replace
    }

    fn merge_text(profile: &mut Profile, field: ProfileField, value: &FactValue) -> bool {
        let (Some(new_value), Some(current)) = (value.as_text(), profile.text_mut(field)) else {
            return false;
        };

        if current.is_empty() {
            *current = new_value;
        } else {
            current.push(' ');
            current.push_str(&new_value);
        }
        true
    }
}

/// A "more specific" value: strictly longer and containing the current one.
fn is_refinement(current: &str, candidate: &str) -> bool {
    candidate.chars().count() > current.chars().count() && candidate.contains(current)
}
