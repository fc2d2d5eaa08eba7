//! Tracking of profile facts already woven into generated maps.

use serde::{Deserialize, Serialize};

use super::Profile;

const TRAITS_PER_MAP: usize = 2;
const LIKES_PER_MAP: usize = 2;
const FEARS_PER_MAP: usize = 1;

/// Profile facts chosen to personalize one map.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapElements {
    pub personality_traits: Vec<String>,
    pub likes: Vec<String>,
    pub fears: Vec<String>,
    pub locations: Vec<String>,
}

impl MapElements {
    pub fn is_empty(&self) -> bool {
        self.personality_traits.is_empty()
            && self.likes.is_empty()
            && self.fears.is_empty()
            && self.locations.is_empty()
    }
}

/// Per-session record of what has already been surfaced in a map description.
///
/// Only ever grows; a new game starts from an empty record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UsedElements {
    pub personality_traits: Vec<String>,
    pub likes: Vec<String>,
    pub fears: Vec<String>,
    pub locations: Vec<String>,
    pub occupations: Vec<String>,
    pub life_goals: Vec<String>,
    pub backgrounds: Vec<String>,
    /// Identifiers of maps already assigned in this session.
    pub map_ids: Vec<String>,
}

impl UsedElements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose the facts to feature in the next map and mark them as used.
    ///
    /// Unused facts are preferred. When every fact of a category has been
    /// used, the first ones are repeated rather than leaving the category out.
    pub fn select_for_map(&mut self, profile: &Profile) -> MapElements {
        let selection = MapElements {
            personality_traits: pick(&profile.personality_traits, &self.personality_traits, TRAITS_PER_MAP),
            likes: pick(&profile.likes, &self.likes, LIKES_PER_MAP),
            fears: pick(&profile.fears, &self.fears, FEARS_PER_MAP),
            locations: if profile.location.is_empty() {
                Vec::new()
            } else {
                vec![profile.location.clone()]
            },
        };

        mark(&mut self.personality_traits, &selection.personality_traits);
        mark(&mut self.likes, &selection.likes);
        mark(&mut self.fears, &selection.fears);
        mark(&mut self.locations, &selection.locations);

        selection
    }

    /// Check whether a map was already assigned.
    pub fn contains_map(&self, map_id: &str) -> bool {
        self.map_ids.iter().any(|id| id == map_id)
    }

    /// Remember an assigned map.
    pub fn record_map(&mut self, map_id: impl Into<String>) {
        let map_id = map_id.into();
        if !self.contains_map(&map_id) {
            self.map_ids.push(map_id);
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn pick(available: &[String], used: &[String], limit: usize) -> Vec<String> {
    let unused: Vec<String> = available
        .iter()
        .filter(|item| !used.contains(item))
        .take(limit)
        .cloned()
        .collect();

    if unused.is_empty() {
        available.iter().take(limit).cloned().collect()
    } else {
        unused
    }
}

fn mark(used: &mut Vec<String>, selected: &[String]) {
    for item in selected {
        if !used.contains(item) {
            used.push(item.clone());
        }
    }
}
