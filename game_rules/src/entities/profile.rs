//! Player profile - the durable facts learned about a player.

use serde::{Deserialize, Serialize};

/// How a profile field accumulates new values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Holds one value, replaced only under field-specific conditions.
    Single,
    /// Ordered list with uniqueness enforced on insert.
    Sequence,
    /// Free text grown by concatenation.
    Text,
}

/// Every field of a [`Profile`], keyed the way collaborators name them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    Name,
    Age,
    Location,
    Occupation,
    LifeGoal,
    PersonalityTraits,
    Likes,
    Fears,
    Background,
    ExtraInfo,
}

impl ProfileField {
    pub const ALL: [ProfileField; 10] = [
        ProfileField::Name,
        ProfileField::Age,
        ProfileField::Location,
        ProfileField::Occupation,
        ProfileField::LifeGoal,
        ProfileField::PersonalityTraits,
        ProfileField::Likes,
        ProfileField::Fears,
        ProfileField::Background,
        ProfileField::ExtraInfo,
    ];

    /// The wire key used by extraction output.
    pub fn key(&self) -> &'static str {
        match self {
            ProfileField::Name => "name",
            ProfileField::Age => "age",
            ProfileField::Location => "location",
            ProfileField::Occupation => "occupation",
            ProfileField::LifeGoal => "life_goal",
            ProfileField::PersonalityTraits => "personality_traits",
            ProfileField::Likes => "likes",
            ProfileField::Fears => "fears",
            ProfileField::Background => "background",
            ProfileField::ExtraInfo => "extra_info",
        }
    }

    /// Look a field up by its wire key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }

    /// Human-facing name, used when telling the player what is still missing.
    pub fn label(&self) -> &'static str {
        match self {
            ProfileField::Name => "name",
            ProfileField::Age => "age",
            ProfileField::Location => "location",
            ProfileField::Occupation => "occupation",
            ProfileField::LifeGoal => "life goal",
            ProfileField::PersonalityTraits => "personality",
            ProfileField::Likes => "likes/hobbies",
            ProfileField::Fears => "fears",
            ProfileField::Background => "background",
            ProfileField::ExtraInfo => "extra info",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            ProfileField::Name
            | ProfileField::Age
            | ProfileField::Location
            | ProfileField::Occupation
            | ProfileField::LifeGoal => FieldKind::Single,
            ProfileField::PersonalityTraits
            | ProfileField::Likes
            | ProfileField::Fears
            | ProfileField::ExtraInfo => FieldKind::Sequence,
            ProfileField::Background => FieldKind::Text,
        }
    }
}

impl std::fmt::Display for ProfileField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// The accumulated facts about one player.
///
/// Fields are never cleared by merging; an empty string or `None` means
/// "not yet known".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: String,
    pub age: Option<u32>,
    pub location: String,
    pub occupation: String,
    pub life_goal: String,
    pub personality_traits: Vec<String>,
    pub likes: Vec<String>,
    pub fears: Vec<String>,
    pub background: String,
    pub extra_info: Vec<String>,
}

impl Profile {
    /// Create an empty profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the field holds any value.
    pub fn is_present(&self, field: ProfileField) -> bool {
        match field {
            ProfileField::Age => self.age.is_some(),
            _ => self.count(field) > 0,
        }
    }

    /// Number of entries for sequence fields; 0 or 1 for the others.
    pub fn count(&self, field: ProfileField) -> usize {
        match field {
            ProfileField::Age => usize::from(self.age.is_some()),
            _ => match (self.text(field), self.sequence(field)) {
                (Some(text), _) => usize::from(!text.is_empty()),
                (_, Some(items)) => items.len(),
                _ => 0,
            },
        }
    }

    /// Borrow a text-valued field. `None` for age and sequence fields.
    pub fn text(&self, field: ProfileField) -> Option<&str> {
        match field {
            ProfileField::Name => Some(&self.name),
            ProfileField::Location => Some(&self.location),
            ProfileField::Occupation => Some(&self.occupation),
            ProfileField::LifeGoal => Some(&self.life_goal),
            ProfileField::Background => Some(&self.background),
            _ => None,
        }
    }

    pub(crate) fn text_mut(&mut self, field: ProfileField) -> Option<&mut String> {
        match field {
            ProfileField::Name => Some(&mut self.name),
            ProfileField::Location => Some(&mut self.location),
            ProfileField::Occupation => Some(&mut self.occupation),
            ProfileField::LifeGoal => Some(&mut self.life_goal),
            ProfileField::Background => Some(&mut self.background),
            _ => None,
        }
    }

    /// Borrow a sequence field. `None` for scalar fields.
    pub fn sequence(&self, field: ProfileField) -> Option<&Vec<String>> {
        match field {
            ProfileField::PersonalityTraits => Some(&self.personality_traits),
            ProfileField::Likes => Some(&self.likes),
            ProfileField::Fears => Some(&self.fears),
            ProfileField::ExtraInfo => Some(&self.extra_info),
            _ => None,
        }
    }

    pub(crate) fn sequence_mut(&mut self, field: ProfileField) -> Option<&mut Vec<String>> {
        match field {
            ProfileField::PersonalityTraits => Some(&mut self.personality_traits),
            ProfileField::Likes => Some(&mut self.likes),
            ProfileField::Fears => Some(&mut self.fears),
            ProfileField::ExtraInfo => Some(&mut self.extra_info),
            _ => None,
        }
    }

    /// Display name, or a neutral form of address when the name is unknown.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "adventurer"
        } else {
            &self.name
        }
    }
}
