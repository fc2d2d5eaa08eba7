//! Deterministic texts used when a dialogue collaborator fails or times out.

use game_rules::{MissingField, Profile, Stage};

/// Reply to a free dialogue turn.
pub fn reply(profile: &Profile) -> String {
    format!("I'm listening, {}. Tell me more.", profile.display_name())
}

/// Question asking for the first missing item.
pub fn collection_question(profile: &Profile, missing: &[MissingField]) -> String {
    let topic = missing
        .first()
        .map(|missing| missing.field().label())
        .unwrap_or("yourself");

    if profile.name.is_empty() {
        format!("Tell me about your {}.", topic)
    } else {
        format!("{}, tell me about your {}.", profile.name, topic)
    }
}

/// Introduction to a newly entered stage.
pub fn stage_intro(completed: Stage, entered: Stage, map_name: &str) -> String {
    format!(
        "Congratulations! You have completed stage {}! New map: {}. Now you are moving to stage {}.",
        completed.number(),
        map_name,
        entered.number()
    )
}

/// Closing narration after the boss stage.
pub fn closing(profile: &Profile, boss_goal: Option<&str>) -> String {
    let goal = boss_goal
        .filter(|goal| !goal.is_empty())
        .or_else(|| Some(profile.life_goal.as_str()).filter(|goal| !goal.is_empty()));

    match goal {
        Some(goal) => format!(
            "Congratulations! {} has achieved their final goal '{}'!",
            profile.display_name(),
            goal
        ),
        None => format!(
            "Congratulations! {} has completed the journey!",
            profile.display_name()
        ),
    }
}
