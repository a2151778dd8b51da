use crate::domain::state::{QuizId, TeamId};

/// A competing team. `sequence` fixes the rotation order for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub id: TeamId,
    pub quiz_id: QuizId,
    pub name: String,
    /// Claimed by the first player to take the captain seat; cleared on reset.
    pub captain_name: Option<String>,
    pub score: i32,
    pub sequence: u32,
}

/// Ids of a sequence-ordered roster, in order.
pub fn team_ids(teams: &[Team]) -> Vec<TeamId> {
    teams.iter().map(|t| t.id).collect()
}
