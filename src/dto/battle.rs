use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{BattleEntity, BattleParticipantEntity, BattleStatus},
    dto::format_system_time,
    services::matchmaking_service::MatchOutcome,
};

/// Payload submitted by a user looking for an opponent.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct FindOpponentRequest {
    /// Identifier of the searching user.
    pub user_id: Uuid,
    /// Name shown to the opponent.
    #[validate(length(min = 1, max = 64))]
    pub display_name: String,
}

/// Result of a matchmaking attempt.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchResponse {
    /// Whether an opponent was found or a new search was recorded.
    pub outcome: MatchOutcomeKind,
    /// The battle record after the attempt.
    pub battle: BattleSummary,
}

/// Discriminant telling the client which side of the match it is on.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum MatchOutcomeKind {
    /// The caller claimed an existing search and the battle is on.
    Found,
    /// No opponent was available; the caller is now searching.
    Searching,
}

impl From<MatchOutcome> for MatchResponse {
    fn from(outcome: MatchOutcome) -> Self {
        match outcome {
            MatchOutcome::Found(battle) => Self {
                outcome: MatchOutcomeKind::Found,
                battle: battle.into(),
            },
            MatchOutcome::Searching(battle) => Self {
                outcome: MatchOutcomeKind::Searching,
                battle: battle.into(),
            },
        }
    }
}

/// Public projection of a battle document.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BattleSummary {
    /// Battle identifier, equal to the initiator's user id.
    pub id: Uuid,
    /// Current matchmaking status.
    pub status: BattleStatus,
    /// Problem both sides compete on.
    pub problem_id: String,
    /// When the search was opened (RFC 3339).
    pub created_at: String,
    /// Both sides of the battle, initiator first.
    pub participants: Vec<BattleParticipantSummary>,
}

/// Public projection of one battle participant.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BattleParticipantSummary {
    /// Participant identifier.
    pub user_id: Uuid,
    /// Name shown to the opponent.
    pub display_name: String,
    /// When the participant entered the battle (RFC 3339).
    pub join_time: String,
}

impl From<BattleEntity> for BattleSummary {
    fn from(entity: BattleEntity) -> Self {
        Self {
            id: entity.id,
            status: entity.status,
            problem_id: entity.problem_id,
            created_at: format_system_time(entity.created_at),
            participants: entity.participants.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<BattleParticipantEntity> for BattleParticipantSummary {
    fn from(entity: BattleParticipantEntity) -> Self {
        Self {
            user_id: entity.user_id,
            display_name: entity.display_name,
            join_time: format_system_time(entity.join_time),
        }
    }
}
