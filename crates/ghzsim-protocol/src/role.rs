use serde::{Deserialize, Serialize};

/// Structural role of a node, fixed when the node is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Coordinator,
    /// The participant whose pair every other pair is composed onto. It
    /// receives the coordinator's X-basis outcome as its correction.
    DistinguishedParticipant,
    Participant,
}

impl Role {
    pub fn is_participant(self) -> bool {
        !matches!(self, Role::Coordinator)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Coordinator => write!(f, "coordinator"),
            Role::DistinguishedParticipant => write!(f, "distinguished participant"),
            Role::Participant => write!(f, "participant"),
        }
    }
}
