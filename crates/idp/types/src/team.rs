//! Team records

use crate::TeamId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A team owning zero or more services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,

    /// Globally unique team name
    pub name: String,

    pub description: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Team {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: TeamId::generate(),
            name: name.into(),
            description,
            created_at: Utc::now(),
        }
    }
}
