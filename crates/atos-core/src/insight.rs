//! Insight records.
//!
//! An insight is a guidance item surfaced to a user, plus acknowledgement
//! state. Persistence belongs to the caller; this module only creates and
//! transitions records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::types::GuidanceItem;

#[derive(Error, Debug, PartialEq)]
pub enum InsightError {
    #[error("Insight {id} was already acknowledged by {by}")]
    AlreadyAcknowledged { id: Uuid, by: String },

    #[error("Acknowledging user must not be empty")]
    MissingAcknowledger,

    #[error("Insight {id}: acknowledged flag disagrees with acknowledgedBy")]
    Inconsistent { id: Uuid },
}

/// A guidance item surfaced as an insight.
///
/// Deserialization rejects a record whose `acknowledged` flag and
/// `acknowledgedBy` disagree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", try_from = "StoredInsight")]
pub struct Insight {
    pub id: Uuid,

    pub item: GuidanceItem,

    pub acknowledged: bool,

    #[serde(default)]
    pub acknowledged_by: Option<String>,

    #[serde(default)]
    pub acknowledged_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

/// Wire shape of a stored insight, checked before it becomes an [`Insight`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredInsight {
    id: Uuid,
    item: GuidanceItem,
    acknowledged: bool,
    #[serde(default)]
    acknowledged_by: Option<String>,
    #[serde(default)]
    acknowledged_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<StoredInsight> for Insight {
    type Error = InsightError;

    fn try_from(stored: StoredInsight) -> Result<Self, Self::Error> {
        if stored.acknowledged != stored.acknowledged_by.is_some() {
            return Err(InsightError::Inconsistent { id: stored.id });
        }
        Ok(Self {
            id: stored.id,
            item: stored.item,
            acknowledged: stored.acknowledged,
            acknowledged_by: stored.acknowledged_by,
            acknowledged_at: stored.acknowledged_at,
            created_at: stored.created_at,
        })
    }
}

impl Insight {
    /// Raise a fresh insight for an item.
    ///
    /// Each call gets a new id, so a condition that reappears in a later
    /// snapshot is a new insight even after the old one was acknowledged.
    pub fn raise(item: GuidanceItem) -> Self {
        Self {
            id: Uuid::new_v4(),
            item,
            acknowledged: false,
            acknowledged_by: None,
            acknowledged_at: None,
            created_at: Utc::now(),
        }
    }

    /// Acknowledge the insight. Terminal.
    pub fn acknowledge(&mut self, by: impl Into<String>) -> Result<(), InsightError> {
        if self.acknowledged {
            return Err(InsightError::AlreadyAcknowledged {
                id: self.id,
                by: self.acknowledged_by.clone().unwrap_or_default(),
            });
        }
        let by = by.into();
        if by.trim().is_empty() {
            return Err(InsightError::MissingAcknowledger);
        }
        self.acknowledged = true;
        self.acknowledged_by = Some(by);
        self.acknowledged_at = Some(Utc::now());
        tracing::debug!(insight = %self.id, item = %self.item.id, "insight acknowledged");
        Ok(())
    }
}

/// Raise one insight per item, preserving order.
pub fn raise_insights(items: impl IntoIterator<Item = GuidanceItem>) -> Vec<Insight> {
    items.into_iter().map(Insight::raise).collect()
}
