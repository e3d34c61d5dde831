//! Cross-competency message log

use crate::competency::CompetencyId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossCompetencyMessage {
    pub id: String,
    pub sender: CompetencyId,
    pub receiver: CompetencyId,
    pub message: String,
    pub data: JsonValue,
    pub timestamp: DateTime<Utc>,
    pub requires_response: bool,
}

/// Ordered audit log plus a per-receiver queue of messages awaiting a response
#[derive(Debug, Default)]
pub struct Mailbox {
    log: Vec<CrossCompetencyMessage>,
    pending: HashMap<CompetencyId, VecDeque<CrossCompetencyMessage>>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the log. Senders and receivers are checked by the caller.
    pub fn post(
        &mut self,
        sender: CompetencyId,
        receiver: CompetencyId,
        message: String,
        data: JsonValue,
        requires_response: bool,
    ) -> &CrossCompetencyMessage {
        let entry = CrossCompetencyMessage {
            id: uuid::Uuid::new_v4().to_string(),
            sender,
            receiver,
            message,
            data,
            timestamp: Utc::now(),
            requires_response,
        };

        if entry.requires_response {
            self.pending
                .entry(entry.receiver.clone())
                .or_default()
                .push_back(entry.clone());
        }

        self.log.push(entry);
        &self.log[self.log.len() - 1]
    }

    /// Drain messages awaiting a response from `receiver`, oldest first
    pub fn take_pending(&mut self, receiver: &CompetencyId) -> Vec<CrossCompetencyMessage> {
        self.pending
            .remove(receiver)
            .map(|queue| queue.into_iter().collect())
            .unwrap_or_default()
    }

    /// Forget queued deliveries to a competency that is leaving the registry
    pub fn drop_pending(&mut self, receiver: &CompetencyId) {
        self.pending.remove(receiver);
    }

    pub fn log(&self) -> &[CrossCompetencyMessage] {
        &self.log
    }
}
