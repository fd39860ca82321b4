//! Canned insight replies and a short rolling chat memory

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::models::ChatTurn;
use crate::report::Summary;

/// Turns retained in memory
pub const CHAT_MEMORY_LIMIT: usize = 5;

/// Reply for a query, keyed by the first matching keyword
///
/// Keywords are checked in a fixed order, so "bill usage" answers about bills.
pub fn canned_reply(query: &str, summary: &Summary) -> String {
    let query = query.trim().to_lowercase();
    let has = |keys: &[&str]| keys.iter().any(|k| query.contains(k));

    if has(&["bill"]) {
        format!(
            "Your average monthly bill is ₹{:.2}. The highest usage was in {}.",
            summary.average_bill, summary.peak.month
        )
    } else if has(&["energy", "usage"]) {
        format!(
            "Total recorded usage: {:.2} kWh. Peak in {}, lowest in {}.",
            summary.total_consumption, summary.peak.month, summary.lowest.month
        )
    } else if has(&["reduce", "save"]) {
        "Try running heavy appliances during off-peak hours and review your top 3 high-consumption months."
            .to_string()
    } else if has(&["predict"]) {
        "Use the Predict feature to forecast upcoming month bills from your usage trend.".to_string()
    } else if has(&["thanks"]) {
        "You're welcome! You can ask for summaries or predictions anytime.".to_string()
    } else {
        "I can analyze your energy trends, give insights, or forecast next month's bill!".to_string()
    }
}

/// Bounded, process-wide chat history
#[derive(Debug, Default)]
pub struct ChatMemory {
    turns: Mutex<VecDeque<ChatTurn>>,
}

impl ChatMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn, evicting the oldest beyond [`CHAT_MEMORY_LIMIT`]
    ///
    /// Returns the memory after the append, oldest first.
    pub fn record(&self, user: &str, assistant: &str) -> Result<Vec<ChatTurn>> {
        let mut turns = self
            .turns
            .lock()
            .map_err(|_| Error::State("Failed to acquire chat memory lock".into()))?;
        turns.push_back(ChatTurn {
            user: user.to_string(),
            assistant: assistant.to_string(),
        });
        while turns.len() > CHAT_MEMORY_LIMIT {
            turns.pop_front();
        }
        Ok(turns.iter().cloned().collect())
    }
}
