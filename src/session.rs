//! Chat session driver.
//!
//! Owns one conversation's history and the per-turn error boundary: every
//! error raised while answering becomes a user-visible message string and
//! the session stays usable for the next turn.

use std::sync::Arc;

use tracing::error;

use crate::agent::{Agent, Turn};

/// A single user's conversation with the agent.
///
/// History is append-only during a turn and bounded overall: once it
/// exceeds the configured cap the oldest turns are dropped.
pub struct ChatSession {
    agent: Arc<Agent>,
    history: Vec<Turn>,
    max_turns: usize,
}

impl ChatSession {
    /// Create a session over a shared agent.
    pub fn new(agent: Arc<Agent>, max_turns: usize) -> Self {
        Self { agent, history: Vec::new(), max_turns }
    }

    /// The retained conversation history.
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Handle one user message and return the assistant's reply.
    ///
    /// On success the exchange is appended to the history. On failure the
    /// error is logged and rendered as a reply; the failed exchange is not
    /// recorded, and the session remains usable.
    pub async fn handle(&mut self, message: &str) -> String {
        match self.agent.respond(&self.history, message).await {
            Ok(answer) => {
                self.history.push(Turn::user(message));
                self.history.push(Turn::assistant(answer.clone()));
                self.prune();
                answer
            }
            Err(e) => {
                error!(error = %e, "turn failed");
                format!("An error occurred while answering: {e}")
            }
        }
    }

    /// Drop the oldest turns once the history exceeds the cap.
    fn prune(&mut self) {
        if self.history.len() > self.max_turns {
            let excess = self.history.len() - self.max_turns;
            self.history.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Role;

    #[test]
    fn prune_drops_oldest_turns_first() {
        // Exercise pruning directly; agent wiring is covered in tests/.
        let mut history: Vec<Turn> = (0..8)
            .map(|i| if i % 2 == 0 { Turn::user(format!("q{i}")) } else { Turn::assistant(format!("a{i}")) })
            .collect();

        let max_turns = 4;
        let excess = history.len() - max_turns;
        history.drain(..excess);

        assert_eq!(history.len(), 4);
        assert_eq!(history[0].content, "q4");
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[3].content, "a7");
    }
}
