//! Resource budget for tracked tools.
//!
//! Some tools cost real money or quota (web search). Each call to a tracked
//! tool increments a per-thread counter; once a counter goes above the
//! threshold the loop stops and asks the human whether to continue.

use crate::config::BudgetConfig;
use crate::session::{BudgetDecision, Interrupt, SessionState};

pub use crate::config::ResetPolicy;

/// Replies that approve further use of a tracked tool. Anything else declines.
const AFFIRMATIVE: &[&str] = &[
    "continue", "yes", "y", "ok", "okay", "sure", "proceed", "네", "예", "응", "좋아", "계속",
];

/// Whether a human reply approves continuing.
///
/// # Example
/// ```
/// use chefbot::agent::budget::is_affirmative;
///
/// assert!(is_affirmative("  Yes "));
/// assert!(is_affirmative("네"));
/// assert!(!is_affirmative("그만"));
/// ```
pub fn is_affirmative(reply: &str) -> bool {
    let reply = reply.trim().to_lowercase();
    AFFIRMATIVE.iter().any(|word| *word == reply)
}

/// Build the decision recorded for an interrupt.
pub fn classify_decision(interrupt: &Interrupt, reply: &str) -> BudgetDecision {
    BudgetDecision {
        count: interrupt.count,
        approved: is_affirmative(reply),
    }
}

/// System note appended to the thread after the human decides.
pub fn decision_note(resource: &str, decision: &BudgetDecision) -> String {
    if decision.approved {
        format!(
            "The user approved further {} calls after {} uses.",
            resource, decision.count
        )
    } else {
        format!(
            "The user declined further {} calls. Answer using current information only.",
            resource
        )
    }
}

/// Tracked tools and the threshold that triggers a confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetPolicy {
    pub tracked_tools: Vec<String>,
    pub threshold: u64,
    pub reset_policy: ResetPolicy,
}

impl Default for BudgetPolicy {
    fn default() -> Self {
        Self::from_config(&BudgetConfig::default())
    }
}

impl BudgetPolicy {
    pub fn from_config(config: &BudgetConfig) -> Self {
        Self {
            tracked_tools: config.tracked_tools.clone(),
            threshold: config.threshold,
            reset_policy: config.reset_policy,
        }
    }

    /// Same policy with a different threshold.
    pub fn with_threshold(mut self, threshold: u64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_reset_policy(mut self, reset_policy: ResetPolicy) -> Self {
        self.reset_policy = reset_policy;
        self
    }

    pub fn is_tracked(&self, tool: &str) -> bool {
        self.tracked_tools.iter().any(|t| t == tool)
    }

    /// Whether counters are cleared when a human turn begins.
    pub fn resets_per_turn(&self) -> bool {
        self.reset_policy == ResetPolicy::PerTurn
    }

    /// The first tracked resource over threshold that the human has not
    /// already ruled on at its current count during this turn.
    pub fn check(&self, state: &SessionState) -> Option<Interrupt> {
        self.tracked_tools.iter().find_map(|resource| {
            let count = state.counter(resource);
            if count <= self.threshold {
                return None;
            }
            let decided = state
                .budget_decisions
                .get(resource)
                .is_some_and(|d| d.count >= count);
            (!decided).then(|| Interrupt::budget_exceeded(resource, count, self.threshold))
        })
    }

    /// Whether the human declined `tool` during this turn.
    pub fn is_declined(&self, state: &SessionState, tool: &str) -> bool {
        self.is_tracked(tool)
            && state
                .budget_decisions
                .get(tool)
                .is_some_and(|d| !d.approved)
    }
}
