//! Target vs. extracted result, and the paid reward
//!
//! Divergence policy is force-snap for every game: any mismatch in the
//! extracted symbols moves the final transforms onto the target's terminal
//! transforms before the reward is looked up, so the authoritative result is
//! always the one paid.

use serde::Serialize;

use crate::games::MiniGameStrategy;
use crate::outcome::{Outcome, TargetOutcome};
use crate::sim::SimulationBody;

/// Result of reconciling one play
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciliation {
    pub target: TargetOutcome,
    /// What the settled physics showed
    pub extracted: Outcome,
    /// What the final frame shows after any correction
    pub outcome: Outcome,
    pub snapped: bool,
    pub reward: u32,
    pub jackpot: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct Reconciler {
    jackpot_threshold: u32,
}

impl Reconciler {
    pub fn new(jackpot_threshold: u32) -> Self {
        Self { jackpot_threshold }
    }

    fn is_jackpot(&self, reward: u32) -> bool {
        reward > 0 && reward >= self.jackpot_threshold
    }

    /// Reconcile settled bodies against the target
    pub fn reconcile(
        &self,
        strategy: &dyn MiniGameStrategy,
        target: &TargetOutcome,
        bodies: &mut [SimulationBody],
    ) -> Reconciliation {
        let extracted = strategy.extract(bodies);
        let snapped = extracted != *target;
        let outcome = if snapped {
            log::warn!(
                "{} landed on {:?} instead of {:?}; snapping to target",
                strategy.kind(),
                extracted,
                target
            );
            strategy.snap(target, bodies);
            strategy.extract(bodies)
        } else {
            extracted.clone()
        };
        if outcome != *target {
            log::error!("{} snap left {:?}, paying target anyway", strategy.kind(), outcome);
        }

        let reward = strategy.reward_lookup(target);
        log::debug!("{} reconciled: reward {reward}, snapped {snapped}", strategy.kind());
        Reconciliation {
            target: target.clone(),
            extracted,
            outcome,
            snapped,
            reward,
            jackpot: self.is_jackpot(reward),
        }
    }

    /// Scratch cards have nothing to extract; the revealed amount is the target
    pub fn reconcile_reveal(&self, reward_amount: u32) -> Reconciliation {
        let outcome = Outcome::Scratch { reward_amount };
        Reconciliation {
            target: outcome.clone(),
            extracted: outcome.clone(),
            outcome,
            snapped: false,
            reward: reward_amount,
            jackpot: self.is_jackpot(reward_amount),
        }
    }
}
