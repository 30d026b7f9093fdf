//! Lifecycle graph: which state changes are legal.

use serde::{Deserialize, Serialize};

use crate::order::{Order, OrderState, TransitionError};

/// The set of legal edges between order states.
///
/// ```text
/// Strict:    Created ─► Confirmed ─► ... ─► Invoiced ─► Closed
///
/// Extended:  Strict, plus
///            any non-terminal state ──► Cancelled
///            any working state      ──► OnHold ──► (the state it was held from)
/// ```
///
/// `is_legal` is pure over the state pair. The hold/resume precondition
/// depends on the order's history and is enforced by [`LifecycleGraph::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleGraph {
    /// Forward-only single chain.
    #[default]
    Strict,

    /// Strict chain plus cancellation and hold/resume.
    Extended,
}

impl LifecycleGraph {
    /// Returns every state reachable under this graph.
    pub fn states(&self) -> &'static [OrderState] {
        match self {
            LifecycleGraph::Strict => &OrderState::CHAIN,
            LifecycleGraph::Extended => &OrderState::ALL,
        }
    }

    /// Returns true if `state` is part of this graph.
    pub fn contains(&self, state: OrderState) -> bool {
        self.states().contains(&state)
    }

    /// Returns true if `from -> to` is an edge of this graph.
    ///
    /// Total over every state pair: backward edges, skips, self-loops, and
    /// edges touching a state outside the graph are all illegal.
    pub fn is_legal(&self, from: OrderState, to: OrderState) -> bool {
        if from.successor() == Some(to) {
            return true;
        }

        match self {
            LifecycleGraph::Strict => false,
            LifecycleGraph::Extended => match (from, to) {
                (from, OrderState::Cancelled) => !from.is_terminal(),
                (from, OrderState::OnHold) => from.is_on_chain() && !from.is_terminal(),
                (OrderState::OnHold, to) => to.is_on_chain() && !to.is_terminal(),
                _ => false,
            },
        }
    }

    /// Returns the states `from` may move to, in lifecycle order.
    pub fn legal_targets(&self, from: OrderState) -> Vec<OrderState> {
        self.states()
            .iter()
            .copied()
            .filter(|&to| self.is_legal(from, to))
            .collect()
    }

    /// Validates moving `order` to `target`, including edge preconditions.
    pub fn check(&self, order: &Order, target: OrderState) -> Result<(), TransitionError> {
        let current = order.state();
        let allowed = self.is_legal(current, target)
            && match current {
                OrderState::OnHold if target != OrderState::Cancelled => {
                    order.held_from() == Some(target)
                }
                _ => true,
            };

        if allowed {
            Ok(())
        } else {
            Err(TransitionError {
                current,
                attempted: target,
            })
        }
    }

    /// Returns the graph name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleGraph::Strict => "strict",
            LifecycleGraph::Extended => "extended",
        }
    }
}

impl std::fmt::Display for LifecycleGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LifecycleGraph {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(LifecycleGraph::Strict),
            "extended" => Ok(LifecycleGraph::Extended),
            other => Err(format!("unknown lifecycle graph: {other}")),
        }
    }
}
