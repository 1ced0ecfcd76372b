//! Order workflow: states, transitions and the policy deciding which edges
//! are allowed.
//!
//! Strict edges:
//!
//! ```text
//! confirm           draft                          -> confirmed
//! start_production  confirmed                      -> production
//! mark_done         production                     -> done
//! cancel            draft | confirmed | production -> cancel
//! reset_to_draft    confirmed | production | cancel -> draft
//! ```

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use printshop_core::{DomainError, DomainResult};

/// Workflow state of a custom order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderState {
    #[default]
    Draft,
    Confirmed,
    Production,
    Done,
    Cancel,
}

impl OrderState {
    pub fn code(self) -> &'static str {
        match self {
            OrderState::Draft => "draft",
            OrderState::Confirmed => "confirmed",
            OrderState::Production => "production",
            OrderState::Done => "done",
            OrderState::Cancel => "cancel",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderState::Draft => "Draft",
            OrderState::Confirmed => "Confirmed",
            OrderState::Production => "In Production",
            OrderState::Done => "Done",
            OrderState::Cancel => "Cancelled",
        }
    }
}

impl core::fmt::Display for OrderState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

/// A workflow operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Confirm,
    StartProduction,
    MarkDone,
    Cancel,
    ResetToDraft,
}

impl Transition {
    pub const ALL: [Transition; 5] = [
        Transition::Confirm,
        Transition::StartProduction,
        Transition::MarkDone,
        Transition::Cancel,
        Transition::ResetToDraft,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Transition::Confirm => "confirm",
            Transition::StartProduction => "start_production",
            Transition::MarkDone => "mark_done",
            Transition::Cancel => "cancel",
            Transition::ResetToDraft => "reset_to_draft",
        }
    }

    pub fn target(self) -> OrderState {
        match self {
            Transition::Confirm => OrderState::Confirmed,
            Transition::StartProduction => OrderState::Production,
            Transition::MarkDone => OrderState::Done,
            Transition::Cancel => OrderState::Cancel,
            Transition::ResetToDraft => OrderState::Draft,
        }
    }

    /// Source states accepted under [`WorkflowPolicy::Strict`].
    pub fn strict_sources(self) -> &'static [OrderState] {
        use OrderState::*;
        match self {
            Transition::Confirm => &[Draft],
            Transition::StartProduction => &[Confirmed],
            Transition::MarkDone => &[Production],
            Transition::Cancel => &[Draft, Confirmed, Production],
            Transition::ResetToDraft => &[Confirmed, Production, Cancel],
        }
    }
}

/// Which transitions the workflow accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowPolicy {
    /// Only the edges of the transition graph; `done` is terminal.
    #[default]
    Strict,
    /// Every transition assigns its target state unconditionally.
    Permissive,
}

impl WorkflowPolicy {
    pub fn allows(self, from: OrderState, transition: Transition) -> bool {
        match self {
            WorkflowPolicy::Permissive => true,
            WorkflowPolicy::Strict => transition.strict_sources().contains(&from),
        }
    }

    /// Resolve the state reached by `transition` from `from`.
    pub fn resolve(self, from: OrderState, transition: Transition) -> DomainResult<OrderState> {
        if !self.allows(from, transition) {
            return Err(DomainError::invalid_transition(format!(
                "cannot {} an order in state '{}'",
                transition.name(),
                from
            )));
        }
        Ok(transition.target())
    }

    /// Transitions that can be offered for an order in `state`.
    pub fn available(self, state: OrderState) -> Vec<Transition> {
        Transition::ALL
            .into_iter()
            .filter(|t| self.allows(state, *t))
            .collect()
    }
}

impl FromStr for WorkflowPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(WorkflowPolicy::Strict),
            "permissive" => Ok(WorkflowPolicy::Permissive),
            other => Err(DomainError::validation(format!("unknown workflow policy '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATES: [OrderState; 5] = [
        OrderState::Draft,
        OrderState::Confirmed,
        OrderState::Production,
        OrderState::Done,
        OrderState::Cancel,
    ];

    #[test]
    fn happy_path_is_allowed_under_strict() {
        let policy = WorkflowPolicy::Strict;
        let mut state = OrderState::Draft;
        for t in [Transition::Confirm, Transition::StartProduction, Transition::MarkDone] {
            state = policy.resolve(state, t).unwrap();
        }
        assert_eq!(state, OrderState::Done);
    }

    #[test]
    fn done_is_terminal_under_strict() {
        assert!(WorkflowPolicy::Strict.available(OrderState::Done).is_empty());
    }

    #[test]
    fn confirm_from_cancel_is_rejected() {
        let err = WorkflowPolicy::Strict
            .resolve(OrderState::Cancel, Transition::Confirm)
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::invalid_transition("cannot confirm an order in state 'cancel'")
        );
    }

    #[test]
    fn cancelled_orders_can_be_reset() {
        assert_eq!(
            WorkflowPolicy::Strict.available(OrderState::Cancel),
            vec![Transition::ResetToDraft]
        );
    }

    #[test]
    fn permissive_policy_reaches_every_target_from_every_state() {
        for from in STATES {
            for t in Transition::ALL {
                assert_eq!(WorkflowPolicy::Permissive.resolve(from, t).unwrap(), t.target());
            }
        }
    }

    #[test]
    fn strict_graph_has_no_self_loops() {
        for from in STATES {
            for t in WorkflowPolicy::Strict.available(from) {
                assert_ne!(t.target(), from, "{} loops on {from}", t.name());
            }
        }
    }

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!(" Permissive ".parse::<WorkflowPolicy>().unwrap(), WorkflowPolicy::Permissive);
        assert!("lenient".parse::<WorkflowPolicy>().is_err());
    }

    #[test]
    fn production_label_matches_ui() {
        assert_eq!(OrderState::Production.label(), "In Production");
        assert_eq!(OrderState::Cancel.label(), "Cancelled");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn any_transition() -> impl Strategy<Value = Transition> {
            prop::sample::select(Transition::ALL.to_vec())
        }

        proptest! {
            /// Property: under the strict policy, a rejected transition keeps
            /// the state and an accepted one lands on its target; once done,
            /// always done.
            #[test]
            fn strict_walks_stay_on_the_graph(walk in prop::collection::vec(any_transition(), 0..40)) {
                let policy = WorkflowPolicy::Strict;
                let mut state = OrderState::Draft;
                let mut reached_done = false;

                for t in walk {
                    match policy.resolve(state, t) {
                        Ok(next) => {
                            prop_assert!(t.strict_sources().contains(&state));
                            prop_assert_eq!(next, t.target());
                            state = next;
                        }
                        Err(e) => {
                            let is_invalid_transition = matches!(e, DomainError::InvalidTransition(_));
                            prop_assert!(is_invalid_transition);
                        }
                    }
                    reached_done |= state == OrderState::Done;
                    if reached_done {
                        prop_assert_eq!(state, OrderState::Done);
                    }
                }
            }

            /// Property: the permissive policy ends on the last transition's target.
            #[test]
            fn permissive_walks_end_on_last_target(walk in prop::collection::vec(any_transition(), 1..40)) {
                let mut state = OrderState::Draft;
                for t in &walk {
                    state = WorkflowPolicy::Permissive.resolve(state, *t).unwrap();
                }
                prop_assert_eq!(state, walk[walk.len() - 1].target());
            }
        }
    }
}
