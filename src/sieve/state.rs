//! Per-evaluation command and condition state.
//!
//! Both live in the evaluation context and are threaded through every
//! command. Nested blocks run to completion before the enclosing command
//! commits its own transition, so a single flat copy of each is enough as
//! long as evaluation stays sequential and depth-first.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandState {
    /// True until the first command that is not `require`.
    pub in_prolog: bool,
    pub rejected: bool,
    pub implicit_keep: bool,
    pub has_actions: bool,
}

impl Default for CommandState {
    fn default() -> Self {
        Self {
            in_prolog: true,
            rejected: false,
            implicit_keep: true,
            has_actions: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionState {
    pub else_allowed: bool,
    pub last_test_result: bool,
}

impl ConditionState {
    /// Records the outcome of an `if` or `elsif` test.
    pub fn record(&mut self, result: bool) {
        self.else_allowed = true;
        self.last_test_result = result;
    }

    /// An `elsif`/`else` branch may run only if no earlier branch of the chain did.
    pub fn is_else_runnable(&self) -> bool {
        self.else_allowed && !self.last_test_result
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_chain() {
        let mut state = ConditionState::default();
        assert!(!state.is_else_runnable());

        state.record(false);
        assert!(state.else_allowed);
        assert!(state.is_else_runnable());

        state.record(true);
        assert!(!state.is_else_runnable());

        state.reset();
        assert!(!state.else_allowed);
    }

    #[test]
    fn test_command_state_defaults() {
        let state = CommandState::default();
        assert!(state.in_prolog);
        assert!(state.implicit_keep);
        assert!(!state.rejected);
        assert!(!state.has_actions);
    }
}
