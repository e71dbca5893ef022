// Two-step confirmation for destructive actions

#[derive(Debug, Clone, PartialEq, Eq)]
enum GateState<T> {
    Closed,
    Open(T),
}

/// Holds at most one pending destructive action. Nothing is deleted until
/// `confirm` hands the target back to the caller.
#[derive(Debug, Clone)]
pub struct ConfirmationGate<T> {
    state: GateState<T>,
}

impl<T> Default for ConfirmationGate<T> {
    fn default() -> Self {
        Self {
            state: GateState::Closed,
        }
    }
}

impl<T> ConfirmationGate<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the gate for `target`, replacing any pending target.
    pub fn request(&mut self, target: T) {
        self.state = GateState::Open(target);
    }

    pub fn cancel(&mut self) {
        self.state = GateState::Closed;
    }

    pub fn confirm(&mut self) -> Option<T> {
        match std::mem::replace(&mut self.state, GateState::Closed) {
            GateState::Open(target) => Some(target),
            GateState::Closed => None,
        }
    }

    pub fn pending(&self) -> Option<&T> {
        match &self.state {
            GateState::Open(target) => Some(target),
            GateState::Closed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_without_request() {
        let mut gate: ConfirmationGate<String> = ConfirmationGate::new();
        assert_eq!(gate.confirm(), None);
        assert_eq!(gate.pending(), None);
    }

    #[test]
    fn test_cancel_discards_target() {
        let mut gate = ConfirmationGate::new();
        gate.request("x".to_string());
        gate.cancel();
        assert_eq!(gate.confirm(), None);
        gate.cancel();
        assert_eq!(gate.pending(), None);
    }

    #[test]
    fn test_request_overwrites_pending() {
        let mut gate = ConfirmationGate::new();
        gate.request("a");
        gate.request("b");
        assert_eq!(gate.pending(), Some(&"b"));
        assert_eq!(gate.confirm(), Some("b"));
        assert_eq!(gate.confirm(), None);
    }
}
