//! Lifecycle of a facade's underlying row.
//!
//! `Uncommitted -> Committed -> Deleted`. `Deleted` is terminal.

use std::fmt;

/// Lifecycle state of a row as seen by its facade.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    /// Created in memory, never inserted.
    Uncommitted,
    /// Present in the store (or fetched; see `RecordFacade::is_valid_record`).
    Committed,
    /// Deleted through this facade.
    Deleted,
}

/// Persistence operation that moves a row between states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Insert,
    Update,
    Delete,
}

/// Why a transition is not allowed from a state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IllegalTransition {
    AlreadyCommitted,
    NotCommitted,
    AlreadyDeleted,
}

impl fmt::Display for IllegalTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            IllegalTransition::AlreadyCommitted => "row already exists in the store",
            IllegalTransition::NotCommitted => "row was not inserted yet",
            IllegalTransition::AlreadyDeleted => "row was already deleted",
        };
        f.write_str(message)
    }
}

impl LifecycleState {
    /// State a handle starts in, judged by whether it was inserted yet.
    pub fn initial(is_new: bool) -> Self {
        if is_new {
            LifecycleState::Uncommitted
        } else {
            LifecycleState::Committed
        }
    }

    /// Check that `transition` may start from this state.
    ///
    /// Insert reports "already committed" before "deleted", update and
    /// delete report "not committed" before "deleted", matching the order
    /// in which the facade's guards run.
    pub fn check(self, transition: Transition) -> Result<(), IllegalTransition> {
        match (transition, self) {
            (Transition::Insert, LifecycleState::Uncommitted) => Ok(()),
            (Transition::Insert, _) => Err(IllegalTransition::AlreadyCommitted),
            (_, LifecycleState::Uncommitted) => Err(IllegalTransition::NotCommitted),
            (_, LifecycleState::Deleted) => Err(IllegalTransition::AlreadyDeleted),
            (_, LifecycleState::Committed) => Ok(()),
        }
    }

    /// State after `transition` completed successfully.
    pub fn apply(self, transition: Transition) -> Result<Self, IllegalTransition> {
        self.check(transition)?;
        Ok(match transition {
            Transition::Insert | Transition::Update => LifecycleState::Committed,
            Transition::Delete => LifecycleState::Deleted,
        })
    }

    pub fn is_deleted(self) -> bool {
        self == LifecycleState::Deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let state = LifecycleState::initial(true);
        let state = state.apply(Transition::Insert).unwrap();
        assert_eq!(state, LifecycleState::Committed);
        let state = state.apply(Transition::Update).unwrap();
        assert_eq!(state, LifecycleState::Committed);
        let state = state.apply(Transition::Delete).unwrap();
        assert!(state.is_deleted());
    }

    #[test]
    fn test_insert_twice() {
        assert_eq!(
            LifecycleState::Committed.check(Transition::Insert),
            Err(IllegalTransition::AlreadyCommitted)
        );
    }

    #[test]
    fn test_update_and_delete_before_insert() {
        for transition in [Transition::Update, Transition::Delete] {
            assert_eq!(
                LifecycleState::Uncommitted.check(transition),
                Err(IllegalTransition::NotCommitted)
            );
        }
    }

    #[test]
    fn test_deleted_is_terminal() {
        for transition in [Transition::Insert, Transition::Update, Transition::Delete] {
            assert!(LifecycleState::Deleted.apply(transition).is_err());
        }
    }
}
