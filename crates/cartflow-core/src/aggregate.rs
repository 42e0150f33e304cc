//! Decision function abstraction.

use crate::error::DomainError;
use crate::event::DomainEvent;

/// An aggregate expressed as a pure decision function over its history.
///
/// State is never kept between calls: every decision rebuilds a fresh
/// snapshot by folding the stream with [`Aggregate::replay`].
pub trait Aggregate {
    /// Commands this aggregate decides on.
    type Command;

    /// Events this aggregate produces and folds.
    type Event: DomainEvent;

    /// Snapshot derived from the history. `Default` is the empty stream.
    type State: Default;

    /// Folds a single event into the state, returning the next snapshot.
    fn apply(state: Self::State, event: &Self::Event) -> Self::State;

    /// Derives new events from a command and the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns a `DomainError` when the command is rejected by business rules.
    fn decide(
        command: &Self::Command,
        state: &Self::State,
    ) -> Result<Vec<Self::Event>, DomainError>;

    /// Rebuilds the state from an ordered history.
    fn replay(history: &[Self::Event]) -> Self::State {
        history
            .iter()
            .fold(Self::State::default(), |state, event| Self::apply(state, event))
    }

    /// Replays `history` and decides on `command`.
    ///
    /// # Errors
    ///
    /// Propagates the rejection returned by [`Aggregate::decide`].
    fn handle(
        command: &Self::Command,
        history: &[Self::Event],
    ) -> Result<Vec<Self::Event>, DomainError> {
        Self::decide(command, &Self::replay(history))
    }
}
