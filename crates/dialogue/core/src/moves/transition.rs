use crate::graph::GraphModel;
use crate::state::SessionState;

/// Defines how a concrete move mutates session state while mirroring the
/// preconditions encoded into the synthesized planning domain.
///
/// Implementors override the validation hooks to surface pre- and
/// post-conditions that must hold around the mutation. All hooks receive
/// read-only access to the graph and must stay side-effect free.
pub trait MoveTransition {
    type Error;

    /// Validates pre-conditions using the state **before** mutation.
    ///
    /// A move is legal exactly when this returns `Ok`.
    fn pre_validate(&self, _state: &SessionState, _graph: &GraphModel) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Applies the move by mutating the state directly. Implementations should
    /// assume that `pre_validate` has already run successfully.
    fn apply(&self, state: &mut SessionState, graph: &GraphModel) -> Result<(), Self::Error>;

    /// Validates post-conditions using the state **after** mutation.
    fn post_validate(&self, _state: &SessionState, _graph: &GraphModel) -> Result<(), Self::Error> {
        Ok(())
    }
}
