use thiserror::Error;

/// The errors of the transducer operations.
///
/// States and symbols are rendered with their `Debug` representation so that
/// the error does not depend on the state and symbol types.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FstError {
    #[error("Transducer must be acyclic, found a cycle through state {state}")]
    CycleDetected { state: String },

    #[error("Cannot compose a deleting transducer ({deletion}) with an inserting transducer ({insertion})")]
    AmbiguousComposition { deletion: String, insertion: String },

    #[error("Training sequence {sequence} is not in the language: no transition on {symbol} from state {state} at position {position}")]
    UntrainableSequence {
        sequence: usize,
        position: usize,
        symbol: String,
        state: String,
    },

    #[error("Precondition violated: {0}")]
    Precondition(String),
}
