use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the stateful map subsystem. All of them are local,
/// synchronous and deterministic; none of them is retried here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// Attempt to hide a background layer directly. A background can only
    /// be replaced by displaying another background, so hitting this in
    /// production means the UI offered an action it should not have.
    #[error("invalid transition: background layer {tile_set_id} cannot be hidden directly")]
    InvalidTransition { tile_set_id: Uuid },

    /// A batch visibility change would leave more than one background
    /// displayed. The store refuses to silently pick one.
    #[error("ambiguous background selection: {tile_set_ids:?}")]
    AmbiguousBackgroundSelection { tile_set_ids: Vec<Uuid> },

    /// Settings payload missing required structure. Ingestion is
    /// all-or-nothing: the previous store state stays valid.
    #[error("malformed settings: {0}")]
    MalformedSettings(String),
}
