pub mod context;
pub mod error;
pub mod events;
pub mod filter;
pub mod layers;
pub mod settings;

pub use context::MapContext;
pub use error::StateError;
pub use events::{EventBus, MapEvent, MapEventKind, Subscription};
