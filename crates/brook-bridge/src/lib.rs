//! brook bridge - external collaborators over the core source contracts
//!
//! Two bridges translate platform facilities into core-shaped values:
//! - `notify`: a broadcast-notification facility exposed as
//!   `Source<Notification>`, registering lazily via Signal start/stop hooks
//! - `settings`: a persistent key-value store exposed as read-write
//!   `Updatable`s with typed, defaulting accessors
//!
//! Both facilities are abstracted behind traits; in-memory implementations
//! are provided for tests and embedding.

pub mod notify;
pub mod settings;

pub use notify::*;
pub use settings::*;
