pub mod commands;
pub mod sync;

pub use commands::CommandStack;
pub use sync::{Cell, Change, Column, EditError, Mutation, ObserverId, Session, Snapshot};
