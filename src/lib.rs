pub mod command;
pub mod flatten;
pub mod id;
pub mod state;
pub mod store;
pub mod transaction;
pub mod walker;
pub mod writer;
