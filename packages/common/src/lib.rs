pub mod config;
pub mod event;
pub mod storage;

pub use event::{Event, GenericEvent, UserRegistered};
