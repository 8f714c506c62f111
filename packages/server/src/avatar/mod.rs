mod index;
mod manager;
mod sweep;

pub use index::{AvatarIndex, AvatarRecord, SeaOrmAvatarIndex};
pub use manager::{AvatarManager, SweepReport};
pub use sweep::spawn_sweep_task;
