pub mod avatar;
pub mod user;
