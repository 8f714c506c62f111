mod common;
mod user;
