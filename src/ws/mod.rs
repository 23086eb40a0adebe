pub mod guard;
pub mod handler;
