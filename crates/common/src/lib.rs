//! Types and error helpers shared by every agenda crate.

pub mod error;
pub mod types;

pub use {
    error::FromMessage,
    types::{Entity, UserRole, UnknownRole},
};
