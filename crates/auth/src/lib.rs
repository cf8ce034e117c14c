//! Caller identity and credentials.
//!
//! This crate provides:
//! - bearer token minting and resolution (`token_<user_id>_<issued_at>`)
//! - argon2 password hashing and verification
//!
//! Tokens are unsigned and never expire: the token string is the whole
//! session. Anyone who can guess a user id can forge one. Hardening this
//! (a MAC over identity and issue time, plus expiry) must keep
//! [`resolve_token`] accepting the same shape.

pub mod error;
pub mod password;
pub mod token;

pub use {
    error::{Error, Result},
    password::{hash_password, verify_password, verify_password_or_dummy},
    token::{TOKEN_DELIMITER, TOKEN_MARKER, mint_token, mint_token_at, resolve_token},
};
