#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed bearer token")]
    MalformedToken,

    #[error("failed to hash password: {0}")]
    Hash(String),
}

pub type Result<T> = std::result::Result<T, Error>;
