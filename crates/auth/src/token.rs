use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

/// Fixed first segment of every bearer token.
pub const TOKEN_MARKER: &str = "token";

/// Segment delimiter. User ids may contain it too.
pub const TOKEN_DELIMITER: char = '_';

/// Mint a bearer token for `user_id`, stamped with the current time.
pub fn mint_token(user_id: &str) -> String {
    mint_token_at(user_id, Utc::now())
}

/// Mint a bearer token with an explicit issue time.
///
/// The issue time is rendered as `<unix seconds>.<microseconds>` and is
/// informational only.
pub fn mint_token_at(user_id: &str, issued_at: DateTime<Utc>) -> String {
    format!(
        "{TOKEN_MARKER}{TOKEN_DELIMITER}{user_id}{TOKEN_DELIMITER}{}.{:06}",
        issued_at.timestamp(),
        issued_at.timestamp_subsec_micros(),
    )
}

/// Recover the user id embedded in a bearer token.
///
/// The first segment must be [`TOKEN_MARKER`] and the last segment is the
/// issue time; everything in between, rejoined with [`TOKEN_DELIMITER`],
/// is the user id.
pub fn resolve_token(token: &str) -> Result<String> {
    let segments: Vec<&str> = token.split(TOKEN_DELIMITER).collect();
    if segments.len() < 3 || segments[0] != TOKEN_MARKER {
        return Err(Error::MalformedToken);
    }

    let user_id = segments[1..segments.len() - 1].join(&TOKEN_DELIMITER.to_string());
    if user_id.is_empty() {
        return Err(Error::MalformedToken);
    }
    Ok(user_id)
}
