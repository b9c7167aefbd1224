/// Core error type for the bot.
///
/// Adapter crates map their specific errors into this type so the bot core
/// can handle failures consistently (user-facing message vs dropped record).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    /// Bad or unrecognized token. Never retried automatically; the caller
    /// asks the user for a new token.
    #[error("auth error: {0}")]
    Auth(String),

    /// Non-200 (or undecodable body) from the issue listing call.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Request could not be built or sent (bad header/type/transport).
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// Per-record timestamp parse failure during normalization/filtering.
    #[error("cannot parse {field}: {value:?}")]
    Parse { field: &'static str, value: String },

    /// Per-record missing required key.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
