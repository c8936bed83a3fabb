use thiserror::Error;

/// Errors that can occur while talking to the chat provider
#[derive(Debug, Error)]
pub enum ChatError {
    /// Provider answered the control request with a non-success status
    #[error("upstream returned {status}: {body}")]
    Upstream {
        /// HTTP status code
        status: u16,
        /// Raw response body, for diagnostics
        body: String,
    },

    /// Error while reading the event stream
    #[error("streaming error: {0}")]
    Streaming(String),

    /// The stream terminated without producing any answer text
    #[error("the provider returned an empty response, please try again later")]
    EmptyResponse,
}
