use http::StatusCode;

/// Contract between generation-domain error enums and the HTTP edge
///
/// Feature crates keep their own `thiserror` enums; implementing this trait
/// lets the router render any of them as a response without matching on
/// variants. The response body carries a message, a category, and a stable
/// machine code, so an implementation supplies all three alongside the
/// HTTP status.
pub trait HttpError: std::error::Error {
    /// HTTP status to respond with
    fn status_code(&self) -> StatusCode;

    /// Machine-readable error category (e.g. `invalid_request_error`)
    fn error_type(&self) -> &str;

    /// Stable machine code for the body's `code` field (e.g. `MODEL_NOT_EXIST`)
    ///
    /// Provider error text changes; this code does not, so clients branch
    /// on it rather than on the message.
    fn machine_code(&self) -> String;

    /// Message safe to expose to API consumers
    fn client_message(&self) -> String;
}
