use std::error::Error;

use crate::error::ErrorKind;
use crate::request::ModelRequest;
use crate::response::ModelResponse;

/// The error type for a model provider.
///
/// Callers never show the error text to the user. They pick the message by
/// [`kind`](Self::kind), so a provider should classify as precisely as it
/// can and fall back to [`ErrorKind::Other`].
pub trait ModelProviderError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A chat model backend.
///
/// Providers are shared by every session of the process, so they must
/// behave as stateless objects: two concurrent requests never observe each
/// other. Configuration (model id, credentials) is fixed at construction.
pub trait ModelProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: ModelProviderError;

    /// The response type for this provider.
    type Response: ModelResponse<Error = Self::Error>;

    /// Returns the identifier of the model requests are sent to.
    fn model_id(&self) -> &str;

    /// Sends a request to the model.
    ///
    /// `req` follows the message order documented on [`ModelRequest`]; a
    /// provider may rely on it and does not need to validate it. Failing
    /// to connect or being refused is reported here. Failures after the
    /// first byte are reported by the response.
    ///
    /// The returned future must not borrow `self` or `req`.
    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static;
}
