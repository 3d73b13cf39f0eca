use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;

use giaic_model::{
    ModelProvider, ModelProviderError, ModelRequest, ModelResponse,
    ModelResponseEvent, OpaqueMessage, ToolCallRequest,
};
use tracing::Instrument;

type SendRequestResult =
    Result<ModelClientResponse, Box<dyn ModelProviderError>>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
type DeltaFn = Box<dyn Fn(String) + Send + 'static>;
type HandlerFn =
    Arc<dyn Fn(ModelRequest, DeltaFn) -> BoxedSendRequestFuture + Send + Sync>;

/// A type-erased handle to a model provider, cheap to clone and share
/// between sessions.
#[derive(Clone)]
pub struct ModelClient {
    model_id: Arc<str>,
    handler_fn: HandlerFn,
}

impl ModelClient {
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        let model_id: Arc<str> = Arc::from(provider.model_id());
        let span_model_id = Arc::clone(&model_id);
        // Erase `P` so the orchestrator and sessions stay non-generic.
        let handler_fn: HandlerFn = Arc::new(move |req, on_delta| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!(
                        "sending {} messages, {} tools",
                        req.messages.len(),
                        req.tools.len()
                    );
                    let resp_or_err = fut.await;
                    handle_response::<P>(resp_or_err, on_delta).await
                }
                .instrument(trace_span!(
                    "model client req",
                    model = %span_model_id
                )),
            )
        });
        Self {
            model_id,
            handler_fn,
        }
    }

    #[inline]
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Sends a request and reads the response to its end, passing every
    /// text delta to `on_delta` as it arrives.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. The response stops streaming further
    /// events when this operation is cancelled.
    #[inline]
    pub async fn send_request(
        &self,
        req: ModelRequest,
        on_delta: impl Fn(String) + Send + 'static,
    ) -> SendRequestResult {
        (self.handler_fn)(req, Box::new(on_delta)).await
    }
}

/// A completely received response from the model client.
#[derive(Clone, Debug)]
pub struct ModelClientResponse {
    /// All text deltas, concatenated.
    pub transcript: String,
    pub opaque_msg: Option<OpaqueMessage>,
    /// Tool calls requested by the model, in the order requested.
    pub tool_calls: Vec<ToolCallRequest>,
}

async fn handle_response<P: ModelProvider + 'static>(
    resp_or_err: Result<P::Response, P::Error>,
    on_delta: DeltaFn,
) -> SendRequestResult {
    let resp = match resp_or_err {
        Ok(resp) => resp,
        Err(err) => {
            error!("request failed: {err}");
            return Err(Box::new(err));
        }
    };

    let mut transcript = String::new();
    let mut tool_calls = Vec::new();

    let mut pinned_resp = pin!(resp);
    loop {
        let event = poll_fn(|cx| pinned_resp.as_mut().poll_next_event(cx))
            .await
            .map_err(|err| {
                error!("response failed: {err}");
                Box::new(err) as Box<dyn ModelProviderError>
            })?;
        let Some(event) = event else {
            break;
        };
        trace!("got an event: {event:?}");

        match event {
            ModelResponseEvent::MessageDelta(delta) => {
                transcript.push_str(&delta);
                on_delta(delta);
            }
            ModelResponseEvent::ToolCall(req) => {
                tool_calls.push(req);
            }
            // Whether to run tools is decided by `tool_calls` alone.
            ModelResponseEvent::Completed(_) => {}
        }
    }

    Ok(ModelClientResponse {
        transcript,
        opaque_msg: pinned_resp.make_opaque_message(),
        tool_calls,
    })
}
