use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use giaic_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
    OpaqueMessage, ToolCallRequest,
};
use serde_json::{Value, json};

use crate::Error;
use crate::io::{Sse, SseError};
use crate::proto::{ChatCompletionChunk, Message, ToolCall};

/// Accumulates the streamed chunks of one completion.
struct Assembler {
    sse: Sse,
    id: Option<String>,
    content: String,
    // Partial tool calls, patched in place as deltas arrive. They are only
    // reported once the stream completes, when their arguments are whole.
    tool_calls: Vec<ToolCall>,
    saw_finish_reason: bool,
    completed: bool,
}

impl Assembler {
    /// Reads chunks until they yield at least one event.
    ///
    /// An empty list means the stream has completed.
    async fn pull(&mut self) -> Result<Vec<ModelResponseEvent>, Error> {
        loop {
            let data = self.sse.next_event().await.map_err(|err| match err {
                SseError::ChunksError(err) => {
                    Error::new(err.0, ErrorKind::Unavailable)
                }
                SseError::InvalidPayload => {
                    Error::new("invalid event payload", ErrorKind::Other)
                }
            })?;
            trace!("got sse event: {data:?}");

            let data = match data {
                Some(data) if data != "[DONE]" => data,
                Some(_) => return Ok(self.complete()),
                None if self.saw_finish_reason => return Ok(self.complete()),
                None => {
                    return Err(Error::new(
                        "stream ended before completion",
                        ErrorKind::Unavailable,
                    ));
                }
            };

            let chunk = serde_json::from_str::<ChatCompletionChunk>(&data)
                .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;
            if self.id.is_none() {
                self.id = chunk.id;
            }

            let mut events = vec![];
            for choice in chunk.choices {
                if let Some(content) =
                    choice.delta.content.filter(|c| !c.is_empty())
                {
                    self.content.push_str(&content);
                    events.push(ModelResponseEvent::MessageDelta(content));
                }
                for tool_call in choice.delta.tool_calls.into_iter().flatten() {
                    self.merge_tool_call(tool_call);
                }
                if choice.finish_reason.is_some() {
                    self.saw_finish_reason = true;
                }
            }
            if !events.is_empty() {
                return Ok(events);
            }
        }
    }

    fn merge_tool_call(&mut self, delta: ToolCall) {
        let existing = delta.index.and_then(|index| {
            self.tool_calls
                .iter_mut()
                .find(|t| t.index == Some(index))
        });
        let Some(partial) = existing else {
            // Some servers omit `index` and send every call whole.
            self.tool_calls.push(delta);
            return;
        };

        if let Some(id) = delta.id {
            partial.id.get_or_insert_default().push_str(&id);
        }
        if let Some(ty) = delta.r#type {
            partial.r#type.get_or_insert_default().push_str(&ty);
        }
        if let Some(function) = delta.function {
            let partial_func = partial.function.get_or_insert_default();
            if let Some(name) = function.name {
                partial_func.name.get_or_insert_default().push_str(&name);
            }
            if let Some(arguments) = function.arguments {
                partial_func
                    .arguments
                    .get_or_insert_default()
                    .push_str(&arguments);
            }
        }
    }

    fn complete(&mut self) -> Vec<ModelResponseEvent> {
        if self.completed {
            return vec![];
        }
        self.completed = true;

        // The replayed message must name the same calls as the tool results
        // that answer them, so missing fields are filled in here, once.
        for (idx, tool_call) in self.tool_calls.iter_mut().enumerate() {
            tool_call.id.get_or_insert_with(|| format!("call_{idx}"));
            tool_call.r#type.get_or_insert_with(|| "function".to_owned());
            tool_call.index = None;
        }

        let mut events = self
            .tool_calls
            .iter()
            .map(|t| ModelResponseEvent::ToolCall(to_request(t)))
            .collect::<Vec<_>>();
        events.push(ModelResponseEvent::Completed(if self.tool_calls.is_empty() {
            ModelFinishReason::Stop
        } else {
            ModelFinishReason::ToolCalls
        }));
        events
    }

    fn into_message(self) -> (String, Message) {
        let id = self.id.unwrap_or_else(|| "chatcmpl".to_owned());
        let has_tool_calls = !self.tool_calls.is_empty();
        let content = if self.content.is_empty() && has_tool_calls {
            None
        } else {
            Some(self.content)
        };
        let tool_calls = has_tool_calls.then_some(self.tool_calls);
        (id, Message::Assistant { content, tool_calls })
    }
}

fn to_request(tool_call: &ToolCall) -> ToolCallRequest {
    let function = tool_call.function.clone().unwrap_or_default();
    let raw_arguments = function.arguments.unwrap_or_default();
    let arguments = if raw_arguments.trim().is_empty() {
        json!({})
    } else {
        serde_json::from_str::<Value>(&raw_arguments).unwrap_or_else(|err| {
            warn!("tool call arguments are not valid JSON: {err}");
            Value::Null
        })
    };
    ToolCallRequest {
        id: tool_call.id.clone().unwrap_or_default().into(),
        name: function.name.unwrap_or_default(),
        arguments,
    }
}

type Pull = Pin<
    Box<
        dyn Future<Output = (Assembler, Result<Vec<ModelResponseEvent>, Error>)>
            + Send,
    >,
>;

/// A streamed chat completion.
pub struct OpenAIResponse {
    pending: VecDeque<ModelResponseEvent>,
    assembler: Option<Assembler>,
    pull: Option<Pull>,
    full_msg: Option<(String, Message)>,
}

impl OpenAIResponse {
    #[inline]
    pub fn from_sse(sse: Sse) -> Self {
        let assembler = Assembler {
            sse,
            id: None,
            content: String::new(),
            tool_calls: vec![],
            saw_finish_reason: false,
            completed: false,
        };
        Self {
            pending: VecDeque::new(),
            assembler: Some(assembler),
            pull: None,
            full_msg: None,
        }
    }
}

impl ModelResponse for OpenAIResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();
        loop {
            if let Some(event) = this.pending.pop_front() {
                return Poll::Ready(Ok(Some(event)));
            }

            if this.pull.is_none() {
                let Some(mut assembler) = this.assembler.take() else {
                    // Exhausted, or failed earlier.
                    return Poll::Ready(Ok(None));
                };
                if assembler.completed {
                    this.full_msg = Some(assembler.into_message());
                    return Poll::Ready(Ok(None));
                }
                this.pull = Some(Box::pin(async move {
                    let result = assembler.pull().await;
                    (assembler, result)
                }));
            }
            let Some(pull) = this.pull.as_mut() else {
                return Poll::Ready(Ok(None));
            };

            let (assembler, result) = ready!(pull.as_mut().poll(cx));
            this.pull = None;
            match result {
                Ok(events) => {
                    this.pending.extend(events);
                    this.assembler = Some(assembler);
                }
                Err(err) => return Poll::Ready(Err(err)),
            }
        }
    }

    fn make_opaque_message(&self) -> Option<OpaqueMessage> {
        self.full_msg
            .as_ref()
            .map(|(id, msg)| OpaqueMessage::new(id.clone(), msg.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use bytes::Bytes;

    use super::*;
    use crate::io::Chunks;

    async fn collect(
        chunks: Vec<Bytes>,
    ) -> (Vec<ModelResponseEvent>, Result<(), Error>, Option<OpaqueMessage>)
    {
        let sse = Sse::new(Chunks::from_vec_deque(chunks.into()));
        let mut resp = pin!(OpenAIResponse::from_sse(sse));
        let mut events = vec![];
        let result = loop {
            match poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await {
                Ok(Some(event)) => events.push(event),
                Ok(None) => break Ok(()),
                Err(err) => break Err(err),
            }
        };
        (events, result, resp.make_opaque_message())
    }

    #[tokio::test]
    async fn test_tool_call_stream() {
        let (events, result, opaque) = collect(vec![Bytes::from_static(
            include_bytes!("../fixtures/test_response.txt"),
        )])
        .await;
        result.unwrap();

        let text = events
            .iter()
            .filter_map(|e| match e {
                ModelResponseEvent::MessageDelta(delta) => Some(delta.as_str()),
                _ => None,
            })
            .collect::<String>();
        assert_eq!(text, "Let me check both.");

        let tool_calls = events
            .iter()
            .filter_map(|e| match e {
                ModelResponseEvent::ToolCall(req) => Some(req),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(tool_calls.len(), 2);
        assert_eq!(tool_calls[0].id, "call_weather");
        assert_eq!(tool_calls[0].name, "get_weather");
        assert_eq!(
            tool_calls[0].arguments,
            json!({ "location": "Karachi", "unit": "celsius" })
        );
        assert_eq!(tool_calls[1].name, "giaic_student_finder");
        assert_eq!(tool_calls[1].arguments, json!({ "name": "Shahid Ali" }));

        assert_eq!(
            events.last(),
            Some(&ModelResponseEvent::Completed(ModelFinishReason::ToolCalls))
        );

        let opaque = opaque.unwrap();
        assert_eq!(opaque.id(), "chatcmpl-42");
        let Message::Assistant { tool_calls, .. } = opaque.to_raw::<Message>().unwrap()
        else {
            panic!("expected an assistant message");
        };
        assert_eq!(tool_calls.as_ref().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_text_stream() {
        let (events, result, opaque) = collect(vec![
            Bytes::from_static(
                b"data: {\"id\":\"c1\",\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n\n",
            ),
            Bytes::from_static(
                b"data: {\"id\":\"c1\",\"choices\":[{\"delta\":{\"content\":\", world\"},\"finish_reason\":\"stop\"}]}\n\n",
            ),
            Bytes::from_static(b"data: [DONE]\n\n"),
        ])
        .await;
        result.unwrap();
        assert_eq!(
            events,
            vec![
                ModelResponseEvent::MessageDelta("Hello".to_owned()),
                ModelResponseEvent::MessageDelta(", world".to_owned()),
                ModelResponseEvent::Completed(ModelFinishReason::Stop),
            ]
        );
        assert!(opaque.is_some());
    }

    #[tokio::test]
    async fn test_tool_call_without_id() {
        let (events, result, opaque) = collect(vec![
            Bytes::from_static(
                b"data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"function\":{\"name\":\"get_weather\",\"arguments\":\"{}\"}}]},\"finish_reason\":\"tool_calls\"}]}\n\n",
            ),
            Bytes::from_static(b"data: [DONE]\n\n"),
        ])
        .await;
        result.unwrap();

        let ModelResponseEvent::ToolCall(req) = &events[0] else {
            panic!("expected a tool call, got {:?}", events[0]);
        };
        assert_eq!(req.id, "call_0");
        assert_eq!(req.arguments, json!({}));

        // The replayed message carries the id the tool result will answer.
        let opaque = opaque.unwrap();
        let replayed = opaque.to_raw::<Message>().unwrap();
        let replayed = serde_json::to_value(replayed).unwrap();
        assert_eq!(
            replayed["tool_calls"],
            json!([{
                "id": "call_0",
                "type": "function",
                "function": { "name": "get_weather", "arguments": "{}" },
            }])
        );
    }

    #[tokio::test]
    async fn test_malformed_arguments() {
        let (events, result, _) = collect(vec![
            Bytes::from_static(
                b"data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"call_x\",\"function\":{\"name\":\"get_weather\",\"arguments\":\"{\\\"location\\\": Kar\"}}]},\"finish_reason\":\"tool_calls\"}]}\n\n",
            ),
            Bytes::from_static(b"data: [DONE]\n\n"),
        ])
        .await;
        result.unwrap();
        assert_eq!(
            events[0],
            ModelResponseEvent::ToolCall(ToolCallRequest {
                id: "call_x".into(),
                name: "get_weather".to_owned(),
                arguments: Value::Null,
            })
        );
    }

    #[tokio::test]
    async fn test_truncated_stream() {
        let (events, result, opaque) = collect(vec![Bytes::from_static(
            b"data: {\"id\":\"c1\",\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
        )])
        .await;
        assert_eq!(events.len(), 1);
        assert_eq!(result.unwrap_err().kind, ErrorKind::Unavailable);
        assert!(opaque.is_none());
    }
}
