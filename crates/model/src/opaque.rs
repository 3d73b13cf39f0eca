use std::any::Any;
use std::fmt::{self, Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A backend-specific message kept in the working context verbatim.
///
/// Some backends need the exact assistant message they produced (for
/// example one carrying tool call ids) to be sent back on the next
/// request. The orchestrator cannot interpret it, so the backend wraps
/// its own value here and unwraps it again when building the request.
///
/// Two opaque messages are equal when their ids are equal.
#[derive(Clone)]
pub struct OpaqueMessage {
    id: Arc<str>,
    value: Arc<dyn Any + Send + Sync>,
}

impl OpaqueMessage {
    /// Wraps `value` under `id`, which must be unique within a context.
    #[inline]
    pub fn new<ID: Into<String>, T: Send + Sync + 'static>(
        id: ID,
        value: T,
    ) -> Self {
        Self {
            id: Arc::from(id.into()),
            value: Arc::new(value),
        }
    }

    /// Returns the id of this message.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the wrapped value if it has type `T`.
    #[inline]
    pub fn to_raw<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }
}

impl Debug for OpaqueMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OpaqueMessage").field(&self.id).finish()
    }
}

impl PartialEq for OpaqueMessage {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for OpaqueMessage {}

impl Hash for OpaqueMessage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct WireMessage {
        call_ids: Vec<String>,
    }

    #[test]
    fn test_unwrap_value() {
        let opaque = OpaqueMessage::new(
            "chatcmpl-1",
            WireMessage {
                call_ids: vec!["call_0".to_owned()],
            },
        );
        assert_eq!(opaque.id(), "chatcmpl-1");
        assert_eq!(
            opaque.to_raw::<WireMessage>().unwrap().call_ids,
            ["call_0"]
        );
        assert!(opaque.to_raw::<String>().is_none());
    }

    #[test]
    fn test_equality_by_id() {
        let a = OpaqueMessage::new("chatcmpl-1", 1_u32);
        let b = OpaqueMessage::new("chatcmpl-1", "different payload");
        let c = OpaqueMessage::new("chatcmpl-2", 1_u32);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.clone(), a);
    }
}
