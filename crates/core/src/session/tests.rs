use std::time::Duration;

use giaic_model::ModelMessage;
use giaic_test_model::{PresetResponse, TestModelProvider};
use tokio::time::timeout;

use super::{SessionError, SessionId, SessionStore};
use crate::conversation::Turn;
use crate::orchestrator::OrchestratorBuilder;
use crate::stream::{TurnEvent, TurnStream};

const WAIT: Duration = Duration::from_secs(5);

fn store_with(model_provider: &TestModelProvider) -> SessionStore {
    let orchestrator =
        OrchestratorBuilder::with_model_provider(model_provider.clone())
            .build();
    SessionStore::new(orchestrator)
}

async fn answer_of(stream: TurnStream) -> Result<String, String> {
    timeout(WAIT, stream.collect_text()).await.unwrap()
}

#[tokio::test]
async fn test_sequential_messages() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_response(PresetResponse::with_text(["Salam!"]));
    model_provider.add_response(PresetResponse::with_text(["Sunny."]));
    let store = store_with(&model_provider);
    let id = store.start_session();

    let stream = store.send_message(&id, "Hello").unwrap();
    assert_eq!(answer_of(stream).await.unwrap(), "Salam!");
    let stream = store.send_message(&id, "Weather?").unwrap();
    assert_eq!(answer_of(stream).await.unwrap(), "Sunny.");

    let requests = model_provider.requests();
    assert_eq!(
        requests[1].messages,
        [
            ModelMessage::User("Hello".to_owned()),
            ModelMessage::Assistant("Salam!".to_owned()),
            ModelMessage::User("Weather?".to_owned()),
        ]
    );
    assert_eq!(
        store.transcript(&id).await.unwrap(),
        [
            Turn::user("Hello"),
            Turn::assistant("Salam!"),
            Turn::user("Weather?"),
            Turn::assistant("Sunny."),
        ]
    );
}

#[tokio::test]
async fn test_queued_messages_keep_order() {
    let mut model_provider = TestModelProvider::default();
    model_provider.set_delay(Duration::from_millis(5));
    for answer in ["one", "two", "three"] {
        model_provider.add_response(PresetResponse::with_text([answer]));
    }
    let store = store_with(&model_provider);
    let id = store.start_session();

    let streams = ["1", "2", "3"]
        .map(|text| store.send_message(&id, text).unwrap());
    let mut answers = Vec::new();
    for stream in streams {
        answers.push(answer_of(stream).await.unwrap());
    }
    assert_eq!(answers, ["one", "two", "three"]);

    let transcript = store.transcript(&id).await.unwrap();
    let contents = transcript.iter().map(Turn::content).collect::<Vec<_>>();
    assert_eq!(contents, ["1", "one", "2", "two", "3", "three"]);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_response(PresetResponse::with_text(["A"]));
    model_provider.add_response(PresetResponse::with_text(["B"]));
    let store = store_with(&model_provider);
    let first = store.start_session();
    let second = store.start_session();
    assert_ne!(first, second);
    assert_eq!(store.len(), 2);

    answer_of(store.send_message(&first, "from first").unwrap())
        .await
        .unwrap();
    answer_of(store.send_message(&second, "from second").unwrap())
        .await
        .unwrap();

    let requests = model_provider.requests();
    assert_eq!(
        requests[1].messages,
        [ModelMessage::User("from second".to_owned())]
    );
    let transcript = store.transcript(&first).await.unwrap();
    assert_eq!(transcript, [Turn::user("from first"), Turn::assistant("A")]);
}

#[tokio::test]
async fn test_failed_turn_is_not_recorded() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_response(PresetResponse::default().with_failures(1));
    let store = store_with(&model_provider);
    let id = store.start_session();

    let err = answer_of(store.send_message(&id, "Hello").unwrap())
        .await
        .unwrap_err();
    assert!(err.starts_with("⚠️"));
    assert!(store.transcript(&id).await.unwrap().is_empty());

    // The scripted failure is used up, so the retry goes through.
    let answer = answer_of(store.send_message(&id, "Hello").unwrap()).await;
    assert_eq!(answer, Ok(String::new()));
    assert_eq!(store.transcript(&id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_cancelled_turn_is_not_recorded() {
    let mut model_provider = TestModelProvider::default();
    model_provider.set_delay(Duration::from_millis(20));
    for _ in 0..2 {
        model_provider.add_response(PresetResponse::with_text([
            "a ", "slow ", "answer",
        ]));
    }
    let store = store_with(&model_provider);
    let id = store.start_session();

    let mut stream = store.send_message(&id, "Hello").unwrap();
    let first = timeout(WAIT, stream.next_event()).await.unwrap();
    assert_eq!(first, Some(TurnEvent::Fragment("a ".to_owned())));
    drop(stream);

    assert!(store.transcript(&id).await.unwrap().is_empty());

    let answer = answer_of(store.send_message(&id, "Again").unwrap()).await;
    assert_eq!(answer.unwrap(), "a slow answer");
    assert_eq!(
        store.transcript(&id).await.unwrap(),
        [Turn::user("Again"), Turn::assistant("a slow answer")]
    );
}

#[tokio::test]
async fn test_end_session() {
    let mut model_provider = TestModelProvider::default();
    model_provider.set_delay(Duration::from_millis(50));
    model_provider.add_response(PresetResponse::with_text(["never seen"]));
    let store = store_with(&model_provider);
    let id = store.start_session();

    let mut stream = store.send_message(&id, "Hello").unwrap();
    store.end_session(&id).unwrap();
    assert!(store.is_empty());

    let event = timeout(WAIT, stream.next_event()).await.unwrap();
    assert!(matches!(event, Some(TurnEvent::Failed(_))));
    assert_eq!(stream.next_event().await, None);

    assert_eq!(
        store.end_session(&id),
        Err(SessionError::UnknownSession(id))
    );
    assert_eq!(
        store.send_message(&id, "Hello").unwrap_err(),
        SessionError::UnknownSession(id)
    );
    assert_eq!(
        store.transcript(&id).await,
        Err(SessionError::UnknownSession(id))
    );
}

#[test]
fn test_session_id_serde() {
    let id = SessionId::new();
    let value = serde_json::to_value(id).unwrap();
    assert_eq!(value, id.to_string());
    assert_eq!(serde_json::from_value::<SessionId>(value).unwrap(), id);
}
