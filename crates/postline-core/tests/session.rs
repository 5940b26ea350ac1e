//! Integration tests for the message session.
//!
//! These tests drive a session against a scripted in-process backend and
//! record what the session showed the user and where it sent them.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use postline_auth::{CredentialKey, CredentialStore, MemoryStore};
use postline_core::api::ApiResult;
use postline_core::session::{FETCH_FAILED_NOTICE, MISSING_FIELDS_NOTICE, SEND_FAILED_NOTICE};
use postline_core::{
    ApiError, DraftError, Message, MessageSession, MessagesApi, Navigator, Notifier,
    OutgoingDraft, Outcome, SendReceipt, SendRequest, SessionGuard,
};
use tokio::sync::Notify;

/// Backend double with queued responses.
#[derive(Default)]
struct ScriptedApi {
    inbox: Mutex<VecDeque<ApiResult<Vec<Message>>>>,
    receipts: Mutex<VecDeque<ApiResult<SendReceipt>>>,
    fetch_calls: AtomicUsize,
    send_calls: AtomicUsize,
    tokens: Mutex<Vec<String>>,
    sent: Mutex<Vec<SendRequest>>,
    hold_fetch: AtomicBool,
    fetch_entered: Notify,
    fetch_release: Notify,
}

impl ScriptedApi {
    fn push_inbox(&self, result: ApiResult<Vec<Message>>) {
        self.inbox.lock().unwrap().push_back(result);
    }

    fn push_receipt(&self, result: ApiResult<SendReceipt>) {
        self.receipts.lock().unwrap().push_back(result);
    }

    fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    fn sends(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }
}

/// Lets the test keep a handle on the backend the session owns.
struct SharedApi(Arc<ScriptedApi>);

impl MessagesApi for SharedApi {
    async fn fetch_messages(&self, token: &str) -> ApiResult<Vec<Message>> {
        let api = &self.0;
        api.fetch_calls.fetch_add(1, Ordering::SeqCst);
        api.tokens.lock().unwrap().push(token.to_string());

        if api.hold_fetch.load(Ordering::SeqCst) {
            api.fetch_entered.notify_one();
            api.fetch_release.notified().await;
        }

        api.inbox
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn send_message(&self, token: &str, request: &SendRequest) -> ApiResult<SendReceipt> {
        let api = &self.0;
        api.send_calls.fetch_add(1, Ordering::SeqCst);
        api.tokens.lock().unwrap().push(token.to_string());
        api.sent.lock().unwrap().push(request.clone());

        api.receipts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::malformed("no scripted receipt")))
    }
}

#[derive(Default)]
struct RecordingHost {
    notices: Mutex<Vec<String>>,
    redirects: AtomicUsize,
}

impl RecordingHost {
    fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap().clone()
    }

    fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl Notifier for RecordingHost {
    fn notify(&self, message: &str) {
        self.notices.lock().unwrap().push(message.to_string());
    }
}

impl Navigator for RecordingHost {
    fn redirect_to_login(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}

struct Fixture {
    session: MessageSession<SharedApi, MemoryStore>,
    api: Arc<ScriptedApi>,
    host: Arc<RecordingHost>,
    store: Arc<MemoryStore>,
}

fn jwt_expiring_in(seconds: i64) -> String {
    let exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
    format!(
        "{}.{}.sig",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(format!(r#"{{"username":"alice","exp":{exp}}}"#))
    )
}

fn fixture_with_store(store: MemoryStore) -> Fixture {
    let api = Arc::new(ScriptedApi::default());
    let host = Arc::new(RecordingHost::default());
    let store = Arc::new(store);
    let guard = SessionGuard::new(Arc::clone(&store), host.clone());
    let session = MessageSession::new(SharedApi(Arc::clone(&api)), guard, host.clone());
    Fixture {
        session,
        api,
        host,
        store,
    }
}

fn fixture() -> Fixture {
    fixture_with_store(MemoryStore::with_login("alice", &jwt_expiring_in(3600)))
}

fn message(subject: &str, sender: &str, receiver: &str) -> Message {
    Message {
        subject: subject.to_string(),
        sender: sender.to_string(),
        receiver: receiver.to_string(),
        message: format!("body of {subject}"),
        date: DateTime::from_timestamp(1_705_314_600, 0).unwrap(),
    }
}

fn success() -> ApiResult<SendReceipt> {
    Ok(SendReceipt::Legacy {
        message: "Message successfully sent".to_string(),
    })
}

#[tokio::test]
async fn test_activate_loads_identity_and_inbox() {
    let f = fixture();
    let m1 = message("Welcome", "bob", "alice");
    f.api.push_inbox(Ok(vec![m1.clone()]));

    assert!(f.session.activate().await.is_completed());

    let state = f.session.snapshot();
    assert_eq!(state.identity.as_deref(), Some("alice"));
    assert_eq!(state.messages, vec![m1]);
    assert!(!state.request_in_flight);
    assert_eq!(f.host.redirects(), 0);
}

#[tokio::test]
async fn test_refresh_replaces_messages_in_server_order() {
    let f = fixture();
    let m1 = message("one", "bob", "alice");
    let m2 = message("two", "carol", "alice");
    let m3 = message("three", "bob", "alice");
    f.api.push_inbox(Ok(vec![m1]));
    f.api.push_inbox(Ok(vec![m3.clone(), m2.clone()]));

    assert!(f.session.refresh_inbox().await.is_completed());
    assert!(f.session.refresh_inbox().await.is_completed());

    assert_eq!(f.session.messages(), vec![m3, m2]);
    assert!(!f.session.is_busy());
}

#[tokio::test]
async fn test_refresh_attaches_current_token() {
    let f = fixture();
    let token = f.store.get(CredentialKey::Token).unwrap().unwrap();

    let _ = f.session.refresh_inbox().await;

    assert_eq!(*f.api.tokens.lock().unwrap(), vec![token]);
}

#[tokio::test]
async fn test_refresh_failure_keeps_previous_inbox() {
    let f = fixture();
    let m1 = message("kept", "bob", "alice");
    f.api.push_inbox(Ok(vec![m1.clone()]));
    f.api.push_inbox(Err(ApiError::Status {
        status: 500,
        body: "boom".to_string(),
    }));
    f.api.push_inbox(Err(ApiError::malformed("missing field `data`")));

    assert!(f.session.refresh_inbox().await.is_completed());
    assert!(matches!(
        f.session.refresh_inbox().await,
        Outcome::Failed(ApiError::Status { status: 500, .. })
    ));
    assert!(matches!(
        f.session.refresh_inbox().await,
        Outcome::Failed(ApiError::Malformed(_))
    ));

    assert_eq!(f.session.messages(), vec![m1]);
    assert!(!f.session.is_busy());
    assert_eq!(
        f.host.notices(),
        vec![FETCH_FAILED_NOTICE.to_string(), FETCH_FAILED_NOTICE.to_string()]
    );
}

#[tokio::test]
async fn test_send_success_clears_draft_and_refreshes() {
    let f = fixture();
    f.api.push_inbox(Ok(Vec::new()));
    let _ = f.session.activate().await;

    let sent = message("Hi", "alice", "bob");
    f.api.push_receipt(success());
    f.api.push_inbox(Ok(vec![sent.clone()]));

    let before = Utc::now();
    let mut draft = OutgoingDraft::new("Hi", "Hello", "bob");
    assert!(f.session.send_message(&mut draft).await.is_completed());

    assert_eq!(draft, OutgoingDraft::new("", "", ""));
    assert_eq!(f.session.messages(), vec![sent]);
    assert_eq!(f.api.sends(), 1);
    assert_eq!(f.api.fetches(), 2);
    assert!(!f.session.is_busy());

    let request = f.api.sent.lock().unwrap()[0].clone();
    assert_eq!(request.subject, "Hi");
    assert_eq!(request.message, "Hello");
    assert_eq!(request.receiver, "bob");
    assert!(request.date >= before && request.date <= Utc::now());

    assert_eq!(f.host.notices(), vec!["Message successfully sent".to_string()]);
}

#[tokio::test]
async fn test_send_structured_success() {
    let f = fixture();
    let _ = f.session.activate().await;
    f.api.push_receipt(Ok(SendReceipt::Status {
        ok: true,
        detail: String::new(),
    }));

    let mut draft = OutgoingDraft::new("Hi", "Hello", "bob");
    assert!(f.session.send_message(&mut draft).await.is_completed());
    assert!(draft.is_empty());
    assert!(f.host.notices().is_empty());
}

#[tokio::test]
async fn test_send_without_exact_success_literal_preserves_draft() {
    for reply in ["Message successfully sent!", "failed"] {
        let f = fixture();
        let _ = f.session.activate().await;
        let fetches = f.api.fetches();
        f.api.push_receipt(Ok(SendReceipt::Legacy {
            message: reply.to_string(),
        }));

        let mut draft = OutgoingDraft::new("Hi", "Hello", "bob");
        let outcome = f.session.send_message(&mut draft).await;

        assert!(matches!(outcome, Outcome::Rejected(ref detail) if detail == reply));
        assert_eq!(draft, OutgoingDraft::new("Hi", "Hello", "bob"));
        assert_eq!(f.api.fetches(), fetches, "no refresh after {reply:?}");
        assert!(!f.session.is_busy());
        assert_eq!(f.host.notices(), vec![reply.to_string()]);
    }
}

#[tokio::test]
async fn test_send_transport_failure_preserves_draft() {
    let f = fixture();
    let _ = f.session.activate().await;
    f.api.push_receipt(Err(ApiError::Status {
        status: 502,
        body: String::new(),
    }));

    let mut draft = OutgoingDraft::new("Hi", "Hello", "bob");
    assert!(matches!(
        f.session.send_message(&mut draft).await,
        Outcome::Failed(ApiError::Status { status: 502, .. })
    ));

    assert_eq!(draft, OutgoingDraft::new("Hi", "Hello", "bob"));
    assert!(!f.session.is_busy());
    assert_eq!(f.host.notices(), vec![SEND_FAILED_NOTICE.to_string()]);
}

#[tokio::test]
async fn test_send_with_missing_field_makes_no_network_call() {
    let drafts = [
        (OutgoingDraft::new("", "Hello", "bob"), DraftError::EmptySubject),
        (OutgoingDraft::new("Hi", "", "bob"), DraftError::EmptyMessage),
        (OutgoingDraft::new("Hi", "Hello", ""), DraftError::EmptyReceiver),
    ];

    for (mut draft, expected) in drafts {
        let f = fixture();
        let m1 = message("existing", "bob", "alice");
        f.api.push_inbox(Ok(vec![m1.clone()]));
        let _ = f.session.activate().await;
        let original = draft.clone();

        let outcome = f.session.send_message(&mut draft).await;

        assert!(matches!(outcome, Outcome::Invalid(ref errors) if errors == &vec![expected]));
        assert_eq!(draft, original);
        assert_eq!(f.session.messages(), vec![m1]);
        assert_eq!(f.api.sends(), 0);
        assert_eq!(f.api.fetches(), 1);
        assert!(!f.session.is_busy());
        assert_eq!(f.host.notices(), vec![MISSING_FIELDS_NOTICE.to_string()]);
    }
}

#[tokio::test]
async fn test_send_without_identity_is_invalid() {
    let f = fixture();

    let mut draft = OutgoingDraft::new("Hi", "Hello", "bob");
    let outcome = f.session.send_message(&mut draft).await;

    assert!(matches!(outcome, Outcome::Invalid(ref errors) if errors == &vec![DraftError::MissingSender]));
    assert_eq!(f.api.sends(), 0);
    assert_eq!(f.api.fetches(), 0);
}

#[tokio::test]
async fn test_expired_credential_redirects_without_network() {
    let f = fixture_with_store(MemoryStore::with_login("alice", &jwt_expiring_in(-60)));

    assert!(matches!(f.session.activate().await, Outcome::SessionExpired));
    assert!(matches!(
        f.session.refresh_inbox().await,
        Outcome::SessionExpired
    ));

    assert_eq!(f.host.redirects(), 2);
    assert_eq!(f.api.fetches(), 0);
    assert!(f.host.notices().is_empty());
    assert_eq!(f.session.snapshot(), postline_core::SessionState::default());
}

#[tokio::test]
async fn test_missing_credential_redirects() {
    let f = fixture_with_store(MemoryStore::new());

    assert!(matches!(
        f.session.refresh_inbox().await,
        Outcome::SessionExpired
    ));
    assert_eq!(f.host.redirects(), 1);
    assert!(!f.session.is_busy());
}

#[tokio::test]
async fn test_expiry_between_activation_and_send() {
    let f = fixture();
    let _ = f.session.activate().await;
    f.store
        .set(CredentialKey::Token, &jwt_expiring_in(-1))
        .unwrap();

    let mut draft = OutgoingDraft::new("Hi", "Hello", "bob");
    let outcome = f.session.send_message(&mut draft).await;

    assert!(matches!(outcome, Outcome::SessionExpired));
    assert_eq!(f.host.redirects(), 1);
    assert_eq!(f.api.sends(), 0);
    assert_eq!(draft, OutgoingDraft::new("Hi", "Hello", "bob"));
    assert!(!f.session.is_busy());
}

#[tokio::test]
async fn test_operations_while_in_flight_are_noops() {
    let f = fixture();
    let _ = f.session.activate().await;
    let before = f.session.snapshot();

    let m1 = message("late", "bob", "alice");
    f.api.push_inbox(Ok(vec![m1.clone()]));
    f.api.hold_fetch.store(true, Ordering::SeqCst);

    let mut draft = OutgoingDraft::new("Hi", "Hello", "bob");
    let (first, (busy_refresh, busy_send, during)) = tokio::join!(f.session.refresh_inbox(), async {
        f.api.fetch_entered.notified().await;
        let during = f.session.snapshot();
        let busy_refresh = f.session.refresh_inbox().await;
        let busy_send = f.session.send_message(&mut draft).await;
        f.api.fetch_release.notify_one();
        (busy_refresh, busy_send, during)
    });

    assert!(during.request_in_flight);
    assert_eq!(during.messages, before.messages);
    assert!(matches!(busy_refresh, Outcome::Busy));
    assert!(matches!(busy_send, Outcome::Busy));
    assert!(first.is_completed());

    assert_eq!(draft, OutgoingDraft::new("Hi", "Hello", "bob"));
    assert_eq!(f.api.sends(), 0);
    assert_eq!(f.api.fetches(), 2);
    assert_eq!(f.session.messages(), vec![m1]);
    assert!(!f.session.is_busy());
    assert!(f.host.notices().is_empty());
}

#[tokio::test]
async fn test_flag_released_after_every_outcome() {
    let f = fixture();
    f.api.push_inbox(Err(ApiError::malformed("bad")));
    let _ = f.session.activate().await;
    assert!(!f.session.is_busy());

    let mut empty = OutgoingDraft::default();
    let _ = f.session.send_message(&mut empty).await;
    assert!(!f.session.is_busy());

    f.api.push_receipt(success());
    let mut draft = OutgoingDraft::new("Hi", "Hello", "bob");
    let _ = f.session.send_message(&mut draft).await;
    assert!(!f.session.is_busy());

    f.store.delete(CredentialKey::Token).unwrap();
    let _ = f.session.refresh_inbox().await;
    assert!(!f.session.is_busy());
}

#[tokio::test]
async fn test_send_confirmed_but_refresh_fails() {
    let f = fixture();
    let m1 = message("Welcome", "bob", "alice");
    f.api.push_inbox(Ok(vec![m1.clone()]));
    assert!(f.session.activate().await.is_completed());

    f.api.push_receipt(success());
    f.api.push_inbox(Err(ApiError::Status {
        status: 503,
        body: "unavailable".to_string(),
    }));

    let mut draft = OutgoingDraft::new("Hi", "Hello", "bob");
    let outcome = f.session.send_message(&mut draft).await;

    assert!(outcome.is_completed());
    assert!(draft.is_empty());
    assert_eq!(f.session.messages(), vec![m1]);
    assert!(!f.session.is_busy());
    assert_eq!(f.api.sends(), 1);
    assert_eq!(f.api.fetches(), 2);
    assert_eq!(
        f.host.notices(),
        vec![
            "Message successfully sent".to_string(),
            FETCH_FAILED_NOTICE.to_string()
        ]
    );
}

#[tokio::test]
async fn test_mixed_receipt_with_failed_message_is_rejected() {
    let f = fixture();
    f.api.push_inbox(Ok(Vec::new()));
    let _ = f.session.activate().await;

    let receipt: SendReceipt = serde_json::from_str(r#"{"ok":true,"message":"failed"}"#).unwrap();
    f.api.push_receipt(Ok(receipt));

    let mut draft = OutgoingDraft::new("Hi", "Hello", "bob");
    assert!(matches!(
        f.session.send_message(&mut draft).await,
        Outcome::Rejected(detail) if detail == "failed"
    ));
    assert_eq!(draft, OutgoingDraft::new("Hi", "Hello", "bob"));
    assert_eq!(f.api.fetches(), 1);
    assert!(!f.session.is_busy());
}
