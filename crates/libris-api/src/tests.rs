//! Router tests against an in-memory SQLite store and a recording mail
//! transport.

use std::sync::{Arc, Mutex};

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode},
};
use libris_core::{
  BulkMailer,
  mail::{MailMessage, MailTransport, MessageId, Recipients},
  person::NewPerson,
  store::{EventStore, PersonDirectory, PersonRegistry},
};
use libris_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{ApiContext, api_router};

// ─── Fixtures ────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("relay refused")]
struct Refused;

#[derive(Clone, Default)]
struct RecordingTransport {
  sent:     Arc<Mutex<Vec<(String, Recipients)>>>,
  fail_all: bool,
}

impl MailTransport for RecordingTransport {
  type Error = Refused;

  async fn send<'a>(
    &'a self,
    message: &'a MailMessage,
    recipients: &'a Recipients,
  ) -> Result<MessageId, Refused> {
    if self.fail_all {
      return Err(Refused);
    }
    let mut sent = self.sent.lock().unwrap();
    sent.push((message.subject.clone(), recipients.clone()));
    Ok(MessageId(format!("<{}@test>", sent.len())))
  }
}

fn student(code: &str, email: Option<&str>) -> NewPerson {
  NewPerson {
    code:       code.into(),
    student_id: Some(format!("2025-{code}")),
    name:       Some("Ada Reyes".into()),
    group:      Some("BSCS 2-A".into()),
    email:      email.map(Into::into),
  }
}

async fn setup(
  transport: Option<RecordingTransport>,
) -> (Router, SqliteStore) {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let mailer = transport.map(|t| BulkMailer::new(t).with_batch_size(2));
  let ctx = ApiContext::new(store.clone(), mailer);
  (api_router(Arc::new(ctx)), store)
}

async fn call(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let req = match body {
    Some(v) => builder
      .header("content-type", "application/json")
      .body(Body::from(v.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };

  let resp = router.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

// ─── People ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_then_fetch_person() {
  let (router, _) = setup(None).await;

  let (status, body) = call(
    &router,
    "POST",
    "/people",
    Some(json!({ "code": "025-0001", "name": "Ada Reyes", "group": "BSCS 2-A", "student_id": "2025-0001" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["person"]["code"], "025-0001");
  assert_eq!(body["confirmation"], Value::Null);

  let (status, body) = call(&router, "GET", "/people/2025-0001", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["name"], "Ada Reyes");

  let (status, body) = call(&router, "GET", "/people", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_code_conflicts() {
  let (router, _) = setup(None).await;
  let body = json!({ "code": "025-0001" });

  let (status, _) = call(&router, "POST", "/people", Some(body.clone())).await;
  assert_eq!(status, StatusCode::CREATED);
  let (status, _) = call(&router, "POST", "/people", Some(body)).await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_duplicate_registration_conflicts() {
  let (router, store) = setup(None).await;

  for round in 0..20 {
    let body = json!({ "code": format!("race-{round}") });
    let (a, b) = tokio::join!(
      call(&router, "POST", "/people", Some(body.clone())),
      call(&router, "POST", "/people", Some(body.clone())),
    );
    let mut statuses = [a.0, b.0];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT], "round {round}");
  }

  assert_eq!(store.list_people().await.unwrap().len(), 20);
}

#[tokio::test]
async fn person_lookup_trims_the_code() {
  let (router, store) = setup(None).await;
  store.register(student("025-0001", None)).await.unwrap();

  let (status, body) = call(&router, "GET", "/people/%20025-0001%20", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["code"], "025-0001");
}

#[tokio::test]
async fn blank_code_is_rejected() {
  let (router, _) = setup(None).await;
  let (status, body) = call(&router, "POST", "/people", Some(json!({ "code": "  " }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());
}

#[tokio::test]
async fn registration_with_notify_sends_confirmation() {
  let transport = RecordingTransport::default();
  let (router, _) = setup(Some(transport.clone())).await;

  let (status, body) = call(
    &router,
    "POST",
    "/people",
    Some(json!({ "code": "025-0001", "name": "Ada", "email": "ada@example.edu", "notify": true })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["confirmation"], "<1@test>");

  let sent = transport.sent.lock().unwrap();
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].1, Recipients::Direct("ada@example.edu".into()));
}

#[tokio::test]
async fn failed_confirmation_still_registers() {
  let transport = RecordingTransport { fail_all: true, ..Default::default() };
  let (router, store) = setup(Some(transport)).await;

  let (status, body) = call(
    &router,
    "POST",
    "/people",
    Some(json!({ "code": "025-0001", "email": "ada@example.edu", "notify": true })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["confirmation"], Value::Null);
  assert_eq!(store.list_people().await.unwrap().len(), 1);
}

// ─── Attendance ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn scans_alternate_and_show_in_status() {
  let (router, store) = setup(None).await;
  store.register(student("025-0001", None)).await.unwrap();

  let (status, first) =
    call(&router, "POST", "/attendance/scan", Some(json!({ "code": "025-0001" }))).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(first["direction"], "in");
  assert_eq!(first["snapshot"]["name"], "Ada Reyes");

  let (_, second) =
    call(&router, "POST", "/attendance/scan", Some(json!({ "code": "025-0001" }))).await;
  assert_eq!(second["direction"], "out");

  let date = first["date"].as_str().unwrap().to_owned();
  let (status, view) =
    call(&router, "GET", &format!("/attendance/status/025-0001?date={date}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(view["events"].as_array().unwrap().len(), 2);
  assert_eq!(view["next_direction"], "in");

  let (status, log) = call(&router, "GET", &format!("/attendance?date={date}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(log.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn scan_of_unknown_code_is_not_found() {
  let (router, _) = setup(None).await;
  let (status, body) =
    call(&router, "POST", "/attendance/scan", Some(json!({ "code": "nobody" }))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains("nobody"));
}

#[tokio::test]
async fn scan_of_incomplete_person_is_unprocessable() {
  let (router, store) = setup(None).await;
  store
    .register(NewPerson { code: "025-0002".into(), ..Default::default() })
    .await
    .unwrap();

  let (status, _) =
    call(&router, "POST", "/attendance/scan", Some(json!({ "code": "025-0002" }))).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn empty_scan_is_bad_request() {
  let (router, _) = setup(None).await;
  let (status, _) = call(&router, "POST", "/attendance/scan", Some(json!({ "code": "" }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_event_then_delete_again() {
  let (router, store) = setup(None).await;
  store.register(student("025-0001", None)).await.unwrap();

  let (_, event) =
    call(&router, "POST", "/attendance/scan", Some(json!({ "code": "025-0001" }))).await;
  let id = event["event_id"].as_str().unwrap().to_owned();

  let (status, _) = call(&router, "DELETE", &format!("/attendance/{id}"), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let date = event["date"].as_str().unwrap().parse().unwrap();
  assert!(store.query_by_date(date).await.unwrap().is_empty());

  let (status, _) = call(&router, "DELETE", &format!("/attendance/{id}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Mail ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn mail_routes_absent_without_mailer() {
  let (router, _) = setup(None).await;
  let (status, _) = call(
    &router,
    "POST",
    "/mail/announcements",
    Some(json!({ "subject": "s", "html_body": "", "text_body": "", "recipients": { "kind": "all" } })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn announcement_to_all_uses_emails_on_file() {
  let transport = RecordingTransport::default();
  let (router, store) = setup(Some(transport.clone())).await;
  store.register(student("1", Some("a@example.edu"))).await.unwrap();
  store.register(student("2", None)).await.unwrap();
  store.register(student("3", Some("c@example.edu"))).await.unwrap();
  store.register(student("4", Some("d@example.edu"))).await.unwrap();

  let (status, body) = call(
    &router,
    "POST",
    "/mail/announcements",
    Some(json!({
      "subject": "Library closed Friday",
      "html_body": "<p>Closed</p>",
      "text_body": "Closed",
      "recipients": { "kind": "all" }
    })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "delivered");
  assert_eq!(body["total"], 3);
  assert_eq!(body["batches"], 2);

  let sent = transport.sent.lock().unwrap();
  assert_eq!(sent.len(), 2);
  assert_eq!(
    sent[0].1,
    Recipients::Blind(vec!["a@example.edu".into(), "c@example.edu".into()])
  );
}

#[tokio::test]
async fn announcement_with_no_recipients_is_bad_request() {
  let (router, _) = setup(Some(RecordingTransport::default())).await;
  let (status, _) = call(
    &router,
    "POST",
    "/mail/announcements",
    Some(json!({
      "subject": "Hello",
      "html_body": "",
      "text_body": "",
      "recipients": { "kind": "list", "addresses": [" ", ""] }
    })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn total_delivery_failure_is_bad_gateway() {
  let transport = RecordingTransport { fail_all: true, ..Default::default() };
  let (router, _) = setup(Some(transport)).await;

  let (status, body) = call(
    &router,
    "POST",
    "/mail/announcements",
    Some(json!({
      "subject": "Hello",
      "html_body": "<p>hi</p>",
      "text_body": "hi",
      "recipients": { "kind": "single", "address": "a@example.edu" }
    })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_GATEWAY);
  assert_eq!(body["failed"], json!(["a@example.edu"]));
}

#[tokio::test]
async fn registration_mail_needs_an_address() {
  let transport = RecordingTransport::default();
  let (router, store) = setup(Some(transport.clone())).await;
  store.register(student("025-0001", None)).await.unwrap();

  let (status, _) =
    call(&router, "POST", "/mail/registration", Some(json!({ "code": "025-0001" }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = call(
    &router,
    "POST",
    "/mail/registration",
    Some(json!({ "code": "025-0001", "address": "ada@example.edu" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message_id"], "<1@test>");
  assert_eq!(transport.sent.lock().unwrap()[0].0, "Library registration confirmed");
}

#[tokio::test]
async fn registration_mail_trims_the_code() {
  let transport = RecordingTransport::default();
  let (router, store) = setup(Some(transport.clone())).await;
  store.register(student("025-0001", Some("ada@example.edu"))).await.unwrap();

  let (status, _) =
    call(&router, "POST", "/mail/registration", Some(json!({ "code": " 025-0001 " }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(
    transport.sent.lock().unwrap()[0].1,
    Recipients::Direct("ada@example.edu".into())
  );
}
