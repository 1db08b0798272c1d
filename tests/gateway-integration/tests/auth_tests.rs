use std::sync::Arc;

use serde_json::json;

use catalog_admin::auth::{sign_out, AuthClient, AuthError, RegisterForm, SignInForm};
use catalog_admin::http_gateway::HttpGateway;
use catalog_admin::navigator::Route;
use catalog_admin::session::SessionStore;
use catalog_common::gateway::ProductGateway;
use catalog_common::product::ProductId;
use catalog_gateway_integration::harness::{Envelope, MockCatalog};
use catalog_gateway_integration::{civic, init_tracing, RecordingNavigator};

fn registration(confirm: &str) -> RegisterForm {
    RegisterForm {
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        email: "ada@example.com".into(),
        phone_number: "555-0100".into(),
        password: "secret".into(),
        confirm_password: confirm.into(),
    }
}

#[tokio::test]
async fn sign_in_persists_the_token_for_later_requests() {
    init_tracing();
    let mock = MockCatalog::start(Envelope::Wrapped).await;
    mock.insert_product(civic());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let client = AuthClient::new(&mock.config()).unwrap();
    let nav = RecordingNavigator::default();

    let session = Arc::new(SessionStore::open(&path).unwrap());
    let form = SignInForm {
        email: "ada@example.com".into(),
        password: "secret".into(),
    };
    form.submit(&client, &session, &nav).await.unwrap();
    assert_eq!(nav.routes(), [Route::Dashboard]);

    // A later invocation picks the session up from disk.
    let restored = Arc::new(SessionStore::open(&path).unwrap());
    let gateway = HttpGateway::new(mock.config())
        .unwrap()
        .with_credentials(restored);
    gateway.fetch_by_id(&ProductId::new("42")).await.unwrap();

    let requests = mock.requests();
    assert_eq!(requests[0].path, "/api/login");
    assert_eq!(
        requests[0].json,
        Some(json!({"email": "ada@example.com", "password": "secret"}))
    );
    assert_eq!(
        requests[1].authorization.as_deref(),
        Some("Bearer token-for-ada@example.com")
    );
}

#[tokio::test]
async fn wrong_password_leaves_the_user_signed_out() {
    let mock = MockCatalog::start(Envelope::Wrapped).await;
    let client = AuthClient::new(&mock.config()).unwrap();
    let session = SessionStore::in_memory();
    let nav = RecordingNavigator::default();

    let form = SignInForm {
        email: "ada@example.com".into(),
        password: "guess".into(),
    };
    let err = form.submit(&client, &session, &nav).await.unwrap_err();
    assert!(matches!(err, AuthError::Status { status: 401, .. }));
    assert!(!session.is_signed_in());
    assert!(nav.routes().is_empty());
}

#[tokio::test]
async fn register_posts_the_profile_and_sends_the_user_to_sign_in() {
    let mock = MockCatalog::start(Envelope::Wrapped).await;
    let client = AuthClient::new(&mock.config()).unwrap();
    let nav = RecordingNavigator::default();

    registration("secret").submit(&client, &nav).await.unwrap();

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/api/auth/register");
    assert_eq!(
        requests[0].json,
        Some(json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "phoneNumber": "555-0100",
            "password": "secret",
        }))
    );
    assert_eq!(nav.routes(), [Route::SignIn]);
}

#[tokio::test]
async fn mismatched_confirmation_sends_nothing() {
    let mock = MockCatalog::start(Envelope::Wrapped).await;
    let client = AuthClient::new(&mock.config()).unwrap();
    let nav = RecordingNavigator::default();

    let err = registration("typo").submit(&client, &nav).await.unwrap_err();
    assert!(matches!(err, AuthError::PasswordMismatch));
    assert!(mock.requests().is_empty());
    assert!(nav.routes().is_empty());
}

#[tokio::test]
async fn sign_out_drops_the_bearer_header() {
    let mock = MockCatalog::start(Envelope::Wrapped).await;
    mock.insert_product(civic());
    let session = Arc::new(SessionStore::in_memory());
    session.sign_in("tok").unwrap();
    let gateway = HttpGateway::new(mock.config())
        .unwrap()
        .with_credentials(session.clone());
    let nav = RecordingNavigator::default();

    sign_out(&session, &nav).unwrap();
    gateway.fetch_by_id(&ProductId::new("42")).await.unwrap();

    assert_eq!(nav.routes(), [Route::SignIn]);
    assert_eq!(mock.requests()[0].authorization, None);
}
