//! Integration tests for the Questscribe HTTP client

use chrono::Utc;
use questscribe_core::SessionContext;
use questscribe_core::SessionEvent;
use questscribe_core::auth::{ROLE_CLAIM, encode_unsigned};
use questscribe_core::subscription::SubscriptionTier;
use questscribe_http::client::health::HealthStatus;
use questscribe_http::{ApiClient, ClientError};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn token_expiring_in(seconds: i64) -> String {
    encode_unsigned(&json!({
        "sub": "1",
        "playerId": 21,
        "email": "hero@example.com",
        "exp": Utc::now().timestamp() + seconds,
    }))
}

async fn logged_in_client(server: &MockServer) -> (ApiClient, String) {
    let token = token_expiring_in(24 * 3600);
    let session = SessionContext::in_memory();
    session.login(&token).unwrap();
    let client = ApiClient::builder()
        .base_url(format!("{}/api/", server.uri()))
        .session(session)
        .build()
        .unwrap();
    (client, token)
}

fn no_authorization(request: &Request) -> bool {
    !request.headers.contains_key("authorization")
}

#[tokio::test]
async fn test_client_builder() {
    let client = ApiClient::builder()
        .base_url("http://localhost:5095/api/")
        .build();

    assert!(client.is_ok());
    let client = client.unwrap();
    assert_eq!(client.base_url(), "http://localhost:5095/api");
}

#[tokio::test]
async fn test_client_builder_requires_base_url() {
    let result = ApiClient::builder().build();
    assert!(matches!(result, Err(ClientError::Configuration(_))));

    let invalid = ApiClient::new("not a url");
    assert!(matches!(invalid, Err(ClientError::Configuration(_))));
}

#[tokio::test]
async fn test_authenticated_call_attaches_bearer_token() {
    let mock_server = MockServer::start().await;
    let (client, token) = logged_in_client(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api/characters"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "characterId": 1, "name": "Mirela", "class": "Rogue", "level": 3 }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let characters = client.list_characters().await.unwrap();
    assert_eq!(characters.len(), 1);
    assert_eq!(characters[0].name, "Mirela");
    assert_eq!(characters[0].class.as_deref(), Some("Rogue"));
}

#[tokio::test]
async fn test_public_login_omits_authorization_and_stores_token() {
    let mock_server = MockServer::start().await;
    let issued = token_expiring_in(3600);

    Mock::given(method("POST"))
        .and(path("/api/auth/google"))
        .and(body_json(json!({ "idToken": "google-credential" })))
        .and(no_authorization)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": issued })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(format!("{}/api", mock_server.uri())).unwrap();
    let mut events = client.session().subscribe();

    let token = client.login_google("google-credential").await.unwrap();

    assert_eq!(token, issued);
    assert_eq!(client.session().token().as_deref(), Some(issued.as_str()));
    assert_eq!(
        client.session().user().unwrap().as_deref(),
        Some("hero@example.com")
    );
    assert_eq!(client.session().player().unwrap().as_deref(), Some("21"));
    assert_eq!(events.try_recv().unwrap(), SessionEvent::LoggedIn);
}

#[tokio::test]
async fn test_login_without_token_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/dev-login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri()).unwrap();
    let result = client.dev_login("dev@example.com").await;

    assert!(result.unwrap_err().is_unauthenticated());
    assert_eq!(client.session().token(), None);
}

#[tokio::test]
async fn test_relogin_does_not_keep_previous_user_flags() {
    let mock_server = MockServer::start().await;
    let exp = Utc::now().timestamp() + 3600;
    let first = encode_unsigned(&json!({
        "sub": "1",
        "playerId": 1,
        "email": "alice@example.com",
        "exp": exp,
    }));
    let second = encode_unsigned(&json!({ "sub": "2", "exp": exp }));

    Mock::given(method("POST"))
        .and(path("/auth/dev-login"))
        .and(body_json(json!({ "email": "alice@example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": first })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/dev-login"))
        .and(body_json(json!({ "email": "bob@example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": second })))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri()).unwrap();
    client.dev_login("alice@example.com").await.unwrap();
    assert_eq!(client.session().player().unwrap().as_deref(), Some("1"));

    client.session().invalidate("expired");
    assert_eq!(client.session().user().unwrap(), None);

    client.dev_login("bob@example.com").await.unwrap();
    assert_eq!(client.session().token().as_deref(), Some(second.as_str()));
    assert_eq!(client.session().user().unwrap(), None);
    assert_eq!(client.session().player().unwrap(), None);
}

#[tokio::test]
async fn test_error_message_from_json_body() {
    let mock_server = MockServer::start().await;
    let (client, _) = logged_in_client(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api/character/9"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Character not found" })),
        )
        .mount(&mock_server)
        .await;

    let error = client.get_character(9).await.unwrap_err();
    assert_eq!(error.to_string(), "Character not found");
    assert_eq!(error.status(), Some(404));
}

#[tokio::test]
async fn test_error_message_for_unparsable_body() {
    let mock_server = MockServer::start().await;
    let (client, _) = logged_in_client(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api/characters"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>Bad Gateway</html>"))
        .mount(&mock_server)
        .await;

    let error = client.list_characters().await.unwrap_err();
    assert_eq!(error.to_string(), "HTTP error! status: 500");
}

#[tokio::test]
async fn test_error_message_for_json_without_message() {
    let mock_server = MockServer::start().await;
    let (client, _) = logged_in_client(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/api/ai/negotiate"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "empty" })))
        .mount(&mock_server)
        .await;

    let error = client.negotiate_character(&[]).await.unwrap_err();
    assert_eq!(error.to_string(), r#"{"error":"empty"}"#);
}

#[tokio::test]
async fn test_unauthorized_response_invalidates_session() {
    let mock_server = MockServer::start().await;
    let (client, _) = logged_in_client(&mock_server).await;
    let mut events = client.session().subscribe();

    Mock::given(method("GET"))
        .and(path("/api/subscription/status"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let error = client.subscription_status().await.unwrap_err();

    assert!(error.is_unauthenticated());
    assert_eq!(error.to_string(), "HTTP error! status: 401");
    assert_eq!(client.session().token(), None);
    assert!(matches!(
        events.try_recv().unwrap(),
        SessionEvent::Invalidated { .. }
    ));
}

#[tokio::test]
async fn test_forbidden_response_invalidates_session() {
    let mock_server = MockServer::start().await;
    let (client, _) = logged_in_client(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api/characters"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let error = client.list_characters().await.unwrap_err();

    assert!(error.is_unauthenticated());
    assert_eq!(error.status(), Some(403));
    assert_eq!(client.session().token(), None);
}

#[tokio::test]
async fn test_admin_test_denied_keeps_session() {
    let mock_server = MockServer::start().await;
    let (client, token) = logged_in_client(&mock_server).await;
    let mut events = client.session().subscribe();

    Mock::given(method("GET"))
        .and(path("/api/auth/admin/test"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({ "message": "Administrators only" })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let error = client.admin_test().await.unwrap_err();

    assert_eq!(error.status(), Some(403));
    assert_eq!(error.to_string(), "Administrators only");
    assert_eq!(client.session().token().as_deref(), Some(token.as_str()));
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_admin_test_unauthorized_invalidates_session() {
    let mock_server = MockServer::start().await;
    let (client, _) = logged_in_client(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api/auth/admin/test"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let error = client.admin_test().await.unwrap_err();

    assert!(error.is_unauthenticated());
    assert_eq!(client.session().token(), None);
}

#[tokio::test]
async fn test_delete_character_removes_it_and_second_delete_fails() {
    let mock_server = MockServer::start().await;
    let (client, _) = logged_in_client(&mock_server).await;

    Mock::given(method("DELETE"))
        .and(path("/api/character/1"))
        .respond_with(ResponseTemplate::new(204))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/character/1"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Character not found" })),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/characters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "characterId": 2, "name": "Tobin" }
        ])))
        .mount(&mock_server)
        .await;

    client.delete_character(1).await.unwrap();

    let remaining = client.list_characters().await.unwrap();
    assert!(remaining.iter().all(|c| c.character_id != 1));

    let second = client.delete_character(1).await.unwrap_err();
    assert_eq!(second.to_string(), "Character not found");
}

#[tokio::test]
async fn test_session_flow() {
    let mock_server = MockServer::start().await;
    let (client, _) = logged_in_client(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/api/session/character/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sessionId": 77,
            "characterId": 4,
            "summary": "You stand at the gate."
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/dm/session/77/start"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "narrative": "The gate is locked.",
            "dmNotes": "Key is under the mat."
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/dm/session/77/action"))
        .and(body_json(json!({
            "action": "Look under the mat",
            "sessionSummary": "The gate is locked."
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "narrative": "You find a rusty key."
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sessions/77/history"))
        .and(query_param("page", "2"))
        .and(query_param("pageSize", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "submissions": [
                { "sequenceNumber": 5, "action": "open", "narrative": "It opens." }
            ],
            "page": 2,
            "pageSize": 4,
            "totalCount": 5
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/sessions/77/finalize"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7".to_vec()))
        .mount(&mock_server)
        .await;

    let mut session = client.get_or_create_session(4).await.unwrap();
    assert_eq!(session.session_id, "77");

    let opening = client.start_session(&session.session_id).await.unwrap();
    assert_eq!(opening.dm_notes.as_deref(), Some("Key is under the mat."));
    session.advance(&opening.narrative);

    let result = client
        .submit_action(&session.session_id, "Look under the mat", session.summary.clone())
        .await
        .unwrap();
    session.advance(&result.narrative);
    assert_eq!(session.summary.as_deref(), Some("You find a rusty key."));

    let history = client.session_history("77", 2, 4).await.unwrap();
    assert_eq!(history.submissions[0].sequence, 5);
    assert_eq!(history.total_count, 5);

    let document = client.finalize_session("77").await.unwrap();
    assert_eq!(&document[..], b"%PDF-1.7");
}

#[tokio::test]
async fn test_character_editing_and_images() {
    let mock_server = MockServer::start().await;
    let (client, _) = logged_in_client(&mock_server).await;

    Mock::given(method("PUT"))
        .and(path("/api/character/4/sheet"))
        .and(body_json(json!({ "characterSheet": "# Mirela\nLevel 4" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/character/4/image/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "imageUrl": "https://img.example/4.png" })),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/character/4/image"))
        .and(body_json(json!({ "imageUrl": "https://img.example/4.png" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&mock_server)
        .await;

    client
        .update_character_sheet(4, "# Mirela\nLevel 4")
        .await
        .unwrap();
    let image = client.generate_character_image(4, None).await.unwrap();
    client.save_character_image(4, image.image_url).await.unwrap();
}

#[tokio::test]
async fn test_subscription_calls() {
    let mock_server = MockServer::start().await;
    let (client, _) = logged_in_client(&mock_server).await;

    Mock::given(method("PUT"))
        .and(path("/api/subscription/upgrade"))
        .and(body_json(json!({ "newTier": "Premium" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/subscription/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/subscription/validate-access"))
        .and(body_json(json!({ "requiredTier": "Premium" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "hasAccess": true })))
        .mount(&mock_server)
        .await;

    client
        .upgrade_subscription(SubscriptionTier::Premium)
        .await
        .unwrap();
    assert!(client.transactions().await.unwrap().is_empty());
    assert!(
        client
            .validate_access(SubscriptionTier::Premium)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_admin_calls() {
    let mock_server = MockServer::start().await;
    let token = encode_unsigned(&json!({
        "exp": Utc::now().timestamp() + 3600,
        ROLE_CLAIM: "Administrator",
    }));
    let session = SessionContext::in_memory();
    session.login(&token).unwrap();
    let client = ApiClient::builder()
        .base_url(mock_server.uri())
        .session(session)
        .build()
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/admin/subscription/grant-free-access"))
        .and(body_json(json!({ "playerId": 8, "reason": "beta tester" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/admin/subscription/reactivate"))
        .and(body_json(json!({ "playerId": 8 })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/api-provider"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "currentProvider": 1,
            "displayName": "Grok",
            "availableProviders": [
                { "provider": 0, "displayName": "OpenAI" },
                { "provider": 1, "displayName": "Grok" }
            ]
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/admin/api-provider/set"))
        .and(body_json(json!({ "provider": 0 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    assert!(client.session().is_administrator());
    client.grant_free_access(8, "beta tester").await.unwrap();
    client.reactivate_user(8).await.unwrap();

    let providers = client.get_api_provider().await.unwrap();
    assert_eq!(providers.available_providers.len(), 2);
    client.set_api_provider(0).await.unwrap();
}

#[tokio::test]
async fn test_health_checks() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/up"))
        .respond_with(ResponseTemplate::new(200).insert_header("x-version", "1.4.2"))
        .mount(&mock_server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health/database"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "version": "16.2" })))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri()).unwrap();
    let results = client
        .check_deployment(&[
            ("Backend API".to_string(), format!("{}/up", mock_server.uri())),
            ("Frontend App".to_string(), format!("{}/down", mock_server.uri())),
        ])
        .await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].status, HealthStatus::Healthy);
    assert_eq!(results[0].version.as_deref(), Some("1.4.2"));
    assert_eq!(results[1].status, HealthStatus::Error);
    assert_eq!(results[1].error.as_deref(), Some("HTTP error! status: 503"));
    assert_eq!(results[2].service, "Database");
    assert_eq!(results[2].status, HealthStatus::Healthy);
    assert_eq!(results[2].version.as_deref(), Some("16.2"));
}

#[tokio::test]
async fn test_unreachable_service_is_an_error() {
    let client = ApiClient::new("http://127.0.0.1:9").unwrap();
    let health = client.check_service("Nowhere", "http://127.0.0.1:9/").await;
    assert_eq!(health.status, HealthStatus::Error);
    assert!(health.error.is_some());
}
