//! Authentication integration tests.
//!
//! Drives a real server against a mocked JWKS endpoint and checks each
//! rejection reason end to end.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use anyhow::Result;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use receipts_test_utils::*;
use std::collections::HashMap;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Server plus the mock issuer it trusts (publishing the primary key).
async fn spawn_with_primary_key() -> Result<(MockJwks, TestReceiptsServer)> {
    let jwks = MockJwks::start(&[&TestKeypair::primary()]).await;
    let server = TestReceiptsServer::spawn(&jwks.jwks_url()).await?;
    Ok((jwks, server))
}

/// Assert a 401 with the given error code and return the message.
async fn assert_unauthorized(response: reqwest::Response, code: &str) -> Result<String> {
    assert_eq!(response.status(), 401);

    let www_auth = response
        .headers()
        .get("www-authenticate")
        .expect("Should include WWW-Authenticate header")
        .to_str()?
        .to_string();
    assert!(www_auth.starts_with("Bearer"));

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], code, "unexpected body: {}", body);
    Ok(body["error"]["message"].as_str().unwrap_or_default().to_string())
}

fn unsigned_token(header: &str, payload: &serde_json::Value) -> String {
    format!(
        "{}.{}.",
        URL_SAFE_NO_PAD.encode(header.as_bytes()),
        URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes())
    )
}

// =============================================================================
// Missing or unusable Authorization header
// =============================================================================

#[tokio::test]
async fn test_receipts_requires_auth() -> Result<()> {
    let (_jwks, server) = spawn_with_primary_key().await?;

    for path in ["/receipts", "/receipts/rct_1"] {
        let response = server.get(path).await?;
        let message = assert_unauthorized(response, "MISSING_TOKEN").await?;
        assert_eq!(message, "Missing token");
    }

    Ok(())
}

#[tokio::test]
async fn test_missing_token_challenge_has_no_error_attribute() -> Result<()> {
    let (_jwks, server) = spawn_with_primary_key().await?;

    let response = server.get("/receipts").await?;

    let www_auth = response.headers().get("www-authenticate").unwrap().to_str()?;
    assert_eq!(www_auth, "Bearer realm=\"receipts-api\"");

    Ok(())
}

#[tokio::test]
async fn test_rejects_non_bearer_scheme() -> Result<()> {
    let (_jwks, server) = spawn_with_primary_key().await?;

    let response = server
        .get_with_authorization("/receipts", "Basic dXNlcjpwYXNz")
        .await?;

    assert_unauthorized(response, "MISSING_TOKEN").await?;
    Ok(())
}

#[tokio::test]
async fn test_rejects_empty_bearer_token() -> Result<()> {
    let (_jwks, server) = spawn_with_primary_key().await?;

    let response = server.get_with_authorization("/receipts", "Bearer ").await?;

    assert_unauthorized(response, "MISSING_TOKEN").await?;
    Ok(())
}

#[tokio::test]
async fn test_missing_token_does_not_fetch_jwks() -> Result<()> {
    let (jwks, server) = spawn_with_primary_key().await?;

    server.get("/receipts").await?;

    assert_eq!(jwks.fetch_count().await, 0);
    Ok(())
}

// =============================================================================
// Key selection
// =============================================================================

#[tokio::test]
async fn test_rejects_unknown_kid() -> Result<()> {
    let (_jwks, server) = spawn_with_primary_key().await?;

    // Signed by a key the issuer does not publish
    let token = TestTokenBuilder::new().sign(&TestKeypair::secondary());

    let response = server.get_with_token("/receipts", &token).await?;

    let message = assert_unauthorized(response, "INVALID_KEY_ID").await?;
    assert_eq!(message, "Invalid key ID");
    Ok(())
}

#[tokio::test]
async fn test_rejects_token_without_kid() -> Result<()> {
    let (_jwks, server) = spawn_with_primary_key().await?;

    let token = TestTokenBuilder::new()
        .without_kid()
        .sign(&TestKeypair::primary());

    let response = server.get_with_token("/receipts", &token).await?;

    assert_unauthorized(response, "INVALID_KEY_ID").await?;
    Ok(())
}

#[tokio::test]
async fn test_rejects_unusable_published_key() -> Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "keys": [{
                "kty": "OKP",
                "kid": "primary-key",
                "crv": "Ed25519",
                "x": "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo"
            }]
        })))
        .mount(&mock_server)
        .await;
    let server =
        TestReceiptsServer::spawn(&format!("{}{}", mock_server.uri(), JWKS_PATH)).await?;

    let token = TestTokenBuilder::new().sign(&TestKeypair::primary());
    let response = server.get_with_token("/receipts", &token).await?;

    let message = assert_unauthorized(response, "INVALID_KEY_FORMAT").await?;
    assert!(message.starts_with("Invalid key format: "));
    Ok(())
}

// =============================================================================
// Token verification
// =============================================================================

#[tokio::test]
async fn test_rejects_token_signed_by_wrong_key() -> Result<()> {
    let (_jwks, server) = spawn_with_primary_key().await?;

    // Correct kid, aud and iss, but the signature is from another key
    let token = TestTokenBuilder::new()
        .with_kid(TestKeypair::primary().kid)
        .sign(&TestKeypair::secondary());

    let response = server.get_with_token("/receipts", &token).await?;

    let message = assert_unauthorized(response, "TOKEN_INVALID").await?;
    assert_eq!(message, "Token invalid: InvalidSignature");
    Ok(())
}

#[tokio::test]
async fn test_rejects_expired_token() -> Result<()> {
    let (_jwks, server) = spawn_with_primary_key().await?;

    let token = TestTokenBuilder::new()
        .expired()
        .sign(&TestKeypair::primary());

    let response = server.get_with_token("/receipts", &token).await?;

    let message = assert_unauthorized(response, "TOKEN_INVALID").await?;
    assert_eq!(message, "Token invalid: ExpiredSignature");
    Ok(())
}

#[tokio::test]
async fn test_rejects_recently_expired_token() -> Result<()> {
    let (_jwks, server) = spawn_with_primary_key().await?;

    // Well inside the default clock skew window
    let token = TestTokenBuilder::new()
        .for_subject(OWNER_A)
        .expires_in(-240)
        .sign(&TestKeypair::primary());

    let response = server.get_with_token("/receipts", &token).await?;

    let message = assert_unauthorized(response, "TOKEN_INVALID").await?;
    assert_eq!(message, "Token invalid: ExpiredSignature");
    Ok(())
}

#[tokio::test]
async fn test_rejects_wrong_audience() -> Result<()> {
    let (_jwks, server) = spawn_with_primary_key().await?;

    let token = TestTokenBuilder::new()
        .with_audience("https://api.example.com/other")
        .sign(&TestKeypair::primary());

    let response = server.get_with_token("/receipts", &token).await?;

    let message = assert_unauthorized(response, "TOKEN_INVALID").await?;
    assert_eq!(message, "Token invalid: InvalidAudience");
    Ok(())
}

#[tokio::test]
async fn test_rejects_wrong_issuer() -> Result<()> {
    let (_jwks, server) = spawn_with_primary_key().await?;

    let token = TestTokenBuilder::new()
        .with_issuer("https://evil.example/")
        .sign(&TestKeypair::primary());

    let response = server.get_with_token("/receipts", &token).await?;

    let message = assert_unauthorized(response, "TOKEN_INVALID").await?;
    assert_eq!(message, "Token invalid: InvalidIssuer");
    Ok(())
}

#[tokio::test]
async fn test_rejects_future_iat() -> Result<()> {
    let (_jwks, server) = spawn_with_primary_key().await?;

    let token = TestTokenBuilder::new()
        .issued_at(Utc::now().timestamp() + 3600)
        .expires_in(7200)
        .sign(&TestKeypair::primary());

    let response = server.get_with_token("/receipts", &token).await?;

    assert_unauthorized(response, "TOKEN_INVALID").await?;
    Ok(())
}

#[tokio::test]
async fn test_rejects_alg_none() -> Result<()> {
    let (_jwks, server) = spawn_with_primary_key().await?;

    let claims = TestTokenBuilder::new().build();
    let token = unsigned_token(r#"{"alg":"none","typ":"JWT","kid":"primary-key"}"#, &claims);

    let response = server.get_with_token("/receipts", &token).await?;

    assert_unauthorized(response, "TOKEN_INVALID").await?;
    Ok(())
}

#[tokio::test]
async fn test_rejects_hs256_token() -> Result<()> {
    let (_jwks, server) = spawn_with_primary_key().await?;

    // HMAC keyed with the public modulus: the classic algorithm confusion attack
    let claims = TestTokenBuilder::new().build();
    let mut header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256);
    header.kid = Some("primary-key".to_string());
    let key = jsonwebtoken::EncodingKey::from_secret(TestKeypair::primary().n.as_bytes());
    let token = jsonwebtoken::encode(&header, &claims, &key)?;

    let response = server.get_with_token("/receipts", &token).await?;

    let message = assert_unauthorized(response, "TOKEN_INVALID").await?;
    assert_eq!(message, "Token invalid: InvalidAlgorithm");
    Ok(())
}

#[tokio::test]
async fn test_rejects_oversized_token() -> Result<()> {
    let (_jwks, server) = spawn_with_primary_key().await?;

    let token = TestTokenBuilder::new()
        .with_claim("padding", serde_json::json!("x".repeat(9000)))
        .sign(&TestKeypair::primary());
    assert!(token.len() > 8192);

    let response = server.get_with_token("/receipts", &token).await?;

    let message = assert_unauthorized(response, "TOKEN_INVALID").await?;
    assert_eq!(message, "Token invalid: token exceeds maximum size");
    Ok(())
}

#[tokio::test]
async fn test_rejects_malformed_token() -> Result<()> {
    let (_jwks, server) = spawn_with_primary_key().await?;

    let response = server
        .get_with_token("/receipts", "not.a.valid.jwt")
        .await?;

    assert_unauthorized(response, "TOKEN_INVALID").await?;
    Ok(())
}

#[tokio::test]
async fn test_rejects_token_without_subject() -> Result<()> {
    let (_jwks, server) = spawn_with_primary_key().await?;

    let token = TestTokenBuilder::new()
        .without_subject()
        .sign(&TestKeypair::primary());

    let response = server.get_with_token("/receipts", &token).await?;

    let message = assert_unauthorized(response, "INVALID_PAYLOAD").await?;
    assert_eq!(message, "Invalid token payload");
    Ok(())
}

#[tokio::test]
async fn test_rejects_token_with_empty_subject() -> Result<()> {
    let (_jwks, server) = spawn_with_primary_key().await?;

    let token = TestTokenBuilder::new()
        .for_subject("")
        .sign(&TestKeypair::primary());

    let response = server.get_with_token("/receipts", &token).await?;

    assert_unauthorized(response, "INVALID_PAYLOAD").await?;
    Ok(())
}

#[tokio::test]
async fn test_accepts_valid_token() -> Result<()> {
    let (_jwks, server) = spawn_with_primary_key().await?;

    let token = TestTokenBuilder::new()
        .for_subject(OWNER_B)
        .sign(&TestKeypair::primary());

    let response = server.get_with_token("/receipts", &token).await?;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["user"], OWNER_B);
    Ok(())
}

// =============================================================================
// Key set fetching and caching
// =============================================================================

#[tokio::test]
async fn test_jwks_unavailable_is_503() -> Result<()> {
    let jwks = MockJwks::start_failing(500).await;
    let server = TestReceiptsServer::spawn(&jwks.jwks_url()).await?;

    let token = TestTokenBuilder::new().sign(&TestKeypair::primary());
    let response = server.get_with_token("/receipts", &token).await?;

    assert_eq!(response.status(), 503);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "UPSTREAM_UNAVAILABLE");
    assert_eq!(
        body["error"]["message"],
        "Authentication service temporarily unavailable"
    );
    Ok(())
}

#[tokio::test]
async fn test_jwks_fetched_once_across_requests() -> Result<()> {
    let (jwks, server) = spawn_with_primary_key().await?;
    let token = TestTokenBuilder::new().sign(&TestKeypair::primary());

    for _ in 0..10 {
        let response = server.get_with_token("/receipts", &token).await?;
        assert_eq!(response.status(), 200);
    }

    assert_eq!(jwks.fetch_count().await, 1);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_first_requests_fetch_jwks_once() -> Result<()> {
    let (jwks, server) = spawn_with_primary_key().await?;
    let token = TestTokenBuilder::new().sign(&TestKeypair::primary());

    let requests = (0..16).map(|_| server.get_with_token("/receipts", &token));
    for response in futures::future::join_all(requests).await {
        assert_eq!(response?.status(), 200);
    }

    assert_eq!(jwks.fetch_count().await, 1);
    Ok(())
}

#[tokio::test]
async fn test_unknown_kid_does_not_refetch() -> Result<()> {
    let (jwks, server) = spawn_with_primary_key().await?;
    let good = TestTokenBuilder::new().sign(&TestKeypair::primary());
    let unknown = TestTokenBuilder::new().sign(&TestKeypair::secondary());

    assert_eq!(server.get_with_token("/receipts", &good).await?.status(), 200);
    for _ in 0..3 {
        assert_eq!(
            server.get_with_token("/receipts", &unknown).await?.status(),
            401
        );
    }

    assert_eq!(jwks.fetch_count().await, 1);
    Ok(())
}

#[tokio::test]
async fn test_invalidate_picks_up_rotated_keys() -> Result<()> {
    let (jwks, server) = spawn_with_primary_key().await?;
    let old = TestTokenBuilder::new().sign(&TestKeypair::primary());
    let new = TestTokenBuilder::new().sign(&TestKeypair::secondary());

    assert_eq!(server.get_with_token("/receipts", &old).await?.status(), 200);

    jwks.rotate(&[&TestKeypair::secondary()]).await;

    // Cached set still has only the old key
    assert_eq!(server.get_with_token("/receipts", &new).await?.status(), 401);
    assert_eq!(jwks.fetch_count().await, 0);

    server.state().jwks_client.invalidate().await;

    assert_eq!(server.get_with_token("/receipts", &new).await?.status(), 200);
    assert_eq!(server.get_with_token("/receipts", &old).await?.status(), 401);
    assert_eq!(jwks.fetch_count().await, 1);
    Ok(())
}

#[tokio::test]
async fn test_ttl_expiry_refetches_jwks() -> Result<()> {
    let jwks = MockJwks::start(&[&TestKeypair::primary()]).await;
    let server = TestReceiptsServer::spawn_with_vars(
        &jwks.jwks_url(),
        HashMap::from([("JWKS_CACHE_TTL_SECONDS".to_string(), "1".to_string())]),
    )
    .await?;
    let token = TestTokenBuilder::new().sign(&TestKeypair::primary());

    assert_eq!(server.get_with_token("/receipts", &token).await?.status(), 200);
    assert_eq!(server.get_with_token("/receipts", &token).await?.status(), 200);
    assert_eq!(jwks.fetch_count().await, 1);

    tokio::time::sleep(Duration::from_millis(1100)).await;

    assert_eq!(server.get_with_token("/receipts", &token).await?.status(), 200);
    assert_eq!(jwks.fetch_count().await, 2);
    Ok(())
}

#[tokio::test]
async fn test_never_policy_keeps_first_key_set() -> Result<()> {
    let jwks = MockJwks::start(&[&TestKeypair::primary()]).await;
    let server = TestReceiptsServer::spawn_with_vars(
        &jwks.jwks_url(),
        HashMap::from([("JWKS_CACHE_TTL_SECONDS".to_string(), "never".to_string())]),
    )
    .await?;
    let token = TestTokenBuilder::new().sign(&TestKeypair::primary());

    assert_eq!(server.get_with_token("/receipts", &token).await?.status(), 200);
    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(server.get_with_token("/receipts", &token).await?.status(), 200);

    assert_eq!(jwks.fetch_count().await, 1);
    Ok(())
}
