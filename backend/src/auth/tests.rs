use super::*;
use argon2::{
    PasswordHasher,
    password_hash::SaltString,
};
use axum::http::Request;

const SECRET: &str = "supersecretjwtsecretforunittesting123";

fn manager() -> TokenManager {
    TokenManager::new(SECRET, 900, 604_800)
}

#[test]
fn test_issue_pair_round_trips_subject() {
    let user_id = Uuid::new_v4();
    let pair = manager().issue_pair(user_id).unwrap();

    assert_eq!(pair.expires_in, 900);
    assert_eq!(
        manager().user_id(&pair.access_token, TokenKind::Access).unwrap(),
        user_id
    );
    assert_eq!(
        manager().user_id(&pair.refresh_token, TokenKind::Refresh).unwrap(),
        user_id
    );
}

#[test]
fn test_refresh_token_is_not_an_access_token() {
    let pair = manager().issue_pair(Uuid::new_v4()).unwrap();

    assert!(manager().validate(&pair.refresh_token, TokenKind::Access).is_err());
    assert!(manager().validate(&pair.access_token, TokenKind::Refresh).is_err());
}

#[test]
fn test_expired_token_is_rejected() {
    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        kind: TokenKind::Access,
        exp: 1,
        iat: 0,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    assert!(manager().validate(&token, TokenKind::Access).is_err());
}

#[test]
fn test_invalid_signature_is_rejected() {
    let pair = TokenManager::new("wrongsecret", 900, 900)
        .issue_pair(Uuid::new_v4())
        .unwrap();

    assert!(manager().validate(&pair.access_token, TokenKind::Access).is_err());
}

#[test]
fn test_verify_password_against_argon2_hash() {
    let salt = SaltString::from_b64("c29tZXNhbHRmb3J0ZXN0cw").unwrap();
    let hash = Argon2::default()
        .hash_password(b"correct horse", &salt)
        .unwrap()
        .to_string();

    assert!(verify_password("correct horse", &hash));
    assert!(!verify_password("battery staple", &hash));
    assert!(!verify_password("correct horse", "not-a-phc-string"));
}

#[test]
fn test_hash_password_salts_every_hash() {
    let first = hash_password("correct horse").unwrap();
    let second = hash_password("correct horse").unwrap();

    assert_ne!(first, second);
    assert!(verify_password("correct horse", &first));
    assert!(verify_password("correct horse", &second));
}

#[tokio::test]
async fn test_extractor_reads_bearer_access_token() {
    let tokens = Arc::new(manager());
    let user_id = Uuid::new_v4();
    let pair = tokens.issue_pair(user_id).unwrap();

    let request = Request::builder()
        .header("Authorization", format!("Bearer {}", pair.access_token))
        .body(())
        .unwrap();
    let (mut parts, _) = request.into_parts();
    parts.extensions.insert(Arc::clone(&tokens));

    let auth = AuthUser::from_request_parts(&mut parts, &()).await.unwrap();
    assert_eq!(auth.user_id, user_id);
}

#[tokio::test]
async fn test_extractor_rejects_missing_header() {
    let request = Request::builder().body(()).unwrap();
    let (mut parts, _) = request.into_parts();
    parts.extensions.insert(Arc::new(manager()));

    let (status, _) = AuthUser::from_request_parts(&mut parts, &()).await.unwrap_err();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
