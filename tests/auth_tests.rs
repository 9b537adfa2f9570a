//! Authentication and authorization tests
//!
//! Token round trips, password hashing, the session cache TTL and the
//! authenticator working together with the role gate.

use std::sync::Arc;

use chrono::Duration;
use contacts_api::auth::models::NewUser;
use contacts_api::auth::{
    Authenticator, PasswordHasher, Role, RoleGate, SessionCache, TokenService, User,
    USER_CACHE_TTL_SECS,
};
use contacts_api::cache::MemoryCacheStore;
use contacts_api::config::RoleReconciliation;
use contacts_api::db::{MemoryStore, UserStore};
use contacts_api::Error;

fn tokens() -> TokenService {
    TokenService::new("auth-tests-secret", "HS256").unwrap()
}

fn user(email: &str, role: Role) -> User {
    User {
        id: 7,
        email: email.to_string(),
        password: "$2b$04$digest".to_string(),
        first_name: Some("Ann".to_string()),
        last_name: None,
        confirmed: true,
        avatar: None,
        role,
    }
}

async fn store_with(email: &str, role: Role) -> MemoryStore {
    let store = MemoryStore::new();
    store
        .insert(NewUser {
            email: email.to_string(),
            password: "digest".to_string(),
            first_name: None,
            last_name: None,
            role,
        })
        .await
        .unwrap();
    store
}

// Tokens

#[test]
fn test_access_token_round_trip_for_every_role() {
    let tokens = tokens();
    for subject in ["a@x.com", "someone.else@example.org", "ü@例え.jp"] {
        for role in [Role::Admin, Role::User] {
            let token = tokens.issue_access_token(subject, role).unwrap();
            let claims = tokens.verify(&token).unwrap();
            assert_eq!(claims.sub, subject);
            assert_eq!(claims.roles, Some(role));
            assert!(claims.exp > chrono::Utc::now().timestamp());
        }
    }
}

#[test]
fn test_expired_token_is_rejected() {
    let tokens = tokens();
    let token = tokens
        .issue_access_token_with_ttl("a@x.com", Role::User, Duration::seconds(-1))
        .unwrap();
    assert!(matches!(tokens.verify(&token), Err(Error::InvalidToken(_))));
}

#[test]
fn test_foreign_secret_and_tampering_are_rejected() {
    let ours = tokens();
    let theirs = TokenService::new("someone-elses-secret", "HS256").unwrap();

    for role in [Role::Admin, Role::User] {
        let forged = theirs.issue_access_token("a@x.com", role).unwrap();
        assert!(ours.verify(&forged).is_err());

        let token = ours.issue_access_token("a@x.com", role).unwrap();
        let (head, signature) = token.rsplit_once('.').unwrap();
        let mut chars: Vec<char> = signature.chars().collect();
        chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
        let tampered = format!("{}.{}", head, chars.into_iter().collect::<String>());
        assert!(ours.verify(&tampered).is_err());
    }
}

#[test]
fn test_action_tokens_are_not_bearer_credentials() {
    let tokens = tokens();
    let action = tokens.issue_action_token("a@x.com").unwrap();
    assert!(tokens.verify_action(&action).is_ok());
    assert!(tokens.verify_access(&action).is_err());

    let access = tokens.issue_access_token("a@x.com", Role::User).unwrap();
    assert!(tokens.verify_action(&access).is_err());
}

// Passwords

#[test]
fn test_password_hashing_properties() {
    let hasher = PasswordHasher::new(4);
    for password in ["a", "correct horse battery staple", "пароль"] {
        let digest = hasher.hash(password).unwrap();
        assert_ne!(digest, password);
        assert!(hasher.verify(password, &digest));
        assert!(!hasher.verify(&format!("{}x", password), &digest));
    }
}

#[test]
fn test_same_password_gets_distinct_salts() {
    let hasher = PasswordHasher::new(4);
    let first = hasher.hash("secret123").unwrap();
    let second = hasher.hash("secret123").unwrap();
    assert_ne!(first, second);
    assert!(hasher.verify("secret123", &first));
    assert!(hasher.verify("secret123", &second));
}

// Session cache

#[tokio::test]
async fn test_cache_entry_lives_for_the_ttl() {
    let store = MemoryCacheStore::new();
    let cache = SessionCache::new(Arc::new(store.clone()), USER_CACHE_TTL_SECS);
    let u = user("a@x.com", Role::Admin);

    cache.put(&u).await;
    assert_eq!(cache.get("a@x.com").await, Some(u.clone()));

    store.advance(Duration::seconds(899)).await;
    assert_eq!(cache.get("a@x.com").await, Some(u));

    store.advance(Duration::seconds(1)).await;
    assert_eq!(cache.get("a@x.com").await, None);
}

#[tokio::test]
async fn test_put_resets_the_expiry() {
    let store = MemoryCacheStore::new();
    let cache = SessionCache::new(Arc::new(store.clone()), USER_CACHE_TTL_SECS);
    let u = user("a@x.com", Role::User);

    cache.put(&u).await;
    store.advance(Duration::seconds(600)).await;
    cache.put(&u).await;
    store.advance(Duration::seconds(600)).await;
    assert!(cache.get("a@x.com").await.is_some());
}

// Authenticator and role gate

#[tokio::test]
async fn test_resolve_populates_cache_within_ttl() {
    let tokens = tokens();
    let store = MemoryCacheStore::new();
    let cache = SessionCache::new(Arc::new(store.clone()), USER_CACHE_TTL_SECS);
    let users = store_with("a@x.com", Role::User).await;
    let auth = Authenticator::new(
        tokens.clone(),
        cache.clone(),
        Arc::new(users),
        RoleReconciliation::Store,
    );

    let token = tokens.issue_access_token("a@x.com", Role::User).unwrap();
    auth.resolve(&token).await.unwrap();

    store.advance(Duration::seconds(USER_CACHE_TTL_SECS as i64 - 1)).await;
    assert!(cache.get("a@x.com").await.is_some());
}

#[tokio::test]
async fn test_resolve_unknown_subject_is_unauthorized() {
    let tokens = tokens();
    let cache = SessionCache::new(Arc::new(MemoryCacheStore::new()), USER_CACHE_TTL_SECS);
    let users = store_with("a@x.com", Role::User).await;
    let auth = Authenticator::new(tokens.clone(), cache, Arc::new(users), RoleReconciliation::Store);

    let token = tokens.issue_access_token("b@x.com", Role::User).unwrap();
    assert!(matches!(auth.resolve(&token).await, Err(Error::Unauthorized(_))));
}

#[test]
fn test_role_gate_membership() {
    let admin = user("a@x.com", Role::Admin);
    let regular = user("u@x.com", Role::User);

    let admins = RoleGate::admin_only();
    assert!(admins.check(&admin).is_ok());
    assert!(matches!(admins.check(&regular), Err(Error::Forbidden(_))));

    let everyone = RoleGate::new([Role::Admin, Role::User]);
    assert!(everyone.check(&admin).is_ok());
    assert!(everyone.check(&regular).is_ok());

    let nobody = RoleGate::new(Vec::<Role>::new());
    assert!(nobody.check(&admin).is_err());
}

#[tokio::test]
async fn test_end_to_end_admin_passes_admin_gate_only() {
    let tokens = tokens();
    let cache = SessionCache::new(Arc::new(MemoryCacheStore::new()), USER_CACHE_TTL_SECS);
    let users = store_with("a@x.com", Role::Admin).await;

    for mode in [RoleReconciliation::Store, RoleReconciliation::Claim] {
        let auth = Authenticator::new(
            tokens.clone(),
            cache.clone(),
            Arc::new(users.clone()),
            mode,
        );
        let token = tokens.issue_access_token("a@x.com", Role::Admin).unwrap();
        let principal = auth.resolve(&token).await.unwrap();

        assert_eq!(principal.role, Role::Admin);
        assert!(RoleGate::new([Role::Admin]).check(&principal).is_ok());
        assert!(matches!(
            RoleGate::new([Role::User]).check(&principal),
            Err(Error::Forbidden(_))
        ));
    }
}

#[tokio::test]
async fn test_demotion_in_store_wins_over_stale_cache() {
    let tokens = tokens();
    let cache = SessionCache::new(Arc::new(MemoryCacheStore::new()), USER_CACHE_TTL_SECS);
    let users = store_with("a@x.com", Role::Admin).await;
    let auth = Authenticator::new(
        tokens.clone(),
        cache.clone(),
        Arc::new(users.clone()),
        RoleReconciliation::Claim,
    );

    let token = tokens.issue_access_token("a@x.com", Role::Admin).unwrap();
    auth.resolve(&token).await.unwrap();

    users.set_role("a@x.com", Role::User).await.unwrap();
    cache.invalidate("a@x.com").await;

    let principal = auth.resolve(&token).await.unwrap();
    assert_eq!(principal.role, Role::User);
    assert!(RoleGate::admin_only().check(&principal).is_err());
}
