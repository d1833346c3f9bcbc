/// Integration-level tests for the authentication and authorization core,
/// driven through the operation executor without any HTTP in between.
mod common;

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------
#[cfg(test)]
mod credential_tests {
    use proptest::prelude::*;
    use server::auth::CredentialService;

    proptest! {
        // Each case hashes twice.
        #![proptest_config(ProptestConfig::with_cases(6))]

        #[test]
        fn hash_is_salted_and_verifies(password in "[ -~]{1,64}") {
            let svc = CredentialService::new();
            let first = svc.hash(&password).unwrap();
            let second = svc.hash(&password).unwrap();

            prop_assert_ne!(&first, &second);
            prop_assert!(svc.verify(&password, &first).unwrap());
            prop_assert!(svc.verify(&password, &second).unwrap());
        }
    }

    #[tokio::test]
    async fn async_wrappers_agree_with_sync() {
        let svc = CredentialService::new();
        let hash = svc.hash_async("secret123".to_string()).await.unwrap();
        assert!(svc.verify("secret123", &hash).unwrap());
        assert!(
            !svc.verify_async("secret124".to_string(), hash)
                .await
                .unwrap()
        );
    }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------
#[cfg(test)]
mod token_tests {
    use std::time::Duration;

    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
    use proptest::prelude::*;
    use serde_json::json;

    use server::auth::{SigningSecret, TokenService};
    use shared::types::UserId;

    use crate::common;

    const NOW: u64 = 1_700_000_000;

    fn b64(value: serde_json::Value) -> String {
        URL_SAFE_NO_PAD.encode(value.to_string())
    }

    proptest! {
        #[test]
        fn valid_until_ttl_elapses(
            subject in 1i64..i64::MAX,
            ttl in 1u64..100_000_000,
            now in 1_000_000_000u64..3_000_000_000,
        ) {
            let svc = common::tokens();
            let token = svc.issue_at(UserId::new(subject), Duration::from_secs(ttl), now).unwrap();

            let decoded = svc.decode_at(&token, now);
            prop_assert_eq!(decoded.and_then(|t| t.user_id()), Some(UserId::new(subject)));
            prop_assert!(svc.decode_at(&token, now + ttl - 1).is_some());
            prop_assert!(svc.decode_at(&token, now + ttl).is_none());
        }
    }

    #[test]
    fn other_secret_is_rejected() {
        let forger = TokenService::new(&SigningSecret::new("some-other-secret-of-enough-length")).unwrap();
        let token = forger
            .issue_at(UserId::new(1), Duration::from_secs(3600), NOW)
            .unwrap();
        assert!(common::tokens().decode_at(&token, NOW).is_none());
    }

    #[test]
    fn truncated_token_is_rejected() {
        let svc = common::tokens();
        let token = svc
            .issue_at(UserId::new(1), Duration::from_secs(3600), NOW)
            .unwrap();

        assert!(svc.decode_at(&token[..token.len() - 1], NOW).is_none());
        assert!(svc.decode_at(&token[..token.len() / 2], NOW).is_none());
        let without_signature = token.rsplit_once('.').unwrap().0;
        assert!(svc.decode_at(without_signature, NOW).is_none());
    }

    #[test]
    fn unsigned_token_is_rejected() {
        let claims = b64(json!({"sub": "1", "iat": NOW, "exp": NOW + 3600}));

        let alg_none = format!("{}.{}.", b64(json!({"alg": "none", "typ": "JWT"})), claims);
        let empty_sig = format!("{}.{}.", b64(json!({"alg": "HS256", "typ": "JWT"})), claims);

        let svc = common::tokens();
        assert!(svc.decode_at(&alg_none, NOW).is_none());
        assert!(svc.decode_at(&empty_sig, NOW).is_none());
    }

    fn sign_with_server_secret(claims: serde_json::Value) -> String {
        let key = EncodingKey::from_secret(common::SECRET.as_bytes());
        encode(&Header::new(Algorithm::HS256), &claims, &key).unwrap()
    }

    #[test]
    fn numeric_subject_is_accepted() {
        let token = sign_with_server_secret(json!({"sub": 1, "iat": NOW, "exp": NOW + 3600}));
        let decoded = common::tokens().decode_at(&token, NOW);
        assert_eq!(decoded.and_then(|v| v.user_id()), Some(UserId::new(1)));
    }

    #[test]
    fn non_numeric_subject_has_no_user_id() {
        let token = sign_with_server_secret(json!({"sub": "abc", "iat": NOW, "exp": NOW + 3600}));
        let decoded = common::tokens().decode_at(&token, NOW).unwrap();
        assert_eq!(decoded.user_id(), None);
    }

    #[test]
    fn garbage_is_rejected() {
        let svc = common::tokens();
        for token in ["", "abc", "a.b.c", "...."] {
            assert!(svc.decode_at(token, NOW).is_none(), "{token:?}");
        }
    }
}

// ---------------------------------------------------------------------------
// Session resolution
// ---------------------------------------------------------------------------
#[cfg(test)]
mod session_tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use hyper::header::{AUTHORIZATION, COOKIE, HeaderMap, HeaderValue};

    use server::auth::SessionResolver;
    use server::database::{MemoryUserStore, StoreError, UserStore};
    use shared::types::{NewUser, User, UserId, UserStatus};

    use crate::common;

    async fn store_with_two_users() -> (Arc<MemoryUserStore>, User, User) {
        let store = Arc::new(MemoryUserStore::new());
        let mut users = Vec::new();
        for email in ["header@x.com", "cookie@x.com"] {
            users.push(
                store
                    .insert(NewUser {
                        email: email.to_string(),
                        password_hash: "unused".to_string(),
                        status: UserStatus::User,
                    })
                    .await
                    .unwrap(),
            );
        }
        let second = users.pop().unwrap();
        let first = users.pop().unwrap();
        (store, first, second)
    }

    fn header_value(s: &str) -> HeaderValue {
        HeaderValue::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn bearer_is_preferred_over_cookie() {
        let (store, header_user, cookie_user) = store_with_two_users().await;
        let tokens = common::tokens();
        let resolver = SessionResolver::new(Arc::clone(&tokens), store);

        let ttl = Duration::from_secs(3600);
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            header_value(&format!("Bearer {}", tokens.issue(header_user.id, ttl).unwrap())),
        );
        headers.insert(
            COOKIE,
            header_value(&format!("jwt={}", tokens.issue(cookie_user.id, ttl).unwrap())),
        );

        let resolved = resolver.resolve(&headers).await.unwrap();
        assert_eq!(resolved.id, header_user.id);
    }

    #[tokio::test]
    async fn no_token_means_no_session() {
        let (store, _, _) = store_with_two_users().await;
        let resolver = SessionResolver::new(common::tokens(), store);
        assert!(resolver.resolve(&HeaderMap::new()).await.is_none());
    }

    #[tokio::test]
    async fn deleted_user_means_no_session() {
        let (store, user, _) = store_with_two_users().await;
        let tokens = common::tokens();
        let token = tokens.issue(user.id, Duration::from_secs(3600)).unwrap();
        let resolver = SessionResolver::new(tokens, Arc::clone(&store) as Arc<dyn UserStore>);

        assert!(resolver.resolve_token(&token).await.is_some());
        store.remove(user.id).await.unwrap();
        assert!(resolver.resolve_token(&token).await.is_none());
    }

    #[tokio::test]
    async fn signed_non_numeric_subject_means_no_session() {
        let (store, _, _) = store_with_two_users().await;
        let key = jsonwebtoken::EncodingKey::from_secret(common::SECRET.as_bytes());
        let exp = server::auth::tokens::now_secs() + 3600;
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &serde_json::json!({"sub": "abc", "exp": exp}),
            &key,
        )
        .unwrap();

        let resolver = SessionResolver::new(common::tokens(), store);
        assert!(resolver.resolve_token(&token).await.is_none());
    }

    #[tokio::test]
    async fn signed_numeric_subject_resolves() {
        let (store, user, _) = store_with_two_users().await;
        let key = jsonwebtoken::EncodingKey::from_secret(common::SECRET.as_bytes());
        let exp = server::auth::tokens::now_secs() + 3600;
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &serde_json::json!({"sub": user.id.get(), "exp": exp}),
            &key,
        )
        .unwrap();

        let resolver = SessionResolver::new(common::tokens(), store);
        assert_eq!(resolver.resolve_token(&token).await.map(|u| u.id), Some(user.id));
    }

    /// Store whose id lookup never finishes in time.
    struct SlowStore {
        finished: Arc<AtomicBool>,
    }

    #[async_trait]
    impl UserStore for SlowStore {
        async fn find_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
            Ok(None)
        }

        async fn find_by_id(&self, _id: UserId) -> Result<Option<User>, StoreError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            self.finished.store(true, Ordering::SeqCst);
            Ok(None)
        }

        async fn insert(&self, _new_user: NewUser) -> Result<User, StoreError> {
            Err(StoreError::Corrupt("read-only".to_string()))
        }

        async fn list(&self) -> Result<Vec<User>, StoreError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn dropping_resolution_cancels_the_lookup() {
        let finished = Arc::new(AtomicBool::new(false));
        let store = Arc::new(SlowStore {
            finished: Arc::clone(&finished),
        });
        let tokens = common::tokens();
        let token = tokens.issue(UserId::new(1), Duration::from_secs(3600)).unwrap();
        let resolver = SessionResolver::new(tokens, store);

        let outcome =
            tokio::time::timeout(Duration::from_millis(50), resolver.resolve_token(&token)).await;
        assert!(outcome.is_err());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }
}

// ---------------------------------------------------------------------------
// Authorization layers, each in isolation
// ---------------------------------------------------------------------------
#[cfg(test)]
mod gate_tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::Value;

    use server::auth::{RequestContext, Shield, gate::default_rules};
    use server::database::MemoryUserStore;
    use server::handlers::executor::{OperationExecutor, OperationOutput};
    use server::handlers::{OperationError, build_operation_router};
    use shared::types::{Invocation, User, UserId, UserStatus};

    use crate::common;

    /// Counts how often it was reached. Performs no checks of its own.
    #[derive(Default)]
    struct Recorder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl OperationExecutor for Recorder {
        async fn execute(
            &self,
            _ctx: Arc<RequestContext>,
            _invocation: Invocation,
        ) -> Result<OperationOutput, OperationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(OperationOutput::value(Value::Bool(true)))
        }
    }

    fn someone() -> User {
        User {
            id: UserId::new(7),
            email: "someone@x.com".to_string(),
            password_hash: String::new(),
            status: UserStatus::User,
        }
    }

    #[tokio::test]
    async fn shield_alone_denies_anonymous_callers() {
        let recorder = Arc::new(Recorder::default());
        let shield = Shield::new(Arc::clone(&recorder), default_rules());

        for op in ["me", "signOut"] {
            let err = shield
                .execute(common::anonymous(), Invocation::new(op, Value::Null))
                .await
                .unwrap_err();
            assert!(matches!(err, OperationError::NotAuthorised), "{op}");
        }
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn shield_lets_sessions_and_open_operations_through() {
        let recorder = Arc::new(Recorder::default());
        let shield = Shield::new(Arc::clone(&recorder), default_rules());

        shield
            .execute(common::signed_in(someone()), Invocation::new("me", Value::Null))
            .await
            .unwrap();
        shield
            .execute(common::anonymous(), Invocation::new("allUsers", Value::Null))
            .await
            .unwrap();
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn guard_alone_denies_anonymous_callers() {
        let router = build_operation_router(common::state_with(Arc::new(MemoryUserStore::new())));
        assert!(router.is_guarded("me"));
        assert!(router.is_guarded("signOut"));

        for op in ["me", "signOut"] {
            let err = router
                .execute(common::anonymous(), Invocation::new(op, Value::Null))
                .await
                .unwrap_err();
            assert!(matches!(err, OperationError::Forbidden), "{op}");
        }
    }

    #[tokio::test]
    async fn guard_admits_a_session() {
        let router = build_operation_router(common::state_with(Arc::new(MemoryUserStore::new())));
        let out = router
            .execute(common::signed_in(someone()), Invocation::new("me", Value::Null))
            .await
            .unwrap();
        assert_eq!(out.value["email"], "someone@x.com");
    }

    #[tokio::test]
    async fn wired_executor_reports_the_outer_layer() {
        let (app, _) = common::app();
        let err = common::run(&app, common::anonymous(), "me", Value::Null)
            .await
            .unwrap_err();
        assert_eq!(err.to_code(), "NOT_AUTHORISED");
        assert!(err.is_authorization_denial());
    }
}

// ---------------------------------------------------------------------------
// Operations and end-to-end flows
// ---------------------------------------------------------------------------
#[cfg(test)]
mod flow_tests {
    use std::time::Duration;

    use serde_json::{Value, json};

    use server::auth::tokens::now_secs;
    use server::handlers::executor::CookieDirective;
    use shared::types::{User, UserStatus};

    use crate::common::{self, EMAIL, PASSWORD};

    #[tokio::test]
    async fn sign_in_then_me_returns_the_same_user() {
        let (app, _) = common::app();
        let created = common::seed_user(&app).await;
        assert_eq!(created.email, EMAIL);
        assert_eq!(created.status, UserStatus::User);

        let out = common::run(&app, common::anonymous(), "signIn", common::credentials(EMAIL, PASSWORD))
            .await
            .unwrap();
        let token = out.value["token"].as_str().unwrap().to_string();
        assert!(!token.is_empty());
        assert_eq!(out.cookies, vec![CookieDirective::SetSession(token.clone())]);
        assert!(out.value["user"].get("password_hash").is_none());

        let session = app.state.sessions.resolve_token(&token).await.unwrap();
        let me = common::run(&app, common::signed_in(session), "me", Value::Null)
            .await
            .unwrap();
        let me: User = serde_json::from_value(me.value).unwrap();
        assert_eq!(me, created);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let (app, _) = common::app();
        common::seed_user(&app).await;

        let wrong_password = common::run(&app, common::anonymous(), "signIn", common::credentials(EMAIL, "nope"))
            .await
            .unwrap_err();
        let unknown_email =
            common::run(&app, common::anonymous(), "signIn", common::credentials("b@x.com", PASSWORD))
                .await
                .unwrap_err();

        assert_eq!(wrong_password.to_code(), "INVALID_CREDENTIALS");
        assert_eq!(wrong_password.to_code(), unknown_email.to_code());
        assert_eq!(wrong_password.to_message(), unknown_email.to_message());
        assert!(!wrong_password.is_authorization_denial());
    }

    #[tokio::test]
    async fn sign_out_does_not_revoke_the_token() {
        let (app, _) = common::app();
        common::seed_user(&app).await;
        let token = common::sign_in(&app).await;

        let session = app.state.sessions.resolve_token(&token).await.unwrap();
        let out = common::run(&app, common::signed_in(session), "signOut", Value::Null)
            .await
            .unwrap();
        assert_eq!(out.value, Value::Bool(true));
        assert_eq!(out.cookies, vec![CookieDirective::ClearSession]);

        let again = app.state.sessions.resolve_token(&token).await.unwrap();
        let me = common::run(&app, common::signed_in(again), "me", Value::Null)
            .await
            .unwrap();
        assert_eq!(me.value["email"], EMAIL);
    }

    #[tokio::test]
    async fn expired_token_is_the_same_as_no_token() {
        let (app, _) = common::app();
        let user = common::seed_user(&app).await;

        let long_ago = now_secs() - 7200;
        let expired = app
            .state
            .tokens
            .issue_at(user.id, Duration::from_secs(3600), long_ago)
            .unwrap();

        let session = app.state.sessions.resolve_token(&expired).await;
        assert!(session.is_none());

        let ctx = std::sync::Arc::new(server::auth::RequestContext::from_session(session));
        let with_expired = common::run(&app, ctx, "me", Value::Null).await.unwrap_err();
        let with_nothing = common::run(&app, common::anonymous(), "me", Value::Null)
            .await
            .unwrap_err();
        assert_eq!(with_expired.to_code(), with_nothing.to_code());
        assert!(with_expired.is_authorization_denial());
    }

    #[tokio::test]
    async fn create_user_rejects_duplicates_and_bad_input() {
        let (app, _) = common::app();
        common::seed_user(&app).await;

        let dup = common::run(
            &app,
            common::anonymous(),
            "createUser",
            json!({"data": {"email": EMAIL, "password": "other", "status": "user"}}),
        )
        .await
        .unwrap_err();
        assert_eq!(dup.to_code(), "DUPLICATE_EMAIL");

        let bad_email = common::run(
            &app,
            common::anonymous(),
            "createUser",
            json!({"data": {"email": "not-an-email", "password": "p", "status": "user"}}),
        )
        .await
        .unwrap_err();
        assert_eq!(bad_email.to_code(), "BAD_USER_INPUT");

        let missing = common::run(&app, common::anonymous(), "createUser", json!({}))
            .await
            .unwrap_err();
        assert_eq!(missing.to_code(), "BAD_USER_INPUT");
    }

    #[tokio::test]
    async fn create_user_requires_status_and_hides_hash() {
        let (app, store) = common::app();
        let no_status = common::run(
            &app,
            common::anonymous(),
            "createUser",
            json!({"data": {"email": "c@x.com", "password": "pw"}}),
        )
        .await
        .unwrap_err();
        assert_eq!(no_status.to_code(), "BAD_USER_INPUT");

        let out = common::run(
            &app,
            common::anonymous(),
            "createUser",
            json!({"data": {"email": "c@x.com", "password": "pw", "status": "banned"}}),
        )
        .await
        .unwrap();

        assert_eq!(out.value["status"], "banned");
        assert!(out.value.get("password_hash").is_none());

        use server::database::UserStore;
        let stored = store.find_by_email("c@x.com").await.unwrap().unwrap();
        assert!(stored.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn all_users_is_open() {
        let (app, _) = common::app();
        common::seed_user(&app).await;

        let out = common::run(&app, common::anonymous(), "allUsers", Value::Null)
            .await
            .unwrap();
        let users: Vec<User> = serde_json::from_value(out.value).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email, EMAIL);
    }

    #[tokio::test]
    async fn corrupt_stored_hash_is_internal() {
        use server::database::UserStore;
        use shared::types::NewUser;

        let (app, store) = common::app();
        store
            .insert(NewUser {
                email: EMAIL.to_string(),
                password_hash: "definitely-not-a-phc-string".to_string(),
                status: UserStatus::User,
            })
            .await
            .unwrap();

        let err = common::run(&app, common::anonymous(), "signIn", common::credentials(EMAIL, PASSWORD))
            .await
            .unwrap_err();
        assert_eq!(err.to_code(), "INTERNAL_ERROR");
        assert_eq!(err.to_message(), "An internal error occurred");
    }

    #[tokio::test]
    async fn unknown_operation_is_reported() {
        let (app, _) = common::app();
        let err = common::run(&app, common::anonymous(), "dropTables", Value::Null)
            .await
            .unwrap_err();
        assert_eq!(err.to_code(), "UNKNOWN_OPERATION");
    }
}
