use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::config::{select_app, AppIdentity};
use crate::error::GhtknError;
use crate::github::{GitHubUserResolver, UserResolver};
use crate::oauth::{Authorizer, DeviceFlowClient};
use crate::secret_store::KeyringStore;
use crate::token::{AccessToken, TokenCache};

#[derive(Debug, Clone, Default)]
pub struct TokenRequest {
    /// App id to use. Unknown ids fall back to the default app.
    pub app: Option<String>,
    /// Cached tokens expiring within this window are not reused.
    pub min_expiration: Duration,
    pub caching_enabled: bool,
}

/// Returns a valid token for an app, from the cache when possible and from
/// the device flow otherwise.
///
/// Only app selection and authorization failures are fatal. Cache reads and
/// writes are advisory and degrade to warnings.
pub struct TokenManager {
    cache: TokenCache,
    authorizer: Arc<dyn Authorizer>,
    resolver: Arc<dyn UserResolver>,
    now: fn() -> DateTime<Utc>,
}

impl TokenManager {
    pub fn new(
        cache: TokenCache,
        authorizer: Arc<dyn Authorizer>,
        resolver: Arc<dyn UserResolver>,
    ) -> Self {
        Self {
            cache,
            authorizer,
            resolver,
            now: Utc::now,
        }
    }

    /// OS keychain, GitHub device flow and GitHub REST API.
    pub fn with_defaults() -> Self {
        Self::new(
            TokenCache::new(Arc::new(KeyringStore::new())),
            Arc::new(DeviceFlowClient::default()),
            Arc::new(GitHubUserResolver::default()),
        )
    }

    pub fn with_clock(mut self, now: fn() -> DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub async fn get_token(
        &self,
        cancel: &CancellationToken,
        apps: &[AppIdentity],
        request: &TokenRequest,
    ) -> Result<(AccessToken, AppIdentity), GhtknError> {
        let app = select_app(apps, request.app.as_deref())
            .cloned()
            .ok_or_else(|| GhtknError::config("no app is configured"))?;

        if request.caching_enabled {
            match self.cache.lookup(&app, request.min_expiration, (self.now)()) {
                Ok(Some(token)) => {
                    tracing::debug!(app = %app.id, "using the cached access token");
                    return Ok((token, app));
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(app = %app.id, error = %e, "ignoring the cached access token");
                }
            }
        }

        tracing::info!(app = %app.id, "creating a new access token");
        let mut token = self.authorizer.authorize(cancel, &app.client_id).await?;
        token.app_id = app.id.clone();

        if request.caching_enabled {
            self.store(&app, &token);
        }
        Ok((token, app))
    }

    /// Fill in `token.login` if it is empty.
    ///
    /// A login already present (for example from the cache) is trusted. A
    /// freshly resolved login is written back to the cache when caching is on.
    pub async fn ensure_login(
        &self,
        cancel: &CancellationToken,
        app: &AppIdentity,
        token: &mut AccessToken,
        caching_enabled: bool,
    ) -> Result<(), GhtknError> {
        if !token.login.is_empty() {
            return Ok(());
        }
        token.login = self.resolver.resolve_login(cancel, &token.token).await?;
        tracing::debug!(app = %app.id, login = %token.login, "resolved the authenticated user");
        if caching_enabled {
            self.store(app, token);
        }
        Ok(())
    }

    fn store(&self, app: &AppIdentity, token: &AccessToken) {
        if let Err(e) = self.cache.store(app, token) {
            tracing::warn!(app = %app.id, error = %e, "failed to cache the access token");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret_store::{MemoryStore, SecretStore, SecretStoreError};
    use async_trait::async_trait;
    use chrono::{TimeDelta, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
    }

    struct FakeAuthorizer {
        calls: AtomicUsize,
        result: Result<String, &'static str>,
    }

    impl FakeAuthorizer {
        fn ok(token: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                result: Ok(token.to_string()),
            })
        }

        fn denied() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                result: Err("access_denied"),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Authorizer for FakeAuthorizer {
        async fn authorize(
            &self,
            _cancel: &CancellationToken,
            client_id: &str,
        ) -> Result<AccessToken, GhtknError> {
            assert!(!client_id.is_empty());
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(token) => Ok(AccessToken::new(token.clone(), fixed_now() + TimeDelta::hours(8))),
                Err(code) => Err(GhtknError::from_provider_code(code)),
            }
        }
    }

    struct FakeResolver {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl UserResolver for FakeResolver {
        async fn resolve_login(
            &self,
            _cancel: &CancellationToken,
            _token: &str,
        ) -> Result<String, GhtknError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("octocat".into())
        }
    }

    struct BrokenStore;

    impl SecretStore for BrokenStore {
        fn get(&self, _: &str, _: &str) -> Result<String, SecretStoreError> {
            Err(SecretStoreError::Backend("keychain locked".into()))
        }
        fn set(&self, _: &str, _: &str, _: &str) -> Result<(), SecretStoreError> {
            Err(SecretStoreError::Backend("keychain locked".into()))
        }
        fn delete(&self, _: &str, _: &str) -> Result<(), SecretStoreError> {
            Err(SecretStoreError::Backend("keychain locked".into()))
        }
    }

    fn apps() -> Vec<AppIdentity> {
        vec![
            AppIdentity::new("me/read", "Iv1read"),
            AppIdentity::new("me/write", "Iv1write").with_default(true),
        ]
    }

    fn build_manager(
        store: Arc<dyn SecretStore>,
        authorizer: Arc<FakeAuthorizer>,
    ) -> (TokenManager, Arc<FakeResolver>) {
        let resolver = Arc::new(FakeResolver {
            calls: AtomicUsize::new(0),
        });
        let manager = TokenManager::new(TokenCache::new(store), authorizer, resolver.clone())
            .with_clock(fixed_now);
        (manager, resolver)
    }

    fn cached(app: &AppIdentity, store: &Arc<MemoryStore>, token: &str, lifetime: TimeDelta) {
        let mut t = AccessToken::new(token, fixed_now() + lifetime);
        t.login = "cached-user".into();
        TokenCache::new(store.clone()).store(app, &t).unwrap();
    }

    fn request(caching_enabled: bool) -> TokenRequest {
        TokenRequest {
            app: None,
            min_expiration: Duration::from_secs(3600),
            caching_enabled,
        }
    }

    #[tokio::test]
    async fn empty_app_list_is_a_config_error() {
        let authorizer = FakeAuthorizer::ok("new");
        let (manager, _) = build_manager(Arc::new(MemoryStore::new()), authorizer.clone());
        let err = manager
            .get_token(&CancellationToken::new(), &[], &request(true))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "config_error");
        assert_eq!(authorizer.calls(), 0);
    }

    #[tokio::test]
    async fn fresh_cached_token_skips_authorization() {
        let store = Arc::new(MemoryStore::new());
        cached(&apps()[1], &store, "cached", TimeDelta::hours(2));
        let authorizer = FakeAuthorizer::ok("new");
        let (manager, _) = build_manager(store, authorizer.clone());

        let (token, app) = manager
            .get_token(&CancellationToken::new(), &apps(), &request(true))
            .await
            .unwrap();
        assert_eq!(token.token, "cached");
        assert_eq!(token.app_id, "me/write");
        assert_eq!(app.id, "me/write");
        assert_eq!(authorizer.calls(), 0);
    }

    #[tokio::test]
    async fn soon_expiring_token_is_replaced_and_cached() {
        let store = Arc::new(MemoryStore::new());
        cached(&apps()[1], &store, "stale", TimeDelta::minutes(30));
        let authorizer = FakeAuthorizer::ok("new");
        let (manager, _) = build_manager(store.clone(), authorizer.clone());

        let (token, _) = manager
            .get_token(&CancellationToken::new(), &apps(), &request(true))
            .await
            .unwrap();
        assert_eq!(token.token, "new");
        assert_eq!(authorizer.calls(), 1);

        let stored = TokenCache::new(store)
            .lookup(&apps()[1], Duration::ZERO, fixed_now())
            .unwrap()
            .unwrap();
        assert_eq!(stored.token, "new");
    }

    #[tokio::test]
    async fn caching_disabled_ignores_and_leaves_store_untouched() {
        let store = Arc::new(MemoryStore::new());
        cached(&apps()[1], &store, "cached", TimeDelta::hours(2));
        let authorizer = FakeAuthorizer::ok("new");
        let (manager, _) = build_manager(store.clone(), authorizer.clone());

        let (token, _) = manager
            .get_token(&CancellationToken::new(), &apps(), &request(false))
            .await
            .unwrap();
        assert_eq!(token.token, "new");
        let stored = TokenCache::new(store)
            .lookup(&apps()[1], Duration::ZERO, fixed_now())
            .unwrap()
            .unwrap();
        assert_eq!(stored.token, "cached");
    }

    #[tokio::test]
    async fn broken_store_never_fails_the_call() {
        let authorizer = FakeAuthorizer::ok("new");
        let (manager, _) = build_manager(Arc::new(BrokenStore), authorizer.clone());
        let (token, _) = manager
            .get_token(&CancellationToken::new(), &apps(), &request(true))
            .await
            .unwrap();
        assert_eq!(token.token, "new");
        assert_eq!(authorizer.calls(), 1);
    }

    #[tokio::test]
    async fn corrupt_cache_falls_through_to_authorization() {
        let store = Arc::new(MemoryStore::new());
        store.set(crate::token::DEFAULT_SERVICE, "Iv1write", "garbage").unwrap();
        let authorizer = FakeAuthorizer::ok("new");
        let (manager, _) = build_manager(store, authorizer.clone());
        let (token, _) = manager
            .get_token(&CancellationToken::new(), &apps(), &request(true))
            .await
            .unwrap();
        assert_eq!(token.token, "new");
    }

    #[tokio::test]
    async fn authorization_failure_is_fatal() {
        let authorizer = FakeAuthorizer::denied();
        let (manager, _) = build_manager(Arc::new(MemoryStore::new()), authorizer);
        let err = manager
            .get_token(&CancellationToken::new(), &apps(), &request(true))
            .await
            .unwrap_err();
        assert!(matches!(err, GhtknError::AuthorizationDenied(_)));
    }

    #[tokio::test]
    async fn requested_app_is_used() {
        let authorizer = FakeAuthorizer::ok("new");
        let (manager, _) = build_manager(Arc::new(MemoryStore::new()), authorizer);
        let req = TokenRequest {
            app: Some("me/read".into()),
            ..request(false)
        };
        let (token, app) = manager
            .get_token(&CancellationToken::new(), &apps(), &req)
            .await
            .unwrap();
        assert_eq!(app.client_id, "Iv1read");
        assert_eq!(token.app_id, "me/read");
    }

    #[tokio::test]
    async fn ensure_login_trusts_existing_login() {
        let (manager, resolver) =
            build_manager(Arc::new(MemoryStore::new()), FakeAuthorizer::ok("t"));
        let mut token = AccessToken::new("t", fixed_now() + TimeDelta::hours(1));
        token.login = "someone".into();
        manager
            .ensure_login(&CancellationToken::new(), &apps()[1], &mut token, true)
            .await
            .unwrap();
        assert_eq!(token.login, "someone");
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn ensure_login_resolves_and_caches() {
        let store = Arc::new(MemoryStore::new());
        let (manager, resolver) = build_manager(store.clone(), FakeAuthorizer::ok("t"));
        let mut token = AccessToken::new("t", fixed_now() + TimeDelta::hours(1));
        manager
            .ensure_login(&CancellationToken::new(), &apps()[1], &mut token, true)
            .await
            .unwrap();
        assert_eq!(token.login, "octocat");
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);

        let stored = TokenCache::new(store)
            .lookup(&apps()[1], Duration::ZERO, fixed_now())
            .unwrap()
            .unwrap();
        assert_eq!(stored.login, "octocat");
    }
}
