//! Binding of a hash store and naming convention to session handles.

use std::{fmt, sync::Arc};

use drsession_core::{Codec, HashStore, IdGenerator, JsonCodec, generate_session_id};

use crate::Session;

/// Default record key prefix.
pub const DEFAULT_PREFIX: &str = "drsession:";
/// Default cookie name.
pub const DEFAULT_COOKIE_NAME: &str = "drsession";
/// Default request-context attribute name.
pub const DEFAULT_ATTRIBUTE: &str = "drsession";

/// Session configuration.
///
/// Every field has a default; override with the `with_*` methods.
#[derive(Clone)]
pub struct SessionConfig {
    /// Record key prefix. Keys are `prefix + session_id` with no separator.
    pub prefix: String,
    /// Name of the cookie carrying the session id.
    pub cookie_name: String,
    /// Name the session is attached under in the request context.
    pub attribute: String,
    /// Field value codec.
    pub codec: Arc<dyn Codec>,
    /// Session id generator.
    pub id_generator: IdGenerator,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            attribute: DEFAULT_ATTRIBUTE.to_string(),
            codec: Arc::new(JsonCodec),
            id_generator: Arc::new(generate_session_id),
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("prefix", &self.prefix)
            .field("cookie_name", &self.cookie_name)
            .field("attribute", &self.attribute)
            .finish_non_exhaustive()
    }
}

impl SessionConfig {
    /// Defaults overlaid with `DRSESSION_PREFIX`, `DRSESSION_COOKIE` and
    /// `DRSESSION_ATTRIBUTE` from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(prefix) = std::env::var("DRSESSION_PREFIX") {
            config.prefix = prefix;
        }
        if let Ok(cookie) = std::env::var("DRSESSION_COOKIE") {
            config.cookie_name = cookie;
        }
        if let Ok(attribute) = std::env::var("DRSESSION_ATTRIBUTE") {
            config.attribute = attribute;
        }
        config
    }

    /// Set the record key prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the cookie name.
    #[must_use]
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Set the request-context attribute name.
    #[must_use]
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = attribute.into();
        self
    }

    /// Set the field codec.
    #[must_use]
    pub fn with_codec(mut self, codec: impl Codec + 'static) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    /// Set the session id generator.
    #[must_use]
    pub fn with_id_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.id_generator = Arc::new(generator);
        self
    }
}

/// Produces [`Session`] handles for session ids.
///
/// Cloning is cheap and shares the store connection.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn HashStore>,
    config: SessionConfig,
}

impl SessionStore {
    /// Bind a store with the given configuration.
    #[must_use]
    pub fn new(store: Arc<dyn HashStore>, config: SessionConfig) -> Self {
        Self { store, config }
    }

    /// Bind a store with default configuration.
    #[must_use]
    pub fn with_defaults(store: Arc<dyn HashStore>) -> Self {
        Self::new(store, SessionConfig::default())
    }

    /// Connect to Redis at `url` and bind it.
    ///
    /// # Errors
    /// Returns error if the connection cannot be established.
    #[cfg(feature = "redis")]
    pub async fn connect(
        url: &str,
        config: SessionConfig,
    ) -> Result<Self, drsession_core::StoreError> {
        let store = crate::storage::RedisStore::connect(url).await?;
        Ok(Self::new(Arc::new(store), config))
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Mint a fresh session id with the configured generator.
    #[must_use]
    pub fn generate_id(&self) -> String {
        (self.config.id_generator)()
    }

    /// Record key for a session id.
    #[must_use]
    pub fn record_key(&self, session_id: &str) -> String {
        format!("{}{}", self.config.prefix, session_id)
    }

    /// Build a handle for `session_id`. Never touches the store.
    #[must_use]
    pub fn build_session(&self, session_id: &str) -> Session {
        Session::new(
            Arc::clone(&self.store),
            Arc::clone(&self.config.codec),
            self.record_key(session_id),
        )
    }
}
