//! Session layer for tower services.

use std::task::{Context, Poll};

use drsession_session::SessionStore;
use futures::future::BoxFuture;
use http::{HeaderValue, Request, Response, header::SET_COOKIE};
use time::OffsetDateTime;
use tower::{Layer, Service};

use crate::{
    SessionContext,
    cookie::{session_cookie, session_id_from_headers},
};

/// Layer attaching a [`Session`](drsession_session::Session) to every request.
///
/// The session id comes from the configured cookie. When the request
/// carries none, a fresh id is minted and a `Set-Cookie` header is added to
/// the response. Ids supplied by clients are used as-is: there is no
/// signing, validation, expiry or rotation.
///
/// # Example
/// ```ignore
/// let store = SessionStore::connect("redis://127.0.0.1:6379", SessionConfig::default()).await?;
/// let app = Router::new()
///     .route("/", get(handler))
///     .layer(SessionLayer::new(store));
/// ```
#[derive(Clone)]
pub struct SessionLayer {
    store: SessionStore,
}

impl SessionLayer {
    /// Create a new session layer.
    #[must_use]
    pub const fn new(store: SessionStore) -> Self {
        Self { store }
    }
}

impl<S> Layer<S> for SessionLayer {
    type Service = SessionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionService {
            inner,
            store: self.store.clone(),
        }
    }
}

/// Service produced by [`SessionLayer`].
#[derive(Clone)]
pub struct SessionService<S> {
    inner: S,
    store: SessionStore,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for SessionService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + 'static,
    S::Future: Send + 'static,
    ReqBody: 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let config = self.store.config();
        let cookie_name = config.cookie_name.clone();

        let (session_id, minted) = match session_id_from_headers(req.headers(), &cookie_name) {
            Some(id) => (id, false),
            None => {
                let id = self.store.generate_id();
                tracing::debug!(session_id = %id, "Minted new session id");
                (id, true)
            }
        };

        let session = self.store.build_session(&session_id);
        let extensions = req.extensions_mut();
        let mut context = extensions.remove::<SessionContext>().unwrap_or_default();
        context.insert(config.attribute.clone(), session.clone());
        extensions.insert(context);
        extensions.insert(session);

        let future = self.inner.call(req);

        Box::pin(async move {
            let mut res = future.await?;

            if minted {
                // Expiry is taken when the response is emitted.
                let cookie = session_cookie(&cookie_name, &session_id, OffsetDateTime::now_utc());
                match HeaderValue::from_str(&cookie.to_string()) {
                    Ok(value) => {
                        res.headers_mut().append(SET_COOKIE, value);
                        tracing::debug!(session_id = %session_id, "Set session cookie");
                    }
                    Err(e) => {
                        tracing::error!("Session id is not a valid header value: {e}");
                    }
                }
            }

            Ok(res)
        })
    }
}
