//! GraphQL request context
//!
//! Provides helpers for:
//! - Extracting the caller key and locale from HTTP headers
//! - A standard axum handler that injects the [`Caller`] into each request
//! - Resolving a connection field and mapping errors to GraphQL errors

use async_graphql::{Context, ErrorExtensions, Request, Response, Schema};
use axum::{extract::Extension, http::HeaderMap, Json};
use serde::de::DeserializeOwned;

use crate::args::ConnectionArgs;
use crate::engine::{Caller, Paginator};
use crate::i18n::Locale;
use crate::pagination::Connection;
use crate::store::{CandidateSet, Store};
use crate::PaginationError;

pub const CALLER_HEADER: &str = "x-user-key";

/// Extract the caller key from the `x-user-key` header
pub fn extract_caller_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CALLER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
}

/// Extract the preferred locale from `Accept-Language`, English by default
pub fn extract_locale(headers: &HeaderMap) -> Locale {
    headers
        .get(axum::http::header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .map(Locale::from_accept_language)
        .unwrap_or_default()
}

pub fn extract_caller(headers: &HeaderMap) -> Caller {
    let caller = extract_caller_key(headers)
        .map(Caller::new)
        .unwrap_or_else(Caller::anonymous);
    caller.with_locale(extract_locale(headers))
}

/// Standard GraphQL handler with caller injection
///
/// # Example
///
/// ```rust,no_run
/// use async_graphql::{EmptyMutation, EmptySubscription, Object, Schema};
/// use axum::{routing::post, Extension, Router};
/// use tracker_connections::graphql_handler;
///
/// struct Query;
///
/// #[Object]
/// impl Query {
///     async fn ping(&self) -> bool {
///         true
///     }
/// }
///
/// let schema = Schema::new(Query, EmptyMutation, EmptySubscription);
/// let app: Router = Router::new()
///     .route("/graphql", post(graphql_handler::<Query, EmptyMutation, EmptySubscription>))
///     .layer(Extension(schema));
/// ```
pub async fn graphql_handler<Query, Mutation, Subscription>(
    Extension(schema): Extension<Schema<Query, Mutation, Subscription>>,
    headers: HeaderMap,
    req: Json<Request>,
) -> Json<Response>
where
    Query: async_graphql::ObjectType + 'static,
    Mutation: async_graphql::ObjectType + 'static,
    Subscription: async_graphql::SubscriptionType + 'static,
{
    let request = req.0.data(extract_caller(&headers));
    Json(schema.execute(request).await)
}

/// Get the caller from GraphQL context, anonymous if none was injected
pub fn caller(ctx: &Context<'_>) -> Caller {
    ctx.data_opt::<Caller>()
        .cloned()
        .unwrap_or_else(Caller::anonymous)
}

/// Paginate on behalf of the context's caller and convert the page into a
/// GraphQL connection object.
pub async fn resolve_connection<S, N, C>(
    ctx: &Context<'_>,
    paginator: &Paginator<S>,
    candidates: CandidateSet,
    args: &ConnectionArgs,
) -> async_graphql::Result<C>
where
    S: Store,
    N: DeserializeOwned,
    C: From<Connection<N>>,
{
    paginator
        .paginate::<N>(&caller(ctx), candidates, args)
        .await
        .map(C::from)
        .map_err(|e| e.extend())
}

impl ErrorExtensions for PaginationError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.message())
            .extend_with(|_, e| e.set("code", self.kind().code()))
    }
}
