//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Bodies are collected
//! up front under a size limit, then the request goes through [`dispatch`],
//! which looks up the route, enforces its capability and runs the handler.

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::header::{ALLOW, AUTHORIZATION};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::auth::TokenAuthorizer;
use crate::config::Args;
use crate::routes::{app_routes, RequestContext, RouteMatch, RouteTable};
use crate::store::DrinkStore;
use crate::types::{CoffeeShopError, Result};

/// Shared application state, built once at startup
pub struct AppState {
    pub args: Args,
    pub authorizer: Arc<TokenAuthorizer>,
    pub store: Arc<dyn DrinkStore>,
    pub routes: RouteTable,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(args: Args, authorizer: Arc<TokenAuthorizer>, store: Arc<dyn DrinkStore>) -> Self {
        Self {
            args,
            authorizer,
            store,
            routes: app_routes(),
            started_at: Instant::now(),
        }
    }
}

/// Bind the configured address and serve until Ctrl-C
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Coffee Shop listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

    serve(listener, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    })
    .await
}

/// Accept connections on `listener` until `shutdown` completes
///
/// Connections already accepted keep running on their own tasks.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move { handle_request(state, addr, req).await }
                        });

                        if let Err(err) = http1::Builder::new()
                            .serve_connection(io, service)
                            .await
                        {
                            debug!("Error serving connection from {}: {:?}", addr, err);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {:?}", e);
                }
            },
            _ = &mut shutdown => {
                info!("Server stopped accepting connections");
                return Ok(());
            }
        }
    }
}

/// Collect the body under the size limit, then dispatch
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let limit = state.args.max_body_bytes;

    let body = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            let rejection = if err.downcast_ref::<LengthLimitError>().is_some() {
                CoffeeShopError::PayloadTooLarge(limit)
            } else {
                CoffeeShopError::BadRequest(format!("failed to read body: {}", err))
            };
            warn!(
                %addr,
                method = %parts.method,
                path = parts.uri.path(),
                error = %rejection,
                "Request body rejected"
            );
            return Ok(rejection.into_response());
        }
    };

    debug!(%addr, method = %parts.method, path = parts.uri.path(), "Request received");
    Ok(dispatch(state, Request::from_parts(parts, body)).await)
}

/// Route a request with a collected body and render the outcome
///
/// Errors become the JSON error envelope; this never fails.
pub async fn dispatch(state: Arc<AppState>, req: Request<Bytes>) -> Response<Full<Bytes>> {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let mut response = match route_request(&state, req).await {
        Ok(response) => response,
        Err(err) => {
            let status = err.status_code();
            if status.is_server_error() {
                error!(%method, path = %path, error = %err, "Request failed");
            } else {
                debug!(%method, path = %path, error = %err, "Request refused");
            }
            err.into_response()
        }
    };

    if method == Method::HEAD {
        *response.body_mut() = Full::new(Bytes::new());
    }

    info!(
        %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Request handled"
    );
    response
}

async fn route_request(state: &Arc<AppState>, req: Request<Bytes>) -> Result<Response<Full<Bytes>>> {
    let (parts, body) = req.into_parts();

    if parts.method == Method::OPTIONS {
        return allow_response(&state.routes.allowed_methods(parts.uri.path()));
    }

    let (route, params) = match state.routes.find(&parts.method, parts.uri.path()) {
        RouteMatch::Found(route, params) => (route, params),
        RouteMatch::MethodNotAllowed => return Err(CoffeeShopError::MethodNotAllowed),
        RouteMatch::NotFound => return Err(CoffeeShopError::NotFound),
    };

    let claims = match route.permission {
        Some(permission) => {
            // A header that is not visible ASCII cannot be a bearer token
            let header = parts
                .headers
                .get(AUTHORIZATION)
                .map(|value| value.to_str().unwrap_or(""));
            Some(state.authorizer.authorize(header, permission).await?)
        }
        None => None,
    };

    let ctx = RequestContext {
        claims,
        params,
        body,
    };
    (route.handler)(Arc::clone(state), ctx).await
}

/// Answer `OPTIONS` with the methods the path supports
fn allow_response(methods: &[Method]) -> Result<Response<Full<Bytes>>> {
    if methods.is_empty() {
        return Err(CoffeeShopError::NotFound);
    }

    let allow = methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(ALLOW, allow)
        .body(Full::new(Bytes::new()))
        .unwrap())
}
