//! HTTP routes
//!
//! Routes are declared as data: method, path pattern, the capability a
//! caller must hold, and a handler. The dispatcher in
//! [`crate::server::http`] enforces the capability before the handler runs,
//! so handlers never see an unauthorized request.
//!
//! ## Endpoints
//!
//! - `GET /drinks` - public menu, short recipes
//! - `GET /drinks-detail` - full recipes (`get:drinks-detail`)
//! - `POST /drinks` - create a drink (`post:drinks`)
//! - `PATCH /drinks/{id}` - modify a drink (`patch:drinks`)
//! - `DELETE /drinks/{id}` - remove a drink (`delete:drinks`)
//! - `GET /health`, `GET /version` - operational checks

pub mod drinks;
pub mod health;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use http_body_util::Full;
use hyper::{Method, Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

use crate::auth::{Claims, DELETE_DRINKS, GET_DRINKS_DETAIL, PATCH_DRINKS, POST_DRINKS};
use crate::server::AppState;
use crate::types::Result;

pub type FullBody = Full<Bytes>;
pub type HandlerFuture = BoxFuture<'static, Result<Response<FullBody>>>;
pub type Handler = fn(Arc<AppState>, RequestContext) -> HandlerFuture;

/// What a handler receives from the dispatcher
#[derive(Debug, Default)]
pub struct RequestContext {
    /// Verified claims; present exactly when the route requires a capability
    pub claims: Option<Claims>,
    pub params: PathParams,
    pub body: Bytes,
}

impl RequestContext {
    /// Subject of the verified token, for logs
    pub fn subject(&self) -> &str {
        self.claims
            .as_ref()
            .and_then(|c| c.sub.as_deref())
            .unwrap_or("-")
    }
}

/// Values captured from `{name}` segments
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PathParams(Vec<(&'static str, String)>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Integer parameter; patterns declare these as `{name:int}`
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(|v| v.parse().ok())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(&'static str),
    Param(&'static str),
    IntParam(&'static str),
}

/// A path such as `/drinks/{id:int}`
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: &'static str,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(raw: &'static str) -> Self {
        let segments = raw
            .trim_start_matches('/')
            .split('/')
            .map(|seg| match seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(param) => match param.strip_suffix(":int") {
                    Some(name) => Segment::IntParam(name),
                    None => Segment::Param(param),
                },
                None => Segment::Literal(seg),
            })
            .collect();

        Self { raw, segments }
    }

    pub fn as_str(&self) -> &'static str {
        self.raw
    }

    /// Match a request path, capturing parameters
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let parts: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = PathParams::default();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(lit) if *lit == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) if !part.is_empty() => {
                    params.0.push((*name, part.to_string()));
                }
                Segment::IntParam(name) if is_canonical_int(part) => {
                    params.0.push((*name, part.to_string()));
                }
                _ => return None,
            }
        }
        Some(params)
    }
}

/// Plain decimal digits without sign or leading zeros that fit an `i64`
fn is_canonical_int(part: &str) -> bool {
    let digits = !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    digits && (part == "0" || !part.starts_with('0')) && part.parse::<i64>().is_ok()
}

pub struct Route {
    pub method: Method,
    pub pattern: PathPattern,
    /// Capability required from the caller's token, `None` for public routes
    pub permission: Option<&'static str>,
    pub handler: Handler,
}

impl Route {
    pub fn new(
        method: Method,
        pattern: &'static str,
        permission: Option<&'static str>,
        handler: Handler,
    ) -> Self {
        Self {
            method,
            pattern: PathPattern::parse(pattern),
            permission,
            handler,
        }
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern.as_str())
            .field("permission", &self.permission)
            .finish()
    }
}

/// Outcome of a route lookup
#[derive(Debug)]
pub enum RouteMatch<'a> {
    Found(&'a Route, PathParams),
    /// The path exists but not for this method
    MethodNotAllowed,
    NotFound,
}

#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// Look up a route. `HEAD` is served by the `GET` route for the path.
    pub fn find(&self, method: &Method, path: &str) -> RouteMatch<'_> {
        let mut path_known = false;
        for route in &self.routes {
            if let Some(params) = route.pattern.matches(path) {
                if route.method == *method
                    || (*method == Method::HEAD && route.method == Method::GET)
                {
                    return RouteMatch::Found(route, params);
                }
                path_known = true;
            }
        }

        if path_known {
            RouteMatch::MethodNotAllowed
        } else {
            RouteMatch::NotFound
        }
    }

    /// Methods answered on `path`, empty when no route matches it
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = self
            .routes
            .iter()
            .filter(|route| route.pattern.matches(path).is_some())
            .map(|route| route.method.clone())
            .collect();
        if methods.is_empty() {
            return methods;
        }

        if methods.contains(&Method::GET) {
            methods.push(Method::HEAD);
        }
        methods.push(Method::OPTIONS);
        methods
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

/// The application's route table
pub fn app_routes() -> RouteTable {
    RouteTable::new(vec![
        Route::new(Method::GET, "/drinks", None, drinks::list_drinks),
        Route::new(
            Method::GET,
            "/drinks-detail",
            Some(GET_DRINKS_DETAIL),
            drinks::list_drinks_detail,
        ),
        Route::new(Method::POST, "/drinks", Some(POST_DRINKS), drinks::create_drink),
        Route::new(
            Method::PATCH,
            "/drinks/{id:int}",
            Some(PATCH_DRINKS),
            drinks::update_drink,
        ),
        Route::new(
            Method::DELETE,
            "/drinks/{id:int}",
            Some(DELETE_DRINKS),
            drinks::delete_drink,
        ),
        Route::new(Method::GET, "/health", None, health::health_check),
        Route::new(Method::GET, "/version", None, health::version_info),
    ])
}

pub(crate) fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<FullBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(json)))
        .unwrap()
}
