/// A broken link while resolving a route mapping to its app, route and domain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("route mapping with guid `{0}` not found in cache")]
    RouteMappingNotFound(String),
    #[error("route with guid `{0}` not found in cache")]
    RouteNotFound(String),
    #[error("domain with guid `{0}` not found in cache")]
    DomainNotFound(String),
    #[error("app with guid `{0}` not found in cache")]
    AppNotFound(String),
}
