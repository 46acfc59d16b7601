//! Access to the Cloud Foundry Cloud Controller.
//!
//! The cache only depends on the [`CloudController`] and [`Connector`]
//! traits. [`HttpConnector`] implements them on top of the v2 REST API,
//! authenticating against UAA with the password grant.
mod client;
mod error;
mod models;

use std::future::Future;

pub use client::{Credentials, HttpConnector, HttpController, check_info_endpoint};
pub use error::{Error, Result};
pub use models::{App, Domain, Resource, Route, RouteMapping, SharedDomain, Space};

/// List operations for every resource type watchtower keeps track of.
pub trait CloudController: Send + Sync {
    fn list_apps(&self) -> impl Future<Output = Result<Vec<App>>> + Send;

    fn list_routes(&self) -> impl Future<Output = Result<Vec<Route>>> + Send;

    fn list_route_mappings(&self) -> impl Future<Output = Result<Vec<RouteMapping>>> + Send;

    /// Lists private domains.
    fn list_domains(&self) -> impl Future<Output = Result<Vec<Domain>>> + Send;

    fn list_shared_domains(&self) -> impl Future<Output = Result<Vec<SharedDomain>>> + Send;

    fn list_spaces(&self) -> impl Future<Output = Result<Vec<Space>>> + Send;
}

/// Produces freshly authenticated [`CloudController`]s.
///
/// Access tokens expire, so the cache periodically replaces its controller
/// with a new one obtained from the connector.
pub trait Connector: Send + Sync {
    type Controller: CloudController;

    fn connect(&self) -> impl Future<Output = Result<Self::Controller>> + Send;
}
