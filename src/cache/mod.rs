//! Snapshot cache of the deployed Cloud Foundry resources.
//!
//! [`ResourceCache`] owns one [`ResourceCollection`] per resource type and the
//! controller used to fill them. A refresh fans out one fetch per resource type
//! and returns once all of them have completed. Each collection succeeds or
//! fails on its own; a failed collection keeps its last known contents and is
//! marked invalid.
//!
//! [`Resources`] is the read side: it resolves the relationships between
//! routes, domains, route mappings and apps across the independently fetched
//! collections.
mod collection;
mod error;

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::cloudfoundry::{
    self, App, CloudController, Connector, Domain, Resource, Route, RouteMapping, SharedDomain,
    Space,
};
use crate::error::ResultOkLogExt;

pub use collection::ResourceCollection;
pub use error::LookupError;

/// Access tokens expire, so controllers older than this are replaced.
pub const DEFAULT_MAX_CLIENT_AGE: Duration = Duration::from_secs(8 * 60 * 60);

/// The six resource collections and the lookups spanning them.
#[derive(Debug, Default)]
pub struct Resources {
    pub apps: ResourceCollection<App>,
    pub routes: ResourceCollection<Route>,
    pub route_mappings: ResourceCollection<RouteMapping>,
    pub domains: ResourceCollection<Domain>,
    pub shared_domains: ResourceCollection<SharedDomain>,
    pub spaces: ResourceCollection<Space>,
}

/// The app, route and domain name a route mapping points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingResources<'a> {
    pub app: &'a App,
    pub route: &'a Route,
    pub domain_name: &'a str,
}

impl Resources {
    /// `true` only if every collection's most recent refresh succeeded.
    pub fn is_valid(&self) -> bool {
        self.apps.is_valid()
            && self.routes.is_valid()
            && self.route_mappings.is_valid()
            && self.domains.is_valid()
            && self.shared_domains.is_valid()
            && self.spaces.is_valid()
    }

    /// Finds the route for `<host>.<domain>`, regardless of whether the domain
    /// is shared or private.
    pub fn find_route_by_url(&self, host: &str, domain: &str) -> Option<&Route> {
        for route in self.routes.items().iter().filter(|r| r.host == host) {
            match self.find_domain_name_by_guid(&route.domain_guid) {
                Some(name) if name == domain => return Some(route),
                Some(_) => {}
                None => log::info!(
                    target: "cache",
                    "domain lookup failed for guid {} of route {}",
                    route.domain_guid,
                    route.guid
                ),
            }
        }
        None
    }

    /// Resolves a domain GUID against the shared domains first, then the private ones.
    pub fn find_domain_name_by_guid(&self, guid: &str) -> Option<&str> {
        self.shared_domains
            .get_by_guid(guid)
            .map(|domain| domain.name.as_str())
            .or_else(|| {
                self.domains
                    .get_by_guid(guid)
                    .map(|domain| domain.name.as_str())
            })
    }

    /// Resolves a route mapping to its app, route and domain name.
    ///
    /// # Errors
    ///
    /// Returns the first missing link, checked in the order route mapping,
    /// route, domain, app.
    pub fn mapping_resources(&self, mapping_guid: &str) -> Result<MappingResources<'_>, LookupError> {
        let mapping = self
            .route_mappings
            .get_by_guid(mapping_guid)
            .ok_or_else(|| LookupError::RouteMappingNotFound(mapping_guid.to_owned()))?;
        let route = self
            .routes
            .get_by_guid(&mapping.route_guid)
            .ok_or_else(|| LookupError::RouteNotFound(mapping.route_guid.clone()))?;
        let domain_name = self
            .find_domain_name_by_guid(&route.domain_guid)
            .ok_or_else(|| LookupError::DomainNotFound(route.domain_guid.clone()))?;
        let app = self
            .apps
            .get_by_guid(&mapping.app_guid)
            .ok_or_else(|| LookupError::AppNotFound(mapping.app_guid.clone()))?;

        Ok(MappingResources {
            app,
            route,
            domain_name,
        })
    }

    /// Validity and size of every collection.
    pub fn status(&self) -> CacheStatus {
        CacheStatus {
            valid: self.is_valid(),
            apps: CollectionStatus::of(&self.apps),
            routes: CollectionStatus::of(&self.routes),
            route_mappings: CollectionStatus::of(&self.route_mappings),
            domains: CollectionStatus::of(&self.domains),
            shared_domains: CollectionStatus::of(&self.shared_domains),
            spaces: CollectionStatus::of(&self.spaces),
        }
    }
}

/// A point-in-time summary of the cache, safe to hand to other tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStatus {
    pub valid: bool,
    pub apps: CollectionStatus,
    pub routes: CollectionStatus,
    pub route_mappings: CollectionStatus,
    pub domains: CollectionStatus,
    pub shared_domains: CollectionStatus,
    pub spaces: CollectionStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectionStatus {
    pub valid: bool,
    pub items: usize,
}

impl CollectionStatus {
    fn of<T: Resource>(collection: &ResourceCollection<T>) -> Self {
        Self {
            valid: collection.is_valid(),
            items: collection.len(),
        }
    }
}

/// Keeps [`Resources`] up to date using controllers obtained from a [`Connector`].
pub struct ResourceCache<C: Connector> {
    connector: C,
    controller: C::Controller,
    connected_at: Instant,
    max_client_age: Duration,
    resources: Resources,
}

impl<C: Connector> ResourceCache<C> {
    /// Connects and performs the first refresh before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial connection fails. Failed fetches do not
    /// fail construction; they leave the affected collections invalid.
    pub async fn new(connector: C) -> cloudfoundry::Result<Self> {
        Self::with_max_client_age(connector, DEFAULT_MAX_CLIENT_AGE).await
    }

    /// Like [`ResourceCache::new`], replacing the controller once it is `max_client_age` old.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial connection fails.
    pub async fn with_max_client_age(
        connector: C,
        max_client_age: Duration,
    ) -> cloudfoundry::Result<Self> {
        let controller = connector.connect().await?;
        log::info!(target: "cache", "connected to cloud controller");

        let mut cache = Self {
            connector,
            controller,
            connected_at: Instant::now(),
            max_client_age,
            resources: Resources::default(),
        };
        cache.refresh_collections().await;

        Ok(cache)
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub fn is_valid(&self) -> bool {
        self.resources.is_valid()
    }

    /// Refreshes all collections concurrently and waits for every fetch to finish.
    pub async fn refresh(&mut self) {
        self.reconnect_if_expired().await;
        self.refresh_collections().await;
    }

    async fn refresh_collections(&mut self) {
        let before = Instant::now();
        let Self {
            controller,
            resources,
            ..
        } = &mut *self;
        let controller: &C::Controller = controller;
        tokio::join!(
            resources.apps.refresh(controller.list_apps()),
            resources.routes.refresh(controller.list_routes()),
            resources
                .route_mappings
                .refresh(controller.list_route_mappings()),
            resources.domains.refresh(controller.list_domains()),
            resources
                .shared_domains
                .refresh(controller.list_shared_domains()),
            resources.spaces.refresh(controller.list_spaces()),
        );
        log::debug!(
            target: "cache",
            "refresh took {} ms (valid={})",
            before.elapsed().as_millis(),
            self.resources.is_valid()
        );
    }

    /// Replaces the controller if it is too old. On failure the current one is kept
    /// and the next refresh tries again.
    async fn reconnect_if_expired(&mut self) {
        if self.connected_at.elapsed() < self.max_client_age {
            return;
        }
        let connected = self
            .connector
            .connect()
            .await
            .ok_log("cache", "failed to refresh cloud controller client");
        if let Some(controller) = connected {
            self.controller = controller;
            self.connected_at = Instant::now();
            log::info!(target: "cache", "refreshed cloud controller client");
        }
    }
}
