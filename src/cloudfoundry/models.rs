use serde::Deserialize;
use serde::de::DeserializeOwned;

/// A Cloud Foundry resource that can be held in a [`crate::cache::ResourceCollection`].
pub trait Resource: Clone + Send + Sync + 'static {
    /// Human readable, plural name of the resource type, used in logs.
    const KIND: &'static str;

    /// The platform-unique GUID.
    fn guid(&self) -> &str;

    /// The name used for the name index, if the resource type has one.
    fn name(&self) -> Option<&str> {
        None
    }
}

/// A resource listed through a v2 Cloud Controller endpoint.
pub(crate) trait V2Resource: Resource {
    type Entity: DeserializeOwned + Send;
    const PATH: &'static str;

    fn from_v2(guid: String, entity: Self::Entity) -> Self;
}

/// One page of a v2 list response.
#[derive(Debug, Deserialize)]
pub(crate) struct Page<E> {
    #[serde(default)]
    pub next_url: Option<String>,
    #[serde(default = "Vec::new")]
    pub resources: Vec<Envelope<E>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<E> {
    pub metadata: Metadata,
    pub entity: E,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Metadata {
    pub guid: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct App {
    pub guid: String,
    pub name: String,
    pub space_guid: String,
    pub ssh_enabled: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AppEntity {
    name: String,
    #[serde(default)]
    space_guid: String,
    #[serde(default)]
    enable_ssh: Option<bool>,
}

impl Resource for App {
    const KIND: &'static str = "apps";

    fn guid(&self) -> &str {
        &self.guid
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

impl V2Resource for App {
    type Entity = AppEntity;
    const PATH: &'static str = "/v2/apps";

    fn from_v2(guid: String, entity: AppEntity) -> Self {
        Self {
            guid,
            name: entity.name,
            space_guid: entity.space_guid,
            ssh_enabled: entity.enable_ssh.unwrap_or_default(),
        }
    }
}

/// A hostname bound to a domain. Mapped to apps through [`RouteMapping`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub guid: String,
    pub host: String,
    pub domain_guid: String,
    pub space_guid: String,
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RouteEntity {
    #[serde(default)]
    host: String,
    domain_guid: String,
    #[serde(default)]
    space_guid: String,
    #[serde(default)]
    path: String,
}

impl Resource for Route {
    const KIND: &'static str = "routes";

    fn guid(&self) -> &str {
        &self.guid
    }
}

impl V2Resource for Route {
    type Entity = RouteEntity;
    const PATH: &'static str = "/v2/routes";

    fn from_v2(guid: String, entity: RouteEntity) -> Self {
        Self {
            guid,
            host: entity.host,
            domain_guid: entity.domain_guid,
            space_guid: entity.space_guid,
            path: entity.path,
        }
    }
}

/// Associates one [`Route`] with one [`App`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMapping {
    pub guid: String,
    pub app_guid: String,
    pub route_guid: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RouteMappingEntity {
    app_guid: String,
    route_guid: String,
}

impl Resource for RouteMapping {
    const KIND: &'static str = "route mappings";

    fn guid(&self) -> &str {
        &self.guid
    }
}

impl V2Resource for RouteMapping {
    type Entity = RouteMappingEntity;
    const PATH: &'static str = "/v2/route_mappings";

    fn from_v2(guid: String, entity: RouteMappingEntity) -> Self {
        Self {
            guid,
            app_guid: entity.app_guid,
            route_guid: entity.route_guid,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DomainEntity {
    name: String,
}

/// A private (organization scoped) domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    pub guid: String,
    pub name: String,
}

impl Resource for Domain {
    const KIND: &'static str = "domains";

    fn guid(&self) -> &str {
        &self.guid
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

impl V2Resource for Domain {
    type Entity = DomainEntity;
    const PATH: &'static str = "/v2/private_domains";

    fn from_v2(guid: String, entity: DomainEntity) -> Self {
        Self {
            guid,
            name: entity.name,
        }
    }
}

/// A platform-wide domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedDomain {
    pub guid: String,
    pub name: String,
}

impl Resource for SharedDomain {
    const KIND: &'static str = "shared domains";

    fn guid(&self) -> &str {
        &self.guid
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

impl V2Resource for SharedDomain {
    type Entity = DomainEntity;
    const PATH: &'static str = "/v2/shared_domains";

    fn from_v2(guid: String, entity: DomainEntity) -> Self {
        Self {
            guid,
            name: entity.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Space {
    pub guid: String,
    pub name: String,
    pub allow_ssh: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpaceEntity {
    name: String,
    #[serde(default)]
    allow_ssh: bool,
}

impl Resource for Space {
    const KIND: &'static str = "spaces";

    fn guid(&self) -> &str {
        &self.guid
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

impl V2Resource for Space {
    type Entity = SpaceEntity;
    const PATH: &'static str = "/v2/spaces";

    fn from_v2(guid: String, entity: SpaceEntity) -> Self {
        Self {
            guid,
            name: entity.name,
            allow_ssh: entity.allow_ssh,
        }
    }
}
