//! In-memory Cloud Controller used by the cache and detector tests.
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::cloudfoundry::{
    self, App, CloudController, Connector, Domain, Route, RouteMapping, SharedDomain, Space,
};

pub fn failure() -> cloudfoundry::Error {
    cloudfoundry::Error::Status {
        url: "https://api.example.com/v2/fake".to_owned(),
        status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
        body: "unavailable".to_owned(),
    }
}

pub fn app(guid: &str, name: &str, ssh_enabled: bool) -> App {
    App {
        guid: guid.to_owned(),
        name: name.to_owned(),
        space_guid: "space-1".to_owned(),
        ssh_enabled,
    }
}

pub fn route(guid: &str, host: &str, domain_guid: &str) -> Route {
    Route {
        guid: guid.to_owned(),
        host: host.to_owned(),
        domain_guid: domain_guid.to_owned(),
        space_guid: "space-1".to_owned(),
        path: String::new(),
    }
}

pub fn mapping(guid: &str, app_guid: &str, route_guid: &str) -> RouteMapping {
    RouteMapping {
        guid: guid.to_owned(),
        app_guid: app_guid.to_owned(),
        route_guid: route_guid.to_owned(),
    }
}

pub fn domain(guid: &str, name: &str) -> Domain {
    Domain {
        guid: guid.to_owned(),
        name: name.to_owned(),
    }
}

pub fn shared_domain(guid: &str, name: &str) -> SharedDomain {
    SharedDomain {
        guid: guid.to_owned(),
        name: name.to_owned(),
    }
}

pub fn space(guid: &str, name: &str, allow_ssh: bool) -> Space {
    Space {
        guid: guid.to_owned(),
        name: name.to_owned(),
        allow_ssh,
    }
}

/// Canned list results. `None` makes the corresponding list call fail.
#[derive(Debug)]
pub struct FakeState {
    apps: Mutex<Option<Vec<App>>>,
    routes: Mutex<Option<Vec<Route>>>,
    route_mappings: Mutex<Option<Vec<RouteMapping>>>,
    domains: Mutex<Option<Vec<Domain>>>,
    shared_domains: Mutex<Option<Vec<SharedDomain>>>,
    spaces: Mutex<Option<Vec<Space>>>,
    pub connects: AtomicUsize,
    pub fail_connect: AtomicBool,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            apps: Mutex::new(Some(Vec::new())),
            routes: Mutex::new(Some(Vec::new())),
            route_mappings: Mutex::new(Some(Vec::new())),
            domains: Mutex::new(Some(Vec::new())),
            shared_domains: Mutex::new(Some(Vec::new())),
            spaces: Mutex::new(Some(Vec::new())),
            connects: AtomicUsize::new(0),
            fail_connect: AtomicBool::new(false),
        }
    }
}

fn respond<T: Clone>(slot: &Mutex<Option<Vec<T>>>) -> cloudfoundry::Result<Vec<T>> {
    slot.lock().unwrap().clone().ok_or_else(failure)
}

impl FakeState {
    pub fn set_apps(&self, apps: Option<Vec<App>>) {
        *self.apps.lock().unwrap() = apps;
    }

    pub fn set_routes(&self, routes: Option<Vec<Route>>) {
        *self.routes.lock().unwrap() = routes;
    }

    pub fn set_route_mappings(&self, route_mappings: Option<Vec<RouteMapping>>) {
        *self.route_mappings.lock().unwrap() = route_mappings;
    }

    pub fn set_domains(&self, domains: Option<Vec<Domain>>) {
        *self.domains.lock().unwrap() = domains;
    }

    pub fn set_shared_domains(&self, shared_domains: Option<Vec<SharedDomain>>) {
        *self.shared_domains.lock().unwrap() = shared_domains;
    }

    pub fn set_spaces(&self, spaces: Option<Vec<Space>>) {
        *self.spaces.lock().unwrap() = spaces;
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeConnector {
    pub state: Arc<FakeState>,
}

#[derive(Debug)]
pub struct FakeController {
    state: Arc<FakeState>,
}

impl Connector for FakeConnector {
    type Controller = FakeController;

    async fn connect(&self) -> cloudfoundry::Result<FakeController> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_connect.load(Ordering::SeqCst) {
            return Err(failure());
        }
        Ok(FakeController {
            state: Arc::clone(&self.state),
        })
    }
}

impl CloudController for FakeController {
    async fn list_apps(&self) -> cloudfoundry::Result<Vec<App>> {
        respond(&self.state.apps)
    }

    async fn list_routes(&self) -> cloudfoundry::Result<Vec<Route>> {
        respond(&self.state.routes)
    }

    async fn list_route_mappings(&self) -> cloudfoundry::Result<Vec<RouteMapping>> {
        respond(&self.state.route_mappings)
    }

    async fn list_domains(&self) -> cloudfoundry::Result<Vec<Domain>> {
        respond(&self.state.domains)
    }

    async fn list_shared_domains(&self) -> cloudfoundry::Result<Vec<SharedDomain>> {
        respond(&self.state.shared_domains)
    }

    async fn list_spaces(&self) -> cloudfoundry::Result<Vec<Space>> {
        respond(&self.state.spaces)
    }
}
