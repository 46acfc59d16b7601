//! Watchtower configuration.
//!
//! The configuration is a YAML document describing the expected state of a
//! Cloud Foundry environment: which apps (and their routes) may be deployed and
//! how SSH access should be configured for apps and spaces. It is loaded once
//! at startup and never changes for the lifetime of the process.
//!
//! `$VAR` and `${VAR}` references are expanded from the environment before the
//! document is parsed, so secrets and per-environment domains do not have to be
//! committed to the file.
mod error;
mod expand;

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

pub use error::{Error, Result};
pub use expand::{expand_env, expand_vars};

/// Lower bound for `global.refresh_interval`.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// The loaded and validated configuration, with apps and spaces indexed by name.
#[derive(Debug, Clone)]
pub struct Config {
    pub global: GlobalConfig,
    pub apps: AppConfig,
    pub spaces: SpaceConfig,
    document: ConfigFile,
}

/// Settings under the `global` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    pub port: u16,
    #[serde(with = "duration")]
    pub refresh_interval: Duration,
    pub cloud_controller_url: String,
}

/// The `apps` section, keyed by app name.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub enabled: bool,
    pub apps: HashMap<String, AppEntry>,
}

/// The `spaces` section, keyed by space name.
#[derive(Debug, Clone, Default)]
pub struct SpaceConfig {
    pub enabled: bool,
    pub spaces: HashMap<String, SpaceEntry>,
}

/// An allowed app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppEntry {
    pub name: String,
    /// Optional apps are not reported as missing when they are not deployed.
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub ssh_disabled: bool,
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
}

impl AppEntry {
    /// Returns true if `route` (in `<host>.<domain>` form) is configured for this app.
    pub fn contains_route(&self, route: &str) -> bool {
        self.routes.iter().any(|entry| entry.as_str() == route)
    }
}

/// A `<host>.<domain>` route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteEntry(String);

impl RouteEntry {
    pub fn new(route: impl Into<String>) -> Self {
        Self(route.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The hostname, i.e. everything before the first `.`.
    pub fn host(&self) -> &str {
        self.0.split_once('.').map_or(self.0.as_str(), |(host, _)| host)
    }

    /// The domain, i.e. everything after the first `.`.
    pub fn domain(&self) -> &str {
        self.0.split_once('.').map_or("", |(_, domain)| domain)
    }
}

/// An allowed space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpaceEntry {
    pub name: String,
    #[serde(default)]
    pub allow_ssh: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    global: GlobalConfig,
    #[serde(default)]
    apps: Section<AppEntry>,
    #[serde(default)]
    spaces: Section<SpaceEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Section<T> {
    #[serde(default)]
    enabled: bool,
    #[serde(default = "Vec::new")]
    resources: Vec<T>,
}

impl<T> Default for Section<T> {
    fn default() -> Self {
        Self {
            enabled: false,
            resources: Vec::new(),
        }
    }
}

impl Config {
    /// Reads and parses the config file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Read`] if the file cannot be read, or any error of
    /// [`Config::from_yaml`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    /// Expands environment variables in `raw`, then parses and validates it.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed, contains unknown keys, or
    /// fails validation (reserved port, refresh interval below
    /// [`MIN_REFRESH_INTERVAL`], unsupported cloud controller URL, or a route
    /// without a domain).
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let expanded = expand_env(raw);
        let mut document: ConfigFile = serde_yaml::from_str(&expanded).map_err(Error::Parse)?;

        if document.global.port == 0 {
            return Err(Error::ReservedPort);
        }
        if document.global.refresh_interval < MIN_REFRESH_INTERVAL {
            return Err(Error::RefreshIntervalTooShort {
                interval: document.global.refresh_interval,
                minimum: MIN_REFRESH_INTERVAL,
            });
        }
        document.global.cloud_controller_url =
            normalize_controller_url(&document.global.cloud_controller_url)?;

        for app in &document.apps.resources {
            if let Some(route) = app.routes.iter().find(|r| r.domain().is_empty()) {
                return Err(Error::InvalidRoute {
                    app: app.name.clone(),
                    route: route.as_str().to_owned(),
                });
            }
        }

        // Duplicate names are not rejected: the last entry wins.
        let apps = document
            .apps
            .resources
            .iter()
            .map(|app| (app.name.clone(), app.clone()))
            .collect();
        let spaces = document
            .spaces
            .resources
            .iter()
            .map(|space| (space.name.clone(), space.clone()))
            .collect();

        Ok(Self {
            global: document.global.clone(),
            apps: AppConfig {
                enabled: document.apps.enabled,
                apps,
            },
            spaces: SpaceConfig {
                enabled: document.spaces.enabled,
                spaces,
            },
            document,
        })
    }

    /// Serializes the loaded configuration back to YAML (after env expansion).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialize`] if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.document).map_err(Error::Serialize)
    }
}

/// Validates the cloud controller URL and reduces it to `scheme://host[:port]`.
fn normalize_controller_url(raw: &str) -> Result<String> {
    let invalid = |reason| Error::ControllerUrl {
        url: raw.to_owned(),
        reason,
    };

    // Checked on the raw input: parsing resolves dot segments.
    if raw.contains("..") {
        return Err(invalid("suspected directory traversal"));
    }
    let url = Url::parse(raw).map_err(|_| invalid("could not be parsed"))?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(invalid("not an absolute URL"));
    }
    if url.scheme() != "https" {
        return Err(invalid("unsupported scheme"));
    }
    if url.fragment().is_some() {
        return Err(invalid("fragments are unsupported"));
    }
    if url.query().is_some() {
        return Err(invalid("queries are unsupported"));
    }

    Ok(url.origin().ascii_serialization())
}

mod duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC_CONFIG: &str = "\
global:
  port: 8443
  refresh_interval: 15s
  cloud_controller_url: https://api.fr.cloud.gov
apps:
  enabled: true
  resources:
    - name: my-cool-app
    - name: optional-app-example
      optional: true
    - name: app-with-route
      ssh_disabled: true
      routes:
        - app-hostname.app.cloudfoundry
    - name: optional-app-with-routes
      optional: true
      routes:
        - hostname1.first.domain
        - hostname2.first.domain
        - hostname3.second.domain
spaces:
  enabled: true
  resources:
    - name: dev
      allow_ssh: true
    - name: test
      allow_ssh: true
    - name: prod
      allow_ssh: false
";

    fn with_global(global: &str) -> String {
        format!("global:\n{global}\napps:\n  enabled: false\n")
    }

    #[test]
    fn test_basic_config_sections() {
        let conf = Config::from_yaml(BASIC_CONFIG).unwrap();

        assert!(conf.apps.enabled);
        assert!(conf.spaces.enabled);
        assert_eq!(conf.apps.apps.len(), 4);
        assert_eq!(conf.spaces.spaces.len(), 3);
        assert_eq!(conf.global.port, 8443);
        assert_eq!(conf.global.refresh_interval, Duration::from_secs(15));
    }

    #[test]
    fn test_app_entries() {
        let conf = Config::from_yaml(BASIC_CONFIG).unwrap();

        let plain = &conf.apps.apps["my-cool-app"];
        assert!(!plain.optional);
        assert!(!plain.ssh_disabled);
        assert!(plain.routes.is_empty());

        assert!(conf.apps.apps["optional-app-example"].optional);
        assert!(conf.apps.apps["app-with-route"].ssh_disabled);

        let routed = &conf.apps.apps["optional-app-with-routes"];
        assert_eq!(routed.routes.len(), 3);
        assert!(routed.contains_route("hostname3.second.domain"));
        assert!(!routed.contains_route("hostname3.first.domain"));
    }

    #[test]
    fn test_route_host_and_domain() {
        let route = RouteEntry::new("app-hostname.app.cloudfoundry");
        assert_eq!(route.host(), "app-hostname");
        assert_eq!(route.domain(), "app.cloudfoundry");

        let bare = RouteEntry::new("localhost");
        assert_eq!(bare.host(), "localhost");
        assert_eq!(bare.domain(), "");
    }

    #[test]
    fn test_space_entries() {
        let conf = Config::from_yaml(BASIC_CONFIG).unwrap();
        assert!(conf.spaces.spaces["dev"].allow_ssh);
        assert!(conf.spaces.spaces["test"].allow_ssh);
        assert!(!conf.spaces.spaces["prod"].allow_ssh);
    }

    #[test]
    fn test_env_var_expansion() {
        // SAFETY: no other test reads or writes this variable.
        unsafe { std::env::set_var("WATCHTOWER_TEST_APP_DOMAIN", "apps.example.com") };
        let raw = "\
global:
  port: 8080
  refresh_interval: 30s
  cloud_controller_url: https://api.example.com
apps:
  enabled: true
  resources:
    - name: web
      routes:
        - web.${WATCHTOWER_TEST_APP_DOMAIN}
";
        let conf = Config::from_yaml(raw).unwrap();
        let web = &conf.apps.apps["web"];
        assert_eq!(web.routes[0].as_str(), "web.apps.example.com");
        assert_eq!(web.routes[0].domain(), "apps.example.com");
    }

    #[test]
    fn test_zero_port_rejected() {
        let raw = with_global(
            "  port: 0\n  refresh_interval: 15s\n  cloud_controller_url: https://api.example.com",
        );
        assert!(matches!(Config::from_yaml(&raw), Err(Error::ReservedPort)));
    }

    #[test]
    fn test_short_interval_rejected() {
        let raw = with_global(
            "  port: 8080\n  refresh_interval: 5s\n  cloud_controller_url: https://api.example.com",
        );
        assert!(matches!(
            Config::from_yaml(&raw),
            Err(Error::RefreshIntervalTooShort { .. })
        ));

        let raw = with_global(
            "  port: 8080\n  refresh_interval: 10s\n  cloud_controller_url: https://api.example.com",
        );
        assert!(Config::from_yaml(&raw).is_ok());
    }

    #[test]
    fn test_controller_url_normalized() {
        let raw = with_global(
            "  port: 8080\n  refresh_interval: 15s\n  cloud_controller_url: https://api.example.com:8443/v2/info",
        );
        let conf = Config::from_yaml(&raw).unwrap();
        assert_eq!(
            conf.global.cloud_controller_url,
            "https://api.example.com:8443"
        );
    }

    #[test]
    fn test_controller_url_rejected() {
        for url in [
            "\"\"",
            "http://api.example.com",
            "https://api.example.com/../admin",
            "https://api.example.com?foo=bar",
            "https://api.example.com#section",
            "api.example.com",
        ] {
            let raw = with_global(&format!(
                "  port: 8080\n  refresh_interval: 15s\n  cloud_controller_url: {url}"
            ));
            assert!(
                matches!(Config::from_yaml(&raw), Err(Error::ControllerUrl { .. })),
                "url {url} was accepted"
            );
        }
    }

    #[test]
    fn test_route_without_domain_rejected() {
        let raw = "\
global:
  port: 8080
  refresh_interval: 15s
  cloud_controller_url: https://api.example.com
apps:
  enabled: true
  resources:
    - name: web
      routes: [localhost]
";
        assert!(matches!(
            Config::from_yaml(raw),
            Err(Error::InvalidRoute { .. })
        ));
    }

    #[test]
    fn test_bad_config() {
        assert!(Config::from_yaml("This is not a config").is_err());
        assert!(Config::from_yaml("global: \n  wrong_key: asdf").is_err());
        assert!(Config::from_yaml("apps: \n  enabled: not_a_bool").is_err());
    }

    #[test]
    fn test_yaml_roundtrip_for_config_endpoint() {
        let conf = Config::from_yaml(BASIC_CONFIG).unwrap();
        let yaml = conf.to_yaml().unwrap();
        assert!(yaml.contains("refresh_interval: 15s"));

        let reloaded = Config::from_yaml(&yaml).unwrap();
        assert_eq!(reloaded.global, conf.global);
        assert_eq!(reloaded.apps.apps, conf.apps.apps);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("failed to create temp file");
        std::io::Write::write_all(&mut file, BASIC_CONFIG.as_bytes()).unwrap();

        let conf = Config::load(file.path()).unwrap();
        assert_eq!(conf.apps.apps.len(), 4);

        let err = Config::load("/definitely/does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }
}
