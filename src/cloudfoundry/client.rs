use reqwest::header::ACCEPT;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::models::{App, Domain, Page, Route, RouteMapping, SharedDomain, Space, V2Resource};
use super::{CloudController, Connector, Error, Result};

const RESULTS_PER_PAGE: usize = 100;

/// UAA password-grant credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// Reads `CF_USER` and `CF_PASS`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredential`] if either variable is unset or empty.
    pub fn from_env() -> Result<Self> {
        let read = |key: &'static str| {
            std::env::var(key)
                .ok()
                .filter(|value| !value.is_empty())
                .ok_or(Error::MissingCredential(key))
        };
        Ok(Self::new(read("CF_USER")?, read("CF_PASS")?))
    }
}

/// Creates authenticated [`HttpController`]s for a Cloud Controller.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    http: reqwest::Client,
    api_url: Url,
    credentials: Credentials,
}

#[derive(Debug, Deserialize)]
struct Info {
    token_endpoint: String,
}

#[derive(Debug, Deserialize)]
struct Token {
    access_token: String,
}

impl HttpConnector {
    /// # Errors
    ///
    /// Returns an error if `api_url` is not a valid URL or the HTTP client cannot be built.
    pub fn new(api_url: &str, credentials: Credentials) -> Result<Self> {
        let http = reqwest::Client::builder().build().map_err(Error::Build)?;
        let api_url = Url::parse(api_url).map_err(|source| Error::Url {
            url: api_url.to_owned(),
            source,
        })?;
        Ok(Self::with_client(http, api_url, credentials))
    }

    pub fn with_client(http: reqwest::Client, api_url: Url, credentials: Credentials) -> Self {
        Self {
            http,
            api_url,
            credentials,
        }
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }
}

impl Connector for HttpConnector {
    type Controller = HttpController;

    /// Discovers the token endpoint through `/v2/info` and logs in with the password grant.
    async fn connect(&self) -> Result<HttpController> {
        let info_url = join(&self.api_url, "/v2/info")?;
        let info: Info = send_json(self.http.get(info_url.clone()), info_url.as_str()).await?;

        let token_url = format!("{}/oauth/token", info.token_endpoint.trim_end_matches('/'));
        let request = self
            .http
            .post(&token_url)
            .header(ACCEPT, "application/json")
            .basic_auth("cf", Some(""))
            .form(&[
                ("grant_type", "password"),
                ("username", self.credentials.username.as_str()),
                ("password", self.credentials.password.expose_secret()),
            ]);
        let token: Token = send_json(request, &token_url).await?;
        log::debug!(target: "cloudfoundry", "obtained access token from {}", token_url);

        Ok(HttpController {
            http: self.http.clone(),
            api_url: self.api_url.clone(),
            token: SecretString::from(token.access_token),
        })
    }
}

/// A bearer-authenticated client for the v2 Cloud Controller API.
#[derive(Debug, Clone)]
pub struct HttpController {
    http: reqwest::Client,
    api_url: Url,
    token: SecretString,
}

impl HttpController {
    /// Lists every resource of type `T`, following `next_url` until the last page.
    async fn list<T: V2Resource>(&self) -> Result<Vec<T>> {
        let mut out = Vec::new();
        let mut next = Some(format!("{}?results-per-page={RESULTS_PER_PAGE}", T::PATH));

        while let Some(path) = next.take() {
            let url = join(&self.api_url, &path)?;
            let request = self
                .http
                .get(url.clone())
                .bearer_auth(self.token.expose_secret());
            let page: Page<T::Entity> = send_json(request, url.as_str()).await?;

            out.extend(
                page.resources
                    .into_iter()
                    .map(|resource| T::from_v2(resource.metadata.guid, resource.entity)),
            );
            next = page.next_url;
        }
        log::trace!(target: "cloudfoundry", "listed {} {}", out.len(), T::KIND);

        Ok(out)
    }
}

impl CloudController for HttpController {
    async fn list_apps(&self) -> Result<Vec<App>> {
        self.list().await
    }

    async fn list_routes(&self) -> Result<Vec<Route>> {
        self.list().await
    }

    async fn list_route_mappings(&self) -> Result<Vec<RouteMapping>> {
        self.list().await
    }

    async fn list_domains(&self) -> Result<Vec<Domain>> {
        self.list().await
    }

    async fn list_shared_domains(&self) -> Result<Vec<SharedDomain>> {
        self.list().await
    }

    async fn list_spaces(&self) -> Result<Vec<Space>> {
        self.list().await
    }
}

/// Issues an unauthenticated `GET {api_url}/v2/info` and checks for a success status.
///
/// # Errors
///
/// Returns an error if the request fails or the controller answers with a non-2xx status.
pub async fn check_info_endpoint(http: &reqwest::Client, api_url: &Url) -> Result<()> {
    let url = join(api_url, "/v2/info")?;
    let response = http
        .get(url.clone())
        .send()
        .await
        .map_err(|source| Error::Request {
            url: url.to_string(),
            source,
        })?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Status {
            url: url.to_string(),
            status,
            body,
        });
    }
    Ok(())
}

fn join(base: &Url, path: &str) -> Result<Url> {
    base.join(path).map_err(|source| Error::Url {
        url: format!("{base}{path}"),
        source,
    })
}

async fn send_json<T: DeserializeOwned>(request: reqwest::RequestBuilder, url: &str) -> Result<T> {
    let response = request.send().await.map_err(|source| Error::Request {
        url: url.to_owned(),
        source,
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Status {
            url: url.to_owned(),
            status,
            body,
        });
    }

    response.json::<T>().await.map_err(|source| Error::Decode {
        url: url.to_owned(),
        source,
    })
}
