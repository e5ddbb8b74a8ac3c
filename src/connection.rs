//! Authenticated access to the GoodData REST and WebDAV APIs.
//!
//! A [`Connection`] keeps the session cookies obtained at login and sends
//! basic credentials with every request. Failures are translated at this
//! boundary: transport problems become [`Error::Unreachable`], HTTP errors
//! become [`Error::Api`] carrying the vendor's message.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde_json::{json, Value};

use crate::error::{format_api_message, Error, Result};

pub const DEFAULT_HOST: &str = "https://secure.gooddata.com";
pub const DEFAULT_WEBDAV_HOST: &str = "https://secure-di.gooddata.com";

/// Default request timeout (60 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default pause between two task-status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

const LOGIN_URI: &str = "/gdc/account/login";
const TOKEN_URI: &str = "/gdc/account/token";
const UPLOADS_URI: &str = "/uploads";

/// Where and how to reach GoodData.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// REST API root.
    pub host: String,
    /// WebDAV root used for uploads.
    pub webdav_host: String,
    pub timeout: Duration,
    /// Fixed pause of the task polling loops.
    pub poll_interval: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            webdav_host: DEFAULT_WEBDAV_HOST.to_string(),
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl ConnectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into().trim_end_matches('/').to_string();
        self
    }

    pub fn webdav_host(mut self, webdav_host: impl Into<String>) -> Self {
        self.webdav_host = webdav_host.into().trim_end_matches('/').to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// A logged-in session.
#[derive(Debug)]
pub struct Connection {
    client: Client,
    config: ConnectionConfig,
    username: String,
    password: String,
}

impl Connection {
    /// Open a session.
    ///
    /// # Errors
    ///
    /// Returns `Error::Authentication` if the credentials are rejected or
    /// the token cannot be fetched, `Error::Unreachable` if GoodData
    /// cannot be contacted.
    pub fn login(config: ConnectionConfig, username: &str, password: &str) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .build()
            .map_err(|source| Error::Http {
                uri: config.host.clone(),
                source,
            })?;

        let connection = Self {
            client,
            config,
            username: username.to_string(),
            password: password.to_string(),
        };
        connection.authenticate()?;
        Ok(connection)
    }

    /// Log in again, refreshing the session cookies.
    pub fn relogin(&self) -> Result<()> {
        log::warn!("session expired, logging in again as {}", self.username);
        self.authenticate()
    }

    fn authenticate(&self) -> Result<()> {
        let body = json!({
            "postUserLogin": {
                "login": self.username,
                "password": self.password,
                "remember": 1,
            }
        });
        let as_auth_error = |err: Error| match err {
            Error::Api { status, message, .. } => Error::Authentication {
                message,
                status: Some(status),
            },
            other => other,
        };
        self.post_json(LOGIN_URI, &body).map_err(as_auth_error)?;
        self.get_json(TOKEN_URI).map_err(as_auth_error)?;
        log::info!("logged in to {} as {}", self.config.host, self.username);
        Ok(())
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    fn url(&self, uri: &str) -> String {
        if uri.starts_with("http://") || uri.starts_with("https://") {
            uri.to_string()
        } else {
            format!("{}{}", self.config.host, uri)
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password))
            .header(ACCEPT, "application/json")
    }

    /// Send a request, turning transport and HTTP failures into errors.
    fn send(&self, builder: RequestBuilder, method: &Method, uri: &str) -> Result<Response> {
        log::debug!("{method}: {uri}");
        let response = builder.send().map_err(|source| {
            if source.is_connect() || source.is_timeout() {
                Error::Unreachable {
                    uri: uri.to_string(),
                    source,
                }
            } else {
                Error::Http {
                    uri: uri.to_string(),
                    source,
                }
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        let message = match serde_json::from_str::<Value>(&body) {
            Ok(value) => format_api_message(&value),
            Err(_) if body.is_empty() => status.to_string(),
            Err(_) => body,
        };
        Err(Error::Api {
            method: method.to_string(),
            uri: uri.to_string(),
            status: status.as_u16(),
            message,
        })
    }

    fn read_json(response: Response, uri: &str) -> Result<Value> {
        let body = response.text().map_err(|source| Error::Http {
            uri: uri.to_string(),
            source,
        })?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    pub fn get_json(&self, uri: &str) -> Result<Value> {
        let response = self.send(self.request(Method::GET, &self.url(uri)), &Method::GET, uri)?;
        Self::read_json(response, uri)
    }

    /// POST a JSON body. An empty response body reads as `Value::Null`.
    pub fn post_json(&self, uri: &str, body: &Value) -> Result<Value> {
        let builder = self.request(Method::POST, &self.url(uri)).json(body);
        let response = self.send(builder, &Method::POST, uri)?;
        Self::read_json(response, uri)
    }

    /// GET a resource as bytes, with its status code.
    pub fn get_raw(&self, uri: &str) -> Result<(u16, Vec<u8>)> {
        let response = self.send(self.request(Method::GET, &self.url(uri)), &Method::GET, uri)?;
        let status = response.status().as_u16();
        let bytes = response.bytes().map_err(|source| Error::Http {
            uri: uri.to_string(),
            source,
        })?;
        Ok((status, bytes.to_vec()))
    }

    pub fn delete(&self, uri: &str) -> Result<()> {
        self.send(self.request(Method::DELETE, &self.url(uri)), &Method::DELETE, uri)?;
        Ok(())
    }

    // === WebDAV ===

    fn webdav_url(&self, uri: &str) -> String {
        format!("{}{}", self.config.webdav_host, uri)
    }

    /// Create a WebDAV directory.
    pub fn mkcol(&self, uri: &str) -> Result<()> {
        let method = Method::from_bytes(b"MKCOL").map_err(|_| Error::UploadFailed {
            message: "MKCOL is not a valid HTTP method".into(),
            dir_name: uri.to_string(),
        })?;
        self.send(self.request(method.clone(), &self.webdav_url(uri)), &method, uri)?;
        Ok(())
    }

    /// Store a file on WebDAV.
    pub fn put(&self, uri: &str, content: Vec<u8>, content_type: &str) -> Result<()> {
        let builder = self
            .request(Method::PUT, &self.webdav_url(uri))
            .header(CONTENT_TYPE, content_type)
            .body(content);
        self.send(builder, &Method::PUT, uri)?;
        Ok(())
    }

    /// Upload an archive into a fresh directory and return the directory name.
    pub fn upload_archive(&self, archive: Vec<u8>, archive_name: &str) -> Result<String> {
        let dir_name = uuid::Uuid::new_v4().simple().to_string();
        self.mkcol(&format!("{UPLOADS_URI}/{dir_name}/"))?;
        self.put(
            &format!("{UPLOADS_URI}/{dir_name}/{archive_name}"),
            archive,
            "application/zip",
        )?;
        Ok(dir_name)
    }

    /// Remove an upload directory once its data has been integrated.
    pub fn delete_upload_dir(&self, dir_name: &str) -> Result<()> {
        let uri = format!("{UPLOADS_URI}/{dir_name}/");
        let method = Method::DELETE;
        self.send(self.request(method.clone(), &self.webdav_url(&uri)), &method, &uri)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.host, "https://secure.gooddata.com");
        assert_eq!(config.webdav_host, "https://secure-di.gooddata.com");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.poll_interval, Duration::from_millis(500));
    }

    #[test]
    fn config_builder_trims_slashes() {
        let config = ConnectionConfig::new()
            .host("http://localhost:1234/")
            .webdav_host("http://localhost:5678/")
            .poll_interval(Duration::from_millis(1));
        assert_eq!(config.host, "http://localhost:1234");
        assert_eq!(config.webdav_host, "http://localhost:5678");
        assert_eq!(config.poll_interval, Duration::from_millis(1));
    }

    #[test]
    fn login_against_mock_server() {
        let mut server = mockito::Server::new();
        let login = server
            .mock("POST", "/gdc/account/login")
            .match_body(mockito::Matcher::PartialJson(json!({
                "postUserLogin": {"login": "alice", "remember": 1}
            })))
            .with_status(200)
            .with_body(r#"{"userLogin": {"profile": "/gdc/account/profile/1"}}"#)
            .create();
        let token = server
            .mock("GET", "/gdc/account/token")
            .with_status(200)
            .with_body("{}")
            .create();

        let config = ConnectionConfig::new().host(server.url());
        let connection = Connection::login(config, "alice", "secret").unwrap();
        assert_eq!(connection.username(), "alice");
        login.assert();
        token.assert();
    }

    #[test]
    fn rejected_login_is_an_authentication_error() {
        let mut server = mockito::Server::new();
        let _login = server
            .mock("POST", "/gdc/account/login")
            .with_status(401)
            .with_body(r#"{"error": {"message": "Bad login %s", "parameters": ["alice"]}}"#)
            .create();

        let config = ConnectionConfig::new().host(server.url());
        let err = Connection::login(config, "alice", "wrong").unwrap_err();
        match err {
            Error::Authentication { message, status } => {
                assert_eq!(message, "Bad login alice");
                assert_eq!(status, Some(401));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unreachable_host() {
        // Port 9 (discard) is closed on test machines.
        let config = ConnectionConfig::new()
            .host("http://127.0.0.1:9")
            .timeout(Duration::from_secs(2));
        let err = Connection::login(config, "alice", "secret").unwrap_err();
        assert!(matches!(err, Error::Unreachable { .. }), "{err:?}");
        assert_eq!(err.exit_code(), 3);
    }
}
