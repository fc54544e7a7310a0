//! Client configuration: API base URL, refresh and login entry points, and default headers.

// std
use std::env;
// crates.io
use http::{
	HeaderMap, HeaderName, HeaderValue,
	header::{ACCEPT, CONTENT_TYPE},
};
// self
use crate::{_prelude::*, error::ConfigError};

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
/// Path of the token exchange endpoint.
pub const DEFAULT_REFRESH_PATH: &str = "/api/v1/auth/refresh";
/// Path of the login entry point signalled when a session ends.
pub const DEFAULT_LOGIN_PATH: &str = "/login";
/// Environment variable consulted by [`ClientConfig::from_env`].
pub const BASE_URL_ENV: &str = "SESSION_CLIENT_API_URL";

/// Errors raised while constructing or validating a [`ClientConfig`].
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ClientConfigError {
	/// Base URL could not be parsed.
	#[error("Base URL `{url}` is not a valid URL.")]
	InvalidBaseUrl {
		/// Raw value that failed to parse.
		url: String,
	},
	/// Base URL must use HTTP or HTTPS.
	#[error("Base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// Base URL that failed validation.
		url: String,
	},
	/// Base URL cannot have paths appended to it.
	#[error("Base URL cannot be used as a base: {url}.")]
	CannotBeABase {
		/// Base URL that failed validation.
		url: String,
	},
	/// Configured paths must be absolute.
	#[error("The {field} path must start with `/`: {path}.")]
	RelativePath {
		/// Which path failed validation.
		field: &'static str,
		/// Offending path.
		path: String,
	},
	/// Default header name or value is not valid HTTP.
	#[error("Default header `{name}` is not a valid HTTP header.")]
	InvalidHeader {
		/// Header name as supplied.
		name: String,
	},
}

/// Validated client configuration.
///
/// Endpoint URLs are resolved once at build time so the request pipeline never has to handle
/// a malformed refresh or login URL.
#[derive(Clone, Debug)]
pub struct ClientConfig {
	base_url: Url,
	refresh_path: String,
	refresh_url: Url,
	login_url: Url,
	default_headers: HeaderMap,
}
impl ClientConfig {
	/// Creates a builder seeded with `base_url` and the default paths.
	pub fn builder(base_url: Url) -> ClientConfigBuilder {
		ClientConfigBuilder::new(base_url)
	}

	/// Builds a configuration with default paths and headers.
	pub fn new(base_url: Url) -> Result<Self, ClientConfigError> {
		Self::builder(base_url).build()
	}

	/// Reads the base URL from [`BASE_URL_ENV`], falling back to [`DEFAULT_BASE_URL`].
	pub fn from_env() -> Result<Self, ClientConfigError> {
		let raw = env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());
		let base_url =
			Url::parse(&raw).map_err(|_| ClientConfigError::InvalidBaseUrl { url: raw.clone() })?;

		Self::new(base_url)
	}

	/// API base URL every request path is appended to.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Path of the token exchange endpoint.
	pub fn refresh_path(&self) -> &str {
		&self.refresh_path
	}

	/// Fully resolved token exchange URL.
	pub fn refresh_url(&self) -> &Url {
		&self.refresh_url
	}

	/// Fully resolved login entry point signalled when a session ends.
	pub fn login_url(&self) -> &Url {
		&self.login_url
	}

	/// Headers attached to every request before request-specific headers.
	pub fn default_headers(&self) -> &HeaderMap {
		&self.default_headers
	}

	/// Appends `path` to the base URL, keeping any path prefix the base URL carries.
	pub fn resolve(&self, path: &str) -> Result<Url, ConfigError> {
		join(&self.base_url, path)
			.map_err(|source| ConfigError::InvalidUrl { path: path.to_owned(), source })
	}

	/// Returns `true` when `url` targets the token exchange endpoint.
	pub fn is_refresh_url(&self, url: &Url) -> bool {
		url.origin() == self.refresh_url.origin() && url.path() == self.refresh_url.path()
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// API base URL.
	pub base_url: Url,
	/// Token exchange path.
	pub refresh_path: String,
	/// Login entry point path.
	pub login_path: String,
	/// Extra default headers as raw name/value pairs.
	pub default_headers: Vec<(String, String)>,
}
impl ClientConfigBuilder {
	/// Creates a new builder seeded with the provided base URL.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			refresh_path: DEFAULT_REFRESH_PATH.to_owned(),
			login_path: DEFAULT_LOGIN_PATH.to_owned(),
			default_headers: Vec::new(),
		}
	}

	/// Overrides the token exchange path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Overrides the login entry point path.
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.login_path = path.into();

		self
	}

	/// Adds a header sent with every request.
	pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.default_headers.push((name.into(), value.into()));

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ClientConfigError> {
		validate_base_url(&self.base_url)?;
		validate_path("refresh", &self.refresh_path)?;
		validate_path("login", &self.login_path)?;

		let mut default_headers = HeaderMap::new();

		default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

		for (name, value) in self.default_headers {
			let invalid = || ClientConfigError::InvalidHeader { name: name.clone() };
			let header_name = HeaderName::try_from(name.as_str()).map_err(|_| invalid())?;
			let header_value = HeaderValue::try_from(value.as_str()).map_err(|_| invalid())?;

			default_headers.insert(header_name, header_value);
		}

		let refresh_url = join(&self.base_url, &self.refresh_path).map_err(|_| {
			ClientConfigError::RelativePath { field: "refresh", path: self.refresh_path.clone() }
		})?;
		let login_url = join(&self.base_url, &self.login_path).map_err(|_| {
			ClientConfigError::RelativePath { field: "login", path: self.login_path.clone() }
		})?;

		Ok(ClientConfig {
			base_url: self.base_url,
			refresh_path: self.refresh_path,
			refresh_url,
			login_url,
			default_headers,
		})
	}
}

fn join(base: &Url, path: &str) -> Result<Url, url::ParseError> {
	Url::parse(&format!("{}{path}", base.as_str().trim_end_matches('/')))
}

fn validate_base_url(url: &Url) -> Result<(), ClientConfigError> {
	if !matches!(url.scheme(), "http" | "https") {
		return Err(ClientConfigError::UnsupportedScheme { url: url.to_string() });
	}
	if url.cannot_be_a_base() {
		return Err(ClientConfigError::CannotBeABase { url: url.to_string() });
	}

	Ok(())
}

fn validate_path(field: &'static str, path: &str) -> Result<(), ClientConfigError> {
	if path.starts_with('/') {
		Ok(())
	} else {
		Err(ClientConfigError::RelativePath { field, path: path.to_owned() })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse config test URL.")
	}

	#[test]
	fn defaults_resolve_refresh_and_login_urls() {
		let config = ClientConfig::new(url("http://localhost:8080"))
			.expect("Default configuration should validate.");

		assert_eq!(config.refresh_url().as_str(), "http://localhost:8080/api/v1/auth/refresh");
		assert_eq!(config.login_url().as_str(), "http://localhost:8080/login");
		assert_eq!(
			config.default_headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
			Some("application/json")
		);
	}

	#[test]
	fn base_url_prefix_is_kept() {
		let config = ClientConfig::new(url("https://example.com/interview/"))
			.expect("Prefixed base URL should validate.");
		let resolved =
			config.resolve("/api/v1/users/me").expect("Request path should resolve.");

		assert_eq!(resolved.as_str(), "https://example.com/interview/api/v1/users/me");
		assert!(config.is_refresh_url(config.refresh_url()));
		assert!(!config.is_refresh_url(&resolved));
	}

	#[test]
	fn builder_rejects_invalid_values() {
		let err = ClientConfig::builder(url("ftp://example.com"))
			.build()
			.expect_err("Non-HTTP base URLs should be rejected.");

		assert!(matches!(err, ClientConfigError::UnsupportedScheme { .. }));

		let err = ClientConfig::builder(url("https://example.com"))
			.refresh_path("auth/refresh")
			.build()
			.expect_err("Relative refresh paths should be rejected.");

		assert_eq!(
			err,
			ClientConfigError::RelativePath { field: "refresh", path: "auth/refresh".into() }
		);

		let err = ClientConfig::builder(url("https://example.com"))
			.default_header("x bad", "value")
			.build()
			.expect_err("Invalid header names should be rejected.");

		assert!(matches!(err, ClientConfigError::InvalidHeader { .. }));
	}

	#[test]
	fn custom_default_headers_override_builtins() {
		let config = ClientConfig::builder(url("https://example.com"))
			.default_header("accept", "text/plain")
			.default_header("x-client", "session-client")
			.build()
			.expect("Custom headers should validate.");

		let accept = config.default_headers().get(ACCEPT).and_then(|v| v.to_str().ok());

		assert_eq!(accept, Some("text/plain"));
		assert!(config.default_headers().contains_key("x-client"));
	}
}
