//! Immutable dispatcher configuration: CORS credentials allow-list, UI languages, and session
//! token lifetimes.
//!
//! Build a [`DispatcherConfig`] with [`DispatcherConfig::builder`] or load one from JSON with
//! [`DispatcherConfig::from_json_str`]; both paths run the same validation.

/// Builder API for assembling validated configurations.
pub mod builder;

pub use builder::*;

// self
use crate::{
	_prelude::*,
	auth::{Language, SigningKey, TokenError},
	error::ConfigError,
};

/// Validated configuration injected into the dispatcher at construction.
#[derive(Clone, Debug)]
pub struct DispatcherConfig {
	/// Lowercase serialized origins that receive `Access-Control-Allow-Credentials`.
	pub allow_credentials_origins: HashSet<String>,
	/// Supported UI languages, in configuration order.
	pub languages: Vec<Language>,
	/// Language substituted when the request names none or an unsupported one.
	pub fallback_language: Language,
	/// Lifetime granted to a session token when it is issued or refreshed.
	pub session_token_lifetime: Duration,
	/// Age after which a still-valid token is proactively renewed.
	pub session_token_refresh_interval: Duration,
	/// Key used to sign and verify session tokens.
	pub signing_key: SigningKey,
	/// `Access-Control-Max-Age` advertised on preflight responses.
	pub preflight_max_age: Duration,
}
impl DispatcherConfig {
	/// Creates a builder around the session token signing key.
	pub fn builder(signing_key: SigningKey) -> DispatcherConfigBuilder {
		DispatcherConfigBuilder::new(signing_key)
	}

	/// Parses and validates a JSON configuration document.
	///
	/// Durations are expressed in whole seconds:
	///
	/// ```json
	/// {
	///   "allowCredentialsOrigins": ["https://app.example.com"],
	///   "languages": ["en", "de"],
	///   "fallbackLanguage": "en",
	///   "sessionTokenLifetime": 900,
	///   "sessionTokenRefreshInterval": 300,
	///   "sessionTokenKey": "change-me"
	/// }
	/// ```
	pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
		let de = &mut serde_json::Deserializer::from_str(document);
		let document: ConfigDocument =
			serde_path_to_error::deserialize(de).map_err(ConfigError::parse)?;
		let mut builder = Self::builder(document.session_token_key)
			.allow_credentials_origins(document.allow_credentials_origins)
			.languages(document.languages)
			.session_token_lifetime(Duration::seconds(document.session_token_lifetime))
			.session_token_refresh_interval(Duration::seconds(
				document.session_token_refresh_interval,
			));

		if let Some(language) = document.fallback_language {
			builder = builder.fallback_language(language);
		}
		if let Some(max_age) = document.preflight_max_age {
			builder = builder.preflight_max_age(Duration::seconds(max_age));
		}

		builder.build()
	}

	/// Returns the requested language when supported, the fallback otherwise.
	pub fn resolve_language(&self, requested: Option<&str>) -> Language {
		requested
			.and_then(|tag| self.languages.iter().find(|language| language.as_ref() == tag))
			.unwrap_or(&self.fallback_language)
			.clone()
	}

	/// Returns `true` if the lowercase `origin` may receive credentialed responses.
	pub fn allows_credentials(&self, origin: &str) -> bool {
		self.allow_credentials_origins.contains(origin)
	}

	/// Returns `true` once a token expiring at `expires` is due for sliding renewal.
	///
	/// A token is due when its effective issue time (`expires - lifetime`) is at or before
	/// `now - refresh_interval`. Instants the calendar cannot represent are reported as
	/// [`TokenError::ExpiryOutOfRange`].
	pub fn is_refresh_due(
		&self,
		expires: OffsetDateTime,
		now: OffsetDateTime,
	) -> Result<bool, TokenError> {
		let issued = expires
			.checked_sub(self.session_token_lifetime)
			.ok_or(TokenError::ExpiryOutOfRange)?;
		let threshold = now
			.checked_sub(self.session_token_refresh_interval)
			.ok_or(TokenError::ExpiryOutOfRange)?;

		Ok(issued <= threshold)
	}
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ConfigDocument {
	#[serde(default)]
	allow_credentials_origins: Vec<String>,
	languages: Vec<String>,
	#[serde(default)]
	fallback_language: Option<String>,
	session_token_lifetime: i64,
	session_token_refresh_interval: i64,
	session_token_key: SigningKey,
	#[serde(default)]
	preflight_max_age: Option<i64>,
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::{PrimitiveDateTime, macros};
	// self
	use super::*;
	use crate::_preludet::*;

	#[test]
	fn language_resolution_falls_back() {
		let config = test_config();

		assert_eq!(config.resolve_language(Some("de")).as_ref(), "de");
		assert_eq!(config.resolve_language(Some("DE")).as_ref(), "en");
		assert_eq!(config.resolve_language(Some("xx")).as_ref(), "en");
		assert_eq!(config.resolve_language(None).as_ref(), "en");
	}

	#[test]
	fn refresh_becomes_due_after_the_interval() {
		let config = test_config();
		let now = macros::datetime!(2025-01-01 12:00 UTC);
		// Issued exactly one refresh interval ago.
		let due = now - TEST_REFRESH_INTERVAL + TEST_LIFETIME;

		assert!(config.is_refresh_due(due, now).expect("Fixture instants are in range."));
		assert!(
			!config
				.is_refresh_due(due + Duration::seconds(1), now)
				.expect("Fixture instants are in range.")
		);
		assert!(
			config
				.is_refresh_due(now - Duration::minutes(1), now)
				.expect("Fixture instants are in range.")
		);
	}

	#[test]
	fn refresh_check_reports_unrepresentable_instants() {
		let config = test_config();
		let earliest = PrimitiveDateTime::MIN.assume_utc();

		assert!(matches!(
			config.is_refresh_due(earliest, macros::datetime!(2025-01-01 12:00 UTC)),
			Err(TokenError::ExpiryOutOfRange)
		));
		assert!(matches!(
			config.is_refresh_due(macros::datetime!(2025-01-01 12:00 UTC), earliest),
			Err(TokenError::ExpiryOutOfRange)
		));
	}

	#[test]
	fn oversized_json_durations_are_rejected() {
		let err = DispatcherConfig::from_json_str(
			r#"{
				"languages": ["en"],
				"sessionTokenLifetime": 9223372036854775807,
				"sessionTokenRefreshInterval": 300,
				"sessionTokenKey": "secret"
			}"#,
		)
		.expect_err("An unbounded lifetime should be rejected.");

		assert!(
			matches!(err, ConfigError::DurationTooLong { field: "session token lifetime", .. }),
			"Unexpected error: {err:?}"
		);
	}

	#[test]
	fn json_document_round_trips_through_the_builder() {
		let config = DispatcherConfig::from_json_str(
			r#"{
				"allowCredentialsOrigins": ["https://App.Example.com/"],
				"languages": ["en", "de"],
				"sessionTokenLifetime": 900,
				"sessionTokenRefreshInterval": 300,
				"sessionTokenKey": "secret"
			}"#,
		)
		.expect("Configuration document should load.");

		assert!(config.allows_credentials("https://app.example.com"));
		assert_eq!(config.fallback_language.as_ref(), "en");
		assert_eq!(config.session_token_lifetime, Duration::minutes(15));
		assert_eq!(config.preflight_max_age, DispatcherConfigBuilder::DEFAULT_PREFLIGHT_MAX_AGE);
	}

	#[test]
	fn json_errors_report_the_field_path() {
		let err = DispatcherConfig::from_json_str(
			r#"{
				"languages": ["en"],
				"sessionTokenLifetime": "soon",
				"sessionTokenRefreshInterval": 300,
				"sessionTokenKey": "secret"
			}"#,
		)
		.expect_err("A string lifetime should be rejected.");

		assert!(
			matches!(&err, ConfigError::Parse { path, .. } if path == "sessionTokenLifetime"),
			"Unexpected error: {err:?}"
		);
	}
}
