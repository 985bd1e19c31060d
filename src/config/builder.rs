// crates.io
use url::Url;
// self
use crate::{
	_prelude::*,
	auth::{Language, SigningKey},
	config::DispatcherConfig,
	error::ConfigError,
};

/// Builder for [`DispatcherConfig`] values.
#[derive(Debug)]
pub struct DispatcherConfigBuilder {
	/// Key used to sign and verify session tokens.
	pub signing_key: SigningKey,
	/// Origins (any case, optional trailing path) allowed to send credentials.
	pub allow_credentials_origins: Vec<String>,
	/// Supported UI language tags.
	pub languages: Vec<String>,
	/// Fallback language; defaults to the first supported language.
	pub fallback_language: Option<String>,
	/// Session token lifetime.
	pub session_token_lifetime: Duration,
	/// Proactive refresh interval.
	pub session_token_refresh_interval: Duration,
	/// Preflight cache duration.
	pub preflight_max_age: Duration,
}
impl DispatcherConfigBuilder {
	/// Lifetime used when none is configured.
	pub const DEFAULT_SESSION_TOKEN_LIFETIME: Duration = Duration::minutes(15);
	/// Refresh interval used when none is configured.
	pub const DEFAULT_SESSION_TOKEN_REFRESH_INTERVAL: Duration = Duration::minutes(5);
	/// Preflight cache duration used when none is configured.
	pub const DEFAULT_PREFLIGHT_MAX_AGE: Duration = Duration::seconds(1800);
	/// Longest accepted value for any configured duration.
	pub const MAX_DURATION: Duration = Duration::days(366);

	/// Creates a builder seeded with the signing key and default durations.
	pub fn new(signing_key: SigningKey) -> Self {
		Self {
			signing_key,
			allow_credentials_origins: Vec::new(),
			languages: Vec::new(),
			fallback_language: None,
			session_token_lifetime: Self::DEFAULT_SESSION_TOKEN_LIFETIME,
			session_token_refresh_interval: Self::DEFAULT_SESSION_TOKEN_REFRESH_INTERVAL,
			preflight_max_age: Self::DEFAULT_PREFLIGHT_MAX_AGE,
		}
	}

	/// Adds one origin to the allow-with-credentials set.
	pub fn allow_credentials_origin(mut self, origin: impl Into<String>) -> Self {
		self.allow_credentials_origins.push(origin.into());

		self
	}

	/// Adds several origins to the allow-with-credentials set.
	pub fn allow_credentials_origins<I, S>(mut self, origins: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.allow_credentials_origins.extend(origins.into_iter().map(Into::into));

		self
	}

	/// Adds one supported language.
	pub fn language(mut self, language: impl Into<String>) -> Self {
		self.languages.push(language.into());

		self
	}

	/// Adds several supported languages.
	pub fn languages<I, S>(mut self, languages: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.languages.extend(languages.into_iter().map(Into::into));

		self
	}

	/// Sets the fallback language.
	pub fn fallback_language(mut self, language: impl Into<String>) -> Self {
		self.fallback_language = Some(language.into());

		self
	}

	/// Sets the session token lifetime.
	pub fn session_token_lifetime(mut self, lifetime: Duration) -> Self {
		self.session_token_lifetime = lifetime;

		self
	}

	/// Sets the proactive refresh interval.
	pub fn session_token_refresh_interval(mut self, interval: Duration) -> Self {
		self.session_token_refresh_interval = interval;

		self
	}

	/// Sets the preflight cache duration.
	pub fn preflight_max_age(mut self, max_age: Duration) -> Self {
		self.preflight_max_age = max_age;

		self
	}

	/// Consumes the builder and produces a validated [`DispatcherConfig`].
	pub fn build(self) -> Result<DispatcherConfig, ConfigError> {
		if self.signing_key.is_empty() {
			return Err(ConfigError::EmptySigningKey);
		}

		let languages = self.normalized_languages()?;
		let fallback_language = match &self.fallback_language {
			Some(tag) => {
				let language = Language::new(tag)?;

				if !languages.contains(&language) {
					return Err(ConfigError::UnsupportedFallbackLanguage { language: tag.clone() });
				}

				language
			},
			None => languages.first().cloned().ok_or(ConfigError::NoLanguages)?,
		};

		check_duration("session token lifetime", self.session_token_lifetime)?;
		check_duration("session token refresh interval", self.session_token_refresh_interval)?;
		check_duration("preflight max age", self.preflight_max_age)?;

		if self.session_token_refresh_interval >= self.session_token_lifetime {
			return Err(ConfigError::RefreshIntervalTooLong);
		}

		let allow_credentials_origins = self
			.allow_credentials_origins
			.iter()
			.map(|origin| normalize_origin(origin))
			.collect::<Result<HashSet<_>, _>>()?;

		Ok(DispatcherConfig {
			allow_credentials_origins,
			languages,
			fallback_language,
			session_token_lifetime: self.session_token_lifetime,
			session_token_refresh_interval: self.session_token_refresh_interval,
			signing_key: self.signing_key,
			preflight_max_age: self.preflight_max_age,
		})
	}

	fn normalized_languages(&self) -> Result<Vec<Language>, ConfigError> {
		if self.languages.is_empty() {
			return Err(ConfigError::NoLanguages);
		}

		let mut languages = Vec::with_capacity(self.languages.len());

		for tag in &self.languages {
			let language = Language::new(tag)?;

			if !languages.contains(&language) {
				languages.push(language);
			}
		}

		Ok(languages)
	}
}

fn check_duration(field: &'static str, value: Duration) -> Result<(), ConfigError> {
	let max = DispatcherConfigBuilder::MAX_DURATION;

	if !value.is_positive() {
		return Err(ConfigError::NonPositiveDuration { field });
	}
	if value.subsec_nanoseconds() != 0 {
		return Err(ConfigError::FractionalDuration { field });
	}
	if value > max {
		return Err(ConfigError::DurationTooLong { field, max });
	}

	Ok(())
}

/// Reduces an origin to its lowercase `scheme://host[:port]` serialization.
fn normalize_origin(origin: &str) -> Result<String, ConfigError> {
	let url = Url::parse(origin.trim())
		.map_err(|source| ConfigError::InvalidOrigin { origin: origin.to_owned(), source })?;
	let tuple = url.origin();

	if !tuple.is_tuple() {
		return Err(ConfigError::OpaqueOrigin { origin: origin.to_owned() });
	}

	Ok(tuple.ascii_serialization().to_ascii_lowercase())
}
