//! # Core Configuration Module
//!
//! Provides configuration management for the bucket-backed track catalog.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds all necessary dependencies and settings for the core
//! library. It enforces fail-fast validation so a misconfigured process stops
//! at startup rather than on the first request.
//!
//! ## Required Settings
//!
//! - Database path (`:memory:` allowed)
//! - Bucket name
//! - Public base URL used to derive playable URLs
//!
//! ## Dependencies
//!
//! - `ObjectStore` - Bucket access. When the `desktop-shims` feature is
//!   enabled, a `LocalObjectStore` rooted at the configured directory (or the
//!   platform data directory) is injected if none is provided.
//!
//! ## Usage
//!
//! ### From the environment
//!
//! ```ignore
//! use core_runtime::config::CoreConfigBuilder;
//!
//! let config = CoreConfigBuilder::from_env()?.build()?;
//! ```
//!
//! ### From a TOML file
//!
//! Keys are the variable names below without the `TUNES_` prefix, in lower
//! case. Environment variables override the file.
//!
//! ```ignore
//! let config = CoreConfigBuilder::from_file("/etc/tunes/tunes.toml")?.build()?;
//! ```
//!
//! ### With a custom object store
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/var/lib/tunes/catalog.db")
//!     .bucket("music")
//!     .public_base_url("https://pub-example.r2.dev")
//!     .object_store(Arc::new(MyR2Store::new()))
//!     .build()?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable                   | Meaning                                  |
//! |----------------------------|------------------------------------------|
//! | `TUNES_DATABASE_PATH`      | SQLite file                              |
//! | `TUNES_BUCKET`             | Bucket name                              |
//! | `TUNES_PUBLIC_BASE_URL`    | Public base for playable URLs            |
//! | `TUNES_OBJECT_STORE_ROOT`  | Root directory for the local store       |
//! | `TUNES_PLAYLIST_STORAGE`   | `database` or `object-store`             |
//! | `TUNES_MEDIA_EXTENSIONS`   | Comma-separated, default `mp3`           |
//! | `TUNES_DECORATIVE_MARKERS` | Comma-separated, default `(SPOTISAVER)`  |
//! | `TUNES_LOG_LEVEL`          | `trace` .. `error`, default `info`       |

use crate::error::{Error, Result};
use bridge_traits::{LogLevel, ObjectStore};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Prefix shared by every environment variable read here
pub const ENV_PREFIX: &str = "TUNES";

pub const ENV_DATABASE_PATH: &str = "TUNES_DATABASE_PATH";
pub const ENV_BUCKET: &str = "TUNES_BUCKET";
pub const ENV_PUBLIC_BASE_URL: &str = "TUNES_PUBLIC_BASE_URL";
pub const ENV_OBJECT_STORE_ROOT: &str = "TUNES_OBJECT_STORE_ROOT";
pub const ENV_PLAYLIST_STORAGE: &str = "TUNES_PLAYLIST_STORAGE";
pub const ENV_MEDIA_EXTENSIONS: &str = "TUNES_MEDIA_EXTENSIONS";
pub const ENV_DECORATIVE_MARKERS: &str = "TUNES_DECORATIVE_MARKERS";
pub const ENV_LOG_LEVEL: &str = "TUNES_LOG_LEVEL";

/// Where playlists are persisted
///
/// Exactly one mode is used per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaylistStorage {
    /// Rows in the catalog database
    #[default]
    Database,
    /// JSON documents under `playlists/` in the bucket
    ObjectStore,
}

impl PlaylistStorage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::ObjectStore => "object-store",
        }
    }
}

impl fmt::Display for PlaylistStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaylistStorage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "database" | "db" => Ok(Self::Database),
            "object-store" | "object_store" | "objectstore" => Ok(Self::ObjectStore),
            other => Err(Error::Config(format!(
                "Unknown playlist storage '{}'. Expected 'database' or 'object-store'.",
                other
            ))),
        }
    }
}

/// Core configuration for the track catalog.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Path to the SQLite database file
    pub database_path: PathBuf,

    /// Bucket holding the audio objects
    pub bucket: String,

    /// Public base URL objects are served from
    pub public_base_url: String,

    /// Bucket access
    pub object_store: Arc<dyn ObjectStore>,

    /// Playlist persistence mode
    pub playlist_storage: PlaylistStorage,

    /// Object key extensions treated as audio, lowercase without the dot
    pub media_extensions: Vec<String>,

    /// Tags stripped from file names before parsing
    pub decorative_markers: Vec<String>,

    /// Default log level
    pub log_level: LogLevel,
}

impl fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database_path", &self.database_path)
            .field("bucket", &self.bucket)
            .field("public_base_url", &self.public_base_url)
            .field("object_store", &"ObjectStore { ... }")
            .field("playlist_storage", &self.playlist_storage)
            .field("media_extensions", &self.media_extensions)
            .field("decorative_markers", &self.decorative_markers)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Database path is not empty
    /// - Bucket name is not empty and has no `/`
    /// - Public base URL is an http(s) URL
    /// - At least one media extension is configured
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        if self.bucket.trim().is_empty() {
            return Err(Error::Config("Bucket name cannot be empty".to_string()));
        }

        if self.bucket.contains('/') {
            return Err(Error::Config(format!(
                "Bucket name '{}' cannot contain '/'",
                self.bucket
            )));
        }

        if !(self.public_base_url.starts_with("http://")
            || self.public_base_url.starts_with("https://"))
        {
            return Err(Error::Config(format!(
                "Public base URL must start with http:// or https://, got '{}'",
                self.public_base_url
            )));
        }

        if self.media_extensions.is_empty() {
            return Err(Error::Config(
                "At least one media extension is required".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn object_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "ObjectStore".to_string(),
        message: "ObjectStore implementation is required for bucket access. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default LocalObjectStore. \
                 Otherwise: inject an S3-compatible implementation with .object_store()."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_object_store(root: Option<&Path>) -> Result<Arc<dyn ObjectStore>> {
    use bridge_desktop::LocalObjectStore;

    let store = match root {
        Some(root) => LocalObjectStore::with_root(root),
        None => LocalObjectStore::new(),
    };
    let store: Arc<dyn ObjectStore> = Arc::new(store);
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_object_store(_root: Option<&Path>) -> Result<Arc<dyn ObjectStore>> {
    Err(object_store_missing_error())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_extensions(extensions: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(extensions.len());
    for ext in extensions {
        let ext = ext.trim().trim_start_matches('.').to_lowercase();
        if !ext.is_empty() && !normalized.contains(&ext) {
            normalized.push(ext);
        }
    }
    normalized
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Use this builder to incrementally set configuration options and then
/// call [`build()`](CoreConfigBuilder::build) to create the final config.
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    bucket: Option<String>,
    public_base_url: Option<String>,
    object_store: Option<Arc<dyn ObjectStore>>,
    object_store_root: Option<PathBuf>,
    playlist_storage: Option<PlaylistStorage>,
    media_extensions: Option<Vec<String>>,
    decorative_markers: Option<Vec<String>>,
    log_level: Option<LogLevel>,
}

impl CoreConfigBuilder {
    /// Reads `TUNES_*` settings from the process environment.
    ///
    /// Unset and empty variables are treated alike. Values that fail to
    /// parse are reported here; missing required values are reported by
    /// [`build()`](Self::build).
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Reads settings from a config file, then the `TUNES_*` environment.
    ///
    /// The format follows the file extension (`tunes.toml`). File keys are
    /// the variable names without the `TUNES_` prefix, in lowercase; lists
    /// may be arrays or comma-separated strings. Environment variables take
    /// precedence over the file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::load(Some(path.as_ref()))
    }

    fn load(path: Option<&Path>) -> Result<Self> {
        let mut sources = ::config::Config::builder();
        if let Some(path) = path {
            sources = sources.add_source(::config::File::from(path).required(true));
        }
        sources = sources.add_source(::config::Environment::with_prefix(ENV_PREFIX));

        let settings = sources
            .build()
            .map_err(|e| Error::Config(format!("Failed to load configuration: {}", e)))?;

        Self::from_lookup(|var| setting_value(&settings, var))
    }

    /// Reads settings through an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut builder = Self::default();

        if let Some(path) = get(ENV_DATABASE_PATH) {
            builder = builder.database_path(path);
        }
        if let Some(bucket) = get(ENV_BUCKET) {
            builder = builder.bucket(bucket);
        }
        if let Some(url) = get(ENV_PUBLIC_BASE_URL) {
            builder = builder.public_base_url(url);
        }
        if let Some(root) = get(ENV_OBJECT_STORE_ROOT) {
            builder = builder.object_store_root(root);
        }
        if let Some(storage) = get(ENV_PLAYLIST_STORAGE) {
            builder = builder.playlist_storage(storage.parse()?);
        }
        if let Some(extensions) = get(ENV_MEDIA_EXTENSIONS) {
            builder = builder.media_extensions(split_list(&extensions));
        }
        if let Some(markers) = get(ENV_DECORATIVE_MARKERS) {
            builder = builder.decorative_markers(split_list(&markers));
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            let level = level.parse::<LogLevel>().map_err(|e| {
                Error::Config(format!("Invalid {}: {}", ENV_LOG_LEVEL, e))
            })?;
            builder = builder.log_level(level);
        }

        Ok(builder)
    }

    /// Sets the database path.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder()
    ///     .database_path("/path/to/catalog.db");
    /// ```
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Sets the bucket name.
    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    /// Sets the public base URL; trailing slashes are dropped.
    pub fn public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = Some(url.into());
        self
    }

    /// Sets the object store implementation.
    ///
    /// If not provided, a `LocalObjectStore` is used when the
    /// `desktop-shims` feature is enabled.
    pub fn object_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.object_store = Some(store);
        self
    }

    /// Sets the root directory of the default local object store.
    ///
    /// Ignored when an object store is injected.
    pub fn object_store_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.object_store_root = Some(root.into());
        self
    }

    /// Sets the playlist persistence mode.
    ///
    /// Default: [`PlaylistStorage::Database`]
    pub fn playlist_storage(mut self, storage: PlaylistStorage) -> Self {
        self.playlist_storage = Some(storage);
        self
    }

    /// Sets the media extensions, with or without leading dots.
    ///
    /// Default: `["mp3"]`
    pub fn media_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.media_extensions = Some(extensions.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the decorative markers stripped from file names.
    ///
    /// Default: `["(SPOTISAVER)"]`
    pub fn decorative_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.decorative_markers = Some(markers.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the default log level.
    ///
    /// Default: `info`
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CoreConfig)` on success, or an error if:
    /// - A required setting is missing
    /// - No `ObjectStore` is available (`CapabilityMissing`)
    /// - Configuration values are invalid
    pub fn build(self) -> Result<CoreConfig> {
        let database_path = self.database_path.ok_or_else(|| {
            Error::Config(format!(
                "Database path is required. Use .database_path() or set {}.",
                ENV_DATABASE_PATH
            ))
        })?;

        let bucket = self.bucket.ok_or_else(|| {
            Error::Config(format!(
                "Bucket is required. Use .bucket() or set {}.",
                ENV_BUCKET
            ))
        })?;

        let public_base_url = self
            .public_base_url
            .ok_or_else(|| {
                Error::Config(format!(
                    "Public base URL is required. Use .public_base_url() or set {}.",
                    ENV_PUBLIC_BASE_URL
                ))
            })?
            .trim()
            .trim_end_matches('/')
            .to_string();

        let object_store = match self.object_store {
            Some(store) => store,
            None => provide_default_object_store(self.object_store_root.as_deref())?,
        };

        let config = CoreConfig {
            database_path,
            bucket,
            public_base_url,
            object_store,
            playlist_storage: self.playlist_storage.unwrap_or_default(),
            media_extensions: normalize_extensions(
                self.media_extensions
                    .unwrap_or_else(|| vec!["mp3".to_string()]),
            ),
            decorative_markers: self
                .decorative_markers
                .unwrap_or_else(|| vec!["(SPOTISAVER)".to_string()]),
            log_level: self.log_level.unwrap_or(LogLevel::Info),
        };

        config.validate()?;

        Ok(config)
    }
}

/// Value of a `TUNES_*` variable in layered settings, lists joined by commas
fn setting_value(settings: &::config::Config, var: &str) -> Option<String> {
    let key = var
        .strip_prefix(ENV_PREFIX)
        .and_then(|rest| rest.strip_prefix('_'))
        .unwrap_or(var)
        .to_lowercase();

    if let Ok(value) = settings.get_string(&key) {
        return Some(value);
    }

    let items = settings.get_array(&key).ok()?;
    let joined: Vec<String> = items
        .into_iter()
        .filter_map(|item| item.into_string().ok())
        .collect();
    Some(joined.join(","))
}
