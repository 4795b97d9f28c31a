//! Configuration management for ado-cli.
//!
//! Settings are assembled from several layers, lowest precedence first:
//! built-in defaults, the TOML config file, the `origin` git remote, `ADO_*`
//! environment variables and finally command line flags.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ado_cli::Config;
//!
//! let settings = Config::default()
//!     .merge(Config::load_from_file().unwrap())
//!     .merge(Config::load_from_env())
//!     .resolve()
//!     .unwrap();
//! println!("Organization: {}", settings.organization);
//! ```

use crate::{
    api::ClientOptions, cli::GlobalArgs, error::ConfigError, git_config,
    parsed_property::ParsedProperty,
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "ado-cli";

/// On-disk shape of `config.toml`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    organization: Option<String>,
    pat: Option<String>,
    api_version: Option<String>,
    timeout_secs: Option<u64>,
    search_timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    retry_backoff_secs: Option<u64>,
    max_pages: Option<usize>,
    download_concurrency: Option<usize>,
}

/// Partially resolved configuration. Every field remembers its source.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Organization name or `https://` URL.
    pub organization: Option<ParsedProperty<String>>,
    /// Personal access token. When absent an Azure CLI token is used.
    pub pat: Option<ParsedProperty<String>>,
    /// Value of the `api-version` query parameter.
    pub api_version: Option<ParsedProperty<String>>,
    /// Request timeout for regular endpoints.
    pub timeout_secs: Option<ParsedProperty<u64>>,
    /// Request timeout for the search host.
    pub search_timeout_secs: Option<ParsedProperty<u64>>,
    /// Retries after the first attempt for retryable failures.
    pub max_retries: Option<ParsedProperty<u32>>,
    /// Base backoff, doubled on every retry.
    pub retry_backoff_secs: Option<ParsedProperty<u64>>,
    /// Upper bound on continuation-token pages.
    pub max_pages: Option<ParsedProperty<usize>>,
    /// Parallel file downloads for bulk operations.
    pub download_concurrency: Option<ParsedProperty<usize>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            organization: None,
            pat: None,
            api_version: Some(ParsedProperty::Default("7.2-preview".to_string())),
            timeout_secs: Some(ParsedProperty::Default(60)),
            search_timeout_secs: Some(ParsedProperty::Default(120)),
            max_retries: Some(ParsedProperty::Default(2)),
            retry_backoff_secs: Some(ParsedProperty::Default(2)),
            max_pages: Some(ParsedProperty::Default(20)),
            download_concurrency: Some(ParsedProperty::Default(4)),
        }
    }
}

/// Fully resolved settings handed to the client.
#[derive(Debug, Clone)]
pub struct Settings {
    pub organization: String,
    pub pat: Option<SecretString>,
    pub api_version: String,
    pub timeout: Duration,
    pub search_timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub max_pages: usize,
    pub download_concurrency: usize,
}

impl Settings {
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            api_version: self.api_version.clone(),
            timeout: self.timeout,
            search_timeout: self.search_timeout,
            max_retries: self.max_retries,
            retry_backoff: self.retry_backoff,
            max_pages: self.max_pages,
        }
    }
}

fn env_string(var: &str) -> Option<ParsedProperty<String>> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(|v| ParsedProperty::Env(v, var.to_string()))
}

fn env_parsed<T: std::str::FromStr>(var: &str) -> Option<ParsedProperty<T>> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .map(|v| ParsedProperty::Env(v, var.to_string()))
}

fn cli<T>(value: Option<T>, flag: &str) -> Option<ParsedProperty<T>> {
    value.map(|v| ParsedProperty::Cli(v, flag.to_string()))
}

impl Config {
    /// Config with every field unset, used as a merge layer.
    pub fn empty() -> Self {
        Self {
            organization: None,
            pat: None,
            api_version: None,
            timeout_secs: None,
            search_timeout_secs: None,
            max_retries: None,
            retry_backoff_secs: None,
            max_pages: None,
            download_concurrency: None,
        }
    }

    /// Load configuration from the XDG config directory.
    ///
    /// A missing file yields an empty layer.
    #[must_use = "this returns the loaded configuration which should be used"]
    pub fn load_from_file() -> Result<Self> {
        Self::load_from_path(&Self::config_path()?)
    }

    /// Load configuration from a specific TOML file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::empty());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::FileReadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let file: ConfigFile = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let from_file = |v| ParsedProperty::File(v, path.to_path_buf());
        Ok(Self {
            organization: file.organization.map(from_file),
            pat: file.pat.map(from_file),
            api_version: file.api_version.map(from_file),
            timeout_secs: file
                .timeout_secs
                .map(|v| ParsedProperty::File(v, path.to_path_buf())),
            search_timeout_secs: file
                .search_timeout_secs
                .map(|v| ParsedProperty::File(v, path.to_path_buf())),
            max_retries: file
                .max_retries
                .map(|v| ParsedProperty::File(v, path.to_path_buf())),
            retry_backoff_secs: file
                .retry_backoff_secs
                .map(|v| ParsedProperty::File(v, path.to_path_buf())),
            max_pages: file
                .max_pages
                .map(|v| ParsedProperty::File(v, path.to_path_buf())),
            download_concurrency: file
                .download_concurrency
                .map(|v| ParsedProperty::File(v, path.to_path_buf())),
        })
    }

    /// Detect the organization from the `origin` remote of `repo_path`.
    pub fn detect_from_git_remote<P: AsRef<Path>>(repo_path: P) -> Self {
        match git_config::detect_organization(repo_path) {
            Ok(Some(detected)) => Self {
                organization: Some(ParsedProperty::Git(
                    detected.organization,
                    detected.remote_url,
                )),
                ..Self::empty()
            },
            Ok(None) => Self::empty(),
            Err(e) => {
                tracing::debug!(error = %e, "git remote detection skipped");
                Self::empty()
            }
        }
    }

    /// Load configuration from `ADO_*` environment variables.
    ///
    /// Values that fail to parse are treated as unset.
    pub fn load_from_env() -> Self {
        Self {
            organization: env_string("ADO_ORG"),
            pat: env_string("ADO_PAT"),
            api_version: env_string("ADO_API_VERSION"),
            timeout_secs: env_parsed("ADO_TIMEOUT_SECS"),
            search_timeout_secs: env_parsed("ADO_SEARCH_TIMEOUT_SECS"),
            max_retries: env_parsed("ADO_MAX_RETRIES"),
            retry_backoff_secs: env_parsed("ADO_RETRY_BACKOFF_SECS"),
            max_pages: env_parsed("ADO_MAX_PAGES"),
            download_concurrency: env_parsed("ADO_DOWNLOAD_CONCURRENCY"),
        }
    }

    /// Build the command line layer from parsed global flags.
    pub fn from_global_args(args: &GlobalArgs) -> Self {
        Self {
            organization: cli(args.org.clone(), "--org"),
            pat: cli(args.pat.clone(), "--pat"),
            api_version: cli(args.api_version.clone(), "--api-version"),
            timeout_secs: cli(args.timeout, "--timeout"),
            search_timeout_secs: None,
            max_retries: cli(args.max_retries, "--max-retries"),
            retry_backoff_secs: None,
            max_pages: cli(args.max_pages, "--max-pages"),
            download_concurrency: cli(args.concurrency, "--concurrency"),
        }
    }

    /// Path of the config file, honouring `XDG_CONFIG_HOME`.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = match std::env::var("XDG_CONFIG_HOME") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::home_dir()
                .context("Could not determine home directory")?
                .join(".config"),
        };
        Ok(config_dir.join(APP_DIR).join("config.toml"))
    }

    /// Merge this config with another, preferring values from `other`.
    pub fn merge(self, other: Self) -> Self {
        Self {
            organization: other.organization.or(self.organization),
            pat: other.pat.or(self.pat),
            api_version: other.api_version.or(self.api_version),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
            search_timeout_secs: other.search_timeout_secs.or(self.search_timeout_secs),
            max_retries: other.max_retries.or(self.max_retries),
            retry_backoff_secs: other.retry_backoff_secs.or(self.retry_backoff_secs),
            max_pages: other.max_pages.or(self.max_pages),
            download_concurrency: other.download_concurrency.or(self.download_concurrency),
        }
    }

    /// Load every layer and resolve the result.
    ///
    /// The git remote is only consulted when neither flags nor environment
    /// name an organization.
    pub fn load(args: &GlobalArgs) -> Result<Settings> {
        let cli_layer = Self::from_global_args(args);
        let env_layer = Self::load_from_env();

        let mut merged = Self::default().merge(Self::load_from_file()?);
        if cli_layer.organization.is_none()
            && env_layer.organization.is_none()
            && let Ok(cwd) = std::env::current_dir()
        {
            merged = merged.merge(Self::detect_from_git_remote(cwd));
        }
        let merged = merged.merge(env_layer).merge(cli_layer);

        if let Some(org) = &merged.organization {
            tracing::debug!(organization = %org, source = %org.origin(), "resolved organization");
        }
        Ok(merged.resolve()?)
    }

    /// Turn the merged layers into concrete settings.
    pub fn resolve(self) -> std::result::Result<Settings, ConfigError> {
        let organization = self
            .organization
            .map(ParsedProperty::into_value)
            .filter(|o| !o.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingRequired {
                field: "org".to_string(),
                env_var: "ADO_ORG".to_string(),
            })?;

        let defaults = Self::default();
        let pick_u64 = |value: Option<ParsedProperty<u64>>,
                        fallback: Option<ParsedProperty<u64>>| {
            value.or(fallback).map(ParsedProperty::into_value).unwrap_or_default()
        };

        let timeout_secs = pick_u64(self.timeout_secs, defaults.timeout_secs);
        let search_timeout_secs = pick_u64(self.search_timeout_secs, defaults.search_timeout_secs);
        for (field, secs) in [
            ("timeout_secs", timeout_secs),
            ("search_timeout_secs", search_timeout_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
        }

        let max_pages = self
            .max_pages
            .or(defaults.max_pages)
            .map(ParsedProperty::into_value)
            .unwrap_or(20);
        if max_pages == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_pages".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        let download_concurrency = self
            .download_concurrency
            .or(defaults.download_concurrency)
            .map(ParsedProperty::into_value)
            .unwrap_or(4);
        if download_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "download_concurrency".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        Ok(Settings {
            organization,
            pat: self
                .pat
                .map(ParsedProperty::into_value)
                .filter(|p| !p.is_empty())
                .map(SecretString::from),
            api_version: self
                .api_version
                .or(defaults.api_version)
                .map(ParsedProperty::into_value)
                .unwrap_or_else(|| "7.2-preview".to_string()),
            timeout: Duration::from_secs(timeout_secs),
            search_timeout: Duration::from_secs(search_timeout_secs),
            max_retries: self
                .max_retries
                .or(defaults.max_retries)
                .map(ParsedProperty::into_value)
                .unwrap_or(2),
            retry_backoff: Duration::from_secs(pick_u64(
                self.retry_backoff_secs,
                defaults.retry_backoff_secs,
            )),
            max_pages,
            download_concurrency,
        })
    }

    /// Write a commented sample config file if none exists yet.
    ///
    /// Returns the path of the (possibly pre-existing) file.
    #[must_use = "this operation can fail and the result should be checked"]
    pub fn create_sample_config() -> Result<PathBuf> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            return Ok(config_path);
        }

        if let Some(dir) = config_path.parent() {
            fs::create_dir_all(dir).map_err(|e| ConfigError::DirectoryCreationError {
                path: dir.to_path_buf(),
                message: e.to_string(),
            })?;
        }

        let sample_config = r#"# ado-cli configuration file
# Location: $XDG_CONFIG_HOME/ado-cli/config.toml (defaults to ~/.config/ado-cli/config.toml)
# Every key can be overridden by an ADO_* environment variable or a command line flag.

# Organization name or URL (required unless detected from the git remote)
# organization = "your-organization"

# Personal Access Token (optional; prefer the ADO_PAT environment variable).
# Without a PAT the tool asks the Azure CLI (`az login`) for a token.
# pat = "your-pat-token"

# REST API version sent with every request
api_version = "7.2-preview"

# Request timeouts in seconds
timeout_secs = 60
search_timeout_secs = 120

# Retries for 429/5xx responses and connection failures, with exponential backoff
max_retries = 2
retry_backoff_secs = 2

# Maximum continuation-token pages fetched by list commands
max_pages = 20

# Parallel downloads for bulk-download and pr-download
download_concurrency = 4
"#;

        fs::write(&config_path, sample_config)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;

        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::file_serial;
    use std::env;
    use tempfile::TempDir;

    const ENV_VARS: &[&str] = &[
        "ADO_ORG",
        "ADO_PAT",
        "ADO_API_VERSION",
        "ADO_TIMEOUT_SECS",
        "ADO_SEARCH_TIMEOUT_SECS",
        "ADO_MAX_RETRIES",
        "ADO_RETRY_BACKOFF_SECS",
        "ADO_MAX_PAGES",
        "ADO_DOWNLOAD_CONCURRENCY",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            unsafe {
                env::remove_var(var);
            }
        }
    }

    /// Run `f` with XDG_CONFIG_HOME pointed at `dir`, then restore it.
    fn with_xdg_config_home<T>(dir: &Path, f: impl FnOnce() -> T) -> T {
        let saved = env::var_os("XDG_CONFIG_HOME");
        unsafe {
            env::set_var("XDG_CONFIG_HOME", dir);
        }
        let result = f();
        unsafe {
            match saved {
                Some(value) => env::set_var("XDG_CONFIG_HOME", value),
                None => env::remove_var("XDG_CONFIG_HOME"),
            }
        }
        result
    }

    /// # Config Default Values
    ///
    /// Tests the built-in defaults.
    ///
    /// ## Test Scenario
    /// - Creates a default Config
    ///
    /// ## Expected Outcome
    /// - Organization and PAT are unset
    /// - Numeric defaults match the documented values
    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.organization, None);
        assert_eq!(config.pat, None);
        assert_eq!(
            config.api_version,
            Some(ParsedProperty::Default("7.2-preview".to_string()))
        );
        assert_eq!(config.timeout_secs, Some(ParsedProperty::Default(60)));
        assert_eq!(config.search_timeout_secs, Some(ParsedProperty::Default(120)));
        assert_eq!(config.max_retries, Some(ParsedProperty::Default(2)));
        assert_eq!(config.max_pages, Some(ParsedProperty::Default(20)));
    }

    /// # Load From Environment
    ///
    /// Tests reading every ADO_* variable.
    ///
    /// ## Test Scenario
    /// - Sets string and numeric environment variables
    /// - Loads the environment layer
    ///
    /// ## Expected Outcome
    /// - Values are parsed and tagged with their variable name
    #[test]
    #[file_serial(env_tests)]
    fn test_load_from_env() {
        clear_env();
        unsafe {
            env::set_var("ADO_ORG", "contoso");
            env::set_var("ADO_PAT", "secret");
            env::set_var("ADO_MAX_PAGES", "5");
            env::set_var("ADO_DOWNLOAD_CONCURRENCY", "8");
        }

        let config = Config::load_from_env();
        clear_env();

        assert_eq!(
            config.organization,
            Some(ParsedProperty::Env(
                "contoso".to_string(),
                "ADO_ORG".to_string()
            ))
        );
        assert_eq!(config.pat.as_ref().map(|p| p.value().as_str()), Some("secret"));
        assert_eq!(
            config.max_pages,
            Some(ParsedProperty::Env(5, "ADO_MAX_PAGES".to_string()))
        );
        assert_eq!(config.download_concurrency.map(|p| p.into_value()), Some(8));
        assert_eq!(config.api_version, None);
    }

    /// # Invalid Numeric Environment Values
    ///
    /// Tests that unparsable numbers are ignored.
    ///
    /// ## Test Scenario
    /// - Sets non-numeric values for numeric variables
    ///
    /// ## Expected Outcome
    /// - Those fields stay unset
    #[test]
    #[file_serial(env_tests)]
    fn test_load_from_env_invalid_numbers() {
        clear_env();
        unsafe {
            env::set_var("ADO_TIMEOUT_SECS", "soon");
            env::set_var("ADO_MAX_RETRIES", "-1");
        }

        let config = Config::load_from_env();
        clear_env();

        assert_eq!(config.timeout_secs, None);
        assert_eq!(config.max_retries, None);
    }

    /// # Merge Precedence
    ///
    /// Tests that later layers win.
    ///
    /// ## Test Scenario
    /// - Merges defaults, an env layer and a CLI layer
    ///
    /// ## Expected Outcome
    /// - CLI beats env, env beats defaults, unset fields fall through
    #[test]
    fn test_merge_precedence() {
        let env_layer = Config {
            organization: Some(ParsedProperty::Env(
                "env-org".to_string(),
                "ADO_ORG".to_string(),
            )),
            max_retries: Some(ParsedProperty::Env(5, "ADO_MAX_RETRIES".to_string())),
            ..Config::empty()
        };
        let cli_layer = Config {
            organization: Some(ParsedProperty::Cli(
                "cli-org".to_string(),
                "--org".to_string(),
            )),
            ..Config::empty()
        };

        let merged = Config::default().merge(env_layer).merge(cli_layer);

        assert_eq!(merged.organization.as_ref().map(|o| o.source_name()), Some("cli"));
        assert_eq!(merged.organization.unwrap().into_value(), "cli-org");
        assert_eq!(merged.max_retries.map(|r| r.into_value()), Some(5));
        assert_eq!(merged.max_pages.map(|r| r.into_value()), Some(20));
    }

    /// # Resolve Settings
    ///
    /// Tests resolving a merged config into settings.
    ///
    /// ## Test Scenario
    /// - Resolves a config with organization and PAT set
    ///
    /// ## Expected Outcome
    /// - Defaults fill the remaining fields
    /// - PAT is wrapped as a secret
    #[test]
    fn test_resolve_settings() {
        let config = Config {
            organization: Some(ParsedProperty::Cli(
                "contoso".to_string(),
                "--org".to_string(),
            )),
            pat: Some(ParsedProperty::Env("pat".to_string(), "ADO_PAT".to_string())),
            ..Config::default()
        };

        let settings = config.resolve().unwrap();
        assert_eq!(settings.organization, "contoso");
        assert_eq!(settings.pat.unwrap().expose_secret(), "pat");
        assert_eq!(settings.api_version, "7.2-preview");
        assert_eq!(settings.timeout, Duration::from_secs(60));
        assert_eq!(settings.search_timeout, Duration::from_secs(120));
        assert_eq!(settings.retry_backoff, Duration::from_secs(2));
        assert_eq!(settings.download_concurrency, 4);
    }

    /// # Resolve Without Organization
    ///
    /// Tests that the organization is mandatory.
    ///
    /// ## Test Scenario
    /// - Resolves the default config
    ///
    /// ## Expected Outcome
    /// - MissingRequired error naming ADO_ORG
    #[test]
    fn test_resolve_missing_organization() {
        let err = Config::default().resolve().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { .. }));
        assert!(err.to_string().contains("ADO_ORG"));
    }

    /// # Resolve Rejects Zero Limits
    ///
    /// Tests validation of numeric settings.
    ///
    /// ## Test Scenario
    /// - Resolves configs with zero pages and zero timeout
    ///
    /// ## Expected Outcome
    /// - InvalidValue errors are returned
    #[test]
    fn test_resolve_rejects_zero_limits() {
        let org = || Some(ParsedProperty::Default("contoso".to_string()));

        let zero_pages = Config {
            organization: org(),
            max_pages: Some(ParsedProperty::Default(0)),
            ..Config::default()
        };
        assert!(matches!(
            zero_pages.resolve(),
            Err(ConfigError::InvalidValue { .. })
        ));

        let zero_timeout = Config {
            organization: org(),
            timeout_secs: Some(ParsedProperty::Default(0)),
            ..Config::default()
        };
        assert!(matches!(
            zero_timeout.resolve(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    /// # Load From File
    ///
    /// Tests parsing a TOML config file.
    ///
    /// ## Test Scenario
    /// - Writes a config file with several keys
    /// - Loads it by path
    ///
    /// ## Expected Outcome
    /// - Values are tagged with the file path
    #[test]
    fn test_load_from_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            "organization = \"file-org\"\nmax_pages = 3\napi_version = \"7.1\"\n",
        )
        .unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(
            config.organization,
            Some(ParsedProperty::File("file-org".to_string(), path.clone()))
        );
        assert_eq!(config.max_pages, Some(ParsedProperty::File(3, path.clone())));
        assert_eq!(config.api_version.map(|v| v.into_value()), Some("7.1".to_string()));
        assert_eq!(config.timeout_secs, None);
    }

    /// # Missing And Invalid Files
    ///
    /// Tests file edge cases.
    ///
    /// ## Test Scenario
    /// - Loads a path that does not exist
    /// - Loads a file with an unknown key
    ///
    /// ## Expected Outcome
    /// - Missing file gives an empty layer
    /// - Invalid file is an error mentioning the path
    #[test]
    fn test_load_from_path_edge_cases() {
        let temp_dir = TempDir::new().unwrap();
        let missing = Config::load_from_path(&temp_dir.path().join("none.toml")).unwrap();
        assert_eq!(missing, Config::empty());

        let bad = temp_dir.path().join("bad.toml");
        fs::write(&bad, "project = \"nope\"\n").unwrap();
        let err = Config::load_from_path(&bad).unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }

    /// # Config Path Honours XDG_CONFIG_HOME
    ///
    /// Tests the config file location.
    ///
    /// ## Test Scenario
    /// - Points XDG_CONFIG_HOME at a temp dir
    ///
    /// ## Expected Outcome
    /// - Path is `<dir>/ado-cli/config.toml`
    #[test]
    #[file_serial(env_tests)]
    fn test_config_path_uses_xdg_config_home() {
        let temp_dir = TempDir::new().unwrap();
        let result = with_xdg_config_home(temp_dir.path(), Config::config_path);

        assert_eq!(
            result.unwrap(),
            temp_dir.path().join("ado-cli").join("config.toml")
        );
    }

    /// # Create Sample Config
    ///
    /// Tests writing the sample file and that it parses back.
    ///
    /// ## Test Scenario
    /// - Creates the sample in a temp XDG dir
    /// - Calls create again after editing the file
    ///
    /// ## Expected Outcome
    /// - The sample is valid config
    /// - An existing file is never overwritten
    #[test]
    #[file_serial(env_tests)]
    fn test_create_sample_config() {
        let temp_dir = TempDir::new().unwrap();
        let (first, second) = with_xdg_config_home(temp_dir.path(), || {
            let first = Config::create_sample_config();
            if let Ok(path) = &first {
                fs::write(path, "organization = \"mine\"\n").unwrap();
            }
            (first, Config::create_sample_config())
        });

        let path = first.unwrap();
        assert_eq!(second.unwrap(), path);
        assert_eq!(fs::read_to_string(&path).unwrap(), "organization = \"mine\"\n");
    }

    /// # Sample Config Parses
    ///
    /// Tests that the shipped sample is accepted by the loader.
    ///
    /// ## Test Scenario
    /// - Creates the sample, then loads it
    ///
    /// ## Expected Outcome
    /// - Loading succeeds and yields the documented defaults
    #[test]
    #[file_serial(env_tests)]
    fn test_sample_config_parses() {
        let temp_dir = TempDir::new().unwrap();
        let loaded = with_xdg_config_home(temp_dir.path(), || {
            Config::create_sample_config().and_then(|p| Config::load_from_path(&p))
        });

        let config = loaded.unwrap();
        assert_eq!(config.organization, None);
        assert_eq!(config.max_pages.map(|p| p.into_value()), Some(20));
        assert_eq!(config.search_timeout_secs.map(|p| p.into_value()), Some(120));
    }
}
