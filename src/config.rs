use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use config::{Config, File};
use serde::Deserialize;
use url::Url;

use crate::provider::DEFAULT_BASE_URL;

const DEFAULT_CONFIG_PATH: &str = "settings.yml";
const APP_PORT_ENV: &str = "APP_PORT";
const DATABASE_URL_ENV: &str = "DATABASE_URL";
const CACHE_BACKEND_ENV: &str = "CACHE_BACKEND";
const API_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";

pub struct Settings {
    pub port: u16,
    pub cache: CacheSettings,
    pub provider: ProviderSettings,
    pub coalesce_misses: bool,
    pub diag_interval: Duration,
}

pub enum CacheSettings {
    Memory { max_capacity: u64 },
    Postgres { database_url: Url },
}

pub struct ProviderSettings {
    pub api_key: String,
    pub base_url: Url,
    pub language: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    Postgres,
}

#[derive(Deserialize)]
#[serde(default)]
struct FileConfig {
    app_port: u16,
    cache_backend: Option<CacheBackend>,
    memory_cache_capacity: u64,
    db_name: Option<String>,
    db_host: String,
    db_port: u16,
    db_user: Option<String>,
    db_pass: Option<String>,
    google_maps_api_key: Option<String>,
    provider_base_url: String,
    provider_language: Option<String>,
    provider_timeout_secs: u64,
    coalesce_misses: bool,
    diag_interval_secs: u64,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            app_port: 3000,
            cache_backend: None,
            memory_cache_capacity: 100_000,
            db_name: None,
            db_host: "localhost".to_string(),
            db_port: 5432,
            db_user: None,
            db_pass: None,
            google_maps_api_key: None,
            provider_base_url: DEFAULT_BASE_URL.to_string(),
            provider_language: Some("ja".to_string()),
            provider_timeout_secs: 10,
            coalesce_misses: false,
            diag_interval_secs: 300,
        }
    }
}

impl FileConfig {
    fn database_url(&self) -> Result<Option<Url>> {
        let (Some(name), Some(user)) = (&self.db_name, &self.db_user) else {
            return Ok(None);
        };
        let url_str = format!(
            "postgres://{}:{}@{}:{}/{}",
            user,
            self.db_pass.as_deref().unwrap_or_default(),
            self.db_host,
            self.db_port,
            name
        );
        Ok(Some(Url::parse(&url_str)?))
    }
}

struct EnvOverrides {
    port: Option<u16>,
    database_url: Option<Url>,
    cache_backend: Option<CacheBackend>,
    api_key: Option<String>,
}

fn load_file_config<S>(source: S) -> Result<FileConfig>
where
    S: config::Source + Send + Sync + 'static,
{
    let settings = Config::builder()
        .add_source(source)
        .build()
        .map_err(|e| anyhow!("Failed to read config file: {e}"))?;

    settings
        .try_deserialize::<FileConfig>()
        .map_err(|e| anyhow!("Failed to deserialize config file: {e}"))
}

/// Try to parse env variable. If it's not set, return None. If it's invalid, treat it as an error.
fn try_from_env<T, F>(env_var: &str, f: F) -> Result<Option<T>>
where
    F: FnOnce(String) -> Result<T>,
{
    match std::env::var(env_var) {
        Ok(raw) => {
            let val = f(raw).map_err(|_| anyhow!("Failed to parse {}", env_var))?;
            Ok(Some(val))
        }
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(_) => bail!("Could not read {env_var} from env"),
    }
}

fn parse_backend(raw: &str) -> Result<CacheBackend> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "memory" => Ok(CacheBackend::Memory),
        "postgres" => Ok(CacheBackend::Postgres),
        other => bail!("unknown cache backend `{other}`"),
    }
}

fn read_env() -> Result<EnvOverrides> {
    Ok(EnvOverrides {
        port: try_from_env(APP_PORT_ENV, |env_str| {
            env_str.parse::<u16>().map_err(|e| e.into())
        })?,
        database_url: try_from_env(DATABASE_URL_ENV, |env_str| {
            Url::parse(&env_str).map_err(|e| e.into())
        })?,
        cache_backend: try_from_env(CACHE_BACKEND_ENV, |env_str| parse_backend(&env_str))?,
        api_key: try_from_env(API_KEY_ENV, Ok)?,
    })
}

fn resolve(env: EnvOverrides, file: FileConfig) -> Result<Settings> {
    let port = env.port.unwrap_or(file.app_port);

    let database_url = match env.database_url {
        Some(url) => Some(url),
        None => file.database_url()?,
    };

    let backend = env.cache_backend.or(file.cache_backend).unwrap_or(
        if database_url.is_some() {
            CacheBackend::Postgres
        } else {
            CacheBackend::Memory
        },
    );

    let cache = match backend {
        CacheBackend::Memory => CacheSettings::Memory {
            max_capacity: file.memory_cache_capacity,
        },
        CacheBackend::Postgres => CacheSettings::Postgres {
            database_url: database_url.ok_or_else(|| {
                anyhow!("postgres cache selected but {DATABASE_URL_ENV} is not set")
            })?,
        },
    };

    let api_key = env
        .api_key
        .or(file.google_maps_api_key)
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| anyhow!("{API_KEY_ENV} is not set"))?;

    let provider = ProviderSettings {
        api_key,
        base_url: Url::parse(&file.provider_base_url)?,
        language: file.provider_language.filter(|l| !l.is_empty()),
        timeout: Duration::from_secs(file.provider_timeout_secs),
    };

    if file.diag_interval_secs == 0 {
        bail!("diag_interval_secs must be greater than zero");
    }

    Ok(Settings {
        port,
        cache,
        provider,
        coalesce_misses: file.coalesce_misses,
        diag_interval: Duration::from_secs(file.diag_interval_secs),
    })
}

/// Load configuration from env with fallback to the optional default config file.
pub fn load() -> Result<Settings> {
    let env = read_env()?;

    let file = load_file_config(File::with_name(DEFAULT_CONFIG_PATH).required(false))?;
    if env.port.is_none() {
        tracing::warn!("{APP_PORT_ENV} is not set, using value from {DEFAULT_CONFIG_PATH}");
    }

    resolve(env, file)
}

/// Only what the migrate binary needs
pub fn load_database_url() -> Result<Url> {
    let env = read_env()?;
    if let Some(url) = env.database_url {
        return Ok(url);
    }

    let file = load_file_config(File::with_name(DEFAULT_CONFIG_PATH).required(false))?;
    tracing::warn!("{DATABASE_URL_ENV} is not set, using value from {DEFAULT_CONFIG_PATH}");
    file.database_url()?
        .ok_or_else(|| anyhow!("{DATABASE_URL_ENV} is not set and no database is configured"))
}
