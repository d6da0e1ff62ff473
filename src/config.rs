//! Command-line and settings-file configuration.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use crate::crypto::{Address, SaltNonce};
use crate::error::Result;
use crate::matcher::{Pattern, PatternType};
use crate::safe::{DeploymentVersion, SafeDeployment, SafeSetup};

/// Safe deployment toolkit
///
/// Predicts CREATE2 addresses of Safe proxies, mines salt nonces for vanity
/// addresses, and encodes/decodes the `setup` initializer and factory calldata.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// JSON settings file supplying defaults (owners, threshold, deployment)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Print machine-readable JSON on stdout
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Mine salt nonces until the Safe address matches a pattern
    Mine(MineArgs),
    /// Predict the Safe address for a given salt nonce
    Predict(PredictArgs),
    /// Print the `setup` initializer for owners and threshold
    Encode(EncodeArgs),
    /// Decode `setup` or `createProxyWithNonce` calldata
    Decode(DecodeArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct SetupArgs {
    /// Owner address (repeat or comma-separate)
    #[arg(short, long = "owner", value_delimiter = ',')]
    pub owners: Vec<Address>,

    /// Required confirmations
    #[arg(short, long)]
    pub threshold: Option<u64>,

    /// Fallback handler (default: the release's CompatibilityFallbackHandler)
    #[arg(long)]
    pub fallback_handler: Option<Address>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct DeploymentArgs {
    /// Safe release: v1.3.0, v1.3.0-l2, v1.4.1, v1.4.1-l2
    #[arg(long = "safe-version")]
    pub version: Option<DeploymentVersion>,

    /// SafeProxyFactory address (overrides the release preset)
    #[arg(long)]
    pub factory: Option<Address>,

    /// Safe singleton address (overrides the release preset)
    #[arg(long)]
    pub singleton: Option<Address>,

    /// Hex output of SafeProxyFactory.proxyCreationCode()
    #[arg(long, conflicts_with = "proxy_creation_code_file")]
    pub proxy_creation_code: Option<String>,

    /// File holding the hex proxy creation code
    #[arg(long)]
    pub proxy_creation_code_file: Option<PathBuf>,

    /// keccak256(creationCode || singleton), 32 bytes hex; skips creation code
    #[arg(long)]
    pub init_code_hash: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct MineArgs {
    #[command(flatten)]
    pub setup: SetupArgs,

    #[command(flatten)]
    pub deployment: DeploymentArgs,

    /// Address must start with this (hex characters only: 0-9, a-f)
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Address must end with this
    #[arg(short, long)]
    pub suffix: Option<String>,

    /// Address must contain this anywhere
    #[arg(long, conflicts_with_all = ["prefix", "suffix"])]
    pub contains: Option<String>,

    /// Match the EIP-55 checksum casing of the pattern
    #[arg(short = 'c', long, default_value = "false")]
    pub case_sensitive: bool,

    /// Initial salt nonce (decimal or 0x hex); random when omitted
    #[arg(long)]
    pub seed: Option<SaltNonce>,

    /// Number of worker threads (default: number of CPU cores)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Stop after finding N addresses (0 = run forever)
    #[arg(short = 'n', long, default_value = "1")]
    pub count: usize,

    /// Progress report interval in seconds
    #[arg(short = 'r', long, default_value = "5")]
    pub report_interval: u64,
}

#[derive(Args, Debug, Clone)]
pub struct PredictArgs {
    #[command(flatten)]
    pub setup: SetupArgs,

    #[command(flatten)]
    pub deployment: DeploymentArgs,

    /// Salt nonce (decimal or 0x hex)
    #[arg(long)]
    pub salt_nonce: SaltNonce,
}

#[derive(Args, Debug, Clone)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub setup: SetupArgs,

    /// Release whose fallback handler is used by default
    #[arg(long = "safe-version")]
    pub version: Option<DeploymentVersion>,
}

#[derive(Args, Debug, Clone)]
pub struct DecodeArgs {
    /// Hex calldata (0x optional), or @path to read it from a file
    pub calldata: String,

    /// With factory calldata and a creation code / init code hash, also
    /// predict the deployed address
    #[command(flatten)]
    pub deployment: DeploymentArgs,
}

/// Defaults loaded from `--settings`. Command-line flags take precedence.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct Settings {
    pub owners: Vec<Address>,
    pub threshold: Option<u64>,
    pub fallback_handler: Option<Address>,
    pub safe_version: Option<DeploymentVersion>,
    pub factory: Option<Address>,
    pub singleton: Option<Address>,
    pub proxy_creation_code: Option<String>,
    pub init_code_hash: Option<String>,
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Settings from `path`, or defaults when no file was given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }
}

impl SetupArgs {
    pub fn resolve(&self, settings: &Settings, version: DeploymentVersion) -> Result<SafeSetup> {
        let owners = if self.owners.is_empty() {
            settings.owners.clone()
        } else {
            self.owners.clone()
        };
        let threshold = self.threshold.or(settings.threshold).unwrap_or(1);
        let fallback_handler = self
            .fallback_handler
            .or(settings.fallback_handler)
            .unwrap_or_else(|| version.fallback_handler());

        let setup = SafeSetup::new(owners, threshold, fallback_handler);
        setup.validate()?;
        Ok(setup)
    }
}

impl DeploymentArgs {
    pub fn version(&self, settings: &Settings) -> DeploymentVersion {
        self.version.or(settings.safe_version).unwrap_or_default()
    }

    /// Explicit init code hash or creation code wins, then the settings file,
    /// then the creation code bundled with the preset (only while the preset
    /// factory is in use). `None` when none of these is available.
    pub fn resolve(&self, settings: &Settings) -> Result<Option<SafeDeployment>> {
        let version = self.version(settings);
        let factory = self
            .factory
            .or(settings.factory)
            .unwrap_or_else(|| version.factory());
        let singleton = self
            .singleton
            .or(settings.singleton)
            .unwrap_or_else(|| version.singleton());

        if let Some(hash) = &self.init_code_hash {
            let hash = parse_hash(hash, "init_code_hash")?;
            return Ok(Some(SafeDeployment::with_init_code_hash(factory, singleton, hash)));
        }
        if let Some(code) = &self.proxy_creation_code {
            let code = parse_hex_blob(code, "proxy_creation_code")?;
            return Ok(Some(SafeDeployment::from_creation_code(factory, singleton, &code)));
        }
        if let Some(path) = &self.proxy_creation_code_file {
            let code = parse_hex_blob(&fs::read_to_string(path)?, "proxy_creation_code_file")?;
            return Ok(Some(SafeDeployment::from_creation_code(factory, singleton, &code)));
        }
        if let Some(hash) = &settings.init_code_hash {
            let hash = parse_hash(hash, "initCodeHash")?;
            return Ok(Some(SafeDeployment::with_init_code_hash(factory, singleton, hash)));
        }
        if let Some(code) = &settings.proxy_creation_code {
            let code = parse_hex_blob(code, "proxyCreationCode")?;
            return Ok(Some(SafeDeployment::from_creation_code(factory, singleton, &code)));
        }
        if factory != version.factory() {
            return Ok(None);
        }
        Ok(version
            .proxy_creation_code()
            .map(|code| SafeDeployment::from_creation_code(factory, singleton, code)))
    }

    pub fn resolve_required(&self, settings: &Settings) -> Result<SafeDeployment> {
        self.resolve(settings)?.ok_or_else(|| {
            ConfigError::InvalidConfig(format!(
                "no proxy creation code bundled for {} or for a custom factory; \
                 pass --init-code-hash, --proxy-creation-code or --proxy-creation-code-file",
                self.version(settings)
            ))
            .into()
        })
    }
}

impl MineArgs {
    /// Returns the number of workers, defaulting to CPU count.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }

    /// Worker and report options. Pattern text is checked by `pattern()`.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.workers == Some(0) {
            return Err(ConfigError::InvalidConfig("workers must be at least 1".into()));
        }
        if self.report_interval == 0 {
            return Err(ConfigError::InvalidConfig(
                "report interval must be at least 1 second".into(),
            ));
        }
        Ok(())
    }

    pub fn pattern(&self) -> std::result::Result<Pattern, ConfigError> {
        let cs = self.case_sensitive;
        match (&self.prefix, &self.suffix, &self.contains) {
            (Some(prefix), Some(suffix), _) => Pattern::prefix_and_suffix(prefix.as_str(), suffix.as_str(), cs),
            (Some(prefix), None, _) => Pattern::new(prefix.as_str(), PatternType::Prefix, cs),
            (None, Some(suffix), _) => Pattern::new(suffix.as_str(), PatternType::Suffix, cs),
            (None, None, Some(needle)) => Pattern::new(needle.as_str(), PatternType::Contains, cs),
            (None, None, None) => Err(ConfigError::InvalidPattern(
                "one of --prefix, --suffix or --contains is required".into(),
            )),
        }
    }
}

impl DecodeArgs {
    /// Calldata bytes from the argument or the `@file` it names.
    pub fn calldata_bytes(&self) -> Result<Vec<u8>> {
        let text = match self.calldata.strip_prefix('@') {
            Some(path) => fs::read_to_string(path)?,
            None => self.calldata.clone(),
        };
        parse_hex_blob(&text, "calldata")
    }
}

fn parse_hex_blob(text: &str, what: &str) -> Result<Vec<u8>> {
    let text = text.trim();
    let h = text.strip_prefix("0x").unwrap_or(text);
    if h.is_empty() {
        return Err(ConfigError::InvalidConfig(format!("{what} is empty")).into());
    }
    hex::decode(h)
        .map_err(|e| ConfigError::InvalidConfig(format!("{what} is not valid hex: {e}")).into())
}

fn parse_hash(text: &str, what: &str) -> Result<[u8; 32]> {
    let bytes = parse_hex_blob(text, what)?;
    bytes.try_into().map_err(|_| {
        ConfigError::InvalidConfig(format!("{what} must be 32 bytes (64 hex chars)")).into()
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}
