//! # smol_safe
//!
//! Deterministic Safe (Gnosis Safe) deployment toolkit.
//!
//! A Safe proxy created through `SafeProxyFactory.createProxyWithNonce` lands at
//! an address fixed by the factory, the singleton, the `setup` initializer and a
//! salt nonce:
//!
//! - salt = keccak256(keccak256(initializer) || saltNonce)
//! - address = keccak256(0xff || factory || salt || keccak256(creationCode || singleton))[12..32]
//!
//! ## Architecture
//!
//! - `crypto`: Keccak, CREATE2, addresses and 256-bit salt nonces
//! - `safe`: `setup` initializer and factory calldata encoding/decoding, release presets
//! - `matcher`: Prefix/suffix/contains address patterns
//! - `worker`: Multi-threaded salt nonce search
//! - `config`: Command-line arguments and settings file

pub mod config;
pub mod crypto;
pub mod error;
pub mod matcher;
pub mod safe;
pub mod worker;

pub use config::{Cli, Settings};
pub use crypto::{create2_address, safe_address, safe_salt, Address, SaltNonce};
pub use error::{Error, Result};
pub use matcher::{Pattern, PatternType};
pub use safe::{CreateProxyCall, DeploymentVersion, SafeCalldata, SafeDeployment, SafeSetup};
pub use worker::{SearchTarget, Searcher, VanityMatch, WorkerPool};
