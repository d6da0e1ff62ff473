//! Safe setup initializer, factory calldata and deployment presets.

pub mod deployment;
pub mod factory;
pub mod setup;

pub use deployment::{DeploymentVersion, SafeDeployment};
pub use factory::{CreateProxyCall, CREATE_PROXY_SELECTOR};
pub use setup::{SafeSetup, SETUP_SELECTOR};

use crate::error::{Error, Result};

/// Calldata accepted by `decode`: either the bare initializer or the full
/// factory call that embeds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafeCalldata {
    Setup(SafeSetup),
    CreateProxy(CreateProxyCall),
}

impl SafeCalldata {
    /// Dispatches on the 4-byte selector.
    pub fn decode(calldata: &[u8]) -> Result<Self> {
        match calldata.get(..4) {
            Some(sel) if sel == SETUP_SELECTOR => Ok(Self::Setup(SafeSetup::decode(calldata)?)),
            Some(sel) if sel == CREATE_PROXY_SELECTOR => {
                Ok(Self::CreateProxy(CreateProxyCall::decode(calldata)?))
            }
            Some(sel) => Err(Error::Malformed(format!(
                "unknown selector 0x{}, expected setup or createProxyWithNonce",
                hex::encode(sel)
            ))),
            None => Err(Error::Truncated {
                needed: 4,
                available: calldata.len(),
            }),
        }
    }

    /// Hex input with optional 0x and surrounding whitespace.
    pub fn decode_hex(input: &str) -> Result<Self> {
        let input = input.trim();
        let bytes = hex::decode(input.strip_prefix("0x").unwrap_or(input))?;
        Self::decode(&bytes)
    }

    pub fn setup(&self) -> Result<SafeSetup> {
        match self {
            Self::Setup(setup) => Ok(setup.clone()),
            Self::CreateProxy(call) => call.setup(),
        }
    }
}

/// Checks and strips a 4-byte selector.
fn strip_selector(data: &[u8], selector: [u8; 4]) -> Result<&[u8]> {
    match data.split_first_chunk::<4>() {
        Some((sel, args)) if *sel == selector => Ok(args),
        Some((sel, _)) => Err(Error::SelectorMismatch {
            expected: hex::encode(selector),
            actual: hex::encode(sel),
        }),
        None => Err(Error::Truncated {
            needed: 4,
            available: data.len(),
        }),
    }
}
