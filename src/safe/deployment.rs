//! Canonical factory/singleton pairs and address prediction.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::address;
use serde::{Deserialize, Deserializer, Serialize};

use crate::crypto::{proxy_init_code_hash, safe_address, safe_salt, Address, SaltNonce};
use crate::worker::SearchTarget;

use super::factory::CreateProxyCall;
use super::setup::SafeSetup;

const V130_FACTORY: Address = Address(address!("a6B71E26C5e0845f74c812102Ca7114b6a896AB2").0 .0);
const V130_SINGLETON: Address = Address(address!("d9Db270c1B5E3Bd161E8c8503c55cEABeE709552").0 .0);
const V130_SINGLETON_L2: Address = Address(address!("3E5c63644E683549055b9Be8653de26E0B4CD36E").0 .0);
const V130_FALLBACK: Address = Address(address!("f48f2B2d2a534e402487b3ee7C18c33Aec0Fe5e4").0 .0);

const V141_FACTORY: Address = Address(address!("4e1DCf7AD4e460CfD30791CCC4F9c8a4f820ec67").0 .0);
const V141_SINGLETON: Address = Address(address!("41675C099F32341bf84BFc5382aF534df5C7461a").0 .0);
const V141_SINGLETON_L2: Address = Address(address!("29fcB43b46531BcA003ddC8FCB67FFE91900C762").0 .0);
const V141_FALLBACK: Address = Address(address!("fd0732Dc9E303f09fCEf3a7388Ad10A83459Ec99").0 .0);

/// `GnosisSafeProxyFactory.proxyCreationCode()` at the v1.3.0 factory
/// (GnosisSafeProxy, solc 0.7.6).
const V130_PROXY_CREATION_CODE: [u8; 486] = alloy_primitives::hex!(
    "608060405234801561001057600080fd5b506040516101e63803806101e6833981810160405260208110156100335760"
    "0080fd5b8101908080519060200190929190505050600073ffffffffffffffffffffffffffffffffffffffff168173ff"
    "ffffffffffffffffffffffffffffffffffffff1614156100ca576040517f08c379a00000000000000000000000000000"
    "000000000000000000000000000081526004018080602001828103825260228152602001806101c46022913960400191"
    "505060405180910390fd5b806000806101000a81548173ffffffffffffffffffffffffffffffffffffffff0219169083"
    "73ffffffffffffffffffffffffffffffffffffffff1602179055505060ab806101196000396000f3fe608060405273ff"
    "ffffffffffffffffffffffffffffffffffffff600054167fa619486e0000000000000000000000000000000000000000"
    "000000000000000060003514156050578060005260206000f35b3660008037600080366000845af43d6000803e600081"
    "14156070573d6000fd5b3d6000f3fea2646970667358221220d1429297349653a4918076d650332de1a1068c5f3e07c5"
    "c82360c277770b955264736f6c63430007060033496e76616c69642073696e676c65746f6e2061646472657373207072"
    "6f7669646564"
);

/// Safe releases deployed at the same address on every supported chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentVersion {
    V130,
    #[default]
    V130L2,
    V141,
    V141L2,
}

impl DeploymentVersion {
    pub const ALL: [DeploymentVersion; 4] = [Self::V130, Self::V130L2, Self::V141, Self::V141L2];

    pub fn factory(self) -> Address {
        match self {
            Self::V130 | Self::V130L2 => V130_FACTORY,
            Self::V141 | Self::V141L2 => V141_FACTORY,
        }
    }

    pub fn singleton(self) -> Address {
        match self {
            Self::V130 => V130_SINGLETON,
            Self::V130L2 => V130_SINGLETON_L2,
            Self::V141 => V141_SINGLETON,
            Self::V141L2 => V141_SINGLETON_L2,
        }
    }

    /// CompatibilityFallbackHandler shipped with the release.
    pub fn fallback_handler(self) -> Address {
        match self {
            Self::V130 | Self::V130L2 => V130_FALLBACK,
            Self::V141 | Self::V141L2 => V141_FALLBACK,
        }
    }

    /// Release whose singleton (L1 or L2) is `singleton`.
    pub fn from_singleton(singleton: Address) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.singleton() == singleton)
    }

    /// Bundled `proxyCreationCode()` of the release's factory, if known.
    pub fn proxy_creation_code(self) -> Option<&'static [u8]> {
        match self {
            Self::V130 | Self::V130L2 => Some(&V130_PROXY_CREATION_CODE),
            Self::V141 | Self::V141L2 => None,
        }
    }

    /// Deployment from the preset addresses and the bundled creation code.
    pub fn deployment(self) -> Option<SafeDeployment> {
        self.proxy_creation_code()
            .map(|code| SafeDeployment::from_creation_code(self.factory(), self.singleton(), code))
    }
}

impl FromStr for DeploymentVersion {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().trim_start_matches('v') {
            "1.3.0" => Ok(Self::V130),
            "1.3.0-l2" | "1.3.0l2" => Ok(Self::V130L2),
            "1.4.1" => Ok(Self::V141),
            "1.4.1-l2" | "1.4.1l2" => Ok(Self::V141L2),
            _ => Err(format!(
                "Unknown Safe version: {s} (expected one of v1.3.0, v1.3.0-l2, v1.4.1, v1.4.1-l2)"
            )),
        }
    }
}

impl Serialize for DeploymentVersion {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DeploymentVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for DeploymentVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V130 => write!(f, "v1.3.0"),
            Self::V130L2 => write!(f, "v1.3.0-l2"),
            Self::V141 => write!(f, "v1.4.1"),
            Self::V141L2 => write!(f, "v1.4.1-l2"),
        }
    }
}

/// A factory/singleton pair plus the proxy init code hash it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeDeployment {
    pub factory: Address,
    pub singleton: Address,
    #[serde(serialize_with = "serialize_hash")]
    pub init_code_hash: [u8; 32],
}

impl SafeDeployment {
    /// `creation_code` is what `SafeProxyFactory.proxyCreationCode()` returns.
    pub fn from_creation_code(factory: Address, singleton: Address, creation_code: &[u8]) -> Self {
        Self {
            factory,
            singleton,
            init_code_hash: proxy_init_code_hash(creation_code, singleton.as_bytes()),
        }
    }

    pub fn with_init_code_hash(factory: Address, singleton: Address, init_code_hash: [u8; 32]) -> Self {
        Self {
            factory,
            singleton,
            init_code_hash,
        }
    }

    pub fn predict(&self, setup: &SafeSetup, salt_nonce: &SaltNonce) -> Address {
        self.predict_with_hash(&setup.initializer_hash(), salt_nonce)
    }

    pub fn predict_with_hash(&self, initializer_hash: &[u8; 32], salt_nonce: &SaltNonce) -> Address {
        let salt = safe_salt(initializer_hash, salt_nonce.as_bytes());
        Address(safe_address(
            self.factory.as_bytes(),
            &self.init_code_hash,
            &salt,
        ))
    }

    /// Calldata to send to `factory` to deploy the predicted proxy.
    pub fn create_proxy_call(&self, setup: &SafeSetup, salt_nonce: SaltNonce) -> CreateProxyCall {
        CreateProxyCall::new(self.singleton, setup, salt_nonce)
    }

    pub fn search_target(&self, setup: &SafeSetup) -> SearchTarget {
        SearchTarget {
            factory: self.factory.0,
            init_code_hash: self.init_code_hash,
            initializer_hash: setup.initializer_hash(),
        }
    }
}

fn serialize_hash<S: serde::Serializer>(hash: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("0x{}", hex::encode(hash)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{create2_address, keccak256};

    #[test]
    fn test_preset_addresses() {
        assert_eq!(
            DeploymentVersion::V130L2.factory().to_checksum(),
            "0xa6B71E26C5e0845f74c812102Ca7114b6a896AB2"
        );
        assert_eq!(
            DeploymentVersion::V141.singleton().to_checksum(),
            "0x41675C099F32341bf84BFc5382aF534df5C7461a"
        );
        for v in DeploymentVersion::ALL {
            assert_eq!(v.to_string().parse::<DeploymentVersion>().unwrap(), v);
            assert!(!v.fallback_handler().is_zero());
        }
        assert!("2.0.0".parse::<DeploymentVersion>().is_err());
        assert_eq!(
            DeploymentVersion::from_singleton(V141_SINGLETON_L2),
            Some(DeploymentVersion::V141L2)
        );
        assert_eq!(DeploymentVersion::from_singleton(V130_FACTORY), None);
    }

    #[test]
    fn test_serde_goes_through_from_str() {
        let v: DeploymentVersion = serde_json::from_str("\"1.3.0\"").unwrap();
        assert_eq!(v, DeploymentVersion::V130);
        let v: DeploymentVersion = serde_json::from_str("\"V1.4.1L2\"").unwrap();
        assert_eq!(v, DeploymentVersion::V141L2);
        assert_eq!(serde_json::to_string(&v).unwrap(), "\"v1.4.1-l2\"");
        assert!(serde_json::from_str::<DeploymentVersion>("\"1.5.0\"").is_err());
    }

    #[test]
    fn test_bundled_creation_code() {
        let code = DeploymentVersion::V130.proxy_creation_code().unwrap();
        // constructor reads its argument from offset 0x1e6, i.e. the code length
        assert_eq!(code.len(), 0x1e6);
        assert_eq!(&code[0x119..0x11e], &[0x60, 0x80, 0x60, 0x40, 0x52]);
        assert!(code.ends_with(b"Invalid singleton address provided"));

        let deployment = DeploymentVersion::V130L2.deployment().unwrap();
        assert_eq!(deployment.factory, V130_FACTORY);
        assert_eq!(deployment.singleton, V130_SINGLETON_L2);
        assert_eq!(
            deployment.init_code_hash,
            proxy_init_code_hash(code, V130_SINGLETON_L2.as_bytes())
        );
        // the L1 and L2 singletons share the proxy code but not the init code hash
        assert_ne!(
            DeploymentVersion::V130.deployment().unwrap().init_code_hash,
            deployment.init_code_hash
        );
        assert!(DeploymentVersion::V141.deployment().is_none());
    }

    #[test]
    fn test_predict_matches_create2() {
        let v = DeploymentVersion::V130L2;
        let code = [0x60u8, 0x80, 0x60, 0x40, 0x52];
        let deployment = SafeDeployment::from_creation_code(v.factory(), v.singleton(), &code);
        let setup = SafeSetup::new(
            vec!["0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".parse().unwrap()],
            1,
            v.fallback_handler(),
        );
        let nonce = SaltNonce::from_u64(7);

        let mut deployment_data = code.to_vec();
        deployment_data.extend_from_slice(&[0u8; 12]);
        deployment_data.extend_from_slice(v.singleton().as_bytes());
        let mut salt_preimage = keccak256(&setup.encode()).to_vec();
        salt_preimage.extend_from_slice(nonce.as_bytes());
        let expected = create2_address(
            v.factory().as_bytes(),
            &keccak256(&salt_preimage),
            &keccak256(&deployment_data),
        );

        assert_eq!(deployment.predict(&setup, &nonce), Address(expected));
    }

    #[test]
    fn test_create_proxy_call_carries_singleton() {
        let v = DeploymentVersion::V141;
        let deployment = SafeDeployment::with_init_code_hash(v.factory(), v.singleton(), [9u8; 32]);
        let setup = SafeSetup::new(
            vec!["0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".parse().unwrap()],
            1,
            v.fallback_handler(),
        );
        let call = deployment.create_proxy_call(&setup, SaltNonce::from_u64(3));
        assert_eq!(call.singleton, v.singleton());
        assert_eq!(call.setup().unwrap(), setup);
        let target = deployment.search_target(&setup);
        assert_eq!(target.initializer_hash, setup.initializer_hash());
    }
}
