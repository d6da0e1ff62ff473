//! `SafeProxyFactory.createProxyWithNonce` calldata.
//!
//! A deployment transaction replayed verbatim against the same factory on
//! another chain lands on the same proxy address, which is how a Safe is
//! cloned across chains.

use alloy_sol_types::{sol, SolCall};
use serde::{Deserialize, Serialize};

use crate::crypto::{keccak256, Address, SaltNonce};
use crate::error::Result;

use super::setup::SafeSetup;

sol! {
    interface ISafeProxyFactory {
        function createProxyWithNonce(address _singleton, bytes initializer, uint256 saltNonce)
            external
            returns (address proxy);
    }
}

/// `bytes4(keccak256("createProxyWithNonce(address,bytes,uint256)"))`
pub const CREATE_PROXY_SELECTOR: [u8; 4] = ISafeProxyFactory::createProxyWithNonceCall::SELECTOR;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProxyCall {
    pub singleton: Address,
    #[serde(with = "super::setup::hex_bytes")]
    pub initializer: Vec<u8>,
    pub salt_nonce: SaltNonce,
}

impl CreateProxyCall {
    pub fn new(singleton: Address, setup: &SafeSetup, salt_nonce: SaltNonce) -> Self {
        Self {
            singleton,
            initializer: setup.encode(),
            salt_nonce,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        ISafeProxyFactory::createProxyWithNonceCall {
            _singleton: self.singleton.into(),
            initializer: self.initializer.clone().into(),
            saltNonce: self.salt_nonce.to_u256(),
        }
        .abi_encode()
    }

    pub fn decode(calldata: &[u8]) -> Result<Self> {
        let args = super::strip_selector(calldata, CREATE_PROXY_SELECTOR)?;
        let call = ISafeProxyFactory::createProxyWithNonceCall::abi_decode_raw(args)?;
        Ok(Self {
            singleton: call._singleton.into(),
            initializer: call.initializer.to_vec(),
            salt_nonce: SaltNonce::from_u256(call.saltNonce),
        })
    }

    /// The embedded `setup` call.
    pub fn setup(&self) -> Result<SafeSetup> {
        SafeSetup::decode(&self.initializer)
    }

    pub fn initializer_hash(&self) -> [u8; 32] {
        keccak256(&self.initializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn sample_setup() -> SafeSetup {
        SafeSetup::new(
            vec![
                "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".parse().unwrap(),
                "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359".parse().unwrap(),
            ],
            1,
            "0xf48f2B2d2a534e402487b3ee7C18c33Aec0Fe5e4".parse().unwrap(),
        )
    }

    #[test]
    fn test_selector_matches_signature() {
        let hash = keccak256(b"createProxyWithNonce(address,bytes,uint256)");
        assert_eq!(&hash[..4], &CREATE_PROXY_SELECTOR);
    }

    #[test]
    fn test_decode_reverses_encode() {
        let singleton: Address = "0x3E5c63644E683549055b9Be8653de26E0B4CD36E".parse().unwrap();
        let call = CreateProxyCall::new(singleton, &sample_setup(), SaltNonce::from_u64(1337));
        let encoded = call.encode();

        let decoded = CreateProxyCall::decode(&encoded).unwrap();
        assert_eq!(decoded, call);
        assert_eq!(decoded.setup().unwrap(), sample_setup());
        assert_eq!(decoded.initializer_hash(), sample_setup().initializer_hash());
    }

    #[test]
    fn test_rejects_setup_calldata() {
        let err = CreateProxyCall::decode(&sample_setup().encode()).unwrap_err();
        assert!(matches!(err, Error::SelectorMismatch { .. }));
    }

    #[test]
    fn test_salt_nonce_word_is_big_endian() {
        let singleton: Address = "0x3E5c63644E683549055b9Be8653de26E0B4CD36E".parse().unwrap();
        let nonce: SaltNonce = "0x0102".parse().unwrap();
        let encoded = CreateProxyCall::new(singleton, &sample_setup(), nonce).encode();
        // selector, singleton, initializer offset, then the nonce word
        let word = &encoded[4 + 64..4 + 96];
        assert_eq!(&word[..30], &[0u8; 30]);
        assert_eq!(&word[30..], &[0x01, 0x02]);
        assert_eq!(&encoded[4 + 32..4 + 64], &{
            let mut offset = [0u8; 32];
            offset[31] = 0x60;
            offset
        });
    }
}
