//! Safe `setup` initializer.
//!
//! ```text
//! setup(address[] _owners, uint256 _threshold, address to, bytes data,
//!       address fallbackHandler, address paymentToken, uint256 payment,
//!       address paymentReceiver)
//! ```

use std::collections::HashSet;

use alloy_primitives::U256;
use alloy_sol_types::{sol, SolCall};
use serde::{Deserialize, Serialize};

use crate::crypto::{keccak256, Address};
use crate::error::{Error, Result};

sol! {
    interface ISafe {
        function setup(
            address[] _owners,
            uint256 _threshold,
            address to,
            bytes data,
            address fallbackHandler,
            address paymentToken,
            uint256 payment,
            address paymentReceiver
        ) external;
    }
}

/// `bytes4(keccak256("setup(address[],uint256,address,bytes,address,address,uint256,address)"))`
pub const SETUP_SELECTOR: [u8; 4] = ISafe::setupCall::SELECTOR;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeSetup {
    pub owners: Vec<Address>,
    pub threshold: u64,
    /// Optional delegate call target run during setup.
    pub to: Address,
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    pub fallback_handler: Address,
    pub payment_token: Address,
    #[serde(with = "decimal_u128")]
    pub payment: u128,
    pub payment_receiver: Address,
}

impl SafeSetup {
    /// Owners and threshold with the fixed handler; no setup call, no payment.
    pub fn new(owners: Vec<Address>, threshold: u64, fallback_handler: Address) -> Self {
        Self {
            owners,
            threshold,
            to: Address::ZERO,
            data: Vec::new(),
            fallback_handler,
            payment_token: Address::ZERO,
            payment: 0,
            payment_receiver: Address::ZERO,
        }
    }

    /// Rules the Safe singleton enforces in `setupOwners`.
    pub fn validate(&self) -> Result<()> {
        if self.owners.is_empty() {
            return Err(Error::InvalidSetup("at least one owner is required".into()));
        }
        let mut seen = HashSet::with_capacity(self.owners.len());
        for owner in &self.owners {
            if owner.is_zero() {
                return Err(Error::InvalidSetup("owner cannot be the zero address".into()));
            }
            if !seen.insert(*owner) {
                return Err(Error::InvalidSetup(format!("duplicate owner {owner}")));
            }
        }
        if self.threshold == 0 {
            return Err(Error::InvalidSetup("threshold must be at least 1".into()));
        }
        if self.threshold > self.owners.len() as u64 {
            return Err(Error::InvalidSetup(format!(
                "threshold {} exceeds owner count {}",
                self.threshold,
                self.owners.len()
            )));
        }
        Ok(())
    }

    /// ABI-encoded calldata including the selector.
    pub fn encode(&self) -> Vec<u8> {
        ISafe::setupCall {
            _owners: self.owners.iter().copied().map(Into::into).collect(),
            _threshold: U256::from(self.threshold),
            to: self.to.into(),
            data: self.data.clone().into(),
            fallbackHandler: self.fallback_handler.into(),
            paymentToken: self.payment_token.into(),
            payment: U256::from(self.payment),
            paymentReceiver: self.payment_receiver.into(),
        }
        .abi_encode()
    }

    /// Decodes `setup` calldata. Dynamic values are located through their
    /// head offsets, so payloads produced by other encoders decode too.
    pub fn decode(calldata: &[u8]) -> Result<Self> {
        let args = super::strip_selector(calldata, SETUP_SELECTOR)?;
        let call = ISafe::setupCall::abi_decode_raw(args)?;
        Ok(Self {
            owners: call._owners.into_iter().map(Into::into).collect(),
            threshold: u64::try_from(call._threshold)
                .map_err(|_| Error::Malformed(format!("threshold {} overflows u64", call._threshold)))?,
            to: call.to.into(),
            data: call.data.to_vec(),
            fallback_handler: call.fallbackHandler.into(),
            payment_token: call.paymentToken.into(),
            payment: u128::try_from(call.payment)
                .map_err(|_| Error::Malformed(format!("payment {} overflows u128", call.payment)))?,
            payment_receiver: call.paymentReceiver.into(),
        })
    }

    pub fn initializer_hash(&self) -> [u8; 32] {
        keccak256(&self.encode())
    }
}

/// `0x`-prefixed hex for byte payloads in JSON output.
pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(serde::de::Error::custom)
    }
}

/// Amounts as decimal strings so JSON readers never round them.
mod decimal_u128 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(n: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&n.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    fn handler() -> Address {
        addr("0xf48f2B2d2a534e402487b3ee7C18c33Aec0Fe5e4")
    }

    #[test]
    fn test_selector_matches_signature() {
        let hash = keccak256(
            b"setup(address[],uint256,address,bytes,address,address,uint256,address)",
        );
        assert_eq!(&hash[..4], &SETUP_SELECTOR);
    }

    #[test]
    fn test_encode_single_owner_layout() {
        let owner = addr("0x0000000000000000000000000000000000000001");
        let setup = SafeSetup::new(vec![owner], 1, handler());
        let expected = [
            "b63e800d",
            "0000000000000000000000000000000000000000000000000000000000000100",
            "0000000000000000000000000000000000000000000000000000000000000001",
            "0000000000000000000000000000000000000000000000000000000000000000",
            "0000000000000000000000000000000000000000000000000000000000000140",
            "000000000000000000000000f48f2b2d2a534e402487b3ee7c18c33aec0fe5e4",
            "0000000000000000000000000000000000000000000000000000000000000000",
            "0000000000000000000000000000000000000000000000000000000000000000",
            "0000000000000000000000000000000000000000000000000000000000000000",
            "0000000000000000000000000000000000000000000000000000000000000001",
            "0000000000000000000000000000000000000000000000000000000000000001",
            "0000000000000000000000000000000000000000000000000000000000000000",
        ]
        .concat();
        assert_eq!(hex::encode(setup.encode()), expected);
    }

    #[test]
    fn test_decode_reverses_encode() {
        let mut setup = SafeSetup::new(
            vec![
                addr("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"),
                addr("0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359"),
                addr("0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB"),
            ],
            2,
            handler(),
        );
        setup.to = addr("0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb");
        setup.data = vec![0xde, 0xad, 0xbe, 0xef, 0x01];
        setup.payment = 42;
        setup.payment_receiver = addr("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");

        let encoded = setup.encode();
        assert_eq!((encoded.len() - 4) % 32, 0);
        assert_eq!(SafeSetup::decode(&encoded).unwrap(), setup);
    }

    #[test]
    fn test_decode_rejects_bad_payloads() {
        let setup = SafeSetup::new(
            vec![addr("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed")],
            1,
            handler(),
        );
        let encoded = setup.encode();

        assert!(matches!(
            SafeSetup::decode(&encoded[..encoded.len() - 40]),
            Err(Error::Abi(_))
        ));

        let mut wrong_selector = encoded.clone();
        wrong_selector[0] = 0;
        assert!(matches!(
            SafeSetup::decode(&wrong_selector),
            Err(Error::SelectorMismatch { .. })
        ));

        // owners offset pointing far outside the payload
        let mut bad_offset = encoded.clone();
        bad_offset[4 + 30] = 0xff;
        assert!(SafeSetup::decode(&bad_offset).is_err());

        assert!(matches!(
            SafeSetup::decode(&SETUP_SELECTOR[..3]),
            Err(Error::Truncated { needed: 4, available: 3 })
        ));
    }

    fn word(n: u64) -> String {
        format!("{n:064x}")
    }

    fn addr_word(a: Address) -> String {
        format!("{:0>64}", a.to_hex())
    }

    #[test]
    fn test_decode_follows_offsets() {
        // `data` tail ahead of the owners array, unlike the canonical layout.
        let owner = addr("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
        let to = addr("0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb");
        let calldata = [
            "b63e800d".to_string(),
            word(0x140),
            word(1),
            addr_word(to),
            word(0x100),
            addr_word(handler()),
            word(0),
            word(7),
            addr_word(owner),
            // data @ 0x100
            word(2),
            format!("{:0<64}", "beef"),
            // owners @ 0x140
            word(1),
            addr_word(owner),
        ]
        .concat();

        let decoded = SafeSetup::decode(&hex::decode(calldata).unwrap()).unwrap();
        assert_eq!(decoded.owners, vec![owner]);
        assert_eq!(decoded.threshold, 1);
        assert_eq!(decoded.to, to);
        assert_eq!(decoded.data, vec![0xbe, 0xef]);
        assert_eq!(decoded.fallback_handler, handler());
        assert_eq!(decoded.payment, 7);
        assert_eq!(decoded.payment_receiver, owner);
    }

    #[test]
    fn test_decode_rejects_oversized_numbers() {
        let setup = SafeSetup::new(
            vec![addr("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed")],
            1,
            handler(),
        );
        let encoded = setup.encode();
        let head = |i: usize| 4 + i * 32;

        // threshold word = 2^64
        let mut threshold = encoded.clone();
        threshold[head(1) + 23] = 1;
        assert!(matches!(SafeSetup::decode(&threshold), Err(Error::Malformed(_))));

        // payment word = 2^128
        let mut payment = encoded.clone();
        payment[head(6) + 15] = 1;
        assert!(matches!(SafeSetup::decode(&payment), Err(Error::Malformed(_))));

        // largest values that still fit
        let mut max = setup.clone();
        max.payment = u128::MAX;
        let mut encoded = max.encode();
        encoded[head(1) + 24..head(2)].fill(0xff);
        let decoded = SafeSetup::decode(&encoded).unwrap();
        assert_eq!(decoded.threshold, u64::MAX);
        assert_eq!(decoded.payment, u128::MAX);
    }

    #[test]
    fn test_validate() {
        let a = addr("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
        let b = addr("0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359");

        assert!(SafeSetup::new(vec![a, b], 2, handler()).validate().is_ok());
        assert!(SafeSetup::new(vec![], 1, handler()).validate().is_err());
        assert!(SafeSetup::new(vec![a], 0, handler()).validate().is_err());
        assert!(SafeSetup::new(vec![a], 2, handler()).validate().is_err());
        assert!(SafeSetup::new(vec![a, a], 1, handler()).validate().is_err());
        assert!(SafeSetup::new(vec![Address::ZERO], 1, handler())
            .validate()
            .is_err());
    }

    #[test]
    fn test_initializer_hash_tracks_owners() {
        let a = addr("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
        let b = addr("0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359");
        let one = SafeSetup::new(vec![a], 1, handler());
        let two = SafeSetup::new(vec![a, b], 1, handler());
        assert_eq!(one.initializer_hash(), keccak256(&one.encode()));
        assert_ne!(one.initializer_hash(), two.initializer_hash());
    }

    #[test]
    fn test_json_shape() {
        let mut setup = SafeSetup::new(
            vec![addr("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed")],
            1,
            handler(),
        );
        setup.payment = u128::MAX;
        setup.data = vec![0xab];
        let value = serde_json::to_value(&setup).unwrap();
        assert_eq!(value["payment"], u128::MAX.to_string());
        assert_eq!(value["data"], "0xab");
        assert_eq!(value["fallbackHandler"], handler().to_checksum());
        let back: SafeSetup = serde_json::from_value(value).unwrap();
        assert_eq!(back, setup);
    }
}
