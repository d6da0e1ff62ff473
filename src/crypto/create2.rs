//! Safe CREATE2 address computation.
//!
//! Matches SafeProxyFactory.createProxyWithNonce:
//!   salt = keccak256(abi.encodePacked(keccak256(initializer), saltNonce))
//!   address = CREATE2(factory, salt, keccak256(deploymentData))[12:32]
//!   deploymentData = abi.encodePacked(proxyCreationCode, uint256(uint160(singleton)))

use crate::crypto::keccak256;

/// Generic EIP-1014 address.
/// Preimage: 0xff (1) || deployer (20) || salt (32) || init_code_hash (32) = 85 bytes.
/// Address = keccak256(preimage)[12..32].
pub fn create2_address(deployer: &[u8; 20], salt: &[u8; 32], init_code_hash: &[u8; 32]) -> [u8; 20] {
    let mut preimage = [0u8; 85];
    preimage[0] = 0xff;
    preimage[1..21].copy_from_slice(deployer);
    preimage[21..53].copy_from_slice(salt);
    preimage[53..85].copy_from_slice(init_code_hash);

    let hash = keccak256(&preimage);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..32]);
    addr
}

/// Computes the CREATE2 salt used by Safe: keccak256(initializer_hash || salt_nonce).
/// Both inputs 32 bytes; output 32 bytes.
#[inline]
pub fn safe_salt(initializer_hash: &[u8; 32], salt_nonce: &[u8; 32]) -> [u8; 32] {
    let mut preimage = [0u8; 64];
    preimage[0..32].copy_from_slice(initializer_hash);
    preimage[32..64].copy_from_slice(salt_nonce);
    keccak256(&preimage)
}

/// Computes the Safe proxy address deployed by `factory`.
#[inline]
pub fn safe_address(factory: &[u8; 20], init_code_hash: &[u8; 32], salt: &[u8; 32]) -> [u8; 20] {
    create2_address(factory, salt, init_code_hash)
}

/// keccak256(creationCode || uint256(singleton)), the init code hash of a proxy
/// pointing at `singleton`.
pub fn proxy_init_code_hash(creation_code: &[u8], singleton: &[u8; 20]) -> [u8; 32] {
    let mut data = Vec::with_capacity(creation_code.len() + 32);
    data.extend_from_slice(creation_code);
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(singleton);
    keccak256(&data)
}
