use anyhow::Result;
use cosmrs::crypto::secp256k1::SigningKey;
use cosmrs::crypto::PublicKey;
use cosmrs::AccountId;
use std::sync::Arc;

/// secp256k1 key used to sign compound transactions.
#[derive(Clone)]
pub struct KeySigner {
    key: Arc<SigningKey>,
    account_id: AccountId,
}

impl KeySigner {
    /// `private_key` is the hex encoded 32 byte secret, with or without `0x`.
    pub fn from_hex(private_key: &str, account_prefix: &str) -> Result<Self> {
        let trimmed = private_key.trim().trim_start_matches("0x");
        let bytes = hex::decode(trimmed).map_err(|e| anyhow::anyhow!("Invalid signer key hex: {}", e))?;
        if bytes.len() != 32 {
            return Err(anyhow::anyhow!(
                "Invalid signer key length: expected 32 bytes, got {}",
                bytes.len()
            ));
        }

        let key = SigningKey::from_slice(&bytes)
            .map_err(|e| anyhow::anyhow!("Failed to create signing key: {}", e))?;
        let account_id = key
            .public_key()
            .account_id(account_prefix)
            .map_err(|e| anyhow::anyhow!("Failed to derive account address: {}", e))?;

        Ok(Self {
            key: Arc::new(key),
            account_id,
        })
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    pub fn public_key(&self) -> PublicKey {
        self.key.public_key()
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "0101010101010101010101010101010101010101010101010101010101010101";

    #[test]
    fn test_derives_prefixed_address() {
        let signer = KeySigner::from_hex(TEST_KEY, "tgrade").unwrap();
        assert_eq!(signer.account_id().prefix(), "tgrade");
        assert!(signer.account_id().to_string().starts_with("tgrade1"));

        let with_prefix = KeySigner::from_hex(&format!("0x{TEST_KEY}"), "tgrade").unwrap();
        assert_eq!(with_prefix.account_id(), signer.account_id());
    }

    #[test]
    fn test_rejects_bad_keys() {
        assert!(KeySigner::from_hex("zz", "tgrade").is_err());
        assert!(KeySigner::from_hex("0102", "tgrade").is_err());
    }
}
