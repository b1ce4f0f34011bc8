//! Wallet management module

use anyhow::{Context, Result};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use std::sync::Arc;

/// Load a keypair from a file
///
/// Accepts the Solana CLI JSON array format or 64 raw bytes.
pub fn load_keypair(path: &str) -> Result<Keypair> {
    let keypair_bytes =
        std::fs::read(path).with_context(|| format!("Failed to read keypair file: {}", path))?;

    let secret = if keypair_bytes.len() == 64 {
        keypair_bytes
    } else {
        serde_json::from_slice::<Vec<u8>>(&keypair_bytes)
            .with_context(|| format!("Failed to parse keypair JSON: {}", path))?
    };

    if secret.len() != 64 {
        anyhow::bail!(
            "Invalid keypair length in {}: expected 64 bytes, got {}",
            path,
            secret.len()
        );
    }
    if secret.iter().all(|&b| b == 0) {
        anyhow::bail!("Invalid keypair in {}: all-zero key rejected", path);
    }

    Keypair::try_from(secret.as_slice()).with_context(|| format!("Invalid keypair bytes: {}", path))
}

/// Keypairs that sign one transaction
///
/// The first keypair is the default fee payer.
#[derive(Clone)]
pub struct WalletManager {
    keypairs: Vec<Arc<Keypair>>,
}

impl WalletManager {
    /// Load every keypair file, in order
    pub fn from_files<S: AsRef<str>>(paths: &[S]) -> Result<Self> {
        if paths.is_empty() {
            anyhow::bail!("At least one keypair file is required");
        }

        let keypairs = paths
            .iter()
            .map(|p| load_keypair(p.as_ref()).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { keypairs })
    }

    pub fn from_keypairs(keypairs: Vec<Keypair>) -> Result<Self> {
        if keypairs.is_empty() {
            anyhow::bail!("At least one keypair is required");
        }
        Ok(Self {
            keypairs: keypairs.into_iter().map(Arc::new).collect(),
        })
    }

    /// Public key of the first keypair
    pub fn fee_payer(&self) -> Pubkey {
        self.keypairs[0].pubkey()
    }

    pub fn pubkeys(&self) -> Vec<Pubkey> {
        self.keypairs.iter().map(|k| k.pubkey()).collect()
    }

    /// Borrowed signers in load order
    pub fn signers(&self) -> Vec<&dyn Signer> {
        self.keypairs.iter().map(|k| k.as_ref() as &dyn Signer).collect()
    }

    pub fn len(&self) -> usize {
        self.keypairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypairs.is_empty()
    }
}
