//! Local trading wallet.
//!
//! Loads the keypair from a base58 secret and re-signs the venue's
//! serialized (legacy or v0) swap transaction with it.

use anyhow::Result;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use secrecy::{ExposeSecret, SecretString};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{keypair_from_seed, Keypair, Signer};
use solana_sdk::transaction::VersionedTransaction;
use std::fmt;

use crate::types::BotError;

/// A transaction after signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    /// Base64 wire bytes.
    pub wire: String,
    /// Base58 of the first signature, i.e. the transaction id.
    pub signature: String,
}

pub struct Wallet {
    keypair: Keypair,
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("pubkey", &self.pubkey().to_string())
            .finish_non_exhaustive()
    }
}

impl Wallet {
    /// Accepts a base58 64-byte keypair (secret || public) or a 32-byte secret.
    pub fn from_base58(secret: &SecretString) -> Result<Self> {
        let bytes = bs58::decode(secret.expose_secret().trim())
            .into_vec()
            .map_err(|e| BotError::Signing(format!("keypair is not valid base58: {e}")))?;

        let keypair = match bytes.len() {
            64 => Keypair::from_bytes(&bytes)
                .map_err(|e| BotError::Signing(format!("inconsistent keypair: {e}")))?,
            32 => keypair_from_seed(&bytes)
                .map_err(|e| BotError::Signing(format!("invalid secret key: {e}")))?,
            n => {
                return Err(
                    BotError::Signing(format!("keypair must be 32 or 64 bytes, got {n}")).into(),
                )
            }
        };

        Ok(Self { keypair })
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    /// Sign a base64 wire transaction.
    ///
    /// The wallet must be the transaction's only required signer.
    pub fn sign_transaction(&self, unsigned_b64: &str) -> Result<SignedTransaction> {
        let raw = STANDARD
            .decode(unsigned_b64.trim())
            .map_err(|e| BotError::Signing(format!("transaction is not valid base64: {e}")))?;

        let unsigned: VersionedTransaction = bincode::deserialize(&raw)
            .map_err(|e| BotError::Signing(format!("malformed transaction: {e}")))?;

        let signed = VersionedTransaction::try_new(unsigned.message, &[&self.keypair])
            .map_err(|e| BotError::Signing(format!("{} cannot sign: {e}", self.pubkey())))?;

        let signature = signed
            .signatures
            .first()
            .map(|s| s.to_string())
            .ok_or_else(|| BotError::Signing("signed transaction has no signatures".into()))?;

        let wire = bincode::serialize(&signed)
            .map_err(|e| BotError::Signing(format!("failed to serialize transaction: {e}")))?;

        Ok(SignedTransaction {
            wire: STANDARD.encode(wire),
            signature,
        })
    }
}
