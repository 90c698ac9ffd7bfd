//! Account key material.
//!
//! Private keys are held for the two ECDSA curves accounts can declare:
//! NIST P-256 (the emulator default) and secp256k1.

use crate::error::{Result, SyncError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;

/// Weight that alone satisfies an account's signing threshold.
pub const ACCOUNT_KEY_WEIGHT_THRESHOLD: u32 = 1000;

/// Signature algorithms a key can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SigAlgo {
    #[serde(rename = "ECDSA_P256")]
    EcdsaP256,
    #[serde(rename = "ECDSA_secp256k1")]
    EcdsaSecp256k1,
}

/// Hash algorithms a key can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgo {
    #[serde(rename = "SHA2_256")]
    Sha2_256,
    #[serde(rename = "SHA3_256")]
    Sha3_256,
}

#[derive(Clone, PartialEq)]
enum SigningKey {
    P256(p256::ecdsa::SigningKey),
    Secp256k1(k256::ecdsa::SigningKey),
}

/// A private signing key.
#[derive(Clone, PartialEq)]
pub struct PrivateKey {
    signing_key: SigningKey,
}

impl PrivateKey {
    /// Decode a hex private key for the given algorithm.
    pub fn from_hex(sig_algo: SigAlgo, encoded: &str) -> Result<Self> {
        let bytes = hex::decode(encoded.trim().trim_start_matches("0x"))
            .map_err(|e| SyncError::key(format!("invalid private key hex: {}", e)))?;

        let signing_key = match sig_algo {
            SigAlgo::EcdsaP256 => p256::ecdsa::SigningKey::from_slice(&bytes).map(SigningKey::P256),
            SigAlgo::EcdsaSecp256k1 => {
                k256::ecdsa::SigningKey::from_slice(&bytes).map(SigningKey::Secp256k1)
            }
        }
        .map_err(|_| SyncError::key(format!("invalid {:?} private key bytes", sig_algo)))?;

        Ok(Self { signing_key })
    }

    pub fn sig_algo(&self) -> SigAlgo {
        match self.signing_key {
            SigningKey::P256(_) => SigAlgo::EcdsaP256,
            SigningKey::Secp256k1(_) => SigAlgo::EcdsaSecp256k1,
        }
    }

    /// Public key as the 64-byte concatenation of the point coordinates.
    pub fn public_key(&self) -> PublicKey {
        let point = match &self.signing_key {
            SigningKey::P256(key) => key.verifying_key().to_encoded_point(false).as_bytes().to_vec(),
            SigningKey::Secp256k1(key) => {
                key.verifying_key().to_encoded_point(false).as_bytes().to_vec()
            }
        };

        PublicKey {
            sig_algo: self.sig_algo(),
            // Drop the SEC1 uncompressed tag byte
            bytes: point[1..].to_vec(),
        }
    }

    pub fn to_hex(&self) -> String {
        match &self.signing_key {
            SigningKey::P256(key) => hex::encode(key.to_bytes()),
            SigningKey::Secp256k1(key) => hex::encode(key.to_bytes()),
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("sig_algo", &self.sig_algo())
            .finish_non_exhaustive()
    }
}

/// A public key, raw `x || y` coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    sig_algo: SigAlgo,
    bytes: Vec<u8>,
}

impl PublicKey {
    pub fn sig_algo(&self) -> SigAlgo {
        self.sig_algo
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

/// Key stored inline as hex.
#[derive(Debug, Clone, PartialEq)]
pub struct HexKey {
    pub index: u32,
    pub hash_algo: HashAlgo,
    pub private_key: PrivateKey,
}

impl HexKey {
    pub fn new(index: u32, hash_algo: HashAlgo, private_key: PrivateKey) -> Self {
        Self {
            index,
            hash_algo,
            private_key,
        }
    }
}

/// Key whose hex private key lives in a separate file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileKey {
    #[serde(default)]
    pub index: u32,
    pub signature_algorithm: SigAlgo,
    pub hash_algorithm: HashAlgo,
    pub location: PathBuf,
}

/// Key material attached to an account.
#[derive(Debug, Clone, PartialEq)]
pub enum AccountKey {
    Hex(HexKey),
    File(FileKey),
}

impl AccountKey {
    pub fn index(&self) -> u32 {
        match self {
            Self::Hex(key) => key.index,
            Self::File(key) => key.index,
        }
    }

    pub fn hash_algo(&self) -> HashAlgo {
        match self {
            Self::Hex(key) => key.hash_algo,
            Self::File(key) => key.hash_algorithm,
        }
    }

    /// Load the private key. File keys are read on every call.
    pub fn private_key(&self) -> Result<PrivateKey> {
        match self {
            Self::Hex(key) => Ok(key.private_key.clone()),
            Self::File(key) => {
                let content = std::fs::read_to_string(&key.location).map_err(|e| {
                    SyncError::key(format!(
                        "could not load key file {}: {}",
                        key.location.display(),
                        e
                    ))
                })?;
                PrivateKey::from_hex(key.signature_algorithm, &content)
            }
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum KeyRecord {
    Hex(HexRecord),
    File(FileKey),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HexRecord {
    #[serde(default)]
    index: u32,
    signature_algorithm: SigAlgo,
    hash_algorithm: HashAlgo,
    private_key: String,
}

impl Serialize for AccountKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let record = match self {
            Self::Hex(key) => KeyRecord::Hex(HexRecord {
                index: key.index,
                signature_algorithm: key.private_key.sig_algo(),
                hash_algorithm: key.hash_algo,
                private_key: key.private_key.to_hex(),
            }),
            Self::File(key) => KeyRecord::File(key.clone()),
        };
        record.serialize(serializer)
    }
}

/// Forms an account key can take in a project file.
#[derive(Deserialize)]
#[serde(untagged)]
enum KeyForm {
    /// A bare hex private key, using the default algorithms
    Short(String),
    Record(KeyRecord),
}

impl<'de> Deserialize<'de> for AccountKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let record = match KeyForm::deserialize(deserializer)? {
            KeyForm::Short(private_key) => HexRecord {
                index: 0,
                signature_algorithm: SigAlgo::EcdsaP256,
                hash_algorithm: HashAlgo::Sha3_256,
                private_key,
            },
            KeyForm::Record(KeyRecord::Hex(record)) => record,
            KeyForm::Record(KeyRecord::File(key)) => return Ok(Self::File(key)),
        };

        let private_key = PrivateKey::from_hex(record.signature_algorithm, &record.private_key)
            .map_err(serde::de::Error::custom)?;
        Ok(Self::Hex(HexKey::new(
            record.index,
            record.hash_algorithm,
            private_key,
        )))
    }
}
