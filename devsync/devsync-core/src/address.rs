//! Chain addresses and the network they belong to.
//!
//! Every chain derives its account addresses from the codewords of a shared
//! [64,45] linear code, offset by a chain-specific constant. An address is
//! therefore attributed to a chain by removing that chain's offset and
//! checking the result against the code's parity-check matrix.

use crate::error::{Result, SyncError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Length of an address in bytes.
pub const ADDRESS_LENGTH: usize = 8;

/// Columns of the parity-check matrix, one per address bit (lowest first).
const PARITY_CHECK_COLUMNS: [u32; 64] = [
    0x00001, 0x00002, 0x00004, 0x00008, 0x00010, 0x00020, 0x00040, 0x00080,
    0x00100, 0x00200, 0x00400, 0x00800, 0x01000, 0x02000, 0x04000, 0x08000,
    0x10000, 0x20000, 0x40000, 0x7328d, 0x6689a, 0x6112f, 0x6084b, 0x433fd,
    0x42aab, 0x41951, 0x233ce, 0x22a81, 0x21948, 0x1ef60, 0x1deca, 0x1c639,
    0x1bdd8, 0x1a535, 0x194ac, 0x18c46, 0x1632b, 0x1529b, 0x14a43, 0x13184,
    0x12942, 0x118c1, 0x0f812, 0x0e027, 0x0d00e, 0x0c83c, 0x0b01d, 0x0a831,
    0x0982b, 0x07034, 0x0682a, 0x05819, 0x03807, 0x007d2, 0x00727, 0x0068e,
    0x0067c, 0x0059d, 0x004eb, 0x003b4, 0x0036a, 0x002d9, 0x001c7, 0x0003f,
];

/// Chains an address can be attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainId {
    Mainnet,
    Testnet,
    Emulator,
}

impl ChainId {
    /// All chains, in resolution order.
    pub const ALL: [ChainId; 3] = [ChainId::Mainnet, ChainId::Testnet, ChainId::Emulator];

    fn codeword_offset(self) -> u64 {
        match self {
            Self::Mainnet => 0,
            Self::Testnet => 0x6834_ba37_b398_0209,
            Self::Emulator => 0x1cb1_5985_7af0_2018,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Emulator => "emulator",
        }
    }
}

impl FromStr for ChainId {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mainnet" => Ok(Self::Mainnet),
            "testnet" => Ok(Self::Testnet),
            "emulator" => Ok(Self::Emulator),
            _ => Err(SyncError::config(format!(
                "Invalid chain '{}'. Must be one of: mainnet, testnet, emulator",
                s
            ))),
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An 8-byte account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    pub const fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    pub const fn from_u64(value: u64) -> Self {
        Self(value.to_be_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    pub fn to_u64(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }

    /// Hex form without the `0x` prefix, as stored in project files.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Whether this address is a valid account address on `chain`.
    pub fn is_valid_for(&self, chain: ChainId) -> bool {
        let mut codeword = self.to_u64() ^ chain.codeword_offset();
        if codeword == 0 {
            return false;
        }

        let mut parity = 0u32;
        for column in PARITY_CHECK_COLUMNS {
            if codeword & 1 == 1 {
                parity ^= column;
            }
            codeword >>= 1;
        }
        parity == 0
    }

    /// Resolve the chain this address belongs to, if any.
    pub fn network(&self) -> Option<ChainId> {
        ChainId::ALL.into_iter().find(|chain| self.is_valid_for(*chain))
    }
}

impl FromStr for Address {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim_start_matches("0x");
        if trimmed.is_empty() || trimmed.len() > ADDRESS_LENGTH * 2 {
            return Err(SyncError::config(format!("Invalid address '{}'", s)));
        }

        // Short addresses are left-padded, so "0x01" is a valid address.
        let padded = format!("{:0>16}", trimmed);
        let mut bytes = [0u8; ADDRESS_LENGTH];
        hex::decode_to_slice(&padded, &mut bytes)
            .map_err(|e| SyncError::config(format!("Invalid address '{}': {}", s, e)))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{})", self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
