//! Global state keys and unforgeable references.

use core::fmt;

use casper_snap_common::Hash256;

use super::bytesrepr::{CodecError, Reader};
use super::public_key::AccountHash;

/// Unforgeable reference: address plus access rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct URef {
    pub addr: Hash256,
    pub access: u8,
}

impl URef {
    pub fn read(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(URef {
            addr: r.array()?,
            access: r.u8()?,
        })
    }
}

impl fmt::Display for URef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "uref-{}-{:03o}", hex::encode(self.addr), self.access)
    }
}

/// Kind of an addressable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    System,
    Account,
    SmartContract,
}

impl EntityKind {
    fn read(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        match r.u8()? {
            0 => Ok(EntityKind::System),
            1 => Ok(EntityKind::Account),
            2 => Ok(EntityKind::SmartContract),
            tag => Err(CodecError::InvalidTag(tag)),
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            EntityKind::System => "entity-system-",
            EntityKind::Account => "entity-account-",
            EntityKind::SmartContract => "entity-contract-",
        }
    }
}

/// Global state key.
///
/// Variable-width 2.0 keys (bid addresses, messages, named keys and the
/// like) are rejected here and the caller decides how to render the raw
/// bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Account(AccountHash),
    Hash(Hash256),
    URef(URef),
    Transfer(Hash256),
    DeployInfo(Hash256),
    EraInfo(u64),
    Balance(Hash256),
    Bid(Hash256),
    Withdraw(Hash256),
    Dictionary(Hash256),
    SystemContractRegistry,
    EraSummary,
    Unbond(Hash256),
    ChainspecRegistry,
    ChecksumRegistry,
    Package(Hash256),
    AddressableEntity { kind: EntityKind, addr: Hash256 },
}

impl Key {
    pub fn read(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let key = match r.u8()? {
            0 => Key::Account(AccountHash(r.array()?)),
            1 => Key::Hash(r.array()?),
            2 => Key::URef(URef::read(r)?),
            3 => Key::Transfer(r.array()?),
            4 => Key::DeployInfo(r.array()?),
            5 => Key::EraInfo(r.u64()?),
            6 => Key::Balance(r.array()?),
            7 => Key::Bid(r.array()?),
            8 => Key::Withdraw(r.array()?),
            9 => Key::Dictionary(r.array()?),
            10 => {
                r.array::<32>()?;
                Key::SystemContractRegistry
            }
            11 => {
                r.array::<32>()?;
                Key::EraSummary
            }
            12 => Key::Unbond(r.array()?),
            13 => {
                r.array::<32>()?;
                Key::ChainspecRegistry
            }
            14 => {
                r.array::<32>()?;
                Key::ChecksumRegistry
            }
            16 => Key::Package(r.array()?),
            17 => Key::AddressableEntity {
                kind: EntityKind::read(r)?,
                addr: r.array()?,
            },
            tag => return Err(CodecError::InvalidTag(tag)),
        };
        Ok(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let zero = hex::encode([0u8; 32]);
        match self {
            Key::Account(a) => write!(f, "{}", a),
            Key::Hash(h) => write!(f, "hash-{}", hex::encode(h)),
            Key::URef(u) => write!(f, "{}", u),
            Key::Transfer(h) => write!(f, "transfer-{}", hex::encode(h)),
            Key::DeployInfo(h) => write!(f, "deploy-{}", hex::encode(h)),
            Key::EraInfo(era) => write!(f, "era-{}", era),
            Key::Balance(h) => write!(f, "balance-{}", hex::encode(h)),
            Key::Bid(h) => write!(f, "bid-{}", hex::encode(h)),
            Key::Withdraw(h) => write!(f, "withdraw-{}", hex::encode(h)),
            Key::Dictionary(h) => write!(f, "dictionary-{}", hex::encode(h)),
            Key::SystemContractRegistry => write!(f, "system-contract-registry-{}", zero),
            Key::EraSummary => write!(f, "era-summary-{}", zero),
            Key::Unbond(h) => write!(f, "unbond-{}", hex::encode(h)),
            Key::ChainspecRegistry => write!(f, "chainspec-registry-{}", zero),
            Key::ChecksumRegistry => write!(f, "checksum-registry-{}", zero),
            Key::Package(h) => write!(f, "package-{}", hex::encode(h)),
            Key::AddressableEntity { kind, addr } => {
                write!(f, "{}{}", kind.prefix(), hex::encode(addr))
            }
        }
    }
}
