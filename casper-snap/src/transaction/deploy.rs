//! Legacy deploys.
//!
//! A deploy is a header plus two executable items (payment and session).
//! Hashing:
//! - body hash = blake2b256(payment bytes || session bytes)
//! - deploy hash = blake2b256(header bytes)

use casper_snap_common::Hash256;
use serde_json::Value;

use super::{field, hash_field, str_field, u64_field, Approval};
use crate::codec::{time, CodecError, PublicKey, RuntimeArgs, Writer};
use crate::crypto::blake2b256;

/// Executable item of a deploy (payment or session).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutableDeployItem {
    ModuleBytes {
        module_bytes: Vec<u8>,
        args: RuntimeArgs,
    },
    StoredContractByHash {
        hash: Hash256,
        entry_point: String,
        args: RuntimeArgs,
    },
    StoredContractByName {
        name: String,
        entry_point: String,
        args: RuntimeArgs,
    },
    StoredVersionedContractByHash {
        hash: Hash256,
        version: Option<u32>,
        entry_point: String,
        args: RuntimeArgs,
    },
    StoredVersionedContractByName {
        name: String,
        version: Option<u32>,
        entry_point: String,
        args: RuntimeArgs,
    },
    Transfer {
        args: RuntimeArgs,
    },
}

impl ExecutableDeployItem {
    pub fn from_json(value: &Value) -> Result<Self, CodecError> {
        let obj = value
            .as_object()
            .filter(|o| o.len() == 1)
            .ok_or_else(|| CodecError::InvalidJson("executable item must have one variant".into()))?;
        let (variant, body) = obj
            .iter()
            .next()
            .ok_or_else(|| CodecError::InvalidJson("empty executable item".into()))?;
        let args = RuntimeArgs::from_json(field(body, "args")?)?;

        let item = match variant.as_str() {
            "ModuleBytes" => ExecutableDeployItem::ModuleBytes {
                module_bytes: hex::decode(str_field(body, "module_bytes")?)?,
                args,
            },
            "StoredContractByHash" => ExecutableDeployItem::StoredContractByHash {
                hash: hash_field(body, "hash")?,
                entry_point: str_field(body, "entry_point")?.to_string(),
                args,
            },
            "StoredContractByName" => ExecutableDeployItem::StoredContractByName {
                name: str_field(body, "name")?.to_string(),
                entry_point: str_field(body, "entry_point")?.to_string(),
                args,
            },
            "StoredVersionedContractByHash" => ExecutableDeployItem::StoredVersionedContractByHash {
                hash: hash_field(body, "hash")?,
                version: version_field(body)?,
                entry_point: str_field(body, "entry_point")?.to_string(),
                args,
            },
            "StoredVersionedContractByName" => ExecutableDeployItem::StoredVersionedContractByName {
                name: str_field(body, "name")?.to_string(),
                version: version_field(body)?,
                entry_point: str_field(body, "entry_point")?.to_string(),
                args,
            },
            "Transfer" => ExecutableDeployItem::Transfer { args },
            other => {
                return Err(CodecError::InvalidJson(format!(
                    "unknown executable item {}",
                    other
                )))
            }
        };
        Ok(item)
    }

    #[inline]
    pub fn tag(&self) -> u8 {
        match self {
            ExecutableDeployItem::ModuleBytes { .. } => 0,
            ExecutableDeployItem::StoredContractByHash { .. } => 1,
            ExecutableDeployItem::StoredContractByName { .. } => 2,
            ExecutableDeployItem::StoredVersionedContractByHash { .. } => 3,
            ExecutableDeployItem::StoredVersionedContractByName { .. } => 4,
            ExecutableDeployItem::Transfer { .. } => 5,
        }
    }

    pub fn write_bytes(&self, w: &mut Writer) {
        w.u8(self.tag());
        match self {
            ExecutableDeployItem::ModuleBytes { module_bytes, args } => {
                w.bytes(module_bytes);
                args.write_bytes(w);
            }
            ExecutableDeployItem::StoredContractByHash {
                hash,
                entry_point,
                args,
            } => {
                w.raw(hash).string(entry_point);
                args.write_bytes(w);
            }
            ExecutableDeployItem::StoredContractByName {
                name,
                entry_point,
                args,
            } => {
                w.string(name).string(entry_point);
                args.write_bytes(w);
            }
            ExecutableDeployItem::StoredVersionedContractByHash {
                hash,
                version,
                entry_point,
                args,
            } => {
                w.raw(hash).option_u32(*version).string(entry_point);
                args.write_bytes(w);
            }
            ExecutableDeployItem::StoredVersionedContractByName {
                name,
                version,
                entry_point,
                args,
            } => {
                w.string(name).option_u32(*version).string(entry_point);
                args.write_bytes(w);
            }
            ExecutableDeployItem::Transfer { args } => args.write_bytes(w),
        }
    }

    pub fn args(&self) -> &RuntimeArgs {
        match self {
            ExecutableDeployItem::ModuleBytes { args, .. }
            | ExecutableDeployItem::StoredContractByHash { args, .. }
            | ExecutableDeployItem::StoredContractByName { args, .. }
            | ExecutableDeployItem::StoredVersionedContractByHash { args, .. }
            | ExecutableDeployItem::StoredVersionedContractByName { args, .. }
            | ExecutableDeployItem::Transfer { args } => args,
        }
    }

    /// Returns the entry point of stored-contract items.
    pub fn entry_point(&self) -> Option<&str> {
        match self {
            ExecutableDeployItem::StoredContractByHash { entry_point, .. }
            | ExecutableDeployItem::StoredContractByName { entry_point, .. }
            | ExecutableDeployItem::StoredVersionedContractByHash { entry_point, .. }
            | ExecutableDeployItem::StoredVersionedContractByName { entry_point, .. } => {
                Some(entry_point)
            }
            _ => None,
        }
    }
}

fn version_field(body: &Value) -> Result<Option<u32>, CodecError> {
    match body.get("version") {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| CodecError::InvalidJson("bad contract version".into())),
    }
}

// =============================================================================
// Header
// =============================================================================

/// Deploy header. The deploy hash covers exactly these fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployHeader {
    pub account: PublicKey,
    pub timestamp: u64,
    pub ttl: u64,
    pub gas_price: u64,
    pub body_hash: Hash256,
    pub dependencies: Vec<Hash256>,
    pub chain_name: String,
}

impl DeployHeader {
    pub fn from_json(value: &Value) -> Result<Self, CodecError> {
        let dependencies = match value.get("dependencies") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|d| {
                    d.as_str()
                        .ok_or_else(|| CodecError::InvalidJson("dependency must be hex".into()))
                        .and_then(crate::codec::parse_hash)
                })
                .collect::<Result<_, _>>()?,
            Some(_) => return Err(CodecError::InvalidJson("dependencies must be an array".into())),
        };

        Ok(DeployHeader {
            account: PublicKey::from_hex(str_field(value, "account")?)?,
            timestamp: time::parse_timestamp(str_field(value, "timestamp")?)?,
            ttl: time::parse_ttl(str_field(value, "ttl")?)?,
            gas_price: u64_field(value, "gas_price")?,
            body_hash: hash_field(value, "body_hash")?,
            dependencies,
            chain_name: str_field(value, "chain_name")?.to_string(),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::new();
        self.account.write_bytes(&mut w);
        w.u64(self.timestamp).u64(self.ttl).u64(self.gas_price);
        w.raw(&self.body_hash);
        w.u32(self.dependencies.len() as u32);
        for dep in &self.dependencies {
            w.raw(dep);
        }
        w.string(&self.chain_name);
        w.into_bytes()
    }
}

// =============================================================================
// Deploy
// =============================================================================

/// Legacy deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deploy {
    pub hash: Hash256,
    pub header: DeployHeader,
    pub payment: ExecutableDeployItem,
    pub session: ExecutableDeployItem,
    pub approvals: Vec<Approval>,
}

impl Deploy {
    /// Parses a deploy without checking its hashes.
    pub fn from_json(value: &Value) -> Result<Self, CodecError> {
        Ok(Deploy {
            hash: hash_field(value, "hash")?,
            header: DeployHeader::from_json(field(value, "header")?)?,
            payment: ExecutableDeployItem::from_json(field(value, "payment")?)?,
            session: ExecutableDeployItem::from_json(field(value, "session")?)?,
            approvals: Approval::list_from_json(value)?,
        })
    }

    /// Recomputes the body hash from payment and session.
    pub fn compute_body_hash(&self) -> Hash256 {
        let mut w = Writer::new();
        self.payment.write_bytes(&mut w);
        self.session.write_bytes(&mut w);
        blake2b256(&w.into_bytes())
    }

    /// Recomputes the deploy hash from the header.
    pub fn compute_hash(&self) -> Hash256 {
        blake2b256(&self.header.to_bytes())
    }

    /// Checks both the body hash and the deploy hash.
    pub fn check_hashes(&self) -> Result<(), CodecError> {
        if self.compute_body_hash() != self.header.body_hash {
            return Err(CodecError::InvalidJson("body hash mismatch".into()));
        }
        if self.compute_hash() != self.hash {
            return Err(CodecError::InvalidJson("deploy hash mismatch".into()));
        }
        Ok(())
    }

    /// Rewrites `body_hash` and `hash` in a deploy JSON document.
    pub fn seal(value: &mut Value) -> Result<(), CodecError> {
        let mut deploy = Deploy::from_json(value)?;
        deploy.header.body_hash = deploy.compute_body_hash();
        value["header"]["body_hash"] = Value::String(hex::encode(deploy.header.body_hash));
        value["hash"] = Value::String(hex::encode(deploy.compute_hash()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::fixtures::transfer_json;
    use serde_json::json;

    #[test]
    fn test_parse_deploy() {
        let deploy = Deploy::from_json(&transfer_json()).unwrap();
        assert_eq!(deploy.header.chain_name, "casper-test");
        assert_eq!(deploy.header.ttl, 1_800_000);
        assert_eq!(deploy.session.tag(), 5);
        assert_eq!(deploy.session.args().len(), 3);
        assert!(deploy.approvals.is_empty());
    }

    #[test]
    fn test_unsealed_deploy_fails_hash_check() {
        let deploy = Deploy::from_json(&transfer_json()).unwrap();
        assert!(deploy.check_hashes().is_err());
    }

    #[test]
    fn test_seal_then_check() {
        let mut json = transfer_json();
        Deploy::seal(&mut json).unwrap();
        let deploy = Deploy::from_json(&json).unwrap();
        assert!(deploy.check_hashes().is_ok());

        // Any header change invalidates the hash.
        json["header"]["chain_name"] = json!("casper");
        let tampered = Deploy::from_json(&json).unwrap();
        assert!(tampered.check_hashes().is_err());
    }

    #[test]
    fn test_header_bytes_layout() {
        let deploy = Deploy::from_json(&transfer_json()).unwrap();
        let bytes = deploy.header.to_bytes();
        // tag + key + timestamp + ttl + gas_price + body_hash + deps + chain name
        assert_eq!(bytes.len(), 33 + 8 + 8 + 8 + 32 + 4 + 4 + "casper-test".len());
        assert_eq!(bytes[0], 0x01);
    }

    #[test]
    fn test_stored_versioned_item() {
        let item = ExecutableDeployItem::from_json(&json!({
            "StoredVersionedContractByName": {
                "name": "faucet",
                "version": null,
                "entry_point": "call_faucet",
                "args": []
            }
        }))
        .unwrap();
        assert_eq!(item.entry_point(), Some("call_faucet"));
        let mut w = Writer::new();
        item.write_bytes(&mut w);
        let bytes = w.into_bytes();
        assert_eq!(bytes[0], 4);
        // tag, name, None version, entry point, zero args
        assert_eq!(bytes.len(), 1 + 4 + 6 + 1 + 4 + 11 + 4);
    }

    #[test]
    fn test_unknown_item() {
        assert!(ExecutableDeployItem::from_json(&json!({ "Delegate": { "args": [] } })).is_err());
    }
}
