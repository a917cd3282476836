//! Transaction envelopes.
//!
//! This module provides:
//! - Legacy deploy parsing and hashing
//! - Unified (V1) transaction parsing and hashing
//! - Approval attachment and validation
//!
//! # Security
//!
//! Envelopes are parsed from caller-supplied JSON. The hash carried in the
//! document is never trusted: it is recomputed from the parsed fields and
//! must match before anything is shown or signed.

pub mod deploy;
pub mod v1;

use casper_snap_common::Hash256;
use serde_json::{json, Value};

use crate::codec::{parse_hash, CodecError, PublicKey, RuntimeArgs, Signature};
use crate::crypto;

pub use deploy::{Deploy, DeployHeader, ExecutableDeployItem};
pub use v1::{
    EntryPoint, InitiatorAddr, InvocationTarget, PricingMode, Scheduling, TransactionArgs,
    TransactionRuntime, TransactionTarget, TransactionV1, TransactionV1Payload,
};

// =============================================================================
// JSON helpers
// =============================================================================

pub(crate) fn field<'a>(value: &'a Value, name: &str) -> Result<&'a Value, CodecError> {
    value
        .get(name)
        .filter(|v| !v.is_null())
        .ok_or_else(|| CodecError::InvalidJson(format!("missing field {}", name)))
}

pub(crate) fn str_field<'a>(value: &'a Value, name: &str) -> Result<&'a str, CodecError> {
    field(value, name)?
        .as_str()
        .ok_or_else(|| CodecError::InvalidJson(format!("field {} must be a string", name)))
}

/// Reads a u64 given either as a JSON number or a decimal string.
pub(crate) fn u64_field(value: &Value, name: &str) -> Result<u64, CodecError> {
    let v = field(value, name)?;
    v.as_u64()
        .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
        .ok_or_else(|| CodecError::InvalidJson(format!("field {} must be a u64", name)))
}

pub(crate) fn hash_field(value: &Value, name: &str) -> Result<Hash256, CodecError> {
    parse_prefixed_hash(str_field(value, name)?)
}

/// Parses a 32-byte hex hash, tolerating the formatted-key prefixes
/// wallets attach to contract and package hashes.
pub(crate) fn parse_prefixed_hash(s: &str) -> Result<Hash256, CodecError> {
    const PREFIXES: [&str; 5] = ["contract-package-", "contract-", "package-", "entity-contract-", "hash-"];
    let bare = PREFIXES
        .iter()
        .find_map(|p| s.strip_prefix(p))
        .unwrap_or(s);
    parse_hash(bare)
}

/// Splits an externally tagged enum: `"Name"` or `{"Name": body}`.
pub(crate) fn variant(value: &Value) -> Result<(&str, Option<&Value>), CodecError> {
    match value {
        Value::String(name) => Ok((name, None)),
        Value::Object(map) if map.len() == 1 => map
            .iter()
            .next()
            .map(|(k, v)| (k.as_str(), Some(v)))
            .ok_or_else(|| CodecError::InvalidJson("empty variant".into())),
        _ => Err(CodecError::InvalidJson("expected an enum variant".into())),
    }
}

// =============================================================================
// Approvals
// =============================================================================

/// Signer public key plus signature over the envelope hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approval {
    pub signer: PublicKey,
    pub signature: Signature,
}

impl Approval {
    pub fn from_json(value: &Value) -> Result<Self, CodecError> {
        Ok(Approval {
            signer: PublicKey::from_hex(str_field(value, "signer")?)?,
            signature: Signature::from_hex(str_field(value, "signature")?)?,
        })
    }

    pub fn to_json(&self) -> Value {
        json!({
            "signer": self.signer.to_hex(),
            "signature": self.signature.to_hex(),
        })
    }

    pub(crate) fn list_from_json(envelope: &Value) -> Result<Vec<Self>, CodecError> {
        match envelope.get("approvals") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items.iter().map(Approval::from_json).collect(),
            Some(_) => Err(CodecError::InvalidJson("approvals must be an array".into())),
        }
    }

    /// Verifies the signature against `hash`.
    pub fn verify(&self, hash: &Hash256) -> bool {
        crypto::verify(&self.signer, hash, &self.signature)
    }
}

// =============================================================================
// Envelope
// =============================================================================

/// Wire format of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    Deploy,
    TransactionV1,
}

/// Locates the envelope body and its format.
///
/// Accepts bare deploys and transactions as well as the wrapped forms
/// `{"deploy": ..}`, `{"Deploy": ..}`, `{"Version1": ..}` and
/// `{"transaction": ..}`.
pub fn detect(value: &Value) -> Result<(EnvelopeKind, &Value), CodecError> {
    if let Value::Object(map) = value {
        if map.len() == 1 {
            for (key, kind) in [
                ("deploy", EnvelopeKind::Deploy),
                ("Deploy", EnvelopeKind::Deploy),
                ("Version1", EnvelopeKind::TransactionV1),
                ("transaction", EnvelopeKind::TransactionV1),
            ] {
                if let Some(inner) = map.get(key) {
                    return match detect(inner)? {
                        (found, body) if found == kind => Ok((found, body)),
                        _ => Err(CodecError::InvalidJson(format!("{} wrapper holds another format", key))),
                    };
                }
            }
        }
        if map.contains_key("header") {
            return Ok((EnvelopeKind::Deploy, value));
        }
        if map.contains_key("payload") {
            return Ok((EnvelopeKind::TransactionV1, value));
        }
    }
    Err(CodecError::InvalidJson("not a deploy or transaction".into()))
}

/// Parsed deploy or unified transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    Deploy(Deploy),
    V1(TransactionV1),
}

impl Transaction {
    /// Parses an envelope body and checks its hashes.
    pub fn from_json(kind: EnvelopeKind, body: &Value) -> Result<Self, CodecError> {
        let tx = Self::from_json_unchecked(kind, body)?;
        tx.check_hashes()?;
        Ok(tx)
    }

    fn from_json_unchecked(kind: EnvelopeKind, body: &Value) -> Result<Self, CodecError> {
        Ok(match kind {
            EnvelopeKind::Deploy => Transaction::Deploy(Deploy::from_json(body)?),
            EnvelopeKind::TransactionV1 => Transaction::V1(TransactionV1::from_json(body)?),
        })
    }

    /// Recomputes the hashes of an envelope body in place.
    pub fn seal(kind: EnvelopeKind, body: &mut Value) -> Result<(), CodecError> {
        match kind {
            EnvelopeKind::Deploy => Deploy::seal(body),
            EnvelopeKind::TransactionV1 => TransactionV1::seal(body),
        }
    }

    pub fn kind(&self) -> EnvelopeKind {
        match self {
            Transaction::Deploy(_) => EnvelopeKind::Deploy,
            Transaction::V1(_) => EnvelopeKind::TransactionV1,
        }
    }

    pub fn hash(&self) -> &Hash256 {
        match self {
            Transaction::Deploy(d) => &d.hash,
            Transaction::V1(t) => &t.hash,
        }
    }

    pub fn chain_name(&self) -> &str {
        match self {
            Transaction::Deploy(d) => &d.header.chain_name,
            Transaction::V1(t) => &t.payload.chain_name,
        }
    }

    /// Unix milliseconds.
    pub fn timestamp(&self) -> u64 {
        match self {
            Transaction::Deploy(d) => d.header.timestamp,
            Transaction::V1(t) => t.payload.timestamp,
        }
    }

    pub fn initiator(&self) -> InitiatorAddr {
        match self {
            Transaction::Deploy(d) => InitiatorAddr::PublicKey(d.header.account.clone()),
            Transaction::V1(t) => t.payload.initiator_addr.clone(),
        }
    }

    /// Named arguments of the session, if they are named.
    pub fn named_args(&self) -> Option<&RuntimeArgs> {
        match self {
            Transaction::Deploy(d) => Some(d.session.args()),
            Transaction::V1(t) => match &t.payload.args {
                TransactionArgs::Named(args) => Some(args),
                TransactionArgs::Bytesrepr(_) => None,
            },
        }
    }

    pub fn approvals(&self) -> &[Approval] {
        match self {
            Transaction::Deploy(d) => &d.approvals,
            Transaction::V1(t) => &t.approvals,
        }
    }

    pub fn check_hashes(&self) -> Result<(), CodecError> {
        match self {
            Transaction::Deploy(d) => d.check_hashes(),
            Transaction::V1(t) => t.check_hash(),
        }
    }

    /// Checks the hashes and every approval signature.
    pub fn validate(&self) -> Result<(), String> {
        self.check_hashes().map_err(|e| e.to_string())?;
        for approval in self.approvals() {
            if !approval.verify(self.hash()) {
                return Err(format!("invalid approval from {}", approval.signer));
            }
        }
        Ok(())
    }
}

/// Returns a copy of the envelope body with `approval` appended.
pub fn attach_approval(body: &Value, approval: &Approval) -> Result<Value, CodecError> {
    let mut signed = body.clone();
    let obj = signed
        .as_object_mut()
        .ok_or_else(|| CodecError::InvalidJson("envelope must be an object".into()))?;
    let approvals = obj
        .entry("approvals")
        .or_insert_with(|| Value::Array(Vec::new()));
    if approvals.is_null() {
        *approvals = Value::Array(Vec::new());
    }
    approvals
        .as_array_mut()
        .ok_or_else(|| CodecError::InvalidJson("approvals must be an array".into()))?
        .push(approval.to_json());
    Ok(signed)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{json, Value};

    pub const ED25519_KEY: &str =
        "01c9e33693951aaac23c49bee44ad6f863eedcd38c084a3a8f11237716a3df9c2c";

    /// Unsealed native transfer deploy.
    pub fn transfer_json() -> Value {
        json!({
            "hash": "00".repeat(32),
            "header": {
                "account": ED25519_KEY,
                "timestamp": "2024-05-01T12:00:00.000Z",
                "ttl": "30m",
                "gas_price": 1,
                "body_hash": "00".repeat(32),
                "dependencies": [],
                "chain_name": "casper-test"
            },
            "payment": { "ModuleBytes": { "module_bytes": "", "args": [
                ["amount", { "cl_type": "U512", "bytes": "0400e1f505", "parsed": "100000000" }]
            ] } },
            "session": { "Transfer": { "args": [
                ["amount", { "cl_type": "U512", "bytes": "0500f2052a01", "parsed": "5000000000" }],
                ["target", { "cl_type": { "ByteArray": 32 }, "bytes": "ab".repeat(32) }],
                ["id", { "cl_type": { "Option": "U64" }, "bytes": "010700000000000000" }]
            ] } },
            "approvals": []
        })
    }

    /// Unsealed native transfer transaction.
    pub fn native_transfer_v1_json() -> Value {
        json!({
            "hash": "00".repeat(32),
            "payload": {
                "initiator_addr": { "PublicKey": ED25519_KEY },
                "timestamp": "2024-05-01T12:00:00.000Z",
                "ttl": "30m",
                "chain_name": "casper-test",
                "pricing_mode": { "PaymentLimited": {
                    "payment_amount": 100000000,
                    "gas_price_tolerance": 1,
                    "standard_payment": true
                } },
                "fields": {
                    "args": { "Named": [
                        ["target", { "cl_type": "PublicKey", "bytes": ED25519_KEY }],
                        ["amount", { "cl_type": "U512", "bytes": "0500f2052a01" }]
                    ] },
                    "entry_point": "Transfer",
                    "scheduling": "Standard",
                    "target": "Native"
                }
            },
            "approvals": []
        })
    }
}
