//! Unified (version 1) transactions.
//!
//! The payload is a call-table envelope:
//!
//! | index | field          |
//! |-------|----------------|
//! | 0     | initiator_addr |
//! | 1     | timestamp      |
//! | 2     | ttl            |
//! | 3     | chain_name     |
//! | 4     | pricing_mode   |
//! | 5     | fields map     |
//!
//! The fields map holds args (0), target (1), entry point (2) and
//! scheduling (3), each as length-prefixed call-table bytes.
//! Transaction hash = blake2b256(payload bytes).

use casper_snap_common::Hash256;
use serde_json::Value;

use super::{field, hash_field, str_field, u64_field, variant, Approval};
use crate::codec::{time, AccountHash, CallTable, CodecError, PublicKey, RuntimeArgs, Writer};
use crate::crypto::blake2b256;

const ARGS_MAP_KEY: u16 = 0;
const TARGET_MAP_KEY: u16 = 1;
const ENTRY_POINT_MAP_KEY: u16 = 2;
const SCHEDULING_MAP_KEY: u16 = 3;

// =============================================================================
// Initiator
// =============================================================================

/// Account that initiated the transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitiatorAddr {
    PublicKey(PublicKey),
    AccountHash(AccountHash),
}

impl InitiatorAddr {
    pub fn from_json(value: &Value) -> Result<Self, CodecError> {
        let (name, body) = variant(value)?;
        let body = body.and_then(Value::as_str);
        match (name, body) {
            ("PublicKey", Some(hex)) => Ok(InitiatorAddr::PublicKey(PublicKey::from_hex(hex)?)),
            ("AccountHash", Some(s)) => Ok(InitiatorAddr::AccountHash(
                AccountHash::from_formatted_str(s)
                    .or_else(|_| crate::codec::parse_hash(s).map(AccountHash))?,
            )),
            _ => Err(CodecError::InvalidJson(format!("bad initiator_addr {}", name))),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let table = match self {
            InitiatorAddr::PublicKey(pk) => CallTable::variant(0).field(1, pk.to_bytes()),
            InitiatorAddr::AccountHash(ah) => CallTable::variant(1).field(1, ah.0.to_vec()),
        };
        table.finish()
    }

    /// Account hash of the initiator.
    pub fn account_hash(&self) -> AccountHash {
        match self {
            InitiatorAddr::PublicKey(pk) => pk.to_account_hash(),
            InitiatorAddr::AccountHash(ah) => *ah,
        }
    }
}

// =============================================================================
// Pricing
// =============================================================================

/// How the transaction pays for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PricingMode {
    PaymentLimited {
        payment_amount: u64,
        gas_price_tolerance: u8,
        standard_payment: bool,
    },
    Fixed {
        gas_price_tolerance: u8,
        additional_computation_factor: u8,
    },
    Prepaid {
        receipt: Hash256,
    },
}

impl PricingMode {
    pub fn from_json(value: &Value) -> Result<Self, CodecError> {
        let (name, body) = variant(value)?;
        let body = body.ok_or_else(|| CodecError::InvalidJson("pricing mode needs a body".into()))?;
        match name {
            "PaymentLimited" => Ok(PricingMode::PaymentLimited {
                payment_amount: u64_field(body, "payment_amount")?,
                gas_price_tolerance: u8_field(body, "gas_price_tolerance")?,
                standard_payment: body
                    .get("standard_payment")
                    .and_then(Value::as_bool)
                    .unwrap_or(true),
            }),
            "Fixed" => Ok(PricingMode::Fixed {
                gas_price_tolerance: u8_field(body, "gas_price_tolerance")?,
                additional_computation_factor: match body.get("additional_computation_factor") {
                    None | Some(Value::Null) => 0,
                    Some(_) => u8_field(body, "additional_computation_factor")?,
                },
            }),
            "Prepaid" => Ok(PricingMode::Prepaid {
                receipt: hash_field(body, "receipt")?,
            }),
            other => Err(CodecError::InvalidJson(format!("unknown pricing mode {}", other))),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let table = match self {
            PricingMode::PaymentLimited {
                payment_amount,
                gas_price_tolerance,
                standard_payment,
            } => CallTable::variant(0)
                .field_with(1, |w| {
                    w.u64(*payment_amount);
                })
                .field(2, vec![*gas_price_tolerance])
                .field(3, vec![*standard_payment as u8]),
            PricingMode::Fixed {
                gas_price_tolerance,
                additional_computation_factor,
            } => CallTable::variant(1)
                .field(1, vec![*gas_price_tolerance])
                .field(2, vec![*additional_computation_factor]),
            PricingMode::Prepaid { receipt } => CallTable::variant(2).field(1, receipt.to_vec()),
        };
        table.finish()
    }
}

fn u8_field(value: &Value, name: &str) -> Result<u8, CodecError> {
    u8::try_from(u64_field(value, name)?)
        .map_err(|_| CodecError::InvalidJson(format!("{} out of range", name)))
}

// =============================================================================
// Args
// =============================================================================

/// Transaction arguments: named CLValues or an opaque byte blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionArgs {
    Named(RuntimeArgs),
    Bytesrepr(Vec<u8>),
}

impl TransactionArgs {
    pub fn from_json(value: &Value) -> Result<Self, CodecError> {
        match variant(value)? {
            ("Named", Some(args)) => Ok(TransactionArgs::Named(RuntimeArgs::from_json(args)?)),
            ("Bytesrepr", Some(Value::String(hex))) => Ok(TransactionArgs::Bytesrepr(hex::decode(hex)?)),
            (other, _) => Err(CodecError::InvalidJson(format!("bad args {}", other))),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let table = match self {
            TransactionArgs::Named(args) => CallTable::variant(0).field(1, args.to_bytes()),
            TransactionArgs::Bytesrepr(bytes) => CallTable::variant(1).field_with(1, |w| {
                w.bytes(bytes);
            }),
        };
        table.finish()
    }
}

// =============================================================================
// Target
// =============================================================================

/// Execution engine selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionRuntime {
    VmCasperV1,
    VmCasperV2 {
        transferred_value: u64,
        seed: Option<Hash256>,
    },
}

impl TransactionRuntime {
    pub fn from_json(value: &Value) -> Result<Self, CodecError> {
        match variant(value)? {
            ("VmCasperV1", _) => Ok(TransactionRuntime::VmCasperV1),
            ("VmCasperV2", Some(body)) => Ok(TransactionRuntime::VmCasperV2 {
                transferred_value: u64_field(body, "transferred_value")?,
                seed: match body.get("seed") {
                    None | Some(Value::Null) => None,
                    Some(_) => Some(hash_field(body, "seed")?),
                },
            }),
            (other, _) => Err(CodecError::InvalidJson(format!("unknown runtime {}", other))),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let table = match self {
            TransactionRuntime::VmCasperV1 => CallTable::variant(0),
            TransactionRuntime::VmCasperV2 {
                transferred_value,
                seed,
            } => CallTable::variant(1)
                .field_with(1, |w| {
                    w.u64(*transferred_value);
                })
                .field_with(2, |w| match seed {
                    Some(seed) => {
                        w.u8(1).raw(seed);
                    }
                    None => {
                        w.u8(0);
                    }
                }),
        };
        table.finish()
    }
}

/// Stored contract addressed by a transaction.
///
/// Package targets may pin a protocol major version. It is hashed as
/// field 3 only when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationTarget {
    ByHash(Hash256),
    ByName(String),
    ByPackageHash {
        addr: Hash256,
        version: Option<u32>,
        protocol_version_major: Option<u32>,
    },
    ByPackageName {
        name: String,
        version: Option<u32>,
        protocol_version_major: Option<u32>,
    },
}

impl InvocationTarget {
    pub fn from_json(value: &Value) -> Result<Self, CodecError> {
        let (name, body) = variant(value)?;
        let body = body.ok_or_else(|| CodecError::InvalidJson("invocation target needs a body".into()))?;
        match name {
            "ByHash" => Ok(InvocationTarget::ByHash(super::parse_prefixed_hash(
                body.as_str()
                    .ok_or_else(|| CodecError::InvalidJson("ByHash must be hex".into()))?,
            )?)),
            "ByName" => Ok(InvocationTarget::ByName(
                body.as_str()
                    .ok_or_else(|| CodecError::InvalidJson("ByName must be a string".into()))?
                    .to_string(),
            )),
            "ByPackageHash" => Ok(InvocationTarget::ByPackageHash {
                addr: hash_field(body, "addr")?,
                version: optional_u32(body, "version")?,
                protocol_version_major: optional_u32(body, "protocol_version_major")?,
            }),
            "ByPackageName" => Ok(InvocationTarget::ByPackageName {
                name: str_field(body, "name")?.to_string(),
                version: optional_u32(body, "version")?,
                protocol_version_major: optional_u32(body, "protocol_version_major")?,
            }),
            other => Err(CodecError::InvalidJson(format!("unknown invocation target {}", other))),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let table = match self {
            InvocationTarget::ByHash(addr) => CallTable::variant(0).field(1, addr.to_vec()),
            InvocationTarget::ByName(name) => CallTable::variant(1).field_with(1, |w| {
                w.string(name);
            }),
            InvocationTarget::ByPackageHash {
                addr,
                version,
                protocol_version_major,
            } => CallTable::variant(2)
                .field(1, addr.to_vec())
                .field_with(2, |w| {
                    w.option_u32(*version);
                })
                .field_opt(3, protocol_version_major.map(|v| v.to_le_bytes().to_vec())),
            InvocationTarget::ByPackageName {
                name,
                version,
                protocol_version_major,
            } => CallTable::variant(3)
                .field_with(1, |w| {
                    w.string(name);
                })
                .field_with(2, |w| {
                    w.option_u32(*version);
                })
                .field_opt(3, protocol_version_major.map(|v| v.to_le_bytes().to_vec())),
        };
        table.finish()
    }
}

fn optional_u32(value: &Value, name: &str) -> Result<Option<u32>, CodecError> {
    match value.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => u32::try_from(u64_field(value, name)?)
            .map(Some)
            .map_err(|_| CodecError::InvalidJson(format!("{} out of range", name))),
    }
}

/// What the transaction executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionTarget {
    Native,
    Stored {
        id: InvocationTarget,
        runtime: TransactionRuntime,
    },
    Session {
        is_install_upgrade: bool,
        runtime: TransactionRuntime,
        module_bytes: Vec<u8>,
    },
}

impl TransactionTarget {
    pub fn from_json(value: &Value) -> Result<Self, CodecError> {
        match variant(value)? {
            ("Native", _) => Ok(TransactionTarget::Native),
            ("Stored", Some(body)) => Ok(TransactionTarget::Stored {
                id: InvocationTarget::from_json(field(body, "id")?)?,
                runtime: TransactionRuntime::from_json(field(body, "runtime")?)?,
            }),
            ("Session", Some(body)) => Ok(TransactionTarget::Session {
                is_install_upgrade: body
                    .get("is_install_upgrade")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                runtime: TransactionRuntime::from_json(field(body, "runtime")?)?,
                module_bytes: hex::decode(str_field(body, "module_bytes")?)?,
            }),
            (other, _) => Err(CodecError::InvalidJson(format!("unknown target {}", other))),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let table = match self {
            TransactionTarget::Native => CallTable::variant(0),
            TransactionTarget::Stored { id, runtime } => CallTable::variant(1)
                .field(1, id.to_bytes())
                .field(2, runtime.to_bytes()),
            TransactionTarget::Session {
                is_install_upgrade,
                runtime,
                module_bytes,
            } => CallTable::variant(2)
                .field(1, vec![*is_install_upgrade as u8])
                .field(2, runtime.to_bytes())
                .field_with(3, |w| {
                    w.bytes(module_bytes);
                }),
        };
        table.finish()
    }
}

// =============================================================================
// Entry point and scheduling
// =============================================================================

/// Entry point invoked by the transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryPoint {
    Call,
    Custom(String),
    Transfer,
    AddBid,
    WithdrawBid,
    Delegate,
    Undelegate,
    Redelegate,
    ActivateBid,
    ChangeBidPublicKey,
    AddReservations,
    CancelReservations,
    Burn,
}

impl EntryPoint {
    const UNIT_VARIANTS: [(&'static str, EntryPoint, u8); 12] = [
        ("Call", EntryPoint::Call, 0),
        ("Transfer", EntryPoint::Transfer, 2),
        ("AddBid", EntryPoint::AddBid, 3),
        ("WithdrawBid", EntryPoint::WithdrawBid, 4),
        ("Delegate", EntryPoint::Delegate, 5),
        ("Undelegate", EntryPoint::Undelegate, 6),
        ("Redelegate", EntryPoint::Redelegate, 7),
        ("ActivateBid", EntryPoint::ActivateBid, 8),
        ("ChangeBidPublicKey", EntryPoint::ChangeBidPublicKey, 9),
        ("AddReservations", EntryPoint::AddReservations, 10),
        ("CancelReservations", EntryPoint::CancelReservations, 11),
        ("Burn", EntryPoint::Burn, 12),
    ];

    pub fn from_json(value: &Value) -> Result<Self, CodecError> {
        match variant(value)? {
            ("Custom", Some(Value::String(name))) => Ok(EntryPoint::Custom(name.clone())),
            (name, None) => Self::UNIT_VARIANTS
                .iter()
                .find(|(n, _, _)| *n == name)
                .map(|(_, ep, _)| ep.clone())
                .ok_or_else(|| CodecError::InvalidJson(format!("unknown entry point {}", name))),
            (other, _) => Err(CodecError::InvalidJson(format!("bad entry point {}", other))),
        }
    }

    #[inline]
    pub fn tag(&self) -> u8 {
        match self {
            EntryPoint::Custom(_) => 1,
            other => Self::UNIT_VARIANTS
                .iter()
                .find(|(_, ep, _)| ep == other)
                .map(|(_, _, tag)| *tag)
                .unwrap_or(0),
        }
    }

    /// Display name: the custom name or the variant name.
    pub fn name(&self) -> &str {
        match self {
            EntryPoint::Custom(name) => name,
            other => Self::UNIT_VARIANTS
                .iter()
                .find(|(_, ep, _)| ep == other)
                .map(|(n, _, _)| *n)
                .unwrap_or("Call"),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let table = match self {
            EntryPoint::Custom(name) => CallTable::variant(1).field_with(1, |w| {
                w.string(name);
            }),
            other => CallTable::variant(other.tag()),
        };
        table.finish()
    }
}

/// When the transaction may execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scheduling {
    Standard,
    FutureEra(u64),
    FutureTimestamp(u64),
}

impl Scheduling {
    pub fn from_json(value: &Value) -> Result<Self, CodecError> {
        match variant(value)? {
            ("Standard", _) => Ok(Scheduling::Standard),
            ("FutureEra", Some(era)) => era
                .as_u64()
                .map(Scheduling::FutureEra)
                .ok_or_else(|| CodecError::InvalidJson("bad FutureEra".into())),
            ("FutureTimestamp", Some(Value::String(ts))) => {
                Ok(Scheduling::FutureTimestamp(time::parse_timestamp(ts)?))
            }
            (other, _) => Err(CodecError::InvalidJson(format!("unknown scheduling {}", other))),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let table = match self {
            Scheduling::Standard => CallTable::variant(0),
            Scheduling::FutureEra(era) => CallTable::variant(1).field_with(1, |w| {
                w.u64(*era);
            }),
            Scheduling::FutureTimestamp(ts) => CallTable::variant(2).field_with(1, |w| {
                w.u64(*ts);
            }),
        };
        table.finish()
    }
}

// =============================================================================
// Payload and transaction
// =============================================================================

/// Hashed body of a unified transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionV1Payload {
    pub initiator_addr: InitiatorAddr,
    pub timestamp: u64,
    pub ttl: u64,
    pub chain_name: String,
    pub pricing_mode: PricingMode,
    pub args: TransactionArgs,
    pub target: TransactionTarget,
    pub entry_point: EntryPoint,
    pub scheduling: Scheduling,
}

impl TransactionV1Payload {
    pub fn from_json(value: &Value) -> Result<Self, CodecError> {
        let fields = field(value, "fields")?;
        Ok(TransactionV1Payload {
            initiator_addr: InitiatorAddr::from_json(field(value, "initiator_addr")?)?,
            timestamp: time::parse_timestamp(str_field(value, "timestamp")?)?,
            ttl: time::parse_ttl(str_field(value, "ttl")?)?,
            chain_name: str_field(value, "chain_name")?.to_string(),
            pricing_mode: PricingMode::from_json(field(value, "pricing_mode")?)?,
            args: TransactionArgs::from_json(field(fields, "args")?)?,
            target: TransactionTarget::from_json(field(fields, "target")?)?,
            entry_point: EntryPoint::from_json(field(fields, "entry_point")?)?,
            scheduling: Scheduling::from_json(field(fields, "scheduling")?)?,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let entries = [
            (ARGS_MAP_KEY, self.args.to_bytes()),
            (TARGET_MAP_KEY, self.target.to_bytes()),
            (ENTRY_POINT_MAP_KEY, self.entry_point.to_bytes()),
            (SCHEDULING_MAP_KEY, self.scheduling.to_bytes()),
        ];
        let mut fields = Writer::new();
        fields.u32(entries.len() as u32);
        for (key, bytes) in &entries {
            fields.u16(*key).bytes(bytes);
        }

        CallTable::new()
            .field(0, self.initiator_addr.to_bytes())
            .field_with(1, |w| {
                w.u64(self.timestamp);
            })
            .field_with(2, |w| {
                w.u64(self.ttl);
            })
            .field_with(3, |w| {
                w.string(&self.chain_name);
            })
            .field(4, self.pricing_mode.to_bytes())
            .field(5, fields.into_bytes())
            .finish()
    }
}

/// Unified transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionV1 {
    pub hash: Hash256,
    pub payload: TransactionV1Payload,
    pub approvals: Vec<Approval>,
}

impl TransactionV1 {
    /// Parses a transaction without checking its hash.
    pub fn from_json(value: &Value) -> Result<Self, CodecError> {
        Ok(TransactionV1 {
            hash: hash_field(value, "hash")?,
            payload: TransactionV1Payload::from_json(field(value, "payload")?)?,
            approvals: Approval::list_from_json(value)?,
        })
    }

    pub fn compute_hash(&self) -> Hash256 {
        blake2b256(&self.payload.to_bytes())
    }

    pub fn check_hash(&self) -> Result<(), CodecError> {
        if self.compute_hash() != self.hash {
            return Err(CodecError::InvalidJson("transaction hash mismatch".into()));
        }
        Ok(())
    }

    /// Rewrites `hash` in a transaction JSON document.
    pub fn seal(value: &mut Value) -> Result<(), CodecError> {
        let tx = TransactionV1::from_json(value)?;
        value["hash"] = Value::String(hex::encode(tx.compute_hash()));
        Ok(())
    }
}
