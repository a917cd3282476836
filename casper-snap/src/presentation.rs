//! Confirmation payload construction.
//!
//! Projects a parsed envelope and its classification into everything the
//! confirmation dialog shows. The payload is display-only: it never holds
//! key material and building it has no side effects.

use num_bigint::BigUint;

use crate::classifier::{motes_to_cspr, Classification, DisplayArg, TransactionKind};
use crate::codec::{time, ACCOUNT_HASH_PREFIX};
use crate::decoder::TypedValue;
use crate::transaction::deploy::ExecutableDeployItem;
use crate::transaction::v1::{InitiatorAddr, InvocationTarget, PricingMode, TransactionTarget};
use crate::transaction::Transaction;

/// Strings at or under this many characters are shown whole.
const TRUNCATE_THRESHOLD: usize = 15;
const TRUNCATE_KEEP: usize = 5;

/// Shortens long identifiers to `first5...last5`.
pub fn truncate(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= TRUNCATE_THRESHOLD {
        return s.to_string();
    }
    let head: String = chars[..TRUNCATE_KEEP].iter().collect();
    let tail: String = chars[chars.len() - TRUNCATE_KEEP..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Truncates the hex part of an account hash, keeping its prefix.
pub fn truncate_account_hash(s: &str) -> String {
    let hex_part = s.strip_prefix(ACCOUNT_HASH_PREFIX).unwrap_or(s);
    format!("{}{}", ACCOUNT_HASH_PREFIX, truncate(hex_part))
}

/// Identifier shown shortened, with the full value alongside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub short: String,
    pub full: String,
    /// Search term for the block explorer.
    pub search: String,
}

impl Identifier {
    pub fn public_key(hex: &str) -> Self {
        Identifier {
            short: truncate(hex),
            full: hex.to_string(),
            search: hex.to_string(),
        }
    }

    pub fn account_hash(formatted: &str) -> Self {
        Identifier {
            short: truncate_account_hash(formatted),
            full: formatted.to_string(),
            search: formatted
                .strip_prefix(ACCOUNT_HASH_PREFIX)
                .unwrap_or(formatted)
                .to_string(),
        }
    }
}

/// How the transaction pays for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentInfo {
    Limited {
        gas_price_tolerance: u8,
        payment_amount: String,
    },
    Fixed {
        gas_price_tolerance: u8,
        additional_computation_factor: u8,
    },
    Prepaid {
        receipt: String,
    },
    /// Legacy standard payment: empty module bytes with an `amount` arg.
    Standard {
        amount: String,
    },
    Unsupported,
}

/// Stored contract addressed by the transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractTarget {
    Hash(String),
    Name(String),
    PackageHash { hash: String, version: Option<u32> },
    PackageName { name: String, version: Option<u32> },
}

impl ContractTarget {
    /// Version label, `Latest` when no version is pinned.
    pub fn version_label(version: Option<u32>) -> String {
        version
            .map(|v| v.to_string())
            .unwrap_or_else(|| "Latest".to_string())
    }
}

/// Contract target plus the entry point invoked on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub target: ContractTarget,
    pub entry_point: String,
}

/// Everything shown on the confirmation screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationPayload {
    pub kind: TransactionKind,
    pub title: String,
    pub origin: String,
    pub hash: String,
    pub signing_key: Identifier,
    pub initiator: Identifier,
    pub chain_name: String,
    pub timestamp: String,
    pub payment: PaymentInfo,
    pub body_hash: Option<String>,
    pub contract: Option<ContractCall>,
    pub args: Vec<DisplayArg>,
}

/// Builds the confirmation payload.
pub fn build(
    tx: &Transaction,
    classification: &Classification,
    signing_key_hex: &str,
    origin: &str,
) -> ConfirmationPayload {
    let initiator = match tx.initiator() {
        InitiatorAddr::PublicKey(pk) => Identifier::public_key(&pk.to_hex()),
        InitiatorAddr::AccountHash(ah) => Identifier::account_hash(&ah.to_string()),
    };

    let body_hash = match tx {
        Transaction::Deploy(d) => Some(hex::encode(d.header.body_hash)),
        Transaction::V1(_) => None,
    };

    ConfirmationPayload {
        kind: classification.kind,
        title: format!("{} request", classification.kind.label()),
        origin: origin.to_string(),
        hash: hex::encode(tx.hash()),
        signing_key: Identifier::public_key(signing_key_hex),
        initiator,
        chain_name: tx.chain_name().to_string(),
        timestamp: time::format_human(tx.timestamp()),
        payment: payment_info(tx),
        body_hash,
        contract: contract_call(tx, classification.kind),
        args: classification.args.clone(),
    }
}

fn payment_info(tx: &Transaction) -> PaymentInfo {
    match tx {
        Transaction::V1(v1) => match &v1.payload.pricing_mode {
            PricingMode::PaymentLimited {
                payment_amount,
                gas_price_tolerance,
                ..
            } => PaymentInfo::Limited {
                gas_price_tolerance: *gas_price_tolerance,
                payment_amount: motes_to_cspr(&BigUint::from(*payment_amount)),
            },
            PricingMode::Fixed {
                gas_price_tolerance,
                additional_computation_factor,
            } => PaymentInfo::Fixed {
                gas_price_tolerance: *gas_price_tolerance,
                additional_computation_factor: *additional_computation_factor,
            },
            PricingMode::Prepaid { receipt } => PaymentInfo::Prepaid {
                receipt: hex::encode(receipt),
            },
        },
        Transaction::Deploy(d) => match &d.payment {
            ExecutableDeployItem::ModuleBytes { module_bytes, args } if module_bytes.is_empty() => {
                let amount = args
                    .get("amount")
                    .and_then(|v| TypedValue::from_cl_value(v).ok())
                    .and_then(|v| v.as_big_uint());
                match amount {
                    Some(motes) => PaymentInfo::Standard {
                        amount: motes_to_cspr(&motes),
                    },
                    None => PaymentInfo::Unsupported,
                }
            }
            _ => PaymentInfo::Unsupported,
        },
    }
}

fn contract_call(tx: &Transaction, kind: TransactionKind) -> Option<ContractCall> {
    match tx {
        Transaction::V1(v1) => {
            let TransactionTarget::Stored { id, .. } = &v1.payload.target else {
                return None;
            };
            let target = match id {
                InvocationTarget::ByHash(addr) => ContractTarget::Hash(hex::encode(addr)),
                InvocationTarget::ByName(name) => ContractTarget::Name(name.clone()),
                InvocationTarget::ByPackageHash { addr, version, .. } => ContractTarget::PackageHash {
                    hash: hex::encode(addr),
                    version: *version,
                },
                InvocationTarget::ByPackageName { name, version, .. } => ContractTarget::PackageName {
                    name: name.clone(),
                    version: *version,
                },
            };
            let entry_point = match &v1.payload.entry_point {
                crate::transaction::v1::EntryPoint::Custom(name) => name.clone(),
                _ => kind.label().to_string(),
            };
            Some(ContractCall {
                target,
                entry_point,
            })
        }
        Transaction::Deploy(d) => {
            let target = match &d.session {
                ExecutableDeployItem::StoredContractByHash { hash, .. } => {
                    ContractTarget::Hash(hex::encode(hash))
                }
                ExecutableDeployItem::StoredContractByName { name, .. } => {
                    ContractTarget::Name(name.clone())
                }
                ExecutableDeployItem::StoredVersionedContractByHash { hash, version, .. } => {
                    ContractTarget::PackageHash {
                        hash: hex::encode(hash),
                        version: *version,
                    }
                }
                ExecutableDeployItem::StoredVersionedContractByName { name, version, .. } => {
                    ContractTarget::PackageName {
                        name: name.clone(),
                        version: *version,
                    }
                }
                ExecutableDeployItem::ModuleBytes { .. } | ExecutableDeployItem::Transfer { .. } => {
                    return None
                }
            };
            Some(ContractCall {
                target,
                entry_point: d.session.entry_point().unwrap_or_default().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::decoder::DecodeOptions;
    use crate::transaction::fixtures::{native_transfer_v1_json, transfer_json, ED25519_KEY};
    use crate::transaction::{detect, Transaction};
    use serde_json::{json, Value};

    fn payload_for(mut doc: Value) -> ConfirmationPayload {
        let (kind, _) = detect(&doc).unwrap();
        Transaction::seal(kind, &mut doc).unwrap();
        let tx = Transaction::from_json(kind, &doc).unwrap();
        let c = classify(&tx, None, &DecodeOptions::default()).unwrap();
        build(&tx, &c, ED25519_KEY, "https://dapp.example")
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short"), "short");
        assert_eq!(truncate("exactly15chars!"), "exactly15chars!");
        assert_eq!(truncate("0123456789abcdef"), "01234...bcdef");
        assert_eq!(
            truncate_account_hash(&format!("account-hash-{}", "ab".repeat(32))),
            "account-hash-ababa...babab"
        );
    }

    #[test]
    fn test_legacy_transfer_payload() {
        let p = payload_for(transfer_json());
        assert_eq!(p.title, "Transfer request");
        assert_eq!(p.origin, "https://dapp.example");
        assert_eq!(p.chain_name, "casper-test");
        assert_eq!(p.timestamp, "2024-05-01 12:00:00 UTC");
        assert_eq!(p.payment, PaymentInfo::Standard { amount: "0.1 CSPR".into() });
        assert!(p.body_hash.is_some());
        assert!(p.contract.is_none());
        assert_eq!(p.signing_key.short, "01c9e...f9c2c");
        assert_eq!(p.initiator.full, ED25519_KEY);
    }

    #[test]
    fn test_v1_payment_modes() {
        let p = payload_for(native_transfer_v1_json());
        assert_eq!(
            p.payment,
            PaymentInfo::Limited {
                gas_price_tolerance: 1,
                payment_amount: "0.1 CSPR".into()
            }
        );
        assert_eq!(p.body_hash, None);

        let mut doc = native_transfer_v1_json();
        doc["payload"]["pricing_mode"] = json!({ "Fixed": {
            "gas_price_tolerance": 3,
            "additional_computation_factor": 1
        }});
        assert_eq!(
            payload_for(doc).payment,
            PaymentInfo::Fixed {
                gas_price_tolerance: 3,
                additional_computation_factor: 1
            }
        );
    }

    #[test]
    fn test_v1_contract_target() {
        let mut doc = native_transfer_v1_json();
        doc["payload"]["fields"]["entry_point"] = json!({ "Custom": "mint" });
        doc["payload"]["fields"]["target"] = json!({ "Stored": {
            "id": { "ByPackageName": { "name": "cep18", "version": null } },
            "runtime": "VmCasperV1"
        }});
        let p = payload_for(doc);
        assert_eq!(p.title, "Contract Call request");
        let call = p.contract.unwrap();
        assert_eq!(call.entry_point, "mint");
        assert_eq!(
            call.target,
            ContractTarget::PackageName {
                name: "cep18".into(),
                version: None
            }
        );
        assert_eq!(ContractTarget::version_label(None), "Latest");
        assert_eq!(ContractTarget::version_label(Some(2)), "2");
    }

    #[test]
    fn test_account_hash_initiator() {
        let mut doc = native_transfer_v1_json();
        let hash = format!("account-hash-{}", "cd".repeat(32));
        doc["payload"]["initiator_addr"] = json!({ "AccountHash": hash });
        let p = payload_for(doc);
        assert_eq!(p.initiator.full, hash);
        assert_eq!(p.initiator.short, "account-hash-cdcdc...dcdcd");
        assert_eq!(p.initiator.search, "cd".repeat(32));
    }
}
