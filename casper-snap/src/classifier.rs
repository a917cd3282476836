//! Transaction intent classification.
//!
//! Decides what a deploy or unified transaction does (transfer, contract
//! call, WASM install, staking, or something we refuse to sign) and
//! extracts the arguments the user should see.

use casper_snap_common::{SnapError, MOTES_PER_CSPR};
use num_bigint::BigUint;
use num_traits::Zero;

use crate::codec::{AccountHash, Key, RuntimeArgs};
use crate::decoder::{decode, DecodeOptions, DisplayForm, TypedValue};
use crate::transaction::deploy::ExecutableDeployItem;
use crate::transaction::v1::{EntryPoint, TransactionArgs, TransactionTarget};
use crate::transaction::Transaction;

// =============================================================================
// Kinds
// =============================================================================

/// Native staking operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StakingAction {
    AddBid,
    WithdrawBid,
    Delegate,
    Undelegate,
    Redelegate,
    ActivateBid,
    ChangeBidPublicKey,
    AddReservations,
    CancelReservations,
}

impl StakingAction {
    pub fn label(self) -> &'static str {
        match self {
            StakingAction::AddBid => "Add Bid",
            StakingAction::WithdrawBid => "Withdraw Bid",
            StakingAction::Delegate => "Delegate",
            StakingAction::Undelegate => "Undelegate",
            StakingAction::Redelegate => "Redelegate",
            StakingAction::ActivateBid => "Activate Bid",
            StakingAction::ChangeBidPublicKey => "Change Bid Public Key",
            StakingAction::AddReservations => "Add Reservations",
            StakingAction::CancelReservations => "Cancel Reservations",
        }
    }
}

/// What a transaction does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Transfer,
    Wasm,
    ContractCall,
    Staking(StakingAction),
    Unsupported,
}

impl TransactionKind {
    pub fn label(self) -> &'static str {
        match self {
            TransactionKind::Transfer => "Transfer",
            TransactionKind::Wasm => "WASM-based",
            TransactionKind::ContractCall => "Contract Call",
            TransactionKind::Staking(action) => action.label(),
            TransactionKind::Unsupported => "Unsupported",
        }
    }

    /// Determines the kind of a parsed envelope.
    pub fn of(tx: &Transaction) -> Self {
        match tx {
            Transaction::Deploy(deploy) => match deploy.session {
                ExecutableDeployItem::Transfer { .. } => TransactionKind::Transfer,
                ExecutableDeployItem::ModuleBytes { .. } => TransactionKind::Wasm,
                ExecutableDeployItem::StoredContractByHash { .. }
                | ExecutableDeployItem::StoredContractByName { .. }
                | ExecutableDeployItem::StoredVersionedContractByHash { .. }
                | ExecutableDeployItem::StoredVersionedContractByName { .. } => {
                    TransactionKind::ContractCall
                }
            },
            Transaction::V1(v1) => {
                let staking = TransactionKind::Staking;
                match v1.payload.entry_point {
                    EntryPoint::Transfer => match v1.payload.args {
                        TransactionArgs::Named(_) => TransactionKind::Transfer,
                        // Recipient and amount cannot be shown from raw bytes.
                        TransactionArgs::Bytesrepr(_) => TransactionKind::Unsupported,
                    },
                    EntryPoint::AddBid => staking(StakingAction::AddBid),
                    EntryPoint::WithdrawBid => staking(StakingAction::WithdrawBid),
                    EntryPoint::Delegate => staking(StakingAction::Delegate),
                    EntryPoint::Undelegate => staking(StakingAction::Undelegate),
                    EntryPoint::Redelegate => staking(StakingAction::Redelegate),
                    EntryPoint::ActivateBid => staking(StakingAction::ActivateBid),
                    EntryPoint::ChangeBidPublicKey => staking(StakingAction::ChangeBidPublicKey),
                    EntryPoint::AddReservations => staking(StakingAction::AddReservations),
                    EntryPoint::CancelReservations => staking(StakingAction::CancelReservations),
                    EntryPoint::Call | EntryPoint::Custom(_) => match v1.payload.target {
                        TransactionTarget::Session { .. } => TransactionKind::Wasm,
                        TransactionTarget::Stored { .. } | TransactionTarget::Native => {
                            TransactionKind::ContractCall
                        }
                    },
                    EntryPoint::Burn => TransactionKind::Wasm,
                }
            }
        }
    }
}

// =============================================================================
// Classification
// =============================================================================

/// One argument as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayArg {
    pub name: String,
    pub value: DisplayForm,
}

impl DisplayArg {
    fn text(name: &str, value: String) -> Self {
        DisplayArg {
            name: name.to_string(),
            value: DisplayForm::Text(value),
        }
    }
}

/// Kind plus displayable arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: TransactionKind,
    pub args: Vec<DisplayArg>,
}

/// Classifies an envelope and extracts its display arguments.
///
/// For transfers, `expected_target` (a public key hex or an
/// `account-hash-` string) must resolve to the same account hash as the
/// transfer's `target` argument.
pub fn classify(
    tx: &Transaction,
    expected_target: Option<&str>,
    opts: &DecodeOptions,
) -> Result<Classification, SnapError> {
    let kind = TransactionKind::of(tx);

    let args = match (kind, tx) {
        (TransactionKind::Unsupported, _) => Vec::new(),
        (TransactionKind::Transfer, _) => {
            let named = tx.named_args().ok_or_else(|| {
                SnapError::MalformedInput("Transfer arguments must be named.".into())
            })?;
            transfer_args(named, expected_target, opts)?
        }
        (_, Transaction::V1(v1)) => match &v1.payload.args {
            TransactionArgs::Named(named) => {
                let native = v1.payload.target == TransactionTarget::Native;
                named_args(named, native, opts)?
            }
            TransactionArgs::Bytesrepr(bytes) => vec![DisplayArg::text("Bytes", hex::encode(bytes))],
        },
        (_, Transaction::Deploy(deploy)) => named_args(deploy.session.args(), false, opts)?,
    };

    Ok(Classification { kind, args })
}

fn decode_arg(name: &str, args: &RuntimeArgs) -> Result<Option<TypedValue>, SnapError> {
    args.get(name)
        .map(|value| {
            TypedValue::from_cl_value(value).map_err(|e| {
                SnapError::MalformedInput(format!("Unable to decode argument {}: {}", name, e))
            })
        })
        .transpose()
}

/// Every named argument, in order.
fn named_args(args: &RuntimeArgs, cspr_amount: bool, opts: &DecodeOptions) -> Result<Vec<DisplayArg>, SnapError> {
    args.iter()
        .map(|arg| {
            let value = TypedValue::from_cl_value(&arg.value).map_err(|e| {
                SnapError::MalformedInput(format!("Unable to decode argument {}: {}", arg.name, e))
            })?;
            let shown = match value.as_big_uint() {
                Some(motes) if cspr_amount && arg.name == "amount" => {
                    DisplayForm::Text(motes_to_cspr(&motes))
                }
                _ => decode(&value, opts),
            };
            Ok(DisplayArg {
                name: arg.name.clone(),
                value: shown,
            })
        })
        .collect()
}

/// Recipient, amount and optional transfer id.
fn transfer_args(
    args: &RuntimeArgs,
    expected_target: Option<&str>,
    opts: &DecodeOptions,
) -> Result<Vec<DisplayArg>, SnapError> {
    let mut shown = Vec::new();

    let target = decode_arg("target", args)?
        .ok_or_else(|| SnapError::MalformedInput("Transfer is missing its target.".into()))?;
    let (recipient, recipient_hash) = recipient(&target, opts);

    if let Some(expected) = expected_target {
        let expected_hash = AccountHash::from_key_or_hash(expected)
            .map_err(|e| SnapError::MalformedInput(format!("Invalid expected target: {}", e)))?;
        if recipient_hash != Some(expected_hash) {
            return Err(SnapError::MalformedInput(
                "Transfer target does not match the expected target.".into(),
            ));
        }
    }
    shown.push(DisplayArg::text("Recipient", recipient));

    if let Some(amount) = decode_arg("amount", args)? {
        let text = match amount.as_big_uint() {
            Some(motes) => motes_to_cspr(&motes),
            None => decode(&amount, opts).to_string(),
        };
        shown.push(DisplayArg::text("Amount", text));
    }

    match decode_arg("id", args)? {
        None | Some(TypedValue::Option { value: None, .. }) => {}
        Some(id) => shown.push(DisplayArg::text("Transfer ID", decode(&id, opts).to_string())),
    }

    Ok(shown)
}

/// Display form of a transfer target plus its account hash, if it has one.
fn recipient(target: &TypedValue, opts: &DecodeOptions) -> (String, Option<AccountHash>) {
    match target {
        TypedValue::PublicKey(pk) => (pk.to_hex(), Some(pk.to_account_hash())),
        TypedValue::Key(Key::Account(hash)) => (hash.to_string(), Some(*hash)),
        TypedValue::ByteArray(bytes) => match <[u8; 32]>::try_from(bytes.as_slice()) {
            Ok(raw) => {
                let hash = AccountHash(raw);
                (hash.to_string(), Some(hash))
            }
            Err(_) => (hex::encode(bytes), None),
        },
        other => (decode(other, opts).to_string(), None),
    }
}

/// Formats motes as CSPR with trailing zeros trimmed, e.g. `2.5 CSPR`.
pub fn motes_to_cspr(motes: &BigUint) -> String {
    let unit = BigUint::from(MOTES_PER_CSPR);
    let whole = motes / &unit;
    let frac = motes % &unit;
    if frac.is_zero() {
        return format!("{} CSPR", whole);
    }
    let frac = format!("{:09}", frac);
    format!("{}.{} CSPR", whole, frac.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::fixtures::{native_transfer_v1_json, transfer_json, ED25519_KEY};
    use crate::transaction::{detect, Transaction};
    use serde_json::{json, Value};

    fn parse(mut doc: Value) -> Transaction {
        let (kind, _) = detect(&doc).unwrap();
        Transaction::seal(kind, &mut doc).unwrap();
        Transaction::from_json(kind, &doc).unwrap()
    }

    fn arg<'a>(c: &'a Classification, name: &str) -> Option<String> {
        c.args
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.to_string())
    }

    #[test]
    fn test_motes_to_cspr() {
        assert_eq!(motes_to_cspr(&BigUint::from(5_000_000_000u64)), "5 CSPR");
        assert_eq!(motes_to_cspr(&BigUint::from(2_500_000_000u64)), "2.5 CSPR");
        assert_eq!(motes_to_cspr(&BigUint::from(1u64)), "0.000000001 CSPR");
        assert_eq!(motes_to_cspr(&BigUint::zero()), "0 CSPR");
    }

    #[test]
    fn test_legacy_transfer() {
        let tx = parse(transfer_json());
        let c = classify(&tx, None, &DecodeOptions::default()).unwrap();
        assert_eq!(c.kind, TransactionKind::Transfer);
        assert_eq!(c.kind.label(), "Transfer");
        assert_eq!(
            arg(&c, "Recipient").unwrap(),
            format!("account-hash-{}", "ab".repeat(32))
        );
        assert_eq!(arg(&c, "Amount").unwrap(), "5 CSPR");
        assert_eq!(arg(&c, "Transfer ID").unwrap(), "7");
    }

    #[test]
    fn test_expected_target_matches() {
        let tx = parse(transfer_json());
        let expected = format!("account-hash-{}", "ab".repeat(32));
        assert!(classify(&tx, Some(&expected), &DecodeOptions::default()).is_ok());

        let other = format!("account-hash-{}", "cd".repeat(32));
        let err = classify(&tx, Some(&other), &DecodeOptions::default()).unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_v1_transfer_to_public_key() {
        let tx = parse(native_transfer_v1_json());
        let c = classify(&tx, Some(ED25519_KEY), &DecodeOptions::default()).unwrap();
        assert_eq!(c.kind, TransactionKind::Transfer);
        assert_eq!(arg(&c, "Recipient").unwrap(), ED25519_KEY);
        assert!(arg(&c, "Transfer ID").is_none());

        // The account hash of the key is accepted as the same target.
        let pk = crate::codec::PublicKey::from_hex(ED25519_KEY).unwrap();
        let hash = pk.to_account_hash().to_string();
        assert!(classify(&tx, Some(&hash), &DecodeOptions::default()).is_ok());
    }

    #[test]
    fn test_deploy_session_kinds() {
        let mut doc = transfer_json();
        doc["session"] = json!({
            "ModuleBytes": { "module_bytes": "0061736d", "args": [] }
        });
        assert_eq!(TransactionKind::of(&parse(doc)), TransactionKind::Wasm);

        let mut doc = transfer_json();
        doc["session"] = json!({
            "StoredContractByName": {
                "name": "faucet",
                "entry_point": "call",
                "args": [["count", { "cl_type": "U32", "bytes": "02000000", "parsed": 2 }]]
            }
        });
        let tx = parse(doc);
        let c = classify(&tx, None, &DecodeOptions::default()).unwrap();
        assert_eq!(c.kind.label(), "Contract Call");
        assert_eq!(arg(&c, "count").unwrap(), "2");
    }

    #[test]
    fn test_v1_entry_points() {
        let mut doc = native_transfer_v1_json();
        doc["payload"]["fields"]["entry_point"] = json!("Delegate");
        doc["payload"]["fields"]["args"] = json!({ "Named": [
            ["amount", { "cl_type": "U512", "bytes": "0400f90295", "parsed": "2500000000" }]
        ]});
        let tx = parse(doc);
        let c = classify(&tx, None, &DecodeOptions::default()).unwrap();
        assert_eq!(c.kind, TransactionKind::Staking(StakingAction::Delegate));
        assert_eq!(arg(&c, "amount").unwrap(), "2.5 CSPR");

        let mut doc = native_transfer_v1_json();
        doc["payload"]["fields"]["entry_point"] = json!("Call");
        let tx = parse(doc);
        assert_eq!(TransactionKind::of(&tx), TransactionKind::ContractCall);

        let mut doc = native_transfer_v1_json();
        doc["payload"]["fields"]["entry_point"] = json!({ "Custom": "freeze" });
        let c = classify(&parse(doc), None, &DecodeOptions::default()).unwrap();
        assert_eq!(c.kind, TransactionKind::ContractCall);
        assert_eq!(c.kind.label(), "Contract Call");
        assert!(arg(&c, "target").is_some());

        let mut doc = native_transfer_v1_json();
        doc["payload"]["fields"]["args"] = json!({ "Bytesrepr": "deadbeef" });
        assert_eq!(TransactionKind::of(&parse(doc)), TransactionKind::Unsupported);

        let mut doc = native_transfer_v1_json();
        doc["payload"]["fields"]["entry_point"] = json!("Burn");
        assert_eq!(TransactionKind::of(&parse(doc)), TransactionKind::Wasm);
    }

    #[test]
    fn test_v1_stored_and_session_targets() {
        let mut doc = native_transfer_v1_json();
        doc["payload"]["fields"]["entry_point"] = json!({ "Custom": "mint" });
        doc["payload"]["fields"]["target"] = json!({ "Stored": {
            "id": { "ByName": "cep18" },
            "runtime": "VmCasperV1"
        }});
        assert_eq!(TransactionKind::of(&parse(doc)), TransactionKind::ContractCall);

        let mut doc = native_transfer_v1_json();
        doc["payload"]["fields"]["entry_point"] = json!("Call");
        doc["payload"]["fields"]["target"] = json!({ "Session": {
            "is_install_upgrade": true,
            "runtime": "VmCasperV1",
            "module_bytes": "0061736d"
        }});
        assert_eq!(TransactionKind::of(&parse(doc)), TransactionKind::Wasm);
    }

    #[test]
    fn test_bytesrepr_args() {
        let mut doc = native_transfer_v1_json();
        doc["payload"]["fields"]["entry_point"] = json!("Call");
        doc["payload"]["fields"]["target"] = json!({ "Stored": {
            "id": { "ByName": "cep18" },
            "runtime": "VmCasperV1"
        }});
        doc["payload"]["fields"]["args"] = json!({ "Bytesrepr": "deadbeef" });
        let c = classify(&parse(doc), None, &DecodeOptions::default()).unwrap();
        assert_eq!(c.args.len(), 1);
        assert_eq!(arg(&c, "Bytes").unwrap(), "deadbeef");
    }

    #[test]
    fn test_undecodable_arg_is_an_error() {
        let mut doc = transfer_json();
        doc["session"] = json!({
            "ModuleBytes": {
                "module_bytes": "",
                "args": [["list", { "cl_type": { "List": "U8" }, "bytes": "05000000", "parsed": null }]]
            }
        });
        let err = classify(&parse(doc), None, &DecodeOptions::default()).unwrap_err();
        assert!(err.to_string().starts_with("Unable to decode argument list"));
    }
}
