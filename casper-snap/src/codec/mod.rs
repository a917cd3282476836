//! Casper wire formats.
//!
//! This module provides:
//! - `bytesrepr` primitives (the canonical binary encoding)
//! - Call-table envelopes used by unified transactions
//! - CLType / CLValue models and their JSON forms
//! - Public keys, signatures, account hashes, keys and URefs
//!
//! # Security
//!
//! All parsing happens on untrusted input. Parsers must:
//! - Validate all length fields before access
//! - Fail closed on any malformed data
//! - Avoid unbounded allocations

pub mod bytesrepr;
pub mod calltable;
pub mod cltype;
pub mod clvalue;
pub mod key;
pub mod public_key;
pub mod time;

pub use bytesrepr::{CodecError, Reader, Writer};
pub use calltable::CallTable;
pub use cltype::CLType;
pub use clvalue::{CLValue, NamedArg, RuntimeArgs};
pub use key::{EntityKind, Key, URef};
pub use public_key::{parse_hash, AccountHash, PublicKey, Signature, ACCOUNT_HASH_PREFIX};
