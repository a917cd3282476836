//! Typed value decoding for display.
//!
//! Turns the bytes of a CLValue into a [`TypedValue`] tree, then renders
//! that tree into a [`DisplayForm`] a user can audit on the confirmation
//! screen.
//!
//! # Security
//!
//! Argument bytes come from an untrusted caller. The decoder:
//! - Bounds recursion depth
//! - Bounds collection counts against the remaining input
//! - Requires every byte to be consumed
//! - Never truncates a structural value silently

use core::fmt;

use num_bigint::BigUint;
use thiserror::Error;

use crate::codec::{CLType, CLValue, CodecError, Key, PublicKey, Reader, URef};

/// Maximum nesting depth of a decoded value.
pub const MAX_VALUE_DEPTH: usize = 50;

/// Upper bound on elements of zero-sized types (e.g. `List (Unit)`).
const MAX_ZERO_SIZED_COUNT: usize = 1024;

/// Errors raised while decoding value bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// `Any` carries no length, so it cannot sit inside a structure.
    #[error("Any value cannot be nested")]
    UnsizedAny,
    /// Collection count larger than the input can hold.
    #[error("collection of {0} elements exceeds remaining input")]
    CountOverflow(usize),
    #[error("value nesting exceeds depth limit")]
    TooDeep,
}

// =============================================================================
// Typed values
// =============================================================================

/// Decoded value together with enough type information to render it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    Bool(bool),
    I32(i32),
    I64(i64),
    U8(u8),
    U32(u32),
    U64(u64),
    U128(BigUint),
    U256(BigUint),
    U512(BigUint),
    Unit,
    String(String),
    ByteArray(Vec<u8>),
    Key(Key),
    URef(URef),
    PublicKey(PublicKey),
    Option {
        inner_type: CLType,
        value: Option<Box<TypedValue>>,
    },
    List {
        element_type: CLType,
        items: Vec<TypedValue>,
    },
    Map {
        key_type: CLType,
        value_type: CLType,
        entries: Vec<(TypedValue, TypedValue)>,
    },
    Result {
        ok_type: CLType,
        err_type: CLType,
        is_ok: bool,
        value: Box<TypedValue>,
    },
    Tuple1(Box<TypedValue>),
    Tuple2(Box<TypedValue>, Box<TypedValue>),
    Tuple3(Box<TypedValue>, Box<TypedValue>, Box<TypedValue>),
    /// Domain value whose bytes could not be understood, or `Any`.
    Opaque { cl_type: CLType, bytes: Vec<u8> },
}

impl TypedValue {
    /// Decodes `bytes` as a value of `cl_type`, consuming all of them.
    ///
    /// A value whose type holds a domain kind (key, uref, public key, any)
    /// at any depth and fails to parse is kept whole as
    /// [`TypedValue::Opaque`]; no element of it is shown decoded. Values of
    /// purely primitive types propagate the failure.
    pub fn from_bytes(cl_type: &CLType, bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new(bytes);
        let parsed = match read_value(&mut r, cl_type, 0) {
            Ok(value) => r.finish().map(|_| value).map_err(DecodeError::from),
            Err(e) => Err(e),
        };
        match parsed {
            Err(_) if cl_type.contains_domain() => Ok(TypedValue::Opaque {
                cl_type: cl_type.clone(),
                bytes: bytes.to_vec(),
            }),
            other => other,
        }
    }

    /// Decodes a CLValue.
    pub fn from_cl_value(value: &CLValue) -> Result<Self, DecodeError> {
        Self::from_bytes(&value.cl_type, &value.bytes)
    }

    /// Type of this value.
    pub fn cl_type(&self) -> CLType {
        match self {
            TypedValue::Bool(_) => CLType::Bool,
            TypedValue::I32(_) => CLType::I32,
            TypedValue::I64(_) => CLType::I64,
            TypedValue::U8(_) => CLType::U8,
            TypedValue::U32(_) => CLType::U32,
            TypedValue::U64(_) => CLType::U64,
            TypedValue::U128(_) => CLType::U128,
            TypedValue::U256(_) => CLType::U256,
            TypedValue::U512(_) => CLType::U512,
            TypedValue::Unit => CLType::Unit,
            TypedValue::String(_) => CLType::String,
            TypedValue::ByteArray(b) => CLType::ByteArray(b.len() as u32),
            TypedValue::Key(_) => CLType::Key,
            TypedValue::URef(_) => CLType::URef,
            TypedValue::PublicKey(_) => CLType::PublicKey,
            TypedValue::Option { inner_type, .. } => CLType::Option(Box::new(inner_type.clone())),
            TypedValue::List { element_type, .. } => CLType::List(Box::new(element_type.clone())),
            TypedValue::Map {
                key_type,
                value_type,
                ..
            } => CLType::Map {
                key: Box::new(key_type.clone()),
                value: Box::new(value_type.clone()),
            },
            TypedValue::Result {
                ok_type, err_type, ..
            } => CLType::Result {
                ok: Box::new(ok_type.clone()),
                err: Box::new(err_type.clone()),
            },
            TypedValue::Tuple1(a) => CLType::Tuple1(Box::new(a.cl_type())),
            TypedValue::Tuple2(a, b) => CLType::Tuple2(Box::new(a.cl_type()), Box::new(b.cl_type())),
            TypedValue::Tuple3(a, b, c) => CLType::Tuple3(
                Box::new(a.cl_type()),
                Box::new(b.cl_type()),
                Box::new(c.cl_type()),
            ),
            TypedValue::Opaque { cl_type, .. } => cl_type.clone(),
        }
    }

    /// Unsigned integer value, if this is one.
    pub fn as_big_uint(&self) -> Option<BigUint> {
        match self {
            TypedValue::U8(v) => Some(BigUint::from(*v)),
            TypedValue::U32(v) => Some(BigUint::from(*v)),
            TypedValue::U64(v) => Some(BigUint::from(*v)),
            TypedValue::U128(v) | TypedValue::U256(v) | TypedValue::U512(v) => Some(v.clone()),
            _ => None,
        }
    }
}

fn read_value(r: &mut Reader<'_>, cl_type: &CLType, depth: usize) -> Result<TypedValue, DecodeError> {
    if depth > MAX_VALUE_DEPTH {
        return Err(DecodeError::TooDeep);
    }
    let next = depth + 1;

    let value = match cl_type {
        CLType::Bool => TypedValue::Bool(r.bool()?),
        CLType::I32 => TypedValue::I32(r.i32()?),
        CLType::I64 => TypedValue::I64(r.i64()?),
        CLType::U8 => TypedValue::U8(r.u8()?),
        CLType::U32 => TypedValue::U32(r.u32()?),
        CLType::U64 => TypedValue::U64(r.u64()?),
        CLType::U128 => TypedValue::U128(r.big_uint(16)?),
        CLType::U256 => TypedValue::U256(r.big_uint(32)?),
        CLType::U512 => TypedValue::U512(r.big_uint(64)?),
        CLType::Unit => TypedValue::Unit,
        CLType::String => TypedValue::String(r.string()?),
        CLType::ByteArray(n) => TypedValue::ByteArray(r.take(*n as usize)?.to_vec()),
        CLType::Key => TypedValue::Key(Key::read(r)?),
        CLType::URef => TypedValue::URef(URef::read(r)?),
        CLType::PublicKey => TypedValue::PublicKey(PublicKey::read(r)?),
        CLType::Any => return Err(DecodeError::UnsizedAny),
        CLType::Option(inner) => {
            let value = match r.u8()? {
                0 => None,
                1 => Some(Box::new(read_value(r, inner, next)?)),
                tag => return Err(CodecError::InvalidTag(tag).into()),
            };
            TypedValue::Option {
                inner_type: (**inner).clone(),
                value,
            }
        }
        CLType::List(element) => {
            let count = read_count(r, element.min_encoded_len())?;
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(read_value(r, element, next)?);
            }
            TypedValue::List {
                element_type: (**element).clone(),
                items,
            }
        }
        CLType::Map { key, value } => {
            let count = read_count(r, key.min_encoded_len() + value.min_encoded_len())?;
            let mut entries = Vec::with_capacity(count);
            for _ in 0..count {
                let k = read_value(r, key, next)?;
                let v = read_value(r, value, next)?;
                entries.push((k, v));
            }
            TypedValue::Map {
                key_type: (**key).clone(),
                value_type: (**value).clone(),
                entries,
            }
        }
        CLType::Result { ok, err } => {
            let (is_ok, value) = match r.u8()? {
                0 => (false, read_value(r, err, next)?),
                1 => (true, read_value(r, ok, next)?),
                tag => return Err(CodecError::InvalidTag(tag).into()),
            };
            TypedValue::Result {
                ok_type: (**ok).clone(),
                err_type: (**err).clone(),
                is_ok,
                value: Box::new(value),
            }
        }
        CLType::Tuple1(a) => TypedValue::Tuple1(Box::new(read_value(r, a, next)?)),
        CLType::Tuple2(a, b) => TypedValue::Tuple2(
            Box::new(read_value(r, a, next)?),
            Box::new(read_value(r, b, next)?),
        ),
        CLType::Tuple3(a, b, c) => TypedValue::Tuple3(
            Box::new(read_value(r, a, next)?),
            Box::new(read_value(r, b, next)?),
            Box::new(read_value(r, c, next)?),
        ),
    };
    Ok(value)
}

/// Reads a u32 element count and bounds it by the remaining input.
fn read_count(r: &mut Reader<'_>, min_element_len: usize) -> Result<usize, DecodeError> {
    let count = r.u32()? as usize;
    let fits = match min_element_len {
        0 => count <= MAX_ZERO_SIZED_COUNT,
        n => count
            .checked_mul(n)
            .is_some_and(|needed| needed <= r.remaining()),
    };
    if !fits {
        return Err(DecodeError::CountOverflow(count));
    }
    Ok(count)
}

// =============================================================================
// Rendering
// =============================================================================

/// Rendered value: a single line or a list of lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayForm {
    Text(String),
    List(Vec<String>),
}

impl DisplayForm {
    pub fn is_list(&self) -> bool {
        matches!(self, DisplayForm::List(_))
    }
}

impl fmt::Display for DisplayForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayForm::Text(s) => f.write_str(s),
            DisplayForm::List(items) => f.write_str(&items.join(",")),
        }
    }
}

/// Rendering options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Render nested lists as `[a,b]` instead of `<type>[...]`.
    pub expand_nested_lists: bool,
}

/// Renders a decoded value.
pub fn decode(value: &TypedValue, opts: &DecodeOptions) -> DisplayForm {
    let text = DisplayForm::Text;
    match value {
        TypedValue::Bool(b) => text(b.to_string()),
        TypedValue::I32(v) => text(v.to_string()),
        TypedValue::I64(v) => text(v.to_string()),
        TypedValue::U8(v) => text(v.to_string()),
        TypedValue::U32(v) => text(v.to_string()),
        TypedValue::U64(v) => text(v.to_string()),
        TypedValue::U128(v) | TypedValue::U256(v) | TypedValue::U512(v) => text(v.to_str_radix(10)),
        TypedValue::Unit => text("Unit".into()),
        TypedValue::String(s) => text(s.clone()),
        TypedValue::ByteArray(b) => text(hex::encode(b)),
        TypedValue::Key(k) => text(k.to_string()),
        TypedValue::URef(u) => text(u.to_string()),
        TypedValue::PublicKey(pk) => text(pk.to_hex()),
        TypedValue::Option { inner_type, value } => match value {
            None => text(format!("None {}", inner_type)),
            Some(inner) => decode(inner, opts),
        },
        TypedValue::Result { is_ok, value, .. } => {
            let prefix = if *is_ok { "OK: " } else { "ERR: " };
            text(format!("{}{}", prefix, decode(value, opts)))
        }
        TypedValue::Map { entries, .. } => text(
            entries
                .iter()
                .map(|(k, v)| format!("{}={}", decode(k, opts), decode(v, opts)))
                .collect::<Vec<_>>()
                .join(", "),
        ),
        TypedValue::List { items, .. } => {
            DisplayForm::List(items.iter().map(|item| element(item, opts)).collect())
        }
        TypedValue::Tuple1(a) => decode(a, opts),
        TypedValue::Tuple2(a, b) => DisplayForm::List(vec![element(a, opts), element(b, opts)]),
        TypedValue::Tuple3(a, b, c) => {
            DisplayForm::List(vec![element(a, opts), element(b, opts), element(c, opts)])
        }
        TypedValue::Opaque { cl_type, bytes } => text(format!("{}:{}", cl_type, hex::encode(bytes))),
    }
}

/// Renders one element of a list or tuple.
fn element(value: &TypedValue, opts: &DecodeOptions) -> String {
    match decode(value, opts) {
        DisplayForm::Text(s) => s,
        DisplayForm::List(items) if opts.expand_nested_lists => format!("[{}]", items.join(",")),
        DisplayForm::List(_) => {
            let shown = match value {
                TypedValue::List { element_type, .. } => element_type.clone(),
                other => other.cl_type(),
            };
            format!("<{}>[...]", shown)
        }
    }
}

/// Decodes and renders a CLValue in one step.
pub fn render_cl_value(value: &CLValue, opts: &DecodeOptions) -> Result<DisplayForm, DecodeError> {
    Ok(decode(&TypedValue::from_cl_value(value)?, opts))
}
