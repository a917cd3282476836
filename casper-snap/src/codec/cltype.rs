//! CLType descriptors.
//!
//! A CLType tells the decoder how to read the bytes of a CLValue. JSON
//! documents carry it either as a bare name (`"U512"`) or as a single-key
//! object for parameterized types (`{"List": "U8"}`).

use core::fmt;

use serde_json::Value;

use super::bytesrepr::{CodecError, Writer};

/// Maximum CLType nesting depth.
pub const MAX_TYPE_DEPTH: usize = 50;

/// Type descriptor of a CLValue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CLType {
    Bool,
    I32,
    I64,
    U8,
    U32,
    U64,
    U128,
    U256,
    U512,
    Unit,
    String,
    Key,
    URef,
    Option(Box<CLType>),
    List(Box<CLType>),
    ByteArray(u32),
    Result { ok: Box<CLType>, err: Box<CLType> },
    Map { key: Box<CLType>, value: Box<CLType> },
    Tuple1(Box<CLType>),
    Tuple2(Box<CLType>, Box<CLType>),
    Tuple3(Box<CLType>, Box<CLType>, Box<CLType>),
    Any,
    PublicKey,
}

impl CLType {
    /// Returns the wire tag of this type.
    pub fn tag(&self) -> u8 {
        match self {
            CLType::Bool => 0,
            CLType::I32 => 1,
            CLType::I64 => 2,
            CLType::U8 => 3,
            CLType::U32 => 4,
            CLType::U64 => 5,
            CLType::U128 => 6,
            CLType::U256 => 7,
            CLType::U512 => 8,
            CLType::Unit => 9,
            CLType::String => 10,
            CLType::Key => 11,
            CLType::URef => 12,
            CLType::Option(_) => 13,
            CLType::List(_) => 14,
            CLType::ByteArray(_) => 15,
            CLType::Result { .. } => 16,
            CLType::Map { .. } => 17,
            CLType::Tuple1(_) => 18,
            CLType::Tuple2(..) => 19,
            CLType::Tuple3(..) => 20,
            CLType::Any => 21,
            CLType::PublicKey => 22,
        }
    }

    /// Returns true for domain kinds whose bytes may not be understood.
    pub fn is_domain(&self) -> bool {
        matches!(self, CLType::Key | CLType::URef | CLType::PublicKey | CLType::Any)
    }

    /// Returns true if this type or any type nested in it is a domain kind.
    pub fn contains_domain(&self) -> bool {
        match self {
            CLType::Option(t) | CLType::List(t) | CLType::Tuple1(t) => t.contains_domain(),
            CLType::Result { ok: a, err: b }
            | CLType::Map { key: a, value: b }
            | CLType::Tuple2(a, b) => a.contains_domain() || b.contains_domain(),
            CLType::Tuple3(a, b, c) => {
                a.contains_domain() || b.contains_domain() || c.contains_domain()
            }
            other => other.is_domain(),
        }
    }

    /// Smallest possible encoding of a value of this type, in bytes.
    ///
    /// Used to bound collection counts against the remaining input.
    pub fn min_encoded_len(&self) -> usize {
        match self {
            CLType::Bool | CLType::U8 => 1,
            CLType::I32 | CLType::U32 => 4,
            CLType::I64 | CLType::U64 => 8,
            CLType::U128 | CLType::U256 | CLType::U512 => 1,
            CLType::Unit | CLType::Any => 0,
            CLType::String | CLType::List(_) | CLType::Map { .. } => 4,
            CLType::Key | CLType::PublicKey | CLType::Option(_) | CLType::Result { .. } => 1,
            CLType::URef => 33,
            CLType::ByteArray(n) => *n as usize,
            CLType::Tuple1(a) => a.min_encoded_len(),
            CLType::Tuple2(a, b) => a.min_encoded_len() + b.min_encoded_len(),
            CLType::Tuple3(a, b, c) => {
                a.min_encoded_len() + b.min_encoded_len() + c.min_encoded_len()
            }
        }
    }

    /// Parses the JSON form of a CLType.
    pub fn from_json(value: &Value) -> Result<Self, CodecError> {
        Self::from_json_at(value, 0)
    }

    fn from_json_at(value: &Value, depth: usize) -> Result<Self, CodecError> {
        if depth > MAX_TYPE_DEPTH {
            return Err(CodecError::TooDeep);
        }
        let inner = |v: &Value| Self::from_json_at(v, depth + 1).map(Box::new);

        match value {
            Value::String(name) => Self::simple(name)
                .ok_or_else(|| CodecError::InvalidJson(format!("unknown cl_type {}", name))),
            Value::Object(map) if map.len() == 1 => {
                let (name, body) = map
                    .iter()
                    .next()
                    .ok_or_else(|| CodecError::InvalidJson("empty cl_type".into()))?;
                match name.as_str() {
                    "Option" => Ok(CLType::Option(inner(body)?)),
                    "List" => Ok(CLType::List(inner(body)?)),
                    "ByteArray" => {
                        let n = body
                            .as_u64()
                            .and_then(|n| u32::try_from(n).ok())
                            .ok_or_else(|| CodecError::InvalidJson("bad ByteArray length".into()))?;
                        Ok(CLType::ByteArray(n))
                    }
                    "Result" => Ok(CLType::Result {
                        ok: inner(member(body, "ok")?)?,
                        err: inner(member(body, "err")?)?,
                    }),
                    "Map" => Ok(CLType::Map {
                        key: inner(member(body, "key")?)?,
                        value: inner(member(body, "value")?)?,
                    }),
                    "Tuple1" | "Tuple2" | "Tuple3" => {
                        let items = body
                            .as_array()
                            .ok_or_else(|| CodecError::InvalidJson("tuple must be an array".into()))?;
                        let mut types = items.iter().map(inner).collect::<Result<Vec<_>, _>>()?;
                        match (name.as_str(), types.len()) {
                            ("Tuple1", 1) => Ok(CLType::Tuple1(types.remove(0))),
                            ("Tuple2", 2) => {
                                let b = types.remove(1);
                                Ok(CLType::Tuple2(types.remove(0), b))
                            }
                            ("Tuple3", 3) => {
                                let c = types.remove(2);
                                let b = types.remove(1);
                                Ok(CLType::Tuple3(types.remove(0), b, c))
                            }
                            _ => Err(CodecError::InvalidJson(format!("bad {} arity", name))),
                        }
                    }
                    other => Err(CodecError::InvalidJson(format!("unknown cl_type {}", other))),
                }
            }
            _ => Err(CodecError::InvalidJson("cl_type must be a string or object".into())),
        }
    }

    fn simple(name: &str) -> Option<Self> {
        Some(match name {
            "Bool" => CLType::Bool,
            "I32" => CLType::I32,
            "I64" => CLType::I64,
            "U8" => CLType::U8,
            "U32" => CLType::U32,
            "U64" => CLType::U64,
            "U128" => CLType::U128,
            "U256" => CLType::U256,
            "U512" => CLType::U512,
            "Unit" => CLType::Unit,
            "String" => CLType::String,
            "Key" => CLType::Key,
            "URef" => CLType::URef,
            "Any" => CLType::Any,
            "PublicKey" => CLType::PublicKey,
            _ => return None,
        })
    }

    /// Appends the wire encoding of this type.
    pub fn write_bytes(&self, w: &mut Writer) {
        w.u8(self.tag());
        match self {
            CLType::Option(t) | CLType::List(t) | CLType::Tuple1(t) => t.write_bytes(w),
            CLType::ByteArray(n) => {
                w.u32(*n);
            }
            CLType::Result { ok, err } => {
                ok.write_bytes(w);
                err.write_bytes(w);
            }
            CLType::Map { key, value } => {
                key.write_bytes(w);
                value.write_bytes(w);
            }
            CLType::Tuple2(a, b) => {
                a.write_bytes(w);
                b.write_bytes(w);
            }
            CLType::Tuple3(a, b, c) => {
                a.write_bytes(w);
                b.write_bytes(w);
                c.write_bytes(w);
            }
            _ => {}
        }
    }
}

fn member<'a>(body: &'a Value, key: &str) -> Result<&'a Value, CodecError> {
    body.get(key)
        .ok_or_else(|| CodecError::InvalidJson(format!("missing {}", key)))
}

impl fmt::Display for CLType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CLType::Bool => f.write_str("Bool"),
            CLType::I32 => f.write_str("I32"),
            CLType::I64 => f.write_str("I64"),
            CLType::U8 => f.write_str("U8"),
            CLType::U32 => f.write_str("U32"),
            CLType::U64 => f.write_str("U64"),
            CLType::U128 => f.write_str("U128"),
            CLType::U256 => f.write_str("U256"),
            CLType::U512 => f.write_str("U512"),
            CLType::Unit => f.write_str("Unit"),
            CLType::String => f.write_str("String"),
            CLType::Key => f.write_str("Key"),
            CLType::URef => f.write_str("URef"),
            CLType::Any => f.write_str("Any"),
            CLType::PublicKey => f.write_str("PublicKey"),
            CLType::Option(t) => write!(f, "Option ({})", t),
            CLType::List(t) => write!(f, "List ({})", t),
            CLType::ByteArray(n) => write!(f, "ByteArray ({})", n),
            CLType::Result { ok, err } => write!(f, "Result (OK: {}, ERR: {})", ok, err),
            CLType::Map { key, value } => write!(f, "Map ({}: {})", key, value),
            CLType::Tuple1(a) => write!(f, "Tuple1 ({})", a),
            CLType::Tuple2(a, b) => write!(f, "Tuple2 ({}, {})", a, b),
            CLType::Tuple3(a, b, c) => write!(f, "Tuple3 ({}, {}, {})", a, b, c),
        }
    }
}
