//! CLValues and named runtime arguments.
//!
//! JSON form: `{"cl_type": <CLType>, "bytes": "<hex>", "parsed": ...}`.
//! The `parsed` member is informational and never trusted.

use serde_json::Value;

use super::bytesrepr::{CodecError, Writer};
use super::cltype::CLType;

/// Typed, serialized value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CLValue {
    pub cl_type: CLType,
    pub bytes: Vec<u8>,
}

impl CLValue {
    pub fn from_json(value: &Value) -> Result<Self, CodecError> {
        let cl_type = CLType::from_json(
            value
                .get("cl_type")
                .ok_or_else(|| CodecError::InvalidJson("CLValue missing cl_type".into()))?,
        )?;
        let bytes = value
            .get("bytes")
            .and_then(Value::as_str)
            .ok_or_else(|| CodecError::InvalidJson("CLValue missing bytes".into()))?;
        Ok(CLValue {
            cl_type,
            bytes: hex::decode(bytes)?,
        })
    }

    /// Appends bytes then type, as hashed inside runtime args.
    pub fn write_bytes(&self, w: &mut Writer) {
        w.bytes(&self.bytes);
        self.cl_type.write_bytes(w);
    }
}

/// Named argument passed to an entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedArg {
    pub name: String,
    pub value: CLValue,
}

/// Ordered list of named arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeArgs(pub Vec<NamedArg>);

impl RuntimeArgs {
    /// Parses `[[name, clvalue], ...]`. Also accepts `{name, value}` objects.
    pub fn from_json(value: &Value) -> Result<Self, CodecError> {
        let items = value
            .as_array()
            .ok_or_else(|| CodecError::InvalidJson("args must be an array".into()))?;
        let mut args = Vec::with_capacity(items.len());
        for item in items {
            let (name, value) = match item {
                Value::Array(pair) if pair.len() == 2 => (&pair[0], &pair[1]),
                Value::Object(obj) => (
                    obj.get("name").unwrap_or(&Value::Null),
                    obj.get("value").unwrap_or(&Value::Null),
                ),
                _ => return Err(CodecError::InvalidJson("malformed named arg".into())),
            };
            let name = name
                .as_str()
                .ok_or_else(|| CodecError::InvalidJson("arg name must be a string".into()))?;
            args.push(NamedArg {
                name: name.to_string(),
                value: CLValue::from_json(value)?,
            });
        }
        Ok(RuntimeArgs(args))
    }

    pub fn write_bytes(&self, w: &mut Writer) {
        w.u32(self.0.len() as u32);
        for arg in &self.0 {
            w.string(&arg.name);
            arg.value.write_bytes(w);
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::new();
        self.write_bytes(&mut w);
        w.into_bytes()
    }

    /// Returns the first argument with this name.
    pub fn get(&self, name: &str) -> Option<&CLValue> {
        self.0.iter().find(|a| a.name == name).map(|a| &a.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedArg> {
        self.0.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
