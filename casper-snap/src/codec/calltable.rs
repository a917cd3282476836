//! Call-table envelopes.
//!
//! Unified transactions encode structs and enums as a field table:
//! `u32 count`, then `(u16 index, u32 offset)` per field, then the
//! concatenated field bytes as u32-length-prefixed data. Enum variants
//! put their tag in field 0.

use super::bytesrepr::Writer;

/// Builder for a call-table envelope.
#[derive(Debug, Default)]
pub struct CallTable {
    fields: Vec<(u16, Vec<u8>)>,
}

impl CallTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts an enum variant envelope with its tag in field 0.
    pub fn variant(tag: u8) -> Self {
        Self::new().field(0, vec![tag])
    }

    /// Appends a field. Indices must be added in ascending order.
    pub fn field(mut self, index: u16, bytes: Vec<u8>) -> Self {
        self.fields.push((index, bytes));
        self
    }

    /// Appends a field only when it has a value.
    pub fn field_opt(self, index: u16, bytes: Option<Vec<u8>>) -> Self {
        match bytes {
            Some(bytes) => self.field(index, bytes),
            None => self,
        }
    }

    /// Appends a field produced by a writer closure.
    pub fn field_with(self, index: u16, write: impl FnOnce(&mut Writer)) -> Self {
        let mut w = Writer::new();
        write(&mut w);
        self.field(index, w.into_bytes())
    }

    /// Serializes the envelope.
    pub fn finish(self) -> Vec<u8> {
        let mut w = Writer::new();
        w.u32(self.fields.len() as u32);
        let mut offset = 0u32;
        for (index, bytes) in &self.fields {
            w.u16(*index).u32(offset);
            offset += bytes.len() as u32;
        }
        w.u32(offset);
        for (_, bytes) in &self.fields {
            w.raw(bytes);
        }
        w.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_unit_variant() {
        let bytes = CallTable::variant(2).finish();
        assert_eq!(
            bytes,
            hex!("01000000 0000 00000000 01000000 02").to_vec()
        );
    }

    #[test]
    fn test_absent_optional_field() {
        let with_none = CallTable::variant(2).field_opt(1, None).finish();
        assert_eq!(with_none, CallTable::variant(2).finish());
        let with_some = CallTable::variant(2).field_opt(1, Some(vec![7])).finish();
        assert_eq!(with_some, CallTable::variant(2).field(1, vec![7]).finish());
    }

    #[test]
    fn test_variant_with_payload() {
        let bytes = CallTable::variant(1)
            .field_with(1, |w| {
                w.string("abc");
            })
            .finish();
        assert_eq!(
            bytes,
            hex!(
                "02000000"
                "0000 00000000"
                "0100 01000000"
                "08000000"
                "01"
                "03000000 616263"
            )
            .to_vec()
        );
    }
}
