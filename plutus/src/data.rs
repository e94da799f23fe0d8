use super::*;
use super::schema::{Shape, TypeDesc};
use std::sync::Arc;

/// Byte strings longer than this encode as chunked indefinite strings.
pub(crate) const BYTES_CHUNK_SIZE: usize = 64;

/// Nesting bound for decoding and raw-item skipping.
pub(crate) const MAX_NESTING: usize = 128;

/// Integers are bounded to what the canonical integer forms can carry.
pub(crate) const INT_MIN: i128 = -(1i128 << 64);
pub(crate) const INT_MAX: i128 = (1i128 << 64) - 1;

/// A runtime value of the on-chain data model.
///
/// `List` and `IndefList` hold the same element structure and differ only in
/// which array framing they encode with; `Raw` carries an already-encoded
/// payload that round-trips byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlutusData {
    Int(i128),
    Bytes(Vec<u8>),
    List(Vec<PlutusData>),
    IndefList(Vec<PlutusData>),
    Map(Vec<(PlutusData, PlutusData)>),
    Constr(Constr),
    Raw(RawData),
}

impl PlutusData {
    pub fn int(value: impl Into<i128>) -> Self {
        PlutusData::Int(value.into())
    }

    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        PlutusData::Bytes(value.into())
    }

    pub fn constr(shape: &Arc<Shape>, fields: Vec<PlutusData>) -> Self {
        PlutusData::Constr(Constr::new(shape.clone(), fields))
    }

    /// The canonical empty value: constructor 0 with no fields.
    pub fn unit() -> Self {
        PlutusData::constr(&Shape::unit(), Vec::new())
    }

    /// Canonical binary encoding of this value.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        self.validate()?;
        Ok(cbor::encode::emit(self))
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            PlutusData::Int(_) => "int",
            PlutusData::Bytes(_) => "bytes",
            PlutusData::List(_) => "list",
            PlutusData::IndefList(_) => "indefinite list",
            PlutusData::Map(_) => "map",
            PlutusData::Constr(_) => "constructor",
            PlutusData::Raw(_) => "raw",
        }
    }

    /// Check the value tree against the shapes it claims, before the
    /// infallible emit runs.
    pub(crate) fn validate(&self) -> Result<(), Error> {
        match self {
            PlutusData::Int(value) => {
                if !(INT_MIN..=INT_MAX).contains(value) {
                    Err(Error::IntOutOfRange(*value))
                } else {
                    Ok(())
                }
            }
            PlutusData::Bytes(_) | PlutusData::Raw(_) => Ok(()),
            PlutusData::List(items) | PlutusData::IndefList(items) => {
                items.iter().try_for_each(PlutusData::validate)
            }
            PlutusData::Map(entries) => entries.iter().try_for_each(|(key, value)| {
                key.validate()?;
                value.validate()
            }),
            PlutusData::Constr(constr) => {
                constr.check_fields()?;
                constr.fields.iter().try_for_each(PlutusData::validate)
            }
        }
    }

    /// Structural conformance of this value to a declared type.
    ///
    /// Shallow at constructor boundaries: nested field values are checked by
    /// their own shape when [`validate`](Self::validate) recurses into them.
    pub(crate) fn conforms(&self, ty: &TypeDesc) -> bool {
        match (self, ty) {
            (PlutusData::Int(_), TypeDesc::Int) => true,
            (PlutusData::Bytes(_), TypeDesc::Bytes) => true,
            (PlutusData::List(items), TypeDesc::List(elem)) => {
                items.iter().all(|item| item.conforms(elem))
            }
            (PlutusData::IndefList(_), TypeDesc::AnyList) => true,
            (PlutusData::Map(entries), TypeDesc::Map(key_ty, value_ty)) => entries
                .iter()
                .all(|(key, value)| key.conforms(key_ty) && value.conforms(value_ty)),
            (PlutusData::Constr(constr), TypeDesc::Constr(shape)) => constr.shape == *shape,
            (value, TypeDesc::Union(alternatives)) => {
                alternatives.iter().any(|alt| value.conforms(alt))
            }
            (_, TypeDesc::Any) => true,
            _ => false,
        }
    }
}

impl cbor::encode::ToCbor for PlutusData {
    fn to_cbor(&self, encoder: &mut cbor::encode::Encoder) {
        match self {
            PlutusData::Int(value) => encoder.emit(value),
            PlutusData::Bytes(bytes) => emit_bytes(encoder, bytes),
            PlutusData::List(items) => encoder.emit_array(Some(items.len()), |a| {
                for item in items {
                    a.emit(item);
                }
            }),
            PlutusData::IndefList(items) => encoder.emit_array(None, |a| {
                for item in items {
                    a.emit(item);
                }
            }),
            PlutusData::Map(entries) => encoder.emit_map(Some(entries.len()), |m| {
                for (key, value) in entries {
                    m.emit(key);
                    m.emit(value);
                }
            }),
            PlutusData::Constr(constr) => encoder.emit(constr),
            PlutusData::Raw(raw) => encoder.emit_raw_slice(raw.bytes()),
        }
    }
}

fn emit_bytes(encoder: &mut cbor::encode::Encoder, bytes: &[u8]) {
    if bytes.len() <= BYTES_CHUNK_SIZE {
        encoder.emit(bytes);
    } else {
        encoder.emit_byte_stream(|s| {
            for chunk in bytes.chunks(BYTES_CHUNK_SIZE) {
                s.emit(chunk);
            }
        })
    }
}

/// A shape instance: the shape it was built against plus its field values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constr {
    pub shape: Arc<Shape>,
    pub fields: Vec<PlutusData>,
}

impl Constr {
    pub fn new(shape: Arc<Shape>, fields: Vec<PlutusData>) -> Self {
        Self { shape, fields }
    }

    pub(crate) fn check_fields(&self) -> Result<(), Error> {
        let declared = self.shape.fields();
        if self.fields.len() != declared.len() {
            return Err(Error::FieldCount {
                shape: self.shape.name().into(),
                expected: declared.len(),
                found: self.fields.len(),
            });
        }
        for (field, value) in declared.iter().zip(&self.fields) {
            if !value.conforms(&field.ty) {
                return Err(Error::FieldType {
                    shape: self.shape.name().into(),
                    field: field.name.clone(),
                    expected: field.ty.signature(),
                    found: value.kind(),
                });
            }
        }
        Ok(())
    }
}

impl cbor::encode::ToCbor for Constr {
    fn to_cbor(&self, encoder: &mut cbor::encode::Encoder) {
        // zero fields use the one definite form the tag scheme has
        let count = if self.fields.is_empty() {
            Some(0)
        } else {
            None
        };
        let id = self.shape.constr_id();
        match id {
            0..=6 => encoder.emit_array_tagged(count, [decode::TAG_COMPACT_BASE + id], |a| {
                for field in &self.fields {
                    a.emit(field);
                }
            }),
            7..=127 => {
                encoder.emit_array_tagged(count, [decode::TAG_EXTENDED_BASE + id - 7], |a| {
                    for field in &self.fields {
                        a.emit(field);
                    }
                })
            }
            _ => encoder.emit_array_tagged(Some(2), [decode::TAG_GENERAL], |a| {
                a.emit(&id);
                a.emit_array(count, |a| {
                    for field in &self.fields {
                        a.emit(field);
                    }
                });
            }),
        }
    }
}

/// An opaque, already-encoded payload carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawData(Vec<u8>);

impl RawData {
    /// Validate and capture one complete encoded item.
    pub fn from_slice(data: &[u8]) -> Result<Self, Error> {
        let mut decoder = cbor::decode::Decoder::new(data);
        decoder.skip_value(MAX_NESTING)?;
        if !decoder.is_complete() {
            return Err(Error::AdditionalData);
        }
        Ok(Self(data.to_vec()))
    }

    pub(crate) fn from_vec_unchecked(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}
