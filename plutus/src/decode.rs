/*!
Shape-driven decoding of the canonical binary form.

Decoding always runs against a declared [`Shape`] or [`TypeDesc`]; the wire
carries constructor ids, not schemas. Union fields are resolved by trying
each declared alternative in order against a checkpointed cursor.
*/

use super::*;
use super::data::{Constr, MAX_NESTING, PlutusData, RawData};
use super::error::CaptureFieldErr;
use super::schema::{Shape, TypeDesc};
use chaindata_cbor::decode::Decoder;
use std::sync::Arc;

/// Compact tag range, constructor ids 0..=6.
pub(crate) const TAG_COMPACT_BASE: u64 = 121;

/// Extended tag range, constructor ids 7..=127.
pub(crate) const TAG_EXTENDED_BASE: u64 = 1280;

/// General form: a two-element array of id and field list.
pub(crate) const TAG_GENERAL: u64 = 102;

impl Shape {
    /// Decode one complete encoded value of this shape.
    pub fn decode(self: &Arc<Self>, data: &[u8]) -> Result<PlutusData, Error> {
        let mut decoder = Decoder::new(data);
        let value = decode_constr(&mut decoder, self, MAX_NESTING)
            .inspect_err(|e| trace!("decoding {} failed: {e}", self.name()))?;
        if !decoder.is_complete() {
            return Err(Error::AdditionalData);
        }
        Ok(value)
    }
}

pub(crate) fn decode_constr(
    decoder: &mut Decoder,
    shape: &Arc<Shape>,
    depth: usize,
) -> Result<PlutusData, Error> {
    let tags = decoder.parse_tags()?;
    let &[tag] = tags.as_slice() else {
        return Err(Error::UnsupportedInput(format!(
            "expected a single constructor tag, found {} tags",
            tags.len()
        )));
    };

    match tag {
        TAG_COMPACT_BASE..=127 => {
            check_id(shape, tag - TAG_COMPACT_BASE)?;
            decode_fields(decoder, shape, depth)
        }
        TAG_EXTENDED_BASE..=1400 => {
            check_id(shape, tag - TAG_EXTENDED_BASE + 7)?;
            decode_fields(decoder, shape, depth)
        }
        TAG_GENERAL => {
            let header = decoder.parse_array_header()?;
            if matches!(header, Some(count) if count != 2) {
                return Err(Error::Malformed(format!(
                    "general constructor form carries {} items, expected 2",
                    header.unwrap()
                )));
            }
            check_id(shape, decoder.parse_u64()?)?;
            let value = decode_fields(decoder, shape, depth)?;
            if header.is_none() && !decoder.try_parse_break()? {
                return Err(Error::Malformed(
                    "general constructor form carries more than 2 items".into(),
                ));
            }
            Ok(value)
        }
        tag => Err(Error::UnsupportedInput(format!(
            "tag {tag} is not a constructor tag"
        ))),
    }
}

fn check_id(shape: &Shape, found: u64) -> Result<(), Error> {
    if found != shape.constr_id() {
        return Err(Error::ShapeMismatch {
            shape: shape.name().into(),
            expected: shape.constr_id(),
            found,
        });
    }
    Ok(())
}

fn decode_fields(
    decoder: &mut Decoder,
    shape: &Arc<Shape>,
    depth: usize,
) -> Result<PlutusData, Error> {
    let declared = shape.fields();
    let header = decoder.parse_array_header()?;
    if let Some(count) = header {
        if count != declared.len() {
            return Err(Error::FieldCount {
                shape: shape.name().into(),
                expected: declared.len(),
                found: count,
            });
        }
    }

    let mut fields = Vec::with_capacity(declared.len());
    for field in declared {
        if header.is_none() && decoder.try_parse_break()? {
            return Err(Error::FieldCount {
                shape: shape.name().into(),
                expected: declared.len(),
                found: fields.len(),
            });
        }
        fields.push(decode_value(decoder, &field.ty, depth).map_field_err(&field.name)?);
    }
    if header.is_none() && !decoder.try_parse_break()? {
        return Err(Error::Malformed(format!(
            "{} carries more than the {} declared fields",
            shape.name(),
            declared.len()
        )));
    }

    Ok(PlutusData::Constr(Constr::new(shape.clone(), fields)))
}

/// Decode one value of a declared type.
pub(crate) fn decode_value(
    decoder: &mut Decoder,
    ty: &TypeDesc,
    depth: usize,
) -> Result<PlutusData, Error> {
    let depth = depth
        .checked_sub(1)
        .ok_or(cbor::decode::Error::MaxRecursion)?;
    match ty {
        TypeDesc::Int => Ok(PlutusData::Int(decoder.parse_int()?)),
        TypeDesc::Bytes => Ok(PlutusData::Bytes(decoder.parse_bytes()?.0)),
        TypeDesc::List(elem) => Ok(PlutusData::List(decode_items(decoder, |d| {
            decode_value(d, elem, depth)
        })?)),
        TypeDesc::AnyList => Ok(PlutusData::IndefList(decode_items(decoder, |d| {
            decode_dynamic(d, depth)
        })?)),
        TypeDesc::Map(key_ty, value_ty) => decode_map(decoder, |d| {
            Ok((
                decode_value(d, key_ty, depth)?,
                decode_value(d, value_ty, depth)?,
            ))
        }),
        TypeDesc::Constr(shape) => decode_constr(decoder, shape, depth),
        TypeDesc::Union(alternatives) => decode_union(decoder, alternatives, depth),
        TypeDesc::Any => {
            let span = decoder.skip_value(depth + 1)?;
            Ok(PlutusData::Raw(RawData::from_vec_unchecked(span.to_vec())))
        }
    }
}

fn decode_items<F>(decoder: &mut Decoder, mut item: F) -> Result<Vec<PlutusData>, Error>
where
    F: FnMut(&mut Decoder) -> Result<PlutusData, Error>,
{
    let mut items = Vec::new();
    match decoder.parse_array_header()? {
        Some(count) => {
            for _ in 0..count {
                items.push(item(decoder)?);
            }
        }
        None => {
            while !decoder.try_parse_break()? {
                items.push(item(decoder)?);
            }
        }
    }
    Ok(items)
}

fn decode_map<F>(decoder: &mut Decoder, mut entry: F) -> Result<PlutusData, Error>
where
    F: FnMut(&mut Decoder) -> Result<(PlutusData, PlutusData), Error>,
{
    let mut entries = Vec::new();
    match decoder.parse_map_header()? {
        Some(count) => {
            for _ in 0..count {
                entries.push(entry(decoder)?);
            }
        }
        None => {
            while !decoder.try_parse_break()? {
                entries.push(entry(decoder)?);
            }
        }
    }
    Ok(PlutusData::Map(entries))
}

/// First-match scan over a closed union's alternatives.
///
/// The cursor rewinds to the checkpoint between attempts; the first
/// alternative that decodes commits, later ones are never tried.
fn decode_union(
    decoder: &mut Decoder,
    alternatives: &[TypeDesc],
    depth: usize,
) -> Result<PlutusData, Error> {
    let checkpoint = decoder.offset();
    for alt in alternatives {
        match decode_value(decoder, alt, depth) {
            Ok(value) => return Ok(value),
            Err(e) => {
                trace!("union alternative {} rejected: {e}", alt.signature());
                decoder.seek(checkpoint);
            }
        }
    }
    Err(Error::AlternativesExhausted {
        tried: render_alternatives(alternatives),
    })
}

pub(crate) fn render_alternatives(alternatives: &[TypeDesc]) -> String {
    alternatives
        .iter()
        .map(TypeDesc::signature)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Decode a value with no declared type, preserving the wire form.
///
/// Definite arrays come back as plain lists, indefinite ones as indefinite
/// lists, and tagged items as raw spans, so re-encoding reproduces the
/// input bytes.
fn decode_dynamic(decoder: &mut Decoder, depth: usize) -> Result<PlutusData, Error> {
    let depth = depth
        .checked_sub(1)
        .ok_or(cbor::decode::Error::MaxRecursion)?;
    match decoder.peek_byte()? >> 5 {
        0 | 1 => Ok(PlutusData::Int(decoder.parse_int()?)),
        2 => Ok(PlutusData::Bytes(decoder.parse_bytes()?.0)),
        4 => match decoder.parse_array_header()? {
            Some(count) => {
                let mut items = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    items.push(decode_dynamic(decoder, depth)?);
                }
                Ok(PlutusData::List(items))
            }
            None => {
                let mut items = Vec::new();
                while !decoder.try_parse_break()? {
                    items.push(decode_dynamic(decoder, depth)?);
                }
                Ok(PlutusData::IndefList(items))
            }
        },
        5 => decode_map(decoder, |d| {
            Ok((decode_dynamic(d, depth)?, decode_dynamic(d, depth)?))
        }),
        6 => {
            let span = decoder.skip_value(depth + 1)?;
            Ok(PlutusData::Raw(RawData::from_vec_unchecked(span.to_vec())))
        }
        _ => Err(cbor::decode::Error::UnsupportedType(decoder.peek_byte()?).into()),
    }
}
