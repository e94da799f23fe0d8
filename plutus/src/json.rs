/*!
The canonical JSON rendering of the data model.

Every value is a single-key object: `{"int": n}`, `{"bytes": "<hex>"}`,
`{"list": [..]}`, `{"map": [{"k": .., "v": ..}, ..]}` or
`{"constructor": id, "fields": [..]}`. Map entries are an array of entry
objects because keys are not restricted to strings.
*/

use super::*;
use super::data::{Constr, PlutusData};
use super::error::CaptureFieldErr;
use super::schema::{Shape, TypeDesc};
use serde_json::{Value, json};
use std::sync::Arc;

impl PlutusData {
    /// Canonical JSON rendering of this value.
    pub fn to_json(&self) -> Result<Value, Error> {
        match self {
            PlutusData::Int(value) => Ok(json!({ "int": int_number(*value)? })),
            PlutusData::Bytes(bytes) => Ok(json!({ "bytes": hex::encode(bytes) })),
            PlutusData::List(items) | PlutusData::IndefList(items) => {
                let items = items
                    .iter()
                    .map(PlutusData::to_json)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(json!({ "list": items }))
            }
            PlutusData::Map(entries) => {
                let entries = entries
                    .iter()
                    .map(|(key, value)| Ok(json!({ "k": key.to_json()?, "v": value.to_json()? })))
                    .collect::<Result<Vec<_>, Error>>()?;
                Ok(json!({ "map": entries }))
            }
            PlutusData::Constr(constr) => {
                constr.check_fields()?;
                let fields = constr
                    .fields
                    .iter()
                    .map(PlutusData::to_json)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(json!({ "constructor": constr.shape.constr_id(), "fields": fields }))
            }
            PlutusData::Raw(_) => Err(Error::OpaqueNotRepresentable),
        }
    }

    pub fn to_json_string(&self) -> Result<String, Error> {
        Ok(self.to_json()?.to_string())
    }
}

impl Shape {
    /// Decode a value of this shape from its canonical JSON text.
    pub fn from_json(self: &Arc<Self>, text: &str) -> Result<PlutusData, Error> {
        let value: Value = serde_json::from_str(text)?;
        if !value.is_object() {
            return Err(Error::UnsupportedInput(
                "top-level JSON value must be an object".into(),
            ));
        }
        decode_constr(&value, self)
    }
}

/// JSON integers are bounded by what `serde_json` numbers carry, which is
/// narrower on the negative side than the binary form.
fn int_number(value: i128) -> Result<serde_json::Number, Error> {
    if let Ok(v) = u64::try_from(value) {
        Ok(v.into())
    } else if let Ok(v) = i64::try_from(value) {
        Ok(v.into())
    } else {
        Err(Error::IntOutOfRange(value))
    }
}

fn parse_int(value: &Value) -> Result<i128, Error> {
    let number = value
        .as_number()
        .ok_or_else(|| Error::MalformedJson(format!("expected an integer, found {value}")))?;
    if let Some(v) = number.as_u64() {
        Ok(v as i128)
    } else if let Some(v) = number.as_i64() {
        Ok(v as i128)
    } else {
        Err(Error::MalformedJson(format!(
            "expected an integer, found {value}"
        )))
    }
}

fn parse_bytes(value: &Value) -> Result<Vec<u8>, Error> {
    let text = value
        .as_str()
        .ok_or_else(|| Error::MalformedJson(format!("expected a hex string, found {value}")))?;
    hex::decode(text).map_err(|e| Error::MalformedJson(format!("invalid hex string: {e}")))
}

/// The single recognised tag of a value object, with its payload.
fn sole_tag(value: &Value) -> Result<(&str, &Value), Error> {
    let Value::Object(object) = value else {
        return Err(Error::MalformedJson(format!(
            "expected an object, found {value}"
        )));
    };
    let mut entries = object.iter();
    match (entries.next(), entries.next()) {
        (Some((tag, payload)), None) => Ok((tag.as_str(), payload)),
        _ => Err(Error::MalformedJson(format!(
            "expected an object with a single tag, found {} keys",
            object.len()
        ))),
    }
}

/// Decode one JSON value of a declared type.
pub(crate) fn decode_value(value: &Value, ty: &TypeDesc) -> Result<PlutusData, Error> {
    match ty {
        TypeDesc::Int => match sole_tag(value)? {
            ("int", payload) => Ok(PlutusData::Int(parse_int(payload)?)),
            (tag, _) => Err(unexpected_tag("int", tag)),
        },
        TypeDesc::Bytes => match sole_tag(value)? {
            ("bytes", payload) => Ok(PlutusData::Bytes(parse_bytes(payload)?)),
            (tag, _) => Err(unexpected_tag("bytes", tag)),
        },
        TypeDesc::List(elem) => Ok(PlutusData::List(
            decode_items(value)?
                .iter()
                .map(|item| decode_value(item, elem))
                .collect::<Result<_, _>>()?,
        )),
        TypeDesc::AnyList => Ok(PlutusData::IndefList(
            decode_items(value)?
                .iter()
                .map(decode_dynamic)
                .collect::<Result<_, _>>()?,
        )),
        TypeDesc::Map(key_ty, value_ty) => decode_map(value, |entry_key, entry_value| {
            Ok((
                decode_value(entry_key, key_ty)?,
                decode_value(entry_value, value_ty)?,
            ))
        }),
        TypeDesc::Constr(shape) => decode_constr(value, shape),
        TypeDesc::Union(alternatives) => {
            for alt in alternatives {
                match decode_value(value, alt) {
                    Ok(decoded) => return Ok(decoded),
                    Err(e) => trace!("union alternative {} rejected: {e}", alt.signature()),
                }
            }
            Err(Error::AlternativesExhausted {
                tried: decode::render_alternatives(alternatives),
            })
        }
        TypeDesc::Any => Err(Error::OpaqueNotRepresentable),
    }
}

fn unexpected_tag(expected: &str, found: &str) -> Error {
    Error::MalformedJson(format!("expected {expected:?} tag, found {found:?}"))
}

fn decode_items(value: &Value) -> Result<&Vec<Value>, Error> {
    match sole_tag(value)? {
        ("list", payload) => payload.as_array().ok_or_else(|| {
            Error::MalformedJson(format!("expected an array of items, found {payload}"))
        }),
        (tag, _) => Err(unexpected_tag("list", tag)),
    }
}

fn decode_map<F>(value: &Value, mut entry: F) -> Result<PlutusData, Error>
where
    F: FnMut(&Value, &Value) -> Result<(PlutusData, PlutusData), Error>,
{
    let payload = match sole_tag(value)? {
        ("map", payload) => payload.as_array().ok_or_else(|| {
            Error::MalformedJson(format!("expected an array of entries, found {payload}"))
        })?,
        (tag, _) => return Err(unexpected_tag("map", tag)),
    };
    let mut entries = Vec::with_capacity(payload.len());
    for item in payload {
        let Value::Object(object) = item else {
            return Err(Error::MalformedJson(format!(
                "expected a map entry object, found {item}"
            )));
        };
        let (Some(entry_key), Some(entry_value), 2) =
            (object.get("k"), object.get("v"), object.len())
        else {
            return Err(Error::MalformedJson(
                "map entry must carry exactly the keys \"k\" and \"v\"".into(),
            ));
        };
        entries.push(entry(entry_key, entry_value)?);
    }
    Ok(PlutusData::Map(entries))
}

fn decode_constr(value: &Value, shape: &Arc<Shape>) -> Result<PlutusData, Error> {
    let Value::Object(object) = value else {
        return Err(Error::MalformedJson(format!(
            "expected a constructor object, found {value}"
        )));
    };
    let (Some(id), Some(fields), 2) = (
        object.get("constructor"),
        object.get("fields"),
        object.len(),
    ) else {
        return Err(Error::MalformedJson(
            "constructor object must carry exactly the keys \"constructor\" and \"fields\"".into(),
        ));
    };
    let id = id.as_u64().ok_or_else(|| {
        Error::MalformedJson(format!("constructor id must be an unsigned integer, found {id}"))
    })?;
    if id != shape.constr_id() {
        return Err(Error::ShapeMismatch {
            shape: shape.name().into(),
            expected: shape.constr_id(),
            found: id,
        });
    }
    let fields = fields.as_array().ok_or_else(|| {
        Error::MalformedJson(format!("constructor fields must be an array, found {fields}"))
    })?;
    let declared = shape.fields();
    if fields.len() != declared.len() {
        return Err(Error::FieldCount {
            shape: shape.name().into(),
            expected: declared.len(),
            found: fields.len(),
        });
    }
    let fields = declared
        .iter()
        .zip(fields)
        .map(|(field, value)| decode_value(value, &field.ty).map_field_err(&field.name))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PlutusData::Constr(Constr::new(shape.clone(), fields)))
}

/// Decode a JSON value with no declared type.
///
/// Bare lists come back indefinite, matching how untyped sequences travel
/// on the binary side; constructor objects need a declared shape and are
/// rejected here.
fn decode_dynamic(value: &Value) -> Result<PlutusData, Error> {
    match sole_tag(value) {
        Ok(("int", payload)) => Ok(PlutusData::Int(parse_int(payload)?)),
        Ok(("bytes", payload)) => Ok(PlutusData::Bytes(parse_bytes(payload)?)),
        Ok(("list", _)) => Ok(PlutusData::IndefList(
            decode_items(value)?
                .iter()
                .map(decode_dynamic)
                .collect::<Result<_, _>>()?,
        )),
        Ok(("map", _)) => decode_map(value, |entry_key, entry_value| {
            Ok((decode_dynamic(entry_key)?, decode_dynamic(entry_value)?))
        }),
        Ok((tag, _)) => Err(Error::MalformedJson(format!(
            "tag {tag:?} is not valid in an untyped position"
        ))),
        Err(e) => Err(e),
    }
}
