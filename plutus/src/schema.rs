/*!
Static schemas for constructor-tagged data.

A [`Shape`] is declared once, at startup, and is immutable from then on:
its constructor id is either supplied explicitly or derived from the
structural signature at build time. Shared `Arc<Shape>` values are the only
registration state the codec has, so isolated schemas in tests are just
separately built values.
*/

use super::*;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Declared type of a field slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDesc {
    /// Canonical-form integer.
    Int,
    /// Byte sequence, chunked on the wire above the chunk threshold.
    Bytes,
    /// Ordered sequence with a typed element, definite-length on the wire.
    List(Box<TypeDesc>),
    /// Untyped sequence, indefinite-length on the wire.
    AnyList,
    /// Ordered key/value mapping with typed entries.
    Map(Box<TypeDesc>, Box<TypeDesc>),
    /// A nested constructor-tagged shape.
    Constr(Arc<Shape>),
    /// A closed alternation, resolved in declaration order when decoding.
    Union(Vec<TypeDesc>),
    /// An opaque, already-encoded payload.
    Any,
}

impl TypeDesc {
    pub fn list(elem: TypeDesc) -> Self {
        TypeDesc::List(Box::new(elem))
    }

    pub fn map(key: TypeDesc, value: TypeDesc) -> Self {
        TypeDesc::Map(Box::new(key), Box::new(value))
    }

    pub fn union<I>(alternatives: I) -> Self
    where
        I: IntoIterator<Item = TypeDesc>,
    {
        TypeDesc::Union(alternatives.into_iter().collect())
    }

    /// Canonical textual rendering of this type.
    pub fn signature(&self) -> String {
        let mut out = String::new();
        self.render(&mut out);
        out
    }

    fn render(&self, out: &mut String) {
        match self {
            TypeDesc::Int => out.push_str("int"),
            TypeDesc::Bytes => out.push_str("bytes"),
            TypeDesc::AnyList => out.push_str("list"),
            TypeDesc::List(elem) => {
                out.push_str("list<");
                elem.render(out);
                out.push('>');
            }
            TypeDesc::Map(key, value) => {
                out.push_str("map<");
                key.render(out);
                out.push(',');
                value.render(out);
                out.push('>');
            }
            TypeDesc::Union(alternatives) => {
                out.push_str("union<");
                for (idx, alt) in alternatives.iter().enumerate() {
                    if idx > 0 {
                        out.push(',');
                    }
                    alt.render(out);
                }
                out.push('>');
            }
            TypeDesc::Constr(shape) => shape.render(out, None),
            TypeDesc::Any => out.push_str("any"),
        }
    }
}

/// A named, typed field slot of a [`Shape`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: TypeDesc,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: TypeDesc) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A constructor-tagged product type: a name, an ordered field list, and a
/// constructor id unique among the shapes it appears alongside.
#[derive(Debug, PartialEq, Eq)]
pub struct Shape {
    name: String,
    constr_id: u64,
    fields: Vec<Field>,
}

impl Shape {
    /// Build a shape, deriving the constructor id from the structural
    /// signature when none is supplied.
    pub fn build(name: impl Into<String>, constr_id: Option<u64>, fields: Vec<Field>) -> Arc<Self> {
        let mut shape = Self {
            name: name.into(),
            constr_id: 0,
            fields,
        };
        shape.constr_id = constr_id.unwrap_or_else(|| derive_id(&shape));
        Arc::new(shape)
    }

    /// The canonical empty shape, constructor 0 with no fields.
    pub fn unit() -> Arc<Self> {
        Shape::build("Unit", Some(0), Vec::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constr_id(&self) -> u64 {
        self.constr_id
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Canonical structural signature, embedding the resolved constructor
    /// ids of this shape and every nested shape.
    pub fn signature(&self) -> String {
        let mut out = String::new();
        self.render(&mut out, None);
        out
    }

    fn render(&self, out: &mut String, id_slot: Option<&str>) {
        out.push_str("cons[");
        out.push_str(&self.name);
        out.push_str("](");
        match id_slot {
            Some(slot) => out.push_str(slot),
            None => out.push_str(&self.constr_id.to_string()),
        }
        out.push(';');
        for (idx, field) in self.fields.iter().enumerate() {
            if idx > 0 {
                out.push(',');
            }
            out.push_str(&field.name);
            out.push(':');
            field.ty.render(out);
        }
        out.push(')');
    }
}

/// Derive a stable constructor id from a shape's structural signature.
///
/// The shape's own id slot is masked so the derivation depends only on the
/// name and field list; nested shapes embed their resolved ids. SHA-256 is
/// seed-free, so the result is identical across process invocations.
fn derive_id(shape: &Shape) -> u64 {
    let mut sig = String::new();
    shape.render(&mut sig, Some("_"));
    let digest = Sha256::digest(sig.as_bytes());
    u32::from_be_bytes(digest[28..].try_into().unwrap()) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape_a() -> Arc<Shape> {
        Shape::build(
            "A",
            Some(0),
            vec![
                Field::new("a", TypeDesc::Int),
                Field::new("b", TypeDesc::Bytes),
                Field::new("c", TypeDesc::list(TypeDesc::Int)),
            ],
        )
    }

    fn shape_c() -> Arc<Shape> {
        Shape::build(
            "C",
            None,
            vec![
                Field::new("x", TypeDesc::Any),
                Field::new("y", TypeDesc::Any),
                Field::new("z", TypeDesc::Any),
                Field::new("w", TypeDesc::AnyList),
            ],
        )
    }

    #[test]
    fn derived_ids_are_stable() {
        // fixed reference value, so any drift across runs or releases is a failure
        assert_eq!(shape_c().constr_id(), 892310804);
        assert_eq!(shape_c().constr_id(), shape_c().constr_id());
    }

    #[test]
    fn derived_ids_separate_distinct_shapes() {
        let empty_a = Shape::build("A", None, vec![]);
        let empty_b = Shape::build("B", None, vec![]);
        assert_ne!(empty_a.constr_id(), empty_b.constr_id());

        let b1 = Shape::build(
            "B",
            None,
            vec![
                Field::new("a", TypeDesc::Int),
                Field::new("b", TypeDesc::Bytes),
            ],
        );
        assert_ne!(empty_b.constr_id(), b1.constr_id());

        let b2 = Shape::build(
            "B",
            None,
            vec![
                Field::new("a", TypeDesc::Bytes),
                Field::new("b", TypeDesc::Bytes),
            ],
        );
        assert_ne!(b1.constr_id(), b2.constr_id());

        let reordered = Shape::build(
            "B",
            None,
            vec![
                Field::new("b", TypeDesc::Bytes),
                Field::new("a", TypeDesc::Int),
            ],
        );
        assert_ne!(b1.constr_id(), reordered.constr_id());
    }

    #[test]
    fn signature_renders_resolved_ids() {
        let a = shape_a();
        let c = shape_c();
        let b = Shape::build(
            "B",
            None,
            vec![
                Field::new("a", TypeDesc::Int),
                Field::new("c", TypeDesc::Constr(a.clone())),
                Field::new("d", TypeDesc::map(TypeDesc::Bytes, TypeDesc::Constr(c.clone()))),
                Field::new(
                    "e",
                    TypeDesc::union([TypeDesc::Constr(a.clone()), TypeDesc::Constr(c.clone())]),
                ),
            ],
        );
        assert_eq!(b.constr_id(), 1013743048);
        assert_eq!(
            b.signature(),
            "cons[B](1013743048;a:int,c:cons[A](0;a:int,b:bytes,c:list<int>),\
             d:map<bytes,cons[C](892310804;x:any,y:any,z:any,w:list)>,\
             e:union<cons[A](0;a:int,b:bytes,c:list<int>),cons[C](892310804;x:any,y:any,z:any,w:list)>)"
        );
    }

    #[test]
    fn unit_shape() {
        let unit = Shape::unit();
        assert_eq!(unit.constr_id(), 0);
        assert!(unit.fields().is_empty());
        assert_eq!(unit.signature(), "cons[Unit](0;)");
    }
}
