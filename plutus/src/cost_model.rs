use super::*;

/// A static cost-model table: ordered (model id, parameter list) pairs.
///
/// The ledger envelope nests both sides of each entry as already-encoded
/// byte strings: the key is the encoded model id, the value the encoded
/// indefinite list of parameters. The table is external input; it is only
/// ever encoded, never produced or validated here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CostModels(Vec<(u64, Vec<i64>)>);

impl CostModels {
    pub fn new(models: Vec<(u64, Vec<i64>)>) -> Self {
        Self(models)
    }

    pub fn models(&self) -> &[(u64, Vec<i64>)] {
        &self.0
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        cbor::encode::emit_map(Some(self.0.len()), |m| {
            for (id, params) in &self.0 {
                m.emit(&cbor::encode::emit(id));
                m.emit(&cbor::encode::emit_array(None, |a| {
                    for param in params {
                        a.emit(param);
                    }
                }));
            }
        })
    }
}
