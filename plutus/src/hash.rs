use super::*;
use super::data::PlutusData;

/// All content digests are 224 bits.
pub const DIGEST_SIZE: usize = 28;

/// Language-version byte prefixed to script bytes before hashing.
const SCRIPT_VERSION_PREFIX: u8 = 0x01;

macro_rules! impl_digest_newtype {
    ($($ty:ident),*) => {
        $(
            #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
            pub struct $ty([u8; DIGEST_SIZE]);

            impl $ty {
                pub fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
                    &self.0
                }
            }

            impl AsRef<[u8]> for $ty {
                fn as_ref(&self) -> &[u8] {
                    &self.0
                }
            }

            impl From<[u8; DIGEST_SIZE]> for $ty {
                fn from(digest: [u8; DIGEST_SIZE]) -> Self {
                    Self(digest)
                }
            }

            impl core::fmt::Display for $ty {
                fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                    f.write_str(&hex::encode(self.0))
                }
            }
        )*
    };
}

impl_digest_newtype!(DataHash, ScriptHash);

fn blake2b_224(data: &[u8]) -> [u8; DIGEST_SIZE] {
    blake2b_simd::Params::new()
        .hash_length(DIGEST_SIZE)
        .hash(data)
        .as_bytes()
        .try_into()
        .unwrap()
}

impl PlutusData {
    /// Content hash of the canonical binary encoding of this value.
    pub fn hash(&self) -> Result<DataHash, Error> {
        Ok(DataHash(blake2b_224(&self.to_bytes()?)))
    }
}

/// Hash of a script payload, with the language-version prefix applied.
pub fn script_hash(script: &[u8]) -> ScriptHash {
    let mut input = Vec::with_capacity(script.len() + 1);
    input.push(SCRIPT_VERSION_PREFIX);
    input.extend_from_slice(script);
    ScriptHash(blake2b_224(&input))
}
