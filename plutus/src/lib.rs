use chaindata_cbor as cbor;
use tracing::*;

mod cost_model;
mod data;
mod decode;
mod error;
mod hash;
mod json;
mod redeemer;
mod schema;


#[cfg(test)]
mod json_tests;

pub use error::Error;

pub mod prelude {
    pub use super::cost_model::CostModels;
    pub use super::data::{Constr, PlutusData, RawData};
    pub use super::error::{CaptureFieldErr, Error};
    pub use super::hash::{DataHash, ScriptHash, script_hash};
    pub use super::redeemer::{ExecutionUnits, Redeemer, RedeemerTag};
    pub use super::schema::{Field, Shape, TypeDesc};
}
