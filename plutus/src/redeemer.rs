use super::*;
use super::data::{MAX_NESTING, PlutusData};
use super::error::CaptureFieldErr;
use super::schema::TypeDesc;
use chaindata_cbor::decode::Decoder;

/// The script purpose a redeemer authorises.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RedeemerTag {
    Spend,
    Mint,
    Cert,
    Reward,
}

impl From<RedeemerTag> for u64 {
    fn from(value: RedeemerTag) -> Self {
        match value {
            RedeemerTag::Spend => 0,
            RedeemerTag::Mint => 1,
            RedeemerTag::Cert => 2,
            RedeemerTag::Reward => 3,
        }
    }
}

impl TryFrom<u64> for RedeemerTag {
    type Error = Error;

    fn try_from(value: u64) -> Result<Self, Error> {
        match value {
            0 => Ok(RedeemerTag::Spend),
            1 => Ok(RedeemerTag::Mint),
            2 => Ok(RedeemerTag::Cert),
            3 => Ok(RedeemerTag::Reward),
            value => Err(Error::Malformed(format!("invalid redeemer tag {value}"))),
        }
    }
}

/// Execution-cost budget of a redeemer.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ExecutionUnits {
    pub mem: u64,
    pub steps: u64,
}

impl ExecutionUnits {
    pub fn new(mem: u64, steps: u64) -> Self {
        Self { mem, steps }
    }

    /// True only when both components are zero.
    pub fn is_zero(&self) -> bool {
        self.mem == 0 && self.steps == 0
    }
}

/// The envelope tying script data to its purpose, target index and budget.
///
/// Encodes as a definite 4-element array with the data inlined in the
/// canonical binary form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redeemer {
    pub tag: RedeemerTag,
    pub index: u64,
    pub data: PlutusData,
    pub ex_units: ExecutionUnits,
}

impl Redeemer {
    pub fn new(tag: RedeemerTag, index: u64, data: PlutusData, ex_units: ExecutionUnits) -> Self {
        Self {
            tag,
            index,
            data,
            ex_units,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        self.data.validate()?;
        Ok(cbor::encode::emit_array(Some(4), |a| {
            a.emit(&u64::from(self.tag));
            a.emit(&self.index);
            a.emit(&self.data);
            a.emit_array(Some(2), |a| {
                a.emit(&self.ex_units.mem);
                a.emit(&self.ex_units.steps);
            });
        }))
    }

    /// Decode a redeemer whose data field is declared as `data_ty`.
    pub fn decode(data_ty: &TypeDesc, data: &[u8]) -> Result<Self, Error> {
        let mut decoder = Decoder::new(data);
        let header = decoder.parse_array_header()?;
        if matches!(header, Some(count) if count != 4) {
            return Err(Error::Malformed(format!(
                "redeemer carries {} items, expected 4",
                header.unwrap()
            )));
        }
        let tag = RedeemerTag::try_from(decoder.parse_u64().map_field_err("tag")?)?;
        let index = decoder.parse_u64().map_field_err("index")?;
        let value =
            decode::decode_value(&mut decoder, data_ty, MAX_NESTING).map_field_err("data")?;
        let ex_units = decode_ex_units(&mut decoder).map_field_err("ex units")?;
        if header.is_none() && !decoder.try_parse_break()? {
            return Err(Error::Malformed("redeemer carries more than 4 items".into()));
        }
        if !decoder.is_complete() {
            return Err(Error::AdditionalData);
        }
        Ok(Self {
            tag,
            index,
            data: value,
            ex_units,
        })
    }
}

fn decode_ex_units(decoder: &mut Decoder) -> Result<ExecutionUnits, Error> {
    let header = decoder.parse_array_header()?;
    if matches!(header, Some(count) if count != 2) {
        return Err(Error::Malformed(format!(
            "execution units carry {} items, expected 2",
            header.unwrap()
        )));
    }
    let units = ExecutionUnits {
        mem: decoder.parse_u64()?,
        steps: decoder.parse_u64()?,
    };
    if header.is_none() && !decoder.try_parse_break()? {
        return Err(Error::Malformed(
            "execution units carry more than 2 items".into(),
        ));
    }
    Ok(units)
}
