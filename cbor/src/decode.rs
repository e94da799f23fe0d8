use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Not enough data for encoded value")]
    NotEnoughData,

    #[error("Invalid minor-type value {0}")]
    InvalidMinorValue(u8),

    #[error("Tags with no following value")]
    JustTags,

    #[error("Incorrect type")]
    IncorrectType,

    #[error("Chunked string contains an invalid chunk")]
    InvalidChunk,

    #[error("Unsupported type byte {0:#04x}")]
    UnsupportedType(u8),

    #[error("Maximum recursion depth reached")]
    MaxRecursion,
}

/// Cursor over a CBOR item stream.
///
/// The cursor only advances on success of the sub-parse as a whole; callers
/// that speculate (e.g. trying decode alternatives) checkpoint with
/// [`offset`](Self::offset) and rewind with [`seek`](Self::seek).
pub struct Decoder<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn seek(&mut self, offset: usize) {
        self.offset = offset.min(self.data.len());
    }

    pub fn is_complete(&self) -> bool {
        self.offset >= self.data.len()
    }

    fn peek(&self) -> Result<u8, Error> {
        self.data
            .get(self.offset)
            .copied()
            .ok_or(Error::NotEnoughData)
    }

    /// The next byte of the stream, without consuming it.
    pub fn peek_byte(&self) -> Result<u8, Error> {
        self.peek()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], Error> {
        let end = self.offset.checked_add(len).ok_or(Error::NotEnoughData)?;
        if end > self.data.len() {
            return Err(Error::NotEnoughData);
        }
        let s = &self.data[self.offset..end];
        self.offset = end;
        Ok(s)
    }

    fn take_head(&mut self) -> Result<(u8, u8), Error> {
        let b = self.peek()?;
        self.offset += 1;
        Ok((b >> 5, b & 0x1F))
    }

    fn parse_uint_minor(&mut self, minor: u8) -> Result<u64, Error> {
        match minor {
            24 => Ok(self.take(1)?[0] as u64),
            25 => Ok(u16::from_be_bytes(self.take(2)?.try_into().unwrap()) as u64),
            26 => Ok(u32::from_be_bytes(self.take(4)?.try_into().unwrap()) as u64),
            27 => Ok(u64::from_be_bytes(self.take(8)?.try_into().unwrap())),
            val if val < 24 => Ok(val as u64),
            _ => Err(Error::InvalidMinorValue(minor)),
        }
    }

    /// Parse zero or more leading tags.
    pub fn parse_tags(&mut self) -> Result<Vec<u64>, Error> {
        let mut tags = Vec::new();
        while !self.is_complete() && self.peek()? >> 5 == 6 {
            let (_, minor) = self.take_head()?;
            tags.push(self.parse_uint_minor(minor)?);
        }
        if !tags.is_empty() && self.is_complete() {
            return Err(Error::JustTags);
        }
        Ok(tags)
    }

    pub fn parse_u64(&mut self) -> Result<u64, Error> {
        match self.take_head()? {
            (0, minor) => self.parse_uint_minor(minor),
            _ => Err(Error::IncorrectType),
        }
    }

    /// Parse a major 0/1 integer into the full canonical range.
    pub fn parse_int(&mut self) -> Result<i128, Error> {
        match self.take_head()? {
            (0, minor) => Ok(self.parse_uint_minor(minor)? as i128),
            (1, minor) => Ok(-1 - self.parse_uint_minor(minor)? as i128),
            _ => Err(Error::IncorrectType),
        }
    }

    /// Parse a definite or chunked indefinite byte string.
    ///
    /// Returns the assembled bytes and whether the chunked form was used.
    pub fn parse_bytes(&mut self) -> Result<(Vec<u8>, bool), Error> {
        match self.take_head()? {
            (2, 31) => {
                let mut bytes = Vec::new();
                loop {
                    if self.try_parse_break()? {
                        return Ok((bytes, true));
                    }
                    let (major, minor) = self.take_head()?;
                    if major != 2 || minor == 31 {
                        return Err(Error::InvalidChunk);
                    }
                    let len = self.parse_uint_minor(minor)?;
                    bytes.extend_from_slice(self.take(try_len(len)?)?);
                }
            }
            (2, minor) => {
                let len = self.parse_uint_minor(minor)?;
                Ok((self.take(try_len(len)?)?.to_vec(), false))
            }
            _ => Err(Error::IncorrectType),
        }
    }

    /// Parse an array head; `None` for the indefinite form.
    pub fn parse_array_header(&mut self) -> Result<Option<usize>, Error> {
        match self.take_head()? {
            (4, 31) => Ok(None),
            (4, minor) => Ok(Some(try_len(self.parse_uint_minor(minor)?)?)),
            _ => Err(Error::IncorrectType),
        }
    }

    /// Parse a map head; `None` for the indefinite form.
    pub fn parse_map_header(&mut self) -> Result<Option<usize>, Error> {
        match self.take_head()? {
            (5, 31) => Ok(None),
            (5, minor) => Ok(Some(try_len(self.parse_uint_minor(minor)?)?)),
            _ => Err(Error::IncorrectType),
        }
    }

    /// Consume a break marker if one is next.
    pub fn try_parse_break(&mut self) -> Result<bool, Error> {
        if self.peek()? == 0xFF {
            self.offset += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Skip one complete item (tags included), returning its raw byte span.
    pub fn skip_value(&mut self, max_recursion: usize) -> Result<&'a [u8], Error> {
        let start = self.offset;
        self.skip_item(max_recursion)?;
        Ok(&self.data[start..self.offset])
    }

    fn skip_item(&mut self, depth: usize) -> Result<(), Error> {
        if depth == 0 {
            return Err(Error::MaxRecursion);
        }
        self.parse_tags()?;
        let (major, minor) = self.take_head()?;
        match (major, minor) {
            (0 | 1, minor) => {
                self.parse_uint_minor(minor)?;
            }
            (2, 31) => loop {
                if self.try_parse_break()? {
                    break;
                }
                let (major, minor) = self.take_head()?;
                if major != 2 || minor == 31 {
                    return Err(Error::InvalidChunk);
                }
                let len = self.parse_uint_minor(minor)?;
                self.take(try_len(len)?)?;
            },
            (2, minor) => {
                let len = self.parse_uint_minor(minor)?;
                self.take(try_len(len)?)?;
            }
            (4, 31) => {
                while !self.try_parse_break()? {
                    self.skip_item(depth - 1)?;
                }
            }
            (4, minor) => {
                for _ in 0..self.parse_uint_minor(minor)? {
                    self.skip_item(depth - 1)?;
                }
            }
            (5, 31) => {
                while !self.try_parse_break()? {
                    self.skip_item(depth - 1)?;
                    self.skip_item(depth - 1)?;
                }
            }
            (5, minor) => {
                for _ in 0..self.parse_uint_minor(minor)? {
                    self.skip_item(depth - 1)?;
                    self.skip_item(depth - 1)?;
                }
            }
            (6, _) => unreachable!(),
            (major, minor) => return Err(Error::UnsupportedType((major << 5) | minor)),
        }
        Ok(())
    }
}

fn try_len(len: u64) -> Result<usize, Error> {
    usize::try_from(len).map_err(|_| Error::NotEnoughData)
}
