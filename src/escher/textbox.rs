//! Opaque text and client records (Textbox, ClientTextbox, ClientData).
//!
//! The payload belongs to the host format's text layer and is kept verbatim.

use super::context::DecodeContext;
use super::header::{HEADER_SIZE, RecordHeader};
use super::record::Record;
use super::types::EscherRecordType;
use super::unknown::opaque_payload;
use crate::common::binary::ByteWriter;
use crate::common::error::{EncodeResult, Result};

/// Record whose body is an uninterpreted payload owned by the host format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextboxRecord {
    record_id: u16,
    version: u8,
    instance: u16,
    data: Vec<u8>,
}

impl TextboxRecord {
    /// ClientTextbox record (0xF00D) with the given payload.
    pub fn new(data: Vec<u8>) -> Self {
        Self::with_record_id(EscherRecordType::ClientTextbox as u16, data)
    }

    pub fn with_record_id(record_id: u16, data: Vec<u8>) -> Self {
        Self {
            record_id,
            version: 0x00,
            instance: 0,
            data,
        }
    }

    pub(crate) fn decode(
        data: &[u8],
        offset: usize,
        header: &RecordHeader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(Self, usize)> {
        let limit = ctx.limits().max_textbox_payload;
        let payload = opaque_payload(data, offset, header, "textbox payload", limit, ctx)?;
        let consumed = HEADER_SIZE + payload.len();
        Ok((
            Self {
                record_id: header.record_id,
                version: header.version,
                instance: header.instance,
                data: payload,
            },
            consumed,
        ))
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data = data;
    }
}

impl Record for TextboxRecord {
    fn record_id(&self) -> u16 {
        self.record_id
    }

    fn version(&self) -> u8 {
        self.version
    }

    fn instance(&self) -> u16 {
        self.instance
    }

    fn body_size(&self) -> usize {
        self.data.len()
    }

    fn write_body(&self, writer: &mut ByteWriter<'_>) -> EncodeResult<()> {
        writer.put_bytes(&self.data)
    }
}
