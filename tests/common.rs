#![allow(dead_code)]

//! Builds FIT documents for tests.

use fitframe::sans::check::compute_crc;

pub const ENUM: u8 = 0x00;
pub const SINT8: u8 = 0x01;
pub const UINT8: u8 = 0x02;
pub const SINT16: u8 = 0x83;
pub const UINT16: u8 = 0x84;
pub const SINT32: u8 = 0x85;
pub const UINT32: u8 = 0x86;
pub const STRING: u8 = 0x07;
pub const FLOAT32: u8 = 0x88;
pub const UINT8Z: u8 = 0x0A;
pub const BYTE: u8 = 0x0D;
pub const UINT64: u8 = 0x8F;

#[derive(Debug, Clone, Default)]
pub struct FitBuilder {
    records: Vec<u8>,
    extended: bool,
    header_crc: Option<u16>,
    data_size: Option<u32>,
}

impl FitBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a 14-byte header with a computed check value.
    pub fn extended(mut self) -> Self {
        self.extended = true;
        self
    }

    /// Use a 14-byte header with the given check value.
    pub fn header_crc(mut self, crc: u16) -> Self {
        self.extended = true;
        self.header_crc = Some(crc);
        self
    }

    /// Declare a record section size other than the actual one.
    pub fn data_size(mut self, data_size: u32) -> Self {
        self.data_size = Some(data_size);
        self
    }

    /// Define a local message from (number, size, base type) triples.
    pub fn define(self, local: u8, global: u16, fields: &[(u8, u8, u8)]) -> Self {
        self.define_with(local, global, 0, fields, &[])
    }

    pub fn define_big_endian(self, local: u8, global: u16, fields: &[(u8, u8, u8)]) -> Self {
        self.define_with(local, global, 1, fields, &[])
    }

    /// Define a local message with developer fields given as
    /// (number, size, developer index) triples.
    pub fn define_developer(
        self,
        local: u8,
        global: u16,
        fields: &[(u8, u8, u8)],
        developer_fields: &[(u8, u8, u8)],
    ) -> Self {
        self.define_with(local, global, 0, fields, developer_fields)
    }

    fn define_with(
        mut self,
        local: u8,
        global: u16,
        architecture: u8,
        fields: &[(u8, u8, u8)],
        developer_fields: &[(u8, u8, u8)],
    ) -> Self {
        let flags = if developer_fields.is_empty() { 0x40 } else { 0x60 };
        self.records.push(flags | (local & 0x0F));
        self.records.push(0);
        self.records.push(architecture);

        if architecture == 1 {
            self.records.extend_from_slice(&global.to_be_bytes());
        } else {
            self.records.extend_from_slice(&global.to_le_bytes());
        }

        self.records.push(fields.len() as u8);
        for &(number, size, base_type) in fields {
            self.records.extend_from_slice(&[number, size, base_type]);
        }

        if !developer_fields.is_empty() {
            self.records.push(developer_fields.len() as u8);
            for &(number, size, developer_index) in developer_fields {
                self.records.extend_from_slice(&[number, size, developer_index]);
            }
        }

        self
    }

    /// A data record with a normal header.
    pub fn data(mut self, local: u8, r: &[u8]) -> Self {
        self.records.push(local & 0x0F);
        self.records.extend_from_slice(r);
        self
    }

    /// A data record with a compressed timestamp header.
    pub fn compressed(mut self, local: u8, offset: u8, r: &[u8]) -> Self {
        self.records.push(0x80 | ((local & 0x03) << 5) | (offset & 0x1F));
        self.records.extend_from_slice(r);
        self
    }

    /// Describe a developer field, defining `local` as `field_description`.
    pub fn describe(
        self,
        local: u8,
        developer_index: u8,
        number: u8,
        base_type: u8,
        name: &str,
    ) -> Self {
        let mut name = name.as_bytes().to_vec();
        name.resize(16, 0);

        let mut r = vec![developer_index, number, base_type];
        r.extend_from_slice(&name);

        self.define(
            local,
            206,
            &[(0, 1, UINT8), (1, 1, UINT8), (2, 1, UINT8), (3, 16, STRING)],
        )
        .data(local, &r)
    }

    pub fn records(&self) -> &[u8] {
        &self.records
    }

    pub fn build(&self) -> Vec<u8> {
        let data_size = self.data_size.unwrap_or(self.records.len() as u32);

        let mut r = Vec::new();
        r.push(if self.extended { 14 } else { 12 });
        r.push(0x20);
        r.extend_from_slice(&2132u16.to_le_bytes());
        r.extend_from_slice(&data_size.to_le_bytes());
        r.extend_from_slice(b".FIT");

        if self.extended {
            let crc = self.header_crc.unwrap_or_else(|| compute_crc(0, &r));
            r.extend_from_slice(&crc.to_le_bytes());
        }

        r.extend_from_slice(&self.records);

        let crc = compute_crc(0, &r);
        r.extend_from_slice(&crc.to_le_bytes());
        r
    }
}

/// Flip the bits of the trailing check value.
pub fn corrupt_crc(r: &mut [u8]) {
    let n = r.len();
    r[n - 1] ^= 0xFF;
}

/// A document of `record` messages with a timestamp and heart rate each.
pub fn heart_rate_document(samples: &[(u32, u8)]) -> Vec<u8> {
    samples
        .iter()
        .fold(
            FitBuilder::new().define(0, 20, &[(253, 4, UINT32), (3, 1, UINT8)]),
            |builder, &(timestamp, heart_rate)| {
                let mut r = timestamp.to_le_bytes().to_vec();
                r.push(heart_rate);
                builder.data(0, &r)
            },
        )
        .build()
}
