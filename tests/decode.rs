#![cfg(feature = "std")]

mod common;

use common::*;
use fitframe::{
    DecodeOptions, Error, FieldKey, Value, Warning,
    avec::{self, decode_slice},
    read_slice,
    sans::data::DecodedMessage,
};
use pretty_assertions::assert_eq;

fn column(r: &[u8], global: u16, name: &str) -> Vec<Option<Value>> {
    let data = read_slice(r, DecodeOptions::default()).unwrap();
    data.tables
        .get(global)
        .and_then(|t| t.column(name))
        .map(|c| c.values().to_vec())
        .unwrap_or_default()
}

#[test]
fn heart_rate_records() {
    let r = FitBuilder::new()
        .define(0, 20, &[(253, 4, UINT32), (3, 1, UINT8)])
        .data(0, &[0x01, 0x02, 0x03, 0x04, 0x8C])
        .data(0, &[0x02, 0x02, 0x03, 0x04, 0xFF])
        .build();

    let data = read_slice(&r, DecodeOptions::default()).unwrap();
    assert!(data.warnings.is_empty());
    assert_eq!(data.headers.len(), 1);

    let table = data.tables.get(20).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(
        table.column_names().collect::<Vec<_>>(),
        vec!["field_253", "field_3"]
    );
    assert_eq!(
        table.row(0),
        Some(vec![
            Some(&Value::UInt32(0x04030201)),
            Some(&Value::UInt8(140))
        ])
    );
    assert_eq!(table.column("field_3").unwrap().get(1), None);
    assert_eq!(table.column("field_3").unwrap().null_count(), 1);
}

#[test]
fn checksum_mismatch_warns_unless_strict() {
    let mut r = heart_rate_document(&[(1000, 140)]);
    corrupt_crc(&mut r);

    let data = read_slice(&r, DecodeOptions::default()).unwrap();
    assert!(matches!(
        data.warnings.as_slice(),
        [Warning::ChecksumMismatch { .. }]
    ));
    assert_eq!(data.tables.get(20).map(|t| t.len()), Some(1));

    let err = read_slice(&r, DecodeOptions::new().with_strict(true)).unwrap_err();
    assert!(matches!(err, Error::ChecksumMismatch { .. }));
}

#[test]
fn extended_header_check_value() {
    let r = FitBuilder::new()
        .extended()
        .define(0, 0, &[(0, 1, ENUM)])
        .data(0, &[4])
        .build();

    let data = read_slice(&r, DecodeOptions::new().with_strict(true)).unwrap();
    assert_eq!(data.headers[0].header_size, 14);
    assert!(data.headers[0].crc.is_some_and(|crc| crc != 0));

    // Zero marks an uncomputed header check value.
    let r = FitBuilder::new().header_crc(0).build();
    let data = read_slice(&r, DecodeOptions::new().with_strict(true)).unwrap();
    assert_eq!(data.headers[0].crc, Some(0));

    let r = FitBuilder::new().header_crc(0x1234).build();
    let data = read_slice(&r, DecodeOptions::default()).unwrap();
    assert!(matches!(
        data.warnings.as_slice(),
        [Warning::HeaderChecksumMismatch { found: 0x1234, .. }]
    ));

    let data = read_slice(&r, DecodeOptions::new().with_header_crc(false)).unwrap();
    assert!(data.warnings.is_empty());

    let err = read_slice(&r, DecodeOptions::new().with_strict(true)).unwrap_err();
    assert!(matches!(
        err,
        Error::HeaderChecksumMismatch { found: 0x1234, .. }
    ));
}

#[test]
fn invalid_values_are_null() {
    let r = FitBuilder::new()
        .define(
            0,
            20,
            &[
                (0, 2, SINT16),
                (1, 1, UINT8Z),
                (2, 8, STRING),
                (3, 4, FLOAT32),
                (4, 2, BYTE),
                (5, 1, SINT8),
            ],
        )
        .data(
            0,
            &[
                0xFF, 0x7F, 0x00, 0, 0, 0, 0, 0, 0, 0, 0, 0x00, 0x00, 0xC0, 0x7F, 0xFF, 0xFF, 0xFE,
            ],
        )
        .build();

    let data = read_slice(&r, DecodeOptions::default()).unwrap();
    let row = data.tables.get(20).unwrap().row(0).unwrap();

    assert_eq!(row[0], None);
    assert_eq!(row[1], None);
    assert_eq!(row[2], None);
    assert!(row[3].and_then(Value::as_f64).is_some_and(f64::is_nan));
    assert_eq!(row[4], None);
    assert_eq!(row[5], Some(&Value::SInt8(-2)));
}

#[test]
fn arrays_and_strings() {
    let r = FitBuilder::new()
        .define(0, 20, &[(9, 6, UINT16), (10, 6, STRING), (11, 3, BYTE)])
        .data(
            0,
            &[
                0x01, 0x00, 0xFF, 0xFF, 0x03, 0x00, b'R', b'u', b'n', 0, b'x', b'x', 0xFF, 0x01,
                0xFF,
            ],
        )
        .build();

    let data = read_slice(&r, DecodeOptions::default()).unwrap();
    let row = data.tables.get(20).unwrap().row(0).unwrap();

    assert_eq!(
        row[0],
        Some(&Value::Array(vec![
            Some(Value::UInt16(1)),
            None,
            Some(Value::UInt16(3))
        ]))
    );
    assert_eq!(row[1].and_then(Value::as_str), Some("Run"));
    assert_eq!(row[2], Some(&Value::Bytes(vec![0xFF, 0x01, 0xFF])));
}

#[test]
fn big_endian_definition() {
    let r = FitBuilder::new()
        .define_big_endian(0, 20, &[(253, 4, UINT32), (7, 2, UINT16)])
        .data(0, &[0x01, 0x02, 0x03, 0x04, 0x00, 0xFA])
        .build();

    assert_eq!(
        column(&r, 20, "field_253"),
        vec![Some(Value::UInt32(0x01020304))]
    );
    assert_eq!(column(&r, 20, "field_7"), vec![Some(Value::UInt16(250))]);
}

#[test]
fn decoding_is_idempotent() {
    let r = heart_rate_document(&[(1000, 140), (1001, 141), (1002, 0xFF)]);

    let first = read_slice(&r, DecodeOptions::default()).unwrap();
    let second = read_slice(&r, DecodeOptions::default()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn compressed_timestamps_wrap() {
    // 1000 has 8 in its low five bits.
    let r = FitBuilder::new()
        .define(0, 20, &[(253, 4, UINT32), (3, 1, UINT8)])
        .data(0, &[0xE8, 0x03, 0x00, 0x00, 140])
        .define(1, 20, &[(3, 1, UINT8)])
        .compressed(1, 10, &[141])
        .compressed(1, 31, &[142])
        .compressed(1, 2, &[143])
        .build();

    let data = read_slice(&r, DecodeOptions::default()).unwrap();
    assert!(data.warnings.is_empty());

    let table = data.tables.get(20).unwrap();
    let timestamps: Vec<_> = table
        .column("field_253")
        .unwrap()
        .iter()
        .map(|v| v.and_then(Value::as_u64))
        .collect();

    assert_eq!(
        timestamps,
        vec![Some(1000), Some(1002), Some(1023), Some(1026)]
    );
    assert_eq!(table.column("field_3").unwrap().null_count(), 0);
}

#[test]
fn compressed_timestamp_without_reference() {
    let r = FitBuilder::new()
        .define(2, 20, &[(3, 1, UINT8)])
        .compressed(2, 5, &[140])
        .build();

    let data = read_slice(&r, DecodeOptions::default()).unwrap();
    assert_eq!(
        data.warnings,
        vec![Warning::MissingTimeReference { global_message: 20 }]
    );

    let table = data.tables.get(20).unwrap();
    assert_eq!(table.column("field_253").unwrap().values(), &[None]);
}

#[test]
fn redefinition_replaces_layout() {
    let r = FitBuilder::new()
        .define(3, 20, &[(3, 1, UINT8)])
        .data(3, &[140])
        .define(3, 20, &[(3, 1, UINT8), (7, 2, UINT16)])
        .data(3, &[141, 0xFA, 0x00])
        .define(3, 21, &[(0, 1, ENUM)])
        .data(3, &[0])
        .build();

    let data = read_slice(&r, DecodeOptions::default()).unwrap();
    assert_eq!(data.tables.message_numbers().collect::<Vec<_>>(), vec![20, 21]);

    let table = data.tables.get(20).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(
        table.column("field_7").unwrap().values(),
        &[None, Some(Value::UInt16(250))]
    );
    assert_eq!(data.tables.get(21).map(|t| t.len()), Some(1));
}

#[test]
fn field_size_mismatch_is_local() {
    let r = FitBuilder::new()
        .define(0, 20, &[(7, 3, UINT16), (3, 1, UINT8)])
        .data(0, &[0x01, 0x02, 0x03, 140])
        .build();

    let data = read_slice(&r, DecodeOptions::default()).unwrap();
    assert!(matches!(
        data.warnings.as_slice(),
        [Warning::FieldSizeMismatch {
            global_message: 20,
            key: FieldKey::Native(7),
            size: 3,
            ..
        }]
    ));

    let table = data.tables.get(20).unwrap();
    assert_eq!(table.column("field_7").unwrap().values(), &[None]);
    assert_eq!(
        table.column("field_3").unwrap().values(),
        &[Some(Value::UInt8(140))]
    );
}

#[test]
fn developer_field_before_description() {
    let r = FitBuilder::new()
        .define_developer(0, 20, &[(3, 1, UINT8)], &[(0, 2, 0)])
        .data(0, &[140, 0xC8, 0x00])
        .describe(1, 0, 0, UINT16, "Power")
        .data(0, &[141, 0xC9, 0x00])
        .build();

    let data = read_slice(&r, DecodeOptions::default()).unwrap();
    assert_eq!(
        data.warnings,
        vec![Warning::UnknownDeveloperField {
            global_message: 20,
            developer_index: 0,
            number: 0
        }]
    );

    let table = data.tables.get(20).unwrap();
    assert_eq!(
        table.column("field_3").unwrap().values(),
        &[Some(Value::UInt8(140)), Some(Value::UInt8(141))]
    );

    let power = table
        .column_by_key(FieldKey::Developer {
            developer_index: 0,
            number: 0,
        })
        .unwrap();
    assert_eq!(power.name(), "dev_0_0");
    assert_eq!(power.values(), &[None, Some(Value::UInt16(201))]);
    assert_eq!(
        power.developer().and_then(|d| d.name.as_deref()),
        Some("Power")
    );

    let renamed = table.renamed(&std::collections::BTreeMap::<(u16, u8), String>::new());
    assert!(renamed.column("Power").is_some());
    assert!(renamed.column("field_3").is_some());

    assert_eq!(data.tables.get(206).map(|t| t.len()), Some(1));
}

#[test]
fn undefined_local_message_type() {
    let r = FitBuilder::new()
        .define(0, 20, &[(3, 1, UINT8)])
        .data(5, &[140])
        .build();

    let err = read_slice(&r, DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, Error::UndefinedLocalMessageType(5)));
}

#[test]
fn unsupported_base_type() {
    let r = FitBuilder::new()
        .define(0, 20, &[(3, 1, 0x1F)])
        .data(0, &[140])
        .build();

    let err = read_slice(&r, DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, Error::UnsupportedBaseType(0x1F)));
}

#[test]
fn reserved_base_type_bits() {
    for base_type in [0x60, 0xE0, 0x22] {
        let r = FitBuilder::new()
            .define(0, 20, &[(3, 1, base_type)])
            .data(0, &[5])
            .build();

        let err = read_slice(&r, DecodeOptions::default()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedBaseType(b) if b == base_type));
    }
}

#[test]
fn wide_timestamp_does_not_reset_reference() {
    let r = FitBuilder::new()
        .define(0, 20, &[(253, 8, UINT64)])
        .data(0, &0x1_0000_0000u64.to_le_bytes())
        .define(1, 20, &[(3, 1, UINT8)])
        .compressed(1, 4, &[140])
        .build();

    let data = read_slice(&r, DecodeOptions::default()).unwrap();
    assert_eq!(
        data.warnings,
        vec![Warning::MissingTimeReference { global_message: 20 }]
    );

    let r = FitBuilder::new()
        .define(0, 20, &[(253, 8, UINT64)])
        .data(0, &1000u64.to_le_bytes())
        .define(1, 20, &[(3, 1, UINT8)])
        .compressed(1, 10, &[140])
        .build();

    assert_eq!(
        column(&r, 20, "field_253"),
        vec![Some(Value::UInt64(1000)), Some(Value::UInt32(1002))]
    );
}

#[test]
fn undescribed_developer_field_reported_once() {
    let r = FitBuilder::new()
        .define_developer(0, 20, &[(3, 1, UINT8)], &[(0, 2, 0)])
        .data(0, &[140, 0xC8, 0x00])
        .data(0, &[141, 0xC9, 0x00])
        .data(0, &[142, 0xCA, 0x00])
        .define_developer(1, 19, &[(0, 1, ENUM)], &[(0, 2, 0)])
        .data(1, &[0, 0xC8, 0x00])
        .build();

    let data = read_slice(&r, DecodeOptions::default()).unwrap();
    assert_eq!(
        data.warnings,
        vec![
            Warning::UnknownDeveloperField {
                global_message: 20,
                developer_index: 0,
                number: 0
            },
            Warning::UnknownDeveloperField {
                global_message: 19,
                developer_index: 0,
                number: 0
            },
        ]
    );
    assert_eq!(data.tables.get(20).map(|t| t.len()), Some(3));
}

#[test]
fn truncated_input() {
    let r = heart_rate_document(&[(1000, 140), (1001, 141)]);

    let err = read_slice(&r[..r.len() - 4], DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, Error::TruncatedInput(_)));

    let err = read_slice(&r[..8], DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, Error::TruncatedInput(_)));
}

#[test]
fn record_past_declared_size() {
    let builder = FitBuilder::new()
        .define(0, 20, &[(253, 4, UINT32), (3, 1, UINT8)])
        .data(0, &[0x01, 0x02, 0x03, 0x04, 140]);
    let r = builder.clone().data_size(15).build();

    let err = read_slice(&r, DecodeOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::MalformedStream {
            offset: 25,
            end: 27
        }
    ));
}

#[test]
fn invalid_headers() {
    let mut r = heart_rate_document(&[]);
    r[8..12].copy_from_slice(b".FTT");
    let err = read_slice(&r, DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidSignature));

    let mut r = heart_rate_document(&[]);
    r[0] = 13;
    let err = read_slice(&r, DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, Error::UnsupportedHeaderSize(13)));
}

#[test]
fn chained_documents() {
    let mut r = heart_rate_document(&[(1000, 140)]);
    r.extend(heart_rate_document(&[(2000, 150), (2001, 151)]));

    let data = read_slice(&r, DecodeOptions::default()).unwrap();
    assert_eq!(data.headers.len(), 2);
    assert!(data.warnings.is_empty());
    assert_eq!(data.tables.get(20).map(|t| t.len()), Some(3));

    let data = read_slice(&r, DecodeOptions::new().with_chained(false)).unwrap();
    assert_eq!(data.headers.len(), 1);
    assert_eq!(data.tables.get(20).map(|t| t.len()), Some(1));
    assert!(matches!(
        data.warnings.as_slice(),
        [Warning::TrailingBytes { .. }]
    ));
}

#[test]
fn trailing_bytes() {
    let mut r = heart_rate_document(&[(1000, 140)]);
    let offset = r.len();
    r.extend_from_slice(&[0, 0, 0]);

    let data = read_slice(&r, DecodeOptions::default()).unwrap();
    assert_eq!(
        data.warnings,
        vec![Warning::TrailingBytes { offset, count: 3 }]
    );
}

#[test]
fn sink_receives_every_message() {
    let r = FitBuilder::new()
        .describe(1, 0, 0, UINT16, "Power")
        .define_developer(0, 20, &[(3, 1, UINT8)], &[(0, 2, 0)])
        .data(0, &[140, 0xC8, 0x00])
        .build();

    let mut messages: Vec<DecodedMessage> = Vec::new();
    let decoded = decode_slice(&r, &mut messages, DecodeOptions::default()).unwrap();

    assert!(decoded.warnings.is_empty());
    assert_eq!(
        messages.iter().map(|m| m.global_message).collect::<Vec<_>>(),
        vec![206, 20]
    );
    assert_eq!(messages[1].value(3), Some(&Value::UInt8(140)));
    assert_eq!(
        messages[1]
            .field(FieldKey::Developer {
                developer_index: 0,
                number: 0
            })
            .and_then(|f| f.value.as_ref()),
        Some(&Value::UInt16(200))
    );
}

#[test]
fn reader_and_path_decoding() {
    let r = heart_rate_document(&[(1000, 140), (1001, 141)]);

    let mut messages: Vec<DecodedMessage> = Vec::new();
    avec::decode_reader(&mut r.as_slice(), &mut messages, DecodeOptions::default()).unwrap();
    assert_eq!(messages.len(), 2);

    let path = std::env::temp_dir().join("fitframe-reader-and-path-decoding.fit");
    std::fs::write(&path, &r).unwrap();

    let data = fitframe::read_path(&path, DecodeOptions::default()).unwrap();
    assert_eq!(data.tables.get(20).map(|t| t.len()), Some(2));

    std::fs::remove_file(&path).unwrap();
}
