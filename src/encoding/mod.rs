// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0
//! # Attribute encoding
//!
//! Schema driven conversion between structures and the attribute stream
//! described in [`attr`]. Numbers in ascii-safe attributes are decimal text,
//! data and strings are lowercase hex. Binary numbers are big-endian, four
//! bytes for `int32`/`uint32` and eight bytes for `ulong` and `time`.
//!
//! A repeated field is written as its element count under the field name
//! followed by every member of every element with the element index
//! appended to the member name.
use byteorder::{BigEndian, ByteOrder};
use chrono::{DateTime, Utc};
use tracing::trace;

use crate::buffer::Buffer;
use crate::error::WebAuthError;

pub mod attr;
pub mod schema;

pub use attr::{AttrWriter, Attribute, Attributes};
pub use schema::{Encodable, Field, Flags, Group, Kind, Repeated, Schema};

/// Encode `data` according to `schema`.
#[tracing::instrument(level = "trace", skip_all, fields(schema = schema.name))]
pub fn encode<T>(schema: &Schema<T>, data: &T) -> Result<Vec<u8>, WebAuthError> {
    let mut buf = Buffer::new();
    encode_into(schema, data, &mut buf)?;
    Ok(buf.into_vec())
}

/// Encode `data` according to `schema`, appending to `out`.
pub fn encode_into<T>(schema: &Schema<T>, data: &T, out: &mut Buffer) -> Result<(), WebAuthError> {
    let mut writer = AttrWriter::new(out);
    encode_attrs(schema, data, &mut writer)
}

/// Encode every field of `schema` through an existing writer.
pub fn encode_attrs<T>(
    schema: &Schema<T>,
    data: &T,
    out: &mut AttrWriter<'_>,
) -> Result<(), WebAuthError> {
    for field in schema.fields {
        encode_field(field, data, None, out)
            .map_err(|e| e.context(format!("encoding {}", schema.name)))?;
    }
    Ok(())
}

/// Decode a structure according to `schema`.
#[tracing::instrument(level = "trace", skip_all, fields(schema = schema.name))]
pub fn decode<T: Default>(schema: &Schema<T>, input: &[u8]) -> Result<T, WebAuthError> {
    let mut attrs =
        Attributes::parse(input).map_err(|e| e.context(format!("decoding {}", schema.name)))?;
    let mut data = T::default();
    decode_attrs(schema, &mut attrs, &mut data)?;
    Ok(data)
}

/// Decode the fields of `schema` out of already parsed attributes.
///
/// Attributes unknown to the schema are left in `attrs` and otherwise
/// ignored, except for leftover members of repeated elements beyond the
/// declared count.
pub fn decode_attrs<T>(
    schema: &Schema<T>,
    attrs: &mut Attributes,
    data: &mut T,
) -> Result<(), WebAuthError> {
    for field in schema.fields {
        decode_field(field, data, None, attrs)
            .map_err(|e| e.context(format!("decoding {}", schema.name)))?;
    }
    check_repeat_leftovers(schema, attrs)
        .map_err(|e| e.context(format!("decoding {}", schema.name)))?;
    if !attrs.is_empty() {
        trace!(
            "ignoring unknown attributes {:?} in {}",
            attrs.remaining().collect::<Vec<_>>(),
            schema.name
        );
    }
    Ok(())
}

/// Reject members of repeated elements that the element count did not cover.
fn check_repeat_leftovers<T>(schema: &Schema<T>, attrs: &Attributes) -> Result<(), WebAuthError> {
    for field in schema.fields {
        let Kind::Repeat(group) = &field.kind else {
            continue;
        };
        let members = group.element_attrs();
        if let Some(name) = attrs.remaining().find(|name| {
            members.iter().any(|member| {
                name.strip_prefix(member).is_some_and(|rest| {
                    !rest.is_empty() && rest.bytes().all(|c| c.is_ascii_digit())
                })
            })
        }) {
            return Err(WebAuthError::corrupt(format!(
                "{} count does not match elements present, found extra attribute {name}",
                field.desc
            )));
        }
    }
    Ok(())
}

fn missing<T>(field: &Field<T>, name: &str) -> WebAuthError {
    WebAuthError::invalid(format!("required {} ({name}) is not set", field.desc))
}

pub(crate) fn encode_field<T>(
    field: &Field<T>,
    data: &T,
    index: Option<usize>,
    out: &mut AttrWriter<'_>,
) -> Result<(), WebAuthError> {
    let name = field.name(index);
    let ascii = field.flags.ascii;
    match &field.kind {
        Kind::Data { get, .. } => match get(data) {
            Some(value) => write_bytes(out, &name, ascii, value),
            None if field.flags.optional => Ok(()),
            None => Err(missing(field, &name)),
        },
        Kind::String { get, .. } => match get(data) {
            Some(value) => write_bytes(out, &name, ascii, value.as_bytes()),
            None if field.flags.optional => Ok(()),
            None => Err(missing(field, &name)),
        },
        Kind::Int32 { get, .. } => match get(data) {
            Some(value) if ascii => out.ascii(&name, value.to_string().as_bytes()),
            Some(value) => {
                let mut raw = [0u8; 4];
                BigEndian::write_i32(&mut raw, value);
                out.binary(&name, &raw)
            }
            None if field.flags.optional => Ok(()),
            None => Err(missing(field, &name)),
        },
        Kind::Uint32 { get, .. } => match get(data) {
            Some(value) => write_u32(out, &name, ascii, value),
            None if field.flags.optional => Ok(()),
            None => Err(missing(field, &name)),
        },
        Kind::Ulong { get, .. } => match get(data) {
            Some(value) if ascii => out.ascii(&name, value.to_string().as_bytes()),
            Some(value) => {
                let mut raw = [0u8; 8];
                BigEndian::write_u64(&mut raw, value);
                out.binary(&name, &raw)
            }
            None if field.flags.optional => Ok(()),
            None => Err(missing(field, &name)),
        },
        Kind::Time { get, .. } => match get(data) {
            Some(value) if ascii => out.ascii(&name, value.timestamp().to_string().as_bytes()),
            Some(value) => {
                let mut raw = [0u8; 8];
                BigEndian::write_i64(&mut raw, value.timestamp());
                out.binary(&name, &raw)
            }
            None if field.flags.optional => Ok(()),
            None => Err(missing(field, &name)),
        },
        Kind::Repeat(group) => {
            if index.is_some() {
                return Err(WebAuthError::unimplemented(format!(
                    "nested repeat of {} is not supported",
                    field.desc
                )));
            }
            let count = u32::try_from(group.count(data)).map_err(|_| {
                WebAuthError::invalid(format!("too many elements in {}", field.desc))
            })?;
            write_u32(out, &name, ascii, count)?;
            group.encode_elements(data, out)
        }
    }
}

fn write_bytes(
    out: &mut AttrWriter<'_>,
    name: &str,
    ascii: bool,
    value: &[u8],
) -> Result<(), WebAuthError> {
    if ascii {
        out.ascii(name, &crate::hex::encode_to_vec(value))
    } else {
        out.binary(name, value)
    }
}

fn write_u32(
    out: &mut AttrWriter<'_>,
    name: &str,
    ascii: bool,
    value: u32,
) -> Result<(), WebAuthError> {
    if ascii {
        out.ascii(name, value.to_string().as_bytes())
    } else {
        let mut raw = [0u8; 4];
        BigEndian::write_u32(&mut raw, value);
        out.binary(name, &raw)
    }
}

pub(crate) fn decode_field<T>(
    field: &Field<T>,
    data: &mut T,
    index: Option<usize>,
    attrs: &mut Attributes,
) -> Result<(), WebAuthError> {
    let name = field.name(index);
    if index.is_some() && matches!(field.kind, Kind::Repeat(_)) {
        return Err(WebAuthError::unimplemented(format!(
            "nested repeat of {} is not supported",
            field.desc
        )));
    }
    let Some(attr) = attrs.take(&name) else {
        // Repeat counts are always written, so a missing count means lost data.
        if field.flags.optional && !matches!(field.kind, Kind::Repeat(_)) {
            return Ok(());
        }
        return Err(WebAuthError::corrupt(format!(
            "required {} ({name}) is missing",
            field.desc
        )));
    };
    if attr.ascii != field.flags.ascii {
        return Err(WebAuthError::corrupt(format!(
            "{} ({name}) has the wrong representation",
            field.desc
        )));
    }
    let value = attr.value;
    match &field.kind {
        Kind::Data { set, .. } => set(data, read_bytes(field, &name, value)?),
        Kind::String { set, .. } => {
            let value = String::from_utf8(read_bytes(field, &name, value)?).map_err(|_| {
                WebAuthError::corrupt(format!("{} ({name}) is not valid UTF-8", field.desc))
            })?;
            set(data, value)
        }
        Kind::Int32 { set, .. } => {
            let value = if field.flags.ascii {
                parse_decimal(field, &name, &value)?
            } else {
                BigEndian::read_i32(fixed::<4, T>(field, &name, &value)?)
            };
            set(data, value)
        }
        Kind::Uint32 { set, .. } => set(data, read_u32(field, &name, &value)?),
        Kind::Ulong { set, .. } => {
            let value = if field.flags.ascii {
                parse_decimal(field, &name, &value)?
            } else {
                BigEndian::read_u64(fixed::<8, T>(field, &name, &value)?)
            };
            set(data, value)
        }
        Kind::Time { set, .. } => {
            let secs = if field.flags.ascii {
                parse_decimal(field, &name, &value)?
            } else {
                BigEndian::read_i64(fixed::<8, T>(field, &name, &value)?)
            };
            let time = DateTime::<Utc>::from_timestamp(secs, 0).ok_or_else(|| {
                WebAuthError::corrupt(format!("{} ({name}) is out of range", field.desc))
            })?;
            set(data, time)
        }
        Kind::Repeat(group) => {
            let count = read_u32(field, &name, &value)?;
            let count = usize::try_from(count).map_err(|_| {
                WebAuthError::corrupt(format!("{} ({name}) count is too large", field.desc))
            })?;
            group.decode_elements(data, count, attrs)?
        }
    }
    Ok(())
}

fn read_bytes<T>(field: &Field<T>, name: &str, value: Vec<u8>) -> Result<Vec<u8>, WebAuthError> {
    if !field.flags.ascii {
        return Ok(value);
    }
    crate::hex::decode_to_vec(&value)
        .map_err(|e| WebAuthError::from(e).context(format!("decoding {} ({name})", field.desc)))
}

fn read_u32<T>(field: &Field<T>, name: &str, value: &[u8]) -> Result<u32, WebAuthError> {
    if field.flags.ascii {
        parse_decimal(field, name, value)
    } else {
        Ok(BigEndian::read_u32(fixed::<4, T>(field, name, value)?))
    }
}

fn fixed<'a, const N: usize, T>(
    field: &Field<T>,
    name: &str,
    value: &'a [u8],
) -> Result<&'a [u8], WebAuthError> {
    if value.len() != N {
        return Err(WebAuthError::corrupt(format!(
            "{} ({name}) is {} bytes, expected {N}",
            field.desc,
            value.len()
        )));
    }
    Ok(value)
}

fn parse_decimal<N: std::str::FromStr, T>(
    field: &Field<T>,
    name: &str,
    value: &[u8],
) -> Result<N, WebAuthError> {
    std::str::from_utf8(value)
        .ok()
        .filter(|s| {
            let digits = s.strip_prefix('-').unwrap_or(s);
            !digits.is_empty() && digits.bytes().all(|c| c.is_ascii_digit())
        })
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            WebAuthError::corrupt(format!("{} ({name}) is not a valid number", field.desc))
        })
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use proptest::prelude::*;

    use super::schema::{ASCII, OPTIONAL, REQUIRED};
    use super::*;
    use crate::error::Status;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Pair {
        kind: Option<i32>,
        value: Option<Vec<u8>>,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Sample {
        name: Option<String>,
        label: Option<String>,
        size: Option<u32>,
        big: Option<u64>,
        signed: Option<i32>,
        when: Option<DateTime<Utc>>,
        stamp: Option<DateTime<Utc>>,
        blob: Option<Vec<u8>>,
        pairs: Vec<Pair>,
    }

    static PAIR_FIELDS: &[Field<Pair>] = &[
        Field::int32(
            "P",
            "pair type",
            REQUIRED,
            |p: &Pair| p.kind,
            |p: &mut Pair, v| p.kind = Some(v),
        ),
        Field::data(
            "p",
            "pair value",
            REQUIRED,
            |p: &Pair| p.value.as_deref(),
            |p: &mut Pair, v| p.value = Some(v),
        ),
    ];

    static PAIR_GROUP: Group<Sample, Pair> = Group {
        desc: "pair",
        fields: PAIR_FIELDS,
        get: |s: &Sample| s.pairs.as_slice(),
        set: |s: &mut Sample, v| s.pairs = v,
    };

    static SAMPLE_FIELDS: &[Field<Sample>] = &[
        Field::string(
            "n",
            "name",
            REQUIRED,
            |s: &Sample| s.name.as_deref(),
            |s: &mut Sample, v| s.name = Some(v),
        ),
        Field::string(
            "l",
            "label",
            OPTIONAL.ascii(),
            |s: &Sample| s.label.as_deref(),
            |s: &mut Sample, v| s.label = Some(v),
        ),
        Field::uint32(
            "sz",
            "size",
            ASCII,
            |s: &Sample| s.size,
            |s: &mut Sample, v| s.size = Some(v),
        ),
        Field::ulong(
            "b",
            "big number",
            OPTIONAL,
            |s: &Sample| s.big,
            |s: &mut Sample, v| s.big = Some(v),
        ),
        Field::int32(
            "i",
            "signed number",
            OPTIONAL.ascii(),
            |s: &Sample| s.signed,
            |s: &mut Sample, v| s.signed = Some(v),
        ),
        Field::time(
            "w",
            "time",
            OPTIONAL,
            |s: &Sample| s.when,
            |s: &mut Sample, v| s.when = Some(v),
        ),
        Field::time(
            "ct",
            "creation time",
            OPTIONAL.ascii().creation(),
            |s: &Sample| s.stamp,
            |s: &mut Sample, v| s.stamp = Some(v),
        ),
        Field::repeat("np", "pairs", REQUIRED, &PAIR_GROUP),
        Field::data(
            "d",
            "blob",
            REQUIRED,
            |s: &Sample| s.blob.as_deref(),
            |s: &mut Sample, v| s.blob = Some(v),
        ),
    ];

    static SAMPLE_SCHEMA: Schema<Sample> = Schema::new("sample", SAMPLE_FIELDS);

    fn sample() -> Sample {
        Sample {
            name: Some("alice".into()),
            label: Some("x;y".into()),
            size: Some(u32::MAX),
            big: Some(u64::MAX),
            signed: Some(-42),
            when: DateTime::from_timestamp(1_300_000_000, 0),
            stamp: DateTime::from_timestamp(1_200_000_000, 0),
            blob: Some(b"\0\x01;=".to_vec()),
            pairs: vec![
                Pair {
                    kind: Some(2),
                    value: Some(b"\x7f\0\0\x01".to_vec()),
                },
                Pair {
                    kind: Some(-1),
                    value: Some(Vec::new()),
                },
            ],
        }
    }

    #[test]
    fn test_roundtrip() {
        let data = sample();
        let encoded = encode(&SAMPLE_SCHEMA, &data).unwrap();
        assert_eq!(data, decode(&SAMPLE_SCHEMA, &encoded).unwrap());
    }

    #[test]
    fn test_wire_form() {
        let data = Sample {
            name: Some("a".into()),
            label: Some("A".into()),
            size: Some(7),
            stamp: DateTime::from_timestamp(10, 0),
            blob: Some(vec![1]),
            pairs: vec![Pair {
                kind: Some(1),
                value: Some(vec![0xff]),
            }],
            ..Default::default()
        };
        let encoded = encode(&SAMPLE_SCHEMA, &data).unwrap();
        assert_eq!(
            b"n:1=a;l=41;sz=7;ct=10;np:4=\0\0\0\x01;P0:4=\0\0\0\x01;p0:1=\xff;d:1=\x01;".to_vec(),
            encoded
        );
    }

    #[test]
    fn test_optional_absent_and_zero_repeat() {
        let data = Sample {
            name: Some(String::new()),
            size: Some(0),
            blob: Some(Vec::new()),
            ..Default::default()
        };
        let encoded = encode(&SAMPLE_SCHEMA, &data).unwrap();
        assert_eq!(b"n:0=;sz=0;np:4=\0\0\0\0;d:0=;".to_vec(), encoded);
        assert_eq!(data, decode(&SAMPLE_SCHEMA, &encoded).unwrap());
    }

    #[test]
    fn test_missing_repeat_count() {
        let err = decode(&SAMPLE_SCHEMA, b"n:1=a;sz=1;d:0=;").unwrap_err();
        assert_eq!(Status::Corrupt, err.status());
        assert!(err.message().contains("pairs (np)"), "{}", err.message());
    }

    #[test]
    fn test_required_absent_on_encode() {
        let data = Sample {
            name: Some("a".into()),
            size: Some(1),
            ..Default::default()
        };
        let err = encode(&SAMPLE_SCHEMA, &data).unwrap_err();
        assert_eq!(Status::Invalid, err.status());
        assert!(err.message().starts_with("encoding sample: "));
        assert!(err.message().contains("blob"));
    }

    #[test]
    fn test_required_element_absent_on_encode() {
        let mut data = sample();
        data.pairs[1].value = None;
        let err = encode(&SAMPLE_SCHEMA, &data).unwrap_err();
        assert_eq!(Status::Invalid, err.status());
        assert!(err.message().contains("encoding pair 1"), "{}", err.message());
    }

    #[test]
    fn test_truncated_at_field_boundary() {
        let encoded = encode(&SAMPLE_SCHEMA, &sample()).unwrap();
        let boundary = encoded.len() - b"d:4=\0\x01;=;".len();
        let err = decode(&SAMPLE_SCHEMA, &encoded[..boundary]).unwrap_err();
        assert_eq!(Status::Corrupt, err.status());
        assert!(err.message().contains("blob"));
    }

    #[test]
    fn test_truncated_inside_field() {
        let encoded = encode(&SAMPLE_SCHEMA, &sample()).unwrap();
        let err = decode(&SAMPLE_SCHEMA, &encoded[..encoded.len() - 2]).unwrap_err();
        assert_eq!(Status::Corrupt, err.status());
    }

    #[test]
    fn test_repeat_count_flip() {
        let encoded = encode(&SAMPLE_SCHEMA, &sample()).unwrap();
        let pos = encoded
            .windows(b"np:4=".len())
            .position(|w| w == b"np:4=")
            .unwrap()
            + b"np:4=".len()
            + 3;
        assert_eq!(2, encoded[pos]);

        let mut fewer = encoded.clone();
        fewer[pos] = 1;
        let err = decode(&SAMPLE_SCHEMA, &fewer).unwrap_err();
        assert_eq!(Status::Corrupt, err.status());

        let mut more = encoded;
        more[pos] = 3;
        let err = decode(&SAMPLE_SCHEMA, &more).unwrap_err();
        assert_eq!(Status::Corrupt, err.status());
        assert!(err.message().contains("pair 2"), "{}", err.message());
    }

    #[test]
    fn test_unknown_attribute_ignored() {
        let decoded = decode(&SAMPLE_SCHEMA, b"n:1=a;zz=1;sz=1;d:0=;").unwrap();
        assert_eq!(Some("a".into()), decoded.name);
    }

    #[test]
    fn test_wrong_representation() {
        for input in [&b"n=61;sz=1;d:0=;"[..], b"n:1=a;sz:4=\0\0\0\x01;d:0=;"] {
            let err = decode(&SAMPLE_SCHEMA, input).unwrap_err();
            assert_eq!(Status::Corrupt, err.status());
        }
    }

    #[test]
    fn test_bad_values() {
        for input in [
            &b"n:1=a;sz=x;d:0=;"[..],
            b"n:1=a;sz=;d:0=;",
            b"n:1=a;sz=-1;d:0=;",
            b"n:1=a;sz=1;b:3=abc;d:0=;",
            b"n:1=a;sz=1;l=4;d:0=;",
            b"n:1=a;sz=1;l=zz;d:0=;",
            b"n:1=\xff;sz=1;d:0=;",
            b"n:1=a;sz=1;ct=99999999999999999;d:0=;",
        ] {
            let err = decode(&SAMPLE_SCHEMA, input).unwrap_err();
            assert_eq!(Status::Corrupt, err.status(), "{input:?}");
            assert!(err.message().starts_with("decoding sample: "));
        }
    }

    #[derive(Debug, Default)]
    struct Nested {
        outer: Vec<Sample>,
    }

    static NESTED_GROUP: Group<Nested, Sample> = Group {
        desc: "sample",
        fields: SAMPLE_FIELDS,
        get: |n: &Nested| n.outer.as_slice(),
        set: |n: &mut Nested, v| n.outer = v,
    };

    static NESTED_FIELDS: &[Field<Nested>] =
        &[Field::repeat("o", "outer", REQUIRED, &NESTED_GROUP)];

    static NESTED_SCHEMA: Schema<Nested> = Schema::new("nested", NESTED_FIELDS);

    #[test]
    fn test_nested_repeat_unimplemented() {
        let data = Nested {
            outer: vec![sample()],
        };
        let err = encode(&NESTED_SCHEMA, &data).unwrap_err();
        assert_eq!(Status::Unimplemented, err.status());

        let err = decode(&NESTED_SCHEMA, b"o:4=\0\0\0\x01;n0:1=a;sz0=1;d0:0=;").unwrap_err();
        assert_eq!(Status::Unimplemented, err.status());
    }

    proptest! {
        #[test]
        fn test_roundtrip_any(
            name in ".*",
            size in any::<u32>(),
            signed in proptest::option::of(any::<i32>()),
            secs in proptest::option::of(0i64..4_000_000_000),
            blob in proptest::collection::vec(any::<u8>(), 0..64),
            pairs in proptest::collection::vec(
                (any::<i32>(), proptest::collection::vec(any::<u8>(), 0..16)),
                0..4,
            ),
        ) {
            let data = Sample {
                name: Some(name),
                size: Some(size),
                signed,
                when: secs.and_then(|s| DateTime::from_timestamp(s, 0)),
                blob: Some(blob),
                pairs: pairs
                    .into_iter()
                    .map(|(kind, value)| Pair { kind: Some(kind), value: Some(value) })
                    .collect(),
                ..Default::default()
            };
            let encoded = encode(&SAMPLE_SCHEMA, &data).unwrap();
            prop_assert_eq!(data, decode(&SAMPLE_SCHEMA, &encoded).unwrap());
        }
    }
}
