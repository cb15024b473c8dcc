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
//! Declarative field descriptions.
//!
//! A [`Schema`] lists the [`Field`]s of one structure. Every field reads and
//! writes its value through a pair of plain function pointers, so one
//! interpreter can handle every structure without knowing its layout.
use chrono::{DateTime, Utc};

use crate::encoding::attr::{AttrWriter, Attributes};
use crate::error::WebAuthError;

/// Encoding flags of a field.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Flags {
    /// Field may be absent.
    pub optional: bool,
    /// Use the ASCII-safe representation.
    pub ascii: bool,
    /// Field holds the creation time of the structure.
    pub creation: bool,
}

impl Flags {
    pub const NONE: Self = Self {
        optional: false,
        ascii: false,
        creation: false,
    };

    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub const fn ascii(mut self) -> Self {
        self.ascii = true;
        self
    }

    pub const fn creation(mut self) -> Self {
        self.creation = true;
        self
    }
}

pub const REQUIRED: Flags = Flags::NONE;
pub const OPTIONAL: Flags = Flags::NONE.optional();
pub const ASCII: Flags = Flags::NONE.ascii();
pub const CREATION: Flags = Flags::NONE.creation();

/// Kind of a field together with its accessors.
///
/// Getters return `None` when the value is absent.
pub enum Kind<T: 'static> {
    Data {
        get: fn(&T) -> Option<&[u8]>,
        set: fn(&mut T, Vec<u8>),
    },
    String {
        get: fn(&T) -> Option<&str>,
        set: fn(&mut T, String),
    },
    Int32 {
        get: fn(&T) -> Option<i32>,
        set: fn(&mut T, i32),
    },
    Uint32 {
        get: fn(&T) -> Option<u32>,
        set: fn(&mut T, u32),
    },
    Ulong {
        get: fn(&T) -> Option<u64>,
        set: fn(&mut T, u64),
    },
    Time {
        get: fn(&T) -> Option<DateTime<Utc>>,
        set: fn(&mut T, DateTime<Utc>),
    },
    /// A count followed by that many nested structures.
    Repeat(&'static dyn Repeated<T>),
}

impl<T: 'static> Kind<T> {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Data { .. } => "data",
            Self::String { .. } => "string",
            Self::Int32 { .. } => "int32",
            Self::Uint32 { .. } => "uint32",
            Self::Ulong { .. } => "ulong",
            Self::Time { .. } => "time",
            Self::Repeat(_) => "repeat",
        }
    }
}

/// One encoded attribute of a structure.
pub struct Field<T: 'static> {
    /// Attribute name on the wire.
    pub attr: &'static str,
    /// Description used in error messages.
    pub desc: &'static str,
    pub flags: Flags,
    pub kind: Kind<T>,
}

impl<T: 'static> Field<T> {
    pub const fn new(attr: &'static str, desc: &'static str, flags: Flags, kind: Kind<T>) -> Self {
        Self {
            attr,
            desc,
            flags,
            kind,
        }
    }

    pub const fn data(
        attr: &'static str,
        desc: &'static str,
        flags: Flags,
        get: fn(&T) -> Option<&[u8]>,
        set: fn(&mut T, Vec<u8>),
    ) -> Self {
        Self::new(attr, desc, flags, Kind::Data { get, set })
    }

    pub const fn string(
        attr: &'static str,
        desc: &'static str,
        flags: Flags,
        get: fn(&T) -> Option<&str>,
        set: fn(&mut T, String),
    ) -> Self {
        Self::new(attr, desc, flags, Kind::String { get, set })
    }

    pub const fn int32(
        attr: &'static str,
        desc: &'static str,
        flags: Flags,
        get: fn(&T) -> Option<i32>,
        set: fn(&mut T, i32),
    ) -> Self {
        Self::new(attr, desc, flags, Kind::Int32 { get, set })
    }

    pub const fn uint32(
        attr: &'static str,
        desc: &'static str,
        flags: Flags,
        get: fn(&T) -> Option<u32>,
        set: fn(&mut T, u32),
    ) -> Self {
        Self::new(attr, desc, flags, Kind::Uint32 { get, set })
    }

    pub const fn ulong(
        attr: &'static str,
        desc: &'static str,
        flags: Flags,
        get: fn(&T) -> Option<u64>,
        set: fn(&mut T, u64),
    ) -> Self {
        Self::new(attr, desc, flags, Kind::Ulong { get, set })
    }

    pub const fn time(
        attr: &'static str,
        desc: &'static str,
        flags: Flags,
        get: fn(&T) -> Option<DateTime<Utc>>,
        set: fn(&mut T, DateTime<Utc>),
    ) -> Self {
        Self::new(attr, desc, flags, Kind::Time { get, set })
    }

    /// Repeated group. The element count is always written and must be
    /// present on decode, even for an empty group.
    pub const fn repeat(
        attr: &'static str,
        desc: &'static str,
        flags: Flags,
        group: &'static dyn Repeated<T>,
    ) -> Self {
        Self::new(attr, desc, flags, Kind::Repeat(group))
    }

    /// Wire name of the field, with the element index for repeat members.
    pub fn name(&self, index: Option<usize>) -> String {
        match index {
            Some(i) => format!("{}{i}", self.attr),
            None => self.attr.to_string(),
        }
    }
}

/// Encoding rules for one structure.
pub struct Schema<T: 'static> {
    /// Name of the structure for error messages.
    pub name: &'static str,
    pub fields: &'static [Field<T>],
}

impl<T: 'static> Schema<T> {
    pub const fn new(name: &'static str, fields: &'static [Field<T>]) -> Self {
        Self { name, fields }
    }

    pub fn field(&self, attr: &str) -> Option<&Field<T>> {
        self.fields.iter().find(|f| f.attr == attr)
    }

    /// The field flagged as holding the creation time, if any.
    pub fn creation_field(&self) -> Option<&Field<T>> {
        self.fields.iter().find(|f| f.flags.creation)
    }
}

/// A structure with static encoding rules.
pub trait Encodable: Default + 'static {
    fn schema() -> &'static Schema<Self>;
}

/// Encoding of a repeated nested structure inside a `T`.
///
/// Implemented by [`Group`]; kept as a trait so that a field of `T` can
/// refer to a group of any element type.
pub trait Repeated<T>: Sync {
    /// Number of elements present in `data`.
    fn count(&self, data: &T) -> usize;

    /// Write every element of `data`, suffixing names with the index.
    fn encode_elements(&self, data: &T, out: &mut AttrWriter<'_>) -> Result<(), WebAuthError>;

    /// Read `count` elements and store them into `data`.
    fn decode_elements(
        &self,
        data: &mut T,
        count: usize,
        attrs: &mut Attributes,
    ) -> Result<(), WebAuthError>;

    /// Element attribute names of this group, without index.
    fn element_attrs(&self) -> Vec<&'static str>;
}

/// Repeated group of `E` elements stored inside a `T`.
pub struct Group<T: 'static, E: 'static> {
    /// Description of one element for error messages.
    pub desc: &'static str,
    pub fields: &'static [Field<E>],
    pub get: fn(&T) -> &[E],
    pub set: fn(&mut T, Vec<E>),
}

impl<T: 'static, E: Default + 'static> Repeated<T> for Group<T, E> {
    fn count(&self, data: &T) -> usize {
        (self.get)(data).len()
    }

    fn encode_elements(&self, data: &T, out: &mut AttrWriter<'_>) -> Result<(), WebAuthError> {
        for (i, element) in (self.get)(data).iter().enumerate() {
            for field in self.fields {
                super::encode_field(field, element, Some(i), out)
                    .map_err(|e| e.context(format!("encoding {} {i}", self.desc)))?;
            }
        }
        Ok(())
    }

    fn decode_elements(
        &self,
        data: &mut T,
        count: usize,
        attrs: &mut Attributes,
    ) -> Result<(), WebAuthError> {
        let mut elements = Vec::with_capacity(count.min(attrs.len()));
        for i in 0..count {
            let mut element = E::default();
            for field in self.fields {
                super::decode_field(field, &mut element, Some(i), attrs)
                    .map_err(|e| e.context(format!("decoding {} {i}", self.desc)))?;
            }
            elements.push(element);
        }
        (self.set)(data, elements);
        Ok(())
    }

    fn element_attrs(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.attr).collect()
    }
}
