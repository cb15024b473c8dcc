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

use chrono::{DateTime, Utc};
use derive_builder::Builder;
use validator::Validate;

use crate::encoding::schema::{ASCII, CREATION, REQUIRED};
use crate::encoding::{Encodable, Field, Schema};
use crate::error::{BuilderError, ProtocolStatus};
use crate::token::types::{Token, creation_time};

#[derive(Builder, Clone, Debug, Default, PartialEq, Validate)]
#[builder(setter(into), build_fn(error = "BuilderError"))]
pub struct ErrorToken {
    /// Protocol error code.
    pub code: u64,

    #[validate(length(min = 1))]
    pub message: String,

    #[builder(default)]
    pub creation: DateTime<Utc>,
}

impl ErrorTokenBuilder {
    /// Set the code from a protocol status.
    pub fn status(&mut self, status: ProtocolStatus) -> &mut Self {
        self.code = Some(u64::from(status.code()));
        self
    }
}

impl From<ErrorToken> for Token {
    fn from(value: ErrorToken) -> Self {
        Self::Error(value)
    }
}

static FIELDS: &[Field<ErrorToken>] = &[
    Field::ulong(
        "ec",
        "error code",
        ASCII,
        |t: &ErrorToken| Some(t.code),
        |t: &mut ErrorToken, v| t.code = v,
    ),
    Field::string(
        "em",
        "error message",
        REQUIRED,
        |t: &ErrorToken| Some(t.message.as_str()),
        |t: &mut ErrorToken, v| t.message = v,
    ),
    Field::time(
        "ct",
        "creation",
        CREATION,
        |t: &ErrorToken| creation_time(t.creation),
        |t: &mut ErrorToken, v| t.creation = v,
    ),
];

static SCHEMA: Schema<ErrorToken> = Schema::new("error token", FIELDS);

impl Encodable for ErrorToken {
    fn schema() -> &'static Schema<Self> {
        &SCHEMA
    }
}
