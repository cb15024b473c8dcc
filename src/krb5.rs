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
//! # Kerberos credential
//!
//! Flat, implementation independent representation of a Kerberos credential
//! as carried in id and cred tokens. Acquiring and using the credential is
//! left to the caller; this module only serializes it.
use crate::encoding::schema::{OPTIONAL, REQUIRED};
use crate::encoding::{self, Encodable, Field, Group, Schema};
use crate::error::WebAuthError;

/// Network address the ticket is bound to.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Krb5CredAddress {
    pub addr_type: i32,
    pub data: Vec<u8>,
}

/// Authorization data element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Krb5CredAuthdata {
    pub ad_type: i32,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Krb5Cred {
    pub client_principal: Option<String>,
    pub server_principal: Option<String>,
    pub keyblock_enctype: i32,
    pub keyblock_data: Vec<u8>,
    pub auth_time: i32,
    pub start_time: i32,
    pub end_time: i32,
    pub renew_until: i32,
    pub is_skey: i32,
    pub flags: i32,
    pub addresses: Vec<Krb5CredAddress>,
    pub ticket: Option<Vec<u8>>,
    pub second_ticket: Option<Vec<u8>>,
    pub authdata: Vec<Krb5CredAuthdata>,
}

impl Krb5Cred {
    /// Serialize the credential.
    pub fn encode(&self) -> Result<Vec<u8>, WebAuthError> {
        encoding::encode(Self::schema(), self)
    }

    /// Deserialize a credential produced by [`Krb5Cred::encode`].
    pub fn decode(input: &[u8]) -> Result<Self, WebAuthError> {
        encoding::decode(Self::schema(), input)
    }
}

static ADDRESS_FIELDS: &[Field<Krb5CredAddress>] = &[
    Field::int32(
        "A",
        "address type",
        REQUIRED,
        |a: &Krb5CredAddress| Some(a.addr_type),
        |a: &mut Krb5CredAddress, v| a.addr_type = v,
    ),
    Field::data(
        "a",
        "address",
        REQUIRED,
        |a: &Krb5CredAddress| Some(a.data.as_slice()),
        |a: &mut Krb5CredAddress, v| a.data = v,
    ),
];

static AUTHDATA_FIELDS: &[Field<Krb5CredAuthdata>] = &[
    Field::int32(
        "D",
        "authdata type",
        REQUIRED,
        |a: &Krb5CredAuthdata| Some(a.ad_type),
        |a: &mut Krb5CredAuthdata, v| a.ad_type = v,
    ),
    Field::data(
        "d",
        "authdata",
        REQUIRED,
        |a: &Krb5CredAuthdata| Some(a.data.as_slice()),
        |a: &mut Krb5CredAuthdata, v| a.data = v,
    ),
];

static ADDRESS_GROUP: Group<Krb5Cred, Krb5CredAddress> = Group {
    desc: "address",
    fields: ADDRESS_FIELDS,
    get: |c: &Krb5Cred| c.addresses.as_slice(),
    set: |c: &mut Krb5Cred, v| c.addresses = v,
};

static AUTHDATA_GROUP: Group<Krb5Cred, Krb5CredAuthdata> = Group {
    desc: "authdata",
    fields: AUTHDATA_FIELDS,
    get: |c: &Krb5Cred| c.authdata.as_slice(),
    set: |c: &mut Krb5Cred, v| c.authdata = v,
};

static CRED_FIELDS: &[Field<Krb5Cred>] = &[
    Field::string(
        "c",
        "client principal",
        OPTIONAL,
        |c: &Krb5Cred| c.client_principal.as_deref(),
        |c: &mut Krb5Cred, v| c.client_principal = Some(v),
    ),
    Field::string(
        "s",
        "server principal",
        OPTIONAL,
        |c: &Krb5Cred| c.server_principal.as_deref(),
        |c: &mut Krb5Cred, v| c.server_principal = Some(v),
    ),
    Field::int32(
        "K",
        "keyblock enctype",
        REQUIRED,
        |c: &Krb5Cred| Some(c.keyblock_enctype),
        |c: &mut Krb5Cred, v| c.keyblock_enctype = v,
    ),
    Field::data(
        "k",
        "keyblock",
        REQUIRED,
        |c: &Krb5Cred| Some(c.keyblock_data.as_slice()),
        |c: &mut Krb5Cred, v| c.keyblock_data = v,
    ),
    Field::int32(
        "ta",
        "auth time",
        REQUIRED,
        |c: &Krb5Cred| Some(c.auth_time),
        |c: &mut Krb5Cred, v| c.auth_time = v,
    ),
    Field::int32(
        "ts",
        "start time",
        REQUIRED,
        |c: &Krb5Cred| Some(c.start_time),
        |c: &mut Krb5Cred, v| c.start_time = v,
    ),
    Field::int32(
        "te",
        "end time",
        REQUIRED,
        |c: &Krb5Cred| Some(c.end_time),
        |c: &mut Krb5Cred, v| c.end_time = v,
    ),
    Field::int32(
        "tr",
        "renew until",
        REQUIRED,
        |c: &Krb5Cred| Some(c.renew_until),
        |c: &mut Krb5Cred, v| c.renew_until = v,
    ),
    Field::int32(
        "i",
        "is skey",
        REQUIRED,
        |c: &Krb5Cred| Some(c.is_skey),
        |c: &mut Krb5Cred, v| c.is_skey = v,
    ),
    Field::int32(
        "f",
        "flags",
        REQUIRED,
        |c: &Krb5Cred| Some(c.flags),
        |c: &mut Krb5Cred, v| c.flags = v,
    ),
    Field::repeat("na", "addresses", REQUIRED, &ADDRESS_GROUP),
    Field::data(
        "t",
        "ticket",
        OPTIONAL,
        |c: &Krb5Cred| c.ticket.as_deref(),
        |c: &mut Krb5Cred, v| c.ticket = Some(v),
    ),
    Field::data(
        "t2",
        "second ticket",
        OPTIONAL,
        |c: &Krb5Cred| c.second_ticket.as_deref(),
        |c: &mut Krb5Cred, v| c.second_ticket = Some(v),
    ),
    Field::repeat("nd", "authdata", REQUIRED, &AUTHDATA_GROUP),
];

static CRED_SCHEMA: Schema<Krb5Cred> = Schema::new("kerberos credential", CRED_FIELDS);

impl Encodable for Krb5Cred {
    fn schema() -> &'static Schema<Self> {
        &CRED_SCHEMA
    }
}
