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
//! Authentication factors.
use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;

/// Set of authentication factor codes such as `p` (password) or `o` (OTP).
///
/// Tokens carry factors as a comma-separated string. Rendering is sorted so
/// that equal sets always produce the same string.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Factors(BTreeSet<String>);

impl Factors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comma-separated factor list, ignoring empty elements.
    pub fn parse(input: &str) -> Self {
        Self(
            input
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(String::from)
                .collect(),
        )
    }

    /// Parse an optional factor list.
    pub fn from_opt(input: Option<&str>) -> Self {
        input.map(Self::parse).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, factor: &str) -> bool {
        self.0.contains(factor)
    }

    pub fn insert<S: Into<String>>(&mut self, factor: S) {
        self.0.insert(factor.into());
    }

    /// Union of both sets.
    pub fn union(&self, other: &Self) -> Self {
        Self(self.0.union(&other.0).cloned().collect())
    }

    /// Whether every factor of `required` is present.
    pub fn satisfies(&self, required: &Self) -> bool {
        required.0.is_subset(&self.0)
    }

    /// Wire form, or `None` for the empty set.
    pub fn to_opt_string(&self) -> Option<String> {
        (!self.is_empty()).then(|| self.to_string())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for Factors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().join(","))
    }
}

impl<S: Into<String>> FromIterator<S> for Factors {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_render() {
        let factors = Factors::parse("p,o,,p");
        assert_eq!(2, factors.len());
        assert_eq!("o,p", factors.to_string());
        assert!(Factors::parse("").is_empty());
        assert_eq!(None, Factors::parse("").to_opt_string());
        assert_eq!(Some("k".into()), Factors::from_opt(Some("k")).to_opt_string());
    }

    #[test]
    fn test_union() {
        let a = Factors::parse("p");
        let b = Factors::parse("p,o");
        assert_eq!("o,p", a.union(&b).to_string());
        assert_eq!(a.union(&b), b.union(&a));
    }

    #[test]
    fn test_satisfies() {
        let have: Factors = ["p", "o", "m"].into_iter().collect();
        assert!(have.satisfies(&Factors::parse("o,p")));
        assert!(have.satisfies(&Factors::new()));
        assert!(!have.satisfies(&Factors::parse("x")));
        assert!(have.contains("m"));
    }
}
