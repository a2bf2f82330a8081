//! Variation descriptors.
//!
//! A variation is an unordered set of attribute choices such as
//! `{size: M, color: red}`. Two descriptors listing the same pairs in a
//! different order are the same variation, so cart uniqueness is keyed on a
//! canonical encoding rather than on whatever the client sent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Attribute choices distinguishing otherwise identical lines for one product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variation(BTreeMap<String, String>);

impl Variation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an attribute.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Treat an empty descriptor the same as no descriptor at all.
    #[must_use]
    pub fn normalize(variation: Option<Self>) -> Option<Self> {
        variation.filter(|variation| !variation.is_empty())
    }

    /// Key-sorted JSON encoding used as part of the cart line uniqueness key.
    #[must_use]
    pub fn canonical_key(&self) -> String {
        let pairs: Vec<String> = self
            .0
            .iter()
            .map(|(name, value)| {
                format!(
                    "{}:{}",
                    Value::String(name.clone()),
                    Value::String(value.clone())
                )
            })
            .collect();

        format!("{{{}}}", pairs.join(","))
    }

    /// Canonical key for an optional descriptor; absent and empty both encode as `""`.
    #[must_use]
    pub fn key_for(variation: Option<&Self>) -> String {
        match variation {
            Some(variation) if !variation.is_empty() => variation.canonical_key(),
            _ => String::new(),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for Variation
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

impl From<BTreeMap<String, String>> for Variation {
    fn from(attributes: BTreeMap<String, String>) -> Self {
        Self(attributes)
    }
}

impl From<Variation> for BTreeMap<String, String> {
    fn from(variation: Variation) -> Self {
        variation.0
    }
}
