//! Identity resolution.
//!
//! Invariants:
//! - An instance's identity is assigned at most once; resolving again is a
//!   no-op that returns the stored value.
//! - Natural identities are a pure function of the identity field values
//!   and the resolver key, so equal keys merge.
//! - The stored identity is an opaque keyed digest and is never decoded.

#[cfg(test)]
mod tests;

use crate::{
    DEFAULT_IDENTITY_SEPARATOR,
    config::IdentityConfig,
    error::{ConversionError, Error, ErrorOrigin},
    model::EntityInstance,
};
use derive_more::{Deref, Display};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

///
/// Identity
///
/// Opaque deduplication key of one logical output instance.
/// Equality is the only meaningful operation.
///

#[derive(Clone, Debug, Deref, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Identity(String);

impl Identity {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

///
/// IdentityFallback
///
/// What happens when an instance has no natural key: no identity fields
/// are declared, or every identity field is null/empty.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum IdentityFallback {
    /// A fresh random token; identity-less rows never merge.
    #[default]
    Random,
    /// A digest of every property value; identical rows merge.
    Content,
    /// The row fails to map.
    Reject,
}

///
/// IdentityResolver
///

#[derive(Clone)]
pub struct IdentityResolver {
    key: Vec<u8>,
    separator: String,
    fallback: IdentityFallback,
}

impl IdentityResolver {
    /// Resolver sealing identities with `key`.
    #[must_use]
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            separator: DEFAULT_IDENTITY_SEPARATOR.to_string(),
            fallback: IdentityFallback::default(),
        }
    }

    /// Resolver with a per-process random key.
    #[must_use]
    pub fn random() -> Self {
        Self::new(rand::random::<[u8; 32]>().to_vec())
    }

    #[must_use]
    pub fn from_config(config: &IdentityConfig) -> Self {
        let resolver = match &config.key {
            Some(key) => Self::new(key.as_bytes()),
            None => Self::random(),
        };

        resolver
            .with_separator(config.separator.clone())
            .with_fallback(config.fallback)
    }

    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: IdentityFallback) -> Self {
        self.fallback = fallback;
        self
    }

    #[must_use]
    pub const fn fallback(&self) -> IdentityFallback {
        self.fallback
    }

    /// Resolve (or return the already assigned) identity of `entity`.
    pub fn resolve<'a, T>(&self, entity: &'a mut EntityInstance<T>) -> Result<&'a Identity, Error> {
        if entity.identity().is_none() {
            let identity = self.compute(entity)?;
            return Ok(entity.assign_identity(identity));
        }

        entity
            .identity()
            .ok_or_else(|| Error::internal(ErrorOrigin::Identity, "identity vanished after check"))
    }

    fn compute<T>(&self, entity: &EntityInstance<T>) -> Result<Identity, Error> {
        if let Some(natural) = self.natural_key(entity) {
            return Ok(self.seal("key", &natural));
        }

        let descriptor = entity.descriptor();
        if descriptor.has_identity() {
            tracing::trace!(
                entity = descriptor.target_type(),
                "identity fields are empty; using fallback"
            );
        }

        match self.fallback {
            IdentityFallback::Random => {
                let token = format!("{:032x}", rand::random::<u128>());
                Ok(self.seal("random", &token))
            }
            IdentityFallback::Content => Ok(self.seal("content", &self.content_key(entity))),
            IdentityFallback::Reject => {
                let column = descriptor
                    .identity_properties()
                    .map(|property| property.column().to_string())
                    .collect::<Vec<_>>()
                    .join(&self.separator);

                Err(Error::conversion(ConversionError {
                    entity: descriptor.target_type().to_string(),
                    field: String::new(),
                    column,
                    value: crate::value::Value::Null,
                    row: None,
                    reason: "row has no identity value".to_string(),
                }))
            }
        }
    }

    /// Joined identity field values, or `None` when none carry a value.
    fn natural_key<T>(&self, entity: &EntityInstance<T>) -> Option<String> {
        let descriptor = entity.descriptor();
        if !descriptor.has_identity() {
            return None;
        }

        let parts = descriptor
            .identity_properties()
            .map(|property| property.get(entity.instance()).render())
            .collect::<Vec<_>>();

        if parts.iter().all(|part| part.trim().is_empty()) {
            return None;
        }

        Some(parts.join(&self.separator).trim().to_string())
    }

    fn content_key<T>(&self, entity: &EntityInstance<T>) -> String {
        entity
            .descriptor()
            .properties()
            .iter()
            .map(|property| property.get(entity.instance()).render())
            .collect::<Vec<_>>()
            .join(&self.separator)
    }

    // Keyed digest; the domain tag keeps natural, content and random
    // identities from ever comparing equal.
    fn seal(&self, domain: &str, raw: &str) -> Identity {
        let mut hasher = Sha256::new();
        hasher.update(&self.key);
        hasher.update([0u8]);
        hasher.update(domain.as_bytes());
        hasher.update([0u8]);
        hasher.update(raw.as_bytes());

        let digest = hasher.finalize();
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest {
            let _ = write!(hex, "{byte:02x}");
        }

        Identity(hex)
    }
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::random()
    }
}
