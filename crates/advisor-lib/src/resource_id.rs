//! Parsed resource identifiers
//!
//! Cloud resource ids are hierarchical paths of the form
//! `/subscriptions/<sub>/resourceGroups/<group>/providers/<namespace>/<type>/<name>`.
//! Parsing happens once, up front; downstream code reads structured fields
//! instead of slicing segments by position at each call site.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error produced for malformed resource identifiers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceIdError {
    #[error(
        "expected /subscriptions/<id>/resourceGroups/<group>/providers/<namespace>/<type>/<name>, got `{0}`"
    )]
    InvalidLayout(String),
    #[error("empty segment in resource id `{0}`")]
    EmptySegment(String),
}

/// Fully parsed identifier of a gateway instance
///
/// The subscription is the scope used to bound listing queries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    pub subscription_id: String,
    pub resource_group: String,
    pub provider_namespace: String,
    pub resource_type: String,
    pub name: String,
}

impl FromStr for ResourceId {
    type Err = ResourceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = s.strip_prefix('/').unwrap_or(s).split('/').collect();
        if segments.len() != 8
            || !segments[0].eq_ignore_ascii_case("subscriptions")
            || !segments[2].eq_ignore_ascii_case("resourceGroups")
            || !segments[4].eq_ignore_ascii_case("providers")
        {
            return Err(ResourceIdError::InvalidLayout(s.to_string()));
        }
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(ResourceIdError::EmptySegment(s.to_string()));
        }

        Ok(Self {
            subscription_id: segments[1].to_string(),
            resource_group: segments[3].to_string(),
            provider_namespace: segments[5].to_string(),
            resource_type: segments[6].to_string(),
            name: segments[7].to_string(),
        })
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/{}/{}/{}",
            self.subscription_id,
            self.resource_group,
            self.provider_namespace,
            self.resource_type,
            self.name
        )
    }
}

impl Serialize for ResourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
