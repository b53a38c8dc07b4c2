//! Identity and audit contracts shared by every stored entity.

use std::fmt;

use chrono::{DateTime, Utc};
use common::TaggedError;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Opaque entity identifier.
pub type Id = String;

/// A value with a unique, immutable identifier.
pub trait Identifiable {
    fn id(&self) -> &str;
}

/// Partial update for some entity type.
pub trait Patch: Clone + fmt::Debug + Send + Sync + 'static {
    /// True when the patch sets no field at all.
    fn is_empty(&self) -> bool;
}

/// Anything a storage backend can hold: identifiable, serializable, and
/// mergeable with its own patch type.
pub trait Entity: Identifiable + Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Patch: Patch;

    /// Shallow, field-by-field merge. Fields absent from the patch keep their value.
    fn merge(&mut self, patch: Self::Patch);
}

/// Domain payload of an audited entity (every field except identity and audit).
pub trait Record: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Patch: Patch;

    /// Human-readable entity name used in error messages.
    const NAME: &'static str = "Entity";

    fn merge(&mut self, patch: Self::Patch);

    /// Patch that sets every mergeable field to its current value.
    fn to_patch(&self) -> Self::Patch;
}

/// A record wrapped with identity and provenance. Serializes flat with
/// camelCase keys: audit fields and record fields share one JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Audited<R> {
    pub id: Id,
    pub created_at: DateTime<Utc>,
    pub created_by: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_by: Option<Id>,
    pub version: u64,
    #[serde(flatten)]
    pub data: R,
}

impl<R> Audited<R> {
    /// Initial state of a freshly created entity: version 1, never updated.
    pub fn new(id: Id, created_at: DateTime<Utc>, created_by: &ActorId, data: R) -> Self {
        Self {
            id,
            created_at,
            created_by: created_by.to_string(),
            last_updated_at: None,
            last_updated_by: None,
            version: 1,
            data,
        }
    }
}

impl<R> Identifiable for Audited<R> {
    fn id(&self) -> &str { &self.id }
}

/// Storage-level patch for [`Audited`]. Identity and creation fields are
/// not patchable.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditedPatch<P> {
    pub last_updated_at: Option<DateTime<Utc>>,
    pub last_updated_by: Option<Id>,
    pub version: Option<u64>,
    pub data: P,
}

impl<P: Patch> Patch for AuditedPatch<P> {
    fn is_empty(&self) -> bool {
        self.last_updated_at.is_none()
            && self.last_updated_by.is_none()
            && self.version.is_none()
            && self.data.is_empty()
    }
}

impl<R: Record> Entity for Audited<R> {
    type Patch = AuditedPatch<R::Patch>;

    fn merge(&mut self, patch: Self::Patch) {
        if let Some(at) = patch.last_updated_at {
            self.last_updated_at = Some(at);
        }
        if let Some(by) = patch.last_updated_by {
            self.last_updated_by = Some(by);
        }
        if let Some(version) = patch.version {
            self.version = version;
        }
        self.data.merge(patch.data);
    }
}

/// Identity of whoever performs writes. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Result<Self, TaggedError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(TaggedError::validation("actor id must not be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl TryFrom<&str> for ActorId {
    type Error = TaggedError;

    fn try_from(value: &str) -> Result<Self, Self::Error> { Self::new(value) }
}

/// Upsert payload: with an `id` it updates that entity, without one it creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Upsert<R> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[serde(flatten)]
    pub data: R,
}

impl<R> Upsert<R> {
    pub fn create(data: R) -> Self { Self { id: None, data } }

    pub fn update(id: impl Into<Id>, data: R) -> Self { Self { id: Some(id.into()), data } }
}
