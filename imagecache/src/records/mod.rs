//! Records whose images are cached in bulk.
//!
//! A record exposes exactly one remote image identifier and one field that
//! receives the resolved reference (local path on a hit, the remote
//! identifier on a miss). [`CacheRecord`] captures that shape, so bulk
//! operations work for any record type.
//!
//! Two shapes are known to the cache and each has a home namespace:
//!
//! | Record         | Identifier        | Namespace       |
//! |----------------|-------------------|-----------------|
//! | [`Program`]    | `image.url`       | `member_portal` |
//! | [`Supplement`] | `image_url`       | `supplements`   |
//!
//! Mixed collections use [`AnyRecord`], a closed sum type over the known
//! shapes, so dispatch is decided by the variant rather than by inspecting
//! types at runtime.

use serde::{Deserialize, Serialize};

use crate::cache::Namespace;

/// A record carrying one remote image and one resolved reference.
pub trait CacheRecord {
    /// Remote identifier of the record's image.
    fn resource_url(&self) -> &str;

    /// Store the reference the image should be loaded from.
    fn set_resolved(&mut self, reference: String);
}

impl<R: CacheRecord + ?Sized> CacheRecord for &mut R {
    fn resource_url(&self) -> &str {
        (**self).resource_url()
    }

    fn set_resolved(&mut self, reference: String) {
        (**self).set_resolved(reference)
    }
}

/// Record types that have a default namespace.
pub trait HomeNamespace {
    /// Namespace this record type's images are cached in.
    fn home_namespace() -> Namespace;
}

/// An image reference inside a [`Program`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: u32,
    /// Remote image URL
    pub url: String,
    /// Resolved reference (local path or `url`)
    #[serde(default)]
    pub uri: String,
}

impl Image {
    /// Create an image with an unresolved reference.
    pub fn new(id: u32, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            uri: String::new(),
        }
    }
}

impl CacheRecord for Image {
    fn resource_url(&self) -> &str {
        &self.url
    }

    fn set_resolved(&mut self, reference: String) {
        self.uri = reference;
    }
}

/// A member portal program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub id: u32,
    pub image: Image,
}

impl Program {
    pub fn new(id: u32, image: Image) -> Self {
        Self { id, image }
    }
}

impl CacheRecord for Program {
    fn resource_url(&self) -> &str {
        self.image.resource_url()
    }

    fn set_resolved(&mut self, reference: String) {
        self.image.set_resolved(reference)
    }
}

impl HomeNamespace for Program {
    fn home_namespace() -> Namespace {
        Namespace::member_portal()
    }
}

/// A supplement with its product image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplement {
    pub id: u32,
    /// Remote image URL
    pub image_url: String,
    /// Resolved reference (local path or `image_url`)
    #[serde(default)]
    pub image_uri: String,
}

impl Supplement {
    /// Create a supplement with an unresolved reference.
    pub fn new(id: u32, image_url: impl Into<String>) -> Self {
        Self {
            id,
            image_url: image_url.into(),
            image_uri: String::new(),
        }
    }
}

impl CacheRecord for Supplement {
    fn resource_url(&self) -> &str {
        &self.image_url
    }

    fn set_resolved(&mut self, reference: String) {
        self.image_uri = reference;
    }
}

impl HomeNamespace for Supplement {
    fn home_namespace() -> Namespace {
        Namespace::supplements()
    }
}

/// Which known record shape a value is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Program,
    Supplement,
}

impl RecordKind {
    /// Home namespace for this kind.
    pub fn namespace(self) -> Namespace {
        match self {
            RecordKind::Program => Program::home_namespace(),
            RecordKind::Supplement => Supplement::home_namespace(),
        }
    }
}

/// Any known record, for heterogeneous collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnyRecord {
    Program(Program),
    Supplement(Supplement),
}

impl AnyRecord {
    /// The record's shape.
    pub fn kind(&self) -> RecordKind {
        match self {
            AnyRecord::Program(_) => RecordKind::Program,
            AnyRecord::Supplement(_) => RecordKind::Supplement,
        }
    }
}

impl CacheRecord for AnyRecord {
    fn resource_url(&self) -> &str {
        match self {
            AnyRecord::Program(p) => p.resource_url(),
            AnyRecord::Supplement(s) => s.resource_url(),
        }
    }

    fn set_resolved(&mut self, reference: String) {
        match self {
            AnyRecord::Program(p) => p.set_resolved(reference),
            AnyRecord::Supplement(s) => s.set_resolved(reference),
        }
    }
}

impl From<Program> for AnyRecord {
    fn from(program: Program) -> Self {
        AnyRecord::Program(program)
    }
}

impl From<Supplement> for AnyRecord {
    fn from(supplement: Supplement) -> Self {
        AnyRecord::Supplement(supplement)
    }
}
