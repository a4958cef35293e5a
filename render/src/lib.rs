//! Device-agnostic pipeline resource machinery.
//!
//! The crate models how shader resources are declared, validated, packed and
//! bound, independently of any graphics API:
//!
//! - [`signature`]: pipeline resource signatures — immutable, hashed
//!   descriptions of a group of shader resources, packed into a single
//!   allocation and sorted by variable type
//! - [`pipeline`]: shader stages, fixed-function state and pipeline state
//!   objects composing several signatures
//! - [`srb`]: binding instances created from a signature
//! - [`sampler`], [`registry`]: sampler state and weak-handle object caches
//! - [`linear_alloc`], [`hash`]: the packing allocator and the content
//!   hashing primitives underneath all of the above
//!
//! Backends plug in through the [`Backend`] trait, which contributes
//! per-resource attribute data to signatures and the resource object type
//! held by bindings.

pub mod device;
pub mod error;
pub mod hash;
pub mod linear_alloc;
pub mod pipeline;
pub mod registry;
pub mod sampler;
pub mod signature;
pub mod srb;

pub use crate::device::{DeviceFeatures, DeviceInfo, DeviceKind};
pub use crate::error::{Error, Result};
pub use crate::pipeline::{PipelineState, PipelineStatus, PipelineType, ShaderStageFlags};
pub use crate::sampler::{Sampler, SamplerCache, SamplerDescription};
pub use crate::signature::{
    PipelineResourceDesc, PipelineResourceSignature, PipelineResourceSignatureDesc,
    ResourceDescRef, ShaderResourceType, ShaderVariableType,
};
pub use crate::srb::ShaderResourceBinding;

use std::fmt::Debug;
use std::hash::Hash;

/// Backend for a particular graphics API.
///
/// The implementing type is only a token: all state lives in the associated
/// types. Signatures store one `ResourceAttribs` per resource (register
/// indices, descriptor set slots, and the like) and binding instances hold
/// `ResourceObject`s.
pub trait Backend:
    Copy + Clone + Debug + Eq + PartialEq + Ord + PartialOrd + Hash + 'static
{
    /// Per-resource data derived when a signature is created. Participates
    /// in the signature hash and in compatibility checks.
    type ResourceAttribs: Clone + Debug + Eq + Hash + Send + Sync;
    /// The object bound to a resource slot.
    type ResourceObject: Debug + Send + Sync;

    fn init_resource_attribs(
        device: &DeviceInfo,
        resource: &signature::ResourceDescRef<'_>,
    ) -> Self::ResourceAttribs;
}

/// Backend with no API behind it; used by tests and by tooling that works
/// with signatures without creating GPU objects.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NullBackend;

impl Backend for NullBackend {
    type ResourceAttribs = ();
    type ResourceObject = NullResource;

    fn init_resource_attribs(
        _device: &DeviceInfo,
        _resource: &signature::ResourceDescRef<'_>,
    ) -> Self::ResourceAttribs {
    }
}

/// Placeholder resource object of the null backend.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NullResource {
    name: String,
}

impl NullResource {
    pub fn new(name: impl Into<String>) -> NullResource {
        NullResource { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
