//! Sampler state and device-level sampler deduplication.

use crate::hash::DescHasher;
use crate::pipeline::CompareOp;
use crate::registry::ObjectsRegistry;
use crate::Result;
use ordered_float::NotNan;
use std::sync::Arc;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Filter {
    Nearest,
    Linear,
    Anisotropic,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SamplerMipmapMode {
    Nearest,
    Linear,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SamplerAddressMode {
    Wrap,
    Mirror,
    Clamp,
    Border,
    MirrorOnce,
}

/// Full sampler state.
///
/// Hashable and orderable so it can key caches; float fields use `NotNan`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SamplerDescription {
    pub min_filter: Filter,
    pub mag_filter: Filter,
    pub mipmap_mode: SamplerMipmapMode,
    pub addr_u: SamplerAddressMode,
    pub addr_v: SamplerAddressMode,
    pub addr_w: SamplerAddressMode,
    pub mip_lod_bias: NotNan<f32>,
    pub max_anisotropy: u32,
    pub compare: Option<CompareOp>,
    pub min_lod: NotNan<f32>,
    pub max_lod: NotNan<f32>,
    pub border_color: [NotNan<f32>; 4],
}

impl SamplerDescription {
    /// Content hash over every field, in declaration order.
    pub fn content_hash(&self) -> u64 {
        let compare = self.compare.map(|c| c as u32 + 1).unwrap_or(0);
        DescHasher::new()
            .u32(self.min_filter as u32)
            .u32(self.mag_filter as u32)
            .u32(self.mipmap_mode as u32)
            .u32(self.addr_u as u32)
            .u32(self.addr_v as u32)
            .u32(self.addr_w as u32)
            .f32_bits(self.mip_lod_bias.into_inner())
            .u32(self.max_anisotropy)
            .u32(compare)
            .f32_bits(self.min_lod.into_inner())
            .f32_bits(self.max_lod.into_inner())
            .f32_bits(self.border_color[0].into_inner())
            .f32_bits(self.border_color[1].into_inner())
            .f32_bits(self.border_color[2].into_inner())
            .f32_bits(self.border_color[3].into_inner())
            .finish()
    }
}

impl Default for SamplerDescription {
    fn default() -> SamplerDescription {
        SamplerDescription {
            min_filter: Filter::Linear,
            mag_filter: Filter::Linear,
            mipmap_mode: SamplerMipmapMode::Linear,
            addr_u: SamplerAddressMode::Wrap,
            addr_v: SamplerAddressMode::Wrap,
            addr_w: SamplerAddressMode::Wrap,
            mip_lod_bias: 0.0.into(),
            max_anisotropy: 0,
            compare: None,
            min_lod: 0.0.into(),
            max_lod: std::f32::MAX.into(),
            border_color: [0.0.into(), 0.0.into(), 0.0.into(), 0.0.into()],
        }
    }
}

/// A created sampler device object.
#[derive(Clone, Debug)]
pub struct Sampler {
    desc: SamplerDescription,
}

impl Sampler {
    pub fn new(desc: SamplerDescription) -> Sampler {
        Sampler { desc }
    }

    pub fn description(&self) -> &SamplerDescription {
        &self.desc
    }
}

/// Deduplicates sampler objects by description.
///
/// Samplers are held weakly: a sampler with no outstanding user dies and its
/// entry is swept on the next purge.
pub struct SamplerCache {
    registry: ObjectsRegistry<SamplerDescription, Sampler>,
}

impl SamplerCache {
    pub fn new() -> SamplerCache {
        SamplerCache {
            registry: ObjectsRegistry::new(),
        }
    }

    /// Returns the cached sampler for `desc`, invoking `create` at most once
    /// per live description.
    pub fn get_or_create(
        &self,
        desc: &SamplerDescription,
        create: impl FnOnce(&SamplerDescription) -> Result<Sampler>,
    ) -> Result<Arc<Sampler>> {
        self.registry.get_or_create(*desc, || create(desc))
    }

    pub fn get(&self, desc: &SamplerDescription) -> Option<Arc<Sampler>> {
        self.registry.get(desc)
    }

    pub fn purge(&self) {
        self.registry.purge()
    }

    pub fn clear(&self) {
        self.registry.clear()
    }
}

impl Default for SamplerCache {
    fn default() -> Self {
        SamplerCache::new()
    }
}

//--------------------------------------------------------------------------------------------------
