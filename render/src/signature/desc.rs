//! Resource-signature description structs.

use crate::hash::DescHasher;
use crate::pipeline::ShaderStageFlags;
use crate::sampler::SamplerDescription;
use bitflags::bitflags;

/// Highest signature slot index is `MAX_RESOURCE_SIGNATURES - 1`.
pub const MAX_RESOURCE_SIGNATURES: u32 = 8;
/// Limit on resources (and immutable samplers) in one signature.
pub const MAX_RESOURCES_IN_SIGNATURE: u32 = 256;

/// Kind of a shader resource declared in a signature.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ShaderResourceType {
    ConstantBuffer,
    TextureSrv,
    BufferSrv,
    TextureUav,
    BufferUav,
    Sampler,
    InputAttachment,
    AccelStruct,
}

/// How often a resource can be rebound.
///
/// The ordering is meaningful: signature resources are stored in contiguous
/// runs sorted `Static < Mutable < Dynamic`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ShaderVariableType {
    /// Bound once on the signature itself, shared by every binding instance.
    Static,
    /// Rebindable per shader-resource-binding instance.
    Mutable,
    /// Rebindable per draw/dispatch.
    Dynamic,
}

pub const NUM_SHADER_VARIABLE_TYPES: usize = 3;

bitflags! {
    #[derive(Default)]
    pub struct PipelineResourceFlags: u32 {
        const NO_DYNAMIC_BUFFERS = (1 << 0);
        const COMBINED_SAMPLER = (1 << 1);
        const FORMATTED_BUFFER = (1 << 2);
        const RUNTIME_ARRAY = (1 << 3);
        const GENERAL_INPUT_ATTACHMENT = (1 << 4);
    }
}

/// Flags that are meaningful for a given resource kind.
pub fn allowed_resource_flags(kind: ShaderResourceType) -> PipelineResourceFlags {
    use self::ShaderResourceType::*;
    match kind {
        ConstantBuffer => PipelineResourceFlags::NO_DYNAMIC_BUFFERS,
        TextureSrv => {
            PipelineResourceFlags::COMBINED_SAMPLER | PipelineResourceFlags::RUNTIME_ARRAY
        }
        BufferSrv => {
            PipelineResourceFlags::NO_DYNAMIC_BUFFERS
                | PipelineResourceFlags::FORMATTED_BUFFER
                | PipelineResourceFlags::RUNTIME_ARRAY
        }
        TextureUav => PipelineResourceFlags::RUNTIME_ARRAY,
        BufferUav => {
            PipelineResourceFlags::NO_DYNAMIC_BUFFERS
                | PipelineResourceFlags::FORMATTED_BUFFER
                | PipelineResourceFlags::RUNTIME_ARRAY
        }
        Sampler => PipelineResourceFlags::RUNTIME_ARRAY,
        InputAttachment => PipelineResourceFlags::GENERAL_INPUT_ATTACHMENT,
        AccelStruct => PipelineResourceFlags::RUNTIME_ARRAY,
    }
}

/// One shader resource declaration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PipelineResourceDesc {
    pub name: String,
    pub stages: ShaderStageFlags,
    /// Number of array elements; 0 declares a runtime-sized array and
    /// requires [`PipelineResourceFlags::RUNTIME_ARRAY`].
    pub array_size: u32,
    pub kind: ShaderResourceType,
    pub var_type: ShaderVariableType,
    pub flags: PipelineResourceFlags,
}

impl PipelineResourceDesc {
    pub fn new(stages: ShaderStageFlags, name: impl Into<String>, kind: ShaderResourceType) -> Self {
        PipelineResourceDesc {
            name: name.into(),
            stages,
            array_size: 1,
            kind,
            var_type: ShaderVariableType::Static,
            flags: PipelineResourceFlags::empty(),
        }
    }

    pub fn var_type(mut self, var_type: ShaderVariableType) -> Self {
        self.var_type = var_type;
        self
    }

    pub fn array_size(mut self, array_size: u32) -> Self {
        self.array_size = array_size;
        self
    }

    pub fn flags(mut self, flags: PipelineResourceFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Hash of the semantic fields; the name is excluded by design, so two
    /// signatures that differ only in resource names hash equal.
    pub fn content_hash(&self) -> u64 {
        DescHasher::new()
            .u32(self.stages.bits())
            .u32(self.array_size)
            .u32(self.kind as u32)
            .u32(self.var_type as u32)
            .u32(self.flags.bits())
            .finish()
    }
}

/// An immutable sampler baked into the signature.
///
/// `name` is the sampler resource name, or the texture name when combined
/// texture samplers are in use (the suffix is appended during lookup).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImmutableSamplerDesc {
    pub name: String,
    pub stages: ShaderStageFlags,
    pub desc: SamplerDescription,
}

impl ImmutableSamplerDesc {
    pub fn new(
        stages: ShaderStageFlags,
        name: impl Into<String>,
        desc: SamplerDescription,
    ) -> Self {
        ImmutableSamplerDesc {
            name: name.into(),
            stages,
            desc,
        }
    }
}

/// Description of a pipeline resource signature.
#[derive(Clone, Debug)]
pub struct PipelineResourceSignatureDesc {
    pub name: String,
    pub resources: Vec<PipelineResourceDesc>,
    pub immutable_samplers: Vec<ImmutableSamplerDesc>,
    /// Signature slot, `0 .. MAX_RESOURCE_SIGNATURES`.
    pub binding_index: u8,
    /// Texture and sampler are addressed as one logical resource; samplers
    /// are found by appending `combined_sampler_suffix` to texture names.
    pub use_combined_texture_samplers: bool,
    pub combined_sampler_suffix: String,
    /// Hint for how many shader resource bindings are allocated at once.
    pub srb_allocation_granularity: u32,
}

impl Default for PipelineResourceSignatureDesc {
    fn default() -> Self {
        PipelineResourceSignatureDesc {
            name: String::new(),
            resources: Vec::new(),
            immutable_samplers: Vec::new(),
            binding_index: 0,
            use_combined_texture_samplers: false,
            combined_sampler_suffix: "_sampler".to_string(),
            srb_allocation_granularity: 1,
        }
    }
}

impl PipelineResourceSignatureDesc {
    /// Content hash of the description: counts and binding index, then
    /// every resource, then every immutable sampler, all in storage order.
    /// Resource and sampler names are excluded.
    pub fn content_hash(&self) -> u64 {
        let mut h = DescHasher::new()
            .u32(self.resources.len() as u32)
            .u32(self.immutable_samplers.len() as u32)
            .u32(u32::from(self.binding_index));
        for res in &self.resources {
            h = h.combine(res.content_hash());
        }
        for sam in &self.immutable_samplers {
            h = h.u32(sam.stages.bits()).combine(sam.desc.content_hash());
        }
        h.finish()
    }
}

/// True when `resource_name == base_name + suffix` (or plain equality when
/// no suffix applies).
pub fn streq_suff(resource_name: &str, base_name: &str, suffix: Option<&str>) -> bool {
    match suffix {
        Some(suffix) => {
            resource_name.len() == base_name.len() + suffix.len()
                && resource_name.starts_with(base_name)
                && resource_name.ends_with(suffix)
        }
        None => resource_name == base_name,
    }
}

/// Rewrites a description for backends with separate sampler objects.
///
/// Every texture SRV carrying [`PipelineResourceFlags::COMBINED_SAMPLER`]
/// loses the flag, and when neither a sampler resource nor an immutable
/// sampler for it exists, the implied sampler resource (texture name plus
/// suffix, same stages and variable type) is appended.
pub fn decouple_combined_samplers(desc: &mut PipelineResourceSignatureDesc) {
    if !desc.use_combined_texture_samplers {
        return;
    }
    let suffix = desc.combined_sampler_suffix.clone();
    let mut synthesized = Vec::new();
    for res in desc.resources.iter_mut() {
        if res.kind != ShaderResourceType::TextureSrv
            || !res.flags.contains(PipelineResourceFlags::COMBINED_SAMPLER)
        {
            continue;
        }
        res.flags.remove(PipelineResourceFlags::COMBINED_SAMPLER);

        let sampler_name = format!("{}{}", res.name, suffix);
        let has_sampler = desc
            .immutable_samplers
            .iter()
            .any(|s| s.stages.intersects(res.stages) && streq_suff(&sampler_name, &s.name, Some(&suffix)));
        if has_sampler {
            continue;
        }
        synthesized.push(PipelineResourceDesc {
            name: sampler_name,
            stages: res.stages,
            array_size: res.array_size,
            kind: ShaderResourceType::Sampler,
            var_type: res.var_type,
            flags: res.flags & PipelineResourceFlags::RUNTIME_ARRAY,
        });
    }
    // keep only samplers that are not already declared as resources
    for sam in synthesized {
        let exists = desc
            .resources
            .iter()
            .any(|r| r.name == sam.name && r.stages.intersects(sam.stages));
        if !exists {
            desc.resources.push(sam);
        }
    }
}

//--------------------------------------------------------------------------------------------------
