//! Pipeline resource signatures.
//!
//! A signature is the immutable, device-agnostic description of a group of
//! shader resources bound together: which resources exist, in which stages,
//! how often they can be rebound, and which immutable samplers accompany
//! them. Building one validates the description, packs it into a single
//! arena block sorted by variable type, and derives the lookup tables the
//! binding machinery needs.

pub mod desc;
pub mod validate;

pub use self::desc::*;
pub use self::validate::validate_signature_desc;

use crate::device::DeviceInfo;
use crate::error::{Error, Result};
use crate::hash::DescHasher;
use crate::linear_alloc::{ArenaBlock, ArenaSlice, ArenaStr, FixedLinearAllocator};
use crate::pipeline::{PipelineType, ShaderStageFlags, MAX_SHADERS_IN_PIPELINE};
use crate::sampler::SamplerDescription;
use crate::srb::ShaderResourceBinding;
use crate::Backend;
use std::ops::Range;
use std::sync::{Arc, Mutex};

//--------------------------------------------------------------------------------------------------

/// Packed resource record; the name lives in the same arena block.
#[derive(Copy, Clone, Debug)]
struct PackedResource {
    name: ArenaStr,
    stages: ShaderStageFlags,
    array_size: u32,
    kind: ShaderResourceType,
    var_type: ShaderVariableType,
    flags: PipelineResourceFlags,
}

#[derive(Copy, Clone, Debug)]
struct PackedSampler {
    name: ArenaStr,
    stages: ShaderStageFlags,
    desc: SamplerDescription,
}

/// Borrowed view of one packed resource.
#[derive(Copy, Clone, Debug)]
pub struct ResourceDescRef<'a> {
    pub name: &'a str,
    pub stages: ShaderStageFlags,
    pub array_size: u32,
    pub kind: ShaderResourceType,
    pub var_type: ShaderVariableType,
    pub flags: PipelineResourceFlags,
}

/// Borrowed view of one packed immutable sampler.
#[derive(Copy, Clone, Debug)]
pub struct ImmutableSamplerRef<'a> {
    /// Sampler name, or the texture name when combined texture samplers are
    /// in use.
    pub name: &'a str,
    pub stages: ShaderStageFlags,
    pub desc: SamplerDescription,
}

//--------------------------------------------------------------------------------------------------

pub struct PipelineResourceSignature<B: Backend> {
    name: String,
    block: ArenaBlock,
    resources: ArenaSlice<PackedResource>,
    immutable_samplers: ArenaSlice<PackedSampler>,
    combined_sampler_suffix: Option<ArenaStr>,
    binding_index: u8,
    srb_allocation_granularity: u32,
    /// Cumulative starts of the variable-type runs; run `t` is
    /// `resource_offsets[t] .. resource_offsets[t + 1]`.
    resource_offsets: [u32; NUM_SHADER_VARIABLE_TYPES + 1],
    /// First flat binding slot of each resource; arrays occupy
    /// `max(array_size, 1)` consecutive slots.
    slot_bases: Vec<u32>,
    total_slots: u32,
    static_slots: u32,
    shader_stages: ShaderStageFlags,
    static_res_shader_stages: ShaderStageFlags,
    pipeline_type: Option<PipelineType>,
    /// Per pipeline-stage index: position of that stage among the stages
    /// that carry static resources, or -1.
    static_res_stage_index: [i8; MAX_SHADERS_IN_PIPELINE],
    hash: u64,
    /// Backend-specific per-resource data, in storage order.
    attribs: Vec<B::ResourceAttribs>,
    /// Objects bound to static resources, copied into every new binding.
    static_cache: Mutex<Vec<Option<Arc<B::ResourceObject>>>>,
}

impl<B: Backend> PipelineResourceSignature<B> {
    pub fn new(
        device: &DeviceInfo,
        desc: &PipelineResourceSignatureDesc,
    ) -> Result<Arc<PipelineResourceSignature<B>>> {
        validate_signature_desc(desc, device)?;

        // declaration pass: strings first, records after, so the records can
        // be filled with final name handles and written in one copy
        let mut alloc = FixedLinearAllocator::new();
        for res in &desc.resources {
            alloc.add_str(&res.name);
        }
        for sam in &desc.immutable_samplers {
            alloc.add_str(&sam.name);
        }
        if desc.use_combined_texture_samplers {
            alloc.add_str(&desc.combined_sampler_suffix);
        }
        alloc.add_slice::<PackedResource>(desc.resources.len());
        alloc.add_slice::<PackedSampler>(desc.immutable_samplers.len());
        alloc.reserve();

        // replay pass
        let mut packed: Vec<PackedResource> = desc
            .resources
            .iter()
            .map(|res| PackedResource {
                name: alloc.copy_str(&res.name),
                stages: res.stages,
                array_size: res.array_size,
                kind: res.kind,
                var_type: res.var_type,
                flags: res.flags,
            })
            .collect();
        let packed_samplers: Vec<PackedSampler> = desc
            .immutable_samplers
            .iter()
            .map(|sam| PackedSampler {
                name: alloc.copy_str(&sam.name),
                stages: sam.stages,
                desc: sam.desc,
            })
            .collect();
        let combined_sampler_suffix = if desc.use_combined_texture_samplers {
            Some(alloc.copy_str(&desc.combined_sampler_suffix))
        } else {
            None
        };

        // group resources into contiguous runs per variable type; the sort is
        // stable, so declaration order survives within each run
        packed.sort_by_key(|res| res.var_type);

        let mut resource_offsets = [0u32; NUM_SHADER_VARIABLE_TYPES + 1];
        for res in &packed {
            resource_offsets[res.var_type as usize + 1] += 1;
        }
        for t in 0..NUM_SHADER_VARIABLE_TYPES {
            resource_offsets[t + 1] += resource_offsets[t];
        }

        let mut slot_bases = Vec::with_capacity(packed.len());
        let mut total_slots = 0u32;
        for res in &packed {
            slot_bases.push(total_slots);
            total_slots += res.array_size.max(1);
        }
        let static_slots = slot_bases
            .get(resource_offsets[1] as usize)
            .copied()
            .unwrap_or(total_slots);

        let mut shader_stages = ShaderStageFlags::empty();
        let mut static_res_shader_stages = ShaderStageFlags::empty();
        for res in &packed {
            shader_stages |= res.stages;
            if res.var_type == ShaderVariableType::Static {
                static_res_shader_stages |= res.stages;
            }
        }
        for sam in &packed_samplers {
            shader_stages |= sam.stages;
        }

        let pipeline_type = PipelineType::of_shader_stages(shader_stages);
        let mut static_res_stage_index = [-1i8; MAX_SHADERS_IN_PIPELINE];
        if let Some(pipeline_type) = pipeline_type {
            let mut count = 0i8;
            for stage in static_res_shader_stages.iter() {
                if let Some(index) = pipeline_type.shader_stage_index(stage) {
                    static_res_stage_index[index] = count;
                    count += 1;
                }
            }
        }

        let resources = alloc.copy_slice(&packed);
        let immutable_samplers = alloc.copy_slice(&packed_samplers);
        let block = alloc.release();

        // the hash covers the packed (sorted) content plus the backend
        // attributes, so equal hashes are a sound compatibility pre-filter
        let mut hasher = DescHasher::new()
            .u32(packed.len() as u32)
            .u32(packed_samplers.len() as u32)
            .u32(u32::from(desc.binding_index));
        let mut attribs = Vec::with_capacity(packed.len());
        for res in block.slice_at(resources) {
            hasher = hasher
                .u32(res.stages.bits())
                .u32(res.array_size)
                .u32(res.kind as u32)
                .u32(res.var_type as u32)
                .u32(res.flags.bits());
            let view = ResourceDescRef {
                name: block.str_at(res.name),
                stages: res.stages,
                array_size: res.array_size,
                kind: res.kind,
                var_type: res.var_type,
                flags: res.flags,
            };
            let attrib = B::init_resource_attribs(device, &view);
            hasher = hasher.u64(fxhash::hash64(&attrib));
            attribs.push(attrib);
        }
        for sam in block.slice_at(immutable_samplers) {
            hasher = hasher.u32(sam.stages.bits()).combine(sam.desc.content_hash());
        }

        Ok(Arc::new(PipelineResourceSignature {
            name: desc.name.clone(),
            block,
            resources,
            immutable_samplers,
            combined_sampler_suffix,
            binding_index: desc.binding_index,
            srb_allocation_granularity: desc.srb_allocation_granularity,
            resource_offsets,
            slot_bases,
            total_slots,
            static_slots,
            shader_stages,
            static_res_shader_stages,
            pipeline_type,
            static_res_stage_index,
            hash: hasher.finish(),
            attribs,
            static_cache: Mutex::new(vec![None; static_slots as usize]),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn binding_index(&self) -> u8 {
        self.binding_index
    }

    pub fn srb_allocation_granularity(&self) -> u32 {
        self.srb_allocation_granularity
    }

    /// Hash of the packed content and backend attributes. Names do not
    /// participate: signatures that differ only in names hash equal.
    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn shader_stages(&self) -> ShaderStageFlags {
        self.shader_stages
    }

    pub fn static_res_shader_stages(&self) -> ShaderStageFlags {
        self.static_res_shader_stages
    }

    pub fn pipeline_type(&self) -> Option<PipelineType> {
        self.pipeline_type
    }

    /// Position of `stage` among the stages carrying static resources, or
    /// `None` when the stage has none.
    pub fn static_stage_index(&self, stage: ShaderStageFlags) -> Option<usize> {
        let pipeline_type = self.pipeline_type?;
        let index = pipeline_type.shader_stage_index(stage)?;
        match self.static_res_stage_index[index] {
            -1 => None,
            i => Some(i as usize),
        }
    }

    /// Number of static resources visible to `stage`.
    pub fn static_variable_count(&self, stage: ShaderStageFlags) -> u32 {
        let resources = self.block.slice_at(self.resources);
        self.resource_index_range(ShaderVariableType::Static)
            .filter(|&i| resources[i as usize].stages.intersects(stage))
            .count() as u32
    }

    pub fn resource_count(&self) -> u32 {
        self.resources.len() as u32
    }

    pub fn resource(&self, index: u32) -> ResourceDescRef<'_> {
        let res = &self.block.slice_at(self.resources)[index as usize];
        ResourceDescRef {
            name: self.block.str_at(res.name),
            stages: res.stages,
            array_size: res.array_size,
            kind: res.kind,
            var_type: res.var_type,
            flags: res.flags,
        }
    }

    pub fn resources(&self) -> impl Iterator<Item = ResourceDescRef<'_>> {
        (0..self.resource_count()).map(move |i| self.resource(i))
    }

    /// Indices of the resources with the given variable type; the runs are
    /// contiguous and ordered `Static`, `Mutable`, `Dynamic`.
    pub fn resource_index_range(&self, var_type: ShaderVariableType) -> Range<u32> {
        self.resource_offsets[var_type as usize]..self.resource_offsets[var_type as usize + 1]
    }

    pub fn immutable_sampler_count(&self) -> u32 {
        self.immutable_samplers.len() as u32
    }

    pub fn immutable_sampler(&self, index: u32) -> ImmutableSamplerRef<'_> {
        let sam = &self.block.slice_at(self.immutable_samplers)[index as usize];
        ImmutableSamplerRef {
            name: self.block.str_at(sam.name),
            stages: sam.stages,
            desc: sam.desc,
        }
    }

    pub fn combined_sampler_suffix(&self) -> Option<&str> {
        self.combined_sampler_suffix.map(|s| self.block.str_at(s))
    }

    pub fn attribs(&self) -> &[B::ResourceAttribs] {
        &self.attribs
    }

    /// First flat binding slot of resource `index`; an array resource
    /// occupies `max(array_size, 1)` consecutive slots.
    pub fn resource_slot_base(&self, index: u32) -> u32 {
        self.slot_bases[index as usize]
    }

    pub fn total_slot_count(&self) -> u32 {
        self.total_slots
    }

    pub fn static_slot_count(&self) -> u32 {
        self.static_slots
    }

    /// Finds the resource visible to `stage` under `name`.
    pub fn find_resource(&self, stage: ShaderStageFlags, name: &str) -> Option<u32> {
        let resources = self.block.slice_at(self.resources);
        resources.iter().position(|res| {
            res.stages.intersects(stage) && self.block.str_at(res.name) == name
        }).map(|i| i as u32)
    }

    /// Finds the immutable sampler for `sampler_name` in `stage`. With
    /// combined texture samplers the stored names are texture names, so the
    /// match appends the suffix.
    pub fn find_immutable_sampler(&self, stage: ShaderStageFlags, sampler_name: &str) -> Option<u32> {
        let suffix = self.combined_sampler_suffix();
        let samplers = self.block.slice_at(self.immutable_samplers);
        samplers.iter().position(|sam| {
            sam.stages.intersects(stage)
                && streq_suff(sampler_name, self.block.str_at(sam.name), suffix)
        }).map(|i| i as u32)
    }

    /// Finds the separate sampler assigned to the texture at
    /// `texture_index`: same variable-type run, texture name plus suffix,
    /// covering every stage of the texture.
    pub fn find_assigned_sampler(&self, texture_index: u32) -> Option<u32> {
        let suffix = self.combined_sampler_suffix()?;
        let texture = self.resource(texture_index);
        debug_assert_eq!(texture.kind, ShaderResourceType::TextureSrv);
        let range = self.resource_index_range(texture.var_type);
        let resources = self.block.slice_at(self.resources);
        for index in range {
            let sam = &resources[index as usize];
            if sam.kind == ShaderResourceType::Sampler
                && sam.stages.contains(texture.stages)
                && streq_suff(self.block.str_at(sam.name), texture.name, Some(suffix))
            {
                return Some(index);
            }
        }
        None
    }

    /// Structural compatibility: bindings created against one signature are
    /// valid for pipelines built with the other. Names are irrelevant; the
    /// packed layout, the immutable samplers and the backend attributes must
    /// agree. The hash comparison rejects almost all mismatches without
    /// walking the content.
    pub fn is_compatible_with(&self, other: &PipelineResourceSignature<B>) -> bool {
        if self.hash != other.hash || self.binding_index != other.binding_index {
            return false;
        }
        let a = self.block.slice_at(self.resources);
        let b = other.block.slice_at(other.resources);
        if a.len() != b.len() {
            return false;
        }
        for (ra, rb) in a.iter().zip(b) {
            if ra.stages != rb.stages
                || ra.array_size != rb.array_size
                || ra.kind != rb.kind
                || ra.var_type != rb.var_type
                || ra.flags != rb.flags
            {
                return false;
            }
        }
        let sa = self.block.slice_at(self.immutable_samplers);
        let sb = other.block.slice_at(other.immutable_samplers);
        if sa.len() != sb.len() {
            return false;
        }
        for (ma, mb) in sa.iter().zip(sb) {
            if ma.stages != mb.stages || ma.desc != mb.desc {
                return false;
            }
        }
        self.attribs == other.attribs
    }

    /// Binds `object` to a static resource; static bindings live on the
    /// signature and are copied into every binding instance created from it.
    pub fn bind_static_resource(
        &self,
        stage: ShaderStageFlags,
        name: &str,
        array_index: u32,
        object: Arc<B::ResourceObject>,
    ) -> Result<()> {
        let index = self.find_resource(stage, name).ok_or_else(|| Error::InvalidBinding {
            resource: name.to_string(),
            message: format!("no resource under this name in stages {:?}", stage),
        })?;
        let res = self.resource(index);
        if res.var_type != ShaderVariableType::Static {
            return Err(Error::InvalidBinding {
                resource: name.to_string(),
                message: format!(
                    "resource is {:?}; only static resources can be bound on the signature",
                    res.var_type
                ),
            });
        }
        let width = res.array_size.max(1);
        if array_index >= width {
            return Err(Error::InvalidBinding {
                resource: name.to_string(),
                message: format!("array index {} out of bounds ({})", array_index, width),
            });
        }
        let slot = self.slot_bases[index as usize] + array_index;
        self.static_cache.lock().unwrap()[slot as usize] = Some(object);
        Ok(())
    }

    pub fn static_resource(
        &self,
        stage: ShaderStageFlags,
        name: &str,
        array_index: u32,
    ) -> Option<Arc<B::ResourceObject>> {
        let index = self.find_resource(stage, name)?;
        let res = self.resource(index);
        if res.var_type != ShaderVariableType::Static || array_index >= res.array_size.max(1) {
            return None;
        }
        let slot = self.slot_bases[index as usize] + array_index;
        self.static_cache.lock().unwrap()[slot as usize].clone()
    }

    /// Snapshot of the static slots, for initializing a binding instance.
    pub(crate) fn static_slots_snapshot(&self) -> Vec<Option<Arc<B::ResourceObject>>> {
        self.static_cache.lock().unwrap().clone()
    }

    /// Creates a binding instance. With `init_static_resources` the
    /// signature's current static bindings are copied in.
    pub fn create_shader_resource_binding(
        self: &Arc<Self>,
        init_static_resources: bool,
    ) -> ShaderResourceBinding<B> {
        ShaderResourceBinding::new(self.clone(), init_static_resources)
    }
}

impl<B: Backend> std::fmt::Debug for PipelineResourceSignature<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("PipelineResourceSignature")
            .field("name", &self.name)
            .field("binding_index", &self.binding_index)
            .field("resources", &self.resources.len())
            .field("immutable_samplers", &self.immutable_samplers.len())
            .field("hash", &self.hash)
            .finish()
    }
}

//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ShaderStageFlags as Stages;
    use crate::NullBackend;

    fn build(desc: &PipelineResourceSignatureDesc) -> Arc<PipelineResourceSignature<NullBackend>> {
        PipelineResourceSignature::new(&DeviceInfo::null(), desc).unwrap()
    }

    fn res(
        stages: ShaderStageFlags,
        name: &str,
        kind: ShaderResourceType,
        var_type: ShaderVariableType,
    ) -> PipelineResourceDesc {
        PipelineResourceDesc::new(stages, name, kind).var_type(var_type)
    }

    #[test]
    fn resources_are_grouped_by_variable_type() {
        use self::ShaderResourceType::*;
        use self::ShaderVariableType::*;
        let desc = PipelineResourceSignatureDesc {
            name: "grouping".to_string(),
            resources: vec![
                res(Stages::FRAGMENT, "g_TexB", TextureSrv, Mutable),
                res(Stages::VERTEX, "g_Constants", ConstantBuffer, Static),
                res(Stages::FRAGMENT, "g_TexA", TextureSrv, Mutable),
                res(Stages::FRAGMENT, "g_PerDraw", ConstantBuffer, Dynamic),
            ],
            ..Default::default()
        };
        let sig = build(&desc);

        assert_eq!(sig.resource_index_range(Static), 0..1);
        assert_eq!(sig.resource_index_range(Mutable), 1..3);
        assert_eq!(sig.resource_index_range(Dynamic), 3..4);
        assert_eq!(sig.resource(0).name, "g_Constants");
        // declaration order survives within a run
        assert_eq!(sig.resource(1).name, "g_TexB");
        assert_eq!(sig.resource(2).name, "g_TexA");
        assert_eq!(sig.resource(3).name, "g_PerDraw");
        assert_eq!(sig.shader_stages(), Stages::VERTEX | Stages::FRAGMENT);
        assert_eq!(sig.static_res_shader_stages(), Stages::VERTEX);
        assert_eq!(sig.pipeline_type(), Some(PipelineType::Graphics));
        assert_eq!(sig.static_stage_index(Stages::VERTEX), Some(0));
        assert_eq!(sig.static_stage_index(Stages::FRAGMENT), None);
        assert_eq!(sig.static_variable_count(Stages::VERTEX), 1);
        assert_eq!(sig.static_variable_count(Stages::FRAGMENT), 0);
    }

    #[test]
    fn array_resources_widen_the_slot_table() {
        use self::ShaderResourceType::*;
        use self::ShaderVariableType::*;
        let desc = PipelineResourceSignatureDesc {
            name: "slots".to_string(),
            resources: vec![
                res(Stages::FRAGMENT, "g_Textures", TextureSrv, Static).array_size(4),
                res(Stages::FRAGMENT, "g_Single", TextureSrv, Mutable),
            ],
            ..Default::default()
        };
        let sig = build(&desc);
        assert_eq!(sig.total_slot_count(), 5);
        assert_eq!(sig.static_slot_count(), 4);
        assert_eq!(sig.resource_slot_base(0), 0);
        assert_eq!(sig.resource_slot_base(1), 4);
    }

    #[test]
    fn combined_sampler_lookup() {
        use self::ShaderResourceType::*;
        use self::ShaderVariableType::*;
        let desc = PipelineResourceSignatureDesc {
            name: "combined".to_string(),
            resources: vec![
                res(Stages::VERTEX | Stages::FRAGMENT, "g_Frame", ConstantBuffer, Static),
                res(Stages::FRAGMENT, "g_Tex", TextureSrv, Mutable),
                res(Stages::FRAGMENT, "g_Tex_sampler", Sampler, Mutable),
            ],
            use_combined_texture_samplers: true,
            ..Default::default()
        };
        let sig = build(&desc);

        assert_eq!(sig.combined_sampler_suffix(), Some("_sampler"));
        assert_eq!(sig.resource_index_range(Mutable).len(), 2);

        let tex = sig.find_resource(Stages::FRAGMENT, "g_Tex").unwrap();
        assert_eq!(sig.resource(tex).kind, TextureSrv);
        let sam = sig.find_assigned_sampler(tex).unwrap();
        assert_eq!(sig.resource(sam).name, "g_Tex_sampler");
        assert_eq!(sig.resource(sam).kind, Sampler);

        // lookups are stage-scoped
        assert!(sig.find_resource(Stages::VERTEX, "g_Tex").is_none());
        assert!(sig.find_resource(Stages::VERTEX, "g_Frame").is_some());
    }

    #[test]
    fn immutable_samplers_match_through_the_suffix() {
        let desc = PipelineResourceSignatureDesc {
            name: "imtbl".to_string(),
            resources: vec![res(
                Stages::FRAGMENT,
                "g_Tex",
                ShaderResourceType::TextureSrv,
                ShaderVariableType::Mutable,
            )],
            immutable_samplers: vec![ImmutableSamplerDesc::new(
                Stages::FRAGMENT,
                "g_Tex",
                SamplerDescription::default(),
            )],
            use_combined_texture_samplers: true,
            ..Default::default()
        };
        let sig = build(&desc);
        assert_eq!(sig.immutable_sampler_count(), 1);
        assert!(sig
            .find_immutable_sampler(Stages::FRAGMENT, "g_Tex_sampler")
            .is_some());
        assert!(sig
            .find_immutable_sampler(Stages::VERTEX, "g_Tex_sampler")
            .is_none());
        assert!(sig.find_immutable_sampler(Stages::FRAGMENT, "g_Other").is_none());
    }

    #[test]
    fn compatibility_ignores_names_only() {
        let make = |tex_name: &str, array_size: u32| {
            let desc = PipelineResourceSignatureDesc {
                name: "compat".to_string(),
                resources: vec![
                    res(
                        Stages::FRAGMENT,
                        tex_name,
                        ShaderResourceType::TextureSrv,
                        ShaderVariableType::Mutable,
                    )
                    .array_size(array_size),
                ],
                ..Default::default()
            };
            build(&desc)
        };
        let a = make("g_TexA", 1);
        let b = make("g_TexB", 1);
        let c = make("g_TexA", 2);

        assert!(a.is_compatible_with(&a));
        assert!(a.is_compatible_with(&b));
        assert_eq!(a.hash(), b.hash());
        assert!(!a.is_compatible_with(&c));
        assert_ne!(a.hash(), c.hash());
    }

    #[test]
    fn static_bindings_live_on_the_signature() {
        use crate::NullResource;
        let desc = PipelineResourceSignatureDesc {
            name: "static".to_string(),
            resources: vec![
                res(
                    Stages::VERTEX,
                    "g_Constants",
                    ShaderResourceType::ConstantBuffer,
                    ShaderVariableType::Static,
                ),
                res(
                    Stages::FRAGMENT,
                    "g_Tex",
                    ShaderResourceType::TextureSrv,
                    ShaderVariableType::Mutable,
                ),
            ],
            ..Default::default()
        };
        let sig = build(&desc);

        let buffer = Arc::new(NullResource::new("cb"));
        sig.bind_static_resource(Stages::VERTEX, "g_Constants", 0, buffer.clone())
            .unwrap();
        let bound = sig.static_resource(Stages::VERTEX, "g_Constants", 0).unwrap();
        assert!(Arc::ptr_eq(&bound, &buffer));

        // mutable resources cannot be bound on the signature
        let tex = Arc::new(NullResource::new("tex"));
        assert!(sig
            .bind_static_resource(Stages::FRAGMENT, "g_Tex", 0, tex)
            .is_err());
        // out-of-bounds array index
        assert!(sig
            .bind_static_resource(Stages::VERTEX, "g_Constants", 1, buffer)
            .is_err());
    }
}
