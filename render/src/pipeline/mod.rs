//! Pipeline types: shader stages, fixed-function state descriptions and the
//! pipeline state object composing resource signatures with shader stages.

use crate::device::DeviceInfo;
use crate::error::{Error, Result};
use crate::hash::{DescHasher, StringKey};
use crate::signature::{PipelineResourceSignature, MAX_RESOURCE_SIGNATURES};
use crate::Backend;
use bitflags::bitflags;
use fxhash::FxHashMap;
use ordered_float::NotNan;
use smallvec::SmallVec;
use std::sync::{Arc, Condvar, Mutex};

//--------------------------------------------------------------------------------------------------
// Shader stages and pipeline types

bitflags! {
    #[derive(Default)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX = (1 << 0);
        const TESS_CONTROL = (1 << 1);
        const TESS_EVAL = (1 << 2);
        const GEOMETRY = (1 << 3);
        const FRAGMENT = (1 << 4);
        const COMPUTE = (1 << 5);
        const TASK = (1 << 6);
        const MESH = (1 << 7);
        const RAY_GEN = (1 << 8);
        const RAY_MISS = (1 << 9);
        const RAY_CLOSEST_HIT = (1 << 10);
        const RAY_ANY_HIT = (1 << 11);
        const RAY_INTERSECTION = (1 << 12);
        const CALLABLE = (1 << 13);
        const ALL_GRAPHICS = Self::VERTEX.bits
            | Self::TESS_CONTROL.bits
            | Self::TESS_EVAL.bits
            | Self::GEOMETRY.bits
            | Self::FRAGMENT.bits;
        const ALL_MESH = Self::TASK.bits | Self::MESH.bits | Self::FRAGMENT.bits;
        const ALL_RAY_TRACING = Self::RAY_GEN.bits
            | Self::RAY_MISS.bits
            | Self::RAY_CLOSEST_HIT.bits
            | Self::RAY_ANY_HIT.bits
            | Self::RAY_INTERSECTION.bits
            | Self::CALLABLE.bits;
    }
}

impl ShaderStageFlags {
    /// Iterates over the individual stage bits that are set.
    pub fn iter(self) -> impl Iterator<Item = ShaderStageFlags> {
        (0..32u32)
            .map(|b| ShaderStageFlags::from_bits_truncate(1 << b))
            .filter(move |s| !s.is_empty() && s.bits().count_ones() == 1 && self.contains(*s))
    }
}

/// Largest number of shaders one pipeline can hold.
pub const MAX_SHADERS_IN_PIPELINE: usize = 6;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PipelineType {
    Graphics,
    Compute,
    Mesh,
    RayTracing,
}

impl PipelineType {
    /// Deduces the pipeline type from a stage mask, if the mask is coherent.
    pub fn of_shader_stages(stages: ShaderStageFlags) -> Option<PipelineType> {
        if stages.is_empty() {
            return None;
        }
        if ShaderStageFlags::ALL_GRAPHICS.contains(stages) {
            Some(PipelineType::Graphics)
        } else if stages == ShaderStageFlags::COMPUTE {
            Some(PipelineType::Compute)
        } else if ShaderStageFlags::ALL_MESH.contains(stages) {
            Some(PipelineType::Mesh)
        } else if ShaderStageFlags::ALL_RAY_TRACING.contains(stages) {
            Some(PipelineType::RayTracing)
        } else {
            None
        }
    }

    /// Index of a single stage within this pipeline type's shader table,
    /// `0 .. MAX_SHADERS_IN_PIPELINE`.
    pub fn shader_stage_index(self, stage: ShaderStageFlags) -> Option<usize> {
        use self::ShaderStageFlags as S;
        debug_assert_eq!(stage.bits().count_ones(), 1);
        match self {
            PipelineType::Graphics => match stage {
                S::VERTEX => Some(0),
                S::TESS_CONTROL => Some(1),
                S::TESS_EVAL => Some(2),
                S::GEOMETRY => Some(3),
                S::FRAGMENT => Some(4),
                _ => None,
            },
            PipelineType::Compute => match stage {
                S::COMPUTE => Some(0),
                _ => None,
            },
            PipelineType::Mesh => match stage {
                S::TASK => Some(0),
                S::MESH => Some(1),
                S::FRAGMENT => Some(2),
                _ => None,
            },
            PipelineType::RayTracing => match stage {
                S::RAY_GEN => Some(0),
                S::RAY_MISS => Some(1),
                S::RAY_CLOSEST_HIT => Some(2),
                S::RAY_ANY_HIT => Some(3),
                S::RAY_INTERSECTION => Some(4),
                S::CALLABLE => Some(5),
                _ => None,
            },
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Fixed-function state

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    IncrementAndClamp,
    DecrementAndClamp,
    Invert,
    IncrementAndWrap,
    DecrementAndWrap,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct StencilOpState {
    pub fail_op: StencilOp,
    pub depth_fail_op: StencilOp,
    pub pass_op: StencilOp,
    pub compare: CompareOp,
}

impl Default for StencilOpState {
    fn default() -> Self {
        StencilOpState {
            fail_op: StencilOp::Keep,
            depth_fail_op: StencilOp::Keep,
            pass_op: StencilOp::Keep,
            compare: CompareOp::Always,
        }
    }
}

impl StencilOpState {
    pub fn content_hash(&self) -> u64 {
        DescHasher::new()
            .u32(self.fail_op as u32)
            .u32(self.depth_fail_op as u32)
            .u32(self.pass_op as u32)
            .u32(self.compare as u32)
            .finish()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct DepthStencilStateDescription {
    pub depth_test_enable: bool,
    pub depth_write_enable: bool,
    pub depth_compare: CompareOp,
    pub stencil_enable: bool,
    pub stencil_read_mask: u8,
    pub stencil_write_mask: u8,
    pub front: StencilOpState,
    pub back: StencilOpState,
}

impl Default for DepthStencilStateDescription {
    fn default() -> Self {
        DepthStencilStateDescription {
            depth_test_enable: true,
            depth_write_enable: true,
            depth_compare: CompareOp::Less,
            stencil_enable: false,
            stencil_read_mask: 0xff,
            stencil_write_mask: 0xff,
            front: StencilOpState::default(),
            back: StencilOpState::default(),
        }
    }
}

impl DepthStencilStateDescription {
    pub fn content_hash(&self) -> u64 {
        DescHasher::new()
            .bool(self.depth_test_enable)
            .bool(self.depth_write_enable)
            .u32(self.depth_compare as u32)
            .bool(self.stencil_enable)
            .u32(u32::from(self.stencil_read_mask))
            .u32(u32::from(self.stencil_write_mask))
            .combine(self.front.content_hash())
            .combine(self.back.content_hash())
            .finish()
    }
}

bitflags! {
    #[derive(Default)]
    pub struct CullModeFlags: u32 {
        const NONE = 0;
        const FRONT = 1;
        const BACK = 2;
        const FRONT_AND_BACK = Self::FRONT.bits | Self::BACK.bits;
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PolygonMode {
    Line,
    Fill,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum FrontFace {
    Clockwise,
    CounterClockwise,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DepthBias {
    Disabled,
    Enabled {
        constant_factor: NotNan<f32>,
        clamp: NotNan<f32>,
        slope_factor: NotNan<f32>,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct RasterizerStateDescription {
    pub polygon_mode: PolygonMode,
    pub cull_mode: CullModeFlags,
    pub front_face: FrontFace,
    pub depth_clamp_enable: bool,
    pub scissor_enable: bool,
    pub depth_bias: DepthBias,
    pub line_width: NotNan<f32>,
}

impl Default for RasterizerStateDescription {
    fn default() -> Self {
        RasterizerStateDescription {
            polygon_mode: PolygonMode::Fill,
            cull_mode: CullModeFlags::NONE,
            front_face: FrontFace::Clockwise,
            depth_clamp_enable: false,
            scissor_enable: false,
            depth_bias: DepthBias::Disabled,
            line_width: 1.0.into(),
        }
    }
}

impl RasterizerStateDescription {
    pub fn content_hash(&self) -> u64 {
        let h = DescHasher::new()
            .u32(self.polygon_mode as u32)
            .u32(self.cull_mode.bits())
            .u32(self.front_face as u32)
            .bool(self.depth_clamp_enable)
            .bool(self.scissor_enable);
        let h = match self.depth_bias {
            DepthBias::Disabled => h.u32(0),
            DepthBias::Enabled {
                constant_factor,
                clamp,
                slope_factor,
            } => h
                .u32(1)
                .f32_bits(constant_factor.into_inner())
                .f32_bits(clamp.into_inner())
                .f32_bits(slope_factor.into_inner()),
        };
        h.f32_bits(self.line_width.into_inner()).finish()
    }
}

pub const MAX_RENDER_TARGETS: usize = 8;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    InvSrcColor,
    SrcAlpha,
    InvSrcAlpha,
    DstColor,
    InvDstColor,
    DstAlpha,
    InvDstAlpha,
    SrcAlphaSaturate,
    ConstantColor,
    InvConstantColor,
    Src1Color,
    InvSrc1Color,
    Src1Alpha,
    InvSrc1Alpha,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BlendOp {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

bitflags! {
    pub struct ColorWriteMask: u32 {
        const RED = (1 << 0);
        const GREEN = (1 << 1);
        const BLUE = (1 << 2);
        const ALPHA = (1 << 3);
        const ALL = Self::RED.bits | Self::GREEN.bits | Self::BLUE.bits | Self::ALPHA.bits;
    }
}

impl Default for ColorWriteMask {
    fn default() -> Self {
        ColorWriteMask::ALL
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct RenderTargetBlendDescription {
    pub blend_enable: bool,
    pub src_blend: BlendFactor,
    pub dst_blend: BlendFactor,
    pub blend_op: BlendOp,
    pub src_blend_alpha: BlendFactor,
    pub dst_blend_alpha: BlendFactor,
    pub blend_op_alpha: BlendOp,
    pub write_mask: ColorWriteMask,
}

impl Default for RenderTargetBlendDescription {
    fn default() -> Self {
        RenderTargetBlendDescription {
            blend_enable: false,
            src_blend: BlendFactor::One,
            dst_blend: BlendFactor::Zero,
            blend_op: BlendOp::Add,
            src_blend_alpha: BlendFactor::One,
            dst_blend_alpha: BlendFactor::Zero,
            blend_op_alpha: BlendOp::Add,
            write_mask: ColorWriteMask::ALL,
        }
    }
}

impl RenderTargetBlendDescription {
    pub fn content_hash(&self) -> u64 {
        DescHasher::new()
            .bool(self.blend_enable)
            .u32(self.src_blend as u32)
            .u32(self.dst_blend as u32)
            .u32(self.blend_op as u32)
            .u32(self.src_blend_alpha as u32)
            .u32(self.dst_blend_alpha as u32)
            .u32(self.blend_op_alpha as u32)
            .u32(self.write_mask.bits())
            .finish()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct BlendStateDescription {
    pub alpha_to_coverage_enable: bool,
    pub independent_blend_enable: bool,
    pub targets: [RenderTargetBlendDescription; MAX_RENDER_TARGETS],
}

impl BlendStateDescription {
    /// Canonicalizes the description so that equal effective states compare
    /// and hash equal: without independent blend every target mirrors
    /// target 0, and disabled targets fall back to default blend factors
    /// (their write mask is preserved).
    pub fn normalize(&mut self) {
        if !self.independent_blend_enable {
            for i in 1..MAX_RENDER_TARGETS {
                self.targets[i] = self.targets[0];
            }
        }
        for target in self.targets.iter_mut() {
            if !target.blend_enable {
                let write_mask = target.write_mask;
                *target = RenderTargetBlendDescription {
                    write_mask,
                    ..RenderTargetBlendDescription::default()
                };
            }
        }
    }

    pub fn content_hash(&self) -> u64 {
        let mut h = DescHasher::new()
            .bool(self.alpha_to_coverage_enable)
            .bool(self.independent_blend_enable);
        for target in &self.targets {
            h = h.combine(target.content_hash());
        }
        h.finish()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
}

/// Fixed-function state of a graphics (or mesh) pipeline.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct GraphicsPipelineDesc {
    pub blend: BlendStateDescription,
    pub rasterizer: RasterizerStateDescription,
    pub depth_stencil: DepthStencilStateDescription,
    pub topology: PrimitiveTopology,
    pub sample_count: u32,
}

impl Default for GraphicsPipelineDesc {
    fn default() -> Self {
        GraphicsPipelineDesc {
            blend: BlendStateDescription::default(),
            rasterizer: RasterizerStateDescription::default(),
            depth_stencil: DepthStencilStateDescription::default(),
            topology: PrimitiveTopology::TriangleList,
            sample_count: 1,
        }
    }
}

impl GraphicsPipelineDesc {
    pub fn content_hash(&self) -> u64 {
        DescHasher::new()
            .combine(self.blend.content_hash())
            .combine(self.rasterizer.content_hash())
            .combine(self.depth_stencil.content_hash())
            .u32(self.topology as u32)
            .u32(self.sample_count)
            .finish()
    }
}

/// Size of one shader group handle in a shader binding table record.
pub const SHADER_GROUP_HANDLE_SIZE: u32 = 32;
/// Largest shader binding table record stride, handle included.
pub const MAX_SHADER_RECORD_STRIDE: u32 = 4096;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub struct RayTracingPipelineDesc {
    /// Size of the user data appended to each shader record.
    pub shader_record_size: u16,
    pub max_recursion_depth: u8,
}

impl RayTracingPipelineDesc {
    /// Stride of one shader binding table record: handle plus user data,
    /// aligned to the handle size.
    pub fn shader_record_stride(&self) -> u32 {
        let unaligned = SHADER_GROUP_HANDLE_SIZE + u32::from(self.shader_record_size);
        (unaligned + SHADER_GROUP_HANDLE_SIZE - 1) / SHADER_GROUP_HANDLE_SIZE
            * SHADER_GROUP_HANDLE_SIZE
    }

    pub fn content_hash(&self) -> u64 {
        DescHasher::new()
            .u32(u32::from(self.shader_record_size))
            .u32(u32::from(self.max_recursion_depth))
            .finish()
    }
}

//--------------------------------------------------------------------------------------------------
// Pipeline state

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PipelineStatus {
    /// Shaders are still compiling on worker threads.
    Compiling,
    Ready,
    Failed,
}

/// Waitable pipeline status. Only the finalization path moves the status out
/// of `Compiling`, exactly once.
#[derive(Debug)]
struct StatusFlag {
    state: Mutex<PipelineStatus>,
    cond: Condvar,
}

impl StatusFlag {
    fn new(initial: PipelineStatus) -> StatusFlag {
        StatusFlag {
            state: Mutex::new(initial),
            cond: Condvar::new(),
        }
    }

    fn set(&self, status: PipelineStatus) {
        let mut state = self.state.lock().unwrap();
        debug_assert_eq!(*state, PipelineStatus::Compiling, "status can only be set once");
        *state = status;
        self.cond.notify_all();
    }

    fn get(&self, wait_for_completion: bool) -> PipelineStatus {
        let mut state = self.state.lock().unwrap();
        if wait_for_completion {
            while *state == PipelineStatus::Compiling {
                state = self.cond.wait(state).unwrap();
            }
        }
        *state
    }
}

/// What kind of pipeline a create info describes.
#[derive(Clone, Debug)]
pub enum PipelineKindDesc {
    Graphics(GraphicsPipelineDesc),
    Compute,
    Mesh(GraphicsPipelineDesc),
    RayTracing(RayTracingPipelineDesc),
}

pub struct PipelineStateCreateInfo<'a, B: Backend> {
    pub name: &'a str,
    /// Stages of the shaders this pipeline is built from.
    pub shader_stages: ShaderStageFlags,
    pub signatures: &'a [Arc<PipelineResourceSignature<B>>],
    pub kind: PipelineKindDesc,
    /// When set, the pipeline is created in the `Compiling` state and a
    /// backend finalization task resolves it to `Ready` or `Failed`.
    pub async_compile: bool,
}

#[derive(Debug)]
pub struct PipelineState<B: Backend> {
    name: String,
    pipeline_type: PipelineType,
    shader_stages: ShaderStageFlags,
    kind: PipelineKindDesc,
    // dense slot table indexed by signature binding index
    signatures: SmallVec<[Option<Arc<PipelineResourceSignature<B>>>; 8]>,
    signature_count: u32,
    status: StatusFlag,
}

impl<B: Backend> PipelineState<B> {
    pub fn new(device: &DeviceInfo, info: PipelineStateCreateInfo<'_, B>) -> Result<PipelineState<B>> {
        let perr = |message: String| Error::InvalidPipelineDesc {
            pipeline: info.name.to_string(),
            message,
        };

        let pipeline_type = PipelineType::of_shader_stages(info.shader_stages)
            .ok_or_else(|| perr(format!("shader stages {:?} do not form a valid pipeline", info.shader_stages)))?;

        let expected = match info.kind {
            PipelineKindDesc::Graphics(_) => PipelineType::Graphics,
            PipelineKindDesc::Compute => PipelineType::Compute,
            PipelineKindDesc::Mesh(_) => PipelineType::Mesh,
            PipelineKindDesc::RayTracing(_) => PipelineType::RayTracing,
        };
        if pipeline_type != expected {
            return Err(perr(format!(
                "shader stages {:?} deduce a {:?} pipeline, but the description is for a {:?} pipeline",
                info.shader_stages, pipeline_type, expected
            )));
        }

        let mut kind = info.kind.clone();
        match &mut kind {
            PipelineKindDesc::Graphics(desc) | PipelineKindDesc::Mesh(desc) => {
                if desc.sample_count == 0 || !desc.sample_count.is_power_of_two() {
                    return Err(perr(format!(
                        "sample count ({}) must be a non-zero power of two",
                        desc.sample_count
                    )));
                }
                if expected == PipelineType::Mesh && !device.features.mesh_shaders {
                    return Err(perr("mesh shaders are not supported by the device".to_string()));
                }
            }
            PipelineKindDesc::RayTracing(desc) => {
                if !device.features.ray_tracing {
                    return Err(perr("ray tracing is not supported by the device".to_string()));
                }
                let stride = desc.shader_record_stride();
                if stride > MAX_SHADER_RECORD_STRIDE {
                    return Err(perr(format!(
                        "shader record stride ({}) exceeds the limit ({})",
                        stride, MAX_SHADER_RECORD_STRIDE
                    )));
                }
            }
            PipelineKindDesc::Compute => {}
        }
        if let PipelineKindDesc::Graphics(desc) | PipelineKindDesc::Mesh(desc) = &mut kind {
            desc.blend.normalize();
        }

        let signatures = validate_pipeline_signatures(info.name, info.signatures, device)?;

        Ok(PipelineState {
            name: info.name.to_string(),
            pipeline_type,
            shader_stages: info.shader_stages,
            kind,
            signature_count: info.signatures.len() as u32,
            signatures,
            status: StatusFlag::new(if info.async_compile {
                PipelineStatus::Compiling
            } else {
                PipelineStatus::Ready
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pipeline_type(&self) -> PipelineType {
        self.pipeline_type
    }

    pub fn shader_stages(&self) -> ShaderStageFlags {
        self.shader_stages
    }

    pub fn kind(&self) -> &PipelineKindDesc {
        &self.kind
    }

    pub fn signature_count(&self) -> u32 {
        self.signature_count
    }

    /// The signature bound at `slot`, if any.
    pub fn signature_at(&self, slot: u32) -> Option<&Arc<PipelineResourceSignature<B>>> {
        self.signatures.get(slot as usize).and_then(|s| s.as_ref())
    }

    /// Current status; blocks until compilation settles when
    /// `wait_for_completion` is set.
    pub fn status(&self, wait_for_completion: bool) -> PipelineStatus {
        self.status.get(wait_for_completion)
    }

    /// Resolves an asynchronously compiled pipeline. Called exactly once by
    /// the backend's finalization task.
    pub fn resolve_status(&self, status: PipelineStatus) {
        assert_ne!(status, PipelineStatus::Compiling);
        self.status.set(status);
    }
}

/// Cross-signature validation: unique binding slots and no resource or
/// immutable-sampler name reachable from two signatures in overlapping
/// stages (or at all, when separable programs are unavailable).
fn validate_pipeline_signatures<B: Backend>(
    pipeline_name: &str,
    signatures: &[Arc<PipelineResourceSignature<B>>],
    device: &DeviceInfo,
) -> Result<SmallVec<[Option<Arc<PipelineResourceSignature<B>>>; 8]>> {
    let perr = |message: String| Error::InvalidPipelineDesc {
        pipeline: pipeline_name.to_string(),
        message,
    };

    let mut slots: SmallVec<[Option<Arc<PipelineResourceSignature<B>>>; 8]> =
        (0..MAX_RESOURCE_SIGNATURES).map(|_| None).collect();

    // name -> (stages, owning signature name) for resources and samplers
    let mut resources: FxHashMap<StringKey, Vec<(ShaderStageFlags, String)>> =
        FxHashMap::default();
    let mut samplers: FxHashMap<StringKey, Vec<(ShaderStageFlags, String)>> =
        FxHashMap::default();

    for signature in signatures {
        let slot = u32::from(signature.binding_index());
        if let Some(other) = &slots[slot as usize] {
            return Err(perr(format!(
                "signatures '{}' and '{}' both use binding index {}",
                other.name(),
                signature.name(),
                slot
            )));
        }

        for i in 0..signature.resource_count() {
            let res = signature.resource(i);
            if let Some(prev) = resources.get(&StringKey::borrowed(res.name)) {
                for (stages, owner) in prev {
                    if stages.intersects(res.stages) {
                        return Err(perr(format!(
                            "shader resource '{}' is found in both signatures '{}' and '{}' \
                             in overlapping shader stages",
                            res.name,
                            owner,
                            signature.name()
                        )));
                    }
                    if !device.features.separable_programs {
                        return Err(perr(format!(
                            "shader resource '{}' is found in signatures '{}' and '{}'; \
                             without separable programs a resource is shared between all \
                             stages, so it must be defined by exactly one signature",
                            res.name,
                            owner,
                            signature.name()
                        )));
                    }
                }
            }
            resources
                .entry(StringKey::owned(res.name.to_string()))
                .or_default()
                .push((res.stages, signature.name().to_string()));
        }

        for i in 0..signature.immutable_sampler_count() {
            let sam = signature.immutable_sampler(i);
            if let Some(prev) = samplers.get(&StringKey::borrowed(sam.name)) {
                for (stages, owner) in prev {
                    if stages.intersects(sam.stages) {
                        return Err(perr(format!(
                            "immutable sampler '{}' is found in both signatures '{}' and \
                             '{}' in overlapping shader stages",
                            sam.name,
                            owner,
                            signature.name()
                        )));
                    }
                    if !device.features.separable_programs {
                        return Err(perr(format!(
                            "immutable sampler '{}' is found in signatures '{}' and '{}'",
                            sam.name,
                            owner,
                            signature.name()
                        )));
                    }
                }
            }
            samplers
                .entry(StringKey::owned(sam.name.to_string()))
                .or_default()
                .push((sam.stages, signature.name().to_string()));
        }

        slots[slot as usize] = Some(signature.clone());
    }

    // trim trailing empty slots so the table length equals the highest used slot + 1
    while slots.last().map(|s| s.is_none()).unwrap_or(false) {
        slots.pop();
    }

    Ok(slots)
}

//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::{
        PipelineResourceDesc, PipelineResourceSignatureDesc, ShaderResourceType,
        ShaderVariableType,
    };
    use crate::NullBackend;

    fn signature(
        name: &str,
        binding_index: u8,
        resources: Vec<PipelineResourceDesc>,
    ) -> Arc<PipelineResourceSignature<NullBackend>> {
        let desc = PipelineResourceSignatureDesc {
            name: name.to_string(),
            resources,
            binding_index,
            ..Default::default()
        };
        PipelineResourceSignature::new(&DeviceInfo::null(), &desc).unwrap()
    }

    fn graphics_info<'a>(
        signatures: &'a [Arc<PipelineResourceSignature<NullBackend>>],
    ) -> PipelineStateCreateInfo<'a, NullBackend> {
        PipelineStateCreateInfo {
            name: "pso",
            shader_stages: ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT,
            signatures,
            kind: PipelineKindDesc::Graphics(GraphicsPipelineDesc::default()),
            async_compile: false,
        }
    }

    #[test]
    fn pipeline_type_deduction() {
        use super::ShaderStageFlags as S;
        assert_eq!(
            PipelineType::of_shader_stages(S::VERTEX | S::FRAGMENT),
            Some(PipelineType::Graphics)
        );
        assert_eq!(PipelineType::of_shader_stages(S::COMPUTE), Some(PipelineType::Compute));
        assert_eq!(
            PipelineType::of_shader_stages(S::TASK | S::MESH | S::FRAGMENT),
            Some(PipelineType::Mesh)
        );
        assert_eq!(
            PipelineType::of_shader_stages(S::RAY_GEN | S::RAY_MISS),
            Some(PipelineType::RayTracing)
        );
        assert_eq!(PipelineType::of_shader_stages(S::VERTEX | S::COMPUTE), None);
        assert_eq!(PipelineType::of_shader_stages(S::empty()), None);
    }

    #[test]
    fn blend_normalization() {
        let mut blend = BlendStateDescription::default();
        blend.targets[0].blend_enable = true;
        blend.targets[0].src_blend = BlendFactor::SrcAlpha;
        blend.targets[0].dst_blend = BlendFactor::InvSrcAlpha;
        // garbage in a disabled target must not affect the canonical form
        blend.targets[3].src_blend = BlendFactor::DstColor;
        blend.targets[3].write_mask = ColorWriteMask::RED;

        let mut a = blend;
        a.independent_blend_enable = true;
        a.normalize();
        assert_eq!(a.targets[3].src_blend, BlendFactor::One);
        assert_eq!(a.targets[3].write_mask, ColorWriteMask::RED);

        let mut b = blend;
        b.normalize();
        assert_eq!(b.targets[1], b.targets[0]);
    }

    #[test]
    fn shader_record_stride_is_aligned() {
        let desc = RayTracingPipelineDesc {
            shader_record_size: 24,
            max_recursion_depth: 1,
        };
        assert_eq!(desc.shader_record_stride(), 64);
        let empty = RayTracingPipelineDesc::default();
        assert_eq!(empty.shader_record_stride(), SHADER_GROUP_HANDLE_SIZE);
    }

    #[test]
    fn accepts_disjoint_signatures() {
        let s0 = signature(
            "frame",
            0,
            vec![PipelineResourceDesc::new(
                ShaderStageFlags::VERTEX,
                "g_Frame",
                ShaderResourceType::ConstantBuffer,
            )],
        );
        let s1 = signature(
            "material",
            1,
            vec![PipelineResourceDesc::new(
                ShaderStageFlags::FRAGMENT,
                "g_Material",
                ShaderResourceType::TextureSrv,
            )
            .var_type(ShaderVariableType::Mutable)],
        );
        let sigs = vec![s0, s1];
        let pso = PipelineState::new(&DeviceInfo::null(), graphics_info(&sigs)).unwrap();
        assert_eq!(pso.signature_count(), 2);
        assert!(pso.signature_at(0).is_some());
        assert!(pso.signature_at(1).is_some());
        assert_eq!(pso.status(false), PipelineStatus::Ready);
    }

    #[test]
    fn rejects_duplicate_binding_index() {
        let s0 = signature("a", 2, vec![]);
        let s1 = signature("b", 2, vec![]);
        let sigs = vec![s0, s1];
        assert!(PipelineState::new(&DeviceInfo::null(), graphics_info(&sigs)).is_err());
    }

    #[test]
    fn rejects_cross_signature_name_overlap() {
        let s0 = signature(
            "a",
            0,
            vec![PipelineResourceDesc::new(
                ShaderStageFlags::FRAGMENT,
                "g_Shared",
                ShaderResourceType::TextureSrv,
            )],
        );
        let s1 = signature(
            "b",
            1,
            vec![PipelineResourceDesc::new(
                ShaderStageFlags::FRAGMENT | ShaderStageFlags::VERTEX,
                "g_Shared",
                ShaderResourceType::TextureSrv,
            )],
        );
        let sigs = vec![s0, s1];
        assert!(PipelineState::new(&DeviceInfo::null(), graphics_info(&sigs)).is_err());
    }

    #[test]
    fn async_status_resolution() {
        let sigs: Vec<Arc<PipelineResourceSignature<NullBackend>>> = vec![];
        let mut info = graphics_info(&sigs);
        info.async_compile = true;
        let pso = Arc::new(PipelineState::new(&DeviceInfo::null(), info).unwrap());
        assert_eq!(pso.status(false), PipelineStatus::Compiling);

        let worker = {
            let pso = pso.clone();
            std::thread::spawn(move || pso.resolve_status(PipelineStatus::Ready))
        };
        assert_eq!(pso.status(true), PipelineStatus::Ready);
        worker.join().unwrap();
    }
}
