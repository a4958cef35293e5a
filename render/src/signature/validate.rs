//! Resource-signature description validation.

use crate::device::DeviceInfo;
use crate::error::{Error, Result};
use crate::hash::StringKey;
use crate::pipeline::ShaderStageFlags;
use crate::signature::desc::{
    allowed_resource_flags, PipelineResourceDesc, PipelineResourceFlags,
    PipelineResourceSignatureDesc, ShaderResourceType, MAX_RESOURCES_IN_SIGNATURE,
    MAX_RESOURCE_SIGNATURES,
};
use fxhash::FxHashMap;
use log::warn;

fn error(desc: &PipelineResourceSignatureDesc, message: String) -> Error {
    Error::InvalidSignatureDesc {
        signature: desc.name.clone(),
        message,
    }
}

/// Checks every rule a signature description must satisfy on `device`.
///
/// Orphan samplers (samplers or immutable samplers assigned to no texture
/// when combined texture samplers are in use) are warnings, not errors.
pub fn validate_signature_desc(
    desc: &PipelineResourceSignatureDesc,
    device: &DeviceInfo,
) -> Result<()> {
    let features = &device.features;

    if u32::from(desc.binding_index) >= MAX_RESOURCE_SIGNATURES {
        return Err(error(
            desc,
            format!(
                "binding index ({}) exceeds the maximum allowed value ({})",
                desc.binding_index,
                MAX_RESOURCE_SIGNATURES - 1
            ),
        ));
    }

    if desc.resources.len() as u32 > MAX_RESOURCES_IN_SIGNATURE {
        return Err(error(
            desc,
            format!(
                "resource count ({}) exceeds the maximum allowed value ({})",
                desc.resources.len(),
                MAX_RESOURCES_IN_SIGNATURE
            ),
        ));
    }

    if desc.immutable_samplers.len() as u32 > MAX_RESOURCES_IN_SIGNATURE {
        return Err(error(
            desc,
            format!(
                "immutable sampler count ({}) exceeds the maximum allowed value ({})",
                desc.immutable_samplers.len(),
                MAX_RESOURCES_IN_SIGNATURE
            ),
        ));
    }

    if desc.use_combined_texture_samplers && desc.combined_sampler_suffix.is_empty() {
        return Err(error(
            desc,
            "combined texture samplers are enabled, but the combined sampler suffix is empty"
                .to_string(),
        ));
    }

    // all resources by name; same-name entries are legal only in disjoint stages
    let mut resources_by_name: FxHashMap<StringKey, Vec<&PipelineResourceDesc>> =
        FxHashMap::default();
    for (i, res) in desc.resources.iter().enumerate() {
        if res.name.is_empty() {
            return Err(error(desc, format!("resources[{}]: name must not be empty", i)));
        }
        if res.stages.is_empty() {
            return Err(error(
                desc,
                format!("resources[{}] ('{}'): shader stages must not be empty", i, res.name),
            ));
        }
        if res.array_size == 0 && !res.flags.contains(PipelineResourceFlags::RUNTIME_ARRAY) {
            return Err(error(
                desc,
                format!(
                    "resources[{}] ('{}'): array size is 0, which is only allowed together \
                     with the RUNTIME_ARRAY flag",
                    i, res.name
                ),
            ));
        }

        if let Some(same_name) = resources_by_name.get(&StringKey::borrowed(&res.name)) {
            for prev in same_name {
                if prev.stages.intersects(res.stages) {
                    return Err(error(
                        desc,
                        format!(
                            "multiple resources with name '{}' specify overlapping shader \
                             stages; same-name resources may coexist only in disjoint stages",
                            res.name
                        ),
                    ));
                }
                if !features.separable_programs {
                    return Err(error(
                        desc,
                        format!(
                            "the device does not support separable programs, but there are \
                             separate resources named '{}' in stages {:?} and {:?}; every \
                             resource is shared between all stages on this device, so use \
                             distinct names or a single declaration for all stages",
                            res.name, res.stages, prev.stages
                        ),
                    ));
                }
            }
        }

        if res.flags.contains(PipelineResourceFlags::RUNTIME_ARRAY)
            && !features.shader_resource_runtime_arrays
        {
            return Err(error(
                desc,
                format!(
                    "resources[{}] ('{}'): the RUNTIME_ARRAY flag requires the \
                     shader-resource-runtime-arrays device feature",
                    i, res.name
                ),
            ));
        }

        if res.kind == ShaderResourceType::AccelStruct && !features.ray_tracing {
            return Err(error(
                desc,
                format!(
                    "resources[{}] ('{}'): acceleration structures require the ray-tracing \
                     device feature",
                    i, res.name
                ),
            ));
        }

        if res.kind == ShaderResourceType::InputAttachment
            && res.stages != ShaderStageFlags::FRAGMENT
        {
            return Err(error(
                desc,
                format!(
                    "resources[{}] ('{}'): input attachments are only supported in the \
                     fragment shader, but the stages are {:?}",
                    i, res.name, res.stages
                ),
            ));
        }

        let allowed = allowed_resource_flags(res.kind);
        if !allowed.contains(res.flags) {
            return Err(error(
                desc,
                format!(
                    "resources[{}] ('{}'): flags {:?} are not valid for a {:?}; allowed \
                     flags are {:?}",
                    i, res.name, res.flags, res.kind, allowed
                ),
            ));
        }

        if (device.kind.is_d3d() || device.kind.is_metal())
            && res.flags.contains(PipelineResourceFlags::COMBINED_SAMPLER)
            && !desc.use_combined_texture_samplers
        {
            return Err(error(
                desc,
                format!(
                    "resources[{}] ('{}'): on Direct3D and Metal the COMBINED_SAMPLER flag \
                     may only be used when combined texture samplers are enabled",
                    i, res.name
                ),
            ));
        }

        if res
            .flags
            .contains(PipelineResourceFlags::GENERAL_INPUT_ATTACHMENT)
            && device.kind != crate::device::DeviceKind::Null
            && !device.kind.is_vulkan()
        {
            return Err(error(
                desc,
                format!(
                    "resources[{}] ('{}'): GENERAL_INPUT_ATTACHMENT is only valid on Vulkan",
                    i, res.name
                ),
            ));
        }

        resources_by_name
            .entry(StringKey::owned(res.name.clone()))
            .or_default()
            .push(res);
    }

    // immutable samplers by name, same uniqueness rules
    let mut samplers_by_name: FxHashMap<StringKey, Vec<ShaderStageFlags>> = FxHashMap::default();
    for (i, sam) in desc.immutable_samplers.iter().enumerate() {
        if sam.name.is_empty() {
            return Err(error(
                desc,
                format!("immutable_samplers[{}]: name must not be empty", i),
            ));
        }
        if sam.stages.is_empty() {
            return Err(error(
                desc,
                format!(
                    "immutable_samplers[{}] ('{}'): shader stages must not be empty",
                    i, sam.name
                ),
            ));
        }
        if let Some(same_name) = samplers_by_name.get(&StringKey::borrowed(&sam.name)) {
            for prev in same_name {
                if prev.intersects(sam.stages) {
                    return Err(error(
                        desc,
                        format!(
                            "multiple immutable samplers with name '{}' specify overlapping \
                             shader stages; same-name samplers may coexist only in disjoint \
                             stages",
                            sam.name
                        ),
                    ));
                }
                if !features.separable_programs {
                    return Err(error(
                        desc,
                        format!(
                            "the device does not support separable programs, but there are \
                             separate immutable samplers named '{}' in multiple stages",
                            sam.name
                        ),
                    ));
                }
            }
        }
        samplers_by_name
            .entry(StringKey::owned(sam.name.clone()))
            .or_default()
            .push(sam.stages);
    }

    if desc.use_combined_texture_samplers {
        validate_combined_samplers(desc)?;
    }

    Ok(())
}

/// Cross-checks texture SRVs against their assigned samplers and warns about
/// samplers that match no texture.
fn validate_combined_samplers(desc: &PipelineResourceSignatureDesc) -> Result<()> {
    let suffix = &desc.combined_sampler_suffix;

    // (name, stages) pairs of samplers that some texture claims
    let mut assigned_samplers: Vec<(String, ShaderStageFlags)> = Vec::new();
    let mut assigned_imtbl_samplers: Vec<(String, ShaderStageFlags)> = Vec::new();

    for res in &desc.resources {
        if res.kind != ShaderResourceType::TextureSrv {
            continue;
        }

        let sampler_name = format!("{}{}", res.name, suffix);
        for sam in &desc.resources {
            if sam.name != sampler_name || !sam.stages.intersects(res.stages) {
                continue;
            }
            if sam.kind != ShaderResourceType::Sampler {
                return Err(error(
                    desc,
                    format!(
                        "resource '{}' combined with texture '{}' is not a sampler",
                        sam.name, res.name
                    ),
                ));
            }
            if !sam.stages.contains(res.stages) {
                return Err(error(
                    desc,
                    format!(
                        "texture '{}' is defined for stages {:?}, but sampler '{}' \
                         assigned to it uses only some of these stages ({:?}); define \
                         the sampler for all stages the texture uses",
                        res.name, res.stages, sam.name, sam.stages
                    ),
                ));
            }
            if sam.var_type != res.var_type {
                return Err(error(
                    desc,
                    format!(
                        "the variable type ({:?}) of texture '{}' does not match the \
                         variable type ({:?}) of sampler '{}' assigned to it",
                        res.var_type, res.name, sam.var_type, sam.name
                    ),
                ));
            }
            assigned_samplers.push((sam.name.clone(), sam.stages));
            break;
        }

        for sam in &desc.immutable_samplers {
            if sam.name != res.name || !sam.stages.intersects(res.stages) {
                continue;
            }
            if !sam.stages.contains(res.stages) {
                return Err(error(
                    desc,
                    format!(
                        "texture '{}' is defined for stages {:?}, but the immutable sampler \
                         assigned to it uses only some of these stages ({:?})",
                        res.name, res.stages, sam.stages
                    ),
                ));
            }
            assigned_imtbl_samplers.push((sam.name.clone(), sam.stages));
            break;
        }
    }

    for res in &desc.resources {
        if res.kind != ShaderResourceType::Sampler {
            continue;
        }
        let assigned = assigned_samplers
            .iter()
            .any(|(name, stages)| *name == res.name && *stages == res.stages);
        if !assigned {
            warn!(
                "signature '{}': sampler '{}' ({:?}) is not assigned to any texture; all \
                 samplers should be assigned to textures when combined texture samplers are \
                 used",
                desc.name, res.name, res.stages
            );
        }
    }

    for sam in &desc.immutable_samplers {
        let assigned = assigned_imtbl_samplers
            .iter()
            .any(|(name, stages)| *name == sam.name && *stages == sam.stages);
        if !assigned {
            warn!(
                "signature '{}': immutable sampler '{}' ({:?}) is not assigned to any \
                 texture or sampler; all immutable samplers should be assigned when combined \
                 texture samplers are used",
                desc.name, sam.name, sam.stages
            );
        }
    }

    Ok(())
}

//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceFeatures, DeviceKind};
    use crate::pipeline::ShaderStageFlags as Stages;
    use crate::sampler::SamplerDescription;
    use crate::signature::desc::{ImmutableSamplerDesc, ShaderVariableType};

    fn resource(
        stages: Stages,
        name: &str,
        kind: ShaderResourceType,
    ) -> PipelineResourceDesc {
        PipelineResourceDesc::new(stages, name, kind)
    }

    fn desc_with(resources: Vec<PipelineResourceDesc>) -> PipelineResourceSignatureDesc {
        PipelineResourceSignatureDesc {
            name: "test".to_string(),
            resources,
            ..Default::default()
        }
    }

    #[test]
    fn accepts_a_plain_description() {
        let desc = desc_with(vec![
            resource(Stages::VERTEX | Stages::FRAGMENT, "g_Constants", ShaderResourceType::ConstantBuffer),
            resource(Stages::FRAGMENT, "g_Texture", ShaderResourceType::TextureSrv),
        ]);
        assert!(validate_signature_desc(&desc, &DeviceInfo::null()).is_ok());
    }

    #[test]
    fn rejects_binding_index_out_of_range() {
        let mut desc = desc_with(vec![]);
        desc.binding_index = MAX_RESOURCE_SIGNATURES as u8;
        assert!(validate_signature_desc(&desc, &DeviceInfo::null()).is_err());
    }

    #[test]
    fn rejects_empty_names_and_stages() {
        let desc = desc_with(vec![resource(Stages::VERTEX, "", ShaderResourceType::ConstantBuffer)]);
        assert!(validate_signature_desc(&desc, &DeviceInfo::null()).is_err());

        let desc = desc_with(vec![resource(
            Stages::empty(),
            "g_Buffer",
            ShaderResourceType::ConstantBuffer,
        )]);
        assert!(validate_signature_desc(&desc, &DeviceInfo::null()).is_err());
    }

    #[test]
    fn rejects_zero_array_size_without_runtime_array() {
        let desc = desc_with(vec![
            resource(Stages::VERTEX, "g_Buffer", ShaderResourceType::ConstantBuffer).array_size(0),
        ]);
        assert!(validate_signature_desc(&desc, &DeviceInfo::null()).is_err());

        let desc = desc_with(vec![
            resource(Stages::VERTEX, "g_Textures", ShaderResourceType::TextureSrv)
                .array_size(0)
                .flags(PipelineResourceFlags::RUNTIME_ARRAY),
        ]);
        assert!(validate_signature_desc(&desc, &DeviceInfo::null()).is_ok());
    }

    #[test]
    fn same_name_needs_disjoint_stages() {
        let overlapping = desc_with(vec![
            resource(Stages::FRAGMENT, "g_Tex", ShaderResourceType::TextureSrv),
            resource(Stages::FRAGMENT | Stages::VERTEX, "g_Tex", ShaderResourceType::TextureSrv),
        ]);
        assert!(validate_signature_desc(&overlapping, &DeviceInfo::null()).is_err());

        let disjoint = desc_with(vec![
            resource(Stages::VERTEX, "g_Tex", ShaderResourceType::TextureSrv),
            resource(Stages::FRAGMENT, "g_Tex", ShaderResourceType::TextureSrv),
        ]);
        assert!(validate_signature_desc(&disjoint, &DeviceInfo::null()).is_ok());
    }

    #[test]
    fn same_name_rejected_without_separable_programs() {
        let disjoint = desc_with(vec![
            resource(Stages::VERTEX, "g_Tex", ShaderResourceType::TextureSrv),
            resource(Stages::FRAGMENT, "g_Tex", ShaderResourceType::TextureSrv),
        ]);
        let device = DeviceInfo::new(
            DeviceKind::OpenGl,
            DeviceFeatures {
                separable_programs: false,
                ..DeviceFeatures::ALL
            },
        );
        assert!(validate_signature_desc(&disjoint, &device).is_err());
    }

    #[test]
    fn capability_gated_flags() {
        let device = DeviceInfo::new(DeviceKind::Vulkan, DeviceFeatures::NONE);

        let runtime = desc_with(vec![
            resource(Stages::FRAGMENT, "g_Textures", ShaderResourceType::TextureSrv)
                .flags(PipelineResourceFlags::RUNTIME_ARRAY),
        ]);
        assert!(validate_signature_desc(&runtime, &device).is_err());

        let accel = desc_with(vec![resource(
            Stages::FRAGMENT,
            "g_Tlas",
            ShaderResourceType::AccelStruct,
        )]);
        assert!(validate_signature_desc(&accel, &device).is_err());
    }

    #[test]
    fn input_attachments_are_fragment_only() {
        let desc = desc_with(vec![resource(
            Stages::VERTEX,
            "g_SubpassInput",
            ShaderResourceType::InputAttachment,
        )]);
        assert!(validate_signature_desc(&desc, &DeviceInfo::null()).is_err());
    }

    #[test]
    fn rejects_flags_invalid_for_kind() {
        let desc = desc_with(vec![
            resource(Stages::VERTEX, "g_Constants", ShaderResourceType::ConstantBuffer)
                .flags(PipelineResourceFlags::COMBINED_SAMPLER),
        ]);
        assert!(validate_signature_desc(&desc, &DeviceInfo::null()).is_err());
    }

    #[test]
    fn combined_sampler_cross_check() {
        let mut desc = desc_with(vec![
            resource(Stages::FRAGMENT, "g_Tex", ShaderResourceType::TextureSrv)
                .var_type(ShaderVariableType::Mutable),
            resource(Stages::FRAGMENT, "g_Tex_sampler", ShaderResourceType::Sampler)
                .var_type(ShaderVariableType::Mutable),
        ]);
        desc.use_combined_texture_samplers = true;
        assert!(validate_signature_desc(&desc, &DeviceInfo::null()).is_ok());

        // variable types must agree
        desc.resources[1].var_type = ShaderVariableType::Dynamic;
        assert!(validate_signature_desc(&desc, &DeviceInfo::null()).is_err());

        // the sampler must cover all of the texture's stages
        desc.resources[1].var_type = ShaderVariableType::Mutable;
        desc.resources[0].stages = Stages::VERTEX | Stages::FRAGMENT;
        assert!(validate_signature_desc(&desc, &DeviceInfo::null()).is_err());
    }

    #[test]
    fn orphan_samplers_warn_but_validate() {
        let _ = pretty_env_logger::try_init();
        // a sampler matching no texture and an unassigned immutable sampler
        // are diagnostics, not errors
        let mut desc = desc_with(vec![
            resource(Stages::FRAGMENT, "g_Tex", ShaderResourceType::TextureSrv),
            resource(Stages::FRAGMENT, "g_Tex_sampler", ShaderResourceType::Sampler),
            resource(Stages::FRAGMENT, "g_Lonely_sampler", ShaderResourceType::Sampler),
        ]);
        desc.use_combined_texture_samplers = true;
        desc.immutable_samplers.push(ImmutableSamplerDesc::new(
            Stages::VERTEX,
            "g_Unused",
            SamplerDescription::default(),
        ));
        assert!(validate_signature_desc(&desc, &DeviceInfo::null()).is_ok());
    }

    #[test]
    fn combined_suffix_must_be_set() {
        let mut desc = desc_with(vec![]);
        desc.use_combined_texture_samplers = true;
        desc.combined_sampler_suffix = String::new();
        assert!(validate_signature_desc(&desc, &DeviceInfo::null()).is_err());
    }

    #[test]
    fn immutable_sampler_stage_agreement() {
        let mut desc = desc_with(vec![
            resource(Stages::VERTEX | Stages::FRAGMENT, "g_Tex", ShaderResourceType::TextureSrv),
        ]);
        desc.use_combined_texture_samplers = true;
        desc.immutable_samplers.push(ImmutableSamplerDesc::new(
            Stages::FRAGMENT,
            "g_Tex",
            SamplerDescription::default(),
        ));
        assert!(validate_signature_desc(&desc, &DeviceInfo::null()).is_err());

        desc.immutable_samplers[0].stages = Stages::VERTEX | Stages::FRAGMENT;
        assert!(validate_signature_desc(&desc, &DeviceInfo::null()).is_ok());
    }
}
