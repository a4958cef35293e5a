//! Shader resource binding instances.
//!
//! A binding instance holds the objects bound to one signature's resources.
//! Static resources are bound once on the signature itself and copied in;
//! mutable and dynamic resources are bound here, per instance.

use crate::error::{Error, Result};
use crate::pipeline::ShaderStageFlags;
use crate::signature::{PipelineResourceSignature, ShaderVariableType};
use crate::Backend;
use log::warn;
use std::sync::Arc;

pub struct ShaderResourceBinding<B: Backend> {
    signature: Arc<PipelineResourceSignature<B>>,
    /// Flat binding slots; resource `i` starts at
    /// `signature.resource_slot_base(i)` and arrays occupy consecutive
    /// slots. Static resources come first, so the static snapshot is a
    /// prefix copy.
    slots: Vec<Option<Arc<B::ResourceObject>>>,
    static_resources_initialized: bool,
}

impl<B: Backend> ShaderResourceBinding<B> {
    pub(crate) fn new(
        signature: Arc<PipelineResourceSignature<B>>,
        init_static_resources: bool,
    ) -> ShaderResourceBinding<B> {
        let mut srb = ShaderResourceBinding {
            slots: vec![None; signature.total_slot_count() as usize],
            signature,
            static_resources_initialized: false,
        };
        if init_static_resources {
            srb.initialize_static_resources();
        }
        srb
    }

    pub fn signature(&self) -> &Arc<PipelineResourceSignature<B>> {
        &self.signature
    }

    /// Copies the signature's current static bindings into this instance.
    /// May be called at most once; later changes to the signature's static
    /// bindings do not propagate.
    pub fn initialize_static_resources(&mut self) {
        if self.static_resources_initialized {
            warn!(
                "static resources of '{}' have already been initialized; the call is ignored",
                self.signature.name()
            );
            return;
        }
        let snapshot = self.signature.static_slots_snapshot();
        self.slots[..snapshot.len()].clone_from_slice(&snapshot);
        self.static_resources_initialized = true;
    }

    pub fn static_resources_initialized(&self) -> bool {
        self.static_resources_initialized
    }

    /// Binds `object` to a mutable or dynamic resource.
    pub fn bind(
        &mut self,
        stage: ShaderStageFlags,
        name: &str,
        array_index: u32,
        object: Arc<B::ResourceObject>,
    ) -> Result<()> {
        let index = self
            .signature
            .find_resource(stage, name)
            .ok_or_else(|| Error::InvalidBinding {
                resource: name.to_string(),
                message: format!("no resource under this name in stages {:?}", stage),
            })?;
        let res = self.signature.resource(index);
        if res.var_type == ShaderVariableType::Static {
            return Err(Error::InvalidBinding {
                resource: name.to_string(),
                message: "static resources are bound on the signature, not on the binding instance"
                    .to_string(),
            });
        }
        let width = res.array_size.max(1);
        if array_index >= width {
            return Err(Error::InvalidBinding {
                resource: name.to_string(),
                message: format!("array index {} out of bounds ({})", array_index, width),
            });
        }
        let slot = (self.signature.resource_slot_base(index) + array_index) as usize;
        if res.var_type == ShaderVariableType::Mutable && self.slots[slot].is_some() {
            warn!(
                "mutable resource '{}' is being rebound; some backends only apply \
                 mutable bindings once per instance",
                name
            );
        }
        self.slots[slot] = Some(object);
        Ok(())
    }

    pub fn bound(
        &self,
        stage: ShaderStageFlags,
        name: &str,
        array_index: u32,
    ) -> Option<Arc<B::ResourceObject>> {
        let index = self.signature.find_resource(stage, name)?;
        let res = self.signature.resource(index);
        if array_index >= res.array_size.max(1) {
            return None;
        }
        let slot = (self.signature.resource_slot_base(index) + array_index) as usize;
        self.slots[slot].clone()
    }

    /// Names of the resources with at least one empty slot; a draw with any
    /// of these unbound is invalid.
    pub fn unbound_resources(&self) -> Vec<&str> {
        let mut unbound = Vec::new();
        for index in 0..self.signature.resource_count() {
            let res = self.signature.resource(index);
            let base = self.signature.resource_slot_base(index) as usize;
            let width = res.array_size.max(1) as usize;
            if self.slots[base..base + width].iter().any(|s| s.is_none()) {
                unbound.push(res.name);
            }
        }
        unbound
    }
}

impl<B: Backend> std::fmt::Debug for ShaderResourceBinding<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("ShaderResourceBinding")
            .field("signature", &self.signature.name())
            .field("slots", &self.slots.len())
            .field("static_resources_initialized", &self.static_resources_initialized)
            .finish()
    }
}

//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceInfo;
    use crate::pipeline::ShaderStageFlags as Stages;
    use crate::signature::{
        PipelineResourceDesc, PipelineResourceSignatureDesc, ShaderResourceType,
    };
    use crate::{NullBackend, NullResource};

    fn test_signature() -> Arc<PipelineResourceSignature<NullBackend>> {
        let desc = PipelineResourceSignatureDesc {
            name: "srb-test".to_string(),
            resources: vec![
                PipelineResourceDesc::new(
                    Stages::VERTEX,
                    "g_Constants",
                    ShaderResourceType::ConstantBuffer,
                ),
                PipelineResourceDesc::new(Stages::FRAGMENT, "g_Tex", ShaderResourceType::TextureSrv)
                    .var_type(ShaderVariableType::Mutable)
                    .array_size(2),
                PipelineResourceDesc::new(
                    Stages::FRAGMENT,
                    "g_PerDraw",
                    ShaderResourceType::ConstantBuffer,
                )
                .var_type(ShaderVariableType::Dynamic),
            ],
            ..Default::default()
        };
        PipelineResourceSignature::new(&DeviceInfo::null(), &desc).unwrap()
    }

    #[test]
    fn static_resources_are_copied_in() {
        let _ = pretty_env_logger::try_init();
        let sig = test_signature();
        let cb = Arc::new(NullResource::new("cb"));
        sig.bind_static_resource(Stages::VERTEX, "g_Constants", 0, cb.clone())
            .unwrap();

        let mut srb = sig.create_shader_resource_binding(true);
        let bound = srb.bound(Stages::VERTEX, "g_Constants", 0).unwrap();
        assert!(Arc::ptr_eq(&bound, &cb));

        // later static rebinds do not propagate into existing instances
        let other = Arc::new(NullResource::new("cb2"));
        sig.bind_static_resource(Stages::VERTEX, "g_Constants", 0, other)
            .unwrap();
        let bound = srb.bound(Stages::VERTEX, "g_Constants", 0).unwrap();
        assert!(Arc::ptr_eq(&bound, &cb));

        // a repeated initialization warns and is ignored
        srb.initialize_static_resources();
        let bound = srb.bound(Stages::VERTEX, "g_Constants", 0).unwrap();
        assert!(Arc::ptr_eq(&bound, &cb));
    }

    #[test]
    fn mutable_and_dynamic_bind_per_instance() {
        let _ = pretty_env_logger::try_init();
        let sig = test_signature();
        let mut srb = sig.create_shader_resource_binding(false);

        let tex = Arc::new(NullResource::new("tex"));
        srb.bind(Stages::FRAGMENT, "g_Tex", 1, tex.clone()).unwrap();
        let bound = srb.bound(Stages::FRAGMENT, "g_Tex", 1).unwrap();
        assert!(Arc::ptr_eq(&bound, &tex));
        assert!(srb.bound(Stages::FRAGMENT, "g_Tex", 0).is_none());

        // rebinding a mutable slot warns but takes effect
        let replacement = Arc::new(NullResource::new("tex-replacement"));
        srb.bind(Stages::FRAGMENT, "g_Tex", 1, replacement.clone())
            .unwrap();
        let bound = srb.bound(Stages::FRAGMENT, "g_Tex", 1).unwrap();
        assert!(Arc::ptr_eq(&bound, &replacement));

        let cb = Arc::new(NullResource::new("per-draw"));
        srb.bind(Stages::FRAGMENT, "g_PerDraw", 0, cb).unwrap();

        // static resources are rejected here
        let cb = Arc::new(NullResource::new("cb"));
        assert!(srb.bind(Stages::VERTEX, "g_Constants", 0, cb).is_err());
        // array bounds are checked
        let tex2 = Arc::new(NullResource::new("tex2"));
        assert!(srb.bind(Stages::FRAGMENT, "g_Tex", 2, tex2).is_err());
    }

    #[test]
    fn unbound_resources_are_reported() {
        let sig = test_signature();
        let mut srb = sig.create_shader_resource_binding(false);
        assert_eq!(
            srb.unbound_resources(),
            vec!["g_Constants", "g_Tex", "g_PerDraw"]
        );

        srb.bind(
            Stages::FRAGMENT,
            "g_Tex",
            0,
            Arc::new(NullResource::new("a")),
        )
        .unwrap();
        // one of two array slots is still empty
        assert!(srb.unbound_resources().contains(&"g_Tex"));
        srb.bind(
            Stages::FRAGMENT,
            "g_Tex",
            1,
            Arc::new(NullResource::new("b")),
        )
        .unwrap();
        assert!(!srb.unbound_resources().contains(&"g_Tex"));
    }
}
