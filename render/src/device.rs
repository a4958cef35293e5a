//! Device capability queries consumed by description validation.

/// Kind of native API behind the device.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DeviceKind {
    D3D11,
    D3D12,
    Vulkan,
    Metal,
    OpenGl,
    /// Headless device with every feature enabled; used by tests and by
    /// serialization tooling that validates descriptions without a GPU.
    Null,
}

impl DeviceKind {
    pub fn is_d3d(self) -> bool {
        self == DeviceKind::D3D11 || self == DeviceKind::D3D12
    }

    pub fn is_metal(self) -> bool {
        self == DeviceKind::Metal
    }

    pub fn is_vulkan(self) -> bool {
        self == DeviceKind::Vulkan
    }
}

/// Optional device features that gate description flags.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DeviceFeatures {
    /// Shader stages are compiled and linked independently; without this a
    /// resource is implicitly shared between all stages of a program.
    pub separable_programs: bool,
    /// Runtime-sized shader resource arrays.
    pub shader_resource_runtime_arrays: bool,
    /// Ray tracing pipelines and acceleration structures.
    pub ray_tracing: bool,
    /// Mesh/task shader pipelines.
    pub mesh_shaders: bool,
}

impl DeviceFeatures {
    pub const ALL: DeviceFeatures = DeviceFeatures {
        separable_programs: true,
        shader_resource_runtime_arrays: true,
        ray_tracing: true,
        mesh_shaders: true,
    };

    pub const NONE: DeviceFeatures = DeviceFeatures {
        separable_programs: false,
        shader_resource_runtime_arrays: false,
        ray_tracing: false,
        mesh_shaders: false,
    };
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DeviceInfo {
    pub kind: DeviceKind,
    pub features: DeviceFeatures,
}

impl DeviceInfo {
    pub fn new(kind: DeviceKind, features: DeviceFeatures) -> DeviceInfo {
        DeviceInfo { kind, features }
    }

    /// The test/serialization device: no backend, everything enabled.
    pub fn null() -> DeviceInfo {
        DeviceInfo {
            kind: DeviceKind::Null,
            features: DeviceFeatures::ALL,
        }
    }
}
