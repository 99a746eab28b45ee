//! Core GPU context and device management.
//!
//! [`GpuContext`] bundles the wgpu device, its queue and the colour format
//! render pipelines are built for. It never owns a window: callers either
//! request a headless device with [`GpuContext::new_headless`] (or
//! [`GpuContext::new_noop`] where there is no adapter at all) or hand over
//! the parts they already created for their surface with
//! [`GpuContext::from_parts`].
//!
//! # Example
//!
//! ```no_run
//! use tessera::GpuContext;
//!
//! let gpu = GpuContext::new_headless()?;
//!
//! // Access device for creating resources
//! let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
//!     label: Some("My Buffer"),
//!     size: 64,
//!     usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
//!     mapped_at_creation: false,
//! });
//!
//! // Submit work via the queue
//! gpu.queue.write_buffer(&buffer, 0, &[0u8; 64]);
//! # Ok::<(), tessera::GpuError>(())
//! ```

/// Errors raised while acquiring a GPU.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("no suitable GPU adapter: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}

/// Core GPU context holding wgpu resources.
///
/// All fields are public to allow direct access to wgpu APIs when needed.
pub struct GpuContext {
    /// The logical GPU device for creating resources and pipelines.
    pub device: wgpu::Device,
    /// The command queue for submitting work to the GPU.
    pub queue: wgpu::Queue,
    /// Colour format of the render target pipelines are built for.
    pub format: wgpu::TextureFormat,
}

impl GpuContext {
    /// Colour format used when there is no surface to ask.
    pub const HEADLESS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    /// Create a GPU context with no surface.
    ///
    /// Hardware adapters on the primary backends are tried first, then any
    /// software adapter (llvmpipe, WARP) on every backend. The device is
    /// requested with default limits and no optional features, the smallest
    /// footprint wgpu offers.
    pub fn new_headless() -> Result<Self, GpuError> {
        let primary = wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        };
        match Self::request(&primary, false) {
            Err(GpuError::NoAdapter(err)) => {
                log::warn!("no hardware adapter ({err}), trying a software adapter");
                let all = wgpu::InstanceDescriptor {
                    backends: wgpu::Backends::all(),
                    ..Default::default()
                };
                Self::request(&all, true)
            }
            result => result,
        }
    }

    /// Create a context on wgpu's noop backend.
    ///
    /// Resource creation and validation behave as on a real device, but
    /// nothing is executed. Useful where no adapter exists at all, such as
    /// CI containers.
    pub fn new_noop() -> Result<Self, GpuError> {
        let noop = wgpu::InstanceDescriptor {
            backends: wgpu::Backends::NOOP,
            backend_options: wgpu::BackendOptions {
                noop: wgpu::NoopBackendOptions { enable: true },
                ..Default::default()
            },
            ..Default::default()
        };
        Self::request(&noop, false)
    }

    fn request(descriptor: &wgpu::InstanceDescriptor, force_fallback_adapter: bool) -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(descriptor);

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter,
        }))?;

        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Tessera Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
            experimental_features: Default::default(),
        }))?;

        Ok(Self::from_parts(device, queue, Self::HEADLESS_FORMAT))
    }

    /// Wrap a device and queue created elsewhere, typically alongside a
    /// window surface configured with `format`.
    pub fn from_parts(device: wgpu::Device, queue: wgpu::Queue, format: wgpu::TextureFormat) -> Self {
        Self {
            device,
            queue,
            format,
        }
    }
}

/// A device for tests: real hardware when present, the noop backend otherwise.
#[cfg(test)]
pub(crate) fn test_context() -> GpuContext {
    GpuContext::new_headless()
        .or_else(|err| {
            eprintln!("no adapter ({err}), running on the noop backend");
            GpuContext::new_noop()
        })
        .expect("the noop backend needs no hardware")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_backend_is_always_available() {
        let gpu = GpuContext::new_noop().unwrap();
        assert_eq!(gpu.format, GpuContext::HEADLESS_FORMAT);
        let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Noop Buffer"),
            size: 64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        gpu.queue.write_buffer(&buffer, 0, &[0u8; 64]);
        assert_eq!(buffer.size(), 64);
    }

    #[test]
    fn test_context_never_skips() {
        let gpu = test_context();
        assert_eq!(gpu.format, GpuContext::HEADLESS_FORMAT);
    }
}
