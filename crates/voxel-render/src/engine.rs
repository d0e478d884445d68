//! Device setup and validation scopes.

use pollster::FutureExt;
use voxel_core::ResourceLedger;

use crate::error::{RenderError, RenderResult};

/// A wgpu device and queue plus the ledger tracking what is allocated on
/// them.
#[derive(Debug, Clone)]
pub struct GpuContext {
    /// The wgpu device.
    pub device: wgpu::Device,
    /// The wgpu queue.
    pub queue: wgpu::Queue,
    /// Live resource counters.
    pub ledger: ResourceLedger,
}

impl GpuContext {
    /// Wraps an existing device, for embedding into a host application that
    /// owns the window and surface.
    pub fn from_device(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            ledger: ResourceLedger::new(),
        }
    }

    /// Creates a device with no presentation surface.
    pub async fn new_headless() -> RenderResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..wgpu::InstanceDescriptor::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| RenderError::AdapterCreationFailed)?;

        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("voxel device (headless)"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await?;

        Ok(Self::from_device(device, queue))
    }

    /// Blocking form of [`GpuContext::new_headless`].
    pub fn new_headless_blocking() -> RenderResult<Self> {
        Self::new_headless().block_on()
    }

    /// Device limits.
    pub fn limits(&self) -> wgpu::Limits {
        self.device.limits()
    }

    /// Runs `f` inside a validation error scope and returns its result along
    /// with the first validation error raised, if any.
    pub fn validation_scope<T>(&self, f: impl FnOnce(&wgpu::Device) -> T) -> (T, Option<wgpu::Error>) {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f(&self.device);
        let error = self.device.pop_error_scope().block_on();
        (value, error)
    }

    /// Like [`GpuContext::validation_scope`], converting an error with `map`.
    pub fn validated<T>(
        &self,
        map: impl FnOnce(String) -> RenderError,
        f: impl FnOnce(&wgpu::Device) -> T,
    ) -> RenderResult<T> {
        match self.validation_scope(f) {
            (value, None) => Ok(value),
            (_, Some(error)) => Err(map(error.to_string())),
        }
    }

    /// Blocks until all submitted work has finished.
    pub fn wait_idle(&self) {
        if let Err(e) = self.device.poll(wgpu::PollType::wait_indefinitely()) {
            log::warn!("device poll failed: {e}");
        }
    }
}
