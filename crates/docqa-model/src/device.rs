use candle_core::Device;
use docqa_core::DevicePreference;
use tracing::{info, warn};

pub fn select_device(preference: DevicePreference) -> Device {
    if preference != DevicePreference::Cpu {
        #[cfg(feature = "cuda")]
        {
            if let Ok(dev) = Device::new_cuda(0) { info!("🚀 Device: CUDA"); return dev; }
        }
        #[cfg(feature = "metal")]
        {
            if let Ok(dev) = Device::new_metal(0) { info!("🚀 Device: Metal (MPS)"); return dev; }
        }
        if preference == DevicePreference::Gpu { warn!("GPU requested but none is available; falling back to CPU"); }
    }
    info!("🖥️  Device: CPU");
    Device::Cpu
}
