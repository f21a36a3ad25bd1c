use candle_core::Device;
use tracing::info;

/// Pick the compute device. `APP_FORCE_CPU=1` skips accelerators even when
/// the `metal` feature is compiled in.
pub fn select_device() -> Device {
    let force_cpu = std::env::var("APP_FORCE_CPU").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
    if !force_cpu {
        if let Some(dev) = accelerator() {
            return dev;
        }
    }
    info!(device = "cpu", "Selected compute device");
    Device::Cpu
}

#[cfg(feature = "metal")]
fn accelerator() -> Option<Device> {
    match Device::new_metal(0) {
        Ok(dev) => {
            info!(device = "metal", "Selected compute device");
            Some(dev)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Metal unavailable; using CPU");
            None
        }
    }
}

#[cfg(not(feature = "metal"))]
fn accelerator() -> Option<Device> {
    None
}
