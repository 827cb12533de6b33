//! One-shot hardware peripheral initialization.
//!
//! Configures the wake input GPIOs and the battery ADC channel using raw
//! ESP-IDF sys calls.  Called once per boot from `main()` before the
//! first episode.  Host builds read from atomics that tests can drive.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, AtomicU64, Ordering};

use crate::config::SystemConfig;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    /// The configured pin has no ADC1 channel.
    NotAnAdcPin(u8),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::NotAnAdcPin(pin) => write!(f, "GPIO{} is not an ADC1 pin", pin),
        }
    }
}

#[cfg(target_os = "espidf")]
use log::info;

/// ADC1 channel wired to `gpio` on the classic ESP32.
pub const fn adc1_channel(gpio: u8) -> Option<u32> {
    match gpio {
        36 => Some(0),
        37 => Some(1),
        38 => Some(2),
        39 => Some(3),
        32 => Some(4),
        33 => Some(5),
        34 => Some(6),
        35 => Some(7),
        _ => None,
    }
}

#[cfg(target_os = "espidf")]
pub fn init_peripherals(config: &SystemConfig) -> Result<(), HwInitError> {
    let channel = adc1_channel(config.pin_vbat).ok_or(HwInitError::NotAnAdcPin(config.pin_vbat))?;
    // SAFETY: Called once from main() before the first episode; single-threaded.
    unsafe {
        init_gpio_inputs(config)?;
        init_adc(channel)?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals(config: &SystemConfig) -> Result<(), HwInitError> {
    adc1_channel(config.pin_vbat).ok_or(HwInitError::NotAnAdcPin(config.pin_vbat))?;
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// episode's ADC read path.  No concurrent access is possible because
/// `init_adc()` completes before the first episode starts.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc(channel: u32) -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), channel, &chan_cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    info!("hw_init: ADC1 configured (CH{}=vbat)", channel);
    Ok(())
}

/// One raw 12-bit conversion.  `None` if the driver reports an error.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Option<u16> {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract, single-threaded episode access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return None;
    }
    Some(raw.clamp(0, 4095) as u16)
}

#[cfg(not(target_os = "espidf"))]
static SIM_ADC: [AtomicU16; 8] = [const { AtomicU16::new(0) }; 8];

/// Inject a raw ADC1 value.  `u16::MAX` simulates a driver error.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc(channel: u32, raw: u16) {
    if let Some(slot) = SIM_ADC.get(channel as usize) {
        slot.store(raw, Ordering::Relaxed);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(channel: u32) -> Option<u16> {
    let raw = SIM_ADC.get(channel as usize)?.load(Ordering::Relaxed);
    (raw != u16::MAX).then_some(raw.min(4095))
}

// ── GPIO Inputs ───────────────────────────────────────────────

/// Wake inputs have external pull-downs; the internal ones stay off so
/// the pads draw nothing while the switches are open.
#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs(config: &SystemConfig) -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: (1u64 << config.pin_letter)
            | (1u64 << config.pin_parcel)
            | (1u64 << config.pin_motion),
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }

    info!(
        "hw_init: wake inputs configured (letter={}, parcel={}, motion={})",
        config.pin_letter, config.pin_parcel, config.pin_motion
    );
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: u8) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured input pin; safe to call from main context.
    (unsafe { gpio_get_level(i32::from(pin)) }) != 0
}

#[cfg(not(target_os = "espidf"))]
static SIM_GPIO_LEVELS: AtomicU64 = AtomicU64::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_gpio(pin: u8, high: bool) {
    let bit = 1u64 << pin;
    if high {
        SIM_GPIO_LEVELS.fetch_or(bit, Ordering::Relaxed);
    } else {
        SIM_GPIO_LEVELS.fetch_and(!bit, Ordering::Relaxed);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(pin: u8) -> bool {
    SIM_GPIO_LEVELS.load(Ordering::Relaxed) & (1u64 << pin) != 0
}
