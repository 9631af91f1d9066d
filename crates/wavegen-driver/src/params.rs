// SPDX-License-Identifier: AGPL-3.0-only

//! Per-channel waveform parameters and presets

use wavegen_chip::WaveformMode;

/// Phase offset domain in 0.01° units (±180°)
pub const PHASE_LIMIT: i16 = 18_000;

/// Frequency of the built-in presets: 1 kHz in 100 µHz units
pub const PRESET_FREQUENCY: u32 = 10_000_000;

/// Full-scale amplitude
pub const FULL_AMPLITUDE: u16 = 32_767;

/// 50 % duty cycle
pub const HALF_DUTY: u16 = 32_768;

/// Everything one channel needs to produce a waveform.
///
/// The default is the power-on state: DC, all fields zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelParameters {
    /// Waveform shape
    pub mode: WaveformMode,
    /// Frequency in 100 µHz units (10_000_000 = 1 kHz)
    pub frequency: u32,
    /// Amplitude, 0–32767
    pub amplitude: u16,
    /// Signed DC offset
    pub offset: i16,
    /// Duty cycle, 0–65535 maps linearly to 0–100 %
    pub duty_cycle: u16,
    /// Phase offset in 0.01° units, [-18000, 18000]
    pub phase_offset: i16,
    /// Burst length in cycles, 0 = continuous
    pub cycles: u16,
}

impl ChannelParameters {
    /// Full-amplitude, continuous 1 kHz waveform of `mode`
    #[must_use]
    pub const fn preset_1khz(mode: WaveformMode) -> Self {
        Self {
            mode,
            frequency: PRESET_FREQUENCY,
            amplitude: FULL_AMPLITUDE,
            offset: 0,
            duty_cycle: HALF_DUTY,
            phase_offset: 0,
            cycles: 0,
        }
    }

    /// Frequency in hertz
    #[must_use]
    pub fn frequency_hz(&self) -> f64 {
        f64::from(self.frequency) * 1e-4
    }

    /// Duty cycle in percent
    #[must_use]
    pub fn duty_percent(&self) -> f64 {
        f64::from(self.duty_cycle) * 100.0 / 65_535.0
    }

    /// Phase offset in degrees
    #[must_use]
    pub fn phase_degrees(&self) -> f64 {
        f64::from(self.phase_offset) / 100.0
    }
}

/// Frequency in hertz to 100 µHz register units, saturating at the register maximum
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn hz_to_units(hz: f64) -> u32 {
    (hz * 1e4).round().clamp(0.0, f64::from(u32::MAX)) as u32
}

/// Duty cycle percentage to register units, clamped to 0–100 %
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn duty_from_percent(percent: f64) -> u16 {
    (percent.clamp(0.0, 100.0) * 65_535.0 / 100.0).round() as u16
}

/// Degrees to 0.01° phase units, saturating at the `i16` range
///
/// No domain check; values past ±180° are rejected when staged.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn phase_from_degrees(degrees: f64) -> i16 {
    (degrees * 100.0)
        .round()
        .clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
}

/// Built-in 1 kHz presets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// 1 kHz sine
    Sine1k,
    /// 1 kHz square, 50 % duty
    Square1k,
    /// 1 kHz triangle
    Triangle1k,
    /// 1 kHz sawtooth
    Sawtooth1k,
}

impl Preset {
    /// Parameters the preset configures
    #[must_use]
    pub const fn parameters(self) -> ChannelParameters {
        ChannelParameters::preset_1khz(match self {
            Self::Sine1k => WaveformMode::Sine,
            Self::Square1k => WaveformMode::Square,
            Self::Triangle1k => WaveformMode::Triangle,
            Self::Sawtooth1k => WaveformMode::Sawtooth,
        })
    }
}

impl std::str::FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sine" | "sine1k" => Ok(Self::Sine1k),
            "square" | "square1k" => Ok(Self::Square1k),
            "triangle" | "triangle1k" => Ok(Self::Triangle1k),
            "sawtooth" | "sawtooth1k" => Ok(Self::Sawtooth1k),
            other => Err(format!("unknown preset '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_on_defaults() {
        let p = ChannelParameters::default();
        assert_eq!(p.mode, WaveformMode::Dc);
        assert_eq!(p.frequency, 0);
        assert_eq!(p.cycles, 0);
    }

    #[test]
    fn presets_are_1khz_full_scale() {
        let p = Preset::Square1k.parameters();
        assert_eq!(p.mode, WaveformMode::Square);
        assert_eq!(p.frequency, 10_000_000);
        assert_eq!(p.amplitude, 32_767);
        assert_eq!(p.duty_cycle, 32_768);
        assert!((p.frequency_hz() - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn unit_conversions() {
        assert_eq!(hz_to_units(1000.0), 10_000_000);
        assert_eq!(hz_to_units(-5.0), 0);
        assert_eq!(hz_to_units(1e12), u32::MAX);
        let p = ChannelParameters {
            phase_offset: -9000,
            duty_cycle: 65_535,
            ..ChannelParameters::default()
        };
        assert!((p.phase_degrees() + 90.0).abs() < 1e-9);
        assert!((p.duty_percent() - 100.0).abs() < 1e-9);

        assert_eq!(duty_from_percent(50.0), 32_768);
        assert_eq!(duty_from_percent(250.0), 65_535);
        assert_eq!(phase_from_degrees(-90.0), -9_000);
        assert_eq!(phase_from_degrees(400.0), i16::MAX);
    }
}
