//! # Fatigue Load Spectra
//!
//! A load spectrum lists, per hub load channel, the load range reached or
//! exceeded by a cumulative number of cycles. Bins are stored ascending in
//! cycle count, so ranges are non-increasing along each channel.
//!
//! ## Synthesized Spectra
//!
//! Without simulated load histories the spectrum is synthesized from the wind
//! climate with the DS472 simplified method:
//!
//! ```text
//! p₀  = 4/3·ρ·((4π·n·R/3)² + V_r²) · πR / (B·λ·√(λ²+1))   line pressure
//! N_f = avail·B·n·T·(e^{-(V_in/A)^k} - e^{-(V_out/A)^k})   characteristic cycles
//! β   = 0.11·k_b·(I_t + 0.1)·(A + 4.4)
//! F(N) = β·(log N_f - log N) + 0.18                        standardized range
//! ```
//!
//! with `n` in rev/s. F is scaled per channel by the line pressure, a power of
//! the rotor radius and a regression in `ln D`. Shear channels carry no
//! stochastic range. All channels share one cycle axis.
//!
//! ## External Spectra
//!
//! Six independent (magnitude, count) array pairs from an aeroelastic load
//! analysis. Each channel keeps its own cycle axis.
//!
//! ## Example
//!
//! ```rust
//! use shaft_core::config::SpectrumSettings;
//! use shaft_core::loads::{LoadChannel, LoadSpectrum, RatedOperation, WindClimate};
//!
//! let op = RatedOperation {
//!     rotor_diameter_m: 126.0,
//!     blade_number: 3,
//!     rated_speed_rpm: 12.1,
//!     machine_rating_kw: 5000.0,
//!     drivetrain_efficiency: 0.944,
//! };
//! let spectrum = LoadSpectrum::synthesize(&op, &WindClimate::default(), &SpectrumSettings::default()).unwrap();
//!
//! let my = spectrum.channel(LoadChannel::My);
//! assert_eq!(my.counts.len(), 100);
//! assert!(my.ranges[0] >= my.ranges[99]);
//! assert!(spectrum.channel(LoadChannel::Fz).is_degenerate());
//! ```

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::wind::{RatedOperation, WindClimate};
use super::LoadChannel;
use crate::config::SpectrumSettings;
use crate::errors::{CalcError, CalcResult};
use crate::numeric;

/// Where a spectrum came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpectrumSource {
    /// DS472 synthesis: channels share one cycle axis and combine per bin
    Synthesized,
    /// Supplied arrays: channels have independent cycle axes
    External,
}

/// Range/count bins of one channel, ascending in count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpectrum {
    pub channel: LoadChannel,
    /// Load ranges (N or N·m)
    pub ranges: Vec<f64>,
    /// Cumulative cycle counts
    pub counts: Vec<f64>,
}

impl ChannelSpectrum {
    /// A channel that cannot contribute damage: fewer than two bins, or no
    /// non-zero range or count
    pub fn is_degenerate(&self) -> bool {
        self.counts.len() < 2
            || self.ranges.iter().all(|r| *r == 0.0)
            || self.counts.iter().all(|n| *n == 0.0)
    }
}

/// One channel of an externally supplied spectrum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrumArrays {
    /// Load ranges (N or N·m)
    pub magnitudes: Vec<f64>,
    /// Cycle counts
    pub counts: Vec<f64>,
}

/// Six externally supplied channels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalSpectrum {
    pub fx: SpectrumArrays,
    pub fy: SpectrumArrays,
    pub fz: SpectrumArrays,
    pub mx: SpectrumArrays,
    pub my: SpectrumArrays,
    pub mz: SpectrumArrays,
}

impl ExternalSpectrum {
    pub fn arrays(&self, channel: LoadChannel) -> &SpectrumArrays {
        match channel {
            LoadChannel::Fx => &self.fx,
            LoadChannel::Fy => &self.fy,
            LoadChannel::Fz => &self.fz,
            LoadChannel::Mx => &self.mx,
            LoadChannel::My => &self.my,
            LoadChannel::Mz => &self.mz,
        }
    }

    /// Check lengths, finiteness and signs of every channel.
    pub fn validate(&self) -> CalcResult<()> {
        for channel in LoadChannel::ALL {
            let arrays = self.arrays(channel);
            let field = format!("external_spectrum.{}", channel.code().to_lowercase());
            if arrays.magnitudes.len() != arrays.counts.len() {
                return Err(CalcError::invalid_input(
                    field,
                    format!("{} magnitudes, {} counts", arrays.magnitudes.len(), arrays.counts.len()),
                    "Magnitude and count arrays must have equal length",
                ));
            }
            let bad = arrays
                .magnitudes
                .iter()
                .chain(arrays.counts.iter())
                .find(|v| !(v.is_finite() && **v >= 0.0));
            if let Some(value) = bad {
                return Err(CalcError::invalid_input(
                    field,
                    value.to_string(),
                    "Spectrum values must be finite and non-negative",
                ));
            }
        }
        Ok(())
    }

    /// Largest count over all channels
    pub fn max_count(&self) -> f64 {
        LoadChannel::ALL
            .iter()
            .flat_map(|c| self.arrays(*c).counts.iter().copied())
            .fold(0.0, f64::max)
    }
}

/// Fatigue load spectrum for all six hub channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadSpectrum {
    pub source: SpectrumSource,
    /// Channels in [`LoadChannel::ALL`] order
    pub channels: Vec<ChannelSpectrum>,
    /// Mean thrust (N)
    pub fx_mean: f64,
    /// Mean torque (N·m)
    pub mx_mean: f64,
    /// Characteristic cycle count N_f
    pub characteristic_cycles: f64,
    /// Rotor revolutions over the design life
    pub rotor_revolutions: f64,
}

/// Regression factor on the DS472 channel scale, clamped at zero for small rotors
fn channel_factor(channel: LoadChannel, rotor_diameter_m: f64) -> f64 {
    let ln_d = rotor_diameter_m.ln();
    let factor = match channel {
        LoadChannel::Fx => 0.3649 * ln_d - 1.074,
        LoadChannel::Mx => 0.0799 * ln_d - 0.2577,
        LoadChannel::My => 0.172 * ln_d - 0.5943,
        LoadChannel::Mz => 0.1659 * ln_d - 0.5795,
        LoadChannel::Fy | LoadChannel::Fz => 0.0,
    };
    factor.max(0.0)
}

impl LoadSpectrum {
    /// Synthesize the DS472 spectrum for a rotor in a wind climate.
    pub fn synthesize(
        op: &RatedOperation,
        climate: &WindClimate,
        settings: &SpectrumSettings,
    ) -> CalcResult<Self> {
        op.validate()?;
        climate.validate()?;

        let radius = op.rotor_diameter_m / 2.0;
        let blades = op.blade_number as f64;
        let tsr = op.tip_speed_ratio(climate.rated_m_s);
        let rev_per_s = op.rated_speed_rpm / 60.0;

        let line_pressure = 4.0 / 3.0
            * settings.air_density
            * ((4.0 * PI * rev_per_s * radius / 3.0).powi(2) + climate.rated_m_s.powi(2))
            * (PI * radius / (blades * tsr * (tsr * tsr + 1.0).sqrt()));
        let line_pressure = numeric::ensure_finite(line_pressure, "line_pressure")?;

        let n_f = op.characteristic_cycles(climate, settings.seconds_per_year);
        if !(n_f.is_finite() && n_f >= 1.0) {
            return Err(CalcError::invalid_input(
                "characteristic_cycles",
                n_f.to_string(),
                "Wind climate yields less than one load cycle",
            ));
        }

        let k_b = settings.k_b;
        let beta = 0.11 * k_b * (climate.turbulence_class.intensity() + 0.1) * (climate.weibull_scale_m_s + 4.4);
        let log_nf = n_f.log10();
        let log_start = log_nf - (2.0 * k_b - 0.18) / beta;

        let counts: Vec<f64> = numeric::logspace(log_start, log_nf, settings.bins)
            .into_iter()
            .map(f64::ceil)
            .collect();
        let standardized: Vec<f64> = counts
            .iter()
            .map(|n| {
                let f = beta * (log_nf - n.log10()) + 0.18;
                if f >= 2.0 * k_b {
                    0.0
                } else {
                    f.max(0.0)
                }
            })
            .collect();

        let scale = |channel: LoadChannel| -> f64 {
            let factor = channel_factor(channel, op.rotor_diameter_m);
            match channel {
                LoadChannel::Fx => 0.5 * line_pressure * radius * factor,
                LoadChannel::Mx => 0.45 * line_pressure * radius.powi(2) * factor,
                LoadChannel::My | LoadChannel::Mz => 0.33 * line_pressure * settings.k_r * radius.powi(2) * factor,
                LoadChannel::Fy | LoadChannel::Fz => 0.0,
            }
        };

        let channels = LoadChannel::ALL
            .iter()
            .map(|&channel| {
                let s = scale(channel);
                ChannelSpectrum {
                    channel,
                    ranges: standardized.iter().map(|f| f * s).collect(),
                    counts: counts.clone(),
                }
            })
            .collect();

        let fx_mean = 0.5 * line_pressure * radius * blades * channel_factor(LoadChannel::Fx, op.rotor_diameter_m);
        let mx_mean = 0.5 * op.rated_torque() * channel_factor(LoadChannel::Mx, op.rotor_diameter_m);

        tracing::debug!(
            line_pressure,
            characteristic_cycles = n_f,
            beta,
            fx_mean,
            mx_mean,
            "synthesized load spectrum"
        );

        Ok(LoadSpectrum {
            source: SpectrumSource::Synthesized,
            channels,
            fx_mean,
            mx_mean,
            characteristic_cycles: n_f,
            rotor_revolutions: n_f / blades,
        })
    }

    /// Build from supplied arrays, sorting each channel by ascending count.
    ///
    /// `rotor_revolutions` comes from the wind climate when one is known;
    /// otherwise the largest count divided by the blade number is used.
    pub fn from_external(
        external: &ExternalSpectrum,
        rotor_revolutions: Option<f64>,
        blade_number: u32,
    ) -> CalcResult<Self> {
        external.validate()?;
        if blade_number == 0 {
            return Err(CalcError::invalid_input("blade_number", "0", "At least one blade is required"));
        }

        let channels: Vec<ChannelSpectrum> = LoadChannel::ALL
            .iter()
            .map(|&channel| {
                let arrays = external.arrays(channel);
                let mut bins: Vec<(f64, f64)> = arrays
                    .counts
                    .iter()
                    .copied()
                    .zip(arrays.magnitudes.iter().copied())
                    .collect();
                bins.sort_by(|a, b| a.0.total_cmp(&b.0));
                ChannelSpectrum {
                    channel,
                    ranges: bins.iter().map(|(_, r)| *r).collect(),
                    counts: bins.iter().map(|(n, _)| *n).collect(),
                }
            })
            .collect();

        let max_count = external.max_count();
        let revolutions = match rotor_revolutions {
            Some(n) if n.is_finite() && n > 0.0 => n,
            _ => max_count / blade_number as f64,
        };

        Ok(LoadSpectrum {
            source: SpectrumSource::External,
            channels,
            fx_mean: 0.0,
            mx_mean: 0.0,
            characteristic_cycles: max_count,
            rotor_revolutions: revolutions,
        })
    }

    /// Bins of one channel
    pub fn channel(&self, channel: LoadChannel) -> &ChannelSpectrum {
        &self.channels[channel.index()]
    }

    /// Whether all channels share one cycle axis
    pub fn is_shared_axis(&self) -> bool {
        self.source == SpectrumSource::Synthesized
    }

    /// Copy with every stochastic range set to zero; means and counts kept
    pub fn without_ranges(&self) -> Self {
        let mut quiet = self.clone();
        for channel in &mut quiet.channels {
            channel.ranges.iter_mut().for_each(|r| *r = 0.0);
        }
        quiet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn five_mw() -> RatedOperation {
        RatedOperation {
            rotor_diameter_m: 126.0,
            blade_number: 3,
            rated_speed_rpm: 12.1,
            machine_rating_kw: 5000.0,
            drivetrain_efficiency: 0.944,
        }
    }

    fn reference() -> LoadSpectrum {
        LoadSpectrum::synthesize(&five_mw(), &WindClimate::default(), &SpectrumSettings::default()).unwrap()
    }

    #[test]
    fn test_synthesized_shape() {
        let spectrum = reference();
        assert_eq!(spectrum.channels.len(), 6);
        assert!(spectrum.is_shared_axis());
        for channel in &spectrum.channels {
            assert_eq!(channel.counts.len(), 100);
            assert_eq!(channel.counts, spectrum.channel(LoadChannel::Fx).counts);
        }
        let counts = &spectrum.channel(LoadChannel::Fx).counts;
        assert!((counts[99] - spectrum.characteristic_cycles.ceil()).abs() <= 1.0);
        assert!(counts.iter().all(|n| n.fract() == 0.0));
    }

    #[test]
    fn test_characteristic_cycles_magnitude() {
        // ~0.95·0.6 Hz·20 yr·0.869 of operation ≈ 3.1e8 blade passages
        let spectrum = reference();
        assert!(spectrum.characteristic_cycles > 2.5e8 && spectrum.characteristic_cycles < 3.5e8);
        assert!((spectrum.rotor_revolutions - spectrum.characteristic_cycles / 3.0).abs() < 1.0);
    }

    #[test]
    fn test_shear_channels_are_zero() {
        let spectrum = reference();
        assert!(spectrum.channel(LoadChannel::Fy).is_degenerate());
        assert!(spectrum.channel(LoadChannel::Fz).is_degenerate());
        assert!(!spectrum.channel(LoadChannel::My).is_degenerate());
    }

    #[test]
    fn test_last_bin_range_is_floor() {
        let spectrum = reference();
        let fx = spectrum.channel(LoadChannel::Fx);
        let my = spectrum.channel(LoadChannel::My);
        // F(N_f) = 0.18 at the highest count
        let ratio = fx.ranges[99] / my.ranges[99];
        let expected = (0.5 * 63.0 * channel_factor(LoadChannel::Fx, 126.0))
            / (0.33 * 0.8 * 63.0 * 63.0 * channel_factor(LoadChannel::My, 126.0));
        assert!((ratio - expected).abs() / expected < 1e-9);
    }

    #[test]
    fn test_means() {
        let spectrum = reference();
        let torque = five_mw().rated_torque();
        let expected = 0.5 * torque * (0.0799 * 126f64.ln() - 0.2577);
        assert!((spectrum.mx_mean - expected).abs() < 1e-6);
        assert!(spectrum.fx_mean > 0.0);
    }

    #[test]
    fn test_small_rotor_factors_clamp() {
        assert_eq!(channel_factor(LoadChannel::Fx, 10.0), 0.0);
        assert!(channel_factor(LoadChannel::Fx, 126.0) > 0.0);
    }

    #[test]
    fn test_zero_weibull_scale() {
        let climate = WindClimate {
            weibull_scale_m_s: 0.0,
            ..WindClimate::default()
        };
        let err = LoadSpectrum::synthesize(&five_mw(), &climate, &SpectrumSettings::default()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_external_sorted_and_revolutions() {
        let external = ExternalSpectrum {
            my: SpectrumArrays {
                magnitudes: vec![1.0e6, 5.0e6, 2.0e6],
                counts: vec![1.0e7, 1.0e3, 1.0e5],
            },
            ..ExternalSpectrum::default()
        };
        let spectrum = LoadSpectrum::from_external(&external, None, 3).unwrap();
        let my = spectrum.channel(LoadChannel::My);
        assert_eq!(my.counts, vec![1.0e3, 1.0e5, 1.0e7]);
        assert_eq!(my.ranges, vec![5.0e6, 2.0e6, 1.0e6]);
        assert!((spectrum.rotor_revolutions - 1.0e7 / 3.0).abs() < 1e-6);
        assert!(spectrum.channel(LoadChannel::Fx).is_degenerate());
        assert!(!spectrum.is_shared_axis());

        let with_climate = LoadSpectrum::from_external(&external, Some(1.0e8), 3).unwrap();
        assert_eq!(with_climate.rotor_revolutions, 1.0e8);
    }

    #[test]
    fn test_external_validation() {
        let mismatched = ExternalSpectrum {
            fx: SpectrumArrays {
                magnitudes: vec![1.0, 2.0],
                counts: vec![1.0],
            },
            ..ExternalSpectrum::default()
        };
        assert!(LoadSpectrum::from_external(&mismatched, None, 3).is_err());

        let negative = ExternalSpectrum {
            mx: SpectrumArrays {
                magnitudes: vec![-1.0],
                counts: vec![1.0],
            },
            ..ExternalSpectrum::default()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_without_ranges() {
        let quiet = reference().without_ranges();
        assert!(quiet.channels.iter().all(ChannelSpectrum::is_degenerate));
        assert!(quiet.mx_mean > 0.0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::loads::wind::TurbulenceClass;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn synthesized_bins_are_monotone(
            diameter in 40.0f64..200.0,
            scale in 4.0f64..12.0,
            shape in 1.2f64..3.5,
            class_index in 0usize..3,
        ) {
            let op = RatedOperation {
                rotor_diameter_m: diameter,
                blade_number: 3,
                rated_speed_rpm: 1200.0 / diameter,
                machine_rating_kw: 0.3 * diameter * diameter,
                drivetrain_efficiency: 0.95,
            };
            let climate = WindClimate {
                weibull_scale_m_s: scale,
                weibull_shape: shape,
                turbulence_class: TurbulenceClass::ALL[class_index],
                ..WindClimate::default()
            };
            let spectrum = LoadSpectrum::synthesize(&op, &climate, &SpectrumSettings::default()).unwrap();
            for channel in &spectrum.channels {
                for pair in channel.counts.windows(2) {
                    prop_assert!(pair[0] <= pair[1]);
                }
                for pair in channel.ranges.windows(2) {
                    prop_assert!(pair[0] >= pair[1]);
                }
                prop_assert!(channel.ranges.iter().all(|r| r.is_finite() && *r >= 0.0));
            }
        }
    }
}
