//! Transmon device elements.
//!
//! A `TransmonElement` holds the calibration parameters of one physical
//! qubit. Elements are created with defaults at bringup and optionally
//! hydrated from a settings snapshot of a prior experiment. They live for
//! the whole session once registered with the quantum device.

use serde::{Deserialize, Serialize};

use crate::validation;

/// Calibration parameters of a transmon qubit.
///
/// Frequencies in Hz, amplitudes as fractions of full scale, times in
/// seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransmonParams {
    /// Qubit drive (01 transition) frequency.
    pub clock_freq: f64,
    /// Readout resonator frequency.
    pub ro_freq: f64,
    /// Transmon anharmonicity (negative for a transmon).
    pub anharmonicity: f64,
    /// Pi-pulse amplitude.
    pub mw_amp180: f64,
    /// Readout pulse amplitude.
    pub ro_amp: f64,
    /// Readout integration time.
    pub ro_integration_time: f64,
}

impl Default for TransmonParams {
    fn default() -> Self {
        Self {
            clock_freq: 0.0,
            ro_freq: 0.0,
            anharmonicity: -300e6,
            mw_amp180: 0.0,
            ro_amp: 0.0,
            ro_integration_time: 1e-6,
        }
    }
}

impl TransmonParams {
    /// Check that hydrated parameters are physically sensible.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("clock_freq", self.clock_freq),
            ("ro_freq", self.ro_freq),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{name} must be non-negative and finite"));
            }
        }
        validation::is_in_range(self.mw_amp180, 0.0..=1.0)
            .map_err(|e| format!("mw_amp180: {e}"))?;
        validation::is_in_range(self.ro_amp, 0.0..=1.0).map_err(|e| format!("ro_amp: {e}"))?;
        if !(self.ro_integration_time.is_finite() && self.ro_integration_time > 0.0) {
            return Err("ro_integration_time must be positive and finite".to_string());
        }
        Ok(())
    }
}

/// One physical qubit as seen by the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransmonElement {
    name: String,
    params: TransmonParams,
}

impl TransmonElement {
    /// An element named `name` with default parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: TransmonParams::default(),
        }
    }

    /// The element's registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The element's current calibration parameters.
    pub fn params(&self) -> &TransmonParams {
        &self.params
    }

    /// Replace the calibration parameters after validating them.
    pub fn apply_params(&mut self, params: TransmonParams) -> Result<(), String> {
        params.validate()?;
        self.params = params;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(TransmonParams::default().validate().is_ok());
    }

    #[test]
    fn hydrated_params_applied() {
        let mut element = TransmonElement::new("q00");
        let params = TransmonParams {
            clock_freq: 5.312e9,
            ro_freq: 7.197e9,
            mw_amp180: 0.18,
            ro_amp: 0.06,
            ..TransmonParams::default()
        };
        element.apply_params(params.clone()).unwrap();
        assert_eq!(element.params(), &params);
    }

    #[test]
    fn out_of_range_params_rejected() {
        let mut element = TransmonElement::new("q00");
        let before = element.params().clone();

        let bad = TransmonParams {
            mw_amp180: 1.5,
            ..TransmonParams::default()
        };
        assert!(element.apply_params(bad).is_err());
        // A rejected snapshot must not half-apply
        assert_eq!(element.params(), &before);

        let nan = TransmonParams {
            clock_freq: f64::NAN,
            ..TransmonParams::default()
        };
        assert!(element.apply_params(nan).is_err());
    }
}
