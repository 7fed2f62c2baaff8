//! Configuration for PetalSonic Router

/// Per-controller spatialization tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialSettings {
    /// Multiplier applied to the listener/emitter distance before attenuation.
    pub distance_scale: f32,
    /// Multiplier applied to the radial relative velocity before the Doppler shift.
    /// 0.0 disables the Doppler effect.
    pub doppler_scale: f32,
}

impl Default for SpatialSettings {
    fn default() -> Self {
        Self {
            distance_scale: 1.0,
            doppler_scale: 1.0,
        }
    }
}

/// Configuration descriptor for an [`AudioRouter`](crate::AudioRouter).
#[derive(Debug, Clone)]
pub struct RouterDesc {
    /// Speed of sound in world units per second, used by the Doppler shift.
    pub speed_of_sound: f32,
    /// Distance below which a sound plays at full gain.
    pub reference_distance: f32,
    /// Upper bound of the Doppler pitch ratio; the lower bound is its inverse.
    pub max_doppler_shift: f32,
    /// Settings given to every newly created sound controller.
    pub default_spatial: SpatialSettings,
}

impl Default for RouterDesc {
    fn default() -> Self {
        Self {
            speed_of_sound: 343.0,
            reference_distance: 1.0,
            max_doppler_shift: 4.0,
            default_spatial: SpatialSettings::default(),
        }
    }
}

impl RouterDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn speed_of_sound(mut self, speed: f32) -> Self {
        self.speed_of_sound = speed;
        self
    }

    pub fn reference_distance(mut self, distance: f32) -> Self {
        self.reference_distance = distance;
        self
    }

    pub fn max_doppler_shift(mut self, ratio: f32) -> Self {
        self.max_doppler_shift = ratio;
        self
    }

    pub fn default_spatial(mut self, settings: SpatialSettings) -> Self {
        self.default_spatial = settings;
        self
    }

    /// Checks the values the spatializer divides by or clamps against.
    pub(crate) fn validate(&self) -> crate::error::Result<()> {
        if !(self.speed_of_sound > 0.0) {
            return Err(crate::error::RouterError::Configuration(format!(
                "speed_of_sound must be positive, got {}",
                self.speed_of_sound
            )));
        }
        if !(self.reference_distance > 0.0) {
            return Err(crate::error::RouterError::Configuration(format!(
                "reference_distance must be positive, got {}",
                self.reference_distance
            )));
        }
        if !(self.max_doppler_shift >= 1.0) {
            return Err(crate::error::RouterError::Configuration(format!(
                "max_doppler_shift must be at least 1.0, got {}",
                self.max_doppler_shift
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let desc = RouterDesc::new()
            .speed_of_sound(100.0)
            .reference_distance(2.0)
            .max_doppler_shift(2.0);
        assert_eq!(desc.speed_of_sound, 100.0);
        assert_eq!(desc.reference_distance, 2.0);
        assert_eq!(desc.max_doppler_shift, 2.0);
        assert_eq!(desc.default_spatial, SpatialSettings::default());
        assert!(desc.validate().is_ok());
    }

    #[test]
    fn rejects_degenerate_values() {
        assert!(RouterDesc::new().speed_of_sound(0.0).validate().is_err());
        assert!(RouterDesc::new().reference_distance(-1.0).validate().is_err());
        assert!(RouterDesc::new().max_doppler_shift(0.5).validate().is_err());
        assert!(RouterDesc::new().speed_of_sound(f32::NAN).validate().is_err());
    }
}
