use crate::routine::Routine;

/// Settings of the demo program: which routine to run, for how long, and
/// how the scene is framed.
///
/// # Example
///
/// ```
/// use tessera::{DemoConfig, Routine};
///
/// let config = DemoConfig::new()
///     .routine(Routine::ColouredSphere)
///     .period(12.0)
///     .sphere_slices(64);
/// assert_eq!(config.near, 0.1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DemoConfig {
    pub routine: Routine,
    /// Run time in seconds.
    pub period: f32,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Distance from the camera to the origin along the view axis.
    pub camera_distance: f32,
    pub cube_scale: f32,
    pub sphere_slices: u32,
    pub sphere_radius: f32,
    /// Rotation added per frame, in degrees.
    pub degrees_per_frame: f32,
    /// Vertical drift per frame.
    pub rise_per_frame: f32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            routine: Routine::Triangle,
            period: 5.0,
            fov: 45.0,
            near: 0.1,
            far: 100.0,
            camera_distance: 5.0,
            cube_scale: 2.0,
            sphere_slices: 350,
            sphere_radius: 1.0,
            degrees_per_frame: 1.0,
            rise_per_frame: 0.0,
        }
    }
}

impl DemoConfig {
    /// Below this the period is ignored and the previous value kept.
    pub const MIN_PERIOD: f32 = 0.001;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn routine(mut self, routine: Routine) -> Self {
        self.routine = routine;
        self
    }

    /// Sets the run time. Values not above [`Self::MIN_PERIOD`] are ignored.
    pub fn period(mut self, seconds: f32) -> Self {
        if seconds > Self::MIN_PERIOD {
            self.period = seconds;
        } else {
            log::warn!("ignoring display period {seconds}s, keeping {}s", self.period);
        }
        self
    }

    pub fn projection(mut self, fov: f32, near: f32, far: f32) -> Self {
        self.fov = fov;
        self.near = near;
        self.far = far;
        self
    }

    pub fn camera_distance(mut self, distance: f32) -> Self {
        self.camera_distance = distance;
        self
    }

    pub fn cube_scale(mut self, scale: f32) -> Self {
        self.cube_scale = scale;
        self
    }

    pub fn sphere_slices(mut self, slices: u32) -> Self {
        self.sphere_slices = slices;
        self
    }

    pub fn sphere_radius(mut self, radius: f32) -> Self {
        self.sphere_radius = radius;
        self
    }

    pub fn motion(mut self, degrees_per_frame: f32, rise_per_frame: f32) -> Self {
        self.degrees_per_frame = degrees_per_frame;
        self.rise_per_frame = rise_per_frame;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DemoConfig::default();
        assert_eq!(config.routine, Routine::Triangle);
        assert_eq!(config.period, 5.0);
        assert_eq!((config.fov, config.near, config.far), (45.0, 0.1, 100.0));
        assert_eq!(config.camera_distance, 5.0);
        assert_eq!(config.cube_scale, 2.0);
        assert_eq!((config.sphere_slices, config.sphere_radius), (350, 1.0));
    }

    #[test]
    fn tiny_period_is_ignored() {
        assert_eq!(DemoConfig::new().period(0.0).period, 5.0);
        assert_eq!(DemoConfig::new().period(-3.0).period, 5.0);
        assert_eq!(DemoConfig::new().period(0.5).period, 0.5);
    }
}
