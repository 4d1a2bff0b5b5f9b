//! Graphics context and the settings it is negotiated from.

use std::ffi::c_void;

/// Graphics API version requested for a context.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

/// Desired properties of a graphics context.
///
/// Supplied once at window construction and read-only afterward; the context
/// is always double-buffered and RGBA-capable. A value of [`DONT_CARE`] means
/// the parameter is not taken into account during negotiation, [`BEST`] asks
/// for the highest supported value (capped by [`MAX_DEPTH_BITS`] /
/// [`MAX_STENCIL_BITS`]). Updates produce a new value; applying different
/// settings to a window requires recreating its context.
///
/// [`DONT_CARE`]: ContextSettings::DONT_CARE
/// [`BEST`]: ContextSettings::BEST
/// [`MAX_DEPTH_BITS`]: ContextSettings::MAX_DEPTH_BITS
/// [`MAX_STENCIL_BITS`]: ContextSettings::MAX_STENCIL_BITS
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContextSettings {
    color_bits: u32,
    depth_bits: u32,
    stencil_bits: u32,
    samples: u32,
    version: Version,
    debug: bool,
}

impl ContextSettings {
    /// Parameter is ignored during negotiation.
    pub const DONT_CARE: u32 = 0;
    /// Highest supported value is chosen.
    pub const BEST: u32 = 999;

    pub const MAX_DEPTH_BITS: u32 = 24;
    pub const MAX_STENCIL_BITS: u32 = 8;

    pub fn with_color_bits(mut self, bits: u32) -> Self {
        self.color_bits = bits;
        self
    }

    pub fn with_depth_bits(mut self, bits: u32) -> Self {
        self.depth_bits = bits;
        self
    }

    pub fn with_stencil_bits(mut self, bits: u32) -> Self {
        self.stencil_bits = bits;
        self
    }

    /// Sets the sample count for multisampling.
    pub fn with_samples(mut self, samples: u32) -> Self {
        self.samples = samples;
        self
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Requests a debug context.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn color_bits(&self) -> u32 {
        self.color_bits
    }

    pub fn depth_bits(&self) -> u32 {
        self.depth_bits
    }

    pub fn stencil_bits(&self) -> u32 {
        self.stencil_bits
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn debug(&self) -> bool {
        self.debug
    }
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            color_bits: 32,
            depth_bits: Self::BEST,
            stencil_bits: Self::BEST,
            samples: Self::DONT_CARE,
            version: Version::new(3, 2),
            debug: false,
        }
    }
}

/// Graphics API backing a [`Context`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Api {
    OpenGl,
}

/// A native graphics context bound to one window surface.
///
/// Rendering may happen on a different thread than event processing, but a
/// context can be current on at most one thread at a time and
/// [`make_current`](Context::make_current) must be called on the rendering
/// thread before any draw call.
pub trait Context {
    /// True when the context was fully initialized and is attached to a
    /// window surface.
    fn is_valid(&self) -> bool;

    /// True when this context is current on the calling thread.
    fn is_current(&self) -> bool;

    fn api(&self) -> Api;

    /// Binds the context to the calling thread. No-op when invalid.
    fn make_current(&self);

    /// Presents the back buffer. No-op when invalid.
    fn swap_buffers(&self);

    /// The settings the context was created with.
    fn settings(&self) -> &ContextSettings;

    /// Resolves a graphics-API function pointer through the active context.
    /// Returns null for unknown names.
    fn get_proc_address(&self, name: &str) -> *const c_void;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings() {
        let settings = ContextSettings::default();

        assert_eq!(settings.color_bits(), 32);
        assert_eq!(settings.depth_bits(), ContextSettings::BEST);
        assert_eq!(settings.stencil_bits(), ContextSettings::BEST);
        assert_eq!(settings.samples(), ContextSettings::DONT_CARE);
        assert_eq!(settings.version(), Version::new(3, 2));
        assert!(!settings.debug());
    }

    #[test]
    fn builder_produces_new_values() {
        let base = ContextSettings::default();
        let tuned = base
            .clone()
            .with_depth_bits(16)
            .with_samples(4)
            .with_version(Version::new(4, 1))
            .with_debug(true);

        assert_eq!(tuned.depth_bits(), 16);
        assert_eq!(tuned.samples(), 4);
        assert_eq!(tuned.version(), Version::new(4, 1));
        assert!(tuned.debug());
        assert_ne!(base, tuned);
    }
}
