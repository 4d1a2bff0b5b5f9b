//! OpenGL context creation through GLX.

use std::cell::Cell;
use std::ffi::{CString, c_int, c_void};
use std::mem;
use std::ptr;
use std::sync::Arc;

use x11_dl::glx::{self, Glx};
use x11_dl::xlib;

use crate::context::{Api, Context, ContextSettings};
use crate::error::Error;

use super::X11Server;

const GLX_MIN_MAJOR_VERSION: c_int = 1;
const GLX_MIN_MINOR_VERSION: c_int = 4;

// GLX_ARB_create_context tokens.
const GLX_CONTEXT_MAJOR_VERSION_ARB: c_int = 0x2091;
const GLX_CONTEXT_MINOR_VERSION_ARB: c_int = 0x2092;
const GLX_CONTEXT_FLAGS_ARB: c_int = 0x2094;
const GLX_CONTEXT_DEBUG_BIT_ARB: c_int = 0x0001;
const GLX_CONTEXT_FORWARD_COMPATIBLE_BIT_ARB: c_int = 0x0002;

type GlXCreateContextAttribsArb = unsafe extern "C" fn(
    *mut xlib::Display,
    glx::GLXFBConfig,
    glx::GLXContext,
    xlib::Bool,
    *const c_int,
) -> glx::GLXContext;

/// Framebuffer selection attributes for `glXChooseFBConfig`. The context is
/// always a double-buffered true-color RGBA window target; depth and stencil
/// follow the settings, capped at the supported maximums.
fn fbconfig_attributes(settings: &ContextSettings) -> Vec<c_int> {
    let mut attributes = vec![
        glx::GLX_X_RENDERABLE,
        1,
        glx::GLX_DRAWABLE_TYPE,
        glx::GLX_WINDOW_BIT,
        glx::GLX_RENDER_TYPE,
        glx::GLX_RGBA_BIT,
        glx::GLX_DOUBLEBUFFER,
        1,
        glx::GLX_X_VISUAL_TYPE,
        glx::GLX_TRUE_COLOR,
    ];

    if settings.color_bits() != ContextSettings::DONT_CARE {
        // Color bits are split evenly across the four channels.
        let channel_bits = (settings.color_bits().min(32) / 4) as c_int;
        for channel in [
            glx::GLX_RED_SIZE,
            glx::GLX_GREEN_SIZE,
            glx::GLX_BLUE_SIZE,
            glx::GLX_ALPHA_SIZE,
        ] {
            attributes.push(channel);
            attributes.push(channel_bits);
        }
    }

    if settings.depth_bits() != ContextSettings::DONT_CARE {
        attributes.push(glx::GLX_DEPTH_SIZE);
        attributes.push(settings.depth_bits().min(ContextSettings::MAX_DEPTH_BITS) as c_int);
    }

    if settings.stencil_bits() != ContextSettings::DONT_CARE {
        attributes.push(glx::GLX_STENCIL_SIZE);
        attributes.push(settings.stencil_bits().min(ContextSettings::MAX_STENCIL_BITS) as c_int);
    }

    attributes.push(0);
    attributes
}

/// Context creation attributes for `glXCreateContextAttribsARB`.
fn context_attributes(settings: &ContextSettings) -> Vec<c_int> {
    let mut flags = GLX_CONTEXT_FORWARD_COMPATIBLE_BIT_ARB;
    if settings.debug() {
        flags |= GLX_CONTEXT_DEBUG_BIT_ARB;
    }

    vec![
        GLX_CONTEXT_MAJOR_VERSION_ARB,
        settings.version().major as c_int,
        GLX_CONTEXT_MINOR_VERSION_ARB,
        settings.version().minor as c_int,
        GLX_CONTEXT_FLAGS_ARB,
        flags,
        0,
    ]
}

pub(super) struct GlxContext {
    server: Arc<X11Server>,
    glx: Glx,
    context: glx::GLXContext,
    visual_info: *mut xlib::XVisualInfo,
    window: Cell<xlib::Window>,
    settings: ContextSettings,
}

impl GlxContext {
    pub(super) fn new(server: Arc<X11Server>, settings: ContextSettings) -> Result<Self, Error> {
        let glx = Glx::open().map_err(|err| Error::ContextCreation(err.to_string()))?;
        let display = server.display();

        let mut major: c_int = 0;
        let mut minor: c_int = 0;
        unsafe {
            (glx.glXQueryVersion)(display, &mut major, &mut minor);
        }
        if major < GLX_MIN_MAJOR_VERSION
            || (major == GLX_MIN_MAJOR_VERSION && minor < GLX_MIN_MINOR_VERSION)
        {
            return Err(Error::ContextCreation(format!(
                "GLX {major}.{minor} is too old, {GLX_MIN_MAJOR_VERSION}.{GLX_MIN_MINOR_VERSION} is required"
            )));
        }

        let fb_config = choose_fbconfig(&glx, &server, &settings)?;

        let visual_info = unsafe { (glx.glXGetVisualFromFBConfig)(display, fb_config) };
        if visual_info.is_null() {
            return Err(Error::ContextCreation(
                "no X visual for the chosen framebuffer configuration".to_owned(),
            ));
        }

        let create_context_attribs = unsafe {
            (glx.glXGetProcAddress)(c"glXCreateContextAttribsARB".as_ptr().cast())
        };
        let Some(create_context_attribs) = create_context_attribs else {
            unsafe { (server.xlib().XFree)(visual_info.cast()) };
            return Err(Error::ContextCreation(
                "GLX_ARB_create_context is not supported".to_owned(),
            ));
        };
        let create_context_attribs: GlXCreateContextAttribsArb =
            unsafe { mem::transmute(create_context_attribs) };

        let attributes = context_attributes(&settings);
        let context = unsafe {
            create_context_attribs(display, fb_config, ptr::null_mut(), xlib::True, attributes.as_ptr())
        };

        // Version negotiation failures arrive as GLXBadFBConfig protocol
        // errors rather than a null return.
        unsafe { (server.xlib().XSync)(display, xlib::False) };
        if let Some(Error::Protocol(message)) = server.take_protocol_error() {
            if !context.is_null() {
                unsafe { (glx.glXDestroyContext)(display, context) };
            }
            unsafe { (server.xlib().XFree)(visual_info.cast()) };
            return Err(Error::ContextCreation(message));
        }
        if context.is_null() {
            unsafe { (server.xlib().XFree)(visual_info.cast()) };
            return Err(Error::ContextCreation(format!(
                "failed to create an OpenGL {}.{} context",
                settings.version().major,
                settings.version().minor
            )));
        }

        Ok(Self {
            server,
            glx,
            context,
            visual_info,
            window: Cell::new(0),
            settings,
        })
    }

    /// Binds the context to the window it will render into. Until then the
    /// context reports itself invalid.
    pub(super) fn attach_window(&self, window: xlib::Window) {
        self.window.set(window);
    }

    pub(super) fn visual_info(&self) -> *mut xlib::XVisualInfo {
        self.visual_info
    }
}

/// Picks the framebuffer configuration with the most samples among the ones
/// matching the settings. With no multisampling preference the first match
/// wins.
fn choose_fbconfig(
    glx: &Glx,
    server: &X11Server,
    settings: &ContextSettings,
) -> Result<glx::GLXFBConfig, Error> {
    let display = server.display();
    let attributes = fbconfig_attributes(settings);

    let mut count: c_int = 0;
    let configs = unsafe {
        (glx.glXChooseFBConfig)(
            display,
            server.default_screen(),
            attributes.as_ptr(),
            &mut count,
        )
    };
    if configs.is_null() || count == 0 {
        return Err(Error::ContextCreation(
            "no framebuffer configuration matches the requested settings".to_owned(),
        ));
    }

    let all = unsafe { std::slice::from_raw_parts(configs, count as usize) };

    let chosen = if settings.samples() == ContextSettings::DONT_CARE {
        all[0]
    } else {
        let mut best = all[0];
        let mut best_samples = -1;
        for &config in all {
            let mut sample_buffers: c_int = 0;
            let mut samples: c_int = 0;
            unsafe {
                (glx.glXGetFBConfigAttrib)(display, config, glx::GLX_SAMPLE_BUFFERS, &mut sample_buffers);
                (glx.glXGetFBConfigAttrib)(display, config, glx::GLX_SAMPLES, &mut samples);
            }
            if sample_buffers != 0 && samples > best_samples {
                best = config;
                best_samples = samples;
            }
        }
        best
    };

    unsafe { (server.xlib().XFree)(configs.cast()) };
    Ok(chosen)
}

impl Context for GlxContext {
    fn is_valid(&self) -> bool {
        !self.context.is_null() && !self.visual_info.is_null() && self.window.get() != 0
    }

    fn is_current(&self) -> bool {
        unsafe { (self.glx.glXGetCurrentContext)() == self.context }
    }

    fn api(&self) -> Api {
        Api::OpenGl
    }

    fn make_current(&self) {
        if !self.is_valid() {
            return;
        }

        unsafe {
            (self.glx.glXMakeCurrent)(self.server.display(), self.window.get(), self.context);
        }
    }

    fn swap_buffers(&self) {
        if !self.is_valid() {
            return;
        }

        unsafe {
            (self.glx.glXSwapBuffers)(self.server.display(), self.window.get());
        }
    }

    fn settings(&self) -> &ContextSettings {
        &self.settings
    }

    fn get_proc_address(&self, name: &str) -> *const c_void {
        let Ok(c_name) = CString::new(name) else {
            return ptr::null();
        };

        match unsafe { (self.glx.glXGetProcAddress)(c_name.as_ptr().cast()) } {
            Some(function) => function as *const c_void,
            None => ptr::null(),
        }
    }
}

impl Drop for GlxContext {
    fn drop(&mut self) {
        unsafe {
            if !self.context.is_null() {
                (self.glx.glXDestroyContext)(self.server.display(), self.context);
            }
            if !self.visual_info.is_null() {
                (self.server.xlib().XFree)(self.visual_info.cast());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Version;

    fn attribute_value(attributes: &[c_int], key: c_int) -> Option<c_int> {
        attributes
            .chunks_exact(2)
            .find(|pair| pair[0] == key)
            .map(|pair| pair[1])
    }

    #[test]
    fn fbconfig_attributes_cap_depth_and_stencil() {
        let settings = ContextSettings::default();
        let attributes = fbconfig_attributes(&settings);

        assert_eq!(attributes.last(), Some(&0));
        assert_eq!(
            attribute_value(&attributes, glx::GLX_DEPTH_SIZE),
            Some(ContextSettings::MAX_DEPTH_BITS as c_int)
        );
        assert_eq!(
            attribute_value(&attributes, glx::GLX_STENCIL_SIZE),
            Some(ContextSettings::MAX_STENCIL_BITS as c_int)
        );
    }

    #[test]
    fn color_bits_are_split_across_channels() {
        let attributes = fbconfig_attributes(&ContextSettings::default().with_color_bits(24));

        assert_eq!(attribute_value(&attributes, glx::GLX_RED_SIZE), Some(6));
        assert_eq!(attribute_value(&attributes, glx::GLX_ALPHA_SIZE), Some(6));

        let attributes =
            fbconfig_attributes(&ContextSettings::default().with_color_bits(ContextSettings::DONT_CARE));
        assert_eq!(attribute_value(&attributes, glx::GLX_RED_SIZE), None);
    }

    #[test]
    fn dont_care_omits_depth_and_stencil() {
        let settings = ContextSettings::default()
            .with_depth_bits(ContextSettings::DONT_CARE)
            .with_stencil_bits(ContextSettings::DONT_CARE);
        let attributes = fbconfig_attributes(&settings);

        assert_eq!(attribute_value(&attributes, glx::GLX_DEPTH_SIZE), None);
        assert_eq!(attribute_value(&attributes, glx::GLX_STENCIL_SIZE), None);
    }

    #[test]
    fn context_attributes_carry_version_and_debug_flag() {
        let settings = ContextSettings::default()
            .with_version(Version::new(4, 6))
            .with_debug(true);
        let attributes = context_attributes(&settings);

        assert_eq!(
            attribute_value(&attributes, GLX_CONTEXT_MAJOR_VERSION_ARB),
            Some(4)
        );
        assert_eq!(
            attribute_value(&attributes, GLX_CONTEXT_MINOR_VERSION_ARB),
            Some(6)
        );
        let flags = attribute_value(&attributes, GLX_CONTEXT_FLAGS_ARB).unwrap_or(0);
        assert_ne!(flags & GLX_CONTEXT_DEBUG_BIT_ARB, 0);
    }
}
