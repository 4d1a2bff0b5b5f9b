//! X11 backend.
//!
//! The display connection is shared by every window on the creating thread
//! and is owned by [`X11Server`]; windows hold `Arc` references and the
//! connection closes when the last one drops.

use std::cell::{Cell, RefCell};
use std::ffi::{CStr, CString, c_char, c_int};
use std::ptr;
use std::sync::{Arc, Weak};

use hashbrown::HashMap;
use log::{error, warn};
use x11_dl::xlib::{self, Xlib};

use crate::error::Error;

mod glx;
mod keyboard;
mod utils;
pub(super) mod window;

thread_local! {
    // The connection may only be touched from the thread that created it, so
    // the singleton registry is thread-local. It also gives the global Xlib
    // error callbacks (free functions with no context argument) a way back to
    // the live connection instance.
    static SERVER_INSTANCE: RefCell<Weak<X11Server>> = RefCell::new(Weak::new());
}

/// Handler for unrecoverable transport failures: the connection was severed
/// under the process and Xlib would terminate it anyway once this returns.
unsafe extern "C" fn fatal_error_handler(_display: *mut xlib::Display) -> c_int {
    error!(target: "x11", "connection to the X server was lost");
    std::process::abort();
}

/// Handler for per-request protocol errors. Decodes the error text and
/// latches it on the live connection, where the call that triggered the
/// request picks it up. Errors for a display other than the live connection
/// are ignored.
unsafe extern "C" fn protocol_error_handler(
    display: *mut xlib::Display,
    event: *mut xlib::XErrorEvent,
) -> c_int {
    SERVER_INSTANCE.with(|instance| {
        let Some(server) = instance.borrow().upgrade() else {
            return;
        };
        if server.display != display {
            return;
        }

        let mut buffer = [0 as c_char; 1024];
        unsafe {
            (server.xlib.XGetErrorText)(
                display,
                (*event).error_code as c_int,
                buffer.as_mut_ptr(),
                buffer.len() as c_int,
            );
        }
        let text = unsafe { CStr::from_ptr(buffer.as_ptr()) }
            .to_string_lossy()
            .into_owned();

        error!(target: "x11", "protocol error: {text}");
        server.protocol_error.replace(Some(text));
    });

    0
}

/// The per-process connection to the X server.
pub(super) struct X11Server {
    xlib: Xlib,
    display: *mut xlib::Display,
    input_method: xlib::XIM,
    atoms: RefCell<HashMap<String, xlib::Atom>>,
    ewmh_supported: Cell<Option<bool>>,
    protocol_error: RefCell<Option<String>>,
}

impl X11Server {
    /// Returns the shared connection, opening it on first use. If the last
    /// window released it in the meantime a fresh connection is opened.
    pub(super) fn connect() -> Result<Arc<Self>, Error> {
        SERVER_INSTANCE.with(|instance| {
            if let Some(server) = instance.borrow().upgrade() {
                return Ok(server);
            }

            let server = Arc::new(Self::open()?);
            *instance.borrow_mut() = Arc::downgrade(&server);
            Ok(server)
        })
    }

    fn open() -> Result<Self, Error> {
        let xlib = Xlib::open().map_err(|err| Error::Connection(err.to_string()))?;

        let display = unsafe { (xlib.XOpenDisplay)(ptr::null()) };
        if display.is_null() {
            return Err(Error::Connection(
                "failed to open display; is DISPLAY set?".to_owned(),
            ));
        }

        unsafe {
            (xlib.XSetIOErrorHandler)(Some(fatal_error_handler));
            (xlib.XSetErrorHandler)(Some(protocol_error_handler));
        }

        let input_method = unsafe {
            (xlib.XOpenIM)(display, ptr::null_mut(), ptr::null_mut(), ptr::null_mut())
        };
        if input_method.is_null() {
            warn!(target: "x11", "no input method available, text input is disabled");
        }

        Ok(Self {
            xlib,
            display,
            input_method,
            atoms: RefCell::new(HashMap::new()),
            ewmh_supported: Cell::new(None),
            protocol_error: RefCell::new(None),
        })
    }

    pub(super) fn xlib(&self) -> &Xlib {
        &self.xlib
    }

    pub(super) fn display(&self) -> *mut xlib::Display {
        self.display
    }

    pub(super) fn default_screen(&self) -> c_int {
        unsafe { (self.xlib.XDefaultScreen)(self.display) }
    }

    pub(super) fn root_window(&self) -> xlib::Window {
        unsafe { (self.xlib.XRootWindow)(self.display, self.default_screen()) }
    }

    pub(super) fn input_method(&self) -> xlib::XIM {
        self.input_method
    }

    /// The window currently holding OS input focus.
    pub(super) fn active_window(&self) -> xlib::Window {
        let mut window: xlib::Window = 0;
        let mut revert_to: c_int = 0;
        unsafe {
            (self.xlib.XGetInputFocus)(self.display, &mut window, &mut revert_to);
        }
        window
    }

    /// Interns `name`, caching the result for the lifetime of the
    /// connection. The cache is append-only.
    pub(super) fn get_atom(&self, name: &str, only_if_exists: bool) -> xlib::Atom {
        if let Some(atom) = self.atoms.borrow().get(name) {
            return *atom;
        }

        let Ok(c_name) = CString::new(name) else {
            return 0;
        };
        let atom = unsafe {
            (self.xlib.XInternAtom)(
                self.display,
                c_name.as_ptr(),
                if only_if_exists { xlib::True } else { xlib::False },
            )
        };

        self.atoms.borrow_mut().insert(name.to_owned(), atom);
        atom
    }

    /// Drains the protocol error latched by the global error hook, if any.
    pub(super) fn take_protocol_error(&self) -> Option<Error> {
        self.protocol_error.borrow_mut().take().map(Error::Protocol)
    }

    /// Cached probe of `_NET_SUPPORTING_WM_CHECK`. Without an EWMH-compliant
    /// window manager the state-switching operations degrade to best-effort
    /// no-ops.
    pub(super) fn ewmh_supported(&self) -> bool {
        if let Some(supported) = self.ewmh_supported.get() {
            return supported;
        }

        let supported = utils::probe_ewmh_support(self);
        if !supported {
            warn!(target: "x11", "window manager does not support EWMH, state changes are best-effort");
        }
        self.ewmh_supported.set(Some(supported));
        supported
    }
}

impl Drop for X11Server {
    fn drop(&mut self) {
        unsafe {
            if !self.input_method.is_null() {
                (self.xlib.XCloseIM)(self.input_method);
            }
            (self.xlib.XCloseDisplay)(self.display);
            (self.xlib.XSetErrorHandler)(None);
            (self.xlib.XSetIOErrorHandler)(None);
        }
    }
}
