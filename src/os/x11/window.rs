//! The X11 platform window.

use std::cell::RefCell;
use std::ffi::{CString, c_char, c_int, c_long, c_uint, c_void};
use std::mem;
use std::ptr::{self, NonNull};
use std::rc::Rc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::debug;
use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, RawDisplayHandle,
    RawWindowHandle, WindowHandle, XlibDisplayHandle, XlibWindowHandle,
};
use x11_dl::xlib;

use crate::callbacks::CallbacksHolder;
use crate::context::{Context, ContextSettings};
use crate::error::Error;
use crate::geometry::{CursorPosition, Position, Size};
use crate::os::{PlatformWindow, StateData};
use crate::window::State;

use super::glx::GlxContext;
use super::{X11Server, keyboard, utils};

const EVENT_MASK: c_long = xlib::VisibilityChangeMask
    | xlib::FocusChangeMask
    | xlib::StructureNotifyMask
    | xlib::PropertyChangeMask
    | xlib::ExposureMask
    | xlib::KeyPressMask
    | xlib::KeyReleaseMask
    | xlib::ButtonPressMask
    | xlib::ButtonReleaseMask
    | xlib::EnterWindowMask
    | xlib::LeaveWindowMask
    | xlib::PointerMotionMask
    | xlib::ButtonMotionMask;

// Modal waits on window manager confirmation give up after this long.
const WAIT_LIMIT: Duration = Duration::from_secs(1);
const WAIT_DELAY: Duration = Duration::from_millis(50);

// WM hint initial state (ICCCM 4.1.2.4) and XEventsQueued mode from Xlib.h;
// x11-dl does not export these.
const NORMAL_STATE: c_int = 1;
const QUEUED_AFTER_READING: c_int = 1;

// XCreateIC property names and preedit styles from Xlib.h.
const XIM_PREEDIT_NOTHING: c_long = 0x0008;
const XIM_STATUS_NOTHING: c_long = 0x0400;
const XN_INPUT_STYLE: &std::ffi::CStr = c"inputStyle";
const XN_CLIENT_WINDOW: &std::ffi::CStr = c"clientWindow";
const XN_FOCUS_WINDOW: &std::ffi::CStr = c"focusWindow";

/// Predicate for `XCheckIfEvent`: only take events addressed to one window,
/// leaving the rest of the queue for the other windows on this connection.
unsafe extern "C" fn is_for_window(
    _display: *mut xlib::Display,
    event: *mut xlib::XEvent,
    arg: xlib::XPointer,
) -> xlib::Bool {
    let window = unsafe { *(arg as *const xlib::Window) };
    (unsafe { (*event).any.window } == window) as xlib::Bool
}

/// Owns the native window and the resources created alongside it. Dropped
/// after the context but before the connection.
struct NativeHandle {
    server: Arc<X11Server>,
    window: xlib::Window,
    colormap: xlib::Colormap,
    input_context: xlib::XIC,
    invisible_cursor: xlib::Cursor,
}

impl Drop for NativeHandle {
    fn drop(&mut self) {
        let xlib = self.server.xlib();
        let display = self.server.display();

        unsafe {
            if !self.input_context.is_null() {
                (xlib.XDestroyIC)(self.input_context);
            }
            if self.invisible_cursor != 0 {
                (xlib.XFreeCursor)(display, self.invisible_cursor);
            }
            if self.colormap != 0 {
                (xlib.XFreeColormap)(display, self.colormap);
            }
            if self.window != 0 {
                (xlib.XDestroyWindow)(display, self.window);
                (xlib.XSync)(display, xlib::False);
            }
        }
    }
}

pub(in crate::os) struct X11Window {
    // Field order fixes the teardown order: context, then the native window,
    // then this window's reference to the shared connection.
    context: GlxContext,
    native: NativeHandle,
    server: Arc<X11Server>,
    callbacks: Rc<RefCell<CallbacksHolder>>,
    state: StateData,
    frame_extents: utils::FrameExtents,
    last_cursor_position: CursorPosition,
    last_input_time: xlib::Time,
    wait_event_type: Option<c_int>,
    visual_id: u64,
}

impl X11Window {
    pub(in crate::os) fn new(
        title: &str,
        size: Size,
        settings: ContextSettings,
        callbacks: Rc<RefCell<CallbacksHolder>>,
    ) -> Result<Self, Error> {
        let server = X11Server::connect()?;
        let context = GlxContext::new(Arc::clone(&server), settings)?;

        let xlib = server.xlib();
        let display = server.display();
        let visual_info = context.visual_info();

        if unsafe { (*visual_info).screen } != server.default_screen() {
            return Err(Error::WindowCreation(format!(
                "visual belongs to screen {} but the default screen is {}",
                unsafe { (*visual_info).screen },
                server.default_screen()
            )));
        }

        let colormap = unsafe {
            (xlib.XCreateColormap)(
                display,
                server.root_window(),
                (*visual_info).visual,
                xlib::AllocNone,
            )
        };
        if colormap == 0 {
            return Err(Error::WindowCreation("failed to create a colormap".to_owned()));
        }

        let black = unsafe { (xlib.XBlackPixel)(display, server.default_screen()) };
        let mut attributes: xlib::XSetWindowAttributes = unsafe { mem::zeroed() };
        attributes.background_pixel = black;
        attributes.border_pixel = black;
        attributes.event_mask = EVENT_MASK;
        // Let the window manager intercept map, move and resize requests.
        attributes.override_redirect = xlib::False;
        attributes.colormap = colormap;

        let window = unsafe {
            (xlib.XCreateWindow)(
                display,
                server.root_window(),
                0,
                0,
                size.width as c_uint,
                size.height as c_uint,
                0,
                (*visual_info).depth,
                xlib::InputOutput as c_uint,
                (*visual_info).visual,
                xlib::CWBorderPixel
                    | xlib::CWBackPixel
                    | xlib::CWEventMask
                    | xlib::CWColormap
                    | xlib::CWOverrideRedirect,
                &mut attributes,
            )
        };
        unsafe { (xlib.XSync)(display, xlib::False) };

        if window == 0 {
            unsafe { (xlib.XFreeColormap)(display, colormap) };
            let reason = server
                .take_protocol_error()
                .map_or_else(|| "failed to create an X window".to_owned(), |err| err.to_string());
            return Err(Error::WindowCreation(reason));
        }

        // From here on NativeHandle cleans up on any failure path, including
        // a latched error from the colormap request.
        let mut native = NativeHandle {
            server: Arc::clone(&server),
            window,
            colormap,
            input_context: ptr::null_mut(),
            invisible_cursor: 0,
        };

        if let Some(error) = server.take_protocol_error() {
            return Err(Error::WindowCreation(error.to_string()));
        }

        context.attach_window(window);
        if !context.is_valid() {
            return Err(Error::ContextCreation(
                "context could not be attached to the window".to_owned(),
            ));
        }

        unsafe { (xlib.XSelectInput)(display, window, EVENT_MASK) };

        let mut wm_hints: xlib::XWMHints = unsafe { mem::zeroed() };
        wm_hints.flags = xlib::StateHint | xlib::InputHint;
        wm_hints.initial_state = NORMAL_STATE;
        wm_hints.input = xlib::True;
        unsafe { (xlib.XSetWMHints)(display, window, &mut wm_hints) };

        set_class_hints(&server, window)?;
        set_protocols(&server, window);
        utils::set_pid(&server, window);

        if !server.input_method().is_null() {
            native.input_context = unsafe {
                (xlib.XCreateIC)(
                    server.input_method(),
                    XN_INPUT_STYLE.as_ptr(),
                    XIM_PREEDIT_NOTHING | XIM_STATUS_NOTHING,
                    XN_CLIENT_WINDOW.as_ptr(),
                    window,
                    XN_FOCUS_WINDOW.as_ptr(),
                    window,
                    ptr::null_mut::<c_void>(),
                )
            };
        }

        native.invisible_cursor = utils::create_invisible_cursor(&server, window);

        utils::set_window_title(&server, window, title);
        unsafe { (xlib.XSync)(display, xlib::False) };

        if let Some(error) = server.take_protocol_error() {
            return Err(Error::WindowCreation(error.to_string()));
        }

        let visual_id = unsafe { (xlib.XVisualIDFromVisual)((*visual_info).visual) };

        Ok(Self {
            context,
            native,
            server,
            callbacks,
            state: StateData::new(size),
            frame_extents: utils::FrameExtents::default(),
            last_cursor_position: CursorPosition::default(),
            last_input_time: 0,
            wait_event_type: None,
            visual_id: visual_id as u64,
        })
    }

    fn xlib(&self) -> &xlib::Xlib {
        self.server.xlib()
    }

    fn display(&self) -> *mut xlib::Display {
        self.server.display()
    }

    fn flush(&self) {
        unsafe { (self.xlib().XFlush)(self.display()) };
    }

    /// Pumps events until `condition` turns false, the close flag is set, or
    /// the wait limit expires.
    fn pump_until(&mut self, mut condition: impl FnMut(&Self) -> bool) {
        let mut limit = WAIT_LIMIT;

        loop {
            self.process_events();

            if self.state.should_close() || !condition(self) || limit.is_zero() {
                break;
            }

            thread::sleep(WAIT_DELAY);
            limit = limit.saturating_sub(WAIT_DELAY);
        }
    }

    /// Drives the window toward a target mode through the window manager and
    /// waits for the confirming events.
    fn apply_mode(&mut self, new_mode: State) {
        let old_mode = self.state.mode;

        if old_mode == State::Normal
            && matches!(new_mode, State::Fullscreen | State::Maximized)
            && self.state.mapped
        {
            self.state.saved_size = self.state.size;
            self.state.saved_position = self.state.position;
        }

        let window = self.native.window;
        let hidden = utils::is_iconified(&self.server, window);
        let fullscreen = utils::is_fullscreen(&self.server, window);
        let maximized = utils::is_maximized(&self.server, window);

        if hidden && new_mode != State::Iconified {
            unsafe { (self.xlib().XMapWindow)(self.display(), window) };
        }

        match new_mode {
            State::Fullscreen => {
                if maximized {
                    utils::set_maximized(&self.server, window, false);
                }
                utils::set_fullscreen(&self.server, window, true);
            }
            State::Iconified => utils::iconify(&self.server, window),
            State::Maximized => {
                if fullscreen {
                    utils::set_fullscreen(&self.server, window, false);
                }
                utils::set_maximized(&self.server, window, true);
            }
            State::Normal => {
                if fullscreen {
                    utils::set_fullscreen(&self.server, window, false);
                }
                if maximized {
                    utils::set_maximized(&self.server, window, false);
                }

                self.flush();
                self.wait_event_type =
                    (old_mode != new_mode).then_some(xlib::ConfigureNotify);
                self.pump_until(|w| w.wait_event_type.is_some());

                // The window manager restores its own idea of the previous
                // geometry; reapply the one recorded before the switch.
                if fullscreen || maximized {
                    let position = Position::new(
                        self.state.saved_position.x - self.frame_extents.left as i32,
                        self.state.saved_position.y - self.frame_extents.top as i32,
                    );
                    unsafe {
                        (self.xlib().XMoveResizeWindow)(
                            self.display(),
                            window,
                            position.x,
                            position.y,
                            self.state.saved_size.width as c_uint,
                            self.state.saved_size.height as c_uint,
                        );
                    }
                }
            }
        }

        self.flush();
        self.wait_event_type = (old_mode != new_mode).then_some(xlib::ConfigureNotify);
        self.pump_until(|w| w.state.mode != new_mode || w.wait_event_type.is_some());
    }

    /// Publishes min/max size limits through WM_NORMAL_HINTS. A zero size
    /// removes the limit on that side.
    fn update_size_limits(&mut self, min: Size, max: Size) {
        let xlib = self.xlib();
        let mut hints: xlib::XSizeHints = unsafe { mem::zeroed() };
        let mut supplied: c_long = 0;

        unsafe {
            (xlib.XGetWMNormalHints)(self.display(), self.native.window, &mut hints, &mut supplied);
        }

        if min.width > 0 && min.height > 0 {
            hints.flags |= xlib::PMinSize;
            hints.min_width = min.width;
            hints.min_height = min.height;
        } else {
            hints.flags &= !xlib::PMinSize;
        }

        if max.width > 0 && max.height > 0 {
            hints.flags |= xlib::PMaxSize;
            hints.max_width = max.width;
            hints.max_height = max.height;
        } else {
            hints.flags &= !xlib::PMaxSize;
        }

        unsafe {
            (xlib.XSetWMNormalHints)(self.display(), self.native.window, &mut hints);
        }
    }

    fn handle_configure(&mut self, event: &xlib::XConfigureEvent) {
        let new_size = Size::new(event.width, event.height);
        let new_position = Position::new(event.x, event.y);

        if self.state.size != new_size {
            self.state.size = new_size;
            if self.state.mapped {
                self.callbacks.borrow_mut().on_resize(new_size);
            }
        }

        if self.state.position != new_position {
            self.state.position = new_position;
            if self.state.mapped {
                self.callbacks.borrow_mut().on_move(new_position);
            }
        }
    }

    fn handle_property(&mut self, event: &xlib::XPropertyEvent) {
        let net_frame_extents = self.server.get_atom("_NET_FRAME_EXTENTS", true);
        let net_wm_state = self.server.get_atom(utils::NET_WM_STATE, true);

        if event.atom == net_frame_extents {
            self.frame_extents = utils::frame_extents(&self.server, self.native.window);
        } else if event.atom == net_wm_state {
            let window = self.native.window;
            self.state.mode = if utils::is_iconified(&self.server, window) {
                State::Iconified
            } else if utils::is_fullscreen(&self.server, window) {
                State::Fullscreen
            } else if utils::is_maximized(&self.server, window) {
                State::Maximized
            } else {
                State::Normal
            };
        }

        self.last_input_time = event.time;
    }

    fn handle_client_message(&mut self, event: &xlib::XClientMessageEvent) {
        let wm_protocols = self.server.get_atom(utils::WM_PROTOCOLS, true);
        let delete_window = self.server.get_atom(utils::WM_DELETE_WINDOW, true);
        let net_wm_ping = self.server.get_atom(utils::NET_WM_PING, true);
        let protocol = event.data.get_long(0) as xlib::Atom;

        if event.message_type != wm_protocols || protocol == 0 {
            return;
        }

        if protocol == delete_window {
            self.request_close();
        } else if protocol == net_wm_ping {
            // Bounce the ping back through the root window so the window
            // manager knows this client is alive.
            let mut reply: xlib::XEvent = unsafe { mem::zeroed() };
            reply.client_message = *event;
            unsafe {
                reply.client_message.window = self.server.root_window();
                (self.xlib().XSendEvent)(
                    self.display(),
                    self.server.root_window(),
                    xlib::False,
                    xlib::SubstructureNotifyMask | xlib::SubstructureRedirectMask,
                    &mut reply,
                );
            }
        }
    }

    fn handle_key(&mut self, event: &mut xlib::XKeyEvent) {
        let keysym = unsafe { (self.xlib().XLookupKeysym)(event, 0) };
        let Some(key) = keyboard::keysym_to_keycode(keysym) else {
            return;
        };
        let modifiers = keyboard::modifiers_from_state(event.state);

        match event.type_ {
            xlib::KeyPress => {
                self.callbacks.borrow_mut().on_key_down(key, modifiers);

                if !self.native.input_context.is_null() {
                    let mut buffer = [0 as c_char; 64];
                    let mut sym: xlib::KeySym = 0;
                    let count = unsafe {
                        (self.xlib().Xutf8LookupString)(
                            self.native.input_context,
                            event,
                            buffer.as_mut_ptr(),
                            buffer.len() as c_int,
                            &mut sym,
                            ptr::null_mut(),
                        )
                    };

                    if count > 0 {
                        let bytes = unsafe {
                            std::slice::from_raw_parts(buffer.as_ptr().cast::<u8>(), count as usize)
                        };
                        match std::str::from_utf8(bytes) {
                            Ok(text) => self.callbacks.borrow_mut().on_character(text),
                            Err(err) => {
                                debug!(target: "x11", "dropping non-UTF-8 input method text: {err}");
                            }
                        }
                    }
                }
            }
            xlib::KeyRelease => {
                if !self.is_auto_repeat(event) {
                    self.callbacks.borrow_mut().on_key_up(key, modifiers);
                }
            }
            _ => {}
        }
    }

    /// Auto-repeat arrives as a release immediately followed by a press with
    /// the same timestamp and keycode; such releases are dropped so held keys
    /// report a single key-down.
    fn is_auto_repeat(&self, event: &xlib::XKeyEvent) -> bool {
        let xlib = self.xlib();

        if unsafe { (xlib.XEventsQueued)(self.display(), QUEUED_AFTER_READING) } == 0 {
            return false;
        }

        let mut next: xlib::XEvent = unsafe { mem::zeroed() };
        unsafe { (xlib.XPeekEvent)(self.display(), &mut next) };

        unsafe {
            next.get_type() == xlib::KeyPress
                && next.key.time == event.time
                && next.key.keycode == event.keycode
        }
    }

    fn handle_button(&mut self, event: &xlib::XButtonEvent) {
        let position = CursorPosition::new(event.x, event.y);
        let modifiers = keyboard::modifiers_from_state(event.state);

        if let Some(offset) = keyboard::scroll_offset(event.button) {
            // Wheel releases carry no information; report the press only.
            if event.type_ == xlib::ButtonPress {
                self.callbacks.borrow_mut().on_mouse_scroll(offset);
            }
            return;
        }

        let Some(button) = keyboard::map_button(event.button) else {
            return;
        };

        match event.type_ {
            xlib::ButtonPress => {
                self.callbacks
                    .borrow_mut()
                    .on_mouse_button_down(button, position, modifiers);
            }
            xlib::ButtonRelease => {
                self.callbacks
                    .borrow_mut()
                    .on_mouse_button_up(button, position, modifiers);
            }
            _ => {}
        }
    }

    fn handle_motion(&mut self, event: &xlib::XMotionEvent) {
        let position = CursorPosition::new(event.x, event.y);

        if position != self.last_cursor_position {
            self.last_cursor_position = position;
            self.callbacks.borrow_mut().on_mouse_move(position);
        }
    }

    fn dispatch(&mut self, event: &mut xlib::XEvent) {
        match event.get_type() {
            xlib::VisibilityNotify => {
                let visibility = unsafe { event.visibility };
                if visibility.state != xlib::VisibilityFullyObscured && !self.state.mapped {
                    self.state.mapped = true;
                    self.callbacks.borrow_mut().on_show();
                }
            }
            xlib::UnmapNotify => {
                if self.state.mapped {
                    self.state.mapped = false;
                    self.callbacks.borrow_mut().on_hide();
                }
            }
            xlib::ConfigureNotify => {
                let configure = unsafe { event.configure };
                self.handle_configure(&configure);
            }
            xlib::FocusIn => {
                if !self.native.input_context.is_null() {
                    unsafe { (self.xlib().XSetICFocus)(self.native.input_context) };
                }
                self.state.focused = true;
                self.callbacks.borrow_mut().on_focus();
            }
            xlib::FocusOut => {
                if !self.native.input_context.is_null() {
                    unsafe { (self.xlib().XUnsetICFocus)(self.native.input_context) };
                }
                self.state.focused = false;
                self.callbacks.borrow_mut().on_lost_focus();
            }
            xlib::PropertyNotify => {
                let property = unsafe { event.property };
                self.handle_property(&property);
            }
            xlib::ClientMessage => {
                let client_message = unsafe { event.client_message };
                self.handle_client_message(&client_message);
            }
            xlib::KeyPress | xlib::KeyRelease => {
                let mut key = unsafe { event.key };
                self.handle_key(&mut key);
            }
            xlib::ButtonPress | xlib::ButtonRelease => {
                let button = unsafe { event.button };
                self.handle_button(&button);
            }
            xlib::EnterNotify => self.callbacks.borrow_mut().on_mouse_enter(),
            xlib::LeaveNotify => self.callbacks.borrow_mut().on_mouse_leave(),
            xlib::MotionNotify => {
                let motion = unsafe { event.motion };
                self.handle_motion(&motion);
            }
            xlib::MappingNotify => unsafe {
                (self.xlib().XRefreshKeyboardMapping)(&mut event.mapping);
            },
            _ => {}
        }
    }
}

impl PlatformWindow for X11Window {
    fn show(&mut self) {
        if self.state.mapped {
            return;
        }

        unsafe {
            (self.xlib().XClearWindow)(self.display(), self.native.window);
            (self.xlib().XMapRaised)(self.display(), self.native.window);
        }
        self.flush();

        self.wait_event_type = Some(xlib::ConfigureNotify);
        self.pump_until(|w| !w.state.mapped || w.wait_event_type.is_some());

        self.frame_extents = utils::frame_extents(&self.server, self.native.window);

        let mode = self.state.mode;
        if mode != State::Normal {
            self.apply_mode(mode);
        }
    }

    fn hide(&mut self) {
        if !self.state.mapped {
            return;
        }

        unsafe { (self.xlib().XUnmapWindow)(self.display(), self.native.window) };
        self.flush();
        self.pump_until(|w| w.state.mapped);

        if self.state.mode == State::Iconified {
            self.state.mode = State::Normal;
        }
    }

    fn focus(&mut self) {
        utils::focus_window(&self.server, self.native.window, self.last_input_time);
        self.flush();

        self.wait_event_type = Some(xlib::FocusIn);
        self.pump_until(|w| w.wait_event_type.is_some());
    }

    fn iconify(&mut self) {
        self.apply_mode(State::Iconified);
    }

    fn maximize(&mut self) {
        self.apply_mode(State::Maximized);
    }

    fn fullscreen(&mut self) {
        self.apply_mode(State::Fullscreen);
    }

    fn restore(&mut self) {
        self.apply_mode(State::Normal);
    }

    fn resize(&mut self, size: Size) {
        if size.width <= 0 || size.height <= 0 {
            return;
        }

        let size = size.clamped(self.state.min_size, self.state.max_size);
        self.state.saved_size = size;

        if !self.state.resizable {
            self.update_size_limits(size, size);
        }

        unsafe {
            (self.xlib().XResizeWindow)(
                self.display(),
                self.native.window,
                size.width as c_uint,
                size.height as c_uint,
            );
        }
        self.flush();

        self.pump_until(|w| w.state.size != size);
    }

    fn move_to(&mut self, position: Position) {
        self.state.saved_position = position;

        // Nothing to wait for when the window is already there.
        if position == self.state.position {
            return;
        }

        let target = Position::new(
            position.x - self.frame_extents.left as i32,
            position.y - self.frame_extents.top as i32,
        );

        let xlib = self.xlib();
        let mut hints: xlib::XSizeHints = unsafe { mem::zeroed() };
        let mut supplied: c_long = 0;
        unsafe {
            (xlib.XGetWMNormalHints)(self.display(), self.native.window, &mut hints, &mut supplied);
        }
        hints.flags |= xlib::PPosition;
        hints.x = target.x;
        hints.y = target.y;
        unsafe {
            (xlib.XSetWMNormalHints)(self.display(), self.native.window, &mut hints);
        }

        let old_position = self.state.position;
        unsafe {
            (xlib.XMoveWindow)(self.display(), self.native.window, target.x, target.y);
        }
        self.flush();

        self.pump_until(|w| w.state.position == old_position);
    }

    fn grab_cursor(&mut self) {
        if self.state.cursor_grabbed {
            return;
        }
        self.state.cursor_grabbed = true;

        unsafe {
            (self.xlib().XGrabPointer)(
                self.display(),
                self.native.window,
                xlib::True,
                (xlib::ButtonPressMask | xlib::ButtonReleaseMask | xlib::PointerMotionMask)
                    as c_uint,
                xlib::GrabModeAsync,
                xlib::GrabModeAsync,
                self.native.window,
                0,
                xlib::CurrentTime,
            );
        }
        self.flush();
        self.process_events();
    }

    fn release_cursor(&mut self) {
        if !self.state.cursor_grabbed {
            return;
        }
        self.state.cursor_grabbed = false;

        unsafe { (self.xlib().XUngrabPointer)(self.display(), xlib::CurrentTime) };
        self.flush();
        self.process_events();
    }

    fn request_close(&mut self) {
        if self.state.request_close() {
            self.callbacks.borrow_mut().on_close();
        }
    }

    fn process_events(&mut self) {
        let mut event: xlib::XEvent = unsafe { mem::zeroed() };
        let mut window = self.native.window;

        while !self.state.should_close()
            && unsafe {
                (self.xlib().XCheckIfEvent)(
                    self.display(),
                    &mut event,
                    Some(is_for_window),
                    &mut window as *mut xlib::Window as xlib::XPointer,
                )
            } != 0
        {
            self.dispatch(&mut event);

            if self.wait_event_type == Some(event.get_type()) {
                self.wait_event_type = None;
            }
        }
    }

    fn process_events_while(&mut self, predicate: &mut dyn FnMut() -> bool) {
        self.pump_until(|_| predicate());
    }

    fn set_min_size(&mut self, size: Size) {
        self.state.min_size = size;

        if self.state.resizable {
            let limits = (self.state.min_size, self.state.max_size);
            self.update_size_limits(limits.0, limits.1);
        }

        // New limits apply to the current size immediately.
        let clamped = self.state.size.clamped(self.state.min_size, self.state.max_size);
        if clamped != self.state.size {
            self.resize(clamped);
        }
    }

    fn set_max_size(&mut self, size: Size) {
        self.state.max_size = size;

        if self.state.resizable {
            let limits = (self.state.min_size, self.state.max_size);
            self.update_size_limits(limits.0, limits.1);
        }

        let clamped = self.state.size.clamped(self.state.min_size, self.state.max_size);
        if clamped != self.state.size {
            self.resize(clamped);
        }
    }

    fn set_resizable(&mut self, resizable: bool) {
        self.state.resizable = resizable;

        if resizable {
            let limits = (self.state.min_size, self.state.max_size);
            self.update_size_limits(limits.0, limits.1);
        } else {
            // Pin the current size through the hints.
            let size = self.state.size;
            self.update_size_limits(size, size);
        }

        self.flush();
        self.pump_until(|w| w.is_resizable() != w.state.resizable);
    }

    fn set_title(&mut self, title: &str) {
        utils::set_window_title(&self.server, self.native.window, title);
        self.flush();
        self.process_events();
    }

    fn set_cursor_visible(&mut self, visible: bool) {
        if self.state.cursor_visible == visible {
            return;
        }
        self.state.cursor_visible = visible;

        unsafe {
            if visible {
                (self.xlib().XUndefineCursor)(self.display(), self.native.window);
            } else {
                (self.xlib().XDefineCursor)(
                    self.display(),
                    self.native.window,
                    self.native.invisible_cursor,
                );
            }
        }
        self.flush();
        self.process_events();
    }

    fn position(&self) -> Position {
        self.state.position
    }

    fn size(&self) -> Size {
        self.state.size
    }

    fn min_size(&self) -> Size {
        self.state.min_size
    }

    fn max_size(&self) -> Size {
        self.state.max_size
    }

    fn title(&self) -> String {
        utils::window_title(&self.server, self.native.window)
    }

    fn state(&self) -> State {
        self.state.mode
    }

    fn is_visible(&self) -> bool {
        let mut attributes: xlib::XWindowAttributes = unsafe { mem::zeroed() };
        let status = unsafe {
            (self.xlib().XGetWindowAttributes)(self.display(), self.native.window, &mut attributes)
        };

        if status == 0 {
            return false;
        }

        attributes.map_state == xlib::IsViewable || self.state.mode == State::Iconified
    }

    fn has_input_focus(&self) -> bool {
        self.is_visible() && self.native.window == self.server.active_window()
    }

    fn is_resizable(&self) -> bool {
        let mut hints: xlib::XSizeHints = unsafe { mem::zeroed() };
        let mut supplied: c_long = 0;
        unsafe {
            (self.xlib().XGetWMNormalHints)(
                self.display(),
                self.native.window,
                &mut hints,
                &mut supplied,
            );
        }

        let pinned = (hints.flags & (xlib::PMinSize | xlib::PMaxSize)) != 0
            && hints.min_width == hints.max_width
            && hints.min_height == hints.max_height;

        !pinned
    }

    fn is_cursor_grabbed(&self) -> bool {
        self.state.cursor_grabbed
    }

    fn is_cursor_visible(&self) -> bool {
        self.state.cursor_visible
    }

    fn should_close(&self) -> bool {
        self.state.should_close()
    }

    fn context(&self) -> &dyn Context {
        &self.context
    }

    fn context_mut(&mut self) -> &mut dyn Context {
        &mut self.context
    }
}

impl HasWindowHandle for X11Window {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        let mut handle = XlibWindowHandle::new(self.native.window);
        handle.visual_id = self.visual_id;

        Ok(unsafe { WindowHandle::borrow_raw(RawWindowHandle::Xlib(handle)) })
    }
}

impl HasDisplayHandle for X11Window {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        let handle = XlibDisplayHandle::new(
            NonNull::new(self.display().cast()),
            self.server.default_screen(),
        );

        Ok(unsafe { DisplayHandle::borrow_raw(RawDisplayHandle::Xlib(handle)) })
    }
}

fn set_class_hints(server: &X11Server, window: xlib::Window) -> Result<(), Error> {
    let application_name = crate::window::application_name();

    let res_name = CString::new(application_name.as_str())
        .map_err(|err| Error::WindowCreation(err.to_string()))?;
    let res_class = CString::new(format!("{application_name} window class"))
        .map_err(|err| Error::WindowCreation(err.to_string()))?;

    let mut class_hint: xlib::XClassHint = unsafe { mem::zeroed() };
    class_hint.res_name = res_name.as_ptr() as *mut c_char;
    class_hint.res_class = res_class.as_ptr() as *mut c_char;

    unsafe {
        (server.xlib().XSetClassHint)(server.display(), window, &mut class_hint);
    }

    Ok(())
}

fn set_protocols(server: &X11Server, window: xlib::Window) {
    let mut protocols: Vec<xlib::Atom> = [utils::WM_DELETE_WINDOW, utils::NET_WM_PING]
        .iter()
        .map(|name| server.get_atom(name, false))
        .filter(|atom| *atom != 0)
        .collect();

    if protocols.is_empty() {
        return;
    }

    unsafe {
        (server.xlib().XSetWMProtocols)(
            server.display(),
            window,
            protocols.as_mut_ptr(),
            protocols.len() as c_int,
        );
    }
}
