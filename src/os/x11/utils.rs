//! EWMH and ICCCM helpers shared by the X11 window implementation.

use std::ffi::{CString, c_char, c_int, c_long, c_uchar, c_ulong};
use std::mem;
use std::ptr;

use x11_dl::xlib;

use super::X11Server;

pub(super) const NET_ACTIVE_WINDOW: &str = "_NET_ACTIVE_WINDOW";
pub(super) const NET_SUPPORTED: &str = "_NET_SUPPORTED";
pub(super) const NET_SUPPORTING_WM_CHECK: &str = "_NET_SUPPORTING_WM_CHECK";
pub(super) const NET_WM_BYPASS_COMPOSITOR: &str = "_NET_WM_BYPASS_COMPOSITOR";
pub(super) const NET_WM_ICON_NAME: &str = "_NET_WM_ICON_NAME";
pub(super) const NET_WM_NAME: &str = "_NET_WM_NAME";
pub(super) const NET_WM_PID: &str = "_NET_WM_PID";
pub(super) const NET_WM_PING: &str = "_NET_WM_PING";
pub(super) const NET_WM_STATE: &str = "_NET_WM_STATE";
pub(super) const NET_WM_STATE_FULLSCREEN: &str = "_NET_WM_STATE_FULLSCREEN";
pub(super) const NET_WM_STATE_HIDDEN: &str = "_NET_WM_STATE_HIDDEN";
pub(super) const NET_WM_STATE_MAXIMIZED_HORZ: &str = "_NET_WM_STATE_MAXIMIZED_HORZ";
pub(super) const NET_WM_STATE_MAXIMIZED_VERT: &str = "_NET_WM_STATE_MAXIMIZED_VERT";
pub(super) const UTF8_STRING: &str = "UTF8_STRING";
pub(super) const WM_DELETE_WINDOW: &str = "WM_DELETE_WINDOW";
pub(super) const WM_PROTOCOLS: &str = "WM_PROTOCOLS";
pub(super) const WM_STATE: &str = "WM_STATE";

// _NET_WM_STATE client messages must carry the source indication; 1 means a
// normal application.
const MESSAGE_SOURCE_APPLICATION: c_long = 1;

// WM_STATE values from ICCCM 4.1.3.1.
const ICONIC_STATE: c_long = 3;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub(super) struct FrameExtents {
    pub left: c_long,
    pub right: c_long,
    pub top: c_long,
    pub bottom: c_long,
}

#[derive(Copy, Clone)]
enum StateAction {
    Remove = 0,
    Add = 1,
}

/// Reads a format-32 window property. Xlib hands format-32 data back as an
/// array of C longs regardless of pointer width.
pub(super) fn get_property_longs(
    server: &X11Server,
    window: xlib::Window,
    property: xlib::Atom,
    req_type: xlib::Atom,
) -> Vec<c_long> {
    const MAX_ITEMS: c_long = 1024;

    let xlib = server.xlib();
    let mut actual_type: xlib::Atom = 0;
    let mut actual_format: c_int = 0;
    let mut items: c_ulong = 0;
    let mut bytes_after: c_ulong = 0;
    let mut data: *mut c_uchar = ptr::null_mut();

    let status = unsafe {
        (xlib.XGetWindowProperty)(
            server.display(),
            window,
            property,
            0,
            MAX_ITEMS,
            xlib::False,
            req_type,
            &mut actual_type,
            &mut actual_format,
            &mut items,
            &mut bytes_after,
            &mut data,
        )
    };

    if status != xlib::Success as c_int
        || actual_type != req_type
        || actual_format != 32
        || items == 0
        || data.is_null()
    {
        if !data.is_null() {
            unsafe { (xlib.XFree)(data.cast()) };
        }
        return Vec::new();
    }

    let values =
        unsafe { std::slice::from_raw_parts(data.cast::<c_long>(), items as usize) }.to_vec();
    unsafe { (xlib.XFree)(data.cast()) };
    values
}

/// Reads a format-8 window property as raw bytes.
pub(super) fn get_property_bytes(
    server: &X11Server,
    window: xlib::Window,
    property: xlib::Atom,
    req_type: xlib::Atom,
) -> Vec<u8> {
    const MAX_ITEMS: c_long = 1024;

    let xlib = server.xlib();
    let mut actual_type: xlib::Atom = 0;
    let mut actual_format: c_int = 0;
    let mut items: c_ulong = 0;
    let mut bytes_after: c_ulong = 0;
    let mut data: *mut c_uchar = ptr::null_mut();

    let status = unsafe {
        (xlib.XGetWindowProperty)(
            server.display(),
            window,
            property,
            0,
            MAX_ITEMS,
            xlib::False,
            req_type,
            &mut actual_type,
            &mut actual_format,
            &mut items,
            &mut bytes_after,
            &mut data,
        )
    };

    if status != xlib::Success as c_int
        || actual_type != req_type
        || actual_format != 8
        || items == 0
        || data.is_null()
    {
        if !data.is_null() {
            unsafe { (xlib.XFree)(data.cast()) };
        }
        return Vec::new();
    }

    let bytes = unsafe { std::slice::from_raw_parts(data, items as usize) }.to_vec();
    unsafe { (xlib.XFree)(data.cast()) };
    bytes
}

/// Checks whether an EWMH-compliant window manager is running:
/// `_NET_SUPPORTING_WM_CHECK` on the root window must point at a child
/// window carrying the same property with the same value.
pub(super) fn probe_ewmh_support(server: &X11Server) -> bool {
    let wm_check = server.get_atom(NET_SUPPORTING_WM_CHECK, true);
    let supported = server.get_atom(NET_SUPPORTED, true);
    if wm_check == 0 || supported == 0 {
        return false;
    }

    let root = get_property_longs(server, server.root_window(), wm_check, xlib::XA_WINDOW);
    let Some(&child_window) = root.first() else {
        return false;
    };
    if child_window == 0 {
        return false;
    }

    let child = get_property_longs(server, child_window as xlib::Window, wm_check, xlib::XA_WINDOW);
    child.first() == Some(&child_window)
}

/// Sends a format-32 client message to the window manager through the root
/// window.
pub(super) fn send_client_message(
    server: &X11Server,
    window: xlib::Window,
    message_type: xlib::Atom,
    data: [c_long; 5],
) -> bool {
    let xlib = server.xlib();

    let mut event: xlib::XEvent = unsafe { mem::zeroed() };
    unsafe {
        event.client_message.type_ = xlib::ClientMessage;
        event.client_message.window = window;
        event.client_message.message_type = message_type;
        event.client_message.format = 32;
        for (i, value) in data.iter().enumerate() {
            event.client_message.data.set_long(i, *value);
        }
    }

    let status = unsafe {
        (xlib.XSendEvent)(
            server.display(),
            server.root_window(),
            xlib::False,
            xlib::SubstructureNotifyMask | xlib::SubstructureRedirectMask,
            &mut event,
        )
    };

    status != 0
}

fn window_has_state(server: &X11Server, window: xlib::Window, state_name: &str) -> bool {
    if !server.ewmh_supported() {
        return false;
    }

    let net_wm_state = server.get_atom(NET_WM_STATE, true);
    let state_atom = server.get_atom(state_name, true);
    if net_wm_state == 0 || state_atom == 0 {
        return false;
    }

    get_property_longs(server, window, net_wm_state, xlib::XA_ATOM)
        .iter()
        .any(|atom| *atom as xlib::Atom == state_atom)
}

fn wm_state_is_iconic(server: &X11Server, window: xlib::Window) -> bool {
    let wm_state = server.get_atom(WM_STATE, true);
    if wm_state == 0 {
        return false;
    }

    get_property_longs(server, window, wm_state, wm_state).first() == Some(&ICONIC_STATE)
}

fn change_wm_state(
    server: &X11Server,
    window: xlib::Window,
    action: StateAction,
    state_names: &[&str],
) -> bool {
    let net_wm_state = server.get_atom(NET_WM_STATE, true);
    if net_wm_state == 0 {
        return false;
    }

    let first = state_names
        .first()
        .map_or(0, |name| server.get_atom(name, false));
    let second = state_names
        .get(1)
        .map_or(0, |name| server.get_atom(name, false));

    send_client_message(
        server,
        window,
        net_wm_state,
        [
            action as c_long,
            first as c_long,
            second as c_long,
            MESSAGE_SOURCE_APPLICATION,
            0,
        ],
    )
}

fn set_bypass_compositor(server: &X11Server, window: xlib::Window, disabled: bool) {
    if !server.ewmh_supported() {
        return;
    }

    let bypass = server.get_atom(NET_WM_BYPASS_COMPOSITOR, true);
    if bypass == 0 {
        return;
    }

    // 1 disables compositing for the window, 0 restores no preference.
    let hint: c_ulong = if disabled { 1 } else { 0 };
    unsafe {
        (server.xlib().XChangeProperty)(
            server.display(),
            window,
            bypass,
            xlib::XA_CARDINAL,
            32,
            xlib::PropModeReplace,
            (&hint as *const c_ulong).cast(),
            1,
        );
    }
}

pub(super) fn is_iconified(server: &X11Server, window: xlib::Window) -> bool {
    wm_state_is_iconic(server, window) || window_has_state(server, window, NET_WM_STATE_HIDDEN)
}

pub(super) fn is_maximized(server: &X11Server, window: xlib::Window) -> bool {
    window_has_state(server, window, NET_WM_STATE_MAXIMIZED_VERT)
        || window_has_state(server, window, NET_WM_STATE_MAXIMIZED_HORZ)
}

pub(super) fn is_fullscreen(server: &X11Server, window: xlib::Window) -> bool {
    window_has_state(server, window, NET_WM_STATE_FULLSCREEN)
}

pub(super) fn iconify(server: &X11Server, window: xlib::Window) {
    unsafe {
        (server.xlib().XIconifyWindow)(server.display(), window, server.default_screen());
    }
}

pub(super) fn set_maximized(server: &X11Server, window: xlib::Window, enabled: bool) {
    if !server.ewmh_supported() {
        return;
    }

    let action = if enabled {
        StateAction::Add
    } else {
        StateAction::Remove
    };
    change_wm_state(
        server,
        window,
        action,
        &[NET_WM_STATE_MAXIMIZED_VERT, NET_WM_STATE_MAXIMIZED_HORZ],
    );
}

pub(super) fn set_fullscreen(server: &X11Server, window: xlib::Window, enabled: bool) {
    if !server.ewmh_supported() {
        return;
    }

    set_bypass_compositor(server, window, enabled);

    let action = if enabled {
        StateAction::Add
    } else {
        StateAction::Remove
    };
    change_wm_state(server, window, action, &[NET_WM_STATE_FULLSCREEN]);
}

/// Gives the window input focus, preferring `_NET_ACTIVE_WINDOW` so the
/// window manager can honor focus-stealing prevention.
pub(super) fn focus_window(server: &X11Server, window: xlib::Window, last_input_time: xlib::Time) {
    let net_active_window = server.get_atom(NET_ACTIVE_WINDOW, false);
    if server.ewmh_supported() && net_active_window != 0 {
        send_client_message(
            server,
            window,
            net_active_window,
            [
                MESSAGE_SOURCE_APPLICATION,
                last_input_time as c_long,
                server.active_window() as c_long,
                0,
                0,
            ],
        );
    } else {
        let xlib = server.xlib();
        unsafe {
            (xlib.XRaiseWindow)(server.display(), window);
            (xlib.XSetInputFocus)(
                server.display(),
                window,
                xlib::RevertToPointerRoot,
                xlib::CurrentTime,
            );
        }
    }
}

pub(super) fn set_window_title(server: &X11Server, window: xlib::Window, title: &str) {
    let xlib = server.xlib();

    let net_wm_name = server.get_atom(NET_WM_NAME, false);
    let net_wm_icon_name = server.get_atom(NET_WM_ICON_NAME, false);
    let utf8_string = server.get_atom(UTF8_STRING, false);

    if server.ewmh_supported() && net_wm_name != 0 && net_wm_icon_name != 0 && utf8_string != 0 {
        for property in [net_wm_name, net_wm_icon_name] {
            unsafe {
                (xlib.XChangeProperty)(
                    server.display(),
                    window,
                    property,
                    utf8_string,
                    8,
                    xlib::PropModeReplace,
                    title.as_ptr(),
                    title.len() as c_int,
                );
            }
        }
    }

    // ICCCM fallback for window managers that ignore the EWMH properties.
    if let Ok(c_title) = CString::new(title) {
        unsafe {
            (xlib.XStoreName)(server.display(), window, c_title.as_ptr());
            (xlib.XSetIconName)(server.display(), window, c_title.as_ptr());
        }
    }
}

pub(super) fn window_title(server: &X11Server, window: xlib::Window) -> String {
    let net_wm_name = server.get_atom(NET_WM_NAME, false);
    let utf8_string = server.get_atom(UTF8_STRING, false);

    if server.ewmh_supported() && net_wm_name != 0 && utf8_string != 0 {
        let bytes = get_property_bytes(server, window, net_wm_name, utf8_string);
        if !bytes.is_empty() {
            return String::from_utf8_lossy(&bytes).into_owned();
        }
    }

    let xlib = server.xlib();
    let mut name: *mut c_char = ptr::null_mut();
    let status = unsafe { (xlib.XFetchName)(server.display(), window, &mut name) };
    if status == 0 || name.is_null() {
        return String::new();
    }

    let title = unsafe { std::ffi::CStr::from_ptr(name) }
        .to_string_lossy()
        .into_owned();
    unsafe { (xlib.XFree)(name.cast()) };
    title
}

/// Measures the window manager frame by comparing the window against its
/// reparented frame window.
pub(super) fn frame_extents(server: &X11Server, window: xlib::Window) -> FrameExtents {
    let xlib = server.xlib();

    let mut root: xlib::Window = 0;
    let mut parent: xlib::Window = 0;
    let mut children: *mut xlib::Window = ptr::null_mut();
    let mut children_count: u32 = 0;

    let status = unsafe {
        (xlib.XQueryTree)(
            server.display(),
            window,
            &mut root,
            &mut parent,
            &mut children,
            &mut children_count,
        )
    };
    if !children.is_null() {
        unsafe { (xlib.XFree)(children.cast()) };
    }
    if status == 0 || parent == 0 || parent == root {
        return FrameExtents::default();
    }

    let mut parent_attributes: xlib::XWindowAttributes = unsafe { mem::zeroed() };
    let mut window_attributes: xlib::XWindowAttributes = unsafe { mem::zeroed() };
    unsafe {
        if (xlib.XGetWindowAttributes)(server.display(), parent, &mut parent_attributes) == 0 {
            return FrameExtents::default();
        }
        if (xlib.XGetWindowAttributes)(server.display(), window, &mut window_attributes) == 0 {
            return FrameExtents::default();
        }
    }

    let mut window_x: c_int = 0;
    let mut window_y: c_int = 0;
    let mut child: xlib::Window = 0;
    unsafe {
        (xlib.XTranslateCoordinates)(
            server.display(),
            window,
            parent,
            0,
            0,
            &mut window_x,
            &mut window_y,
            &mut child,
        );
    }

    FrameExtents {
        left: window_x as c_long,
        top: window_y as c_long,
        right: (parent_attributes.width - (window_attributes.width + window_x)) as c_long,
        bottom: (parent_attributes.height - (window_attributes.height + window_y)) as c_long,
    }
}

/// Creates a 1x1 fully transparent cursor used to hide the pointer while it
/// is over the window.
pub(super) fn create_invisible_cursor(server: &X11Server, window: xlib::Window) -> xlib::Cursor {
    let xlib = server.xlib();

    let data: c_char = 0;
    let mut color: xlib::XColor = unsafe { mem::zeroed() };

    unsafe {
        let pixmap = (xlib.XCreateBitmapFromData)(server.display(), window, &data, 1, 1);
        if pixmap == 0 {
            return 0;
        }

        let cursor = (xlib.XCreatePixmapCursor)(
            server.display(),
            pixmap,
            pixmap,
            &mut color,
            &mut color,
            0,
            0,
        );
        (xlib.XFreePixmap)(server.display(), pixmap);
        cursor
    }
}

/// Publishes the owning process id so the window manager can match the
/// window to a client for `_NET_WM_PING` recovery.
pub(super) fn set_pid(server: &X11Server, window: xlib::Window) {
    let net_wm_pid = server.get_atom(NET_WM_PID, false);
    if net_wm_pid == 0 {
        return;
    }

    let pid = std::process::id() as c_ulong;
    unsafe {
        (server.xlib().XChangeProperty)(
            server.display(),
            window,
            net_wm_pid,
            xlib::XA_CARDINAL,
            32,
            xlib::PropModeReplace,
            (&pid as *const c_ulong).cast(),
            1,
        );
    }
}
