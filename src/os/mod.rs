//! Platform window contract and platform specific backends.

use std::cell::RefCell;
use std::rc::Rc;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::callbacks::CallbacksHolder;
use crate::context::{Context, ContextSettings};
use crate::error::Error;
use crate::geometry::{Position, Size};
use crate::window::State;

#[cfg(target_os = "linux")]
mod x11;

/// Per-window flags and geometry owned by the platform window.
///
/// This is the single source of truth for state queries. Geometry fields hold
/// the last values confirmed by a native event, not the last values
/// requested; the window manager is free to clamp or reject requests.
pub(crate) struct StateData {
    pub size: Size,
    pub position: Position,
    /// Size/position to return to when leaving fullscreen or maximized mode.
    pub saved_size: Size,
    pub saved_position: Position,
    /// `{0,0}` means no limit on that side.
    pub min_size: Size,
    pub max_size: Size,
    pub mode: State,
    pub mapped: bool,
    pub focused: bool,
    pub resizable: bool,
    pub cursor_grabbed: bool,
    pub cursor_visible: bool,
    should_close: bool,
}

impl StateData {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            position: Position::default(),
            saved_size: size,
            saved_position: Position::default(),
            min_size: Size::default(),
            max_size: Size::default(),
            mode: State::Normal,
            mapped: false,
            focused: false,
            resizable: true,
            cursor_grabbed: false,
            cursor_visible: true,
            should_close: false,
        }
    }

    /// Latches the close flag. Returns `true` only on the first request so
    /// the close callback fires at most once.
    pub fn request_close(&mut self) -> bool {
        let first = !self.should_close;
        self.should_close = true;
        first
    }

    pub fn should_close(&self) -> bool {
        self.should_close
    }
}

/// Capability interface every platform backend implements.
///
/// Exactly one concrete implementation is compiled per target; the facade
/// still goes through the trait so the public surface stays
/// platform-agnostic. All mutators are requests: the authoritative state
/// change arrives through the native event queue and is applied by
/// `process_events`.
pub(crate) trait PlatformWindow: HasWindowHandle + HasDisplayHandle {
    fn show(&mut self);
    fn hide(&mut self);
    fn focus(&mut self);
    fn iconify(&mut self);
    fn maximize(&mut self);
    fn fullscreen(&mut self);
    fn restore(&mut self);
    fn resize(&mut self, size: Size);
    fn move_to(&mut self, position: Position);
    fn grab_cursor(&mut self);
    fn release_cursor(&mut self);
    fn request_close(&mut self);

    /// Drains the native event queue once without blocking.
    fn process_events(&mut self);
    /// Pumps events until `predicate` turns false, the close flag is set, or
    /// an internal safety limit expires. Used for modal waits on native
    /// confirmation events.
    fn process_events_while(&mut self, predicate: &mut dyn FnMut() -> bool);

    fn set_min_size(&mut self, size: Size);
    fn set_max_size(&mut self, size: Size);
    fn set_resizable(&mut self, resizable: bool);
    fn set_title(&mut self, title: &str);
    fn set_cursor_visible(&mut self, visible: bool);

    fn position(&self) -> Position;
    fn size(&self) -> Size;
    fn min_size(&self) -> Size;
    fn max_size(&self) -> Size;
    fn title(&self) -> String;
    fn state(&self) -> State;
    fn is_visible(&self) -> bool;
    fn has_input_focus(&self) -> bool;
    fn is_resizable(&self) -> bool;
    fn is_cursor_grabbed(&self) -> bool;
    fn is_cursor_visible(&self) -> bool;
    fn should_close(&self) -> bool;

    fn context(&self) -> &dyn Context;
    fn context_mut(&mut self) -> &mut dyn Context;
}

/// Creates the platform window for the current target.
#[allow(unused_variables)]
pub(crate) fn create_platform_window(
    title: &str,
    size: Size,
    settings: ContextSettings,
    callbacks: Rc<RefCell<CallbacksHolder>>,
) -> Result<Box<dyn PlatformWindow>, Error> {
    #[cfg(target_os = "linux")]
    {
        Ok(Box::new(x11::window::X11Window::new(
            title, size, settings, callbacks,
        )?))
    }

    #[cfg(not(target_os = "linux"))]
    {
        unimplemented!("This platform is not supported")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_flag_is_monotonic() {
        let mut state = StateData::new(Size::new(800, 600));

        assert!(!state.should_close());
        assert!(state.request_close());
        assert!(state.should_close());

        // Further requests keep the flag set and report "already closing".
        assert!(!state.request_close());
        assert!(state.should_close());
    }

    #[test]
    fn new_state_defaults() {
        let state = StateData::new(Size::new(640, 480));

        assert_eq!(state.size, Size::new(640, 480));
        assert_eq!(state.saved_size, Size::new(640, 480));
        assert_eq!(state.mode, State::Normal);
        assert!(state.resizable);
        assert!(state.cursor_visible);
        assert!(!state.mapped);
        assert!(!state.focused);
        assert!(!state.cursor_grabbed);
    }
}
