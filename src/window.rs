//! The public window facade.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Mutex, PoisonError};

use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle,
};

use crate::callbacks::CallbacksHolder;
use crate::context::{Context, ContextSettings};
use crate::error::Error;
use crate::geometry::{CursorPosition, Position, ScrollOffset, Size};
use crate::input::{KeyCode, Modifiers, MouseButton};
use crate::os::{self, PlatformWindow};

/// Window display mode.
///
/// This is the mode last confirmed by the window manager, not the last one
/// requested. Switching modes is asynchronous; [`Window::process_events`]
/// applies confirmations as they arrive.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum State {
    Normal,
    Iconified,
    Maximized,
    Fullscreen,
}

static APPLICATION_NAME: Mutex<Option<String>> = Mutex::new(None);

pub(crate) fn application_name() -> String {
    APPLICATION_NAME
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_owned())
}

/// A native window with an OpenGL context.
///
/// All methods must be called from the thread that created the window; the
/// type is deliberately neither `Send` nor `Sync`. Event callbacks fire
/// synchronously from inside [`process_events`](Window::process_events) and
/// the modal waits some setters perform.
pub struct Window {
    platform_window: Box<dyn PlatformWindow>,
    callbacks: Rc<RefCell<CallbacksHolder>>,
}

impl Window {
    /// Creates a hidden window with the given title and client area size.
    ///
    /// The first window on a thread opens the display connection; further
    /// windows share it until the last one is dropped.
    pub fn new(title: &str, size: Size, settings: ContextSettings) -> Result<Self, Error> {
        let callbacks = Rc::new(RefCell::new(CallbacksHolder::default()));
        let platform_window =
            os::create_platform_window(title, size, settings, Rc::clone(&callbacks))?;

        Ok(Self {
            platform_window,
            callbacks,
        })
    }

    #[cfg(test)]
    pub(crate) fn new_with(
        build: impl FnOnce(Rc<RefCell<CallbacksHolder>>) -> Box<dyn PlatformWindow>,
    ) -> Self {
        let callbacks = Rc::new(RefCell::new(CallbacksHolder::default()));
        let platform_window = build(Rc::clone(&callbacks));

        Self {
            platform_window,
            callbacks,
        }
    }

    /// Sets the name used for OS-level window grouping (the X11 class hint).
    /// Takes effect for windows created afterwards.
    pub fn set_application_name(name: &str) {
        *APPLICATION_NAME
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(name.to_owned());
    }

    /// Maps the window on screen and waits for the window manager to confirm.
    /// Does nothing when the window is already visible.
    pub fn show(&mut self) {
        self.platform_window.show();
    }

    /// Unmaps the window. Does nothing when the window is already hidden.
    pub fn hide(&mut self) {
        self.platform_window.hide();
    }

    /// Asks the window manager for input focus. The request may be denied
    /// under focus-stealing prevention.
    pub fn focus(&mut self) {
        self.platform_window.focus();
    }

    pub fn iconify(&mut self) {
        self.platform_window.iconify();
    }

    pub fn maximize(&mut self) {
        self.platform_window.maximize();
    }

    pub fn fullscreen(&mut self) {
        self.platform_window.fullscreen();
    }

    /// Returns the window to [`State::Normal`], restoring the size and
    /// position it had before entering fullscreen or maximized mode.
    pub fn restore(&mut self) {
        self.platform_window.restore();
    }

    /// Resizes the client area. The size is clamped into the current min/max
    /// limits; non-positive sizes are ignored.
    pub fn resize(&mut self, size: Size) {
        self.platform_window.resize(size);
    }

    /// Moves the window so its frame's top-left corner lands on `position`.
    pub fn move_to(&mut self, position: Position) {
        self.platform_window.move_to(position);
    }

    /// Confines the cursor to the window. Idempotent.
    pub fn grab_cursor(&mut self) {
        self.platform_window.grab_cursor();
    }

    /// Releases a cursor grab. Idempotent.
    pub fn release_cursor(&mut self) {
        self.platform_window.release_cursor();
    }

    /// Flags the window for closing, as if the user had clicked the close
    /// button. The close callback fires at most once per window.
    pub fn request_close(&mut self) {
        self.platform_window.request_close();
    }

    /// Drains the native event queue, updating state and firing callbacks.
    /// Returns immediately when the queue is empty.
    pub fn process_events(&mut self) {
        self.platform_window.process_events();
    }

    /// Pumps events until `predicate` returns `false`, the window is flagged
    /// for closing, or an internal time limit expires.
    pub fn process_events_while(&mut self, mut predicate: impl FnMut() -> bool) {
        self.platform_window.process_events_while(&mut predicate);
    }

    /// Sets the minimum client area size. `{0, 0}` removes the limit. The
    /// current size is clamped to the new limits immediately.
    pub fn set_min_size(&mut self, size: Size) {
        self.platform_window.set_min_size(size);
    }

    /// Sets the maximum client area size. `{0, 0}` removes the limit. The
    /// current size is clamped to the new limits immediately.
    pub fn set_max_size(&mut self, size: Size) {
        self.platform_window.set_max_size(size);
    }

    /// Allows or forbids interactive resizing. Program-initiated
    /// [`resize`](Window::resize) keeps working either way.
    pub fn set_resizable(&mut self, resizable: bool) {
        self.platform_window.set_resizable(resizable);
    }

    pub fn set_title(&mut self, title: &str) {
        self.platform_window.set_title(title);
    }

    pub fn set_cursor_visible(&mut self, visible: bool) {
        self.platform_window.set_cursor_visible(visible);
    }

    pub fn position(&self) -> Position {
        self.platform_window.position()
    }

    pub fn size(&self) -> Size {
        self.platform_window.size()
    }

    pub fn min_size(&self) -> Size {
        self.platform_window.min_size()
    }

    pub fn max_size(&self) -> Size {
        self.platform_window.max_size()
    }

    pub fn title(&self) -> String {
        self.platform_window.title()
    }

    pub fn state(&self) -> State {
        self.platform_window.state()
    }

    pub fn is_visible(&self) -> bool {
        self.platform_window.is_visible()
    }

    pub fn has_input_focus(&self) -> bool {
        self.platform_window.has_input_focus()
    }

    pub fn is_resizable(&self) -> bool {
        self.platform_window.is_resizable()
    }

    pub fn is_cursor_grabbed(&self) -> bool {
        self.platform_window.is_cursor_grabbed()
    }

    pub fn is_cursor_visible(&self) -> bool {
        self.platform_window.is_cursor_visible()
    }

    /// True once the window was flagged for closing, either by the user or
    /// through [`request_close`](Window::request_close).
    pub fn should_close(&self) -> bool {
        self.platform_window.should_close()
    }

    pub fn context(&self) -> &dyn Context {
        self.platform_window.context()
    }

    pub fn context_mut(&mut self) -> &mut dyn Context {
        self.platform_window.context_mut()
    }

    pub fn set_on_show_callback(&mut self, callback: impl FnMut() + 'static) {
        self.callbacks.borrow_mut().on_show_callback = Some(Box::new(callback));
    }

    pub fn clear_on_show_callback(&mut self) {
        self.callbacks.borrow_mut().on_show_callback = None;
    }

    pub fn set_on_hide_callback(&mut self, callback: impl FnMut() + 'static) {
        self.callbacks.borrow_mut().on_hide_callback = Some(Box::new(callback));
    }

    pub fn clear_on_hide_callback(&mut self) {
        self.callbacks.borrow_mut().on_hide_callback = None;
    }

    pub fn set_on_close_callback(&mut self, callback: impl FnMut() + 'static) {
        self.callbacks.borrow_mut().on_close_callback = Some(Box::new(callback));
    }

    pub fn clear_on_close_callback(&mut self) {
        self.callbacks.borrow_mut().on_close_callback = None;
    }

    pub fn set_on_focus_callback(&mut self, callback: impl FnMut() + 'static) {
        self.callbacks.borrow_mut().on_focus_callback = Some(Box::new(callback));
    }

    pub fn clear_on_focus_callback(&mut self) {
        self.callbacks.borrow_mut().on_focus_callback = None;
    }

    pub fn set_on_lost_focus_callback(&mut self, callback: impl FnMut() + 'static) {
        self.callbacks.borrow_mut().on_lost_focus_callback = Some(Box::new(callback));
    }

    pub fn clear_on_lost_focus_callback(&mut self) {
        self.callbacks.borrow_mut().on_lost_focus_callback = None;
    }

    pub fn set_on_resize_callback(&mut self, callback: impl FnMut(Size) + 'static) {
        self.callbacks.borrow_mut().on_resize_callback = Some(Box::new(callback));
    }

    pub fn clear_on_resize_callback(&mut self) {
        self.callbacks.borrow_mut().on_resize_callback = None;
    }

    pub fn set_on_move_callback(&mut self, callback: impl FnMut(Position) + 'static) {
        self.callbacks.borrow_mut().on_move_callback = Some(Box::new(callback));
    }

    pub fn clear_on_move_callback(&mut self) {
        self.callbacks.borrow_mut().on_move_callback = None;
    }

    pub fn set_on_key_down_callback(&mut self, callback: impl FnMut(KeyCode, Modifiers) + 'static) {
        self.callbacks.borrow_mut().on_key_down_callback = Some(Box::new(callback));
    }

    pub fn clear_on_key_down_callback(&mut self) {
        self.callbacks.borrow_mut().on_key_down_callback = None;
    }

    pub fn set_on_key_up_callback(&mut self, callback: impl FnMut(KeyCode, Modifiers) + 'static) {
        self.callbacks.borrow_mut().on_key_up_callback = Some(Box::new(callback));
    }

    pub fn clear_on_key_up_callback(&mut self) {
        self.callbacks.borrow_mut().on_key_up_callback = None;
    }

    pub fn set_on_character_callback(&mut self, callback: impl FnMut(&str) + 'static) {
        self.callbacks.borrow_mut().on_character_callback = Some(Box::new(callback));
    }

    pub fn clear_on_character_callback(&mut self) {
        self.callbacks.borrow_mut().on_character_callback = None;
    }

    pub fn set_on_mouse_move_callback(
        &mut self,
        callback: impl FnMut(CursorPosition) + 'static,
    ) {
        self.callbacks.borrow_mut().on_mouse_move_callback = Some(Box::new(callback));
    }

    pub fn clear_on_mouse_move_callback(&mut self) {
        self.callbacks.borrow_mut().on_mouse_move_callback = None;
    }

    pub fn set_on_mouse_button_down_callback(
        &mut self,
        callback: impl FnMut(MouseButton, CursorPosition, Modifiers) + 'static,
    ) {
        self.callbacks.borrow_mut().on_mouse_button_down_callback = Some(Box::new(callback));
    }

    pub fn clear_on_mouse_button_down_callback(&mut self) {
        self.callbacks.borrow_mut().on_mouse_button_down_callback = None;
    }

    pub fn set_on_mouse_button_up_callback(
        &mut self,
        callback: impl FnMut(MouseButton, CursorPosition, Modifiers) + 'static,
    ) {
        self.callbacks.borrow_mut().on_mouse_button_up_callback = Some(Box::new(callback));
    }

    pub fn clear_on_mouse_button_up_callback(&mut self) {
        self.callbacks.borrow_mut().on_mouse_button_up_callback = None;
    }

    pub fn set_on_mouse_scroll_callback(
        &mut self,
        callback: impl FnMut(ScrollOffset) + 'static,
    ) {
        self.callbacks.borrow_mut().on_mouse_scroll_callback = Some(Box::new(callback));
    }

    pub fn clear_on_mouse_scroll_callback(&mut self) {
        self.callbacks.borrow_mut().on_mouse_scroll_callback = None;
    }

    pub fn set_on_mouse_enter_callback(&mut self, callback: impl FnMut() + 'static) {
        self.callbacks.borrow_mut().on_mouse_enter_callback = Some(Box::new(callback));
    }

    pub fn clear_on_mouse_enter_callback(&mut self) {
        self.callbacks.borrow_mut().on_mouse_enter_callback = None;
    }

    pub fn set_on_mouse_leave_callback(&mut self, callback: impl FnMut() + 'static) {
        self.callbacks.borrow_mut().on_mouse_leave_callback = Some(Box::new(callback));
    }

    pub fn clear_on_mouse_leave_callback(&mut self) {
        self.callbacks.borrow_mut().on_mouse_leave_callback = None;
    }
}

impl HasWindowHandle for Window {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        self.platform_window.window_handle()
    }
}

impl HasDisplayHandle for Window {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        self.platform_window.display_handle()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use raw_window_handle::{RawDisplayHandle, RawWindowHandle, XlibDisplayHandle, XlibWindowHandle};

    use super::*;
    use crate::context::Api;
    use crate::os::StateData;

    #[derive(Copy, Clone)]
    enum MockEvent {
        Mapped,
        Unmapped,
        Configure(Size, Position),
        CloseRequest,
        FocusIn,
        FocusOut,
    }

    struct MockContext {
        settings: ContextSettings,
    }

    impl Context for MockContext {
        fn is_valid(&self) -> bool {
            true
        }

        fn is_current(&self) -> bool {
            false
        }

        fn api(&self) -> Api {
            Api::OpenGl
        }

        fn make_current(&self) {}

        fn swap_buffers(&self) {}

        fn settings(&self) -> &ContextSettings {
            &self.settings
        }

        fn get_proc_address(&self, _name: &str) -> *const std::ffi::c_void {
            std::ptr::null()
        }
    }

    /// In-memory platform window: mutators queue events the way a window
    /// manager would and `process_events` applies them.
    struct MockWindow {
        callbacks: Rc<RefCell<CallbacksHolder>>,
        state: StateData,
        queue: VecDeque<MockEvent>,
        context: MockContext,
        title: String,
    }

    impl MockWindow {
        fn new(callbacks: Rc<RefCell<CallbacksHolder>>, size: Size) -> Self {
            Self {
                callbacks,
                state: StateData::new(size),
                queue: VecDeque::new(),
                context: MockContext {
                    settings: ContextSettings::default(),
                },
                title: String::new(),
            }
        }

        // Mirrors the real backend: entering fullscreen or maximized from a
        // mapped normal window records the geometry restore() replays.
        fn save_normal_geometry(&mut self) {
            if self.state.mode == State::Normal && self.state.mapped {
                self.state.saved_size = self.state.size;
                self.state.saved_position = self.state.position;
            }
        }

        fn apply(&mut self, event: MockEvent) {
            match event {
                MockEvent::Mapped => {
                    if !self.state.mapped {
                        self.state.mapped = true;
                        self.callbacks.borrow_mut().on_show();
                    }
                }
                MockEvent::Unmapped => {
                    if self.state.mapped {
                        self.state.mapped = false;
                        self.callbacks.borrow_mut().on_hide();
                    }
                }
                MockEvent::Configure(size, position) => {
                    if self.state.size != size {
                        self.state.size = size;
                        self.callbacks.borrow_mut().on_resize(size);
                    }
                    if self.state.position != position {
                        self.state.position = position;
                        self.callbacks.borrow_mut().on_move(position);
                    }
                }
                MockEvent::CloseRequest => {
                    if self.state.request_close() {
                        self.callbacks.borrow_mut().on_close();
                    }
                }
                MockEvent::FocusIn => {
                    self.state.focused = true;
                    self.callbacks.borrow_mut().on_focus();
                }
                MockEvent::FocusOut => {
                    self.state.focused = false;
                    self.callbacks.borrow_mut().on_lost_focus();
                }
            }
        }
    }

    impl HasWindowHandle for MockWindow {
        fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
            let handle = XlibWindowHandle::new(1);
            Ok(unsafe { WindowHandle::borrow_raw(RawWindowHandle::Xlib(handle)) })
        }
    }

    impl HasDisplayHandle for MockWindow {
        fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
            let handle = XlibDisplayHandle::new(None, 0);
            Ok(unsafe { DisplayHandle::borrow_raw(RawDisplayHandle::Xlib(handle)) })
        }
    }

    impl PlatformWindow for MockWindow {
        fn show(&mut self) {
            if !self.state.mapped && !self.queue.iter().any(|e| matches!(e, MockEvent::Mapped)) {
                self.queue.push_back(MockEvent::Mapped);
            }
        }

        fn hide(&mut self) {
            if self.state.mapped {
                self.queue.push_back(MockEvent::Unmapped);
            }
        }

        fn focus(&mut self) {
            self.queue.push_back(MockEvent::FocusIn);
        }

        fn iconify(&mut self) {
            self.state.mode = State::Iconified;
            self.queue.push_back(MockEvent::FocusOut);
        }

        fn maximize(&mut self) {
            self.save_normal_geometry();
            self.state.mode = State::Maximized;
        }

        fn fullscreen(&mut self) {
            self.save_normal_geometry();
            self.state.mode = State::Fullscreen;
            // The window manager resizes fullscreen windows to the screen.
            self.queue
                .push_back(MockEvent::Configure(Size::new(1920, 1080), Position::new(0, 0)));
        }

        fn restore(&mut self) {
            self.state.mode = State::Normal;
            self.queue.push_back(MockEvent::Configure(
                self.state.saved_size,
                self.state.saved_position,
            ));
        }

        fn resize(&mut self, size: Size) {
            if size.width <= 0 || size.height <= 0 {
                return;
            }
            let size = size.clamped(self.state.min_size, self.state.max_size);
            self.state.saved_size = size;
            self.queue
                .push_back(MockEvent::Configure(size, self.state.position));
        }

        fn move_to(&mut self, position: Position) {
            self.state.saved_position = position;
            self.queue
                .push_back(MockEvent::Configure(self.state.size, position));
        }

        fn grab_cursor(&mut self) {
            self.state.cursor_grabbed = true;
        }

        fn release_cursor(&mut self) {
            self.state.cursor_grabbed = false;
        }

        fn request_close(&mut self) {
            if self.state.request_close() {
                self.callbacks.borrow_mut().on_close();
            }
        }

        fn process_events(&mut self) {
            while !self.state.should_close() {
                let Some(event) = self.queue.pop_front() else {
                    break;
                };
                self.apply(event);
            }
        }

        fn process_events_while(&mut self, predicate: &mut dyn FnMut() -> bool) {
            while predicate() && !self.state.should_close() && !self.queue.is_empty() {
                self.process_events();
            }
        }

        fn set_min_size(&mut self, size: Size) {
            self.state.min_size = size;
            let clamped = self.state.size.clamped(self.state.min_size, self.state.max_size);
            if clamped != self.state.size {
                self.resize(clamped);
            }
        }

        fn set_max_size(&mut self, size: Size) {
            self.state.max_size = size;
            let clamped = self.state.size.clamped(self.state.min_size, self.state.max_size);
            if clamped != self.state.size {
                self.resize(clamped);
            }
        }

        fn set_resizable(&mut self, resizable: bool) {
            self.state.resizable = resizable;
        }

        fn set_title(&mut self, title: &str) {
            self.title = title.to_owned();
        }

        fn set_cursor_visible(&mut self, visible: bool) {
            self.state.cursor_visible = visible;
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
            self.title.clone()
        }

        fn state(&self) -> State {
            self.state.mode
        }

        fn is_visible(&self) -> bool {
            self.state.mapped
        }

        fn has_input_focus(&self) -> bool {
            self.state.focused
        }

        fn is_resizable(&self) -> bool {
            self.state.resizable
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

    fn mock_window(size: Size) -> Window {
        Window::new_with(|callbacks| Box::new(MockWindow::new(callbacks, size)))
    }

    #[test]
    fn show_fires_once_until_hidden() {
        let mut window = mock_window(Size::new(800, 600));

        let shown = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&shown);
        window.set_on_show_callback(move || *counter.borrow_mut() += 1);

        window.show();
        window.process_events();
        assert!(window.is_visible());
        assert_eq!(*shown.borrow(), 1);

        // Already visible: no second event, no second callback.
        window.show();
        window.process_events();
        assert_eq!(*shown.borrow(), 1);

        window.hide();
        window.process_events();
        assert!(!window.is_visible());

        window.show();
        window.process_events();
        assert_eq!(*shown.borrow(), 2);
    }

    #[test]
    fn size_limits_clamp_the_current_size() {
        let mut window = mock_window(Size::new(300, 200));

        window.set_min_size(Size::new(640, 480));
        window.process_events();
        assert_eq!(window.size(), Size::new(640, 480));

        window.set_max_size(Size::new(500, 500));
        window.process_events();
        assert_eq!(window.size(), Size::new(500, 480));

        window.resize(Size::new(10_000, 10));
        window.process_events();
        assert_eq!(window.size(), Size::new(500, 480));
    }

    #[test]
    fn non_resizable_window_still_resizes_on_request() {
        let mut window = mock_window(Size::new(800, 600));
        window.set_resizable(false);
        assert!(!window.is_resizable());

        window.resize(Size::new(1024, 768));
        window.process_events();
        assert_eq!(window.size(), Size::new(1024, 768));
    }

    #[test]
    fn cleared_callback_stops_firing_but_state_still_updates() {
        let mut window = mock_window(Size::new(800, 600));
        window.show();
        window.process_events();

        let resizes = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&resizes);
        window.set_on_resize_callback(move |size| log.borrow_mut().push(size));

        window.resize(Size::new(640, 480));
        window.process_events();
        assert_eq!(resizes.borrow().as_slice(), &[Size::new(640, 480)]);

        window.clear_on_resize_callback();
        window.resize(Size::new(400, 300));
        window.process_events();

        assert_eq!(resizes.borrow().len(), 1);
        assert_eq!(window.size(), Size::new(400, 300));
    }

    #[test]
    fn close_callback_fires_at_most_once() {
        let mut window = mock_window(Size::new(800, 600));

        let closed = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&closed);
        window.set_on_close_callback(move || *counter.borrow_mut() += 1);

        window.request_close();
        assert!(window.should_close());
        assert_eq!(*closed.borrow(), 1);

        window.request_close();
        window.process_events();
        assert_eq!(*closed.borrow(), 1);
    }

    #[test]
    fn restore_returns_to_pre_fullscreen_geometry() {
        let mut window = mock_window(Size::new(800, 600));
        window.show();
        window.process_events();

        window.resize(Size::new(1024, 768));
        window.process_events();
        window.move_to(Position::new(40, 30));
        window.process_events();

        window.fullscreen();
        window.process_events();
        assert_eq!(window.state(), State::Fullscreen);
        assert_ne!(window.size(), Size::new(1024, 768));

        window.restore();
        window.process_events();
        assert_eq!(window.state(), State::Normal);
        assert_eq!(window.size(), Size::new(1024, 768));
        assert_eq!(window.position(), Position::new(40, 30));
    }

    #[test]
    fn focus_events_toggle_input_focus() {
        let mut window = mock_window(Size::new(800, 600));
        window.show();
        window.focus();
        window.process_events();
        assert!(window.has_input_focus());

        window.iconify();
        window.process_events();
        assert!(!window.has_input_focus());
        assert_eq!(window.state(), State::Iconified);
    }
}
