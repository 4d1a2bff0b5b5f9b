//! Per-event callback slots shared between the [`Window`](crate::Window)
//! facade and its platform window.
//!
//! One optional handler per event kind; invoking an unset slot does nothing.
//! Dispatch is synchronous on whichever thread called `process_events` and
//! there is no queuing. The invokers for privileged events (close, focus,
//! mouse crossing/motion) are crate-private so applications can only register
//! handlers, never fire them.

use crate::geometry::{CursorPosition, Position, ScrollOffset, Size};
use crate::input::{KeyCode, Modifiers, MouseButton};

#[derive(Default)]
pub(crate) struct CallbacksHolder {
    pub(crate) on_show_callback: Option<Box<dyn FnMut()>>,
    pub(crate) on_hide_callback: Option<Box<dyn FnMut()>>,
    pub(crate) on_close_callback: Option<Box<dyn FnMut()>>,
    pub(crate) on_focus_callback: Option<Box<dyn FnMut()>>,
    pub(crate) on_lost_focus_callback: Option<Box<dyn FnMut()>>,
    pub(crate) on_resize_callback: Option<Box<dyn FnMut(Size)>>,
    pub(crate) on_move_callback: Option<Box<dyn FnMut(Position)>>,
    pub(crate) on_key_down_callback: Option<Box<dyn FnMut(KeyCode, Modifiers)>>,
    pub(crate) on_key_up_callback: Option<Box<dyn FnMut(KeyCode, Modifiers)>>,
    pub(crate) on_character_callback: Option<Box<dyn FnMut(&str)>>,
    pub(crate) on_mouse_move_callback: Option<Box<dyn FnMut(CursorPosition)>>,
    pub(crate) on_mouse_button_down_callback:
        Option<Box<dyn FnMut(MouseButton, CursorPosition, Modifiers)>>,
    pub(crate) on_mouse_button_up_callback:
        Option<Box<dyn FnMut(MouseButton, CursorPosition, Modifiers)>>,
    pub(crate) on_mouse_scroll_callback: Option<Box<dyn FnMut(ScrollOffset)>>,
    pub(crate) on_mouse_enter_callback: Option<Box<dyn FnMut()>>,
    pub(crate) on_mouse_leave_callback: Option<Box<dyn FnMut()>>,
}

impl CallbacksHolder {
    pub(crate) fn on_show(&mut self) {
        if let Some(callback) = &mut self.on_show_callback {
            callback();
        }
    }

    pub(crate) fn on_hide(&mut self) {
        if let Some(callback) = &mut self.on_hide_callback {
            callback();
        }
    }

    pub(crate) fn on_close(&mut self) {
        if let Some(callback) = &mut self.on_close_callback {
            callback();
        }
    }

    pub(crate) fn on_focus(&mut self) {
        if let Some(callback) = &mut self.on_focus_callback {
            callback();
        }
    }

    pub(crate) fn on_lost_focus(&mut self) {
        if let Some(callback) = &mut self.on_lost_focus_callback {
            callback();
        }
    }

    pub(crate) fn on_resize(&mut self, new_size: Size) {
        if let Some(callback) = &mut self.on_resize_callback {
            callback(new_size);
        }
    }

    pub(crate) fn on_move(&mut self, new_position: Position) {
        if let Some(callback) = &mut self.on_move_callback {
            callback(new_position);
        }
    }

    pub(crate) fn on_key_down(&mut self, key: KeyCode, modifiers: Modifiers) {
        if let Some(callback) = &mut self.on_key_down_callback {
            callback(key, modifiers);
        }
    }

    pub(crate) fn on_key_up(&mut self, key: KeyCode, modifiers: Modifiers) {
        if let Some(callback) = &mut self.on_key_up_callback {
            callback(key, modifiers);
        }
    }

    pub(crate) fn on_character(&mut self, text: &str) {
        if let Some(callback) = &mut self.on_character_callback {
            callback(text);
        }
    }

    pub(crate) fn on_mouse_move(&mut self, position: CursorPosition) {
        if let Some(callback) = &mut self.on_mouse_move_callback {
            callback(position);
        }
    }

    pub(crate) fn on_mouse_button_down(
        &mut self,
        button: MouseButton,
        position: CursorPosition,
        modifiers: Modifiers,
    ) {
        if let Some(callback) = &mut self.on_mouse_button_down_callback {
            callback(button, position, modifiers);
        }
    }

    pub(crate) fn on_mouse_button_up(
        &mut self,
        button: MouseButton,
        position: CursorPosition,
        modifiers: Modifiers,
    ) {
        if let Some(callback) = &mut self.on_mouse_button_up_callback {
            callback(button, position, modifiers);
        }
    }

    pub(crate) fn on_mouse_scroll(&mut self, offset: ScrollOffset) {
        if let Some(callback) = &mut self.on_mouse_scroll_callback {
            callback(offset);
        }
    }

    pub(crate) fn on_mouse_enter(&mut self) {
        if let Some(callback) = &mut self.on_mouse_enter_callback {
            callback();
        }
    }

    pub(crate) fn on_mouse_leave(&mut self) {
        if let Some(callback) = &mut self.on_mouse_leave_callback {
            callback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn unset_slot_is_a_noop() {
        let mut holder = CallbacksHolder::default();

        holder.on_show();
        holder.on_resize(Size::new(800, 600));
        holder.on_key_down(KeyCode::Space, Modifiers::empty());
    }

    #[test]
    fn set_slot_is_invoked_with_arguments() {
        let mut holder = CallbacksHolder::default();
        let seen = Rc::new(Cell::new(Size::default()));

        let sink = Rc::clone(&seen);
        holder.on_resize_callback = Some(Box::new(move |size| sink.set(size)));

        holder.on_resize(Size::new(640, 480));
        assert_eq!(seen.get(), Size::new(640, 480));
    }

    #[test]
    fn replacing_a_slot_drops_the_old_handler() {
        let mut holder = CallbacksHolder::default();
        let first = Rc::new(Cell::new(0u32));
        let second = Rc::new(Cell::new(0u32));

        let sink = Rc::clone(&first);
        holder.on_close_callback = Some(Box::new(move || sink.set(sink.get() + 1)));
        let sink = Rc::clone(&second);
        holder.on_close_callback = Some(Box::new(move || sink.set(sink.get() + 1)));

        holder.on_close();
        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn cleared_slot_stops_firing() {
        let mut holder = CallbacksHolder::default();
        let count = Rc::new(Cell::new(0u32));

        let sink = Rc::clone(&count);
        holder.on_mouse_enter_callback = Some(Box::new(move || sink.set(sink.get() + 1)));

        holder.on_mouse_enter();
        holder.on_mouse_enter_callback = None;
        holder.on_mouse_enter();

        assert_eq!(count.get(), 1);
    }
}
