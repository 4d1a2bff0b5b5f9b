//! Translation from Xlib key symbols and state masks to crate input types.

use std::ffi::{c_uint, c_ulong};

use x11_dl::keysym;
use x11_dl::xlib;

use crate::geometry::ScrollOffset;
use crate::input::{KeyCode, Modifiers, MouseButton};

/// Maps a key symbol to a layout-independent key code. Symbols with no
/// counterpart (dead keys, multimedia keys) return `None`.
pub(super) fn keysym_to_keycode(sym: c_ulong) -> Option<KeyCode> {
    let code = match sym as c_uint {
        keysym::XK_space => KeyCode::Space,
        keysym::XK_apostrophe => KeyCode::Apostrophe,
        keysym::XK_comma => KeyCode::Comma,
        keysym::XK_minus => KeyCode::Minus,
        keysym::XK_period => KeyCode::Period,
        keysym::XK_slash => KeyCode::Slash,
        keysym::XK_0 => KeyCode::Digit0,
        keysym::XK_1 => KeyCode::Digit1,
        keysym::XK_2 => KeyCode::Digit2,
        keysym::XK_3 => KeyCode::Digit3,
        keysym::XK_4 => KeyCode::Digit4,
        keysym::XK_5 => KeyCode::Digit5,
        keysym::XK_6 => KeyCode::Digit6,
        keysym::XK_7 => KeyCode::Digit7,
        keysym::XK_8 => KeyCode::Digit8,
        keysym::XK_9 => KeyCode::Digit9,
        keysym::XK_semicolon => KeyCode::Semicolon,
        keysym::XK_equal => KeyCode::Equal,
        keysym::XK_a | keysym::XK_A => KeyCode::A,
        keysym::XK_b | keysym::XK_B => KeyCode::B,
        keysym::XK_c | keysym::XK_C => KeyCode::C,
        keysym::XK_d | keysym::XK_D => KeyCode::D,
        keysym::XK_e | keysym::XK_E => KeyCode::E,
        keysym::XK_f | keysym::XK_F => KeyCode::F,
        keysym::XK_g | keysym::XK_G => KeyCode::G,
        keysym::XK_h | keysym::XK_H => KeyCode::H,
        keysym::XK_i | keysym::XK_I => KeyCode::I,
        keysym::XK_j | keysym::XK_J => KeyCode::J,
        keysym::XK_k | keysym::XK_K => KeyCode::K,
        keysym::XK_l | keysym::XK_L => KeyCode::L,
        keysym::XK_m | keysym::XK_M => KeyCode::M,
        keysym::XK_n | keysym::XK_N => KeyCode::N,
        keysym::XK_o | keysym::XK_O => KeyCode::O,
        keysym::XK_p | keysym::XK_P => KeyCode::P,
        keysym::XK_q | keysym::XK_Q => KeyCode::Q,
        keysym::XK_r | keysym::XK_R => KeyCode::R,
        keysym::XK_s | keysym::XK_S => KeyCode::S,
        keysym::XK_t | keysym::XK_T => KeyCode::T,
        keysym::XK_u | keysym::XK_U => KeyCode::U,
        keysym::XK_v | keysym::XK_V => KeyCode::V,
        keysym::XK_w | keysym::XK_W => KeyCode::W,
        keysym::XK_x | keysym::XK_X => KeyCode::X,
        keysym::XK_y | keysym::XK_Y => KeyCode::Y,
        keysym::XK_z | keysym::XK_Z => KeyCode::Z,
        keysym::XK_bracketleft => KeyCode::LeftBracket,
        keysym::XK_backslash => KeyCode::Backslash,
        keysym::XK_bracketright => KeyCode::RightBracket,
        keysym::XK_grave => KeyCode::GraveAccent,
        keysym::XK_section => KeyCode::Section,

        keysym::XK_Escape => KeyCode::Escape,
        keysym::XK_Return | keysym::XK_KP_Enter => KeyCode::Enter,
        keysym::XK_Tab => KeyCode::Tab,
        keysym::XK_BackSpace => KeyCode::Backspace,
        keysym::XK_Insert => KeyCode::Insert,
        keysym::XK_Delete => KeyCode::Delete,
        keysym::XK_Right => KeyCode::Right,
        keysym::XK_Left => KeyCode::Left,
        keysym::XK_Down => KeyCode::Down,
        keysym::XK_Up => KeyCode::Up,
        keysym::XK_Page_Up => KeyCode::PageUp,
        keysym::XK_Page_Down => KeyCode::PageDown,
        keysym::XK_Home => KeyCode::Home,
        keysym::XK_End => KeyCode::End,
        keysym::XK_Caps_Lock => KeyCode::CapsLock,
        keysym::XK_Scroll_Lock => KeyCode::ScrollLock,
        keysym::XK_Num_Lock => KeyCode::NumLock,
        keysym::XK_Print => KeyCode::PrintScreen,
        keysym::XK_Pause => KeyCode::Pause,

        keysym::XK_F1 => KeyCode::F1,
        keysym::XK_F2 => KeyCode::F2,
        keysym::XK_F3 => KeyCode::F3,
        keysym::XK_F4 => KeyCode::F4,
        keysym::XK_F5 => KeyCode::F5,
        keysym::XK_F6 => KeyCode::F6,
        keysym::XK_F7 => KeyCode::F7,
        keysym::XK_F8 => KeyCode::F8,
        keysym::XK_F9 => KeyCode::F9,
        keysym::XK_F10 => KeyCode::F10,
        keysym::XK_F11 => KeyCode::F11,
        keysym::XK_F12 => KeyCode::F12,
        keysym::XK_F13 => KeyCode::F13,
        keysym::XK_F14 => KeyCode::F14,
        keysym::XK_F15 => KeyCode::F15,
        keysym::XK_F16 => KeyCode::F16,
        keysym::XK_F17 => KeyCode::F17,
        keysym::XK_F18 => KeyCode::F18,
        keysym::XK_F19 => KeyCode::F19,
        keysym::XK_F20 => KeyCode::F20,
        keysym::XK_F21 => KeyCode::F21,
        keysym::XK_F22 => KeyCode::F22,
        keysym::XK_F23 => KeyCode::F23,
        keysym::XK_F24 => KeyCode::F24,

        keysym::XK_KP_0 => KeyCode::Numpad0,
        keysym::XK_KP_1 => KeyCode::Numpad1,
        keysym::XK_KP_2 => KeyCode::Numpad2,
        keysym::XK_KP_3 => KeyCode::Numpad3,
        keysym::XK_KP_4 => KeyCode::Numpad4,
        keysym::XK_KP_5 => KeyCode::Numpad5,
        keysym::XK_KP_6 => KeyCode::Numpad6,
        keysym::XK_KP_7 => KeyCode::Numpad7,
        keysym::XK_KP_8 => KeyCode::Numpad8,
        keysym::XK_KP_9 => KeyCode::Numpad9,
        keysym::XK_KP_Decimal => KeyCode::NumpadDecimal,
        keysym::XK_KP_Divide => KeyCode::NumpadDivide,
        keysym::XK_KP_Multiply => KeyCode::NumpadMultiply,
        keysym::XK_KP_Subtract => KeyCode::NumpadSubtract,
        keysym::XK_KP_Add => KeyCode::NumpadAdd,
        keysym::XK_KP_Separator => KeyCode::NumpadSeparator,

        keysym::XK_Shift_L => KeyCode::LeftShift,
        keysym::XK_Shift_R => KeyCode::RightShift,
        keysym::XK_Control_L => KeyCode::LeftControl,
        keysym::XK_Control_R => KeyCode::RightControl,
        keysym::XK_Alt_L => KeyCode::LeftAlt,
        keysym::XK_Alt_R => KeyCode::RightAlt,
        keysym::XK_Super_L => KeyCode::LeftSuper,
        keysym::XK_Super_R => KeyCode::RightSuper,

        _ => return None,
    };

    Some(code)
}

/// Extracts the modifier set from an event state mask.
pub(super) fn modifiers_from_state(state: c_uint) -> Modifiers {
    let mut modifiers = Modifiers::empty();

    if state & xlib::ShiftMask != 0 {
        modifiers |= Modifiers::SHIFT;
    }
    if state & xlib::ControlMask != 0 {
        modifiers |= Modifiers::CONTROL;
    }
    if state & xlib::Mod1Mask != 0 {
        modifiers |= Modifiers::ALT;
    }
    if state & xlib::Mod4Mask != 0 {
        modifiers |= Modifiers::SUPER;
    }
    if state & xlib::LockMask != 0 {
        modifiers |= Modifiers::CAPS_LOCK;
    }
    if state & xlib::Mod2Mask != 0 {
        modifiers |= Modifiers::NUM_LOCK;
    }

    modifiers
}

/// Maps an X button number to a mouse button. Buttons 4 through 7 are wheel
/// events and are reported through [`scroll_offset`] instead.
pub(super) fn map_button(button: c_uint) -> Option<MouseButton> {
    match button {
        xlib::Button1 => Some(MouseButton::Left),
        xlib::Button2 => Some(MouseButton::Middle),
        xlib::Button3 => Some(MouseButton::Right),
        8 => Some(MouseButton::Button4),
        9 => Some(MouseButton::Button5),
        _ => None,
    }
}

/// Maps a wheel button press to a scroll offset in the usual 120-unit
/// detents. Positive y scrolls up, positive x scrolls right.
pub(super) fn scroll_offset(button: c_uint) -> Option<ScrollOffset> {
    match button {
        xlib::Button4 => Some(ScrollOffset { x: 0, y: 120 }),
        xlib::Button5 => Some(ScrollOffset { x: 0, y: -120 }),
        6 => Some(ScrollOffset { x: -120, y: 0 }),
        7 => Some(ScrollOffset { x: 120, y: 0 }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_map_case_insensitively() {
        assert_eq!(
            keysym_to_keycode(keysym::XK_a as c_ulong),
            Some(KeyCode::A)
        );
        assert_eq!(
            keysym_to_keycode(keysym::XK_A as c_ulong),
            Some(KeyCode::A)
        );
    }

    #[test]
    fn unknown_keysym_is_none() {
        assert_eq!(keysym_to_keycode(0), None);
        // XF86AudioRaiseVolume
        assert_eq!(keysym_to_keycode(0x1008FF13), None);
    }

    #[test]
    fn state_mask_translates_to_modifiers() {
        let state = xlib::ShiftMask | xlib::ControlMask | xlib::Mod2Mask;
        let modifiers = modifiers_from_state(state);
        assert_eq!(
            modifiers,
            Modifiers::SHIFT | Modifiers::CONTROL | Modifiers::NUM_LOCK
        );
        assert_eq!(modifiers_from_state(0), Modifiers::empty());
    }

    #[test]
    fn wheel_buttons_are_scroll_not_buttons() {
        assert_eq!(map_button(xlib::Button4), None);
        assert_eq!(map_button(xlib::Button5), None);
        assert_eq!(scroll_offset(xlib::Button4), Some(ScrollOffset { x: 0, y: 120 }));
        assert_eq!(scroll_offset(xlib::Button1), None);
        assert_eq!(map_button(xlib::Button1), Some(MouseButton::Left));
        assert_eq!(map_button(8), Some(MouseButton::Button4));
    }
}
