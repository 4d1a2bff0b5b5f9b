//! Integer value types shared by the whole windowing layer.

/// Size of a window's content area in pixels.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

/// Position of a window's top-left corner in screen coordinates.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// Cursor position inside a window. Zero is the top-left corner.
pub type CursorPosition = Position;

/// Scroll offset reported by [`on_mouse_scroll`](crate::Window::set_on_mouse_scroll_callback).
///
/// The offset is a fraction of a wheel delta of 120: `offset.y / 120 == 1`
/// is one step on a wheel with notches. A positive `y` means the wheel was
/// rotated away from the user, a positive `x` to the right.
pub type ScrollOffset = Position;

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Clamps the size into `[min, max]`. A zero component in either limit
    /// means that axis is unconstrained on that side.
    pub fn clamped(self, min: Size, max: Size) -> Size {
        let mut size = self;

        if min.width > 0 {
            size.width = size.width.max(min.width);
        }
        if min.height > 0 {
            size.height = size.height.max(min.height);
        }
        if max.width > 0 {
            size.width = size.width.min(max.width);
        }
        if max.height > 0 {
            size.height = size.height.min(max.height);
        }

        size
    }

    /// True when both limits allow this size.
    pub fn fits(self, min: Size, max: Size) -> bool {
        self.clamped(min, max) == self
    }
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_into_both_limits() {
        let min = Size::new(200, 100);
        let max = Size::new(800, 600);

        assert_eq!(Size::new(50, 50).clamped(min, max), Size::new(200, 100));
        assert_eq!(Size::new(1000, 700).clamped(min, max), Size::new(800, 600));
        assert_eq!(Size::new(400, 300).clamped(min, max), Size::new(400, 300));
    }

    #[test]
    fn zero_limit_means_unconstrained() {
        let no_limit = Size::new(0, 0);

        assert_eq!(Size::new(5000, 5000).clamped(no_limit, no_limit), Size::new(5000, 5000));
        assert_eq!(Size::new(10, 10).clamped(no_limit, Size::new(800, 600)), Size::new(10, 10));
    }

    #[test]
    fn fits_matches_clamped() {
        let min = Size::new(100, 100);
        let max = Size::new(200, 200);

        assert!(Size::new(150, 150).fits(min, max));
        assert!(!Size::new(50, 150).fits(min, max));
        assert!(!Size::new(150, 300).fits(min, max));
    }
}
