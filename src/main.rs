use std::thread;
use std::time::Duration;

use log::info;

use fenestra::{ContextSettings, Size, Window};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    Window::set_application_name("fenestra-demo");

    let mut window = Window::new("fenestra demo", Size::new(800, 600), ContextSettings::default())?;

    window.set_on_resize_callback(|size| info!("resized to {}x{}", size.width, size.height));
    window.set_on_move_callback(|position| info!("moved to {},{}", position.x, position.y));
    window.set_on_focus_callback(|| info!("focused"));
    window.set_on_lost_focus_callback(|| info!("focus lost"));
    window.set_on_key_down_callback(|key, modifiers| info!("key down: {key:?} {modifiers:?}"));
    window.set_on_character_callback(|text| info!("character: {text:?}"));
    window.set_on_close_callback(|| info!("close requested"));

    window.show();
    window.focus();
    window.context().make_current();

    info!("window is up: {:?}, {:?}", window.size(), window.state());

    while !window.should_close() {
        window.process_events();
        window.context().swap_buffers();
        thread::sleep(Duration::from_millis(16));
    }

    Ok(())
}
