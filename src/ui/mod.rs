pub mod flappy_scene;

use crate::game::Snapshot;
use ratatui::Frame;

/// Main UI drawing function.
pub fn draw_ui(frame: &mut Frame, snap: &Snapshot, keyboard_mode: bool) {
    let size = frame.size();
    flappy_scene::render_game(frame, size, snap, keyboard_mode);
}
