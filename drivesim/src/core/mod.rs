pub mod camera;
pub mod collision;
pub mod game;
pub mod handle_game;
pub mod hud;
pub mod input;
pub mod scoring;
pub mod track;
pub mod vehicle;
