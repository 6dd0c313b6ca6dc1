pub mod game;
pub mod remote;
pub mod team;
pub mod window;
