pub mod commands;
pub mod shortcuts;
pub mod tray;
pub mod watchdog;
pub mod windows;
