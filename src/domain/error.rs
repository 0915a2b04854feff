use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize)]
pub enum AppError {
    Capture(String),
    HotkeyRegistration(String),
    MissingApiKey,
    Server { status: u16, message: String },
    Network(String),
    MalformedResponse(String),
    WindowLoad(String),
    Config(String),
    IoError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Capture(msg) => write!(f, "Capture failed: {}", msg),
            AppError::HotkeyRegistration(msg) => write!(f, "Hotkey registration failed: {}", msg),
            AppError::MissingApiKey => write!(f, "Please set a valid API key in settings"),
            AppError::Server { status, message } => {
                write!(f, "Server error: {} - {}", status, message)
            }
            AppError::Network(msg) => write!(
                f,
                "No response received from translation server: {}. Please check your internet connection.",
                msg
            ),
            AppError::MalformedResponse(msg) => {
                write!(f, "Invalid response format from translation API: {}", msg)
            }
            AppError::WindowLoad(msg) => write!(f, "Window failed to load: {}", msg),
            AppError::Config(msg) => write!(f, "Settings error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

// Implement std::error::Error so Tauri can properly serialize the error
impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
