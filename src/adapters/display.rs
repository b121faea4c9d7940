//! Display adapters.
//!
//! The controller only pushes to the display and never reads anything
//! back.  `none` discards everything; `log` mirrors the display to the
//! logger and remembers the last frame (handy on a headless box).

use log::info;

use crate::app::ports::DisplaySink;

/// Display backend `"none"`.
#[derive(Debug, Default)]
pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    fn show_temperature(&mut self, _value: f64) {}
    fn show_text(&mut self, _message: &str) {}
    fn clear(&mut self) {}
}

/// What a [`LogDisplay`] is currently showing.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Frame {
    #[default]
    Blank,
    Temperature(f64),
    Text(String),
}

/// Display backend `"log"`.
#[derive(Debug, Default)]
pub struct LogDisplay {
    frame: Frame,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }
}

impl DisplaySink for LogDisplay {
    fn show_temperature(&mut self, value: f64) {
        // Refreshes every half second; only log changes.
        if self.frame != Frame::Temperature(value) {
            log::debug!("DISP  | {value}");
            self.frame = Frame::Temperature(value);
        }
    }

    fn show_text(&mut self, message: &str) {
        info!("DISP  | {message}");
        self.frame = Frame::Text(message.to_owned());
    }

    fn clear(&mut self) {
        self.frame = Frame::Blank;
    }
}
