//! iOS viewport height correction.
//!
//! WebKit on iOS reports a window height that includes the area hidden behind
//! the Telegram chrome. The host reports both heights; on iOS the view exposes
//! a CSS variable override carrying the usable height.

use lazy_static::lazy_static;
use regex::Regex;

pub const CSS_VARIABLE: &str = "--tg-viewport-height";

lazy_static! {
    static ref REGEX_IOS_AGENT: Regex = Regex::new(r"iPad|iPhone|iPod").unwrap();
}

pub fn is_ios(user_agent: &str) -> bool {
    REGEX_IOS_AGENT.is_match(user_agent)
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewportFix {
    ios: bool,
    height_px: Option<f64>,
}

impl ViewportFix {
    /// Initial report when the app starts.
    pub fn report(&mut self, user_agent: &str, viewport_height: Option<f64>, inner_height: f64) {
        self.ios = is_ios(user_agent);
        self.height_px = if self.ios {
            effective_height(viewport_height, inner_height)
        } else {
            None
        };
    }

    /// Host viewport change. Intermediate heights during a resize animation are ignored.
    pub fn changed(&mut self, is_state_stable: bool, viewport_height: Option<f64>, inner_height: f64) -> bool {
        if !self.ios || !is_state_stable {
            return false;
        }
        let next = effective_height(viewport_height, inner_height);
        if next == self.height_px {
            return false;
        }
        self.height_px = next;
        true
    }

    pub fn is_ios(&self) -> bool {
        self.ios
    }

    pub fn height_px(&self) -> Option<f64> {
        self.height_px
    }

    pub fn css_value(&self) -> Option<String> {
        self.height_px.map(|h| format!("{h}px"))
    }
}

/// A missing or zero Telegram height falls back to the window height.
fn effective_height(viewport_height: Option<f64>, inner_height: f64) -> Option<f64> {
    viewport_height
        .filter(|h| h.is_finite() && *h > 0.0)
        .or(Some(inner_height).filter(|h| h.is_finite() && *h > 0.0))
}
