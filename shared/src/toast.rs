//! Single-slot transient notification.
//!
//! Each `show` bumps a generation counter. The auto-hide timer carries the
//! generation it was started for, so a timer left over from a replaced toast
//! cannot hide its successor early.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastMessage {
    pub message: String,
    pub kind: ToastKind,
}

impl ToastMessage {
    pub fn new(message: impl Into<String>, kind: ToastKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum ToastState {
    #[default]
    Hidden,
    Visible { toast: ToastMessage, generation: u64 },
}

#[derive(Debug, Clone, Default)]
pub struct Toast {
    state: ToastState,
    generation: u64,
}

impl Toast {
    /// Replaces whatever is showing. Returns the generation to arm the timer with.
    pub fn show(&mut self, message: impl Into<String>, kind: ToastKind) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.state = ToastState::Visible {
            toast: ToastMessage::new(message, kind),
            generation: self.generation,
        };
        self.generation
    }

    pub fn hide(&mut self) {
        self.state = ToastState::Hidden;
    }

    /// Timer callback. Hides only if `generation` is still the one on screen.
    pub fn expire(&mut self, generation: u64) -> bool {
        match &self.state {
            ToastState::Visible { generation: current, .. } if *current == generation => {
                self.state = ToastState::Hidden;
                true
            }
            _ => false,
        }
    }

    pub fn current(&self) -> Option<&ToastMessage> {
        match &self.state {
            ToastState::Visible { toast, .. } => Some(toast),
            ToastState::Hidden => None,
        }
    }

    pub fn is_visible(&self) -> bool {
        matches!(self.state, ToastState::Visible { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_then_expire() {
        let mut toast = Toast::default();
        assert!(!toast.is_visible());
        let generation = toast.show("Готово", ToastKind::Success);
        assert_eq!(toast.current().unwrap().message, "Готово");
        assert!(toast.expire(generation));
        assert!(toast.current().is_none());
    }

    #[test]
    fn test_stale_timer_does_not_hide_replacement() {
        let mut toast = Toast::default();
        let first = toast.show("first", ToastKind::Info);
        let second = toast.show("second", ToastKind::Error);
        assert_ne!(first, second);

        assert!(!toast.expire(first));
        assert_eq!(toast.current().unwrap().kind, ToastKind::Error);
        assert!(toast.expire(second));
    }

    #[test]
    fn test_manual_dismiss_then_late_timer() {
        let mut toast = Toast::default();
        let generation = toast.show("x", ToastKind::Warning);
        toast.hide();
        assert!(!toast.expire(generation));
        assert!(!toast.is_visible());
    }

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(serde_json::to_string(&ToastKind::Warning).unwrap(), "\"warning\"");
        assert_eq!(ToastKind::default(), ToastKind::Info);
    }
}
