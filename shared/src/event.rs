use serde::{Deserialize, Serialize};
use std::fmt;

use crate::capabilities::{HttpResult, KvResult};
use crate::config::AppConfig;
use crate::form::{Attachment, InfoList};
use crate::model::BookingField;
use crate::navigation::Route;
use crate::submission::BookingAction;
use crate::validation::FormField;

// --- Typed IDs ---

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

typed_id!(CarId);
typed_id!(UserId);

// --- Event enum: effect results boxed ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Event {
    Noop,
    Configure(AppConfig),

    // Navigation & host
    Navigate(Route),
    NavigateBack,
    HostReported {
        user_agent: String,
        viewport_height: Option<f64>,
        inner_height: f64,
    },
    ViewportChanged {
        is_state_stable: bool,
        viewport_height: Option<f64>,
        inner_height: f64,
    },

    // Draft persistence
    DraftRestored(Box<KvResult>),
    DraftPersisted(Box<KvResult>),
    DraftCleared(Box<KvResult>),

    // Listing form
    FieldChanged {
        field: FormField,
        value: String,
    },
    FieldBlurred {
        field: FormField,
    },
    PhotosSelected(Vec<Attachment>),
    PhotoRemoved {
        index: usize,
    },
    DocumentsSelected(Vec<Attachment>),
    DocumentRemoved {
        index: usize,
    },
    InfoAdded {
        list: InfoList,
    },
    InfoEdited {
        list: InfoList,
        index: usize,
        value: String,
    },
    InfoRemoved {
        list: InfoList,
        index: usize,
    },
    SubmitRequested,
    SubmitCompleted(Box<HttpResult>),
    CancelRequested,

    // Booking
    BookingFieldChanged {
        field: BookingField,
        value: String,
    },
    BookingFieldCleared {
        field: BookingField,
    },
    BookingRequested {
        action: BookingAction,
    },
    BookingCompleted {
        action: BookingAction,
        result: Box<HttpResult>,
    },

    // Catalog
    CarsRequested,
    PageSelected {
        page: u32,
    },
    CarsLoaded {
        page: u32,
        result: Box<HttpResult>,
    },
    GalleryOpened {
        car_id: CarId,
        index: usize,
    },
    GalleryClosed,

    // Toast
    ToastDismissed,
    ToastTimerElapsed {
        generation: u64,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Configure(_) => "configure",
            Self::Navigate(_) => "navigate",
            Self::NavigateBack => "navigate_back",
            Self::HostReported { .. } => "host_reported",
            Self::ViewportChanged { .. } => "viewport_changed",
            Self::DraftRestored(_) => "draft_restored",
            Self::DraftPersisted(_) => "draft_persisted",
            Self::DraftCleared(_) => "draft_cleared",
            Self::FieldChanged { .. } => "field_changed",
            Self::FieldBlurred { .. } => "field_blurred",
            Self::PhotosSelected(_) => "photos_selected",
            Self::PhotoRemoved { .. } => "photo_removed",
            Self::DocumentsSelected(_) => "documents_selected",
            Self::DocumentRemoved { .. } => "document_removed",
            Self::InfoAdded { .. } => "info_added",
            Self::InfoEdited { .. } => "info_edited",
            Self::InfoRemoved { .. } => "info_removed",
            Self::SubmitRequested => "submit_requested",
            Self::SubmitCompleted(_) => "submit_completed",
            Self::CancelRequested => "cancel_requested",
            Self::BookingFieldChanged { .. } => "booking_field_changed",
            Self::BookingFieldCleared { .. } => "booking_field_cleared",
            Self::BookingRequested { .. } => "booking_requested",
            Self::BookingCompleted { .. } => "booking_completed",
            Self::CarsRequested => "cars_requested",
            Self::PageSelected { .. } => "page_selected",
            Self::CarsLoaded { .. } => "cars_loaded",
            Self::GalleryOpened { .. } => "gallery_opened",
            Self::GalleryClosed => "gallery_closed",
            Self::ToastDismissed => "toast_dismissed",
            Self::ToastTimerElapsed { .. } => "toast_timer_elapsed",
        }
    }

    /// Events originating from the user rather than from effect resolutions.
    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        !matches!(
            self,
            Self::Noop
                | Self::Configure(_)
                | Self::HostReported { .. }
                | Self::ViewportChanged { .. }
                | Self::DraftRestored(_)
                | Self::DraftPersisted(_)
                | Self::DraftCleared(_)
                | Self::SubmitCompleted(_)
                | Self::BookingCompleted { .. }
                | Self::CarsLoaded { .. }
                | Self::ToastTimerElapsed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_ids_serialize_as_strings() {
        let id = CarId::new("42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"42\"");
        assert_eq!(id.to_string(), "42");
        let parsed: UserId = serde_json::from_str("\"u-1\"").unwrap();
        assert_eq!(parsed.as_str(), "u-1");
    }

    #[test]
    fn test_event_serde_round_trip() {
        let event = Event::FieldChanged {
            field: FormField::VinNumber,
            value: "abc".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.name(), "field_changed");
    }

    #[test]
    fn test_user_initiated() {
        assert!(Event::SubmitRequested.is_user_initiated());
        assert!(!Event::ToastTimerElapsed { generation: 1 }.is_user_initiated());
    }
}
