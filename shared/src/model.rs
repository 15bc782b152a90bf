use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::form::DraftForm;
use crate::navigation::Navigator;
use crate::submission::BookingAction;
use crate::toast::Toast;
use crate::validation::Validator;
use crate::viewport::ViewportFix;
use crate::AppError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TransmissionType {
    Manual,
    Automatic,
    Robot,
    Cvt,
    #[default]
    None,
}

impl TransmissionType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Manual => "Механика",
            Self::Automatic => "Автомат",
            Self::Robot => "Робот",
            Self::Cvt => "Вариатор",
            Self::None => "Не указано",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RestrictionType {
    Bailiff,
    Pledge,
    Tribunal,
    #[default]
    None,
}

impl RestrictionType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bailiff => "Пристав",
            Self::Pledge => "Залог",
            Self::Tribunal => "Судебка",
            Self::None => "Не указано",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BookingField {
    CarId,
    UserId,
}

/// Transient (car, user) pair for the booking view. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingForm {
    pub car_id: String,
    pub user_id: String,
}

impl BookingForm {
    pub fn set(&mut self, field: BookingField, value: impl Into<String>) {
        match field {
            BookingField::CarId => self.car_id = value.into(),
            BookingField::UserId => self.user_id = value.into(),
        }
    }

    pub fn clear(&mut self, field: BookingField) {
        self.set(field, String::new());
    }

    pub fn is_complete(&self) -> bool {
        !self.car_id.trim().is_empty() && !self.user_id.trim().is_empty()
    }
}

#[derive(Debug, Default)]
pub struct Model {
    /// Replaced by `Event::Configure`; defaults until the host sends one.
    pub config: AppConfig,
    /// Production-year bound, pinned to the calendar year the model was created in.
    pub validator: Validator,
    pub navigation: Navigator,
    pub draft: DraftForm,
    pub submitting: bool,
    pub booking: BookingForm,
    pub booking_in_flight: Option<BookingAction>,
    pub catalog: Catalog,
    pub toast: Toast,
    pub viewport: ViewportFix,
    pub last_error: Option<AppError>,
}

impl Model {
    pub fn set_error(&mut self, error: AppError) {
        self.last_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(TransmissionType::Cvt.to_string(), "CVT");
        assert_eq!("AUTOMATIC".parse::<TransmissionType>().unwrap(), TransmissionType::Automatic);
        assert_eq!(
            serde_json::to_string(&RestrictionType::Tribunal).unwrap(),
            "\"TRIBUNAL\""
        );
        assert!("automatic".parse::<TransmissionType>().is_err());
    }

    #[test]
    fn test_display_and_serde_agree() {
        for t in TransmissionType::iter() {
            assert_eq!(serde_json::to_string(&t).unwrap(), format!("\"{t}\""));
        }
        for r in RestrictionType::iter() {
            assert_eq!(serde_json::to_string(&r).unwrap(), format!("\"{r}\""));
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(TransmissionType::Robot.label(), "Робот");
        assert_eq!(RestrictionType::Bailiff.label(), "Пристав");
        assert_eq!(RestrictionType::default(), RestrictionType::None);
    }

    #[test]
    fn test_booking_form_completeness() {
        let mut form = BookingForm::default();
        assert!(!form.is_complete());
        form.set(BookingField::CarId, "42");
        form.set(BookingField::UserId, "  ");
        assert!(!form.is_complete());
        form.set(BookingField::UserId, "7");
        assert!(form.is_complete());
        form.clear(BookingField::CarId);
        assert_eq!(form.car_id, "");
    }
}
