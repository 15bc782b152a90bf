//! Field validation and keystroke normalisation for the listing form.
//!
//! Every field is checked independently. [`Validator::validate_form`] returns
//! the union of all failures; nothing short-circuits.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::form::ListingDraft;
use crate::model::{RestrictionType, TransmissionType};
use crate::{MAX_DOCUMENTS, MAX_ENGINE_VOLUME_LITERS, MAX_INFO_ITEMS, MAX_PHOTOS, MIN_PRODUCTION_YEAR};

lazy_static! {
    /// Russian civil plate: letter, three digits, two letters, two or three region digits.
    /// Letters are limited to the Cyrillic glyphs that have Latin look-alikes.
    pub static ref REGEX_REGISTRATION_PLATE: Regex =
        Regex::new(r"^[АВЕКМНОРСТУХ][0-9]{3}[АВЕКМНОРСТУХ]{2}[0-9]{2,3}$").unwrap();
    //
    pub static ref REGEX_VIN: Regex = Regex::new(r"^[A-HJ-NPR-Z0-9]{17}$").unwrap();
    //
    pub static ref REGEX_BUYOUT_DATE: Regex =
        Regex::new(r"^([0-9]{2})\.([0-9]{2})\.([0-9]{4})$").unwrap();
}

pub const MSG_BRAND: &str = "Укажите марку автомобиля";
pub const MSG_MODEL: &str = "Укажите модель автомобиля";
pub const MSG_PLATE: &str = "Неверный формат. Используйте только русские буквы";
pub const MSG_VIN: &str = "VIN должен содержать 17 символов";
pub const MSG_PRICE: &str = "Укажите корректную цену";
pub const MSG_POWER: &str = "Укажите корректную мощность двигателя";
pub const MSG_VOLUME: &str = "Укажите корректный объем двигателя";
pub const MSG_VOLUME_TOO_LARGE: &str = "Объем двигателя должен быть меньше 100 литров";
pub const MSG_VOLUME_PRECISION: &str = "Укажите не более одного знака после запятой";
pub const MSG_OWNERS: &str = "Должно быть больше или равно 0";
pub const MSG_RETAIL_PRICE: &str = "Укажите корректную розничную цену";
pub const MSG_MINIMAL_PRICE: &str = "Укажите корректную минимальную цену";
pub const MSG_DATE_REQUIRED: &str = "Укажите дату выкупа";
pub const MSG_DATE_FORMAT: &str = "Неверный формат даты";
pub const MSG_DATE_INVALID: &str = "Некорректная дата";
pub const MSG_TRANSMISSION: &str = "Выберите тип трансмиссии";
pub const MSG_RESTRICTION: &str = "Выберите тип ограничения";
pub const MSG_PHOTOS_REQUIRED: &str = "Добавьте хотя бы одну фотографию";
pub const MSG_PHOTOS_TOO_MANY: &str = "Максимум 10 фотографий";
pub const MSG_DOCUMENTS_REQUIRED: &str = "Добавьте хотя бы один документ";
pub const MSG_DOCUMENTS_TOO_MANY: &str = "Максимум 5 документов";
pub const MSG_INFO_TOO_MANY: &str = "Максимум 10 пунктов";

/// Every input of the listing form. Serialised names match the persisted draft keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    Brand,
    Model,
    RegistrationNumber,
    VinNumber,
    TransmissionType,
    RestrictionType,
    CurrentPrice,
    Year,
    EnginePower,
    EngineVolume,
    OwnerCount,
    RetailPrice,
    MinimalPrice,
    BitDate,
    Photos,
    Documents,
    AdditionalInfo,
    ProblemInfo,
}

impl FormField {
    /// Fields edited as a single string value.
    pub const SCALAR: [FormField; 14] = [
        FormField::Brand,
        FormField::Model,
        FormField::RegistrationNumber,
        FormField::VinNumber,
        FormField::TransmissionType,
        FormField::RestrictionType,
        FormField::CurrentPrice,
        FormField::Year,
        FormField::EnginePower,
        FormField::EngineVolume,
        FormField::OwnerCount,
        FormField::RetailPrice,
        FormField::MinimalPrice,
        FormField::BitDate,
    ];

    pub const fn is_scalar(self) -> bool {
        !matches!(
            self,
            FormField::Photos | FormField::Documents | FormField::AdditionalInfo | FormField::ProblemInfo
        )
    }
}

pub type FieldErrors = BTreeMap<FormField, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validator {
    current_year: i32,
}

impl Default for Validator {
    fn default() -> Self {
        Self::current()
    }
}

impl Validator {
    pub const fn new(current_year: i32) -> Self {
        Self { current_year }
    }

    /// Validator pinned to today's calendar year in local time.
    pub fn current() -> Self {
        Self::new(chrono::Local::now().year())
    }

    pub const fn current_year(&self) -> i32 {
        self.current_year
    }

    /// `None` means valid. Collection fields are checked by [`Self::validate_form`].
    pub fn validate_field(&self, field: FormField, value: &str) -> Option<String> {
        match field {
            FormField::Brand => required(value, MSG_BRAND),
            FormField::Model => required(value, MSG_MODEL),
            FormField::RegistrationNumber => {
                (!REGEX_REGISTRATION_PLATE.is_match(value)).then(|| MSG_PLATE.to_string())
            }
            FormField::VinNumber => (!is_valid_vin(value)).then(|| MSG_VIN.to_string()),
            FormField::TransmissionType => match value.parse::<TransmissionType>() {
                Ok(t) if t != TransmissionType::None => None,
                _ => Some(MSG_TRANSMISSION.to_string()),
            },
            FormField::RestrictionType => match value.parse::<RestrictionType>() {
                Ok(r) if r != RestrictionType::None => None,
                _ => Some(MSG_RESTRICTION.to_string()),
            },
            FormField::CurrentPrice => positive_integer(value, MSG_PRICE),
            FormField::RetailPrice => positive_integer(value, MSG_RETAIL_PRICE),
            FormField::MinimalPrice => positive_integer(value, MSG_MINIMAL_PRICE),
            FormField::EnginePower => non_negative_integer(value, MSG_POWER),
            FormField::OwnerCount => non_negative_integer(value, MSG_OWNERS),
            FormField::Year => self.validate_year(value),
            FormField::EngineVolume => validate_engine_volume(value),
            FormField::BitDate => validate_buyout_date(value),
            FormField::Photos
            | FormField::Documents
            | FormField::AdditionalInfo
            | FormField::ProblemInfo => None,
        }
    }

    pub fn validate_form(
        &self,
        draft: &ListingDraft,
        photo_count: usize,
        document_count: usize,
    ) -> FieldErrors {
        let mut errors: FieldErrors = FormField::SCALAR
            .iter()
            .filter_map(|&field| {
                self.validate_field(field, &draft.value(field))
                    .map(|message| (field, message))
            })
            .collect();

        if photo_count == 0 {
            errors.insert(FormField::Photos, MSG_PHOTOS_REQUIRED.to_string());
        } else if photo_count > MAX_PHOTOS {
            errors.insert(FormField::Photos, MSG_PHOTOS_TOO_MANY.to_string());
        }

        if document_count == 0 {
            errors.insert(FormField::Documents, MSG_DOCUMENTS_REQUIRED.to_string());
        } else if document_count > MAX_DOCUMENTS {
            errors.insert(FormField::Documents, MSG_DOCUMENTS_TOO_MANY.to_string());
        }

        if draft.additional_info.len() > MAX_INFO_ITEMS {
            errors.insert(FormField::AdditionalInfo, MSG_INFO_TOO_MANY.to_string());
        }
        if draft.problem_info.len() > MAX_INFO_ITEMS {
            errors.insert(FormField::ProblemInfo, MSG_INFO_TOO_MANY.to_string());
        }

        errors
    }

    fn validate_year(&self, value: &str) -> Option<String> {
        match parse_integer(value) {
            Some(year) if (i64::from(MIN_PRODUCTION_YEAR)..=i64::from(self.current_year)).contains(&year) => None,
            _ => Some(format!(
                "Год должен быть между {MIN_PRODUCTION_YEAR} и {}",
                self.current_year
            )),
        }
    }
}

pub fn is_valid_vin(value: &str) -> bool {
    REGEX_VIN.is_match(value)
}

pub fn is_valid_plate(value: &str) -> bool {
    REGEX_REGISTRATION_PLATE.is_match(value)
}

fn required(value: &str, message: &str) -> Option<String> {
    value.trim().is_empty().then(|| message.to_string())
}

/// Plain ASCII digits only; no sign, no whitespace.
fn parse_integer(value: &str) -> Option<i64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

fn positive_integer(value: &str, message: &str) -> Option<String> {
    match parse_integer(value) {
        Some(n) if n > 0 => None,
        _ => Some(message.to_string()),
    }
}

/// Must also fit the `u32` the listing API takes for power and owner count.
fn non_negative_integer(value: &str, message: &str) -> Option<String> {
    match parse_integer(value) {
        Some(n) if u32::try_from(n).is_ok() => None,
        _ => Some(message.to_string()),
    }
}

fn validate_engine_volume(value: &str) -> Option<String> {
    let volume = match value.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 && value.bytes().all(|b| b.is_ascii_digit() || b == b'.') => v,
        _ => return Some(MSG_VOLUME.to_string()),
    };

    if volume >= MAX_ENGINE_VOLUME_LITERS {
        return Some(MSG_VOLUME_TOO_LARGE.to_string());
    }

    match value.split_once('.') {
        Some((_, fraction)) if fraction.len() > 1 => Some(MSG_VOLUME_PRECISION.to_string()),
        _ => None,
    }
}

fn validate_buyout_date(value: &str) -> Option<String> {
    if value.is_empty() {
        return Some(MSG_DATE_REQUIRED.to_string());
    }
    if parse_buyout_date(value).is_some() {
        return None;
    }
    if REGEX_BUYOUT_DATE.is_match(value) {
        Some(MSG_DATE_INVALID.to_string())
    } else {
        Some(MSG_DATE_FORMAT.to_string())
    }
}

/// Parses `DD.MM.YYYY`, rejecting dates that do not exist on the calendar.
pub fn parse_buyout_date(value: &str) -> Option<NaiveDate> {
    let caps = REGEX_BUYOUT_DATE.captures(value)?;
    let day = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let year = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

// --- Keystroke normalisers ---

/// Re-punctuates digits as `DD`, `DD.MM` or `DD.MM.YYYY`. Digits past the eighth are dropped.
pub fn format_date(value: &str) -> String {
    let digits: String = value.chars().filter(char::is_ascii_digit).take(8).collect();
    match digits.len() {
        0..=2 => digits,
        3..=4 => format!("{}.{}", &digits[..2], &digits[2..]),
        _ => format!("{}.{}.{}", &digits[..2], &digits[2..4], &digits[4..]),
    }
}

pub fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Decimal input with one fractional digit at most: `"3,55"` becomes `"3.5"`.
pub fn normalize_engine_volume(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut fraction_digits: Option<usize> = None;

    for c in value.chars().map(|c| if c == ',' { '.' } else { c }) {
        match (c, fraction_digits) {
            ('.', None) => {
                out.push('.');
                fraction_digits = Some(0);
            }
            (d, None) if d.is_ascii_digit() => out.push(d),
            (d, Some(0)) if d.is_ascii_digit() => {
                out.push(d);
                fraction_digits = Some(1);
            }
            _ => {}
        }
    }

    out
}

/// Applies the per-field input mask. `None` means the keystroke is ignored.
pub fn normalize_input(field: FormField, value: &str) -> Option<String> {
    match field {
        FormField::RegistrationNumber | FormField::VinNumber => Some(value.to_uppercase()),
        FormField::BitDate => {
            let formatted = format_date(value);
            (formatted.chars().count() <= 10).then_some(formatted)
        }
        FormField::EngineVolume => Some(normalize_engine_volume(value)),
        FormField::CurrentPrice
        | FormField::Year
        | FormField::EnginePower
        | FormField::OwnerCount
        | FormField::RetailPrice
        | FormField::MinimalPrice => Some(digits_only(value)),
        FormField::Brand
        | FormField::Model
        | FormField::TransmissionType
        | FormField::RestrictionType
        | FormField::Photos
        | FormField::Documents
        | FormField::AdditionalInfo
        | FormField::ProblemInfo => Some(value.to_string()),
    }
}
