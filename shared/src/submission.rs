//! Remote listing API: creation (multipart POST) and booking sub-resource.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::capabilities::{HttpError, HttpRequest, HttpResult};
use crate::event::{CarId, UserId};
use crate::form::{Attachment, ListingDraft};
use crate::model::{BookingForm, RestrictionType, TransmissionType};
use crate::multipart::{MultipartError, MultipartForm};
use crate::validation::{parse_buyout_date, FormField, MSG_PHOTOS_REQUIRED};
use crate::{AppError, ErrorKind};

pub const MSG_CREATED: &str = "Автомобиль успешно добавлен";
pub const MSG_CREATE_FAILED: &str = "Не удалось добавить автомобиль. Попробуйте позже";
pub const MSG_SUBMIT_UNKNOWN: &str = "Произошла неизвестная ошибка при отправке формы";
pub const MSG_SUBMIT_IN_FLIGHT: &str = "Отправка уже выполняется";
pub const MSG_BOOKED: &str = "Автомобиль забронирован";
pub const MSG_BOOKING_CANCELLED: &str = "Бронирование отменено";
pub const MSG_BOOKING_REJECTED: &str = "Не удалось выполнить операцию бронирования";
pub const MSG_BOOKING_FAILED: &str = "Ошибка бронирования. Попробуйте позже";
pub const MSG_BOOKING_INCOMPLETE: &str = "Укажите ID автомобиля и пользователя";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SubmissionError {
    #[error("no photos attached")]
    MissingPhotos,

    #[error("field {field:?} has unparseable value '{value}'")]
    InvalidField { field: FormField, value: String },

    #[error("booking needs both a car id and a user id")]
    IncompleteBooking,

    #[error("multipart encoding failed: {0}")]
    Multipart(#[from] MultipartError),

    #[error("request construction failed: {0}")]
    Http(#[from] HttpError),
}

impl From<SubmissionError> for AppError {
    fn from(e: SubmissionError) -> Self {
        let internal = e.to_string();
        match e {
            SubmissionError::MissingPhotos => AppError::new(ErrorKind::Validation, MSG_PHOTOS_REQUIRED),
            SubmissionError::IncompleteBooking => {
                AppError::new(ErrorKind::Validation, MSG_BOOKING_INCOMPLETE)
            }
            SubmissionError::InvalidField { field, .. } => {
                AppError::new(ErrorKind::Validation, MSG_SUBMIT_UNKNOWN)
                    .with_context("field", format!("{field:?}"))
            }
            SubmissionError::Multipart(_) => AppError::new(ErrorKind::Serialization, MSG_SUBMIT_UNKNOWN),
            SubmissionError::Http(_) => AppError::new(ErrorKind::Internal, MSG_SUBMIT_UNKNOWN),
        }
        .with_internal(internal)
    }
}

/// JSON metadata part of the creation request, in the remote schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCarRequest {
    pub accident_count: u32,
    pub engine_power: u32,
    pub vin_number: String,
    pub licence_plate: String,
    pub restriction_type: RestrictionType,
    pub retail_price: u64,
    pub brand: String,
    pub minimal_price: u64,
    pub model: String,
    pub problem_info: Vec<String>,
    pub has_ndc: bool,
    pub additional_info: Vec<String>,
    pub production_year: i32,
    pub actual_price: u64,
    /// `YYYY-MM-DD`
    pub bit_date: String,
    pub owner_count: u32,
    pub engine_volume: f64,
    pub transmission_type: TransmissionType,
}

impl TryFrom<&ListingDraft> for CreateCarRequest {
    type Error = SubmissionError;

    fn try_from(draft: &ListingDraft) -> Result<Self, Self::Error> {
        let bit_date = parse_buyout_date(&draft.bit_date)
            .ok_or_else(|| invalid(FormField::BitDate, &draft.bit_date))?
            .format("%Y-%m-%d")
            .to_string();

        Ok(Self {
            accident_count: 0,
            engine_power: parse_field(FormField::EnginePower, &draft.engine_power)?,
            vin_number: draft.vin_number.clone(),
            licence_plate: draft.registration_number.clone(),
            restriction_type: draft.restriction_type,
            retail_price: parse_field(FormField::RetailPrice, &draft.retail_price)?,
            brand: draft.brand.trim().to_string(),
            minimal_price: parse_field(FormField::MinimalPrice, &draft.minimal_price)?,
            model: draft.model.trim().to_string(),
            problem_info: non_blank(&draft.problem_info),
            has_ndc: false,
            additional_info: non_blank(&draft.additional_info),
            production_year: parse_field(FormField::Year, &draft.year)?,
            actual_price: parse_field(FormField::CurrentPrice, &draft.current_price)?,
            bit_date,
            owner_count: parse_field(FormField::OwnerCount, &draft.owner_count)?,
            engine_volume: parse_field(FormField::EngineVolume, &draft.engine_volume)?,
            transmission_type: draft.transmission_type,
        })
    }
}

fn invalid(field: FormField, value: &str) -> SubmissionError {
    SubmissionError::InvalidField {
        field,
        value: value.to_string(),
    }
}

fn parse_field<T: std::str::FromStr>(field: FormField, value: &str) -> Result<T, SubmissionError> {
    value.trim().parse().map_err(|_| invalid(field, value))
}

fn non_blank(items: &[String]) -> Vec<String> {
    items
        .iter()
        .filter(|item| !item.trim().is_empty())
        .cloned()
        .collect()
}

/// `{prefix}_{millis}_{random}.{ext}`, keeping the original extension.
pub fn unique_file_name(prefix: &str, attachment: &Attachment, fallback_ext: &str, now_ms: i64) -> String {
    let ext = attachment.extension().unwrap_or(fallback_ext);
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}_{now_ms}_{}.{ext}", &random[..8])
}

/// Appends path segments to the API base, percent-encoding each one.
pub fn endpoint(base: &str, segments: &[&str]) -> Result<String, HttpError> {
    let mut url = Url::parse(base).map_err(|e| HttpError::InvalidUrl {
        url: base.to_string(),
        reason: e.to_string(),
    })?;
    url.path_segments_mut()
        .map_err(|()| HttpError::InvalidUrl {
            url: base.to_string(),
            reason: "URL cannot be a base".to_string(),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url.into())
}

/// Builds the single `POST /api/cars` request. The `car` part precedes all file parts.
pub fn create_listing_request(
    base_url: &str,
    draft: &ListingDraft,
    photos: &[Attachment],
    documents: &[Attachment],
) -> Result<HttpRequest, SubmissionError> {
    if photos.is_empty() {
        return Err(SubmissionError::MissingPhotos);
    }

    let car = CreateCarRequest::try_from(draft)?;
    let now_ms = chrono::Utc::now().timestamp_millis();

    let mut form = MultipartForm::new();
    form.json_part("car", &car)?;
    for photo in photos {
        let name = unique_file_name("photo", photo, "jpg", now_ms);
        form.file_part("photos", &name, &photo.mime_type, &photo.data)?;
    }
    for document in documents {
        let name = unique_file_name("doc", document, "pdf", now_ms);
        form.file_part("documents", &name, &document.mime_type, &document.data)?;
    }

    let content_type = form.content_type();
    let body = form.finish();

    let request = HttpRequest::post(endpoint(base_url, &["api", "cars"])?)?
        .with_header("Accept", "application/json")?
        .with_header("Content-Type", content_type)?
        .with_body(body)?;

    Ok(request)
}

/// Only `201 Created` counts as success.
pub fn interpret_create(result: &HttpResult) -> Result<(), AppError> {
    match result {
        Ok(response) if response.status() == 201 => Ok(()),
        Ok(response) => Err(AppError::from_http_status(
            response.status(),
            Some(response.body()),
            MSG_CREATE_FAILED,
        )),
        Err(e) => Err(AppError::from_transport(e, MSG_CREATE_FAILED)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingAction {
    Book,
    Cancel,
}

impl BookingAction {
    pub const fn success_message(self) -> &'static str {
        match self {
            Self::Book => MSG_BOOKED,
            Self::Cancel => MSG_BOOKING_CANCELLED,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Book => "book",
            Self::Cancel => "cancel",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub car_id: CarId,
    pub user_id: UserId,
}

impl TryFrom<&BookingForm> for BookingRequest {
    type Error = SubmissionError;

    fn try_from(form: &BookingForm) -> Result<Self, Self::Error> {
        if !form.is_complete() {
            return Err(SubmissionError::IncompleteBooking);
        }
        Ok(Self {
            car_id: CarId::new(form.car_id.trim()),
            user_id: UserId::new(form.user_id.trim()),
        })
    }
}

impl BookingRequest {
    /// `POST` books, `DELETE` cancels; both on `/api/cars/{carId}/book/{userId}`.
    pub fn to_http(&self, base_url: &str, action: BookingAction) -> Result<HttpRequest, SubmissionError> {
        let url = endpoint(
            base_url,
            &["api", "cars", self.car_id.as_str(), "book", self.user_id.as_str()],
        )?;
        let request = match action {
            BookingAction::Book => HttpRequest::post(url)?,
            BookingAction::Cancel => HttpRequest::delete(url)?,
        };
        Ok(request.with_header("Accept", "application/json")?)
    }
}

/// Only `200 OK` counts as success.
pub fn interpret_booking(result: &HttpResult) -> Result<(), AppError> {
    match result {
        Ok(response) if response.status() == 200 => Ok(()),
        Ok(response) if response.status() == 400 => Err(AppError::from_http_status(
            400,
            Some(response.body()),
            MSG_BOOKING_REJECTED,
        )),
        Ok(response) => Err(AppError::from_http_status(
            response.status(),
            Some(response.body()),
            MSG_BOOKING_FAILED,
        )),
        Err(e) => Err(AppError::from_transport(e, MSG_BOOKING_FAILED)),
    }
}
