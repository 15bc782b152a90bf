// lib.rs - shared core of the car listing Mini-App

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod capabilities;
pub mod catalog;
pub mod config;
pub mod event;
pub mod form;
pub mod model;
pub mod multipart;
pub mod navigation;
#[cfg(feature = "shell")]
pub mod shell;
pub mod submission;
pub mod toast;
pub mod validation;
pub mod viewport;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::capabilities::{HttpError, KvError};
use crate::catalog::{CarCard, GalleryPosition};
use crate::config::ConfigError;
use crate::form::InfoList;
use crate::model::{RestrictionType, TransmissionType};
use crate::multipart::MultipartError;
use crate::navigation::{NavItem, Route};
use crate::submission::BookingAction;
use crate::toast::ToastMessage;
use crate::validation::{FieldErrors, FormField};

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use crux_core::App as CruxApp;
pub use config::AppConfig;
pub use event::Event;
pub use model::Model;

pub const MAX_PHOTOS: usize = 10;
pub const MAX_DOCUMENTS: usize = 5;
pub const MAX_INFO_ITEMS: usize = 10;
pub const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;
pub const MIN_PRODUCTION_YEAR: i32 = 1900;
pub const MAX_ENGINE_VOLUME_LITERS: f64 = 100.0;
pub const DEFAULT_TOAST_DURATION_MS: u64 = 2000;
/// Native shell timeout for the multipart listing upload; other calls use
/// [`capabilities::DEFAULT_TIMEOUT_MS`].
pub const CREATE_LISTING_TIMEOUT_MS: u64 = 120_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    Validation,
    NotFound,
    Conflict,
    RateLimited,
    Server,
    UnexpectedStatus,
    Storage,
    Serialization,
    Deserialization,
    InvalidState,
    Internal,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::RateLimited => "RATE_LIMITED",
            Self::Server => "SERVER_ERROR",
            Self::UnexpectedStatus => "UNEXPECTED_STATUS",
            Self::Storage => "STORAGE_ERROR",
            Self::Serialization => "SERIALIZATION_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::InvalidState => "INVALID_STATE",
            Self::Internal => "INTERNAL_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Network
            | Self::Timeout
            | Self::Conflict
            | Self::RateLimited
            | Self::Server
            | Self::Storage => ErrorSeverity::Transient,

            Self::Serialization | Self::Deserialization | Self::Internal | Self::InvalidState => {
                ErrorSeverity::Fatal
            }

            Self::Validation | Self::NotFound | Self::UnexpectedStatus | Self::Unknown => {
                ErrorSeverity::Permanent
            }
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Network | Self::Timeout | Self::RateLimited | Self::Server | Self::Storage
        )
    }

    /// Shown when an error reaches the user without a message of its own.
    const fn generic_message(self) -> &'static str {
        match self {
            Self::Network => "Нет соединения с сервером. Проверьте подключение к интернету",
            Self::Timeout => "Сервер не ответил вовремя. Попробуйте позже",
            Self::Storage => "Не удалось сохранить данные на устройстве",
            Self::Serialization | Self::Deserialization => "Ошибка обработки данных",
            _ => "Произошла непредвиденная ошибка",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    /// Text for the notification surface.
    pub message: String,
    /// Diagnostic detail for logs; never shown.
    pub internal_message: Option<String>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            internal_message: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable() && !matches!(self.severity, ErrorSeverity::Fatal)
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        if self.message.trim().is_empty() {
            self.kind.generic_message().to_string()
        } else {
            self.message.clone()
        }
    }

    /// Maps a non-success response. A `400` carrying `{"message": ...}` surfaces
    /// that text verbatim; every other outcome shows `fallback`.
    #[must_use]
    pub fn from_http_status(status: u16, body: Option<&[u8]>, fallback: &str) -> Self {
        let kind = match status {
            400 => ErrorKind::Validation,
            404 => ErrorKind::NotFound,
            408 => ErrorKind::Timeout,
            409 => ErrorKind::Conflict,
            429 => ErrorKind::RateLimited,
            500..=599 => ErrorKind::Server,
            _ => ErrorKind::UnexpectedStatus,
        };

        let server_message = body
            .and_then(|b| serde_json::from_slice::<ApiErrorResponse>(b).ok())
            .map(|e| e.message)
            .filter(|m| !m.trim().is_empty());

        let message = match (kind, &server_message) {
            (ErrorKind::Validation, Some(m)) => m.clone(),
            _ => fallback.to_string(),
        };

        let error = Self::new(kind, message).with_context("http_status", status.to_string());
        match server_message {
            Some(m) => error.with_internal(m),
            None => error,
        }
    }

    /// Maps a request that never produced a response.
    #[must_use]
    pub fn from_transport(error: &HttpError, fallback: &str) -> Self {
        let kind = match error {
            HttpError::Timeout { .. } => ErrorKind::Timeout,
            HttpError::Connection { .. } | HttpError::ResponseTooLarge { .. } => ErrorKind::Network,
            HttpError::InvalidResponse { .. } => ErrorKind::Deserialization,
            HttpError::InvalidUrl { .. }
            | HttpError::InvalidHeader { .. }
            | HttpError::BodyTooLarge { .. }
            | HttpError::InvalidRequest { .. } => ErrorKind::Internal,
        };
        Self::new(kind, fallback).with_internal(error.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

#[derive(Debug, Clone, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    message: String,
}

pub type AppResult<T> = Result<T, AppError>;

impl From<HttpError> for AppError {
    fn from(e: HttpError) -> Self {
        AppError::from_transport(&e, "")
    }
}

impl From<KvError> for AppError {
    fn from(e: KvError) -> Self {
        let kind = match e {
            KvError::Serialization { .. } => ErrorKind::Serialization,
            KvError::UnexpectedOutput { .. } => ErrorKind::InvalidState,
            KvError::InvalidKey { .. } | KvError::ValueTooLarge { .. } | KvError::Storage { .. } => {
                ErrorKind::Storage
            }
        };
        AppError::new(kind, "").with_internal(e.to_string())
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::new(ErrorKind::Serialization, "").with_internal(e.to_string())
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::new(ErrorKind::InvalidState, "").with_internal(e.to_string())
    }
}

// --- View model ---

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AttachmentView {
    pub file_name: String,
    pub mime_type: String,
    pub size: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CreateView {
    pub values: BTreeMap<FormField, String>,
    pub additional_info: Vec<String>,
    pub problem_info: Vec<String>,
    pub photos: Vec<AttachmentView>,
    pub documents: Vec<AttachmentView>,
    pub errors: FieldErrors,
    pub transmission_options: Vec<SelectOption>,
    pub restriction_options: Vec<SelectOption>,
    pub can_add_photos: bool,
    pub can_add_documents: bool,
    pub can_add_additional_info: bool,
    pub can_add_problem_info: bool,
    pub submitting: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BookingView {
    pub car_id: String,
    pub user_id: String,
    pub can_submit: bool,
    pub in_flight: Option<BookingAction>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GalleryView {
    pub photos: Vec<String>,
    pub position: GalleryPosition,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CatalogView {
    pub cards: Vec<CarCard>,
    pub page: u32,
    pub loading: bool,
    pub gallery: Option<GalleryView>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub route: Route,
    pub path: String,
    pub header: Vec<NavItem>,
    pub footer: Vec<NavItem>,
    pub can_go_back: bool,
    pub create: Option<CreateView>,
    pub booking: Option<BookingView>,
    pub catalog: Option<CatalogView>,
    pub toast: Option<ToastMessage>,
    /// `(name, value)` of the CSS variable override, iOS only.
    pub viewport_override: Option<(String, String)>,
}

fn options<T: Copy + std::fmt::Display>(values: impl Iterator<Item = T>, label: fn(T) -> &'static str) -> Vec<SelectOption> {
    values
        .map(|v| SelectOption {
            value: v.to_string(),
            label: label(v).to_string(),
        })
        .collect()
}

pub mod app {
    use super::*;
    use strum::IntoEnumIterator;
    use tracing::{debug, info, warn};

    use crate::capabilities::{run_kv, send_http, Capabilities, KvResult, TimerOutput};
    use crate::catalog::cars_request;
    use crate::form::{Change, DRAFT_STORE};
    use crate::submission::{
        create_listing_request, interpret_booking, interpret_create, BookingRequest, MSG_CREATED,
        MSG_SUBMIT_IN_FLIGHT,
    };
    use crate::toast::ToastKind;

    /// Stateless; configuration and the validation year live in [`Model`].
    #[derive(Default)]
    pub struct App;

    impl App {
        fn show_toast(message: impl Into<String>, kind: ToastKind, model: &mut Model, caps: &Capabilities) {
            let generation = model.toast.show(message, kind);
            caps.timer
                .start(generation, model.config.toast_duration_ms, |output| match output {
                    TimerOutput::Elapsed { id } => Event::ToastTimerElapsed { generation: id },
                });
            caps.render.render();
        }

        fn show_error(error: AppError, model: &mut Model, caps: &Capabilities) {
            Self::show_toast(error.user_facing_message(), ToastKind::Error, model, caps);
            model.set_error(error);
        }

        fn persist_draft(model: &Model, caps: &Capabilities) {
            match DRAFT_STORE.set_op(&model.draft.draft) {
                Ok(op) => run_kv(caps, op, |r| Event::DraftPersisted(Box::new(r))),
                Err(e) => warn!(error = %e, "draft not persisted"),
            }
        }

        fn delete_draft(caps: &Capabilities) {
            match DRAFT_STORE.delete_op() {
                Ok(op) => run_kv(caps, op, |r| Event::DraftCleared(Box::new(r))),
                Err(e) => warn!(error = %e, "draft not deleted"),
            }
        }

        fn apply_change(change: Change, model: &Model, caps: &Capabilities) {
            if change == Change::Draft {
                Self::persist_draft(model, caps);
            }
            caps.render.render();
        }

        fn storage_done(model: &mut Model, what: &'static str, result: &KvResult) {
            if let Err(e) = result {
                warn!(operation = what, error = %e, "draft storage failed");
                model.set_error(AppError::from(e.clone()));
            }
        }

        /// Side effects of leaving `from` for the current route.
        fn route_changed(from: Route, model: &mut Model, caps: &Capabilities) {
            let to = model.navigation.current();
            debug!(from = from.path(), to = to.path(), "route changed");

            if from == Route::Create {
                model.draft.unmount();
            }
            if from == Route::Cars {
                model.catalog.close_gallery();
            }

            match to {
                Route::Create => {
                    model.draft.mount();
                    match DRAFT_STORE.get_op() {
                        Ok(op) => run_kv(caps, op, |r| Event::DraftRestored(Box::new(r))),
                        Err(e) => {
                            warn!(error = %e, "draft restore skipped");
                            model.draft.restore(None);
                        }
                    }
                }
                Route::Cars => Self::load_cars(model.catalog.page(), model, caps),
                Route::Home | Route::Booking => {}
            }
            caps.render.render();
        }

        fn go_back(model: &mut Model, caps: &Capabilities) {
            if let Some(from) = model.navigation.back() {
                Self::route_changed(from, model, caps);
            }
        }

        fn load_cars(page: u32, model: &mut Model, caps: &Capabilities) {
            let page = page.max(1);
            match cars_request(&model.config.api_base_url, page, model.config.catalog_page_size) {
                Ok(request) => {
                    model.catalog.begin_load(page);
                    send_http(caps, request, move |r| Event::CarsLoaded {
                        page,
                        result: Box::new(r),
                    });
                }
                Err(e) => {
                    warn!(error = %e, "catalog request not built");
                    Self::show_error(
                        AppError::from_transport(&e, crate::catalog::MSG_CATALOG_FAILED),
                        model,
                        caps,
                    );
                }
            }
            caps.render.render();
        }

        fn submit(model: &mut Model, caps: &Capabilities) {
            if model.submitting {
                Self::show_toast(MSG_SUBMIT_IN_FLIGHT, ToastKind::Warning, model, caps);
                return;
            }

            let validator = model.validator;
            if !model.draft.validate(&validator) {
                warn!(fields = model.draft.errors.len(), "listing rejected by validation");
                caps.render.render();
                return;
            }

            match create_listing_request(
                &model.config.api_base_url,
                &model.draft.draft,
                &model.draft.photos,
                &model.draft.documents,
            ) {
                Ok(request) => {
                    debug!(
                        request_id = request.request_id(),
                        photos = model.draft.photos.len(),
                        documents = model.draft.documents.len(),
                        "submitting listing"
                    );
                    model.submitting = true;
                    send_http(caps, request, |r| Event::SubmitCompleted(Box::new(r)));
                }
                Err(e) => {
                    warn!(error = %e, "listing request not built");
                    Self::show_error(e.into(), model, caps);
                }
            }
            caps.render.render();
        }

        fn book(action: BookingAction, model: &mut Model, caps: &Capabilities) {
            if model.booking_in_flight.is_some() {
                Self::show_toast(MSG_SUBMIT_IN_FLIGHT, ToastKind::Warning, model, caps);
                return;
            }

            let request = BookingRequest::try_from(&model.booking)
                .and_then(|b| b.to_http(&model.config.api_base_url, action));
            match request {
                Ok(request) => {
                    model.booking_in_flight = Some(action);
                    send_http(caps, request, move |r| Event::BookingCompleted {
                        action,
                        result: Box::new(r),
                    });
                }
                Err(e) => {
                    warn!(action = action.name(), error = %e, "booking request not built");
                    Self::show_error(e.into(), model, caps);
                }
            }
            caps.render.render();
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            debug!(event = event.name(), user = event.is_user_initiated(), "processing event");

            match event {
                Event::Noop => {}

                Event::Configure(config) => match config.validate() {
                    Ok(()) => {
                        info!(api = %config.api_base_url, "configuration applied");
                        model.config = config;
                        caps.render.render();
                    }
                    Err(e) => {
                        warn!(error = %e, "configuration rejected, keeping previous");
                        model.set_error(e.into());
                    }
                },

                Event::Navigate(route) => {
                    if let Some(from) = model.navigation.push(route) {
                        Self::route_changed(from, model, caps);
                    }
                }

                Event::NavigateBack => Self::go_back(model, caps),

                Event::HostReported {
                    user_agent,
                    viewport_height,
                    inner_height,
                } => {
                    model.viewport.report(&user_agent, viewport_height, inner_height);
                    caps.render.render();
                }

                Event::ViewportChanged {
                    is_state_stable,
                    viewport_height,
                    inner_height,
                } => {
                    if model
                        .viewport
                        .changed(is_state_stable, viewport_height, inner_height)
                    {
                        caps.render.render();
                    }
                }

                Event::DraftRestored(result) => {
                    let restored = match *result {
                        Ok(output) => DRAFT_STORE.parse_value(output).unwrap_or_else(|e| {
                            warn!(error = %e, "stored draft unreadable, starting empty");
                            None
                        }),
                        Err(e) => {
                            warn!(error = %e, "draft restore failed, starting empty");
                            None
                        }
                    };
                    if model.draft.restore(restored) {
                        caps.render.render();
                    }
                }

                Event::DraftPersisted(result) => Self::storage_done(model, "set", &result),

                Event::DraftCleared(result) => Self::storage_done(model, "delete", &result),

                Event::FieldChanged { field, value } => {
                    let change = model.draft.set_field(&model.validator, field, &value);
                    Self::apply_change(change, model, caps);
                }

                Event::FieldBlurred { field } => {
                    model.draft.blur(&model.validator, field);
                    caps.render.render();
                }

                Event::PhotosSelected(batch) => {
                    let change = model.draft.add_photos(batch);
                    Self::apply_change(change, model, caps);
                }

                Event::PhotoRemoved { index } => {
                    let change = model.draft.remove_photo(index);
                    Self::apply_change(change, model, caps);
                }

                Event::DocumentsSelected(batch) => {
                    let change = model.draft.add_documents(batch);
                    Self::apply_change(change, model, caps);
                }

                Event::DocumentRemoved { index } => {
                    let change = model.draft.remove_document(index);
                    Self::apply_change(change, model, caps);
                }

                Event::InfoAdded { list } => {
                    let change = model.draft.add_info(list);
                    Self::apply_change(change, model, caps);
                }

                Event::InfoEdited { list, index, value } => {
                    let change = model.draft.edit_info(list, index, &value);
                    Self::apply_change(change, model, caps);
                }

                Event::InfoRemoved { list, index } => {
                    let change = model.draft.remove_info(list, index);
                    Self::apply_change(change, model, caps);
                }

                Event::SubmitRequested => Self::submit(model, caps),

                Event::SubmitCompleted(result) => {
                    model.submitting = false;
                    match interpret_create(&result) {
                        Ok(()) => {
                            info!("listing created");
                            model.draft.clear();
                            model.clear_error();
                            Self::delete_draft(caps);
                            Self::show_toast(MSG_CREATED, ToastKind::Success, model, caps);
                        }
                        Err(error) => {
                            warn!(error = %error, "listing submission failed");
                            Self::show_error(error, model, caps);
                        }
                    }
                }

                Event::CancelRequested => {
                    model.draft.clear();
                    Self::delete_draft(caps);
                    Self::go_back(model, caps);
                    caps.render.render();
                }

                Event::BookingFieldChanged { field, value } => {
                    model.booking.set(field, value);
                    caps.render.render();
                }

                Event::BookingFieldCleared { field } => {
                    model.booking.clear(field);
                    caps.render.render();
                }

                Event::BookingRequested { action } => Self::book(action, model, caps),

                Event::BookingCompleted { action, result } => {
                    model.booking_in_flight = None;
                    match interpret_booking(&result) {
                        Ok(()) => {
                            info!(action = action.name(), "booking request accepted");
                            Self::show_toast(action.success_message(), ToastKind::Success, model, caps);
                        }
                        Err(error) => {
                            warn!(action = action.name(), error = %error, "booking request failed");
                            Self::show_error(error, model, caps);
                        }
                    }
                }

                Event::CarsRequested => Self::load_cars(model.catalog.page(), model, caps),

                Event::PageSelected { page } => Self::load_cars(page, model, caps),

                Event::CarsLoaded { page, result } => match model.catalog.finish_load(page, &result) {
                    Ok(true) => caps.render.render(),
                    Ok(false) => debug!(page, "stale catalog page dropped"),
                    Err(error) => {
                        warn!(page, error = %error, "catalog load failed");
                        Self::show_error(error, model, caps);
                    }
                },

                Event::GalleryOpened { car_id, index } => {
                    let hosts = model.config.allowed_image_hosts();
                    if model.catalog.open_gallery(&car_id, index, &hosts) {
                        caps.render.render();
                    }
                }

                Event::GalleryClosed => {
                    model.catalog.close_gallery();
                    caps.render.render();
                }

                Event::ToastDismissed => {
                    model.toast.hide();
                    caps.render.render();
                }

                Event::ToastTimerElapsed { generation } => {
                    if model.toast.expire(generation) {
                        caps.render.render();
                    }
                }
            }
        }

        fn view(&self, model: &Model) -> ViewModel {
            let route = model.navigation.current();
            let image_hosts = model.config.allowed_image_hosts();

            let create = (route == Route::Create).then(|| {
                let form = &model.draft;
                CreateView {
                    values: FormField::SCALAR
                        .iter()
                        .map(|&field| (field, form.draft.value(field)))
                        .collect(),
                    additional_info: form.draft.additional_info.clone(),
                    problem_info: form.draft.problem_info.clone(),
                    photos: form.photos.iter().map(attachment_view).collect(),
                    documents: form.documents.iter().map(attachment_view).collect(),
                    errors: form.errors.clone(),
                    transmission_options: options(TransmissionType::iter(), TransmissionType::label),
                    restriction_options: options(RestrictionType::iter(), RestrictionType::label),
                    can_add_photos: form.can_add_photos(),
                    can_add_documents: form.can_add_documents(),
                    can_add_additional_info: form.can_add_info(InfoList::Additional),
                    can_add_problem_info: form.can_add_info(InfoList::Problem),
                    submitting: model.submitting,
                }
            });

            let booking = (route == Route::Booking).then(|| BookingView {
                car_id: model.booking.car_id.clone(),
                user_id: model.booking.user_id.clone(),
                can_submit: model.booking.is_complete() && model.booking_in_flight.is_none(),
                in_flight: model.booking_in_flight,
            });

            let catalog = (route == Route::Cars).then(|| CatalogView {
                cards: model
                    .catalog
                    .cars()
                    .iter()
                    .map(|car| CarCard::from_car(car, &image_hosts))
                    .collect(),
                page: model.catalog.page(),
                loading: model.catalog.is_loading(),
                gallery: model
                    .catalog
                    .gallery(&image_hosts)
                    .map(|(photos, position)| GalleryView { photos, position }),
            });

            ViewModel {
                route,
                path: route.path().to_string(),
                header: navigation::header_items(route),
                footer: navigation::footer_items(route),
                can_go_back: model.navigation.can_go_back(),
                create,
                booking,
                catalog,
                toast: model.toast.current().cloned(),
                viewport_override: model
                    .viewport
                    .css_value()
                    .map(|v| (viewport::CSS_VARIABLE.to_string(), v)),
            }
        }
    }

    fn attachment_view(a: &crate::form::Attachment) -> AttachmentView {
        AttachmentView {
            file_name: a.file_name.clone(),
            mime_type: a.mime_type.clone(),
            size: a.size(),
        }
    }
}
