//! Listing draft state: field values, attachments, inline errors and the
//! persisted projection.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::capabilities::TypedKvStore;
use crate::model::{RestrictionType, TransmissionType};
use crate::validation::{normalize_input, FieldErrors, FormField, Validator};
use crate::{MAX_DOCUMENTS, MAX_INFO_ITEMS, MAX_PHOTOS, MAX_PHOTO_BYTES};

pub const STORAGE_KEY: &str = "carFormData";

/// Persisted draft. Attachments are never part of it.
pub const DRAFT_STORE: TypedKvStore<ListingDraft> = TypedKvStore::new(STORAGE_KEY);

pub const ACCEPTED_PHOTO_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "image/gif",
];
pub const ACCEPTED_DOCUMENT_TYPE: &str = "application/pdf";

pub const MSG_PHOTO_TYPE: &str = "Допустимы только файлы изображений (JPEG, PNG, WebP, GIF)";
pub const MSG_PHOTO_LIMIT: &str = "Достигнут лимит в 10 фотографий";
pub const MSG_PHOTO_SIZE: &str = "Размер каждого файла не должен превышать 10MB";
pub const MSG_DOCUMENT_TYPE: &str = "Допустимы только документы PDF";
pub const MSG_DOCUMENT_LIMIT: &str = "Достигнут лимит в 5 документов";
pub const MSG_INFO_LIMIT: &str = "Достигнут лимит в 10 пунктов";

/// Serialisable projection of the listing draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingDraft {
    pub brand: String,
    pub model: String,
    pub registration_number: String,
    pub vin_number: String,
    pub transmission_type: TransmissionType,
    pub restriction_type: RestrictionType,
    pub current_price: String,
    pub year: String,
    pub engine_power: String,
    pub engine_volume: String,
    pub owner_count: String,
    pub retail_price: String,
    pub minimal_price: String,
    pub bit_date: String,
    pub additional_info: Vec<String>,
    pub problem_info: Vec<String>,
}

impl ListingDraft {
    /// Current string value of a scalar field. Collection fields read as empty.
    pub fn value(&self, field: FormField) -> String {
        match field {
            FormField::Brand => self.brand.clone(),
            FormField::Model => self.model.clone(),
            FormField::RegistrationNumber => self.registration_number.clone(),
            FormField::VinNumber => self.vin_number.clone(),
            FormField::TransmissionType => self.transmission_type.to_string(),
            FormField::RestrictionType => self.restriction_type.to_string(),
            FormField::CurrentPrice => self.current_price.clone(),
            FormField::Year => self.year.clone(),
            FormField::EnginePower => self.engine_power.clone(),
            FormField::EngineVolume => self.engine_volume.clone(),
            FormField::OwnerCount => self.owner_count.clone(),
            FormField::RetailPrice => self.retail_price.clone(),
            FormField::MinimalPrice => self.minimal_price.clone(),
            FormField::BitDate => self.bit_date.clone(),
            FormField::Photos
            | FormField::Documents
            | FormField::AdditionalInfo
            | FormField::ProblemInfo => String::new(),
        }
    }

    /// Writes an already-normalised value. Returns false when the field does not
    /// take a string or the value cannot be represented.
    fn assign(&mut self, field: FormField, value: String) -> bool {
        match field {
            FormField::Brand => self.brand = value,
            FormField::Model => self.model = value,
            FormField::RegistrationNumber => self.registration_number = value,
            FormField::VinNumber => self.vin_number = value,
            FormField::TransmissionType => {
                self.transmission_type = value.parse().unwrap_or_default();
            }
            FormField::RestrictionType => {
                self.restriction_type = value.parse().unwrap_or_default();
            }
            FormField::CurrentPrice => self.current_price = value,
            FormField::Year => self.year = value,
            FormField::EnginePower => self.engine_power = value,
            FormField::EngineVolume => self.engine_volume = value,
            FormField::OwnerCount => self.owner_count = value,
            FormField::RetailPrice => self.retail_price = value,
            FormField::MinimalPrice => self.minimal_price = value,
            FormField::BitDate => self.bit_date = value,
            FormField::Photos
            | FormField::Documents
            | FormField::AdditionalInfo
            | FormField::ProblemInfo => return false,
        }
        true
    }

    pub fn info(&self, list: InfoList) -> &[String] {
        match list {
            InfoList::Additional => &self.additional_info,
            InfoList::Problem => &self.problem_info,
        }
    }

    fn info_mut(&mut self, list: InfoList) -> &mut Vec<String> {
        match list {
            InfoList::Additional => &mut self.additional_info,
            InfoList::Problem => &mut self.problem_info,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InfoList {
    Additional,
    Problem,
}

impl InfoList {
    pub const fn field(self) -> FormField {
        match self {
            InfoList::Additional => FormField::AdditionalInfo,
            InfoList::Problem => FormField::ProblemInfo,
        }
    }
}

/// A file picked on the host. Lives only in memory.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Extension after the last dot, if the name has one.
    pub fn extension(&self) -> Option<&str> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.data.len())
            .finish()
    }
}

/// Outcome of a draft mutation, telling the caller whether to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Draft,
    AttachmentsOnly,
    Rejected,
}

/// Mutable draft plus in-memory attachments and inline errors.
#[derive(Debug, Clone, Default)]
pub struct DraftForm {
    pub draft: ListingDraft,
    pub photos: Vec<Attachment>,
    pub documents: Vec<Attachment>,
    pub errors: FieldErrors,
    restore_pending: bool,
}

impl DraftForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// View mounted: attachments from a previous visit are gone, the persisted
    /// draft is about to be read back.
    pub fn mount(&mut self) {
        self.photos.clear();
        self.documents.clear();
        self.errors.clear();
        self.restore_pending = true;
    }

    pub fn unmount(&mut self) {
        self.photos.clear();
        self.documents.clear();
        self.restore_pending = false;
    }

    pub fn is_restore_pending(&self) -> bool {
        self.restore_pending
    }

    /// Applies a restored draft unless the user already started typing.
    /// Returns whether the restored value was taken.
    pub fn restore(&mut self, restored: Option<ListingDraft>) -> bool {
        if !self.restore_pending {
            return false;
        }
        self.restore_pending = false;
        self.draft = restored.unwrap_or_default();
        true
    }

    /// Normalises and stores a keystroke. A field already showing an error is
    /// re-validated immediately; other fields wait for blur or submit.
    pub fn set_field(&mut self, validator: &Validator, field: FormField, raw: &str) -> Change {
        let Some(value) = normalize_input(field, raw) else {
            return Change::Rejected;
        };
        if !self.draft.assign(field, value) {
            return Change::Rejected;
        }
        self.restore_pending = false;

        if self.errors.contains_key(&field) {
            self.revalidate(validator, field);
        }
        Change::Draft
    }

    pub fn blur(&mut self, validator: &Validator, field: FormField) {
        if field.is_scalar() {
            self.revalidate(validator, field);
        }
    }

    fn revalidate(&mut self, validator: &Validator, field: FormField) {
        match validator.validate_field(field, &self.draft.value(field)) {
            Some(message) => {
                self.errors.insert(field, message);
            }
            None => {
                self.errors.remove(&field);
            }
        }
    }

    /// Whole-form check. Replaces the inline errors; true when submittable.
    pub fn validate(&mut self, validator: &Validator) -> bool {
        self.errors = validator.validate_form(&self.draft, self.photos.len(), self.documents.len());
        self.errors.is_empty()
    }

    /// Adds a batch of photos. Any bad file rejects the whole batch.
    pub fn add_photos(&mut self, batch: Vec<Attachment>) -> Change {
        if batch.is_empty() {
            return Change::Rejected;
        }

        let error = if batch
            .iter()
            .any(|a| !ACCEPTED_PHOTO_TYPES.contains(&a.mime_type.to_ascii_lowercase().as_str()))
        {
            Some(MSG_PHOTO_TYPE)
        } else if self.photos.len() + batch.len() > MAX_PHOTOS {
            Some(MSG_PHOTO_LIMIT)
        } else if batch.iter().any(|a| a.size() > MAX_PHOTO_BYTES) {
            Some(MSG_PHOTO_SIZE)
        } else {
            None
        };

        if let Some(message) = error {
            self.errors.insert(FormField::Photos, message.to_string());
            return Change::Rejected;
        }

        self.photos.extend(batch);
        self.errors.remove(&FormField::Photos);
        Change::AttachmentsOnly
    }

    pub fn remove_photo(&mut self, index: usize) -> Change {
        if index >= self.photos.len() {
            return Change::Rejected;
        }
        self.photos.remove(index);
        self.errors.remove(&FormField::Photos);
        Change::AttachmentsOnly
    }

    pub fn add_documents(&mut self, batch: Vec<Attachment>) -> Change {
        if batch.is_empty() {
            return Change::Rejected;
        }

        let error = if batch
            .iter()
            .any(|a| !a.mime_type.eq_ignore_ascii_case(ACCEPTED_DOCUMENT_TYPE))
        {
            Some(MSG_DOCUMENT_TYPE)
        } else if self.documents.len() + batch.len() > MAX_DOCUMENTS {
            Some(MSG_DOCUMENT_LIMIT)
        } else {
            None
        };

        if let Some(message) = error {
            self.errors.insert(FormField::Documents, message.to_string());
            return Change::Rejected;
        }

        self.documents.extend(batch);
        self.errors.remove(&FormField::Documents);
        Change::AttachmentsOnly
    }

    pub fn remove_document(&mut self, index: usize) -> Change {
        if index >= self.documents.len() {
            return Change::Rejected;
        }
        self.documents.remove(index);
        self.errors.remove(&FormField::Documents);
        Change::AttachmentsOnly
    }

    pub fn add_info(&mut self, list: InfoList) -> Change {
        let items = self.draft.info_mut(list);
        if items.len() >= MAX_INFO_ITEMS {
            self.errors.insert(list.field(), MSG_INFO_LIMIT.to_string());
            return Change::Rejected;
        }
        items.push(String::new());
        self.restore_pending = false;
        Change::Draft
    }

    pub fn edit_info(&mut self, list: InfoList, index: usize, value: &str) -> Change {
        match self.draft.info_mut(list).get_mut(index) {
            Some(item) => {
                *item = value.to_string();
                self.restore_pending = false;
                Change::Draft
            }
            None => Change::Rejected,
        }
    }

    pub fn remove_info(&mut self, list: InfoList, index: usize) -> Change {
        let items = self.draft.info_mut(list);
        if index >= items.len() {
            return Change::Rejected;
        }
        items.remove(index);
        self.errors.remove(&list.field());
        self.restore_pending = false;
        Change::Draft
    }

    pub fn can_add_photos(&self) -> bool {
        self.photos.len() < MAX_PHOTOS
    }

    pub fn can_add_documents(&self) -> bool {
        self.documents.len() < MAX_DOCUMENTS
    }

    pub fn can_add_info(&self, list: InfoList) -> bool {
        self.draft.info(list).len() < MAX_INFO_ITEMS
    }

    /// Back to the canonical empty draft. The caller removes the persisted copy.
    pub fn clear(&mut self) {
        self.draft = ListingDraft::default();
        self.photos.clear();
        self.documents.clear();
        self.errors.clear();
        self.restore_pending = false;
    }
}
