//! Listing browser: remote car records, display cards, paging and the photo gallery.

use serde::{Deserialize, Serialize};

use crate::capabilities::{AllowedHosts, HttpError, HttpRequest, HttpResult};
use crate::event::CarId;
use crate::model::{RestrictionType, TransmissionType};
use crate::submission::endpoint;
use crate::validation::parse_buyout_date;
use crate::{AppError, ErrorKind};

pub const MSG_CATALOG_FAILED: &str = "Не удалось загрузить список автомобилей";

/// Listing record as served by the remote API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub id: CarId,
    pub brand: String,
    pub model: String,
    #[serde(default)]
    pub registration_number: String,
    #[serde(default)]
    pub vin_number: String,
    #[serde(default)]
    pub transmission_type: TransmissionType,
    #[serde(default)]
    pub restriction_type: RestrictionType,
    pub current_price: u64,
    pub year: i32,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub engine_power: u32,
    #[serde(default)]
    pub engine_volume: f64,
    #[serde(default)]
    pub owner_count: u32,
    #[serde(default)]
    pub retail_price: u64,
    #[serde(default)]
    pub minimal_price: u64,
    /// ISO `YYYY-MM-DD`.
    #[serde(default)]
    pub bit_date: String,
    #[serde(default)]
    pub additional_info: Vec<String>,
    #[serde(default)]
    pub problem_info: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarCard {
    pub id: CarId,
    pub title: String,
    pub price: String,
    pub registration_number: String,
    pub vin_number: String,
    pub engine: String,
    pub owner_count: u32,
    pub bit_date: String,
    pub transmission: String,
    pub restriction: String,
    pub photos: Vec<String>,
    pub photo_badge: String,
    pub additional_info: Vec<String>,
    pub problem_info: Vec<String>,
}

impl CarCard {
    pub fn from_car(car: &Car, image_hosts: &AllowedHosts) -> Self {
        let photos = visible_photos(car, image_hosts);

        Self {
            id: car.id.clone(),
            title: format!("{} {}, {}", car.brand, car.model, car.year),
            price: format_price(car.current_price),
            registration_number: car.registration_number.clone(),
            vin_number: car.vin_number.clone(),
            engine: format!("{}л / {}л.с.", car.engine_volume, car.engine_power),
            owner_count: car.owner_count,
            bit_date: display_date(&car.bit_date),
            transmission: car.transmission_type.label().to_string(),
            restriction: car.restriction_type.label().to_string(),
            photo_badge: format!("{} фото", photos.len()),
            photos,
            additional_info: car.additional_info.clone(),
            problem_info: car.problem_info.clone(),
        }
    }
}

/// Whole roubles with ru-RU grouping: `3 500 000 ₽`, separators are no-break spaces.
pub fn format_price(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 * 2 + 4);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('\u{a0}');
        }
        out.push(c);
    }
    out.push_str("\u{a0}₽");
    out
}

/// `YYYY-MM-DD` (optionally with a time part) to `DD.MM.YYYY`; anything else passes through.
pub fn display_date(iso: &str) -> String {
    let date_part = iso.get(..10).unwrap_or(iso);
    match chrono::NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) => date.format("%d.%m.%Y").to_string(),
        Err(_) => match parse_buyout_date(iso) {
            Some(date) => date.format("%d.%m.%Y").to_string(),
            None => iso.to_string(),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryPosition {
    pub index: usize,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Gallery {
    car_id: CarId,
    index: usize,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    cars: Vec<Car>,
    page: u32,
    loading: bool,
    gallery: Option<Gallery>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            cars: Vec::new(),
            page: 1,
            loading: false,
            gallery: None,
        }
    }
}

impl Catalog {
    pub fn cars(&self) -> &[Car] {
        &self.cars
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Marks a load of `page` as started. Pages are 1-based; 0 is treated as 1.
    pub fn begin_load(&mut self, page: u32) -> u32 {
        self.page = page.max(1);
        self.loading = true;
        self.page
    }

    /// Applies a page response. Responses for a page no longer selected are dropped.
    /// On failure the previous list stays in place.
    pub fn finish_load(&mut self, page: u32, result: &HttpResult) -> Result<bool, AppError> {
        if page != self.page {
            return Ok(false);
        }
        self.loading = false;

        let response = match result {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                return Err(AppError::from_http_status(
                    response.status(),
                    Some(response.body()),
                    MSG_CATALOG_FAILED,
                ))
            }
            Err(e) => return Err(AppError::from_transport(e, MSG_CATALOG_FAILED)),
        };

        let cars: Vec<Car> = response.json().map_err(|e| {
            AppError::new(ErrorKind::Deserialization, MSG_CATALOG_FAILED).with_internal(e.to_string())
        })?;
        self.cars = cars;
        self.gallery = None;
        Ok(true)
    }

    /// Opens the lightbox on one of a car's rendered photos, clamping the index.
    pub fn open_gallery(&mut self, car_id: &CarId, index: usize, image_hosts: &AllowedHosts) -> bool {
        let Some(car) = self.cars.iter().find(|c| &c.id == car_id) else {
            return false;
        };
        let count = visible_photos(car, image_hosts).len();
        if count == 0 {
            return false;
        }
        self.gallery = Some(Gallery {
            car_id: car_id.clone(),
            index: index.min(count - 1),
        });
        true
    }

    pub fn close_gallery(&mut self) {
        self.gallery = None;
    }

    /// Photos of the car in the lightbox plus the current position.
    pub fn gallery(&self, image_hosts: &AllowedHosts) -> Option<(Vec<String>, GalleryPosition)> {
        let gallery = self.gallery.as_ref()?;
        let car = self.cars.iter().find(|c| c.id == gallery.car_id)?;
        let photos = visible_photos(car, image_hosts);
        let count = photos.len();
        let index = gallery.index.min(count.checked_sub(1)?);
        Some((photos, GalleryPosition { index, count }))
    }
}

fn visible_photos(car: &Car, image_hosts: &AllowedHosts) -> Vec<String> {
    car.photos
        .iter()
        .filter(|url| image_hosts.is_allowed_url(url))
        .cloned()
        .collect()
}

/// `GET /api/cars?page={n}&size={size}`
pub fn cars_request(base_url: &str, page: u32, size: u32) -> Result<HttpRequest, HttpError> {
    let mut url = url::Url::parse(&endpoint(base_url, &["api", "cars"])?).map_err(|e| HttpError::InvalidUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })?;
    url.query_pairs_mut()
        .append_pair("page", &page.to_string())
        .append_pair("size", &size.to_string());

    HttpRequest::get(String::from(url))?.with_header("Accept", "application/json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::HttpResponse;

    fn hosts() -> AllowedHosts {
        AllowedHosts::new(["s3.cdn.lego-car.ru"])
    }

    fn sample_json() -> &'static str {
        r#"[{
            "id": "1",
            "brand": "Toyota",
            "model": "Camry",
            "registrationNumber": "А123БВ777",
            "vinNumber": "JT2BF22K1W0123456",
            "transmissionType": "AUTOMATIC",
            "restrictionType": "NONE",
            "currentPrice": 3500000,
            "year": 2020,
            "photos": [
                "https://s3.cdn.lego-car.ru/1.jpg",
                "http://s3.cdn.lego-car.ru/2.jpg",
                "https://evil.example/3.jpg",
                "https://s3.cdn.lego-car.ru/4.jpg"
            ],
            "enginePower": 181,
            "engineVolume": 2.5,
            "ownerCount": 1,
            "retailPrice": 3700000,
            "minimalPrice": 3300000,
            "bitDate": "2024-03-20",
            "additionalInfo": ["Полный комплект ключей"],
            "problemInfo": []
        }]"#
    }

    fn loaded() -> Catalog {
        let mut catalog = Catalog::default();
        catalog.begin_load(1);
        let result: HttpResult = Ok(HttpResponse::with_status(200, sample_json()));
        assert_eq!(catalog.finish_load(1, &result), Ok(true));
        catalog
    }

    mod card_tests {
        use super::*;

        #[test]
        fn test_card_formatting() {
            let catalog = loaded();
            let card = CarCard::from_car(&catalog.cars()[0], &hosts());
            assert_eq!(card.title, "Toyota Camry, 2020");
            assert_eq!(card.price, "3\u{a0}500\u{a0}000\u{a0}₽");
            assert_eq!(card.engine, "2.5л / 181л.с.");
            assert_eq!(card.bit_date, "20.03.2024");
            assert_eq!(card.transmission, "Автомат");
            assert_eq!(card.restriction, "Не указано");
        }

        #[test]
        fn test_disallowed_photos_not_rendered() {
            let catalog = loaded();
            let card = CarCard::from_car(&catalog.cars()[0], &hosts());
            assert_eq!(
                card.photos,
                ["https://s3.cdn.lego-car.ru/1.jpg", "https://s3.cdn.lego-car.ru/4.jpg"]
            );
            assert_eq!(card.photo_badge, "2 фото");
        }

        #[test]
        fn test_price_grouping() {
            assert_eq!(format_price(0), "0\u{a0}₽");
            assert_eq!(format_price(999), "999\u{a0}₽");
            assert_eq!(format_price(1000), "1\u{a0}000\u{a0}₽");
            assert_eq!(format_price(12_345_678), "12\u{a0}345\u{a0}678\u{a0}₽");
        }

        #[test]
        fn test_display_date_variants() {
            assert_eq!(display_date("2024-04-15T00:00:00Z"), "15.04.2024");
            assert_eq!(display_date("15.04.2024"), "15.04.2024");
            assert_eq!(display_date("soon"), "soon");
        }

        #[test]
        fn test_whole_litre_volume() {
            let mut car = loaded().cars()[0].clone();
            car.engine_volume = 2.0;
            assert_eq!(CarCard::from_car(&car, &hosts()).engine, "2л / 181л.с.");
        }
    }

    mod loading_tests {
        use super::*;

        #[test]
        fn test_request_shape() {
            let request = cars_request("https://api.test", 3, 10).unwrap();
            assert_eq!(request.url().as_str(), "https://api.test/api/cars?page=3&size=10");
            assert!(request.body().is_none());
        }

        #[test]
        fn test_failure_keeps_previous_list() {
            let mut catalog = loaded();
            catalog.begin_load(2);
            let result: HttpResult = Ok(HttpResponse::with_status(502, ""));
            let err = catalog.finish_load(2, &result).unwrap_err();
            assert_eq!(err.user_facing_message(), MSG_CATALOG_FAILED);
            assert_eq!(catalog.cars().len(), 1);
            assert!(!catalog.is_loading());
        }

        #[test]
        fn test_stale_page_ignored() {
            let mut catalog = Catalog::default();
            catalog.begin_load(1);
            catalog.begin_load(2);
            let result: HttpResult = Ok(HttpResponse::with_status(200, sample_json()));
            assert_eq!(catalog.finish_load(1, &result), Ok(false));
            assert!(catalog.cars().is_empty());
            assert!(catalog.is_loading());
        }

        #[test]
        fn test_malformed_body() {
            let mut catalog = Catalog::default();
            catalog.begin_load(1);
            let result: HttpResult = Ok(HttpResponse::with_status(200, "{"));
            assert!(catalog.finish_load(1, &result).is_err());
        }

        #[test]
        fn test_page_zero_clamped() {
            let mut catalog = Catalog::default();
            assert_eq!(catalog.begin_load(0), 1);
        }
    }

    mod gallery_tests {
        use super::*;

        #[test]
        fn test_index_clamped() {
            let mut catalog = loaded();
            let id = CarId::new("1");
            assert!(catalog.open_gallery(&id, 99, &hosts()));
            let (photos, position) = catalog.gallery(&hosts()).unwrap();
            assert_eq!(photos.len(), 2);
            assert_eq!(position, GalleryPosition { index: 1, count: 2 });

            catalog.close_gallery();
            assert!(catalog.gallery(&hosts()).is_none());
        }

        #[test]
        fn test_unknown_car() {
            let mut catalog = loaded();
            assert!(!catalog.open_gallery(&CarId::new("nope"), 0, &hosts()));
            assert!(!catalog.open_gallery(&CarId::new("1"), 0, &AllowedHosts::none()));
        }
    }
}
