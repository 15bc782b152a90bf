use crux_core::testing::AppTester;
use crux_http::protocol::HttpRequest;
use revup_shared::capabilities::{HttpError, HttpResponse, HttpResult};
use revup_shared::model::BookingField;
use revup_shared::navigation::Route;
use revup_shared::submission::{
    BookingAction, MSG_BOOKED, MSG_BOOKING_CANCELLED, MSG_BOOKING_FAILED, MSG_BOOKING_INCOMPLETE,
    MSG_SUBMIT_IN_FLIGHT,
};
use revup_shared::toast::ToastKind;
use revup_shared::{App, AppConfig, Effect, Event, Model};

type Tester = AppTester<App, Effect>;

fn booking_model(app: &Tester, car_id: &str, user_id: &str) -> Model {
    let mut model = Model {
        config: AppConfig {
            api_base_url: "https://api.test".into(),
            ..AppConfig::default()
        },
        ..Model::default()
    };
    app.update(Event::Navigate(Route::Booking), &mut model);
    app.update(
        Event::BookingFieldChanged {
            field: BookingField::CarId,
            value: car_id.into(),
        },
        &mut model,
    );
    app.update(
        Event::BookingFieldChanged {
            field: BookingField::UserId,
            value: user_id.into(),
        },
        &mut model,
    );
    model
}

fn request(app: &Tester, model: &mut Model, action: BookingAction) -> Option<HttpRequest> {
    app.update(Event::BookingRequested { action }, model)
        .effects
        .into_iter()
        .find_map(|e| match e {
            Effect::Http(r) => Some(r.operation),
            _ => None,
        })
}

fn complete(app: &Tester, model: &mut Model, action: BookingAction, result: HttpResult) {
    app.update(
        Event::BookingCompleted {
            action,
            result: Box::new(result),
        },
        model,
    );
}

fn toast(app: &Tester, model: &Model) -> (String, ToastKind) {
    let toast = app.view(model).toast.expect("toast shown");
    (toast.message, toast.kind)
}

#[test]
fn test_book_then_cancel() {
    let app = Tester::default();
    let mut model = booking_model(&app, "42", "u 7");

    // 1. Book
    let book = request(&app, &mut model, BookingAction::Book).unwrap();
    assert_eq!(book.method, "POST");
    assert_eq!(book.url, "https://api.test/api/cars/42/book/u%207");
    assert_eq!(
        app.view(&model).booking.unwrap().in_flight,
        Some(BookingAction::Book)
    );
    assert!(!app.view(&model).booking.unwrap().can_submit);

    complete(&app, &mut model, BookingAction::Book, Ok(HttpResponse::with_status(200, "")));
    assert_eq!(toast(&app, &model), (MSG_BOOKED.to_string(), ToastKind::Success));
    assert!(app.view(&model).booking.unwrap().can_submit);

    // 2. Cancel uses DELETE on the same path
    let cancel = request(&app, &mut model, BookingAction::Cancel).unwrap();
    assert_eq!(cancel.method, "DELETE");
    assert_eq!(cancel.url, book.url);

    complete(
        &app,
        &mut model,
        BookingAction::Cancel,
        Ok(HttpResponse::with_status(200, "{}")),
    );
    assert_eq!(
        toast(&app, &model),
        (MSG_BOOKING_CANCELLED.to_string(), ToastKind::Success)
    );
}

#[test]
fn test_second_request_while_in_flight_is_refused() {
    let app = Tester::default();
    let mut model = booking_model(&app, "42", "7");
    assert!(request(&app, &mut model, BookingAction::Book).is_some());

    assert!(request(&app, &mut model, BookingAction::Cancel).is_none());
    assert_eq!(
        toast(&app, &model),
        (MSG_SUBMIT_IN_FLIGHT.to_string(), ToastKind::Warning)
    );
}

#[test]
fn test_rejection_shows_server_message() {
    let app = Tester::default();
    let mut model = booking_model(&app, "42", "7");
    request(&app, &mut model, BookingAction::Book).unwrap();
    complete(
        &app,
        &mut model,
        BookingAction::Book,
        Ok(HttpResponse::with_status(400, r#"{"message":"Автомобиль уже забронирован"}"#)),
    );
    assert_eq!(
        toast(&app, &model),
        ("Автомобиль уже забронирован".to_string(), ToastKind::Error)
    );
    assert!(model.last_error.is_some());
}

#[test]
fn test_non_200_success_codes_are_failures() {
    let app = Tester::default();
    let mut model = booking_model(&app, "42", "7");
    request(&app, &mut model, BookingAction::Book).unwrap();
    complete(&app, &mut model, BookingAction::Book, Ok(HttpResponse::with_status(201, "")));
    assert_eq!(
        toast(&app, &model),
        (MSG_BOOKING_FAILED.to_string(), ToastKind::Error)
    );
}

#[test]
fn test_network_failure() {
    let app = Tester::default();
    let mut model = booking_model(&app, "42", "7");
    request(&app, &mut model, BookingAction::Book).unwrap();
    complete(
        &app,
        &mut model,
        BookingAction::Book,
        Err(HttpError::Connection {
            host: "api.test".into(),
            message: "connection refused".into(),
        }),
    );
    let (message, kind) = toast(&app, &model);
    assert_eq!(kind, ToastKind::Error);
    assert_eq!(message, MSG_BOOKING_FAILED);
    assert_eq!(app.view(&model).booking.unwrap().in_flight, None);
}

#[test]
fn test_blank_ids_send_nothing() {
    let app = Tester::default();
    let mut model = booking_model(&app, "  ", "7");
    assert!(request(&app, &mut model, BookingAction::Book).is_none());
    assert_eq!(
        toast(&app, &model),
        (MSG_BOOKING_INCOMPLETE.to_string(), ToastKind::Error)
    );

    app.update(
        Event::BookingFieldChanged {
            field: BookingField::CarId,
            value: "42".into(),
        },
        &mut model,
    );
    app.update(
        Event::BookingFieldCleared {
            field: BookingField::UserId,
        },
        &mut model,
    );
    assert!(request(&app, &mut model, BookingAction::Book).is_none());
}
