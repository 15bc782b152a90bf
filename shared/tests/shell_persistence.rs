#![cfg(feature = "shell")]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use revup_shared::capabilities::{HttpMethod, HttpRequest, HttpResponse, HttpResult};
use revup_shared::form::Attachment;
use revup_shared::model::BookingField;
use revup_shared::navigation::Route;
use revup_shared::shell::{FileKvStore, HttpClient, KvStore, MemoryKvStore, Shell};
use revup_shared::submission::{BookingAction, MSG_BOOKED};
use revup_shared::validation::FormField;
use revup_shared::{AppConfig, Event};

#[derive(Default)]
struct ScriptedHttp {
    responses: Mutex<VecDeque<HttpResult>>,
    seen: Mutex<Vec<(HttpMethod, String)>>,
}

impl ScriptedHttp {
    fn replying(responses: Vec<HttpResult>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            seen: Mutex::default(),
        }
    }

    fn seen(&self) -> Vec<(HttpMethod, String)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttp {
    async fn execute(&self, request: &HttpRequest) -> HttpResult {
        self.seen
            .lock()
            .unwrap()
            .push((request.method(), request.url().as_str().to_string()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(HttpResponse::with_status(500, "")))
    }
}

async fn configured_shell<K: KvStore>(toast_duration_ms: u64, http: ScriptedHttp, kv: K) -> Shell<ScriptedHttp, K> {
    let mut shell = Shell::new(http, kv);
    shell
        .dispatch(Event::Configure(AppConfig {
            api_base_url: "https://api.test".into(),
            toast_duration_ms,
            ..AppConfig::default()
        }))
        .await;
    shell
}

#[tokio::test]
async fn test_draft_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");

    {
        let kv = FileKvStore::open(&path).unwrap();
        let mut shell = configured_shell(2000, ScriptedHttp::default(), kv).await;
        shell.dispatch(Event::Navigate(Route::Create)).await;
        shell
            .dispatch(Event::FieldChanged {
                field: FormField::Brand,
                value: "BMW".into(),
            })
            .await;
        shell
            .dispatch(Event::FieldChanged {
                field: FormField::VinNumber,
                value: "wba".into(),
            })
            .await;
        shell
            .dispatch(Event::PhotosSelected(vec![Attachment::new(
                "a.png",
                "image/png",
                vec![1, 2, 3],
            )]))
            .await;
        assert!(shell.render_count() > 0);
        assert_eq!(shell.view().create.unwrap().photos.len(), 1);
    }

    let stored = std::fs::read_to_string(&path).unwrap();
    assert!(stored.contains("carFormData"));

    let kv = FileKvStore::open(&path).unwrap();
    let mut shell = configured_shell(2000, ScriptedHttp::default(), kv).await;
    shell.dispatch(Event::Navigate(Route::Create)).await;

    let create = shell.view().create.unwrap();
    assert_eq!(create.values[&FormField::Brand], "BMW");
    assert_eq!(create.values[&FormField::VinNumber], "WBA");
    assert!(create.photos.is_empty());
}

#[tokio::test]
async fn test_cancel_removes_stored_draft() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");

    let kv = FileKvStore::open(&path).unwrap();
    let mut shell = configured_shell(2000, ScriptedHttp::default(), kv).await;
    shell.dispatch(Event::Navigate(Route::Create)).await;
    shell
        .dispatch(Event::FieldChanged {
            field: FormField::Model,
            value: "X5".into(),
        })
        .await;
    shell.dispatch(Event::CancelRequested).await;
    drop(shell);

    let kv = FileKvStore::open(&path).unwrap();
    let mut shell = configured_shell(2000, ScriptedHttp::default(), kv).await;
    shell.dispatch(Event::Navigate(Route::Create)).await;
    assert_eq!(shell.view().create.unwrap().values[&FormField::Model], "");
}

#[tokio::test]
async fn test_toast_hides_after_timer() {
    let http = ScriptedHttp::replying(vec![Ok(HttpResponse::with_status(200, ""))]);
    let mut shell = configured_shell(10, http, MemoryKvStore::new()).await;

    shell.dispatch(Event::Navigate(Route::Booking)).await;
    shell
        .dispatch(Event::BookingFieldChanged {
            field: BookingField::CarId,
            value: "5".into(),
        })
        .await;
    shell
        .dispatch(Event::BookingFieldChanged {
            field: BookingField::UserId,
            value: "9".into(),
        })
        .await;
    shell
        .dispatch(Event::BookingRequested {
            action: BookingAction::Book,
        })
        .await;

    assert_eq!(shell.view().toast.unwrap().message, MSG_BOOKED);

    assert!(shell.next_timer().await);
    assert!(shell.view().toast.is_none());
}

#[tokio::test]
async fn test_catalog_loads_through_shell() {
    let body = r#"[
        {"id":"1","brand":"Kia","model":"Rio","currentPrice":3500000,"year":2016,
         "photos":["https://s3.cdn.lego-car.ru/1.jpg","https://evil.test/2.jpg"]}
    ]"#;
    let http = ScriptedHttp::replying(vec![Ok(HttpResponse::with_status(200, body))]);
    let mut shell = configured_shell(2000, http, MemoryKvStore::new()).await;

    shell.dispatch(Event::Navigate(Route::Cars)).await;

    let catalog = shell.view().catalog.unwrap();
    assert!(!catalog.loading);
    assert_eq!(catalog.cards.len(), 1);
    assert_eq!(catalog.cards[0].title, "Kia Rio, 2016");
    assert_eq!(catalog.cards[0].price, "3\u{a0}500\u{a0}000\u{a0}₽");
    assert_eq!(catalog.cards[0].photos.len(), 1);

    let seen = shell_http_seen(&shell);
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, HttpMethod::Get);
    assert!(seen[0].1.starts_with("https://api.test/api/cars?page=1"));
}

fn shell_http_seen(shell: &Shell<ScriptedHttp, MemoryKvStore>) -> Vec<(HttpMethod, String)> {
    shell.http().seen()
}
