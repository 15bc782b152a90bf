//! Capabilities the core asks the shell to perform.
//!
//! HTTP and draft storage go through Crux's own `crux_http` and `crux_kv`
//! capabilities; the typed request and key types in this module sit in front
//! of them. The toast timer is a small custom capability.

mod http;
mod kv;
mod timer;

pub use self::http::{
    AllowedHosts, HttpError, HttpHeaders, HttpMethod, HttpRequest, HttpResponse, HttpResult,
    ValidatedUrl, DEFAULT_TIMEOUT_MS, MAX_RESPONSE_BODY_SIZE,
};
pub use self::kv::{KvError, KvKey, KvOperation, KvOutput, KvResult, TypedKvStore};
pub use self::timer::{Timer, TimerOperation, TimerOutput};

pub use crux_core::render::Render;
pub use crux_http::Http;
pub use crux_kv::KeyValue;

use crate::event::Event;
use crate::App;

// Field types are spelled out so the derived variants read
// `Effect::Http`, `Effect::KeyValue`, `Effect::Render` and `Effect::Timer`.
#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub kv: KeyValue<Event>,
    pub render: Render<Event>,
    pub timer: Timer<Event>,
}

/// Sends `request` through `caps.http`; see [`http::send`].
pub fn send_http<F>(caps: &Capabilities, request: HttpRequest, make_event: F)
where
    F: Fn(HttpResult) -> Event + Send + Sync + 'static,
{
    http::send(&caps.http, request, make_event);
}

/// Runs `operation` through `caps.kv`; see [`kv::dispatch`].
pub fn run_kv(caps: &Capabilities, operation: KvOperation, make_event: fn(KvResult) -> Event) {
    kv::dispatch(&caps.kv, operation, make_event);
}
