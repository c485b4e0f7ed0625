//! Ask request construction.

use std::time::Duration;

use pplx_common::{new_id, Session};
use pplx_config::schema::{ChatParamsConfig, JitterConfig, ServiceConfig};
use rand::Rng;

use crate::transport::TransportRequest;

/// JSON body of an ask request.
pub(crate) fn build_body(
    content: &str,
    session: &Session,
    params: &ChatParamsConfig,
) -> serde_json::Value {
    let sources: Vec<&str> = if params.web_search {
        vec!["web"]
    } else {
        Vec::new()
    };
    serde_json::json!({
        "query_str": content,
        "params": {
            "frontend_uuid": new_id(),
            "frontend_context_uuid": session.session_id,
            "model_preference": params.model,
            "search_focus": params.search_focus,
            "is_search_enabled": params.web_search,
            "sources": sources,
            "language": params.language,
            "mode": params.mode,
        }
    })
}

/// Streamed POST carrying the session credentials.
pub(crate) fn build_request(
    content: &str,
    session: &Session,
    service: &ServiceConfig,
    params: &ChatParamsConfig,
) -> TransportRequest {
    let body = build_body(content, session, params);
    TransportRequest::post(service.ask_url(), body.to_string())
        .header("content-type", "application/json")
        .header("accept", "text/event-stream")
        .header("user-agent", &session.user_agent)
        .header("cookie", &session.cookies)
        .header("origin", &service.base_url)
        .header("referer", &service.base_url)
        .streamed()
}

/// Random delay within `[min_ms, max_ms]`; zero when disabled.
pub(crate) fn jitter_delay(jitter: &JitterConfig) -> Duration {
    if jitter.is_disabled() {
        return Duration::ZERO;
    }
    let low = jitter.min_ms.min(jitter.max_ms);
    let ms = rand::thread_rng().gen_range(low..=jitter.max_ms);
    Duration::from_millis(u64::from(ms))
}
