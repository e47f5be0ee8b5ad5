//! Network-activity log parser
//!
//! Extracts cache-control headers and request initiators from a run's
//! DevTools protocol event log (`method` + `params` events).

use std::collections::HashMap;

use serde_json::{Map, Value};

/// Prefix of keys used for header events that cannot be tied to a URL
pub const UNRESOLVED_PREFIX: &str = "unresolved-response";

const REQUEST_WILL_BE_SENT: &str = "Network.requestWillBeSent";
const RESPONSE_RECEIVED: &str = "Network.responseReceived";
const RESPONSE_RECEIVED_EXTRA_INFO: &str = "Network.responseReceivedExtraInfo";

/// Where the initiator string comes from, in order of preference
const INITIATOR_SOURCES: [&str; 3] = [
    "/initiator/type",
    "/initiator/url",
    "/initiator/stack/callFrames/0/url",
];

/// Where an extra-info header event names its URL, in order of preference.
/// After these, the event's `requestId` is resolved to the latest request URL
/// sent under that id so far, then to the id's final URL in the whole log.
const EXTRA_INFO_URL_SOURCES: [&str; 2] = ["/associatedRequest/url", "/url"];

/// What the log says about one request URL
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestAnnotation {
    pub cache_control: Option<String>,
    pub initiator: Option<String>,
    pub status_code: Option<u16>,
}

/// Annotations keyed by request URL
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkLog {
    annotations: HashMap<String, RequestAnnotation>,
    unresolved: Vec<String>,
}

impl NetworkLog {
    /// Build from a raw log document: either a bare event array or an object
    /// holding the events under `log.entries` or `events`
    pub fn from_events(raw: &Value) -> Self {
        let events = event_list(raw);
        let final_urls = final_urls_by_id(events);
        // Redirect hops share a requestId, so this tracks the hop in flight
        let mut current_urls: HashMap<String, String> = HashMap::new();

        let mut log = NetworkLog::default();

        for event in events {
            let method = event.get("method").and_then(Value::as_str).unwrap_or_default();
            let Some(params) = event.get("params") else {
                continue;
            };

            match method {
                REQUEST_WILL_BE_SENT => {
                    if let Some(url) = params.pointer("/request/url").and_then(Value::as_str) {
                        if let Some(id) = params.get("requestId").and_then(Value::as_str) {
                            current_urls.insert(id.to_string(), url.to_string());
                        }
                        let initiator = first_string(params, &INITIATOR_SOURCES).unwrap_or_default();
                        let annotation = log.annotations.entry(url.to_string()).or_default();
                        if annotation.initiator.is_none() {
                            annotation.initiator = Some(initiator);
                        }
                    }
                }
                RESPONSE_RECEIVED_EXTRA_INFO => {
                    let Some(headers) = params.get("headers").and_then(Value::as_object) else {
                        continue;
                    };
                    let cache_control = header_value(headers, "cache-control");
                    let status_code = status_of(params.get("statusCode"));

                    match resolve_extra_info_url(params, &current_urls, &final_urls) {
                        Some(url) => log.record_response(&url, cache_control, status_code),
                        None => {
                            let key = format!(
                                "{}:{}:{}",
                                UNRESOLVED_PREFIX,
                                status_code.unwrap_or(0),
                                log.unresolved.len() + 1
                            );
                            log.annotations.insert(
                                key.clone(),
                                RequestAnnotation {
                                    cache_control,
                                    initiator: None,
                                    status_code,
                                },
                            );
                            log.unresolved.push(key);
                        }
                    }
                }
                RESPONSE_RECEIVED => {
                    if let Some(url) = params.pointer("/response/url").and_then(Value::as_str) {
                        let cache_control = params
                            .pointer("/response/headers")
                            .and_then(Value::as_object)
                            .and_then(|h| header_value(h, "cache-control"));
                        let status_code = status_of(params.pointer("/response/status"));
                        log.record_response(url, cache_control, status_code);
                    }
                }
                _ => {}
            }
        }

        log
    }

    /// First header event that carries a cache-control value wins
    fn record_response(&mut self, url: &str, cache_control: Option<String>, status_code: Option<u16>) {
        let annotation = self.annotations.entry(url.to_string()).or_default();
        if annotation.cache_control.is_none() {
            annotation.cache_control = cache_control;
        }
        if annotation.status_code.is_none() {
            annotation.status_code = status_code;
        }
    }

    pub fn get(&self, url: &str) -> Option<&RequestAnnotation> {
        self.annotations.get(url)
    }

    /// Placeholder keys of header events with no resolvable URL
    pub fn unresolved_keys(&self) -> &[String] {
        &self.unresolved
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}

fn event_list(raw: &Value) -> &[Value] {
    raw.as_array()
        .or_else(|| raw.pointer("/log/entries").and_then(Value::as_array))
        .or_else(|| raw.get("events").and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// URL each requestId finally resolved to: its `responseReceived` URL, or
/// failing that the last request URL sent under the id
fn final_urls_by_id(events: &[Value]) -> HashMap<String, String> {
    let mut requests = HashMap::new();
    let mut responses = HashMap::new();

    for event in events {
        let method = event.get("method").and_then(Value::as_str).unwrap_or_default();
        let (urls, url_pointer) = match method {
            REQUEST_WILL_BE_SENT => (&mut requests, "/params/request/url"),
            RESPONSE_RECEIVED => (&mut responses, "/params/response/url"),
            _ => continue,
        };
        let id = event.pointer("/params/requestId").and_then(Value::as_str);
        let url = event.pointer(url_pointer).and_then(Value::as_str);
        if let (Some(id), Some(url)) = (id, url) {
            urls.insert(id.to_string(), url.to_string());
        }
    }

    requests.extend(responses);
    requests
}

fn resolve_extra_info_url(
    params: &Value,
    current_urls: &HashMap<String, String>,
    final_urls: &HashMap<String, String>,
) -> Option<String> {
    first_string(params, &EXTRA_INFO_URL_SOURCES)
        .filter(|url| !url.is_empty())
        .or_else(|| {
            let id = params.get("requestId").and_then(Value::as_str)?;
            current_urls.get(id).or_else(|| final_urls.get(id)).cloned()
        })
}

fn first_string(value: &Value, pointers: &[&str]) -> Option<String> {
    pointers
        .iter()
        .filter_map(|p| value.pointer(p).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Case-insensitive header lookup
fn header_value(headers: &Map<String, Value>, name: &str) -> Option<String> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, value)| value.as_str())
        .map(str::to_string)
}

fn status_of(value: Option<&Value>) -> Option<u16> {
    value
        .and_then(Value::as_f64)
        .filter(|s| *s >= 0.0 && *s <= u16::MAX as f64)
        .map(|s| s as u16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_initiator_fallback_order() {
        let log = NetworkLog::from_events(&json!([
            { "method": "Network.requestWillBeSent", "params": {
                "request": { "url": "https://a.no/1" },
                "initiator": { "type": "parser", "url": "https://a.no/" } } },
            { "method": "Network.requestWillBeSent", "params": {
                "request": { "url": "https://a.no/2" },
                "initiator": { "url": "https://a.no/page" } } },
            { "method": "Network.requestWillBeSent", "params": {
                "request": { "url": "https://a.no/3" },
                "initiator": { "stack": { "callFrames": [ { "url": "https://a.no/app.js" } ] } } } },
            { "method": "Network.requestWillBeSent", "params": {
                "request": { "url": "https://a.no/4" } } }
        ]));

        assert_eq!(log.get("https://a.no/1").unwrap().initiator.as_deref(), Some("parser"));
        assert_eq!(log.get("https://a.no/2").unwrap().initiator.as_deref(), Some("https://a.no/page"));
        assert_eq!(log.get("https://a.no/3").unwrap().initiator.as_deref(), Some("https://a.no/app.js"));
        assert_eq!(log.get("https://a.no/4").unwrap().initiator.as_deref(), Some(""));
    }

    #[test]
    fn test_cache_control_case_insensitive() {
        let log = NetworkLog::from_events(&json!([
            { "method": "Network.responseReceived", "params": {
                "requestId": "7",
                "response": { "url": "https://a.no/x.css", "status": 200,
                              "headers": { "CACHE-CONTROL": "no-cache" } } } }
        ]));

        let annotation = log.get("https://a.no/x.css").unwrap();
        assert_eq!(annotation.cache_control.as_deref(), Some("no-cache"));
        assert_eq!(annotation.status_code, Some(200));
    }

    #[test]
    fn test_first_header_event_wins() {
        let log = NetworkLog::from_events(&json!([
            { "method": "Network.responseReceivedExtraInfo", "params": {
                "associatedRequest": { "url": "https://a.no/img.png" },
                "headers": { "cache-control": "max-age=31536000" } } },
            { "method": "Network.responseReceived", "params": {
                "response": { "url": "https://a.no/img.png",
                              "headers": { "Cache-Control": "no-store" } } } }
        ]));

        assert_eq!(
            log.get("https://a.no/img.png").unwrap().cache_control.as_deref(),
            Some("max-age=31536000")
        );
    }

    #[test]
    fn test_extra_info_resolved_by_request_id() {
        // The extra-info event arrives before the response event naming the URL.
        let log = NetworkLog::from_events(&json!({
            "log": { "entries": [
                { "method": "Network.responseReceivedExtraInfo", "params": {
                    "requestId": "42",
                    "statusCode": 200,
                    "headers": { "Cache-Control": "public, max-age=60" } } },
                { "method": "Network.responseReceived", "params": {
                    "requestId": "42",
                    "response": { "url": "https://a.no/data.json", "headers": {} } } }
            ] }
        }));

        assert!(log.unresolved_keys().is_empty());
        assert_eq!(
            log.get("https://a.no/data.json").unwrap().cache_control.as_deref(),
            Some("public, max-age=60")
        );
    }

    #[test]
    fn test_unresolvable_extra_info_kept_under_placeholder() {
        let log = NetworkLog::from_events(&json!({ "events": [
            { "method": "Network.responseReceivedExtraInfo", "params": {
                "requestId": "unknown",
                "statusCode": 304,
                "headers": { "cache-control": "max-age=5" } } },
            { "method": "Network.responseReceivedExtraInfo", "params": {
                "headers": { "cache-control": "max-age=9" } } }
        ] }));

        let keys = log.unresolved_keys();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0], "unresolved-response:304:1");
        assert_eq!(keys[1], "unresolved-response:0:2");
        assert_eq!(log.get(&keys[0]).unwrap().cache_control.as_deref(), Some("max-age=5"));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_unknown_document_shape_is_empty() {
        assert!(NetworkLog::from_events(&json!({ "something": 1 })).is_empty());
        assert!(NetworkLog::from_events(&json!(null)).is_empty());
    }

    #[test]
    fn test_redirect_headers_credited_to_current_hop() {
        let log = NetworkLog::from_events(&json!([
            { "method": "Network.requestWillBeSent", "params": {
                "requestId": "1", "request": { "url": "http://a.no/" } } },
            { "method": "Network.responseReceivedExtraInfo", "params": {
                "requestId": "1", "statusCode": 301,
                "headers": { "cache-control": "max-age=3600" } } },
            { "method": "Network.requestWillBeSent", "params": {
                "requestId": "1", "request": { "url": "https://a.no/" } } },
            { "method": "Network.responseReceivedExtraInfo", "params": {
                "requestId": "1", "statusCode": 200,
                "headers": { "cache-control": "max-age=9" } } },
            { "method": "Network.responseReceived", "params": {
                "requestId": "1",
                "response": { "url": "https://a.no/", "status": 200,
                              "headers": { "cache-control": "no-store" } } } }
        ]));

        let http = log.get("http://a.no/").unwrap();
        assert_eq!(http.cache_control.as_deref(), Some("max-age=3600"));
        assert_eq!(http.status_code, Some(301));

        let https = log.get("https://a.no/").unwrap();
        assert_eq!(https.cache_control.as_deref(), Some("max-age=9"));
        assert_eq!(https.status_code, Some(200));
    }

    #[test]
    fn test_early_extra_info_prefers_final_response_url() {
        let log = NetworkLog::from_events(&json!([
            { "method": "Network.responseReceivedExtraInfo", "params": {
                "requestId": "5", "headers": { "cache-control": "max-age=60" } } },
            { "method": "Network.requestWillBeSent", "params": {
                "requestId": "5", "request": { "url": "http://b.no/" } } },
            { "method": "Network.requestWillBeSent", "params": {
                "requestId": "5", "request": { "url": "https://b.no/" } } },
            { "method": "Network.responseReceived", "params": {
                "requestId": "5", "response": { "url": "https://b.no/", "headers": {} } } }
        ]));

        assert_eq!(log.get("https://b.no/").unwrap().cache_control.as_deref(), Some("max-age=60"));
        assert_eq!(log.get("http://b.no/").unwrap().cache_control, None);
    }
}
