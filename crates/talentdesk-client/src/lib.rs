// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use log::debug;
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::time::Duration;
use talentdesk_app::{ApiOutcome, DropdownOptions, RecordBatch, RecordId};
use url::Url;

/// Blocking client for the candidate REST backend.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration, session_cookie: Option<&str>) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("api.base_url must not be empty");
        }
        let base_url = Url::parse(trimmed)
            .with_context(|| format!("api.base_url {trimmed:?} is not a valid URL"))?;
        if base_url.cannot_be_a_base() {
            bail!("api.base_url {trimmed:?} must be an http(s) URL such as http://localhost:5000");
        }

        let mut headers = HeaderMap::new();
        if let Some(cookie) = session_cookie.filter(|cookie| !cookie.trim().is_empty()) {
            let value = HeaderValue::from_str(cookie.trim())
                .context("api.session_cookie contains characters not allowed in a header")?;
            headers.insert(COOKIE, value);
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn fetch_dropdown_options(&self) -> Result<DropdownOptions> {
        let url = self.endpoint(&["api", "dropdown-options"])?;
        let response = self.send(self.http.get(url))?;
        decode_success(response, "decode dropdown options")
    }

    pub fn fetch_records(&self) -> Result<RecordBatch> {
        let url = self.endpoint(&["api", "data"])?;
        let response = self.send(self.http.get(url))?;
        decode_success(
            response,
            "decode candidate list -- check api.session_cookie if the backend requires a login",
        )
    }

    pub fn create_record(&self, record: &Map<String, Value>) -> Result<ApiOutcome> {
        let url = self.endpoint(&["api", "data"])?;
        let response = self.send(self.http.post(url).json(record))?;
        decode_outcome(response)
    }

    /// Sends only the fields present in `patch`.
    pub fn update_record(&self, id: &RecordId, patch: &Map<String, Value>) -> Result<ApiOutcome> {
        let url = self.endpoint(&["api", "data", id.as_str()])?;
        let response = self.send(self.http.put(url).json(patch))?;
        decode_outcome(response)
    }

    pub fn delete_record(&self, id: &RecordId) -> Result<ApiOutcome> {
        let url = self.endpoint(&["api", "data", id.as_str()])?;
        let response = self.send(self.http.delete(url))?;
        decode_outcome(response)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("api.base_url cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = request.build().context("build request")?;
        debug!("{} {}", request.method(), request.url());
        self.http
            .execute(request)
            .map_err(|error| connection_error(self.base_url(), error))
    }
}

fn decode_success<T: DeserializeOwned>(response: Response, what: &'static str) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(clean_error_response(status, &body));
    }
    response.json().context(what)
}

/// Write endpoints answer `{status, message}` even on 4xx/5xx; those bodies are
/// logical failures, anything else is a transport error.
fn decode_outcome(response: Response) -> Result<ApiOutcome> {
    let status = response.status();
    let body = response.text().context("read write response")?;
    match serde_json::from_str::<ApiOutcome>(&body) {
        Ok(outcome) => {
            debug!("write answered {} with status {:?}", status.as_u16(), outcome.status);
            Ok(outcome)
        }
        Err(_) if status.is_success() => Err(anyhow!(
            "server returned {} with an unreadable body",
            status.as_u16()
        )),
        Err(_) => Err(clean_error_response(status, &body)),
    }
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!(
            "{base_url} did not answer in time -- raise api.timeout or check the backend ({error})"
        );
    }
    anyhow!("cannot reach {base_url} -- is the backend running? ({error})")
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(body)
        && let Some(Value::String(message)) = object.get("message")
        && !message.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), message);
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() < 100 && !trimmed.contains('<') {
        return anyhow!("server error ({}): {}", status.as_u16(), trimmed);
    }

    anyhow!("server returned {}", status.as_u16())
}
