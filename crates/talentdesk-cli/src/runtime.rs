// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use log::info;
use serde_json::{Map, Value};
use talentdesk_app::{ApiOutcome, DropdownOptions, RecordBatch, RecordId, RoleContext};
use talentdesk_client::Client;
use talentdesk_testkit::MemoryBackend;

const DEMO_SEED: u64 = 2025;
const DEMO_EXTRA_CANDIDATES: usize = 40;

/// Talks to the real REST backend.
pub struct ApiRuntime {
    client: Client,
}

impl ApiRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl talentdesk_tui::AppRuntime for ApiRuntime {
    fn load_dropdown_options(&mut self) -> Result<DropdownOptions> {
        self.client.fetch_dropdown_options()
    }

    fn load_records(&mut self) -> Result<RecordBatch> {
        self.client.fetch_records()
    }

    fn create_record(&mut self, record: &Map<String, Value>) -> Result<ApiOutcome> {
        self.client.create_record(record)
    }

    fn update_record(&mut self, id: &RecordId, patch: &Map<String, Value>) -> Result<ApiOutcome> {
        self.client.update_record(id, patch)
    }

    fn delete_record(&mut self, id: &RecordId) -> Result<ApiOutcome> {
        self.client.delete_record(id)
    }
}

/// Serves generated candidates from memory; nothing leaves the process.
pub struct DemoRuntime {
    backend: MemoryBackend,
}

impl DemoRuntime {
    pub fn new() -> Self {
        let backend = MemoryBackend::demo(DEMO_SEED, DEMO_EXTRA_CANDIDATES);
        info!(
            "demo backend seeded with {} candidates",
            backend.records().len()
        );
        Self { backend }
    }
}

impl Default for DemoRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl talentdesk_tui::AppRuntime for DemoRuntime {
    fn load_dropdown_options(&mut self) -> Result<DropdownOptions> {
        Ok(self.backend.dropdown_options())
    }

    fn load_records(&mut self) -> Result<RecordBatch> {
        Ok(self.backend.list())
    }

    fn create_record(&mut self, record: &Map<String, Value>) -> Result<ApiOutcome> {
        Ok(self.backend.create(record))
    }

    fn update_record(&mut self, id: &RecordId, patch: &Map<String, Value>) -> Result<ApiOutcome> {
        Ok(self.backend.update(id, patch))
    }

    fn delete_record(&mut self, id: &RecordId) -> Result<ApiOutcome> {
        Ok(self.backend.delete(id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckSummary {
    pub dropdown_fields: usize,
    pub candidates: usize,
    pub role: RoleContext,
}

/// Fetches the dropdown options and the candidate list once.
pub fn check_backend(client: &Client) -> Result<CheckSummary> {
    let options = client
        .fetch_dropdown_options()
        .with_context(|| format!("check GET {}/api/dropdown-options", client.base_url()))?;
    let batch = client
        .fetch_records()
        .with_context(|| format!("check GET {}/api/data", client.base_url()))?;
    Ok(CheckSummary {
        dropdown_fields: options.len(),
        candidates: batch.data.len(),
        role: batch.role(),
    })
}

#[cfg(test)]
mod tests {
    use super::{DemoRuntime, check_backend};
    use anyhow::{Result, anyhow};
    use serde_json::{Map, json};
    use std::thread;
    use std::time::Duration;
    use talentdesk_app::{RecordId, RoleContext};
    use talentdesk_client::Client;
    use talentdesk_tui::AppRuntime;
    use tiny_http::{Header, Response, Server};

    #[test]
    fn demo_runtime_serves_seeded_admin_batch() -> Result<()> {
        let mut runtime = DemoRuntime::new();
        let batch = runtime.load_records()?;
        assert!(batch.is_admin);
        assert_eq!(batch.data.len(), 43);
        assert!(runtime.load_dropdown_options()?.has_choices("Notice Period"));
        Ok(())
    }

    #[test]
    fn demo_runtime_applies_writes() -> Result<()> {
        let mut runtime = DemoRuntime::new();
        let mut patch = Map::new();
        patch.insert("Offered CTC".to_owned(), json!("1500000"));
        let outcome = runtime.update_record(&RecordId::from(1), &patch)?;
        assert!(outcome.is_success());

        let batch = runtime.load_records()?;
        let first = batch
            .data
            .iter()
            .find(|record| record.id == Some(RecordId::from(1)))
            .ok_or_else(|| anyhow!("record 1 should survive the update"))?;
        assert_eq!(first.get("Offered CTC"), Some(&json!(1500000)));

        let outcome = runtime.delete_record(&RecordId::from(999))?;
        assert!(!outcome.is_success());
        Ok(())
    }

    #[test]
    fn check_fetches_options_then_records() -> Result<()> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let addr = format!("http://{}", server.server_addr());

        let handle = thread::spawn(move || {
            for _ in 0..2 {
                let request = server.recv().expect("request expected");
                let body = match request.url() {
                    "/api/dropdown-options" => r#"{"In Notice":["Yes","No"]}"#,
                    "/api/data" => r#"{"data":[{"id":1,"Name":"John Doe"}],"is_admin":false}"#,
                    other => panic!("unexpected path {other}"),
                };
                let response = Response::from_string(body).with_header(
                    Header::from_bytes("Content-Type", "application/json")
                        .expect("valid content type header"),
                );
                request.respond(response).expect("response should succeed");
            }
        });

        let client = Client::new(&addr, Duration::from_secs(1), None)?;
        let summary = check_backend(&client)?;
        assert_eq!(summary.dropdown_fields, 1);
        assert_eq!(summary.candidates, 1);
        assert_eq!(summary.role, RoleContext::VIEWER);

        handle.join().expect("server thread should join");
        Ok(())
    }

    #[test]
    fn check_names_the_failing_endpoint() {
        let client = Client::new("http://127.0.0.1:1", Duration::from_millis(50), None)
            .expect("client should initialize");
        let error = check_backend(&client).expect_err("unreachable backend should fail");
        assert!(
            error.to_string().contains("/api/dropdown-options"),
            "{error:#}"
        );
    }
}
