// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use log::debug;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use talentdesk_app::{
    ApiOutcome, CandidateRecord, DropdownOptions, FieldCatalog, RecordBatch, RecordId,
};
use time::Month;

const REFERENCE_YEAR: i32 = 2025;

/// Fields the backend stores as integers when an update carries them.
pub const INTEGER_FIELDS: [&str; 3] = [
    "Current CTC per Annum",
    "Expected CTC per Annum",
    "Offered CTC",
];

const FIRST_NAMES: [&str; 16] = [
    "Aarav", "Priya", "Rohan", "Ananya", "Vikram", "Meera", "Arjun", "Kavya", "Ishaan", "Nisha",
    "Karthik", "Divya", "Siddharth", "Pooja", "Rahul", "Sneha",
];
const LAST_NAMES: [&str; 14] = [
    "Sharma", "Iyer", "Reddy", "Patel", "Nair", "Gupta", "Rao", "Menon", "Das", "Kulkarni",
    "Joshi", "Verma", "Pillai", "Bose",
];
const ORGANIZATIONS: [&str; 10] = [
    "Tech Solutions Inc.",
    "Data Insights Ltd.",
    "Creative Designs",
    "Cloudnine Systems",
    "Bluepeak Labs",
    "Orbit Software",
    "Northwind Analytics",
    "Lattice Works",
    "Quantum Retail Tech",
    "Saffron Digital",
];
const CERTIFICATIONS: [&str; 6] = [
    "AWS Certified Developer",
    "Google Data Analytics",
    "Adobe Certified Expert",
    "Certified Kubernetes Administrator",
    "Azure Fundamentals",
    "",
];
const REFERRERS: [&str; 5] = [
    "Employee Referral",
    "Job Portal",
    "Campus Recruitment",
    "LinkedIn",
    "Consultancy",
];
const REFEREES: [&str; 8] = [
    "Manager", "Team Lead", "Peer", "Client", "Director", "Mentor", "Professor", "HR",
];
const REMARK_WORDS: [&str; 24] = [
    "strong",
    "clear",
    "communication",
    "problem",
    "solving",
    "design",
    "testing",
    "depth",
    "systems",
    "ownership",
    "needs",
    "improvement",
    "confident",
    "collaborative",
    "fundamentals",
    "coding",
    "architecture",
    "databases",
    "debugging",
    "experience",
    "leadership",
    "curious",
    "structured",
    "approach",
];

/// Dropdown map served by the backend's `/api/dropdown-options`.
pub fn server_dropdown_options() -> DropdownOptions {
    let yes_no = || vec!["Yes".to_owned(), "No".to_owned()];
    let locations = || {
        owned(&[
            "Bangalore",
            "Chennai",
            "Hyderabad",
            "Mumbai",
            "Delhi",
            "Pune",
            "Kolkata",
            "Remote",
        ])
    };

    let mut map = BTreeMap::new();
    map.insert(
        "Interested Position".to_owned(),
        owned(&[
            "Backend Developer",
            "Frontend Developer",
            "Full Stack Developer",
            "DevOps Engineer",
            "Data Engineer",
            "Data Scientist",
            "UI/UX Designer",
            "Product Manager",
            "QA Engineer",
        ]),
    );
    map.insert(
        "Current Role".to_owned(),
        owned(&[
            "Software Engineer",
            "Senior Software Engineer",
            "Lead Engineer",
            "Engineering Manager",
            "Architect",
            "QA Engineer",
            "DevOps Engineer",
            "Data Engineer",
            "Data Scientist",
            "Product Manager",
            "UI/UX Designer",
        ]),
    );
    map.insert("Current Location".to_owned(), locations());
    map.insert("Location Preference".to_owned(), locations());
    map.insert(
        "Total Years of Experience".to_owned(),
        owned(&["0-1 years", "1-2 years", "2-3 years"]),
    );
    map.insert(
        "Notice Period".to_owned(),
        owned(&["Immediate", "15 days", "30 days", "60 days", "90 days"]),
    );
    map.insert("In Notice".to_owned(), yes_no());
    map.insert("Immediate Joiner".to_owned(), yes_no());
    map.insert("Offers in Hand".to_owned(), yes_no());
    map.insert("Reject Mail Sent".to_owned(), yes_no());

    let catalog = FieldCatalog::canonical();
    for (field, options) in catalog.hardcoded_options().iter() {
        map.insert(field.clone(), options.clone());
    }
    DropdownOptions::from_map(map)
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_owned()).collect()
}

/// The three candidates the backend seeds a fresh workbook with. The third
/// row carries no name.
pub fn sample_candidates() -> Vec<CandidateRecord> {
    let rows = [
        json!({
            "Date": "2025-01-15 09:30:00",
            "Name": "John Doe",
            "Email ID": "john.doe@example.com",
            "Contact Number": "9876543210",
            "Interested Position": "Software Developer",
            "Current Role": "Junior Developer",
            "Current Organization": "Tech Solutions Inc.",
            "Current Location": "Bangalore",
            "Current CTC per Annum": 800000,
            "Expected CTC per Annum": 1200000,
            "Total Years of Experience": "2-3 years",
            "Notice Period": "30 days",
            "In Notice": "Yes",
            "Immediate Joiner": "No",
            "Offers in Hand": "No",
            "Offered CTC": "",
            "Location Preference": "Bangalore",
            "Certifications": "AWS Certified Developer",
            "Resume": "https://example.com/resume/johndoe",
            "LinkedIn Profile": "https://linkedin.com/in/johndoe",
            "Comments": "Good communication skills",
            "Referred By": "Employee Referral",
            "Interview Status": "Scheduled",
            "Application Status": "In Process",
            "Initial Screening": "Candidate performed well in initial screening.",
            "Round 1 Remarks": "Strong technical skills demonstrated in Round 1.",
            "Round 2 Remarks": "Good problem-solving approach in Round 2.",
            "Remarks": "Promising candidate",
            "Reject Mail Sent": "No",
            "Final Remarks": "",
            "Month Count": 1,
            "Reference": "Jane Smith",
        }),
        json!({
            "Date": "2025-02-03 14:05:00",
            "Name": "Jane Smith",
            "Email ID": "jane.smith@example.com",
            "Contact Number": "8765432109",
            "Interested Position": "Data Scientist",
            "Current Role": "Data Analyst",
            "Current Organization": "Data Insights Ltd.",
            "Current Location": "Hyderabad",
            "Current CTC per Annum": 1000000,
            "Expected CTC per Annum": 1500000,
            "Total Years of Experience": "3-5 years",
            "Notice Period": "60 days",
            "In Notice": "No",
            "Immediate Joiner": "No",
            "Offers in Hand": "Yes",
            "Offered CTC": 1400000,
            "Location Preference": "Remote",
            "Certifications": "Google Data Analytics",
            "Resume": "",
            "LinkedIn Profile": "",
            "Comments": "",
            "Referred By": "Job Portal",
            "Interview Status": "Selected",
            "Application Status": "Offer Made",
            "Initial Screening": "",
            "Round 1 Remarks": "",
            "Round 2 Remarks": "",
            "Remarks": "Top candidate",
            "Reject Mail Sent": "No",
            "Final Remarks": "Waiting for candidate response",
            "Month Count": 2,
            "Reference": "Robert Johnson",
        }),
        json!({
            "Date": "2025-02-20 11:45:00",
            "Name": "",
            "Email ID": "sam.wilson@example.com",
            "Contact Number": "7654321098",
            "Interested Position": "UI/UX Designer",
            "Current Role": "Graphic Designer",
            "Current Organization": "Creative Designs",
            "Current Location": "Chennai",
            "Current CTC per Annum": 700000,
            "Expected CTC per Annum": 1000000,
            "Total Years of Experience": "1-2 years",
            "Notice Period": "15 days",
            "In Notice": "Yes",
            "Immediate Joiner": "Yes",
            "Offers in Hand": "No",
            "Offered CTC": "",
            "Location Preference": "Chennai",
            "Certifications": "Adobe Certified Expert",
            "Resume": "",
            "LinkedIn Profile": "",
            "Comments": "",
            "Referred By": "Campus Recruitment",
            "Interview Status": "Rejected",
            "Application Status": "Rejected",
            "Initial Screening": "",
            "Round 1 Remarks": "",
            "Round 2 Remarks": "",
            "Remarks": "Not enough experience",
            "Reject Mail Sent": "Yes",
            "Final Remarks": "Consider for junior positions",
            "Month Count": 1,
            "Reference": "Emily Davis",
        }),
    ];

    rows.into_iter()
        .zip(1_i64..)
        .filter_map(|(row, id)| match row {
            Value::Object(fields) => Some(CandidateRecord::new(Some(RecordId::from(id)), fields)),
            _ => None,
        })
        .collect()
}

pub fn fixture_datetime() -> &'static str {
    "2025-03-14 10:15:00"
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Seeded generator of plausible candidate rows.
#[derive(Debug, Clone)]
pub struct CandidateFaker {
    rng: DeterministicRng,
    options: DropdownOptions,
    seed: u64,
}

impl CandidateFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            options: server_dropdown_options(),
            seed: normalized,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    /// A candidate dated somewhere in the first half of the reference year.
    pub fn candidate(&mut self) -> Map<String, Value> {
        let month = Month::January.nth_next(self.rng.int_n(6) as u8);
        self.candidate_in_month(REFERENCE_YEAR, month)
    }

    pub fn candidate_in_month(&mut self, year: i32, month: Month) -> Map<String, Value> {
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        let current_ctc = self.int_range(30, 300) * 10_000;
        let expected_ctc = current_ctc / 100 * self.int_range(110, 150);
        let application_status = self.option("Application Status");
        let offers_in_hand = if self.rng.bool() { "Yes" } else { "No" };
        let offered_ctc = match application_status.as_str() {
            "Accepted" | "Joined" | "In Notice" => {
                json!(expected_ctc / 100 * self.int_range(90, 105))
            }
            _ => json!(""),
        };
        let handle = format!("{}.{}", first.to_lowercase(), last.to_lowercase());

        let mut fields = Map::new();
        fields.insert(
            "Date".to_owned(),
            json!(format!(
                "{year}-{:02}-{:02} {:02}:{:02}:00",
                u8::from(month),
                self.int_range(1, 28),
                self.int_range(9, 18),
                self.int_range(0, 59),
            )),
        );
        fields.insert("Name".to_owned(), json!(format!("{first} {last}")));
        fields.insert("Email ID".to_owned(), json!(format!("{handle}@example.com")));
        fields.insert(
            "Contact Number".to_owned(),
            json!(format!("9{:09}", self.int_range(0, 999_999_999))),
        );
        for field in [
            "Interested Position",
            "Current Role",
            "Current Location",
            "Total Years of Experience",
            "Notice Period",
            "In Notice",
            "Immediate Joiner",
        ] {
            let value = self.option(field);
            fields.insert(field.to_owned(), json!(value));
        }
        fields.insert(
            "Current Organization".to_owned(),
            json!(self.pick(&ORGANIZATIONS)),
        );
        fields.insert("Current CTC per Annum".to_owned(), json!(current_ctc));
        fields.insert("Expected CTC per Annum".to_owned(), json!(expected_ctc));
        fields.insert("Offers in Hand".to_owned(), json!(offers_in_hand));
        fields.insert("Offered CTC".to_owned(), offered_ctc);
        let preference = self.option("Location Preference");
        fields.insert("Location Preference".to_owned(), json!(preference));
        fields.insert(
            "Certifications".to_owned(),
            json!(self.pick(&CERTIFICATIONS)),
        );
        fields.insert(
            "Resume".to_owned(),
            json!(format!("https://example.com/resume/{handle}")),
        );
        fields.insert(
            "LinkedIn Profile".to_owned(),
            json!(format!("https://linkedin.com/in/{handle}")),
        );
        fields.insert("Referred By".to_owned(), json!(self.pick(&REFERRERS)));
        let interview_status = self.option("Interview Status");
        fields.insert("Interview Status".to_owned(), json!(interview_status));
        fields.insert("Application Status".to_owned(), json!(application_status));
        for field in ["Initial Screening", "Round 1 Remarks", "Round 2 Remarks"] {
            let remark = if self.rng.bool() {
                self.sentence(4, 10)
            } else {
                String::new()
            };
            fields.insert(field.to_owned(), json!(remark));
        }
        fields.insert("Remarks".to_owned(), json!(self.sentence(2, 6)));
        let rejected = application_status == "Rejected";
        fields.insert(
            "Reject Mail Sent".to_owned(),
            json!(if rejected { "Yes" } else { "No" }),
        );
        fields.insert("Month Count".to_owned(), json!(self.int_range(1, 3)));
        fields.insert(
            "Reference Feedback".to_owned(),
            json!(self.reference_feedback()),
        );
        fields
    }

    fn option(&mut self, field: &str) -> String {
        let choices = self.options.get(field);
        if choices.is_empty() {
            return String::new();
        }
        choices[self.rng.int_n(choices.len())].clone()
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }

    fn reference_feedback(&mut self) -> String {
        let count = self.rng.int_n(4);
        let mut given = Vec::with_capacity(count);
        for _ in 0..count {
            given.push(self.pick(&REFEREES));
        }
        given.join(", ")
    }

    fn sentence(&mut self, min_words: usize, max_words: usize) -> String {
        let count = self.int_range(min_words as i64, max_words as i64) as usize;
        let mut parts = Vec::with_capacity(count);
        for _ in 0..count {
            parts.push(self.pick(&REMARK_WORDS).to_owned());
        }
        let mut sentence = parts.join(" ");
        if let Some(first) = sentence.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        sentence.push('.');
        sentence
    }
}

/// In-memory stand-in for the REST backend with the same answers the real
/// one gives: ids are assigned on create, CTC fields are stored as integers
/// when they parse, unknown ids answer `{status: "error"}`.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    records: Vec<CandidateRecord>,
    options: DropdownOptions,
    is_admin: bool,
    next_id: i64,
    rejection: Option<String>,
}

impl MemoryBackend {
    pub fn new(records: Vec<CandidateRecord>, is_admin: bool) -> Self {
        let next_id = records
            .iter()
            .filter_map(|record| record.id.as_ref())
            .filter_map(|id| id.as_str().parse::<i64>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            records,
            options: server_dropdown_options(),
            is_admin,
            next_id,
            rejection: None,
        }
    }

    /// Sample candidates followed by `extra` generated ones.
    pub fn demo(seed: u64, extra: usize) -> Self {
        let mut backend = Self::new(sample_candidates(), true);
        let mut faker = CandidateFaker::new(seed);
        for _ in 0..extra {
            backend.insert(faker.candidate());
        }
        backend
    }

    pub fn set_admin(&mut self, is_admin: bool) {
        self.is_admin = is_admin;
    }

    pub fn set_options(&mut self, options: DropdownOptions) {
        self.options = options;
    }

    /// Every following write answers `{status: "error", message}`.
    pub fn reject_writes(&mut self, message: impl Into<String>) {
        self.rejection = Some(message.into());
    }

    pub fn accept_writes(&mut self) {
        self.rejection = None;
    }

    pub fn records(&self) -> &[CandidateRecord] {
        &self.records
    }

    pub fn dropdown_options(&self) -> DropdownOptions {
        self.options.clone()
    }

    pub fn list(&self) -> RecordBatch {
        RecordBatch {
            data: self.records.clone(),
            is_admin: self.is_admin,
        }
    }

    pub fn create(&mut self, record: &Map<String, Value>) -> ApiOutcome {
        if let Some(outcome) = self.rejected() {
            return outcome;
        }
        let id = self.insert(record.clone());
        debug!("memory backend created candidate {id}");
        ApiOutcome::success("Data added successfully")
    }

    pub fn update(&mut self, id: &RecordId, patch: &Map<String, Value>) -> ApiOutcome {
        if let Some(outcome) = self.rejected() {
            return outcome;
        }
        let Some(record) = self
            .records
            .iter_mut()
            .find(|record| record.id.as_ref() == Some(id))
        else {
            return not_found(id);
        };

        let stored = patch
            .iter()
            .map(|(key, value)| {
                let value = if INTEGER_FIELDS.contains(&key.as_str()) {
                    integer_or_original(value)
                } else {
                    value.clone()
                };
                (key.clone(), value)
            })
            .collect();
        record.apply_patch(&stored);
        ApiOutcome::success("Data updated successfully")
    }

    pub fn delete(&mut self, id: &RecordId) -> ApiOutcome {
        if let Some(outcome) = self.rejected() {
            return outcome;
        }
        let Some(position) = self
            .records
            .iter()
            .position(|record| record.id.as_ref() == Some(id))
        else {
            return not_found(id);
        };
        self.records.remove(position);
        ApiOutcome::success("Data deleted successfully")
    }

    fn insert(&mut self, mut fields: Map<String, Value>) -> RecordId {
        fields.remove(talentdesk_app::ID_KEY);
        let id = RecordId::from(self.next_id);
        self.next_id += 1;
        self.records
            .push(CandidateRecord::new(Some(id.clone()), fields));
        id
    }

    fn rejected(&self) -> Option<ApiOutcome> {
        self.rejection.as_ref().map(ApiOutcome::error)
    }
}

fn not_found(id: &RecordId) -> ApiOutcome {
    ApiOutcome::error(format!("No record found with id {id}"))
}

fn integer_or_original(value: &Value) -> Value {
    let parsed = match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.map_or_else(|| value.clone(), Value::from)
}
