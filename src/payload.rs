use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

/// The calling end-user, as extracted by the host application. Only the
/// masked form of `api_key` ever leaves the process.
#[derive(Debug, Clone, Default)]
pub struct UserData {
    pub api_key: Option<String>,
    pub email: Option<String>,
    pub label: Option<String>,
}

/// Captured request side of one exchange. Header keys are stored lowercase
/// by the capture layer.
#[derive(Debug, Clone, Default)]
pub struct RequestData {
    pub method: String,
    pub url: String,
    pub route_path: Option<String>,
    pub remote_address: Option<String>,
    pub protocol: String,
    /// Query parameters; absent values are stored as empty strings.
    pub request_parameters: BTreeMap<String, String>,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

/// Captured response side of one exchange.
#[derive(Debug, Clone, Default)]
pub struct ResponseData {
    pub status_code: u16,
    pub status_message: String,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

/// Everything known about one captured exchange. Produced by the host's
/// capture filter, consumed exactly once by envelope construction.
#[derive(Debug, Clone)]
pub struct PayloadData {
    pub user: UserData,
    pub request: RequestData,
    pub response: ResponseData,
    pub request_started_at: DateTime<Utc>,
    pub response_ended_at: DateTime<Utc>,
}

/// Body and header access shared by the request and response sides, so the
/// redaction engine stays independent of any capture framework.
pub trait Filterable {
    fn body(&self) -> Option<&str>;
    fn set_body(&mut self, body: Option<String>);
    fn headers(&self) -> &HashMap<String, String>;
    fn headers_mut(&mut self) -> &mut HashMap<String, String>;
}

impl Filterable for RequestData {
    fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    fn set_body(&mut self, body: Option<String>) {
        self.body = body;
    }

    fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.headers
    }
}

impl Filterable for ResponseData {
    fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    fn set_body(&mut self, body: Option<String>) {
        self.body = body;
    }

    fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.headers
    }
}

/// Case-insensitive header lookup.
pub fn header<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(header_name, _)| header_name.eq_ignore_ascii_case(name))
        .map(|(_, header_value)| header_value.as_str())
}
