use std::collections::HashMap;

use uuid::Uuid;

use crate::config::LogOptions;
use crate::error::Error;
use crate::filter::filter_data;
use crate::har::{
    Group, Har, HarCache, HarContent, HarCreator, HarEntry, HarHeader, HarLog, HarPostData,
    HarQueryParam, HarRequest, HarResponse, HarTiming, OutgoingLogBody, HAR_VERSION, LOG_VERSION,
};
use crate::masker::mask;
use crate::payload::{header, PayloadData, RequestData, ResponseData, UserData};

const CREATOR_NAME: &str = "readme-metrics (rust)";

/// Builds the complete wire envelope for one captured exchange. The payload
/// is consumed: redaction rewrites the owned request/response first, then
/// the filtered data is embedded. Malformed upstream data surfaces as an
/// error; the caller logs it and drops the single exchange.
pub fn construct(mut payload: PayloadData, options: &LogOptions) -> Result<OutgoingLogBody, Error> {
    filter_data(&mut payload.request, options);
    filter_data(&mut payload.response, options);

    let group = assemble_group(&payload.user)?;
    let entry = assemble_entry(&payload)?;

    Ok(OutgoingLogBody {
        id: Uuid::new_v4(),
        version: LOG_VERSION,
        client_ip_address: payload.request.remote_address.clone(),
        development: options.development,
        group,
        request: Har {
            log: assemble_log(entry),
        },
    })
}

fn assemble_group(user: &UserData) -> Result<Group, Error> {
    let api_key = user.api_key.as_deref().ok_or(Error::MissingApiKey)?;
    Ok(Group {
        id: mask(api_key)?,
        label: user.label.clone(),
        email: user.email.clone(),
    })
}

fn assemble_log(entry: HarEntry) -> HarLog {
    HarLog {
        version: HAR_VERSION.to_string(),
        creator: HarCreator {
            name: CREATOR_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            comment: Some(format!(
                "{}-{}",
                std::env::consts::ARCH,
                std::env::consts::OS
            )),
        },
        entries: vec![entry],
    }
}

fn assemble_entry(payload: &PayloadData) -> Result<HarEntry, Error> {
    let server_time = (payload.response_ended_at - payload.request_started_at).num_milliseconds();
    Ok(HarEntry {
        page_ref: page_ref(&payload.request),
        started_date_time: payload.request_started_at,
        time: server_time,
        request: assemble_request(&payload.request),
        response: assemble_response(&payload.response)?,
        cache: HarCache::default(),
        timings: HarTiming::from_server_time(server_time),
    })
}

/// Route path when the host knows it, otherwise a best-effort URL from the
/// host header; empty when neither is available.
fn page_ref(request: &RequestData) -> String {
    if let Some(route) = &request.route_path {
        return route.clone();
    }
    match header(&request.headers, "host") {
        Some(host) => format!("{}://{}{}", request.protocol, host, request.url),
        None => String::new(),
    }
}

fn assemble_request(request: &RequestData) -> HarRequest {
    let query = request
        .request_parameters
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("&");
    let url = if query.is_empty() {
        request.url.clone()
    } else {
        format!("{}?{}", request.url, query)
    };

    let post_data = if request.method != "GET" {
        request.body.as_ref().map(|body| HarPostData {
            mime_type: header(&request.headers, "content-type").map(str::to_owned),
            text: body.clone(),
        })
    } else {
        None
    };

    HarRequest {
        method: request.method.clone(),
        url,
        http_version: request.protocol.clone(),
        headers: convert_headers(&request.headers),
        query_string: request
            .request_parameters
            .iter()
            .map(|(name, value)| HarQueryParam {
                name: name.clone(),
                value: value.clone(),
            })
            .collect(),
        post_data,
    }
}

fn assemble_response(response: &ResponseData) -> Result<HarResponse, Error> {
    let body = response.body.as_deref();
    let size = match header(&response.headers, "content-length") {
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::InvalidContentLength(raw.to_string()))?,
        None => body.map(|text| text.len() as i64).unwrap_or(0),
    };
    Ok(HarResponse {
        status: response.status_code,
        status_text: response.status_message.clone(),
        headers: convert_headers(&response.headers),
        content: HarContent {
            size,
            mime_type: header(&response.headers, "content-type").map(str::to_owned),
            text: body.map(str::to_owned),
        },
    })
}

fn convert_headers(headers: &HashMap<String, String>) -> Vec<HarHeader> {
    headers
        .iter()
        .map(|(name, value)| HarHeader {
            name: name.clone(),
            value: value.clone(),
        })
        .collect()
}
