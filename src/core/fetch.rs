use crate::config::ApiConfig;
use crate::core::Record;
use crate::utils::error::{EtlError, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::{default_on_request_failure, Retryable, RetryableStrategy, RetryTransientMiddleware};
use serde_json::Value;
use std::collections::HashMap;

/// Some APIs answer bot-filtered requests differently; a fixed desktop UA
/// keeps responses consistent. Always overrides a caller-supplied value.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.5790.102 Safari/537.36";

const MAX_TRANSPORT_RETRIES: u32 = 5;

const PRECISE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Retries connection-level failures only. HTTP status codes are never
/// retried: a non-2xx is either fatal or, for paginated fetches, the
/// 500-as-EOF signal, and retrying would break the latter.
struct TransportOnlyStrategy;

impl RetryableStrategy for TransportOnlyStrategy {
    fn handle(
        &self,
        res: &std::result::Result<reqwest::Response, reqwest_middleware::Error>,
    ) -> Option<Retryable> {
        match res {
            Ok(_) => None,
            Err(error) => default_on_request_failure(error),
        }
    }
}

/// What a response body turned out to contain. JSON-decode failures and
/// unexpected shapes are explicit variants rather than errors so the
/// degrade-to-empty policy stays visible and testable.
#[derive(Debug, PartialEq)]
pub enum BodyOutcome {
    Records(Vec<Record>),
    Malformed,
    Unexpected,
}

/// Classifies a response body: an object contributes its `results` array
/// (empty if absent), a top-level array contributes itself, anything else is
/// `Unexpected`, and non-JSON is `Malformed`.
pub fn classify_body(body: &str) -> BodyOutcome {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => return BodyOutcome::Malformed,
    };

    match value {
        Value::Object(mut object) => match object.remove("results") {
            Some(Value::Array(items)) => BodyOutcome::Records(collect_records(items)),
            Some(other) => {
                tracing::warn!("'results' field is not an array: {}", other);
                BodyOutcome::Records(Vec::new())
            }
            None => BodyOutcome::Records(Vec::new()),
        },
        Value::Array(items) => BodyOutcome::Records(collect_records(items)),
        _ => BodyOutcome::Unexpected,
    }
}

fn collect_records(items: Vec<Value>) -> Vec<Record> {
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(Record::new(map)),
            other => {
                tracing::warn!("Skipping non-object record: {}", other);
                None
            }
        })
        .collect()
}

/// Substitutes `{start_date}`/`{end_date}` into string params, returning a
/// fresh map so the config itself is never mutated. Substitution only happens
/// when both dates are present. An exclusive-end API (`includes_end_date` =
/// false) gets the end date advanced by one calendar day first.
pub fn substituted_params(config: &ApiConfig) -> Result<HashMap<String, Value>> {
    let mut params = config.params.clone();

    if let (Some(start), Some(end)) = (&config.start_date, &config.end_date) {
        let end = effective_end_date(end, config.includes_end_date, config.precise_timestamp)?;
        for value in params.values_mut() {
            if let Value::String(text) = value {
                let substituted = text
                    .replace("{start_date}", start)
                    .replace("{end_date}", &end);
                *value = Value::String(substituted);
            }
        }
    }

    Ok(params)
}

fn effective_end_date(end: &str, includes_end_date: bool, precise: bool) -> Result<String> {
    if includes_end_date {
        return Ok(end.to_string());
    }

    let invalid = || EtlError::InvalidDateFormat {
        value: end.to_string(),
    };

    if precise {
        let timestamp = NaiveDateTime::parse_from_str(end, PRECISE_FORMAT).map_err(|_| invalid())?;
        Ok((timestamp + Duration::days(1)).format(PRECISE_FORMAT).to_string())
    } else {
        let day = NaiveDate::parse_from_str(end, DATE_FORMAT).map_err(|_| invalid())?;
        Ok((day + Duration::days(1)).format(DATE_FORMAT).to_string())
    }
}

fn build_headers(headers: &HashMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();

    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
            EtlError::InvalidConfigValueError {
                field: "headers".to_string(),
                value: key.clone(),
                reason: e.to_string(),
            }
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| EtlError::InvalidConfigValueError {
            field: "headers".to_string(),
            value: key.clone(),
            reason: e.to_string(),
        })?;
        map.insert(name, value);
    }

    map.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    Ok(map)
}

fn query_pairs(params: &HashMap<String, Value>) -> Vec<(String, String)> {
    params
        .iter()
        .filter_map(|(key, value)| {
            let rendered = match value {
                Value::Null => return None,
                Value::String(text) => text.clone(),
                Value::Number(number) => number.to_string(),
                Value::Bool(flag) => flag.to_string(),
                nested => nested.to_string(),
            };
            Some((key.clone(), rendered))
        })
        .collect()
}

pub struct Fetcher {
    client: ClientWithMiddleware,
}

impl Fetcher {
    pub fn new() -> Self {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(MAX_TRANSPORT_RETRIES);
        let client = ClientBuilder::new(reqwest::Client::new())
            .with(RetryTransientMiddleware::new_with_policy_and_strategy(
                retry_policy,
                TransportOnlyStrategy,
            ))
            .build();

        Self { client }
    }

    /// Fetches every record the config describes, across all pages when
    /// pagination is on.
    pub async fn fetch(&self, config: &ApiConfig) -> Result<Vec<Record>> {
        let headers = build_headers(&config.headers)?;
        let params = substituted_params(config)?;

        if config.pagination {
            self.fetch_paginated(config, headers, params).await
        } else {
            self.fetch_single(config, headers, params).await
        }
    }

    async fn fetch_single(
        &self,
        config: &ApiConfig,
        headers: HeaderMap,
        params: HashMap<String, Value>,
    ) -> Result<Vec<Record>> {
        tracing::info!("Fetching data without pagination...");

        let response = self
            .client
            .get(&config.url)
            .headers(headers)
            .query(&query_pairs(&params))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EtlError::HttpStatusError {
                status: status.as_u16(),
                url: config.url.clone(),
            });
        }

        let body = response.text().await?;
        match classify_body(&body) {
            BodyOutcome::Records(records) => Ok(records),
            BodyOutcome::Malformed => {
                tracing::warn!("Invalid JSON response: {}", body);
                Ok(Vec::new())
            }
            BodyOutcome::Unexpected => {
                tracing::warn!("Unexpected response format");
                Ok(Vec::new())
            }
        }
    }

    async fn fetch_paginated(
        &self,
        config: &ApiConfig,
        headers: HeaderMap,
        params: HashMap<String, Value>,
    ) -> Result<Vec<Record>> {
        let mut all_records = Vec::new();
        let mut page: u64 = 1;

        loop {
            tracing::info!("Fetching data from page {}...", page);

            let mut query = query_pairs(&params);
            query.push(("page".to_string(), page.to_string()));

            let response = self
                .client
                .get(&config.url)
                .headers(headers.clone())
                .query(&query)
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::INTERNAL_SERVER_ERROR {
                // Some APIs signal "past the last page" with a 500 instead of
                // an empty body.
                tracing::info!("500 Server Error on page {}. Assuming no data.", page);
                break;
            }
            if !status.is_success() {
                return Err(EtlError::HttpStatusError {
                    status: status.as_u16(),
                    url: config.url.clone(),
                });
            }

            let body = response.text().await?;
            let records = match classify_body(&body) {
                BodyOutcome::Records(records) => records,
                BodyOutcome::Malformed => {
                    tracing::warn!("Invalid JSON response on page {}: {}", page, body);
                    break;
                }
                BodyOutcome::Unexpected => {
                    tracing::warn!("Unexpected response format on page {}", page);
                    break;
                }
            };

            if records.is_empty() {
                tracing::info!("No more data on page {}.", page);
                break;
            }

            all_records.extend(records);
            page += 1;
        }

        Ok(all_records)
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}
