//! Metrics contexts and the console's metrics text format

use serde::{Deserialize, Serialize};

use super::error::{ErrorKind, HmcError, Result};
use super::request::{Request, Transport};
use super::response::ResponseHandler;

pub const METRICS_CONTEXT_PATH: &str = "/services/metrics/context";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MetricInfo {
    pub metric_name: String,
    pub metric_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MetricGroupInfo {
    pub group_name: String,
    #[serde(default)]
    pub metric_infos: Vec<MetricInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MetricsContext {
    #[serde(rename = "metrics-context-uri")]
    pub uri: String,
    #[serde(default)]
    pub metric_group_infos: Vec<MetricGroupInfo>,
}

impl MetricsContext {
    /// Column of `metric` within the value rows of `group`.
    pub fn metric_index(&self, group: &str, metric: &str) -> Option<usize> {
        self.metric_group_infos
            .iter()
            .find(|info| info.group_name == group)?
            .metric_infos
            .iter()
            .position(|info| info.metric_name == metric)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct CreateContextRequest<'a> {
    anticipated_frequency_seconds: u32,
    metric_groups: &'a [&'a str],
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Integer(i64),
    Double(f64),
    Boolean(bool),
    String(String),
}

impl MetricValue {
    fn parse(field: &str) -> Self {
        let field = field.trim();
        if let Some(inner) = field
            .strip_prefix('"')
            .and_then(|f| f.strip_suffix('"'))
        {
            return MetricValue::String(inner.replace("\"\"", "\""));
        }
        match field {
            "true" => MetricValue::Boolean(true),
            "false" => MetricValue::Boolean(false),
            _ => {
                if let Ok(i) = field.parse::<i64>() {
                    MetricValue::Integer(i)
                } else if let Ok(d) = field.parse::<f64>() {
                    MetricValue::Double(d)
                } else {
                    MetricValue::String(field.to_string())
                }
            }
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetricValue::Integer(i) => Some(*i),
            MetricValue::Double(d) => Some(d.round() as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Integer(i) => Some(*i as f64),
            MetricValue::Double(d) => Some(*d),
            _ => None,
        }
    }
}

/// Metric values reported for one object.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSample {
    pub group: String,
    pub object_uri: String,
    /// Milliseconds since the epoch.
    pub timestamp: i64,
    pub rows: Vec<Vec<MetricValue>>,
}

impl MetricsSample {
    pub fn value(&self, index: usize) -> Option<&MetricValue> {
        self.rows.first().and_then(|row| row.get(index))
    }
}

enum ParseState {
    Group,
    Object,
    Timestamp,
    Rows,
}

/// Parse a metrics response body.
///
/// A group is its quoted name followed by object blocks and closed by an
/// empty line. An object block is a quoted URI, a timestamp and one or more
/// value rows, closed by an empty line.
pub fn parse_metrics(text: &str) -> Result<Vec<MetricsSample>> {
    let mut samples = Vec::new();
    let mut state = ParseState::Group;
    let mut group = String::new();
    let mut current: Option<MetricsSample> = None;

    for (number, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        match state {
            ParseState::Group => {
                if !line.is_empty() {
                    group = unquote(line);
                    state = ParseState::Object;
                }
            }
            ParseState::Object => {
                if line.is_empty() {
                    state = ParseState::Group;
                } else {
                    current = Some(MetricsSample {
                        group: group.clone(),
                        object_uri: unquote(line),
                        timestamp: 0,
                        rows: Vec::new(),
                    });
                    state = ParseState::Timestamp;
                }
            }
            ParseState::Timestamp => {
                let timestamp = line.trim().parse::<i64>().map_err(|_| {
                    HmcError::new(
                        ErrorKind::Unmarshal,
                        format!("line {}: invalid metrics timestamp {:?}", number + 1, line),
                    )
                })?;
                if let Some(sample) = current.as_mut() {
                    sample.timestamp = timestamp;
                }
                state = ParseState::Rows;
            }
            ParseState::Rows => {
                if line.is_empty() {
                    samples.extend(current.take());
                    state = ParseState::Object;
                } else if let Some(sample) = current.as_mut() {
                    sample
                        .rows
                        .push(split_row(line).iter().map(|f| MetricValue::parse(f)).collect());
                }
            }
        }
    }

    if matches!(state, ParseState::Timestamp) {
        return Err(HmcError::new(
            ErrorKind::Unmarshal,
            "metrics data ends before the timestamp line",
        ));
    }
    samples.extend(current.take());
    Ok(samples)
}

fn unquote(line: &str) -> String {
    let line = line.trim();
    line.strip_prefix('"')
        .and_then(|l| l.strip_suffix('"'))
        .unwrap_or(line)
        .to_string()
}

/// Split on commas outside double quotes. Quotes are kept on the fields.
fn split_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                field.push(c);
            }
            ',' if !quoted => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

pub struct MetricsApi<'a> {
    transport: &'a dyn Transport,
}

impl<'a> MetricsApi<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    /// POST /services/metrics/context
    pub async fn create_context(
        &self,
        groups: &[&str],
        frequency_seconds: u32,
    ) -> Result<MetricsContext> {
        let url = self.transport.endpoint().resource_url(METRICS_CONTEXT_PATH);
        let request = Request::post(url).json(&CreateContextRequest {
            anticipated_frequency_seconds: frequency_seconds,
            metric_groups: groups,
        })?;
        let response = self.transport.execute(request).await?;
        ResponseHandler::json(response, &[200, 201])
    }

    /// GET <metrics-context-uri>
    pub async fn get_metrics(&self, context_uri: &str) -> Result<Vec<MetricsSample>> {
        let url = self.transport.endpoint().resource_url(context_uri);
        let response = self.transport.execute(Request::get(url)).await?;
        match response.status {
            200 | 206 => parse_metrics(&String::from_utf8_lossy(&response.body)),
            _ => Err(ResponseHandler::unexpected(&response)),
        }
    }

    /// DELETE <metrics-context-uri>
    pub async fn delete_context(&self, context_uri: &str) -> Result<()> {
        let url = self.transport.endpoint().resource_url(context_uri);
        let response = self.transport.execute(Request::delete(url)).await?;
        ResponseHandler::empty(response, &[204])
    }
}
