//! JSON-lines request loop for `lancegate session`.
//!
//! Each input line is one request, each output line one response:
//!
//! ```text
//! → {"op":"create_table","name":"t","dimension":3}
//! ← {"status":200,"result":{"message":"Created table t"}}
//! → {"op":"search_vectors","table":"ghost","vector":[1,0,0]}
//! ← {"status":404,"error":"Database error: Table ghost not found: ..."}
//! ```
//!
//! One gateway connection serves every request of the session.

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use lancegate_core::constants::DEFAULT_SEARCH_LIMIT;
use lancegate_core::{Gateway, GatewayError, SearchQuery, TableConfig, VectorData};

/// A single session request, tagged by `op`.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    CreateTable {
        #[serde(alias = "table_name")]
        name: String,
        dimension: usize,
    },
    AddVector {
        #[serde(alias = "table_name")]
        table: String,
        vector: Vec<f32>,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        metadata: Option<serde_json::Map<String, Value>>,
    },
    SearchVectors {
        #[serde(alias = "table_name")]
        table: String,
        vector: Vec<f32>,
        #[serde(default = "default_limit")]
        limit: usize,
    },
    ListTables,
    DescribeTable {
        #[serde(alias = "table_name")]
        table: String,
    },
    Status,
}

fn default_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

/// A single session response.
#[derive(Debug, Serialize, PartialEq)]
pub struct Response {
    /// 200 on success, otherwise 400, 404 or 500.
    pub status: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    fn ok(result: Value) -> Self {
        Self {
            status: 200,
            result: Some(result),
            error: None,
        }
    }

    fn failure(status: u16, error: impl Into<String>) -> Self {
        Self {
            status,
            result: None,
            error: Some(error.into()),
        }
    }
}

impl From<GatewayError> for Response {
    fn from(err: GatewayError) -> Self {
        Self::failure(err.status_code(), err.to_string())
    }
}

/// Counters reported when a session ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub requests: usize,
    pub failures: usize,
}

/// Serve requests from `input` until EOF, writing one response per line.
///
/// Blank lines are skipped. Only I/O errors on the streams end the session
/// early; request failures are reported in-band.
pub fn run_session<R, W>(gateway: &Gateway, input: R, mut output: W) -> std::io::Result<SessionSummary>
where
    R: BufRead,
    W: Write,
{
    let mut summary = SessionSummary::default();

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let response = handle_line(gateway, &line);
        summary.requests += 1;
        if response.status != 200 {
            summary.failures += 1;
        }

        serde_json::to_writer(&mut output, &response)?;
        output.write_all(b"\n")?;
        output.flush()?;
    }

    tracing::debug!(
        "Session finished: {} requests, {} failed",
        summary.requests,
        summary.failures
    );
    Ok(summary)
}

/// Parse and dispatch one request line.
pub fn handle_line(gateway: &Gateway, line: &str) -> Response {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!("Malformed request: {}", e);
            return Response::failure(400, format!("Malformed request: {}", e));
        }
    };

    match dispatch(gateway, request) {
        Ok(result) => Response::ok(result),
        Err(e) => {
            tracing::debug!("Request failed: {}", e);
            e.into()
        }
    }
}

fn dispatch(gateway: &Gateway, request: Request) -> Result<Value, GatewayError> {
    match request {
        Request::CreateTable { name, dimension } => {
            gateway.create_table(&TableConfig::new(&name, dimension))?;
            Ok(json!({ "message": format!("Created table {}", name) }))
        }
        Request::AddVector {
            table,
            vector,
            text,
            metadata,
        } => {
            let data = VectorData {
                vector,
                text,
                metadata,
            };
            gateway.add_vector(&table, &data)?;
            Ok(json!({ "message": format!("Added vector to table {}", table) }))
        }
        Request::SearchVectors {
            table,
            vector,
            limit,
        } => {
            let hits = gateway.search_vectors(&table, &SearchQuery { vector, limit })?;
            Ok(to_value(&hits))
        }
        Request::ListTables => Ok(to_value(&gateway.list_tables()?)),
        Request::DescribeTable { table } => Ok(to_value(&gateway.describe_table(&table)?)),
        Request::Status => Ok(to_value(&gateway.status())),
    }
}

fn to_value<T: Serialize>(value: &T) -> Value {
    // Plain data types with string keys always serialize
    serde_json::to_value(value).unwrap_or(Value::Null)
}
