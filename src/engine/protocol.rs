//! Worker wire protocol
//!
//! Requests and responses are `{id, type, payload}` objects. `id` correlates
//! a response with its request; `type` selects the payload shape.
//!
//! ```text
//! → {"id":"k3","type":"SORT","payload":{"text":"b\na","ascending":true,"locale":"en-US"}}
//! ← {"id":"k3","type":"SUCCESS","payload":{"result":"a\nb","processed":2}}
//! ```
//!
//! Requests are read through a loose [`RequestEnvelope`] first so that a
//! request with an unknown type or malformed payload can still be answered
//! with an `ERROR` carrying its id.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::errors::EngineError;
use crate::models::OperationId;
use crate::transforms::{Collation, SearchReplaceOptions, SortDirection, SortOptions};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestType {
    ApplyOperation,
    SearchReplace,
    Sort,
    RemoveDuplicates,
    AnalyzeText,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::ApplyOperation => "APPLY_OPERATION",
            RequestType::SearchReplace => "SEARCH_REPLACE",
            RequestType::Sort => "SORT",
            RequestType::RemoveDuplicates => "REMOVE_DUPLICATES",
            RequestType::AnalyzeText => "ANALYZE_TEXT",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApplyOperationPayload {
    pub text: String,
    /// Wire name of the operation; resolved against the registry by the worker
    pub operation: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchReplacePayload {
    pub text: String,
    #[serde(flatten)]
    pub options: SearchReplaceOptions,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SortPayload {
    pub text: String,
    pub ascending: bool,
    #[serde(default = "default_sort_locale")]
    pub locale: Collation,
}

fn default_sort_locale() -> Collation {
    Collation::Cyrillic
}

impl SortPayload {
    pub fn options(&self) -> SortOptions {
        let direction = if self.ascending {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        };
        SortOptions::new(direction, self.locale)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextPayload {
    pub text: String,
}

/// A typed request body
#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    ApplyOperation(ApplyOperationPayload),
    SearchReplace(SearchReplacePayload),
    Sort(SortPayload),
    RemoveDuplicates(TextPayload),
    AnalyzeText(TextPayload),
}

impl Request {
    /// Build the request the editor sends for a registry operation.
    ///
    /// Sort operations become `SORT` with direction and collation,
    /// `remove_duplicates` becomes `REMOVE_DUPLICATES`, everything else is
    /// `APPLY_OPERATION`.
    pub fn for_operation(id: OperationId, text: impl Into<String>) -> Self {
        let text = text.into();
        let sort = |text, ascending, locale| Request::Sort(SortPayload { text, ascending, locale });

        match id {
            OperationId::SortAsc => sort(text, true, Collation::Latin),
            OperationId::SortDesc => sort(text, false, Collation::Latin),
            OperationId::SortAscCyrillic => sort(text, true, Collation::Cyrillic),
            OperationId::SortDescCyrillic => sort(text, false, Collation::Cyrillic),
            OperationId::RemoveDuplicates => Request::RemoveDuplicates(TextPayload { text }),
            _ => Request::ApplyOperation(ApplyOperationPayload {
                text,
                operation: id.as_str().to_string(),
            }),
        }
    }

    pub fn search_replace(text: impl Into<String>, options: SearchReplaceOptions) -> Self {
        Request::SearchReplace(SearchReplacePayload {
            text: text.into(),
            options,
        })
    }

    pub fn analyze(text: impl Into<String>) -> Self {
        Request::AnalyzeText(TextPayload { text: text.into() })
    }

    pub fn kind(&self) -> RequestType {
        match self {
            Request::ApplyOperation(_) => RequestType::ApplyOperation,
            Request::SearchReplace(_) => RequestType::SearchReplace,
            Request::Sort(_) => RequestType::Sort,
            Request::RemoveDuplicates(_) => RequestType::RemoveDuplicates,
            Request::AnalyzeText(_) => RequestType::AnalyzeText,
        }
    }

    /// The input text the request operates on
    pub fn text(&self) -> &str {
        match self {
            Request::ApplyOperation(p) => &p.text,
            Request::SearchReplace(p) => &p.text,
            Request::Sort(p) => &p.text,
            Request::RemoveDuplicates(p) | Request::AnalyzeText(p) => &p.text,
        }
    }

    fn serialize_payload<S: SerializeStruct>(&self, state: &mut S) -> Result<(), S::Error> {
        match self {
            Request::ApplyOperation(p) => state.serialize_field("payload", p),
            Request::SearchReplace(p) => state.serialize_field("payload", p),
            Request::Sort(p) => state.serialize_field("payload", p),
            Request::RemoveDuplicates(p) | Request::AnalyzeText(p) => {
                state.serialize_field("payload", p)
            }
        }
    }
}

/// Loosely typed request as it arrives off the wire
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "RequestEnvelope")]
pub struct WorkerRequest {
    pub id: String,
    pub request: Request,
}

impl WorkerRequest {
    pub fn new(id: impl Into<String>, request: Request) -> Self {
        Self {
            id: id.into(),
            request,
        }
    }
}

impl Serialize for WorkerRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("WorkerRequest", 3)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("type", &self.request.kind())?;
        self.request.serialize_payload(&mut state)?;
        state.end()
    }
}

impl TryFrom<RequestEnvelope> for WorkerRequest {
    type Error = EngineError;

    fn try_from(envelope: RequestEnvelope) -> Result<Self, Self::Error> {
        fn payload<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, EngineError> {
            serde_json::from_value(value).map_err(|e| EngineError::Protocol(e.to_string()))
        }

        let kind: RequestType = serde_json::from_value(Value::String(envelope.kind.clone()))
            .map_err(|_| EngineError::Protocol(format!("Unknown request type: {}", envelope.kind)))?;

        let request = match kind {
            RequestType::ApplyOperation => Request::ApplyOperation(payload(envelope.payload)?),
            RequestType::SearchReplace => Request::SearchReplace(payload(envelope.payload)?),
            RequestType::Sort => Request::Sort(payload(envelope.payload)?),
            RequestType::RemoveDuplicates => Request::RemoveDuplicates(payload(envelope.payload)?),
            RequestType::AnalyzeText => Request::AnalyzeText(payload(envelope.payload)?),
        };

        Ok(Self {
            id: envelope.id,
            request,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseType {
    Success,
    Error,
    Progress,
}

/// Worker → caller message
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerResponse {
    Success { id: String, payload: SuccessPayload },
    Error { id: String, payload: ErrorPayload },
    Progress { id: String, payload: ProgressPayload },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SuccessPayload {
    pub result: String,
    /// Number of input lines the request covered
    #[serde(default)]
    pub processed: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressPayload {
    /// Percent complete, 0..=100
    pub progress: u8,
    /// Lines processed so far
    #[serde(default)]
    pub processed: usize,
}

impl WorkerResponse {
    pub fn success(id: impl Into<String>, result: String, processed: usize) -> Self {
        WorkerResponse::Success {
            id: id.into(),
            payload: SuccessPayload { result, processed },
        }
    }

    pub fn error(id: impl Into<String>, error: impl Into<String>) -> Self {
        WorkerResponse::Error {
            id: id.into(),
            payload: ErrorPayload {
                error: error.into(),
            },
        }
    }

    pub fn progress(id: impl Into<String>, progress: u8, processed: usize) -> Self {
        WorkerResponse::Progress {
            id: id.into(),
            payload: ProgressPayload {
                progress,
                processed,
            },
        }
    }

    pub fn id(&self) -> &str {
        match self {
            WorkerResponse::Success { id, .. }
            | WorkerResponse::Error { id, .. }
            | WorkerResponse::Progress { id, .. } => id,
        }
    }

    pub fn kind(&self) -> ResponseType {
        match self {
            WorkerResponse::Success { .. } => ResponseType::Success,
            WorkerResponse::Error { .. } => ResponseType::Error,
            WorkerResponse::Progress { .. } => ResponseType::Progress,
        }
    }
}
