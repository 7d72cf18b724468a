//! Host reached through a helper process speaking line-delimited JSON.
//!
//! Resolve's scripting API is only exposed to its own embedded languages,
//! so a thin helper script runs next to it and forwards calls. One request
//! per line, one response per line:
//!
//! ```text
//!   → {"id":1,"method":"Hello","params":{}}
//!   ← {"id":1,"result":{"api":"node_indexed"}}
//!   → {"id":2,"method":"SetLUT","params":{"item":"..","nodeIndex":2,"path":".."}}
//!   ← {"id":2,"result":true}
//!   ← {"id":3,"error":"no such node"}
//! ```

use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, Command, Stdio};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::GradeError;
use crate::grade::cdl::CdlParameterMap;
use crate::host::{
    HostApi, HostConnector, ItemHandle, ProjectHandle, ResolveHost, TimelineHandle,
};

#[derive(Debug, thiserror::Error)]
pub enum ScriptHostError {
    #[error("host helper command is empty")]
    EmptyCommand,
    #[error("failed to spawn host helper `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("host helper I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("host helper closed the connection")]
    Closed,
    #[error("malformed host helper message: {0}")]
    Protocol(String),
    #[error("{method} failed in host helper: {message}")]
    Remote { method: String, message: String },
}

impl From<ScriptHostError> for GradeError {
    fn from(e: ScriptHostError) -> Self {
        match e {
            // The helper answered; the call itself blew up inside the host.
            ScriptHostError::Remote { .. } => GradeError::Computation(e.to_string()),
            _ => GradeError::Connection(e.to_string()),
        }
    }
}

#[derive(Serialize)]
struct Request<'a> {
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct Response {
    id: u64,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct Hello {
    api: HostApi,
}

/// Request/response framing over a reader/writer pair.
struct LineChannel {
    reader: Box<dyn BufRead + Send>,
    writer: Box<dyn Write + Send>,
    next_id: u64,
}

impl LineChannel {
    fn call(&mut self, method: &str, params: Value) -> Result<Value, ScriptHostError> {
        self.next_id += 1;
        let id = self.next_id;

        let mut line = serde_json::to_string(&Request { id, method, params })
            .map_err(|e| ScriptHostError::Protocol(e.to_string()))?;
        line.push('\n');
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;

        let mut reply = String::new();
        if self.reader.read_line(&mut reply)? == 0 {
            return Err(ScriptHostError::Closed);
        }
        let response: Response = serde_json::from_str(reply.trim_end())
            .map_err(|e| ScriptHostError::Protocol(format!("{e}: {}", reply.trim_end())))?;

        if response.id != id {
            return Err(ScriptHostError::Protocol(format!(
                "response id {} does not match request id {id}",
                response.id
            )));
        }
        match response.error {
            Some(message) => Err(ScriptHostError::Remote {
                method: method.to_string(),
                message,
            }),
            None => Ok(response.result),
        }
    }
}

/// [`ResolveHost`] backed by a helper process (or any line pipe).
pub struct ScriptHost {
    channel: LineChannel,
    api: HostApi,
    child: Option<Child>,
}

impl ScriptHost {
    /// Handshake over an existing pipe pair.
    pub fn over(
        reader: impl BufRead + Send + 'static,
        writer: impl Write + Send + 'static,
    ) -> Result<Self, ScriptHostError> {
        let mut channel = LineChannel {
            reader: Box::new(reader),
            writer: Box::new(writer),
            next_id: 0,
        };
        let hello = channel.call("Hello", json!({}))?;
        let Hello { api } = serde_json::from_value(hello)
            .map_err(|e| ScriptHostError::Protocol(format!("Hello: {e}")))?;

        Ok(Self {
            channel,
            api,
            child: None,
        })
    }

    /// Spawn `command` and handshake over its stdio.
    pub fn spawn(command: &[String]) -> Result<Self, ScriptHostError> {
        let (program, args) = command.split_first().ok_or(ScriptHostError::EmptyCommand)?;
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| ScriptHostError::Spawn {
                command: command.join(" "),
                source,
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            reap(&mut child);
            return Err(ScriptHostError::Closed);
        };

        match Self::over(BufReader::new(stdout), stdin) {
            Ok(mut host) => {
                host.child = Some(child);
                Ok(host)
            }
            Err(e) => {
                reap(&mut child);
                Err(e)
            }
        }
    }

    fn call(&mut self, method: &str, params: Value) -> Result<Value, GradeError> {
        tracing::trace!(method, %params, "host call");
        Ok(self.channel.call(method, params)?)
    }

    fn call_handle(&mut self, method: &str, params: Value) -> Result<Option<String>, GradeError> {
        match self.call(method, params)? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            other => Err(unexpected(method, "a handle string or null", &other)),
        }
    }

    fn call_bool(&mut self, method: &str, params: Value) -> Result<bool, GradeError> {
        match self.call(method, params)? {
            Value::Bool(b) => Ok(b),
            // Resolve returns None from some setters on failure.
            Value::Null => Ok(false),
            other => Err(unexpected(method, "a boolean", &other)),
        }
    }
}

fn unexpected(method: &str, expected: &str, got: &Value) -> GradeError {
    GradeError::Connection(
        ScriptHostError::Protocol(format!("{method} returned {got}, expected {expected}"))
            .to_string(),
    )
}

/// Kill the helper and collect its exit status so no zombie is left.
fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

impl Drop for ScriptHost {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            reap(&mut child);
        }
    }
}

impl ResolveHost for ScriptHost {
    fn api(&self) -> HostApi {
        self.api
    }

    fn current_project(&mut self) -> Result<Option<ProjectHandle>, GradeError> {
        Ok(self
            .call_handle("GetCurrentProject", json!({}))?
            .map(ProjectHandle))
    }

    fn current_timeline(
        &mut self,
        project: &ProjectHandle,
    ) -> Result<Option<TimelineHandle>, GradeError> {
        Ok(self
            .call_handle("GetCurrentTimeline", json!({ "project": project }))?
            .map(TimelineHandle))
    }

    fn current_video_item(
        &mut self,
        timeline: &TimelineHandle,
    ) -> Result<Option<ItemHandle>, GradeError> {
        Ok(self
            .call_handle("GetCurrentVideoItem", json!({ "timeline": timeline }))?
            .map(ItemHandle))
    }

    fn item_name(&mut self, item: &ItemHandle) -> Result<String, GradeError> {
        Ok(self
            .call_handle("GetName", json!({ "item": item }))?
            .unwrap_or_default())
    }

    fn refresh_lut_catalog(&mut self, project: &ProjectHandle) -> Result<bool, GradeError> {
        self.call_bool("RefreshLUTList", json!({ "project": project }))
    }

    fn set_lut(
        &mut self,
        item: &ItemHandle,
        node_index: u32,
        relative_path: &str,
    ) -> Result<bool, GradeError> {
        let params = match self.api {
            HostApi::NodeIndexed => {
                json!({ "item": item, "nodeIndex": node_index, "path": relative_path })
            }
            HostApi::SingleArgument => json!({ "item": item, "path": relative_path }),
        };
        self.call_bool("SetLUT", params)
    }

    fn set_cdl(
        &mut self,
        item: &ItemHandle,
        params: &CdlParameterMap,
    ) -> Result<bool, GradeError> {
        self.call_bool("SetCDL", json!({ "item": item, "cdl": params }))
    }
}

/// Spawns a fresh helper process per connection.
#[derive(Debug, Clone)]
pub struct ScriptHostConnector {
    command: Vec<String>,
}

impl ScriptHostConnector {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl HostConnector for ScriptHostConnector {
    fn connect(&self) -> Result<Box<dyn ResolveHost>, GradeError> {
        match ScriptHost::spawn(&self.command) {
            Ok(host) => Ok(Box::new(host)),
            // The helper cannot reach Resolve: that is still a connection failure.
            Err(e @ ScriptHostError::Remote { .. }) => Err(GradeError::Connection(e.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}
