use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::binding::error::BindingError;
use crate::config::binding_config::DriverConfig;
use crate::source::navigator::{ElementAction, Navigator};

/// Response code the driver uses when a frame cannot be switched into.
pub const NO_SUCH_FRAME: &str = "no_such_frame";

/// Request sent to the driver over stdin (one JSON line).
#[derive(Debug, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum DriverRequest {
    Navigate {
        url: String,
    },
    PageSource,
    CurrentUrl,
    SwitchDefault,
    SwitchFrame {
        #[serde(skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Action {
        action: String,
        selector: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    Quit,
}

impl DriverRequest {
    pub fn navigate(url: &str) -> Self {
        DriverRequest::Navigate {
            url: url.to_string(),
        }
    }

    pub fn page_source() -> Self {
        DriverRequest::PageSource
    }

    pub fn current_url() -> Self {
        DriverRequest::CurrentUrl
    }

    pub fn switch_default() -> Self {
        DriverRequest::SwitchDefault
    }

    pub fn switch_frame_index(index: usize) -> Self {
        DriverRequest::SwitchFrame {
            index: Some(index),
            name: None,
        }
    }

    pub fn switch_frame_name(name: &str) -> Self {
        DriverRequest::SwitchFrame {
            index: None,
            name: Some(name.to_string()),
        }
    }

    pub fn action(selector: &str, action: &ElementAction) -> Self {
        DriverRequest::Action {
            action: action.name().to_string(),
            selector: selector.to_string(),
            value: action.value().map(str::to_string),
        }
    }

    pub fn quit() -> Self {
        DriverRequest::Quit
    }

    fn command(&self) -> &'static str {
        match self {
            DriverRequest::Navigate { .. } => "navigate",
            DriverRequest::PageSource => "page_source",
            DriverRequest::CurrentUrl => "current_url",
            DriverRequest::SwitchDefault => "switch_default",
            DriverRequest::SwitchFrame { .. } => "switch_frame",
            DriverRequest::Action { .. } => "action",
            DriverRequest::Quit => "quit",
        }
    }
}

/// Response received from the driver over stdout (one JSON line).
#[derive(Debug, Deserialize)]
pub struct DriverResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub ready: Option<bool>,
}

/// A live browser driven by a long-lived driver process.
///
/// Commands are sent as NDJSON over stdin and answered line by line on
/// stdout. The driver keeps track of the active frame.
pub struct DriverSession {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    closed: bool,
}

impl DriverSession {
    /// Spawn the driver process and wait for its ready signal.
    pub fn launch(config: &DriverConfig) -> Result<Self, BindingError> {
        let mut child = Command::new(&config.command)
            .arg(&config.script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| BindingError::DriverSpawn {
                command: format!("{} {}", config.command, config.script),
                source: e,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BindingError::session("launch", "failed to capture driver stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BindingError::session("launch", "failed to capture driver stdout"))?;

        let mut session = DriverSession {
            child,
            stdin,
            reader: BufReader::new(stdout),
            closed: false,
        };

        let response = session.read_response("launch")?;
        if !response.ok || response.ready != Some(true) {
            return Err(BindingError::session(
                "launch",
                "did not receive ready signal from driver",
            ));
        }

        debug!(script = %config.script, "driver session ready");
        Ok(session)
    }

    fn read_response(&mut self, command: &str) -> Result<DriverResponse, BindingError> {
        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .map_err(|e| BindingError::session(command, format!("failed to read from driver: {}", e)))?;

        if line.trim().is_empty() {
            return Err(BindingError::session(
                command,
                "empty response from driver (process may have died)",
            ));
        }

        Ok(serde_json::from_str(line.trim())?)
    }

    /// Send a request and read the response.
    fn send(&mut self, request: &DriverRequest) -> Result<DriverResponse, BindingError> {
        let command = request.command();
        let json = serde_json::to_string(request)?;

        writeln!(self.stdin, "{}", json)
            .and_then(|_| self.stdin.flush())
            .map_err(|e| BindingError::session(command, format!("failed to write to driver: {}", e)))?;

        self.read_response(command)
    }

    /// Send a request and verify it succeeded.
    fn send_ok(&mut self, request: &DriverRequest) -> Result<DriverResponse, BindingError> {
        let response = self.send(request)?;
        if response.ok {
            return Ok(response);
        }

        let message = response
            .error
            .unwrap_or_else(|| "unknown error".to_string());
        match (request, response.code.as_deref()) {
            (DriverRequest::SwitchFrame { index, name }, Some(NO_SUCH_FRAME)) => {
                Err(BindingError::FrameNotPresent {
                    frame: index
                        .map(|i| i.to_string())
                        .or_else(|| name.clone())
                        .unwrap_or_default(),
                })
            }
            _ => Err(BindingError::session(request.command(), message)),
        }
    }

    pub fn navigate(&mut self, url: &str) -> Result<(), BindingError> {
        self.send_ok(&DriverRequest::navigate(url))?;
        Ok(())
    }

    /// Quit the driver. Best effort: the process may already be gone.
    pub fn quit(&mut self) -> Result<(), BindingError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if let Err(e) = self.send(&DriverRequest::quit()) {
            warn!(error = %e, "driver did not acknowledge quit");
        }
        self.child.wait()?;
        Ok(())
    }
}

impl Navigator for DriverSession {
    fn page_source(&mut self) -> Result<String, BindingError> {
        let response = self.send_ok(&DriverRequest::page_source())?;
        response
            .source
            .ok_or_else(|| BindingError::session("page_source", "no source in response"))
    }

    fn current_url(&mut self) -> Result<String, BindingError> {
        let response = self.send_ok(&DriverRequest::current_url())?;
        response
            .url
            .ok_or_else(|| BindingError::session("current_url", "no url in response"))
    }

    fn switch_to_default_content(&mut self) -> Result<(), BindingError> {
        self.send_ok(&DriverRequest::switch_default())?;
        Ok(())
    }

    fn switch_to_frame_index(&mut self, index: usize) -> Result<(), BindingError> {
        self.send_ok(&DriverRequest::switch_frame_index(index))?;
        Ok(())
    }

    fn switch_to_frame_name(&mut self, name: &str) -> Result<(), BindingError> {
        self.send_ok(&DriverRequest::switch_frame_name(name))?;
        Ok(())
    }

    fn perform(&mut self, selector: &str, action: &ElementAction) -> Result<(), BindingError> {
        debug!(selector, action = action.name(), "performing element action");
        self.send_ok(&DriverRequest::action(selector, action))?;
        Ok(())
    }
}

impl Drop for DriverSession {
    fn drop(&mut self) {
        let _ = self.quit();
    }
}
