//! Server-sent event stream decoding for `/v2/events`.

/// Event types that can change the set of routable applications.
pub const APPLICATION_EVENTS: &[&str] = &[
    "api_post_event",
    "status_update_event",
    "health_status_changed_event",
    "failed_health_check_event",
    "app_terminated_event",
    "deployment_info",
    "deployment_success",
    "deployment_failed",
    "deployment_step_success",
    "deployment_step_failure",
];

/// A change notification received from the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEvent {
    pub event_type: String,
    /// Raw JSON payload.
    pub data: String,
}

impl RegistryEvent {
    pub fn affects_applications(&self) -> bool {
        APPLICATION_EVENTS.contains(&self.event_type.as_str())
    }
}

/// Longest line kept while waiting for its newline.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Incremental `text/event-stream` parser.
///
/// Chunks may split lines (and UTF-8 sequences) arbitrarily; bytes are
/// buffered until a full line is available. A line longer than
/// [`MAX_LINE_BYTES`] is dropped.
#[derive(Debug, Default)]
pub struct EventStreamParser {
    buffer: Vec<u8>,
    /// Skipping the remainder of an overlong line.
    discarding: bool,
    event_type: Option<String>,
    data: Vec<String>,
}

impl EventStreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every event it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<RegistryEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            if self.discarding {
                self.discarding = false;
                continue;
            }
            let line = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            let line = line.strip_suffix('\r').unwrap_or(&line);

            if line.is_empty() {
                if let Some(event) = self.dispatch() {
                    events.push(event);
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            match field {
                "event" => self.event_type = Some(value.to_string()),
                "data" => self.data.push(value.to_string()),
                _ => {}
            }
        }

        if self.buffer.len() > MAX_LINE_BYTES {
            tracing::warn!(bytes = self.buffer.len(), "Dropping overlong event stream line");
            self.buffer.clear();
            self.discarding = true;
        }
        events
    }

    fn dispatch(&mut self) -> Option<RegistryEvent> {
        let event_type = self.event_type.take();
        if self.data.is_empty() && event_type.is_none() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(RegistryEvent {
            event_type: event_type.unwrap_or_else(|| "message".to_string()),
            data,
        })
    }
}
