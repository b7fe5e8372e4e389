//! Stream Renderer
//!
//! Consumes streaming events on a task of its own and echoes text deltas to
//! the operator console as they arrive.

use std::io::Write;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use siteline_core::UnifiedStreamEvent;

/// Capacity of the channel between the router and the renderer.
pub const STREAM_BUFFER: usize = 64;

/// Produces the writer each echoed routing call renders into.
pub type EchoWriterFactory = Arc<dyn Fn() -> Box<dyn Write + Send> + Send + Sync>;

pub fn stdout_writer() -> EchoWriterFactory {
    Arc::new(|| Box::new(std::io::stdout()))
}

/// Render events until every sender is dropped. Returns the echoed text.
pub async fn render_stream(
    mut rx: mpsc::Receiver<UnifiedStreamEvent>,
    mut out: Box<dyn Write + Send>,
) -> String {
    let mut echoed = String::new();
    let mut write_failed = false;
    while let Some(event) = rx.recv().await {
        let written = match &event {
            UnifiedStreamEvent::TextDelta { content } => {
                echoed.push_str(content);
                out.write_all(content.as_bytes()).and_then(|_| out.flush())
            }
            UnifiedStreamEvent::TextDone => {
                echoed.push('\n');
                out.write_all(b"\n").and_then(|_| out.flush())
            }
            UnifiedStreamEvent::AgentTransferStart {
                from_agent,
                to_agent,
                depth,
            } => {
                tracing::debug!("[StreamRender] transfer {} -> {} (depth {})", from_agent, to_agent, depth);
                Ok(())
            }
            UnifiedStreamEvent::AgentTransferEnd {
                from_agent,
                to_agent,
                success,
            } => {
                tracing::debug!("[StreamRender] {} answered for {} (success: {})", from_agent, to_agent, success);
                Ok(())
            }
            UnifiedStreamEvent::ToolResult { tool_id, error, .. } => {
                if let Some(error) = error {
                    tracing::debug!("[StreamRender] tool {} reported: {}", tool_id, error);
                }
                Ok(())
            }
            UnifiedStreamEvent::Error { message, .. } => {
                tracing::warn!("[StreamRender] stream error: {}", message);
                Ok(())
            }
            _ => Ok(()),
        };
        if let Err(e) = written {
            if !write_failed {
                tracing::warn!("[StreamRender] console write failed: {}", e);
                write_failed = true;
            }
        }
    }
    echoed
}

/// Start a renderer task writing into a fresh writer from `factory`.
pub fn spawn_renderer(
    factory: &EchoWriterFactory,
) -> (mpsc::Sender<UnifiedStreamEvent>, JoinHandle<String>) {
    let (tx, rx) = mpsc::channel(STREAM_BUFFER);
    let handle = tokio::spawn(render_stream(rx, factory()));
    (tx, handle)
}
