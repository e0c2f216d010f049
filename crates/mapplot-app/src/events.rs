use crossbeam_channel::Sender;
use mapplot_render::{RenderObserver, RenderSummary};

/// Everything the orchestrator tells its host, in order.
#[derive(Debug, Clone)]
pub enum DrawEvent {
    Started { rebuild_base: bool },
    Status { label: String },
    Progress { fraction: f64 },
    /// A request arrived mid-draw and replaced any earlier pending one
    FollowUpQueued { rebuild_base: bool },
    /// The composite itself is read through `last_image()`
    Completed { summary: RenderSummary },
    Cancelled,
    Failed { error: String },
}

/// Forwards render callbacks onto the event channel.
pub(crate) struct ChannelObserver {
    pub(crate) tx: Sender<DrawEvent>,
}

impl RenderObserver for ChannelObserver {
    fn status(&self, label: &str) {
        let _ = self.tx.send(DrawEvent::Status {
            label: label.to_string(),
        });
    }

    fn progress(&self, fraction: f64) {
        let _ = self.tx.send(DrawEvent::Progress { fraction });
    }
}
