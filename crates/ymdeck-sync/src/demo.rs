//! Per-button counter shown by the demo action.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use ymdeck_host::HostSink;
use ymdeck_types::ContextId;

const TICK: Duration = Duration::from_secs(1);

/// 144x144 SVG with `n` drawn near the bottom edge.
pub fn counter_svg(n: u64) -> String {
    format!(
        concat!(
            r#"<svg width="144" height="144" xmlns="http://www.w3.org/2000/svg">"#,
            r#"<text x="72" y="120" font-family="Arial" font-weight="bold" font-size="36" "#,
            r#"fill="white" text-anchor="middle" stroke="black" stroke-width="2" paint-order="stroke">"#,
            "{n}</text></svg>"
        ),
        n = n
    )
}

pub fn counter_image(n: u64) -> String {
    format!("data:image/svg+xml;charset=utf8,{}", counter_svg(n))
}

/// Running counters keyed by button.
#[derive(Default)]
pub struct DemoTimers {
    timers: Mutex<HashMap<ContextId, JoinHandle<()>>>,
}

impl DemoTimers {
    pub fn new() -> Self {
        Self::default()
    }

    fn timers(&self) -> MutexGuard<'_, HashMap<ContextId, JoinHandle<()>>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start counting on `context`, restarting any counter it already has.
    pub fn start(&self, sink: Arc<dyn HostSink>, context: ContextId) {
        let task_context = context.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + TICK, TICK);
            let mut n = 0u64;
            loop {
                ticker.tick().await;
                n += 1;
                sink.set_image(&task_context, &counter_image(n));
            }
        });
        if let Some(old) = self.timers().insert(context, task) {
            old.abort();
        }
    }

    pub fn stop(&self, context: &ContextId) {
        if let Some(task) = self.timers().remove(context) {
            task.abort();
        }
    }

    pub fn stop_all(&self) {
        for (_, task) in self.timers().drain() {
            task.abort();
        }
    }

    pub fn len(&self) -> usize {
        self.timers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for DemoTimers {
    fn drop(&mut self) {
        self.stop_all();
    }
}
