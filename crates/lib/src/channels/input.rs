//! Input channels and their registration on the HTTP router.

use crate::channels::inbound::MessageHandler;
use axum::routing::MethodRouter;
use axum::Router;
use std::sync::Arc;

/// A way for user messages to reach the dialogue logic (REST webhook, chat platform hook, ...).
pub trait InputChannel: Send + Sync {
    /// Channel name (e.g. "rest").
    fn name(&self) -> &str;

    /// Path prefix the channel's routes are mounted under. Defaults to the name.
    fn url_prefix(&self) -> String {
        self.name().to_string()
    }

    /// Routes relative to the prefix. Each route hands incoming messages to `on_new_message`.
    fn routes(&self, on_new_message: Arc<dyn MessageHandler>) -> Vec<(&'static str, MethodRouter)>;
}

/// Mount every channel's routes under `<route>/<url_prefix>`. A relative `/`
/// route answers with and without the trailing slash.
pub fn register(
    input_channels: &[Arc<dyn InputChannel>],
    on_new_message: Arc<dyn MessageHandler>,
    route: &str,
) -> Router {
    let mut router = Router::new();
    for channel in input_channels {
        let prefix = join_path(route, &channel.url_prefix());
        for (path, method_router) in channel.routes(on_new_message.clone()) {
            if path.trim_matches('/').is_empty() {
                if prefix != "/" {
                    router = router.route(&format!("{}/", prefix), method_router.clone());
                }
                router = router.route(&prefix, method_router);
            } else {
                router = router.route(&join_path(&prefix, path), method_router);
            }
        }
        log::info!("input channel {} mounted at {}", channel.name(), prefix);
    }
    router
}

/// Join path segments into an absolute path without duplicate or trailing slashes.
pub fn join_path(base: &str, rest: &str) -> String {
    let segments: Vec<&str> = base
        .split('/')
        .chain(rest.split('/'))
        .filter(|s| !s.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}
