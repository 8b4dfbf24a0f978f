/// Fire-and-forget notification collaborator (trade executed, breaker
/// opened/closed). Implementations must swallow their own failures; a
/// dead notification channel never blocks trading.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Default notifier: events go to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        tracing::info!(target: "notifications", "{}", message);
    }
}
