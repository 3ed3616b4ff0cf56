/// Threshold evaluation and alert composition
pub mod evaluator;

/// Delivery of alerts to notification targets
pub mod dispatcher;
pub mod notifier;

pub use dispatcher::{AlertDispatcher, DispatchReport};
pub use evaluator::{compose_alert, evaluate, AlertLine, ThresholdConfig, ALERT_BANNER};
pub use notifier::{LogNotifier, Notifier, WebhookNotifier};
