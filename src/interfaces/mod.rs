pub mod fill_recorder;
pub mod notifier;

pub use fill_recorder::{FillRecorder, LogFillRecorder};
pub use notifier::{LogNotifier, Notifier};
