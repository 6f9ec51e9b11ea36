//! Change notification for retuning.

/// Observer invoked after any gain, zone or target time changes.
///
/// Called synchronously on the thread that made the change, once per
/// mutation and with no arguments. The observer decides what to do with it
/// (log, re-read the tuning, mark a dashboard dirty).
pub trait ChangeNotifier: Send {
    fn on_parameters_changed(&mut self);
}

/// Notifier that ignores every change. The default for new loops.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl ChangeNotifier for NoopNotifier {
    fn on_parameters_changed(&mut self) {}
}

impl<F> ChangeNotifier for F
where
    F: FnMut() + Send,
{
    fn on_parameters_changed(&mut self) {
        self()
    }
}
