//! Alarm notifier seam.
//!
//! The engine drives a looping alarm device through this trait and never
//! queries playback state: it tracks its own alarm flag and only issues
//! `activate`/`silence` on transitions.

/// A looping alarm device.
pub trait AlarmNotifier {
    /// Begin looping playback from the start of the clip.
    fn activate(&mut self);

    /// Stop playback and rewind to the beginning.
    fn silence(&mut self);
}

/// No-op notifier, used when no alarm device is attached.
pub struct NullAlarm;

impl AlarmNotifier for NullAlarm {
    fn activate(&mut self) {}
    fn silence(&mut self) {}
}
