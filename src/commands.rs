#[derive(PartialEq, Eq, Debug)]
pub enum MonitorCommand {
    /// An off switch was handled externally; forget its streak.
    Ack(String),
    /// Run the restore command for a switch, then forget its streak.
    Restore(String),
    Pause,
    Resume,
}
