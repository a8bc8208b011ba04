//! Terminal output for the command-line interface.
//!
//! - [`UserInterface`] trait so commands can be tested against [`MockUI`]
//! - [`PlainUI`] writes to stdout and stderr
//! - [`OutputMode`] controls how much is shown

pub mod mock;
pub mod output;
pub mod plain;

pub use mock::MockUI;
pub use output::OutputMode;
pub use plain::PlainUI;

/// Trait for user interface interactions.
///
/// This trait allows mocking the UI in tests.
pub trait UserInterface {
    /// Get the current output mode.
    fn output_mode(&self) -> OutputMode;

    /// Display a message to the user.
    fn message(&mut self, msg: &str);

    /// Display a success message.
    fn success(&mut self, msg: &str);

    /// Display a warning message.
    fn warning(&mut self, msg: &str);

    /// Display an error message. Shown in every mode.
    fn error(&mut self, msg: &str);

    /// Show a header/banner.
    fn show_header(&mut self, title: &str);

    /// Emit machine-readable output. Shown in every mode.
    fn raw(&mut self, text: &str);
}
