//! Popup window abstraction.
//!
//! The coordinator never talks to a real browser window; it drives these
//! traits instead, so the state machine is testable with fakes and a real
//! implementation can wrap `window.open` in a webview or browser shell.

use crate::error::Result;

/// Feature string a browser-backed opener should pass to `window.open`.
pub const POPUP_FEATURES: &str = "width=500,height=600,scrollbars=yes,resizable=yes";

/// A live consent popup.
pub trait PopupHandle: Send {
    /// Whether the window has been closed (by the user or by [`close`]).
    ///
    /// [`close`]: PopupHandle::close
    fn is_closed(&self) -> bool;

    /// Close the window. Closing an already-closed window is a no-op.
    fn close(&mut self);
}

/// Opens consent popups.
pub trait PopupOpener: Send + Sync {
    /// Open a popup at the given URL.
    ///
    /// Returns [`Error::PopupBlocked`] when the environment refuses to
    /// open the window (browser popup blocker).
    ///
    /// [`Error::PopupBlocked`]: crate::Error::PopupBlocked
    fn open(&self, url: &str) -> Result<Box<dyn PopupHandle>>;
}
