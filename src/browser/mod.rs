pub mod dialogs;
pub mod locator;
pub mod session;

pub use dialogs::{AlertKind, AlertState, AlertWatcher, PendingAlert};
pub use locator::{Locator, Strategy};
pub use session::{BrowserSession, ElementHandle, SessionCookie};
