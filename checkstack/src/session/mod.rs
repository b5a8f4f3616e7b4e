//! Jump-host and nested switch sessions.
//!
//! One [`JumpHostSession`] lives for the whole run. Switch logins are
//! nested shells inside it, tracked in an explicit slot that is set on
//! login and cleared on logout.

mod jump;
mod state;
mod switch;

pub use jump::{DISABLE_HISTORY, JumpHostSession};
pub use state::SessionState;
pub use switch::{DISABLE_PAGING, SwitchContext};
