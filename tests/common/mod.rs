//! Common test utilities for mailfetch integration tests


#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use mailbox::*;
