//! State-service access for the bundle runner.
//!
//! The state service itself is an external collaborator behind the
//! [`StateClient`] trait; this crate provides the bundle-scoped
//! [`StateAccessor`] facade the runner hands to user code, keyed by the
//! current element (or firing timer) and the current window.

mod accessor;
mod client;
mod handles;
mod side_input;

pub use accessor::StateAccessor;
pub use client::{InMemoryStateClient, StateClient, StateKey, StateKind};
pub use handles::{BagStateHandle, ValueStateHandle};
pub use side_input::{decoded_list_view, identity_window_mapping, SideInputSpec};
