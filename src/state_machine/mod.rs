// Lifecycle state machine shared by every managed component.
//
// The transition table lives on `LifecycleState`; `LifecycleManager` executes it under
// a per-component guard so concurrent identical requests run the underlying hook once.

pub mod events;
pub mod manager;
pub mod out_of_state;
pub mod states;

pub use events::{LifecycleHook, LifecycleRequest};
pub use manager::{HookCounts, LifecycleHooks, LifecycleManager, ManagedComponent, StateQuery};
pub use out_of_state::OutOfStateHandler;
pub use states::{LifecycleState, Transition};
