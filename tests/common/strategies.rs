use proptest::prelude::*;

use flowlane_core::state_machine::LifecycleRequest;

pub fn lifecycle_request_strategy() -> impl Strategy<Value = LifecycleRequest> {
    prop_oneof![
        Just(LifecycleRequest::Init),
        Just(LifecycleRequest::Start),
        Just(LifecycleRequest::Stop),
        Just(LifecycleRequest::Close),
        Just(LifecycleRequest::Restart),
    ]
}

pub fn request_sequence_strategy() -> impl Strategy<Value = Vec<LifecycleRequest>> {
    prop::collection::vec(lifecycle_request_strategy(), 0..24)
}
