mod common;

use common::*;
use proptest::prelude::*;
use std::sync::Arc;

use flowlane_core::state_machine::{HookCounts, LifecycleHook, LifecycleRequest, LifecycleState};
use flowlane_core::ManagedComponent;

/// Expected state and hook counts from folding the transition table
fn model(requests: &[LifecycleRequest]) -> (LifecycleState, HookCounts) {
    let mut state = LifecycleState::Closed;
    let mut counts = HookCounts::default();
    for request in requests {
        let steps: Vec<LifecycleRequest> = match request {
            LifecycleRequest::Restart => LifecycleRequest::RESTART_SEQUENCE.to_vec(),
            primitive => vec![*primitive],
        };
        for step in steps {
            let transition = state.plan(step);
            for hook in transition.hooks {
                match hook {
                    LifecycleHook::Init => counts.init += 1,
                    LifecycleHook::Start => counts.start += 1,
                    LifecycleHook::Stop => counts.stop += 1,
                    LifecycleHook::Close => counts.close += 1,
                }
            }
            state = transition.target;
        }
    }
    (state, counts)
}

async fn apply(component: &ProbeComponent, request: LifecycleRequest) {
    let result = match request {
        LifecycleRequest::Init => component.init().await,
        LifecycleRequest::Start => component.start().await,
        LifecycleRequest::Stop => component.stop().await,
        LifecycleRequest::Close => component.close().await,
        LifecycleRequest::Restart => component.restart().await,
    };
    result.unwrap();
}

proptest! {
    /// Property: the manager reaches the state and runs the hooks the table prescribes
    #[test]
    fn manager_follows_transition_table(requests in request_sequence_strategy()) {
        let component = ProbeComponent::default();
        tokio_test::block_on(async {
            for request in &requests {
                apply(&component, *request).await;
            }
        });

        let (expected_state, expected_counts) = model(&requests);
        prop_assert_eq!(component.current_state(), expected_state);
        prop_assert_eq!(component.lifecycle().hook_counts(), expected_counts);
    }

    /// Property: hooks stay balanced; every close matches an init and every stop a start
    #[test]
    fn hook_counts_stay_balanced(requests in request_sequence_strategy()) {
        let (state, counts) = model(&requests);
        prop_assert_eq!(counts.init - counts.close, u64::from(state.is_initialised()));
        prop_assert_eq!(counts.start - counts.stop, u64::from(state.is_started()));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_mixed_requests_leave_a_consistent_state() {
    let component = Arc::new(ProbeComponent::default());
    component.start().await.unwrap();

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let component = component.clone();
            tokio::spawn(async move {
                if i % 2 == 0 {
                    component.start().await
                } else {
                    component.stop().await
                }
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let counts = component.lifecycle().hook_counts();
    let state = component.current_state();
    assert!(matches!(state, LifecycleState::Started | LifecycleState::Stopped));
    assert_eq!(counts.start - counts.stop, u64::from(state.is_started()));
    assert_eq!(counts.init, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_starts_run_start_hook_once() {
    let component = Arc::new(ProbeComponent::default());
    component.init().await.unwrap();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let component = component.clone();
            tokio::spawn(async move { component.start().await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(component.lifecycle().hook_counts().start, 1);
    assert_eq!(component.current_state(), LifecycleState::Started);
}

#[tokio::test]
async fn start_from_closed_is_init_then_start() {
    let component = ProbeComponent::default();
    component.start().await.unwrap();
    assert_eq!(
        component.lifecycle().hook_counts(),
        HookCounts {
            init: 1,
            start: 1,
            stop: 0,
            close: 0
        }
    );

    // idempotent re-requests
    component.init().await.unwrap();
    component.start().await.unwrap();
    assert_eq!(component.lifecycle().hook_counts().start, 1);

    component.close().await.unwrap();
    let counts = component.lifecycle().hook_counts();
    assert_eq!((counts.stop, counts.close), (1, 1));
    assert_eq!(component.current_state(), LifecycleState::Closed);
}
