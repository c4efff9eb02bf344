use vidtrans_core::{update, AppState, Msg};

#[test]
fn reset_while_idle_is_noop() {
    let state = AppState::new();
    let (mut next, effects) = update(state.clone(), Msg::ResetClicked);

    assert_eq!(state, next);
    assert!(effects.is_empty());
    assert!(!next.consume_dirty());
}
