use interlocutor::vision::{AttentionSample, AttentionState, AttentionValue, Thresholds};

fn feed(state: &mut AttentionState, presence: &[bool]) -> Vec<Option<AttentionValue>> {
    presence
        .iter()
        .map(|&p| state.observe(AttentionSample::now(p)))
        .collect()
}

#[tokio::test]
async fn test_starts_focused() {
    let state = AttentionState::default();
    assert_eq!(state.value(), AttentionValue::Focused);
    assert_eq!(state.focused_streak(), 0);
    assert_eq!(state.distracted_streak(), 0);
    assert!(state.last_sample().is_none());
}

#[tokio::test]
async fn test_three_misses_confirm_distraction() {
    let mut state = AttentionState::default();

    let flips = feed(&mut state, &[false, false, false]);
    assert_eq!(flips, vec![None, None, Some(AttentionValue::Distracted)]);
    assert_eq!(state.value(), AttentionValue::Distracted);

    // Flip zeroes both streaks
    assert_eq!(state.distracted_streak(), 0);
    assert_eq!(state.focused_streak(), 0);
}

#[tokio::test]
async fn test_single_detection_breaks_the_streak() {
    let mut state = AttentionState::default();

    // F, F, T, F, F, F: only the sixth sample confirms distraction
    let flips = feed(&mut state, &[false, false, true, false, false, false]);
    assert_eq!(
        flips,
        vec![None, None, None, None, None, Some(AttentionValue::Distracted)]
    );
}

#[tokio::test]
async fn test_recovery_needs_two_detections() {
    let mut state = AttentionState::default();
    feed(&mut state, &[false, false, false]);

    assert_eq!(state.observe(AttentionSample::now(true)), None);
    assert_eq!(state.focused_streak(), 1);
    assert_eq!(state.value(), AttentionValue::Distracted);

    // A miss in between starts over
    assert_eq!(state.observe(AttentionSample::now(false)), None);
    assert_eq!(state.focused_streak(), 0);

    let flips = feed(&mut state, &[true, true]);
    assert_eq!(flips, vec![None, Some(AttentionValue::Focused)]);
}

#[tokio::test]
async fn test_steady_samples_never_flip() {
    let mut state = AttentionState::default();
    let flips = feed(&mut state, &[true; 20]);
    assert!(flips.iter().all(Option::is_none));
    assert_eq!(state.value(), AttentionValue::Focused);
    assert!(state.last_sample().is_some());
}

#[tokio::test]
async fn test_custom_thresholds() {
    let mut state = AttentionState::new(Thresholds {
        focus: 1,
        distraction: 1,
    });

    assert_eq!(state.observe(AttentionSample::now(false)), Some(AttentionValue::Distracted));
    assert_eq!(state.observe(AttentionSample::now(true)), Some(AttentionValue::Focused));
}

#[tokio::test]
async fn test_focus_score_wire_values() {
    assert_eq!(AttentionValue::Focused.as_score(), 1);
    assert_eq!(AttentionValue::Distracted.as_score(), 0);
    assert_eq!(AttentionValue::default(), AttentionValue::Focused);
}
