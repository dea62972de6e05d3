use pretty_assertions::assert_eq;
use wtsplit_session::{
    BoundDirection, CandidateBreakpoint, Effect, ModeKind, NodeMeta, Phase, SearchBounds,
    SearchOutcome, SearchRequest, SessionError, SessionEvent, SuggestionSession,
};

fn open(session: &SuggestionSession, row: usize) -> SuggestionSession {
    session
        .reduce(SessionEvent::Open {
            node: NodeMeta::new(row, 0, format!("{}", row + 1)),
            level_count: 2,
        })
        .unwrap()
        .session
}

fn step(session: &SuggestionSession, event: SessionEvent) -> SuggestionSession {
    session.reduce(event).unwrap().session
}

fn submit(session: &SuggestionSession, event: SessionEvent) -> (SuggestionSession, SearchRequest) {
    let step = session.reduce(event).unwrap();
    match step.effect {
        Effect::RunSearch(request) => (step.session, request),
        other => panic!("expected a search request, got {other:?}"),
    }
}

fn found(values: &[f64]) -> SearchOutcome {
    SearchOutcome {
        candidates: values
            .iter()
            .map(|&v| CandidateBreakpoint::new(v, -4.2, 0.12))
            .collect(),
        diagnostic_image: None,
    }
}

fn automatic(row: usize, count: &str) -> SuggestionSession {
    let session = open(&SuggestionSession::default(), row);
    let session = step(&session, SessionEvent::SelectMode(ModeKind::Automatic));
    step(&session, SessionEvent::SetDesiredCount(count.into()))
}

#[test]
fn second_submit_while_pending_changes_nothing() {
    let (running, _) = submit(&automatic(0, "3"), SessionEvent::Submit);
    let again = running.reduce(SessionEvent::Submit).unwrap();
    assert_eq!(again.effect, Effect::None);
    assert_eq!(again.session, running);

    let bounded = running.reduce(SessionEvent::SubmitBounded).unwrap();
    assert_eq!(bounded.effect, Effect::None);
    assert_eq!(bounded.session, running);
}

#[test]
fn response_for_a_closed_session_is_stale() {
    let (running, request) = submit(&automatic(0, "3"), SessionEvent::Submit);
    let cancelled = step(&running, SessionEvent::Cancel);
    let reopened = open(&cancelled, 4);

    let err = reopened
        .reduce(SessionEvent::SearchSucceeded {
            tag: request.tag,
            outcome: found(&[1.0]),
        })
        .unwrap_err();
    assert!(err.is_silent());
    assert_eq!(
        err,
        SessionError::StaleResponse {
            current: 2,
            received: 1
        }
    );
    assert_eq!(reopened.phase(), Phase::Configuring);
    assert!(reopened.candidates().is_empty());
}

#[test]
fn response_without_pending_request_is_stale() {
    let (running, request) = submit(&automatic(0, "3"), SessionEvent::Submit);
    let done = step(
        &running,
        SessionEvent::SearchSucceeded {
            tag: request.tag,
            outcome: found(&[1.0]),
        },
    );
    let duplicate = done.reduce(SessionEvent::SearchFailed {
        tag: request.tag,
        message: "late".into(),
    });
    assert!(matches!(duplicate, Err(SessionError::StaleResponse { .. })));
}

#[test]
fn nan_candidates_are_dropped() {
    let (running, request) = submit(&automatic(0, "3"), SessionEvent::Submit);
    let session = step(
        &running,
        SessionEvent::SearchSucceeded {
            tag: request.tag,
            outcome: found(&[1.0, f64::NAN, 3.0]),
        },
    );
    let values: Vec<f64> = session.candidates().iter().map(|c| c.value).collect();
    assert_eq!(values, vec![1.0, 3.0]);
}

#[test]
fn empty_result_goes_back_to_configuring() {
    let (running, request) = submit(&automatic(0, "3"), SessionEvent::Submit);
    let session = step(
        &running,
        SessionEvent::SearchSucceeded {
            tag: request.tag,
            outcome: SearchOutcome::default(),
        },
    );
    assert_eq!(session.phase(), Phase::Configuring);
}

#[test]
fn iterative_refinement_commits_descending() {
    let (running, request) = submit(&automatic(3, "3"), SessionEvent::Submit);
    assert_eq!(request.row_index, 3);
    let session = step(
        &running,
        SessionEvent::SearchSucceeded {
            tag: request.tag,
            outcome: found(&[2.0, 5.0, 9.0]),
        },
    );
    let session = step(&session, SessionEvent::SelectCandidate(0));
    let session = step(&session, SessionEvent::SelectCandidate(2));
    assert_eq!(session.confirmed(), &[9.0]);

    let session = step(&session, SessionEvent::SelectConfirmed(0));
    let session = step(&session, SessionEvent::SetBoundDirection(BoundDirection::Below));
    let session = step(&session, SessionEvent::SetBoundedCount("2".into()));
    let (running, request) = submit(&session, SessionEvent::SubmitBounded);
    assert_eq!(
        request.bounds,
        Some(SearchBounds {
            lower: f64::NEG_INFINITY,
            upper: 9.0
        })
    );
    assert_eq!(request.desired_count, 2);

    let session = step(
        &running,
        SessionEvent::SearchSucceeded {
            tag: request.tag,
            outcome: found(&[4.0, 6.5]),
        },
    );
    assert_eq!(session.iteration(), 1);
    let session = step(&session, SessionEvent::SelectCandidate(1));
    assert_eq!(session.confirmed(), &[6.5, 9.0]);

    let committed = session.reduce(SessionEvent::Commit).unwrap();
    match committed.effect {
        Effect::Commit(plan) => {
            assert_eq!(plan.node.row_index, 3);
            assert_eq!(plan.level, 0);
            assert_eq!(plan.values, vec![9.0, 6.5]);
        }
        other => panic!("expected commit, got {other:?}"),
    }
    assert_eq!(committed.session.phase(), Phase::Idle);
}

#[test]
fn cancel_is_always_allowed() {
    let (running, _) = submit(&automatic(0, "1"), SessionEvent::Submit);
    let idle = step(&running, SessionEvent::Cancel);
    assert!(!idle.is_open());
    assert_eq!(idle.generation(), running.generation());
    assert!(!step(&idle, SessionEvent::Cancel).is_open());
}

#[test]
fn rejected_event_leaves_session_untouched() {
    let session = automatic(0, "zero");
    let before = session.clone();
    assert!(session.reduce(SessionEvent::Submit).is_err());
    assert_eq!(session, before);
}
