mod common;

use common::{dots, live_session, record, setup};
use scorebook::{BallInput, CreasePosition, DismissalKind, MatchSnapshot, ScoreError};

#[test]
fn test_undo_empty_ledger_reports_nothing_to_undo() {
    let mut session = live_session();
    let err = session.undo().unwrap_err();
    assert!(matches!(err, ScoreError::NothingToUndo));
    // Benign: the session keeps scoring.
    record(&mut session, &BallInput::plain(1));
}

#[test]
fn test_undo_restores_the_previous_snapshot() {
    let mut session = live_session();
    record(&mut session, &BallInput::plain(1));
    record(&mut session, &BallInput::wide(1));

    let before = MatchSnapshot::capture(&session);
    record(&mut session, &BallInput::plain(4));
    session.undo().unwrap();
    let after = MatchSnapshot::capture(&session);

    assert_eq!(before, after);
}

#[test]
fn test_undo_reverses_strike_rotation() {
    let mut session = live_session();
    record(&mut session, &BallInput::plain(1));
    assert_eq!(session.innings().striker_id, Some(2));

    session.undo().unwrap();
    assert_eq!(session.innings().striker_id, Some(1));
}

#[test]
fn test_undo_wicket_restores_the_batsman() {
    let mut session = live_session();
    record(
        &mut session,
        &BallInput::plain(0).with_wicket(DismissalKind::Bowled, 1),
    );
    assert!(session.innings().registry.batsman(1).unwrap().is_out);

    session.undo().unwrap();
    let innings = session.innings();
    assert_eq!(innings.wickets, 0);
    let alice = innings.registry.batsman(1).unwrap();
    assert!(!alice.is_out);
    assert_eq!(alice.dismissal_type, None);
    assert_eq!(innings.striker_id, Some(1));
    assert_eq!(innings.pending_new_batsman, None);
    assert_eq!(innings.registry.bowler(1).unwrap().wickets, 0);
}

#[test]
fn test_undo_after_replacement_keeps_membership_with_zeroed_figures() {
    let mut session = live_session();
    record(
        &mut session,
        &BallInput::plain(0).with_wicket(DismissalKind::Bowled, 1),
    );
    session
        .new_batsman(&setup("Cara", 9), CreasePosition::Striker)
        .unwrap();

    session.undo().unwrap();
    let innings = session.innings();
    // Alice is back at the crease; Cara stays registered but idle.
    assert_eq!(innings.striker_id, Some(1));
    let cara = innings.registry.batsman(3).unwrap();
    assert_eq!(cara.balls_faced, 0);
    assert_eq!(cara.position, None);
}

#[test]
fn test_undo_over_boundary_rolls_back_bowler_figures() {
    let mut session = live_session();
    dots(&mut session, 6);
    assert_eq!(session.innings().registry.bowler(1).unwrap().maidens, 1);
    assert!(session.innings().pending_new_bowler);

    session.undo().unwrap();
    let innings = session.innings();
    assert_eq!(innings.overs, 0);
    assert_eq!(innings.balls, 5);
    assert!(!innings.pending_new_bowler);
    let zara = innings.registry.bowler(1).unwrap();
    assert_eq!(zara.overs, 0);
    assert_eq!(zara.maidens, 0);
    assert_eq!(zara.current_over_balls, 5);
}

#[test]
fn test_undo_rolls_back_extras_buckets() {
    let mut session = live_session();
    record(&mut session, &BallInput::no_ball(2));
    assert_eq!(session.innings().extras.no_balls, 1);

    session.undo().unwrap();
    let innings = session.innings();
    assert_eq!(innings.extras.no_balls, 0);
    assert_eq!(innings.runs, 0);
    assert_eq!(innings.registry.batsman(1).unwrap().runs, 0);
}

#[test]
fn test_repeated_undo_walks_back_to_empty() {
    let mut session = live_session();
    record(&mut session, &BallInput::plain(1));
    record(&mut session, &BallInput::plain(4));
    record(&mut session, &BallInput::bye(2));

    session.undo().unwrap();
    session.undo().unwrap();
    session.undo().unwrap();

    let innings = session.innings();
    assert!(innings.ledger.is_empty());
    assert_eq!(innings.runs, 0);
    assert_eq!(innings.balls, 0);
    assert!(matches!(
        session.undo().unwrap_err(),
        ScoreError::NothingToUndo
    ));
}

#[test]
fn test_undo_then_correct_rescore() {
    let mut session = live_session();
    // Scored as a four by mistake, corrected to a leg-bye.
    record(&mut session, &BallInput::plain(4));
    session.undo().unwrap();
    record(&mut session, &BallInput::leg_bye(1));

    let innings = session.innings();
    assert_eq!(innings.runs, 1);
    assert_eq!(innings.extras.leg_byes, 1);
    assert_eq!(innings.registry.batsman(1).unwrap().runs, 0);
    assert_eq!(innings.ledger.len(), 1);
}

#[test]
fn test_undo_only_touches_current_innings() {
    let mut session = live_session();
    record(&mut session, &BallInput::plain(4));
    session.switch_innings().unwrap();

    // Second innings has no balls yet.
    let err = session.undo().unwrap_err();
    assert!(matches!(err, ScoreError::NothingToUndo));
    assert_eq!(session.first.runs, 4);
}
