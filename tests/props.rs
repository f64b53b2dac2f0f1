mod common;

use common::{live_session, setup};
use proptest::prelude::*;
use scorebook::{BallInput, DismissalKind, MatchSession, MatchSnapshot};

/// Abstract ball plans, interpreted against the live session so that
/// wickets can target whoever is actually on strike.
#[derive(Debug, Clone)]
enum Plan {
    Plain(u8),
    PlainShort(u8),
    Wide(u8),
    NoBall(u8),
    Bye(u8),
    LegBye(u8),
    WicketBowled,
}

fn arb_plan() -> impl Strategy<Value = Plan> {
    prop_oneof![
        (0..=7u8).prop_map(Plan::Plain),
        (0..=7u8).prop_map(Plan::PlainShort),
        (0..=4u8).prop_map(Plan::Wide),
        (0..=6u8).prop_map(Plan::NoBall),
        (1..=4u8).prop_map(Plan::Bye),
        (1..=4u8).prop_map(Plan::LegBye),
        Just(Plan::WicketBowled),
    ]
}

fn arb_plans() -> impl Strategy<Value = Vec<Plan>> {
    proptest::collection::vec(arb_plan(), 0..60)
}

fn input_for(session: &MatchSession, plan: &Plan) -> BallInput {
    match plan {
        Plan::Plain(r) => BallInput::plain(*r),
        Plan::PlainShort(r) => BallInput::plain(*r).with_short_run(),
        Plan::Wide(r) => BallInput::wide(*r),
        Plan::NoBall(r) => BallInput::no_ball(*r),
        Plan::Bye(r) => BallInput::bye(*r),
        Plan::LegBye(r) => BallInput::leg_bye(*r),
        Plan::WicketBowled => {
            let striker = session.innings().striker_id.unwrap();
            BallInput::plain(0).with_wicket(DismissalKind::Bowled, striker)
        }
    }
}

/// Record one planned ball, then satisfy whatever gate it opened.
fn play_one(session: &mut MatchSession, plan: &Plan, subs: &mut u32) {
    let input = input_for(session, plan);
    let record = session.prepare_ball(&input).unwrap();
    session.commit_ball(record).unwrap();

    if let Some(position) = session.innings().pending_new_batsman {
        if session.innings().wickets < 10 {
            *subs += 1;
            let name = format!("Sub{subs}");
            session.new_batsman(&setup(&name, 99), position).unwrap();
        }
    }
    if session.innings().pending_new_bowler {
        session.set_bowler("Zara", 3).unwrap();
    }
}

proptest! {
    // For any playable sequence: balls cycles 0..=5, wickets never pass
    // ten, and the runs arithmetic holds after every single ball.
    #[test]
    fn prop_invariants_hold_for_every_prefix(plans in arb_plans()) {
        let mut session = live_session();
        let mut subs = 0u32;

        for plan in &plans {
            if session.innings().wickets >= 10 {
                break;
            }
            play_one(&mut session, plan, &mut subs);

            let innings = session.innings();
            prop_assert!(innings.balls <= 5);
            prop_assert!(innings.wickets <= 10);
            prop_assert!(innings.totals_consistent());

            let legal: u32 = innings
                .ledger
                .entries()
                .iter()
                .filter(|b| b.is_legal())
                .count() as u32;
            prop_assert_eq!(
                legal,
                innings.overs as u32 * 6 + innings.balls as u32,
                "overs/balls must count exactly the legal deliveries"
            );
        }
    }
}

proptest! {
    // Undo is a left-inverse of append for the observable snapshot.
    #[test]
    fn prop_undo_left_inverse(plans in arb_plans(), last in arb_plan()) {
        let mut session = live_session();
        let mut subs = 0u32;
        for plan in &plans {
            if session.innings().wickets >= 10 {
                break;
            }
            play_one(&mut session, plan, &mut subs);
        }
        if session.innings().wickets >= 10 {
            return Ok(());
        }

        let before = MatchSnapshot::capture(&session);
        let input = input_for(&session, &last);
        let record = session.prepare_ball(&input).unwrap();
        session.commit_ball(record).unwrap();
        session.undo().unwrap();
        let after = MatchSnapshot::capture(&session);

        prop_assert_eq!(before, after);
    }
}

proptest! {
    // Odd net runs on a plain legal ball always swap strike; even never do.
    #[test]
    fn prop_plain_run_parity_drives_rotation(runs in 0..=7u8, short in any::<bool>()) {
        let mut session = live_session();
        let input = if short {
            BallInput::plain(runs).with_short_run()
        } else {
            BallInput::plain(runs)
        };
        let record = session.prepare_ball(&input).unwrap();
        let net = record.runs;
        session.commit_ball(record).unwrap();

        let expected_striker = if net % 2 == 1 { 2 } else { 1 };
        prop_assert_eq!(session.innings().striker_id, Some(expected_striker));
        prop_assert_eq!(net, if short { runs.saturating_sub(1) } else { runs });
    }
}

proptest! {
    // A wide or no-ball never advances balls/overs and is never faced.
    #[test]
    fn prop_illegal_deliveries_never_advance_the_over(
        wide in any::<bool>(),
        runs in 0..=4u8,
        prefix in 0..5usize
    ) {
        let mut session = live_session();
        for _ in 0..prefix {
            play_one(&mut session, &Plan::Plain(0), &mut 0);
        }
        let innings = session.innings();
        let (balls, overs) = (innings.balls, innings.overs);
        let faced_before = innings.registry.batsman(innings.striker_id.unwrap()).unwrap().balls_faced;
        let striker = innings.striker_id.unwrap();

        let input = if wide { BallInput::wide(runs) } else { BallInput::no_ball(runs) };
        let record = session.prepare_ball(&input).unwrap();
        session.commit_ball(record).unwrap();

        let innings = session.innings();
        prop_assert_eq!(innings.balls, balls);
        prop_assert_eq!(innings.overs, overs);
        prop_assert_eq!(
            innings.registry.batsman(striker).unwrap().balls_faced,
            faced_before
        );
    }
}

proptest! {
    // Replaying the ledger from zeroed figures reproduces the live fold.
    #[test]
    fn prop_replay_reproduces_incremental_state(plans in arb_plans()) {
        let mut session = live_session();
        let mut subs = 0u32;
        for plan in &plans {
            if session.innings().wickets >= 10 {
                break;
            }
            play_one(&mut session, plan, &mut subs);
        }

        let live = session.innings().clone();
        let mut replayed = live.clone();
        replayed.replay().unwrap();

        prop_assert_eq!(replayed.runs, live.runs);
        prop_assert_eq!(replayed.wickets, live.wickets);
        prop_assert_eq!(replayed.overs, live.overs);
        prop_assert_eq!(replayed.balls, live.balls);
        prop_assert_eq!(replayed.extras, live.extras);
        prop_assert_eq!(replayed.registry.bowlers, live.registry.bowlers);
        // Batsman figures match; crease positions are pointer state, which
        // replay leaves to its caller.
        for (a, b) in replayed.registry.batsmen.iter().zip(&live.registry.batsmen) {
            prop_assert_eq!(a.runs, b.runs);
            prop_assert_eq!(a.balls_faced, b.balls_faced);
            prop_assert_eq!(a.fours, b.fours);
            prop_assert_eq!(a.sixes, b.sixes);
            prop_assert_eq!(a.is_out, b.is_out);
        }
    }
}
