#![allow(dead_code)]

use scorebook::{
    BallInput, CreasePosition, DismissalKind, Fixture, MatchSession, PlayerSetup, Scorebook,
};

pub fn fixture(id: &str) -> Fixture {
    Fixture {
        id: id.to_string(),
        home_team: "Ashford CC".to_string(),
        away_team: "Berrydale CC".to_string(),
        venue: "Ashford Rec".to_string(),
        competition: "Division Two".to_string(),
        overs_limit: Some(40),
        match_type: "limited overs".to_string(),
    }
}

pub fn setup(name: &str, shirt_number: u8) -> PlayerSetup {
    PlayerSetup {
        name: name.to_string(),
        shirt_number,
        shirt_name: name.to_uppercase(),
    }
}

/// A session already live, with openers Alice (striker, id 1) and
/// Beth (non-striker, id 2), and Zara (id 1) bowling.
pub fn live_session() -> MatchSession {
    let mut session = MatchSession::new(fixture("m1"), "scorer@club");
    session.start().unwrap();
    session
        .set_batsmen(&setup("Alice", 7), &setup("Beth", 12), true)
        .unwrap();
    session.set_bowler("Zara", 3).unwrap();
    session
}

/// Record a ball that is expected to be legal input.
pub fn record(session: &mut MatchSession, input: &BallInput) {
    let record = session.prepare_ball(input).unwrap();
    session.commit_ball(record).unwrap();
}

/// Record `n` dot balls.
pub fn dots(session: &mut MatchSession, n: usize) {
    for _ in 0..n {
        record(session, &BallInput::plain(0));
    }
}

/// Dismiss the current striker bowled and bring in a fresh batsman named
/// `replacement`.
pub fn wicket_and_replace(session: &mut MatchSession, replacement: &str) {
    let striker = session.innings().striker_id.unwrap();
    record(
        session,
        &BallInput::plain(0).with_wicket(DismissalKind::Bowled, striker),
    );
    session
        .new_batsman(&setup(replacement, 99), CreasePosition::Striker)
        .unwrap();
}

/// Open an engine over `dir` and start a match with openers and a bowler
/// in place, ready for balls.
pub fn start_match(book: &Scorebook, id: &str) {
    book.start_session(fixture(id), "scorer@club").unwrap();
    book.set_batsmen(id, &setup("Alice", 7), &setup("Beth", 12), true)
        .unwrap();
    book.set_bowler(id, "Zara", 3).unwrap();
}
