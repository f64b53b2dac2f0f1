//! Read-side scorecard projections: plain text and HTML renderings of the
//! match snapshot. Presentation only — nothing here touches match state.

use std::fmt::Write as _;

use crate::event::DismissalKind;
use crate::session::MatchStatus;
use crate::snapshot::{InningsSnapshot, MatchSnapshot};

/// Result of a completed match, or `None` while there is nothing to report.
///
/// Policy: the chasing side wins by `10 − wickets` if it passed the target,
/// the defending side wins by the run margin if the chase fell short,
/// otherwise the match is tied. Abandoned matches carry no result.
pub fn result_line(snapshot: &MatchSnapshot) -> Option<String> {
    if snapshot.status != MatchStatus::Completed {
        return None;
    }
    let first = &snapshot.first_innings;
    let second = &snapshot.second_innings;

    if second.runs > first.runs {
        Some(format!(
            "{} won by {} wickets",
            second.batting_team,
            10 - second.wickets
        ))
    } else if second.runs < first.runs {
        Some(format!(
            "{} won by {} runs",
            first.batting_team,
            first.runs - second.runs
        ))
    } else {
        Some("match tied".to_string())
    }
}

fn dismissal_label(kind: DismissalKind) -> &'static str {
    match kind {
        DismissalKind::Bowled => "b",
        DismissalKind::Caught => "c",
        DismissalKind::Lbw => "lbw",
        DismissalKind::RunOut => "run out",
        DismissalKind::Stumped => "st",
        DismissalKind::HitWicket => "hit wicket",
        DismissalKind::Retired => "retired",
        DismissalKind::TimedOut => "timed out",
    }
}

fn overs_display(overs: u8, balls: u8) -> String {
    if balls == 0 {
        format!("{overs}")
    } else {
        format!("{overs}.{balls}")
    }
}

fn push_innings_text(out: &mut String, innings: &InningsSnapshot) {
    let _ = writeln!(
        out,
        "{} {}/{} ({} ov, RR {:.2})",
        innings.batting_team,
        innings.runs,
        innings.wickets,
        overs_display(innings.overs, innings.balls),
        innings.run_rate
    );

    for card in &innings.batsmen {
        let b = &card.batsman;
        let how_out = match b.dismissal_type {
            Some(kind) => dismissal_label(kind).to_string(),
            None => "not out".to_string(),
        };
        let _ = writeln!(
            out,
            "  {:<20} {:>4} ({}) 4s:{} 6s:{} SR {:.1}  {}",
            b.name, b.runs, b.balls_faced, b.fours, b.sixes, card.strike_rate, how_out
        );
    }

    let e = &innings.extras;
    let _ = writeln!(
        out,
        "  Extras: {} (w {}, nb {}, b {}, lb {}, pen {}, short {})",
        e.counted(),
        e.wides,
        e.no_balls,
        e.byes,
        e.leg_byes,
        e.penalties,
        e.short_runs
    );

    if !innings.bowlers.is_empty() {
        let _ = writeln!(out, "  Bowling:");
        for b in &innings.bowlers {
            let _ = writeln!(
                out,
                "    {:<18} {:>4}-{}-{}-{}",
                b.name,
                overs_display(b.overs, b.current_over_balls),
                b.maidens,
                b.runs,
                b.wickets
            );
        }
    }
}

/// Plain-text scorecard of the whole match.
pub fn text_scorecard(snapshot: &MatchSnapshot) -> String {
    let mut out = String::new();
    let f = &snapshot.fixture;
    let _ = writeln!(
        out,
        "{} v {} — {} ({})",
        f.home_team, f.away_team, f.venue, f.competition
    );
    let _ = writeln!(out, "Status: {}", snapshot.status);
    let _ = writeln!(out);

    push_innings_text(&mut out, &snapshot.first_innings);
    if !snapshot.second_innings.ball_log.is_empty()
        || !snapshot.second_innings.batsmen.is_empty()
    {
        let _ = writeln!(out);
        push_innings_text(&mut out, &snapshot.second_innings);
    }

    if let Some(result) = result_line(snapshot) {
        let _ = writeln!(out);
        let _ = writeln!(out, "Result: {result}");
    }
    out
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn push_innings_html(out: &mut String, innings: &InningsSnapshot) {
    let _ = writeln!(
        out,
        "<h2>{} {}/{} ({} ov)</h2>",
        escape(&innings.batting_team),
        innings.runs,
        innings.wickets,
        overs_display(innings.overs, innings.balls)
    );

    let _ = writeln!(
        out,
        "<table><tr><th>Batsman</th><th>R</th><th>B</th><th>4s</th>\
         <th>6s</th><th>SR</th><th></th></tr>"
    );
    for card in &innings.batsmen {
        let b = &card.batsman;
        let how_out = match b.dismissal_type {
            Some(kind) => dismissal_label(kind),
            None => "not out",
        };
        let _ = writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
             <td>{:.1}</td><td>{}</td></tr>",
            escape(&b.name),
            b.runs,
            b.balls_faced,
            b.fours,
            b.sixes,
            card.strike_rate,
            how_out
        );
    }
    let _ = writeln!(out, "</table>");

    let e = &innings.extras;
    let _ = writeln!(
        out,
        "<p>Extras {} (w {}, nb {}, b {}, lb {})</p>",
        e.counted(),
        e.wides,
        e.no_balls,
        e.byes,
        e.leg_byes
    );

    if !innings.bowlers.is_empty() {
        let _ = writeln!(
            out,
            "<table><tr><th>Bowler</th><th>O</th><th>M</th><th>R</th><th>W</th></tr>"
        );
        for b in &innings.bowlers {
            let _ = writeln!(
                out,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape(&b.name),
                overs_display(b.overs, b.current_over_balls),
                b.maidens,
                b.runs,
                b.wickets
            );
        }
        let _ = writeln!(out, "</table>");
    }
}

/// HTML scorecard of the whole match (a fragment, no document shell).
pub fn html_scorecard(snapshot: &MatchSnapshot) -> String {
    let mut out = String::new();
    let f = &snapshot.fixture;
    let _ = writeln!(
        out,
        "<h1>{} v {}</h1><p>{} — {} ({})</p>",
        escape(&f.home_team),
        escape(&f.away_team),
        escape(&f.venue),
        escape(&f.competition),
        snapshot.status
    );

    push_innings_html(&mut out, &snapshot.first_innings);
    if !snapshot.second_innings.ball_log.is_empty()
        || !snapshot.second_innings.batsmen.is_empty()
    {
        push_innings_html(&mut out, &snapshot.second_innings);
    }

    if let Some(result) = result_line(snapshot) {
        let _ = writeln!(out, "<p><strong>{}</strong></p>", escape(&result));
    }
    out
}
