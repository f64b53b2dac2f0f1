use scorebook::{BallInput, Delivery, DismissalKind, ExtraKind, ExtraRecord, ScoreError};

#[test]
fn test_plain_normalizes_to_plain() {
    let norm = BallInput::plain(3).normalize().unwrap();
    assert_eq!(norm.delivery, Delivery::Plain { runs: 3 });
    assert_eq!(norm.net_runs, 3);
    assert_eq!(norm.original_runs, 3);
    assert!(norm.wicket.is_none());
}

#[test]
fn test_plain_runs_capped_at_seven() {
    assert!(BallInput::plain(7).normalize().is_ok());
    let err = BallInput::plain(8).normalize().unwrap_err();
    assert!(matches!(err, ScoreError::InvalidBall(_)));
}

#[test]
fn test_wide_floors_at_one_run() {
    let norm = BallInput::wide(0).normalize().unwrap();
    assert_eq!(norm.delivery, Delivery::Wide { runs: 1 });

    let norm = BallInput::wide(4).normalize().unwrap();
    assert_eq!(norm.delivery, Delivery::Wide { runs: 4 });
}

#[test]
fn test_wide_rejects_bat_runs_and_short() {
    let mut input = BallInput::wide(1);
    input.runs = 2;
    assert!(matches!(
        input.normalize().unwrap_err(),
        ScoreError::InvalidBall(_)
    ));

    let err = BallInput::wide(2).with_short_run().normalize().unwrap_err();
    assert!(matches!(err, ScoreError::InvalidBall(_)));
}

#[test]
fn test_no_ball_keeps_bat_runs_separate() {
    let norm = BallInput::no_ball(4).normalize().unwrap();
    assert_eq!(norm.delivery, Delivery::NoBall { bat_runs: 4 });
    assert!(!norm.delivery.is_legal());
    assert_eq!(norm.delivery.ran_runs(), 4);
}

#[test]
fn test_byes_require_at_least_one_run() {
    let err = BallInput::bye(0).normalize().unwrap_err();
    assert!(matches!(err, ScoreError::InvalidBall(_)));
    let err = BallInput::leg_bye(0).normalize().unwrap_err();
    assert!(matches!(err, ScoreError::InvalidBall(_)));

    assert!(BallInput::bye(1).normalize().is_ok());
}

#[test]
fn test_short_run_deducts_from_the_ran_quantity() {
    let norm = BallInput::plain(3).with_short_run().normalize().unwrap();
    assert_eq!(norm.net_runs, 2);
    assert_eq!(norm.original_runs, 3);
    assert_eq!(norm.delivery, Delivery::Plain { runs: 2 });

    let norm = BallInput::bye(1).with_short_run().normalize().unwrap();
    assert_eq!(norm.net_runs, 0);
    assert_eq!(norm.delivery, Delivery::Bye { runs: 0 });

    // Never below zero.
    let norm = BallInput::plain(0).with_short_run().normalize().unwrap();
    assert_eq!(norm.net_runs, 0);
}

#[test]
fn test_wicket_is_orthogonal_to_delivery() {
    let norm = BallInput::bye(1)
        .with_wicket(DismissalKind::RunOut, 2)
        .normalize()
        .unwrap();
    assert_eq!(norm.delivery, Delivery::Bye { runs: 1 });
    let wicket = norm.wicket.unwrap();
    assert_eq!(wicket.kind, DismissalKind::RunOut);
    assert_eq!(wicket.out_batsman_id, 2);
}

#[test]
fn test_bowler_creditable_dismissals() {
    for kind in [
        DismissalKind::Bowled,
        DismissalKind::Caught,
        DismissalKind::Lbw,
        DismissalKind::Stumped,
        DismissalKind::HitWicket,
    ] {
        assert!(kind.credits_bowler(), "{kind:?}");
    }
    for kind in [
        DismissalKind::RunOut,
        DismissalKind::Retired,
        DismissalKind::TimedOut,
    ] {
        assert!(!kind.credits_bowler(), "{kind:?}");
    }
}

#[test]
fn test_camera_signal_builder() {
    let input = BallInput::plain(4).with_signal("boundary_signal");
    let norm = input.normalize().unwrap();
    assert_eq!(norm.signal_detected.as_deref(), Some("boundary_signal"));
    assert_eq!(norm.source, scorebook::BallSource::Camera);
}

#[test]
fn test_input_wire_shape_accepts_camel_case_json() {
    let input: BallInput = serde_json::from_str(
        r#"{
            "runs": 0,
            "extras": {"type": "legBye", "runs": 2},
            "wicket": {"type": "runOut", "outBatsmanId": 2},
            "shortRun": false,
            "source": "camera",
            "signalDetected": "movement"
        }"#,
    )
    .unwrap();

    assert_eq!(
        input.extras,
        Some(ExtraRecord {
            kind: ExtraKind::LegBye,
            runs: 2
        })
    );
    let norm = input.normalize().unwrap();
    assert_eq!(norm.delivery, Delivery::LegBye { runs: 2 });
    assert_eq!(norm.wicket.unwrap().out_batsman_id, 2);
}

#[test]
fn test_input_defaults_for_omitted_fields() {
    let input: BallInput = serde_json::from_str(r#"{"runs": 4}"#).unwrap();
    let norm = input.normalize().unwrap();
    assert_eq!(norm.delivery, Delivery::Plain { runs: 4 });
    assert_eq!(norm.source, scorebook::BallSource::Manual);
    assert!(!norm.short_run);
}
