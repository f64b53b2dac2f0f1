use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Result, ScoreError};

/// Per-innings player identifier. Batsmen and bowlers draw from separate
/// id sequences, both starting at 1.
pub type PlayerId = u32;

/// Extras category carried on the wire and in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtraKind {
    Wide,
    NoBall,
    Bye,
    LegBye,
}

/// How a batsman was dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DismissalKind {
    Bowled,
    Caught,
    Lbw,
    RunOut,
    Stumped,
    HitWicket,
    Retired,
    TimedOut,
}

impl DismissalKind {
    /// Whether this dismissal counts toward the bowler's wicket tally.
    /// Run-outs, retirements and timed-out dismissals do not.
    pub fn credits_bowler(self) -> bool {
        matches!(
            self,
            DismissalKind::Bowled
                | DismissalKind::Caught
                | DismissalKind::Lbw
                | DismissalKind::Stumped
                | DismissalKind::HitWicket
        )
    }
}

/// A dismissal attached to a ball. Orthogonal to the delivery kind — any
/// delivery can carry one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wicket {
    /// Dismissal category.
    #[serde(rename = "type")]
    pub kind: DismissalKind,
    /// The batsman who is out. Must be at the crease when the ball is bowled.
    pub out_batsman_id: PlayerId,
}

/// Where a recorded ball originated.
///
/// `Camera` marks balls promoted from the proposed-ball inbox. The engine
/// treats both sources identically — a camera ball is simply a manual ball
/// that a human confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BallSource {
    #[default]
    Manual,
    Camera,
}

/// Extras portion of a ball, as stored in the ledger and the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraRecord {
    /// Extras category.
    #[serde(rename = "type")]
    pub kind: ExtraKind,
    /// Runs in this bucket: total wide runs, the no-ball penalty (always 1),
    /// or net bye/leg-bye runs.
    pub runs: u8,
}

/// The delivery kind a raw ball input normalizes into.
///
/// Exactly one variant per ball — the optional-field wire shape
/// ([`BallInput`]) is collapsed here before the fold ever sees it, so the
/// scoring rules never reason about field combinations. Wickets are not a
/// variant: any delivery can take one.
///
/// # Examples
///
/// ```
/// use scorebook::{BallInput, Delivery};
///
/// let norm = BallInput::plain(4).normalize().unwrap();
/// assert_eq!(norm.delivery, Delivery::Plain { runs: 4 });
/// assert!(norm.delivery.is_legal());
///
/// let wide = BallInput::wide(1).normalize().unwrap();
/// assert!(!wide.delivery.is_legal());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Runs off the bat, 0–7 inclusive (4 and 6 are boundaries).
    Plain { runs: u8 },
    /// Wide: never a legal ball, at least one run to the wides bucket.
    Wide { runs: u8 },
    /// No-ball: never a legal ball, one penalty run plus any runs off the bat.
    NoBall { bat_runs: u8 },
    /// Byes: a legal ball the striker never touched.
    Bye { runs: u8 },
    /// Leg-byes: a legal ball off the body.
    LegBye { runs: u8 },
}

impl Delivery {
    /// Whether this delivery counts toward the six-ball over.
    pub fn is_legal(&self) -> bool {
        !matches!(self, Delivery::Wide { .. } | Delivery::NoBall { .. })
    }

    /// Runs physically run or struck by the batsmen (excludes the wide total
    /// and the no-ball penalty). Strike-rotation parity is computed from
    /// this quantity.
    pub fn ran_runs(&self) -> u8 {
        match *self {
            Delivery::Plain { runs } => runs,
            Delivery::Wide { .. } => 0,
            Delivery::NoBall { bat_runs } => bat_runs,
            Delivery::Bye { runs } => runs,
            Delivery::LegBye { runs } => runs,
        }
    }
}

/// A raw ball as submitted by a scorer (or promoted from a camera proposal).
///
/// This is the wire shape of the `record ball` operation: one struct with
/// optional extras, optional wicket, and flags. It is never scored directly —
/// [`BallInput::normalize`] turns it into exactly one [`Delivery`] variant
/// (plus the orthogonal wicket and the short-run deduction) or rejects it.
///
/// # Examples
///
/// ```
/// use scorebook::{BallInput, DismissalKind};
///
/// // A four off the bat
/// let ball = BallInput::plain(4);
/// assert_eq!(ball.normalize().unwrap().net_runs, 4);
///
/// // Three attempted, one short: nets two
/// let short = BallInput::plain(3).with_short_run();
/// assert_eq!(short.normalize().unwrap().net_runs, 2);
///
/// // Caught off a dot ball, striker (id 1) out
/// let out = BallInput::plain(0).with_wicket(DismissalKind::Caught, 1);
/// assert!(out.normalize().unwrap().wicket.is_some());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BallInput {
    /// Runs off the bat (plain and no-ball deliveries). 0–7 inclusive.
    pub runs: u8,
    /// Extras, when the delivery was not a plain one.
    pub extras: Option<ExtraRecord>,
    /// Dismissal, attachable to any delivery.
    pub wicket: Option<Wicket>,
    /// One run short: the net quantity is reduced by one before scoring.
    pub short_run: bool,
    /// Manual keystroke or promoted camera proposal.
    pub source: BallSource,
    /// Detection label from the camera path (e.g. `"boundary_signal"`).
    /// Recorded verbatim, never interpreted.
    pub signal_detected: Option<String>,
    /// With auto-assign off, the batsman to credit the runs to. Must be one
    /// of the two at the crease.
    pub assign_to_batsman_id: Option<PlayerId>,
    /// Display name echoed by some clients. Logged, never trusted.
    pub batsman_name: Option<String>,
    /// Display name echoed by some clients. Logged, never trusted.
    pub bowler_name: Option<String>,
}

/// A [`BallInput`] after validation: one delivery variant, net and original
/// run quantities, and the untouched wicket/source fields.
#[derive(Debug, Clone)]
pub struct NormalizedBall {
    /// The single delivery variant this ball scored as.
    pub delivery: Delivery,
    /// Dismissal, if any.
    pub wicket: Option<Wicket>,
    /// Run quantity after the short-run deduction.
    pub net_runs: u8,
    /// Run quantity before the short-run deduction.
    pub original_runs: u8,
    /// Whether the deduction applied.
    pub short_run: bool,
    /// Ball origin.
    pub source: BallSource,
    /// Camera detection label, if any.
    pub signal_detected: Option<String>,
    /// Explicit run-credit target (auto-assign off).
    pub assign_to_batsman_id: Option<PlayerId>,
}

impl BallInput {
    /// A plain delivery with the given runs off the bat.
    pub fn plain(runs: u8) -> Self {
        BallInput {
            runs,
            ..Default::default()
        }
    }

    /// A wide worth `runs` total (minimum 1 once normalized).
    pub fn wide(runs: u8) -> Self {
        BallInput {
            extras: Some(ExtraRecord {
                kind: ExtraKind::Wide,
                runs,
            }),
            ..Default::default()
        }
    }

    /// A no-ball with `bat_runs` scored off it. The one-run penalty is
    /// implied, not passed.
    pub fn no_ball(bat_runs: u8) -> Self {
        BallInput {
            runs: bat_runs,
            extras: Some(ExtraRecord {
                kind: ExtraKind::NoBall,
                runs: 1,
            }),
            ..Default::default()
        }
    }

    /// Byes run off a legal delivery.
    pub fn bye(runs: u8) -> Self {
        BallInput {
            extras: Some(ExtraRecord {
                kind: ExtraKind::Bye,
                runs,
            }),
            ..Default::default()
        }
    }

    /// Leg-byes run off a legal delivery.
    pub fn leg_bye(runs: u8) -> Self {
        BallInput {
            extras: Some(ExtraRecord {
                kind: ExtraKind::LegBye,
                runs,
            }),
            ..Default::default()
        }
    }

    /// Attach a dismissal.
    pub fn with_wicket(mut self, kind: DismissalKind, out_batsman_id: PlayerId) -> Self {
        self.wicket = Some(Wicket {
            kind,
            out_batsman_id,
        });
        self
    }

    /// Mark the ball one run short.
    pub fn with_short_run(mut self) -> Self {
        self.short_run = true;
        self
    }

    /// Mark the ball as a promoted camera detection with its label.
    pub fn with_signal(mut self, label: impl Into<String>) -> Self {
        self.source = BallSource::Camera;
        self.signal_detected = Some(label.into());
        self
    }

    /// Credit the runs to an explicit batsman (auto-assign off).
    pub fn assigned_to(mut self, id: PlayerId) -> Self {
        self.assign_to_batsman_id = Some(id);
        self
    }

    /// Collapse the optional-field wire shape into exactly one [`Delivery`]
    /// variant, applying the short-run deduction to the run quantity the
    /// scoring rules consume.
    ///
    /// Input rejected here never reaches the ledger: plain runs above 7, a
    /// short-run flag on a wide, zero-run byes, and bat runs alongside a
    /// wide.
    pub fn normalize(&self) -> Result<NormalizedBall> {
        let (delivery, original_runs) = match self.extras {
            None => {
                if self.runs > 7 {
                    return Err(ScoreError::InvalidBall(format!(
                        "plain runs must be 0-7, got {}",
                        self.runs
                    )));
                }
                (Delivery::Plain { runs: self.runs }, self.runs)
            }
            Some(ExtraRecord {
                kind: ExtraKind::Wide,
                runs,
            }) => {
                if self.short_run {
                    return Err(ScoreError::InvalidBall(
                        "short run cannot apply to a wide".into(),
                    ));
                }
                if self.runs != 0 {
                    return Err(ScoreError::InvalidBall(
                        "a wide carries no runs off the bat".into(),
                    ));
                }
                (Delivery::Wide { runs: runs.max(1) }, runs.max(1))
            }
            Some(ExtraRecord {
                kind: ExtraKind::NoBall,
                ..
            }) => {
                if self.runs > 7 {
                    return Err(ScoreError::InvalidBall(format!(
                        "runs off a no-ball must be 0-7, got {}",
                        self.runs
                    )));
                }
                (
                    Delivery::NoBall {
                        bat_runs: self.runs,
                    },
                    self.runs,
                )
            }
            Some(ExtraRecord {
                kind: ExtraKind::Bye,
                runs,
            }) => {
                if runs == 0 {
                    return Err(ScoreError::InvalidBall("byes must be at least 1".into()));
                }
                (Delivery::Bye { runs }, runs)
            }
            Some(ExtraRecord {
                kind: ExtraKind::LegBye,
                runs,
            }) => {
                if runs == 0 {
                    return Err(ScoreError::InvalidBall(
                        "leg-byes must be at least 1".into(),
                    ));
                }
                (Delivery::LegBye { runs }, runs)
            }
        };

        // Net never drops below zero.
        let (net_runs, delivery) = if self.short_run {
            let net = original_runs.saturating_sub(1);
            let adjusted = match delivery {
                Delivery::Plain { .. } => Delivery::Plain { runs: net },
                Delivery::NoBall { .. } => Delivery::NoBall { bat_runs: net },
                Delivery::Bye { .. } => Delivery::Bye { runs: net },
                Delivery::LegBye { .. } => Delivery::LegBye { runs: net },
                Delivery::Wide { .. } => unreachable!("short wide rejected above"),
            };
            (net, adjusted)
        } else {
            (original_runs, delivery)
        };

        Ok(NormalizedBall {
            delivery,
            wicket: self.wicket,
            net_runs,
            original_runs,
            short_run: self.short_run,
            source: self.source,
            signal_detected: self.signal_detected.clone(),
            assign_to_batsman_id: self.assign_to_batsman_id,
        })
    }
}

/// An immutable ledger entry: one ball, as bowled.
///
/// Records are serialized as single JSON lines in the per-innings ledger
/// file and embedded verbatim in the match snapshot. Once appended they are
/// never edited — undo truncates the tail, and a correction is an undo
/// followed by a fresh ball.
///
/// The striker/non-striker/bowler ids are captured *as of the moment the
/// ball was bowled*, which is what lets a replay re-attribute every figure
/// without consulting any later state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BallRecord {
    /// Sequential id within the innings, starting at 1.
    pub id: u64,
    /// Unix timestamp in seconds at recording time.
    pub ts: u64,
    /// Completed overs before this ball was bowled.
    pub over: u8,
    /// Legal balls already bowled in the current over (0–5) before this one.
    pub ball_in_over: u8,
    /// Net run quantity after the short-run deduction.
    pub runs: u8,
    /// Run quantity before the deduction. Display and undo fidelity only.
    pub original_runs: u8,
    /// Whether the one-run deduction applied.
    pub short_run: bool,
    /// Extras portion, `None` for a plain delivery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<ExtraRecord>,
    /// Dismissal, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wicket: Option<Wicket>,
    /// Manual or camera-promoted.
    pub source: BallSource,
    /// Camera detection label, recorded verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_detected: Option<String>,
    /// Striker at the moment of the ball.
    pub striker_id: PlayerId,
    /// Non-striker at the moment of the ball.
    pub non_striker_id: PlayerId,
    /// Bowler of the ball.
    pub bowler_id: PlayerId,
    /// Explicit run-credit target when auto-assign was off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to_batsman_id: Option<PlayerId>,
}

impl BallRecord {
    /// Reconstruct the delivery variant this record scored as.
    ///
    /// Records only exist post-normalization, so the mapping is direct:
    /// the extras category (or its absence) names the variant.
    pub fn delivery(&self) -> Delivery {
        match self.extras {
            None => Delivery::Plain { runs: self.runs },
            Some(ExtraRecord {
                kind: ExtraKind::Wide,
                runs,
            }) => Delivery::Wide { runs },
            Some(ExtraRecord {
                kind: ExtraKind::NoBall,
                ..
            }) => Delivery::NoBall {
                bat_runs: self.runs,
            },
            Some(ExtraRecord {
                kind: ExtraKind::Bye,
                runs,
            }) => Delivery::Bye { runs },
            Some(ExtraRecord {
                kind: ExtraKind::LegBye,
                runs,
            }) => Delivery::LegBye { runs },
        }
    }

    /// Whether this ball counted toward the six-ball over.
    pub fn is_legal(&self) -> bool {
        self.delivery().is_legal()
    }
}

/// Current time as seconds since the Unix epoch.
///
/// # Panics
///
/// Panics if the system clock is set before the Unix epoch.
pub(crate) fn now_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}
