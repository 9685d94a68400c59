use std::sync::Arc;

use serde::Serialize;

use facegate_descriptor::{open, DescriptorError, Envelope, KEY_LEN};
use facegate_roster::{Enrollment, Roster};

use crate::distance::euclidean_distance;

/// Outcome of one recognition request. Transient, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// Matched identity, present only when `accepted`.
    pub id: Option<String>,

    /// Distance to the closest candidate. `f32::INFINITY` when there were
    /// no candidates; reported even for rejected matches so callers can
    /// calibrate the threshold.
    pub distance: f32,

    pub accepted: bool,
}

impl MatchResult {
    /// The no-candidates result.
    pub fn no_match() -> Self {
        Self {
            id: None,
            distance: f32::INFINITY,
            accepted: false,
        }
    }
}

/// Finds the candidate closest to `probe`.
///
/// Ties break to the first occurrence in `candidates` (stable argmin).
/// The threshold comparison is inclusive: a distance exactly equal to
/// `threshold` is accepted.
pub fn recognize(probe: &[f32], candidates: &[&Enrollment], threshold: f32) -> MatchResult {
    let mut best: Option<(usize, f32)> = None;
    for (i, candidate) in candidates.iter().enumerate() {
        let d = euclidean_distance(probe, &candidate.descriptor);
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((i, d));
        }
    }

    let Some((index, distance)) = best else {
        return MatchResult::no_match();
    };

    if distance <= threshold {
        MatchResult {
            id: Some(candidates[index].id.clone()),
            distance,
            accepted: true,
        }
    } else {
        MatchResult {
            id: None,
            distance,
            accepted: false,
        }
    }
}

/// Which of the two compared envelopes is closer to the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    A,
    B,
}

/// Result of a two-envelope calibration comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairComparison {
    pub winner: Winner,
    pub distance_a: f32,
    pub distance_b: f32,
}

/// Decrypts two envelopes and reports which descriptor is closer to the
/// probe. Diagnostic path only, but it shares [`euclidean_distance`] with
/// [`recognize`] so calibration numbers are meaningful.
pub fn compare_pair(
    probe: &[f32],
    envelope_a: &Envelope,
    envelope_b: &Envelope,
    key: &[u8; KEY_LEN],
    dim: usize,
) -> Result<PairComparison, DescriptorError> {
    let a = open(envelope_a, key, dim)?;
    let b = open(envelope_b, key, dim)?;

    let distance_a = euclidean_distance(probe, &a);
    let distance_b = euclidean_distance(probe, &b);

    Ok(PairComparison {
        winner: if distance_a <= distance_b { Winner::A } else { Winner::B },
        distance_a,
        distance_b,
    })
}

/// Matching engine bound to the live roster.
///
/// All operations are pure in-memory computation; nothing here blocks on
/// I/O or on the sync task beyond the instant of the snapshot pointer read.
pub struct Matcher {
    roster: Arc<Roster>,
}

impl Matcher {
    pub fn new(roster: Arc<Roster>) -> Self {
        Self { roster }
    }

    /// Matches `probe` against the current snapshot filtered to `zone`.
    pub fn recognize_in_zone(&self, probe: &[f32], zone: &str, threshold: f32) -> MatchResult {
        let snapshot = self.roster.current();
        recognize(probe, &snapshot.in_zone(zone), threshold)
    }

    /// Matches `probe` against an explicit candidate list, bypassing the
    /// roster entirely.
    pub fn recognize_among(
        &self,
        probe: &[f32],
        candidates: &[Enrollment],
        threshold: f32,
    ) -> MatchResult {
        let refs: Vec<&Enrollment> = candidates.iter().collect();
        recognize(probe, &refs, threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facegate_descriptor::seal;
    use facegate_roster::Snapshot;

    fn enrollment(id: &str, descriptor: Vec<f32>, zones: &[&str]) -> Enrollment {
        Enrollment {
            id: id.to_string(),
            descriptor,
            zones: zones.iter().map(|z| z.to_string()).collect(),
        }
    }

    fn probe_at_distance(dim: usize, d: f32) -> Vec<f32> {
        let mut v = vec![0.0; dim];
        v[0] = d;
        v
    }

    #[test]
    fn empty_candidates_is_a_non_match() {
        let result = recognize(&[0.0; 4], &[], 0.6);
        assert_eq!(result, MatchResult::no_match());
        assert!(result.distance.is_infinite());
    }

    #[test]
    fn accepts_within_threshold() {
        // Scenario A: enrolled at the origin, probe 0.3 away, threshold 0.6.
        let enrolled = enrollment("S1", vec![0.0; 128], &["room-7"]);
        let result = recognize(&probe_at_distance(128, 0.3), &[&enrolled], 0.6);
        assert!(result.accepted);
        assert_eq!(result.id.as_deref(), Some("S1"));
        assert!((result.distance - 0.3).abs() < 1e-6);
    }

    #[test]
    fn rejects_beyond_threshold_but_reports_distance() {
        // Scenario B: probe 0.9 away, threshold 0.6.
        let enrolled = enrollment("S1", vec![0.0; 128], &["room-7"]);
        let result = recognize(&probe_at_distance(128, 0.9), &[&enrolled], 0.6);
        assert!(!result.accepted);
        assert_eq!(result.id, None);
        assert!((result.distance - 0.9).abs() < 1e-6);
    }

    #[test]
    fn threshold_is_inclusive() {
        // One component differs by exactly 3.0, so the distance is exactly 3.0.
        let enrolled = enrollment("S1", vec![0.0; 8], &[]);
        let probe = probe_at_distance(8, 3.0);

        let at = recognize(&probe, &[&enrolled], 3.0);
        assert!(at.accepted, "distance == threshold must be accepted");

        let below = recognize(&probe, &[&enrolled], 2.999);
        assert!(!below.accepted);
        assert_eq!(below.distance, 3.0);
    }

    #[test]
    fn tie_breaks_to_first_candidate() {
        // Both candidates sit at the same distance from the probe.
        let left = enrollment("left", vec![-1.0, 0.0], &[]);
        let right = enrollment("right", vec![1.0, 0.0], &[]);
        let result = recognize(&[0.0, 0.0], &[&left, &right], 2.0);
        assert!(result.accepted);
        assert_eq!(result.id.as_deref(), Some("left"));
    }

    #[test]
    fn picks_the_closest_candidate() {
        let far = enrollment("far", probe_at_distance(16, 0.5), &[]);
        let near = enrollment("near", probe_at_distance(16, 0.1), &[]);
        let result = recognize(&[0.0; 16], &[&far, &near], 0.6);
        assert_eq!(result.id.as_deref(), Some("near"));
        assert!((result.distance - 0.1).abs() < 1e-6);
    }

    #[test]
    fn is_deterministic() {
        let a = enrollment("a", probe_at_distance(32, 0.2), &[]);
        let b = enrollment("b", probe_at_distance(32, 0.4), &[]);
        let probe = vec![0.0; 32];
        let first = recognize(&probe, &[&a, &b], 0.6);
        for _ in 0..10 {
            assert_eq!(recognize(&probe, &[&a, &b], 0.6), first);
        }
    }

    #[test]
    fn mismatched_candidate_dimension_never_matches() {
        let bad = enrollment("bad", vec![0.0; 64], &[]);
        let result = recognize(&[0.0; 128], &[&bad], 1000.0);
        assert!(!result.accepted);
        assert!(result.distance.is_infinite());
    }

    #[test]
    fn recognize_in_zone_uses_the_live_snapshot() {
        let roster = Arc::new(Roster::new());
        let matcher = Matcher::new(Arc::clone(&roster));

        // Nothing enrolled: non-match, not an error.
        let miss = matcher.recognize_in_zone(&[0.0; 8], "room-7", 0.6);
        assert!(!miss.accepted);

        roster.replace(Snapshot::new(vec![
            enrollment("S1", vec![0.0; 8], &["room-7"]),
            enrollment("S2", vec![0.0; 8], &["room-8"]),
        ]));

        let hit = matcher.recognize_in_zone(&probe_at_distance(8, 0.1), "room-7", 0.6);
        assert_eq!(hit.id.as_deref(), Some("S1"));

        // S2 is enrolled in a different zone only.
        let wrong_zone = matcher.recognize_in_zone(&probe_at_distance(8, 0.1), "room-9", 0.6);
        assert!(!wrong_zone.accepted);
    }

    #[test]
    fn compare_pair_shares_the_distance_function() {
        let key = [3u8; KEY_LEN];
        let near = probe_at_distance(16, 0.2);
        let far = probe_at_distance(16, 0.8);
        let envelope_a = seal(&near, &key).unwrap();
        let envelope_b = seal(&far, &key).unwrap();

        let probe = vec![0.0; 16];
        let report = compare_pair(&probe, &envelope_a, &envelope_b, &key, 16).unwrap();
        assert_eq!(report.winner, Winner::A);
        assert_eq!(report.distance_a, euclidean_distance(&probe, &near));
        assert_eq!(report.distance_b, euclidean_distance(&probe, &far));
    }

    #[test]
    fn compare_pair_rejects_wrong_key() {
        let key = [3u8; KEY_LEN];
        let envelope = seal(&[0.0; 16], &key).unwrap();
        let wrong = [4u8; KEY_LEN];
        let err = compare_pair(&[0.0; 16], &envelope, &envelope, &wrong, 16).unwrap_err();
        assert!(matches!(err, DescriptorError::Authentication));
    }

    #[test]
    fn match_result_serializes_for_transport() {
        let result = MatchResult {
            id: Some("S1".to_string()),
            distance: 0.25,
            accepted: true,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["id"], "S1");
        assert_eq!(json["accepted"], true);
    }
}
