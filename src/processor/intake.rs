//! Score intake: validation, member id cleanup and placement
//!
//! Turns the parsed score lines of one match into per-division fields of
//! [`Competitor`]s. Malformed lines are rejected individually and reported
//! back; they never abort the match.

use crate::types::{Competitor, MatchResults, MemberId, ScoreEntry};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Member numbers that stand for "no membership"
const PLACEHOLDER_IDS: [&str; 6] = ["", "NA", "N/A", "NONE", "666", "69"];

/// A score line that could not be used
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedScore {
    /// Position of the line in the match results
    pub index: usize,
    pub member: Option<String>,
    pub reason: String,
}

/// Competitors of one division, ready for prior lookup
#[derive(Debug, Clone)]
pub struct DivisionField {
    pub division: String,
    pub competitors: Vec<Competitor>,
}

/// Outcome of intake for a whole match
#[derive(Debug, Clone, Default)]
pub struct MatchIntake {
    pub divisions: Vec<DivisionField>,
    pub rejected: Vec<RejectedScore>,
    /// Lines dropped for a zero percent (did not finish)
    pub non_finishers: usize,
}

/// Upper-case and strip spaces and dashes; placeholders map to `None`
pub fn normalize_member_id(raw: &str) -> Option<MemberId> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .flat_map(char::to_uppercase)
        .collect();

    if is_placeholder_id(&cleaned) {
        None
    } else {
        Some(cleaned)
    }
}

/// True for ids that do not identify a real member
pub fn is_placeholder_id(id: &str) -> bool {
    PLACEHOLDER_IDS.contains(&id)
}

/// Validated line before percent and place are finalised
struct Accepted {
    member: Option<MemberId>,
    division: String,
    points: Option<f64>,
    percent: Option<f64>,
    place: Option<u32>,
    stage_count: u32,
}

fn validate(entry: &ScoreEntry, default_stage_count: Option<u32>) -> Result<Accepted, String> {
    let division = entry
        .division
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| "missing division".to_string())?;

    let stage_count = entry
        .stage_count
        .or(default_stage_count)
        .ok_or_else(|| "missing stage count".to_string())?;
    if stage_count == 0 {
        return Err("stage count must be at least 1".to_string());
    }

    if let Some(percent) = entry.percent {
        if !percent.is_finite() {
            return Err(format!("non-finite percent {}", percent));
        }
    }
    match entry.match_points {
        Some(points) if !points.is_finite() || points < 0.0 => {
            return Err(format!("invalid match points {}", points));
        }
        None if entry.percent.is_none() => {
            return Err("missing both percent and match points".to_string());
        }
        _ => {}
    }

    if entry.place == Some(0) {
        return Err("place must be 1-based".to_string());
    }

    Ok(Accepted {
        member: entry.member.as_deref().and_then(normalize_member_id),
        division: division.to_string(),
        points: entry.match_points,
        percent: entry.percent,
        place: entry.place,
        stage_count,
    })
}

/// Validate, group by division, normalise percent and assign places
pub fn intake_scores(results: &MatchResults) -> MatchIntake {
    let mut intake = MatchIntake::default();
    let mut grouped: Vec<(String, Vec<Accepted>)> = Vec::new();

    for (index, entry) in results.scores.iter().enumerate() {
        match validate(entry, results.stage_count) {
            Ok(accepted) => {
                // Divisions match case-insensitively; the first spelling seen names the group
                let slot = grouped
                    .iter()
                    .position(|(name, _)| name.eq_ignore_ascii_case(&accepted.division));
                match slot {
                    Some(i) => grouped[i].1.push(accepted),
                    None => grouped.push((accepted.division.clone(), vec![accepted])),
                }
            }
            Err(reason) => {
                warn!(
                    "Rejected score line {} of match {} ({:?}): {}",
                    index, results.match_id, entry.member, reason
                );
                intake.rejected.push(RejectedScore {
                    index,
                    member: entry.member.clone(),
                    reason,
                });
            }
        }
    }

    for (division, lines) in grouped {
        let before = lines.len();
        let competitors = build_division(&division, lines);
        intake.non_finishers += before - competitors.len();
        debug!(
            "Division {} of match {}: {} competitors",
            division,
            results.match_id,
            competitors.len()
        );
        if !competitors.is_empty() {
            intake.divisions.push(DivisionField {
                division,
                competitors,
            });
        }
    }

    intake
}

fn build_division(division: &str, lines: Vec<Accepted>) -> Vec<Competitor> {
    let max_points = lines
        .iter()
        .filter_map(|line| line.points)
        .fold(0.0_f64, f64::max);

    let with_percent: Vec<(Accepted, f64)> = lines
        .into_iter()
        .map(|line| {
            let percent = match (line.percent, line.points) {
                (Some(percent), _) => percent,
                (None, Some(points)) if max_points > 0.0 => points / max_points * 100.0,
                _ => 0.0,
            };
            (line, percent)
        })
        .collect();

    let needs_places = with_percent.iter().any(|(line, _)| line.place.is_none());

    let mut finishers: Vec<(Accepted, f64)> = with_percent
        .into_iter()
        .filter(|(_, percent)| *percent > 0.0)
        .collect();

    if needs_places {
        finishers.sort_by(|a, b| b.1.total_cmp(&a.1));
        // Equal percents share a place; the next distinct percent skips ahead
        let mut previous: Option<(f64, u32)> = None;
        for (index, (line, percent)) in finishers.iter_mut().enumerate() {
            let place = match previous {
                Some((last_percent, last_place)) if last_percent == *percent => last_place,
                _ => index as u32 + 1,
            };
            line.place = Some(place);
            previous = Some((*percent, place));
        }
    }

    finishers
        .into_iter()
        .map(|(line, percent)| {
            Competitor::new(
                line.member,
                division,
                line.place.unwrap_or(1),
                percent,
                line.stage_count,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(member: &str, division: &str, points: f64) -> ScoreEntry {
        ScoreEntry {
            member: Some(member.to_string()),
            division: Some(division.to_string()),
            match_points: Some(points),
            ..ScoreEntry::default()
        }
    }

    fn results(scores: Vec<ScoreEntry>) -> MatchResults {
        MatchResults {
            match_id: "m-1".to_string(),
            match_name: "Club match".to_string(),
            match_type: "USPSA".to_string(),
            match_date: None,
            stage_count: Some(6),
            scores,
        }
    }

    #[test]
    fn test_normalize_member_id() {
        assert_eq!(normalize_member_id("a-12 345"), Some("A12345".to_string()));
        assert_eq!(normalize_member_id("ty 4567"), Some("TY4567".to_string()));
        assert_eq!(normalize_member_id("n/a"), None);
        assert_eq!(normalize_member_id("  "), None);
        assert_eq!(normalize_member_id("6-6-6"), None);
        assert_eq!(normalize_member_id("None"), None);
    }

    #[test]
    fn test_percent_and_places_from_points() {
        let intake = intake_scores(&results(vec![
            entry("A3", "Open", 300.0),
            entry("A1", "Open", 600.0),
            entry("A2", "Open", 450.0),
        ]));

        assert!(intake.rejected.is_empty());
        assert_eq!(intake.divisions.len(), 1);
        let field = &intake.divisions[0].competitors;
        assert_eq!(field[0].member.as_deref(), Some("A1"));
        assert_eq!(field[0].place, 1);
        assert_eq!(field[0].percent, 100.0);
        assert_eq!(field[1].percent, 75.0);
        assert_eq!(field[2].place, 3);
        assert_eq!(field[2].percent, 50.0);
        assert!(field.iter().all(|c| c.stage_count == 6));
    }

    #[test]
    fn test_equal_percents_share_place() {
        let intake = intake_scores(&results(vec![
            entry("A1", "Open", 600.0),
            entry("A2", "Open", 450.0),
            entry("A3", "Open", 450.0),
            entry("A4", "Open", 300.0),
        ]));

        let places: Vec<u32> = intake.divisions[0]
            .competitors
            .iter()
            .map(|c| c.place)
            .collect();
        assert_eq!(places, vec![1, 2, 2, 4]);
    }

    #[test]
    fn test_zero_percent_dropped() {
        let intake = intake_scores(&results(vec![
            entry("A1", "Open", 600.0),
            entry("A2", "Open", 0.0),
        ]));
        assert_eq!(intake.non_finishers, 1);
        assert_eq!(intake.divisions[0].competitors.len(), 1);
    }

    #[test]
    fn test_zero_max_points_yields_empty_division() {
        let intake = intake_scores(&results(vec![
            entry("A1", "Open", 0.0),
            entry("A2", "Open", 0.0),
        ]));
        assert!(intake.divisions.is_empty());
        assert_eq!(intake.non_finishers, 2);
    }

    #[test]
    fn test_divisions_grouped_case_insensitively() {
        let intake = intake_scores(&results(vec![
            entry("A1", "Carry Optics", 500.0),
            entry("A2", "carry optics", 400.0),
            entry("B1", "Limited", 300.0),
        ]));
        assert_eq!(intake.divisions.len(), 2);
        assert_eq!(intake.divisions[0].division, "Carry Optics");
        assert_eq!(intake.divisions[0].competitors.len(), 2);
        assert!(intake.divisions[0]
            .competitors
            .iter()
            .all(|c| c.division == "Carry Optics"));
    }

    #[test]
    fn test_explicit_places_and_percent_kept() {
        let mut first = entry("A1", "Open", 0.0);
        first.match_points = None;
        first.percent = Some(100.0);
        first.place = Some(1);
        let mut second = entry("A2", "Open", 0.0);
        second.match_points = None;
        second.percent = Some(82.5);
        second.place = Some(2);
        second.stage_count = Some(9);

        let intake = intake_scores(&results(vec![second, first]));
        let field = &intake.divisions[0].competitors;
        assert_eq!(field[0].place, 2);
        assert_eq!(field[0].percent, 82.5);
        assert_eq!(field[0].stage_count, 9);
        assert_eq!(field[1].place, 1);
    }

    #[test]
    fn test_malformed_lines_rejected() {
        let mut no_division = entry("A1", "Open", 100.0);
        no_division.division = None;
        let mut bad_points = entry("A2", "Open", 100.0);
        bad_points.match_points = Some(f64::NAN);
        let mut nothing = entry("A3", "Open", 100.0);
        nothing.match_points = None;
        let mut zero_place = entry("A4", "Open", 100.0);
        zero_place.place = Some(0);

        let mut match_results = results(vec![
            no_division,
            bad_points,
            nothing,
            zero_place,
            entry("A5", "Open", 100.0),
        ]);
        let intake = intake_scores(&match_results);
        assert_eq!(intake.rejected.len(), 4);
        assert_eq!(intake.rejected[0].index, 0);
        assert_eq!(intake.rejected[0].reason, "missing division");
        assert_eq!(intake.divisions[0].competitors.len(), 1);

        match_results.stage_count = None;
        let intake = intake_scores(&match_results);
        assert_eq!(intake.rejected.len(), 5);
    }

    #[test]
    fn test_placeholder_members_are_untracked() {
        let intake = intake_scores(&results(vec![
            entry("A1", "Open", 100.0),
            entry("NA", "Open", 90.0),
        ]));
        let field = &intake.divisions[0].competitors;
        assert_eq!(field[1].member, None);
    }
}
