//! Pairwise win/loss lists from placements

use crate::types::{Comparison, Competitor};

/// Populate `wins` and `losses` for every competitor of one division.
///
/// Competitor `i` beats `j` when `j` placed behind it (higher place number).
/// Both lists carry `margin = i.percent - j.percent`, so wins have a
/// non-negative margin and losses a non-positive one. Equal places compare as
/// neither. Any comparisons already present are replaced.
pub fn win_loss_ranking(mut field: Vec<Competitor>) -> Vec<Competitor> {
    let comparisons: Vec<(Vec<Comparison>, Vec<Comparison>)> = field
        .iter()
        .enumerate()
        .map(|(i, competitor)| compare_against_field(i, competitor, &field))
        .collect();

    for (competitor, (wins, losses)) in field.iter_mut().zip(comparisons) {
        competitor.wins = wins;
        competitor.losses = losses;
    }
    field
}

fn compare_against_field(
    index: usize,
    competitor: &Competitor,
    field: &[Competitor],
) -> (Vec<Comparison>, Vec<Comparison>) {
    let mut wins = Vec::new();
    let mut losses = Vec::new();

    for (j, opponent) in field.iter().enumerate() {
        if j == index {
            continue;
        }
        let comparison = Comparison {
            opponent: j,
            opponent_place: opponent.place,
            margin: competitor.percent - opponent.percent,
        };
        if opponent.place > competitor.place {
            wins.push(comparison);
        } else if opponent.place < competitor.place {
            losses.push(comparison);
        }
    }

    (wins, losses)
}
