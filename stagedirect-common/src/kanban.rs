//! Kanban board reordering
//!
//! A move takes a card out of its lane and splices it into the target lane at
//! the requested index. Positions stay dense (0..n) in both lanes.

use crate::db::KanbanCard;
use crate::{Error, Result};

/// New lane/position for one card after a move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub id: i64,
    pub lane: String,
    pub position: i64,
}

/// Compute the placements needed to move `card_id` to `lane` at `position`
///
/// `cards` is the owner's whole board. Positions past the end of the target
/// lane append. Only cards whose lane or position actually changes are
/// returned, so a no-op move yields an empty plan.
pub fn plan_move(
    cards: &[KanbanCard],
    card_id: i64,
    lane: &str,
    position: usize,
) -> Result<Vec<Placement>> {
    let lane = lane.trim();
    if lane.is_empty() {
        return Err(Error::InvalidInput("lane name is required".to_string()));
    }

    let moving = cards
        .iter()
        .find(|card| card.id == card_id)
        .ok_or_else(|| Error::NotFound(format!("kanban card {}", card_id)))?;

    let mut target = lane_cards(cards, lane, card_id);
    let index = position.min(target.len());
    target.insert(index, moving);

    let mut layout: Vec<(&KanbanCard, &str, i64)> = Vec::new();
    for (pos, card) in target.into_iter().enumerate() {
        layout.push((card, lane, pos as i64));
    }
    if moving.lane != lane {
        let source_lane = moving.lane.as_str();
        for (pos, card) in lane_cards(cards, source_lane, card_id).into_iter().enumerate() {
            layout.push((card, source_lane, pos as i64));
        }
    }

    Ok(layout
        .into_iter()
        .filter(|(card, new_lane, new_pos)| card.lane != *new_lane || card.position != *new_pos)
        .map(|(card, new_lane, new_pos)| Placement {
            id: card.id,
            lane: new_lane.to_string(),
            position: new_pos,
        })
        .collect())
}

/// Cards of one lane in display order, without `skip`
fn lane_cards<'a>(cards: &'a [KanbanCard], lane: &str, skip: i64) -> Vec<&'a KanbanCard> {
    let mut in_lane: Vec<&KanbanCard> = cards
        .iter()
        .filter(|card| card.lane == lane && card.id != skip)
        .collect();
    in_lane.sort_by_key(|card| (card.position, card.id));
    in_lane
}

/// Position that appends a new card at the end of `lane`
pub fn next_position(cards: &[KanbanCard], lane: &str) -> i64 {
    cards.iter().filter(|card| card.lane == lane).count() as i64
}
