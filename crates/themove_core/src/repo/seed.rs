//! Sample moves for previews and first-run stores.

use crate::model::actor::{Actor, ActorId};
use crate::model::move_record::{
    Category, Comment, Move, MoveId, MoveStatus, MoveValidationError, NewMove,
};
use crate::repo::move_repo::{MoveRepository, RepoResult};
use log::info;

const SEED_BASE_EPOCH_MS: i64 = 1_700_000_000_000;
const SEED_STEP_MS: i64 = 60_000;

struct SeedRow {
    id: &'static str,
    host: &'static str,
    title: &'static str,
    category: Category,
    status: MoveStatus,
    time_range: &'static str,
    location: &'static str,
    spot: &'static str,
    participants: u32,
    max_participants: Option<u32>,
    notes: Option<&'static str>,
    comments: &'static [(&'static str, &'static str)],
}

const SEED_ROWS: &[SeedRow] = &[
    SeedRow {
        id: "m1",
        host: "jordan",
        title: "Lakefill Frisbee",
        category: Category::Sports,
        status: MoveStatus::LiveNow,
        time_range: "16:00 - 18:00",
        location: "Lakefill",
        spot: "Near the sailing center rocks",
        participants: 6,
        max_participants: Some(12),
        notes: Some("Bring water"),
        comments: &[("Jordan", "We have two discs, come through!")],
    },
    SeedRow {
        id: "m2",
        host: "priya",
        title: "Orgo Study Group",
        category: Category::Study,
        status: MoveStatus::Upcoming,
        time_range: "19:00 - 21:00",
        location: "Main Library",
        spot: "Third floor, room 3W",
        participants: 4,
        max_participants: Some(6),
        notes: None,
        comments: &[],
    },
    SeedRow {
        id: "m3",
        host: "alex",
        title: "Late Night Tacos",
        category: Category::Food,
        status: MoveStatus::Upcoming,
        time_range: "22:30 - 23:30",
        location: "Downtown",
        spot: "Outside the taqueria on Church St",
        participants: 9,
        max_participants: None,
        notes: Some("Cash only"),
        comments: &[("Alex", "Meeting at the corner first"), ("Sam", "Count me in")],
    },
    SeedRow {
        id: "m4",
        host: "sam",
        title: "Board Game Night",
        category: Category::Social,
        status: MoveStatus::Past,
        time_range: "18:00 - 22:00",
        location: "Student Center",
        spot: "Lounge by the fireplace",
        participants: 11,
        max_participants: Some(16),
        notes: None,
        comments: &[],
    },
];

/// Builds the sample collection. Later rows are newer.
pub fn sample_moves() -> Result<Vec<Move>, MoveValidationError> {
    SEED_ROWS
        .iter()
        .zip(0_i64..)
        .map(|(row, index)| build_seed_move(row, SEED_BASE_EPOCH_MS + index * SEED_STEP_MS))
        .collect()
}

/// Inserts the sample collection when `repo` holds no moves.
///
/// Returns how many moves were inserted; `0` for a non-empty store.
pub fn seed_if_empty(repo: &impl MoveRepository) -> RepoResult<usize> {
    if !repo.list_moves()?.is_empty() {
        return Ok(0);
    }
    let moves = sample_moves()?;
    for record in &moves {
        repo.create_move(record)?;
    }
    info!(
        "event=store_seed module=repo status=ok moves={}",
        moves.len()
    );
    Ok(moves.len())
}

fn build_seed_move(row: &SeedRow, created_at: i64) -> Result<Move, MoveValidationError> {
    let host_id = ActorId::parse(row.host).ok_or(MoveValidationError::BlankActor("hostId"))?;
    let host = Actor::new(host_id, row.host);
    let draft = NewMove {
        title: row.title.to_string(),
        category: row.category,
        status: row.status,
        time_range: row.time_range.to_string(),
        location: row.location.to_string(),
        exact_meeting_spot: row.spot.to_string(),
        max_participants: row.max_participants,
        notes: row.notes.map(str::to_string),
    };

    let mut record = Move::with_id(MoveId::parse(row.id)?, draft, &host, created_at)?;
    record.participants = row.participants;
    record.comments = row
        .comments
        .iter()
        .map(|(user, text)| Comment {
            user: (*user).to_string(),
            text: (*text).to_string(),
        })
        .collect();
    record.validate()?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::{sample_moves, seed_if_empty};
    use crate::repo::memory_repo::InMemoryMoveRepository;
    use crate::repo::move_repo::{MoveRepository, StoreCapabilities};

    #[test]
    fn sample_moves_are_valid_and_unique() {
        let moves = sample_moves().unwrap();
        assert_eq!(moves.len(), 4);
        let mut ids = moves.iter().map(|m| m.id.as_str()).collect::<Vec<_>>();
        ids.dedup();
        assert_eq!(ids.len(), 4);
        assert!(moves.windows(2).all(|pair| pair[0].created_at < pair[1].created_at));
    }

    #[test]
    fn seeding_only_fills_an_empty_store() {
        let repo = InMemoryMoveRepository::new(StoreCapabilities::default());
        assert_eq!(seed_if_empty(&repo).unwrap(), 4);
        assert_eq!(seed_if_empty(&repo).unwrap(), 0);
        assert_eq!(repo.list_moves().unwrap().len(), 4);
    }
}
