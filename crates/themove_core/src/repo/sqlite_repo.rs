//! SQLite-backed move store.
//!
//! # Responsibility
//! - Persist moves, per-actor memberships and comment threads.
//! - Publish a fresh snapshot to subscribers after each committed write.
//!
//! # Invariants
//! - Every write runs in one transaction; partial writes are never visible.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Comments are stored with a per-move `seq` and read back in that order.

use crate::db::{open_db, open_db_in_memory};
use crate::model::actor::ActorId;
use crate::model::move_record::{Category, Comment, Move, MoveId, MovePatch, MoveStatus};
use crate::repo::feed::{SnapshotFeed, SnapshotListener, Subscription};
use crate::repo::move_repo::{MoveRepository, RepoError, RepoResult, StoreCapabilities};
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::collections::BTreeSet;
use std::path::Path;

const MOVE_SELECT_SQL: &str = "SELECT
    id,
    title,
    category,
    status,
    time_range,
    location,
    exact_meeting_spot,
    participants,
    max_participants,
    notes,
    host_id,
    created_at
FROM moves";

const RELATION_JOINED: &str = "joined";
const RELATION_SAVED: &str = "saved";

/// Move store persisted in SQLite.
pub struct SqliteMoveRepository {
    conn: Connection,
    capabilities: StoreCapabilities,
    feed: SnapshotFeed,
}

impl SqliteMoveRepository {
    /// Wraps a migrated connection, checking the required tables exist.
    pub fn try_new(conn: Connection, capabilities: StoreCapabilities) -> RepoResult<Self> {
        for table in ["moves", "move_members", "move_comments"] {
            if !table_exists(&conn, table)? {
                return Err(RepoError::InvalidData(format!(
                    "required table `{table}` is missing; run migrations first"
                )));
            }
        }
        Ok(Self {
            conn,
            capabilities,
            feed: SnapshotFeed::new(),
        })
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>, capabilities: StoreCapabilities) -> RepoResult<Self> {
        Self::try_new(open_db(path)?, capabilities)
    }

    pub fn open_in_memory(capabilities: StoreCapabilities) -> RepoResult<Self> {
        Self::try_new(open_db_in_memory()?, capabilities)
    }

    /// Borrow of the underlying connection, for diagnostics and tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn publish(&self) {
        match self.list_moves() {
            Ok(snapshot) => self.feed.publish(&snapshot),
            Err(err) => warn!(
                "event=feed_publish module=repo status=error store=sqlite error={err}"
            ),
        }
    }
}

impl MoveRepository for SqliteMoveRepository {
    fn capabilities(&self) -> StoreCapabilities {
        self.capabilities
    }

    fn list_moves(&self) -> RepoResult<Vec<Move>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MOVE_SELECT_SQL} ORDER BY created_at DESC, id DESC;"))?;
        let mut rows = stmt.query([])?;
        let mut moves = Vec::new();
        while let Some(row) = rows.next()? {
            moves.push(parse_move_row(&self.conn, row)?);
        }
        Ok(moves)
    }

    fn get_move(&self, id: &MoveId) -> RepoResult<Option<Move>> {
        load_move(&self.conn, id)
    }

    fn create_move(&self, record: &Move) -> RepoResult<MoveId> {
        record.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        if move_exists(&tx, &record.id)? {
            return Err(RepoError::DuplicateId(record.id.clone()));
        }
        tx.execute(
            "INSERT INTO moves (
                id,
                title,
                category,
                status,
                time_range,
                location,
                exact_meeting_spot,
                participants,
                max_participants,
                notes,
                host_id,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
            params![
                record.id.as_str(),
                record.title.as_str(),
                record.category.label(),
                record.status.label(),
                record.time_range.as_str(),
                record.location.as_str(),
                record.exact_meeting_spot.as_str(),
                record.participants,
                record.max_participants,
                record.notes.as_deref(),
                record.host_id.as_str(),
                record.created_at,
            ],
        )?;
        replace_members(&tx, &record.id, RELATION_JOINED, &record.joined_by)?;
        replace_members(&tx, &record.id, RELATION_SAVED, &record.saved_by)?;
        for comment in &record.comments {
            append_comment(&tx, &record.id, comment)?;
        }
        tx.commit()?;

        info!("event=move_create module=repo status=ok store=sqlite");
        self.publish();
        Ok(record.id.clone())
    }

    fn update_move(&self, id: &MoveId, patch: &MovePatch) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let mut record = load_move(&tx, id)?.ok_or_else(|| RepoError::NotFound(id.clone()))?;
        patch.apply_to(&mut record)?;

        tx.execute(
            "UPDATE moves
             SET
                status = ?2,
                participants = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.as_str(), record.status.label(), record.participants],
        )?;
        if let Some(joined_by) = &patch.joined_by {
            replace_members(&tx, id, RELATION_JOINED, joined_by)?;
        }
        if let Some(saved_by) = &patch.saved_by {
            replace_members(&tx, id, RELATION_SAVED, saved_by)?;
        }
        if let Some(comment) = &patch.append_comment {
            append_comment(&tx, id, comment)?;
        }
        tx.commit()?;

        self.publish();
        Ok(())
    }

    fn delete_move(&self, id: &MoveId) -> RepoResult<()> {
        if !self.capabilities.supports_delete {
            return Err(RepoError::Unsupported("delete"));
        }
        let changed = self
            .conn
            .execute("DELETE FROM moves WHERE id = ?1;", [id.as_str()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id.clone()));
        }

        info!("event=move_delete module=repo status=ok store=sqlite");
        self.publish();
        Ok(())
    }

    fn subscribe(&self, listener: SnapshotListener) -> RepoResult<Subscription> {
        Ok(self.feed.subscribe(listener))
    }
}

fn load_move(conn: &Connection, id: &MoveId) -> RepoResult<Option<Move>> {
    let mut stmt = conn.prepare(&format!("{MOVE_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.as_str()])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_move_row(conn, row)?)),
        None => Ok(None),
    }
}

fn parse_move_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Move> {
    let id_text: String = row.get("id")?;
    let id = MoveId::parse(&id_text)
        .map_err(|_| RepoError::InvalidData(format!("invalid id `{id_text}` in moves.id")))?;

    let category_text: String = row.get("category")?;
    let category = Category::from_label(&category_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid category `{category_text}` in moves.category"))
    })?;

    let status_text: String = row.get("status")?;
    let status = MoveStatus::from_label(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in moves.status"))
    })?;

    let participants_raw: i64 = row.get("participants")?;
    let participants = u32::try_from(participants_raw).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid participants value `{participants_raw}` in moves.participants"
        ))
    })?;

    let max_participants = match row.get::<_, Option<i64>>("max_participants")? {
        Some(raw) => Some(u32::try_from(raw).map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid capacity `{raw}` in moves.max_participants"
            ))
        })?),
        None => None,
    };

    let host_text: String = row.get("host_id")?;
    let host_id = ActorId::parse(&host_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid host `{host_text}` in moves.host_id"))
    })?;

    let record = Move {
        joined_by: load_members(conn, &id, RELATION_JOINED)?,
        saved_by: load_members(conn, &id, RELATION_SAVED)?,
        comments: load_comments(conn, &id)?,
        id,
        title: row.get("title")?,
        category,
        status,
        time_range: row.get("time_range")?,
        location: row.get("location")?,
        exact_meeting_spot: row.get("exact_meeting_spot")?,
        participants,
        max_participants,
        notes: row.get("notes")?,
        host_id,
        created_at: row.get("created_at")?,
    };
    record.validate()?;
    Ok(record)
}

fn load_members(
    conn: &Connection,
    move_id: &MoveId,
    relation: &str,
) -> RepoResult<BTreeSet<ActorId>> {
    let mut stmt = conn.prepare(
        "SELECT actor_id
         FROM move_members
         WHERE move_id = ?1 AND relation = ?2
         ORDER BY actor_id ASC;",
    )?;
    let mut rows = stmt.query(params![move_id.as_str(), relation])?;
    let mut members = BTreeSet::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        let actor = ActorId::parse(&value).ok_or_else(|| {
            RepoError::InvalidData(format!("blank actor id in move_members for {move_id}"))
        })?;
        members.insert(actor);
    }
    Ok(members)
}

fn load_comments(conn: &Connection, move_id: &MoveId) -> RepoResult<Vec<Comment>> {
    let mut stmt = conn.prepare(
        "SELECT user, text
         FROM move_comments
         WHERE move_id = ?1
         ORDER BY seq ASC;",
    )?;
    let mut rows = stmt.query([move_id.as_str()])?;
    let mut comments = Vec::new();
    while let Some(row) = rows.next()? {
        comments.push(Comment {
            user: row.get("user")?,
            text: row.get("text")?,
        });
    }
    Ok(comments)
}

fn replace_members(
    tx: &Transaction<'_>,
    move_id: &MoveId,
    relation: &str,
    members: &BTreeSet<ActorId>,
) -> RepoResult<()> {
    tx.execute(
        "DELETE FROM move_members WHERE move_id = ?1 AND relation = ?2;",
        params![move_id.as_str(), relation],
    )?;
    for actor in members {
        tx.execute(
            "INSERT INTO move_members (move_id, actor_id, relation) VALUES (?1, ?2, ?3);",
            params![move_id.as_str(), actor.as_str(), relation],
        )?;
    }
    Ok(())
}

fn append_comment(tx: &Transaction<'_>, move_id: &MoveId, comment: &Comment) -> RepoResult<()> {
    tx.execute(
        "INSERT INTO move_comments (move_id, seq, user, text)
         SELECT ?1, COALESCE(MAX(seq), 0) + 1, ?2, ?3
         FROM move_comments
         WHERE move_id = ?1;",
        params![move_id.as_str(), comment.user.as_str(), comment.text.as_str()],
    )?;
    Ok(())
}

fn move_exists(conn: &Connection, move_id: &MoveId) -> RepoResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM moves WHERE id = ?1;",
            [move_id.as_str()],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
