use std::str::FromStr;

use anyhow::anyhow;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Executor, Sqlite, SqlitePool,
};
use uuid::Uuid;

use crate::{
    models::{Message, MessageKind, Participant},
    AppError, AppResult,
};

const CREATE_PARTICIPANTS: &str = "CREATE TABLE IF NOT EXISTS participants (
    id TEXT NOT NULL PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    last_status INTEGER NOT NULL
)";

// seq keeps insertion order; messages are never updated or deleted
const CREATE_MESSAGES: &str = "CREATE TABLE IF NOT EXISTS messages (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    sender TEXT NOT NULL,
    recipient TEXT NOT NULL,
    text TEXT NOT NULL,
    kind TEXT NOT NULL,
    time TEXT NOT NULL
)";

type ParticipantRow = (String, String, i64);
type MessageRow = (String, String, String, String, String, String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    Gone,
}

/// Handle to the `participants` and `messages` collections.
///
/// Cloning is cheap: every clone shares one connection pool. The pool is opened
/// by [`Store::connect`] and should be released with [`Store::close`].
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub async fn connect(database_url: &str) -> AppResult<Store> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(16)
            .connect_with(options)
            .await?;

        let store = Store { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Private in-memory database. A single connection that is never recycled,
    /// since every new sqlite memory connection starts empty.
    pub async fn in_memory() -> AppResult<Store> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Store { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> AppResult<()> {
        sqlx::query(CREATE_PARTICIPANTS).execute(&self.pool).await?;
        sqlx::query(CREATE_MESSAGES).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Inserts a participant together with its join notice.
    pub async fn register(&self, participant: &Participant, notice: &Message) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query("INSERT INTO participants (id,name,last_status) VALUES (?,?,?)")
            .bind(participant.id.to_string())
            .bind(&participant.name)
            .bind(participant.last_status)
            .execute(&mut *tx)
            .await;
        match inserted {
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(AppError::Conflict(participant.name.clone()));
            }
            other => other?,
        };

        insert_message(&mut *tx, notice).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn participants(&self) -> AppResult<Vec<Participant>> {
        sqlx::query_as::<_, ParticipantRow>("SELECT id,name,last_status FROM participants ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(participant_from_row)
            .collect()
    }

    pub async fn find_participant(&self, name: &str) -> AppResult<Option<Participant>> {
        sqlx::query_as::<_, ParticipantRow>("SELECT id,name,last_status FROM participants WHERE name=?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .map(participant_from_row)
            .transpose()
    }

    /// Returns whether a participant named `name` existed.
    pub async fn set_last_status(&self, name: &str, now: i64) -> AppResult<bool> {
        let result = sqlx::query("UPDATE participants SET last_status=? WHERE name=?")
            .bind(now)
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Participants whose last heartbeat is strictly before `cutoff`.
    pub async fn idle_before(&self, cutoff: i64) -> AppResult<Vec<Participant>> {
        sqlx::query_as::<_, ParticipantRow>(
            "SELECT id,name,last_status FROM participants WHERE last_status < ? ORDER BY rowid",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(participant_from_row)
        .collect()
    }

    /// Deletes the participant and appends `notice` in one transaction.
    /// Nothing is written when the participant is already gone.
    pub async fn evict(&self, name: &str, notice: &Message) -> AppResult<Removal> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM participants WHERE name=?")
            .bind(name)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(Removal::Gone);
        }

        insert_message(&mut *tx, notice).await?;
        tx.commit().await?;
        Ok(Removal::Removed)
    }

    pub async fn append(&self, message: &Message) -> AppResult<()> {
        insert_message(&self.pool, message).await
    }

    /// Every stored message, oldest first.
    pub async fn messages(&self) -> AppResult<Vec<Message>> {
        sqlx::query_as::<_, MessageRow>(
            "SELECT id,sender,recipient,text,kind,time FROM messages ORDER BY seq",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(message_from_row)
        .collect()
    }
}

#[cfg(test)]
impl Store {
    pub(crate) async fn execute_raw(&self, sql: &str) -> AppResult<()> {
        sqlx::query(sql).execute(&self.pool).await?;
        Ok(())
    }

    pub(crate) async fn recreate_schema(&self) -> AppResult<()> {
        self.migrate().await
    }
}

async fn insert_message<'e, E>(executor: E, message: &Message) -> AppResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("INSERT INTO messages (id,sender,recipient,text,kind,time) VALUES (?,?,?,?,?,?)")
        .bind(message.id.to_string())
        .bind(&message.from)
        .bind(&message.to)
        .bind(&message.text)
        .bind(message.kind.as_str())
        .bind(&message.time)
        .execute(executor)
        .await?;
    Ok(())
}

fn participant_from_row((id, name, last_status): ParticipantRow) -> AppResult<Participant> {
    Ok(Participant {
        id: Uuid::parse_str(&id)?,
        name,
        last_status,
    })
}

fn message_from_row((id, from, to, text, kind, time): MessageRow) -> AppResult<Message> {
    let kind = MessageKind::from_str(&kind)
        .map_err(|e| AppError::Store(anyhow!("corrupt message {id}: {e}")))?;

    Ok(Message {
        id: Uuid::parse_str(&id)?,
        from,
        to,
        text,
        kind,
        time,
    })
}
