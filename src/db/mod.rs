use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info, warn};
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{migrate::MigrateDatabase, Row, Sqlite};

use crate::config::Config;
use crate::error::{GovernanceError, Result};
use crate::models::{Resolution, ResolutionStatus, Vote};
use crate::voting::workflow::{validate_vote, ClosureDecision, ResolutionEvent, ResolutionWorkflow};

/// SQLite-backed resolution and vote store.
///
/// Every state change goes through a status-guarded UPDATE inside a
/// transaction, so a lost race surfaces as `InvalidStateTransition` and
/// nothing is written.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(config: &Config) -> Result<Self> {
        Self::connect(&config.database_url, config.max_connections).await
    }

    pub async fn connect(db_url: &str, max_connections: u32) -> Result<Self> {
        // In-memory databases are per connection; there is nothing to create.
        let in_memory = db_url.contains(":memory:");
        if !in_memory && !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            info!("Creating database at {}", db_url);
            Sqlite::create_database(db_url).await?;
        }

        let mut options = SqlitePoolOptions::new().max_connections(max_connections);
        if in_memory {
            // A single connection that is never recycled, or the data goes with it.
            options = options.max_connections(1).idle_timeout(None).max_lifetime(None);
        }
        let pool = options.connect(db_url).await?;

        Self::init_schema(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn init_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS resolutions (
                id TEXT PRIMARY KEY,
                meeting_id TEXT,
                title TEXT NOT NULL,
                description TEXT,
                status TEXT NOT NULL DEFAULT 'draft',
                voting_type TEXT NOT NULL,
                quorum_required INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                opened_at TEXT,
                closed_at TEXT,
                voting_deadline TEXT
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS votes (
                id TEXT PRIMARY KEY,
                resolution_id TEXT NOT NULL,
                voter_id TEXT NOT NULL,
                choice TEXT NOT NULL,
                comment TEXT,
                cast_at TEXT NOT NULL,
                UNIQUE (resolution_id, voter_id),
                FOREIGN KEY (resolution_id) REFERENCES resolutions(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn create_resolution(&self, resolution: &Resolution) -> Result<()> {
        if resolution.title.trim().is_empty() {
            return Err(GovernanceError::Validation("Resolution title must not be empty".to_string()));
        }
        if resolution.status != ResolutionStatus::Draft {
            return Err(GovernanceError::Validation(format!(
                "New resolutions must be drafts, got {}",
                resolution.status
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO resolutions (id, meeting_id, title, description, status, voting_type, quorum_required, created_at, opened_at, closed_at, voting_deadline)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, NULL, NULL, ?)
            "#,
        )
        .bind(&resolution.id)
        .bind(&resolution.meeting_id)
        .bind(&resolution.title)
        .bind(&resolution.description)
        .bind(resolution.status.as_str())
        .bind(resolution.voting_type.as_str())
        .bind(resolution.quorum_required as i64)
        .bind(timestamp(resolution.created_at))
        .bind(resolution.voting_deadline.map(timestamp))
        .execute(&self.pool)
        .await?;

        debug!("Created resolution {}", resolution.id);
        Ok(())
    }

    pub async fn get_resolution(&self, resolution_id: &str) -> Result<Resolution> {
        let mut conn = self.pool.acquire().await?;
        fetch_resolution(&mut conn, resolution_id).await
    }

    pub async fn list_resolutions(&self, status: Option<ResolutionStatus>) -> Result<Vec<Resolution>> {
        let rows = match status {
            Some(status) => {
                sqlx::query(
                    r#"
                    SELECT * FROM resolutions
                    WHERE status = ?
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query("SELECT * FROM resolutions ORDER BY created_at DESC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.iter().map(resolution_from_row).collect()
    }

    pub async fn get_resolution_votes(&self, resolution_id: &str) -> Result<Vec<Vote>> {
        let mut conn = self.pool.acquire().await?;
        fetch_votes(&mut conn, resolution_id).await
    }

    /// Records a vote. The insert only happens while the resolution is open,
    /// and the (resolution, voter) pair is unique.
    pub async fn cast_vote(&self, vote: &Vote) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let resolution = fetch_resolution(&mut tx, &vote.resolution_id).await?;
        let existing = fetch_votes(&mut tx, &vote.resolution_id).await?;
        validate_vote(&resolution, &existing, &vote.voter_id)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO votes (id, resolution_id, voter_id, choice, comment, cast_at)
            SELECT ?, ?, ?, ?, ?, ?
            WHERE EXISTS (SELECT 1 FROM resolutions WHERE id = ? AND status = 'open')
            "#,
        )
        .bind(&vote.id)
        .bind(&vote.resolution_id)
        .bind(&vote.voter_id)
        .bind(vote.choice.as_str())
        .bind(&vote.comment)
        .bind(timestamp(vote.cast_at))
        .bind(&vote.resolution_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => GovernanceError::Validation(format!(
                "Voter {} has already voted on resolution {}",
                vote.voter_id, vote.resolution_id
            )),
            other => GovernanceError::Database(other),
        })?;

        if inserted.rows_affected() == 0 {
            return Err(GovernanceError::Validation(format!(
                "Resolution {} is not accepting votes",
                vote.resolution_id
            )));
        }

        tx.commit().await?;
        debug!("Recorded {} vote from {} on {}", vote.choice, vote.voter_id, vote.resolution_id);
        Ok(())
    }

    pub async fn open_resolution(
        &self,
        resolution_id: &str,
        workflow: &ResolutionWorkflow,
        now: DateTime<Utc>,
    ) -> Result<Resolution> {
        let mut tx = self.pool.begin().await?;

        let current = fetch_resolution(&mut tx, resolution_id).await?;
        let opened = workflow.open(&current, now)?;

        let updated = sqlx::query(
            r#"
            UPDATE resolutions
            SET status = ?, opened_at = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(opened.status.as_str())
        .bind(opened.opened_at.map(timestamp))
        .bind(resolution_id)
        .bind(current.status.as_str())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let actual = fetch_resolution(&mut tx, resolution_id).await?;
            warn!("Resolution {} changed to {} while opening", resolution_id, actual.status);
            return Err(GovernanceError::InvalidStateTransition {
                from: actual.status,
                event: ResolutionEvent::OpenVoting,
            });
        }

        tx.commit().await?;
        info!("Opened voting on resolution {}", resolution_id);
        Ok(opened)
    }

    /// Tallies the votes and records the outcome in one transaction.
    pub async fn close_resolution(
        &self,
        resolution_id: &str,
        workflow: &ResolutionWorkflow,
        now: DateTime<Utc>,
    ) -> Result<ClosureDecision> {
        let mut tx = self.pool.begin().await?;

        let current = fetch_resolution(&mut tx, resolution_id).await?;
        let votes = fetch_votes(&mut tx, resolution_id).await?;
        let decision = workflow.close(&current, &votes, now)?;

        let updated = sqlx::query(
            r#"
            UPDATE resolutions
            SET status = ?, closed_at = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(decision.resolution.status.as_str())
        .bind(decision.resolution.closed_at.map(timestamp))
        .bind(resolution_id)
        .bind(current.status.as_str())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let actual = fetch_resolution(&mut tx, resolution_id).await?;
            warn!("Resolution {} changed to {} while closing", resolution_id, actual.status);
            return Err(GovernanceError::InvalidStateTransition {
                from: actual.status,
                event: ResolutionEvent::CloseVoting,
            });
        }

        tx.commit().await?;
        info!(
            "Closed voting on resolution {}: {}",
            resolution_id, decision.resolution.status
        );
        Ok(decision)
    }

    /// Open resolutions whose voting deadline is before `now`.
    pub async fn get_expired_resolutions(&self, now: DateTime<Utc>) -> Result<Vec<String>> {
        let ids = sqlx::query(
            r#"
            SELECT id
            FROM resolutions
            WHERE voting_deadline IS NOT NULL AND voting_deadline < ? AND status = 'open'
            "#,
        )
        .bind(timestamp(now))
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| row.get::<String, _>("id"))
        .collect();

        Ok(ids)
    }
}

async fn fetch_resolution(conn: &mut SqliteConnection, resolution_id: &str) -> Result<Resolution> {
    let row = sqlx::query("SELECT * FROM resolutions WHERE id = ?")
        .bind(resolution_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| GovernanceError::NotFound(format!("resolution {}", resolution_id)))?;

    resolution_from_row(&row)
}

async fn fetch_votes(conn: &mut SqliteConnection, resolution_id: &str) -> Result<Vec<Vote>> {
    sqlx::query(
        r#"
        SELECT id, resolution_id, voter_id, choice, comment, cast_at
        FROM votes
        WHERE resolution_id = ?
        ORDER BY cast_at
        "#,
    )
    .bind(resolution_id)
    .fetch_all(&mut *conn)
    .await?
    .iter()
    .map(vote_from_row)
    .collect()
}

fn resolution_from_row(row: &SqliteRow) -> Result<Resolution> {
    let quorum: i64 = row.get("quorum_required");

    Ok(Resolution {
        id: row.get("id"),
        meeting_id: row.get("meeting_id"),
        title: row.get("title"),
        description: row.get("description"),
        status: row.get::<String, _>("status").parse()?,
        voting_type: row.get::<String, _>("voting_type").parse()?,
        quorum_required: u32::try_from(quorum)
            .map_err(|_| GovernanceError::Validation(format!("Invalid quorum_required: {}", quorum)))?,
        created_at: parse_timestamp(&row.get::<String, _>("created_at"), "created_at")?,
        opened_at: parse_optional_timestamp(row.get("opened_at"), "opened_at")?,
        closed_at: parse_optional_timestamp(row.get("closed_at"), "closed_at")?,
        voting_deadline: parse_optional_timestamp(row.get("voting_deadline"), "voting_deadline")?,
    })
}

fn vote_from_row(row: &SqliteRow) -> Result<Vote> {
    Ok(Vote {
        id: row.get("id"),
        resolution_id: row.get("resolution_id"),
        voter_id: row.get("voter_id"),
        choice: row.get::<String, _>("choice").parse()?,
        comment: row.get("comment"),
        cast_at: parse_timestamp(&row.get::<String, _>("cast_at"), "cast_at")?,
    })
}

// Fixed-width UTC so that text comparison in SQL orders chronologically.
fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str, column: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| GovernanceError::Validation(format!("Failed to parse {}: {}", column, e)))
}

fn parse_optional_timestamp(value: Option<String>, column: &str) -> Result<Option<DateTime<Utc>>> {
    value.map(|v| parse_timestamp(&v, column)).transpose()
}
