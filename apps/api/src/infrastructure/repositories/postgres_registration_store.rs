use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::discipline::{BoatClass, Discipline, Distance, SexCategory};
use crate::domain::policy::Violation;
use crate::domain::registration::{RegistrationRecord, RegistrationStatus, Role};
use crate::domain::repositories::{check_roster_guard, ChangeSet, RegistrationStore, StoreError};
use crate::domain::sportsperson::Sportsperson;
use crate::domain::team::{Team, TeamStatus};

const REGISTRATION_COLUMNS: &str = r#"
    id, sportsperson_id, event_id, team_id, role,
    boat_class, sex, distances, status, paid, cost,
    created_at, updated_at
"#;

const TEAM_COLUMNS: &str = r#"
    id, event_id, name, city, boat_class, sex, distances,
    member_ids, is_complete, aggregate_status, created_at, updated_at
"#;

#[derive(Debug, FromRow)]
struct RegistrationRow {
    id: Uuid,
    sportsperson_id: Uuid,
    event_id: Uuid,
    team_id: Option<Uuid>,
    role: Role,
    boat_class: String,
    sex: SexCategory,
    distances: Vec<i32>,
    status: RegistrationStatus,
    paid: bool,
    cost: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RegistrationRow> for RegistrationRecord {
    type Error = StoreError;

    fn try_from(row: RegistrationRow) -> Result<Self, Self::Error> {
        let discipline = discipline_from_row(&row.boat_class, row.sex, &row.distances)?;
        Ok(RegistrationRecord::from_persistence(
            row.id,
            row.sportsperson_id,
            row.event_id,
            row.team_id,
            row.role,
            discipline,
            row.status,
            row.paid,
            row.cost,
            row.created_at,
            row.updated_at,
        ))
    }
}

#[derive(Debug, FromRow)]
struct TeamRow {
    id: Uuid,
    event_id: Uuid,
    name: String,
    city: Option<String>,
    boat_class: String,
    sex: SexCategory,
    distances: Vec<i32>,
    member_ids: Vec<Uuid>,
    is_complete: bool,
    aggregate_status: TeamStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TeamRow> for Team {
    type Error = StoreError;

    fn try_from(row: TeamRow) -> Result<Self, Self::Error> {
        let discipline = discipline_from_row(&row.boat_class, row.sex, &row.distances)?;
        Ok(Team::from_persistence(
            row.id,
            row.event_id,
            row.name,
            row.city,
            discipline,
            row.member_ids,
            row.is_complete,
            row.aggregate_status,
            row.created_at,
            row.updated_at,
        ))
    }
}

#[derive(Debug, FromRow)]
struct SportspersonRow {
    id: Uuid,
    full_name: String,
    external_number: Option<String>,
    city: Option<String>,
    birth_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
}

impl From<SportspersonRow> for Sportsperson {
    fn from(row: SportspersonRow) -> Self {
        Sportsperson {
            id: row.id,
            full_name: row.full_name,
            external_number: row.external_number,
            city: row.city,
            birth_date: row.birth_date,
            created_at: row.created_at,
        }
    }
}

fn discipline_from_row(
    boat_class: &str,
    sex: SexCategory,
    distances: &[i32],
) -> Result<Discipline, StoreError> {
    let boat_class: BoatClass = boat_class.parse().map_err(StoreError::Database)?;
    let distances = distances
        .iter()
        .map(|d| {
            u32::try_from(*d)
                .map(Distance::meters)
                .map_err(|_| StoreError::Database(format!("Invalid stored distance: {}", d)))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Discipline::new(boat_class, sex, distances).map_err(|e| StoreError::Database(e.to_string()))
}

fn distances_for_row(discipline: &Discipline) -> Result<Vec<i32>, StoreError> {
    discipline
        .distances()
        .iter()
        .map(|d| {
            i32::try_from(d.as_meters()).map_err(|_| {
                StoreError::Database(format!("Distance {} does not fit the column", d))
            })
        })
        .collect()
}

fn rows_into<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// PostgreSQL implementation of RegistrationStore
///
/// Every commit runs in one transaction. Guarded teams are locked with
/// `SELECT ... FOR UPDATE` before any write so concurrent commits touching
/// the same roster serialize. Existing rows are only updated while their
/// `updated_at` still matches the version the writer read.
pub struct PostgresRegistrationStore {
    pool: PgPool,
}

impl PostgresRegistrationStore {
    /// Creates a new PostgresRegistrationStore
    ///
    /// # Arguments
    /// * `pool` - SQLx connection pool for PostgreSQL
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_sportsperson(
        tx: &mut Transaction<'_, Postgres>,
        sportsperson: &Sportsperson,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO sportspeople (id, full_name, external_number, city, birth_date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(sportsperson.id)
        .bind(&sportsperson.full_name)
        .bind(&sportsperson.external_number)
        .bind(&sportsperson.city)
        .bind(sportsperson.birth_date)
        .bind(sportsperson.created_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Inserts a new team or updates the stored row it was read from
    async fn save_team(tx: &mut Transaction<'_, Postgres>, team: &Team) -> Result<(), StoreError> {
        let distances = distances_for_row(team.discipline())?;
        let result = match team.stored_version() {
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO teams (
                        id, event_id, name, city, boat_class, sex, distances,
                        member_ids, is_complete, aggregate_status, created_at, updated_at
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                    ON CONFLICT (id) DO NOTHING
                    "#,
                )
                .bind(team.id())
                .bind(team.event_id())
                .bind(team.name())
                .bind(team.city())
                .bind(team.boat_class().code())
                .bind(team.discipline().sex())
                .bind(distances)
                .bind(team.members())
                .bind(team.is_complete())
                .bind(team.aggregate_status())
                .bind(team.created_at())
                .bind(team.updated_at())
                .execute(&mut **tx)
                .await?
            }
            Some(version) => {
                sqlx::query(
                    r#"
                    UPDATE teams SET
                        name = $3,
                        city = $4,
                        boat_class = $5,
                        sex = $6,
                        distances = $7,
                        member_ids = $8,
                        is_complete = $9,
                        aggregate_status = $10,
                        updated_at = $11
                    WHERE id = $1 AND updated_at = $2
                    "#,
                )
                .bind(team.id())
                .bind(version)
                .bind(team.name())
                .bind(team.city())
                .bind(team.boat_class().code())
                .bind(team.discipline().sex())
                .bind(distances)
                .bind(team.members())
                .bind(team.is_complete())
                .bind(team.aggregate_status())
                .bind(team.updated_at())
                .execute(&mut **tx)
                .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(StoreError::StaleWrite {
                entity: "team",
                id: team.id(),
            });
        }
        Ok(())
    }

    /// Inserts a new registration or updates the stored row it was read from
    async fn save_registration(
        tx: &mut Transaction<'_, Postgres>,
        registration: &RegistrationRecord,
    ) -> Result<(), StoreError> {
        let discipline = registration.discipline();
        let distances = distances_for_row(discipline)?;
        let result = match registration.stored_version() {
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO registrations (
                        id, sportsperson_id, event_id, team_id, role,
                        boat_class, sex, distances, status, paid, cost,
                        created_at, updated_at
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                    ON CONFLICT (id) DO NOTHING
                    "#,
                )
                .bind(registration.id())
                .bind(registration.sportsperson_id())
                .bind(registration.event_id())
                .bind(registration.team_id())
                .bind(registration.role())
                .bind(discipline.boat_class().code())
                .bind(discipline.sex())
                .bind(distances)
                .bind(registration.status())
                .bind(registration.paid())
                .bind(registration.cost())
                .bind(registration.created_at())
                .bind(registration.updated_at())
                .execute(&mut **tx)
                .await?
            }
            Some(version) => {
                sqlx::query(
                    r#"
                    UPDATE registrations SET
                        team_id = $3,
                        role = $4,
                        boat_class = $5,
                        sex = $6,
                        distances = $7,
                        status = $8,
                        paid = $9,
                        cost = $10,
                        updated_at = $11
                    WHERE id = $1 AND updated_at = $2
                    "#,
                )
                .bind(registration.id())
                .bind(version)
                .bind(registration.team_id())
                .bind(registration.role())
                .bind(discipline.boat_class().code())
                .bind(discipline.sex())
                .bind(distances)
                .bind(registration.status())
                .bind(registration.paid())
                .bind(registration.cost())
                .bind(registration.updated_at())
                .execute(&mut **tx)
                .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(StoreError::StaleWrite {
                entity: "registration",
                id: registration.id(),
            });
        }
        Ok(())
    }

    async fn delete_team(
        tx: &mut Transaction<'_, Postgres>,
        team_id: Uuid,
    ) -> Result<(), StoreError> {
        let (remaining,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM registrations WHERE team_id = $1")
                .bind(team_id)
                .fetch_one(&mut **tx)
                .await?;
        if remaining > 0 {
            return Err(StoreError::Conflict {
                violations: vec![Violation::RosterOutOfSync { team_id }],
            });
        }

        sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(team_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn guard_violations(
        tx: &mut Transaction<'_, Postgres>,
        team_id: Uuid,
    ) -> Result<Vec<Violation>, StoreError> {
        let row: Option<TeamRow> =
            sqlx::query_as(&format!("SELECT {TEAM_COLUMNS} FROM teams WHERE id = $1"))
                .bind(team_id)
                .fetch_optional(&mut **tx)
                .await?;
        let Some(row) = row else {
            return Ok(Vec::new());
        };
        let team = Team::try_from(row)?;

        let rows: Vec<RegistrationRow> = sqlx::query_as(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE team_id = $1"
        ))
        .bind(team_id)
        .fetch_all(&mut **tx)
        .await?;
        let members: Vec<RegistrationRecord> = rows_into(rows)?;

        Ok(check_roster_guard(&team, &members))
    }
}

#[async_trait]
impl RegistrationStore for PostgresRegistrationStore {
    async fn find_registration(
        &self,
        id: Uuid,
    ) -> Result<Option<RegistrationRecord>, StoreError> {
        let row: Option<RegistrationRow> = sqlx::query_as(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(RegistrationRecord::try_from).transpose()
    }

    async fn find_team(&self, id: Uuid) -> Result<Option<Team>, StoreError> {
        let row: Option<TeamRow> =
            sqlx::query_as(&format!("SELECT {TEAM_COLUMNS} FROM teams WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Team::try_from).transpose()
    }

    async fn registrations_for_team(
        &self,
        team_id: Uuid,
    ) -> Result<Vec<RegistrationRecord>, StoreError> {
        let rows: Vec<RegistrationRow> = sqlx::query_as(&format!(
            r#"
            SELECT {REGISTRATION_COLUMNS} FROM registrations
            WHERE team_id = $1
            ORDER BY created_at, id
            "#
        ))
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        rows_into(rows)
    }

    async fn list_registrations(
        &self,
        event_id: Option<Uuid>,
    ) -> Result<Vec<RegistrationRecord>, StoreError> {
        let rows: Vec<RegistrationRow> = sqlx::query_as(&format!(
            r#"
            SELECT {REGISTRATION_COLUMNS} FROM registrations
            WHERE $1::uuid IS NULL OR event_id = $1
            ORDER BY created_at, id
            "#
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        rows_into(rows)
    }

    async fn list_teams(&self, event_id: Option<Uuid>) -> Result<Vec<Team>, StoreError> {
        let rows: Vec<TeamRow> = sqlx::query_as(&format!(
            r#"
            SELECT {TEAM_COLUMNS} FROM teams
            WHERE $1::uuid IS NULL OR event_id = $1
            ORDER BY created_at, id
            "#
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        rows_into(rows)
    }

    async fn find_sportsperson(&self, id: Uuid) -> Result<Option<Sportsperson>, StoreError> {
        let row: Option<SportspersonRow> = sqlx::query_as(
            r#"
            SELECT id, full_name, external_number, city, birth_date, created_at
            FROM sportspeople
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Sportsperson::from))
    }

    async fn find_sportspeople(&self, ids: &[Uuid]) -> Result<Vec<Sportsperson>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<SportspersonRow> = sqlx::query_as(
            r#"
            SELECT id, full_name, external_number, city, birth_date, created_at
            FROM sportspeople
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Sportsperson::from).collect())
    }

    async fn commit(&self, changes: ChangeSet) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let mut guarded = changes.guarded_teams.clone();
        guarded.sort();
        for team_id in &guarded {
            sqlx::query("SELECT id FROM teams WHERE id = $1 FOR UPDATE")
                .bind(team_id)
                .execute(&mut *tx)
                .await?;
        }

        for sportsperson in &changes.sportspeople {
            Self::insert_sportsperson(&mut tx, sportsperson).await?;
        }
        for team in &changes.teams {
            Self::save_team(&mut tx, team).await?;
        }
        for registration in &changes.registrations {
            Self::save_registration(&mut tx, registration).await?;
        }
        for id in &changes.deleted_registrations {
            sqlx::query("DELETE FROM registrations WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        for team_id in &changes.deleted_teams {
            Self::delete_team(&mut tx, *team_id).await?;
        }

        let mut violations = Vec::new();
        for team_id in &guarded {
            violations.extend(Self::guard_violations(&mut tx, *team_id).await?);
        }
        if !violations.is_empty() {
            tx.rollback().await?;
            return Err(StoreError::Conflict { violations });
        }

        tx.commit().await?;
        tracing::debug!(
            teams = changes.teams.len(),
            registrations = changes.registrations.len(),
            deleted = changes.deleted_registrations.len(),
            "change set committed"
        );
        Ok(())
    }
}
