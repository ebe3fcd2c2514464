use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use log::debug;
use std::sync::Arc;

use studygoals_core::goals::{Goal, GoalError, GoalRepositoryTrait, GoalStatus};
use studygoals_core::Result;

use super::model::{format_date, GoalDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::goals;
use crate::schema::goals::dsl::*;

pub struct GoalRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

fn into_goals(rows: Vec<GoalDB>) -> Result<Vec<Goal>> {
    rows.into_iter().map(Goal::try_from).collect()
}

/// Writes `goal` if the stored row still carries `goal.version`, bumping the
/// version. Must run inside a writer transaction.
fn update_versioned(conn: &mut SqliteConnection, goal: Goal) -> Result<Goal> {
    let expected = goal.version;
    let mut row = GoalDB::from(goal);
    row.version = expected + 1;

    let updated = diesel::update(goals.filter(id.eq(&row.id)).filter(version.eq(expected)))
        .set(&row)
        .execute(conn)
        .map_err(StorageError::from)?;

    if updated == 0 {
        let found = goals
            .find(&row.id)
            .select(version)
            .first::<i32>(conn)
            .optional()
            .map_err(StorageError::from)?;
        return Err(match found {
            Some(found) => GoalError::Conflict {
                goal_id: row.id,
                expected,
                found,
            },
            None => GoalError::NotFound(row.id),
        }
        .into());
    }

    Goal::try_from(row)
}

impl GoalRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        GoalRepository { pool, writer }
    }
}

#[async_trait]
impl GoalRepositoryTrait for GoalRepository {
    fn get_goal(&self, goal_id: &str) -> Result<Option<Goal>> {
        let mut conn = get_connection(&self.pool)?;
        goals
            .find(goal_id)
            .select(GoalDB::as_select())
            .first::<GoalDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(Goal::try_from)
            .transpose()
    }

    fn load_goals(&self, owner: &str) -> Result<Vec<Goal>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = goals
            .filter(owner_id.eq(owner))
            .order((created_at.asc(), id.asc()))
            .select(GoalDB::as_select())
            .load::<GoalDB>(&mut conn)
            .map_err(StorageError::from)?;
        into_goals(rows)
    }

    fn load_instances(&self, template_id: &str) -> Result<Vec<Goal>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = goals
            .filter(parent_goal_id.eq(template_id))
            .order(reference_date.asc())
            .select(GoalDB::as_select())
            .load::<GoalDB>(&mut conn)
            .map_err(StorageError::from)?;
        into_goals(rows)
    }

    fn find_instance(&self, template_id: &str, day: NaiveDate) -> Result<Option<Goal>> {
        let mut conn = get_connection(&self.pool)?;
        goals
            .filter(parent_goal_id.eq(template_id))
            .filter(reference_date.eq(format_date(day)))
            .select(GoalDB::as_select())
            .first::<GoalDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(Goal::try_from)
            .transpose()
    }

    fn find_active_expiring(&self, owner: &str, before: NaiveDate) -> Result<Vec<Goal>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = goals
            .filter(owner_id.eq(owner))
            .filter(status.eq(GoalStatus::Active.as_str()))
            .filter(window_end.lt(format_date(before)))
            .select(GoalDB::as_select())
            .load::<GoalDB>(&mut conn)
            .map_err(StorageError::from)?;
        into_goals(rows)
    }

    async fn insert_goals(&self, new_goals: Vec<Goal>) -> Result<Vec<Goal>> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Vec<Goal>> {
                let mut stored = Vec::with_capacity(new_goals.len());
                for goal in new_goals {
                    let row = diesel::insert_into(goals::table)
                        .values(GoalDB::from(goal))
                        .returning(GoalDB::as_returning())
                        .get_result(conn)
                        .map_err(StorageError::from)?;
                    stored.push(Goal::try_from(row)?);
                }
                Ok(stored)
            })
            .await
    }

    async fn update_goal(&self, goal: Goal) -> Result<Goal> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Goal> {
                update_versioned(conn, goal)
            })
            .await
    }

    async fn update_goals(&self, batch: Vec<Goal>) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let count = batch.len();
                for goal in batch {
                    update_versioned(conn, goal)?;
                }
                debug!("Updated {} goal(s) in one transaction", count);
                Ok(count)
            })
            .await
    }

    async fn delete_goal(&self, owner: &str, goal_id: &str) -> Result<usize> {
        let owner = owner.to_string();
        let goal_id = goal_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                Ok(
                    diesel::delete(goals.filter(id.eq(goal_id)).filter(owner_id.eq(owner)))
                        .execute(conn)
                        .map_err(StorageError::from)?,
                )
            })
            .await
    }
}
