use std::sync::Arc;

use crates::domain::{
    entities::{
        attendances::AttendanceEntity,
        students::{InsertStudentEntity, StudentEntity},
    },
    errors::{CoreError, CoreResult},
    repositories::{
        attendances::AttendanceRepository, clubs::ClubRepository, groups::GroupRepository,
        students::StudentRepository,
    },
    value_objects::students::{InsertStudentModel, PageQuery},
};
use tracing::{error, info};
use uuid::Uuid;

use super::access::GroupAccess;

pub const ATTENDANCE_HISTORY_LIMIT: i64 = 50;

pub struct StudentUseCase<St, G, C, A>
where
    St: StudentRepository + Send + Sync + 'static,
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    A: AttendanceRepository + Send + Sync + 'static,
{
    access: GroupAccess<G, C>,
    student_repo: Arc<St>,
    attendance_repo: Arc<A>,
}

impl<St, G, C, A> StudentUseCase<St, G, C, A>
where
    St: StudentRepository + Send + Sync + 'static,
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    A: AttendanceRepository + Send + Sync + 'static,
{
    pub fn new(access: GroupAccess<G, C>, student_repo: Arc<St>, attendance_repo: Arc<A>) -> Self {
        Self {
            access,
            student_repo,
            attendance_repo,
        }
    }

    pub async fn create(&self, actor_id: Uuid, model: InsertStudentModel) -> CoreResult<StudentEntity> {
        let name = model.name.trim().to_string();
        if name.is_empty() {
            return Err(CoreError::BadRequest("name is required".to_string()));
        }
        self.access.ensure_club_owner(actor_id, model.club_id).await?;

        let parent_contact = model
            .parent_contact
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|err| CoreError::Internal(err.into()))?;
        let notes = model
            .notes
            .map(|notes| notes.trim().to_string())
            .filter(|notes| !notes.is_empty());

        let student = self
            .student_repo
            .create(InsertStudentEntity {
                club_id: model.club_id,
                name,
                parent_contact,
                notes,
            })
            .await
            .map_err(|err| {
                error!(club_id = %model.club_id, db_error = ?err, "students: failed to create student");
                err
            })?;

        info!(student_id = %student.id, club_id = %student.club_id, %actor_id, "students: student created");
        Ok(student)
    }

    pub async fn get(&self, actor_id: Uuid, student_id: Uuid) -> CoreResult<StudentEntity> {
        let student = self.student_repo.find_by_id(student_id).await?;
        self.access.ensure_club_staff(actor_id, student.club_id).await?;
        Ok(student)
    }

    pub async fn list_by_club(
        &self,
        actor_id: Uuid,
        club_id: Uuid,
        page: PageQuery,
    ) -> CoreResult<Vec<StudentEntity>> {
        self.access.ensure_club_staff(actor_id, club_id).await?;
        self.student_repo
            .list_by_club(club_id, page.limit(), page.offset())
            .await
    }

    /// Latest attendance records of one student, newest first.
    pub async fn attendance_history(
        &self,
        actor_id: Uuid,
        student_id: Uuid,
    ) -> CoreResult<Vec<AttendanceEntity>> {
        let student = self.get(actor_id, student_id).await?;
        self.attendance_repo
            .list_by_student(student.id, ATTENDANCE_HISTORY_LIMIT)
            .await
    }
}
