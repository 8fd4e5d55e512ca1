use std::sync::Arc;

use crates::domain::{
    entities::{clubs::ClubEntity, groups::GroupEntity},
    errors::{CoreError, CoreResult, ErrorKind},
    repositories::{clubs::ClubRepository, groups::GroupRepository, users::UserRepository},
    value_objects::clubs::{InsertClubModel, InsertGroupModel},
};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::access::GroupAccess;

pub struct ClubUseCase<G, C, U>
where
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    access: GroupAccess<G, C>,
    group_repo: Arc<G>,
    club_repo: Arc<C>,
    user_repo: Arc<U>,
}

impl<G, C, U> ClubUseCase<G, C, U>
where
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    pub fn new(group_repo: Arc<G>, club_repo: Arc<C>, user_repo: Arc<U>) -> Self {
        Self {
            access: GroupAccess::new(Arc::clone(&group_repo), Arc::clone(&club_repo)),
            group_repo,
            club_repo,
            user_repo,
        }
    }

    /// The caller becomes the owner.
    pub async fn create_club(&self, actor_id: Uuid, model: InsertClubModel) -> CoreResult<ClubEntity> {
        let row = model.into_entity(actor_id).map_err(CoreError::BadRequest)?;

        let club = self.club_repo.create(row).await.map_err(|err| {
            error!(%actor_id, db_error = ?err, "clubs: failed to create club");
            err
        })?;

        info!(club_id = %club.id, %actor_id, "clubs: club created");
        Ok(club)
    }

    pub async fn get_club(&self, actor_id: Uuid, club_id: Uuid) -> CoreResult<ClubEntity> {
        self.access.ensure_club_staff(actor_id, club_id).await
    }

    pub async fn list_owned_clubs(&self, actor_id: Uuid) -> CoreResult<Vec<ClubEntity>> {
        self.club_repo.list_by_owner(actor_id).await
    }

    pub async fn create_group(&self, actor_id: Uuid, model: InsertGroupModel) -> CoreResult<GroupEntity> {
        let row = model.into_entity().map_err(CoreError::BadRequest)?;
        self.access.ensure_club_owner(actor_id, row.club_id).await?;

        if let Some(coach_user_id) = row.coach_user_id {
            match self.user_repo.find_by_id(coach_user_id).await {
                Ok(_) => {}
                Err(err) if err.is(ErrorKind::NotFound) => {
                    warn!(%coach_user_id, "clubs: coach does not exist");
                    return Err(CoreError::NotFound("coach"));
                }
                Err(err) => return Err(err),
            }
        }

        let group = self.group_repo.create(row).await.map_err(|err| {
            error!(%actor_id, db_error = ?err, "clubs: failed to create group");
            err
        })?;

        info!(group_id = %group.id, club_id = %group.club_id, %actor_id, "clubs: group created");
        Ok(group)
    }

    pub async fn get_group(&self, actor_id: Uuid, group_id: Uuid) -> CoreResult<GroupEntity> {
        let scope = self.access.ensure_staff(actor_id, group_id).await?;
        Ok(scope.group)
    }

    pub async fn list_groups(&self, actor_id: Uuid, club_id: Uuid) -> CoreResult<Vec<GroupEntity>> {
        self.access.ensure_club_staff(actor_id, club_id).await?;
        self.group_repo.list_by_club(club_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::test_support::{club, group};
    use chrono::Utc;
    use crates::domain::{
        entities::users::UserEntity,
        repositories::{
            clubs::MockClubRepository, groups::MockGroupRepository, users::MockUserRepository,
        },
    };
    use mockall::predicate::eq;

    type TestUseCase = ClubUseCase<MockGroupRepository, MockClubRepository, MockUserRepository>;

    fn usecase(
        group_repo: MockGroupRepository,
        club_repo: MockClubRepository,
        user_repo: MockUserRepository,
    ) -> TestUseCase {
        ClubUseCase::new(Arc::new(group_repo), Arc::new(club_repo), Arc::new(user_repo))
    }

    fn coach_user(id: Uuid) -> UserEntity {
        UserEntity {
            id,
            email: "coach@club.example".to_string(),
            password_hash: String::new(),
            name: "Coach".to_string(),
            role: "coach".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn creator_owns_the_new_club() {
        let owner = Uuid::new_v4();
        let mut club_repo = MockClubRepository::new();
        club_repo
            .expect_create()
            .times(1)
            .withf(move |row| row.owner_user_id == owner && row.currency == "usd")
            .returning(|row| {
                Ok(ClubEntity {
                    id: Uuid::new_v4(),
                    owner_user_id: row.owner_user_id,
                    name: row.name,
                    currency: row.currency,
                    created_at: Utc::now(),
                })
            });

        let usecase = usecase(MockGroupRepository::new(), club_repo, MockUserRepository::new());
        let club = usecase
            .create_club(
                owner,
                InsertClubModel {
                    name: "Tigers Judo".to_string(),
                    currency: "USD".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(club.owner_user_id, owner);
    }

    #[tokio::test]
    async fn invalid_club_is_rejected_before_storage() {
        let usecase = usecase(
            MockGroupRepository::new(),
            MockClubRepository::new(),
            MockUserRepository::new(),
        );

        let err = usecase
            .create_club(
                Uuid::new_v4(),
                InsertClubModel {
                    name: "T".to_string(),
                    currency: "usd".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn only_the_owner_creates_groups() {
        let owner = Uuid::new_v4();
        let coach = Uuid::new_v4();
        let club = club(owner);
        let club_id = club.id;

        let mut club_repo = MockClubRepository::new();
        club_repo
            .expect_find_by_id()
            .with(eq(club_id))
            .returning(move |_| Ok(club.clone()));
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_id()
            .with(eq(coach))
            .returning(move |id| Ok(coach_user(id)));
        let mut group_repo = MockGroupRepository::new();
        group_repo.expect_create().times(1).returning(|row| {
            Ok(GroupEntity {
                id: Uuid::new_v4(),
                club_id: row.club_id,
                title: row.title,
                coach_user_id: row.coach_user_id,
                created_at: Utc::now(),
            })
        });
        let usecase = usecase(group_repo, club_repo, user_repo);

        let model = InsertGroupModel {
            club_id,
            title: "U10 Football".to_string(),
            coach_user_id: Some(coach),
        };
        let err = usecase.create_group(coach, model.clone()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let group = usecase.create_group(owner, model).await.unwrap();
        assert!(group.is_coached_by(coach));
    }

    #[tokio::test]
    async fn unknown_coach_is_not_found() {
        let owner = Uuid::new_v4();
        let club = club(owner);
        let club_id = club.id;

        let mut club_repo = MockClubRepository::new();
        club_repo
            .expect_find_by_id()
            .returning(move |_| Ok(club.clone()));
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_id()
            .returning(|_| Err(CoreError::NotFound("user")));
        let usecase = usecase(MockGroupRepository::new(), club_repo, user_repo);

        let err = usecase
            .create_group(
                owner,
                InsertGroupModel {
                    club_id,
                    title: "Seniors".to_string(),
                    coach_user_id: Some(Uuid::new_v4()),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn coach_lists_groups_of_their_club() {
        let coach = Uuid::new_v4();
        let club = club(Uuid::new_v4());
        let club_id = club.id;
        let groups = vec![group(club_id, Some(coach)), group(club_id, None)];

        let mut club_repo = MockClubRepository::new();
        club_repo
            .expect_find_by_id()
            .returning(move |_| Ok(club.clone()));
        let mut group_repo = MockGroupRepository::new();
        group_repo
            .expect_list_by_club()
            .with(eq(club_id))
            .returning(move |_| Ok(groups.clone()));
        let usecase = usecase(group_repo, club_repo, MockUserRepository::new());

        assert_eq!(usecase.list_groups(coach, club_id).await.unwrap().len(), 2);
        let err = usecase
            .list_groups(Uuid::new_v4(), club_id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }
}
