//! Shared test utilities for road-db tests.

#[cfg(test)]
pub(crate) mod helpers {
    use road_core::entities::{NewProject, NewUser, Project, User};
    use road_core::enums::Role;

    use crate::RoadDb;
    use crate::service::RoadService;

    /// Create an in-memory `RoadService`.
    pub async fn test_service() -> RoadService {
        let db = RoadDb::open_local(":memory:").await.unwrap();
        RoadService::from_db(db)
    }

    /// Create a user with a placeholder hash.
    pub async fn create_test_user(svc: &RoadService, email: &str, role: Role) -> User {
        let new = NewUser {
            email: email.into(),
            name: "Test User".into(),
            role,
            password: "correct-horse".into(),
        };
        svc.create_user(None, &new, "$2b$04$placeholderhash").await.unwrap()
    }

    /// Create a project and return it.
    pub async fn create_test_project(svc: &RoadService, name: &str) -> Project {
        let new = NewProject {
            name: name.into(),
            ..Default::default()
        };
        svc.create_project(Some("usr-tester01"), &new).await.unwrap()
    }
}
