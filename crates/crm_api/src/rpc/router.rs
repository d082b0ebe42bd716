use axum::routing::post;
use axum::Router;

use super::{
    activity_handler, company_handler, contact_handler, project_handler, session_handler,
    CrmApiState,
};

/// Routes of every CRM procedure, served at `POST /rpc/<router>.<procedure>`
pub fn build_crm_api_router(state: CrmApiState) -> Router {
    Router::new()
        // contact
        .route("/rpc/contact.getAll", post(contact_handler::get_all))
        .route("/rpc/contact.get", post(contact_handler::get))
        .route("/rpc/contact.add", post(contact_handler::add))
        .route("/rpc/contact.update", post(contact_handler::update))
        .route("/rpc/contact.delete", post(contact_handler::delete))
        .route("/rpc/contact.addLink", post(contact_handler::add_link))
        .route("/rpc/contact.deleteLink", post(contact_handler::delete_link))
        .route("/rpc/contact.addCompany", post(contact_handler::add_company))
        .route("/rpc/contact.deleteCompany", post(contact_handler::delete_company))
        .route("/rpc/contact.addProject", post(contact_handler::add_project))
        .route("/rpc/contact.deleteProject", post(contact_handler::delete_project))
        // company
        .route("/rpc/company.getAll", post(company_handler::get_all))
        .route("/rpc/company.getOne", post(company_handler::get_one))
        .route(
            "/rpc/company.getCompanyContacts",
            post(company_handler::get_company_contacts),
        )
        .route(
            "/rpc/company.getCompanyProjects",
            post(company_handler::get_company_projects),
        )
        .route("/rpc/company.addOne", post(company_handler::add_one))
        .route("/rpc/company.updateOne", post(company_handler::update_one))
        .route("/rpc/company.deleteOne", post(company_handler::delete_one))
        .route("/rpc/company.addContact", post(company_handler::add_contact))
        .route("/rpc/company.deleteContact", post(company_handler::delete_contact))
        // project
        .route("/rpc/project.getAll", post(project_handler::get_all))
        .route("/rpc/project.getOne", post(project_handler::get_one))
        .route(
            "/rpc/project.getProjectContacts",
            post(project_handler::get_project_contacts),
        )
        .route("/rpc/project.addOne", post(project_handler::add_one))
        .route("/rpc/project.updateOne", post(project_handler::update_one))
        .route("/rpc/project.deleteOne", post(project_handler::delete_one))
        .route("/rpc/project.addContact", post(project_handler::add_contact))
        .route("/rpc/project.deleteContact", post(project_handler::delete_contact))
        .route("/rpc/project.addCompany", post(project_handler::add_company))
        .route("/rpc/project.deleteCompany", post(project_handler::delete_company))
        // activity
        .route("/rpc/activity.getAll", post(activity_handler::get_all))
        .route("/rpc/activity.addOne", post(activity_handler::add_one))
        .route("/rpc/activity.deleteOne", post(activity_handler::delete_one))
        // session
        .route("/rpc/session.get", post(session_handler::get))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::{
        sample_company, sample_contact, session_with, MockRepositories,
    };
    use crate::domain::{
        ActivityService, CompanyService, ContactService, ProjectService, RecordAccess,
        SessionService,
    };
    use axum::body::{to_bytes, Body};
    use common::auth::{MockAuthTokenProvider, RoleAuthorizationService};
    use common::domain::{DomainError, RoleCapabilities};
    use http::{header, Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn router_with(mut mocks: MockRepositories, capabilities: RoleCapabilities) -> Router {
        mocks
            .users
            .expect_get_session()
            .returning(move |input| {
                if input.user_id == "user-1" {
                    Ok(Some(session_with(capabilities)))
                } else {
                    Ok(None)
                }
            });

        let mut tokens = MockAuthTokenProvider::new();
        tokens.expect_validate_token().returning(|token| match token {
            "token-user-1" => Ok("user-1".to_string()),
            "token-ghost" => Ok("ghost".to_string()),
            _ => Err(DomainError::InvalidToken("bad signature".to_string())),
        });

        let repositories = mocks.into_repositories();
        let access = RecordAccess::new(
            repositories.clone(),
            Arc::new(RoleAuthorizationService::new()),
        );

        build_crm_api_router(CrmApiState {
            contact_service: Arc::new(ContactService::new(repositories.clone(), access.clone())),
            company_service: Arc::new(CompanyService::new(repositories.clone(), access.clone())),
            project_service: Arc::new(ProjectService::new(repositories.clone(), access.clone())),
            activity_service: Arc::new(ActivityService::new(repositories.clone(), access)),
            session_service: Arc::new(SessionService::new(repositories.users.clone())),
            auth_token_provider: Arc::new(tokens),
        })
    }

    fn rpc(procedure: &str, token: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::post(format!("/rpc/{}", procedure))
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let app = router_with(MockRepositories::new(), RoleCapabilities::default());

        let (status, body) = send(app, rpc("contact.getAll", None, "")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_invalid_token_is_unauthorized() {
        let app = router_with(MockRepositories::new(), RoleCapabilities::default());

        let (status, body) = send(app, rpc("session.get", Some("forged"), "")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_unknown_user_is_unauthorized() {
        let app = router_with(MockRepositories::new(), RoleCapabilities::default());

        let (status, _) = send(app, rpc("session.get", Some("token-ghost"), "")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_session_get_returns_role_and_head() {
        let app = router_with(
            MockRepositories::new(),
            RoleCapabilities {
                can_create_contact: true,
                ..Default::default()
            },
        );

        let (status, body) = send(app, rpc("session.get", Some("token-user-1"), "")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["userId"], "user-1");
        assert_eq!(body["head"]["id"], "head-1");
        assert_eq!(body["role"]["canCreateContact"], true);
        assert_eq!(body["role"]["canDeleteAllContact"], false);
    }

    #[tokio::test]
    async fn test_self_link_is_bad_request() {
        let app = router_with(
            MockRepositories::new(),
            RoleCapabilities {
                can_edit_all_contact: true,
                ..Default::default()
            },
        );

        let (status, body) = send(
            app,
            rpc(
                "contact.addLink",
                Some("token-user-1"),
                r#"{"contactOne":"c1","contactTwo":"c1","mode":0}"#,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_malformed_input_is_bad_request() {
        let app = router_with(MockRepositories::new(), RoleCapabilities::default());

        let (status, body) = send(
            app,
            rpc("contact.delete", Some("token-user-1"), r#"{"contact":"c1"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_delete_without_grant_is_forbidden() {
        let mut mocks = MockRepositories::new();
        mocks
            .contacts
            .expect_get_contact()
            .returning(|input| Ok(Some(sample_contact(&input.contact_id))));
        mocks
            .policies
            .expect_list_policies()
            .returning(|_| Ok(vec![]));
        mocks.contacts.expect_delete_contact().never();

        let app = router_with(mocks, RoleCapabilities::default());

        let (status, body) = send(
            app,
            rpc("contact.delete", Some("token-user-1"), r#"{"id":"c1"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_get_missing_record_is_not_found() {
        let mut mocks = MockRepositories::new();
        mocks.companies.expect_get_company().returning(|_| Ok(None));

        let app = router_with(
            mocks,
            RoleCapabilities {
                can_read_all_company: true,
                ..Default::default()
            },
        );

        let (status, body) = send(
            app,
            rpc("company.getOne", Some("token-user-1"), r#"{"id":"other-head"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_company_get_all_with_empty_body() {
        let mut mocks = MockRepositories::new();
        mocks
            .companies
            .expect_list_companies()
            .returning(|_| Ok(vec![sample_company("co1"), sample_company("co2")]));

        let app = router_with(
            mocks,
            RoleCapabilities {
                can_read_all_company: true,
                ..Default::default()
            },
        );

        let (status, body) = send(app, rpc("company.getAll", Some("token-user-1"), "")).await;

        assert_eq!(status, StatusCode::OK);
        let companies = body.as_array().unwrap();
        assert_eq!(companies.len(), 2);
        assert_eq!(companies[0]["headId"], "head-1");
        assert!(companies[0].get("_count").is_none());
    }

    #[tokio::test]
    async fn test_contact_get_all_without_includes() {
        let mut mocks = MockRepositories::new();
        mocks
            .contacts
            .expect_list_contacts()
            .returning(|_| Ok(vec![sample_contact("c1")]));

        let app = router_with(
            mocks,
            RoleCapabilities {
                can_read_all_contact: true,
                ..Default::default()
            },
        );

        let (status, body) = send(
            app,
            rpc("contact.getAll", Some("token-user-1"), r#"{"include":{}}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["id"], "c1");
        assert!(body[0].get("companies").is_none());
        assert!(body[0].get("outgoingRelations").is_none());
    }

    #[tokio::test]
    async fn test_unknown_procedure_is_not_found() {
        let app = router_with(MockRepositories::new(), RoleCapabilities::default());

        let response = app
            .oneshot(rpc("contact.merge", Some("token-user-1"), "{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
