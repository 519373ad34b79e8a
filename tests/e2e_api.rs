//! End-to-end tests for the axum API over the in-memory directory.
//!
//! Run with: `cargo test --features "axum_api mocks" --test e2e_api`

#![cfg(all(feature = "axum_api", feature = "mocks"))]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use authgate::api::axum::{ApiState, directory_routes};
use authgate::permissions::grant_types;
use authgate::{
    AuthGateConfig, MockDirectory, MockTokenRepository, NewGrant, TokenRepository, User,
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    directory: MockDirectory,
    tokens: MockTokenRepository,
}

impl TestApp {
    fn new() -> Self {
        let directory = MockDirectory::new();
        let tokens = MockTokenRepository::new();
        let state = ApiState::new(
            directory.clone(),
            tokens.clone(),
            AuthGateConfig::development(),
        );
        let router =
            directory_routes::<MockDirectory, MockTokenRepository>().with_state(state);

        Self {
            router,
            directory,
            tokens,
        }
    }

    /// A seeded user plus a valid token for them.
    async fn user(&self, email: &str, is_admin: bool) -> (User, String) {
        let user = self.directory.seed_user(email, is_admin);
        let token = format!("token-{}", user.id);
        self.tokens
            .create_token(user.id, &token, Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        (user, token)
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header("authorization", format!("Bearer {token}"));
        }
        let body = match body {
            Some(body) => {
                request = request.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&body).unwrap())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}

fn ids(list: &Value) -> Vec<i64> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_anonymous_listing_is_unauthorized() {
    let app = TestApp::new();

    let request = Request::builder()
        .uri("/organizations")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()["www-authenticate"], "Token");
}

#[tokio::test]
async fn test_unknown_token_is_anonymous() {
    let app = TestApp::new();

    let (status, body) = app
        .send("GET", "/organizations", Some("nope"), None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_expired_token_is_anonymous() {
    let app = TestApp::new();
    let user = app.directory.seed_user("late@example.org", true);
    app.tokens
        .create_token(user.id, "stale", Utc::now() - Duration::minutes(1))
        .await
        .unwrap();

    let (status, _) = app
        .send("GET", "/organizations", Some("stale"), None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_scheme_is_accepted() {
    let app = TestApp::new();
    let (_, token) = app.user("plain@example.org", false).await;

    let request = Request::builder()
        .uri("/organizations")
        .header("authorization", format!("Token {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_creates_organization() {
    let app = TestApp::new();
    let (_, token) = app.user("admin@example.org", true).await;

    let (status, body) = app
        .send(
            "POST",
            "/organizations",
            Some(&token),
            Some(json!({"title": "Acme"})),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "Acme");
    assert_eq!(body["archived"], false);
    assert_eq!(body["teams"], json!([]));
    assert_eq!(body["users"], json!([]));
}

#[tokio::test]
async fn test_plain_user_cannot_create_organization() {
    let app = TestApp::new();
    let (_, token) = app.user("plain@example.org", false).await;

    let (status, body) = app
        .send(
            "POST",
            "/organizations",
            Some(&token),
            Some(json!({"title": "Acme"})),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_missing_title_is_required() {
    let app = TestApp::new();
    let (_, token) = app.user("admin@example.org", true).await;

    let (status, body) = app
        .send("POST", "/organizations", Some(&token), Some(json!({})))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "title");
    assert_eq!(body["error"], "This field is required.");
}

#[tokio::test]
async fn test_unknown_organization_is_not_found_only_when_authenticated() {
    let app = TestApp::new();
    let (_, token) = app.user("plain@example.org", false).await;

    let (status, _) = app.send("GET", "/organizations/999", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send("GET", "/organizations/999", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_malformed_body_from_anonymous_is_unauthorized() {
    let app = TestApp::new();
    let org = app.directory.seed_organization("Acme");

    let request = Request::builder()
        .method("POST")
        .uri(format!("/organizations/{}/teams", org.id))
        .header("content-type", "application/json")
        .body(Body::from("{broken"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_archived_filter_choices() {
    let app = TestApp::new();
    let (_, token) = app.user("admin@example.org", true).await;
    let live = app.directory.seed_organization("Live");
    let gone = app.directory.seed_organization("Gone");

    let (status, _) = app
        .send("DELETE", &format!("/organizations/{}", gone.id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app.send("GET", "/organizations", Some(&token), None).await;
    assert_eq!(ids(&body), vec![live.id]);

    let (_, body) = app
        .send("GET", "/organizations?archived=true", Some(&token), None)
        .await;
    assert_eq!(ids(&body), vec![gone.id]);

    let (_, body) = app
        .send("GET", "/organizations?archived=both", Some(&token), None)
        .await;
    assert_eq!(ids(&body), vec![live.id, gone.id]);

    let (status, body) = app
        .send("GET", "/organizations?archived=maybe", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "archived");
    assert_eq!(body["error"], "Must be one of [both, false, true]");

    let (status, body) = app
        .send("GET", &format!("/organizations/{}", gone.id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["archived"], true);
}

#[tokio::test]
async fn test_org_writer_updates_only_their_organization() {
    let app = TestApp::new();
    let org_a = app.directory.seed_organization("A");
    let org_b = app.directory.seed_organization("B");
    let team = app.directory.seed_team(org_a.id, "Writers");
    let (writer, token) = app.user("writer@example.org", false).await;
    app.directory.seed_team_user(team.id, writer.id);
    app.directory.seed_grant(
        team.id,
        NewGrant::new(grant_types::ORG_WRITE, Some(&org_a.id.to_string())),
    );

    let (status, _) = app
        .send(
            "PUT",
            &format!("/organizations/{}", org_b.id),
            Some(&token),
            Some(json!({"title": "Taken"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(
            "PATCH",
            &format!("/organizations/{}", org_a.id),
            Some(&token),
            Some(json!({"title": "Renamed"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Renamed");
}

#[tokio::test]
async fn test_put_requires_title_but_patch_does_not() {
    let app = TestApp::new();
    let (_, token) = app.user("admin@example.org", true).await;
    let org = app.directory.seed_organization("Acme");
    let uri = format!("/organizations/{}", org.id);

    let (status, _) = app.send("PUT", &uri, Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.send("PATCH", &uri, Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Acme");
}

#[tokio::test]
async fn test_teams_are_created_under_their_organization() {
    let app = TestApp::new();
    let (_, token) = app.user("admin@example.org", true).await;
    let org = app.directory.seed_organization("Acme");

    let (status, _) = app
        .send("POST", "/teams", Some(&token), Some(json!({"title": "Ops"})))
        .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, body) = app
        .send(
            "POST",
            &format!("/organizations/{}/teams", org.id),
            Some(&token),
            Some(json!({"title": "Ops"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["organization"], org.id);
    assert_eq!(body["permissions"], json!([]));

    let (_, body) = app
        .send("GET", &format!("/organizations/{}", org.id), Some(&token), None)
        .await;
    assert_eq!(body["teams"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_team_organization_is_immutable() {
    let app = TestApp::new();
    let (_, token) = app.user("admin@example.org", true).await;
    let org = app.directory.seed_organization("Acme");
    let other = app.directory.seed_organization("Other");
    let team = app.directory.seed_team(org.id, "Ops");

    let (status, body) = app
        .send(
            "PUT",
            &format!("/teams/{}", team.id),
            Some(&token),
            Some(json!({"title": "Ops", "organization": other.id})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "organization");
    assert_eq!(body["error"], "This field can only be set on creation.");
}

#[tokio::test]
async fn test_adding_missing_user_is_a_validation_error() {
    let app = TestApp::new();
    let (_, token) = app.user("admin@example.org", true).await;
    let org = app.directory.seed_organization("Acme");

    let (status, body) = app
        .send(
            "POST",
            &format!("/organizations/{}/users", org.id),
            Some(&token),
            Some(json!({"user_id": 4242})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "user_id");
    assert_eq!(body["error"], "Invalid pk \"4242\" - object does not exist.");
}

#[tokio::test]
async fn test_membership_round_trip_and_nested_summaries() {
    let app = TestApp::new();
    let (_, token) = app.user("admin@example.org", true).await;
    let org = app.directory.seed_organization("Acme");
    let team = app.directory.seed_team(org.id, "Ops");
    let member = app.directory.seed_user("member@example.org", false);
    let dormant = app.directory.seed_user("dormant@example.org", false);

    for user_id in [member.id, dormant.id] {
        let (status, _) = app
            .send(
                "POST",
                &format!("/teams/{}/users", team.id),
                Some(&token),
                Some(json!({"user_id": user_id})),
            )
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    let (status, _) = app
        .send("DELETE", &format!("/users/{}", dormant.id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app
        .send("GET", &format!("/teams/{}", team.id), Some(&token), None)
        .await;
    assert_eq!(body["users"], json!([{"id": member.id}]));

    let (_, body) = app
        .send("GET", &format!("/users/{}", member.id), Some(&token), None)
        .await;
    assert_eq!(body["teams"], json!([{"id": team.id}]));

    let (status, _) = app
        .send(
            "DELETE",
            &format!("/teams/{}/users/{}", team.id, member.id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app
        .send("GET", &format!("/teams/{}", team.id), Some(&token), None)
        .await;
    assert_eq!(body["users"], json!([]));
}

#[tokio::test]
async fn test_team_listing_shows_only_readable_teams() {
    let app = TestApp::new();
    let org = app.directory.seed_organization("Acme");
    let mine = app.directory.seed_team(org.id, "Mine");
    let _theirs = app.directory.seed_team(org.id, "Theirs");
    let (member, token) = app.user("member@example.org", false).await;
    app.directory.seed_team_user(mine.id, member.id);

    let (status, body) = app.send("GET", "/teams", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![mine.id]);

    let (_, body) = app
        .send("GET", &format!("/organizations/{}/teams", org.id), Some(&token), None)
        .await;
    assert_eq!(ids(&body), vec![mine.id]);
}

#[tokio::test]
async fn test_team_listing_grant_filters() {
    let app = TestApp::new();
    let (_, token) = app.user("admin@example.org", true).await;
    let org = app.directory.seed_organization("Acme");
    let admins = app.directory.seed_team(org.id, "Admins");
    let readers = app.directory.seed_team(org.id, "Readers");
    app.directory.seed_grant(
        admins.id,
        NewGrant::new(grant_types::ORG_ADMIN, Some(&org.id.to_string())),
    );
    app.directory
        .seed_grant(readers.id, NewGrant::new(grant_types::TEAM_READ, Some("99")));

    let (_, body) = app
        .send("GET", "/teams?permission_contains=org:", Some(&token), None)
        .await;
    assert_eq!(ids(&body), vec![admins.id]);

    let (_, body) = app
        .send("GET", "/teams?object_id=99", Some(&token), None)
        .await;
    assert_eq!(ids(&body), vec![readers.id]);
}

#[tokio::test]
async fn test_team_permissions_round_trip() {
    let app = TestApp::new();
    let (_, token) = app.user("admin@example.org", true).await;
    let org = app.directory.seed_organization("Acme");
    let team = app.directory.seed_team(org.id, "Ops");
    let other = app.directory.seed_team(org.id, "Other");

    let (status, grant) = app
        .send(
            "POST",
            &format!("/teams/{}/permissions", team.id),
            Some(&token),
            Some(json!({"type": "org:write", "object_id": org.id.to_string()})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(grant["type"], "org:write");
    let grant_id = grant["id"].as_i64().unwrap();

    let (status, _) = app
        .send(
            "DELETE",
            &format!("/teams/{}/permissions/{grant_id}", other.id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            "DELETE",
            &format!("/teams/{}/permissions/{grant_id}", team.id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app
        .send(
            "POST",
            &format!("/teams/{}/permissions", team.id),
            Some(&token),
            Some(json!({"object_id": "1"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "type");
}

#[tokio::test]
async fn test_team_reader_cannot_archive() {
    let app = TestApp::new();
    let org = app.directory.seed_organization("Acme");
    let team = app.directory.seed_team(org.id, "Ops");
    let (member, token) = app.user("member@example.org", false).await;
    app.directory.seed_team_user(team.id, member.id);

    let (status, _) = app
        .send("GET", &format!("/teams/{}", team.id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send("DELETE", &format!("/teams/{}", team.id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_user_signup_and_token_flow() {
    let app = TestApp::new();
    let (_, admin_token) = app.user("admin@example.org", true).await;

    let (status, created) = app
        .send(
            "POST",
            "/users",
            Some(&admin_token),
            Some(json!({
                "email": "new@example.org",
                "password": "correct horse",
                "first_name": "New",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["active"], true);
    assert_eq!(created["admin"], false);
    assert!(created.get("hashed_password").is_none());

    let (status, body) = app
        .send(
            "POST",
            "/tokens",
            None,
            Some(json!({"email": "new@example.org", "password": "wrong password"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");

    let (status, issued) = app
        .send(
            "POST",
            "/tokens",
            None,
            Some(json!({"email": "new@example.org", "password": "correct horse"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(issued["user_id"], created["id"]);
    let token = issued["token"].as_str().unwrap().to_owned();

    let (status, body) = app
        .send(
            "GET",
            &format!("/users/{}", created["id"]),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["first_name"], "New");
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let app = TestApp::new();
    let (_, token) = app.user("admin@example.org", true).await;

    let (status, body) = app
        .send(
            "POST",
            "/users",
            Some(&token),
            Some(json!({"email": "admin@example.org", "password": "long enough"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "USER_ALREADY_EXISTS");
    assert_eq!(body["field"], "email");
}

#[tokio::test]
async fn test_only_admins_create_admins() {
    let app = TestApp::new();
    let creators = app.directory.seed_organization("Creators");
    let team = app.directory.seed_team(creators.id, "Recruiters");
    let (recruiter, token) = app.user("recruiter@example.org", false).await;
    app.directory.seed_team_user(team.id, recruiter.id);
    app.directory
        .seed_grant(team.id, NewGrant::new(grant_types::USER_CREATE, None));

    let (status, _) = app
        .send(
            "POST",
            "/users",
            Some(&token),
            Some(json!({"email": "boss@example.org", "password": "long enough", "admin": true})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            "POST",
            "/users",
            Some(&token),
            Some(json!({"email": "hire@example.org", "password": "long enough"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_self_update_cannot_elevate() {
    let app = TestApp::new();
    let (user, token) = app.user("self@example.org", false).await;
    let uri = format!("/users/{}", user.id);

    let (status, body) = app
        .send("PUT", &uri, Some(&token), Some(json!({"last_name": "Lovelace"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["last_name"], "Lovelace");

    let (status, _) = app
        .send("PUT", &uri, Some(&token), Some(json!({"admin": true})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_deactivated_user_loses_access() {
    let app = TestApp::new();
    let (user, token) = app.user("leaving@example.org", false).await;

    let (status, _) = app
        .send("DELETE", &format!("/users/{}", user.id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.send("GET", "/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_listing_active_filter() {
    let app = TestApp::new();
    let (admin, token) = app.user("admin@example.org", true).await;
    let gone = app.directory.seed_user("gone@example.org", false);
    app.send("DELETE", &format!("/users/{}", gone.id), Some(&token), None)
        .await;

    let (_, body) = app.send("GET", "/users", Some(&token), None).await;
    assert_eq!(ids(&body), vec![admin.id]);

    let (_, body) = app
        .send("GET", "/users?active=false", Some(&token), None)
        .await;
    assert_eq!(ids(&body), vec![gone.id]);

    let (status, _) = app
        .send("GET", "/users?active=nope", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
