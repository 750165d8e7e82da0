pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::cover_letter::handlers as cover_letter;
use crate::dispatch::handlers as dispatch;
use crate::generation::handlers as generation;
use crate::profiles::handlers as profiles;
use crate::state::AppState;

/// Upper bound for request bodies; resumes arrive as multipart uploads.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/health/", get(health::health_handler))
        // Profiles
        .route("/api/create-profile/", post(profiles::handle_create_profile))
        .route("/api/get-profile/:id/", get(profiles::handle_get_profile))
        // Generation
        .route("/api/generate-email/", post(generation::handle_generate_email))
        .route(
            "/api/generate-email-enhanced/",
            post(generation::handle_generate_email_enhanced),
        )
        .route(
            "/api/generate-cover-letter-pdf/",
            post(cover_letter::handle_generate_cover_letter),
        )
        // Dispatch
        .route("/api/send-email/", post(dispatch::handle_send_email))
        .route(
            "/api/send-email-with-resume/",
            post(dispatch::handle_send_email_with_resume),
        )
        .route(
            "/api/send-email-with-resume-and-cover-letter/",
            post(dispatch::handle_send_email_with_cover_letter),
        )
        .route("/api/requests/:id/send/", post(dispatch::handle_send_request))
        .route("/api/requests/send-batch/", post(dispatch::handle_send_batch))
        // History
        .route("/api/sent-emails/", get(dispatch::handle_list_sent))
        .route("/api/sent-emails/:id/", get(dispatch::handle_get_sent))
        .route("/api/sent-emails/:id/resend/", post(dispatch::handle_resend))
        .route(
            "/api/sent-emails/resend-batch/",
            post(dispatch::handle_resend_batch),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::models::sent_email::SendStatus;
    use crate::models::request::NewGenerationRequest;
    use crate::store::RequestStore;
    use crate::testing::{sample_profile, FakeGenerator, FakeTransport, TestServices};

    fn services() -> TestServices {
        TestServices::new(FakeGenerator::failing(), FakeTransport::default())
    }

    async fn call(router: Router, request: Request<Body>) -> (StatusCode, Vec<u8>, Option<String>) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .map(|v| v.to_str().unwrap().to_string());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec(), disposition)
    }

    async fn post_json(services: &TestServices, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, bytes, _) = call(build_router(services.state()), request).await;
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn get_json(services: &TestServices, uri: &str) -> (StatusCode, Value) {
        let request = Request::get(uri).body(Body::empty()).unwrap();
        let (status, bytes, _) = call(build_router(services.state()), request).await;
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    /// Multipart profile form with a PDF resume attached.
    fn profile_upload_request() -> Request<Body> {
        let boundary = "XBOUNDARYX";
        let mut body = String::new();
        for (name, value) in [
            ("name", "Asha Rao"),
            ("location", "Pune"),
            ("phone_number", "+91 98000 00000"),
            ("primary_email", "asha@example.com"),
            ("graduation_year", "2022"),
        ] {
            body.push_str(&format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"resume_file\"; \
             filename=\"Asha Resume.pdf\"\r\nContent-Type: application/pdf\r\n\r\n%PDF-1.4 resume\r\n\
             --{boundary}--\r\n"
        ));
        Request::post("/api/create-profile/")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    /// Stores a generated email for hr@acme.test and returns its request id.
    async fn stored_request(services: &TestServices, body: &str) -> uuid::Uuid {
        let request = RequestStore::create(
            services.store.as_ref(),
            NewGenerationRequest {
                profile_id: None,
                applicant_name: Some("Asha Rao".to_string()),
                skills: Some("Rust".to_string()),
                recipient_email: "hr@acme.test".to_string(),
                company: "Acme".to_string(),
                role: "Backend Engineer".to_string(),
                job_description: None,
            },
        )
        .await
        .unwrap();
        services
            .store
            .set_generated_body(request.id, body)
            .await
            .unwrap();
        request.id
    }

    async fn post_raw(
        services: &TestServices,
        uri: &str,
        content_type: Option<&str>,
        body: &'static str,
    ) -> (StatusCode, Value) {
        let mut builder = Request::post(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let request = builder.body(Body::from(body)).unwrap();
        let (status, bytes, _) = call(build_router(services.state()), request).await;
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(&services(), "/api/health/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_unknown_profile_is_404() {
        let uri = format!("/api/get-profile/{}/", uuid::Uuid::new_v4());
        let (status, body) = get_json(&services(), &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "User profile not found");
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let services = services();
        let request = Request::post("/api/send-email/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _, _) = call(build_router(services.state()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_profile_json_upserts_by_email() {
        let services = services();
        let payload = json!({
            "name": "Asha Rao",
            "location": "Pune",
            "phone_number": "+91 98000 00000",
            "primary_email": "asha@example.com",
            "programming_languages": "Rust, Python"
        });

        let (status, first) = post_json(&services, "/api/create-profile/", payload.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["created"], true);
        assert_eq!(first["message"], "Profile created");

        let mut update = payload;
        update["location"] = json!("Bengaluru");
        update["primary_email"] = json!("ASHA@example.com");
        let (_, second) = post_json(&services, "/api/create-profile/", update).await;
        assert_eq!(second["created"], false);
        assert_eq!(second["profile_id"], first["profile_id"]);
        assert_eq!(services.store.profile_count(), 1);

        let uri = format!("/api/get-profile/{}/", first["profile_id"].as_str().unwrap());
        let (_, fetched) = get_json(&services, &uri).await;
        assert_eq!(fetched["profile"]["location"], "Bengaluru");
        assert_eq!(fetched["profile"]["programming_languages"], "Rust, Python");
        assert_eq!(fetched["profile"]["has_resume"], false);
    }

    #[tokio::test]
    async fn test_create_profile_requires_identity_fields() {
        let (status, body) = post_json(
            &services(),
            "/api/create-profile/",
            json!({"name": "Asha Rao"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["message"],
            "Missing required fields: name, location, phone_number, primary_email"
        );
    }

    #[tokio::test]
    async fn test_create_profile_multipart_stores_resume() {
        let services = services();
        let (status, bytes, _) =
            call(build_router(services.state()), profile_upload_request()).await;
        assert_eq!(status, StatusCode::OK, "{}", String::from_utf8_lossy(&bytes));
        let created: Value = serde_json::from_slice(&bytes).unwrap();

        let keys = services.blobs.keys();
        assert_eq!(keys.len(), 1);
        assert!(keys[0].ends_with("/Asha_Resume.pdf"));
        assert_eq!(
            services.blobs.content_type(&keys[0]).as_deref(),
            Some("application/pdf")
        );

        let uri = format!("/api/get-profile/{}/", created["profile_id"].as_str().unwrap());
        let (_, fetched) = get_json(&services, &uri).await;
        assert_eq!(fetched["profile"]["has_resume"], true);
        assert_eq!(fetched["profile"]["graduation_year"], 2022);
    }

    #[tokio::test]
    async fn test_generate_enhanced_degrades_when_ai_unavailable() {
        let services = services();
        let profile = sample_profile();
        services.store.insert_profile(profile.clone());

        let (status, body) = post_json(
            &services,
            "/api/generate-email-enhanced/",
            json!({
                "profile_id": profile.id,
                "hr_email": "hr@acme.test",
                "company": "Acme",
                "role": "Backend Engineer"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let text = body["email_text"].as_str().unwrap();
        for needle in ["Asha Rao", "Acme", "Backend Engineer"] {
            assert!(text.contains(needle), "missing {needle}");
        }
        assert_eq!(body["degraded"], true);
        assert_eq!(
            body["warning"],
            "AI generation failed, using enhanced template email"
        );
        assert_eq!(body["profile_id"], json!(profile.id));

        let request_id: uuid::Uuid = serde_json::from_value(body["request_id"].clone()).unwrap();
        let stored = RequestStore::get(services.store.as_ref(), request_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.generated_body.as_deref(), Some(text));
    }

    #[tokio::test]
    async fn test_generate_enhanced_validation_order() {
        let services = services();
        let (status, body) = post_json(
            &services,
            "/api/generate-email-enhanced/",
            json!({"hr_email": "hr@acme.test", "company": "Acme", "role": "Engineer"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("profile_id is required"));

        let (status, body) = post_json(
            &services,
            "/api/generate-email-enhanced/",
            json!({"profile_id": uuid::Uuid::new_v4(), "company": "Acme"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["message"],
            "Missing required fields: hr_email, company, role"
        );

        let (status, _) = post_json(
            &services,
            "/api/generate-email-enhanced/",
            json!({
                "profile_id": uuid::Uuid::new_v4(),
                "hr_email": "hr@acme.test",
                "company": "Acme",
                "role": "Engineer"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_generate_legacy_uses_generated_text() {
        let services = TestServices::new(
            FakeGenerator::replying("Subject: Hello\n\nDear Acme team"),
            FakeTransport::default(),
        );
        let (status, body) = post_json(
            &services,
            "/api/generate-email/",
            json!({
                "hr_email": "hr@acme.test",
                "company": "Acme",
                "role": "Backend Engineer",
                "name": "Ravi Kumar",
                "skills": ["Go", "Kubernetes"]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email_text"], "Subject: Hello\n\nDear Acme team");
        assert_eq!(body["degraded"], false);
        assert!(body.get("warning").is_none());
        assert!(body.get("profile_id").is_none());
        assert!(services.generator.prompts()[0].contains("Skills: Go, Kubernetes"));
    }

    #[tokio::test]
    async fn test_generate_legacy_missing_field() {
        let (status, body) = post_json(
            &services(),
            "/api/generate-email/",
            json!({"hr_email": "hr@acme.test", "company": "Acme", "role": "Engineer"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Missing required field: name");
    }

    #[tokio::test]
    async fn test_send_with_resume_when_profile_has_none() {
        let services = services();
        let profile = sample_profile();
        services.store.insert_profile(profile.clone());

        let (status, body) = post_json(
            &services,
            "/api/send-email-with-resume/",
            json!({
                "hr_email": "hr@acme.test",
                "subject": "Application",
                "body": "Dear Hiring Manager,",
                "profile_id": profile.id
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "sent");
        assert_eq!(body["resume_attached"], false);
        assert_eq!(body["attachments"], json!([]));
        let records = services.store.sent_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, SendStatus::Sent);
        assert!(!records[0].resume_attached);
    }

    #[tokio::test]
    async fn test_send_with_resume_and_cover_letter() {
        let services = services();
        let mut profile = sample_profile();
        profile.resume_key = Some("resumes/1/Asha_Rao.pdf".to_string());
        services.blobs.insert("resumes/1/Asha_Rao.pdf", b"%PDF resume".to_vec());
        services.store.insert_profile(profile.clone());

        let (status, body) = post_json(
            &services,
            "/api/send-email-with-resume-and-cover-letter/",
            json!({
                "hr_email": "hr@acme.test",
                "subject": "Application",
                "body": "Dear Hiring Manager,",
                "profile_id": profile.id,
                "company": "Acme",
                "role": "Backend Engineer",
                "company_address": "1 Market St"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["resume_attached"], true);
        assert_eq!(body["cover_letter_attached"], true);
        assert_eq!(body["attachments"], json!(["Resume", "Cover Letter"]));
        let sent = services.transport.sent();
        assert_eq!(sent[0].attachments.len(), 2);
        assert_eq!(
            sent[0].attachments[1].filename,
            "cover_letter_Asha_Rao_Acme_Backend_Engineer.pdf"
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_recorded_and_surfaced() {
        let services = TestServices::new(
            FakeGenerator::failing(),
            FakeTransport::failing_for(&["hr@acme.test"]),
        );
        let (status, body) = post_json(
            &services,
            "/api/send-email/",
            json!({"hr_email": "hr@acme.test", "subject": "Hi", "body": "Hello"}),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "TRANSPORT_ERROR");
        let records = services.store.sent_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, SendStatus::Failed);
    }

    #[tokio::test]
    async fn test_unconfigured_transport_is_500_without_record() {
        let services = TestServices::new(FakeGenerator::failing(), FakeTransport::unconfigured());
        let (status, body) = post_json(
            &services,
            "/api/send-email/",
            json!({"hr_email": "hr@acme.test", "subject": "Hi", "body": "Hello"}),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "TRANSPORT_NOT_CONFIGURED");
        assert_eq!(services.store.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_resend_and_history() {
        let services = TestServices::new(
            FakeGenerator::failing(),
            FakeTransport::failing_for(&["hr@acme.test"]),
        );
        post_json(
            &services,
            "/api/send-email/",
            json!({"hr_email": "hr@acme.test", "subject": "Hi", "body": "Hello"}),
        )
        .await;
        let record_id = services.store.sent_records()[0].id;

        services.transport.recover("hr@acme.test");
        let (status, body) =
            post_json(&services, &format!("/api/sent-emails/{record_id}/resend/"), json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["record_id"], json!(record_id));

        let (_, history) = get_json(&services, "/api/sent-emails/?limit=10").await;
        assert_eq!(history["count"], 1);
        assert_eq!(history["emails"][0]["status"], "sent");

        let (_, one) = get_json(&services, &format!("/api/sent-emails/{record_id}/")).await;
        assert_eq!(one["body"], "Hello");
    }

    #[tokio::test]
    async fn test_cover_letter_pdf_response() {
        let services = services();
        let profile = sample_profile();
        services.store.insert_profile(profile.clone());

        let request = Request::post("/api/generate-cover-letter-pdf/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({
                    "profile_id": profile.id,
                    "company": "Acme, Inc.",
                    "role": "Backend Engineer"
                })
                .to_string(),
            ))
            .unwrap();
        let (status, bytes, disposition) = call(build_router(services.state()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(
            disposition.as_deref(),
            Some("attachment; filename=\"cover_letter_Asha_Rao_Acme_Inc_Backend_Engineer.pdf\"")
        );
        assert_eq!(services.store.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_stored_request_rejects_malformed_overrides_without_sending() {
        let services = services();
        let id = stored_request(&services, "Original body").await;

        let (status, body) = post_raw(
            &services,
            &format!("/api/requests/{id}/send/"),
            Some("application/json"),
            r#"{"body": "Edited body",}"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(services.transport.sent().is_empty());
        assert_eq!(services.store.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_stored_request_without_body_sends_stored_email() {
        let services = services();
        let id = stored_request(&services, "Original body").await;

        let (status, body) =
            post_raw(&services, &format!("/api/requests/{id}/send/"), None, "").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "sent");
        let sent = services.transport.sent();
        assert_eq!(sent[0].body, "Original body");
        assert_eq!(sent[0].subject, "Application for Backend Engineer at Acme");
        assert_eq!(services.store.sent_records()[0].request_id, Some(id));
    }

    #[tokio::test]
    async fn test_stored_request_overrides_replace_body() {
        let services = services();
        let id = stored_request(&services, "Original body").await;

        let (status, _) = post_json(
            &services,
            &format!("/api/requests/{id}/send/"),
            json!({"subject": "Backend role", "body": "Edited body"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let sent = services.transport.sent();
        assert_eq!(sent[0].subject, "Backend role");
        assert_eq!(sent[0].body, "Edited body");
    }

    #[tokio::test]
    async fn test_send_with_unknown_request_id_is_404_before_sending() {
        let services = services();
        let profile = sample_profile();
        services.store.insert_profile(profile.clone());

        for (uri, extra) in [
            ("/api/send-email/", json!({})),
            ("/api/send-email-with-resume/", json!({"profile_id": profile.id})),
            (
                "/api/send-email-with-resume-and-cover-letter/",
                json!({"profile_id": profile.id, "company": "Acme", "role": "Engineer"}),
            ),
        ] {
            let mut payload = json!({
                "hr_email": "hr@acme.test",
                "subject": "Hi",
                "body": "Hello",
                "request_id": uuid::Uuid::new_v4()
            });
            for (key, value) in extra.as_object().unwrap() {
                payload[key] = value.clone();
            }
            let (status, body) = post_json(&services, uri, payload).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body["error"]["code"], "NOT_FOUND");
        }

        assert!(services.transport.sent().is_empty());
        assert_eq!(services.store.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_send_links_known_request_id() {
        let services = services();
        let id = stored_request(&services, "Original body").await;

        let (status, _) = post_json(
            &services,
            "/api/send-email/",
            json!({"hr_email": "hr@acme.test", "subject": "Hi", "body": "Hello", "request_id": id}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(services.store.sent_records()[0].request_id, Some(id));
    }

    #[tokio::test]
    async fn test_create_profile_accepts_null_skill_category() {
        let (status, body) = post_json(
            &services(),
            "/api/create-profile/",
            json!({
                "name": "Asha Rao",
                "location": "Pune",
                "phone_number": "+91 98000 00000",
                "primary_email": "asha@example.com",
                "python_frameworks": null
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["created"], true);
    }

    #[tokio::test]
    async fn test_failed_profile_save_after_upload_is_500() {
        let services = services();
        services.store.fail_profile_writes();

        let (status, _, _) =
            call(build_router(services.state()), profile_upload_request()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(services.store.profile_count(), 0);
        assert_eq!(services.blobs.keys().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_path_and_query_use_error_body() {
        let services = services();
        for uri in [
            "/api/sent-emails/not-a-uuid/",
            "/api/get-profile/42/",
            "/api/sent-emails/?limit=many",
        ] {
            let (status, body) = get_json(&services, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR", "{uri}");
        }

        let (status, body) = post_raw(&services, "/api/requests/nope/send/", None, "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}
