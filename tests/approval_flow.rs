mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{TestApp, PASSWORD};
use server_provisioning::db::models::role::Role;

fn decision(request_id: i32, status: &str, note: &str) -> serde_json::Value {
    json!({ "pengajuanId": request_id, "status": status, "catatan": note })
}

async fn approval_count(app: &TestApp, request_id: i32) -> usize {
    app.state.store.list_approvals(Some(request_id)).await.unwrap().len()
}

async fn audit_actions(app: &TestApp, request_id: i32) -> Vec<String> {
    app.state
        .store
        .list_audit(request_id)
        .await
        .unwrap()
        .into_iter()
        .map(|log| log.action)
        .collect()
}

#[tokio::test]
async fn chain_advances_then_dean_rejection_is_terminal() {
    let app = TestApp::new();
    let pemohon = app.account(Role::Requester, "pemohon@demo.com").await;
    let kalab = app.account(Role::LabHead, "kepalalab@demo.com").await;
    let wadek = app.account(Role::ViceDean, "wadek@demo.com").await;
    let dekan = app.account(Role::Dean, "dekan@demo.com").await;

    let id = app.submit_request(&pemohon).await;
    assert_eq!(app.status_of(id).await, "DIAJUKAN");

    let (status, body) = app.post("/persetujuan", &kalab.token, decision(id, "APPROVED", "ok")).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["status"], "DIPERIKSA");
    assert_eq!(body["data"]["statusSebelumnya"], "DIAJUKAN");
    assert_eq!(approval_count(&app, id).await, 1);

    let (status, _) = app.post("/persetujuan", &wadek.token, decision(id, "DISETUJUI", "lanjut")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(app.status_of(id).await, "DISETUJUI");
    assert_eq!(approval_count(&app, id).await, 2);

    let (status, body) = app
        .post("/persetujuan", &dekan.token, decision(id, "REJECTED", "insufficient budget"))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["persetujuan"]["catatan"], "insufficient budget");
    assert_eq!(app.status_of(id).await, "DITOLAK");
    assert_eq!(approval_count(&app, id).await, 3);

    let decisions = audit_actions(&app, id)
        .await
        .into_iter()
        .filter(|action| action == "PERSETUJUAN")
        .count();
    assert_eq!(decisions, 3);
}

#[tokio::test]
async fn second_decision_from_the_same_role_conflicts() {
    let app = TestApp::new();
    let pemohon = app.account(Role::Requester, "pemohon@demo.com").await;
    let kalab = app.account(Role::LabHead, "kepalalab@demo.com").await;
    let kalab2 = app.account(Role::LabHead, "kepalalab2@demo.com").await;
    let id = app.submit_request(&pemohon).await;

    let (status, _) = app.post("/persetujuan", &kalab.token, decision(id, "APPROVED", "ok")).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.post("/persetujuan", &kalab.token, decision(id, "APPROVED", "again")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    // Another user holding the same role is the same slot in the chain.
    let (status, _) = app.post("/persetujuan", &kalab2.token, decision(id, "REJECTED", "no")).await;
    assert_eq!(status, StatusCode::CONFLICT);

    assert_eq!(approval_count(&app, id).await, 1);
    assert_eq!(app.status_of(id).await, "DIPERIKSA");
}

#[tokio::test]
async fn unauthenticated_decision_has_no_side_effects() {
    let app = TestApp::new();
    let pemohon = app.account(Role::Requester, "pemohon@demo.com").await;
    let id = app.submit_request(&pemohon).await;
    let audit_before = audit_actions(&app, id).await.len();

    let (status, body) = app
        .call(Method::POST, "/persetujuan", None, Some(decision(id, "APPROVED", "ok")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = app
        .call(
            Method::POST,
            "/persetujuan",
            Some("not-a-token"),
            Some(decision(id, "APPROVED", "ok")),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(approval_count(&app, id).await, 0);
    assert_eq!(app.status_of(id).await, "DIAJUKAN");
    assert_eq!(audit_actions(&app, id).await.len(), audit_before);
}

#[tokio::test]
async fn non_approvers_cannot_decide_and_missing_requests_are_404() {
    let app = TestApp::new();
    let pemohon = app.account(Role::Requester, "pemohon@demo.com").await;
    let staf = app.account(Role::Staff, "staff@demo.com").await;
    let dekan = app.account(Role::Dean, "dekan@demo.com").await;
    let id = app.submit_request(&pemohon).await;

    let (status, _) = app.post("/persetujuan", &pemohon.token, decision(id, "APPROVED", "")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.post("/persetujuan", &staf.token, decision(id, "APPROVED", "")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.post("/persetujuan", &dekan.token, decision(999, "APPROVED", "")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .post("/persetujuan", &dekan.token, json!({ "pengajuanId": "abc", "status": "MAYBE" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn server_admin_override_skips_the_chain_and_is_audited_once() {
    let app = TestApp::new();
    let pemohon = app.account(Role::Requester, "pemohon@demo.com").await;
    let admin = app.account(Role::ServerAdmin, "admin@demo.com").await;
    let id = app.submit_request(&pemohon).await;

    let uri = format!("/pengajuan/{id}/status");
    let (status, body) = app.patch(&uri, &admin.token, json!({ "status": "DISELESAIKAN" })).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "DISELESAIKAN");

    let overrides: Vec<String> = audit_actions(&app, id)
        .await
        .into_iter()
        .filter(|action| action == "STATUS_UPDATE")
        .collect();
    assert_eq!(overrides.len(), 1);

    // DITERIMA and DITOLAK are reached through confirmation and decisions only.
    let (status, _) = app.patch(&uri, &admin.token, json!({ "status": "DITERIMA" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.patch(&uri, &pemohon.token, json!({ "status": "DIPROSES" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.status_of(id).await, "DISELESAIKAN");
}

#[tokio::test]
async fn requesters_only_see_their_own_requests() {
    let app = TestApp::new();
    let alice = app.account(Role::Requester, "alice@demo.com").await;
    let bob = app.account(Role::Requester, "bob@demo.com").await;
    let kalab = app.account(Role::LabHead, "kepalalab@demo.com").await;
    let alice_request = app.submit_request(&alice).await;
    app.submit_request(&bob).await;

    let (status, body) = app.get("/pengajuan", &alice.token).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["pemohon"]["email"], "alice@demo.com");

    let (status, body) = app.get("/pengajuan", &kalab.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let uri = format!("/pengajuan/{alice_request}");
    let (status, _) = app.get(&uri, &bob.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.get(&format!("{uri}/audit"), &bob.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.get(&uri, &alice.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["namaSistem"], "SIAKAD");
    assert_eq!(body["data"]["kebutuhanCPU"], 4);
    // Contact fields come from the owner's account when left out.
    assert_eq!(body["data"]["email"], "alice@demo.com");
    assert!(body["data"]["penerimaan"].is_null());
}

#[tokio::test]
async fn requester_edits_only_while_submitted() {
    let app = TestApp::new();
    let pemohon = app.account(Role::Requester, "pemohon@demo.com").await;
    let kalab = app.account(Role::LabHead, "kepalalab@demo.com").await;
    let id = app.submit_request(&pemohon).await;
    let uri = format!("/pengajuan/{id}");

    let (status, _) = app.patch(&uri, &pemohon.token, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.patch(&uri, &pemohon.token, json!({ "kebutuhanRAM": "16" })).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["kebutuhanRAM"], 16);

    app.post("/persetujuan", &kalab.token, decision(id, "APPROVED", "ok")).await;
    let (status, _) = app.patch(&uri, &pemohon.token, json!({ "kebutuhanRAM": 32 })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let actions = audit_actions(&app, id).await;
    assert!(actions.contains(&"PENGAJUAN".to_string()));
    assert!(actions.contains(&"PENGAJUAN_UPDATE".to_string()));
}

#[tokio::test]
async fn login_matches_role_loosely_and_rejects_mismatches() {
    let app = TestApp::new();
    app.account(Role::Dean, "dekan@demo.com").await;

    let login = |role: &str| {
        json!({ "email": "DEKAN@demo.com", "password": PASSWORD, "role": role })
    };

    let (status, body) = app.call(Method::POST, "/auth/login", None, Some(login("dekan"))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["user"]["role"], "DEKAN");
    assert!(body["data"]["user"].get("password_hash").is_none());

    let token = body["data"]["token"].as_str().unwrap().to_string();
    let (status, body) = app.get("/auth/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "DEKAN");

    let (status, body) = app.call(Method::POST, "/auth/login", None, Some(login("WADEK"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");

    let wrong_password = json!({ "email": "dekan@demo.com", "password": "nope", "role": "DEKAN" });
    let (status, _) = app.call(Method::POST, "/auth/login", None, Some(wrong_password)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn staff_registers_requesters_only() {
    let app = TestApp::new();
    let staf = app.account(Role::Staff, "staff@demo.com").await;
    let admin = app.account(Role::ServerAdmin, "admin@demo.com").await;

    let body = |email: &str, role: &str| {
        json!({ "nama": "Baru", "email": email, "password": "rahasia", "role": role })
    };

    let (status, created) = app.post("/auth/register", &staf.token, body("baru@demo.com", "PEMOHON")).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["data"]["user"]["role"], "PEMOHON");

    let (status, _) = app.post("/auth/register", &staf.token, body("dekan2@demo.com", "DEKAN")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.post("/auth/register", &admin.token, body("dekan2@demo.com", "DEKAN")).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app.post("/auth/register", &admin.token, body("baru@demo.com", "PEMOHON")).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn health_probes_answer_without_a_token() {
    let app = TestApp::new();
    let (status, _) = app.call(Method::GET, "/health/live", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app.call(Method::GET, "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}
