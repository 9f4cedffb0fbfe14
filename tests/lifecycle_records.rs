mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;
use server_provisioning::db::models::role::Role;

#[tokio::test]
async fn hand_over_then_requester_confirms() {
    let app = TestApp::new();
    let pemohon = app.account(Role::Requester, "pemohon@demo.com").await;
    let admin = app.account(Role::ServerAdmin, "admin@demo.com").await;
    let id = app.submit_request(&pemohon).await;
    let base = format!("/pengajuan/{id}");

    let (status, body) = app
        .post(
            &format!("{base}/tindak-lanjut"),
            &admin.token,
            json!({ "deskripsi": "Instalasi VM", "tanggalMulai": "2025-04-01" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(app.status_of(id).await, "DIPROSES");

    // Not handed over yet.
    let confirm = json!({ "status": "Sesuai", "catatan": "Terima kasih" });
    let (status, body) = app.post(&format!("{base}/konfirmasi"), &pemohon.token, confirm.clone()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Pengajuan belum diserahkan.");

    let acceptance = json!({ "cpu": 4, "ram": "8", "storage": 100, "sistemOperasi": "Ubuntu 22.04" });
    let (status, body) = app.post(&format!("{base}/penerimaan"), &admin.token, acceptance.clone()).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["ram"], 8);
    assert_eq!(app.status_of(id).await, "DISELESAIKAN");

    let (status, _) = app.post(&format!("{base}/penerimaan"), &admin.token, acceptance).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app.post(&format!("{base}/konfirmasi"), &pemohon.token, confirm).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["userId"], pemohon.user.id);
    assert_eq!(app.status_of(id).await, "DITERIMA");

    let (status, body) = app.get(&format!("{base}/audit"), &pemohon.token).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries[0]["action"], "KONFIRMASI");
    assert_eq!(entries[0]["detail"], "Status: Sesuai | Catatan: Terima kasih");
    assert_eq!(entries[0]["user"]["email"], "pemohon@demo.com");
    let penerimaan = entries.iter().find(|e| e["action"] == "PENERIMAAN").unwrap();
    assert_eq!(penerimaan["detail"], "CPU: 4 | RAM: 8 | Storage: 100 | OS: Ubuntu 22.04");

    let (status, body) = app.get(&base, &pemohon.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tindakLanjut"]["deskripsi"], "Instalasi VM");
    assert_eq!(body["data"]["konfirmasi"]["status"], "Sesuai");
}

#[tokio::test]
async fn sub_records_enforce_roles_ownership_and_existence() {
    let app = TestApp::new();
    let owner = app.account(Role::Requester, "owner@demo.com").await;
    let other = app.account(Role::Requester, "other@demo.com").await;
    let admin = app.account(Role::ServerAdmin, "admin@demo.com").await;
    let id = app.submit_request(&owner).await;

    let monitoring = json!({ "ipAddress": "10.0.0.7", "statusMonitoring": "UP" });
    let (status, _) = app.post(&format!("/pengajuan/{id}/monitoring"), &owner.token, monitoring.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.post("/pengajuan/999/monitoring", &admin.token, monitoring.clone()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.post(&format!("/pengajuan/{id}/monitoring"), &admin.token, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.post(&format!("/pengajuan/{id}/monitoring"), &admin.token, monitoring).await;
    assert_eq!(status, StatusCode::CREATED);
    // Monitoring does not move the request.
    assert_eq!(app.status_of(id).await, "DIAJUKAN");

    let backup_uri = format!("/pengajuan/{id}/backup");
    let backup = json!({ "periodeBackup": "Harian", "tanggalTerakhir": "2025-04-02" });
    let (status, _) = app.post(&backup_uri, &other.token, backup.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = app.post(&backup_uri, &owner.token, backup).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (status, _) = app.patch(&backup_uri, &owner.token, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = app.patch(&backup_uri, &admin.token, json!({ "periodeBackup": "Mingguan" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["periodeBackup"], "Mingguan");

    let (status, _) = app.delete(&backup_uri, &admin.token).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.delete(&backup_uri, &admin.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get(&backup_uri, &owner.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let actions: Vec<String> = app
        .state
        .store
        .list_audit(id)
        .await
        .unwrap()
        .into_iter()
        .map(|log| log.action)
        .collect();
    for tag in ["MONITORING", "BACKUP", "BACKUP_UPDATE", "BACKUP_DELETE"] {
        assert!(actions.iter().any(|a| a == tag), "missing {tag} in {actions:?}");
    }
}

#[tokio::test]
async fn archive_update_requires_a_note() {
    let app = TestApp::new();
    let owner = app.account(Role::Requester, "owner@demo.com").await;
    let admin = app.account(Role::ServerAdmin, "admin@demo.com").await;
    let id = app.submit_request(&owner).await;
    let uri = format!("/pengajuan/{id}/arsip");

    let (status, _) = app.patch(&uri, &admin.token, json!({ "catatan": "x" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.post(&uri, &admin.token, json!({})).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert!(body["data"]["catatan"].is_null());

    let (status, _) = app.patch(&uri, &admin.token, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = app.patch(&uri, &admin.token, json!({ "catatan": "Selesai" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["catatan"], "Selesai");
}

#[tokio::test]
async fn deleting_a_request_removes_everything_hanging_off_it() {
    let app = TestApp::new();
    let owner = app.account(Role::Requester, "owner@demo.com").await;
    let kalab = app.account(Role::LabHead, "kepalalab@demo.com").await;
    let admin = app.account(Role::ServerAdmin, "admin@demo.com").await;
    let id = app.submit_request(&owner).await;

    app.post(
        "/persetujuan",
        &kalab.token,
        json!({ "pengajuanId": id, "status": "DISETUJUI" }),
    )
    .await;
    app.post(&format!("/pengajuan/{id}/arsip"), &admin.token, json!({ "catatan": "lama" }))
        .await;

    let (status, _) = app.delete(&format!("/pengajuan/{id}"), &owner.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.delete(&format!("/pengajuan/{id}"), &admin.token).await;
    assert_eq!(status, StatusCode::OK);

    let store = &app.state.store;
    assert!(store.find_request(id).await.unwrap().is_none());
    assert!(store.list_approvals(Some(id)).await.unwrap().is_empty());
    assert!(store.find_archive(id).await.unwrap().is_none());
    assert!(store.list_audit(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn admin_removes_a_decision_without_touching_status() {
    let app = TestApp::new();
    let owner = app.account(Role::Requester, "owner@demo.com").await;
    let kalab = app.account(Role::LabHead, "kepalalab@demo.com").await;
    let admin = app.account(Role::ServerAdmin, "admin@demo.com").await;
    let id = app.submit_request(&owner).await;

    let (_, body) = app
        .post("/persetujuan", &kalab.token, json!({ "pengajuanId": id, "status": "APPROVED" }))
        .await;
    let approval_id = body["data"]["persetujuan"]["id"].as_i64().unwrap();

    let (status, _) = app.delete(&format!("/persetujuan?id={approval_id}"), &kalab.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.delete("/persetujuan?id=abc", &admin.token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.delete(&format!("/persetujuan?id={approval_id}"), &admin.token).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(app.status_of(id).await, "DIPERIKSA");
    let (status, body) = app.get(&format!("/persetujuan?pengajuanId={id}"), &admin.token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());

    // The slot is free again once the row is gone.
    let (status, _) = app
        .post("/persetujuan", &kalab.token, json!({ "pengajuanId": id, "status": "APPROVED" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
}
