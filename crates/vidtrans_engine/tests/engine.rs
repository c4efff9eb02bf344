use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use vidtrans_engine::{
    ClientSettings, EngineEvent, EngineHandle, PollEvent, PollEventKind, SubmitRequest,
    SubmitSource,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn engine(server: &MockServer) -> EngineHandle {
    EngineHandle::new(ClientSettings {
        base_url: server.uri(),
        poll_interval: Duration::from_millis(20),
        ..ClientSettings::default()
    })
    .expect("engine")
}

async fn next_event(engine: &EngineHandle) -> EngineEvent {
    for _ in 0..500 {
        if let Some(event) = engine.try_recv() {
            return event;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("no engine event within 5s");
}

#[tokio::test]
async fn submit_poll_and_download_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/youtube"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"task_id": "t1"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/status/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "state": "SUCCESS",
            "result": {"status": "success", "message": "done"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/download/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"mp4".to_vec(), "video/mp4"))
        .mount(&server)
        .await;
    let engine = engine(&server);
    let out = TempDir::new().unwrap();

    engine.submit(
        1,
        SubmitRequest {
            source: SubmitSource::UrlReference("https://youtu.be/abc".into()),
            target_language: "es".into(),
        },
    );
    assert_eq!(
        next_event(&engine).await,
        EngineEvent::Submitted {
            generation: 1,
            result: Ok("t1".into())
        }
    );

    engine.start_polling(1, "t1");
    assert_eq!(
        next_event(&engine).await,
        EngineEvent::Poll(PollEvent {
            generation: 1,
            task_id: "t1".into(),
            kind: PollEventKind::Succeeded {
                artifact_id: "t1".into()
            },
        })
    );

    engine.download(1, "/api/download/t1", out.path().to_path_buf());
    match next_event(&engine).await {
        EngineEvent::Downloaded {
            generation: 1,
            result: Ok(saved),
        } => assert_eq!(std::fs::read(saved).unwrap(), b"mp4"),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn new_poll_cancels_the_previous_one() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status/old"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"state": "PROGRESS"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/status/new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "state": "FAILURE",
            "result": "bad codec"
        })))
        .mount(&server)
        .await;
    let engine = engine(&server);

    engine.start_polling(1, "old");
    let first = next_event(&engine).await;
    assert!(matches!(first, EngineEvent::Poll(PollEvent { generation: 1, .. })));

    engine.start_polling(2, "new");
    // Drain until the new task's terminal event; nothing from generation 1
    // may follow it.
    loop {
        match next_event(&engine).await {
            EngineEvent::Poll(PollEvent {
                generation: 2,
                kind,
                ..
            }) => {
                assert_eq!(
                    kind,
                    PollEventKind::Failed {
                        cause: vidtrans_engine::FailureCause::Task,
                        message: "Task failed: bad codec".into()
                    }
                );
                break;
            }
            EngineEvent::Poll(PollEvent { generation: 1, .. }) => continue,
            other => panic!("unexpected event: {other:?}"),
        }
    }

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(engine.try_recv().is_none());
}

#[tokio::test]
async fn cancel_polling_silences_the_task() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"state": "PENDING"})))
        .mount(&server)
        .await;
    let engine = engine(&server);

    engine.start_polling(1, "t1");
    let _ = next_event(&engine).await;
    engine.cancel_polling();

    tokio::time::sleep(Duration::from_millis(100)).await;
    while engine.try_recv().is_some() {}
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(engine.try_recv().is_none());
}
