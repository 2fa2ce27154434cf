use axum::http::StatusCode;
use serial_test::serial;

mod common;

#[tokio::test]
#[serial]
#[ignore = "requires a running MongoDB (configure .env.test)"]
async fn ensure_today_yields_exactly_one_question_set() {
    let app = common::create_test_app().await;

    let (first_status, first) = common::send_json(&app, "POST", "/api/v1/quiz/today", None).await;
    assert!(
        first_status == StatusCode::OK || first_status == StatusCode::CREATED,
        "unexpected status {first_status}: {first}"
    );

    let (second_status, second) = common::send_json(&app, "POST", "/api/v1/quiz/today", None).await;
    assert_eq!(second_status, StatusCode::OK);

    // Both calls resolve to the same persisted row
    assert_eq!(first["_id"], second["_id"]);
    assert_eq!(second["quiz_date"], common::today());
}

#[tokio::test]
#[ignore = "requires a running MongoDB (configure .env.test)"]
async fn question_set_options_are_a_permutation() {
    let app = common::create_test_app().await;

    let (status, body) = common::send_json(
        &app,
        "GET",
        &format!("/api/v1/quiz?date={}", common::PAST_QUIZ_DATE),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {body}");

    let question = &body["questions"][0];
    let mut options: Vec<String> = question["options"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    let mut expected: Vec<String> = question["incorrect_answers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    expected.push(question["correct_answer"].as_str().unwrap().to_string());

    assert_eq!(options.len(), expected.len());
    options.sort();
    expected.sort();
    assert_eq!(options, expected);
}

#[tokio::test]
#[ignore = "requires a running MongoDB (configure .env.test)"]
async fn unknown_date_is_not_found() {
    let app = common::create_test_app().await;

    let (status, _) = common::send_json(&app, "GET", "/api/v1/quiz?date=1999-12-31", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires a running MongoDB (configure .env.test)"]
async fn malformed_date_is_a_bad_request() {
    let app = common::create_test_app().await;

    let (status, _) = common::send_json(&app, "GET", "/api/v1/quiz?date=31-12-1999", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
