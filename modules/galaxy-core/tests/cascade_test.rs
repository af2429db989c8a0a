//! Cascade behavior against scripted models: ordering, fallthrough on
//! failures and timeouts, and the heuristic last resort.

use std::sync::Arc;
use std::time::Duration;

use galaxy_common::Category;
use galaxy_core::testing::{MockChatModel, RecordingProgress};
use galaxy_core::{classify_heuristic, Cascade, CascadeOutcome, CascadeSettings};

fn settings(models: &[&str]) -> CascadeSettings {
    CascadeSettings {
        models: models.iter().map(|m| m.to_string()).collect(),
        timeout: Duration::from_millis(200),
        ..CascadeSettings::default()
    }
}

#[tokio::test]
async fn first_valid_answer_wins() {
    let model = Arc::new(
        MockChatModel::new()
            .on_answer("a", r#"{"section": "sys", "name": "Cleaner"}"#)
            .on_answer("b", r#"{"section": "dev", "name": "Other"}"#),
    );
    let cascade = Cascade::new(model.clone(), settings(&["a", "b"]));

    let outcome = cascade.attempt("Some system cleaner post", None).await;
    let CascadeOutcome::Success { record, model: used } = outcome else {
        panic!("expected success");
    };
    assert_eq!(used, "a");
    assert_eq!(record.section, Category::Sys);
    assert_eq!(model.calls(), vec!["a"]);
}

#[tokio::test]
async fn failures_and_garbage_fall_through_in_order() {
    let model = Arc::new(
        MockChatModel::new()
            .on_error("a", "503 Service Unavailable")
            .on_answer("b", "I cannot help with that.")
            .on_answer("c", "```json\n{\"section\": \"fun\", \"name\": \"Game\",}\n```"),
    );
    let cascade = Cascade::new(model.clone(), settings(&["a", "b", "c"]));

    let outcome = cascade.attempt("A fun little browser game", None).await;
    match outcome {
        CascadeOutcome::Success { record, model: used } => {
            assert_eq!(used, "c");
            assert_eq!(record.section, Category::Fun);
            assert_eq!(record.name, "Game");
        }
        CascadeOutcome::AllFailed => panic!("expected success"),
    }
    assert_eq!(model.calls(), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn timed_out_model_is_skipped() {
    let model = Arc::new(
        MockChatModel::new()
            .on_stall("slow", Duration::from_secs(30))
            .on_answer("fast", r#"{"section": "study", "name": "Slides"}"#),
    );
    let cascade = Cascade::new(model, settings(&["slow", "fast"]));

    let started = std::time::Instant::now();
    let record = cascade.classify("Tool for making slides", None).await;
    assert_eq!(record.section, Category::Study);
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn all_failed_equals_heuristic() {
    let text = "Act as a travel guide and plan my weekend in Rome.";
    let model = Arc::new(
        MockChatModel::new()
            .on_error("a", "boom")
            .on_stall("b", Duration::from_secs(30)),
    );
    let cascade = Cascade::new(model, settings(&["a", "b", "unscripted"]));

    assert_eq!(cascade.attempt(text, None).await, CascadeOutcome::AllFailed);
    assert_eq!(cascade.classify(text, None).await, classify_heuristic(text));
}

#[tokio::test]
async fn empty_model_list_goes_straight_to_heuristic() {
    let cascade = Cascade::new(Arc::new(MockChatModel::new()), settings(&[]));
    let text = "Cool repo https://github.com/owner/thing";
    assert_eq!(cascade.classify(text, None).await, classify_heuristic(text));
}

#[tokio::test]
async fn progress_line_per_attempt() {
    let model = Arc::new(
        MockChatModel::new()
            .on_error("org/first-model", "down")
            .on_answer("org/second-model", r#"{"section": "ai"}"#),
    );
    let cascade = Cascade::new(model, settings(&["org/first-model", "org/second-model"]));
    let progress = RecordingProgress::new();

    cascade.classify("AI industry news today", Some(&progress)).await;

    let lines = progress.lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("1/2") && lines[0].contains("first-model"));
    assert!(lines[1].contains("2/2") && lines[1].contains("second-model"));
}

#[tokio::test]
async fn model_without_url_gets_extracted_hint() {
    let model = Arc::new(MockChatModel::new().on_answer(
        "a",
        r#"{"section": "dev", "url": "none", "platform": "none", "alternative": "none"}"#,
    ));
    let cascade = Cascade::new(model, settings(&["a"]));

    let record = cascade
        .classify("Handy library: https://crates.io/crates/serde.", None)
        .await;
    assert_eq!(record.url, "https://crates.io/crates/serde");
    assert_eq!(record.platform, None);
    assert_eq!(record.alternative, None);
    assert_eq!(record.confidence, 100);
}
