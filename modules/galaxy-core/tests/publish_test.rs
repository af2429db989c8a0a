use std::sync::Arc;

use galaxy_common::{Category, ClassificationRecord};
use galaxy_core::testing::MockDocumentStore;
use galaxy_core::{PublishOutcome, Publisher};

fn dev_record() -> ClassificationRecord {
    ClassificationRecord {
        section: Category::Dev,
        name: "Ripgrep".to_string(),
        desc: "Fast grep".to_string(),
        url: "https://github.com/BurntSushi/ripgrep?utm_source=tg".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn ok_then_duplicate() {
    let store = Arc::new(MockDocumentStore::with_all_markers());
    let publisher = Publisher::new(store.clone());

    assert_eq!(publisher.publish(&dev_record(), false).await, PublishOutcome::Ok);
    assert_eq!(
        publisher.publish(&dev_record(), false).await,
        PublishOutcome::Duplicate
    );
    assert_eq!(store.write_count(), 1);
    assert_eq!(
        store.commit_messages(),
        vec!["Add: Ripgrep [DEV] via GalaxyBot"]
    );
}

#[tokio::test]
async fn force_publishes_twice() {
    let store = Arc::new(MockDocumentStore::with_all_markers());
    let publisher = Publisher::new(store.clone());

    assert_eq!(publisher.publish(&dev_record(), true).await, PublishOutcome::Ok);
    assert_eq!(publisher.publish(&dev_record(), true).await, PublishOutcome::Ok);
    assert_eq!(store.content().matches("<h3 ").count(), 2);
}

#[tokio::test]
async fn card_lands_directly_above_marker_with_tracking_stripped() {
    let store = Arc::new(MockDocumentStore::with_all_markers());
    let publisher = Publisher::new(store.clone());
    publisher.publish(&dev_record(), false).await;

    let content = store.content();
    let marker = Category::Dev.marker();
    let marker_at = content.find(&marker).unwrap();
    let card_at = content.find("Ripgrep").unwrap();
    assert!(card_at < marker_at);
    assert!(content[card_at..marker_at].ends_with("</div>\n\n"));
    assert!(content.contains(r#"href="https://github.com/BurntSushi/ripgrep""#));
    assert!(!content.contains("utm_source"));
}

#[tokio::test]
async fn repeated_inserts_accumulate_in_order() {
    let store = Arc::new(MockDocumentStore::with_all_markers());
    let publisher = Publisher::new(store.clone());

    for name in ["First idea", "Second idea"] {
        let record = ClassificationRecord {
            section: Category::Ideas,
            name: name.to_string(),
            url: "#".to_string(),
            ..Default::default()
        };
        assert_eq!(publisher.publish(&record, false).await, PublishOutcome::Ok);
    }

    let content = store.content();
    let first = content.find("First idea").unwrap();
    let second = content.find("Second idea").unwrap();
    let marker = content.find(&Category::Ideas.marker()).unwrap();
    assert!(first < second && second < marker);
}

#[tokio::test]
async fn missing_marker_leaves_document_untouched() {
    let original = "<html><!-- INSERT_DEV_HERE --></html>";
    let store = Arc::new(MockDocumentStore::new(original));
    let publisher = Publisher::new(store.clone());

    let record = ClassificationRecord {
        section: Category::Osint,
        name: "Scanner".to_string(),
        url: "https://example.org/scanner".to_string(),
        ..Default::default()
    };
    assert_eq!(
        publisher.publish(&record, false).await,
        PublishOutcome::MarkerError
    );
    assert_eq!(store.content(), original);
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn read_failure_is_git_error() {
    let store = Arc::new(MockDocumentStore::with_all_markers().failing_reads());
    let publisher = Publisher::new(store);
    assert_eq!(
        publisher.publish(&dev_record(), false).await,
        PublishOutcome::GitError
    );
}

#[tokio::test]
async fn conflict_is_git_error_and_not_retried() {
    let store = Arc::new(MockDocumentStore::with_all_markers());
    let before = store.content();
    store.conflict_on_next_write();
    let publisher = Publisher::new(store.clone());

    assert_eq!(
        publisher.publish(&dev_record(), false).await,
        PublishOutcome::GitError
    );
    assert_eq!(store.write_count(), 0);
    assert_eq!(store.content(), before);
}

#[tokio::test]
async fn only_first_marker_occurrence_is_used() {
    let marker = Category::Fun.marker();
    let store = Arc::new(MockDocumentStore::new(&format!("A{marker}B{marker}C")));
    let publisher = Publisher::new(store.clone());

    let record = ClassificationRecord {
        section: Category::Fun,
        name: "Puzzle".to_string(),
        url: "#".to_string(),
        ..Default::default()
    };
    assert_eq!(publisher.publish(&record, false).await, PublishOutcome::Ok);

    let content = store.content();
    assert_eq!(content.matches("Puzzle").count(), 1);
    assert!(content.find("Puzzle").unwrap() < content.find(&marker).unwrap());
}

#[tokio::test]
async fn repost_with_trailing_slash_and_query_is_duplicate() {
    let store = Arc::new(MockDocumentStore::with_all_markers());
    let publisher = Publisher::new(store.clone());

    let first = ClassificationRecord {
        section: Category::Study,
        name: "Course notes".to_string(),
        url: "https://example.com/docs/?id=7".to_string(),
        ..Default::default()
    };
    let second = ClassificationRecord {
        name: "Lecture handouts".to_string(),
        ..first.clone()
    };
    assert_eq!(publisher.publish(&first, false).await, PublishOutcome::Ok);
    assert_eq!(publisher.publish(&second, false).await, PublishOutcome::Duplicate);
    assert_eq!(store.write_count(), 1);
}

#[tokio::test]
async fn repost_with_capitalized_host_is_duplicate() {
    let store = Arc::new(MockDocumentStore::with_all_markers());
    let publisher = Publisher::new(store.clone());

    let record = ClassificationRecord {
        section: Category::Dev,
        name: "Repo".to_string(),
        url: "https://GitHub.com/owner/repo".to_string(),
        ..Default::default()
    };
    let renamed = ClassificationRecord {
        name: "Same repo, new title".to_string(),
        ..record.clone()
    };
    assert_eq!(publisher.publish(&record, false).await, PublishOutcome::Ok);
    assert_eq!(publisher.publish(&record, false).await, PublishOutcome::Duplicate);
    assert_eq!(publisher.publish(&renamed, false).await, PublishOutcome::Duplicate);
    assert_eq!(store.write_count(), 1);
}
