use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use forms::{
    BroadcastNotifier, FormConfig, FormController, FormEntity, FormMode, Gateway,
    NotificationKind, SubmitOutcome,
};
use shared::domain::{Period, Professor};
use storage::Storage;

#[tokio::test]
async fn period_form_persists_through_sqlite_and_rejects_duplicates() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let notifier = BroadcastNotifier::new(8);
    let mut toasts = notifier.subscribe();
    let submitted = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&submitted);
    let controller = FormController::<Period>::new(
        FormConfig::new(FormMode::Create).on_submit(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
        Arc::new(storage.clone()) as Arc<dyn Gateway<Period>>,
        Arc::new(notifier),
    );

    let fields = serde_json::from_value(serde_json::json!({
        "id": "2024-T1",
        "name": "Trimester I 2024",
        "year": "2024",
        "trimester": 1,
        "start_date": "2024-01-01",
        "end_date": "2024-04-01",
        "enrollment_start": "2023-12-15",
        "enrollment_end": "2023-12-22"
    }))
    .expect("fields");

    controller.merge_fields(fields).await.expect("fill");
    let outcome = controller.submit().await;
    assert!(outcome.is_saved(), "{outcome:?}");
    assert_eq!(submitted.load(Ordering::SeqCst), 1);

    let toast = toasts.recv().await.expect("success toast");
    assert_eq!(toast.kind, NotificationKind::Success);

    let stored = storage
        .get_period("2024-T1")
        .await
        .expect("get")
        .expect("stored");
    assert_eq!(stored.year, 2024);
    assert!(!stored.is_active);

    controller.open(FormMode::Create).await.expect("reopen");
    controller
        .merge_fields(Period::from(stored).to_fields())
        .await
        .expect("fill again");
    let duplicate = controller.submit().await;
    assert!(matches!(duplicate, SubmitOutcome::Rejected { .. }), "{duplicate:?}");
    assert!(controller.is_open());
    assert_eq!(submitted.load(Ordering::SeqCst), 1);

    let toast = toasts.recv().await.expect("error toast");
    assert_eq!(toast.kind, NotificationKind::Error);
    assert!(toast.detail.contains("2024-T1"));
}

#[tokio::test]
async fn professor_edit_form_updates_the_stored_row() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let gateway: Arc<dyn Gateway<Professor>> = Arc::new(storage.clone());

    let create = FormController::<Professor>::new(
        FormConfig::new(FormMode::Create),
        Arc::clone(&gateway),
        Arc::new(forms::TracingNotifier),
    );
    for (name, value) in [
        ("national_id", "V-12345678"),
        ("first_name", "Ana"),
        ("last_name", "Pérez"),
        ("email", "ana.perez@example.edu"),
        ("hire_date", "2015-09-01"),
    ] {
        create.set_field(name, value).await.expect("set field");
    }
    let SubmitOutcome::Saved { entity, .. } = create.submit().await else {
        panic!("professor should save");
    };

    let edit = FormController::<Professor>::new(
        FormConfig::new(FormMode::Edit(entity)),
        gateway,
        Arc::new(forms::TracingNotifier),
    );
    edit.set_field("status", "leave").await.expect("set status");
    assert!(edit.submit().await.is_saved());

    let stored = storage
        .get_professor("V-12345678")
        .await
        .expect("get")
        .expect("stored");
    assert_eq!(stored.status.as_token(), "leave");
    assert_eq!(storage.list_professors().await.expect("list").len(), 1);
}
