use super::*;

#[tokio::test]
async fn broadcast_delivers_to_every_subscriber() {
    let notifier = BroadcastNotifier::new(4);
    let mut first = notifier.subscribe();
    let mut second = notifier.subscribe();

    notifier.notify(NotificationKind::Success, "Éxito", "Período registrado correctamente");

    for rx in [&mut first, &mut second] {
        let toast = rx.recv().await.expect("toast");
        assert_eq!(toast.kind, NotificationKind::Success);
        assert_eq!(toast.detail, "Período registrado correctamente");
    }
}

#[tokio::test]
async fn zero_capacity_still_builds_a_working_channel() {
    let notifier = BroadcastNotifier::new(0);
    let mut rx = notifier.subscribe();

    notifier.notify(NotificationKind::Error, "Error", "duplicado");

    let toast = rx.recv().await.expect("toast");
    assert_eq!(toast.kind, NotificationKind::Error);
    assert_eq!(toast.title, "Error");
}

#[test]
fn notifying_without_subscribers_is_harmless() {
    let notifier = BroadcastNotifier::new(1);
    notifier.notify(NotificationKind::Success, "Éxito", "sin oyentes");
    TracingNotifier.notify(NotificationKind::Error, "Error", "sin oyentes");
}
