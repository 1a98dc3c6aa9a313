use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use klaxon_core::events::{DomainEvent, IncidentCreated};
use klaxon_core::ids::IncidentId;

use crate::dispatcher::{incident_message, NotificationDispatcher};

/// Starts a dispatcher per created incident and cancels it on ack or close.
pub struct EventNotifierTrigger {
    events: mpsc::UnboundedReceiver<DomainEvent>,
    dispatcher: NotificationDispatcher,
    running: HashMap<IncidentId, CancellationToken>,
}

impl EventNotifierTrigger {
    pub fn new(
        events: mpsc::UnboundedReceiver<DomainEvent>,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            events,
            dispatcher,
            running: HashMap::new(),
        }
    }

    pub async fn run(mut self) {
        info!("incident event trigger started");
        while let Some(event) = self.events.recv().await {
            self.handle(event);
        }
        for (_, token) in self.running.drain() {
            token.cancel();
        }
        info!("event channel closed, trigger stopped");
    }

    fn handle(&mut self, event: DomainEvent) {
        match event {
            DomainEvent::IncidentCreated(created) => self.start(created),
            DomainEvent::IncidentAcknowledged(e) => self.stop(e.incident_id, "acknowledged"),
            DomainEvent::IncidentClosed(e) => self.stop(e.incident_id, "closed"),
            DomainEvent::AlertMerged(e) => {
                debug!(
                    incident_id = %e.incident_id,
                    alerts = e.alert_count,
                    "alert merged, no new notification"
                );
            }
        }
    }

    fn start(&mut self, created: IncidentCreated) {
        let incident_id = created.incident_id;
        info!(
            %incident_id,
            name = %created.name,
            started = %created.occurred_at,
            "incident created, starting notifications"
        );
        let token = CancellationToken::new();
        if let Some(previous) = self.running.insert(incident_id, token.clone()) {
            previous.cancel();
        }
        let dispatcher = self.dispatcher.clone();
        let message = incident_message(&created.name, &created.severity);
        tokio::spawn(async move {
            dispatcher.run(incident_id, message, token).await;
        });
    }

    fn stop(&mut self, incident_id: IncidentId, reason: &str) {
        if let Some(token) = self.running.remove(&incident_id) {
            info!(%incident_id, reason, "cancelling notifications");
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::NotificationRoute;
    use crate::registry::IncidentRegistry;
    use async_trait::async_trait;
    use chrono::Utc;
    use klaxon_core::alert::Alert;
    use klaxon_core::channel::{Channel, Target};
    use klaxon_ports::error::NotifyError;
    use klaxon_ports::outbound::Notifier;
    use klaxon_ports::types::{Notification, NotifyResult};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Default)]
    struct CountingNotifier {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        async fn notify(&self, _n: &Notification) -> Result<NotifyResult, NotifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(NotifyResult::default())
        }

        fn channel(&self) -> Channel {
            Channel::Telegram
        }
    }

    /// Registry and trigger share one event channel, as in the service.
    fn make_trigger() -> (IncidentRegistry, EventNotifierTrigger, Arc<CountingNotifier>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let registry = IncidentRegistry::new(tx);
        let notifier = Arc::new(CountingNotifier::default());
        let dispatcher = NotificationDispatcher::new(
            registry.clone(),
            vec![NotificationRoute::new(notifier.clone(), Target::Chat(1))],
            Duration::from_secs(60),
        );
        (
            registry,
            EventNotifierTrigger::new(rx, dispatcher),
            notifier,
        )
    }

    fn pump(trigger: &mut EventNotifierTrigger) {
        while let Ok(event) = trigger.events.try_recv() {
            trigger.handle(event);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn created_incident_starts_dispatcher() {
        let (registry, mut trigger, notifier) = make_trigger();
        let id = registry
            .create_new("disk-full", "critical", Utc::now())
            .await
            .unwrap();

        pump(&mut trigger);
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(trigger.running.contains_key(&id));
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);
        let snapshot = registry.snapshot().await;
        assert_eq!(
            snapshot.history[0].actions()[0].message,
            "New Incident\n Name: disk-full\n Severity: critical"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn acknowledge_cancels_dispatcher() {
        let (registry, mut trigger, notifier) = make_trigger();
        let id = registry
            .create_new("disk-full", "critical", Utc::now())
            .await
            .unwrap();
        pump(&mut trigger);
        tokio::time::sleep(Duration::from_secs(1)).await;
        let token = trigger.running[&id].clone();

        registry.acknowledge(id, Utc::now()).await.unwrap();
        pump(&mut trigger);

        assert!(token.is_cancelled());
        assert!(trigger.running.is_empty());
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn close_cancels_dispatcher() {
        let (registry, mut trigger, _notifier) = make_trigger();
        let id = registry
            .create_new("disk-full", "critical", Utc::now())
            .await
            .unwrap();
        pump(&mut trigger);
        let token = trigger.running[&id].clone();

        registry.close(id, Utc::now()).await.unwrap();
        pump(&mut trigger);

        assert!(token.is_cancelled());
        assert!(trigger.running.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn merged_alerts_start_nothing() {
        let (registry, mut trigger, notifier) = make_trigger();
        registry
            .ingest(Alert::new("disk-full", "critical"), Utc::now())
            .await
            .unwrap();
        registry
            .ingest(Alert::new("disk-full", "critical"), Utc::now())
            .await
            .unwrap();

        pump(&mut trigger);
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(trigger.running.len(), 1);
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn channel_close_cancels_everything() {
        let (tx, rx) = mpsc::unbounded_channel();
        let (other_tx, _) = mpsc::unbounded_channel();
        let dispatcher = NotificationDispatcher::new(
            IncidentRegistry::new(other_tx),
            Vec::new(),
            Duration::from_secs(60),
        );
        let mut trigger = EventNotifierTrigger::new(rx, dispatcher);
        let token = CancellationToken::new();
        trigger.running.insert(IncidentId::new(), token.clone());

        drop(tx);
        trigger.run().await;

        assert!(token.is_cancelled());
    }
}
