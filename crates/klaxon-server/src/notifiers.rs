use std::sync::Arc;

use tracing::info;

use klaxon_adapters::notify::{CallMeBotNotifier, TelegramNotifier, TwilioVoiceNotifier};
use klaxon_app::dispatcher::NotificationRoute;
use klaxon_app::retry::{RetryNotifier, RetryPolicy};
use klaxon_core::channel::Target;
use klaxon_ports::outbound::Notifier;

use crate::config::ServerConfig;

/// Routes in dispatch order: chat first, then the calls.
pub fn build_routes(config: &ServerConfig) -> Vec<NotificationRoute> {
    let mut routes = Vec::new();

    if let Some(tg) = &config.telegram {
        info!(chat_id = tg.chat_id, "telegram route enabled");
        routes.push(route(
            TelegramNotifier::new(tg.bot_token.clone()),
            config.retry,
            Target::Chat(tg.chat_id),
        ));
    }

    if let Some(tw) = &config.twilio {
        info!(to = %tw.to, "twilio voice route enabled");
        let from = tw.from.clone();
        let notifier = TwilioVoiceNotifier::new(&tw.account_sid, &tw.auth_token, from)
            .with_announcement_url(&tw.announcement_url);
        routes.push(route(notifier, config.retry, Target::Phone(tw.to.clone())));
    }

    if let Some(user) = &config.callmebot_user {
        info!(user = %user, "callmebot route enabled");
        routes.push(route(
            CallMeBotNotifier::new(),
            config.retry,
            Target::Handle(user.clone()),
        ));
    }

    routes
}

fn route<N>(notifier: N, policy: RetryPolicy, target: Target) -> NotificationRoute
where
    N: Notifier + 'static,
{
    NotificationRoute::new(Arc::new(RetryNotifier::new(notifier, policy)), target)
}
