mod callmebot;
mod telegram;
mod twilio;

pub use callmebot::CallMeBotNotifier;
pub use telegram::TelegramNotifier;
pub use twilio::TwilioVoiceNotifier;

use klaxon_ports::error::NotifyError;

fn transport_error(e: reqwest::Error) -> NotifyError {
    // Bot tokens live in the URL path; the URL must not reach error text.
    NotifyError::Transport(e.without_url().to_string())
}

fn check_status(response: &reqwest::Response) -> Result<(), NotifyError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(NotifyError::Status(status.as_u16()))
    }
}
