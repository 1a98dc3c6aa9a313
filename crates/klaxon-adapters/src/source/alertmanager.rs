use std::collections::BTreeMap;

use serde::Deserialize;

use klaxon_core::alert::Alert;
use klaxon_ports::error::ParseError;
use klaxon_ports::outbound::AlertSourceParser;

pub const DEFAULT_SEVERITY: &str = "critical";

/// Normalizes a Prometheus Alertmanager webhook delivery into one alert.
pub struct AlertmanagerParser;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebhookPayload {
    #[serde(default)]
    group_labels: BTreeMap<String, String>,
    #[serde(default)]
    common_labels: BTreeMap<String, String>,
    #[serde(default)]
    alerts: Vec<WebhookAlert>,
}

#[derive(Deserialize)]
struct WebhookAlert {
    #[serde(default)]
    labels: BTreeMap<String, String>,
}

impl WebhookPayload {
    fn alert_name(&self) -> Option<&str> {
        self.group_labels
            .get("alertname")
            .or_else(|| self.common_labels.get("alertname"))
            .or_else(|| self.alerts.iter().find_map(|a| a.labels.get("alertname")))
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }
}

impl AlertSourceParser for AlertmanagerParser {
    fn parse(&self, payload: &[u8]) -> Result<Vec<Alert>, ParseError> {
        let webhook: WebhookPayload =
            serde_json::from_slice(payload).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

        let name = webhook
            .alert_name()
            .ok_or_else(|| ParseError::MissingField("alertname".into()))?;
        let severity = webhook
            .common_labels
            .get("severity")
            .map(String::as_str)
            .unwrap_or(DEFAULT_SEVERITY);

        Ok(vec![Alert::new(name, severity)])
    }

    fn source_name(&self) -> &str {
        "alertmanager"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIRING: &str = r#"{
        "receiver": "klaxon",
        "status": "firing",
        "alerts": [
            {
                "status": "firing",
                "labels": {"alertname": "disk-full", "instance": "db-01", "job": "node"},
                "annotations": {"description": "disk is 99% full"},
                "startsAt": "2025-01-15T10:00:00Z",
                "endsAt": "0001-01-01T00:00:00Z",
                "generatorURL": "http://prometheus/graph"
            }
        ],
        "groupLabels": {"alertname": "disk-full"},
        "commonLabels": {"alertname": "disk-full", "instance": "db-01", "job": "node"},
        "commonAnnotations": {"description": "disk is 99% full"},
        "externalURL": "http://alertmanager:9093",
        "version": "4",
        "groupKey": "{}:{alertname=\"disk-full\"}"
    }"#;

    #[test]
    fn parses_group_alertname_with_default_severity() {
        let alerts = AlertmanagerParser.parse(FIRING.as_bytes()).unwrap();
        assert_eq!(alerts, vec![Alert::new("disk-full", "critical")]);
    }

    #[test]
    fn common_severity_label_wins() {
        let payload = r#"{
            "groupLabels": {"alertname": "cpu-high"},
            "commonLabels": {"severity": "warning"}
        }"#;
        let alerts = AlertmanagerParser.parse(payload.as_bytes()).unwrap();
        assert_eq!(alerts, vec![Alert::new("cpu-high", "warning")]);
    }

    #[test]
    fn falls_back_to_alert_labels() {
        let payload = r#"{
            "groupLabels": {"instance": "db-01"},
            "alerts": [{"labels": {"alertname": "disk-full"}}]
        }"#;
        let alerts = AlertmanagerParser.parse(payload.as_bytes()).unwrap();
        assert_eq!(alerts[0].name, "disk-full");
    }

    #[test]
    fn missing_alertname_is_rejected() {
        let payload = r#"{"groupLabels": {}, "alerts": []}"#;
        let err = AlertmanagerParser.parse(payload.as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::MissingField(field) if field == "alertname"));
    }

    #[test]
    fn invalid_json_is_rejected() {
        let err = AlertmanagerParser.parse(b"not json").unwrap_err();
        assert!(matches!(err, ParseError::InvalidJson(_)));
    }

    #[test]
    fn source_name_is_alertmanager() {
        assert_eq!(AlertmanagerParser.source_name(), "alertmanager");
    }
}
