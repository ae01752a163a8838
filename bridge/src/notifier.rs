use async_trait::async_trait;
use furnace_common::{Notice, NotifierConfig};
use reqwest::Client;

use crate::{
    clients::Notifier,
    error::{BridgeError, BridgeResult},
};

/// Push-notification service taking form posts on `{api_url}/add`.
pub struct PushNotifier {
    client: Client,
    url: String,
    api_key: String,
    application: String,
}

impl PushNotifier {
    pub fn new(client: Client, config: &NotifierConfig, application: &str) -> Self {
        Self {
            client,
            url: format!("{}/add", config.api_url),
            api_key: config.api_key.clone(),
            application: application.to_string(),
        }
    }

    fn form(&self, notice: &Notice) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("apikey", self.api_key.clone()),
            ("application", self.application.clone()),
            ("event", notice.event.clone()),
            ("description", notice.description.clone()),
        ];
        if let Some(priority) = notice.priority {
            form.push(("priority", priority.to_string()));
        }
        form
    }
}

#[async_trait]
impl Notifier for PushNotifier {
    async fn push(&self, notice: &Notice) -> BridgeResult<()> {
        if self.api_key.is_empty() {
            return Err(BridgeError::Notify("no api key configured".to_string()));
        }

        self.client
            .post(&self.url)
            .form(&self.form(notice))
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map(|_| ())
            .map_err(|err| BridgeError::Notify(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use furnace_common::LOW_PRIORITY;

    #[test]
    fn form_includes_priority_only_when_set() {
        let config = NotifierConfig {
            api_url: "https://push.example".to_string(),
            api_key: "k".to_string(),
        };
        let notifier = PushNotifier::new(Client::new(), &config, "Furnace");

        let mut notice = Notice {
            event: "temp".to_string(),
            description: " *** ok 70.0 ***  rh 40.0".to_string(),
            priority: None,
        };
        let keys: Vec<&str> = notifier.form(&notice).iter().map(|(key, _)| *key).collect();
        assert_eq!(keys, vec!["apikey", "application", "event", "description"]);

        notice.priority = Some(LOW_PRIORITY);
        let form = notifier.form(&notice);
        assert_eq!(form.last(), Some(&("priority", "-2".to_string())));
        assert_eq!(notifier.url, "https://push.example/add");
    }
}
