//! Console session state and logon documents

use serde::{Deserialize, Serialize};

/// Header carrying the session token. Header names are case-insensitive on
/// the wire; the lowercase form is what `http` accepts as a static name.
pub const SESSION_HEADER: &str = "x-api-session";

pub(crate) const SESSIONS_PATH: &str = "/sessions";
pub(crate) const THIS_SESSION_PATH: &str = "/sessions/this-session";

/// Authenticated session. An empty token means not logged on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: String,
    notif_topic: String,
    job_notif_topic: String,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }

    pub fn token(&self) -> Option<&str> {
        if self.token.is_empty() {
            None
        } else {
            Some(&self.token)
        }
    }

    pub fn topics(&self) -> NotificationTopics {
        NotificationTopics {
            object_topic: self.notif_topic.clone(),
            job_topic: self.job_notif_topic.clone(),
        }
    }

    pub(crate) fn install(&mut self, data: &LogonData) {
        self.token = data.session_id.clone();
        self.notif_topic = data.notif_topic.clone();
        self.job_notif_topic = data.job_notif_topic.clone();
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

/// JMS topics announced at logon, for callers that subscribe to notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationTopics {
    pub object_topic: String,
    pub job_topic: String,
}

#[derive(Serialize)]
pub(crate) struct LogonRequest<'a> {
    pub userid: &'a str,
    pub password: &'a str,
    #[serde(rename = "new-password", skip_serializing_if = "Option::is_none")]
    pub new_password: Option<&'a str>,
}

/// Body of a successful logon.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LogonData {
    #[serde(rename = "api-session")]
    pub session_id: String,
    #[serde(rename = "notif-topic", default)]
    pub notif_topic: String,
    #[serde(rename = "job-notif-topic", default)]
    pub job_notif_topic: String,
    #[serde(rename = "api-major-version", default)]
    pub api_major_version: Option<u32>,
    #[serde(rename = "api-minor-version", default)]
    pub api_minor_version: Option<u32>,
    #[serde(rename = "password-expires", default)]
    pub password_expires: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_unauthenticated() {
        let session = Session::default();
        assert!(!session.is_authenticated());
        assert_eq!(session.token(), None);
    }

    #[test]
    fn install_and_clear() {
        let data: LogonData = serde_json::from_str(
            r#"{"api-session":"T1","notif-topic":"obj.1","job-notif-topic":"job.1","api-major-version":4,"extra":true}"#,
        )
        .unwrap();

        let mut session = Session::default();
        session.install(&data);
        assert!(session.is_authenticated());
        assert_eq!(session.token(), Some("T1"));
        assert_eq!(session.topics().object_topic, "obj.1");
        assert_eq!(session.topics().job_topic, "job.1");

        session.clear();
        assert!(!session.is_authenticated());
        assert_eq!(session.topics(), NotificationTopics::default());
    }

    #[test]
    fn logon_request_omits_absent_new_password() {
        let body = serde_json::to_value(LogonRequest {
            userid: "admin",
            password: "pw",
            new_password: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"userid": "admin", "password": "pw"}));

        let body = serde_json::to_value(LogonRequest {
            userid: "admin",
            password: "pw",
            new_password: Some("pw2"),
        })
        .unwrap();
        assert_eq!(body["new-password"], "pw2");
    }
}
