use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Web server
    pub web_host: String,
    pub web_port: u16,

    // Notification pipeline
    pub queue_name: String,
    pub notification_page_size: usize,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if a var is present but malformed.
    pub fn from_env() -> Self {
        Self {
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: env::var("WEB_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("WEB_PORT must be a number"),
            queue_name: env::var("QUEUE_NAME")
                .unwrap_or_else(|_| "notifications_queue".to_string()),
            notification_page_size: env::var("NOTIFICATION_PAGE_SIZE")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .expect("NOTIFICATION_PAGE_SIZE must be a number"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            web_host: "0.0.0.0".to_string(),
            web_port: 3000,
            queue_name: "notifications_queue".to_string(),
            notification_page_size: 50,
        }
    }
}
