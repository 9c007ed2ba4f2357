pub type EmailId = String;

/// Category used whenever the classifier cannot produce one.
pub const FALLBACK_CATEGORY: &str = "Other";

/// Closed list the classifier is asked to choose from.
pub const CATEGORIES: [&str; 9] = [
    "Urgent/Action Required",
    "Information/Read Only",
    "Meeting/Appointment",
    "Personal/Social",
    "Promotions/Offers",
    "Support/Troubleshooting",
    "Project/Work Related",
    "Spam/Junk",
    FALLBACK_CATEGORY,
];

/// An unread message as fetched from the provider.
#[derive(Debug, Clone)]
pub struct Email {
    pub id: EmailId,
    pub thread_id: String,
    pub subject: String,
    pub sender: String,
    pub date: String,
    pub body: Option<String>,
    pub raw_payload: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: String,
    pub action_items: Vec<String>,
}

impl Classification {
    pub fn fallback() -> Self {
        Self {
            category: FALLBACK_CATEGORY.to_string(),
            action_items: Vec::new(),
        }
    }

    pub fn is_known_category(&self) -> bool {
        CATEGORIES.contains(&self.category.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedRecord {
    pub email_id: EmailId,
    pub subject: String,
    pub category: String,
    pub action_items: Vec<String>,
}

impl ProcessedRecord {
    pub fn new(email: &Email, classification: &Classification) -> Self {
        Self {
            email_id: email.id.clone(),
            subject: email.subject.clone(),
            category: classification.category.clone(),
            action_items: classification.action_items.clone(),
        }
    }
}
