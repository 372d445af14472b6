//! Toast notifications.
//!
//! A toast expires after its duration; a zero duration keeps it until it is
//! dismissed. Expiry is driven by explicit instants so any event loop can
//! poll the queue.
//!
//! Confirmation toasts carry confirm and cancel buttons. They are sticky,
//! cannot be dismissed, and leave the queue only through
//! [`ToastQueue::answer`].

use std::time::Duration;

use rbac_api::ApiError;
use tokio::time::Instant;

/// How long a toast stays up unless configured otherwise.
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_secs(5);

/// Error toasts stay up longer than the rest.
pub const DEFAULT_ERROR_TOAST_DURATION: Duration = Duration::from_secs(7);

/// Type of toast notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastType {
    Success,
    Info,
    Warning,
    Error,
}

impl ToastType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Button labels of a confirmation toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub confirm_label: String,
    pub cancel_label: String,
}

impl Confirmation {
    pub fn new(confirm_label: impl Into<String>, cancel_label: impl Into<String>) -> Self {
        Self {
            confirm_label: confirm_label.into(),
            cancel_label: cancel_label.into(),
        }
    }
}

impl Default for Confirmation {
    fn default() -> Self {
        Self::new("Confirm", "Cancel")
    }
}

/// One notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub toast_type: ToastType,
    pub title: String,
    pub message: Option<String>,
    /// Zero means sticky.
    pub duration: Duration,
    pub shown_at: Instant,
    /// Present on confirmation toasts.
    pub confirmation: Option<Confirmation>,
}

impl Toast {
    pub fn is_sticky(&self) -> bool {
        self.duration.is_zero()
    }

    /// Confirmation toasts wait for an answer instead.
    pub fn is_dismissible(&self) -> bool {
        self.confirmation.is_none()
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        !self.is_sticky() && now >= self.shown_at + self.duration
    }
}

/// Visible toasts, oldest first.
#[derive(Debug, Clone)]
pub struct ToastQueue {
    toasts: Vec<Toast>,
    next_id: u64,
    default_duration: Duration,
    error_duration: Duration,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_DURATION)
    }
}

impl ToastQueue {
    pub fn new(default_duration: Duration) -> Self {
        Self {
            toasts: Vec::new(),
            next_id: 1,
            default_duration,
            error_duration: DEFAULT_ERROR_TOAST_DURATION,
        }
    }

    /// Duration of error toasts (zero keeps them until dismissed).
    #[must_use]
    pub fn with_error_duration(mut self, duration: Duration) -> Self {
        self.error_duration = duration;
        self
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    /// Show a toast with the default duration. Returns its id.
    pub fn push(
        &mut self,
        toast_type: ToastType,
        title: impl Into<String>,
        message: Option<String>,
        now: Instant,
    ) -> u64 {
        self.push_for(toast_type, title, message, self.default_duration, now)
    }

    /// Show a toast for `duration` (zero keeps it until dismissed).
    pub fn push_for(
        &mut self,
        toast_type: ToastType,
        title: impl Into<String>,
        message: Option<String>,
        duration: Duration,
        now: Instant,
    ) -> u64 {
        self.insert(toast_type, title.into(), message, duration, None, now)
    }

    fn insert(
        &mut self,
        toast_type: ToastType,
        title: String,
        message: Option<String>,
        duration: Duration,
        confirmation: Option<Confirmation>,
        now: Instant,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.toasts.push(Toast {
            id,
            toast_type,
            title,
            message,
            duration,
            shown_at: now,
            confirmation,
        });
        id
    }

    pub fn success(&mut self, title: impl Into<String>, now: Instant) -> u64 {
        self.push(ToastType::Success, title, None, now)
    }

    pub fn info(&mut self, title: impl Into<String>, now: Instant) -> u64 {
        self.push(ToastType::Info, title, None, now)
    }

    pub fn warning(&mut self, title: impl Into<String>, message: Option<String>, now: Instant) -> u64 {
        self.push(ToastType::Warning, title, message, now)
    }

    /// Error toast, shown for the error duration.
    pub fn error(&mut self, title: impl Into<String>, message: Option<String>, now: Instant) -> u64 {
        self.push_for(ToastType::Error, title, message, self.error_duration, now)
    }

    /// Error toast from an API failure, split into title and detail.
    pub fn error_from(&mut self, err: &ApiError, now: Instant) -> u64 {
        let summary = err.summary();
        let detail = summary
            .detail
            .or_else(|| err.suggestion().map(str::to_string));
        self.error(summary.title, detail, now)
    }

    /// Ask the user to confirm something. The toast stays until answered.
    pub fn confirm(
        &mut self,
        title: impl Into<String>,
        message: impl Into<String>,
        confirmation: Confirmation,
        now: Instant,
    ) -> u64 {
        self.insert(
            ToastType::Warning,
            title.into(),
            Some(message.into()),
            Duration::ZERO,
            Some(confirmation),
            now,
        )
    }

    /// Ask the user to confirm deleting `item_name`.
    pub fn confirm_delete(&mut self, item_name: &str, now: Instant) -> u64 {
        self.confirm(
            "Delete Confirmation",
            format!("Are you sure you want to delete \"{item_name}\"? This action cannot be undone."),
            Confirmation::new("Delete", "Cancel"),
            now,
        )
    }

    /// Answer a confirmation toast and remove it.
    ///
    /// Returns `Some(confirmed)` when `id` was a pending confirmation,
    /// `None` otherwise.
    pub fn answer(&mut self, id: u64, confirmed: bool) -> Option<bool> {
        let index = self
            .toasts
            .iter()
            .position(|toast| toast.id == id && toast.confirmation.is_some())?;
        self.toasts.remove(index);
        Some(confirmed)
    }

    /// Remove a toast. Returns whether it was visible and dismissible.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.toasts.len();
        self.toasts
            .retain(|toast| toast.id != id || !toast.is_dismissible());
        self.toasts.len() != before
    }

    /// Drop expired toasts. Returns how many were removed.
    pub fn expire(&mut self, now: Instant) -> usize {
        let before = self.toasts.len();
        self.toasts.retain(|toast| !toast.is_expired(now));
        before - self.toasts.len()
    }

    /// When the next toast expires, for hosts that schedule a wake-up.
    pub fn next_expiry(&self) -> Option<Instant> {
        self.toasts
            .iter()
            .filter(|toast| !toast.is_sticky())
            .map(|toast| toast.shown_at + toast.duration)
            .min()
    }

    pub fn clear(&mut self) {
        self.toasts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toasts_expire_after_duration() {
        let start = Instant::now();
        let mut queue = ToastQueue::default();
        queue.success("User created", start);
        queue.info("Refreshing", start + Duration::from_secs(2));

        assert_eq!(queue.expire(start + Duration::from_millis(4999)), 0);
        assert_eq!(queue.expire(start + Duration::from_secs(5)), 1);
        assert_eq!(queue.toasts()[0].title, "Refreshing");
        assert_eq!(queue.next_expiry(), Some(start + Duration::from_secs(7)));
    }

    #[test]
    fn test_zero_duration_is_sticky() {
        let start = Instant::now();
        let mut queue = ToastQueue::new(Duration::ZERO);
        let id = queue.warning("Unsaved changes", None, start);

        assert_eq!(queue.expire(start + Duration::from_secs(3600)), 0);
        assert_eq!(queue.next_expiry(), None);
        assert!(queue.dismiss(id));
        assert!(!queue.dismiss(id));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_errors_stay_longer() {
        let start = Instant::now();
        let mut queue = ToastQueue::default();
        queue.error("Save failed", None, start);
        queue.success("Saved", start);

        assert_eq!(queue.expire(start + Duration::from_secs(5)), 1);
        assert_eq!(queue.toasts()[0].title, "Save failed");
        assert_eq!(queue.next_expiry(), Some(start + Duration::from_secs(7)));
        assert_eq!(queue.expire(start + Duration::from_secs(7)), 1);

        let mut sticky_errors = ToastQueue::default().with_error_duration(Duration::ZERO);
        sticky_errors.error("Save failed", None, start);
        assert!(sticky_errors.toasts()[0].is_sticky());
    }

    #[test]
    fn test_confirm_delete_waits_for_an_answer() {
        let start = Instant::now();
        let mut queue = ToastQueue::default();
        let id = queue.confirm_delete("Alice", start);

        let toast = &queue.toasts()[0];
        assert_eq!(toast.toast_type, ToastType::Warning);
        assert_eq!(toast.title, "Delete Confirmation");
        assert_eq!(
            toast.message.as_deref(),
            Some("Are you sure you want to delete \"Alice\"? This action cannot be undone.")
        );
        assert_eq!(toast.confirmation, Some(Confirmation::new("Delete", "Cancel")));
        assert!(toast.is_sticky());

        assert!(!queue.dismiss(id));
        assert_eq!(queue.expire(start + Duration::from_secs(3600)), 0);
        assert_eq!(queue.answer(id, false), Some(false));
        assert!(queue.is_empty());
        assert_eq!(queue.answer(id, true), None);
    }

    #[test]
    fn test_answer_ignores_plain_toasts() {
        let now = Instant::now();
        let mut queue = ToastQueue::default();
        let id = queue.info("Refreshing", now);
        assert_eq!(queue.answer(id, true), None);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_error_from_splits_title_and_detail() {
        let now = Instant::now();
        let mut queue = ToastQueue::default();
        let err = ApiError::http(
            409,
            Some(serde_json::json!({"error": "Conflict: email already registered"})),
        );
        queue.error_from(&err, now);

        let toast = &queue.toasts()[0];
        assert_eq!(toast.toast_type, ToastType::Error);
        assert_eq!(toast.title, "Conflict");
        assert_eq!(toast.message.as_deref(), Some("email already registered"));
    }

    #[test]
    fn test_error_from_falls_back_to_suggestion() {
        let now = Instant::now();
        let mut queue = ToastQueue::default();
        queue.error_from(&ApiError::http(503, None), now);

        let toast = &queue.toasts()[0];
        assert_eq!(toast.message.as_deref(), ApiError::http(503, None).suggestion());
    }
}
