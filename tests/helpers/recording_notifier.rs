// ==========================================
// 记录型通知接收者 - 用于集成测试
// ==========================================

use logistics_import::domain::ImportKind;
use logistics_import::events::{ImportNotifier, Notification, NotificationLevel};
use std::sync::Mutex;

#[derive(Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
    completed: Mutex<Vec<(ImportKind, usize)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn messages(&self, level: NotificationLevel) -> Vec<String> {
        self.notifications()
            .into_iter()
            .filter(|n| n.level == level)
            .map(|n| n.message)
            .collect()
    }

    pub fn completed(&self) -> Vec<(ImportKind, usize)> {
        self.completed.lock().unwrap().clone()
    }
}

impl ImportNotifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }

    fn on_import_completed(&self, kind: ImportKind, count: usize) {
        self.completed.lock().unwrap().push((kind, count));
    }
}
