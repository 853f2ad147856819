use crate::models::notification::Notification;

/// 用户提示的出口。弹窗可替换为任何非阻塞的展示方式，只需实现本 trait。
pub trait Notifier: Send {
    fn alert(&mut self, message: &str);
    fn navigate(&mut self, location: &str);
}

/// 按顺序记录提示，由 HTTP 层回传给前端
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Vec<Notification>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_notifications(self) -> Vec<Notification> {
        self.notifications
    }
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn alerts(&self) -> Vec<&str> {
        self.notifications
            .iter()
            .filter_map(|n| match n {
                Notification::Alert { message } => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn navigations(&self) -> Vec<&str> {
        self.notifications
            .iter()
            .filter_map(|n| match n {
                Notification::Navigate { location } => Some(location.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&mut self, message: &str) {
        tracing::info!("--- 提示: {}", message);
        self.notifications.push(Notification::Alert {
            message: message.to_string(),
        });
    }

    fn navigate(&mut self, location: &str) {
        tracing::info!("--- 跳转: {}", location);
        self.notifications.push(Notification::Navigate {
            location: location.to_string(),
        });
    }
}
