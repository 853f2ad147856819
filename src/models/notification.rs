use serde::Serialize;

/// 面向用户的提示，前端据此弹窗或跳转
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Notification {
    Alert { message: String },
    Navigate { location: String },
}

/// 输入框旁边的行内错误提示
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorElement {
    pub text: String,
    pub visible: bool,
}

impl ErrorElement {
    pub fn show(&mut self, message: &str) {
        self.text = message.to_string();
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.text.clear();
    }
}
