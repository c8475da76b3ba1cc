// ==========================================
// 集成测试辅助模块
// ==========================================

#![allow(dead_code)]

pub mod failing_store;
pub mod recording_notifier;
