// ==========================================
// 物流管理系统 - 导入会话（流程状态机）
// ==========================================
// 阶段: upload → parsing → (parse_error | preview) → importing → (import_error | done)
// - parse_error 回到 upload
// - import_error 回到 preview（保留已解析数据，可直接重试）
// - done 清空文件与解析数据，并通知宿主
// 并发: 解析/写入均需 &mut self，同一会话同一时刻只有一个进行中的操作
// ==========================================

use crate::config::{ImportConfigReader, ImportSettings};
use crate::domain::{ImportKind, Owner};
use crate::events::{ImportNotifier, Notification};
use crate::i18n::t_with_args;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::SourceFile;
use crate::importer::preview::ImportPreview;
use crate::importer::reconciliation_writer::{ReconciliationWriter, WriteReport};
use crate::importer::record_extractor::RecordExtractor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStage {
    Upload,
    Parsing,
    ParseError,
    Preview,
    Importing,
    ImportError,
    Done,
}

impl ImportStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStage::Upload => "upload",
            ImportStage::Parsing => "parsing",
            ImportStage::ParseError => "parse_error",
            ImportStage::Preview => "preview",
            ImportStage::Importing => "importing",
            ImportStage::ImportError => "import_error",
            ImportStage::Done => "done",
        }
    }
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// ImportSession
// ==========================================
pub struct ImportSession {
    kind: ImportKind,
    stage: ImportStage,
    file: Option<SourceFile>,
    preview: Option<ImportPreview>,
    last_error: Option<String>,
    last_report: Option<WriteReport>,
    /// 最近一次失败所处的阶段（ParseError / ImportError）
    last_failure: Option<ImportStage>,

    writer: ReconciliationWriter,
    notifier: Arc<dyn ImportNotifier>,
    config: Arc<dyn ImportConfigReader>,
}

impl ImportSession {
    pub fn new(writer: ReconciliationWriter, notifier: Arc<dyn ImportNotifier>) -> Self {
        Self {
            kind: ImportKind::Collections,
            stage: ImportStage::Upload,
            file: None,
            preview: None,
            last_error: None,
            last_report: None,
            last_failure: None,
            writer,
            notifier,
            config: Arc::new(ImportSettings::default()),
        }
    }

    /// 使用指定配置来源（如 ConfigManager）
    pub fn with_config(mut self, config: Arc<dyn ImportConfigReader>) -> Self {
        self.config = config;
        self
    }

    // ===== 查询 =====

    pub fn kind(&self) -> ImportKind {
        self.kind
    }

    pub fn stage(&self) -> ImportStage {
        self.stage
    }

    pub fn file(&self) -> Option<&SourceFile> {
        self.file.as_ref()
    }

    pub fn preview(&self) -> Option<&ImportPreview> {
        self.preview.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_failure(&self) -> Option<ImportStage> {
        self.last_failure
    }

    pub fn last_report(&self) -> Option<&WriteReport> {
        self.last_report.as_ref()
    }

    // ===== 文件获取 =====

    /// 切换导入种类：丢弃已选文件与解析数据
    pub fn select_kind(&mut self, kind: ImportKind) {
        if kind == self.kind && self.stage != ImportStage::Done {
            return;
        }
        self.kind = kind;
        self.clear_transient();
        self.transition(ImportStage::Upload);
    }

    /// 选择文件：丢弃上一次的解析数据与错误
    pub fn select_file(&mut self, file: SourceFile) {
        self.clear_transient();
        self.file = Some(file);
        self.transition(ImportStage::Upload);
    }

    pub fn reset(&mut self) {
        self.clear_transient();
        self.last_report = None;
        self.transition(ImportStage::Upload);
    }

    // ===== 解析 =====

    /// 解析已选文件，成功后进入预览
    pub async fn parse(&mut self) -> ImportResult<&ImportPreview> {
        let file = match (&self.file, self.stage) {
            (Some(file), ImportStage::Upload | ImportStage::Preview) => file.clone(),
            (None, _) => {
                return Err(ImportError::InvalidSessionState("尚未选择文件".to_string()));
            }
            (_, stage) => {
                return Err(ImportError::InvalidSessionState(format!(
                    "当前阶段不能解析: {}",
                    stage
                )));
            }
        };

        self.preview = None;
        self.last_error = None;
        self.transition(ImportStage::Parsing);

        match self.extract(file).await {
            Ok(preview) => {
                for warning in &preview.warnings {
                    self.notifier.notify(Notification::warning(warning.message.clone()));
                }
                info!(kind = %self.kind, summary = %preview.summary(), "解析完成，等待确认");
                self.last_failure = None;
                self.transition(ImportStage::Preview);
                Ok(self.preview.insert(preview))
            }
            Err(e) => {
                self.fail(ImportStage::ParseError, ImportStage::Upload, &e);
                Err(e)
            }
        }
    }

    async fn extract(&self, file: SourceFile) -> ImportResult<ImportPreview> {
        let settings = ImportSettings::load(self.config.as_ref())
            .await
            .map_err(|e| ImportError::ConfigReadError {
                key: "import.*".to_string(),
                message: e.to_string(),
            })?;
        let kind = self.kind;

        tokio::task::spawn_blocking(move || RecordExtractor::new(&settings).extract(kind, &file))
            .await
            .map_err(|e| ImportError::Other(anyhow::anyhow!("解析任务异常终止: {}", e)))?
    }

    // ===== 写入 =====

    /// 将预览中的记录写入存储
    pub async fn import(&mut self, owner: Option<&Owner>) -> ImportResult<WriteReport> {
        let batch = match (&self.preview, self.stage) {
            (Some(preview), ImportStage::Preview) => preview.batch.clone(),
            (_, stage) => {
                return Err(ImportError::InvalidSessionState(format!(
                    "当前阶段不能导入: {}",
                    stage
                )));
            }
        };
        let file_name = self.file.as_ref().map(|f| f.name.clone());

        self.last_error = None;
        self.transition(ImportStage::Importing);

        match self.writer.write(owner, batch, file_name.as_deref()).await {
            Ok(report) => {
                self.notifier.notify(Notification::success(t_with_args(
                    "import.success",
                    &[
                        ("count", report.submitted.to_string().as_str()),
                        ("kind", report.kind.as_str()),
                    ],
                )));

                self.clear_transient();
                self.last_report = Some(report.clone());
                self.transition(ImportStage::Done);
                self.notifier.on_import_completed(report.kind, report.submitted);

                info!(kind = %report.kind, submitted = report.submitted, "导入会话完成");
                Ok(report)
            }
            Err(e) => {
                self.fail(ImportStage::ImportError, ImportStage::Preview, &e);
                Err(e)
            }
        }
    }

    // ===== 内部 =====

    fn clear_transient(&mut self) {
        self.file = None;
        self.preview = None;
        self.last_error = None;
        self.last_failure = None;
    }

    /// 失败阶段只短暂经过，随即回到可重试的阶段
    fn fail(&mut self, failed: ImportStage, retry: ImportStage, error: &ImportError) {
        let message = error.user_message();
        warn!(kind = %self.kind, stage = %failed, error = %error, "导入流程失败");

        self.transition(failed);
        self.last_failure = Some(failed);
        self.last_error = Some(message.clone());
        self.notifier.notify(Notification::error(message));
        self.transition(retry);
    }

    fn transition(&mut self, to: ImportStage) {
        if self.stage != to {
            debug!(kind = %self.kind, from = %self.stage, to = %to, "导入阶段切换");
        }
        self.stage = to;
    }
}
