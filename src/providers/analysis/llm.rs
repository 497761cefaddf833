//! 基于 LLM 的内容分析
//!
//! 把题目文本和可选主题交给模型，要求返回 JSON，再在本地校验

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::future::Future;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::{AnalysisProvider, AnalysisRequest, AnalysisResult, MAX_DIFFICULTY, MIN_DIFFICULTY};
use crate::error::AnalysisError;
use crate::infrastructure::LlmClient;
use crate::utils::logging::truncate_text;

const SYSTEM_MESSAGE: &str = "Tu es un professeur expérimenté qui indexe des exercices d'examen. \
     Tu réponds uniquement avec un objet JSON valide, sans texte autour.";

/// 发送给模型的题目文本上限（字符）
const MAX_TEXT_CHARS: usize = 12_000;

const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// LLM 分析器
pub struct LlmAnalyzer {
    llm: LlmClient,
    max_retries: usize,
}

impl LlmAnalyzer {
    pub fn new(llm: LlmClient, max_retries: usize) -> Self {
        Self {
            llm,
            max_retries,
        }
    }

    fn build_prompt(&self, request: &AnalysisRequest<'_>) -> String {
        let labels: Vec<JsonValue> = request
            .available_labels
            .iter()
            .map(|entry| {
                let mut label = serde_json::json!({ "id": entry.id, "label": entry.label });
                if let Some(description) = &entry.description {
                    label["description"] = serde_json::json!(description);
                }
                label
            })
            .collect();
        let labels_json = serde_json::to_string_pretty(&labels).unwrap_or_default();

        format!(
            r#"Analyse l'exercice ci-dessous et renvoie un objet JSON avec exactement ces clés :
- "title" : titre court de l'exercice (chaîne)
- "summary" : résumé en une ou deux phrases (chaîne)
- "keywords" : liste de 3 à 8 mots-clés (liste de chaînes)
- "estimated_duration" : durée estimée pour un élève, en minutes (entier >= 0)
- "estimated_difficulty" : difficulté de {min} (facile) à {max} (très difficile) (entier)
- "theme_ids" : identifiants des thèmes correspondants, choisis UNIQUEMENT dans la liste fournie (liste de chaînes, éventuellement vide)

Thèmes disponibles :
{labels}

Exercice :
"""
{text}
""""#,
            min = MIN_DIFFICULTY,
            max = MAX_DIFFICULTY,
            labels = labels_json,
            text = truncate_text(request.text, MAX_TEXT_CHARS),
        )
    }
}

#[async_trait]
impl AnalysisProvider for LlmAnalyzer {
    fn name(&self) -> &str {
        "llm"
    }

    async fn analyze(&self, request: &AnalysisRequest<'_>) -> Result<AnalysisResult, AnalysisError> {
        if request.text.trim().is_empty() {
            debug!("题目 {} 文本为空，返回降级结果", request.item_id);
            return Ok(AnalysisResult::degraded());
        }

        let prompt = self.build_prompt(request);
        let (llm, prompt) = (&self.llm, prompt.as_str());
        with_retries(request.item_id, self.max_retries, RETRY_BACKOFF, move |_| async move {
            let response = llm.send_to_llm(prompt, Some(SYSTEM_MESSAGE), None).await?;
            parse_analysis(&response)
        })
        .await
    }
}

/// 首次尝试之后最多重试 `max_retries` 次，第 n 次失败后等待 `backoff * n`
///
/// # 返回
/// 第一次成功的结果，或最后一次尝试的错误
async fn with_retries<T, F, Fut>(
    item_id: &str,
    max_retries: usize,
    backoff: Duration,
    mut op: F,
) -> Result<T, AnalysisError>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, AnalysisError>>,
{
    let total_attempts = max_retries + 1;
    let mut attempt = 0;

    loop {
        attempt += 1;
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < total_attempts => {
                warn!(
                    "题目 {} 分析失败 (尝试 {}/{}): {}",
                    item_id, attempt, total_attempts, e
                );
                sleep(backoff * attempt as u32).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// 模型返回的原始 JSON
#[derive(Debug, Deserialize)]
struct RawAnalysis {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    keywords: Vec<JsonValue>,
    #[serde(default)]
    estimated_duration: Option<JsonValue>,
    #[serde(default)]
    estimated_difficulty: Option<JsonValue>,
    #[serde(default)]
    theme_ids: Vec<JsonValue>,
}

fn json_object_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"))
}

/// 解析模型的回答
///
/// 容忍 ```json 代码块和前后多余文字，取第一个 `{` 到最后一个 `}`
pub fn parse_analysis(response: &str) -> Result<AnalysisResult, AnalysisError> {
    let json = json_object_regex()
        .find(response)
        .map(|m| m.as_str())
        .ok_or_else(|| AnalysisError::Malformed {
            reason: format!("回答中没有 JSON 对象: {}", truncate_text(response, 80)),
        })?;

    let raw: RawAnalysis = serde_json::from_str(json).map_err(|e| AnalysisError::Malformed {
        reason: e.to_string(),
    })?;

    let estimated_duration = match raw.estimated_duration.as_ref().and_then(as_integer) {
        Some(value) if value < 0 || value > i64::from(u32::MAX) => {
            return Err(AnalysisError::OutOfRange {
                field: "estimated_duration",
                value,
            })
        }
        Some(value) => Some(value as u32),
        None => None,
    };

    let estimated_difficulty = match raw.estimated_difficulty.as_ref().and_then(as_integer) {
        Some(value) if value < i64::from(MIN_DIFFICULTY) || value > i64::from(MAX_DIFFICULTY) => {
            return Err(AnalysisError::OutOfRange {
                field: "estimated_difficulty",
                value,
            })
        }
        Some(value) => Some(value as u8),
        None => None,
    };

    let result = AnalysisResult {
        title: non_empty(raw.title),
        summary: non_empty(raw.summary),
        keywords: normalize_keywords(&raw.keywords),
        estimated_duration,
        estimated_difficulty,
        theme_ids: raw.theme_ids.iter().filter_map(as_id).collect(),
    };
    result.validate()?;
    Ok(result)
}

fn as_integer(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_id(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// 去掉空白关键词，忽略大小写去重，保留首次出现的顺序
fn normalize_keywords(raw: &[JsonValue]) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.iter()
        .filter_map(|v| v.as_str())
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .filter(|k| seen.insert(k.to_lowercase()))
        .map(str::to_string)
        .collect()
}
