use async_trait::async_trait;
use base64::Engine;
use std::path::Path;
use tracing::{debug, warn};

use super::{ExtractionProvider, ExtractionRequest, ExtractionResult};
use crate::error::ExtractionError;
use crate::infrastructure::{DocumentFetcher, FetchedDocument, LlmClient};

const OCR_SYSTEM_MESSAGE: &str = "Tu es un moteur OCR. Tu transcris fidèlement le texte \
     des documents d'examen fournis, sans commentaire ni reformulation.";

const OCR_PROMPT: &str = "Transcris intégralement l'énoncé de l'exercice visible dans le document. \
     Conserve les formules en notation texte (ex: x^2 + 3x = 0). \
     Si aucun texte n'est lisible, réponds exactement: VIDE";

/// 模型认为没有可读文字时的回答
const EMPTY_MARKER: &str = "VIDE";

/// PDF 最多渲染的页数
const MAX_RENDERED_PAGES: u32 = 4;

const RENDER_DPI: u32 = 150;

/// 基于视觉模型的 OCR 提取器
///
/// 先下载文档：图片直接内联，PDF 用 `pdftoppm` 渲染成 PNG 后内联，
/// 再以 data URL 交给兼容 OpenAI 的视觉模型转写
pub struct VisionOcrExtractor {
    llm: LlmClient,
    fetcher: DocumentFetcher,
}

impl VisionOcrExtractor {
    pub fn new(llm: LlmClient, fetcher: DocumentFetcher) -> Self {
        Self { llm, fetcher }
    }
}

#[async_trait]
impl ExtractionProvider for VisionOcrExtractor {
    fn name(&self) -> &str {
        "vision-ocr"
    }

    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResult, ExtractionError> {
        let locators: Vec<&str> = request.locators().collect();
        if locators.is_empty() {
            debug!("题目 {} 没有文档地址，跳过 OCR", request.item_id);
            return Ok(ExtractionResult::empty());
        }

        let mut images = Vec::new();
        for locator in locators {
            let doc = self.fetcher.fetch(locator).await?;
            images.extend(to_image_urls(&doc).await?);
        }
        debug!("题目 {} 共 {} 张图片交给视觉模型", request.item_id, images.len());

        let response = self
            .llm
            .send_to_llm(OCR_PROMPT, Some(OCR_SYSTEM_MESSAGE), Some(&images))
            .await
            .map_err(ExtractionError::Vision)?;

        Ok(parse_ocr_response(&response))
    }
}

/// 把下载的文档转成视觉模型可读的 data URL
///
/// # 返回
/// 图片返回一个 URL，PDF 每页一个；其他类型返回 `Unreadable`
pub async fn to_image_urls(doc: &FetchedDocument) -> Result<Vec<String>, ExtractionError> {
    if let Some(mime) = image_mime(doc) {
        return Ok(vec![data_url(&mime, &doc.bytes)]);
    }

    if doc.is_pdf() {
        let pages = render_pdf_pages(&doc.bytes, MAX_RENDERED_PAGES, RENDER_DPI)
            .await
            .map_err(|reason| ExtractionError::Unreadable {
                locator: doc.url.clone(),
                reason,
            })?;
        if pages.is_empty() {
            return Err(ExtractionError::Unreadable {
                locator: doc.url.clone(),
                reason: "PDF 没有可渲染的页面".to_string(),
            });
        }
        return Ok(pages.iter().map(|png| data_url("image/png", png)).collect());
    }

    Err(ExtractionError::Unreadable {
        locator: doc.url.clone(),
        reason: format!(
            "视觉模型不支持的文档类型: {}",
            doc.content_type.as_deref().unwrap_or("未知")
        ),
    })
}

fn image_mime(doc: &FetchedDocument) -> Option<String> {
    let bytes = doc.bytes.as_slice();
    let sniffed = if bytes.starts_with(b"\x89PNG") {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF8") {
        Some("image/gif")
    } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    };
    if let Some(mime) = sniffed {
        return Some(mime.to_string());
    }

    doc.content_type
        .as_deref()
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim())
        .filter(|ct| ct.starts_with("image/"))
        .map(str::to_string)
}

fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// 用 poppler 的 `pdftoppm` 渲染前 `max_pages` 页为 PNG
async fn render_pdf_pages(bytes: &[u8], max_pages: u32, dpi: u32) -> Result<Vec<Vec<u8>>, String> {
    let dir = tempfile::tempdir().map_err(|e| format!("无法创建临时目录: {}", e))?;
    let pdf_path = dir.path().join("document.pdf");
    let prefix = dir.path().join("page");

    tokio::fs::write(&pdf_path, bytes)
        .await
        .map_err(|e| format!("无法写入临时 PDF: {}", e))?;

    let output = tokio::process::Command::new("pdftoppm")
        .arg("-png")
        .args(["-r", &dpi.to_string()])
        .args(["-f", "1", "-l", &max_pages.to_string()])
        .arg(&pdf_path)
        .arg(&prefix)
        .output()
        .await
        .map_err(|e| format!("无法运行 pdftoppm（需要安装 poppler-utils）: {}", e))?;

    if !output.status.success() {
        return Err(format!(
            "pdftoppm 失败: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    read_rendered_pages(dir.path()).await
}

async fn read_rendered_pages(dir: &Path) -> Result<Vec<Vec<u8>>, String> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| format!("无法读取渲染结果: {}", e))?;

    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| format!("无法读取渲染结果: {}", e))?
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("png") {
            paths.push(path);
        }
    }
    // pdftoppm 按页数补零，字典序即页序
    paths.sort();

    let mut pages = Vec::with_capacity(paths.len());
    for path in paths {
        match tokio::fs::read(&path).await {
            Ok(png) => pages.push(png),
            Err(e) => warn!("读取渲染页面失败 {}: {}", path.display(), e),
        }
    }
    Ok(pages)
}

fn parse_ocr_response(response: &str) -> ExtractionResult {
    let text = response.trim();
    if text.is_empty() || text.eq_ignore_ascii_case(EMPTY_MARKER) {
        return ExtractionResult::empty();
    }
    ExtractionResult::new(text, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn doc(url: &str, content_type: Option<&str>, bytes: &[u8]) -> FetchedDocument {
        FetchedDocument {
            url: url.to_string(),
            content_type: content_type.map(str::to_string),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_empty_marker_means_no_text() {
        assert!(parse_ocr_response("VIDE").is_empty());
        assert!(parse_ocr_response("  vide \n").is_empty());
        assert_eq!(parse_ocr_response(" Calculer 2+2 ").text, "Calculer 2+2");
    }

    #[tokio::test]
    async fn test_without_locators_skips_model() {
        let extractor = VisionOcrExtractor::new(
            LlmClient::new("k", "http://localhost:9/v1", "m"),
            DocumentFetcher::new(Duration::from_secs(1)).unwrap(),
        );
        let request = ExtractionRequest {
            item_id: "ex-1".to_string(),
            primary_locator: None,
            secondary_locator: None,
        };
        assert!(extractor.extract(&request).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_image_is_inlined_as_data_url() {
        let png = doc(
            "https://example.org/ex1.png",
            Some("application/octet-stream"),
            b"\x89PNG\r\n\x1a\nrest",
        );
        let urls = to_image_urls(&png).await.unwrap();
        assert_eq!(urls.len(), 1);
        assert!(urls[0].starts_with("data:image/png;base64,"));

        let jpeg = doc("https://example.org/ex1", Some("image/jpeg; q=0.9"), b"abc");
        assert_eq!(
            to_image_urls(&jpeg).await.unwrap(),
            vec!["data:image/jpeg;base64,YWJj".to_string()]
        );
    }

    #[tokio::test]
    async fn test_pdf_url_is_never_sent_as_image() {
        let pdf = doc(
            "https://example.org/bac-2023.pdf",
            Some("application/pdf"),
            b"%PDF-1.7\nnot really a pdf",
        );
        // 未安装 poppler 或渲染失败时返回 Unreadable
        match to_image_urls(&pdf).await {
            Ok(urls) => {
                assert!(!urls.is_empty());
                assert!(urls.iter().all(|u| u.starts_with("data:image/png;base64,")));
            }
            Err(e) => assert!(matches!(e, ExtractionError::Unreadable { .. })),
        }
    }

    #[tokio::test]
    async fn test_unsupported_document_is_unreadable() {
        let html = doc("https://example.org/ex1.html", Some("text/html"), b"<html>");
        assert!(matches!(
            to_image_urls(&html).await,
            Err(ExtractionError::Unreadable { .. })
        ));
    }
}
