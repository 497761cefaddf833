use async_trait::async_trait;
use tracing::{debug, info_span, warn, Instrument};

use super::{ExtractionProvider, ExtractionRequest, ExtractionResult};
use crate::error::ExtractionError;
use crate::infrastructure::{DocumentFetcher, FetchedDocument};

/// 字体编码失败时 lopdf 输出的占位符（常见于 CID 字体）
const IDENTITY_H_PATTERN: &str = "?Identity-H Unimplemented?";

/// 文本超过该长度才检查字母数字比例
const MIN_TOTAL_CHARS: usize = 50;

/// 字母数字字符低于该百分比视为乱码
const MIN_ALPHANUMERIC_PERCENT: usize = 10;

/// PDF 文字层提取器
///
/// 依次尝试请求中的地址，返回第一份能读出文字的文档。
/// 扫描件没有文字层时返回低质量结果，由回退链决定是否转 OCR
pub struct PdfTextExtractor {
    fetcher: DocumentFetcher,
    min_text_chars: usize,
}

impl PdfTextExtractor {
    pub fn new(fetcher: DocumentFetcher, min_text_chars: usize) -> Self {
        Self {
            fetcher,
            min_text_chars,
        }
    }

    async fn read_document(&self, doc: FetchedDocument) -> Result<String, ExtractionError> {
        if doc.is_pdf() {
            let url = doc.url.clone();
            // lopdf 解析是 CPU 密集的同步操作
            return tokio::task::spawn_blocking(move || extract_text_from_pdf(&doc.bytes))
                .await
                .map_err(|e| ExtractionError::Unreadable {
                    locator: url.clone(),
                    reason: e.to_string(),
                })?
                .map_err(|reason| ExtractionError::Unreadable {
                    locator: url,
                    reason,
                });
        }

        if doc.is_text() {
            return Ok(String::from_utf8_lossy(&doc.bytes).into_owned());
        }

        Err(ExtractionError::Unreadable {
            locator: doc.url,
            reason: format!("不支持的文档类型: {:?}", doc.content_type),
        })
    }
}

#[async_trait]
impl ExtractionProvider for PdfTextExtractor {
    fn name(&self) -> &str {
        "pdf-text"
    }

    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResult, ExtractionError> {
        let span = info_span!("extraction.pdf", item_id = %request.item_id);

        async {
            let mut last_error = None;
            let mut best: Option<ExtractionResult> = None;

            for locator in request.locators() {
                let text = match self.fetcher.fetch(locator).await {
                    Ok(doc) => self.read_document(doc).await,
                    Err(e) => Err(e),
                };

                match text {
                    Ok(text) => {
                        let quality = text_quality(&text, self.min_text_chars);
                        debug!("{} 提取 {} 字符, 质量 {:.2}", locator, text.chars().count(), quality);
                        let better = best
                            .as_ref()
                            .map_or(true, |b| quality > b.quality.unwrap_or(0.0));
                        if better {
                            best = Some(ExtractionResult::new(text.trim(), Some(quality)));
                        }
                        if quality >= 1.0 {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("读取文档失败 {}: {}", locator, e);
                        last_error = Some(e);
                    }
                }
            }

            // 所有地址都失败才算错误；读到空文本是正常结果
            match (best, last_error) {
                (Some(result), _) => Ok(result),
                (None, Some(e)) => Err(e),
                (None, None) => Ok(ExtractionResult::empty()),
            }
        }
        .instrument(span)
        .await
    }
}

fn extract_text_from_pdf(bytes: &[u8]) -> Result<String, String> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| e.to_string())?;
    let mut text = String::new();

    for (page_num, _) in doc.get_pages() {
        if let Ok(page_text) = doc.extract_text(&[page_num]) {
            text.push_str(&page_text);
            text.push('\n');
        }
    }

    Ok(text)
}

/// 估计提取文本的质量
///
/// - 空文本、只有字体编码占位符、乱码：0.0
/// - 过短的文本：按长度线性给分
/// - 其他：1.0
pub fn text_quality(text: &str, min_text_chars: usize) -> f32 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    let cleaned = trimmed
        .replace(IDENTITY_H_PATTERN, "")
        .replace(['\n', ' '], "");
    if cleaned.is_empty() {
        return 0.0;
    }

    let total_chars = trimmed.chars().count();
    let alphanumeric_chars = trimmed.chars().filter(|c| c.is_alphanumeric()).count();
    if total_chars > MIN_TOTAL_CHARS
        && alphanumeric_chars * 100 < total_chars * MIN_ALPHANUMERIC_PERCENT
    {
        return 0.0;
    }

    let useful_chars = cleaned.chars().count();
    if min_text_chars == 0 || useful_chars >= min_text_chars {
        1.0
    } else {
        useful_chars as f32 / min_text_chars as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_quality_empty_and_placeholder() {
        assert_eq!(text_quality("", 20), 0.0);
        assert_eq!(text_quality("  \n ", 20), 0.0);
        assert_eq!(text_quality("?Identity-H Unimplemented?\n?Identity-H Unimplemented?", 20), 0.0);
    }

    #[test]
    fn test_text_quality_garbled() {
        let garbled = "~!@#$%^&*()_+{}|:<>?".repeat(5);
        assert_eq!(text_quality(&garbled, 20), 0.0);
    }

    #[test]
    fn test_text_quality_short_and_good() {
        assert!(text_quality("x = 2", 20) < 1.0);
        assert!(text_quality("x = 2", 20) > 0.0);
        assert_eq!(
            text_quality("Résoudre l'équation 2x + 3 = 7 dans l'ensemble des réels.", 20),
            1.0
        );
    }

    /// 生成只有一页、带文字层的 PDF
    fn one_page_pdf(line: &str) -> Vec<u8> {
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = format!("BT /F1 12 Tf 50 700 Td ({}) Tj ET", line);
        let content_id = doc.add_object(Object::Stream(Stream::new(
            dictionary! {},
            content.into_bytes(),
        )));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    const STATEMENT: &str = "Calculer la derivee de la fonction f sur R";

    #[test]
    fn test_extracts_embedded_text_layer() {
        let text = extract_text_from_pdf(&one_page_pdf(STATEMENT)).unwrap();
        assert!(text.contains(STATEMENT), "{:?}", text);
        assert_eq!(text_quality(&text, 20), 1.0);
    }

    #[tokio::test]
    async fn test_read_document_with_text_layer() {
        let fetcher = DocumentFetcher::new(std::time::Duration::from_secs(1)).unwrap();
        let extractor = PdfTextExtractor::new(fetcher, 20);
        let doc = FetchedDocument {
            url: "https://example.org/bac-2023.pdf".to_string(),
            content_type: Some("application/pdf".to_string()),
            bytes: one_page_pdf(STATEMENT),
        };

        let text = extractor.read_document(doc).await.unwrap();
        assert!(text.contains(STATEMENT), "{:?}", text);
    }

    #[test]
    fn test_invalid_pdf_bytes() {
        assert!(extract_text_from_pdf(b"%PDF-not really").is_err());
    }

    #[tokio::test]
    async fn test_no_locators_yields_empty_result() {
        let fetcher = DocumentFetcher::new(std::time::Duration::from_secs(1)).unwrap();
        let extractor = PdfTextExtractor::new(fetcher, 20);
        let request = ExtractionRequest {
            item_id: "ex-1".to_string(),
            primary_locator: None,
            secondary_locator: None,
        };

        let result = extractor.extract(&request).await.unwrap();
        assert!(result.is_empty());
    }
}
