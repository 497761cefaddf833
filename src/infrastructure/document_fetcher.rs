//! 文档下载 - 基础设施层
//!
//! 把文档地址解析为原始字节，只在文本提取器内部使用

use std::time::Duration;
use tracing::debug;

use crate::error::ExtractionError;

/// 下载得到的文档
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub url: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FetchedDocument {
    /// 根据文件头或 Content-Type 判断是否为 PDF
    pub fn is_pdf(&self) -> bool {
        self.bytes.starts_with(b"%PDF")
            || self
                .content_type
                .as_deref()
                .is_some_and(|ct| ct.contains("application/pdf"))
    }

    pub fn is_text(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("text/"))
    }
}

/// 文档下载器
#[derive(Clone)]
pub struct DocumentFetcher {
    client: reqwest::Client,
}

impl DocumentFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchedDocument, ExtractionError> {
        debug!("下载文档: {}", url);

        let fetch_err = |source| ExtractionError::Fetch {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(fetch_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await.map_err(fetch_err)?.to_vec();
        debug!("文档下载完成: {} ({} 字节)", url, bytes.len());

        Ok(FetchedDocument {
            url: url.to_string(),
            content_type,
            bytes,
        })
    }
}
