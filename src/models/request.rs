use bytes::Bytes;

/// A PDF upload as received by the API, before any parsing.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub size: usize,
    pub content: Bytes,
    pub mime_type: Option<String>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            size: content.len(),
            content,
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Browsers often send `application/octet-stream`, so the declared type
    /// only decides when it is explicitly PDF; otherwise the extension or
    /// the `%PDF` magic has to agree.
    pub fn is_pdf(&self) -> bool {
        let declared_pdf = self
            .mime_type
            .as_deref()
            .map(|mt| mt.eq_ignore_ascii_case("application/pdf"))
            .unwrap_or(false);

        declared_pdf
            || self.name.to_lowercase().ends_with(".pdf")
            || self.content.starts_with(b"%PDF")
    }
}
