use base64::{engine::general_purpose::STANDARD, Engine as _};

/// One encoded still frame taken from the camera stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    mime_type: &'static str,
    bytes: Vec<u8>,
}

impl Frame {
    /// Wrap PNG-encoded bytes
    #[must_use]
    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            mime_type: "image/png",
            bytes,
        }
    }

    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Render as a `data:` URL, the form the classification service accepts
    #[must_use]
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}
