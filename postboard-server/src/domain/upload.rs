use std::path::Path;

use mime::Mime;

use super::error::DomainError;

/// A file received from a multipart form.
#[derive(Debug, Clone)]
pub(crate) struct UploadedFile {
    pub(crate) file_name: String,
    pub(crate) content_type: Option<String>,
    pub(crate) bytes: Vec<u8>,
}

impl UploadedFile {
    pub(crate) fn ensure_image(&self) -> Result<(), DomainError> {
        let is_image = self
            .content_type
            .as_deref()
            .and_then(|raw| raw.parse::<Mime>().ok())
            .is_some_and(|mime| mime.type_() == mime::IMAGE);

        if !is_image {
            return Err(DomainError::InvalidUpload(
                "please upload an image file".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn ensure_size_within(&self, max_bytes: usize) -> Result<(), DomainError> {
        if self.bytes.len() > max_bytes {
            return Err(DomainError::InvalidUpload(format!(
                "please upload an image less than {max_bytes} bytes"
            )));
        }
        Ok(())
    }

    /// `photo_<post id>` plus the original extension, e.g. `photo_7.png`.
    pub(crate) fn photo_file_name(&self, post_id: i64) -> String {
        let extension = Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();

        format!("photo_{post_id}{extension}")
    }
}

#[cfg(test)]
mod tests {
    use super::UploadedFile;
    use crate::domain::error::DomainError;

    #[test]
    fn photo_file_name_keeps_original_extension() {
        assert_eq!(upload("cat.PNG", "image/png").photo_file_name(7), "photo_7.PNG");
        assert_eq!(
            upload("archive.tar.gz", "image/png").photo_file_name(7),
            "photo_7.gz"
        );
    }

    #[test]
    fn photo_file_name_without_extension() {
        assert_eq!(upload("cat", "image/png").photo_file_name(3), "photo_3");
        assert_eq!(upload(".hidden", "image/png").photo_file_name(3), "photo_3");
    }

    #[test]
    fn photo_file_name_ignores_directories_in_client_name() {
        assert_eq!(
            upload("../../etc/cat.jpg", "image/jpeg").photo_file_name(9),
            "photo_9.jpg"
        );
    }

    #[test]
    fn ensure_image_checks_mime_type() {
        assert!(upload("a.png", "image/png").ensure_image().is_ok());
        assert!(matches!(
            upload("a.pdf", "application/pdf").ensure_image(),
            Err(DomainError::InvalidUpload(_))
        ));

        let mut missing = upload("a.png", "image/png");
        missing.content_type = None;
        assert!(missing.ensure_image().is_err());
    }

    #[test]
    fn ensure_image_requires_a_full_media_type() {
        assert!(upload("a.webp", "IMAGE/webp; q=1").ensure_image().is_ok());
        assert!(upload("a.png", "image").ensure_image().is_err());
        assert!(upload("a.png", "imagery/png").ensure_image().is_err());
    }

    #[test]
    fn ensure_size_within_is_inclusive() {
        let file = upload("a.png", "image/png");
        assert!(file.ensure_size_within(4).is_ok());
        assert!(file.ensure_size_within(3).is_err());
    }

    fn upload(name: &str, content_type: &str) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            content_type: Some(content_type.to_string()),
            bytes: vec![1, 2, 3, 4],
        }
    }
}
