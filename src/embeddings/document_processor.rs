// Document processor: turns an uploaded file into embeddable content
// Supports images, PDF, plain text / markdown, CSV, Excel and JSON

use std::time::Instant;

use anyhow::Context;
use lopdf::Document;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use super::image_input::{inspect_image, validate_image_size};
use super::tabular::Table;
use super::EmbeddingInput;
use crate::types::{AppError, AppResult, Modality};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Image,
    Document,
    Data,
    Unknown,
}

impl FileCategory {
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "jpg" | "jpeg" | "png" | "gif" | "webp" | "bmp" => FileCategory::Image,
            "pdf" | "txt" | "md" => FileCategory::Document,
            "csv" | "xlsx" | "xls" | "json" => FileCategory::Data,
            _ => FileCategory::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Image => "image",
            FileCategory::Document => "document",
            FileCategory::Data => "data",
            FileCategory::Unknown => "unknown",
        }
    }
}

/// Result of processing one uploaded file.
#[derive(Debug, Clone)]
pub struct ProcessedFile {
    /// Text stored in the `content` column.
    pub content: String,
    pub input: EmbeddingInput,
    pub metadata: Map<String, Value>,
}

impl ProcessedFile {
    pub fn modality(&self) -> Modality {
        self.input.modality()
    }
}

pub struct DocumentProcessor {
    max_file_size: usize,
    max_image_size: usize,
}

impl DocumentProcessor {
    pub fn new(max_file_size: usize, max_image_size: usize) -> Self {
        Self {
            max_file_size,
            max_image_size,
        }
    }

    /// Lowercased extension after the last dot, or `unknown`.
    pub fn extension_of(filename: &str) -> String {
        match filename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_lowercase(),
            _ => "unknown".to_string(),
        }
    }

    pub fn process_document(&self, filename: &str, bytes: &[u8]) -> AppResult<ProcessedFile> {
        let start = Instant::now();

        if bytes.len() > self.max_file_size {
            return Err(AppError::PayloadTooLarge(format!(
                "File too large: {} bytes (max: {})",
                bytes.len(),
                self.max_file_size
            )));
        }

        let extension = Self::extension_of(filename);
        let category = FileCategory::from_extension(&extension);
        debug!(filename, extension = %extension, category = category.as_str(), "Processing file");

        let mut processed = match (category, extension.as_str()) {
            (FileCategory::Image, _) => self.process_image(filename, bytes)?,
            (FileCategory::Document, "pdf") => Self::process_pdf(bytes)?,
            (FileCategory::Data, "csv") => Self::process_table(Table::from_csv(bytes), "csv")?,
            (FileCategory::Data, "xlsx" | "xls") => {
                Self::process_table(Table::from_excel(bytes), "excel")?
            }
            (FileCategory::Data, "json") => Self::process_json(bytes)?,
            _ => Self::process_text(bytes),
        };

        if let EmbeddingInput::Text(text) = &processed.input {
            if text.trim().is_empty() {
                return Err(AppError::InvalidRequest(format!(
                    "No text content could be extracted from '{}'",
                    filename
                )));
            }
        }

        let mime_type = mime_guess::from_path(filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        processed.metadata.insert("filename".into(), json!(filename));
        processed.metadata.insert("file_size".into(), json!(bytes.len()));
        processed.metadata.insert("file_category".into(), json!(category.as_str()));
        processed.metadata.insert("file_extension".into(), json!(extension));
        processed.metadata.insert("mime_type".into(), json!(mime_type));
        processed.metadata.insert(
            "processing_time_ms".into(),
            json!(start.elapsed().as_secs_f64() * 1000.0),
        );

        Ok(processed)
    }

    fn process_image(&self, filename: &str, bytes: &[u8]) -> AppResult<ProcessedFile> {
        validate_image_size(bytes.len(), self.max_image_size)?;
        let info = inspect_image(bytes).map_err(|e| {
            AppError::InvalidRequest(format!("Image processing failed: {}", e))
        })?;

        let metadata = match serde_json::to_value(&info) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };

        Ok(ProcessedFile {
            content: format!("Image file: {}", filename),
            input: EmbeddingInput::Image(bytes.to_vec()),
            metadata,
        })
    }

    fn process_pdf(bytes: &[u8]) -> AppResult<ProcessedFile> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| AppError::InvalidRequest(format!("PDF processing failed: {}", e)))?;

        let pages = doc.get_pages();
        let mut text = String::new();
        for page_num in pages.keys() {
            match doc.extract_text(&[*page_num]) {
                Ok(page_text) if !page_text.trim().is_empty() => {
                    text.push_str(&format!("\n--- Page {} ---\n", page_num));
                    text.push_str(page_text.trim_end());
                }
                Ok(_) => {}
                Err(e) => warn!(page = page_num, "Failed to extract PDF page text: {}", e),
            }
        }

        let content = text.trim().to_string();
        let mut metadata = Map::new();
        metadata.insert("pages".into(), json!(pages.len()));
        metadata.insert("text_length".into(), json!(content.chars().count()));

        Ok(ProcessedFile {
            content: content.clone(),
            input: EmbeddingInput::Text(content),
            metadata,
        })
    }

    fn process_table(table: anyhow::Result<Table>, file_type: &str) -> AppResult<ProcessedFile> {
        let table = table.map_err(|e| {
            AppError::InvalidRequest(format!("CSV/Excel processing failed: {:#}", e))
        })?;

        let (content, metadata) = table.summarize(file_type);
        let metadata = match metadata {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        Ok(ProcessedFile {
            content: content.clone(),
            input: EmbeddingInput::Text(content),
            metadata,
        })
    }

    fn process_json(bytes: &[u8]) -> AppResult<ProcessedFile> {
        let value: Value = serde_json::from_slice(bytes)
            .context("Invalid JSON document")
            .map_err(|e| AppError::InvalidRequest(format!("JSON processing failed: {:#}", e)))?;

        let json_type = match &value {
            Value::Object(_) => "object",
            Value::Array(_) => "array",
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Bool(_) => "bool",
            Value::Null => "null",
        };

        let content = serde_json::to_string_pretty(&value)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let mut metadata = Map::new();
        metadata.insert("json_type".into(), json!(json_type));
        metadata.insert("char_count".into(), json!(content.chars().count()));

        Ok(ProcessedFile {
            content: content.clone(),
            input: EmbeddingInput::Text(content),
            metadata,
        })
    }

    fn process_text(bytes: &[u8]) -> ProcessedFile {
        let content = String::from_utf8_lossy(bytes).into_owned();

        let mut metadata = Map::new();
        metadata.insert("char_count".into(), json!(content.chars().count()));
        metadata.insert("word_count".into(), json!(content.split_whitespace().count()));
        metadata.insert("line_count".into(), json!(content.split('\n').count()));

        ProcessedFile {
            content: content.clone(),
            input: EmbeddingInput::Text(content),
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn processor() -> DocumentProcessor {
        DocumentProcessor::new(1024 * 1024, 512 * 1024)
    }

    #[test]
    fn test_extension_detection() {
        assert_eq!(DocumentProcessor::extension_of("photo.JPG"), "jpg");
        assert_eq!(DocumentProcessor::extension_of("archive.tar.gz"), "gz");
        assert_eq!(DocumentProcessor::extension_of("README"), "unknown");
        assert_eq!(DocumentProcessor::extension_of(".env"), "unknown");
    }

    #[test]
    fn test_categories() {
        assert_eq!(FileCategory::from_extension("webp"), FileCategory::Image);
        assert_eq!(FileCategory::from_extension("md"), FileCategory::Document);
        assert_eq!(FileCategory::from_extension("xlsx"), FileCategory::Data);
        assert_eq!(FileCategory::from_extension("rs"), FileCategory::Unknown);
    }

    #[test]
    fn test_text_file() {
        let processed = processor()
            .process_document("notes.txt", b"red summer dress\nblue jeans")
            .unwrap();

        assert_eq!(processed.modality(), Modality::Text);
        assert_eq!(processed.content, "red summer dress\nblue jeans");
        assert_eq!(processed.metadata["word_count"], 5);
        assert_eq!(processed.metadata["line_count"], 2);
        assert_eq!(processed.metadata["filename"], "notes.txt");
        assert_eq!(processed.metadata["file_category"], "document");
        assert_eq!(processed.metadata["mime_type"], "text/plain");
    }

    #[test]
    fn test_unknown_extension_is_read_as_text() {
        let processed = processor()
            .process_document("main.rs", b"fn main() {}")
            .unwrap();
        assert_eq!(processed.modality(), Modality::Text);
        assert_eq!(processed.metadata["file_category"], "unknown");
    }

    #[test]
    fn test_csv_file() {
        let processed = processor()
            .process_document("products.csv", b"name,price\nBoots,120\nWallet,40\n")
            .unwrap();

        assert_eq!(processed.modality(), Modality::Text);
        assert!(processed.content.contains("Columns: name, price"));
        assert_eq!(processed.metadata["file_type"], "csv");
        assert_eq!(processed.metadata["rows"], 2);
    }

    #[test]
    fn test_json_file() {
        let processed = processor()
            .process_document("item.json", br#"{"name":"Silver Watch"}"#)
            .unwrap();
        assert!(processed.content.contains("\"name\": \"Silver Watch\""));
        assert_eq!(processed.metadata["json_type"], "object");

        let err = processor()
            .process_document("broken.json", b"{not json")
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[test]
    fn test_image_file() {
        let mut png = Cursor::new(Vec::new());
        image::RgbImage::from_pixel(8, 6, image::Rgb([0, 0, 255]))
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();
        let bytes = png.into_inner();

        let processed = processor().process_document("shoe.png", &bytes).unwrap();
        assert_eq!(processed.modality(), Modality::Image);
        assert_eq!(processed.content, "Image file: shoe.png");
        assert_eq!(processed.metadata["width"], 8);
        assert_eq!(processed.metadata["height"], 6);
        assert_eq!(processed.metadata["mime_type"], "image/png");
    }

    #[test]
    fn test_corrupt_image_is_rejected() {
        let err = processor()
            .process_document("shoe.png", b"not really a png")
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[test]
    fn test_invalid_pdf_is_rejected() {
        let err = processor()
            .process_document("paper.pdf", b"this is not a pdf")
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    fn two_page_pdf() -> Vec<u8> {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in ["Red summer dress", "Leather boots"] {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 600.into()]),
                    Operation::new("Tj", vec![Object::string_literal(text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => 2,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
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

    #[test]
    fn test_pdf_pages_are_joined() {
        let processed = processor()
            .process_document("catalogue.pdf", &two_page_pdf())
            .unwrap();

        assert_eq!(processed.modality(), Modality::Text);
        assert!(processed.content.contains("--- Page 1 ---"));
        assert!(processed.content.contains("--- Page 2 ---"));
        assert!(processed.content.contains("Red summer dress"));
        assert!(processed.content.contains("Leather boots"));
        assert_eq!(processed.metadata["pages"], 2);
        assert_eq!(
            processed.metadata["text_length"],
            processed.content.chars().count()
        );
        assert_eq!(processed.metadata["mime_type"], "application/pdf");
    }

    #[test]
    fn test_excel_file() {
        let processed = processor()
            .process_document(
                "products.xlsx",
                include_bytes!("../../tests/fixtures/products.xlsx"),
            )
            .unwrap();

        assert!(processed.content.starts_with("Columns: name, price, stock"));
        assert_eq!(processed.metadata["file_type"], "excel");
        assert_eq!(processed.metadata["rows"], 2);
        assert_eq!(processed.metadata["file_category"], "data");
    }

    #[test]
    fn test_empty_csv_is_rejected() {
        let err = processor().process_document("empty.csv", b"").unwrap_err();
        match err {
            AppError::InvalidRequest(msg) => assert!(msg.contains("CSV/Excel processing failed")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_empty_text_is_rejected() {
        let err = processor()
            .process_document("empty.txt", b"   \n ")
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[test]
    fn test_file_size_limit() {
        let small = DocumentProcessor::new(4, 4);
        let err = small.process_document("big.txt", b"too many bytes").unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));
    }
}
