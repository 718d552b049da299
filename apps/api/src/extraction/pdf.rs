// PDF text extraction. Pages are walked in page order and a page that fails
// to yield text contributes nothing; only an unparseable stream is fatal.

use lopdf::Document;
use tracing::debug;

use super::ExtractError;

pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let document = Document::load_mem(bytes).map_err(|e| ExtractError::Unreadable {
        kind: "PDF",
        message: e.to_string(),
    })?;

    let pages = document.get_pages();
    let mut text = String::new();
    for page_number in pages.keys() {
        match document.extract_text(&[*page_number]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => {
                debug!("no extractable text on page {page_number}: {e}");
            }
        }
    }
    Ok(text)
}
