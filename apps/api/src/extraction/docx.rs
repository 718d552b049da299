// DOCX text extraction: walk document -> paragraph -> run -> text nodes and
// join paragraph texts with newlines.

use docx_rs::{read_docx, DocumentChild, ParagraphChild, RunChild};

use super::ExtractError;

pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let docx = read_docx(bytes).map_err(|e| ExtractError::Unreadable {
        kind: "DOCX",
        message: e.to_string(),
    })?;

    let mut paragraphs = Vec::new();
    for child in docx.document.children {
        if let DocumentChild::Paragraph(paragraph) = child {
            let mut line = String::new();
            for paragraph_child in paragraph.children {
                if let ParagraphChild::Run(run) = paragraph_child {
                    for run_child in run.children {
                        if let RunChild::Text(text) = run_child {
                            line.push_str(&text.text);
                        }
                    }
                }
            }
            paragraphs.push(line);
        }
    }
    Ok(paragraphs.join("\n"))
}
