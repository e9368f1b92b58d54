//! Custom assertions for template testing.
//!
//! Provides domain-specific assertions that make tests more readable
//! and provide better error messages.

use docfill::{Docx, FillerError};

/// Every paragraph text of a document, in scan order.
pub fn all_paragraph_texts(bytes: &[u8]) -> Vec<String> {
    let docx = Docx::from_bytes(bytes).expect("document should parse");
    let mut texts = Vec::new();
    for header in docx.headers() {
        texts.extend(header.iter().map(|p| p.text()));
    }
    texts.extend(docx.body_paragraphs().iter().map(|p| p.text()));
    for table in docx.tables() {
        for row in table {
            for cell in row {
                texts.extend(cell.iter().map(|p| p.text()));
            }
        }
    }
    for footer in docx.footers() {
        texts.extend(footer.iter().map(|p| p.text()));
    }
    texts
}

/// Asserts that `token` no longer occurs anywhere in the document.
///
/// # Panics
/// Panics if the token is still found.
pub fn assert_token_absent(bytes: &[u8], token: &str) {
    let texts = all_paragraph_texts(bytes);
    assert!(
        texts.iter().all(|t| !t.contains(token)),
        "Token '{}' should be replaced but was found in: {:?}",
        token,
        texts
    );
}

/// Asserts that some paragraph reads exactly `expected`.
///
/// # Panics
/// Panics if no paragraph matches.
pub fn assert_has_paragraph(bytes: &[u8], expected: &str) {
    let texts = all_paragraph_texts(bytes);
    assert!(
        texts.iter().any(|t| t == expected),
        "Expected a paragraph reading '{}', found: {:?}",
        expected,
        texts
    );
}

/// Asserts that `err` carries the expected stable code.
///
/// # Panics
/// Panics on a different code.
pub fn assert_code(err: &FillerError, expected: &str) {
    assert_eq!(
        err.code(),
        expected,
        "Expected error code {} but got {} ({})",
        expected,
        err.code(),
        err
    );
}
