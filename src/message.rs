//! Narrow view of a parsed email
//!
//! Link extraction only needs to know, for each body part, its content type,
//! whether it is an attachment, and its transfer-decoded bytes. These traits
//! capture exactly that so the extractor does not depend on a particular MIME
//! library; [`mailparse::ParsedMail`] is the adapter used in production.

use mailparse::{DispositionType, ParsedMail};

/// Content-Disposition of a part, reduced to what matters here
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Rendered in the message body (also the default when absent)
    Inline,
    /// Attached file
    Attachment,
    /// Any other disposition value
    Other(String),
}

/// A single MIME part
pub trait MessagePart {
    /// Lower-cased MIME type, e.g. `text/html`
    fn content_type(&self) -> &str;

    /// Content-Disposition of the part
    fn disposition(&self) -> Disposition;

    /// Payload with its Content-Transfer-Encoding undone
    ///
    /// `None` when the part has no payload of its own (multi-part
    /// containers) or the payload cannot be decoded.
    fn decoded_payload(&self) -> Option<Vec<u8>>;

    /// Whether the part is marked as an attachment
    fn is_attachment(&self) -> bool {
        self.disposition() == Disposition::Attachment
    }
}

/// A whole message
pub trait MailMessage: MessagePart {
    /// Concrete part type
    type Part: MessagePart;

    /// Whether the message is a multi-part container
    fn is_multipart(&self) -> bool;

    /// All descendant parts, depth-first, in document order
    fn parts(&self) -> Vec<&Self::Part>;
}

impl MessagePart for ParsedMail<'_> {
    fn content_type(&self) -> &str {
        &self.ctype.mimetype
    }

    fn disposition(&self) -> Disposition {
        match self.get_content_disposition().disposition {
            DispositionType::Inline => Disposition::Inline,
            DispositionType::Attachment => Disposition::Attachment,
            DispositionType::FormData => Disposition::Other("form-data".to_string()),
            DispositionType::Extension(value) => Disposition::Other(value),
        }
    }

    fn decoded_payload(&self) -> Option<Vec<u8>> {
        if !self.subparts.is_empty() {
            return None;
        }
        self.get_body_raw().ok()
    }
}

impl<'a> MailMessage for ParsedMail<'a> {
    type Part = ParsedMail<'a>;

    fn is_multipart(&self) -> bool {
        !self.subparts.is_empty()
    }

    fn parts(&self) -> Vec<&ParsedMail<'a>> {
        let mut parts = Vec::new();
        collect_parts(self, &mut parts);
        parts
    }
}

fn collect_parts<'s, 'a>(mail: &'s ParsedMail<'a>, out: &mut Vec<&'s ParsedMail<'a>>) {
    for part in &mail.subparts {
        out.push(part);
        collect_parts(part, out);
    }
}
