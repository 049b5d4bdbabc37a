use std::fmt::{self, Write};

pub(crate) const PAGE_WIDTH: f32 = 842.0;
pub(crate) const PAGE_HEIGHT: f32 = 595.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

/// Approximate Helvetica advance width; good enough for wrapping decisions.
pub(crate) fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.5
}

/// Greedy word wrap into lines no wider than `width`. Words longer than a line are split.
pub(crate) fn wrap(text: &str, size: f32, width: f32) -> Vec<String> {
    let max_chars = ((width / (size * 0.5)).floor() as usize).max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            let word: String = word.into_iter().collect();
            let needed = current.chars().count()
                + usize::from(!current.is_empty())
                + word.chars().count();
            if needed > max_chars && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&word);
        }
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Content stream of one page.
#[derive(Debug, Default)]
pub(crate) struct Canvas {
    ops: String,
}

impl Canvas {
    /// `y` is measured from the top edge.
    pub(crate) fn text(
        &mut self,
        font: Font,
        size: f32,
        x: f32,
        y: f32,
        text: &str,
    ) -> fmt::Result {
        writeln!(
            self.ops,
            "BT /{} {size:.1} Tf {x:.2} {:.2} Td ({}) Tj ET",
            font.resource(),
            PAGE_HEIGHT - y,
            escape(text)
        )
    }

    pub(crate) fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32) -> fmt::Result {
        writeln!(
            self.ops,
            "0.5 w {x:.2} {:.2} {width:.2} {height:.2} re S",
            PAGE_HEIGHT - y - height
        )
    }

    pub(crate) fn fill_rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        gray: f32,
    ) -> fmt::Result {
        writeln!(
            self.ops,
            "{gray:.2} g {x:.2} {:.2} {width:.2} {height:.2} re f 0 g",
            PAGE_HEIGHT - y - height
        )
    }

    pub(crate) fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> fmt::Result {
        writeln!(
            self.ops,
            "0.5 w {x1:.2} {:.2} m {x2:.2} {:.2} l S",
            PAGE_HEIGHT - y1,
            PAGE_HEIGHT - y2
        )
    }
}

/// PDF literal-string escaping. Characters outside printable ASCII become `?`.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            '\t' | '\n' | '\r' => out.push(' '),
            ' '..='~' => out.push(ch),
            _ => out.push('?'),
        }
    }
    out
}

/// Serializes pages into a PDF 1.4 file with the two standard Helvetica faces.
pub(crate) fn encode(pages: &[Canvas]) -> Result<Vec<u8>, fmt::Error> {
    const FIRST_PAGE_OBJECT: usize = 5;

    let mut objects: Vec<String> = Vec::with_capacity(4 + pages.len() * 2);
    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());

    let mut kids = String::new();
    for index in 0..pages.len() {
        write!(kids, "{} 0 R ", FIRST_PAGE_OBJECT + index * 2)?;
    }
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.trim_end(),
        pages.len()
    ));
    for face in ["Helvetica", "Helvetica-Bold"] {
        objects.push(format!(
            "<< /Type /Font /Subtype /Type1 /BaseFont /{face} /Encoding /WinAnsiEncoding >>"
        ));
    }

    for (index, page) in pages.iter().enumerate() {
        let contents = FIRST_PAGE_OBJECT + index * 2 + 1;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH:.0} {PAGE_HEIGHT:.0}] \
             /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {contents} 0 R >>"
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}endstream",
            page.ops.len(),
            page.ops
        ));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, object) in objects.iter().enumerate() {
        offsets.push(out.len());
        write!(out, "{} 0 obj\n{}\nendobj\n", index + 1, object)?;
    }

    let xref_offset = out.len();
    write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1)?;
    for offset in offsets {
        write!(out, "{offset:010} 00000 n \n")?;
    }
    write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
        objects.len() + 1
    )?;

    Ok(out.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_delimiters_and_non_ascii() {
        assert_eq!(escape("a(b)c\\d"), "a\\(b\\)c\\\\d");
        assert_eq!(escape("café\tx"), "caf? x");
    }

    #[test]
    fn wraps_on_words_and_splits_long_words() {
        let lines = wrap("alpha beta gamma", 10.0, 50.0);
        assert_eq!(lines, vec!["alpha beta", "gamma"]);

        let lines = wrap("abcdefghijkl", 10.0, 25.0);
        assert_eq!(lines, vec!["abcde", "fghij", "kl"]);
        assert_eq!(wrap("", 10.0, 50.0), vec![String::new()]);
    }

    #[test]
    fn xref_offsets_point_at_objects() {
        let mut page = Canvas::default();
        page.text(Font::Bold, 12.0, 36.0, 36.0, "Hello (world)").expect("text");
        let bytes = encode(&[page]).expect("encodes");
        let text = String::from_utf8(bytes).expect("ascii output");

        assert!(text.starts_with("%PDF-1.4"));
        assert!(text.contains("(Hello \\(world\\)) Tj"));
        assert!(text.contains("/Count 1"));

        let xref_at = text.find("xref\n").expect("xref present");
        let second_entry = text[xref_at..]
            .lines()
            .nth(3)
            .expect("entry for object 1");
        let offset: usize = second_entry[..10].parse().expect("numeric offset");
        assert!(text[offset..].starts_with("1 0 obj"));
    }
}
