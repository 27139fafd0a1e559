use super::IndexBuilder;
use crate::segment;
use crate::Error;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::BufRead;

/// Which element's character data we are collecting.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
enum Where {
    Outside,
    InTitle,
    InText,
}

/// Streaming pull over the dump: accumulate `title` and `text` character
/// data and hand each finished `page` to the builder. Pages in the
/// administrative namespaces are skipped before segmentation.
pub fn ingest_xml<R: BufRead>(xml: R, builder: &mut IndexBuilder) -> Result<(), Error> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut state = Where::Outside;
    let mut title = String::new();
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                state = match e.name().as_ref() {
                    b"title" => Where::InTitle,
                    b"text" => Where::InText,
                    _ => Where::Outside,
                };
            }
            Event::Text(t) => {
                let content = t.unescape()?;
                match state {
                    Where::InTitle => title.push_str(&content),
                    Where::InText => text.push_str(&content),
                    Where::Outside => {}
                }
            }
            Event::CData(t) => {
                let bytes = t.into_inner();
                let content = String::from_utf8_lossy(&bytes);
                match state {
                    Where::InTitle => title.push_str(&content),
                    Where::InText => text.push_str(&content),
                    Where::Outside => {}
                }
            }
            Event::End(e) => {
                match e.name().as_ref() {
                    b"page" => {
                        let page_title = title.trim().to_string();
                        let page_text = text.trim().to_string();
                        if !segment::is_meta_page(&page_title) {
                            builder.add_article(&page_title, &page_text)?;
                        }
                        title.clear();
                        text.clear();
                    }
                    _ => {}
                }
                state = Where::Outside;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}
