use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::models::Candidate;
use crate::FeedError;

/// Parse a YouTube channel Atom feed from raw XML bytes.
///
/// Entries missing a video id, title or parseable publish date are skipped
/// rather than failing the whole feed; a single malformed entry must not
/// abort the poll of an otherwise healthy channel.
pub fn parse_channel_feed(xml: &[u8]) -> Result<Vec<Candidate>, FeedError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut candidates = Vec::new();
    let mut buf = Vec::new();

    let mut current_entry: Option<CandidateBuilder> = None;
    let mut current_element = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                current_element = name.clone();

                if name == "entry" {
                    current_entry = Some(CandidateBuilder::default());
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                if name == "entry" {
                    if let Some(builder) = current_entry.take() {
                        match builder.build() {
                            Some(candidate) => candidates.push(candidate),
                            None => tracing::warn!("Skipping incomplete feed entry"),
                        }
                    }
                }
                current_element.clear();
            }
            Ok(Event::Text(e)) => {
                if let Some(ref mut entry) = current_entry {
                    let text = e.unescape().unwrap_or_default().to_string();
                    if text.is_empty() {
                        continue;
                    }
                    match current_element.as_str() {
                        "yt:videoId" => entry.external_id = Some(text),
                        "title" => entry.title = Some(text),
                        "published" => entry.published_at = parse_entry_date(&text),
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(FeedError::Parse(format!("XML parse error: {}", e))),
            _ => {}
        }
        buf.clear();
    }

    Ok(candidates)
}

fn parse_entry_date(text: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(text) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            tracing::warn!("Unparseable publish date '{}': {}", text, e);
            None
        }
    }
}

#[derive(Default)]
struct CandidateBuilder {
    external_id: Option<String>,
    title: Option<String>,
    published_at: Option<DateTime<Utc>>,
}

impl CandidateBuilder {
    fn build(self) -> Option<Candidate> {
        Some(Candidate {
            external_id: self.external_id?,
            title: self.title?,
            published_at: self.published_at?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015"
      xmlns:media="http://search.yahoo.com/mrss/"
      xmlns="http://www.w3.org/2005/Atom">
  <title>Some Channel</title>
  <entry>
    <id>yt:video:dQw4w9WgXcQ</id>
    <yt:videoId>dQw4w9WgXcQ</yt:videoId>
    <yt:channelId>UC123</yt:channelId>
    <title>First Video</title>
    <published>2024-01-15T10:00:00+00:00</published>
    <media:group>
      <media:title>First Video</media:title>
      <media:thumbnail url="https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg"/>
    </media:group>
  </entry>
  <entry>
    <id>yt:video:abc123def45</id>
    <yt:videoId>abc123def45</yt:videoId>
    <yt:channelId>UC123</yt:channelId>
    <title>Second &amp; Third</title>
    <published>2024-01-16T12:30:00+00:00</published>
  </entry>
</feed>"#;

    #[test]
    fn parses_entries() {
        let candidates = parse_channel_feed(SAMPLE_FEED.as_bytes()).unwrap();
        assert_eq!(candidates.len(), 2);

        assert_eq!(candidates[0].external_id, "dQw4w9WgXcQ");
        assert_eq!(candidates[0].title, "First Video");
        assert_eq!(
            candidates[0].published_at,
            DateTime::parse_from_rfc3339("2024-01-15T10:00:00+00:00").unwrap()
        );

        assert_eq!(candidates[1].external_id, "abc123def45");
        assert_eq!(candidates[1].title, "Second & Third");
    }

    #[test]
    fn skips_incomplete_entries() {
        let xml = r#"<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015">
  <entry>
    <title>No video id here</title>
    <published>2024-01-15T10:00:00+00:00</published>
  </entry>
  <entry>
    <yt:videoId>good1234567</yt:videoId>
    <title>Complete</title>
    <published>2024-01-15T11:00:00+00:00</published>
  </entry>
</feed>"#;

        let candidates = parse_channel_feed(xml.as_bytes()).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].external_id, "good1234567");
    }

    #[test]
    fn skips_bad_dates() {
        let xml = r#"<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015">
  <entry>
    <yt:videoId>good1234567</yt:videoId>
    <title>Bad date</title>
    <published>not a date</published>
  </entry>
</feed>"#;

        let candidates = parse_channel_feed(xml.as_bytes()).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn rejects_invalid_xml() {
        let result = parse_channel_feed(b"<feed><entry></feed>");
        assert!(matches!(result, Err(FeedError::Parse(_))));
    }
}
