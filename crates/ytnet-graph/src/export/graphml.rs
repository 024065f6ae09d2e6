//! GraphML rendering with `quick-xml`.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use ytnet_core::{SimilarityEdge, Video};

use super::tabular::{format_timestamp, format_weight};
use crate::bipartite::BipartiteGraph;
use crate::error::ExportError;

const GRAPHML_NS: &str = "http://graphml.graphdrawing.org/xmlns";

/// A `<key>` declaration. The id doubles as the attribute name.
struct Key {
    id: &'static str,
    domain: &'static str,
    attr_type: &'static str,
}

const fn key(id: &'static str, domain: &'static str, attr_type: &'static str) -> Key {
    Key {
        id,
        domain,
        attr_type,
    }
}

const BIPARTITE_KEYS: &[Key] = &[
    key("kind", "node", "string"),
    key("bipartite", "node", "int"),
    key("label", "node", "string"),
    key("weight", "edge", "int"),
    key("comment_ids", "edge", "string"),
];

const SIMILARITY_KEYS: &[Key] = &[
    key("label", "node", "string"),
    key("channel_id", "node", "string"),
    key("channel_title", "node", "string"),
    key("published_at", "node", "string"),
    key("view_count", "node", "long"),
    key("like_count", "node", "long"),
    key("comment_count", "node", "long"),
    key("duration", "node", "string"),
    key("weight", "edge", "double"),
];

type Data = Vec<(&'static str, String)>;

struct Document {
    writer: Writer<Vec<u8>>,
}

impl Document {
    fn begin(keys: &[Key]) -> Result<Self, ExportError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut root = BytesStart::new("graphml");
        root.push_attribute(("xmlns", GRAPHML_NS));
        writer.write_event(Event::Start(root))?;

        for k in keys {
            let mut el = BytesStart::new("key");
            el.push_attribute(("id", k.id));
            el.push_attribute(("for", k.domain));
            el.push_attribute(("attr.name", k.id));
            el.push_attribute(("attr.type", k.attr_type));
            writer.write_event(Event::Empty(el))?;
        }

        let mut graph = BytesStart::new("graph");
        graph.push_attribute(("id", "G"));
        graph.push_attribute(("edgedefault", "undirected"));
        writer.write_event(Event::Start(graph))?;
        Ok(Self { writer })
    }

    fn node(&mut self, id: &str, data: &Data) -> Result<(), ExportError> {
        self.element("node", &[("id", id)], data)
    }

    fn edge(&mut self, source: &str, target: &str, data: &Data) -> Result<(), ExportError> {
        self.element("edge", &[("source", source), ("target", target)], data)
    }

    fn element(
        &mut self,
        tag: &str,
        attrs: &[(&str, &str)],
        data: &Data,
    ) -> Result<(), ExportError> {
        let mut start = BytesStart::new(tag);
        for &attr in attrs {
            start.push_attribute(attr);
        }
        if data.is_empty() {
            self.writer.write_event(Event::Empty(start))?;
            return Ok(());
        }
        self.writer.write_event(Event::Start(start))?;
        for (key, value) in data {
            let mut el = BytesStart::new("data");
            el.push_attribute(("key", *key));
            self.writer.write_event(Event::Start(el))?;
            self.writer.write_event(Event::Text(BytesText::new(value)))?;
            self.writer.write_event(Event::End(BytesEnd::new("data")))?;
        }
        self.writer.write_event(Event::End(BytesEnd::new(tag)))?;
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>, ExportError> {
        self.writer.write_event(Event::End(BytesEnd::new("graph")))?;
        self.writer.write_event(Event::End(BytesEnd::new("graphml")))?;
        let mut out = self.writer.into_inner();
        out.push(b'\n');
        Ok(out)
    }
}

fn label_or_id<'a>(label: &'a str, id: &'a str) -> &'a str {
    if label.is_empty() {
        id
    } else {
        label
    }
}

/// Undirected user-video graph: users carry `bipartite=0`, videos
/// `bipartite=1`.
pub(crate) fn bipartite(graph: &BipartiteGraph) -> Result<Vec<u8>, ExportError> {
    let mut doc = Document::begin(BIPARTITE_KEYS)?;

    let mut users: Vec<_> = graph.users.iter().collect();
    users.sort_by(|a, b| a.id.cmp(&b.id));
    for user in users {
        let data = vec![
            ("kind", "user".to_owned()),
            ("bipartite", "0".to_owned()),
            ("label", label_or_id(&user.display_name, &user.id).to_owned()),
        ];
        doc.node(&user.id, &data)?;
    }

    let mut videos: Vec<_> = graph.videos.iter().collect();
    videos.sort_by(|a, b| a.id.cmp(&b.id));
    for video in videos {
        let data = vec![
            ("kind", "video".to_owned()),
            ("bipartite", "1".to_owned()),
            ("label", label_or_id(&video.title, &video.id).to_owned()),
        ];
        doc.node(&video.id, &data)?;
    }

    let mut edges: Vec<_> = graph.edges.iter().collect();
    edges.sort_by(|a, b| (&a.user_id, &a.video_id).cmp(&(&b.user_id, &b.video_id)));
    for edge in edges {
        let data = vec![
            ("weight", edge.weight.to_string()),
            ("comment_ids", edge.comment_ids.join(";")),
        ];
        doc.edge(&edge.user_id, &edge.video_id, &data)?;
    }

    doc.finish()
}

/// Undirected video-video graph over every video, including those without
/// similarity edges.
pub(crate) fn similarity(
    videos: &[Video],
    edges: &[SimilarityEdge],
) -> Result<Vec<u8>, ExportError> {
    let mut doc = Document::begin(SIMILARITY_KEYS)?;

    let mut sorted: Vec<&Video> = videos.iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));
    sorted.dedup_by(|a, b| a.id == b.id);
    for video in sorted {
        doc.node(&video.id, &video_data(video))?;
    }

    let mut edges: Vec<&SimilarityEdge> = edges.iter().collect();
    edges.sort_by(|a, b| (&a.video_a, &a.video_b).cmp(&(&b.video_a, &b.video_b)));
    for edge in edges {
        let data = vec![("weight", format_weight(edge.weight))];
        doc.edge(&edge.video_a, &edge.video_b, &data)?;
    }

    doc.finish()
}

fn video_data(video: &Video) -> Data {
    let mut data = vec![("label", label_or_id(&video.title, &video.id).to_owned())];
    let optional = [
        ("channel_id", video.channel_id.clone()),
        ("channel_title", video.channel_title.clone()),
        ("published_at", video.published_at.map(format_timestamp)),
        ("view_count", video.view_count.map(|n| n.to_string())),
        ("like_count", video.like_count.map(|n| n.to_string())),
        ("comment_count", video.comment_count.map(|n| n.to_string())),
        ("duration", video.duration.clone()),
    ];
    data.extend(optional.into_iter().filter_map(|(k, v)| v.map(|v| (k, v))));
    data
}
