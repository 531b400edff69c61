//! PowerPoint (.pptx) loading: one unit per slide
//!
//! Slides are read straight from the OOXML package. Each slide's unit holds
//! the slide number, its title (or `Non défini`), then the text, tables and
//! OCR'd images of every other top-level shape in document order.

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use super::ocr::OcrEngine;
use super::table::render_table;
use crate::error::{Error, Result};
use crate::types::{DocumentUnit, UNTITLED_SLIDE};

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";

/// Loader for `.pptx` packages
#[derive(Clone, Default)]
pub struct PptxLoader {
    ocr: Option<Arc<dyn OcrEngine>>,
}

impl PptxLoader {
    pub fn new(ocr: Option<Arc<dyn OcrEngine>>) -> Self {
        Self { ocr }
    }

    /// Load a presentation from disk
    pub fn load(&self, path: &Path, source: &str) -> Result<Vec<DocumentUnit>> {
        let data = std::fs::read(path)?;
        self.load_bytes(&data, source)
    }

    /// Load a presentation from memory
    pub fn load_bytes(&self, data: &[u8], source: &str) -> Result<Vec<DocumentUnit>> {
        let mut archive = ZipArchive::new(Cursor::new(data))
            .map_err(|e| Error::file_parse(source, e.to_string()))?;

        let slide_parts = slide_order(&mut archive);
        let mut units = Vec::with_capacity(slide_parts.len());

        for (index, part) in slide_parts.iter().enumerate() {
            let slide_number = index as u32 + 1;
            let xml = read_part_string(&mut archive, part)
                .map_err(|e| Error::file_parse(source, format!("{}: {}", part, e)))?;
            let tree = parse_xml(&xml)
                .map_err(|e| Error::file_parse(source, format!("{}: {}", part, e)))?;
            let rels = read_relationships(&mut archive, &rels_part_for(part), part_dir(part));

            let unit = self.slide_unit(&mut archive, &tree, &rels, slide_number, source);
            units.push(unit);
        }

        tracing::info!("Loaded {} slides from {}", units.len(), source);
        Ok(units)
    }

    fn slide_unit<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide: &XmlNode,
        rels: &HashMap<String, String>,
        slide_number: u32,
        source: &str,
    ) -> DocumentUnit {
        let shapes: Vec<&XmlNode> = slide
            .find("spTree")
            .map(|tree| {
                tree.children
                    .iter()
                    .filter(|c| matches!(c.name.as_str(), "sp" | "graphicFrame" | "pic" | "grpSp" | "cxnSp"))
                    .collect()
            })
            .unwrap_or_default();

        let title_index = shapes.iter().position(|s| is_title_placeholder(s));
        let title = title_index
            .map(|i| shape_text(shapes[i]).trim().to_string())
            .filter(|t| !t.is_empty());

        let mut parts = vec![
            format!("Numéro de slide: {}", slide_number),
            format!("Titre: {}", title.as_deref().unwrap_or(UNTITLED_SLIDE)),
        ];

        for (i, shape) in shapes.iter().enumerate() {
            if Some(i) == title_index {
                continue;
            }
            let content = self.shape_content(archive, shape, rels, slide_number);
            if !content.is_empty() {
                parts.push(content);
            }
        }

        let content = parts
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        DocumentUnit::slide(content, source, slide_number, title)
    }

    fn shape_content<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        shape: &XmlNode,
        rels: &HashMap<String, String>,
        slide_number: u32,
    ) -> String {
        let mut sections = Vec::new();

        if shape.name == "sp" {
            let text = shape_text(shape);
            let text = text.trim();
            if !text.is_empty() {
                sections.push(text.to_string());
            }
        }

        if shape.name == "graphicFrame" {
            match table_section(shape) {
                Ok(Some(table)) => sections.push(format!("Tableau:\n{}", table)),
                Ok(None) => {}
                Err(e) => tracing::warn!(
                    "Could not extract table on slide {}: {}",
                    slide_number,
                    e
                ),
            }
        }

        if shape.name == "pic" {
            if let Some(ocr) = &self.ocr {
                match image_text(archive, shape, rels, ocr.as_ref()) {
                    Ok(text) if !text.trim().is_empty() => sections.push(format!(
                        "Texte extrait de l'image:\n{}",
                        text.trim()
                    )),
                    Ok(_) => {}
                    Err(e) => tracing::warn!(
                        "Could not extract text from image on slide {}: {}",
                        slide_number,
                        e
                    ),
                }
            }
        }

        sections.join("\n")
    }
}

fn is_title_placeholder(shape: &XmlNode) -> bool {
    shape.name == "sp"
        && shape
            .child("nvSpPr")
            .and_then(|n| n.child("nvPr"))
            .and_then(|n| n.child("ph"))
            .and_then(|ph| ph.attr("type"))
            .is_some_and(|t| t == "title" || t == "ctrTitle")
}

/// Text of a shape's text body: paragraphs joined by newlines
fn shape_text(shape: &XmlNode) -> String {
    shape.child("txBody").map(text_body).unwrap_or_default()
}

fn text_body(body: &XmlNode) -> String {
    body.children_named("p")
        .map(paragraph_text)
        .collect::<Vec<_>>()
        .join("\n")
}

fn paragraph_text(paragraph: &XmlNode) -> String {
    let mut text = String::new();
    for run in &paragraph.children {
        match run.name.as_str() {
            "r" | "fld" => {
                if let Some(t) = run.child("t") {
                    text.push_str(&t.text);
                }
            }
            // soft line break, kept apart from the paragraph separator
            "br" => text.push('\u{b}'),
            _ => {}
        }
    }
    text
}

fn table_section(frame: &XmlNode) -> Result<Option<String>> {
    let Some(table) = frame.find("tbl") else {
        return Ok(None);
    };

    let rows: Vec<Vec<String>> = table
        .children_named("tr")
        .map(|row| {
            row.children_named("tc")
                .map(|cell| {
                    cell.child("txBody")
                        .map(text_body)
                        .unwrap_or_default()
                        .trim()
                        .to_string()
                })
                .collect()
        })
        .collect();

    render_table(&rows)
}

fn image_text<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    picture: &XmlNode,
    rels: &HashMap<String, String>,
    ocr: &dyn OcrEngine,
) -> Result<String> {
    let rel_id = picture
        .find("blip")
        .and_then(|blip| blip.rel_attr("embed"))
        .ok_or_else(|| Error::ocr("picture has no embedded image"))?;
    let part = rels
        .get(rel_id)
        .ok_or_else(|| Error::ocr(format!("image relationship {} not found", rel_id)))?;
    let bytes = read_part(archive, part).map_err(|e| Error::ocr(format!("{}: {}", part, e)))?;

    ocr.recognize(&bytes)
}

/// Slide part names in presentation order.
///
/// Falls back to numeric file-name order when the presentation part or its
/// relationships cannot be read.
fn slide_order<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Vec<String> {
    if let Some(order) = presentation_order(archive) {
        if !order.is_empty() {
            return order;
        }
    }

    let mut numbered: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let number = name
                .strip_prefix("ppt/slides/slide")?
                .strip_suffix(".xml")?
                .parse::<u32>()
                .ok()?;
            Some((number, name.to_string()))
        })
        .collect();
    numbered.sort_by_key(|(number, _)| *number);
    numbered.into_iter().map(|(_, name)| name).collect()
}

fn presentation_order<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Option<Vec<String>> {
    let xml = read_part_string(archive, PRESENTATION_PART).ok()?;
    let tree = parse_xml(&xml).ok()?;
    let rels = read_relationships(archive, PRESENTATION_RELS, "ppt");
    let list = tree.find("sldIdLst")?;

    let order: Vec<String> = list
        .children_named("sldId")
        .filter_map(|slide| slide.rel_attr("id"))
        .filter_map(|id| rels.get(id).cloned())
        .filter(|part| archive.index_for_name(part).is_some())
        .collect();
    Some(order)
}

/// Relationship id to resolved part name. Missing parts yield an empty map.
fn read_relationships<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    rels_part: &str,
    base_dir: &str,
) -> HashMap<String, String> {
    let Ok(xml) = read_part_string(archive, rels_part) else {
        return HashMap::new();
    };
    let Ok(tree) = parse_xml(&xml) else {
        tracing::debug!("Unreadable relationships part {}", rels_part);
        return HashMap::new();
    };

    let Some(root) = tree.find("Relationships") else {
        return HashMap::new();
    };

    root.children_named("Relationship")
        .filter(|rel| rel.attr("TargetMode") != Some("External"))
        .filter_map(|rel| {
            let id = rel.attr("Id")?;
            let target = rel.attr("Target")?;
            Some((id.to_string(), resolve_part(base_dir, target)))
        })
        .collect()
}

fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

fn part_dir(part: &str) -> &str {
    part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Resolve a relationship target against the directory of its source part
fn resolve_part(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            ".." => {
                segments.pop();
            }
            "." | "" => {}
            s => segments.push(s),
        }
    }
    segments.join("/")
}

fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> std::result::Result<Vec<u8>, String> {
    let mut file = archive.by_name(name).map_err(|e| e.to_string())?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).map_err(|e| e.to_string())?;
    Ok(buf)
}

fn read_part_string<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> std::result::Result<String, String> {
    let bytes = read_part(archive, name)?;
    String::from_utf8(bytes).map_err(|e| e.to_string())
}

/// Minimal element tree over an OOXML part. Element names are local names;
/// attribute keys keep their prefix (`r:id`).
#[derive(Debug, Default)]
struct XmlNode {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<XmlNode>,
    text: String,
}

impl XmlNode {
    fn from_start(start: &BytesStart<'_>) -> std::result::Result<Self, String> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| e.to_string())?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            attrs.push((key, value.into_owned()));
        }
        Ok(Self {
            name,
            attrs,
            ..Self::default()
        })
    }

    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Namespaced relationship attribute such as `r:id` or `r:embed`
    fn rel_attr(&self, local: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.split_once(':').is_some_and(|(_, l)| l == local))
            .map(|(_, v)| v.as_str())
    }

    fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First descendant with the given name, depth first
    fn find(&self, name: &str) -> Option<&XmlNode> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }
}

fn parse_xml(xml: &str) -> std::result::Result<XmlNode, String> {
    let mut reader = Reader::from_str(xml);
    let mut stack = vec![XmlNode::default()];

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(start) => stack.push(XmlNode::from_start(&start)?),
            Event::Empty(start) => {
                let node = XmlNode::from_start(&start)?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(node);
                }
            }
            Event::End(_) => {
                let node = stack.pop().ok_or("unbalanced end tag")?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => return Err("unbalanced end tag".to_string()),
                }
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| e.to_string())?;
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err("unexpected end of document".to_string());
    }
    stack.pop().ok_or_else(|| "empty document".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use zip::write::SimpleFileOptions;

    const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

    fn slide_xml(shapes: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld {NS}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/></p:nvGrpSpPr><p:grpSpPr/>{shapes}</p:spTree></p:cSld></p:sld>"#
        )
    }

    fn title_shape(text: &str) -> String {
        format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:txBody><a:p><a:r><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>"#
        )
    }

    fn text_shape(paragraphs: &[&str]) -> String {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<a:p><a:r><a:t>{p}</a:t></a:r></a:p>"))
            .collect();
        format!(r#"<p:sp><p:nvSpPr><p:cNvPr id="3" name="Body"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:txBody>{body}</p:txBody></p:sp>"#)
    }

    fn table_shape(rows: &[&[&str]]) -> String {
        let rows: String = rows
            .iter()
            .map(|row| {
                let cells: String = row
                    .iter()
                    .map(|c| format!("<a:tc><a:txBody><a:p><a:r><a:t>{c}</a:t></a:r></a:p></a:txBody></a:tc>"))
                    .collect();
                format!("<a:tr>{cells}</a:tr>")
            })
            .collect();
        format!(r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="4" name="Table"/></p:nvGraphicFramePr><a:graphic><a:graphicData><a:tbl>{rows}</a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#)
    }

    fn picture_shape(rel_id: &str) -> String {
        format!(r#"<p:pic><p:nvPicPr><p:cNvPr id="5" name="Picture"/></p:nvPicPr><p:blipFill><a:blip r:embed="{rel_id}"/></p:blipFill></p:pic>"#)
    }

    fn build_package(entries: &[(&str, String)]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            for (name, body) in entries {
                zip.start_file(*name, SimpleFileOptions::default()).unwrap();
                zip.write_all(body.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buf.into_inner()
    }

    struct FakeOcr {
        calls: AtomicUsize,
        text: &'static str,
    }

    impl OcrEngine for FakeOcr {
        fn recognize(&self, image: &[u8]) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(image, b"PNGDATA");
            Ok(self.text.to_string())
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    #[test]
    fn test_soft_line_break_is_vertical_tab() {
        let body = "Ligne un</a:t></a:r><a:br/><a:r><a:t>Ligne deux";
        let data = build_package(&[(
            "ppt/slides/slide1.xml",
            slide_xml(&text_shape(&[body, "Suite"])),
        )]);

        let units = PptxLoader::default().load_bytes(&data, "deck.pptx").unwrap();
        assert_eq!(
            units[0].content(),
            "Numéro de slide: 1\nTitre: Non défini\nLigne un\u{b}Ligne deux\nSuite"
        );
    }

    #[test]
    fn test_title_and_untitled_slides() {
        let data = build_package(&[
            (
                "ppt/slides/slide1.xml",
                slide_xml(&format!("{}{}", title_shape("Intro"), text_shape(&["Bonjour", "  "]))),
            ),
            ("ppt/slides/slide2.xml", slide_xml(&title_shape(""))),
        ]);

        let units = PptxLoader::default().load_bytes(&data, "deck.pptx").unwrap();
        assert_eq!(units.len(), 2);

        assert_eq!(units[0].content(), "Numéro de slide: 1\nTitre: Intro\nBonjour");
        assert_eq!(units[0].title(), "Intro");
        assert_eq!(units[0].page(), Some(1));

        assert_eq!(units[1].content(), "Numéro de slide: 2\nTitre: Non défini");
        assert_eq!(units[1].title(), UNTITLED_SLIDE);
        assert_eq!(units[1].source(), "deck.pptx");
    }

    #[test]
    fn test_presentation_order_wins_over_file_names() {
        let presentation = format!(
            r#"<p:presentation {NS}><p:sldIdLst><p:sldId id="256" r:id="rId3"/><p:sldId id="257" r:id="rId2"/></p:sldIdLst></p:presentation>"#
        );
        let rels = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId2" Type="slide" Target="slides/slide1.xml"/><Relationship Id="rId3" Type="slide" Target="slides/slide2.xml"/></Relationships>"#;

        let data = build_package(&[
            ("ppt/presentation.xml", presentation),
            ("ppt/_rels/presentation.xml.rels", rels.to_string()),
            ("ppt/slides/slide1.xml", slide_xml(&title_shape("Second"))),
            ("ppt/slides/slide2.xml", slide_xml(&title_shape("First"))),
        ]);

        let units = PptxLoader::default().load_bytes(&data, "deck.pptx").unwrap();
        let titles: Vec<_> = units.iter().map(|u| u.title().to_string()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }

    #[test]
    fn test_numeric_fallback_order() {
        let data = build_package(&[
            ("ppt/slides/slide10.xml", slide_xml(&title_shape("Ten"))),
            ("ppt/slides/slide2.xml", slide_xml(&title_shape("Two"))),
        ]);
        let units = PptxLoader::default().load_bytes(&data, "deck.pptx").unwrap();
        assert_eq!(units[0].title(), "Two");
        assert_eq!(units[1].title(), "Ten");
    }

    #[test]
    fn test_tables_render_and_ragged_tables_are_skipped() {
        let shapes = format!(
            "{}{}{}",
            table_shape(&[&["Nom", "Âge"], &["Ada", "36"]]),
            table_shape(&[&["a", "b"], &["solo"]]),
            table_shape(&[&["Seul"]]),
        );
        let data = build_package(&[("ppt/slides/slide1.xml", slide_xml(&shapes))]);
        let units = PptxLoader::default().load_bytes(&data, "t.pptx").unwrap();

        assert_eq!(
            units[0].content(),
            "Numéro de slide: 1\nTitre: Non défini\nTableau:\n   Nom  Âge\n0  Ada   36\nTableau:\nEmpty DataFrame\nColumns: [Seul]\nIndex: []"
        );
    }

    #[test]
    fn test_picture_ocr() {
        let rels = r#"<Relationships><Relationship Id="rId2" Target="../media/image1.png"/></Relationships>"#;
        let data = build_package(&[
            ("ppt/slides/slide1.xml", slide_xml(&format!("{}{}", picture_shape("rId2"), picture_shape("rId9")))),
            ("ppt/slides/_rels/slide1.xml.rels", rels.to_string()),
            ("ppt/media/image1.png", "PNGDATA".to_string()),
        ]);

        let ocr = Arc::new(FakeOcr {
            calls: AtomicUsize::new(0),
            text: "  Schéma réseau \n",
        });
        let loader = PptxLoader::new(Some(ocr.clone()));
        let units = loader.load_bytes(&data, "img.pptx").unwrap();

        assert_eq!(ocr.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            units[0].content(),
            "Numéro de slide: 1\nTitre: Non défini\nTexte extrait de l'image:\nSchéma réseau"
        );
    }

    #[test]
    fn test_not_a_zip_is_parse_error() {
        let err = PptxLoader::default().load_bytes(b"plain text", "x.pptx").unwrap_err();
        assert!(matches!(err, Error::FileParse { .. }));
    }

    #[test]
    fn test_resolve_part() {
        assert_eq!(resolve_part("ppt/slides", "../media/image1.png"), "ppt/media/image1.png");
        assert_eq!(resolve_part("ppt", "slides/slide1.xml"), "ppt/slides/slide1.xml");
        assert_eq!(resolve_part("ppt", "/ppt/slides/slide3.xml"), "ppt/slides/slide3.xml");
        assert_eq!(rels_part_for("ppt/slides/slide1.xml"), "ppt/slides/_rels/slide1.xml.rels");
    }
}
