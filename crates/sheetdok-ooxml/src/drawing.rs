//! Drawing part parsing (`xl/drawings/drawingN.xml`)
//!
//! A sheet may reference several drawings. [`DrawingCollector`] walks each
//! one in turn, appending shapes and connectors to a single per-sheet list,
//! and assigns sheet-unique shape ids once every drawing has been read.

use std::collections::HashSet;

use sheetdok_diagrams::geometry::{connector_endpoints, AnchorFrame, GridMetrics, GroupSpace, Transform};
use sheetdok_model::{
    AnchorKind, AnchorMarker, BoundingBox, CellAnchor, Connector, ConnectorKind, EmbeddedImage,
    Shape, ShapeId, ShapeKind, Warning, WarningKind, Warnings,
};

use crate::archive::{rels_path_for, resolve_target, PackageArchive};
use crate::content_types::ContentTypes;
use crate::error::Result;
use crate::relationships::Relationships;
use crate::xml::{XmlDocument, XmlElement};

/// Drawing object elements that are modeled
const OBJECT_ELEMENTS: &[&str] = &["sp", "cxnSp", "pic", "grpSp", "graphicFrame"];

/// Anchor children that carry placement, not objects
const PLACEMENT_ELEMENTS: &[&str] = &["from", "to", "clientData", "pos", "ext"];

/// Scheme colours without a theme lookup
fn scheme_color(name: &str) -> &'static str {
    match name {
        "dk1" | "tx1" => "#000000",
        "lt1" | "bg1" => "#FFFFFF",
        "dk2" | "tx2" => "#1F2937",
        "lt2" | "bg2" => "#F3F4F6",
        "accent1" => "#4F46E5",
        "accent2" => "#16A34A",
        "accent3" => "#F59E0B",
        "accent4" => "#0EA5E9",
        "accent5" => "#EC4899",
        "accent6" => "#A855F7",
        _ => "#6B7280",
    }
}

/// Package-level lookups needed while reading drawings
#[derive(Clone, Copy)]
pub struct DrawingContext<'a> {
    pub archive: &'a PackageArchive,
    pub content_types: &'a ContentTypes,
    pub grid: &'a GridMetrics,
    /// Sheet name, used as warning scope
    pub scope: &'a str,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Shape(usize),
    Connector(usize),
}

/// Accumulates the drawing objects of one sheet
#[derive(Debug, Default)]
pub struct DrawingCollector {
    shapes: Vec<Shape>,
    connectors: Vec<Connector>,
    /// Declared `cNvPr/@id` of every object, in document order
    declared: Vec<(Slot, Option<u32>)>,
    warnings: Warnings,
}

/// Everything read from a sheet's drawings
#[derive(Debug, Default)]
pub struct SheetDrawings {
    pub shapes: Vec<Shape>,
    pub connectors: Vec<Connector>,
    pub warnings: Warnings,
}

impl DrawingCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning raised outside a drawing part (missing part, ...)
    pub fn warn(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    /// Read one drawing part
    pub fn add_drawing(&mut self, path: &str, source: String, ctx: DrawingContext<'_>) -> Result<()> {
        let doc = XmlDocument::parse(path, source)?;
        let rels = match ctx.archive.get(&rels_path_for(path)) {
            Some(bytes) => Relationships::parse(bytes)?,
            None => Relationships::new(),
        };
        let mut walker = Walker {
            doc: &doc,
            rels: &rels,
            ctx,
            counter: 0,
            collector: self,
        };

        for anchor in doc.root.elements() {
            walker.anchor(anchor);
        }
        log::debug!(
            "{}: {} shapes, {} connectors so far",
            path,
            self.shapes.len(),
            self.connectors.len()
        );
        Ok(())
    }

    /// Assign sheet-unique ids and hand back the objects
    ///
    /// The first object declaring an id keeps it; later duplicates and
    /// objects without an id get fresh ids above the largest declared one,
    /// or the smallest free ids once that would pass `u32::MAX`.
    pub fn finish(mut self) -> SheetDrawings {
        let reserved: HashSet<u32> = self.declared.iter().filter_map(|(_, id)| *id).collect();
        let mut above = reserved.iter().max().map_or(Some(1), |max| max.checked_add(1));
        let mut lowest_free = 1u32;
        let mut used = HashSet::new();

        for (slot, declared) in &self.declared {
            let id = match declared {
                Some(id) if used.insert(*id) => *id,
                _ => {
                    let id = match above {
                        Some(id) => {
                            above = id.checked_add(1);
                            id
                        }
                        None => {
                            while reserved.contains(&lowest_free) || used.contains(&lowest_free) {
                                lowest_free += 1;
                            }
                            lowest_free
                        }
                    };
                    used.insert(id);
                    log::debug!("reassigned drawing object id {:?} -> {}", declared, id);
                    id
                }
            };
            match *slot {
                Slot::Shape(i) => self.shapes[i].id = ShapeId(id),
                Slot::Connector(i) => self.connectors[i].id = ShapeId(id),
            }
        }

        SheetDrawings {
            shapes: self.shapes,
            connectors: self.connectors,
            warnings: self.warnings,
        }
    }

    fn z_order(&self) -> usize {
        self.declared.len()
    }
}

struct Walker<'a, 'c> {
    doc: &'a XmlDocument,
    rels: &'a Relationships,
    ctx: DrawingContext<'a>,
    /// Objects seen in this drawing, for uids
    counter: usize,
    collector: &'c mut DrawingCollector,
}

impl Walker<'_, '_> {
    fn unsupported(&mut self, elem: &XmlElement, reason: &str) {
        self.collector.warnings.push(
            Warning::new(WarningKind::Unsupported, reason)
                .with_scope(self.ctx.scope)
                .with_location(&self.doc.part)
                .with_element(&elem.local)
                .with_raw(self.doc.raw(elem)),
        );
    }

    fn anchor(&mut self, anchor: &XmlElement) {
        let kind = match anchor.local.as_str() {
            "twoCellAnchor" => AnchorKind::TwoCell,
            "oneCellAnchor" => AnchorKind::OneCell,
            "absoluteAnchor" => AnchorKind::Absolute,
            _ => {
                self.unsupported(anchor, "drawing anchor is not modeled");
                return;
            }
        };

        let frame = AnchorFrame {
            kind,
            from: anchor.child("from").map(parse_marker),
            to: anchor.child("to").map(parse_marker),
            pos: anchor.child("pos").map(|p| pair(p, "x", "y")),
            ext: anchor.child("ext").map(|e| pair(e, "cx", "cy")),
        };
        let bbox = frame.bbox(self.ctx.grid);
        let cell_anchor = CellAnchor {
            kind,
            from: frame.from,
            to: frame.to,
        };

        for child in anchor.elements() {
            let local = child.local.as_str();
            if PLACEMENT_ELEMENTS.contains(&local) {
                continue;
            }
            if OBJECT_ELEMENTS.contains(&local) {
                self.object(child, bbox, Some(&cell_anchor), None);
            } else {
                self.unsupported(child, "drawing object is not modeled");
            }
        }
    }

    /// Read one object placed at `bbox`; group children recurse
    fn object(
        &mut self,
        elem: &XmlElement,
        bbox: BoundingBox,
        anchor: Option<&CellAnchor>,
        parent: Option<usize>,
    ) {
        self.counter += 1;
        let uid = format!("{}#{}", self.doc.part, self.counter);
        let z_order = self.collector.z_order();
        let (declared_id, name) = identity(elem);
        let xfrm = transform(elem);
        let text = object_text(elem);
        let raw_xml = self.doc.raw(elem).to_string();
        let sp_pr = elem.child("spPr");

        if elem.local == "cxnSp" {
            let rotation = xfrm.map(|x| x.rotation_degrees()).unwrap_or(0.0);
            let (flip_h, flip_v) = xfrm.map(|x| (x.flip_h, x.flip_v)).unwrap_or_default();
            let (start, end) = connector_endpoints(&bbox, flip_h, flip_v, rotation);
            let link = |name: &str| {
                elem.child_path(&["nvCxnSpPr", "cNvCxnSpPr", name])
                    .and_then(|l| l.attr_parse::<u32>("id"))
                    .map(ShapeId)
            };
            let line = sp_pr.and_then(|p| p.child("ln"));
            let marker = |name: &str| {
                line.and_then(|l| l.child(name))
                    .and_then(|m| m.attr("type"))
                    .filter(|t| !t.eq_ignore_ascii_case("none"))
                    .map(str::to_string)
            };

            let connector = Connector {
                id: ShapeId(0),
                uid,
                name,
                text,
                kind: ConnectorKind::from_preset(preset(elem)),
                start,
                end,
                start_ref: link("stCxn"),
                end_ref: link("endCxn"),
                head_arrow: marker("headEnd"),
                tail_arrow: marker("tailEnd"),
                line_color: line.and_then(drawing_color),
                z_order,
                anchor: anchor.cloned(),
                raw_xml,
            };
            let idx = self.collector.connectors.len();
            self.collector.connectors.push(connector);
            self.collector.declared.push((Slot::Connector(idx), declared_id));
            return;
        }

        let kind = match elem.local.as_str() {
            "pic" => ShapeKind::Picture,
            "grpSp" => ShapeKind::Group,
            "graphicFrame" => ShapeKind::GraphicFrame,
            _ => ShapeKind::from_preset(preset(elem)),
        };
        let image = if kind == ShapeKind::Picture {
            self.picture(elem, &uid)
        } else {
            None
        };

        let shape = Shape {
            id: ShapeId(0),
            uid,
            name,
            text,
            kind,
            bbox,
            rotation: xfrm.map(|x| x.rotation_degrees()).unwrap_or(0.0),
            z_order,
            parent,
            image,
            fill_color: sp_pr.and_then(fill_color),
            line_color: sp_pr.and_then(|p| p.child("ln")).and_then(drawing_color),
            anchor: anchor.cloned(),
            raw_xml,
        };
        let idx = self.collector.shapes.len();
        self.collector.shapes.push(shape);
        self.collector.declared.push((Slot::Shape(idx), declared_id));

        if elem.local == "grpSp" {
            let space = GroupSpace::new(bbox, &xfrm.unwrap_or_default());
            for child in elem.elements() {
                let local = child.local.as_str();
                if OBJECT_ELEMENTS.contains(&local) {
                    let child_box = transform(child)
                        .map(|t| space.map(&t))
                        .unwrap_or(bbox);
                    self.object(child, child_box, None, Some(idx));
                } else if !matches!(local, "nvGrpSpPr" | "grpSpPr" | "extLst") {
                    self.unsupported(child, "group member is not modeled");
                }
            }
        }
    }

    /// Resolve `blip r:embed` to the media part and read its bytes
    fn picture(&mut self, pic: &XmlElement, uid: &str) -> Option<EmbeddedImage> {
        let rel_id = pic.descendant("blip")?.attr("embed")?;
        let Some(rel) = self.rels.get(rel_id) else {
            self.collector.warnings.push(
                Warning::new(
                    WarningKind::MissingPart,
                    format!("image relationship {} is not declared", rel_id),
                )
                .with_scope(self.ctx.scope)
                .with_location(uid),
            );
            return None;
        };
        if rel.is_external() {
            return None;
        }

        let media = resolve_target(&self.doc.part, &rel.target);
        match self.ctx.archive.get(&media) {
            Some(bytes) => Some(EmbeddedImage {
                content_type: self.ctx.content_types.content_type_for(&media),
                path: media,
                bytes: bytes.to_vec(),
            }),
            None => {
                self.collector.warnings.push(
                    Warning::new(
                        WarningKind::MissingPart,
                        format!("image part {} is missing", media),
                    )
                    .with_scope(self.ctx.scope)
                    .with_location(uid),
                );
                None
            }
        }
    }
}

fn parse_marker(marker: &XmlElement) -> AnchorMarker {
    let num = |name: &str| {
        marker
            .child_text(name)
            .and_then(|t| t.trim().parse::<i64>().ok())
            .unwrap_or(0)
    };
    AnchorMarker {
        col: num("col").max(0) as u32,
        col_off: num("colOff"),
        row: num("row").max(0) as u32,
        row_off: num("rowOff"),
    }
}

fn pair(elem: &XmlElement, a: &str, b: &str) -> (i64, i64) {
    (
        elem.attr_parse(a).unwrap_or(0),
        elem.attr_parse(b).unwrap_or(0),
    )
}

/// `cNvPr` id and name, located by object kind
fn identity(elem: &XmlElement) -> (Option<u32>, String) {
    let props = match elem.local.as_str() {
        "sp" => "nvSpPr",
        "cxnSp" => "nvCxnSpPr",
        "pic" => "nvPicPr",
        "grpSp" => "nvGrpSpPr",
        _ => "nvGraphicFramePr",
    };
    match elem.child_path(&[props, "cNvPr"]) {
        Some(c) => (
            c.attr_parse("id"),
            c.attr("name").unwrap_or_default().to_string(),
        ),
        None => (None, String::new()),
    }
}

/// The object's `xfrm`, wherever its kind keeps it
fn transform(elem: &XmlElement) -> Option<Transform> {
    let xfrm = match elem.local.as_str() {
        "grpSp" => elem.child_path(&["grpSpPr", "xfrm"]),
        "graphicFrame" => elem.child("xfrm"),
        _ => elem.child_path(&["spPr", "xfrm"]),
    }?;
    Some(Transform {
        off: xfrm.child("off").map(|o| pair(o, "x", "y")).unwrap_or_default(),
        ext: xfrm.child("ext").map(|e| pair(e, "cx", "cy")).unwrap_or_default(),
        ch_off: xfrm.child("chOff").map(|o| pair(o, "x", "y")),
        ch_ext: xfrm.child("chExt").map(|e| pair(e, "cx", "cy")),
        rot: xfrm.attr_parse("rot").unwrap_or(0),
        flip_h: xfrm.attr_bool("flipH", false),
        flip_v: xfrm.attr_bool("flipV", false),
    })
}

fn preset(elem: &XmlElement) -> Option<&str> {
    elem.child_path(&["spPr", "prstGeom"])
        .and_then(|g| g.attr("prst"))
}

/// All `a:t` runs, joined and trimmed
fn object_text(elem: &XmlElement) -> Option<String> {
    let text: String = elem.descendants("t").iter().map(|t| t.text()).collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn fill_color(sp_pr: &XmlElement) -> Option<String> {
    if let Some(solid) = sp_pr.child("solidFill") {
        if let Some(color) = drawing_color(solid) {
            return Some(color);
        }
    }
    sp_pr
        .child("gradFill")
        .and_then(|g| g.descendant("gs"))
        .and_then(drawing_color)
}

/// First colour found under `node`, as `#RRGGBB`
fn drawing_color(node: &XmlElement) -> Option<String> {
    if let Some(c) = node.descendant("srgbClr") {
        if let Some(val) = c.attr("val") {
            return Some(format!("#{}", val.to_ascii_uppercase()));
        }
    }
    if let Some(c) = node.descendant("sysClr") {
        if let Some(last) = c.attr("lastClr") {
            return Some(format!("#{}", last.to_ascii_uppercase()));
        }
    }
    ["schemeClr", "prstClr"]
        .iter()
        .filter_map(|tag| node.descendant(tag))
        .find_map(|c| c.attr("val"))
        .map(|val| scheme_color(val).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = r#"xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006""#;

    fn drawing(body: &str) -> String {
        format!(r#"<xdr:wsDr {}>{}</xdr:wsDr>"#, NS, body)
    }

    fn collect(archive: &PackageArchive, xml: String) -> SheetDrawings {
        let content_types = ContentTypes::default();
        let grid = GridMetrics::uniform();
        let ctx = DrawingContext {
            archive,
            content_types: &content_types,
            grid: &grid,
            scope: "Sheet1",
        };
        let mut collector = DrawingCollector::new();
        collector
            .add_drawing("xl/drawings/drawing1.xml", xml, ctx)
            .unwrap();
        collector.finish()
    }

    fn rect(id: u32, name: &str, col: u32, row: u32, text: &str) -> String {
        format!(
            r#"<xdr:twoCellAnchor>
  <xdr:from><xdr:col>{col}</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>{row}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
  <xdr:to><xdr:col>{}</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>{}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:to>
  <xdr:sp><xdr:nvSpPr><xdr:cNvPr id="{id}" name="{name}"/><xdr:cNvSpPr/></xdr:nvSpPr>
    <xdr:spPr><a:prstGeom prst="rect"/><a:solidFill><a:schemeClr val="accent1"/></a:solidFill></xdr:spPr>
    <xdr:txBody><a:p><a:r><a:t>{text}</a:t></a:r></a:p></xdr:txBody></xdr:sp>
  <xdr:clientData/>
</xdr:twoCellAnchor>"#,
            col + 2,
            row + 2
        )
    }

    #[test]
    fn test_shapes_and_connector() {
        let body = format!(
            r#"{}{}<xdr:twoCellAnchor>
  <xdr:from><xdr:col>2</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>2</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
  <xdr:to><xdr:col>4</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>6</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:to>
  <xdr:cxnSp><xdr:nvCxnSpPr><xdr:cNvPr id="3" name="Arrow"/><xdr:cNvCxnSpPr><a:stCxn id="1" idx="3"/></xdr:cNvCxnSpPr></xdr:nvCxnSpPr>
    <xdr:spPr><a:xfrm flipV="1"><a:off x="0" y="0"/><a:ext cx="0" cy="0"/></a:xfrm><a:prstGeom prst="bentConnector3"/>
      <a:ln w="9525"><a:solidFill><a:srgbClr val="ff0000"/></a:solidFill><a:tailEnd type="triangle"/><a:headEnd type="none"/></a:ln></xdr:spPr>
  </xdr:cxnSp><xdr:clientData/>
</xdr:twoCellAnchor>"#,
            rect(1, "Start", 0, 0, "Begin"),
            rect(2, "End", 4, 6, "Finish"),
        );
        let result = collect(&PackageArchive::new(), drawing(&body));

        assert_eq!(result.shapes.len(), 2);
        let start = &result.shapes[0];
        assert_eq!(start.id, ShapeId(1));
        assert_eq!(start.kind, ShapeKind::Rectangle);
        assert_eq!(start.text.as_deref(), Some("Begin"));
        assert_eq!(start.bbox, BoundingBox::new(0.0, 0.0, 128.0, 40.0));
        assert_eq!(start.fill_color.as_deref(), Some("#4F46E5"));
        assert_eq!(start.uid, "xl/drawings/drawing1.xml#1");

        let conn = &result.connectors[0];
        assert_eq!(conn.id, ShapeId(3));
        assert_eq!(conn.kind, ConnectorKind::Elbow);
        assert_eq!(conn.start_ref, Some(ShapeId(1)));
        assert_eq!(conn.end_ref, None);
        assert_eq!(conn.tail_arrow.as_deref(), Some("triangle"));
        assert_eq!(conn.head_arrow, None);
        assert_eq!(conn.line_color.as_deref(), Some("#FF0000"));
        // flipV runs the line bottom-left to top-right
        assert_eq!((conn.start.x, conn.start.y), (128.0, 120.0));
        assert_eq!((conn.end.x, conn.end.y), (256.0, 40.0));
        assert_eq!(conn.z_order, 2);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_duplicate_ids_are_reassigned() {
        let body = format!(
            "{}{}{}",
            rect(5, "A", 0, 0, "a"),
            rect(5, "B", 3, 0, "b"),
            rect(2, "C", 6, 0, "c")
        );
        let result = collect(&PackageArchive::new(), drawing(&body));
        let ids: Vec<u32> = result.shapes.iter().map(|s| s.id.0).collect();
        assert_eq!(ids, vec![5, 6, 2]);
    }

    #[test]
    fn test_duplicate_max_ids_get_smallest_free() {
        let body = format!(
            "{}{}{}",
            rect(u32::MAX, "A", 0, 0, "a"),
            rect(u32::MAX, "B", 4, 0, "b"),
            rect(1, "C", 8, 0, "c"),
        );
        let result = collect(&PackageArchive::new(), drawing(&body));

        let ids: Vec<ShapeId> = result.shapes.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![ShapeId(u32::MAX), ShapeId(2), ShapeId(1)]);
    }

    #[test]
    fn test_group_children_are_transformed() {
        let body = r#"<xdr:twoCellAnchor>
  <xdr:from><xdr:col>1</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>0</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
  <xdr:to><xdr:col>3</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>5</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:to>
  <xdr:grpSp>
    <xdr:nvGrpSpPr><xdr:cNvPr id="10" name="Group 10"/><xdr:cNvGrpSpPr/></xdr:nvGrpSpPr>
    <xdr:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="1000" cy="1000"/><a:chOff x="0" y="0"/><a:chExt cx="1000" cy="1000"/></a:xfrm></xdr:grpSpPr>
    <xdr:sp><xdr:nvSpPr><xdr:cNvPr id="11" name="Inner"/><xdr:cNvSpPr/></xdr:nvSpPr>
      <xdr:spPr><a:xfrm><a:off x="500" y="0"/><a:ext cx="500" cy="500"/></a:xfrm><a:prstGeom prst="ellipse"/></xdr:spPr></xdr:sp>
  </xdr:grpSp>
  <xdr:clientData/>
</xdr:twoCellAnchor>"#;
        let result = collect(&PackageArchive::new(), drawing(body));
        assert_eq!(result.shapes.len(), 2);
        let group = &result.shapes[0];
        assert!(group.is_group());
        assert_eq!(group.bbox, BoundingBox::new(64.0, 0.0, 128.0, 100.0));

        let inner = &result.shapes[1];
        assert_eq!(inner.kind, ShapeKind::Ellipse);
        assert_eq!(inner.parent, Some(0));
        assert_eq!(inner.anchor, None);
        assert_eq!(inner.bbox, BoundingBox::new(128.0, 0.0, 64.0, 50.0));
    }

    #[test]
    fn test_alternate_content_is_unsupported() {
        let body = r#"<mc:AlternateContent><mc:Choice Requires="a14"><xdr:twoCellAnchor/></mc:Choice></mc:AlternateContent>"#;
        let result = collect(&PackageArchive::new(), drawing(body));
        let warning = result.warnings.iter().next().unwrap();
        assert!(warning.is_unsupported());
        assert_eq!(warning.element.as_deref(), Some("AlternateContent"));
        assert!(warning.raw.as_deref().unwrap().starts_with("<mc:AlternateContent>"));
    }

    #[test]
    fn test_picture_embeds_media() {
        let mut archive = PackageArchive::new();
        archive.set("xl/media/image1.png", vec![0x89, b'P', b'N', b'G']);
        archive.set_string(
            "xl/drawings/_rels/drawing1.xml.rels",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image1.png"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/gone.png"/>
</Relationships>"#,
        );
        let pic = |id: u32, rel: &str| {
            format!(
                r#"<xdr:oneCellAnchor><xdr:from><xdr:col>0</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>0</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from><xdr:ext cx="952500" cy="952500"/>
<xdr:pic><xdr:nvPicPr><xdr:cNvPr id="{id}" name="Picture {id}"/><xdr:cNvPicPr/></xdr:nvPicPr><xdr:blipFill><a:blip r:embed="{rel}"/></xdr:blipFill><xdr:spPr/></xdr:pic><xdr:clientData/></xdr:oneCellAnchor>"#
            )
        };
        let body = format!("{}{}", pic(1, "rId1"), pic(2, "rId2"));
        let result = collect(&archive, drawing(&body));

        let image = result.shapes[0].image.as_ref().unwrap();
        assert_eq!(image.path, "xl/media/image1.png");
        assert_eq!(image.content_type, "image/png");
        assert_eq!(image.bytes.len(), 4);
        assert_eq!(result.shapes[0].bbox, BoundingBox::new(0.0, 0.0, 100.0, 100.0));

        assert!(result.shapes[1].image.is_none());
        assert_eq!(result.warnings.count(WarningKind::MissingPart), 1);
    }
}
