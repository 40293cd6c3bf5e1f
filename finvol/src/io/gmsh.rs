//! Gmsh 2.2 ASCII meshes and per-cell result fields.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::iter;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::GmshError;
use crate::finite_volume::unknowns::Q;
use crate::mesh::cell_group::CellGroup;
use crate::mesh::grid::Strictness;
use crate::mesh::reference_element::{ElemShape, ReferenceElement};
use crate::mesh::{Mesh, Point2D};

const LINE_P1: i32 = 1;
const TRI_P1: i32 = 2;
const QUAD_P1: i32 = 3;

fn element_from_type(element_type: i32) -> Result<ReferenceElement, GmshError> {
    let shape = match element_type {
        LINE_P1 => ElemShape::Line,
        TRI_P1 => ElemShape::Triangle,
        QUAD_P1 => ElemShape::Quadrilateral,
        _ => return Err(GmshError::UnsupportedElement(element_type)),
    };
    Ok(ReferenceElement::new(shape, 1)?)
}

fn type_of_element(reference_element: &ReferenceElement) -> i32 {
    match reference_element.shape() {
        ElemShape::Line => LINE_P1,
        ElemShape::Triangle => TRI_P1,
        ElemShape::Quadrilateral => QUAD_P1,
    }
}

/// Nodes and element groups of a mesh file, before face assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct GmshMesh {
    pub nodes: Vec<Point2D>,
    pub groups: Vec<CellGroup>,
}

impl GmshMesh {
    pub fn into_mesh(self, strictness: Strictness) -> crate::Result<Mesh> {
        Ok(Mesh::new(self.nodes, self.groups, strictness)?)
    }
}

type Section = Vec<(usize, String)>;

fn parse_error<S: Into<String>>(line: usize, message: S) -> GmshError {
    GmshError::Parse {
        line,
        message: message.into(),
    }
}

fn parse_token<T: FromStr>(line: usize, token: Option<&str>, what: &str) -> Result<T, GmshError> {
    let token = token.ok_or_else(|| parse_error(line, format!("missing {}", what)))?;
    token
        .parse()
        .map_err(|_| parse_error(line, format!("invalid {} '{}'", what, token)))
}

/// The first line of a section holds the number of entries that follow.
fn split_count<'s>(
    section: &'s [(usize, String)],
    header: usize,
    what: &str,
) -> Result<&'s [(usize, String)], GmshError> {
    let (line, first) = section
        .first()
        .ok_or_else(|| parse_error(header, format!("empty {} section", what)))?;
    let count: usize = parse_token(*line, first.split_whitespace().next(), "entry count")?;
    let entries = &section[1..];
    if entries.len() != count {
        return Err(parse_error(
            *line,
            format!("{} section announces {} entries, found {}", what, count, entries.len()),
        ));
    }
    Ok(entries)
}

fn read_format(section: &[(usize, String)], header: usize) -> Result<(), GmshError> {
    let (_, line) = section
        .first()
        .ok_or_else(|| parse_error(header, "empty $MeshFormat section"))?;
    let mut tokens = line.split_whitespace();
    let version = tokens.next().unwrap_or("");
    let file_type = tokens.next().unwrap_or("");
    if !version.starts_with("2.") || file_type != "0" {
        return Err(GmshError::UnsupportedVersion(line.clone()));
    }
    Ok(())
}

/// Splits off the first whitespace-separated token. The rest keeps its spacing.
fn next_token(text: &str) -> (Option<&str>, &str) {
    let text = text.trim_start();
    if text.is_empty() {
        return (None, text);
    }
    match text.find(char::is_whitespace) {
        Some(end) => (Some(&text[..end]), &text[end..]),
        None => (Some(text), ""),
    }
}

fn read_physical_names(
    section: &[(usize, String)],
    header: usize,
) -> Result<BTreeMap<(usize, i32), String>, GmshError> {
    let mut names = BTreeMap::new();
    for (line, text) in split_count(section, header, "$PhysicalNames")? {
        let (dim, rest) = next_token(text);
        let (tag, rest) = next_token(rest);
        let dim: usize = parse_token(*line, dim, "dimension")?;
        let tag: i32 = parse_token(*line, tag, "physical tag")?;
        let name = rest.trim().trim_matches('"');
        if name.is_empty() {
            return Err(parse_error(*line, "missing physical name"));
        }
        names.insert((dim, tag), name.to_string());
    }
    Ok(names)
}

fn read_nodes(section: &[(usize, String)], header: usize) -> Result<Vec<Point2D>, GmshError> {
    let entries = split_count(section, header, "$Nodes")?;
    let mut nodes = vec![Point2D { x: 0., y: 0. }; entries.len()];
    for (line, text) in entries {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() != 4 {
            return Err(parse_error(*line, "expected 'id x y z'"));
        }
        let id: usize = parse_token(*line, Some(tokens[0]), "node id")?;
        if id == 0 || id > nodes.len() {
            return Err(parse_error(*line, format!("node id {} out of range", id)));
        }
        // z is dropped
        nodes[id - 1] = Point2D {
            x: parse_token(*line, Some(tokens[1]), "x coordinate")?,
            y: parse_token(*line, Some(tokens[2]), "y coordinate")?,
        };
    }
    Ok(nodes)
}

struct GroupBuilder {
    element_type: i32,
    reference_element: ReferenceElement,
    node_ids: Vec<usize>,
}

fn read_elements(
    section: &[(usize, String)],
    header: usize,
) -> Result<Vec<((usize, i32), GroupBuilder)>, GmshError> {
    let mut groups: Vec<((usize, i32), GroupBuilder)> = Vec::new();
    let mut index: BTreeMap<(usize, i32), usize> = BTreeMap::new();

    for (line, text) in split_count(section, header, "$Elements")? {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let element_type: i32 = parse_token(*line, tokens.get(1).cloned(), "element type")?;
        let num_tags: usize = parse_token(*line, tokens.get(2).cloned(), "tag count")?;
        let tag: i32 = if num_tags > 0 {
            parse_token(*line, tokens.get(3).cloned(), "physical tag")?
        } else {
            0
        };
        let reference_element = element_from_type(element_type)?;
        let key = (reference_element.topo_dim(), tag);

        let position = match index.get(&key) {
            Some(&position) => position,
            None => {
                index.insert(key, groups.len());
                groups.push((
                    key,
                    GroupBuilder {
                        element_type,
                        reference_element,
                        node_ids: vec![],
                    },
                ));
                groups.len() - 1
            }
        };
        let group = &mut groups[position].1;
        if group.element_type != element_type {
            return Err(parse_error(
                *line,
                format!(
                    "element type {} in physical group {} of type {}",
                    element_type, tag, group.element_type
                ),
            ));
        }

        let node_tokens = tokens.get(3 + num_tags..).unwrap_or(&[]);
        if node_tokens.len() != group.reference_element.num_nodes() {
            return Err(parse_error(
                *line,
                format!(
                    "expected {} nodes, found {}",
                    group.reference_element.num_nodes(),
                    node_tokens.len()
                ),
            ));
        }
        for token in node_tokens {
            let id: usize = parse_token(*line, Some(*token), "node id")?;
            if id == 0 {
                return Err(parse_error(*line, "node ids start at 1"));
            }
            group.node_ids.push(id - 1);
        }
    }
    Ok(groups)
}

/// Reads a mesh. Element groups are keyed by dimension and physical tag and
/// come back in order of first appearance. Unknown sections are skipped.
pub fn read<R: BufRead>(reader: R) -> Result<GmshMesh, GmshError> {
    let mut sections: BTreeMap<String, (usize, Section)> = BTreeMap::new();
    let mut lines = reader.lines().enumerate();
    while let Some((index, line)) = lines.next() {
        let line = line?;
        let start = line.trim();
        if !start.starts_with('$') || start.starts_with("$End") {
            continue;
        }
        let end = format!("$End{}", &start[1..]);
        let mut body = Vec::new();
        loop {
            match lines.next() {
                Some((number, text)) => {
                    let text = text?;
                    if text.trim() == end {
                        break;
                    }
                    body.push((number + 1, text.trim().to_string()));
                }
                None => return Err(parse_error(index + 1, format!("unterminated section {}", start))),
            }
        }
        sections.entry(start.to_string()).or_insert((index + 1, body));
    }

    let (header, format) = sections
        .get("$MeshFormat")
        .ok_or(GmshError::MissingSection("$MeshFormat"))?;
    read_format(format, *header)?;

    let names = match sections.get("$PhysicalNames") {
        Some((header, section)) => read_physical_names(section, *header)?,
        None => BTreeMap::new(),
    };
    let (header, section) = sections.get("$Nodes").ok_or(GmshError::MissingSection("$Nodes"))?;
    let nodes = read_nodes(section, *header)?;
    let (header, section) = sections
        .get("$Elements")
        .ok_or(GmshError::MissingSection("$Elements"))?;

    let mut groups = Vec::new();
    for (key, builder) in read_elements(section, *header)? {
        let name = names
            .get(&key)
            .cloned()
            .unwrap_or_else(|| format!("physical_{}", key.1));
        groups.push(CellGroup::new(builder.reference_element, builder.node_ids, key.1, &name)?);
    }
    debug!("read {} nodes in {} element groups", nodes.len(), groups.len());
    Ok(GmshMesh { nodes, groups })
}

pub fn read_file<P: AsRef<Path>>(path: P) -> Result<GmshMesh, GmshError> {
    let file = File::open(path.as_ref())?;
    info!("reading mesh {}", path.as_ref().display());
    read(BufReader::new(file))
}

/// Writes the node table and element groups. Physical names are listed by
/// dimension, lines first.
pub fn write_groups<W: Write>(out: &mut W, nodes: &[Point2D], groups: &[&CellGroup]) -> Result<(), GmshError> {
    let mut builder = string_builder::Builder::new(64 * (nodes.len() + groups.len() + 4));
    builder.append("$MeshFormat\n2.2 0 8\n$EndMeshFormat\n");

    builder.append("$PhysicalNames\n");
    builder.append(format!("{}\n", groups.len()));
    for dim in 1..=2 {
        for group in groups.iter().filter(|group| group.topo_dim() == dim) {
            builder.append(format!("{} {} \"{}\"\n", dim, group.tag, group.name));
        }
    }
    builder.append("$EndPhysicalNames\n");

    builder.append("$Nodes\n");
    builder.append(format!("{}\n", nodes.len()));
    for (i, node) in nodes.iter().enumerate() {
        builder.append(format!("{} {} {} 0\n", i + 1, node.x, node.y));
    }
    builder.append("$EndNodes\n");

    builder.append("$Elements\n");
    let num_elements: usize = groups.iter().map(|group| group.len()).sum();
    builder.append(format!("{}\n", num_elements));
    let mut id = 1;
    for group in groups {
        let element_type = type_of_element(&group.reference_element);
        for element in group.elements() {
            let mut line = format!("{} {} 2 {} {}", id, element_type, group.tag, group.tag);
            for node in element {
                line.push_str(&format!(" {}", node + 1));
            }
            line.push('\n');
            builder.append(line);
            id += 1;
        }
    }
    builder.append("$EndElements\n");

    out.write_all(builder.string()?.as_bytes())?;
    Ok(())
}

/// The 2D cells come first so that element ids match cell indices.
pub fn write_mesh<W: Write>(out: &mut W, mesh: &Mesh) -> Result<(), GmshError> {
    let groups: Vec<&CellGroup> = iter::once(mesh.cells())
        .chain(mesh.boundary_groups().iter())
        .collect();
    write_groups(out, mesh.node_coordinates(), &groups)
}

/// One scalar per cell, as an `$ElementData` view with the simulation time as
/// its real tag and the iteration as its first integer tag.
pub fn write_element_data<W: Write>(
    out: &mut W,
    name: &str,
    time: f64,
    iteration: usize,
    values: &[f64],
) -> Result<(), GmshError> {
    let mut builder = string_builder::Builder::new(32 * (values.len() + 4));
    builder.append("$ElementData\n");
    builder.append(format!("1\n\"{}\"\n", name));
    builder.append(format!("1\n{}\n", time));
    builder.append(format!("3\n{}\n1\n{}\n", iteration, values.len()));
    for (i, value) in values.iter().enumerate() {
        builder.append(format!("{} {}\n", i + 1, value));
    }
    builder.append("$EndElementData\n");
    out.write_all(builder.string()?.as_bytes())?;
    Ok(())
}

pub const FIELD_NAMES: [&str; 4] = ["rho", "rho_u", "rho_v", "E"];

/// One view per conservative component.
pub fn write_fields<W: Write>(out: &mut W, state: &[Q], time: f64, iteration: usize) -> Result<(), GmshError> {
    let components: [fn(&Q) -> f64; 4] = [|q| q.rho, |q| q.rho_u, |q| q.rho_v, |q| q.E];
    for (name, component) in FIELD_NAMES.iter().zip(components.iter()) {
        let values: Vec<f64> = state.iter().map(component).collect();
        write_element_data(out, name, time, iteration, &values)?;
    }
    Ok(())
}

/// Writes the mesh followed by the conservative fields.
pub fn write_solution_file<P: AsRef<Path>>(
    path: P,
    mesh: &Mesh,
    state: &[Q],
    time: f64,
    iteration: usize,
) -> Result<(), GmshError> {
    let mut out = BufWriter::new(File::create(path.as_ref())?);
    write_mesh(&mut out, mesh)?;
    write_fields(&mut out, state, time, iteration)?;
    out.flush()?;
    info!("wrote t = {} to {}", time, path.as_ref().display());
    Ok(())
}

/// Appends the conservative fields to an existing mesh file.
pub fn append_fields<P: AsRef<Path>>(path: P, state: &[Q], time: f64, iteration: usize) -> Result<(), GmshError> {
    let file = OpenOptions::new().append(true).open(path.as_ref())?;
    let mut out = BufWriter::new(file);
    write_fields(&mut out, state, time, iteration)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::generators::riemann_square;
    use std::io::Cursor;
    use tempfile::tempdir;

    const TWO_TRIANGLES: &str = r#"$MeshFormat
2.2 0 8
$EndMeshFormat
$PhysicalNames
3
1 2 "wall"
1 3 "outlet"
2 1 "fluid"
$EndPhysicalNames
$Nodes
4
1 0 0 0
2 1 0 0
3 1 1 0
4 0 1 0
$EndNodes
$Elements
6
1 1 2 2 2 1 2
2 1 2 3 3 2 3
3 2 2 1 1 1 2 3
4 2 2 1 1 1 3 4
5 1 2 2 2 3 4
6 1 2 3 3 4 1
$EndElements
"#;

    #[test]
    fn test_read_two_triangles() {
        let gmsh = read(Cursor::new(TWO_TRIANGLES)).unwrap();
        assert_that!(gmsh.nodes).has_size(4);
        assert_eq!(gmsh.nodes[2], Point2D { x: 1., y: 1. });

        let names: Vec<(&str, i32, usize)> = gmsh
            .groups
            .iter()
            .map(|group| (group.name.as_str(), group.tag, group.len()))
            .collect();
        assert_eq!(names, vec![("wall", 2, 2), ("outlet", 3, 2), ("fluid", 1, 2)]);
        assert_eq!(gmsh.groups[2].element(1), &[0, 2, 3]);

        let mesh = gmsh.into_mesh(Strictness::Strict).unwrap();
        assert_eq!(mesh.interior_faces().len(), 1);
        assert!(mesh.topology_report().is_clean());
    }

    #[test]
    fn test_physical_names_with_extra_spacing() {
        let text = TWO_TRIANGLES
            .replace("1 2 \"wall\"", "1  2   \"side wall\"")
            .replace("2 1 \"fluid\"", "\t2\t1 \"fluid\" ");
        let gmsh = read(Cursor::new(text)).unwrap();
        let names: Vec<&str> = gmsh.groups.iter().map(|group| group.name.as_str()).collect();
        assert_eq!(names, vec!["side wall", "outlet", "fluid"]);
    }

    #[test]
    fn test_missing_physical_name() {
        let text = TWO_TRIANGLES.replace("1 3 \"outlet\"", "1 3");
        match read(Cursor::new(text)) {
            Err(GmshError::Parse { line, .. }) => assert_eq!(line, 7),
            other => panic!("expected Parse, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_nodes() {
        let text = "$MeshFormat\n2.2 0 8\n$EndMeshFormat\n$Elements\n0\n$EndElements\n";
        match read(Cursor::new(text)) {
            Err(GmshError::MissingSection(section)) => assert_eq!(section, "$Nodes"),
            other => panic!("expected MissingSection, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_format_4() {
        let text = TWO_TRIANGLES.replace("2.2 0 8", "4.1 0 8");
        match read(Cursor::new(text)) {
            Err(GmshError::UnsupportedVersion(_)) => {}
            other => panic!("expected UnsupportedVersion, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unsupported_element() {
        let text = TWO_TRIANGLES.replace("3 2 2 1 1 1 2 3", "3 4 2 1 1 1 2 3 4");
        match read(Cursor::new(text)) {
            Err(GmshError::UnsupportedElement(4)) => {}
            other => panic!("expected UnsupportedElement, got {:?}", other),
        }
    }

    #[test]
    fn test_reports_line_of_bad_node() {
        let text = TWO_TRIANGLES.replace("3 1 1 0", "3 1 one 0");
        match read(Cursor::new(text)) {
            Err(GmshError::Parse { line, .. }) => assert_eq!(line, 14),
            other => panic!("expected Parse, got {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_section() {
        let text = TWO_TRIANGLES.replace("$EndElements\n", "");
        assert!(read(Cursor::new(text)).is_err());
    }

    #[test]
    fn test_write_and_read_back() {
        let (nodes, groups) = riemann_square(3, ElemShape::Triangle).unwrap();
        let mesh = Mesh::new(nodes.clone(), groups.clone(), Strictness::Strict).unwrap();
        let state = vec![
            Q {
                rho: 1.,
                rho_u: 0.5,
                rho_v: -0.5,
                E: 2.5,
            };
            mesh.num_cells()
        ];

        let dir = tempdir().unwrap();
        let path = dir.path().join("square.msh");
        write_solution_file(&path, &mesh, &state, 0.3, 6).unwrap();
        append_fields(&path, &state, 0.4, 7).unwrap();

        let gmsh = read_file(&path).unwrap();
        assert_eq!(gmsh.nodes, nodes);
        assert_eq!(gmsh.groups, groups);

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("$ElementData").count(), 8);
        assert!(text.contains("\"rho_v\"\n1\n0.3\n3\n6\n1\n18\n1 -0.5\n"));
    }
}
